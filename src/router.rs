use crate::request::Method;

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum Endpoint {
    Root,
    Echo,
    UserAgent,
    ReadFile,
    WriteFile,
}

#[derive(Debug, Clone, Copy)]
pub enum Matcher {
    Exact(&'static str),
    Prefix(&'static str),
}

impl Matcher {
    /// Returns the path parameter on a match: the remainder after a prefix,
    /// or an empty string for an exact match.
    fn matches<'a>(&self, path: &'a str) -> Option<&'a str> {
        match *self {
            Matcher::Exact(exact) if path == exact => Some(""),
            Matcher::Exact(_) => None,
            Matcher::Prefix(prefix) => path.strip_prefix(prefix),
        }
    }

    fn is_exact(&self) -> bool {
        matches!(self, Matcher::Exact(_))
    }
}

#[derive(Debug)]
pub struct Route {
    pub method: Method,
    pub matcher: Matcher,
    pub endpoint: Endpoint,
    /// Lowercase names of the request headers the endpoint looks at. Only
    /// these are kept; empty means the header block is never read.
    pub headers: &'static [&'static str],
}

#[derive(Debug)]
pub struct RouteMatch<'a> {
    pub endpoint: Endpoint,
    pub param: &'a str,
    pub headers: &'static [&'static str],
}

pub struct Router {
    routes: Vec<Route>,
}

impl Router {
    /// Routes are stored with every exact matcher ahead of every prefix
    /// matcher; within each group registration order is kept.
    pub fn new(mut routes: Vec<Route>) -> Self {
        routes.sort_by_key(|route| !route.matcher.is_exact());
        Self { routes }
    }

    pub fn route<'a>(&self, method: &Method, path: &'a str) -> Option<RouteMatch<'a>> {
        self.routes
            .iter()
            .filter(|route| &route.method == method)
            .find_map(|route| {
                route.matcher.matches(path).map(|param| RouteMatch {
                    endpoint: route.endpoint,
                    param,
                    headers: route.headers,
                })
            })
    }
}

impl Default for Router {
    fn default() -> Self {
        Router::new(vec![
            Route {
                method: Method::Get,
                matcher: Matcher::Prefix("/echo/"),
                endpoint: Endpoint::Echo,
                headers: &["accept-encoding"],
            },
            Route {
                method: Method::Get,
                matcher: Matcher::Prefix("/files/"),
                endpoint: Endpoint::ReadFile,
                headers: &[],
            },
            Route {
                method: Method::Post,
                matcher: Matcher::Prefix("/files/"),
                endpoint: Endpoint::WriteFile,
                headers: &["content-length"],
            },
            Route {
                method: Method::Get,
                matcher: Matcher::Exact("/"),
                endpoint: Endpoint::Root,
                headers: &[],
            },
            Route {
                method: Method::Get,
                matcher: Matcher::Exact("/user-agent"),
                endpoint: Endpoint::UserAgent,
                headers: &["user-agent"],
            },
        ])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_routes() {
        let router = Router::default();

        let m = router.route(&Method::Get, "/").unwrap();
        assert_eq!(m.endpoint, Endpoint::Root);
        assert!(m.headers.is_empty());

        let m = router.route(&Method::Get, "/echo/abc/def").unwrap();
        assert_eq!(m.endpoint, Endpoint::Echo);
        assert_eq!(m.param, "abc/def");

        let m = router.route(&Method::Get, "/user-agent").unwrap();
        assert_eq!(m.endpoint, Endpoint::UserAgent);
        assert_eq!(m.headers, &["user-agent"]);

        let m = router.route(&Method::Post, "/files/a.txt").unwrap();
        assert_eq!(m.endpoint, Endpoint::WriteFile);
        assert_eq!(m.param, "a.txt");
    }

    #[test]
    fn test_empty_echo_param() {
        let router = Router::default();
        let m = router.route(&Method::Get, "/echo/").unwrap();
        assert_eq!(m.endpoint, Endpoint::Echo);
        assert_eq!(m.param, "");
    }

    #[test]
    fn test_unmatched() {
        let router = Router::default();
        assert!(router.route(&Method::Get, "/nonexistent").is_none());
        assert!(router.route(&Method::Get, "/echo").is_none());
        assert!(router.route(&Method::Get, "/user-agent/x").is_none());
        assert!(router.route(&Method::Post, "/echo/abc").is_none());
        assert!(router.route(&Method::Post, "/").is_none());
        assert!(router
            .route(&Method::Other("PUT".to_string()), "/files/a")
            .is_none());
    }

    #[test]
    fn test_exact_before_prefix() {
        let router = Router::new(vec![
            Route {
                method: Method::Get,
                matcher: Matcher::Prefix("/user"),
                endpoint: Endpoint::Echo,
                headers: &[],
            },
            Route {
                method: Method::Get,
                matcher: Matcher::Exact("/user-agent"),
                endpoint: Endpoint::UserAgent,
                headers: &[],
            },
        ]);

        let m = router.route(&Method::Get, "/user-agent").unwrap();
        assert_eq!(m.endpoint, Endpoint::UserAgent);
        let m = router.route(&Method::Get, "/users").unwrap();
        assert_eq!(m.endpoint, Endpoint::Echo);
        assert_eq!(m.param, "s");
    }
}
