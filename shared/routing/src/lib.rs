use http::Method;
use percent_encoding::percent_decode_str;
use std::collections::HashMap;

#[derive(Debug)]
enum PathSegment {
    Static(String),
    Param(String),
}

#[derive(Debug)]
struct Path {
    segments: Vec<PathSegment>,
}

impl Path {
    /// Parses a path pattern string into a Path struct
    /// Supports:
    /// - Static segments: "/api/clusters"
    /// - Dynamic parameters: "/api/projects/{projectId}/reset"
    pub fn parse(path_str: &str) -> Self {
        let normalized_path = path_str.trim().trim_matches('/');

        let segments: Vec<PathSegment> = if normalized_path.is_empty() {
            vec![]
        } else {
            normalized_path
                .split('/')
                .map(|s| {
                    if let Some(stripped) = s.strip_prefix('{').and_then(|s| s.strip_suffix('}')) {
                        PathSegment::Param(stripped.to_string())
                    } else {
                        PathSegment::Static(s.to_string())
                    }
                })
                .collect()
        };

        Path { segments }
    }

    /// Matches a request path against this path pattern.
    /// Returns the captured parameters, percent-decoded, if every segment
    /// matches. A capture that does not decode to UTF-8 fails the match.
    fn matches(&self, request_path: &str) -> Option<HashMap<String, String>> {
        let normalized_path = request_path.trim().trim_matches('/');

        let request_segments: Vec<&str> = if normalized_path.is_empty() {
            vec![]
        } else {
            normalized_path.split('/').collect()
        };

        if request_segments.len() != self.segments.len() {
            return None;
        }

        let mut params = HashMap::new();
        for (seg, req_segment) in self.segments.iter().zip(request_segments) {
            match seg {
                PathSegment::Static(s) if s == req_segment => {}
                PathSegment::Static(_) => return None,
                // Empty captures would produce downstream paths like `/api/storage//reset`
                PathSegment::Param(_) if req_segment.is_empty() => return None,
                PathSegment::Param(name) => {
                    let value = percent_decode_str(req_segment).decode_utf8().ok()?;
                    params.insert(name.clone(), value.into_owned());
                }
            }
        }

        Some(params)
    }
}

#[derive(Debug, PartialEq)]
pub struct RouteMatch<'a, A> {
    pub params: HashMap<String, String>,
    pub action: &'a A,
}

/// Outcome of resolving a request against a route table.
#[derive(Debug, PartialEq)]
pub enum Resolution<'a, A> {
    Matched(RouteMatch<'a, A>),
    /// At least one route matched the path, none matched the method.
    MethodNotAllowed,
    NotFound,
}

#[derive(Debug)]
pub struct Route<A> {
    method: Method,
    path: Path,
    action: A,
}

impl<A> Route<A> {
    /// Creates a new Route with the given method, path pattern and action
    pub fn new(method: Method, path: &str, action: A) -> Self {
        Self {
            method,
            path: Path::parse(path),
            action,
        }
    }

    /// Returns Some(params) if the request path matches this route's pattern.
    /// Trailing slash normalization is applied to incoming requests.
    fn match_path(&self, request_path: &str) -> Option<HashMap<String, String>> {
        self.path.matches(request_path)
    }
}

pub struct RouteTable<A> {
    routes: Vec<Route<A>>,
}

impl<A> RouteTable<A> {
    pub fn new(routes: Vec<Route<A>>) -> Self {
        Self { routes }
    }

    /// Returns the first route matching both method and path.
    pub fn resolve<'a>(&'a self, method: &Method, path: &str) -> Resolution<'a, A> {
        let mut path_matched = false;

        for route in &self.routes {
            let Some(params) = route.match_path(path) else {
                continue;
            };
            if route.method == *method {
                return Resolution::Matched(RouteMatch {
                    params,
                    action: &route.action,
                });
            }
            path_matched = true;
        }

        if path_matched {
            Resolution::MethodNotAllowed
        } else {
            Resolution::NotFound
        }
    }

    pub fn actions(&self) -> impl Iterator<Item = &A> {
        self.routes.iter().map(|r| &r.action)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_static_path() {
        let route = Route::new(Method::POST, "/api/clusters/", "clusters");
        assert!(route.match_path("/api/clusters").is_some(), "exact path");
        assert!(
            route.match_path("/api/clusters/").is_some(),
            "with trailing slash normalization"
        );
        assert!(
            route.match_path("/api/clusters/2").is_none(),
            "extra segment doesn't match"
        );
        assert!(
            route.match_path("/api/").is_none(),
            "missing segment doesn't match"
        );
    }

    #[test]
    fn test_dynamic_path() {
        let route = Route::new(
            Method::PUT,
            "/api/projects/{project_id}/objects/{object_id}",
            "tags",
        );

        let params = route.match_path("/api/projects/7/objects/42").unwrap();
        assert_eq!(params.get("project_id").map(String::as_str), Some("7"));
        assert_eq!(params.get("object_id").map(String::as_str), Some("42"));

        assert!(route.match_path("/api/projects//objects/42").is_none());
    }

    #[test]
    fn test_encoded_params() {
        let route = Route::new(
            Method::PUT,
            "/api/projects/{project_id}/objects/{object_id}",
            "tags",
        );

        let params = route.match_path("/api/projects/4/objects/J1%2B2%20x").unwrap();
        assert_eq!(params.get("object_id").map(String::as_str), Some("J1+2 x"));

        // `+` is literal in a path, not a space
        let params = route.match_path("/api/projects/4/objects/a+b").unwrap();
        assert_eq!(params.get("object_id").map(String::as_str), Some("a+b"));

        assert!(route.match_path("/api/projects/4/objects/%FF").is_none());
    }

    #[test]
    fn test_resolve_method() {
        let table = RouteTable::new(vec![
            Route::new(Method::POST, "/api/clusters", "create"),
            Route::new(Method::PUT, "/api/clusters", "update"),
            Route::new(Method::POST, "/api/clusters/reset", "reset"),
        ]);

        match table.resolve(&Method::PUT, "/api/clusters") {
            Resolution::Matched(m) => assert_eq!(m.action, &"update"),
            other => panic!("unexpected resolution: {other:?}"),
        }

        // A prefix route never captures a longer path
        match table.resolve(&Method::POST, "/api/clusters/reset") {
            Resolution::Matched(m) => assert_eq!(m.action, &"reset"),
            other => panic!("unexpected resolution: {other:?}"),
        }

        assert_eq!(
            table.resolve(&Method::DELETE, "/api/clusters"),
            Resolution::MethodNotAllowed
        );
        assert_eq!(
            table.resolve(&Method::GET, "/api/unknown"),
            Resolution::NotFound
        );
        assert_eq!(table.actions().count(), 3);
    }

    #[test]
    fn test_path_parsing() {
        let path = Path::parse("");
        assert_eq!(path.segments.len(), 0);

        let path = Path::parse("/api/clusters");
        assert_eq!(path.segments.len(), 2);

        let path = Path::parse("/api/projects/{projectId}/reset");
        assert_eq!(path.segments.len(), 4);
        assert!(matches!(&path.segments[2], PathSegment::Param(name) if name == "projectId"));
    }
}
