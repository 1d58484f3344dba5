//! Route compiler
//!
//! Routes are slash-delimited strings such as `/greeter/hello/{name}`. A
//! `{name}` placeholder matches one segment of `[a-zA-Z0-9_-]+` and is
//! captured under its name; `*` matches anything. All other characters match
//! literally.

use regex::Regex;
use std::collections::HashMap;

use super::errors::RouterError;

const SEGMENT: &str = "[a-zA-Z0-9_-]+";

/// Joins a group prefix and an operation suffix.
///
/// A `/` is inserted only when neither side already supplies one; an empty
/// suffix yields the prefix unchanged.
pub fn build_route(prefix: &str, suffix: &str) -> String {
    if suffix.is_empty() {
        return prefix.to_string();
    }
    if prefix.ends_with('/') || suffix.starts_with('/') {
        format!("{prefix}{suffix}")
    } else {
        format!("{prefix}/{suffix}")
    }
}

enum Piece<'a> {
    Literal(&'a str),
    Placeholder(&'a str),
    Unbalanced,
}

fn scan(route: &str) -> Vec<Piece<'_>> {
    let mut pieces = Vec::new();
    let mut rest = route;
    while let Some(open) = rest.find(['{', '}']) {
        if rest[open..].starts_with('}') {
            pieces.push(Piece::Unbalanced);
            return pieces;
        }
        pieces.push(Piece::Literal(&rest[..open]));
        let after = &rest[open + 1..];
        match after.find(['{', '}']) {
            Some(close) if after[close..].starts_with('}') => {
                pieces.push(Piece::Placeholder(after[..close].trim()));
                rest = &after[close + 1..];
            }
            _ => {
                pieces.push(Piece::Unbalanced);
                return pieces;
            }
        }
    }
    pieces.push(Piece::Literal(rest));
    pieces
}

fn is_param_name(name: &str) -> bool {
    let mut chars = name.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// A compiled route
#[derive(Debug, Clone)]
pub struct RoutePattern {
    route: String,
    regex: Regex,
    params: Vec<String>,
}

impl RoutePattern {
    pub fn compile(route: &str) -> Result<Self, RouterError> {
        let invalid = |reason: String| RouterError::InvalidRoute {
            route: route.to_string(),
            reason,
        };

        let mut body = String::with_capacity(route.len() * 2);
        let mut params: Vec<String> = Vec::new();

        for piece in scan(route) {
            match piece {
                Piece::Literal(literal) => push_literal(&mut body, literal),
                Piece::Placeholder(name) => {
                    if !is_param_name(name) {
                        return Err(invalid(format!("'{name}' is not a valid placeholder name")));
                    }
                    if params.iter().any(|p| p == name) {
                        return Err(invalid(format!("placeholder '{name}' appears twice")));
                    }
                    body.push_str(&format!("(?P<{name}>{SEGMENT})"));
                    params.push(name.to_string());
                }
                Piece::Unbalanced => return Err(invalid("unbalanced braces".to_string())),
            }
        }

        let regex = Regex::new(&format!("^(?:{body})$")).map_err(|e| invalid(e.to_string()))?;

        Ok(Self {
            route: route.to_string(),
            regex,
            params,
        })
    }

    /// Source route string
    pub fn route(&self) -> &str {
        &self.route
    }

    /// Compiled matching expression
    pub fn pattern(&self) -> &str {
        self.regex.as_str()
    }

    /// Placeholder names in declaration order
    pub fn params(&self) -> &[String] {
        &self.params
    }

    pub fn has_param(&self, name: &str) -> bool {
        self.params.iter().any(|p| p == name)
    }

    /// Matches the whole of `route` and returns the captured path parameters
    pub fn matches(&self, route: &str) -> Option<HashMap<String, String>> {
        let captures = self.regex.captures(route)?;
        Some(
            self.params
                .iter()
                .filter_map(|name| {
                    captures
                        .name(name)
                        .map(|m| (name.clone(), m.as_str().to_string()))
                })
                .collect(),
        )
    }
}

fn push_literal(body: &mut String, literal: &str) {
    let mut parts = literal.split('*');
    if let Some(first) = parts.next() {
        body.push_str(&regex::escape(first));
    }
    for part in parts {
        body.push_str(".*");
        body.push_str(&regex::escape(part));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_route_separator() {
        assert_eq!(build_route("/greeter", "/hello"), "/greeter/hello");
        assert_eq!(build_route("/greeter/", "hello"), "/greeter/hello");
        assert_eq!(build_route("/greeter", "hello"), "/greeter/hello");
        assert_eq!(build_route("/greeter", ""), "/greeter");
        assert_eq!(build_route("", "/hello"), "/hello");
    }

    #[test]
    fn test_placeholders_are_captured_in_order() {
        let pattern = RoutePattern::compile("/users/{userId}/orders/{order_id}").unwrap();
        assert_eq!(pattern.params(), &["userId", "order_id"]);

        let params = pattern.matches("/users/u-17/orders/A_9").unwrap();
        assert_eq!(params.len(), 2);
        assert_eq!(params["userId"], "u-17");
        assert_eq!(params["order_id"], "A_9");
    }

    #[test]
    fn test_full_match_required() {
        let pattern = RoutePattern::compile("/greeter/hello/{name}").unwrap();
        assert!(pattern.matches("/greeter/hello/John").is_some());
        assert!(pattern.matches("/greeter/hello/John/extra").is_none());
        assert!(pattern.matches("/api/greeter/hello/John").is_none());
        assert!(pattern.matches("/greeter/hello/").is_none());
        assert!(pattern.matches("/greeter/hello/John Doe").is_none());
    }

    #[test]
    fn test_wildcard() {
        let pattern = RoutePattern::compile("/files/*").unwrap();
        assert!(pattern.matches("/files/a/b/c.txt").is_some());
        assert!(pattern.matches("/files/").is_some());
        assert!(pattern.matches("/other/a").is_none());
    }

    #[test]
    fn test_literals_are_escaped() {
        let pattern = RoutePattern::compile("/v1.0/items").unwrap();
        assert!(pattern.matches("/v1.0/items").is_some());
        assert!(pattern.matches("/v1x0/items").is_none());
    }

    #[test]
    fn test_invalid_routes() {
        assert!(RoutePattern::compile("/a/{}").is_err());
        assert!(RoutePattern::compile("/a/{x}/{x}").is_err());
        assert!(RoutePattern::compile("/a/{x").is_err());
        assert!(RoutePattern::compile("/a/{1x}").is_err());
    }
}
