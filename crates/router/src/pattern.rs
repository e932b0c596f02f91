//! Path patterns with named segments (`/orders/:id`).

use std::collections::HashMap;
use std::fmt;

use thiserror::Error;

/// Why a path pattern was rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PatternError {
    #[error("pattern must start with '/'")]
    MissingLeadingSlash,

    #[error("pattern contains an empty segment")]
    EmptySegment,

    #[error("named segment at position {0} has no name")]
    UnnamedParam(usize),

    #[error("segment name '{0}' is used more than once")]
    DuplicateParam(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Param(String),
}

/// A parsed route pattern.
///
/// Literal segments match exactly (case-sensitive); `:name` segments match
/// any single non-empty segment and capture it. A trailing slash is ignored
/// both in the pattern and in the matched path.
///
/// ```
/// use actroute_router::PathPattern;
///
/// let pattern = PathPattern::parse("/orders/:id").unwrap();
/// let params = pattern.matches("/orders/42/").unwrap();
/// assert_eq!(params["id"], "42");
/// assert!(pattern.matches("/orders").is_none());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathPattern {
    raw: String,
    segments: Vec<Segment>,
}

impl PathPattern {
    pub fn parse(raw: &str) -> Result<Self, PatternError> {
        let rest = raw
            .strip_prefix('/')
            .ok_or(PatternError::MissingLeadingSlash)?;
        let rest = rest.strip_suffix('/').unwrap_or(rest);

        let mut segments = Vec::new();
        if !rest.is_empty() {
            for (i, part) in rest.split('/').enumerate() {
                if part.is_empty() {
                    return Err(PatternError::EmptySegment);
                }
                let segment = match part.strip_prefix(':') {
                    Some("") => return Err(PatternError::UnnamedParam(i)),
                    Some(name) => {
                        if segments
                            .iter()
                            .any(|s| matches!(s, Segment::Param(n) if n == name))
                        {
                            return Err(PatternError::DuplicateParam(name.to_owned()));
                        }
                        Segment::Param(name.to_owned())
                    }
                    None => Segment::Literal(part.to_owned()),
                };
                segments.push(segment);
            }
        }

        Ok(Self {
            raw: raw.to_owned(),
            segments,
        })
    }

    /// The pattern as declared.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Normalized form used to detect conflicting registrations. Segment
    /// names are erased, so `/a/:id` and `/a/:key` share a key.
    #[must_use]
    pub fn key(&self) -> String {
        if self.segments.is_empty() {
            return "/".to_owned();
        }
        let mut key = String::new();
        for segment in &self.segments {
            key.push('/');
            match segment {
                Segment::Literal(s) => key.push_str(s),
                Segment::Param(_) => key.push(':'),
            }
        }
        key
    }

    /// Whether every path this pattern's `other` could match is already
    /// matched by `self`: same segment count, and each segment of `self` is
    /// a param or the same literal.
    #[must_use]
    pub fn covers(&self, other: &Self) -> bool {
        self.segments.len() == other.segments.len()
            && self
                .segments
                .iter()
                .zip(&other.segments)
                .all(|pair| match pair {
                    (Segment::Param(_), _) => true,
                    (Segment::Literal(a), Segment::Literal(b)) => a == b,
                    (Segment::Literal(_), Segment::Param(_)) => false,
                })
    }

    /// Names of the captured segments, in order.
    pub fn param_names(&self) -> impl Iterator<Item = &str> {
        self.segments.iter().filter_map(|s| match s {
            Segment::Param(name) => Some(name.as_str()),
            Segment::Literal(_) => None,
        })
    }

    /// Match a concrete request path, returning the captured segments.
    #[must_use]
    pub fn matches(&self, path: &str) -> Option<HashMap<String, String>> {
        let rest = path.strip_prefix('/')?;
        let rest = rest.strip_suffix('/').unwrap_or(rest);

        let mut params = HashMap::new();
        if rest.is_empty() {
            return self.segments.is_empty().then_some(params);
        }

        let mut parts = rest.split('/');
        for segment in &self.segments {
            let part = parts.next()?;
            match segment {
                Segment::Literal(lit) if lit == part => {}
                Segment::Param(name) if !part.is_empty() => {
                    params.insert(name.clone(), part.to_owned());
                }
                _ => return None,
            }
        }
        parts.next().is_none().then_some(params)
    }
}

impl fmt::Display for PathPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

/// Join a mount prefix and a declared path. `prefix` must already be
/// validated (empty, or starting with `/` without a trailing slash).
pub(crate) fn join(prefix: &str, path: &str) -> String {
    if prefix.is_empty() {
        return path.to_owned();
    }
    match path {
        "" | "/" => prefix.to_owned(),
        p if p.starts_with('/') => format!("{prefix}{p}"),
        p => format!("{prefix}/{p}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_literals_and_params() {
        let p = PathPattern::parse("/orders/:id/label").unwrap();
        assert_eq!(p.key(), "/orders/:/label");
        assert_eq!(p.param_names().collect::<Vec<_>>(), ["id"]);
        assert_eq!(p.to_string(), "/orders/:id/label");
    }

    #[test]
    fn rejects_malformed_patterns() {
        assert_eq!(
            PathPattern::parse("orders").unwrap_err(),
            PatternError::MissingLeadingSlash
        );
        assert_eq!(
            PathPattern::parse("/orders//x").unwrap_err(),
            PatternError::EmptySegment
        );
        assert_eq!(
            PathPattern::parse("/orders/:").unwrap_err(),
            PatternError::UnnamedParam(1)
        );
        assert_eq!(
            PathPattern::parse("/a/:id/b/:id").unwrap_err(),
            PatternError::DuplicateParam("id".into())
        );
    }

    #[test]
    fn root_pattern() {
        let p = PathPattern::parse("/").unwrap();
        assert_eq!(p.key(), "/");
        assert!(p.matches("/").is_some());
        assert!(p.matches("/x").is_none());
    }

    #[test]
    fn segment_names_do_not_affect_key() {
        let a = PathPattern::parse("/a/:id").unwrap();
        let b = PathPattern::parse("/a/:key/").unwrap();
        assert_eq!(a.key(), b.key());
    }

    #[test]
    fn matching_extracts_params() {
        let p = PathPattern::parse("/users/:user/orders/:order").unwrap();
        let params = p.matches("/users/u1/orders/o9").unwrap();
        assert_eq!(params["user"], "u1");
        assert_eq!(params["order"], "o9");

        assert!(p.matches("/users/u1/orders").is_none());
        assert!(p.matches("/users/u1/orders/o9/extra").is_none());
        assert!(p.matches("/users//orders/o9").is_none());
        assert!(p.matches("users/u1/orders/o9").is_none());
    }

    #[test]
    fn literals_are_case_sensitive() {
        let p = PathPattern::parse("/orders").unwrap();
        assert!(p.matches("/orders/").is_some());
        assert!(p.matches("/Orders").is_none());
    }

    #[test]
    fn covering_patterns() {
        let by_id = PathPattern::parse("/orders/:id").unwrap();
        let recent = PathPattern::parse("/orders/recent").unwrap();
        let label = PathPattern::parse("/orders/:id/label").unwrap();
        assert!(by_id.covers(&recent));
        assert!(!recent.covers(&by_id));
        assert!(!by_id.covers(&label));

        let raw = PathPattern::parse("/files/:name/raw").unwrap();
        let readme = PathPattern::parse("/files/readme/:part").unwrap();
        assert!(!raw.covers(&readme));
        assert!(!readme.covers(&raw));
    }

    #[test]
    fn join_prefix() {
        assert_eq!(join("", "/orders"), "/orders");
        assert_eq!(join("/api", "/orders"), "/api/orders");
        assert_eq!(join("/api", "/"), "/api");
        assert_eq!(join("/api", "orders"), "/api/orders");
    }
}
