//! Resource patterns: path templates with literal and parameter segments.
//!
//! `/wearable/data/{id}` and `/wearable/data/:id` parse to the same pattern.
//! A pattern matches a concrete path when both have the same number of
//! segments, every literal segment is equal (case-sensitive), and every
//! parameter segment lines up with exactly one non-empty path segment.
use std::fmt;

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PatternError {
    #[error("resource pattern is empty")]
    Empty,
    #[error("resource pattern must start with '/': {0}")]
    MissingLeadingSlash(String),
    #[error("resource pattern has an empty segment: {0}")]
    EmptySegment(String),
    #[error("resource pattern has an unnamed parameter: {0}")]
    UnnamedParam(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Segment {
    Literal(String),
    Param(String),
}

impl Segment {
    fn parse(raw: &str, pattern: &str) -> Result<Self, PatternError> {
        if raw.is_empty() {
            return Err(PatternError::EmptySegment(pattern.to_string()));
        }

        let name = raw
            .strip_prefix('{')
            .and_then(|s| s.strip_suffix('}'))
            .or_else(|| raw.strip_prefix(':'));

        match name {
            Some("") => Err(PatternError::UnnamedParam(pattern.to_string())),
            Some(name) => Ok(Self::Param(name.to_string())),
            None => Ok(Self::Literal(raw.to_string())),
        }
    }

    fn matches(&self, concrete: &str) -> bool {
        match self {
            Self::Literal(lit) => lit == concrete,
            Self::Param(_) => !concrete.is_empty(),
        }
    }
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Literal(lit) => f.write_str(lit),
            Self::Param(name) => write!(f, "{{{name}}}"),
        }
    }
}

/// Parsed path template. Equality and hashing follow the canonical form, so
/// `:id` and `{id}` spellings of the same template compare equal.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ResourcePattern {
    segments: Vec<Segment>,
}

impl ResourcePattern {
    pub fn parse(raw: &str) -> Result<Self, PatternError> {
        let raw = raw.trim();
        if raw.is_empty() {
            return Err(PatternError::Empty);
        }
        let rest = raw
            .strip_prefix('/')
            .ok_or_else(|| PatternError::MissingLeadingSlash(raw.to_string()))?;

        if rest.is_empty() {
            return Ok(Self {
                segments: Vec::new(),
            });
        }

        let segments = rest
            .split('/')
            .map(|seg| Segment::parse(seg, raw))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self { segments })
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Match against a concrete path already split into segments.
    pub fn matches_segments(&self, path: &[&str]) -> bool {
        self.segments.len() == path.len()
            && self
                .segments
                .iter()
                .zip(path)
                .all(|(seg, concrete)| seg.matches(concrete))
    }

    pub fn matches(&self, path: &str) -> bool {
        match split_path(path) {
            Some(segments) => self.matches_segments(&segments),
            None => false,
        }
    }
}

impl fmt::Display for ResourcePattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.segments.is_empty() {
            return f.write_str("/");
        }
        for seg in &self.segments {
            write!(f, "/{seg}")?;
        }
        Ok(())
    }
}

/// Split a concrete path into segments. `None` when the path is not absolute.
///
/// Empty segments are kept so that `/a/` never matches `/a/{id}`.
pub fn split_path(path: &str) -> Option<Vec<&str>> {
    let rest = path.strip_prefix('/')?;
    if rest.is_empty() {
        return Some(Vec::new());
    }
    Some(rest.split('/').collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn param_segment_matches_any_single_segment() {
        let p = ResourcePattern::parse("/wearable/data/{id}").unwrap();
        assert!(p.matches("/wearable/data/42"));
        assert!(p.matches("/wearable/data/{id}"));
        assert!(!p.matches("/wearable/data"));
        assert!(!p.matches("/wearable/data/42/extra"));
        assert!(!p.matches("/wearable/data/"));
    }

    #[test]
    fn literal_segments_are_case_sensitive() {
        let p = ResourcePattern::parse("/Wearable/data").unwrap();
        assert!(p.matches("/Wearable/data"));
        assert!(!p.matches("/wearable/data"));
    }

    #[test]
    fn colon_and_brace_params_are_the_same_pattern() {
        let a = ResourcePattern::parse("/health/summary/:user_id/daily/:date").unwrap();
        let b = ResourcePattern::parse("/health/summary/{user_id}/daily/{date}").unwrap();
        assert_eq!(a, b);
        assert_eq!(a.to_string(), "/health/summary/{user_id}/daily/{date}");
    }

    #[test]
    fn root_pattern_has_no_segments() {
        let p = ResourcePattern::parse("/").unwrap();
        assert!(p.segments().is_empty());
        assert!(p.matches("/"));
        assert!(!p.matches("/a"));
    }

    #[test]
    fn malformed_patterns_are_rejected() {
        assert_eq!(ResourcePattern::parse("  "), Err(PatternError::Empty));
        assert!(matches!(
            ResourcePattern::parse("wearable/data"),
            Err(PatternError::MissingLeadingSlash(_))
        ));
        assert!(matches!(
            ResourcePattern::parse("/a//b"),
            Err(PatternError::EmptySegment(_))
        ));
        assert!(matches!(
            ResourcePattern::parse("/a/"),
            Err(PatternError::EmptySegment(_))
        ));
        assert!(matches!(
            ResourcePattern::parse("/a/{}"),
            Err(PatternError::UnnamedParam(_))
        ));
        assert!(matches!(
            ResourcePattern::parse("/a/:"),
            Err(PatternError::UnnamedParam(_))
        ));
    }

    #[test]
    fn relative_paths_never_match() {
        let p = ResourcePattern::parse("/a").unwrap();
        assert!(!p.matches("a"));
        assert_eq!(split_path("a"), None);
    }
}
