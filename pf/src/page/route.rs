//! Route patterns
//!
//! Patterns are plain paths with two extras: a `:name` segment matches any
//! single segment and a trailing `*` segment matches the rest of the path
//! (including nothing). URLs are compared on their path only: scheme, host,
//! query string and fragment are ignored, and a trailing slash is not
//! significant.

use regex::Regex;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RouteError {
    #[error("Route pattern must not be empty")]
    Empty,

    #[error("Wildcard must be the last segment of route pattern '{pattern}'")]
    MisplacedWildcard { pattern: String },

    #[error("Invalid route pattern '{pattern}': {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },
}

/// A compiled route pattern
#[derive(Debug, Clone)]
pub struct RoutePattern {
    raw: String,
    regex: Regex,
}

impl RoutePattern {
    pub fn parse(pattern: &str) -> Result<Self, RouteError> {
        let trimmed = pattern.trim();
        if trimmed.is_empty() {
            return Err(RouteError::Empty);
        }

        let path = normalize_path(trimmed);
        let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();

        let mut source = String::from("^");
        for (i, segment) in segments.iter().enumerate() {
            let is_last = i + 1 == segments.len();
            match *segment {
                "*" if is_last => source.push_str("(?:/.*)?"),
                "*" => {
                    return Err(RouteError::MisplacedWildcard {
                        pattern: pattern.to_string(),
                    });
                }
                s if s.starts_with(':') && s.len() > 1 => source.push_str("/[^/]+"),
                s => {
                    source.push('/');
                    source.push_str(&regex::escape(s));
                }
            }
        }
        if segments.is_empty() {
            source.push('/');
        }
        source.push('$');

        let regex = Regex::new(&source).map_err(|e| RouteError::InvalidPattern {
            pattern: pattern.to_string(),
            source: e,
        })?;

        Ok(Self {
            raw: pattern.to_string(),
            regex,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    pub fn matches(&self, url: &str) -> bool {
        self.regex.is_match(&normalize_path(url))
    }
}

/// Reduce a URL to its path: no scheme/host, query or fragment, no trailing slash
pub fn normalize_path(url: &str) -> String {
    let mut path = url.trim();

    if let Some(idx) = path.find("://") {
        let rest = &path[idx + 3..];
        path = rest.find('/').map(|i| &rest[i..]).unwrap_or("/");
    }

    if let Some(idx) = path.find(['?', '#']) {
        path = &path[..idx];
    }

    let trimmed = path.trim_end_matches('/');
    if trimmed.is_empty() {
        return "/".to_string();
    }

    if trimmed.starts_with('/') {
        trimmed.to_string()
    } else {
        format!("/{}", trimmed)
    }
}
