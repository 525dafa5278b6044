//! Route template compilation and matching.
//!
//! A template is a `/`-separated path where a segment starting with `:`
//! captures one path segment under that name: `/orders/:id`. Matching is
//! anchored, segment-by-segment, and case-sensitive. There is no wildcard
//! and no regex in the match path; the regex below only validates names at
//! compile time.

use {
    super::params::Params,
    crate::{Error, Result, utils::normalize_path},
    regex::Regex,
    std::{collections::HashSet, fmt, sync::LazyLock},
};

static PARAM_NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9_]+$").unwrap());

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Param(String),
}

/// A compiled route template.
///
/// ```
/// use kiwi_dispatch::RoutePattern;
///
/// let pattern = RoutePattern::compile("/users/:id").unwrap();
/// let params = pattern.matches("/users/42").unwrap();
/// assert_eq!(params.get("id"), Some("42"));
/// assert!(pattern.matches("/users/42/posts").is_none());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoutePattern {
    template: String,
    segments: Vec<Segment>,
}

impl RoutePattern {
    /// Normalizes and compiles `template`.
    ///
    /// # Errors
    ///
    /// Returns an `InvalidPattern` error for an empty parameter name, a name
    /// outside `[A-Za-z0-9_]`, a `:` that does not start its segment, a
    /// repeated parameter name, or an empty inner segment.
    pub fn compile(template: &str) -> Result<Self> {
        let normalized = normalize_path(template);
        let mut segments = Vec::new();
        let mut seen = HashSet::new();

        if normalized != "/" {
            for raw in normalized[1..].split('/') {
                segments.push(Self::compile_segment(&normalized, raw, &mut seen)?);
            }
        }

        Ok(Self {
            template: normalized,
            segments,
        })
    }

    fn compile_segment<'a>(
        template: &str,
        raw: &'a str,
        seen: &mut HashSet<&'a str>,
    ) -> Result<Segment> {
        if raw.is_empty() {
            return Err(Error::invalid_pattern(template, "empty path segment"));
        }

        let Some(name) = raw.strip_prefix(':') else {
            if raw.contains(':') {
                return Err(Error::invalid_pattern(
                    template,
                    format!("':' must start a segment, found '{raw}'"),
                ));
            }
            return Ok(Segment::Literal(raw.to_string()));
        };

        if name.is_empty() {
            return Err(Error::invalid_pattern(template, "empty parameter name"));
        }
        if !PARAM_NAME.is_match(name) {
            return Err(Error::invalid_pattern(
                template,
                format!("parameter name '{name}' must match [A-Za-z0-9_]+"),
            ));
        }
        if !seen.insert(name) {
            return Err(Error::invalid_pattern(
                template,
                format!("parameter '{name}' appears more than once"),
            ));
        }
        Ok(Segment::Param(name.to_string()))
    }

    /// The normalized template this pattern was compiled from.
    pub fn as_str(&self) -> &str {
        &self.template
    }

    /// Number of parameter segments; the dispatch specificity key.
    pub fn param_count(&self) -> usize {
        self.segments
            .iter()
            .filter(|segment| matches!(segment, Segment::Param(_)))
            .count()
    }

    pub fn param_names(&self) -> impl Iterator<Item = &str> {
        self.segments.iter().filter_map(|segment| match segment {
            Segment::Param(name) => Some(name.as_str()),
            Segment::Literal(_) => None,
        })
    }

    /// Matches a normalized request path.
    ///
    /// Returns the captured parameters in template order, or `None` when the
    /// segment counts differ, a literal differs, or a parameter would capture
    /// an empty segment.
    pub fn matches(&self, path: &str) -> Option<Params> {
        let rest = path.strip_prefix('/')?;
        if rest.is_empty() {
            return self.segments.is_empty().then(Params::new);
        }

        let parts: Vec<&str> = rest.split('/').collect();
        if parts.len() != self.segments.len() {
            return None;
        }

        let mut params = Params::new();
        for (segment, part) in self.segments.iter().zip(parts) {
            match segment {
                Segment::Literal(literal) if literal == part => {}
                Segment::Literal(_) => return None,
                Segment::Param(_) if part.is_empty() => return None,
                Segment::Param(name) => params.insert(name.as_str(), part),
            }
        }
        Some(params)
    }
}

impl fmt::Display for RoutePattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.template)
    }
}
