//! Path pattern parsing and per-engine rendering.
//!
//! Route tables are written in colon syntax (`/people/:userId`, `/files/*path`).
//! Engines disagree about syntax, so a pattern is parsed once into
//! [`Segment`]s and rendered into whatever each engine expects.

use std::fmt;

/// One slash-delimited piece of a path pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    /// Literal text that must match exactly
    Static(String),
    /// `:name` binds a single segment
    Param(String),
    /// `*name` captures the remainder of the path (last segment only)
    Wildcard(String),
}

/// Malformed pattern
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PatternError {
    /// Pattern does not start with `/`
    MissingLeadingSlash {
        /// The offending pattern
        pattern: String,
    },
    /// `:` or `*` with no name after it
    EmptyName {
        /// The offending pattern
        pattern: String,
    },
    /// A wildcard appears before the final segment
    WildcardNotLast {
        /// The offending pattern
        pattern: String,
    },
}

impl fmt::Display for PatternError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PatternError::MissingLeadingSlash { pattern } => {
                write!(f, "pattern '{pattern}' must start with '/'")
            }
            PatternError::EmptyName { pattern } => {
                write!(f, "pattern '{pattern}' has a parameter without a name")
            }
            PatternError::WildcardNotLast { pattern } => {
                write!(f, "pattern '{pattern}' has a wildcard before its last segment")
            }
        }
    }
}

impl std::error::Error for PatternError {}

/// A parsed path pattern
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathPattern {
    segments: Vec<Segment>,
    trailing_slash: bool,
}

impl PathPattern {
    /// Parse a colon-syntax pattern such as `/people/:userId/activities/:collection`.
    pub fn parse(pattern: &str) -> Result<Self, PatternError> {
        let rest = pattern
            .strip_prefix('/')
            .ok_or_else(|| PatternError::MissingLeadingSlash {
                pattern: pattern.to_string(),
            })?;

        let trailing_slash = !rest.is_empty() && rest.ends_with('/');
        let pieces: Vec<&str> = rest.split('/').filter(|s| !s.is_empty()).collect();
        let mut segments = Vec::with_capacity(pieces.len());

        for (i, piece) in pieces.iter().enumerate() {
            let segment = if let Some(name) = piece.strip_prefix(':') {
                if name.is_empty() {
                    return Err(PatternError::EmptyName {
                        pattern: pattern.to_string(),
                    });
                }
                Segment::Param(name.to_string())
            } else if let Some(name) = piece.strip_prefix('*') {
                if name.is_empty() {
                    return Err(PatternError::EmptyName {
                        pattern: pattern.to_string(),
                    });
                }
                if i + 1 != pieces.len() {
                    return Err(PatternError::WildcardNotLast {
                        pattern: pattern.to_string(),
                    });
                }
                Segment::Wildcard(name.to_string())
            } else {
                Segment::Static((*piece).to_string())
            };
            segments.push(segment);
        }

        Ok(Self {
            segments,
            trailing_slash,
        })
    }

    /// Parsed segments in order
    #[must_use]
    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Names of every binding segment (params and wildcard), in order
    #[must_use]
    pub fn param_names(&self) -> Vec<&str> {
        self.segments
            .iter()
            .filter_map(|s| match s {
                Segment::Param(n) | Segment::Wildcard(n) => Some(n.as_str()),
                Segment::Static(_) => None,
            })
            .collect()
    }

    /// True when the pattern ends in a `*name` segment
    #[must_use]
    pub fn has_wildcard(&self) -> bool {
        matches!(self.segments.last(), Some(Segment::Wildcard(_)))
    }

    /// Colon syntax: `/people/:userId`, `/files/*path`
    #[must_use]
    pub fn to_colon(&self) -> String {
        self.render(|s, out| match s {
            Segment::Static(t) => out.push_str(t),
            Segment::Param(n) => {
                out.push(':');
                out.push_str(n);
            }
            Segment::Wildcard(n) => {
                out.push('*');
                out.push_str(n);
            }
        })
    }

    /// Bracket syntax: `/people/{userId}`, `/files/{*path}`
    #[must_use]
    pub fn to_brackets(&self) -> String {
        self.render(|s, out| match s {
            Segment::Static(t) => out.push_str(t),
            Segment::Param(n) => {
                out.push('{');
                out.push_str(n);
                out.push('}');
            }
            Segment::Wildcard(n) => {
                out.push_str("{*");
                out.push_str(n);
                out.push('}');
            }
        })
    }

    /// `path-tree` syntax: params as `:name`, wildcard as `:name*`
    #[must_use]
    pub fn to_path_tree(&self) -> String {
        self.render(|s, out| match s {
            Segment::Static(t) => out.push_str(t),
            Segment::Param(n) => {
                out.push(':');
                out.push_str(n);
            }
            Segment::Wildcard(n) => {
                out.push(':');
                out.push_str(n);
                out.push('*');
            }
        })
    }

    /// Anchored regex with one capture group per binding segment, in order.
    #[must_use]
    pub fn to_regex(&self) -> String {
        if self.segments.is_empty() {
            return r"^/$".to_string();
        }
        let mut pattern = String::with_capacity(self.segments.len() * 12 + 2);
        pattern.push('^');
        for segment in &self.segments {
            pattern.push('/');
            match segment {
                Segment::Static(t) => pattern.push_str(&regex::escape(t)),
                Segment::Param(_) => pattern.push_str("([^/]+)"),
                Segment::Wildcard(_) => pattern.push_str("(.*)"),
            }
        }
        if self.trailing_slash {
            pattern.push('/');
        }
        pattern.push('$');
        pattern
    }

    /// How specifically this pattern matches `path`, or `None` if it does not.
    ///
    /// One rank per pattern segment: 2 for static, 1 for a parameter, 0 for
    /// the wildcard. Compared lexicographically, a higher rank is the more
    /// specific match (static beats parameter beats wildcard, segment by
    /// segment). Empty path segments never match.
    #[must_use]
    pub fn match_rank(&self, path: &str) -> Option<Vec<u8>> {
        let rest = path.strip_prefix('/')?;
        let rest = if self.trailing_slash {
            rest.strip_suffix('/')?
        } else {
            rest
        };
        let pieces: Vec<&str> = if rest.is_empty() {
            Vec::new()
        } else {
            rest.split('/').collect()
        };
        if pieces.iter().any(|p| p.is_empty()) {
            return None;
        }

        let mut rank = Vec::with_capacity(self.segments.len());
        for (i, segment) in self.segments.iter().enumerate() {
            match segment {
                Segment::Static(text) => {
                    if pieces.get(i) != Some(&text.as_str()) {
                        return None;
                    }
                    rank.push(2);
                }
                Segment::Param(_) => {
                    pieces.get(i)?;
                    rank.push(1);
                }
                Segment::Wildcard(_) => {
                    pieces.get(i)?;
                    rank.push(0);
                    return Some(rank);
                }
            }
        }
        (pieces.len() == self.segments.len()).then_some(rank)
    }

    fn render(&self, mut push: impl FnMut(&Segment, &mut String)) -> String {
        if self.segments.is_empty() {
            return "/".to_string();
        }
        let mut out = String::with_capacity(64);
        for segment in &self.segments {
            out.push('/');
            push(segment, &mut out);
        }
        if self.trailing_slash {
            out.push('/');
        }
        out
    }
}

impl fmt::Display for PathPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_colon())
    }
}
