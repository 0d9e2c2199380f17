//! Version parsing, ordering, and constraint matching.
//!
//! Versions are split into segments on `.` and `-`, and again wherever a
//! token switches between letters and digits (`rc10` is `rc`, `10`):
//! - Numeric segments compare as numbers
//! - Known qualifiers order as
//!   `alpha` < `beta` < `milestone` < `rc` < `snapshot` < `""` (release) < `sp`
//! - Unknown text qualifiers sort below a release of the same numeric value
//! - Missing trailing segments compare equal to `0` / release
//!
//! Unlike a lenient parser, [`Version::parse`] rejects strings that cannot be
//! ordered meaningfully (empty, empty segments, non-numeric leading segment).

use std::cmp::Ordering;
use std::fmt;

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VersionError {
    #[error("empty version string")]
    Empty,

    #[error("malformed version `{0}`")]
    Malformed(String),

    #[error("malformed version constraint `{0}`")]
    MalformedConstraint(String),
}

/// A parsed version with comparable segments.
#[derive(Debug, Clone)]
pub struct Version {
    original: String,
    segments: Vec<Segment>,
}

impl PartialEq for Version {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Version {}

#[derive(Debug, Clone, Eq, PartialEq)]
enum Segment {
    Numeric(u64),
    Qualifier(QualifierKind),
    Text(String),
}

#[derive(Debug, Clone, Copy, Eq, PartialEq, Ord, PartialOrd)]
enum QualifierKind {
    Alpha,
    Beta,
    Milestone,
    Rc,
    Snapshot,
    Release,
    Sp,
}

impl Version {
    pub fn parse(version: &str) -> Result<Self, VersionError> {
        let version = version.trim();
        if version.is_empty() {
            return Err(VersionError::Empty);
        }
        let malformed = || VersionError::Malformed(version.to_string());

        let mut segments = Vec::new();
        for token in version.split(['.', '-']) {
            if token.is_empty()
                || !token
                    .chars()
                    .all(|c| c.is_ascii_alphanumeric() || c == '_')
            {
                return Err(malformed());
            }
            segments.extend(split_mixed(token).into_iter().map(classify));
        }
        if !matches!(segments.first(), Some(Segment::Numeric(_))) {
            return Err(malformed());
        }

        Ok(Self {
            original: version.to_string(),
            segments,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.original
    }

    /// Whether the leading segments of `self` equal every segment of `prefix`.
    pub fn starts_with(&self, prefix: &Version) -> bool {
        prefix
            .segments
            .iter()
            .enumerate()
            .all(|(i, p)| compare_segments(self.segments.get(i), Some(p)) == Ordering::Equal)
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.original)
    }
}

impl Ord for Version {
    fn cmp(&self, other: &Self) -> Ordering {
        let max_len = self.segments.len().max(other.segments.len());
        for i in 0..max_len {
            let ord = compare_segments(self.segments.get(i), other.segments.get(i));
            if ord != Ordering::Equal {
                return ord;
            }
        }
        Ordering::Equal
    }
}

impl PartialOrd for Version {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

fn compare_segments(a: Option<&Segment>, b: Option<&Segment>) -> Ordering {
    match (a, b) {
        (None, None) => Ordering::Equal,
        (Some(s), None) => compare_segment_to_empty(s),
        (None, Some(s)) => compare_segment_to_empty(s).reverse(),
        (Some(a), Some(b)) => compare_two_segments(a, b),
    }
}

fn compare_segment_to_empty(seg: &Segment) -> Ordering {
    match seg {
        Segment::Numeric(0) => Ordering::Equal,
        Segment::Numeric(_) => Ordering::Greater,
        Segment::Qualifier(q) => q.cmp(&QualifierKind::Release),
        Segment::Text(_) => Ordering::Less,
    }
}

fn compare_two_segments(a: &Segment, b: &Segment) -> Ordering {
    match (a, b) {
        (Segment::Numeric(a), Segment::Numeric(b)) => a.cmp(b),
        (Segment::Qualifier(a), Segment::Qualifier(b)) => a.cmp(b),
        (Segment::Numeric(_), _) => Ordering::Greater,
        (_, Segment::Numeric(_)) => Ordering::Less,
        (Segment::Text(a), Segment::Text(b)) => a.to_lowercase().cmp(&b.to_lowercase()),
        (Segment::Qualifier(q), Segment::Text(_)) => {
            if *q >= QualifierKind::Release {
                Ordering::Greater
            } else {
                Ordering::Less
            }
        }
        (Segment::Text(_), Segment::Qualifier(q)) => {
            if *q >= QualifierKind::Release {
                Ordering::Less
            } else {
                Ordering::Greater
            }
        }
    }
}

/// `beta1` -> `beta`, `1`. Callers guarantee ASCII input.
fn split_mixed(token: &str) -> Vec<&str> {
    let bytes = token.as_bytes();
    let mut parts = Vec::new();
    let mut start = 0;
    for i in 1..bytes.len() {
        if bytes[i].is_ascii_digit() != bytes[i - 1].is_ascii_digit() {
            parts.push(&token[start..i]);
            start = i;
        }
    }
    parts.push(&token[start..]);
    parts
}

fn classify(token: &str) -> Segment {
    if token.chars().all(|c| c.is_ascii_digit()) {
        if let Ok(n) = token.parse::<u64>() {
            return Segment::Numeric(n);
        }
    }
    match token.to_lowercase().as_str() {
        "alpha" | "a" => Segment::Qualifier(QualifierKind::Alpha),
        "beta" | "b" => Segment::Qualifier(QualifierKind::Beta),
        "milestone" | "m" => Segment::Qualifier(QualifierKind::Milestone),
        "rc" | "cr" => Segment::Qualifier(QualifierKind::Rc),
        "snapshot" => Segment::Qualifier(QualifierKind::Snapshot),
        "ga" | "final" | "release" => Segment::Qualifier(QualifierKind::Release),
        "sp" => Segment::Qualifier(QualifierKind::Sp),
        _ => Segment::Text(token.to_string()),
    }
}

/// A requirement on a module's version.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VersionConstraint {
    /// `1.2.3`: at least this version; may be upgraded by other requests.
    Require(Version),
    /// `=1.2.3` or `[1.2.3]`.
    Exact(Version),
    /// Comparators (`>=1.0, <2.0`) or an interval (`[1.0,2.0)`).
    Range(VersionRange),
    /// `1.2.+`; `None` is the bare `+` and matches anything.
    Prefix(Option<Version>),
}

impl VersionConstraint {
    pub fn parse(input: &str) -> Result<Self, VersionError> {
        let s = input.trim();
        if s.is_empty() {
            return Err(VersionError::Empty);
        }
        if s == "+" {
            return Ok(Self::Prefix(None));
        }
        if let Some(prefix) = s.strip_suffix(".+") {
            return Version::parse(prefix)
                .map(|v| Self::Prefix(Some(v)))
                .map_err(|_| VersionError::MalformedConstraint(s.to_string()));
        }
        if s.starts_with('[') || s.starts_with('(') {
            return VersionRange::parse_interval(s).map(|range| match range.exact() {
                Some(v) => Self::Exact(v.clone()),
                None => Self::Range(range),
            });
        }
        if let Some(exact) = s.strip_prefix('=') {
            if !exact.starts_with('=') && !s.contains(',') {
                return Version::parse(exact)
                    .map(Self::Exact)
                    .map_err(|_| VersionError::MalformedConstraint(s.to_string()));
            }
        }
        if s.starts_with('>') || s.starts_with('<') {
            return VersionRange::parse_comparators(s).map(Self::Range);
        }
        Version::parse(s).map(Self::Require)
    }

    pub fn allows(&self, version: &Version) -> bool {
        match self {
            Self::Require(min) => version >= min,
            Self::Exact(v) => version == v,
            Self::Range(range) => range.contains(version),
            Self::Prefix(None) => true,
            Self::Prefix(Some(prefix)) => version.starts_with(prefix),
        }
    }

    /// Concrete versions named by the constraint itself.
    pub fn named_versions(&self) -> Vec<&Version> {
        match self {
            Self::Require(v) | Self::Exact(v) => vec![v],
            Self::Range(range) => [&range.lower, &range.upper]
                .into_iter()
                .flatten()
                .filter(|b| b.inclusive)
                .map(|b| &b.version)
                .collect(),
            Self::Prefix(_) => Vec::new(),
        }
    }
}

/// A version interval; a missing bound is unbounded on that side.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionRange {
    pub lower: Option<Bound>,
    pub upper: Option<Bound>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bound {
    pub version: Version,
    pub inclusive: bool,
}

impl VersionRange {
    /// Parse a Maven-style interval: `[1.0,2.0)`, `[1.0,]`, `(,2.0)`, `[1.0]`.
    fn parse_interval(input: &str) -> Result<Self, VersionError> {
        let malformed = || VersionError::MalformedConstraint(input.to_string());
        let s = input.trim();
        let open_inclusive = s.starts_with('[');
        let close_inclusive = s.ends_with(']');
        if s.len() < 2 || !(s.ends_with(']') || s.ends_with(')')) {
            return Err(malformed());
        }
        let inner = &s[1..s.len() - 1];

        let bound = |text: &str, inclusive: bool| -> Result<Option<Bound>, VersionError> {
            let text = text.trim();
            if text.is_empty() {
                return Ok(None);
            }
            let version = Version::parse(text).map_err(|_| malformed())?;
            Ok(Some(Bound { version, inclusive }))
        };

        match inner.split_once(',') {
            Some((lower, upper)) => Ok(VersionRange {
                lower: bound(lower, open_inclusive)?,
                upper: bound(upper, close_inclusive)?,
            }),
            None => {
                // `[1.0]` means exactly 1.0
                if !(open_inclusive && close_inclusive) {
                    return Err(malformed());
                }
                let exact = bound(inner, true)?.ok_or_else(malformed)?;
                Ok(VersionRange {
                    lower: Some(exact.clone()),
                    upper: Some(exact),
                })
            }
        }
    }

    /// Parse comma-joined comparators: `>=1.0`, `>1.0, <2.0`, `<=3`.
    fn parse_comparators(input: &str) -> Result<Self, VersionError> {
        let malformed = || VersionError::MalformedConstraint(input.to_string());
        let mut range = VersionRange {
            lower: None,
            upper: None,
        };
        for part in input.split(',') {
            let part = part.trim();
            let (op, rest) = if let Some(rest) = part.strip_prefix(">=") {
                (">=", rest)
            } else if let Some(rest) = part.strip_prefix("<=") {
                ("<=", rest)
            } else if let Some(rest) = part.strip_prefix('>') {
                (">", rest)
            } else if let Some(rest) = part.strip_prefix('<') {
                ("<", rest)
            } else {
                return Err(malformed());
            };
            let version = Version::parse(rest).map_err(|_| malformed())?;
            let slot = if op.starts_with('>') {
                &mut range.lower
            } else {
                &mut range.upper
            };
            if slot.is_some() {
                return Err(malformed());
            }
            *slot = Some(Bound {
                version,
                inclusive: op.ends_with('='),
            });
        }
        Ok(range)
    }

    fn exact(&self) -> Option<&Version> {
        match (&self.lower, &self.upper) {
            (Some(l), Some(u)) if l.inclusive && u.inclusive && l.version == u.version => {
                Some(&l.version)
            }
            _ => None,
        }
    }

    /// Check if a version satisfies this range.
    pub fn contains(&self, version: &Version) -> bool {
        if let Some(ref lower) = self.lower {
            let cmp = version.cmp(&lower.version);
            if lower.inclusive {
                if cmp == Ordering::Less {
                    return false;
                }
            } else if cmp != Ordering::Greater {
                return false;
            }
        }
        if let Some(ref upper) = self.upper {
            let cmp = version.cmp(&upper.version);
            if upper.inclusive {
                if cmp == Ordering::Greater {
                    return false;
                }
            } else if cmp != Ordering::Less {
                return false;
            }
        }
        true
    }
}
