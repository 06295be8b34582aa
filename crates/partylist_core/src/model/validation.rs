//! Display-name normalization and model validation errors.

use once_cell::sync::Lazy;
use regex::Regex;
use std::error::Error;
use std::fmt::{Display, Formatter};

static WHITESPACE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("valid ws regex"));

/// Validation failures raised before any record is written.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationError {
    /// Family name is blank after trimming.
    BlankFamilyName,
    /// Member name is blank after trimming.
    BlankMemberName,
    /// Caller supplied the nil UUID as an identity.
    NilId,
}

impl Display for ValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::BlankFamilyName => write!(f, "family name must not be blank"),
            Self::BlankMemberName => write!(f, "member name must not be blank"),
            Self::NilId => write!(f, "id must not be nil"),
        }
    }
}

impl Error for ValidationError {}

/// Trims a display name and collapses inner whitespace runs to one space.
///
/// Returns `None` when nothing is left after trimming.
pub fn normalize_name(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    Some(WHITESPACE_RE.replace_all(trimmed, " ").into_owned())
}
