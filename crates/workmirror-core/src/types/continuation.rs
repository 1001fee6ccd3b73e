//! Continuation cursor type.

use std::fmt;

/// Opaque continuation marker returned by a paginated query.
///
/// Carries no semantics beyond equality and presence; it is passed back
/// to the remote verbatim.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct ContinuationToken(String);

impl ContinuationToken {
    /// Wrap a raw cursor. Empty strings mean "no more pages" and yield `None`.
    pub fn from_raw(raw: Option<String>) -> Option<Self> {
        raw.filter(|s| !s.is_empty()).map(Self)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for ContinuationToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ContinuationToken").field(&self.0).finish()
    }
}

impl fmt::Display for ContinuationToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
