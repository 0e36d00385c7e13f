//! The name-matching index is an external collaborator; the
//! core only consumes a lookup that maps a scientific name + rank to a
//! nested-set `(left, right)` interval plus accepted LSID.

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NameMatch {
    pub lsid: String,
    pub accepted_lsid: String,
    pub left: i64,
    pub right: i64,
    pub is_synonym: bool,
}

#[derive(Debug, thiserror::Error)]
pub enum NameMatchError {
    #[error("no match for name {0:?}")]
    NotFound(String),
    /// Carries the alternative results; the caller uses the first.
    #[error("{0} homonym(s) found for name {name:?}", .alternatives.len())]
    Homonym {
        name: String,
        alternatives: Vec<NameMatch>,
    },
}

/// The consumed name-matching interface.
pub trait NameIndex: Send + Sync {
    fn search(&self, name: &str, rank: Option<&str>) -> Result<NameMatch, NameMatchError>;
}

/// Resolves `name` via `index`, using the first alternative when the
/// lookup reports a homonym.
pub fn resolve(index: &dyn NameIndex, name: &str, rank: Option<&str>) -> Option<NameMatch> {
    match index.search(name, rank) {
        Ok(m) => Some(m),
        Err(NameMatchError::Homonym { alternatives, .. }) => alternatives.into_iter().next(),
        Err(NameMatchError::NotFound(_)) => None,
    }
}
