//! `TaxonSpeciesListDAO`: external collaborator mapping a
//! taxon LSID to the set of curated species lists (e.g. conservation
//! status lists) it appears on. Per-record, a record's species-list
//! membership fields are populated from this lookup keyed by the
//! record's resolved taxon LSID.

use std::collections::HashMap;

pub trait TaxonSpeciesListDAO: Send + Sync {
    /// Returns the species list field values (e.g. `"Endangered"`,
    /// `"Invasive"`) a taxon belongs to. An unknown LSID yields an empty
    /// list, not an error — species-list membership is enrichment, never
    /// a reason to drop a record.
    fn lists_for_lsid(&self, lsid: &str) -> Vec<String>;
}

/// In-memory DAO used by tests and standalone runs without a configured
/// species-list service.
#[derive(Default)]
pub struct InMemorySpeciesListDAO {
    memberships: HashMap<String, Vec<String>>,
}

impl InMemorySpeciesListDAO {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_membership(mut self, lsid: impl Into<String>, lists: Vec<String>) -> Self {
        self.memberships.insert(lsid.into(), lists);
        self
    }
}

impl TaxonSpeciesListDAO for InMemorySpeciesListDAO {
    fn lists_for_lsid(&self, lsid: &str) -> Vec<String> {
        self.memberships.get(lsid).cloned().unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_lsid_yields_empty_not_error() {
        let dao = InMemorySpeciesListDAO::new();
        assert!(dao.lists_for_lsid("urn:lsid:unknown").is_empty());
    }

    #[test]
    fn known_lsid_returns_configured_lists() {
        let dao = InMemorySpeciesListDAO::new()
            .with_membership("urn:lsid:a", vec!["Endangered".to_string()]);
        assert_eq!(dao.lists_for_lsid("urn:lsid:a"), vec!["Endangered".to_string()]);
    }
}
