//! `SpeciesGroups`: the static species-group hierarchy plus dynamically
//! loaded subgroups.
//!
//! On first use each static group's included/excluded taxon names are
//! resolved via the name-matching lookup; taxa that fail to resolve are
//! dropped (logged at debug). Synonyms are followed once via
//! `accepted_lsid`.

use crate::vocab::name_match::{resolve, NameIndex};
use serde::Deserialize;
use std::sync::OnceLock;

pub type Interval = (i64, i64);

#[derive(Debug, Clone)]
pub struct SpeciesGroup {
    pub name: String,
    pub rank: Option<String>,
    pub included_taxa: Vec<String>,
    pub excluded_taxa: Vec<String>,
    pub included_intervals: Vec<Interval>,
    pub excluded_intervals: Vec<Interval>,
    pub parent: Option<String>,
}

impl SpeciesGroup {
    fn static_def(
        name: &str,
        included_taxa: &[&str],
        excluded_taxa: &[&str],
        parent: Option<&str>,
    ) -> SpeciesGroup {
        SpeciesGroup {
            name: name.to_string(),
            rank: None,
            included_taxa: included_taxa.iter().map(|s| s.to_string()).collect(),
            excluded_taxa: excluded_taxa.iter().map(|s| s.to_string()).collect(),
            included_intervals: Vec::new(),
            excluded_intervals: Vec::new(),
            parent: parent.map(str::to_string),
        }
    }

    /// Membership test: a taxon with own left value `lft` is a
    /// member iff `lft` falls in some included interval, and in no
    /// excluded interval — excluded intervals are checked first so they
    /// can veto.
    pub fn contains(&self, lft: i64) -> bool {
        if self
            .excluded_intervals
            .iter()
            .any(|(l, r)| lft >= *l && lft <= *r)
        {
            return false;
        }
        self.included_intervals
            .iter()
            .any(|(l, r)| lft >= *l && lft <= *r)
    }
}

/// The forest of static species groups this pipeline indexes against. A
/// representative subset of the production hierarchy; new groups are
/// added here, not discovered at runtime.
fn static_group_definitions() -> Vec<SpeciesGroup> {
    vec![
        SpeciesGroup::static_def("Animals", &["Animalia"], &[], None),
        SpeciesGroup::static_def("Birds", &["Aves"], &[], Some("Animals")),
        SpeciesGroup::static_def(
            "Mammals",
            &["Mammalia"],
            &[],
            Some("Animals"),
        ),
        SpeciesGroup::static_def("Plants", &["Plantae"], &[], None),
        SpeciesGroup::static_def(
            "Flowering Plants",
            &["Magnoliophyta"],
            &[],
            Some("Plants"),
        ),
        SpeciesGroup::static_def("Fungi", &["Fungi"], &[], None),
        SpeciesGroup::static_def("Bacteria", &["Bacteria"], &[], None),
    ]
}

#[derive(Debug, Deserialize)]
struct SubgroupDescriptorEntry {
    #[serde(rename = "speciesGroup")]
    species_group: String,
    #[serde(rename = "taxonRank")]
    taxon_rank: Option<String>,
    taxa: Vec<SubgroupTaxon>,
}

#[derive(Debug, Deserialize)]
struct SubgroupTaxon {
    name: String,
    #[allow(dead_code)]
    common: Option<String>,
}

/// Source of the dynamic subgroups descriptor: a local file or a URL.
/// Fetching is abstracted so tests can supply an in-memory document.
pub trait SubgroupSource: Send + Sync {
    fn fetch(&self) -> Result<String, String>;
}

pub struct NoSubgroups;
impl SubgroupSource for NoSubgroups {
    fn fetch(&self) -> Result<String, String> {
        Ok("[]".to_string())
    }
}

struct GroupsState {
    static_groups: Vec<SpeciesGroup>,
    dynamic_subgroups: Vec<SpeciesGroup>,
}

pub struct SpeciesGroups {
    state: OnceLock<GroupsState>,
}

impl SpeciesGroups {
    pub fn new() -> Self {
        SpeciesGroups {
            state: OnceLock::new(),
        }
    }

    fn ensure_loaded(&self, name_index: &dyn NameIndex, subgroups: &dyn SubgroupSource) -> &GroupsState {
        self.state.get_or_init(|| {
            let mut static_groups = static_group_definitions();
            for group in &mut static_groups {
                resolve_group_intervals(group, name_index);
            }

            let dynamic_subgroups = load_dynamic_subgroups(subgroups, name_index, &static_groups);

            GroupsState {
                static_groups,
                dynamic_subgroups,
            }
        })
    }

    /// Group names whose included interval contains the taxon's own left
    /// value `lft` (and which do not exclude it). Tie-breaking is by
    /// static definition order.
    pub fn get_species_groups(
        &self,
        name_index: &dyn NameIndex,
        subgroups: &dyn SubgroupSource,
        lft: i64,
        _rgt: i64,
    ) -> Vec<String> {
        self.ensure_loaded(name_index, subgroups)
            .static_groups
            .iter()
            .filter(|g| g.contains(lft))
            .map(|g| g.name.clone())
            .collect()
    }

    pub fn get_species_subgroups(
        &self,
        name_index: &dyn NameIndex,
        subgroups: &dyn SubgroupSource,
        lft: i64,
        _rgt: i64,
    ) -> Vec<String> {
        self.ensure_loaded(name_index, subgroups)
            .dynamic_subgroups
            .iter()
            .filter(|g| g.contains(lft))
            .map(|g| g.name.clone())
            .collect()
    }
}

impl Default for SpeciesGroups {
    fn default() -> Self {
        Self::new()
    }
}

fn resolve_group_intervals(group: &mut SpeciesGroup, name_index: &dyn NameIndex) {
    group.included_intervals = group
        .included_taxa
        .iter()
        .filter_map(|name| resolve_interval(name, group.rank.as_deref(), name_index))
        .collect();
    group.excluded_intervals = group
        .excluded_taxa
        .iter()
        .filter_map(|name| resolve_interval(name, group.rank.as_deref(), name_index))
        .collect();
}

/// Resolves `name` to an interval, following a synonym's `accepted_lsid`
/// once if the first hit is a synonym. Returns `None` (dropped, logged at
/// debug) if resolution fails entirely.
fn resolve_interval(name: &str, rank: Option<&str>, name_index: &dyn NameIndex) -> Option<Interval> {
    let hit = match resolve(name_index, name, rank) {
        Some(hit) => hit,
        None => {
            tracing::debug!(taxon = name, "species group taxon failed to resolve");
            return None;
        }
    };
    if hit.is_synonym && hit.accepted_lsid != hit.lsid {
        if let Some(accepted) = resolve(name_index, &hit.accepted_lsid, rank) {
            return Some((accepted.left, accepted.right));
        }
    }
    Some((hit.left, hit.right))
}

fn load_dynamic_subgroups(
    source: &dyn SubgroupSource,
    name_index: &dyn NameIndex,
    static_groups: &[SpeciesGroup],
) -> Vec<SpeciesGroup> {
    let document = match source.fetch() {
        Ok(doc) => doc,
        Err(err) => {
            tracing::debug!(error = %err, "failed to fetch species subgroup descriptor");
            return Vec::new();
        }
    };

    let entries: Vec<SubgroupDescriptorEntry> = match serde_json::from_str(&document) {
        Ok(entries) => entries,
        Err(err) => {
            tracing::debug!(error = %err, "failed to parse species subgroup descriptor");
            return Vec::new();
        }
    };

    entries
        .into_iter()
        .map(|entry| {
            let mut group = SpeciesGroup {
                name: entry.species_group.clone(),
                rank: entry.taxon_rank.clone(),
                included_taxa: entry.taxa.iter().map(|t| t.name.clone()).collect(),
                excluded_taxa: Vec::new(),
                included_intervals: Vec::new(),
                excluded_intervals: Vec::new(),
                parent: None,
            };

            if entry.taxon_rank.is_none() && entry.species_group == "Plants" {
                group.included_intervals = static_groups
                    .iter()
                    .filter(|g| g.name == "Plants")
                    .flat_map(|g| g.included_intervals.iter().copied())
                    .collect();
            } else {
                resolve_group_intervals(&mut group, name_index);
            }
            group
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vocab::name_match::{NameMatch, NameMatchError};
    use std::collections::HashMap;

    struct FakeIndex(HashMap<&'static str, (i64, i64)>);

    impl NameIndex for FakeIndex {
        fn search(&self, name: &str, _rank: Option<&str>) -> Result<NameMatch, NameMatchError> {
            self.0
                .get(name)
                .map(|(l, r)| NameMatch {
                    lsid: name.to_string(),
                    accepted_lsid: name.to_string(),
                    left: *l,
                    right: *r,
                    is_synonym: false,
                })
                .ok_or_else(|| NameMatchError::NotFound(name.to_string()))
        }
    }

    #[test]
    fn membership_respects_exclusions_first() {
        let group = SpeciesGroup {
            name: "Test".to_string(),
            rank: None,
            included_taxa: vec![],
            excluded_taxa: vec![],
            included_intervals: vec![(1, 100)],
            excluded_intervals: vec![(40, 60)],
            parent: None,
        };
        assert!(group.contains(10));
        assert!(!group.contains(50));
        assert!(!group.contains(200));
    }

    #[test]
    fn unresolvable_taxa_are_dropped_not_fatal() {
        let index = FakeIndex(HashMap::from([("Animalia", (1, 1000))]));
        let groups = SpeciesGroups::new();
        let subgroups = NoSubgroups;
        // "Mammalia" et al fail to resolve in this fake index; Animals
        // should still resolve since "Animalia" is present.
        let found = groups.get_species_groups(&index, &subgroups, 5, 5);
        assert!(found.contains(&"Animals".to_string()));
        assert!(!found.contains(&"Mammals".to_string()));
    }

    #[test]
    fn dynamic_plants_subgroup_inherits_static_interval() {
        let index = FakeIndex(HashMap::from([("Plantae", (2000, 3000))]));
        let groups = SpeciesGroups::new();

        struct FixedSource;
        impl SubgroupSource for FixedSource {
            fn fetch(&self) -> Result<String, String> {
                Ok(r#"[{"speciesGroup":"Plants","taxa":[{"name":"Plantae"}]}]"#.to_string())
            }
        }

        let found = groups.get_species_subgroups(&index, &FixedSource, 2500, 2500);
        assert_eq!(found, vec!["Plants".to_string()]);
    }
}
