//! An explicit context object built at startup and passed down, in place
//! of process-wide singletons for configuration and vocabulary caches.
//! `IndexingContext` owns everything `indexFromMap` needs to resolve an
//! occurrence record, and is shared (read-only after construction)
//! across worker threads.

use crate::backend::IndexBackend;
use crate::config::Config;
use crate::vocab::{ChecklistCache, NameIndex, NoSubgroups, SpeciesGroups, SubgroupSource, TaxonSpeciesListDAO};
use std::sync::Arc;

pub struct IndexingContext {
    pub config: Config,
    pub backend: Arc<dyn IndexBackend>,
    pub name_index: Arc<dyn NameIndex>,
    pub species_list_dao: Arc<dyn TaxonSpeciesListDAO>,
    pub species_groups: Arc<SpeciesGroups>,
    pub subgroup_source: Arc<dyn SubgroupSource>,
    pub checklist: Arc<ChecklistCache>,
}

impl IndexingContext {
    pub fn new(
        config: Config,
        backend: Arc<dyn IndexBackend>,
        name_index: Arc<dyn NameIndex>,
        species_list_dao: Arc<dyn TaxonSpeciesListDAO>,
        checklist_path: impl Into<std::path::PathBuf>,
    ) -> Self {
        IndexingContext {
            config,
            backend,
            name_index,
            species_list_dao,
            species_groups: Arc::new(SpeciesGroups::new()),
            subgroup_source: Arc::new(NoSubgroups),
            checklist: Arc::new(ChecklistCache::new(checklist_path)),
        }
    }

    pub fn with_subgroup_source(mut self, source: Arc<dyn SubgroupSource>) -> Self {
        self.subgroup_source = source;
        self
    }
}
