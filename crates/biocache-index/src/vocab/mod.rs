mod assertions;
mod checklist;
mod name_match;
mod species_groups;
mod species_list;

pub use assertions::{get_by_code, get_by_name, get_missing_by_code, AssertionCode, Category, PROCESSING_ERROR, VERIFIED};
pub use checklist::ChecklistCache;
pub use name_match::{resolve, NameIndex, NameMatch, NameMatchError};
pub use species_groups::{Interval, NoSubgroups, SpeciesGroup, SpeciesGroups, SubgroupSource};
pub use species_list::{InMemorySpeciesListDAO, TaxonSpeciesListDAO};
