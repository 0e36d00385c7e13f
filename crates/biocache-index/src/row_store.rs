//! The row store is out of scope — an external collaborator
//! specified only by the interface the engine consumes.

use crate::record::OccurrenceRecord;
use time::OffsetDateTime;

pub trait RowStore: Send + Sync {
    fn get(&self, row_key: &str) -> Option<OccurrenceRecord>;

    /// Streams `(rowKey, map)` pairs modified at-or-after `since`,
    /// invoking `on_row` for each. Returning `false` from `on_row` stops
    /// the page early.
    fn page_by_time_range(&self, since: Option<OffsetDateTime>, on_row: &mut dyn FnMut(&str, &OccurrenceRecord) -> bool);

    fn get_user_ids_for_assertions(&self, row_key: &str) -> Vec<String>;
}
