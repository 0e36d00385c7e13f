//! CSV emission: when enabled, every indexed document is
//! additionally appended — tab-separated, pipe-joined multi-values — to
//! a writer. The header is the engine's canonical header concatenated
//! with the default misc fields, assertion/meta columns, and sampled
//! layer names, in that order. A sensitive-exclusion variant omits a
//! caller-supplied set of column names from both the header and every
//! row, so column alignment is preserved either way.

use crate::builder::RecycleDoc;
use std::collections::HashSet;
use std::io::{self, Write};

#[derive(Debug, Clone, Default)]
pub struct CsvHeader {
    pub canonical: Vec<String>,
    pub misc_fields: Vec<String>,
    pub assertion_meta_columns: Vec<String>,
    pub sampled_layers: Vec<String>,
}

impl CsvHeader {
    /// The full column order: canonical, then misc fields, then
    /// assertion/meta columns, then sampled layer names.
    pub fn columns(&self) -> Vec<String> {
        self.canonical
            .iter()
            .chain(self.misc_fields.iter())
            .chain(self.assertion_meta_columns.iter())
            .chain(self.sampled_layers.iter())
            .cloned()
            .collect()
    }

    /// The column order with `excluded` names dropped entirely, used for
    /// the sensitive-exclusion output variant.
    pub fn columns_excluding(&self, excluded: &HashSet<String>) -> Vec<String> {
        self.columns()
            .into_iter()
            .filter(|c| !excluded.contains(c))
            .collect()
    }
}

/// Writes one tab-separated row for `doc` in `columns` order. A field
/// with multiple values is pipe-joined; a field absent from the document
/// is emitted as an empty cell so column alignment never drifts.
pub fn write_row(out: &mut dyn Write, columns: &[String], doc: &RecycleDoc) -> io::Result<()> {
    let mut first = true;
    for column in columns {
        if !first {
            write!(out, "\t")?;
        }
        first = false;
        write!(out, "{}", doc.field_values(column).join("|"))?;
    }
    writeln!(out)
}

pub fn write_header(out: &mut dyn Write, columns: &[String]) -> io::Result<()> {
    writeln!(out, "{}", columns.join("\t"))
}
