//! Index schema: per-field type, multi-valuedness, and
//! copy-field destinations. Fields not explicitly declared fall back to
//! a dynamic-suffix rule (`_s`/`_i`/`_d`/`_dt`).

use crate::record::is_multi_valued;
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldType {
    Str,
    Int,
    Double,
    Date,
}

#[derive(Debug, Clone)]
pub struct CopyField {
    pub destination: String,
    pub max_chars: Option<usize>,
}

impl CopyField {
    pub fn new(destination: impl Into<String>) -> Self {
        CopyField {
            destination: destination.into(),
            max_chars: None,
        }
    }

    pub fn truncated(destination: impl Into<String>, max_chars: usize) -> Self {
        CopyField {
            destination: destination.into(),
            max_chars: Some(max_chars),
        }
    }
}

#[derive(Debug, Clone)]
pub struct FieldSchema {
    pub name: String,
    pub field_type: FieldType,
    pub multi_valued: bool,
    pub copy_fields: Vec<CopyField>,
}

impl FieldSchema {
    pub fn declared(name: impl Into<String>, field_type: FieldType, multi_valued: bool) -> Self {
        FieldSchema {
            name: name.into(),
            field_type,
            multi_valued,
            copy_fields: Vec::new(),
        }
    }

    pub fn with_copy_field(mut self, copy_field: CopyField) -> Self {
        self.copy_fields.push(copy_field);
        self
    }
}

/// Recognizes the dynamic-field suffix convention; returns `None` for a
/// field name that carries no typed suffix (callers treat this as string).
fn dynamic_field_type(name: &str) -> Option<FieldType> {
    if name.ends_with("_dt") {
        Some(FieldType::Date)
    } else if name.ends_with("_i") {
        Some(FieldType::Int)
    } else if name.ends_with("_d") {
        Some(FieldType::Double)
    } else if name.ends_with("_s") {
        Some(FieldType::Str)
    } else {
        None
    }
}

#[derive(Default)]
pub struct Schema {
    declared: HashMap<String, FieldSchema>,
}

impl Schema {
    pub fn new() -> Self {
        Schema::default()
    }

    pub fn declare(&mut self, field: FieldSchema) -> &mut Self {
        self.declared.insert(field.name.clone(), field);
        self
    }

    /// Resolves `name` to its field schema: a declared field if present,
    /// otherwise a synthesized dynamic field going by suffix convention.
    /// This is the lookup the document builder memoizes per field name.
    pub fn lookup(&self, name: &str) -> FieldSchema {
        if let Some(declared) = self.declared.get(name) {
            return declared.clone();
        }
        let field_type = dynamic_field_type(name).unwrap_or(FieldType::Str);
        FieldSchema {
            name: name.to_string(),
            field_type,
            multi_valued: is_multi_valued(name),
            copy_fields: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn declared_field_is_returned_verbatim() {
        let mut schema = Schema::new();
        schema.declare(
            FieldSchema::declared("scientific_name", FieldType::Str, false)
                .with_copy_field(CopyField::truncated("text", 256)),
        );
        let resolved = schema.lookup("scientific_name");
        assert_eq!(resolved.field_type, FieldType::Str);
        assert_eq!(resolved.copy_fields.len(), 1);
        assert_eq!(resolved.copy_fields[0].max_chars, Some(256));
    }

    #[test]
    fn undeclared_field_falls_back_to_dynamic_suffix() {
        let schema = Schema::new();
        assert_eq!(schema.lookup("depth_d").field_type, FieldType::Double);
        assert_eq!(schema.lookup("individual_count_i").field_type, FieldType::Int);
        assert_eq!(schema.lookup("event_date_dt").field_type, FieldType::Date);
        assert_eq!(schema.lookup("raw_taxon_name_s").field_type, FieldType::Str);
        assert_eq!(schema.lookup("no_suffix_here").field_type, FieldType::Str);
    }

    #[test]
    fn undeclared_multi_valued_business_field_is_recognized() {
        let schema = Schema::new();
        assert!(schema.lookup("collectors").multi_valued);
        assert!(!schema.lookup("raw_taxon_name_s").multi_valued);
    }
}
