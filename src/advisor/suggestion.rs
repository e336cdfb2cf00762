// Index suggestion - builds an ADD INDEX block when no existing index fits
//
// Equality fields lead the new index, date (range) fields follow, and
// logical flags only pad the key up to the field budget.

use crate::config::AdvisorConfig;
use crate::schema::Table;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;

/// How a filter field is expected to be compared
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldClass {
    /// Matched with `=`; leads the index
    Equality,
    /// Date or datetime; placed after equality fields
    Range,
    /// Low-cardinality flag; only used as padding
    Logical,
}

/// Classify `field` using its declared type, or its name when untyped.
///
/// Naming conventions (`lg-` for flags, `dt-` for dates) only apply when
/// the table does not declare a type for the field.
pub fn classify_field(table: &Table, field: &str) -> FieldClass {
    let declared = table
        .field(field)
        .map(|f| f.data_type.trim().to_ascii_lowercase())
        .filter(|t| !t.is_empty());

    match declared {
        Some(t) if t.contains("logical") || t == "l" => FieldClass::Logical,
        Some(t) if t.contains("date") || t == "d" => FieldClass::Range,
        Some(_) => FieldClass::Equality,
        None => classify_by_name(field),
    }
}

fn classify_by_name(field: &str) -> FieldClass {
    let lower = field.to_ascii_lowercase();
    if lower.starts_with("lg-") || lower.starts_with("lg_") {
        FieldClass::Logical
    } else if lower.starts_with("dt-") || lower.starts_with("dt_") {
        FieldClass::Range
    } else {
        FieldClass::Equality
    }
}

/// Order `used` fields for a new index.
///
/// Returns equality fields, then range fields, each in their original
/// relative order. Logical fields are appended only while the total stays
/// below `max_fields`; equality and range fields are never dropped.
pub fn order_fields_for_index(table: &Table, used: &[String], max_fields: usize) -> Vec<String> {
    let mut equality = Vec::new();
    let mut range = Vec::new();
    let mut logical = Vec::new();

    for field in used {
        match classify_field(table, field) {
            FieldClass::Equality => equality.push(field.clone()),
            FieldClass::Range => range.push(field.clone()),
            FieldClass::Logical => logical.push(field.clone()),
        }
    }

    let mut ordered = equality;
    ordered.extend(range);

    if ordered.len() < max_fields {
        let missing = max_fields - ordered.len();
        ordered.extend(logical.into_iter().take(missing));
    }

    ordered
}

/// A generated index definition
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IndexSuggestion {
    pub index_name: String,
    pub fields: Vec<String>,
    /// `.df` fragment accepted by [`DfParser`](crate::schema::DfParser)
    pub df: String,
}

/// Renders ADD INDEX blocks for tables without a usable index.
///
/// The random source for index names is a type parameter so tests can use
/// a seeded generator.
pub struct SuggestionGenerator<R = StdRng> {
    rng: R,
    storage_area: String,
    index_num: u32,
    max_fields: usize,
}

impl SuggestionGenerator<StdRng> {
    /// Seeded from `config.seed` when present, from the OS otherwise
    pub fn from_config(config: &AdvisorConfig) -> Self {
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        Self::with_rng(rng, config)
    }
}

impl<R: Rng> SuggestionGenerator<R> {
    pub fn with_rng(rng: R, config: &AdvisorConfig) -> Self {
        Self {
            rng,
            storage_area: config.storage_area.clone(),
            index_num: config.index_num,
            max_fields: config.max_index_fields,
        }
    }

    /// Suggest an index on `table` for the filter fields in `used`
    pub fn suggest(&mut self, table: &Table, used: &[String]) -> IndexSuggestion {
        let fields = order_fields_for_index(table, used, self.max_fields);
        let index_name = self.random_index_name(&table.name);
        let df = self.generate_index_df(&table.name, &fields, Some(&index_name), None);

        IndexSuggestion {
            index_name,
            fields,
            df,
        }
    }

    /// `<table>__ai<NNNN>` with a random four-digit suffix
    pub fn random_index_name(&mut self, table: &str) -> String {
        let suffix: u32 = self.rng.random_range(1000..=9999);
        format!("{}__ai{}", table, suffix)
    }

    /// Render an ADD INDEX block.
    ///
    /// A missing name is generated; a missing number falls back to the
    /// configured INDEX-NUM. Every field is written ASCENDING and the text
    /// has no trailing newline.
    pub fn generate_index_df(
        &mut self,
        table: &str,
        fields: &[String],
        index_name: Option<&str>,
        index_num: Option<u32>,
    ) -> String {
        let index_name = match index_name {
            Some(name) => name.to_string(),
            None => self.random_index_name(table),
        };
        let num = index_num.unwrap_or(self.index_num);

        let mut df = format!("ADD INDEX \"{}\" ON \"{}\"\n", index_name, table);
        df.push_str(&format!("  AREA \"{}\"\n", self.storage_area));
        df.push_str(&format!("  INDEX-NUM {}\n", num));
        df.push_str(&format!("  FOREIGN-NAME \"{}##{}\"\n", table, index_name));

        for field in fields {
            df.push_str(&format!("  INDEX-FIELD \"{}\" ASCENDING\n", field));
        }

        df.trim_end().to_string()
    }
}
