//! Table, field and index model built from data-dictionary exports.
//!
//! [`DfParser`] turns one `.df` blob into a [`TableMap`]; [`SchemaCatalog`]
//! merges the maps of every loaded blob.

pub mod df_parser;

pub use df_parser::DfParser;

use serde::Serialize;
use std::collections::BTreeMap;
use tracing::warn;

/// Tables of a single schema blob, keyed by case-sensitive name
pub type TableMap = BTreeMap<String, Table>;

/// Field declaration
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Field {
    pub name: String,
    /// Declared data type, lowercased (e.g. "character", "logical", "date")
    pub data_type: String,
}

/// One component of an index, in key order
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IndexField {
    pub name: String,
    pub ascending: bool,
}

impl IndexField {
    pub fn ascending(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ascending: true,
        }
    }
}

/// Index definition
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IndexDef {
    pub name: String,
    pub primary: bool,
    pub unique: bool,
    pub area: Option<String>,
    /// Components in declaration order; this order drives prefix matching
    pub fields: Vec<IndexField>,
}

impl IndexDef {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            primary: false,
            unique: false,
            area: None,
            fields: Vec::new(),
        }
    }

    /// Build an index from ascending field names
    pub fn with_fields<I, S>(name: impl Into<String>, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut index = Self::new(name);
        index.fields = fields.into_iter().map(IndexField::ascending).collect();
        index
    }

    pub fn field_names(&self) -> Vec<String> {
        self.fields.iter().map(|f| f.name.clone()).collect()
    }
}

/// Table definition
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Table {
    pub name: String,
    pub fields: Vec<Field>,
    /// Indexes in declaration order; earlier wins score ties
    pub indexes: Vec<IndexDef>,
}

impl Table {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Look up a field declaration; ABL names are case-insensitive
    pub fn field(&self, name: &str) -> Option<&Field> {
        self.fields
            .iter()
            .find(|f| f.name == name)
            .or_else(|| self.fields.iter().find(|f| f.name.eq_ignore_ascii_case(name)))
    }

    pub fn index(&self, name: &str) -> Option<&IndexDef> {
        self.indexes.iter().find(|i| i.name == name)
    }
}

/// Every table known to an analysis run.
///
/// Merging replaces a table wholesale when a later blob defines the same
/// name again. Fields and indexes are never unioned across blobs, so a table
/// split over two `.df` files keeps only the later half.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct SchemaCatalog {
    tables: TableMap,
}

impl SchemaCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Merge per-blob table maps in input order
    pub fn merge<I>(maps: I) -> Self
    where
        I: IntoIterator<Item = TableMap>,
    {
        let mut catalog = Self::new();
        for map in maps {
            catalog.extend(map);
        }
        catalog
    }

    /// Add every table of `map`, replacing same-named tables
    pub fn extend(&mut self, map: TableMap) {
        for (name, table) in map {
            self.insert(name, table);
        }
    }

    /// Insert `table` under `name`, returning the definition it replaced
    pub fn insert(&mut self, name: String, table: Table) -> Option<Table> {
        let previous = self.tables.insert(name, table);
        if let Some(prev) = &previous {
            warn!(
                table = %prev.name,
                fields = prev.fields.len(),
                indexes = prev.indexes.len(),
                "table redefined by a later schema; earlier definition discarded"
            );
        }
        previous
    }

    pub fn get(&self, name: &str) -> Option<&Table> {
        self.tables.get(name)
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }

    pub fn len(&self) -> usize {
        self.tables.len()
    }

    pub fn tables(&self) -> impl Iterator<Item = &Table> {
        self.tables.values()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn table(name: &str, field: &str, index: &str) -> Table {
        Table {
            name: name.to_string(),
            fields: vec![Field {
                name: field.to_string(),
                data_type: "character".to_string(),
            }],
            indexes: vec![IndexDef::with_fields(index, [field])],
        }
    }

    #[test]
    fn test_merge_overwrites_whole_table() {
        let mut first = TableMap::new();
        first.insert("T".to_string(), table("T", "a", "idx_a"));
        first.insert("U".to_string(), table("U", "u", "idx_u"));

        let mut second = TableMap::new();
        second.insert("T".to_string(), table("T", "b", "idx_b"));

        let catalog = SchemaCatalog::merge([first, second]);

        assert_eq!(catalog.len(), 2);
        assert_eq!(catalog.get("T"), Some(&table("T", "b", "idx_b")));
        assert!(catalog.get("T").unwrap().index("idx_a").is_none());
        assert!(catalog.get("U").is_some());
    }

    #[test]
    fn test_lookup_is_case_sensitive() {
        let mut map = TableMap::new();
        map.insert("Customer".to_string(), Table::new("Customer"));
        let catalog = SchemaCatalog::merge([map]);

        assert!(catalog.get("Customer").is_some());
        assert!(catalog.get("customer").is_none());
    }

    #[test]
    fn test_field_lookup_ignores_case() {
        let t = table("T", "Cust-Num", "idx");
        assert!(t.field("cust-num").is_some());
        assert!(t.field("Cust-Num").is_some());
        assert!(t.field("name").is_none());
    }

    #[test]
    fn test_insert_returns_replaced_table() {
        let mut catalog = SchemaCatalog::new();
        assert!(catalog.insert("T".into(), Table::new("T")).is_none());
        assert!(catalog.insert("T".into(), table("T", "a", "i")).is_some());
        assert!(!catalog.is_empty());
    }
}
