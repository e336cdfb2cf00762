// .df parser - reads Progress data-dictionary exports
//
// Only the records that matter for index analysis are recognized; every other
// line (descriptions, formats, labels, the PSC trailer) is skipped.

use super::{Field, IndexDef, IndexField, Table, TableMap};
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::{debug, trace};

static ADD_TABLE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"(?i)^ADD\s+TABLE\s+"([^"]+)""#).expect("ADD TABLE pattern is valid"));

static ADD_FIELD: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?i)^ADD\s+FIELD\s+"([^"]+)"\s+OF\s+"([^"]+)"\s+AS\s+([A-Za-z0-9\-]+)"#)
        .expect("ADD FIELD pattern is valid")
});

static ADD_INDEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?i)^ADD\s+INDEX\s+"([^"]+)"\s+ON\s+"([^"]+)""#).expect("ADD INDEX pattern is valid")
});

static INDEX_FIELD: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?i)^INDEX-FIELD\s+"([^"]+)"(?:\s+(ASCENDING|DESCENDING))?"#)
        .expect("INDEX-FIELD pattern is valid")
});

static AREA: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"(?i)^AREA\s+"([^"]+)""#).expect("AREA pattern is valid"));

/// Parser for `.df` schema text
pub struct DfParser;

impl DfParser {
    /// Parse one schema blob into its tables.
    ///
    /// Fields and indexes keep the order in which they appear. Each call
    /// starts from a fresh state, so no table or index leaks between blobs.
    pub fn parse(text: &str) -> TableMap {
        let state = text.lines().fold(ParseState::default(), ParseState::apply);
        debug!(tables = state.tables.len(), "parsed schema");
        state.tables
    }
}

/// Position of the index currently receiving PRIMARY / INDEX-FIELD records
#[derive(Debug, Clone)]
struct IndexCursor {
    table: String,
    position: usize,
}

/// Accumulator threaded through the lines of one blob
#[derive(Debug, Default)]
struct ParseState {
    tables: TableMap,
    current_table: Option<String>,
    current_index: Option<IndexCursor>,
}

impl ParseState {
    fn apply(mut self, line: &str) -> Self {
        let line = line.trim();
        if line.is_empty() {
            return self;
        }

        if let Some(caps) = ADD_TABLE.captures(line) {
            let name = caps[1].to_string();
            self.table_mut(&name);
            self.current_table = Some(name);
            self.current_index = None;
        } else if let Some(caps) = ADD_FIELD.captures(line) {
            let field = Field {
                name: caps[1].to_string(),
                data_type: caps[3].to_lowercase(),
            };
            trace!(table = &caps[2], field = %field.name, "field");
            self.table_mut(&caps[2]).fields.push(field);
        } else if let Some(caps) = ADD_INDEX.captures(line) {
            let table_name = caps[2].to_string();
            let table = self.table_mut(&table_name);
            table.indexes.push(IndexDef::new(&caps[1]));
            let position = table.indexes.len() - 1;
            trace!(
                table = %table_name,
                index = &caps[1],
                current_table = ?self.current_table,
                "index"
            );
            self.current_index = Some(IndexCursor {
                table: table_name,
                position,
            });
        } else if line.eq_ignore_ascii_case("PRIMARY") {
            if let Some(index) = self.index_mut() {
                index.primary = true;
            }
        } else if line.eq_ignore_ascii_case("UNIQUE") {
            if let Some(index) = self.index_mut() {
                index.unique = true;
            }
        } else if let Some(caps) = AREA.captures(line) {
            let area = caps[1].to_string();
            if let Some(index) = self.index_mut() {
                index.area = Some(area);
            }
        } else if let Some(caps) = INDEX_FIELD.captures(line) {
            let field = IndexField {
                name: caps[1].to_string(),
                ascending: !caps
                    .get(2)
                    .is_some_and(|d| d.as_str().eq_ignore_ascii_case("DESCENDING")),
            };
            if let Some(index) = self.index_mut() {
                index.fields.push(field);
            }
        }

        self
    }

    /// Table entry for `name`, created empty if missing
    fn table_mut(&mut self, name: &str) -> &mut Table {
        self.tables
            .entry(name.to_string())
            .or_insert_with(|| Table::new(name))
    }

    fn index_mut(&mut self) -> Option<&mut IndexDef> {
        let cursor = self.current_index.as_ref()?;
        self.tables
            .get_mut(&cursor.table)?
            .indexes
            .get_mut(cursor.position)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const SPORTS_DF: &str = r#"ADD TABLE "Customer"
  AREA "Schema Area"
  DESCRIPTION "Customer master"
  DUMP-NAME "customer"

ADD FIELD "Cust-Num" OF "Customer" AS integer
  FORMAT ">>>>9"
  INITIAL "0"
  POSITION 2

ADD FIELD "City" OF "Customer" AS character
  FORMAT "x(25)"

ADD FIELD "Active" OF "Customer" AS LOGICAL

ADD FIELD "Since" OF "Customer" AS datetime-tz

ADD INDEX "Cust-Num" ON "Customer"
  AREA "Index Area"
  UNIQUE
  PRIMARY
  INDEX-FIELD "Cust-Num" ASCENDING

ADD INDEX "City" ON "Customer"
  AREA "Schema Area"
  INDEX-FIELD "City" ASCENDING
  INDEX-FIELD "Since" DESCENDING

.
PSC
cpstream=ISO8859-1
.
0000001234
"#;

    #[test]
    fn test_parse_sports_customer() {
        let tables = DfParser::parse(SPORTS_DF);
        assert_eq!(tables.len(), 1);

        let customer = &tables["Customer"];
        assert_eq!(customer.name, "Customer");

        let fields: Vec<_> = customer
            .fields
            .iter()
            .map(|f| (f.name.as_str(), f.data_type.as_str()))
            .collect();
        assert_eq!(
            fields,
            vec![
                ("Cust-Num", "integer"),
                ("City", "character"),
                ("Active", "logical"),
                ("Since", "datetime-tz"),
            ]
        );

        assert_eq!(customer.indexes.len(), 2);
        let pk = &customer.indexes[0];
        assert_eq!(pk.name, "Cust-Num");
        assert!(pk.primary);
        assert!(pk.unique);
        assert_eq!(pk.area.as_deref(), Some("Index Area"));
        assert_eq!(pk.field_names(), vec!["Cust-Num"]);

        let city = &customer.indexes[1];
        assert!(!city.primary);
        assert!(!city.unique);
        assert_eq!(city.field_names(), vec!["City", "Since"]);
        assert!(city.fields[0].ascending);
        assert!(!city.fields[1].ascending);
    }

    #[test]
    fn test_field_uses_explicit_table_not_current() {
        let df = r#"ADD TABLE "A"
ADD FIELD "x" OF "B" AS character
"#;
        let tables = DfParser::parse(df);

        assert!(tables["A"].fields.is_empty());
        assert_eq!(tables["B"].fields[0].name, "x");
    }

    #[test]
    fn test_add_table_keeps_existing_entry() {
        let df = r#"ADD FIELD "x" OF "T" AS character
ADD TABLE "T"
"#;
        let tables = DfParser::parse(df);
        assert_eq!(tables["T"].fields.len(), 1);
    }

    #[test]
    fn test_add_table_closes_current_index() {
        let df = r#"ADD INDEX "i" ON "T"
ADD TABLE "U"
PRIMARY
INDEX-FIELD "late"
"#;
        let tables = DfParser::parse(df);

        let index = &tables["T"].indexes[0];
        assert!(!index.primary);
        assert!(index.fields.is_empty());
        assert!(tables["U"].indexes.is_empty());
    }

    #[test]
    fn test_index_records_without_open_index_are_ignored() {
        let df = "PRIMARY\nINDEX-FIELD \"x\" ASCENDING\nUNIQUE\n";
        assert!(DfParser::parse(df).is_empty());
    }

    #[test]
    fn test_index_on_other_table_stays_open_across_fields() {
        let df = r#"ADD INDEX "i" ON "T"
ADD FIELD "f" OF "T" AS date
INDEX-FIELD "f" ASCENDING
"#;
        let tables = DfParser::parse(df);
        assert_eq!(tables["T"].indexes[0].field_names(), vec!["f"]);
    }

    #[test]
    fn test_keywords_are_case_insensitive() {
        let df = "add table \"t\"\nadd index \"i\" on \"t\"\n  primary\n  index-field \"a\" ascending\n";
        let tables = DfParser::parse(df);

        let index = &tables["t"].indexes[0];
        assert!(index.primary);
        assert_eq!(index.field_names(), vec!["a"]);
    }

    #[test]
    fn test_crlf_input() {
        let df = "ADD INDEX \"i\" ON \"T\"\r\n  PRIMARY\r\n  INDEX-FIELD \"a\" ASCENDING\r\n";
        let tables = DfParser::parse(df);
        assert!(tables["T"].indexes[0].primary);
    }
}
