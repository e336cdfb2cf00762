//! Index advisor - matches extracted statements against the schema catalog
//!
//! For every statement the advisor resolves the table, collects the fields
//! used in the filter, scores each index of the table by the length of its
//! leading run of used fields, and reports the best index. When no index
//! starts with a used field, a new index is suggested instead.

pub mod suggestion;

pub use suggestion::{
    classify_field, order_fields_for_index, FieldClass, IndexSuggestion, SuggestionGenerator,
};

use crate::extractor::{FileAnalysis, Statement, StatementKind};
use crate::schema::{IndexDef, SchemaCatalog, Table};
use once_cell::sync::Lazy;
use rand::rngs::StdRng;
use rand::Rng;
use regex::Regex;
use serde::Serialize;
use std::fmt;
use tracing::debug;

/// `[table.]field` immediately followed by a comparison operator
static FILTER_FIELD: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b(?:[A-Za-z0-9_\-]+\.)?([A-Za-z0-9_\-]+)\s*(?:=|<>|>=|<=|>|<)")
        .expect("filter field pattern is valid")
});

/// Why a statement could not be evaluated
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WarningKind {
    /// No schema was supplied; reported once for the whole run
    SchemaMissing,
    /// The statement's table is not in the catalog
    TableNotFound,
    /// No filter field could be found in the statement
    InsufficientFilters,
}

impl WarningKind {
    pub fn message(&self) -> &'static str {
        match self {
            WarningKind::SchemaMissing => "no schema loaded",
            WarningKind::TableNotFound => "table not found",
            WarningKind::InsufficientFilters => "insufficient filters",
        }
    }
}

impl fmt::Display for WarningKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.message())
    }
}

/// Where a statement came from
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatementRef {
    pub file: String,
    pub line: usize,
    pub kind: StatementKind,
    pub text: String,
}

impl StatementRef {
    fn new(file: &str, statement: &Statement) -> Self {
        Self {
            file: file.to_string(),
            line: statement.line,
            kind: statement.kind,
            text: statement.raw.clone(),
        }
    }
}

/// Outcome for one statement
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum MatchResult {
    Matched {
        table: String,
        statement: StatementRef,
        used_fields: Vec<String>,
        index_name: String,
        index_fields: Vec<String>,
        match_count: usize,
        is_perfect: bool,
    },
    Suggested {
        table: String,
        statement: StatementRef,
        used_fields: Vec<String>,
        index_name: String,
        suggested_fields: Vec<String>,
        suggestion_text: String,
    },
    Warning {
        table: Option<String>,
        statement: Option<StatementRef>,
        kind: WarningKind,
    },
}

impl MatchResult {
    pub fn table(&self) -> Option<&str> {
        match self {
            MatchResult::Matched { table, .. } | MatchResult::Suggested { table, .. } => {
                Some(table)
            }
            MatchResult::Warning { table, .. } => table.as_deref(),
        }
    }

    pub fn statement(&self) -> Option<&StatementRef> {
        match self {
            MatchResult::Matched { statement, .. } | MatchResult::Suggested { statement, .. } => {
                Some(statement)
            }
            MatchResult::Warning { statement, .. } => statement.as_ref(),
        }
    }

    /// The `.df` fragment of a suggestion
    pub fn suggestion_text(&self) -> Option<&str> {
        match self {
            MatchResult::Suggested {
                suggestion_text, ..
            } => Some(suggestion_text),
            _ => None,
        }
    }
}

/// Fields a statement filters on, in first-occurrence order.
///
/// CAN-FIND statements carry their fields already; others are scanned from
/// the text after the first `where`.
pub fn used_fields(statement: &Statement) -> Vec<String> {
    if !statement.explicit_fields.is_empty() {
        return dedup(statement.explicit_fields.iter().cloned());
    }
    extract_where_fields(&statement.raw)
}

/// Field names compared with `=`, `<>`, `>=`, `<=`, `>` or `<` after the
/// first case-insensitive `where` in `raw`. Table qualifiers are dropped.
pub fn extract_where_fields(raw: &str) -> Vec<String> {
    // ASCII lowercasing keeps byte offsets valid for `raw`
    let Some(pos) = raw.to_ascii_lowercase().find("where") else {
        return Vec::new();
    };
    let clause = &raw[pos + "where".len()..];

    dedup(
        FILTER_FIELD
            .captures_iter(clause)
            .filter_map(|caps| caps.get(1).map(|m| m.as_str().to_string())),
    )
}

fn dedup(fields: impl Iterator<Item = String>) -> Vec<String> {
    let mut unique: Vec<String> = Vec::new();
    for field in fields {
        if !unique.contains(&field) {
            unique.push(field);
        }
    }
    unique
}

/// Length of the leading run of `index` fields that appear in `used`.
///
/// Counting stops at the first index field not in `used`; later fields
/// never count even when used.
pub fn prefix_match_count(index: &IndexDef, used: &[String]) -> usize {
    index
        .fields
        .iter()
        .take_while(|f| used.iter().any(|u| *u == f.name))
        .count()
}

/// Best-scoring index of a table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndexMatch<'t> {
    pub index: &'t IndexDef,
    pub match_count: usize,
    pub is_perfect: bool,
}

/// Index with the longest used prefix; ties go to the earlier declaration.
///
/// Indexes whose first field is not used are never selected.
pub fn select_best_index<'t>(table: &'t Table, used: &[String]) -> Option<IndexMatch<'t>> {
    let mut best: Option<IndexMatch<'t>> = None;

    for index in &table.indexes {
        let match_count = prefix_match_count(index, used);
        if match_count == 0 {
            continue;
        }
        if best.map_or(true, |b| match_count > b.match_count) {
            best = Some(IndexMatch {
                index,
                match_count,
                is_perfect: match_count == used.len(),
            });
        }
    }

    best
}

/// Evaluates statements against a [`SchemaCatalog`]
pub struct IndexAdvisor<'c, R = StdRng> {
    catalog: &'c SchemaCatalog,
    generator: SuggestionGenerator<R>,
}

impl<'c, R: Rng> IndexAdvisor<'c, R> {
    pub fn with_generator(catalog: &'c SchemaCatalog, generator: SuggestionGenerator<R>) -> Self {
        Self { catalog, generator }
    }

    /// One result per statement, in file then statement order.
    ///
    /// With an empty catalog the run yields a single
    /// [`WarningKind::SchemaMissing`] and nothing else.
    pub fn analyze(&mut self, files: &[FileAnalysis]) -> Vec<MatchResult> {
        if self.catalog.is_empty() {
            return vec![MatchResult::Warning {
                table: None,
                statement: None,
                kind: WarningKind::SchemaMissing,
            }];
        }

        files
            .iter()
            .flat_map(|file| {
                file.statements
                    .iter()
                    .map(move |statement| (file.file_name.as_str(), statement))
            })
            .map(|(file, statement)| self.evaluate(file, statement))
            .collect()
    }

    /// Evaluate a single statement found in `file`
    pub fn evaluate(&mut self, file: &str, statement: &Statement) -> MatchResult {
        let statement_ref = StatementRef::new(file, statement);

        let Some(table) = self.catalog.get(&statement.table) else {
            debug!(file, line = statement.line, table = %statement.table, "table not found");
            return MatchResult::Warning {
                table: Some(statement.table.clone()),
                statement: Some(statement_ref),
                kind: WarningKind::TableNotFound,
            };
        };

        let used = used_fields(statement);
        if used.is_empty() {
            return MatchResult::Warning {
                table: Some(statement.table.clone()),
                statement: Some(statement_ref),
                kind: WarningKind::InsufficientFilters,
            };
        }

        match select_best_index(table, &used) {
            Some(best) => {
                debug!(
                    file,
                    line = statement.line,
                    index = %best.index.name,
                    match_count = best.match_count,
                    "index matched"
                );
                MatchResult::Matched {
                    table: statement.table.clone(),
                    statement: statement_ref,
                    used_fields: used,
                    index_name: best.index.name.clone(),
                    index_fields: best.index.field_names(),
                    match_count: best.match_count,
                    is_perfect: best.is_perfect,
                }
            }
            None => {
                let suggestion = self.generator.suggest(table, &used);
                debug!(
                    file,
                    line = statement.line,
                    index = %suggestion.index_name,
                    "no compatible index, suggesting one"
                );
                MatchResult::Suggested {
                    table: statement.table.clone(),
                    statement: statement_ref,
                    used_fields: used,
                    index_name: suggestion.index_name,
                    suggested_fields: suggestion.fields,
                    suggestion_text: suggestion.df,
                }
            }
        }
    }
}
