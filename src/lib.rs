pub mod advisor;
pub mod config;
pub mod error;
pub mod extractor;
pub mod loader;
pub mod schema;

pub use advisor::{
    FieldClass, IndexAdvisor, IndexSuggestion, MatchResult, StatementRef, SuggestionGenerator,
    WarningKind,
};
pub use config::AdvisorConfig;
pub use error::{AdvisorError, Result};
pub use extractor::{FileAnalysis, Statement, StatementExtractor, StatementKind};
pub use loader::TextBlob;
pub use schema::{DfParser, Field, IndexDef, IndexField, SchemaCatalog, Table, TableMap};

use rand::Rng;
use serde::Serialize;
use std::collections::HashSet;
use std::path::PathBuf;
use tracing::info;

/// Everything one analysis run produced
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisReport {
    /// Statements per program blob
    pub programs: Vec<FileAnalysis>,
    /// Merged schema of all schema blobs
    pub catalog: SchemaCatalog,
    /// One result per statement, or a single schema warning
    pub results: Vec<MatchResult>,
}

/// Result counts of a report
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ReportSummary {
    pub statements: usize,
    pub perfect_matches: usize,
    pub partial_matches: usize,
    pub suggestions: usize,
    pub warnings: usize,
}

impl AnalysisReport {
    pub fn summary(&self) -> ReportSummary {
        let mut summary = ReportSummary {
            statements: self.programs.iter().map(|p| p.statements.len()).sum(),
            ..ReportSummary::default()
        };

        for result in &self.results {
            match result {
                MatchResult::Matched { is_perfect: true, .. } => summary.perfect_matches += 1,
                MatchResult::Matched { .. } => summary.partial_matches += 1,
                MatchResult::Suggested { .. } => summary.suggestions += 1,
                MatchResult::Warning { .. } => summary.warnings += 1,
            }
        }

        summary
    }

    /// All suggested indexes as one `.df` text, blocks separated by a blank line.
    ///
    /// Statements that led to the same fields on the same table contribute
    /// only their first suggestion.
    pub fn suggestions_df(&self) -> String {
        let mut seen = HashSet::new();
        let mut blocks = Vec::new();

        for result in &self.results {
            if let MatchResult::Suggested {
                table,
                suggested_fields,
                suggestion_text,
                ..
            } = result
            {
                if seen.insert((table.as_str(), suggested_fields.as_slice())) {
                    blocks.push(suggestion_text.as_str());
                }
            }
        }

        blocks.join("\n\n")
    }
}

/// Analyze already-loaded blobs.
///
/// # Example
///
/// ```ignore
/// let programs = vec![TextBlob::new("orders.p", "FOR EACH order WHERE order.cust-num = 1:")];
/// let schemas = vec![TextBlob::new("sports.df", df_text)];
/// let report = analyze_blobs(&programs, &schemas, &AdvisorConfig::default());
/// ```
pub fn analyze_blobs(
    programs: &[TextBlob],
    schemas: &[TextBlob],
    config: &AdvisorConfig,
) -> AnalysisReport {
    analyze_blobs_with(programs, schemas, SuggestionGenerator::from_config(config))
}

/// [`analyze_blobs`] with a caller-supplied suggestion generator
pub fn analyze_blobs_with<R: Rng>(
    programs: &[TextBlob],
    schemas: &[TextBlob],
    generator: SuggestionGenerator<R>,
) -> AnalysisReport {
    let programs: Vec<FileAnalysis> = programs
        .iter()
        .map(|blob| {
            let analysis = StatementExtractor::analyze(&blob.name, &blob.text);
            info!(
                "extracted: {} ({} FOR/FIND statement(s))",
                blob.name,
                analysis.statements.len()
            );
            analysis
        })
        .collect();

    let catalog = SchemaCatalog::merge(schemas.iter().map(|blob| {
        let tables = DfParser::parse(&blob.text);
        info!("schema processed: {} ({} table(s))", blob.name, tables.len());
        tables
    }));

    let results = IndexAdvisor::with_generator(&catalog, generator).analyze(&programs);

    AnalysisReport {
        programs,
        catalog,
        results,
    }
}

/// Load the given program and schema paths, then analyze them.
///
/// Any read or decode failure aborts the run and no report is produced.
pub async fn run_analysis(
    program_paths: &[PathBuf],
    schema_paths: &[PathBuf],
    config: &AdvisorConfig,
) -> Result<AnalysisReport> {
    config.validate()?;

    info!("analyzing Progress programs");
    let programs = loader::load_program_blobs(program_paths, config).await?;

    info!("reading schema files");
    let schemas = loader::load_schema_blobs(schema_paths, config).await?;

    info!("comparing FOR/FIND statements with indexes");
    Ok(analyze_blobs(&programs, &schemas, config))
}
