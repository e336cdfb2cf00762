// Console rendering and suggestion file output

use abl_index_advisor::{AnalysisReport, MatchResult, StatementRef};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// File written into the output directory when suggestions exist
pub const SUGGESTIONS_FILE: &str = "suggested_indexes.df";

/// Print the full report to stdout
pub fn print_report(report: &AnalysisReport) {
    let summary = report.summary();

    println!();
    println!("🔍 ======================================================");
    println!("🔍   ABL Index Analyzer - Index Report");
    println!("🔍 ======================================================");
    println!();
    println!("📂 Programs: {} file(s), {} statement(s)", report.programs.len(), summary.statements);
    println!("🗄️  Schema: {} table(s)", report.catalog.len());
    println!();

    for result in &report.results {
        println!("{}", render_result(result));
        println!();
    }

    println!("📊 Summary");
    println!("   - Perfect index:     {}", summary.perfect_matches);
    println!("   - Partial match:     {}", summary.partial_matches);
    println!("   - Index suggestions: {}", summary.suggestions);
    println!("   - Warnings:          {}", summary.warnings);
    println!();
    println!("🔍 ======================================================");
    println!("🔍   End of Report");
    println!("🔍 ======================================================");
    println!();
}

/// Render one result as console text
pub fn render_result(result: &MatchResult) -> String {
    let mut out = match result {
        MatchResult::Matched {
            table,
            used_fields,
            index_name,
            index_fields,
            match_count,
            is_perfect,
            ..
        } => {
            let (icon, status) = if *is_perfect {
                ("✅", "perfect index".to_string())
            } else {
                ("🟡", format!("partial match ({} fields)", match_count))
            };
            format!(
                "{} Table \"{}\": recommended index \"{}\" ({})\n      Index:  {}\n      Filter: {}",
                icon,
                table,
                index_name,
                status,
                index_fields.join(", "),
                used_fields.join(", ")
            )
        }
        MatchResult::Suggested {
            table, used_fields, ..
        } => format!(
            "❌ Table \"{}\": no compatible index found\n      Filter: {}",
            table,
            used_fields.join(", ")
        ),
        MatchResult::Warning { table, kind, .. } => match table {
            Some(table) => format!("⚠️  Table \"{}\" → {}", table, kind),
            None => format!("⚠️  {}: load at least one .df file to analyze indexes", kind),
        },
    };

    if let Some(statement) = result.statement() {
        out.push_str(&source_lines(statement));
    }
    if let (Some(table), Some(df)) = (result.table(), result.suggestion_text()) {
        out.push_str(&format!("\n   ✨ Index suggestion for \"{}\":\n{}", table, df));
    }
    out
}

fn source_lines(statement: &StatementRef) -> String {
    let file = statement.file.rsplit(['/', '\\']).next().unwrap_or(&statement.file);
    format!(
        "\n      Source: {}:{} ({})\n      Code:   {}",
        file, statement.line, statement.kind, statement.text
    )
}

/// Write the suggested indexes to `<dir>/suggested_indexes.df`.
///
/// Returns `None` without touching the filesystem when nothing was
/// suggested.
pub fn save_suggestions(report: &AnalysisReport, dir: &Path) -> io::Result<Option<PathBuf>> {
    let df = report.suggestions_df();
    if df.is_empty() {
        return Ok(None);
    }

    fs::create_dir_all(dir)?;

    let mut content = String::new();
    content.push_str("/* Auto-generated by abl-analyze */\n");
    content.push_str(&format!(
        "/* Generated at: {} */\n",
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
    ));
    content.push_str("/* Review before loading into the Data Dictionary */\n\n");
    content.push_str(&df);
    content.push('\n');

    let file = dir.join(SUGGESTIONS_FILE);
    fs::write(&file, content)?;
    Ok(Some(file))
}
