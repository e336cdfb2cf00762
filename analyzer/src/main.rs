use abl_index_advisor::{run_analysis, AdvisorConfig, AdvisorError};
use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::debug;
use tracing_subscriber::EnvFilter;

mod paths;
mod report;

use paths::collect_paths;

/// Checks Progress ABL FOR/FIND/CAN-FIND statements against .df indexes
#[derive(Parser, Debug)]
#[command(name = "abl-analyze")]
#[command(about = "ABL index analyzer: recommends existing indexes and suggests missing ones", version)]
struct Cli {
    /// Program files (.p .w .i .cls .zip), directories or glob patterns
    #[arg(default_value = ".")]
    programs: Vec<String>,

    /// Schema files (.df), directories or glob patterns
    #[arg(short, long = "schema")]
    schemas: Vec<String>,

    /// Print the full report as JSON instead of the console report
    #[arg(long)]
    json: bool,

    /// Directory receiving suggested_indexes.df
    #[arg(short, long, default_value = "target/abl_index_suggestions")]
    output: PathBuf,

    /// Seed for generated index names
    #[arg(long)]
    seed: Option<u64>,

    /// INDEX-NUM of suggested indexes
    #[arg(long, default_value_t = abl_index_advisor::config::DEFAULT_INDEX_NUM)]
    index_num: u32,

    /// AREA of suggested indexes
    #[arg(long, default_value = abl_index_advisor::config::DEFAULT_STORAGE_AREA)]
    area: String,

    /// Maximum number of fields in a suggested index
    #[arg(long, default_value_t = abl_index_advisor::config::DEFAULT_MAX_INDEX_FIELDS)]
    max_fields: usize,

    /// Replace invalid UTF-8 in inputs instead of failing
    #[arg(long)]
    lossy: bool,

    /// Log level used when RUST_LOG is not set
    #[arg(long, default_value = "warn")]
    log_level: String,
}

impl Cli {
    fn config(&self) -> AdvisorConfig {
        AdvisorConfig {
            max_index_fields: self.max_fields,
            storage_area: self.area.clone(),
            index_num: self.index_num,
            seed: self.seed,
            lossy_utf8: self.lossy,
            ..AdvisorConfig::default()
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("❌ Error while processing files: {}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let config = cli.config();

    let program_paths = collect_paths(&cli.programs, |name| {
        config.is_source_file(name) || config.is_container_file(name)
    })?;
    let schema_paths = collect_paths(&cli.schemas, |name| config.is_schema_file(name))?;
    debug!(
        programs = program_paths.len(),
        schemas = schema_paths.len(),
        "collected input paths"
    );

    if program_paths.is_empty() && schema_paths.is_empty() {
        return Err(Box::new(AdvisorError::Config(
            "no program or schema files found".to_string(),
        )));
    }

    if !cli.json {
        println!("🔍 ABL Index Analyzer");
        println!("===================\n");
        println!("Programs: {}", cli.programs.join(", "));
        println!("Schemas:  {}\n", cli.schemas.join(", "));
    }

    let report = run_analysis(&program_paths, &schema_paths, &config).await?;

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        report::print_report(&report);
    }

    if let Some(file) = report::save_suggestions(&report, &cli.output)? {
        if !cli.json {
            println!("   💾 Saved: {}", file.display());
            println!();
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_defaults() {
        let cli = Cli::parse_from(["abl-analyze"]);
        assert_eq!(cli.programs, vec!["."]);
        assert!(cli.schemas.is_empty());

        let config = cli.config();
        assert_eq!(config, AdvisorConfig::default());
    }

    #[test]
    fn test_cli_maps_flags_to_config() {
        let cli = Cli::parse_from([
            "abl-analyze",
            "src",
            "legacy.zip",
            "-s",
            "db/sports.df",
            "--schema",
            "db/extra.df",
            "--seed",
            "42",
            "--index-num",
            "12",
            "--area",
            "Index Area",
            "--max-fields",
            "5",
            "--lossy",
        ]);

        assert_eq!(cli.programs, vec!["src", "legacy.zip"]);
        assert_eq!(cli.schemas, vec!["db/sports.df", "db/extra.df"]);

        let config = cli.config();
        assert_eq!(config.seed, Some(42));
        assert_eq!(config.index_num, 12);
        assert_eq!(config.storage_area, "Index Area");
        assert_eq!(config.max_index_fields, 5);
        assert!(config.lossy_utf8);
    }
}
