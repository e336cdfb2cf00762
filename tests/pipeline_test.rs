// Loading from disk: plain sources, zip containers, schema files and failures

use abl_index_advisor::{run_analysis, AdvisorConfig, AdvisorError, MatchResult, WarningKind};
use pretty_assertions::assert_eq;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use zip::write::SimpleFileOptions;

const SCHEMA: &str = r#"ADD TABLE "order"
ADD FIELD "order-num" OF "order" AS integer
ADD FIELD "cust-num" OF "order" AS integer
ADD FIELD "order-date" OF "order" AS date
ADD INDEX "order-num" ON "order"
  UNIQUE
  PRIMARY
  INDEX-FIELD "order-num" ASCENDING
ADD INDEX "cust-order" ON "order"
  INDEX-FIELD "cust-num" ASCENDING
  INDEX-FIELD "order-num" ASCENDING

.
PSC
cpstream=ISO8859-1
.
0000000512
"#;

fn config() -> AdvisorConfig {
    AdvisorConfig {
        seed: Some(7),
        ..AdvisorConfig::default()
    }
}

fn write_file(dir: &Path, name: &str, content: &[u8]) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, content).unwrap();
    path
}

fn write_zip(dir: &Path, name: &str, entries: &[(&str, &str)]) -> PathBuf {
    let path = dir.join(name);
    let file = fs::File::create(&path).unwrap();
    let mut writer = zip::ZipWriter::new(file);
    let options = SimpleFileOptions::default().compression_method(zip::CompressionMethod::Stored);

    writer.add_directory("src/", options).unwrap();
    for (entry, content) in entries {
        writer.start_file(*entry, options).unwrap();
        writer.write_all(content.as_bytes()).unwrap();
    }
    writer.finish().unwrap();
    path
}

fn setup() -> (TempDir, PathBuf) {
    let dir = tempfile::tempdir().unwrap();
    let schema = write_file(dir.path(), "sports.df", SCHEMA.as_bytes());
    (dir, schema)
}

#[cfg(feature = "zip-archives")]
#[tokio::test]
async fn test_direct_sources_come_before_container_entries() {
    let (dir, schema) = setup();
    let archive = write_zip(
        dir.path(),
        "legacy.zip",
        &[
            ("src/first.p", "FIND order WHERE order.order-num = 1."),
            ("src/readme.txt", "FOR EACH order WHERE order.cust-num = 1:"),
            ("src/second.w", "FOR EACH order WHERE order.cust-num = 2 AND order.order-date > dFrom:"),
        ],
    );
    let direct = write_file(
        dir.path(),
        "direct.p",
        b"FOR EACH order NO-LOCK WHERE order.cust-num = iCust AND order.order-num > 0:",
    );

    let report = run_analysis(&[archive, direct.clone()], &[schema], &config())
        .await
        .unwrap();

    let names: Vec<_> = report.programs.iter().map(|p| p.file_name.clone()).collect();
    assert_eq!(
        names,
        vec![
            direct.to_string_lossy().into_owned(),
            "src/first.p".to_string(),
            "src/second.w".to_string(),
        ]
    );

    let summary = report.summary();
    assert_eq!(summary.statements, 3);
    assert_eq!(summary.perfect_matches, 2);
    assert_eq!(summary.partial_matches, 1);
    assert_eq!(report.catalog.len(), 1);
}

#[tokio::test]
async fn test_suggestion_for_unindexed_filter() {
    let (dir, schema) = setup();
    let program = write_file(
        dir.path(),
        "late.p",
        b"FOR EACH order WHERE order.order-date >= TODAY - 30:",
    );

    let report = run_analysis(&[program], &[schema], &config()).await.unwrap();

    match &report.results[..] {
        [MatchResult::Suggested {
            table,
            suggested_fields,
            suggestion_text,
            ..
        }] => {
            assert_eq!(table, "order");
            assert_eq!(suggested_fields, &vec!["order-date"]);
            assert!(suggestion_text.contains("INDEX-FIELD \"order-date\" ASCENDING"));
            assert!(suggestion_text.contains("AREA \"Schema Area\""));
            assert!(suggestion_text.contains("INDEX-NUM 99"));
        }
        other => panic!("expected one suggestion, got {:?}", other),
    }
}

#[tokio::test]
async fn test_missing_schema_gives_single_warning() {
    let dir = tempfile::tempdir().unwrap();
    let program = write_file(dir.path(), "a.p", b"FOR EACH order WHERE order.cust-num = 1:");

    let report = run_analysis(&[program], &[], &config()).await.unwrap();

    assert_eq!(report.results.len(), 1);
    assert!(matches!(
        report.results[0],
        MatchResult::Warning {
            kind: WarningKind::SchemaMissing,
            table: None,
            ..
        }
    ));
}

#[tokio::test]
async fn test_unreadable_input_aborts_run() {
    let (dir, schema) = setup();
    let good = write_file(dir.path(), "good.p", b"FOR EACH order WHERE order.cust-num = 1:");
    let missing = dir.path().join("missing.p");

    let err = run_analysis(&[good, missing.clone()], &[schema], &config())
        .await
        .unwrap_err();

    assert!(err.is_input_failure());
    match err {
        AdvisorError::Io { path, .. } => assert_eq!(path, missing),
        other => panic!("expected an io error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_invalid_utf8_needs_lossy_mode() {
    let (dir, schema) = setup();
    let program = write_file(
        dir.path(),
        "latin1.p",
        b"/* commande r\xe9cente */\nFOR EACH order WHERE order.cust-num = 1:",
    );

    let err = run_analysis(&[program.clone()], &[schema.clone()], &config())
        .await
        .unwrap_err();
    assert!(matches!(err, AdvisorError::Decode { .. }));

    let lossy = AdvisorConfig {
        lossy_utf8: true,
        ..config()
    };
    let report = run_analysis(&[program], &[schema], &lossy).await.unwrap();
    assert_eq!(report.summary().perfect_matches, 1);
}

#[cfg(feature = "zip-archives")]
#[tokio::test]
async fn test_corrupt_container_aborts_run() {
    let (dir, schema) = setup();
    let archive = write_file(dir.path(), "broken.zip", b"PK\x03\x04 definitely not a zip");

    let err = run_analysis(&[archive], &[schema], &config()).await.unwrap_err();
    assert!(matches!(err, AdvisorError::Archive { .. }));
}

#[tokio::test]
async fn test_invalid_config_is_rejected_before_loading() {
    let config = AdvisorConfig {
        max_index_fields: 0,
        ..AdvisorConfig::default()
    };
    let err = run_analysis(&[PathBuf::from("/nonexistent.p")], &[], &config)
        .await
        .unwrap_err();
    assert!(matches!(err, AdvisorError::Config(_)));
}
