//! Integration tests for riskextract-cli
//!
//! These tests run the commands end to end against the mock provider and
//! check the artifacts they leave on disk.

use riskextract_cli::cli::{ChunkArgs, ConfigAction, ConfigArgs, ExtractArgs, PresetArg, PromptArgs};
use riskextract_cli::commands::{execute_chunk, execute_config, execute_extract, execute_prompt};
use riskextract_cli::config::{OutputFormat, ProviderKind};
use riskextract_cli::{CliError, Config, Formatter};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use tokio_util::sync::CancellationToken;

const MOCK_CONFIG: &str = r#"
[provider]
kind = "mock"
mock_response = '{"entity_name": "Acme Re", "region": "Europe", "risk_type": "marine", "key_risk_factors": ["flood"], "risk_summary": "Cargo exposure."}'

[extractor.chunking]
window_size = 200
overlap = 20
"#;

fn formatter() -> Formatter {
    Formatter::new(OutputFormat::Quiet, false)
}

fn write(dir: &Path, relative: &str, text: &str) -> PathBuf {
    let path = dir.join(relative);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(&path, text).unwrap();
    path
}

fn corpus_dir() -> TempDir {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "policies/acme.txt", &"Marine cargo policy for Acme Re. ".repeat(20));
    write(dir.path(), "esg/green.txt", "Scope 1 emissions fell.");
    write(dir.path(), "notes.txt", "Unclassified notes.");
    dir
}

fn extract_args(input: &Path, output: &Path) -> ExtractArgs {
    ExtractArgs {
        input: input.to_path_buf(),
        output: output.to_path_buf(),
        emit_chunk_records: true,
        provider: None,
        model: None,
        preset: None,
        limit: None,
    }
}

#[tokio::test]
async fn test_extract_writes_artifacts() {
    let input = corpus_dir();
    let output = TempDir::new().unwrap();
    let config = Config::from_toml(MOCK_CONFIG).unwrap();

    let corpus = execute_extract(
        extract_args(input.path(), output.path()),
        &config,
        &formatter(),
        CancellationToken::new(),
    )
    .await
    .unwrap();

    let ids: Vec<&str> = corpus.records().map(|r| r.document_id.as_str()).collect();
    assert_eq!(ids, vec!["green", "acme"]);
    assert!(corpus.is_complete());

    let acme = &corpus.documents[1];
    assert!(acme.chunks.len() > 1);
    assert_eq!(
        acme.record.get("region").map(|v| v.to_cell()),
        Some("europe".to_string())
    );
    // every chunk repeats the same summary, so it is kept once
    assert_eq!(
        acme.record.get("risk_summary").map(|v| v.to_cell()),
        Some("Cargo exposure.".to_string())
    );

    let csv = fs::read_to_string(output.path().join("records.csv")).unwrap();
    let lines: Vec<&str> = csv.lines().collect();
    assert_eq!(lines.len(), 3);
    assert!(lines[0].starts_with("document_id,category,entity_name,region,"));
    assert!(lines[1].starts_with("green,esg,Acme Re,europe,unknown,marine,"));

    let json: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(output.path().join("records.json")).unwrap())
            .unwrap();
    assert_eq!(json.as_array().unwrap().len(), 2);
    assert_eq!(json[1]["provenance"]["fully_unresolved"], false);

    let chunks = fs::read_to_string(output.path().join("chunks.jsonl")).unwrap();
    let total: usize = corpus.documents.iter().map(|d| d.chunks.len()).sum();
    assert_eq!(chunks.lines().count(), total);
}

#[tokio::test]
async fn test_extract_with_limit_and_preset() {
    let input = corpus_dir();
    let output = TempDir::new().unwrap();
    let config = Config::from_toml(MOCK_CONFIG).unwrap();

    let mut args = extract_args(input.path(), output.path());
    args.emit_chunk_records = false;
    args.limit = Some(1);
    args.preset = Some(PresetArg::Lenient);

    let corpus = execute_extract(args, &config, &formatter(), CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(corpus.documents.len(), 1);
    // lenient windows hold the whole document
    assert!(corpus.documents.iter().all(|d| d.chunks.len() == 1));
    assert!(!output.path().join("chunks.jsonl").exists());
}

#[tokio::test]
async fn test_extract_cancelled_run_writes_no_records() {
    let input = corpus_dir();
    let output = TempDir::new().unwrap();
    let config = Config::from_toml(MOCK_CONFIG).unwrap();
    let cancel = CancellationToken::new();
    cancel.cancel();

    let corpus = execute_extract(
        extract_args(input.path(), output.path()),
        &config,
        &formatter(),
        cancel,
    )
    .await
    .unwrap();

    assert!(corpus.documents.is_empty());
    assert_eq!(corpus.cancelled, vec!["green".to_string(), "acme".to_string()]);
    let csv = fs::read_to_string(output.path().join("records.csv")).unwrap();
    assert_eq!(csv.lines().count(), 1);
}

#[tokio::test]
async fn test_extract_requires_api_key() {
    let input = corpus_dir();
    let output = TempDir::new().unwrap();
    let mut config = Config::default();
    config.provider.kind = ProviderKind::Openai;
    config.provider.api_key_env = "RISKEXTRACT_TEST_UNSET_API_KEY".to_string();

    let result = execute_extract(
        extract_args(input.path(), output.path()),
        &config,
        &formatter(),
        CancellationToken::new(),
    )
    .await;

    assert!(matches!(result, Err(CliError::Config(_))));
}

#[test]
fn test_chunk_command() {
    let dir = TempDir::new().unwrap();
    let file = write(dir.path(), "policy.txt", &"x".repeat(1200));
    let config = Config::default();

    let chunks = execute_chunk(
        ChunkArgs {
            file,
            window: Some(500),
            overlap: Some(100),
        },
        &config,
        &formatter(),
    )
    .unwrap();

    let spans: Vec<(usize, usize)> = chunks.iter().map(|c| (c.start, c.end)).collect();
    assert_eq!(spans, vec![(0, 500), (400, 900), (800, 1200)]);
}

#[test]
fn test_prompt_command() {
    let dir = TempDir::new().unwrap();
    let file = write(dir.path(), "policy.txt", "Acme Re insures marine cargo.");
    let config = Config::default();

    let prompt = execute_prompt(
        PromptArgs {
            file: file.clone(),
            chunk: 0,
        },
        &config,
    )
    .unwrap();
    assert!(prompt.contains("Acme Re insures marine cargo."));
    assert!(prompt.contains("- region ("));

    let missing = execute_prompt(PromptArgs { file, chunk: 3 }, &config);
    assert!(matches!(missing, Err(CliError::InvalidInput(_))));
}

#[test]
fn test_config_init_and_reload() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("nested").join("config.toml");
    let config = Config::default();

    execute_config(
        ConfigArgs {
            action: ConfigAction::Init { force: false },
        },
        &config,
        Some(&path),
        &formatter(),
    )
    .unwrap();

    let loaded = Config::load(Some(&path)).unwrap();
    assert_eq!(loaded, config);

    let again = execute_config(
        ConfigArgs {
            action: ConfigAction::Init { force: false },
        },
        &config,
        Some(&path),
        &formatter(),
    );
    assert!(matches!(again, Err(CliError::InvalidInput(_))));

    execute_config(
        ConfigArgs {
            action: ConfigAction::Validate,
        },
        &loaded,
        Some(&path),
        &formatter(),
    )
    .unwrap();
}
