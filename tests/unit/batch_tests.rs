/*!
 * Tests for CSV table I/O and the sequential batch driver, using temp files
 * and the scripted backend.
 */

use std::io::Write;

use tempfile::NamedTempFile;

use esotran::app_config::Config;
use esotran::batch::{self, BatchController};
use esotran::scoring::ChrfClient;
use esotran::translation::{ERROR_MARKER, PromptProfile, RetryPolicy, Translator};

use crate::common::mock_backend::{MockBackend, ScriptedResponse};

fn test_config() -> Config {
    Config {
        row_delay_ms: 0,
        ..Config::default()
    }
}

fn write_input(contents: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().expect("failed to create temp file");
    file.write_all(contents.as_bytes()).expect("failed to write temp file");
    file
}

#[test]
fn test_readTable_semicolonDelimited_shouldAutoDetectAndParse() {
    let input = write_input("legacy_code;Reference\nsegini, bk;call segini(bk)\n");
    let config = test_config();

    let table = batch::read_table(input.path(), &config, None).unwrap();

    assert_eq!(table.delimiter, b';');
    assert_eq!(table.rows.len(), 1);
    assert_eq!(table.rows[0].legacy_code, "segini, bk");
    assert_eq!(table.rows[0].reference.as_deref(), Some("call segini(bk)"));
    assert_eq!(table.passthrough_headers, vec!["legacy_code", "Reference"]);
}

#[test]
fn test_readTable_missingLegacyColumn_shouldFail() {
    let input = write_input("code;Reference\nx;y\n");
    let config = test_config();
    assert!(batch::read_table(input.path(), &config, None).is_err());
}

#[test]
fn test_readTable_overflowFields_shouldBeDiscarded() {
    // Second row has more fields than the header; the writer must not see them.
    let input = write_input("legacy_code;Reference\na;b;stray;more\n");
    let config = test_config();

    let table = batch::read_table(input.path(), &config, None).unwrap();

    assert_eq!(table.rows.len(), 1);
    assert_eq!(table.rows[0].passthrough, vec!["a", "b"]);
}

#[test]
fn test_readTable_existingTranslatedColumn_shouldBeDroppedForRewrite() {
    let input = write_input("legacy_code;translated_code;Reference\na;old output;r\n");
    let config = test_config();

    let table = batch::read_table(input.path(), &config, None).unwrap();

    assert_eq!(table.passthrough_headers, vec!["legacy_code", "Reference"]);
    assert_eq!(table.rows[0].passthrough, vec!["a", "r"]);
}

#[test]
fn test_writeTable_multilineCode_shouldSurviveRoundTrip() {
    let input = write_input("legacy_code;Reference\nsegini, bk;call segini(bk)\n");
    let config = test_config();
    let mut table = batch::read_table(input.path(), &config, None).unwrap();
    table.rows[0].translated_code = "module x_mod\nimplicit none\nend module".to_string();

    let output = NamedTempFile::new().unwrap();
    batch::write_table(output.path(), &table, &config, false).unwrap();

    // Reading the output back must preserve the embedded newlines.
    let reread = {
        let mut cfg = test_config();
        cfg.legacy_col = "translated_code".to_string();
        cfg.translated_col = "other".to_string();
        batch::read_table(output.path(), &cfg, Some(b';')).unwrap()
    };
    assert_eq!(
        reread.rows[0].legacy_code,
        "module x_mod\nimplicit none\nend module"
    );
}

#[tokio::test]
async fn test_batch_endToEnd_translatedAndScoreColumnsAppended() {
    let input = write_input("legacy_code;Reference\nsegini, bk;call segini(bk)\n");
    let config = test_config();
    let mut table = batch::read_table(input.path(), &config, None).unwrap();

    let backend = MockBackend::always(r#"{"translated_code": "call segini(bk)"}"#);
    let translator = Translator::new(backend, "test-model", PromptProfile::json());
    // Scorer pointing at a dead port: every row gets the sentinel score.
    let scorer = ChrfClient::new("http://127.0.0.1:9/score", 2);

    let controller = BatchController::new(config.clone(), translator, Some(scorer));
    let summary = controller.run(&mut table).await;

    assert_eq!(summary.translated, 1);
    assert_eq!(summary.failed, 0);
    assert_eq!(table.rows[0].translated_code, "call segini(bk)");
    assert_eq!(table.rows[0].score, Some(-1.0));

    let output = NamedTempFile::new().unwrap();
    batch::write_table(output.path(), &table, &config, true).unwrap();
    let written = std::fs::read_to_string(output.path()).unwrap();

    let header = written.lines().next().unwrap();
    assert_eq!(header, "legacy_code;Reference;translated_code;translated_code_score");
    assert!(written.contains("call segini(bk)"));
    assert!(written.contains("-1"));
}

#[tokio::test]
async fn test_batch_emptyRow_shouldSkipWithoutCallingEndpoint() {
    let input = write_input("legacy_code;Reference\n;\nsegini, bk;\n");
    let config = test_config();
    let mut table = batch::read_table(input.path(), &config, None).unwrap();

    let backend = MockBackend::always(r#"{"translated_code": "call segini(bk)"}"#);
    let translator = Translator::new(backend, "test-model", PromptProfile::json());
    let controller = BatchController::new(config, translator, None);

    let summary = controller.run(&mut table).await;

    assert_eq!(summary.skipped_empty, 1);
    assert_eq!(summary.translated, 1);
    assert_eq!(table.rows[0].translated_code, "");
    assert_eq!(table.rows[1].translated_code, "call segini(bk)");
}

#[tokio::test]
async fn test_batch_failedRow_shouldNotAbortBatch_andStayDistinguishable() {
    let input = write_input("legacy_code;Reference\nfirst;\nsecond;\n");
    let config = test_config();
    let mut table = batch::read_table(input.path(), &config, None).unwrap();

    // First row exhausts its retries, second row succeeds.
    let backend = MockBackend::new(vec![
        ScriptedResponse::Network("refused".to_string()),
        ScriptedResponse::Network("refused".to_string()),
        ScriptedResponse::Content(r#"{"translated_code": "end"}"#.to_string()),
    ]);
    let translator = Translator::new(backend, "test-model", PromptProfile::json()).with_retry(
        RetryPolicy {
            max_attempts: 2,
            backoff_base: std::time::Duration::from_millis(1),
        },
    );
    let controller = BatchController::new(config, translator, None);

    let summary = controller.run(&mut table).await;

    assert_eq!(summary.failed, 1);
    assert_eq!(summary.translated, 1);
    assert!(table.rows[0].translated_code.starts_with(ERROR_MARKER));
    assert_eq!(table.rows[1].translated_code, "end");
}
