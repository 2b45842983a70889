/*!
 * Row-by-row batch driver: CSV in, CSV out.
 *
 * Reads the input table, translates the legacy-code column one row at a time,
 * optionally scores each translation against a reference column, and writes
 * the table back out with the translated and score columns appended. Failures
 * are row-local; the output always has one row per input row, with failed
 * rows carrying a marked diagnostic instead of code.
 */

use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use indicatif::{ProgressBar, ProgressStyle};
use log::{debug, info, warn};

use crate::app_config::Config;
use crate::providers::CompletionBackend;
use crate::scoring::ChrfClient;
use crate::translation::{TranslationRequest, TranslationStatus, Translator};

/// One row of the working table.
///
/// Columns the tool does not interpret travel in `passthrough`, aligned with
/// `BatchTable::passthrough_headers`, and are written back untouched.
#[derive(Debug, Clone)]
pub struct RowRecord {
    /// Contents of the legacy-code column
    pub legacy_code: String,
    /// Contents of the reference column, if that column exists
    pub reference: Option<String>,
    /// Uninterpreted columns in input order
    pub passthrough: Vec<String>,
    /// Filled in by the driver
    pub translated_code: String,
    /// Filled in by the driver when scoring is enabled
    pub score: Option<f64>,
}

/// An input table held in memory, plus the shape needed to write it back
#[derive(Debug)]
pub struct BatchTable {
    /// Field delimiter detected from (or forced on) the input
    pub delimiter: u8,
    /// Headers of the uninterpreted columns, input order preserved
    pub passthrough_headers: Vec<String>,
    /// Rows in input order
    pub rows: Vec<RowRecord>,
}

/// Counters reported after a batch run
#[derive(Debug, Default, Clone, Copy)]
pub struct BatchSummary {
    pub translated: u32,
    pub skipped_empty: u32,
    pub failed: u32,
}

/// Guess the delimiter from the header line: `;` wins over `,` on count,
/// matching the files this tool actually sees (semicolon-separated exports).
pub fn sniff_delimiter(header_line: &str) -> u8 {
    let semis = header_line.matches(';').count();
    let commas = header_line.matches(',').count();
    if semis >= commas && semis > 0 { b';' } else { b',' }
}

/// Read the input table.
///
/// The legacy column must exist; the reference column is optional. A
/// pre-existing translated or score column is dropped here and rewritten by
/// the driver. Rows with more fields than headers have the overflow discarded.
pub fn read_table(path: &Path, config: &Config, delimiter: Option<u8>) -> Result<BatchTable> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read input file: {}", path.display()))?;

    let delimiter = match delimiter {
        Some(d) => d,
        None => sniff_delimiter(contents.lines().next().unwrap_or_default()),
    };

    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .flexible(true)
        .from_reader(contents.as_bytes());

    let headers: Vec<String> = reader
        .headers()
        .context("Failed to read table headers")?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();

    let legacy_idx = headers
        .iter()
        .position(|h| *h == config.legacy_col)
        .ok_or_else(|| anyhow!("Input table has no '{}' column", config.legacy_col))?;
    let reference_idx = headers.iter().position(|h| *h == config.reference_col);

    let score_col = config.score_col();
    let passthrough_idx: Vec<usize> = headers
        .iter()
        .enumerate()
        .filter(|(_, h)| **h != config.translated_col && **h != score_col)
        .map(|(i, _)| i)
        .collect();
    let passthrough_headers: Vec<String> =
        passthrough_idx.iter().map(|&i| headers[i].clone()).collect();

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record.context("Failed to read table row")?;
        let field = |i: usize| record.get(i).unwrap_or_default().to_string();

        let reference = reference_idx.map(field).filter(|r| !r.trim().is_empty());
        rows.push(RowRecord {
            legacy_code: field(legacy_idx),
            reference,
            passthrough: passthrough_idx.iter().map(|&i| field(i)).collect(),
            translated_code: String::new(),
            score: None,
        });
    }

    Ok(BatchTable { delimiter, passthrough_headers, rows })
}

/// Write the table back out, appending the translated and score columns.
pub fn write_table(
    path: &Path,
    table: &BatchTable,
    config: &Config,
    with_score: bool,
) -> Result<()> {
    let mut writer = csv::WriterBuilder::new()
        .delimiter(table.delimiter)
        .from_path(path)
        .with_context(|| format!("Failed to create output file: {}", path.display()))?;

    let mut headers = table.passthrough_headers.clone();
    headers.push(config.translated_col.clone());
    if with_score {
        headers.push(config.score_col());
    }
    writer.write_record(&headers)?;

    for row in &table.rows {
        let mut fields = row.passthrough.clone();
        fields.push(row.translated_code.clone());
        if with_score {
            fields.push(row.score.map(|s| s.to_string()).unwrap_or_default());
        }
        writer.write_record(&fields)?;
    }

    writer.flush().context("Failed to flush output file")?;
    Ok(())
}

/// Crude check that a raw-fallback result resembles Fortran at all.
///
/// The cascade trusts bare text unconditionally (source behavior); this only
/// drives a warning so silently-wrong "successes" are visible in the log.
fn looks_like_fortran(code: &str) -> bool {
    let lower = code.to_lowercase();
    ["module", "program", "subroutine", "function", "call ", "implicit none"]
        .iter()
        .any(|kw| lower.contains(kw))
}

/// Sequential batch driver
pub struct BatchController<B: CompletionBackend> {
    config: Config,
    translator: Translator<B>,
    scorer: Option<ChrfClient>,
}

impl<B: CompletionBackend> BatchController<B> {
    /// Create a controller around an already-built translator
    pub fn new(config: Config, translator: Translator<B>, scorer: Option<ChrfClient>) -> Self {
        Self { config, translator, scorer }
    }

    /// Translate every row of `table` in place, preserving input order.
    ///
    /// One in-flight request at a time, with a small politeness delay between
    /// rows. A failed row writes its diagnostic and the loop moves on.
    pub async fn run(&self, table: &mut BatchTable) -> BatchSummary {
        let mut summary = BatchSummary::default();
        let total = table.rows.len() as u64;

        let progress = ProgressBar::new(total);
        progress.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} rows ({percent}%) {msg}")
                .expect("Invalid progress bar template")
                .progress_chars("█▓▒░"),
        );

        for (index, row) in table.rows.iter_mut().enumerate() {
            debug!("processing row {}/{}", index + 1, total);

            let request = TranslationRequest {
                source_snippet: row.legacy_code.clone(),
                temperature: self.config.temperature,
                max_tokens: self.config.max_tokens,
            };

            let result = self.translator.translate(&request).await;

            match result.status {
                TranslationStatus::Empty => {
                    debug!("row {}: empty source, skipped", index + 1);
                    summary.skipped_empty += 1;
                }
                TranslationStatus::Ok => {
                    if !looks_like_fortran(&result.extracted_code) {
                        warn!(
                            "row {}: extracted text does not look like Fortran, \
                             review before trusting it",
                            index + 1
                        );
                    }
                    summary.translated += 1;
                }
                TranslationStatus::ParseFailed | TranslationStatus::NetworkFailed => {
                    warn!("row {}: {}", index + 1, result.extracted_code);
                    summary.failed += 1;
                }
            }

            if let (Some(scorer), Some(reference), TranslationStatus::Ok) =
                (&self.scorer, &row.reference, result.status)
            {
                row.score = Some(scorer.score(&result.extracted_code, reference).await);
            }

            row.translated_code = result.extracted_code;
            progress.inc(1);

            // Stay polite to the endpoint between rows.
            if index as u64 + 1 < total && self.config.row_delay_ms > 0 {
                tokio::time::sleep(Duration::from_millis(self.config.row_delay_ms)).await;
            }
        }

        progress.finish_with_message("done");
        info!(
            "batch finished: {} translated, {} empty, {} failed",
            summary.translated, summary.skipped_empty, summary.failed
        );
        summary
    }
}
