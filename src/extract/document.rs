//! Tabular PDF extraction via poppler's `pdftotext`.
//!
//! The card-details document is a multi-page lattice table. `pdftotext
//! -layout` preserves column alignment with runs of spaces, so rows are
//! recovered by splitting each line on two-or-more spaces and keeping the
//! lines whose cell count matches the header. Pages are concatenated into
//! one batch.

use std::path::PathBuf;
use std::process::Command;

use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;
use tracing::{debug, instrument};
use uuid::Uuid;

use crate::batch::Batch;
use crate::error::{EtlError, Result};
use crate::extract::DocumentTableSource;

static CELL_GAP: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s{2,}").unwrap());

pub struct PopplerTableSource {
    client: reqwest::Client,
}

impl PopplerTableSource {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
        }
    }
}

impl Default for PopplerTableSource {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DocumentTableSource for PopplerTableSource {
    #[instrument(skip(self))]
    async fn extract_tables(&self, url: &str) -> Result<Batch> {
        let response = self.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(EtlError::Upstream {
                message: format!("GET {} returned status {}", url, status.as_u16()),
            });
        }
        let bytes = response.bytes().await?;

        let path: PathBuf = std::env::temp_dir().join(format!("retail_etl_{}.pdf", Uuid::new_v4()));
        std::fs::write(&path, &bytes)?;

        let output = Command::new("pdftotext")
            .args(["-layout", path.to_string_lossy().as_ref(), "-"])
            .output();
        let _ = std::fs::remove_file(&path);

        let output = output.map_err(|e| EtlError::Upstream {
            message: format!("failed to run pdftotext: {}", e),
        })?;
        if !output.status.success() {
            return Err(EtlError::Upstream {
                message: format!(
                    "pdftotext failed: {}",
                    String::from_utf8_lossy(&output.stderr)
                ),
            });
        }

        let text = String::from_utf8_lossy(&output.stdout);
        parse_layout_text(&text)
    }
}

/// Parse `pdftotext -layout` output into a batch. The first qualifying line
/// names the columns; repeated header lines on later pages are dropped.
fn parse_layout_text(text: &str) -> Result<Batch> {
    let mut headers: Option<Vec<String>> = None;
    let mut columns: Vec<Vec<Value>> = Vec::new();

    // Pages are separated by form feeds; treat them as one stream of lines
    for line in text.lines() {
        let line = line.trim_matches('\u{c}').trim_end();
        if line.trim().is_empty() {
            continue;
        }
        let cells: Vec<&str> = CELL_GAP.split(line.trim()).collect();
        match &headers {
            None => {
                columns = vec![Vec::new(); cells.len()];
                headers = Some(cells.iter().map(|s| s.to_string()).collect());
            }
            Some(names) => {
                if cells.len() != names.len() {
                    // Ragged line: page furniture or a wrapped cell
                    continue;
                }
                if cells.iter().zip(names.iter()).all(|(c, n)| *c == n.as_str()) {
                    continue; // header repeated on a new page
                }
                for (column, cell) in columns.iter_mut().zip(&cells) {
                    column.push(Value::String(cell.to_string()));
                }
            }
        }
    }

    let headers = headers.ok_or_else(|| EtlError::Upstream {
        message: "document contained no tabular text".to_string(),
    })?;
    debug!(
        columns = headers.len(),
        rows = columns.first().map_or(0, Vec::len),
        "parsed document tables"
    );
    Batch::from_columns(headers.into_iter().zip(columns).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_layout_columns_across_pages() {
        let text = "\
card_number       expiry_date   card_provider                  date_payment_confirmed
30060773296197    09/26         Diners Club / Carte Blanche    2015-11-25
349624180933183   10/23         American Express               2001-06-18
\u{c}card_number       expiry_date   card_provider                  date_payment_confirmed
4971858637664481  04/24         VISA 16 digit                  2008-06-16
";
        let batch = parse_layout_text(text).unwrap();
        assert_eq!(batch.len(), 3);
        let names: Vec<&str> = batch.column_names().collect();
        assert_eq!(
            names,
            vec![
                "card_number",
                "expiry_date",
                "card_provider",
                "date_payment_confirmed"
            ]
        );
        // Single spaces inside a cell survive the split
        assert_eq!(
            batch.column("card_provider").unwrap().values[0],
            json!("Diners Club / Carte Blanche")
        );
    }

    #[test]
    fn ragged_lines_are_skipped() {
        let text = "\
a    b
1    2
page 3 of 12 continued here
3    4
";
        let batch = parse_layout_text(text).unwrap();
        assert_eq!(batch.len(), 2);
    }

    #[test]
    fn empty_document_is_an_upstream_error() {
        assert!(parse_layout_text("\n\n").is_err());
    }
}
