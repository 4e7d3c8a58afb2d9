use super::Exporter;
use crate::ledger::ResultLedger;
use anyhow::{Context, Result};
use async_trait::async_trait;
use std::path::{Path, PathBuf};

const HEADER: &str = "request_number,timestamp,ip_address,status_code,response_time_ms";
const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Exporter that writes the full ledger as a tabular CSV file.
///
/// One row per record in ledger order, header row first. An absent status
/// code renders as an empty field; response time is rendered with two
/// decimals. The file is written in one shot, so re-exporting the same
/// ledger yields a byte-identical artifact.
pub struct CsvExporter {
    path: PathBuf,
}

impl CsvExporter {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    fn render(ledger: &ResultLedger) -> String {
        let mut contents = String::from(HEADER);
        contents.push('\n');

        for record in ledger.records() {
            let status_code = record
                .status_code
                .map(|code| code.to_string())
                .unwrap_or_default();
            contents.push_str(&format!(
                "{},{},{},{},{:.2}\n",
                record.sequence_no,
                record.timestamp.format(TIMESTAMP_FORMAT),
                field(&record.ip_address),
                status_code,
                record.elapsed_ms,
            ));
        }

        contents
    }
}

// Quotes a field when it would break the row. The target can report the
// origin as a comma-separated address pair.
fn field(value: &str) -> String {
    if value.contains(',') || value.contains('"') || value.contains('\n') {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

#[async_trait]
impl Exporter for CsvExporter {
    async fn export(&self, ledger: &ResultLedger) -> Result<()> {
        tokio::fs::write(&self.path, Self::render(ledger))
            .await
            .with_context(|| format!("Failed to write csv file: {}", self.path.display()))
    }

    fn name(&self) -> &'static str {
        "csv"
    }

    fn path(&self) -> &Path {
        &self.path
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::test_support::record;
    use crate::ledger::{Outcome, UNKNOWN_IP};
    use pretty_assertions::assert_eq;

    fn sample_ledger() -> ResultLedger {
        let mut ledger = ResultLedger::new();
        ledger.append(record(1, Outcome::Success, "203.0.113.1"));
        ledger.append(record(2, Outcome::Timeout, UNKNOWN_IP));
        ledger.append(record(3, Outcome::Success, "203.0.113.2"));
        ledger.append(record(4, Outcome::TransportError, UNKNOWN_IP));
        ledger.append(record(5, Outcome::Success, "203.0.113.3"));
        ledger
    }

    #[tokio::test]
    async fn test_csv_has_header_and_one_row_per_record() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("proxy_ips.csv");
        let exporter = CsvExporter::new(path.clone());

        exporter.export(&sample_ledger()).await.unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = contents.lines().collect();
        assert_eq!(lines.len(), 6);
        assert_eq!(lines[0], HEADER);
        assert!(lines[1].starts_with("1,"));
        assert!(lines[5].starts_with("5,"));
    }

    #[tokio::test]
    async fn test_failed_attempts_have_empty_status_field() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("proxy_ips.csv");
        let exporter = CsvExporter::new(path.clone());

        exporter.export(&sample_ledger()).await.unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        let timeout_row: Vec<&str> = contents.lines().nth(2).unwrap().split(',').collect();
        assert_eq!(timeout_row[0], "2");
        assert_eq!(timeout_row[2], UNKNOWN_IP);
        assert_eq!(timeout_row[3], "");
    }

    #[tokio::test]
    async fn test_reexport_is_byte_identical() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("proxy_ips.csv");
        let exporter = CsvExporter::new(path.clone());
        let ledger = sample_ledger();

        exporter.export(&ledger).await.unwrap();
        let first = std::fs::read(&path).unwrap();

        exporter.export(&ledger).await.unwrap();
        let second = std::fs::read(&path).unwrap();

        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_export_overwrites_previous_artifact() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("proxy_ips.csv");
        std::fs::write(&path, "stale contents").unwrap();

        let exporter = CsvExporter::new(path.clone());
        exporter.export(&sample_ledger()).await.unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        assert!(contents.starts_with(HEADER));
        assert!(!contents.contains("stale"));
    }

    #[test]
    fn test_address_pair_field_is_quoted() {
        let mut ledger = ResultLedger::new();
        ledger.append(record(1, Outcome::Success, "203.0.113.1, 198.51.100.2"));

        let contents = CsvExporter::render(&ledger);
        assert!(contents.contains("\"203.0.113.1, 198.51.100.2\""));
    }
}
