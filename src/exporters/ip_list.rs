use super::Exporter;
use crate::ledger::ResultLedger;
use anyhow::{Context, Result};
use async_trait::async_trait;
use std::path::{Path, PathBuf};

/// Exporter that writes a line-oriented proxy list.
///
/// Only records with a resolved IP address contribute, one address per
/// line, in ledger order. Overwrites any previous artifact.
pub struct IpListExporter {
    path: PathBuf,
}

impl IpListExporter {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    fn render(ledger: &ResultLedger) -> String {
        let mut contents = String::new();
        for record in ledger.records() {
            if record.has_known_ip() {
                contents.push_str(&record.ip_address);
                contents.push('\n');
            }
        }
        contents
    }
}

#[async_trait]
impl Exporter for IpListExporter {
    async fn export(&self, ledger: &ResultLedger) -> Result<()> {
        tokio::fs::write(&self.path, Self::render(ledger))
            .await
            .with_context(|| format!("Failed to write ip list: {}", self.path.display()))
    }

    fn name(&self) -> &'static str {
        "ip-list"
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

    #[tokio::test]
    async fn test_only_known_ips_are_listed_in_ledger_order() {
        let mut ledger = ResultLedger::new();
        ledger.append(record(1, Outcome::Success, "203.0.113.1"));
        ledger.append(record(2, Outcome::Timeout, UNKNOWN_IP));
        ledger.append(record(3, Outcome::Success, "203.0.113.2"));
        ledger.append(record(4, Outcome::TransportError, UNKNOWN_IP));
        ledger.append(record(5, Outcome::Success, "203.0.113.3"));

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("proxies.txt");
        let exporter = IpListExporter::new(path.clone());

        exporter.export(&ledger).await.unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = contents.lines().collect();
        assert_eq!(lines, vec!["203.0.113.1", "203.0.113.2", "203.0.113.3"]);
    }

    #[tokio::test]
    async fn test_unknown_only_ledger_yields_empty_file() {
        let mut ledger = ResultLedger::new();
        ledger.append(record(1, Outcome::Timeout, UNKNOWN_IP));
        ledger.append(record(2, Outcome::TransportError, UNKNOWN_IP));

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("proxies.txt");
        let exporter = IpListExporter::new(path.clone());

        exporter.export(&ledger).await.unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        assert_eq!(contents, "");
    }

    #[tokio::test]
    async fn test_reexport_is_byte_identical() {
        let mut ledger = ResultLedger::new();
        ledger.append(record(1, Outcome::Success, "203.0.113.1"));
        ledger.append(record(2, Outcome::DirectFallback, "198.51.100.7"));

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("proxies.txt");
        let exporter = IpListExporter::new(path.clone());

        exporter.export(&ledger).await.unwrap();
        let first = std::fs::read(&path).unwrap();
        exporter.export(&ledger).await.unwrap();
        let second = std::fs::read(&path).unwrap();

        assert_eq!(first, second);
    }
}
