mod csv;
mod ip_list;

use crate::config::ExportConfig;
use crate::console::{self, Status};
use crate::error::RunError;
use crate::ledger::ResultLedger;
use anyhow::Result;
use async_trait::async_trait;
use std::path::Path;

pub use csv::CsvExporter;
pub use ip_list::IpListExporter;

/// Trait for the artifacts derived from a finished ledger.
///
/// Exporters consume the ledger read-only and write one artifact each,
/// overwriting any previous file at the same path. Each exporter handles
/// its own failure; one failing never affects the others or the ledger.
#[async_trait]
pub trait Exporter: Send + Sync {
    async fn export(&self, ledger: &ResultLedger) -> Result<()>;

    /// Returns the name of this exporter for logging purposes.
    fn name(&self) -> &'static str;

    /// Path of the artifact this exporter writes.
    fn path(&self) -> &Path;
}

pub fn create_exporters(conf: &ExportConfig) -> Vec<Box<dyn Exporter>> {
    vec![
        Box::new(CsvExporter::new(conf.csv_path.clone())),
        Box::new(IpListExporter::new(conf.ip_list_path.clone())),
    ]
}

/// Runs every exporter over the finished ledger, reporting each result.
/// Export failures are reported and swallowed; the ledger stays valid.
pub async fn export_all(exporters: &[Box<dyn Exporter>], ledger: &ResultLedger) {
    let export_futures: Vec<_> = exporters
        .iter()
        .map(|exporter| async move {
            match exporter.export(ledger).await {
                Ok(()) => {
                    console::status(
                        Status::Success,
                        &format!("Exported: {}", exporter.path().display()),
                    );
                }
                Err(source) => {
                    let failure = anyhow::Error::new(RunError::ExportFailure {
                        path: exporter.path().to_path_buf(),
                        source,
                    });
                    tracing::warn!("exporter '{}' failed: {:#}", exporter.name(), failure);
                    console::status(Status::Error, &format!("{:#}", failure));
                }
            }
        })
        .collect();

    futures::future::join_all(export_futures).await;
}
