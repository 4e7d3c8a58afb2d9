/// Run controller for the rotation engine.
///
/// Drives the fixed-count request loop: selects a pool slot per sequence
/// number, executes the attempt, appends the record, paces between
/// requests, and hands the finished ledger back for export. A single
/// request failure never aborts the run; only an empty pool at start is
/// terminal.
use crate::config::RunConfig;
use crate::console::{self, Status};
use crate::endpoint_provider::EndpointProvider;
use crate::error::RunError;
use crate::executor::RequestExecutor;
use crate::ledger::ResultLedger;
use crate::rotation::rotation_slot;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Idle,
    Loading,
    Running,
    Draining,
    Done,
    Aborted,
}

pub struct Runner {
    conf: RunConfig,
    state: RunState,
}

impl Runner {
    pub fn new(conf: RunConfig) -> Self {
        Self {
            conf,
            state: RunState::Idle,
        }
    }

    pub fn state(&self) -> RunState {
        self.state
    }

    /// Runs the full rotation and returns the finished ledger.
    ///
    /// # Errors
    ///
    /// Returns [`RunError::PoolUnavailable`] when the provider discovers no
    /// endpoints, and [`RunError::InvalidTarget`] when the configured
    /// target URL does not parse. Per-request failures are recorded on the
    /// ledger, not returned.
    pub async fn run(&mut self, provider: &dyn EndpointProvider) -> Result<ResultLedger, RunError> {
        self.state = RunState::Loading;
        console::status(
            Status::Wait,
            &format!("Loading {} endpoints...", provider.name()),
        );

        let pool = provider.load().await;
        if pool.is_empty() {
            tracing::warn!("provider {} discovered no endpoints", provider.name());
            self.state = RunState::Aborted;
            return Err(RunError::PoolUnavailable);
        }
        console::status(Status::Success, &format!("Loaded {} endpoints", pool.len()));

        let executor = match RequestExecutor::new(&self.conf.target_url, pool.remote_exec.clone()) {
            Ok(executor) => executor,
            Err(source) => {
                self.state = RunState::Aborted;
                return Err(RunError::InvalidTarget {
                    url: self.conf.target_url.clone(),
                    source,
                });
            }
        };

        self.state = RunState::Running;
        let mut ledger = ResultLedger::new();
        for sequence_no in 1..=self.conf.num_requests {
            let slot = rotation_slot(sequence_no, pool.len());
            let endpoint = &pool.endpoints[slot];

            console::status(
                Status::Request,
                &format!(
                    "Request #{}/{} - Region: {}",
                    sequence_no,
                    self.conf.num_requests,
                    endpoint.region_label()
                ),
            );

            let record = executor.execute(endpoint, sequence_no).await;
            tracing::debug!(
                "request {} through slot {} finished with {}",
                sequence_no,
                slot,
                record.outcome
            );
            console::record_block(&record);
            console::progress(sequence_no, self.conf.num_requests);
            ledger.append(record);

            if sequence_no < self.conf.num_requests && !self.conf.inter_request_delay.is_zero() {
                tokio::time::sleep(self.conf.inter_request_delay).await;
            }
        }

        self.state = RunState::Draining;
        console::run_summary(&ledger);
        self.state = RunState::Done;
        Ok(ledger)
    }
}
