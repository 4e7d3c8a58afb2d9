/// Endpoint pool discovery.
///
/// Providers read already-provisioned infrastructure state and turn it into
/// an ordered endpoint pool. Discovery never fails: when no infrastructure
/// is available the pool comes back empty and the run controller treats
/// that as the terminal condition.
use crate::endpoint::EndpointDescriptor;
use async_trait::async_trait;
use std::path::PathBuf;
use std::time::Duration;
use tokio::process::Command;
use tokio::time::timeout;

const STATE_DISCOVERY_TIMEOUT: Duration = Duration::from_secs(10);
const TOOL_PROBE_TIMEOUT: Duration = Duration::from_secs(5);

/// Deployed instance regions and their zones, one instance per region.
const INSTANCE_REGIONS: [(&str, &str); 5] = [
    ("us-central1", "us-central1-a"),
    ("us-east1", "us-east1-b"),
    ("us-west1", "us-west1-a"),
    ("europe-west1", "europe-west1-b"),
    ("asia-east1", "asia-east1-a"),
];

/// Whether the remote-execution channel behind a pool is usable.
///
/// Instance pools carry `Available` with the cloud project to run commands
/// under, or `Unavailable` when the tool probe failed; gateway pools never
/// consult the channel and always carry `Unavailable`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemoteExec {
    Available { project: String },
    Unavailable,
}

/// An immutable-for-the-run, ordered list of egress endpoints plus the
/// remote-execution context they were discovered under.
#[derive(Debug, Clone)]
pub struct EndpointPool {
    pub endpoints: Vec<EndpointDescriptor>,
    pub remote_exec: RemoteExec,
}

impl EndpointPool {
    pub fn is_empty(&self) -> bool {
        self.endpoints.is_empty()
    }

    pub fn len(&self) -> usize {
        self.endpoints.len()
    }
}

/// Source of egress endpoints for a run.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait EndpointProvider: Send + Sync {
    /// Discovers the endpoint pool. An empty pool means no infrastructure
    /// is available; discovery itself never errors.
    async fn load(&self) -> EndpointPool;

    /// Returns the name of this provider for logging purposes.
    fn name(&self) -> &'static str;
}

/// Provider reading API-gateway endpoints from Terraform state.
///
/// Runs `terraform output -json api_endpoints_flat` in the configured state
/// directory and parses the resulting JSON array of endpoint URLs. A missing
/// directory, non-zero exit, timeout, or malformed output all yield an
/// empty pool.
pub struct GatewayProvider {
    state_dir: PathBuf,
}

impl GatewayProvider {
    pub fn new(state_dir: PathBuf) -> Self {
        Self { state_dir }
    }

    async fn read_terraform_outputs(&self) -> Option<Vec<String>> {
        if !self.state_dir.exists() {
            tracing::warn!(
                "terraform state directory {} does not exist",
                self.state_dir.display()
            );
            return None;
        }

        let output = Command::new("terraform")
            .args(["output", "-json", "api_endpoints_flat"])
            .current_dir(&self.state_dir)
            .kill_on_drop(true)
            .output();

        match timeout(STATE_DISCOVERY_TIMEOUT, output).await {
            Ok(Ok(output)) if output.status.success() => {
                match serde_json::from_slice::<Vec<String>>(&output.stdout) {
                    Ok(endpoints) => Some(endpoints),
                    Err(e) => {
                        tracing::warn!("failed to parse terraform output: {}", e);
                        None
                    }
                }
            }
            Ok(Ok(output)) => {
                tracing::warn!("terraform output exited with {}", output.status);
                None
            }
            Ok(Err(e)) => {
                tracing::warn!("failed to run terraform: {}", e);
                None
            }
            Err(_) => {
                tracing::warn!(
                    "terraform output timed out after {} seconds",
                    STATE_DISCOVERY_TIMEOUT.as_secs()
                );
                None
            }
        }
    }
}

#[async_trait]
impl EndpointProvider for GatewayProvider {
    async fn load(&self) -> EndpointPool {
        let endpoints = self
            .read_terraform_outputs()
            .await
            .unwrap_or_default()
            .into_iter()
            .map(EndpointDescriptor::gateway)
            .collect::<Vec<_>>();

        tracing::info!("gateway provider loaded {} endpoints", endpoints.len());
        EndpointPool {
            endpoints,
            remote_exec: RemoteExec::Unavailable,
        }
    }

    fn name(&self) -> &'static str {
        "gateway"
    }
}

/// Provider for compute instances reached over `gcloud compute ssh`.
///
/// The instance roster is fixed at deploy time (one instance per region in
/// `INSTANCE_REGIONS`). Loading probes the gcloud CLI once; when the probe
/// fails the pool still loads, but its remote-execution channel is marked
/// unavailable and the executor falls back to direct requests.
pub struct InstanceProvider {
    project: String,
}

impl InstanceProvider {
    pub fn new(project: impl Into<String>) -> Self {
        Self {
            project: project.into(),
        }
    }

    fn roster() -> Vec<EndpointDescriptor> {
        INSTANCE_REGIONS
            .iter()
            .map(|(region, zone)| EndpointDescriptor::instance(*region, *zone))
            .collect()
    }

    async fn probe_gcloud() -> bool {
        let probe = Command::new("gcloud")
            .arg("--version")
            .kill_on_drop(true)
            .output();

        match timeout(TOOL_PROBE_TIMEOUT, probe).await {
            Ok(Ok(output)) => output.status.success(),
            Ok(Err(e)) => {
                tracing::warn!("gcloud probe failed: {}", e);
                false
            }
            Err(_) => {
                tracing::warn!(
                    "gcloud probe timed out after {} seconds",
                    TOOL_PROBE_TIMEOUT.as_secs()
                );
                false
            }
        }
    }
}

#[async_trait]
impl EndpointProvider for InstanceProvider {
    async fn load(&self) -> EndpointPool {
        let remote_exec = if Self::probe_gcloud().await {
            RemoteExec::Available {
                project: self.project.clone(),
            }
        } else {
            tracing::warn!("gcloud CLI not usable, instance requests will fall back to direct");
            RemoteExec::Unavailable
        };

        let endpoints = Self::roster();
        tracing::info!("instance provider loaded {} endpoints", endpoints.len());
        EndpointPool {
            endpoints,
            remote_exec,
        }
    }

    fn name(&self) -> &'static str {
        "instance"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[tokio::test]
    async fn test_gateway_provider_missing_state_dir_yields_empty_pool() {
        let provider = GatewayProvider::new(PathBuf::from("/nonexistent/terraform-state"));
        let pool = provider.load().await;

        assert!(pool.is_empty());
        assert_eq!(pool.remote_exec, RemoteExec::Unavailable);
    }

    #[test]
    fn test_instance_roster_covers_all_regions() {
        let roster = InstanceProvider::roster();
        assert_eq!(roster.len(), 5);

        let regions: Vec<String> = roster.iter().map(|e| e.region_label()).collect();
        assert_eq!(
            regions,
            vec![
                "us-central1",
                "us-east1",
                "us-west1",
                "europe-west1",
                "asia-east1"
            ]
        );

        match &roster[1] {
            EndpointDescriptor::Instance { name, zone, .. } => {
                assert_eq!(name, "proxy-rot-instance-us-east1");
                assert_eq!(zone, "us-east1-b");
            }
            EndpointDescriptor::Gateway { .. } => panic!("expected instance descriptor"),
        }
    }
}
