/// Request execution and outcome classification.
///
/// The executor performs one outbound call through a selected egress
/// endpoint, measures elapsed time, and classifies the result. Every
/// attempt produces exactly one record; no failure escapes as an error to
/// the run controller.
use crate::endpoint::EndpointDescriptor;
use crate::endpoint_provider::RemoteExec;
use crate::ledger::{Outcome, RequestRecord, UNKNOWN_IP};
use std::time::Duration;
use tokio::process::Command;
use tokio::time::timeout;
use url::Url;

const GATEWAY_TIMEOUT: Duration = Duration::from_secs(10);
const REMOTE_EXEC_TIMEOUT: Duration = Duration::from_secs(15);

/// Classified outcome of one dispatch, before timing and sequence data are
/// attached.
struct Dispatch {
    outcome: Outcome,
    ip_address: String,
    status_code: Option<u16>,
}

impl Dispatch {
    fn failed(outcome: Outcome, status_code: Option<u16>) -> Self {
        Self {
            outcome,
            ip_address: UNKNOWN_IP.to_string(),
            status_code,
        }
    }
}

pub struct RequestExecutor {
    client: reqwest::Client,
    target_url: String,
    // Path component of the target, extracted once per run and joined onto
    // every gateway base URL.
    target_path: String,
    remote_exec: RemoteExec,
    http_timeout: Duration,
    remote_timeout: Duration,
}

impl RequestExecutor {
    /// Creates an executor for the given target URL and remote-execution
    /// context.
    ///
    /// # Errors
    ///
    /// Returns an error when the target URL does not parse.
    pub fn new(target_url: &str, remote_exec: RemoteExec) -> Result<Self, url::ParseError> {
        Self::with_timeouts(target_url, remote_exec, GATEWAY_TIMEOUT, REMOTE_EXEC_TIMEOUT)
    }

    /// Same as [`RequestExecutor::new`] with explicit time bounds, used by
    /// the inspection mode and tests.
    ///
    /// # Errors
    ///
    /// Returns an error when the target URL does not parse.
    pub fn with_timeouts(
        target_url: &str,
        remote_exec: RemoteExec,
        http_timeout: Duration,
        remote_timeout: Duration,
    ) -> Result<Self, url::ParseError> {
        let parsed = Url::parse(target_url)?;
        Ok(Self {
            client: reqwest::Client::new(),
            target_url: target_url.to_string(),
            target_path: parsed.path().to_string(),
            remote_exec,
            http_timeout,
            remote_timeout,
        })
    }

    /// Executes one attempt through the given endpoint and returns its
    /// record. All failure states are represented as outcome kinds.
    pub async fn execute(&self, endpoint: &EndpointDescriptor, sequence_no: u32) -> RequestRecord {
        let timestamp = chrono::Local::now();
        let region = endpoint.region_label();
        let start = tokio::time::Instant::now();

        let dispatch = match endpoint {
            EndpointDescriptor::Gateway { url } => {
                let request_url = format!("{}{}", url, self.target_path);
                self.dispatch_http(&request_url, Outcome::Success).await
            }
            EndpointDescriptor::Instance { name, zone, .. } => match &self.remote_exec {
                RemoteExec::Available { project } => {
                    self.dispatch_remote(name, zone, project).await
                }
                // Remote-execution tool unavailable: the request goes out
                // directly and the outcome records the fallback.
                RemoteExec::Unavailable => {
                    self.dispatch_http(&self.target_url, Outcome::DirectFallback).await
                }
            },
        };

        let elapsed_ms = start.elapsed().as_secs_f64() * 1000.0;
        RequestRecord {
            sequence_no,
            timestamp,
            region,
            ip_address: dispatch.ip_address,
            status_code: dispatch.status_code,
            elapsed_ms,
            outcome: dispatch.outcome,
        }
    }

    async fn dispatch_http(&self, request_url: &str, success_kind: Outcome) -> Dispatch {
        let response = match self
            .client
            .get(request_url)
            .timeout(self.http_timeout)
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) if e.is_timeout() => return Dispatch::failed(Outcome::Timeout, None),
            Err(e) => {
                tracing::debug!("transport failure for {}: {}", request_url, e);
                return Dispatch::failed(Outcome::TransportError, None);
            }
        };

        let status = response.status();
        if !status.is_success() {
            return Dispatch::failed(Outcome::ProtocolError, Some(status.as_u16()));
        }

        match response.json::<serde_json::Value>().await {
            Ok(body) => Dispatch {
                outcome: success_kind,
                ip_address: extract_ip(&body),
                status_code: Some(status.as_u16()),
            },
            Err(e) if e.is_timeout() => Dispatch::failed(Outcome::Timeout, None),
            Err(e) => {
                tracing::debug!("undecodable body from {}: {}", request_url, e);
                Dispatch::failed(Outcome::ProtocolError, Some(status.as_u16()))
            }
        }
    }

    async fn dispatch_remote(&self, name: &str, zone: &str, project: &str) -> Dispatch {
        let command = format!("curl -s {}", self.target_url);
        let output = Command::new("gcloud")
            .args([
                "compute",
                "ssh",
                name,
                "--zone",
                zone,
                "--project",
                project,
                "--command",
                command.as_str(),
                "--quiet",
            ])
            .kill_on_drop(true)
            .output();

        match timeout(self.remote_timeout, output).await {
            Ok(Ok(output)) if output.status.success() => {
                match serde_json::from_slice::<serde_json::Value>(&output.stdout) {
                    Ok(body) => Dispatch {
                        outcome: Outcome::Success,
                        ip_address: extract_ip(&body),
                        // The remote curl does not surface the HTTP status;
                        // a decodable body implies the request went through.
                        status_code: Some(200),
                    },
                    Err(e) => {
                        tracing::debug!("undecodable response from {}: {}", name, e);
                        Dispatch::failed(Outcome::ProtocolError, None)
                    }
                }
            }
            Ok(Ok(output)) => {
                tracing::debug!("remote execution on {} exited with {}", name, output.status);
                Dispatch::failed(Outcome::TransportError, None)
            }
            Ok(Err(e)) => {
                tracing::debug!("failed to run gcloud for {}: {}", name, e);
                Dispatch::failed(Outcome::TransportError, None)
            }
            Err(_) => Dispatch::failed(Outcome::Timeout, None),
        }
    }
}

/// Extracts the originating IP from a target response body. The target
/// reports it under the `origin` key; anything else yields the sentinel.
fn extract_ip(body: &serde_json::Value) -> String {
    body.get("origin")
        .and_then(|value| value.as_str())
        .unwrap_or(UNKNOWN_IP)
        .to_string()
}
