/// Pool inspection mode.
///
/// Probes each discovered gateway endpoint once with a short time bound and
/// reports the IP it egresses from, without running a rotation. Observed
/// IPs can optionally be written to a line-oriented file.
use crate::config::Config;
use crate::console::{self, Status};
use crate::endpoint_provider::{EndpointProvider, GatewayProvider, RemoteExec};
use crate::executor::RequestExecutor;
use anyhow::{Context, Result};
use std::time::Duration;

const PROBE_TIMEOUT: Duration = Duration::from_secs(5);
const OBSERVED_IPS_PATH: &str = "current_ips.txt";

pub async fn run(conf: &Config) -> Result<()> {
    console::status(Status::Info, "Checking gateway endpoints...");

    let provider = GatewayProvider::new(conf.gateway.state_dir.clone());
    let pool = provider.load().await;
    if pool.is_empty() {
        console::status(
            Status::Error,
            "No gateway endpoints found. Deploy the terraform infrastructure first.",
        );
        return Ok(());
    }

    let executor = RequestExecutor::with_timeouts(
        &conf.run.target_url,
        RemoteExec::Unavailable,
        PROBE_TIMEOUT,
        PROBE_TIMEOUT,
    )
    .with_context(|| format!("invalid target url {:?}", conf.run.target_url))?;

    let mut observed = Vec::new();
    for (index, endpoint) in pool.endpoints.iter().enumerate() {
        let record = executor.execute(endpoint, (index + 1) as u32).await;
        if record.outcome.is_success() && record.has_known_ip() {
            println!(
                "  [{}] {:15} → {}",
                record.sequence_no, record.region, record.ip_address
            );
            observed.push(record.ip_address);
        } else {
            println!(
                "  [{}] {:15} → failed ({})",
                record.sequence_no, record.region, record.outcome
            );
        }
    }

    console::separator();
    console::status(Status::Success, &format!("{} IPs available", observed.len()));

    if observed.is_empty() {
        return Ok(());
    }
    if console::prompt_yes_no(&format!("Export IPs to {}?", OBSERVED_IPS_PATH)) {
        write_observed(OBSERVED_IPS_PATH, &observed).await?;
        console::status(
            Status::Success,
            &format!("IPs exported: {}", OBSERVED_IPS_PATH),
        );
    }

    Ok(())
}

/// Writes observed IPs one per line. The target reports the origin as a
/// `client, gateway` address pair; only the egress side is kept.
async fn write_observed(path: &str, ips: &[String]) -> Result<()> {
    let mut contents = String::new();
    for ip in ips {
        let egress = ip.rsplit(", ").next().unwrap_or(ip);
        contents.push_str(egress);
        contents.push('\n');
    }

    tokio::fs::write(path, contents)
        .await
        .with_context(|| format!("Failed to write observed ips: {}", path))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[tokio::test]
    async fn test_write_observed_keeps_egress_side_of_address_pairs() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("current_ips.txt");
        let ips = vec![
            "203.0.113.1, 198.51.100.9".to_string(),
            "198.51.100.4".to_string(),
        ];

        write_observed(path.to_str().unwrap(), &ips).await.unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = contents.lines().collect();
        assert_eq!(lines, vec!["198.51.100.9", "198.51.100.4"]);
    }
}
