/// Result ledger for a rotation run.
///
/// The ledger is the engine's sole externally visible state: an append-only,
/// ordered collection of per-request outcome records. Insertion order equals
/// sequence order; records are never mutated after creation.
use chrono::{DateTime, Local};

/// Sentinel used when a response carried no resolvable IP address.
pub const UNKNOWN_IP: &str = "Unknown";

/// Classification of a single request attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Response received through the rotated egress path.
    Success,
    /// Response received, but issued directly because the remote-execution
    /// tool was unavailable. The attempt did not traverse a rotated path.
    DirectFallback,
    /// The request exceeded its configured time bound.
    Timeout,
    /// Connection, DNS, or remote-execution failure.
    TransportError,
    /// Response received but unusable: error status or undecodable body.
    ProtocolError,
}

impl Outcome {
    /// Whether the attempt produced a usable response body.
    pub fn is_success(self) -> bool {
        matches!(self, Self::Success | Self::DirectFallback)
    }
}

impl std::fmt::Display for Outcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            Self::Success => "Success",
            Self::DirectFallback => "DirectFallback",
            Self::Timeout => "Timeout",
            Self::TransportError => "TransportError",
            Self::ProtocolError => "ProtocolError",
        };
        write!(f, "{}", label)
    }
}

/// One request attempt, created exactly once by the executor and owned by
/// the ledger thereafter.
#[derive(Debug, Clone)]
pub struct RequestRecord {
    /// 1-based, unique, monotonically increasing within a run.
    pub sequence_no: u32,
    pub timestamp: DateTime<Local>,
    pub region: String,
    pub ip_address: String,
    /// Absent on hard failure (timeout, transport error).
    pub status_code: Option<u16>,
    pub elapsed_ms: f64,
    pub outcome: Outcome,
}

impl RequestRecord {
    /// Whether the observed IP is a real address rather than the sentinel.
    pub fn has_known_ip(&self) -> bool {
        !self.ip_address.is_empty() && self.ip_address != UNKNOWN_IP
    }
}

/// Append-only ordered collection of request records.
#[derive(Debug, Default)]
pub struct ResultLedger {
    records: Vec<RequestRecord>,
}

impl ResultLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&mut self, record: RequestRecord) {
        self.records.push(record);
    }

    pub fn records(&self) -> &[RequestRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Number of attempts that produced a usable response.
    pub fn successes(&self) -> usize {
        self.records
            .iter()
            .filter(|record| record.outcome.is_success())
            .count()
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use chrono::TimeZone;

    /// Builds a record with fixed timing fields for ledger and export tests.
    pub fn record(sequence_no: u32, outcome: Outcome, ip: &str) -> RequestRecord {
        let status_code = match outcome {
            Outcome::Success | Outcome::DirectFallback => Some(200),
            Outcome::ProtocolError => Some(500),
            Outcome::Timeout | Outcome::TransportError => None,
        };
        RequestRecord {
            sequence_no,
            timestamp: Local
                .timestamp_opt(1_700_000_000 + i64::from(sequence_no), 0)
                .single()
                .unwrap_or_else(Local::now),
            region: format!("region-{}", sequence_no),
            ip_address: ip.to_string(),
            status_code,
            elapsed_ms: 100.0 + f64::from(sequence_no),
            outcome,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use test_support::record;

    #[test]
    fn test_append_preserves_sequence_order() {
        let mut ledger = ResultLedger::new();
        for seq in 1..=5 {
            ledger.append(record(seq, Outcome::Success, "203.0.113.1"));
        }

        assert_eq!(ledger.len(), 5);
        let sequences: Vec<u32> = ledger.records().iter().map(|r| r.sequence_no).collect();
        assert_eq!(sequences, vec![1, 2, 3, 4, 5]);
    }

    #[test]
    fn test_successes_counts_usable_outcomes() {
        let mut ledger = ResultLedger::new();
        ledger.append(record(1, Outcome::Success, "203.0.113.1"));
        ledger.append(record(2, Outcome::Timeout, UNKNOWN_IP));
        ledger.append(record(3, Outcome::DirectFallback, "203.0.113.2"));
        ledger.append(record(4, Outcome::TransportError, UNKNOWN_IP));
        ledger.append(record(5, Outcome::ProtocolError, UNKNOWN_IP));

        assert_eq!(ledger.successes(), 2);
    }

    #[test]
    fn test_has_known_ip() {
        assert!(record(1, Outcome::Success, "203.0.113.1").has_known_ip());
        assert!(!record(2, Outcome::Timeout, UNKNOWN_IP).has_known_ip());
        assert!(!record(3, Outcome::Timeout, "").has_known_ip());
    }

    #[test]
    fn test_empty_ledger() {
        let ledger = ResultLedger::new();
        assert!(ledger.is_empty());
        assert_eq!(ledger.len(), 0);
        assert_eq!(ledger.successes(), 0);
    }
}
