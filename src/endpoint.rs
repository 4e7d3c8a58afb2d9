/// Egress endpoint descriptors.
///
/// An endpoint is one distinct network path a request can be routed through:
/// either a regional API-gateway URL, or a compute instance reached over a
/// remote-execution channel. Descriptors are created once when the pool is
/// loaded and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EndpointDescriptor {
    /// A regional API-gateway base URL, e.g.
    /// `https://abc123.execute-api.us-east-1.amazonaws.com`.
    Gateway { url: String },

    /// A compute instance addressed by name and zone.
    Instance {
        name: String,
        region: String,
        zone: String,
    },
}

const GATEWAY_HOST_MARKER: &str = ".execute-api.";

impl EndpointDescriptor {
    pub fn gateway(url: impl Into<String>) -> Self {
        Self::Gateway { url: url.into() }
    }

    pub fn instance(region: impl Into<String>, zone: impl Into<String>) -> Self {
        let region = region.into();
        Self::Instance {
            name: format!("proxy-rot-instance-{}", region),
            region,
            zone: zone.into(),
        }
    }

    /// Human-readable region label for this endpoint.
    ///
    /// Gateway URLs follow the `<id>.execute-api.<region>.amazonaws.com`
    /// hostname pattern; anything that does not match yields `"unknown"`.
    /// Instance descriptors carry their region directly.
    pub fn region_label(&self) -> String {
        match self {
            Self::Gateway { url } => url
                .split(GATEWAY_HOST_MARKER)
                .nth(1)
                .and_then(|rest| rest.split('.').next())
                .filter(|region| !region.is_empty())
                .unwrap_or("unknown")
                .to_string(),
            Self::Instance { region, .. } => region.clone(),
        }
    }
}

impl std::fmt::Display for EndpointDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Gateway { url } => write!(f, "{}", url),
            Self::Instance { name, zone, .. } => write!(f, "{} ({})", name, zone),
        }
    }
}
