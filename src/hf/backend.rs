//! Capability probe for the local inference backend.
//!
//! The backend is compiled in with the `local-inference` feature. Commands
//! probe it once at start-up and refuse to dispatch when it is unavailable.

use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Backend {
    Available { device: String },
    Unavailable { reason: String },
}

impl Backend {
    pub fn is_available(&self) -> bool {
        matches!(self, Self::Available { .. })
    }
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Available { device } => write!(f, "available ({device})"),
            Self::Unavailable { reason } => write!(f, "unavailable: {reason}"),
        }
    }
}

#[cfg(feature = "local-inference")]
pub fn probe() -> Backend {
    match candle_core::Device::cuda_if_available(0) {
        Ok(device) => Backend::Available {
            device: if device.is_cuda() { "cuda:0" } else { "cpu" }.to_string(),
        },
        Err(err) => Backend::Unavailable {
            reason: format!("no usable compute device: {err}"),
        },
    }
}

#[cfg(not(feature = "local-inference"))]
pub fn probe() -> Backend {
    Backend::Unavailable {
        reason: "apikit was built without the `local-inference` feature".to_string(),
    }
}

/// User-facing instructions for enabling the backend.
pub fn remediation(task: &str, backend: &Backend) -> String {
    let reason = match backend {
        Backend::Unavailable { reason } => reason.as_str(),
        Backend::Available { .. } => "backend reported available",
    };
    format!(
        "Cannot run {task} because no inference backend is available ({reason}).\n\
         Suggested fix:\n  \
         1) Rebuild with the backend enabled: cargo install apikit --features local-inference\n  \
         2) Or run from source: cargo run --features local-inference -- <command>"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[cfg(not(feature = "local-inference"))]
    #[test]
    fn probe_reports_missing_feature() {
        let backend = probe();
        assert!(!backend.is_available());
        assert!(backend.to_string().contains("local-inference"));
    }

    #[test]
    fn remediation_names_the_task_and_the_fix() {
        let backend = Backend::Unavailable {
            reason: "not compiled in".to_string(),
        };
        let text = remediation("sentiment analysis", &backend);
        assert!(text.starts_with("Cannot run sentiment analysis"));
        assert!(text.contains("not compiled in"));
        assert!(text.contains("--features local-inference"));
    }
}
