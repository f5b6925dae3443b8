//! Non-fatal findings accumulated alongside results.

use serde::{Deserialize, Serialize};

/// Severity of a warning or failed cross-check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Low => write!(f, "low"),
            Self::Medium => write!(f, "medium"),
            Self::High => write!(f, "high"),
            Self::Critical => write!(f, "critical"),
        }
    }
}

/// What raised the warning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WarningKind {
    /// Too little history for the preferred estimation method
    InsufficientData,
    /// Methods or benchmarks disagree beyond tolerance
    Consistency,
    /// Throughput limits bind or are missing
    Capacity,
}

/// A non-blocking annotation on a valuation result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValuationWarning {
    pub kind: WarningKind,
    pub severity: Severity,
    /// Stable machine-readable code, e.g. `capacity_constrained`
    pub code: String,
    pub message: String,
}

impl ValuationWarning {
    pub fn new(
        kind: WarningKind,
        severity: Severity,
        code: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            kind,
            severity,
            code: code.into(),
            message: message.into(),
        }
    }

    pub fn insufficient_data(
        severity: Severity,
        code: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::new(WarningKind::InsufficientData, severity, code, message)
    }

    pub fn consistency(
        severity: Severity,
        code: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::new(WarningKind::Consistency, severity, code, message)
    }

    pub fn capacity(
        severity: Severity,
        code: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::new(WarningKind::Capacity, severity, code, message)
    }

    /// High and critical warnings should be surfaced prominently.
    pub fn needs_attention(&self) -> bool {
        self.severity >= Severity::High
    }
}

/// Emit accumulated warnings to the log.
pub(crate) fn log_warnings(warnings: &[ValuationWarning]) {
    for w in warnings {
        if w.needs_attention() {
            tracing::warn!(
                code = %w.code,
                severity = %w.severity,
                kind = ?w.kind,
                "{}",
                w.message
            );
        } else {
            tracing::debug!(
                code = %w.code,
                severity = %w.severity,
                kind = ?w.kind,
                "{}",
                w.message
            );
        }
    }
}
