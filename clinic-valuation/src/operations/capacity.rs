//! Provider and room throughput limits.

use serde::{Deserialize, Serialize};

use crate::assumptions::{CapacityAssumptions, ServiceLine};
use crate::warning::{Severity, ValuationWarning};

/// Result of comparing appointment demand against throughput.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CapacityAnalysis {
    /// Whether the constraint is applied at all
    pub enabled: bool,
    /// Appointment slots per year across all providers
    pub provider_capacity: f64,
    /// Appointment slots per year across all rooms
    pub room_capacity: f64,
    /// `min(provider_capacity, room_capacity)`
    pub effective_capacity: f64,
    /// Appointment slots demanded per year
    pub demand: f64,
    /// Multiplier on the volume of capacity-consuming lines, in (0, 1]
    pub scale_factor: f64,
}

impl CapacityAnalysis {
    /// Demand exceeds capacity and the constraint scales volume down.
    pub fn is_constrained(&self) -> bool {
        self.scale_factor < 1.0
    }

    /// Demand exists but there are no slots to serve it.
    pub fn is_zero_capacity(&self) -> bool {
        self.enabled && self.demand > 0.0 && self.effective_capacity <= 0.0
    }

    /// Demand as a share of effective capacity.
    pub fn utilization(&self) -> Option<f64> {
        (self.effective_capacity > 0.0).then(|| self.demand / self.effective_capacity)
    }

    pub fn warnings(&self) -> Vec<ValuationWarning> {
        let mut warnings = Vec::new();
        if self.is_zero_capacity() {
            warnings.push(ValuationWarning::capacity(
                Severity::High,
                "zero_capacity",
                format!(
                    "Capacity constraint is enabled but effective capacity is zero against {:.0} \
                     demanded visits; volume was not scaled",
                    self.demand
                ),
            ));
        } else if self.is_constrained() {
            warnings.push(ValuationWarning::capacity(
                Severity::Medium,
                "capacity_constrained",
                format!(
                    "Demand of {:.0} visits exceeds capacity of {:.0}; \
                     service volume scaled to {:.1}%",
                    self.demand,
                    self.effective_capacity,
                    self.scale_factor * 100.0
                ),
            ));
        }
        warnings
    }
}

/// Compute throughput and the demand-scaling factor for one location.
pub fn analyze_capacity(capacity: &CapacityAssumptions, lines: &[ServiceLine]) -> CapacityAnalysis {
    let provider_capacity: f64 = capacity.providers.iter().map(|p| p.annual_capacity()).sum();
    let room_capacity = f64::from(capacity.rooms)
        * capacity.hours_per_day
        * capacity.days_per_week
        * 52.0
        * capacity.room_utilization;
    let effective_capacity = provider_capacity.min(room_capacity);
    let demand: f64 = lines.iter().map(|l| l.visit_demand()).sum();

    // Zero capacity leaves volume untouched and is reported as a warning instead.
    let scale_factor = if capacity.enabled && demand > 0.0 && effective_capacity > 0.0 {
        (effective_capacity / demand).min(1.0)
    } else {
        1.0
    };

    CapacityAnalysis {
        enabled: capacity.enabled,
        provider_capacity,
        room_capacity,
        effective_capacity,
        demand,
        scale_factor,
    }
}
