//! Stochastic valuation.

pub mod monte_carlo;
pub mod sampling;
pub mod stats;

pub use monte_carlo::{MonteCarloConfig, MonteCarloResult, MonteCarloSimulator, SimulationMode};
pub use sampling::{sample_normal, sample_triangular, Distribution};
pub use stats::{percentile, DistributionSummary};
