//! Monte Carlo simulation of enterprise and equity value.
//!
//! Each draw samples WACC, EBIT margin and optionally revenue growth and an
//! exit multiple, then recomputes value from the base-case [`EpvDriver`].
//! Draws are independent: the parallel runner splits them into fixed-size
//! chunks, and chunk `k` owns a ChaCha stream `k` seeded from the run seed,
//! so results depend on the seed and chunk size but never on thread count.

use std::time::Instant;

use clinic_common::{Validate, ValidationError, ValidationResult, Violations};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha20Rng;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use super::sampling::Distribution;
use super::stats::DistributionSummary;
use crate::config::{SimulationDefaults, WaccBounds};
use crate::error::Result;
use crate::valuation::EpvDriver;

/// How each draw turns earnings into enterprise value.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum SimulationMode {
    /// Adjusted earnings capitalized at the sampled WACC
    Epv,
    /// Normalized EBITDA times a sampled EV/EBITDA multiple
    ExitMultiple { multiple: Distribution },
}

/// Simulation parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonteCarloConfig {
    pub iterations: usize,
    pub seed: u64,
    /// Draws per seeded stream in the parallel runner
    pub chunk_size: usize,
    pub wacc: Distribution,
    pub ebit_margin: Distribution,
    /// One-year revenue growth applied before valuing; none keeps revenue flat
    pub revenue_growth: Option<Distribution>,
    pub mode: SimulationMode,
}

impl MonteCarloConfig {
    /// Normal WACC and triangular margin centred on the base case.
    pub fn around_base(base_wacc: f64, base_margin: f64, defaults: &SimulationDefaults) -> Self {
        Self {
            iterations: defaults.iterations,
            seed: defaults.seed,
            chunk_size: defaults.chunk_size,
            wacc: Distribution::Normal {
                mean: base_wacc,
                std_dev: defaults.wacc_std_dev,
            },
            ebit_margin: Distribution::Triangular {
                min: base_margin - defaults.margin_half_width,
                mode: base_margin,
                max: base_margin + defaults.margin_half_width,
            },
            revenue_growth: None,
            mode: SimulationMode::Epv,
        }
    }

    pub fn with_iterations(mut self, iterations: usize) -> Self {
        self.iterations = iterations;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }
}

impl Validate for MonteCarloConfig {
    fn validate(&self) -> ValidationResult<()> {
        let mut v = Violations::new();
        v.ensure(self.iterations >= 1, "simulation.iterations", "must be at least 1");
        v.ensure(self.chunk_size >= 1, "simulation.chunk_size", "must be at least 1");
        v.merge(self.wacc.validate_as("simulation.wacc"));
        v.merge(self.ebit_margin.validate_as("simulation.ebit_margin"));
        if let Some(growth) = &self.revenue_growth {
            v.merge(growth.validate_as("simulation.revenue_growth"));
        }
        if let SimulationMode::ExitMultiple { multiple } = &self.mode {
            v.merge(multiple.validate_as("simulation.exit_multiple"));
        }
        v.finish()
    }
}

/// Summaries of the simulated distributions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonteCarloResult {
    pub enterprise: DistributionSummary,
    pub equity: DistributionSummary,
    pub sample_count: usize,
    /// Seed of the parallel runner; `None` for a caller-supplied generator
    pub seed: Option<u64>,
    pub probability_negative_equity: f64,
}

#[derive(Debug, Clone, Copy)]
struct Draw {
    enterprise: f64,
    equity: f64,
}

/// Draws scenarios around a base-case driver.
pub struct MonteCarloSimulator<'a> {
    driver: &'a EpvDriver,
    bounds: &'a WaccBounds,
}

impl<'a> MonteCarloSimulator<'a> {
    pub fn new(driver: &'a EpvDriver, bounds: &'a WaccBounds) -> Self {
        Self { driver, bounds }
    }

    /// Run in parallel with per-chunk seeded streams.
    pub fn run(&self, config: &MonteCarloConfig) -> Result<MonteCarloResult> {
        config.validate()?;
        let started = Instant::now();

        let chunks = config.iterations.div_ceil(config.chunk_size);
        let draws: Vec<Draw> = (0..chunks)
            .into_par_iter()
            .map(|k| {
                let mut rng = ChaCha20Rng::seed_from_u64(config.seed);
                rng.set_stream(k as u64);
                let n = config
                    .chunk_size
                    .min(config.iterations - k * config.chunk_size);
                (0..n)
                    .map(|_| self.draw(config, &mut rng))
                    .collect::<Result<Vec<_>>>()
            })
            .collect::<Result<Vec<_>>>()?
            .into_iter()
            .flatten()
            .collect();

        let result = summarize(draws, Some(config.seed))?;
        tracing::info!(
            iterations = result.sample_count,
            seed = config.seed,
            chunks,
            mean_enterprise = result.enterprise.mean,
            p5_equity = result.equity.p5,
            p95_equity = result.equity.p95,
            equity_spread = result.equity.spread(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Monte Carlo simulation complete"
        );
        Ok(result)
    }

    /// Run sequentially on a caller-supplied generator.
    pub fn run_with_rng<R: Rng + ?Sized>(
        &self,
        config: &MonteCarloConfig,
        rng: &mut R,
    ) -> Result<MonteCarloResult> {
        config.validate()?;
        let draws = (0..config.iterations)
            .map(|_| self.draw(config, rng))
            .collect::<Result<Vec<_>>>()?;
        summarize(draws, None)
    }

    fn draw<R: Rng + ?Sized>(&self, config: &MonteCarloConfig, rng: &mut R) -> Result<Draw> {
        let wacc = config
            .wacc
            .sample(rng)
            .clamp(self.bounds.scenario_floor, self.bounds.scenario_ceiling);
        let margin = config.ebit_margin.sample(rng);
        let growth = match &config.revenue_growth {
            Some(d) => d.sample(rng),
            None => 0.0,
        };

        let driver = self.driver.scaled(1.0 + growth).with_ebit_margin(margin);
        let enterprise = match &config.mode {
            SimulationMode::Epv => driver.enterprise_value(wacc)?,
            SimulationMode::ExitMultiple { multiple } => driver.ebitda * multiple.sample(rng),
        };

        Ok(Draw {
            enterprise,
            equity: driver.balance.equity_value(enterprise),
        })
    }
}

fn summarize(draws: Vec<Draw>, seed: Option<u64>) -> Result<MonteCarloResult> {
    let sample_count = draws.len();
    let (mut enterprise, mut equity): (Vec<f64>, Vec<f64>) =
        draws.into_iter().map(|d| (d.enterprise, d.equity)).unzip();
    let negative = equity.iter().filter(|e| **e < 0.0).count();

    let empty = || ValidationError::InvalidValue {
        field: "simulation.iterations".into(),
        reason: "no draws were produced".into(),
    };
    let enterprise = DistributionSummary::from_values(&mut enterprise).ok_or_else(empty)?;
    let equity = DistributionSummary::from_values(&mut equity).ok_or_else(empty)?;

    Ok(MonteCarloResult {
        enterprise,
        equity,
        sample_count,
        seed,
        probability_negative_equity: negative as f64 / sample_count as f64,
    })
}
