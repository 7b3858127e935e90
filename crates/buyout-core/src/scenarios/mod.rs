//! Scenario analysis over the LBO engine.
//!
//! One- and two-way parameter sweeps, a bootstrap IRR interval over a run's
//! equity flows, and a Monte Carlo over exit multiple, margin and growth.

pub mod bootstrap;
pub mod monte_carlo;
pub mod sensitivity;

pub use bootstrap::{bootstrap_irr, BootstrapConfig, IrrInterval};
pub use monte_carlo::{run_monte_carlo, MonteCarloInput, MonteCarloOutput};
pub use sensitivity::{
    irr_as_f64, run_2d_sensitivity, run_sensitivity, LboParameter, ParameterSweep,
    SensitivityInput, SensitivityOutput, SensitivityRow, TwoWaySensitivityInput,
    TwoWaySensitivityOutput,
};
