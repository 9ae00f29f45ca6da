//! Cyclic module interface
//!
//! Modules run by the drive loop (currently only the planner) implement
//! [`State`]: they are initialised once from their parameter file, then
//! processed once per cycle until they report they are finished.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use log::{error, info};
use std::fmt::Display;

// ------------------------------------------------------------------------------------------------
// TRAITS
// ------------------------------------------------------------------------------------------------

/// State of a module run once per drive loop cycle.
pub trait State {
    /// Name of the module used in log messages.
    const NAME: &'static str;

    /// Data required during initialisation, usually a parameter file path.
    type InitData;
    type InitError: Display;

    /// Data consumed by one cycle.
    type InputData;
    /// Demands produced by one cycle.
    type OutputData;
    /// What happened during the cycle, for logging and the route summary.
    type StatusReport;
    type ProcError;

    /// Initialise the module, replacing any previous state.
    fn init(&mut self, init_data: Self::InitData) -> Result<(), Self::InitError>;

    /// Process one cycle.
    fn proc(&mut self, input_data: &Self::InputData)
        -> Result<(Self::OutputData, Self::StatusReport), Self::ProcError>;

    /// True once the module has nothing left to do. The drive loop stops once
    /// every module is finished.
    fn is_finished(&self) -> bool {
        false
    }
}

// ------------------------------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ------------------------------------------------------------------------------------------------

/// Initialise a module and log the outcome.
pub fn init_module<S: State>(module: &mut S, init_data: S::InitData)
    -> Result<(), S::InitError>
{
    match module.init(init_data) {
        Ok(()) => {
            info!("{} init complete", S::NAME);
            Ok(())
        },
        Err(e) => {
            error!("{} init failed: {}", S::NAME, e);
            Err(e)
        }
    }
}
