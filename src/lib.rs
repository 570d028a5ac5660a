//! forecast-launch: prepare and launch numerical forecast model cycles
//!
//! Merges layered YAML configuration (script defaults, grid, machine,
//! namelist, user overrides) into one snapshot per run cycle, materializes
//! the cycle's working directory, stages static and cycle-dependent inputs,
//! renders control files, writes the model namelist, and invokes the model
//! executable, relaying its output.

pub mod cli;
pub mod config;
pub mod context;
pub mod cycle;
pub mod error;
pub mod launch;
pub mod render;
pub mod stage;
