//! Step definitions for job progress scenarios.

pub mod world;

mod given;
mod then;
mod when;
