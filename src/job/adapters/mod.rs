//! Adapter implementations of the job ports.

pub mod broadcast;
pub mod memory;
pub mod postgres;
