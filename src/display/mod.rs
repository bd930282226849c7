//! TV display: presentation pipeline, synchronizer and async runtime.
//!
//! - Pure list shaping in [`presentation`]
//! - Rotation and connection timers in [`rotation`] and [`connection`]
//! - The deterministic board state machine in [`synchronizer`]
//! - The tokio driver in [`runtime`]

pub mod connection;
pub mod presentation;
pub mod rotation;
pub mod runtime;
pub mod synchronizer;

pub use connection::ConnectionState;
pub use presentation::{DisplayOptions, SortMode, StatusFilter};
pub use runtime::{DisplayControl, DisplayHandle, DisplayRuntime, DisplayRuntimeError};
pub use synchronizer::{BoardView, DisplaySynchronizer, InitialSnapshot, SyncCommand};

#[cfg(test)]
mod tests;
