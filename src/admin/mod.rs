//! Admin surface: authenticated job management.
//!
//! - Session and basic-auth checks in [`session`]
//! - Two-phase local edits in [`optimistic`]
//! - The editable job list in [`board`]

pub mod board;
pub mod optimistic;
pub mod session;

pub use board::{AdminBoard, AdminError, AdminPage, AdminResult, pieces_for_percentage};
pub use optimistic::{AdminRow, LedgerError, OptimisticLedger, RowState};
pub use session::{Access, AdminCredentials, AuthError, SessionGate, SessionToken};
