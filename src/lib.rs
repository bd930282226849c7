//! Shop visibility board: job tracking for a machine shop.
//!
//! This crate provides the job model and its validated mutations, the admin
//! surface that edits jobs, and the synchronizer behind the unattended TV
//! board that shows them.
//!
//! # Architecture
//!
//! The job core follows hexagonal architecture principles:
//!
//! - **Domain**: Pure business logic with no infrastructure dependencies
//! - **Ports**: Abstract trait interfaces for storage and change feeds
//! - **Adapters**: Concrete implementations of ports (in-memory, `PostgreSQL`)
//!
//! # Modules
//!
//! - [`job`]: Job domain, ports, adapters and mutation services
//! - [`display`]: TV board presentation, synchronizer and runtime
//! - [`admin`]: Admin job list, optimistic edits and session checks
//! - [`config`]: Display settings and environment loading
//! - [`telemetry`]: Tracing subscriber setup

pub mod admin;
pub mod config;
pub mod display;
pub mod job;
pub mod telemetry;
