//! Distributed Calculator Library
//!
//! This library crate defines the modules shared by the two binaries: the
//! `orchestrator` (`main.rs`) and the `agent` (`bin/agent.rs`).
//!
//! ## Architecture Modules
//! - **`calculator`**: The orchestration engine. Compiles expressions into chains of
//!   binary tasks, queues them and advances each expression as results arrive.
//! - **`agent`**: The computing side. A pool of workers that poll the orchestrator,
//!   compute tasks and report results or failures.
//! - **`config`**: Environment-based configuration for both binaries.

pub mod agent;
pub mod calculator;
pub mod config;
