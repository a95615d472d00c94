//! Computing Agent Module
//!
//! The stateless worker side of the calculator. An agent pulls tasks from the
//! orchestrator, computes one binary operation per task and pushes the result back.
//!
//! ## Submodules
//! - **`client`**: HTTP client for the orchestrator's internal endpoint, with retries.
//! - **`compute`**: Operand parsing and arithmetic; reports division by zero as an error.
//! - **`worker`**: The polling worker pool.

pub mod client;
pub mod compute;
pub mod worker;

#[cfg(test)]
mod tests;
