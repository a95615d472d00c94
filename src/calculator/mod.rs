//! Expression Orchestration Module
//!
//! Evaluates arithmetic expressions by splitting them into binary-operation tasks that
//! remote agents compute one at a time.
//!
//! ## Architecture Overview
//! The orchestrator follows a **Pull-based** model:
//! 1. **Compilation**: An infix expression is converted to postfix and then to a linear
//!    chain of tasks. Operands are either numbers or references to an earlier task's output.
//! 2. **Seeding**: The first task is queued as soon as both its operands are numbers.
//! 3. **Dispatch**: Agents poll the global FIFO queue and receive one task at a time.
//! 4. **Ingestion**: Only the result of an expression's *current* task is accepted. The value
//!    replaces the references to it and the next task, now runnable, is queued.
//! 5. **Leasing**: A dispatched task carries a lease; if the agent never answers, the task
//!    goes back to the queue.
//!
//! ## Submodules
//! - **`compiler`**: Validation, tokenization, shunting-yard and chain building.
//! - **`scheduler`**: Shared state, task queue and the per-expression state machine.
//! - **`handlers`**: Axum handlers and the router.
//! - **`protocol`**: HTTP DTOs and endpoint paths.
//! - **`types`**: Tasks, operands, expressions and identifiers.
//! - **`error`**: Compile and scheduling errors.

pub mod compiler;
pub mod error;
pub mod handlers;
pub mod protocol;
pub mod scheduler;
pub mod types;
