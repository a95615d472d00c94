use serde::{Deserialize, Serialize};
use std::fmt;

/// Unique identifier for a task handed out to agents.
///
/// Wrapper around a UUID string. Minted by the compiler, one per binary operation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct TaskId(pub String);

impl TaskId {
    /// Generates a new random UUID v4-based TaskId.
    pub fn new() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }
}

impl Default for TaskId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Unique identifier for a submitted expression.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct ExpressionId(pub String);

impl ExpressionId {
    pub fn new() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }
}

impl Default for ExpressionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ExpressionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The four binary operations an agent knows how to compute.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Operation {
    Addition,
    Subtraction,
    Multiplication,
    Division,
}

impl Operation {
    /// Maps an infix operator character to its operation.
    pub fn from_symbol(symbol: char) -> Option<Self> {
        match symbol {
            '+' => Some(Self::Addition),
            '-' => Some(Self::Subtraction),
            '*' => Some(Self::Multiplication),
            '/' => Some(Self::Division),
            _ => None,
        }
    }

    pub fn symbol(&self) -> char {
        match self {
            Self::Addition => '+',
            Self::Subtraction => '-',
            Self::Multiplication => '*',
            Self::Division => '/',
        }
    }

    /// Binding strength used by the infix to postfix conversion.
    pub fn precedence(&self) -> u8 {
        match self {
            Self::Addition | Self::Subtraction => 1,
            Self::Multiplication | Self::Division => 2,
        }
    }
}

/// Nominal execution time (ms) per operation.
///
/// Passed to agents as a hint; the orchestrator never enforces it.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct OperationTimings {
    pub addition_ms: u64,
    pub subtraction_ms: u64,
    pub multiplication_ms: u64,
    pub division_ms: u64,
}

impl OperationTimings {
    pub fn duration_of(&self, operation: Operation) -> u64 {
        match operation {
            Operation::Addition => self.addition_ms,
            Operation::Subtraction => self.subtraction_ms,
            Operation::Multiplication => self.multiplication_ms,
            Operation::Division => self.division_ms,
        }
    }

    /// All operations take zero time. Handy for tests and local runs.
    pub fn instant() -> Self {
        Self {
            addition_ms: 0,
            subtraction_ms: 0,
            multiplication_ms: 0,
            division_ms: 0,
        }
    }
}

impl Default for OperationTimings {
    fn default() -> Self {
        Self {
            addition_ms: 1000,
            subtraction_ms: 1000,
            multiplication_ms: 2000,
            division_ms: 2000,
        }
    }
}

/// One side of a binary operation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Operand {
    /// A concrete number, ready to be sent to an agent.
    Literal(f64),
    /// The not-yet-known output of the task at this index of the same chain.
    PendingOn(usize),
}

impl Operand {
    pub fn is_literal(&self) -> bool {
        matches!(self, Operand::Literal(_))
    }

    pub fn value(&self) -> Option<f64> {
        match self {
            Operand::Literal(value) => Some(*value),
            Operand::PendingOn(_) => None,
        }
    }
}

/// Decimal rendering used on the wire. Never scientific notation.
///
/// Six fixed decimals (`3.000000`) when that parses back to the exact value,
/// otherwise the shortest exact decimal.
impl fmt::Display for Operand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operand::Literal(value) => {
                let fixed = format!("{:.6}", value);
                if fixed.parse::<f64>().ok() == Some(*value) {
                    f.write_str(&fixed)
                } else {
                    write!(f, "{}", value)
                }
            }
            Operand::PendingOn(index) => write!(f, "T{}", index),
        }
    }
}

/// A single binary operation of an expression's reduction.
///
/// Operands may only be rewritten while the task waits for its predecessor;
/// once dispatched the task is read-only.
#[derive(Debug, Clone, PartialEq)]
pub struct Task {
    pub id: TaskId,
    pub arg1: Operand,
    pub arg2: Operand,
    pub operation: Operation,
    /// Nominal duration in milliseconds.
    pub operation_time: u64,
}

impl Task {
    /// A task may be queued only once both operands are concrete numbers.
    pub fn is_eligible(&self) -> bool {
        self.arg1.is_literal() && self.arg2.is_literal()
    }

    /// Replaces every reference to task `index` with `value`.
    /// Returns true if at least one operand changed.
    pub fn resolve(&mut self, index: usize, value: f64) -> bool {
        let mut changed = false;
        for operand in [&mut self.arg1, &mut self.arg2] {
            if *operand == Operand::PendingOn(index) {
                *operand = Operand::Literal(value);
                changed = true;
            }
        }
        changed
    }
}

/// Ordered tasks of one expression plus the operand holding its final value.
///
/// `output` is a `Literal` when the expression is a bare number (no tasks),
/// otherwise it points at the last task.
#[derive(Debug, Clone, PartialEq)]
pub struct TaskChain {
    pub tasks: Vec<Task>,
    pub output: Operand,
}

impl TaskChain {
    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }
}

/// Lifecycle of an expression.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ExpressionStatus {
    /// Accepted, nothing queued yet.
    Pending,
    /// At least one task has been queued.
    Processing,
    /// Every task resolved; `result` holds the value.
    Completed,
    /// An agent reported that a task could not be computed.
    Failed,
}

impl ExpressionStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }
}

/// The orchestrator-side record of a submitted expression.
#[derive(Debug, Clone)]
pub struct Expression {
    pub id: ExpressionId,
    pub source: String,
    pub chain: TaskChain,
    /// Index of the only task whose result will be accepted next.
    pub current_index: usize,
    pub status: ExpressionStatus,
    pub result: Option<f64>,
    pub error: Option<String>,
}

impl Expression {
    pub fn summary(&self) -> ExpressionSummary {
        ExpressionSummary {
            id: self.id.clone(),
            status: self.status,
            result: self.result,
            error: self.error.clone(),
        }
    }

    pub fn current_task(&self) -> Option<&Task> {
        self.chain.tasks.get(self.current_index)
    }
}

/// Read-only snapshot of an expression, as returned by the query endpoints.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ExpressionSummary {
    pub id: ExpressionId,
    pub status: ExpressionStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Counters reported by the periodic stats logger.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatusCounts {
    pub pending: usize,
    pub processing: usize,
    pub completed: usize,
    pub failed: usize,
    pub queued: usize,
    pub leased: usize,
}

/// Helper to get the current system time in milliseconds.
pub fn now_ms() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|elapsed| elapsed.as_millis() as u64)
        .unwrap_or(0)
}
