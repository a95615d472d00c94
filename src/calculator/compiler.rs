//! Expression Compiler
//!
//! Turns an infix arithmetic expression into the linear chain of binary tasks that
//! agents execute one after another.
//!
//! ## Pipeline
//! 1. **Validation**: every character must be a digit, `.`, one of `+ - * / ( )` or whitespace.
//! 2. **Tokenization**: numbers, operators and parentheses. A `-` in operand position
//!    directly followed by a number is read as the number's sign.
//! 3. **Shunting-yard**: infix to postfix, left-associative within a precedence tier.
//! 4. **Chain building**: a postfix walk where each operator consumes two operands and
//!    pushes a `PendingOn` reference to the task it just created.

use super::error::CompileError;
use super::types::{Operand, Operation, OperationTimings, Task, TaskChain, TaskId};

use regex::Regex;
use std::sync::LazyLock;

static TOKEN_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?P<num>[0-9.]+)|(?P<sym>[-+*/()])").expect("token pattern is valid")
});

#[derive(Debug, Clone, Copy, PartialEq)]
pub(super) enum Token {
    Number(f64),
    Operator(Operation),
    LeftParen,
    RightParen,
}

/// Compiles `source` into a task chain, stamping each task with its nominal duration.
pub fn compile(source: &str, timings: &OperationTimings) -> Result<TaskChain, CompileError> {
    let tokens = tokenize(source)?;
    if tokens.is_empty() {
        return Err(CompileError::EmptyExpression);
    }

    let postfix = to_postfix(tokens)?;
    let chain = build_chain(postfix, timings)?;

    tracing::debug!("Compiled '{}' into {} tasks", source.trim(), chain.len());
    Ok(chain)
}

fn is_valid_char(ch: char) -> bool {
    ch.is_ascii_digit() || matches!(ch, '.' | '+' | '-' | '*' | '/' | '(' | ')') || ch.is_whitespace()
}

pub(super) fn tokenize(source: &str) -> Result<Vec<Token>, CompileError> {
    if let Some((position, ch)) = source.char_indices().find(|(_, ch)| !is_valid_char(*ch)) {
        return Err(CompileError::InvalidCharacter { ch, position });
    }

    let mut tokens: Vec<Token> = Vec::new();
    let mut negate_next = false;

    for captures in TOKEN_PATTERN.captures_iter(source) {
        if let Some(number) = captures.name("num") {
            let text = number.as_str();
            // Out-of-range literals parse to infinity; reject them like malformed ones.
            let value = text
                .parse::<f64>()
                .ok()
                .filter(|value| value.is_finite())
                .ok_or_else(|| CompileError::InvalidNumber(text.to_string()))?;

            tokens.push(Token::Number(if negate_next { -value } else { value }));
            negate_next = false;
            continue;
        }

        let Some(symbol) = captures.name("sym") else {
            continue;
        };
        let ch = symbol.as_str().chars().next().unwrap_or_default();

        let token = match ch {
            '(' => Token::LeftParen,
            ')' => Token::RightParen,
            _ => match Operation::from_symbol(ch) {
                Some(operation) => Token::Operator(operation),
                None => {
                    return Err(CompileError::InvalidCharacter {
                        ch,
                        position: symbol.start(),
                    });
                }
            },
        };

        let expects_operand = matches!(
            tokens.last(),
            None | Some(Token::Operator(_)) | Some(Token::LeftParen)
        );
        let followed_by_number = source[symbol.end()..]
            .chars()
            .next()
            .is_some_and(|next| next.is_ascii_digit() || next == '.');

        // A sign only binds to a number that follows it immediately.
        if token == Token::Operator(Operation::Subtraction) && expects_operand && followed_by_number {
            negate_next = true;
            continue;
        }

        tokens.push(token);
    }

    Ok(tokens)
}

/// Shunting-yard conversion. The output holds only numbers and operators.
pub(super) fn to_postfix(tokens: Vec<Token>) -> Result<Vec<Token>, CompileError> {
    let mut output = Vec::with_capacity(tokens.len());
    let mut pending: Vec<Token> = Vec::new();

    for token in tokens {
        match token {
            Token::Number(_) => output.push(token),
            Token::LeftParen => pending.push(token),
            Token::RightParen => loop {
                match pending.pop() {
                    Some(Token::LeftParen) => break,
                    Some(operator) => output.push(operator),
                    None => return Err(CompileError::MismatchedParentheses),
                }
            },
            Token::Operator(incoming) => {
                while let Some(&Token::Operator(top)) = pending.last() {
                    if top.precedence() < incoming.precedence() {
                        break;
                    }
                    pending.pop();
                    output.push(Token::Operator(top));
                }
                pending.push(token);
            }
        }
    }

    while let Some(token) = pending.pop() {
        match token {
            Token::LeftParen | Token::RightParen => return Err(CompileError::MismatchedParentheses),
            operator => output.push(operator),
        }
    }

    Ok(output)
}

fn build_chain(postfix: Vec<Token>, timings: &OperationTimings) -> Result<TaskChain, CompileError> {
    let mut tasks: Vec<Task> = Vec::new();
    let mut stack: Vec<Operand> = Vec::new();

    for token in postfix {
        match token {
            Token::Number(value) => stack.push(Operand::Literal(value)),
            Token::Operator(operation) => {
                // Right operand sits on top; left is the deeper entry.
                let (Some(arg2), Some(arg1)) = (stack.pop(), stack.pop()) else {
                    return Err(CompileError::MissingOperand(operation.symbol()));
                };

                tasks.push(Task {
                    id: TaskId::new(),
                    arg1,
                    arg2,
                    operation,
                    operation_time: timings.duration_of(operation),
                });
                stack.push(Operand::PendingOn(tasks.len() - 1));
            }
            Token::LeftParen | Token::RightParen => {
                return Err(CompileError::MismatchedParentheses);
            }
        }
    }

    match stack.as_slice() {
        [output] => Ok(TaskChain {
            tasks,
            output: *output,
        }),
        [] => Err(CompileError::EmptyExpression),
        rest => Err(CompileError::DanglingOperands(rest.len())),
    }
}
