//! Override (except) case selection.
//!
//! Evaluates the compiled predicate ASTs against the request context and
//! picks the first case whose predicates fail. Evaluation is three-valued:
//! a predicate that cannot observe what it references is *undefined* and
//! abstains rather than failing.
//!
//! Per-predicate outcome classification:
//! - undefined            -> Abstain (skip, no effect on the case)
//! - strictly `true`      -> Pass (keep checking)
//! - anything else        -> Fail (the case fires, short-circuit)
//!
//! A predicate that errors mid-evaluation (e.g. an ordering comparison on
//! non-comparable operands) also fires the case; the caller gets the reason
//! for logging. Predicates observe `{route, query, headers, payload}` only.

use std::fmt;

use serde_json::Value;

use mimus_core::predicate::{CompareOp, Predicate};
use mimus_core::spec::ExceptCase;

use crate::context::RequestContext;

/// A predicate that could not be evaluated over the given operands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EvalError {
    TypeError { message: String },
}

impl fmt::Display for EvalError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EvalError::TypeError { message } => write!(f, "type error: {}", message),
        }
    }
}

/// Classification of a single predicate against a context.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Pass,
    Abstain,
    /// The reason, for operational logging. `None` for a plain non-true
    /// result, `Some` when evaluation errored.
    Fail(Option<String>),
}

/// Pick the first case, in declaration order, with a failing predicate.
///
/// Within a case, predicates run in declaration order and short-circuit on
/// the first failure. A case whose predicates all pass or abstain does not
/// fire. Cases after the first firing one are never evaluated.
///
/// The returned reason is `Some` when the firing predicate errored rather
/// than evaluating to a non-true value; it is surfaced so the host can log
/// why a broken assertion fired.
pub fn select<'a>(
    cases: &'a [ExceptCase],
    ctx: &RequestContext,
) -> Option<(&'a ExceptCase, Option<String>)> {
    for case in cases {
        for pred in &case.predicates {
            if let Outcome::Fail(reason) = outcome(pred, ctx) {
                return Some((case, reason));
            }
        }
    }
    None
}

/// Evaluate one predicate and classify the result.
pub fn outcome(pred: &Predicate, ctx: &RequestContext) -> Outcome {
    match eval(pred, ctx) {
        Ok(None) => Outcome::Abstain,
        Ok(Some(Value::Bool(true))) => Outcome::Pass,
        Ok(Some(_)) => Outcome::Fail(None),
        Err(e) => Outcome::Fail(Some(e.to_string())),
    }
}

/// Evaluate a predicate tree. `Ok(None)` is the undefined result.
fn eval(pred: &Predicate, ctx: &RequestContext) -> Result<Option<Value>, EvalError> {
    match pred {
        Predicate::Literal(v) => Ok(Some(v.clone())),

        Predicate::Field(path) => Ok(ctx.lookup_for_predicate(path)),

        Predicate::Exists(path) => Ok(Some(Value::Bool(
            ctx.lookup_for_predicate(path).is_some(),
        ))),

        Predicate::Size(operand) => {
            let Some(v) = eval(operand, ctx)? else {
                return Ok(None);
            };
            let n = match &v {
                Value::Array(items) => items.len(),
                Value::Object(map) => map.len(),
                Value::String(s) => s.chars().count(),
                other => {
                    return Err(EvalError::TypeError {
                        message: format!(
                            "size() requires a container or string, got {}",
                            mimus_core::value::type_name(other)
                        ),
                    })
                }
            };
            Ok(Some(Value::from(n as u64)))
        }

        Predicate::Compare { left, op, right } => {
            let (Some(l), Some(r)) = (eval(left, ctx)?, eval(right, ctx)?) else {
                return Ok(None);
            };
            Ok(Some(Value::Bool(compare(&l, *op, &r)?)))
        }

        Predicate::And { left, right } => {
            // Kleene logic: a defined false decides the result without
            // evaluating the other side; undefined otherwise propagates.
            let l = eval_bool(left, ctx)?;
            if l == Some(false) {
                return Ok(Some(Value::Bool(false)));
            }
            let r = eval_bool(right, ctx)?;
            Ok(match (l, r) {
                (_, Some(false)) => Some(Value::Bool(false)),
                (Some(true), Some(true)) => Some(Value::Bool(true)),
                _ => None,
            })
        }

        Predicate::Or { left, right } => {
            let l = eval_bool(left, ctx)?;
            if l == Some(true) {
                return Ok(Some(Value::Bool(true)));
            }
            let r = eval_bool(right, ctx)?;
            Ok(match (l, r) {
                (_, Some(true)) => Some(Value::Bool(true)),
                (Some(false), Some(false)) => Some(Value::Bool(false)),
                _ => None,
            })
        }

        Predicate::Not { operand } => Ok(eval_bool(operand, ctx)?.map(|b| Value::Bool(!b))),
    }
}

fn eval_bool(pred: &Predicate, ctx: &RequestContext) -> Result<Option<bool>, EvalError> {
    match eval(pred, ctx)? {
        None => Ok(None),
        Some(Value::Bool(b)) => Ok(Some(b)),
        Some(other) => Err(EvalError::TypeError {
            message: format!(
                "boolean connective requires bool operand, got {}",
                mimus_core::value::type_name(&other)
            ),
        }),
    }
}

fn compare(left: &Value, op: CompareOp, right: &Value) -> Result<bool, EvalError> {
    match op {
        CompareOp::Eq => Ok(loose_eq(left, right)),
        CompareOp::Ne => Ok(!loose_eq(left, right)),
        ordering => {
            let cmp = match (left, right) {
                (Value::Number(a), Value::Number(b)) => {
                    let (a, b) = (a.as_f64(), b.as_f64());
                    match (a, b) {
                        (Some(a), Some(b)) => a.partial_cmp(&b),
                        _ => None,
                    }
                }
                (Value::String(a), Value::String(b)) => Some(a.cmp(b)),
                _ => None,
            };
            let Some(cmp) = cmp else {
                return Err(EvalError::TypeError {
                    message: format!(
                        "'{}' requires two numbers or two strings, got {} and {}",
                        ordering,
                        mimus_core::value::type_name(left),
                        mimus_core::value::type_name(right)
                    ),
                });
            };
            Ok(match ordering {
                CompareOp::Lt => cmp == std::cmp::Ordering::Less,
                CompareOp::Le => cmp != std::cmp::Ordering::Greater,
                CompareOp::Gt => cmp == std::cmp::Ordering::Greater,
                CompareOp::Ge => cmp != std::cmp::Ordering::Less,
                CompareOp::Eq | CompareOp::Ne => unreachable!(),
            })
        }
    }
}

/// Equality that compares numbers numerically (so `3` equals `3.0`) and
/// everything else structurally.
fn loose_eq(left: &Value, right: &Value) -> bool {
    match (left, right) {
        (Value::Number(a), Value::Number(b)) => a.as_f64() == b.as_f64(),
        _ => left == right,
    }
}

// ──────────────────────────────────────────────
// Tests
// ──────────────────────────────────────────────
