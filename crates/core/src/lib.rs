//! mimus-core: the Mimus mock contract language.
//!
//! Everything needed to turn a JSON specification document into an immutable
//! [`MockSpec`]: dotted-path addressing over JSON values, the placeholder
//! lexer, the predicate expression grammar, and load-time normalization.
//! Runtime response generation lives in `mimus-eval`; this crate performs no
//! I/O and touches no request.
//!
//! # Public API
//!
//! - [`normalize::from_str`] / [`normalize::from_json`] -- document to
//!   [`MockSpec`]
//! - [`value::get`] / [`value::set`] / [`value::resolve`] -- path addressing
//! - [`capture::capture`] -- placeholder token scanning
//! - [`predicate::parse`] -- predicate compilation
//! - [`SpecError`] / [`PathError`] -- the two error taxonomies

pub mod capture;
pub mod error;
pub mod headers;
pub mod normalize;
pub mod predicate;
pub mod spec;
pub mod value;

pub use error::SpecError;
pub use headers::HeaderSet;
pub use predicate::{CompareOp, Predicate};
pub use spec::{
    CastKind, ExceptCase, Method, MockSpec, RepeatFormula, RequestSpec, ResponseSpec,
};
pub use value::PathError;
