//! Load-time validation errors.
//!
//! Every variant is fatal to the one specification document that raised it;
//! the loader reports it and continues with other documents. Nothing here is
//! ever raised on the request path.

/// All ways a specification document can fail normalization.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SpecError {
    /// The document is not valid JSON or does not have the expected shape.
    #[error("malformed specification document: {message}")]
    Document { message: String },

    #[error("request route must be a non-empty string")]
    EmptyRoute,

    #[error("unsupported method '{method}'")]
    UnsupportedMethod { method: String },

    /// A request payload template must be addressable by key, so arrays are
    /// rejected up front.
    #[error("request payload must not be an array")]
    ArrayPayload,

    #[error("duplicate header (case-insensitive): '{name}'")]
    DuplicateHeader { name: String },

    #[error("response code {code} out of range 100-599")]
    CodeOutOfRange { code: i64 },

    /// `repeat` replicates a list; anything else has no cardinality.
    #[error("repeat requires response data to be an array")]
    RepeatOnNonArray,

    #[error("invalid repeat formula '{formula}': {message}")]
    BadRepeatFormula { formula: String, message: String },

    /// Cast targets are resolved against the data template at load time so
    /// a bad path never reaches the request path.
    #[error("cast path '{path}' does not resolve in response data")]
    CastTargetMissing { path: String },

    #[error("unsupported cast kind '{kind}' for path '{path}'")]
    UnsupportedCastKind { path: String, kind: String },

    #[error("invalid predicate in except case '{case}': {message}")]
    BadPredicate { case: String, message: String },

    #[error("malformed except case '{case}': {message}")]
    BadExceptCase { case: String, message: String },
}
