//! Shared server state.

use std::sync::Arc;

use crate::loader::LoadedSpec;

/// Application state shared across request handlers.
///
/// Specs are normalized once at startup and never mutated afterwards, so
/// they are shared without locking.
pub(crate) struct AppState {
    pub(crate) specs: Vec<Arc<LoadedSpec>>,
}
