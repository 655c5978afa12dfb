//! HTTP API for the debate page

mod assets;
mod handlers;
mod sse;
mod types;

pub use assets::{validate_page, PageError};
pub use handlers::create_router;
#[allow(unused_imports)] // Public API re-exports
pub use types::*;

use crate::config::DebateConfig;
use crate::runtime::DebateHandle;
use std::sync::Arc;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub debate: DebateHandle,
    pub config: Arc<DebateConfig>,
}

impl AppState {
    pub fn new(debate: DebateHandle, config: Arc<DebateConfig>) -> Self {
        Self { debate, config }
    }
}
