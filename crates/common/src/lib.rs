//! MathForge Common Library
//!
//! Shared code for the MathForge tutoring service including:
//! - Algebra core (parsing, polynomials, solving, factoring)
//! - The tutoring pipeline and session store
//! - Error types and handling
//! - Configuration management
//! - Metrics and observability

pub mod config;
pub mod errors;
pub mod math;
pub mod metrics;
pub mod tutor;

// Re-export commonly used types
pub use config::AppConfig;
pub use errors::{AppError, Result};
pub use tutor::{ConversationOrchestrator, Explainer, SessionTurn};

/// Application version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
