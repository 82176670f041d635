//! Tutoring pipeline
//!
//! Components, leaf-first:
//! - Expression Extractor: free text to a formal expression
//! - Question Classifier: free text to a problem category
//! - Solver: category-specific computation
//! - Session Store: bounded per-user turn logs
//! - Explainer: natural-language explanation of a computed answer
//! - Conversation Orchestrator: sequences all of the above per turn

mod classifier;
mod explainer;
mod extractor;
mod orchestrator;
mod session;
mod solver;

pub use classifier::{classify, ProblemCategory};
pub use explainer::{create_explainer, ExplanationRequest, Explainer, LlmExplainer, MockExplainer};
pub use extractor::{longest_math_run, normalize, ExpressionExtractor, ExpressionKind, FormalExpression};
pub use orchestrator::{format_bot_turn, Analysis, ConversationOrchestrator};
pub use session::{Role, Session, SessionStore, SessionTurn};
pub use solver::{diagnostic, solve, ComputedResult};
