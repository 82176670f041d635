//! Conversation Orchestrator - runs one tutoring turn end to end
//!
//! extract -> classify -> solve -> explain -> append. Every stage has a
//! fallback value, so `handle` always returns a complete log.

use super::classifier::{classify, ProblemCategory};
use super::explainer::{create_explainer, ExplanationRequest, Explainer};
use super::extractor::{ExpressionExtractor, FormalExpression};
use super::session::{SessionStore, SessionTurn};
use super::solver::{diagnostic, solve, ComputedResult};
use crate::config::AppConfig;
use crate::errors::{AppError, Result};
use crate::metrics;
use chrono::Utc;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, instrument, warn, Span};

/// Deterministic part of a turn: everything before the explanation
#[derive(Debug, Clone, PartialEq)]
pub struct Analysis {
    pub expression: Option<FormalExpression>,
    pub category: ProblemCategory,
    pub result: ComputedResult,
}

/// Bot turn text: explanation, blank line, computed solution
pub fn format_bot_turn(explanation: &str, result: &ComputedResult) -> String {
    format!("{}\n\n**Computed Solution:** {}", explanation, result)
}

/// Owns the session store and sequences the pipeline
pub struct ConversationOrchestrator {
    extractor: ExpressionExtractor,
    explainer: Arc<dyn Explainer>,
    sessions: SessionStore,
    explanation_timeout: Duration,
    context_turns: usize,
}

impl ConversationOrchestrator {
    pub fn new(
        extractor: ExpressionExtractor,
        explainer: Arc<dyn Explainer>,
        sessions: SessionStore,
        explanation_timeout: Duration,
        context_turns: usize,
    ) -> Self {
        Self {
            extractor,
            explainer,
            sessions,
            explanation_timeout,
            context_turns,
        }
    }

    /// Build the full pipeline from configuration
    pub fn from_config(config: &AppConfig) -> Result<Self> {
        let explainer = create_explainer(&config.explainer)?;
        Ok(Self::new(
            ExpressionExtractor::new(config.extractor.clone()),
            explainer,
            SessionStore::new(config.session.max_turns),
            config.explainer.timeout(),
            config.explainer.context_turns,
        ))
    }

    /// Extract, classify and solve; no side effects
    pub fn analyze(&self, question: &str) -> Analysis {
        analyze_with(&self.extractor, question)
    }

    /// `analyze` on the blocking pool; root searches must not stall the runtime
    async fn analyze_blocking(&self, question: &str) -> Analysis {
        let extractor = self.extractor.clone();
        let owned = question.to_string();

        match tokio::task::spawn_blocking(move || analyze_with(&extractor, &owned)).await {
            Ok(analysis) => analysis,
            Err(e) => {
                warn!(error = %e, "Analysis task failed");
                let category = classify(question);
                Analysis {
                    expression: None,
                    category,
                    result: ComputedResult::Diagnostic(diagnostic(category).to_string()),
                }
            }
        }
    }

    /// Handle one question and return the user's updated log
    #[instrument(skip(self, question), fields(category = tracing::field::Empty))]
    pub async fn handle(&self, user_id: &str, question: &str) -> Vec<SessionTurn> {
        let analysis = self.analyze_blocking(question).await;
        Span::current().record("category", analysis.category.as_str());
        debug!(
            kind = analysis.expression.as_ref().map(|e| e.kind().as_str()),
            expression = analysis.expression.as_ref().map(ToString::to_string),
            result = %analysis.result,
            "Question analyzed"
        );
        metrics::record_question(analysis.category.as_str(), analysis.result.is_diagnostic());

        // Held until the exchange is appended, so one user's turns never interleave
        let session = self.sessions.session(user_id).await;
        let mut session = session.lock().await;
        let now = Utc::now();
        let idle_secs = session.idle_secs(now);
        let session_age_secs = session.age_secs(now);

        let request = ExplanationRequest {
            question: question.to_string(),
            category: analysis.category,
            computed_result: analysis.result.text().to_string(),
            context: session.context(self.context_turns),
        };
        let explanation = self.explain(&request).await;

        session.record_exchange(question, &format_bot_turn(&explanation, &analysis.result));
        info!(turns = session.len(), idle_secs, session_age_secs, "Turn recorded");
        session.turns()
    }

    /// Explanation text, or a diagnostic when the explainer fails or times out
    async fn explain(&self, request: &ExplanationRequest) -> String {
        let start = Instant::now();
        let outcome = match tokio::time::timeout(self.explanation_timeout, self.explainer.explain(request)).await {
            Ok(outcome) => outcome,
            Err(_) => Err(AppError::ExplanationTimeout {
                timeout_ms: self.explanation_timeout.as_millis() as u64,
            }),
        };
        let elapsed = start.elapsed().as_secs_f64();

        match outcome {
            Ok(explanation) => {
                metrics::record_explanation(elapsed, self.explainer.provider(), None);
                explanation
            }
            Err(e) => {
                warn!(error = %e, provider = self.explainer.provider(), "Explanation failed");
                metrics::record_explanation(elapsed, self.explainer.provider(), Some(e.reason()));
                format!("Error generating explanation: {}", e)
            }
        }
    }

    pub fn sessions(&self) -> &SessionStore {
        &self.sessions
    }

    pub fn explainer_provider(&self) -> &str {
        self.explainer.provider()
    }
}

fn analyze_with(extractor: &ExpressionExtractor, question: &str) -> Analysis {
    let expression = extractor.extract(question);
    let category = classify(question);
    let result = solve(category, expression.as_ref(), question);

    Analysis {
        expression,
        category,
        result,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ExplainerConfig, ExtractorConfig};
    use crate::tutor::{MockExplainer, Role};
    use async_trait::async_trait;

    struct FailingExplainer;

    #[async_trait]
    impl Explainer for FailingExplainer {
        async fn explain(&self, _request: &ExplanationRequest) -> Result<String> {
            Err(AppError::ExplanationError {
                message: "model unavailable".to_string(),
            })
        }

        fn provider(&self) -> &str {
            "failing"
        }
    }

    struct SlowExplainer;

    #[async_trait]
    impl Explainer for SlowExplainer {
        async fn explain(&self, _request: &ExplanationRequest) -> Result<String> {
            tokio::time::sleep(Duration::from_secs(10)).await;
            Ok("too late".to_string())
        }

        fn provider(&self) -> &str {
            "slow"
        }
    }

    /// Echoes the context it was given, so tests can see it
    struct ContextEcho;

    #[async_trait]
    impl Explainer for ContextEcho {
        async fn explain(&self, request: &ExplanationRequest) -> Result<String> {
            Ok(format!("[{}]", request.context.replace('\n', " | ")))
        }

        fn provider(&self) -> &str {
            "echo"
        }
    }

    fn orchestrator(explainer: Arc<dyn Explainer>) -> ConversationOrchestrator {
        ConversationOrchestrator::new(
            ExpressionExtractor::new(ExtractorConfig::default()),
            explainer,
            SessionStore::new(5),
            Duration::from_millis(200),
            3,
        )
    }

    #[tokio::test]
    async fn test_handle_linear_equation() {
        let tutor = orchestrator(Arc::new(MockExplainer::new()));
        let turns = tutor.handle("alice", "Solve 2x + 3 = 13").await;

        assert_eq!(turns.len(), 2);
        assert_eq!(turns[0].to_string(), "User: Solve 2x + 3 = 13");
        assert_eq!(turns[1].role, Role::Bot);
        assert!(turns[1].text.ends_with("\n\n**Computed Solution:** x = [5]"));
    }

    #[tokio::test]
    async fn test_unknown_question_still_answers() {
        let tutor = orchestrator(Arc::new(MockExplainer::new()));
        let turns = tutor.handle("bob", "Tell me about the weather").await;

        assert_eq!(turns.len(), 2);
        assert!(turns[1]
            .text
            .ends_with("**Computed Solution:** I am not sure how to solve this."));
    }

    #[tokio::test]
    async fn test_explainer_failure_degrades() {
        let tutor = orchestrator(Arc::new(FailingExplainer));
        let turns = tutor.handle("carol", "Factorize x^2 + 5x + 6").await;

        assert_eq!(
            turns[1].text,
            "Error generating explanation: Explanation service error: model unavailable\n\n\
             **Computed Solution:** (x + 2)(x + 3)"
        );
    }

    #[tokio::test]
    async fn test_explainer_timeout_degrades() {
        let tutor = orchestrator(Arc::new(SlowExplainer));
        let turns = tutor.handle("dave", "Expand (x+3)(x-2)").await;

        assert!(turns[1]
            .text
            .starts_with("Error generating explanation: Explanation timed out after 200ms"));
        assert!(turns[1].text.ends_with("x^2 + x - 6"));
    }

    #[tokio::test]
    async fn test_context_is_last_turns() {
        let tutor = orchestrator(Arc::new(ContextEcho));
        tutor.handle("erin", "first").await;
        let turns = tutor.handle("erin", "second").await;

        assert_eq!(turns.len(), 4);
        assert!(turns[3].text.starts_with("[User: first | Bot: []"));

        let turns = tutor.handle("erin", "third").await;
        assert_eq!(turns.len(), 5);
        assert!(turns[4].text.starts_with("[Bot: [] |"));
        assert!(turns[4].text.contains("User: second | Bot: [User: first"));
    }

    #[tokio::test]
    async fn test_sessions_are_bounded() {
        let tutor = orchestrator(Arc::new(MockExplainer::new()));
        for i in 0..10 {
            tutor.handle("frank", &format!("solve x = {}", i)).await;
        }

        let history = tutor.sessions().history("frank").await;
        assert_eq!(history.len(), 5);
        assert_eq!(history[0].role, Role::Bot);
        assert_eq!(history[3].text, "solve x = 9");
    }

    #[tokio::test]
    async fn test_concurrent_turns_for_one_user() {
        let tutor = Arc::new(ConversationOrchestrator::new(
            ExpressionExtractor::default(),
            Arc::new(MockExplainer::new()),
            SessionStore::new(0),
            Duration::from_secs(1),
            3,
        ));

        let tasks = (0..10).map(|i| {
            let tutor = Arc::clone(&tutor);
            async move { tutor.handle("grace", &format!("solve x + {} = 0", i)).await }
        });
        futures::future::join_all(tasks).await;

        let history = tutor.sessions().history("grace").await;
        assert_eq!(history.len(), 20);
        for pair in history.chunks(2) {
            assert_eq!(pair[0].role, Role::User);
            assert_eq!(pair[1].role, Role::Bot);
            assert!(pair[1].text.contains(pair[0].text.trim_start_matches("solve ")));
        }
    }

    #[tokio::test]
    async fn test_large_coefficient_question_completes() {
        let tutor = orchestrator(Arc::new(MockExplainer::new()));
        let turns = tokio::time::timeout(
            Duration::from_secs(30),
            tutor.handle("heidi", "solve 735134400x^2 + x + 735134400 = 0"),
        )
        .await
        .unwrap();

        assert_eq!(turns.len(), 2);
        assert!(turns[1].text.contains("**Computed Solution:** x = [-1/1470268800 - "));
    }

    #[test]
    fn test_analyze_is_idempotent() {
        let tutor = orchestrator(Arc::new(MockExplainer::new()));
        let first = tutor.analyze("Factorize x^2 + 5x + 6");
        let second = tutor.analyze("Factorize x^2 + 5x + 6");

        assert_eq!(first, second);
        assert_eq!(first.category, ProblemCategory::Factorization);
        assert_eq!(first.result, ComputedResult::Answer("(x + 2)(x + 3)".to_string()));
    }

    #[test]
    fn test_from_config() {
        let mut config = AppConfig::default();
        config.explainer = ExplainerConfig::mock();
        let tutor = ConversationOrchestrator::from_config(&config).unwrap();
        assert_eq!(tutor.explainer_provider(), "mock");
        assert_eq!(tutor.sessions().capacity(), Some(5));
    }
}
