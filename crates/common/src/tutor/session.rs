//! Session Store - bounded per-user conversation logs
//!
//! Sessions live for the lifetime of the process. The outer map lock is only
//! held long enough to find or create a session; each session has its own
//! mutex, which is the serialization point for one user's turns.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, VecDeque};
use std::fmt;
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};
use tracing::debug;

/// Who said a turn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Role {
    User,
    Bot,
}

/// One role-tagged line of a conversation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionTurn {
    pub role: Role,
    pub text: String,
}

impl SessionTurn {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            text: text.into(),
        }
    }

    pub fn bot(text: impl Into<String>) -> Self {
        Self {
            role: Role::Bot,
            text: text.into(),
        }
    }
}

impl fmt::Display for SessionTurn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.role {
            Role::User => write!(f, "User: {}", self.text),
            Role::Bot => write!(f, "Bot: {}", self.text),
        }
    }
}

/// Ordered, optionally bounded log of one user's turns
#[derive(Debug, Clone)]
pub struct Session {
    turns: VecDeque<SessionTurn>,
    capacity: Option<usize>,
    created_at: DateTime<Utc>,
    last_active_at: DateTime<Utc>,
}

impl Session {
    /// `capacity` of `None` keeps every turn
    pub fn new(capacity: Option<usize>) -> Self {
        let now = Utc::now();
        Self {
            turns: VecDeque::new(),
            capacity,
            created_at: now,
            last_active_at: now,
        }
    }

    /// Append one turn, evicting the oldest when full
    pub fn push(&mut self, turn: SessionTurn) {
        self.turns.push_back(turn);
        if let Some(capacity) = self.capacity {
            while self.turns.len() > capacity {
                self.turns.pop_front();
            }
        }
        self.last_active_at = Utc::now();
    }

    /// Append the user turn, then the bot turn
    pub fn record_exchange(&mut self, question: &str, bot_turn: &str) {
        self.push(SessionTurn::user(question));
        self.push(SessionTurn::bot(bot_turn));
    }

    pub fn turns(&self) -> Vec<SessionTurn> {
        self.turns.iter().cloned().collect()
    }

    /// The last `count` turns, rendered one per line
    pub fn context(&self, count: usize) -> String {
        let skip = self.turns.len().saturating_sub(count);
        self.turns
            .iter()
            .skip(skip)
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join("\n")
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn last_active_at(&self) -> DateTime<Utc> {
        self.last_active_at
    }

    /// Whole seconds since the session was created
    pub fn age_secs(&self, now: DateTime<Utc>) -> i64 {
        (now - self.created_at).num_seconds()
    }

    /// Whole seconds since the last turn was appended
    pub fn idle_secs(&self, now: DateTime<Utc>) -> i64 {
        (now - self.last_active_at).num_seconds()
    }
}

/// Process-wide map from user id to session
#[derive(Debug)]
pub struct SessionStore {
    sessions: RwLock<HashMap<String, Arc<Mutex<Session>>>>,
    capacity: Option<usize>,
}

impl SessionStore {
    /// `max_turns` of 0 means unbounded
    pub fn new(max_turns: usize) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            capacity: (max_turns > 0).then_some(max_turns),
        }
    }

    /// The session for `user_id`, created on first use
    pub async fn session(&self, user_id: &str) -> Arc<Mutex<Session>> {
        if let Some(session) = self.sessions.read().await.get(user_id) {
            return Arc::clone(session);
        }

        let mut sessions = self.sessions.write().await;
        Arc::clone(sessions.entry(user_id.to_string()).or_insert_with(|| {
            debug!(user_id, "Creating session");
            Arc::new(Mutex::new(Session::new(self.capacity)))
        }))
    }

    /// Record one exchange and return the resulting log
    pub async fn append(&self, user_id: &str, question: &str, bot_turn: &str) -> Vec<SessionTurn> {
        let session = self.session(user_id).await;
        let mut session = session.lock().await;
        session.record_exchange(question, bot_turn);
        session.turns()
    }

    /// Current log for `user_id`; empty for unseen users
    pub async fn history(&self, user_id: &str) -> Vec<SessionTurn> {
        let session = self.sessions.read().await.get(user_id).cloned();
        match session {
            Some(session) => session.lock().await.turns(),
            None => Vec::new(),
        }
    }

    /// Number of known users
    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }

    pub fn capacity(&self) -> Option<usize> {
        self.capacity
    }
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new(5)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_append_creates_session() {
        let store = SessionStore::default();
        assert!(store.is_empty().await);

        let turns = store.append("alice", "Solve 2x = 4", "x = [2]").await;
        assert_eq!(turns.len(), 2);
        assert_eq!(turns[0].to_string(), "User: Solve 2x = 4");
        assert_eq!(turns[1].to_string(), "Bot: x = [2]");
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn test_bounded_session_keeps_latest() {
        let store = SessionStore::new(5);
        for i in 0..10 {
            store.append("bob", &format!("q{}", i), &format!("a{}", i)).await;
        }

        let texts: Vec<String> = store.history("bob").await.into_iter().map(|t| t.text).collect();
        assert_eq!(texts, vec!["a7", "q8", "a8", "q9", "a9"]);
    }

    #[tokio::test]
    async fn test_unbounded_session() {
        let store = SessionStore::new(0);
        assert_eq!(store.capacity(), None);
        for i in 0..10 {
            store.append("carol", &format!("q{}", i), "a").await;
        }
        assert_eq!(store.history("carol").await.len(), 20);
    }

    #[tokio::test]
    async fn test_history_of_unknown_user() {
        let store = SessionStore::default();
        assert!(store.history("nobody").await.is_empty());
        assert_eq!(store.len().await, 0);
    }

    #[tokio::test]
    async fn test_users_are_isolated() {
        let store = SessionStore::default();
        store.append("a", "first", "one").await;
        store.append("b", "second", "two").await;

        assert_eq!(store.history("a").await[0].text, "first");
        assert_eq!(store.history("b").await[0].text, "second");
        assert_eq!(store.len().await, 2);
    }

    #[tokio::test]
    async fn test_concurrent_appends_keep_pairs_adjacent() {
        let store = Arc::new(SessionStore::new(0));
        let tasks = (0..20).map(|i| {
            let store = Arc::clone(&store);
            async move {
                store
                    .append("shared", &format!("q{}", i), &format!("a{}", i))
                    .await
            }
        });
        futures::future::join_all(tasks).await;

        let turns = store.history("shared").await;
        assert_eq!(turns.len(), 40);
        for pair in turns.chunks(2) {
            assert_eq!(pair[0].role, Role::User);
            assert_eq!(pair[1].role, Role::Bot);
            assert_eq!(pair[0].text[1..], pair[1].text[1..]);
        }
    }

    #[test]
    fn test_context_window() {
        let mut session = Session::new(Some(5));
        session.record_exchange("q1", "a1");
        session.record_exchange("q2", "a2");

        assert_eq!(session.context(3), "Bot: a1\nUser: q2\nBot: a2");
        assert_eq!(session.context(0), "");
        assert_eq!(session.context(10).lines().count(), 4);
        assert!(session.last_active_at() >= session.created_at());
    }

    #[test]
    fn test_age_and_idle_time() {
        let mut session = Session::new(None);
        let created = session.created_at();
        assert_eq!(session.age_secs(created + chrono::Duration::seconds(90)), 90);

        session.push(SessionTurn::user("hi"));
        let later = session.last_active_at() + chrono::Duration::seconds(15);
        assert_eq!(session.idle_secs(later), 15);
        assert!(session.age_secs(later) >= 15);
    }
}
