//! Session table: user identifier -> conversation context.
//!
//! [`SessionStore`] is the seam the router depends on; it exposes only
//! lookup and get-or-create. [`InMemorySessionStore`] is the process-local
//! implementation, with per-key single-flight creation and an idle/capacity
//! eviction policy.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use tokio::sync::OnceCell;
use tokio_util::sync::CancellationToken;

use jarvis_types::config::SessionPolicy;
use jarvis_types::llm::LlmError;

use super::context::ConversationContext;

/// Result of a get-or-create lookup.
#[derive(Debug, Clone)]
pub struct SessionHandle {
    pub context: Arc<ConversationContext>,
    /// True if this call created the context.
    pub created: bool,
}

/// Storage for conversation contexts keyed by user identifier.
///
/// Implementations must guarantee at most one live context per key, even
/// when several first messages for the same key arrive concurrently.
pub trait SessionStore: Send + Sync {
    /// Look up an existing context.
    fn get(&self, user_id: &str) -> Option<Arc<ConversationContext>>;

    /// Return the context for `user_id`, running `create` if there is none.
    ///
    /// If `create` fails, no entry is left behind for `user_id`.
    fn get_or_create<F, Fut>(
        &self,
        user_id: &str,
        create: F,
    ) -> impl Future<Output = Result<SessionHandle, LlmError>> + Send
    where
        F: FnOnce() -> Fut + Send,
        Fut: Future<Output = Result<ConversationContext, LlmError>> + Send;
}

type Slot = Arc<OnceCell<Arc<ConversationContext>>>;

/// A context is in use while any caller holds a handle to it (the table
/// owns one reference) or a message is being forwarded through it.
fn in_use(ctx: &Arc<ConversationContext>) -> bool {
    Arc::strong_count(ctx) > 1 || ctx.is_busy()
}

/// Process-local session table backed by a sharded concurrent map.
///
/// Each key maps to a once-cell slot. Concurrent first contacts for the same
/// key share one slot, so only one of them runs its creation closure while
/// the others wait for its result.
pub struct InMemorySessionStore {
    slots: DashMap<String, Slot>,
    policy: SessionPolicy,
}

impl InMemorySessionStore {
    pub fn new(policy: SessionPolicy) -> Self {
        Self {
            slots: DashMap::new(),
            policy,
        }
    }

    /// Store with no idle expiry and no capacity bound.
    pub fn unbounded() -> Self {
        Self::new(SessionPolicy {
            idle_ttl_secs: 0,
            max_sessions: 0,
            sweep_interval_secs: 0,
        })
    }

    pub fn policy(&self) -> &SessionPolicy {
        &self.policy
    }

    /// Number of live (fully created) contexts.
    pub fn len(&self) -> usize {
        self.slots
            .iter()
            .filter(|entry| entry.value().initialized())
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn contains(&self, user_id: &str) -> bool {
        self.get(user_id).is_some()
    }

    /// Remove the context for `user_id`, returning it if it existed.
    pub fn remove(&self, user_id: &str) -> Option<Arc<ConversationContext>> {
        self.slots
            .remove(user_id)
            .and_then(|(_, slot)| slot.get().cloned())
    }

    /// Drop contexts idle for longer than the policy's TTL.
    ///
    /// Contexts still referenced by a caller are kept. Abandoned slots
    /// whose creation failed are cleaned up as well. Returns the number of
    /// contexts evicted.
    pub fn evict_idle(&self, now: DateTime<Utc>) -> usize {
        if self.policy.idle_ttl_secs == 0 {
            return 0;
        }
        let ttl = chrono::Duration::seconds(self.policy.idle_ttl_secs as i64);
        let mut evicted = 0;

        self.slots.retain(|user_id, slot| match slot.get() {
            Some(ctx) => {
                let expired = now - ctx.last_active() > ttl && !in_use(ctx);
                if expired {
                    tracing::debug!(%user_id, context_id = %ctx.id(), "evicting idle context");
                    evicted += 1;
                }
                !expired
            }
            // Uninitialized and nobody waiting on it.
            None => Arc::strong_count(slot) > 1,
        });

        evicted
    }

    /// Evict least-recently-active contexts until the table is within
    /// `max_sessions`, never touching `keep`.
    fn enforce_capacity(&self, keep: &str) -> usize {
        let max = self.policy.max_sessions;
        if max == 0 {
            return 0;
        }

        let mut live: Vec<(String, DateTime<Utc>)> = self
            .slots
            .iter()
            .filter_map(|entry| {
                let ctx = entry.value().get()?;
                if entry.key() == keep || in_use(ctx) {
                    return None;
                }
                Some((entry.key().clone(), ctx.last_active()))
            })
            .collect();

        let total = self.len();
        if total <= max {
            return 0;
        }

        live.sort_by_key(|(_, last_active)| *last_active);
        let mut evicted = 0;
        for (user_id, _) in live.into_iter().take(total - max) {
            let removed = self.slots.remove_if(&user_id, |_, slot| {
                slot.get().is_some_and(|ctx| !in_use(ctx))
            });
            if removed.is_some() {
                tracing::debug!(%user_id, "evicting least recently active context");
                evicted += 1;
            }
        }
        evicted
    }
}

impl Default for InMemorySessionStore {
    fn default() -> Self {
        Self::new(SessionPolicy::default())
    }
}

impl SessionStore for InMemorySessionStore {
    fn get(&self, user_id: &str) -> Option<Arc<ConversationContext>> {
        self.slots
            .get(user_id)
            .and_then(|slot| slot.value().get().cloned())
    }

    async fn get_or_create<F, Fut>(
        &self,
        user_id: &str,
        create: F,
    ) -> Result<SessionHandle, LlmError>
    where
        F: FnOnce() -> Fut + Send,
        Fut: Future<Output = Result<ConversationContext, LlmError>> + Send,
    {
        // Clone the slot out so no map guard is held across an await.
        let slot: Slot = Arc::clone(
            self.slots
                .entry(user_id.to_string())
                .or_insert_with(|| Arc::new(OnceCell::new()))
                .value(),
        );

        let mut created = false;
        let result = slot
            .get_or_try_init(|| {
                created = true;
                let fut = create();
                async move { fut.await.map(Arc::new) }
            })
            .await
            .cloned();

        match result {
            Ok(context) => {
                if created {
                    self.enforce_capacity(user_id);
                } else {
                    context.touch();
                }
                Ok(SessionHandle { context, created })
            }
            Err(err) => {
                // Release our reference first: the slot is abandoned once the
                // map holds the only one. A caller still waiting on it keeps
                // it alive and cleans up after its own attempt.
                drop(slot);
                self.slots.remove_if(user_id, |_, existing| {
                    !existing.initialized() && Arc::strong_count(existing) == 1
                });
                Err(err)
            }
        }
    }
}

/// Spawn a background task that periodically evicts idle contexts.
///
/// Returns `None` when the policy disables expiry. The task stops when
/// `shutdown` is cancelled.
pub fn spawn_idle_sweeper(
    store: Arc<InMemorySessionStore>,
    shutdown: CancellationToken,
) -> Option<tokio::task::JoinHandle<()>> {
    let policy = store.policy().clone();
    if policy.idle_ttl_secs == 0 || policy.sweep_interval_secs == 0 {
        return None;
    }

    let period = Duration::from_secs(policy.sweep_interval_secs);
    Some(tokio::spawn(async move {
        let mut interval = tokio::time::interval(period);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        loop {
            tokio::select! {
                _ = shutdown.cancelled() => break,
                _ = interval.tick() => {
                    let evicted = store.evict_idle(Utc::now());
                    if evicted > 0 {
                        tracing::info!(evicted, remaining = store.len(), "idle sessions evicted");
                    }
                }
            }
        }
        tracing::debug!("idle session sweeper stopped");
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::box_provider::BoxLlmProvider;
    use crate::llm::scripted::ScriptedProvider;

    fn provider(script: &ScriptedProvider) -> Arc<BoxLlmProvider> {
        Arc::new(BoxLlmProvider::new(script.clone()))
    }

    async fn create(
        store: &InMemorySessionStore,
        user_id: &str,
        provider: &Arc<BoxLlmProvider>,
    ) -> Result<SessionHandle, LlmError> {
        let provider = Arc::clone(provider);
        let owner = user_id.to_string();
        store
            .get_or_create(user_id, move || {
                ConversationContext::open(owner, provider, "instr")
            })
            .await
    }

    #[tokio::test]
    async fn test_first_lookup_creates_then_reuses() {
        let script = ScriptedProvider::new("m");
        let provider = provider(&script);
        let store = InMemorySessionStore::unbounded();

        let first = create(&store, "u1", &provider).await.unwrap();
        let second = create(&store, "u1", &provider).await.unwrap();

        assert!(first.created);
        assert!(!second.created);
        assert_eq!(first.context.id(), second.context.id());
        assert_eq!(script.open_calls(), 1);
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn test_distinct_users_get_distinct_contexts() {
        let script = ScriptedProvider::new("m");
        let provider = provider(&script);
        let store = InMemorySessionStore::unbounded();

        let a = create(&store, "a", &provider).await.unwrap();
        let b = create(&store, "b", &provider).await.unwrap();

        assert_ne!(a.context.id(), b.context.id());
        assert_eq!(store.len(), 2);
    }

    #[tokio::test]
    async fn test_failed_creation_leaves_no_entry() {
        let script = ScriptedProvider::new("m");
        script.set_fail_open(true);
        let provider = provider(&script);
        let store = InMemorySessionStore::unbounded();

        assert!(create(&store, "u1", &provider).await.is_err());
        assert!(!store.contains("u1"));
        assert!(store.slots.get("u1").is_none());
        assert!(store.is_empty());

        script.set_fail_open(false);
        let handle = create(&store, "u1", &provider).await.unwrap();
        assert!(handle.created);
        assert_eq!(script.open_calls(), 2);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_first_contact_creates_once() {
        let script = ScriptedProvider::new("m");
        script.set_open_delay(Duration::from_millis(50));
        let provider = provider(&script);
        let store = Arc::new(InMemorySessionStore::unbounded());

        let mut tasks = Vec::new();
        for _ in 0..8 {
            let store = Arc::clone(&store);
            let provider = Arc::clone(&provider);
            tasks.push(tokio::spawn(async move {
                create(&store, "same-user", &provider).await.unwrap()
            }));
        }

        let mut ids = Vec::new();
        let mut creators = 0;
        for task in tasks {
            let handle = task.await.unwrap();
            if handle.created {
                creators += 1;
            }
            ids.push(handle.context.id());
        }

        assert_eq!(script.open_calls(), 1);
        assert_eq!(creators, 1);
        assert!(ids.iter().all(|id| *id == ids[0]));
        assert_eq!(store.len(), 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_failed_creation_leaves_no_slot() {
        let script = ScriptedProvider::new("m");
        script.set_fail_open(true);
        script.set_open_delay(Duration::from_millis(50));
        let provider = provider(&script);
        let store = Arc::new(InMemorySessionStore::unbounded());

        let mut tasks = Vec::new();
        for _ in 0..2 {
            let store = Arc::clone(&store);
            let provider = Arc::clone(&provider);
            tasks.push(tokio::spawn(async move {
                create(&store, "u", &provider).await.is_err()
            }));
        }
        for task in tasks {
            assert!(task.await.unwrap());
        }

        assert_eq!(script.open_calls(), 2);
        assert!(store.slots.get("u").is_none());
        assert!(store.slots.is_empty());
    }

    #[tokio::test]
    async fn test_evict_idle_removes_only_expired() {
        let script = ScriptedProvider::new("m");
        let provider = provider(&script);
        let store = InMemorySessionStore::new(SessionPolicy {
            idle_ttl_secs: 60,
            max_sessions: 0,
            sweep_interval_secs: 1,
        });

        let old = create(&store, "old", &provider).await.unwrap();
        create(&store, "fresh", &provider).await.unwrap();
        old.context.backdate(chrono::Duration::minutes(2));
        drop(old);

        assert_eq!(store.evict_idle(Utc::now()), 1);
        assert!(!store.contains("old"));
        assert!(store.contains("fresh"));
    }

    #[tokio::test]
    async fn test_evict_idle_disabled_with_zero_ttl() {
        let script = ScriptedProvider::new("m");
        let provider = provider(&script);
        let store = InMemorySessionStore::unbounded();

        let handle = create(&store, "u1", &provider).await.unwrap();
        handle.context.backdate(chrono::Duration::days(30));

        assert_eq!(store.evict_idle(Utc::now()), 0);
        assert!(store.contains("u1"));
    }

    #[tokio::test]
    async fn test_capacity_evicts_least_recently_active() {
        let script = ScriptedProvider::new("m");
        let provider = provider(&script);
        let store = InMemorySessionStore::new(SessionPolicy {
            idle_ttl_secs: 0,
            max_sessions: 2,
            sweep_interval_secs: 0,
        });

        let a = create(&store, "a", &provider).await.unwrap();
        let b = create(&store, "b", &provider).await.unwrap();
        a.context.backdate(chrono::Duration::minutes(10));
        b.context.backdate(chrono::Duration::minutes(5));
        drop((a, b));

        create(&store, "c", &provider).await.unwrap();

        assert_eq!(store.len(), 2);
        assert!(!store.contains("a"));
        assert!(store.contains("b"));
        assert!(store.contains("c"));
    }

    #[tokio::test]
    async fn test_held_context_survives_idle_eviction() {
        let script = ScriptedProvider::new("m");
        let provider = provider(&script);
        let store = InMemorySessionStore::new(SessionPolicy {
            idle_ttl_secs: 60,
            max_sessions: 0,
            sweep_interval_secs: 1,
        });

        let handle = create(&store, "u1", &provider).await.unwrap();
        handle.context.backdate(chrono::Duration::minutes(2));

        assert_eq!(store.evict_idle(Utc::now()), 0);
        assert_eq!(store.get("u1").unwrap().id(), handle.context.id());
    }

    #[tokio::test]
    async fn test_held_context_survives_capacity_eviction() {
        let script = ScriptedProvider::new("m");
        let provider = provider(&script);
        let store = InMemorySessionStore::new(SessionPolicy {
            idle_ttl_secs: 0,
            max_sessions: 1,
            sweep_interval_secs: 0,
        });

        let a = create(&store, "a", &provider).await.unwrap();
        a.context.backdate(chrono::Duration::minutes(10));
        create(&store, "b", &provider).await.unwrap();

        assert_eq!(store.get("a").unwrap().id(), a.context.id());
        assert!(store.contains("b"));
    }

    #[tokio::test]
    async fn test_message_in_flight_keeps_context_and_history() {
        let script = ScriptedProvider::new("m");
        script.set_complete_delay(Duration::from_millis(200));
        let provider = provider(&script);
        let store = InMemorySessionStore::new(SessionPolicy {
            idle_ttl_secs: 60,
            max_sessions: 1,
            sweep_interval_secs: 1,
        });

        let handle = create(&store, "u1", &provider).await.unwrap();
        let id = handle.context.id();
        let context = Arc::clone(&handle.context);
        drop(handle);

        let send = tokio::spawn(async move { context.send_message("hello").await });
        tokio::time::sleep(Duration::from_millis(20)).await;
        store
            .get("u1")
            .unwrap()
            .backdate(chrono::Duration::minutes(2));

        assert_eq!(store.evict_idle(Utc::now()), 0);
        create(&store, "u2", &provider).await.unwrap();
        assert_eq!(store.get("u1").unwrap().id(), id);
        assert_eq!(send.await.unwrap().unwrap(), "reply 1");

        let context = store.get("u1").unwrap();
        assert_eq!(context.id(), id);
        assert_eq!(context.history().await.len(), 2);
    }

    #[tokio::test]
    async fn test_lookup_refreshes_activity() {
        let script = ScriptedProvider::new("m");
        let provider = provider(&script);
        let store = InMemorySessionStore::new(SessionPolicy {
            idle_ttl_secs: 60,
            max_sessions: 0,
            sweep_interval_secs: 1,
        });

        let first = create(&store, "u1", &provider).await.unwrap();
        first.context.backdate(chrono::Duration::minutes(2));
        drop(first);

        let again = create(&store, "u1", &provider).await.unwrap();
        assert!(!again.created);
        drop(again);

        assert_eq!(store.evict_idle(Utc::now()), 0);
        assert!(store.contains("u1"));
    }

    #[tokio::test]
    async fn test_remove_returns_context() {
        let script = ScriptedProvider::new("m");
        let provider = provider(&script);
        let store = InMemorySessionStore::unbounded();

        let handle = create(&store, "u1", &provider).await.unwrap();
        let removed = store.remove("u1").unwrap();
        assert_eq!(removed.id(), handle.context.id());
        assert!(store.get("u1").is_none());
    }

    #[tokio::test]
    async fn test_sweeper_disabled_without_ttl() {
        let store = Arc::new(InMemorySessionStore::unbounded());
        assert!(spawn_idle_sweeper(store, CancellationToken::new()).is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_sweeper_evicts_and_stops_on_cancel() {
        let script = ScriptedProvider::new("m");
        let provider = provider(&script);
        let store = Arc::new(InMemorySessionStore::new(SessionPolicy {
            idle_ttl_secs: 60,
            max_sessions: 0,
            sweep_interval_secs: 1,
        }));
        let handle = create(&store, "u1", &provider).await.unwrap();
        handle.context.backdate(chrono::Duration::minutes(5));
        drop(handle);

        let token = CancellationToken::new();
        let task = spawn_idle_sweeper(Arc::clone(&store), token.clone()).unwrap();

        tokio::time::sleep(Duration::from_secs(2)).await;
        assert!(store.is_empty());

        token.cancel();
        task.await.unwrap();
    }
}
