//! Per-chat exchange state
//!
//! Each chat owns one `ExchangeState` behind a lock, so a manual override in
//! one chat never leaks into another and readers never see a half-applied
//! rate pair. Market quotes are pushed into every live session.
//!
//! The store is bounded: sessions idle longer than `idle_ttl` are swept, and
//! when `max_sessions` is reached the least recently used one is dropped.

use crate::error::AssistantError;
use crate::exchange::source::fetch_with_timeout;
use crate::exchange::{ExchangeState, RateSource};
use crate::models::RateQuote;
use crate::Result;
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tracing::{debug, info};
use uuid::Uuid;

pub type SharedState = Arc<RwLock<ExchangeState>>;

pub const DEFAULT_MAX_SESSIONS: usize = 10_000;
pub const DEFAULT_IDLE_TTL: Duration = Duration::from_secs(24 * 60 * 60);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionLimits {
    pub max_sessions: usize,
    pub idle_ttl: Duration,
}

impl Default for SessionLimits {
    fn default() -> Self {
        Self {
            max_sessions: DEFAULT_MAX_SESSIONS,
            idle_ttl: DEFAULT_IDLE_TTL,
        }
    }
}

struct SessionEntry {
    state: SharedState,
    last_seen: Instant,
}

/// Live sessions plus the latest market quote
pub struct SessionStore {
    sessions: RwLock<HashMap<Uuid, SessionEntry>>,
    market: RwLock<Option<RateQuote>>,
    seed: ExchangeState,
    limits: SessionLimits,
}

impl SessionStore {
    /// `seed` is the state new sessions start from until a quote arrives.
    pub fn new(seed: ExchangeState) -> Self {
        Self::with_limits(seed, SessionLimits::default())
    }

    pub fn with_limits(seed: ExchangeState, limits: SessionLimits) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            market: RwLock::new(None),
            seed,
            limits,
        }
    }

    pub async fn get_or_create(&self, id: Uuid) -> SharedState {
        let initial = self.fresh_state().await;

        let mut sessions = self.sessions.write().await;
        if let Some(entry) = sessions.get_mut(&id) {
            entry.last_seen = Instant::now();
            return entry.state.clone();
        }

        let now = Instant::now();
        sessions.retain(|_, entry| now.duration_since(entry.last_seen) <= self.limits.idle_ttl);
        if sessions.len() >= self.limits.max_sessions.max(1) {
            let oldest = sessions
                .iter()
                .min_by_key(|(_, entry)| entry.last_seen)
                .map(|(id, _)| *id);
            if let Some(oldest) = oldest {
                sessions.remove(&oldest);
                debug!(session = %oldest, "least recently used session evicted");
            }
        }

        debug!(session = %id, "session created");
        let state = Arc::new(RwLock::new(initial));
        sessions.insert(
            id,
            SessionEntry {
                state: state.clone(),
                last_seen: now,
            },
        );
        state
    }

    pub async fn get(&self, id: Uuid) -> Result<SharedState> {
        let mut sessions = self.sessions.write().await;
        let entry = sessions
            .get_mut(&id)
            .ok_or_else(|| AssistantError::SessionNotFound(id.to_string()))?;
        entry.last_seen = Instant::now();
        Ok(entry.state.clone())
    }

    /// Rates for a chat without creating it: the session's own state when it
    /// exists, otherwise what a new session would start from.
    pub async fn rates_for(&self, id: Option<Uuid>) -> ExchangeState {
        if let Some(id) = id {
            if let Ok(state) = self.get(id).await {
                return *state.read().await;
            }
        }
        self.fresh_state().await
    }

    /// Drop sessions idle longer than the configured TTL.
    pub async fn evict_idle(&self) -> usize {
        let now = Instant::now();
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|_, entry| now.duration_since(entry.last_seen) <= self.limits.idle_ttl);
        let evicted = before - sessions.len();
        if evicted > 0 {
            info!(evicted, remaining = sessions.len(), "idle sessions evicted");
        }
        evicted
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    pub async fn market(&self) -> Option<RateQuote> {
        *self.market.read().await
    }

    /// Record `quote` and apply it to every session.
    pub async fn apply_market(&self, quote: RateQuote) {
        *self.market.write().await = Some(quote);

        let states: Vec<SharedState> = self
            .sessions
            .read()
            .await
            .values()
            .map(|entry| entry.state.clone())
            .collect();
        for state in &states {
            state.write().await.refresh_from_market(&quote);
        }

        info!(
            usd_to_cad = quote.usd_to_cad,
            sessions = states.len(),
            "market rate applied to sessions"
        );
    }

    /// Fetch once and apply. An unavailable source leaves every session as is.
    pub async fn refresh(&self, source: &dyn RateSource, timeout: Duration) -> bool {
        match fetch_with_timeout(source, timeout).await {
            Some(quote) => {
                self.apply_market(quote).await;
                true
            }
            None => false,
        }
    }

    async fn fresh_state(&self) -> ExchangeState {
        let mut initial = self.seed;
        if let Some(quote) = *self.market.read().await {
            initial.refresh_from_market(&quote);
        }
        initial
    }
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new(ExchangeState::new())
    }
}

/// Refresh now, then every `interval`, until the task is aborted.
pub fn spawn_refresher(
    store: Arc<SessionStore>,
    source: Arc<dyn RateSource>,
    interval: Duration,
    timeout: Duration,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        store.refresh(source.as_ref(), timeout).await;
        if interval.is_zero() {
            return;
        }

        let mut ticker = tokio::time::interval(interval);
        // first tick completes immediately
        ticker.tick().await;
        loop {
            ticker.tick().await;
            store.refresh(source.as_ref(), timeout).await;
            store.evict_idle().await;
        }
    })
}

fn stable_uuid_from_string(input: &str) -> Uuid {
    let hash = Sha256::digest(input.as_bytes());
    let mut bytes = [0u8; 16];
    bytes.copy_from_slice(&hash[..16]);

    // version 4, RFC 4122 variant
    bytes[6] = (bytes[6] & 0x0f) | 0x40;
    bytes[8] = (bytes[8] & 0x3f) | 0x80;

    Uuid::from_bytes(bytes)
}

/// Session id for a client-supplied chat id. Anything that is not a UUID
/// maps to a stable UUID derived from its text; a missing or blank id starts
/// a new chat.
pub fn session_id(chat_id: Option<&str>) -> Uuid {
    known_session_id(chat_id).unwrap_or_else(Uuid::new_v4)
}

/// Like `session_id`, but `None` when the client named no chat.
pub fn known_session_id(chat_id: Option<&str>) -> Option<Uuid> {
    chat_id
        .filter(|v| !v.trim().is_empty())
        .map(|v| Uuid::parse_str(v).unwrap_or_else(|_| stable_uuid_from_string(v)))
}
