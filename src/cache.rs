use std::collections::HashMap;
use std::time::{Duration, Instant};

use crate::backend::{Friend, Message, UserProfile};

pub const FRIENDS_REFRESH: Duration = Duration::from_secs(30);
pub const MESSAGES_REFRESH: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, PartialEq)]
pub enum QueryState<T> {
    /// Never fetched. Distinct from an empty result: a disabled or
    /// not-yet-issued query must not look like "no data on the backend".
    Idle,
    /// First fetch in progress, nothing to show yet.
    Loading,
    Ready(T),
    Failed(String),
}

/// One cached query slot. Background refreshes keep the previous `Ready`
/// data visible; `Loading` only ever covers the first fetch.
#[derive(Debug)]
pub struct Query<T> {
    state: QueryState<T>,
    fetched_at: Option<Instant>,
    in_flight: bool,
    stale: bool,
    refresh: Option<Duration>,
}

impl<T> Query<T> {
    pub fn new(refresh: Option<Duration>) -> Self {
        Self {
            state: QueryState::Idle,
            fetched_at: None,
            in_flight: false,
            stale: false,
            refresh,
        }
    }

    pub fn data(&self) -> Option<&T> {
        match &self.state {
            QueryState::Ready(data) => Some(data),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match &self.state {
            QueryState::Failed(msg) => Some(msg),
            _ => None,
        }
    }

    /// True only while the first fetch has not settled.
    pub fn is_loading(&self) -> bool {
        matches!(self.state, QueryState::Idle | QueryState::Loading)
    }

    /// The query has settled to a real value at least once.
    pub fn is_fetched(&self) -> bool {
        matches!(self.state, QueryState::Ready(_))
    }

    /// Whether a fetch should be issued now. Identical in-flight fetches are
    /// de-duplicated, failed reads are not auto-retried, and `Ready` data
    /// refetches only once its refresh interval elapses or it was
    /// invalidated.
    pub fn needs_fetch(&self, now: Instant) -> bool {
        if self.in_flight {
            return false;
        }
        if self.stale {
            return true;
        }
        match &self.state {
            QueryState::Idle | QueryState::Loading => true,
            QueryState::Failed(_) => false,
            QueryState::Ready(_) => match (self.refresh, self.fetched_at) {
                (Some(interval), Some(at)) => now.duration_since(at) >= interval,
                (Some(_), None) => true,
                (None, _) => false,
            },
        }
    }

    /// Mark a fetch as issued. Returns false when one is already in flight.
    pub fn begin_fetch(&mut self) -> bool {
        if self.in_flight {
            return false;
        }
        self.in_flight = true;
        if matches!(self.state, QueryState::Idle) {
            self.state = QueryState::Loading;
        }
        true
    }

    pub fn resolve(&mut self, now: Instant, result: Result<T, String>) {
        self.in_flight = false;
        self.stale = false;
        self.fetched_at = Some(now);
        self.state = match result {
            Ok(data) => QueryState::Ready(data),
            Err(msg) => QueryState::Failed(msg),
        };
    }

    /// Discard the cached result's freshness so the next poll refetches.
    /// Existing data stays visible until the refetch settles.
    pub fn invalidate(&mut self) {
        self.stale = true;
    }
}

/// In-process equivalent of the original client's query cache: one slot per
/// cache key, keyed conversations on the friend's username.
pub struct QueryCache {
    pub profile: Query<Option<UserProfile>>,
    pub friends: Query<Vec<Friend>>,
    messages: HashMap<String, Query<Vec<Message>>>,
}

impl QueryCache {
    pub fn new() -> Self {
        Self {
            // Profile is fetched on demand and never auto-refreshed.
            profile: Query::new(None),
            friends: Query::new(Some(FRIENDS_REFRESH)),
            messages: HashMap::new(),
        }
    }

    pub fn messages(&self, friend: &str) -> Option<&Query<Vec<Message>>> {
        self.messages.get(friend)
    }

    pub fn messages_mut(&mut self, friend: &str) -> &mut Query<Vec<Message>> {
        self.messages
            .entry(friend.to_string())
            .or_insert_with(|| Query::new(Some(MESSAGES_REFRESH)))
    }

    /// Logout teardown: every slot back to its disabled, empty state. Must
    /// run strictly before the session itself is dropped.
    pub fn clear(&mut self) {
        *self = Self::new();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn later(base: Instant, secs: u64) -> Instant {
        base + Duration::from_secs(secs)
    }

    #[test]
    fn idle_is_distinct_from_empty_result() {
        let now = Instant::now();
        let mut q: Query<Vec<Friend>> = Query::new(Some(FRIENDS_REFRESH));
        assert!(q.is_loading());
        assert!(q.data().is_none());

        q.begin_fetch();
        q.resolve(now, Ok(vec![]));
        assert!(!q.is_loading());
        assert_eq!(q.data().map(Vec::len), Some(0));
    }

    #[test]
    fn in_flight_fetches_are_deduplicated() {
        let now = Instant::now();
        let mut q: Query<Vec<Friend>> = Query::new(Some(FRIENDS_REFRESH));
        assert!(q.needs_fetch(now));
        assert!(q.begin_fetch());
        assert!(!q.begin_fetch());
        assert!(!q.needs_fetch(now));
    }

    #[test]
    fn ready_data_refetches_only_after_interval() {
        let now = Instant::now();
        let mut q: Query<Vec<Friend>> = Query::new(Some(FRIENDS_REFRESH));
        q.begin_fetch();
        q.resolve(now, Ok(vec![]));

        assert!(!q.needs_fetch(later(now, 29)));
        assert!(q.needs_fetch(later(now, 30)));
    }

    #[test]
    fn failed_reads_are_not_retried() {
        let now = Instant::now();
        let mut q: Query<Option<UserProfile>> = Query::new(None);
        q.begin_fetch();
        q.resolve(now, Err("backend down".to_string()));

        assert_eq!(q.error(), Some("backend down"));
        assert!(!q.needs_fetch(later(now, 3600)));
    }

    #[test]
    fn invalidation_forces_a_refetch_and_keeps_data_visible() {
        let now = Instant::now();
        let mut q: Query<Vec<Friend>> = Query::new(Some(FRIENDS_REFRESH));
        q.begin_fetch();
        q.resolve(
            now,
            Ok(vec![Friend {
                username: "alice".to_string(),
                online: true,
            }]),
        );

        q.invalidate();
        assert!(q.needs_fetch(later(now, 1)));
        assert_eq!(q.data().map(Vec::len), Some(1));

        q.begin_fetch();
        q.resolve(later(now, 1), Ok(vec![]));
        assert!(!q.needs_fetch(later(now, 2)));
    }

    #[test]
    fn invalidation_even_revives_an_on_demand_query() {
        let now = Instant::now();
        let mut q: Query<Option<UserProfile>> = Query::new(None);
        q.begin_fetch();
        q.resolve(now, Ok(None));
        assert!(!q.needs_fetch(later(now, 3600)));

        q.invalidate();
        assert!(q.needs_fetch(later(now, 3600)));
    }

    #[test]
    fn add_then_remove_round_trip_through_invalidation() {
        // Mirrors the friends-list contract: each mutation invalidates the
        // list, and the following refetch is the state of record.
        let now = Instant::now();
        let mut cache = QueryCache::new();
        cache.friends.begin_fetch();
        cache.friends.resolve(now, Ok(vec![]));

        cache.friends.invalidate();
        cache.friends.begin_fetch();
        cache.friends.resolve(
            later(now, 1),
            Ok(vec![Friend {
                username: "alice".to_string(),
                online: false,
            }]),
        );
        let listed = cache.friends.data().unwrap();
        assert_eq!(
            listed.iter().filter(|f| f.username == "alice").count(),
            1
        );

        cache.friends.invalidate();
        cache.friends.begin_fetch();
        cache.friends.resolve(later(now, 2), Ok(vec![]));
        assert!(cache.friends.data().unwrap().is_empty());
    }

    #[test]
    fn conversations_are_cached_per_friend() {
        let now = Instant::now();
        let mut cache = QueryCache::new();
        cache.messages_mut("alice").begin_fetch();
        cache.messages_mut("alice").resolve(now, Ok(vec![]));

        assert!(cache.messages("alice").is_some());
        assert!(cache.messages("bob").is_none());
    }

    #[test]
    fn clear_resets_every_slot() {
        let now = Instant::now();
        let mut cache = QueryCache::new();
        cache.profile.begin_fetch();
        cache.profile.resolve(
            now,
            Ok(Some(UserProfile {
                name: "Alex".to_string(),
            })),
        );
        cache.messages_mut("alice").begin_fetch();

        cache.clear();
        assert!(cache.profile.is_loading());
        assert!(cache.profile.data().is_none());
        assert!(cache.messages("alice").is_none());
    }
}
