//! Membership cache with request coalescing
//!
//! ## Fetch lifecycle
//!
//! The first `ensure` for a commune inserts a `Loading` entry tagged with a
//! fresh generation and spawns the lookup as a detached task. Later callers
//! subscribe to the entry's completion channel instead of fetching again.
//! The task records its outcome only if the entry still carries its
//! generation; after an invalidation the response is dropped.
//!
//! Because the lookup runs detached, a consumer that stops awaiting `ensure`
//! (e.g. a view torn down mid-fetch) never leaves the entry stuck in
//! `Loading`, and nothing is delivered to it afterwards.

use chrono::Utc;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard};
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

use super::types::{CacheEntry, FetchStatus, Membership};
use crate::api::CommuneApi;
use crate::error::{AccessError, Result};
use crate::role::{resolve_role, satisfies, Role};
use crate::session::Session;

/// Cached state for one commune
struct Slot {
    entry: CacheEntry,
    /// Completion channel, present while a fetch is in flight
    done: Option<broadcast::Sender<()>>,
}

/// Session-scoped membership cache.
///
/// Shared behind an `Arc`; mutated only through `ensure`, `invalidate` and
/// the session lifecycle methods.
///
/// # Example
///
/// ```rust,ignore
/// let cache = Arc::new(MembershipCache::new(api));
/// cache.init_session(Session::new("42", token));
///
/// cache.ensure("7").await;
/// if satisfies(cache.get_role("7"), Role::Moderator) {
///     // show event editor
/// }
/// ```
pub struct MembershipCache {
    api: Arc<dyn CommuneApi>,
    session: RwLock<Option<Session>>,
    entries: DashMap<String, Slot>,
    generation: AtomicU64,
}

impl MembershipCache {
    pub fn new(api: Arc<dyn CommuneApi>) -> Self {
        Self {
            api,
            session: RwLock::new(None),
            entries: DashMap::new(),
            generation: AtomicU64::new(0),
        }
    }

    // =========================================================================
    // Session lifecycle
    // =========================================================================

    /// Start a session. Every cached entry belonged to the previous identity
    /// and is evicted.
    pub fn init_session(&self, session: Session) {
        let mut slot = self.session.write().unwrap_or_else(PoisonError::into_inner);
        info!(
            user_id = %session.user_id,
            started_at = %session.started_at,
            "Session started"
        );
        *slot = Some(session);
        self.invalidate_all();
    }

    /// End the session and evict every entry
    pub fn teardown_session(&self) {
        let mut slot = self.session.write().unwrap_or_else(PoisonError::into_inner);
        if let Some(old) = slot.take() {
            info!(user_id = %old.user_id, "Session ended");
        }
        self.invalidate_all();
    }

    pub fn session(&self) -> Option<Session> {
        self.read_session().clone()
    }

    pub fn has_session(&self) -> bool {
        self.read_session().is_some()
    }

    fn read_session(&self) -> RwLockReadGuard<'_, Option<Session>> {
        self.session.read().unwrap_or_else(PoisonError::into_inner)
    }

    // =========================================================================
    // Lookups
    // =========================================================================

    /// Make sure a lookup for `commune_id` has happened.
    ///
    /// Issues one fetch for an unfetched commune, attaches to a fetch already
    /// in flight, and returns immediately for settled entries. Without a
    /// session there is nothing to look up and no fetch is issued. If the
    /// entry is invalidated while waiting, the call attaches to (or starts)
    /// the lookup for the new generation.
    pub async fn ensure(self: &Arc<Self>, commune_id: &str) {
        loop {
            let mut done = {
                // Session read lock is held until the entry is in place so a
                // concurrent login/logout evicts it afterwards
                let session = self.read_session();
                let Some(session) = session.as_ref() else {
                    debug!(commune_id = commune_id, "No session, skipping membership lookup");
                    return;
                };

                match self.entries.entry(commune_id.to_string()) {
                    Entry::Occupied(occupied) => match &occupied.get().done {
                        Some(sender) => {
                            debug!(
                                commune_id = commune_id,
                                "Attaching to in-flight membership lookup"
                            );
                            sender.subscribe()
                        }
                        None => return,
                    },
                    Entry::Vacant(vacant) => {
                        let generation = self.next_generation();
                        let (sender, receiver) = broadcast::channel(1);
                        vacant.insert(Slot {
                            entry: CacheEntry::loading(generation),
                            done: Some(sender),
                        });
                        self.spawn_fetch(commune_id.to_string(), session.clone(), generation);
                        receiver
                    }
                }
            };

            match done.recv().await {
                Ok(()) => return,
                // Closed: the entry was evicted before the lookup settled
                Err(_) => {
                    debug!(commune_id = commune_id, "Membership invalidated while waiting");
                }
            }
        }
    }

    /// Current role for a commune; never suspends.
    ///
    /// `Guest` without a session or while the entry is not loaded.
    pub fn get_role(&self, commune_id: &str) -> Role {
        let session = self.read_session();
        let slot = self.entries.get(commune_id);
        resolve_role(session.as_ref(), slot.as_deref().map(|s| &s.entry))
    }

    pub fn status(&self, commune_id: &str) -> FetchStatus {
        self.entries
            .get(commune_id)
            .map_or(FetchStatus::Unfetched, |slot| slot.entry.status)
    }

    pub fn entry(&self, commune_id: &str) -> Option<CacheEntry> {
        self.entries.get(commune_id).map(|slot| slot.entry.clone())
    }

    /// Failure reason if the last lookup failed
    pub fn failure(&self, commune_id: &str) -> Option<String> {
        self.entries
            .get(commune_id)
            .filter(|slot| slot.entry.status == FetchStatus::Failed)
            .and_then(|slot| slot.entry.error.clone())
    }

    /// Number of lookups currently in flight
    pub fn in_flight_count(&self) -> usize {
        self.entries.iter().filter(|slot| slot.done.is_some()).count()
    }

    // =========================================================================
    // Invalidation
    // =========================================================================

    /// Forget the cached membership for a commune; the next `ensure` fetches again.
    pub fn invalidate(&self, commune_id: &str) {
        self.generation.fetch_add(1, Ordering::SeqCst);
        if let Some((_, slot)) = self.entries.remove(commune_id) {
            debug!(
                commune_id = commune_id,
                generation = slot.entry.generation,
                status = %slot.entry.status,
                "Membership invalidated"
            );
        }
    }

    pub fn invalidate_all(&self) {
        self.generation.fetch_add(1, Ordering::SeqCst);
        let evicted = self.entries.len();
        self.entries.clear();
        if evicted > 0 {
            debug!(evicted = evicted, "All memberships invalidated");
        }
    }

    // =========================================================================
    // Actions
    // =========================================================================

    /// Hard precondition for mutating actions.
    ///
    /// Resolves the membership and returns the role if it meets `minimum`.
    pub async fn require(self: &Arc<Self>, commune_id: &str, minimum: Role) -> Result<Role> {
        if !self.has_session() {
            return Err(AccessError::NotAuthenticated);
        }

        self.ensure(commune_id).await;

        if !self.has_session() {
            return Err(AccessError::NotAuthenticated);
        }
        if let Some(reason) = self.failure(commune_id) {
            return Err(AccessError::MembershipFetchFailed(reason));
        }

        let actual = self.get_role(commune_id);
        if satisfies(actual, minimum) {
            Ok(actual)
        } else {
            Err(AccessError::InsufficientRole {
                required: minimum,
                actual,
            })
        }
    }

    /// Join a commune and refresh the cached membership
    pub async fn join(self: &Arc<Self>, commune_id: &str) -> Result<Role> {
        let session = self.session().ok_or(AccessError::NotAuthenticated)?;

        let membership = self.api.join_commune(commune_id, &session).await?;
        info!(
            commune_id = commune_id,
            role = %membership.role,
            "Joined commune"
        );

        self.invalidate(commune_id);
        self.ensure(commune_id).await;
        Ok(self.get_role(commune_id))
    }

    // =========================================================================
    // Fetching
    // =========================================================================

    fn next_generation(&self) -> u64 {
        self.generation.fetch_add(1, Ordering::SeqCst) + 1
    }

    fn spawn_fetch(self: &Arc<Self>, commune_id: String, session: Session, generation: u64) {
        let pending = PendingFetch {
            cache: Arc::clone(self),
            commune_id,
            generation,
            settled: false,
        };

        tokio::spawn(async move {
            let outcome = pending
                .cache
                .api
                .fetch_membership(&pending.commune_id, &session)
                .await;
            pending.settle(outcome);
        });
    }

    /// Record a fetch outcome if the entry still belongs to `generation`
    fn complete(&self, commune_id: &str, generation: u64, outcome: Result<Option<Membership>>) {
        let Some(mut slot) = self.entries.get_mut(commune_id) else {
            debug!(
                commune_id = commune_id,
                generation = generation,
                "Discarding membership response for evicted entry"
            );
            return;
        };

        if slot.entry.generation != generation || slot.entry.status != FetchStatus::Loading {
            warn!(
                commune_id = commune_id,
                generation = generation,
                current = slot.entry.generation,
                "Discarding stale membership response"
            );
            return;
        }

        let now = Utc::now();
        match outcome {
            Ok(membership) => {
                slot.entry.role = membership.map_or(Role::Guest, |m| m.role);
                slot.entry.status = FetchStatus::Loaded;
            }
            Err(e) => {
                warn!(commune_id = commune_id, error = %e, "Membership lookup failed");
                slot.entry.role = Role::Guest;
                slot.entry.status = FetchStatus::Failed;
                slot.entry.error = Some(e.to_string());
            }
        }
        slot.entry.fetched_at = Some(now);

        if let Some(sender) = slot.done.take() {
            debug!(
                commune_id = commune_id,
                generation = generation,
                status = %slot.entry.status,
                role = %slot.entry.role,
                waiting = sender.receiver_count(),
                "Membership lookup settled"
            );
            // Receivers may have been dropped with their views
            let _ = sender.send(());
        }
    }
}

/// A spawned lookup that settles its entry exactly once.
///
/// If the task is dropped before settling (runtime shutdown, panic in the
/// data API) the entry is marked failed instead of staying `Loading`.
struct PendingFetch {
    cache: Arc<MembershipCache>,
    commune_id: String,
    generation: u64,
    settled: bool,
}

impl PendingFetch {
    fn settle(mut self, outcome: Result<Option<Membership>>) {
        self.settled = true;
        self.cache.complete(&self.commune_id, self.generation, outcome);
    }
}

impl Drop for PendingFetch {
    fn drop(&mut self) {
        if !self.settled {
            self.cache.complete(
                &self.commune_id,
                self.generation,
                Err(AccessError::MembershipFetchFailed("lookup aborted".into())),
            );
        }
    }
}
