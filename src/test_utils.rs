//! In-memory data API for tests

use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;
use tokio::sync::Semaphore;

use crate::api::CommuneApi;
use crate::error::{AccessError, Result};
use crate::list::List;
use crate::membership::Membership;
use crate::role::Role;
use crate::session::Session;

type Scripted = std::result::Result<Option<Role>, String>;

/// Scriptable [`CommuneApi`] that counts calls.
///
/// Membership responses are taken from a queue; once it is empty the
/// fallback response is used. A held API parks every membership fetch until
/// [`FakeApi::release`] hands out a permit.
pub struct FakeApi {
    scripted: Mutex<VecDeque<Scripted>>,
    fallback: Mutex<Scripted>,
    lists: Mutex<HashMap<String, std::result::Result<Vec<List>, String>>>,
    hold: Option<Semaphore>,
    fetches: AtomicUsize,
    completed: AtomicUsize,
    list_fetches: AtomicUsize,
    authorized_list_fetches: AtomicUsize,
    joins: AtomicUsize,
}

impl FakeApi {
    pub fn with_role(role: Option<Role>) -> Self {
        Self {
            scripted: Mutex::new(VecDeque::new()),
            fallback: Mutex::new(Ok(role)),
            lists: Mutex::new(HashMap::new()),
            hold: None,
            fetches: AtomicUsize::new(0),
            completed: AtomicUsize::new(0),
            list_fetches: AtomicUsize::new(0),
            authorized_list_fetches: AtomicUsize::new(0),
            joins: AtomicUsize::new(0),
        }
    }

    pub fn failing(message: &str) -> Self {
        let api = Self::with_role(None);
        *api.fallback.lock().unwrap() = Err(message.to_string());
        api
    }

    /// Park membership fetches until released
    pub fn held(mut self) -> Self {
        self.hold = Some(Semaphore::new(0));
        self
    }

    pub fn script(self, responses: Vec<Scripted>) -> Self {
        self.scripted.lock().unwrap().extend(responses);
        self
    }

    pub fn set_role(&self, role: Option<Role>) {
        *self.fallback.lock().unwrap() = Ok(role);
    }

    pub fn with_lists(
        self,
        commune_id: &str,
        lists: std::result::Result<Vec<List>, String>,
    ) -> Self {
        self.lists.lock().unwrap().insert(commune_id.to_string(), lists);
        self
    }

    fn count_list_fetch(&self, session: Option<&Session>) {
        self.list_fetches.fetch_add(1, Ordering::SeqCst);
        if session.is_some() {
            self.authorized_list_fetches.fetch_add(1, Ordering::SeqCst);
        }
    }

    pub fn release(&self, permits: usize) {
        if let Some(hold) = &self.hold {
            hold.add_permits(permits);
        }
    }

    pub fn fetches(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }

    pub fn completed(&self) -> usize {
        self.completed.load(Ordering::SeqCst)
    }

    pub fn list_fetches(&self) -> usize {
        self.list_fetches.load(Ordering::SeqCst)
    }

    /// List fetches that carried a session
    pub fn authorized_list_fetches(&self) -> usize {
        self.authorized_list_fetches.load(Ordering::SeqCst)
    }

    pub fn joins(&self) -> usize {
        self.joins.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CommuneApi for FakeApi {
    async fn fetch_membership(
        &self,
        commune_id: &str,
        session: &Session,
    ) -> Result<Option<Membership>> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        let response = {
            let next = self.scripted.lock().unwrap().pop_front();
            next.unwrap_or_else(|| self.fallback.lock().unwrap().clone())
        };

        if let Some(hold) = &self.hold {
            hold.acquire().await.unwrap().forget();
        }
        self.completed.fetch_add(1, Ordering::SeqCst);

        response
            .map(|role| {
                role.map(|role| Membership {
                    user_id: session.user_id.clone(),
                    commune_id: commune_id.to_string(),
                    role,
                })
            })
            .map_err(AccessError::MembershipFetchFailed)
    }

    async fn fetch_lists(&self, commune_id: &str, session: Option<&Session>) -> Result<Vec<List>> {
        self.count_list_fetch(session);
        match self.lists.lock().unwrap().get(commune_id) {
            Some(Ok(lists)) => Ok(lists.clone()),
            Some(Err(message)) => Err(AccessError::Server {
                status: 500,
                message: message.clone(),
            }),
            None => Ok(Vec::new()),
        }
    }

    async fn fetch_list(&self, list_id: &str, session: Option<&Session>) -> Result<List> {
        self.count_list_fetch(session);
        let lists = self.lists.lock().unwrap();
        lists
            .values()
            .filter_map(|lists| lists.as_ref().ok())
            .flatten()
            .find(|list| list.meta.post_id == list_id)
            .cloned()
            .ok_or_else(|| AccessError::Server {
                status: 404,
                message: format!("list {} not found", list_id),
            })
    }

    async fn join_commune(&self, commune_id: &str, session: &Session) -> Result<Membership> {
        self.joins.fetch_add(1, Ordering::SeqCst);
        self.set_role(Some(Role::Member));
        Ok(Membership {
            user_id: session.user_id.clone(),
            commune_id: commune_id.to_string(),
            role: Role::Member,
        })
    }
}

/// Yield to other tasks until `condition` holds (panics after one second)
pub async fn wait_until(condition: impl Fn() -> bool) {
    let wait = async {
        while !condition() {
            tokio::task::yield_now().await;
        }
    };
    tokio::time::timeout(Duration::from_secs(1), wait)
        .await
        .expect("condition not reached in time");
}

