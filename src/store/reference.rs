//! Read-only reference data: categories and the user directory.
//!
//! Both are loaded once per session and refreshed on demand.

use std::marker::PhantomData;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::RwLock;

use crate::error::Result;
use crate::gateway::Gateway;
use crate::model::{Category, User};

use super::{Generation, StoreStatus};

/// A kind of reference list and how to load it.
#[async_trait]
pub trait ReferenceSource: Send + Sync + 'static {
    type Item: Clone + Send + Sync + 'static;

    const NAME: &'static str;

    async fn load(gateway: &dyn Gateway) -> Result<Vec<Self::Item>>;
}

pub struct Categories;

#[async_trait]
impl ReferenceSource for Categories {
    type Item = Category;

    const NAME: &'static str = "categories";

    async fn load(gateway: &dyn Gateway) -> Result<Vec<Category>> {
        gateway.list_categories().await
    }
}

pub struct Users;

#[async_trait]
impl ReferenceSource for Users {
    type Item = User;

    const NAME: &'static str = "users";

    async fn load(gateway: &dyn Gateway) -> Result<Vec<User>> {
        gateway.list_users().await
    }
}

#[derive(Debug, Clone)]
pub struct ReferenceState<T> {
    pub items: Vec<T>,
    pub status: StoreStatus,
    pub loaded: bool,
    latest_fetch: u64,
}

impl<T> Default for ReferenceState<T> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            status: StoreStatus::default(),
            loaded: false,
            latest_fetch: 0,
        }
    }
}

pub struct ReferenceStore<S: ReferenceSource> {
    gateway: Arc<dyn Gateway>,
    state: Arc<RwLock<ReferenceState<S::Item>>>,
    generation: Arc<Generation>,
    _source: PhantomData<S>,
}

pub type CategoryStore = ReferenceStore<Categories>;
pub type UserStore = ReferenceStore<Users>;

impl<S: ReferenceSource> Clone for ReferenceStore<S> {
    fn clone(&self) -> Self {
        Self {
            gateway: Arc::clone(&self.gateway),
            state: Arc::clone(&self.state),
            generation: Arc::clone(&self.generation),
            _source: PhantomData,
        }
    }
}

impl<S: ReferenceSource> ReferenceStore<S> {
    pub fn new(gateway: Arc<dyn Gateway>) -> Self {
        Self {
            gateway,
            state: Arc::new(RwLock::new(ReferenceState::default())),
            generation: Arc::new(Generation::default()),
            _source: PhantomData,
        }
    }

    pub fn items(&self) -> Vec<S::Item> {
        self.state.read().items.clone()
    }

    pub fn status(&self) -> StoreStatus {
        self.state.read().status.clone()
    }

    pub fn is_loaded(&self) -> bool {
        self.state.read().loaded
    }

    /// Load the list unless a previous load already succeeded.
    pub async fn ensure_loaded(&self) -> Result<Vec<S::Item>> {
        if self.is_loaded() {
            return Ok(self.items());
        }
        self.refresh().await
    }

    pub async fn refresh(&self) -> Result<Vec<S::Item>> {
        let generation = self.generation.next();
        {
            let mut state = self.state.write();
            state.latest_fetch = state.latest_fetch.max(generation);
            state.status.begin_fetch();
        }

        let result = S::load(self.gateway.as_ref()).await;

        let mut state = self.state.write();
        if generation < state.latest_fetch {
            tracing::debug!("discarding stale {} fetch", S::NAME);
            return result;
        }
        match result {
            Ok(items) => {
                tracing::debug!("loaded {} {}", items.len(), S::NAME);
                state.items = items.clone();
                state.loaded = true;
                state.status.finish_fetch();
                Ok(items)
            }
            Err(e) => {
                state.status.fail(e.store_message());
                Err(e)
            }
        }
    }
}
