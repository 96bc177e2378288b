use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

use log::debug;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::api::ApiError;
use crate::models::{Company, DashboardStats, Expense, ExpenseValidation, User};
use crate::validations::plan::{FetchPlan, StatusTab};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QueryFamily {
    Validations,
    ValidationsHistory,
    ValidationsPending,
    ValidationsPredicted,
    Expenses,
    DashboardStats,
    Dashboard,
    Companies,
    Users,
    CurrentUser,
}

/// Every family an approve or reject can make stale.
pub const VALIDATION_MUTATION_FANOUT: [QueryFamily; 7] = [
    QueryFamily::Validations,
    QueryFamily::ValidationsHistory,
    QueryFamily::ValidationsPending,
    QueryFamily::ValidationsPredicted,
    QueryFamily::Expenses,
    QueryFamily::DashboardStats,
    QueryFamily::Dashboard,
];

/// Request parameters of a cached response. Client-side filters are never
/// part of the key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct QueryKey {
    pub family: QueryFamily,
    pub params: String,
}

impl QueryKey {
    pub fn new(family: QueryFamily, params: impl Into<String>) -> Self {
        Self { family, params: params.into() }
    }

    pub fn plain(family: QueryFamily) -> Self {
        Self::new(family, String::new())
    }
}

impl From<&FetchPlan> for QueryKey {
    fn from(plan: &FetchPlan) -> Self {
        match *plan {
            FetchPlan::Predicted(month) => QueryKey::new(QueryFamily::ValidationsPredicted, month.to_string()),
            FetchPlan::Historical { month, tab: StatusTab::Pending } => {
                QueryKey::new(QueryFamily::ValidationsPending, month.to_string())
            }
            FetchPlan::Historical { month, tab } => {
                QueryKey::new(QueryFamily::ValidationsHistory, format!("{month}|{tab}"))
            }
        }
    }
}

#[derive(Debug, Clone)]
pub enum CachedValue {
    Validations(Arc<Vec<ExpenseValidation>>),
    Expenses(Arc<Vec<Expense>>),
    DashboardStats(Arc<DashboardStats>),
    Companies(Arc<Vec<Company>>),
    Users(Arc<Vec<User>>),
    CurrentUser(Arc<User>),
}

pub trait Cacheable: Sized + Send + Sync + 'static {
    fn into_cached(value: Arc<Self>) -> CachedValue;
    fn from_cached(value: CachedValue) -> Option<Arc<Self>>;
}

macro_rules! cacheable {
    ($ty:ty => $variant:ident) => {
        impl Cacheable for $ty {
            fn into_cached(value: Arc<Self>) -> CachedValue {
                CachedValue::$variant(value)
            }

            fn from_cached(value: CachedValue) -> Option<Arc<Self>> {
                match value {
                    CachedValue::$variant(inner) => Some(inner),
                    _ => None,
                }
            }
        }
    };
}

cacheable!(Vec<ExpenseValidation> => Validations);
cacheable!(Vec<Expense> => Expenses);
cacheable!(DashboardStats => DashboardStats);
cacheable!(Vec<Company> => Companies);
cacheable!(Vec<User> => Users);
cacheable!(User => CurrentUser);

#[derive(Debug)]
struct Entry {
    value: CachedValue,
    stored_at: Instant,
}

#[derive(Debug, Default)]
struct Store {
    entries: HashMap<(Uuid, QueryKey), Entry>,
    /// Bumped every time a family is invalidated. A fetch that started under
    /// an older epoch must not write its response back.
    epochs: HashMap<QueryFamily, u64>,
}

impl Store {
    fn epoch(&self, family: QueryFamily) -> u64 {
        self.epochs.get(&family).copied().unwrap_or_default()
    }

    fn evict_expired(&mut self, ttl: Duration) -> usize {
        let before = self.entries.len();
        self.entries.retain(|_, entry| entry.stored_at.elapsed() < ttl);
        before - self.entries.len()
    }
}

/// Response cache shared by every session, keyed by (session user, query).
/// Mutations invalidate whole families; nothing is recomputed eagerly.
/// Expired entries are dropped when read and swept on every insert.
#[derive(Debug)]
pub struct QueryCache {
    ttl: Duration,
    store: RwLock<Store>,
}

impl QueryCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            store: RwLock::new(Store::default()),
        }
    }

    pub async fn get<T: Cacheable>(&self, scope: Uuid, key: &QueryKey) -> Option<Arc<T>> {
        let slot = (scope, key.clone());
        {
            let store = self.store.read().await;
            let entry = store.entries.get(&slot)?;
            if entry.stored_at.elapsed() < self.ttl {
                return T::from_cached(entry.value.clone());
            }
        }

        let mut store = self.store.write().await;
        if store
            .entries
            .get(&slot)
            .is_some_and(|entry| entry.stored_at.elapsed() >= self.ttl)
        {
            store.entries.remove(&slot);
        }
        None
    }

    /// Current invalidation epoch of `family`. Read it before going upstream
    /// and hand it to [`QueryCache::insert_if_current`].
    pub async fn epoch(&self, family: QueryFamily) -> u64 {
        self.store.read().await.epoch(family)
    }

    pub async fn insert<T: Cacheable>(&self, scope: Uuid, key: QueryKey, value: Arc<T>) {
        let mut store = self.store.write().await;
        store.evict_expired(self.ttl);
        let entry = Entry {
            value: T::into_cached(value),
            stored_at: Instant::now(),
        };
        store.entries.insert((scope, key), entry);
    }

    /// Stores `value` unless the key's family was invalidated since `epoch`
    /// was read. Returns whether the value was stored.
    pub async fn insert_if_current<T: Cacheable>(
        &self,
        scope: Uuid,
        key: QueryKey,
        value: Arc<T>,
        epoch: u64,
    ) -> bool {
        let mut store = self.store.write().await;
        if store.epoch(key.family) != epoch {
            debug!("dropping {:?} response fetched before an invalidation", key.family);
            return false;
        }
        store.evict_expired(self.ttl);
        let entry = Entry {
            value: T::into_cached(value),
            stored_at: Instant::now(),
        };
        store.entries.insert((scope, key), entry);
        true
    }

    pub async fn get_or_fetch<T, F, Fut>(&self, scope: Uuid, key: QueryKey, fetch: F) -> Result<Arc<T>, ApiError>
    where
        T: Cacheable,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, ApiError>>,
    {
        if let Some(hit) = self.get::<T>(scope, &key).await {
            return Ok(hit);
        }
        let epoch = self.epoch(key.family).await;
        let value = Arc::new(fetch().await?);
        self.insert_if_current(scope, key, Arc::clone(&value), epoch).await;
        Ok(value)
    }

    /// Drops every entry of the given families, for all sessions, and moves
    /// their epochs forward. Returns the number of entries removed.
    pub async fn invalidate(&self, families: &[QueryFamily]) -> usize {
        let mut store = self.store.write().await;
        for family in families {
            *store.epochs.entry(*family).or_default() += 1;
        }
        let before = store.entries.len();
        store.entries.retain(|(_, key), _| !families.contains(&key.family));
        let dropped = before - store.entries.len();
        debug!("invalidated {} cached responses across {:?}", dropped, families);
        dropped
    }

    pub async fn forget_scope(&self, scope: Uuid) {
        self.store.write().await.entries.retain(|(owner, _), _| *owner != scope);
    }

    pub async fn len(&self) -> usize {
        self.store.read().await.entries.len()
    }
}
