use std::collections::HashMap;
use std::error::Error;
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::{
    Arc,
    atomic::{AtomicU64, Ordering},
};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use tokio::sync::{OnceCell, RwLock};
use tracing::{debug, info, warn};

use crate::control::ClickHouseControlPlane;
use crate::store::ClickHouseStore;

pub type BuildHandleFuture =
    Pin<Box<dyn Future<Output = Result<Arc<DatabaseHandle>, RegistryError>> + Send + 'static>>;
pub type BuildHandleFn = Arc<dyn Fn(String) -> BuildHandleFuture + Send + Sync + 'static>;

/// Configuration for the database registry cache and builder.
#[derive(Clone)]
pub struct DatabaseRegistryConfig {
    pub ttl: Option<Duration>,
    pub sweep_interval: Duration,
    pub max_entries: Option<usize>,
    pub build_handle: BuildHandleFn,
}

impl DatabaseRegistryConfig {
    pub fn new(build_handle: BuildHandleFn) -> Self {
        Self {
            ttl: None,
            sweep_interval: Duration::from_secs(60),
            max_entries: None,
            build_handle,
        }
    }

    #[must_use]
    pub const fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = Some(ttl);
        self
    }

    #[must_use]
    pub const fn with_sweep_interval(mut self, sweep_interval: Duration) -> Self {
        self.sweep_interval = sweep_interval;
        self
    }

    #[must_use]
    pub const fn with_max_entries(mut self, max_entries: usize) -> Self {
        self.max_entries = Some(max_entries);
        self
    }
}

#[derive(Debug)]
pub enum RegistryError {
    InvalidDatabase(String),
    CapacityReached { max: usize },
    BuildFailed(String),
}

impl fmt::Display for RegistryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidDatabase(database) => write!(f, "invalid database name: {database:?}"),
            Self::CapacityReached { max } => {
                write!(f, "database registry capacity reached (max {max})")
            }
            Self::BuildFailed(message) => write!(f, "failed to connect to database: {message}"),
        }
    }
}

impl Error for RegistryError {}

/// Shared service handle for a single database.
#[derive(Clone)]
pub struct DatabaseHandle {
    store: ClickHouseStore,
    control: ClickHouseControlPlane,
}

impl DatabaseHandle {
    #[must_use]
    pub fn new(store: ClickHouseStore) -> Self {
        let control = ClickHouseControlPlane::new(store.clone());
        Self { store, control }
    }

    #[must_use]
    pub fn store(&self) -> ClickHouseStore {
        self.store.clone()
    }

    #[must_use]
    pub fn control(&self) -> ClickHouseControlPlane {
        self.control.clone()
    }
}

/// Registry of lazily connected database handles.
#[derive(Clone)]
pub struct DatabaseRegistry {
    inner: Arc<DatabaseRegistryInner>,
}

struct DatabaseRegistryInner {
    entries: RwLock<HashMap<String, Arc<DatabaseEntry>>>,
    config: DatabaseRegistryConfig,
}

/// Cache entry that tracks a handle and its last access time.
struct DatabaseEntry {
    handle: OnceCell<Arc<DatabaseHandle>>,
    last_used_ms: AtomicU64,
}

impl DatabaseEntry {
    fn new() -> Self {
        Self {
            handle: OnceCell::new(),
            last_used_ms: AtomicU64::new(now_ms()),
        }
    }

    fn touch(&self) {
        self.last_used_ms.store(now_ms(), Ordering::Relaxed);
    }

    fn idle_for(&self, now_ms: u64) -> Duration {
        let last = self.last_used_ms.load(Ordering::Relaxed);
        Duration::from_millis(now_ms.saturating_sub(last))
    }
}

impl DatabaseRegistry {
    #[must_use]
    pub fn new(config: DatabaseRegistryConfig) -> Self {
        Self {
            inner: Arc::new(DatabaseRegistryInner {
                entries: RwLock::new(HashMap::new()),
                config,
            }),
        }
    }

    /// Returns the handle for a database, building it on first use.
    ///
    /// Concurrent callers for the same database share one build. A failed
    /// build leaves no entry behind.
    ///
    /// # Errors
    /// Returns `RegistryError` if the name is blank, the registry is full, or
    /// the build fails.
    pub async fn get_or_init(&self, database: &str) -> Result<Arc<DatabaseHandle>, RegistryError> {
        let database = database.trim();
        if database.is_empty() {
            return Err(RegistryError::InvalidDatabase(database.to_string()));
        }

        let entry = {
            let map = self.inner.entries.read().await;
            map.get(database).cloned()
        };

        let entry = match entry {
            Some(entry) => entry,
            None => {
                let mut map = self.inner.entries.write().await;
                if let Some(entry) = map.get(database).cloned() {
                    entry
                } else {
                    if let Some(max_entries) = self.inner.config.max_entries {
                        if map.len() >= max_entries {
                            warn!(database, max_entries, "database registry is full");
                            return Err(RegistryError::CapacityReached { max: max_entries });
                        }
                    }
                    let entry = Arc::new(DatabaseEntry::new());
                    map.insert(database.to_string(), entry.clone());
                    entry
                }
            }
        };

        entry.touch();

        let build_handle = self.inner.config.build_handle.clone();
        let result = entry
            .handle
            .get_or_try_init(|| {
                debug!(database, "building database handle");
                (build_handle)(database.to_string())
            })
            .await
            .cloned();

        if let Err(ref err) = result {
            warn!(database, "database handle build failed: {err}");
            let mut map = self.inner.entries.write().await;
            if map
                .get(database)
                .is_some_and(|current| Arc::ptr_eq(current, &entry) && current.handle.get().is_none())
            {
                map.remove(database);
            }
        }
        result
    }

    pub async fn list_databases(&self) -> Vec<String> {
        let map = self.inner.entries.read().await;
        map.keys().cloned().collect()
    }

    pub async fn evict_idle(&self) -> usize {
        let Some(ttl) = self.inner.config.ttl else {
            return 0;
        };
        let now = now_ms();
        let mut map = self.inner.entries.write().await;
        let before = map.len();
        map.retain(|_, entry| entry.idle_for(now) <= ttl);
        let evicted = before.saturating_sub(map.len());
        if evicted > 0 {
            info!(evicted, "evicted idle database handles");
        }
        evicted
    }

    #[must_use]
    pub fn spawn_sweeper(self) -> Option<tokio::task::JoinHandle<()>> {
        let _ttl = self.inner.config.ttl?;
        let interval = self.inner.config.sweep_interval;
        let registry = self;
        Some(tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            loop {
                ticker.tick().await;
                let _ = registry.evict_idle().await;
            }
        }))
    }
}

fn now_ms() -> u64 {
    let millis = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis();
    u64::try_from(millis).unwrap_or(u64::MAX)
}
