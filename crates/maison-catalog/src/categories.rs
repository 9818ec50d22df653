//! Shared category cache: one de-duplicated fetch, staleness-based
//! background refresh, subscriber fan-out.
//!
//! The service is an explicit object with an injected source and a
//! `dispose()` lifecycle rather than module-level shared state, so tests
//! can construct isolated instances and nothing leaks across them.

use std::sync::{Arc, Mutex as StdMutex};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use maison_commerce::catalog::{CategoryIndex, CategoryResponse};
use maison_data::{ApiClient, RequestOptions};
use tokio::sync::{watch, Mutex as AsyncMutex};
use tracing::{debug, info};

use crate::error::CatalogError;

/// Default staleness window: reads within it are cache-only.
pub const DEFAULT_STALENESS: Duration = Duration::from_secs(300);

const CATEGORIES_PATH: &str = "/api/categories";

/// Where the flat category list comes from.
#[async_trait]
pub trait CategorySource: Send + Sync + 'static {
    async fn fetch(&self) -> Result<CategoryResponse, CatalogError>;
}

/// Production source: `GET /api/categories`.
pub struct HttpCategorySource {
    client: Arc<ApiClient>,
}

impl HttpCategorySource {
    pub fn new(client: Arc<ApiClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl CategorySource for HttpCategorySource {
    async fn fetch(&self) -> Result<CategoryResponse, CatalogError> {
        let response: CategoryResponse = self
            .client
            .get(CATEGORIES_PATH, RequestOptions::new())
            .await?;
        Ok(response)
    }
}

/// One immutable fetch result, shared by every consumer.
#[derive(Debug)]
pub struct CategorySnapshot {
    pub index: CategoryIndex,
    /// Unix timestamp of the fetch that produced this snapshot.
    pub fetched_at: i64,
}

/// Response envelope of `GET /api/catalog/categories/tree`.
#[derive(Debug, Clone, serde::Serialize)]
pub struct CategoryTreeEnvelope {
    pub tree: Vec<maison_commerce::catalog::CategoryTreeNode>,
    pub flat: Vec<maison_commerce::catalog::IndexedCategory>,
    pub total: usize,
}

impl CategorySnapshot {
    /// Build the tree endpoint envelope from the indexed snapshot.
    pub fn tree_envelope(&self) -> CategoryTreeEnvelope {
        CategoryTreeEnvelope {
            tree: self.index.tree().to_vec(),
            flat: self.index.flat().cloned().collect(),
            total: self.index.total(),
        }
    }
}

#[derive(Default)]
struct ServiceState {
    snapshot: Option<Arc<CategorySnapshot>>,
    /// When the snapshot was fetched. Cleared by `invalidate()` to force a
    /// refresh while keeping the data serveable.
    fresh_since: Option<Instant>,
    refreshing: bool,
    disposed: bool,
}

/// The shared category cache.
///
/// - The first read triggers exactly one fetch; concurrent first readers
///   await the same fetch instead of issuing duplicates.
/// - Reads within the staleness window are served from cache with zero
///   network calls.
/// - A stale read returns current data immediately and triggers one
///   background refetch; a failed background refetch is swallowed and the
///   stale snapshot stays authoritative.
/// - Every successful fetch is published to subscribers.
pub struct CategoryService {
    source: Arc<dyn CategorySource>,
    staleness: Duration,
    state: StdMutex<ServiceState>,
    /// Serializes fetches: single-writer semantics for the snapshot.
    fetch_gate: AsyncMutex<()>,
    tx: watch::Sender<Option<Arc<CategorySnapshot>>>,
}

impl CategoryService {
    pub fn new(source: Arc<dyn CategorySource>) -> Self {
        Self::with_staleness(source, DEFAULT_STALENESS)
    }

    pub fn with_staleness(source: Arc<dyn CategorySource>, staleness: Duration) -> Self {
        let (tx, _rx) = watch::channel(None);
        Self {
            source,
            staleness,
            state: StdMutex::new(ServiceState::default()),
            fetch_gate: AsyncMutex::new(()),
            tx,
        }
    }

    /// Whether a first fetch has succeeded.
    pub fn is_initialized(&self) -> bool {
        self.state
            .lock()
            .map(|s| s.snapshot.is_some())
            .unwrap_or(false)
    }

    /// Watch for snapshot updates. The receiver yields `None` until the
    /// first successful fetch, then each published snapshot.
    pub fn subscribe(&self) -> watch::Receiver<Option<Arc<CategorySnapshot>>> {
        self.tx.subscribe()
    }

    /// Mark the snapshot stale. The next read serves the old data and
    /// triggers a background refresh (availability over freshness).
    pub fn invalidate(&self) {
        if let Ok(mut state) = self.state.lock() {
            state.fresh_since = None;
        }
    }

    /// Tear the service down: drop the snapshot and refuse further reads.
    pub fn dispose(&self) {
        if let Ok(mut state) = self.state.lock() {
            state.disposed = true;
            state.snapshot = None;
            state.fresh_since = None;
        }
    }

    /// Get the current snapshot, fetching if needed.
    ///
    /// Only a first-load failure surfaces an error; once initialized, reads
    /// always succeed with the best available data.
    pub async fn get(self: &Arc<Self>) -> Result<Arc<CategorySnapshot>, CatalogError> {
        // Fast path under the state lock: fresh, or stale-but-serveable.
        {
            let mut state = self
                .state
                .lock()
                .map_err(|e| CatalogError::CategoryFetch(e.to_string()))?;
            if state.disposed {
                return Err(CatalogError::Disposed);
            }
            if let Some(snapshot) = &state.snapshot {
                let fresh = state
                    .fresh_since
                    .map(|at| at.elapsed() <= self.staleness)
                    .unwrap_or(false);
                if fresh {
                    return Ok(Arc::clone(snapshot));
                }

                let snapshot = Arc::clone(snapshot);
                if !state.refreshing {
                    state.refreshing = true;
                    let service = Arc::clone(self);
                    tokio::spawn(async move {
                        service.background_refresh().await;
                    });
                }
                return Ok(snapshot);
            }
        }

        // First load: serialize through the gate so concurrent callers
        // share one fetch.
        let _gate = self.fetch_gate.lock().await;

        // A concurrent caller may have completed the fetch while we waited.
        {
            let state = self
                .state
                .lock()
                .map_err(|e| CatalogError::CategoryFetch(e.to_string()))?;
            if state.disposed {
                return Err(CatalogError::Disposed);
            }
            if let Some(snapshot) = &state.snapshot {
                return Ok(Arc::clone(snapshot));
            }
        }

        let snapshot = self.fetch_snapshot().await?;
        self.publish(Arc::clone(&snapshot));
        Ok(snapshot)
    }

    async fn background_refresh(self: Arc<Self>) {
        let _gate = self.fetch_gate.lock().await;

        let result = self.fetch_snapshot().await;
        match result {
            Ok(snapshot) => {
                info!(total = snapshot.index.total(), "category cache refreshed");
                self.publish(snapshot);
            }
            Err(error) => {
                // Stale data keeps serving; freshness loses to availability.
                debug!(error = %error, "background category refresh failed, keeping stale data");
            }
        }

        if let Ok(mut state) = self.state.lock() {
            state.refreshing = false;
        }
    }

    async fn fetch_snapshot(&self) -> Result<Arc<CategorySnapshot>, CatalogError> {
        let response = self.source.fetch().await?;
        let index = CategoryIndex::build(&response.categories);
        Ok(Arc::new(CategorySnapshot {
            index,
            fetched_at: unix_now(),
        }))
    }

    fn publish(&self, snapshot: Arc<CategorySnapshot>) {
        if let Ok(mut state) = self.state.lock() {
            if state.disposed {
                return;
            }
            state.snapshot = Some(Arc::clone(&snapshot));
            state.fresh_since = Some(Instant::now());
        }
        let _ = self.tx.send(Some(snapshot));
    }
}

fn unix_now() -> i64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or(0)
}
