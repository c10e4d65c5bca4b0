//! The routing engine: owns the current network and its lifecycle.
//!
//! Queries take a cheap `Arc` clone of the current network under a short
//! read lock and then search without holding any lock. Builds run on the
//! blocking pool. Builds and invalidation are serialized by an async mutex,
//! and a new network is swapped in only once it is complete. A failed or
//! aborted build leaves the previous network (and snapshot) in place.

mod error;

pub use error::EngineError;

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use serde::Serialize;
use tokio::sync::{Mutex, RwLock};
use tracing::{info, warn};

use crate::cache::{NetworkSource, SnapshotCache, load_or_build};
use crate::config::EngineConfig;
use crate::domain::Coordinates;
use crate::feed::TransitFeed;
use crate::network::{BuildControl, BuildError, BuildPolicy, Network, build};
use crate::planner::{Itinerary, RouteError, Router, RouterConfig};

/// Summary of the network currently being served.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NetworkInfo {
    /// Increases by one every time a network is installed.
    pub generation: u64,
    pub stops: usize,
    pub nodes: usize,
    pub edges: usize,
    pub lines: usize,
    pub source: NetworkSource,
}

impl NetworkInfo {
    fn new(generation: u64, network: &Network, source: NetworkSource) -> Self {
        let graph = network.graph();
        Self {
            generation,
            stops: network.stops().len(),
            nodes: graph.node_count(),
            edges: graph.edge_count(),
            lines: graph.lines().len(),
            source,
        }
    }
}

struct Current {
    network: Arc<Network>,
    info: NetworkInfo,
}

struct Inner {
    feed: Arc<dyn TransitFeed>,
    cache: SnapshotCache,
    policy: BuildPolicy,
    router: RouterConfig,
    current: RwLock<Option<Current>>,
    build_lock: Mutex<()>,
    control: BuildControl,
    stale: AtomicBool,
    refreshing: AtomicBool,
    generation: AtomicU64,
}

/// Shared handle to the routing engine. Clones share state.
#[derive(Clone)]
pub struct RoutingEngine {
    inner: Arc<Inner>,
}

impl RoutingEngine {
    /// Create an engine with no network loaded.
    pub fn new(feed: Arc<dyn TransitFeed>, config: EngineConfig) -> Self {
        Self {
            inner: Arc::new(Inner {
                feed,
                cache: SnapshotCache::new(config.snapshot_path),
                policy: config.build,
                router: config.router,
                current: RwLock::new(None),
                build_lock: Mutex::new(()),
                control: BuildControl::new(),
                stale: AtomicBool::new(false),
                refreshing: AtomicBool::new(false),
                generation: AtomicU64::new(0),
            }),
        }
    }

    /// Load the network from the snapshot, building it if necessary.
    ///
    /// Does nothing if a fresh network is already loaded.
    pub async fn load_or_build(&self) -> Result<NetworkInfo, EngineError> {
        let _guard = self.inner.build_lock.lock().await;
        if !self.is_stale()
            && let Some(info) = self.info().await
        {
            return Ok(info);
        }

        self.inner.control.reset();
        let feed = Arc::clone(&self.inner.feed);
        let cache = self.inner.cache.clone();
        let policy = self.inner.policy.clone();
        let control = self.inner.control.clone();
        let (network, source) = tokio::task::spawn_blocking(move || {
            load_or_build(&cache, feed.as_ref(), &policy, &control)
        })
        .await??;

        Ok(self.install(network, source).await)
    }

    /// Build a new network from the feed and replace the current one.
    ///
    /// The snapshot is rewritten on success. On failure the current
    /// network and snapshot stay as they were.
    pub async fn rebuild(&self) -> Result<NetworkInfo, EngineError> {
        let _guard = self.inner.build_lock.lock().await;
        self.inner.control.reset();

        let feed = Arc::clone(&self.inner.feed);
        let cache = self.inner.cache.clone();
        let policy = self.inner.policy.clone();
        let control = self.inner.control.clone();
        let result = tokio::task::spawn_blocking(move || {
            let network = build(feed.as_ref(), &policy, &control)?;
            if control.is_aborted() {
                return Err(BuildError::Aborted);
            }
            if let Err(e) = cache.save(&network) {
                warn!(error = %e, "failed to write snapshot after rebuild");
            }
            Ok(network)
        })
        .await?;

        match result {
            Ok(network) => Ok(self.install(network, NetworkSource::Feed).await),
            Err(e) => {
                warn!(error = %e, "rebuild failed, keeping current network");
                Err(e.into())
            }
        }
    }

    /// Delete the snapshot and mark the current network stale.
    ///
    /// Waits for a running build to finish, so that build cannot write its
    /// snapshot or clear the stale flag afterwards. The stale network keeps
    /// serving; the next query starts a rebuild in the background.
    pub async fn invalidate(&self) -> Result<(), EngineError> {
        let _guard = self.inner.build_lock.lock().await;
        self.inner.cache.remove()?;
        self.inner.stale.store(true, Ordering::SeqCst);
        info!("network invalidated");
        Ok(())
    }

    /// Ask a running build to stop.
    pub fn abort_build(&self) {
        self.inner.control.abort();
    }

    /// Whether the network has been invalidated and not yet rebuilt.
    pub fn is_stale(&self) -> bool {
        self.inner.stale.load(Ordering::SeqCst)
    }

    /// The network currently being served.
    pub async fn network(&self) -> Option<Arc<Network>> {
        let guard = self.inner.current.read().await;
        guard.as_ref().map(|c| Arc::clone(&c.network))
    }

    /// Summary of the network currently being served.
    pub async fn info(&self) -> Option<NetworkInfo> {
        let guard = self.inner.current.read().await;
        guard.as_ref().map(|c| c.info.clone())
    }

    /// Find a route on the current network.
    pub async fn find_route(
        &self,
        start: Coordinates,
        end: Coordinates,
        query_time: Option<&str>,
    ) -> Result<Itinerary, RouteError> {
        let network = self.network().await.ok_or(RouteError::NotReady)?;
        if self.is_stale() {
            self.spawn_refresh();
        }
        Router::new(&network, &self.inner.router).find_route(start, end, query_time)
    }

    fn spawn_refresh(&self) {
        if self
            .inner
            .refreshing
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return;
        }
        info!("network is stale, rebuilding in the background");
        let engine = self.clone();
        tokio::spawn(async move {
            if let Err(e) = engine.rebuild().await {
                warn!(error = %e, "background rebuild failed");
            }
            engine.inner.refreshing.store(false, Ordering::SeqCst);
        });
    }

    async fn install(&self, network: Network, source: NetworkSource) -> NetworkInfo {
        let generation = self.inner.generation.fetch_add(1, Ordering::SeqCst) + 1;
        let info = NetworkInfo::new(generation, &network, source);
        {
            let mut guard = self.inner.current.write().await;
            *guard = Some(Current {
                network: Arc::new(network),
                info: info.clone(),
            });
        }
        self.inner.stale.store(false, Ordering::SeqCst);
        info!(
            generation,
            stops = info.stops,
            edges = info.edges,
            source = ?source,
            "network installed"
        );
        info
    }
}
