//! Disk snapshot of a built network.
//!
//! Building the graph from a feed is slow, so the result is written to a
//! single JSON file and reloaded on the next start. The file carries a
//! header with a schema tag and version; a snapshot written by an
//! incompatible version is treated like a missing one and rebuilt.
//!
//! Adjacency lists and lookup maps are not stored. They are rebuilt from
//! the node, line and edge lists on load, which also re-checks every index.

use std::ffi::OsString;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::domain::{Line, Stop};
use crate::feed::TransitFeed;
use crate::network::{
    BuildControl, BuildError, BuildPolicy, Edge, GraphIntegrityError, Network, Node, TransitGraph,
    build,
};
use crate::stations::StopRegistry;

/// Schema tag written into every snapshot.
pub const SNAPSHOT_SCHEMA: &str = "transit-router/layered-graph";

/// Current snapshot format version.
pub const SNAPSHOT_VERSION: u32 = 1;

/// Errors reading or writing a snapshot.
#[derive(Debug, thiserror::Error)]
pub enum SnapshotError {
    #[error("snapshot I/O error at {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("snapshot encoding error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("incompatible snapshot: found {schema} v{version}")]
    Incompatible { schema: String, version: u32 },

    #[error("corrupt snapshot: {0}")]
    Corrupt(String),
}

impl From<GraphIntegrityError> for SnapshotError {
    fn from(err: GraphIntegrityError) -> Self {
        SnapshotError::Corrupt(err.to_string())
    }
}

/// Snapshot metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnapshotHeader {
    pub schema: String,
    pub version: u32,
    pub built_at: DateTime<Utc>,
    pub stop_count: usize,
    pub edge_count: usize,
}

impl SnapshotHeader {
    fn for_network(network: &Network) -> Self {
        Self {
            schema: SNAPSHOT_SCHEMA.to_string(),
            version: SNAPSHOT_VERSION,
            built_at: Utc::now(),
            stop_count: network.stops().len(),
            edge_count: network.graph().edge_count(),
        }
    }
}

/// The schema tag and version, parsed before committing to the full layout.
#[derive(Deserialize)]
struct HeaderProbe {
    header: VersionProbe,
}

#[derive(Deserialize)]
struct VersionProbe {
    schema: String,
    version: u32,
}

#[derive(Serialize)]
struct SnapshotRef<'a> {
    header: &'a SnapshotHeader,
    stops: &'a [Stop],
    lines: &'a [Line],
    nodes: &'a [Node],
    edges: &'a [Edge],
}

#[derive(Deserialize)]
struct SnapshotData {
    header: SnapshotHeader,
    stops: Vec<Stop>,
    lines: Vec<Line>,
    nodes: Vec<Node>,
    edges: Vec<Edge>,
}

/// A network reloaded from disk.
#[derive(Debug, Clone, PartialEq)]
pub struct LoadedSnapshot {
    pub header: SnapshotHeader,
    pub network: Network,
}

/// Where a network came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NetworkSource {
    Snapshot,
    Feed,
}

/// The snapshot file at one path.
#[derive(Debug, Clone)]
pub struct SnapshotCache {
    path: PathBuf,
}

impl SnapshotCache {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// The snapshot file path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the snapshot.
    ///
    /// Returns `Ok(None)` if no snapshot exists.
    pub fn load(&self) -> Result<Option<LoadedSnapshot>, SnapshotError> {
        let contents = match std::fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(source) => {
                return Err(SnapshotError::Io {
                    path: self.path.clone(),
                    source,
                });
            }
        };

        let probe: HeaderProbe = serde_json::from_str(&contents)?;
        let VersionProbe { schema, version } = probe.header;
        if schema != SNAPSHOT_SCHEMA || version != SNAPSHOT_VERSION {
            return Err(SnapshotError::Incompatible { schema, version });
        }

        let data: SnapshotData = serde_json::from_str(&contents)?;
        let stops = StopRegistry::from_stops(data.stops);
        if stops.len() != data.header.stop_count || data.edges.len() != data.header.edge_count {
            return Err(SnapshotError::Corrupt(format!(
                "header promises {} stops and {} edges, found {} and {}",
                data.header.stop_count,
                data.header.edge_count,
                stops.len(),
                data.edges.len()
            )));
        }
        let graph = TransitGraph::from_parts(data.nodes, data.lines, data.edges)?;
        let network = Network::new(graph, stops)?;

        debug!(path = %self.path.display(), built_at = %data.header.built_at, "loaded snapshot");
        Ok(Some(LoadedSnapshot {
            header: data.header,
            network,
        }))
    }

    /// Write a snapshot of `network`, replacing any existing one.
    ///
    /// The file is written beside the target and renamed into place, so a
    /// failed write leaves the previous snapshot intact. Parent directories
    /// are created if needed.
    pub fn save(&self, network: &Network) -> Result<SnapshotHeader, SnapshotError> {
        let header = SnapshotHeader::for_network(network);
        let graph = network.graph();
        let snapshot = SnapshotRef {
            header: &header,
            stops: network.stops().stops(),
            lines: graph.lines(),
            nodes: graph.nodes(),
            edges: graph.edges(),
        };
        let json = serde_json::to_string(&snapshot)?;

        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
            && !parent.exists()
        {
            std::fs::create_dir_all(parent).map_err(|source| SnapshotError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
        }

        let temp = self.temp_path();
        std::fs::write(&temp, json).map_err(|source| SnapshotError::Io {
            path: temp.clone(),
            source,
        })?;
        std::fs::rename(&temp, &self.path).map_err(|source| SnapshotError::Io {
            path: self.path.clone(),
            source,
        })?;

        info!(
            path = %self.path.display(),
            stops = header.stop_count,
            edges = header.edge_count,
            "wrote snapshot"
        );
        Ok(header)
    }

    /// Delete the snapshot. A missing snapshot is not an error.
    pub fn remove(&self) -> Result<(), SnapshotError> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => {
                info!(path = %self.path.display(), "removed snapshot");
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(source) => Err(SnapshotError::Io {
                path: self.path.clone(),
                source,
            }),
        }
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(OsString::from)
            .unwrap_or_else(|| OsString::from("snapshot"));
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

/// Load the network from the snapshot, or build it from the feed.
///
/// An unreadable or incompatible snapshot counts as missing. After a build
/// the snapshot is rewritten; a failed write is logged and the freshly
/// built network is still returned.
pub fn load_or_build(
    cache: &SnapshotCache,
    feed: &dyn TransitFeed,
    policy: &BuildPolicy,
    control: &BuildControl,
) -> Result<(Network, NetworkSource), BuildError> {
    match cache.load() {
        Ok(Some(loaded)) => {
            info!(
                path = %cache.path().display(),
                stops = loaded.header.stop_count,
                edges = loaded.header.edge_count,
                "using snapshot"
            );
            return Ok((loaded.network, NetworkSource::Snapshot));
        }
        Ok(None) => info!(path = %cache.path().display(), "no snapshot, building"),
        Err(e) => warn!(path = %cache.path().display(), error = %e, "snapshot unusable, rebuilding"),
    }

    let network = build(feed, policy, control)?;
    if let Err(e) = cache.save(&network) {
        warn!(path = %cache.path().display(), error = %e, "failed to write snapshot");
    }
    Ok((network, NetworkSource::Feed))
}
