//! glTF asset loading with a path-keyed cache
//!
//! Assets are read through an [`AssetSource`] on a blocking worker, parsed
//! with the `gltf` crate and cached by their exact path string. Concurrent
//! requests for a path that is still loading share the one in-flight fetch.
//! Failed loads are evicted so that a later request retries.

use parking_lot::Mutex;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use thiserror::Error;
use base64::Engine;
use tokio::sync::watch;
use tracing::{debug, error, info};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AssetLoadError {
    #[error("asset not found: {0}")]
    NotFound(String),
    #[error("failed to read {path}: {message}")]
    Unreadable { path: String, message: String },
    #[error("failed to parse {path}: {message}")]
    Parse { path: String, message: String },
}

impl AssetLoadError {
    /// Path of the asset that failed
    pub fn path(&self) -> &str {
        match self {
            Self::NotFound(path) => path,
            Self::Unreadable { path, .. } | Self::Parse { path, .. } => path,
        }
    }
}

/// Load state of one asset
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadState {
    Pending,
    Ready,
    Failed,
}

/// Where asset bytes come from
pub trait AssetSource: Send + Sync + 'static {
    /// Read the full contents at `path`. Called on a blocking worker.
    fn read(&self, path: &str) -> Result<Vec<u8>, AssetLoadError>;
}

/// Reads assets from a directory on disk
#[derive(Debug, Clone)]
pub struct FileSource {
    root: PathBuf,
}

impl FileSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Resolve an asset path against the root. A leading `/` means the root
    /// itself, the way a static file server treats it.
    pub fn resolve(&self, path: &str) -> PathBuf {
        self.root.join(path.trim_start_matches('/'))
    }
}

impl AssetSource for FileSource {
    fn read(&self, path: &str) -> Result<Vec<u8>, AssetLoadError> {
        let full = self.resolve(path);
        std::fs::read(&full).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => AssetLoadError::NotFound(path.to_string()),
            _ => AssetLoadError::Unreadable {
                path: path.to_string(),
                message: e.to_string(),
            },
        })
    }
}

/// Axis-aligned bounds in mesh-local space
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub min: [f32; 3],
    pub max: [f32; 3],
}

impl Bounds {
    fn union(self, other: Bounds) -> Bounds {
        Bounds {
            min: [
                self.min[0].min(other.min[0]),
                self.min[1].min(other.min[1]),
                self.min[2].min(other.min[2]),
            ],
            max: [
                self.max[0].max(other.max[0]),
                self.max[1].max(other.max[1]),
                self.max[2].max(other.max[2]),
            ],
        }
    }
}

/// One node of the asset's scene graph
#[derive(Debug, Clone, PartialEq)]
pub struct AssetNode {
    pub name: Option<String>,
    /// Depth below the scene root, roots are 0
    pub depth: usize,
    /// Mesh primitives attached directly to this node
    pub primitives: usize,
}

/// A parsed, renderable scene graph
#[derive(Debug, Clone, PartialEq)]
pub struct SceneAsset {
    source: String,
    nodes: Vec<AssetNode>,
    primitive_count: usize,
    vertex_count: usize,
    bounds: Option<Bounds>,
}

impl SceneAsset {
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Nodes in depth-first order
    pub fn nodes(&self) -> &[AssetNode] {
        &self.nodes
    }

    pub fn primitive_count(&self) -> usize {
        self.primitive_count
    }

    pub fn vertex_count(&self) -> usize {
        self.vertex_count
    }

    pub fn bounds(&self) -> Option<Bounds> {
        self.bounds
    }
}

/// Parse glTF or GLB bytes into a [`SceneAsset`].
///
/// Every buffer is resolved: the GLB binary chunk, base64 data URIs, or
/// external files read from `source` relative to `path`. Uses the default
/// scene, else the first one. Fails when a buffer or buffer view is shorter
/// than declared or when nothing renderable is found.
pub fn parse_scene(
    path: &str,
    bytes: &[u8],
    source: &dyn AssetSource,
) -> Result<SceneAsset, AssetLoadError> {
    let parse_error = |message: String| AssetLoadError::Parse {
        path: path.to_string(),
        message,
    };

    let gltf = gltf::Gltf::from_slice(bytes).map_err(|e| parse_error(e.to_string()))?;

    let mut buffer_lens = Vec::new();
    for buffer in gltf.buffers() {
        let available = match buffer.source() {
            gltf::buffer::Source::Bin => gltf.blob.as_ref().map_or(0, Vec::len),
            gltf::buffer::Source::Uri(uri) if uri.starts_with("data:") => {
                let data = decode_data_uri(uri).ok_or_else(|| {
                    parse_error(format!("buffer {} has a malformed data URI", buffer.index()))
                })?;
                data.len()
            }
            gltf::buffer::Source::Uri(uri) => source.read(&sibling_path(path, uri))?.len(),
        };
        if available < buffer.length() {
            return Err(parse_error(format!(
                "buffer {} holds {} bytes, needs {}",
                buffer.index(),
                available,
                buffer.length()
            )));
        }
        buffer_lens.push(available);
    }

    for view in gltf.views() {
        let end = view.offset() + view.length();
        if end > buffer_lens.get(view.buffer().index()).copied().unwrap_or(0) {
            return Err(parse_error(format!(
                "buffer view {} ends at byte {}, past its buffer",
                view.index(),
                end
            )));
        }
    }

    let scene = gltf
        .default_scene()
        .or_else(|| gltf.scenes().next())
        .ok_or_else(|| parse_error("no scenes".to_string()))?;

    let mut nodes = Vec::new();
    let mut primitive_count = 0;
    let mut vertex_count = 0;
    let mut bounds: Option<Bounds> = None;

    let mut stack: Vec<(gltf::Node, usize)> = scene.nodes().map(|n| (n, 0)).collect();
    stack.reverse();
    while let Some((node, depth)) = stack.pop() {
        let mut primitives = 0;
        if let Some(mesh) = node.mesh() {
            for primitive in mesh.primitives() {
                primitives += 1;
                let Some(positions) = primitive.get(&gltf::Semantic::Positions) else {
                    continue;
                };
                vertex_count += positions.count();
                let accessor_bounds = positions
                    .min()
                    .zip(positions.max())
                    .and_then(|(min, max)| {
                        Some(Bounds {
                            min: json_vec3(&min)?,
                            max: json_vec3(&max)?,
                        })
                    });
                if let Some(prim_bounds) = accessor_bounds {
                    bounds = Some(match bounds {
                        Some(b) => b.union(prim_bounds),
                        None => prim_bounds,
                    });
                }
            }
        }
        primitive_count += primitives;
        nodes.push(AssetNode {
            name: node.name().map(str::to_string),
            depth,
            primitives,
        });

        let children: Vec<_> = node.children().collect();
        for child in children.into_iter().rev() {
            stack.push((child, depth + 1));
        }
    }

    if primitive_count == 0 {
        return Err(parse_error("no renderable primitives".to_string()));
    }

    Ok(SceneAsset {
        source: path.to_string(),
        nodes,
        primitive_count,
        vertex_count,
        bounds,
    })
}

/// Decode a base64 `data:` URI
fn decode_data_uri(uri: &str) -> Option<Vec<u8>> {
    let (meta, data) = uri.strip_prefix("data:")?.split_once(',')?;
    if !meta.ends_with(";base64") {
        return None;
    }
    base64::engine::general_purpose::STANDARD.decode(data).ok()
}

/// Resolve a relative URI against the directory of `path`
fn sibling_path(path: &str, uri: &str) -> String {
    let uri = percent_decode(uri);
    match path.rfind('/') {
        Some(i) => format!("{}{}", &path[..=i], uri),
        None => uri,
    }
}

fn percent_decode(uri: &str) -> String {
    let bytes = uri.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' && i + 2 < bytes.len() {
            if let Some(byte) = std::str::from_utf8(&bytes[i + 1..i + 3])
                .ok()
                .and_then(|hex| u8::from_str_radix(hex, 16).ok())
            {
                out.push(byte);
                i += 3;
                continue;
            }
        }
        out.push(bytes[i]);
        i += 1;
    }
    String::from_utf8_lossy(&out).into_owned()
}

fn json_vec3(value: &gltf::json::Value) -> Option<[f32; 3]> {
    match value.as_array()?.as_slice() {
        [x, y, z] => Some([x.as_f64()? as f32, y.as_f64()? as f32, z.as_f64()? as f32]),
        _ => None,
    }
}

pub type LoadOutcome = Result<Arc<SceneAsset>, AssetLoadError>;

enum Slot {
    Pending(watch::Receiver<Option<LoadOutcome>>),
    Ready(Arc<SceneAsset>),
}

struct LoaderInner {
    source: Arc<dyn AssetSource>,
    slots: Mutex<HashMap<String, Slot>>,
    fetches: AtomicUsize,
}

/// Memoizing asset loader. Cheap to clone; clones share one cache.
#[derive(Clone)]
pub struct AssetLoader {
    inner: Arc<LoaderInner>,
}

impl AssetLoader {
    pub fn new(source: impl AssetSource) -> Self {
        Self {
            inner: Arc::new(LoaderInner {
                source: Arc::new(source),
                slots: Mutex::new(HashMap::new()),
                fetches: AtomicUsize::new(0),
            }),
        }
    }

    /// Load state for `path`, `None` if it was never requested or its last
    /// load failed
    pub fn state(&self, path: &str) -> Option<LoadState> {
        self.inner.slots.lock().get(path).map(|slot| match slot {
            Slot::Pending(_) => LoadState::Pending,
            Slot::Ready(_) => LoadState::Ready,
        })
    }

    /// Cached asset for `path`, if it finished loading
    pub fn get(&self, path: &str) -> Option<Arc<SceneAsset>> {
        match self.inner.slots.lock().get(path) {
            Some(Slot::Ready(asset)) => Some(Arc::clone(asset)),
            _ => None,
        }
    }

    /// Number of underlying fetches started so far
    pub fn fetch_count(&self) -> usize {
        self.inner.fetches.load(Ordering::SeqCst)
    }

    /// Load `path`, reusing a cached or in-flight result.
    ///
    /// Must be called from within a tokio runtime.
    pub async fn load(&self, path: &str) -> LoadOutcome {
        let mut rx = {
            let mut slots = self.inner.slots.lock();
            match slots.get(path) {
                Some(Slot::Ready(asset)) => return Ok(Arc::clone(asset)),
                Some(Slot::Pending(rx)) => rx.clone(),
                None => {
                    let (tx, rx) = watch::channel(None);
                    slots.insert(path.to_string(), Slot::Pending(rx.clone()));
                    self.start_fetch(path.to_string(), tx);
                    rx
                }
            }
        };

        let settled = rx
            .wait_for(Option::is_some)
            .await
            .map(|outcome| outcome.clone());
        match settled {
            Ok(Some(outcome)) => outcome,
            _ => Err(AssetLoadError::Unreadable {
                path: path.to_string(),
                message: "loader task ended without a result".to_string(),
            }),
        }
    }

    fn start_fetch(&self, path: String, tx: watch::Sender<Option<LoadOutcome>>) {
        self.inner.fetches.fetch_add(1, Ordering::SeqCst);
        let inner = Arc::clone(&self.inner);

        tokio::spawn(async move {
            debug!(path = %path, "Fetching asset");
            let source = Arc::clone(&inner.source);
            let task_path = path.clone();
            let joined = tokio::task::spawn_blocking(move || {
                let bytes = source.read(&task_path)?;
                parse_scene(&task_path, &bytes, source.as_ref())
            })
            .await;

            let outcome = match joined {
                Ok(result) => result.map(Arc::new),
                Err(e) => Err(AssetLoadError::Unreadable {
                    path: path.clone(),
                    message: e.to_string(),
                }),
            };

            {
                let mut slots = inner.slots.lock();
                match &outcome {
                    Ok(asset) => {
                        info!(
                            path = %path,
                            nodes = asset.nodes().len(),
                            primitives = asset.primitive_count(),
                            "Asset loaded"
                        );
                        slots.insert(path.clone(), Slot::Ready(Arc::clone(asset)));
                    }
                    Err(e) => {
                        error!(path = %path, error = %e, "Asset load failed");
                        slots.remove(&path);
                    }
                }
            }

            tx.send_replace(Some(outcome));
        });
    }
}
