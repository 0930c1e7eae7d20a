//! Byte sources for buffer and image URIs
//!
//! The codec never touches the file system or network itself; every
//! non-embedded URI goes through a [`Storage`]. Concurrent loads of the same
//! URI share one fetch through [`LoadCache`]. A `.zip` archive is its own
//! storage: [`ZipStorage`] serves the side files packed next to the `.gltf`.

use std::future::Future;
use std::io::{Cursor, Read};
use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use hashbrown::HashMap;
use tokio::sync::OnceCell;

use crate::error::{GltfError, Result};

/// Shared immutable bytes
pub type Bytes = Arc<[u8]>;

/// Progress callback receiving a fraction in `[0, 1]`
pub type Progress<'a> = &'a (dyn Fn(f32) + Sync);

/// Progress callback that ignores updates
pub fn no_progress(_: f32) {}

/// Decode a `data:<mime>;base64,<payload>` URI
pub fn decode_data_uri(uri: &str) -> Result<Vec<u8>> {
    let rest = uri
        .strip_prefix("data:")
        .ok_or_else(|| GltfError::InvalidDataUri(truncate_uri(uri)))?;
    let (header, payload) = rest
        .split_once(',')
        .ok_or_else(|| GltfError::InvalidDataUri(truncate_uri(uri)))?;
    if !header.ends_with(";base64") {
        return Err(GltfError::InvalidDataUri(truncate_uri(uri)));
    }
    Ok(STANDARD.decode(payload)?)
}

/// MIME type declared by a data URI
pub fn data_uri_mime(uri: &str) -> Option<&str> {
    let header = uri.strip_prefix("data:")?.split_once(',')?.0;
    let mime = header.split(';').next()?;
    (!mime.is_empty()).then_some(mime)
}

pub fn encode_data_uri(mime: &str, bytes: &[u8]) -> String {
    format!("data:{};base64,{}", mime, STANDARD.encode(bytes))
}

fn truncate_uri(uri: &str) -> String {
    uri.chars().take(48).collect()
}

fn utf8(uri: &str, bytes: &[u8]) -> Result<String> {
    String::from_utf8(bytes.to_vec()).map_err(|e| GltfError::Storage {
        uri: uri.to_string(),
        message: e.to_string(),
    })
}

/// Source of bytes for URIs referenced by a document
pub trait Storage: Send + Sync {
    /// Bytes available without I/O (embedded data, GLB chunk, cache hits)
    fn get_binary(&self, uri: &str) -> Option<Bytes>;

    fn get_string(&self, uri: &str) -> Option<String> {
        self.get_binary(uri).and_then(|bytes| utf8(uri, &bytes).ok())
    }

    /// Fetch bytes, reporting progress while the load is in flight
    fn load_binary(
        &self,
        uri: &str,
        progress: Progress<'_>,
    ) -> impl Future<Output = Result<Bytes>> + Send;

    fn load_string(
        &self,
        uri: &str,
        progress: Progress<'_>,
    ) -> impl Future<Output = Result<String>> + Send {
        async move {
            let bytes = self.load_binary(uri, progress).await?;
            utf8(uri, &bytes)
        }
    }

    /// Local file backing a URI, if there is one
    fn get_path(&self, uri: &str) -> Option<PathBuf>;
}

/// Coalesces concurrent loads per URI and keeps successful results.
/// Failed loads are not cached; the next caller retries.
#[derive(Debug, Default)]
pub struct LoadCache {
    entries: Mutex<HashMap<String, Arc<OnceCell<Bytes>>>>,
}

impl LoadCache {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, Arc<OnceCell<Bytes>>>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Completed result for `uri`, if any
    pub fn peek(&self, uri: &str) -> Option<Bytes> {
        self.lock().get(uri).and_then(|cell| cell.get().cloned())
    }

    /// Return the cached bytes, join an in-flight load, or run `load`
    pub async fn get_or_load<F, Fut>(&self, uri: &str, load: F) -> Result<Bytes>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Bytes>>,
    {
        let cell = {
            let mut entries = self.lock();
            match entries.get(uri) {
                Some(cell) => Arc::clone(cell),
                None => {
                    let cell = Arc::new(OnceCell::new());
                    entries.insert(uri.to_string(), Arc::clone(&cell));
                    cell
                }
            }
        };
        cell.get_or_try_init(load).await.cloned()
    }

    pub fn len(&self) -> usize {
        self.lock().values().filter(|cell| cell.initialized()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// In-memory storage: the GLB binary chunk plus named entries
#[derive(Debug, Default)]
pub struct MemoryStorage {
    bin: Option<Bytes>,
    entries: HashMap<String, Bytes>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Storage whose empty URI resolves to a GLB binary chunk
    pub fn with_glb_bin(bin: impl Into<Bytes>) -> Self {
        Self {
            bin: Some(bin.into()),
            entries: HashMap::new(),
        }
    }

    pub fn insert(&mut self, uri: impl Into<String>, bytes: impl Into<Bytes>) {
        self.entries.insert(uri.into(), bytes.into());
    }
}

impl Storage for MemoryStorage {
    fn get_binary(&self, uri: &str) -> Option<Bytes> {
        if uri.is_empty() {
            return self.bin.clone();
        }
        if uri.starts_with("data:") {
            return decode_data_uri(uri).ok().map(Bytes::from);
        }
        self.entries.get(uri).cloned()
    }

    async fn load_binary(&self, uri: &str, progress: Progress<'_>) -> Result<Bytes> {
        tokio::task::yield_now().await;
        let bytes = if uri.starts_with("data:") {
            Bytes::from(decode_data_uri(uri)?)
        } else {
            self.get_binary(uri).ok_or_else(|| GltfError::Storage {
                uri: uri.to_string(),
                message: "not found".to_string(),
            })?
        };
        progress(1.0);
        Ok(bytes)
    }

    fn get_path(&self, _uri: &str) -> Option<PathBuf> {
        None
    }
}

/// Storage rooted at a directory, read with `tokio::fs`
#[derive(Debug)]
pub struct FileSystemStorage {
    root: PathBuf,
    cache: LoadCache,
}

impl FileSystemStorage {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            cache: LoadCache::new(),
        }
    }

    pub fn root(&self) -> &std::path::Path {
        &self.root
    }

    pub fn cache(&self) -> &LoadCache {
        &self.cache
    }
}

impl Storage for FileSystemStorage {
    fn get_binary(&self, uri: &str) -> Option<Bytes> {
        if uri.starts_with("data:") {
            return decode_data_uri(uri).ok().map(Bytes::from);
        }
        self.cache.peek(uri)
    }

    async fn load_binary(&self, uri: &str, progress: Progress<'_>) -> Result<Bytes> {
        if uri.starts_with("data:") {
            return Ok(Bytes::from(decode_data_uri(uri)?));
        }
        let path = self.root.join(uri);
        let bytes = self
            .cache
            .get_or_load(uri, || async {
                progress(0.0);
                tracing::debug!("reading {}", path.display());
                let data = tokio::fs::read(&path).await.map_err(|e| GltfError::Storage {
                    uri: uri.to_string(),
                    message: format!("{}: {}", path.display(), e),
                })?;
                Ok(Bytes::from(data))
            })
            .await?;
        progress(1.0);
        Ok(bytes)
    }

    fn get_path(&self, uri: &str) -> Option<PathBuf> {
        (!uri.starts_with("data:")).then(|| self.root.join(uri))
    }
}

/// Storage over the entries of a `.zip` archive, read up front.
///
/// URIs resolve against the directory of the first `.gltf` entry, then
/// against the archive root.
#[derive(Debug, Default)]
pub struct ZipStorage {
    entries: HashMap<String, Bytes>,
    gltf: Option<String>,
}

impl ZipStorage {
    pub fn parse(bytes: &[u8]) -> Result<Self> {
        let mut archive = zip::ZipArchive::new(Cursor::new(bytes))?;
        let mut storage = Self::default();
        for index in 0..archive.len() {
            let mut entry = archive.by_index(index)?;
            if entry.is_dir() {
                continue;
            }
            let name = entry.name().to_string();
            let mut data = Vec::new();
            entry.read_to_end(&mut data)?;

            if storage.gltf.is_none() && name.to_ascii_lowercase().ends_with(".gltf") {
                storage.gltf = Some(name.clone());
            }
            tracing::trace!("zip entry {}: {} bytes", name, data.len());
            storage.entries.insert(name, Bytes::from(data));
        }
        tracing::debug!("read {} zip entries", storage.entries.len());
        Ok(storage)
    }

    /// Name and contents of the first `.gltf` entry in archive order
    pub fn gltf_entry(&self) -> Result<(&str, Bytes)> {
        self.gltf
            .as_deref()
            .and_then(|name| Some((name, self.entries.get(name)?.clone())))
            .ok_or_else(|| {
                GltfError::UnsupportedContainer("zip archive has no .gltf entry".to_string())
            })
    }

    fn entry(&self, uri: &str) -> Option<Bytes> {
        let uri = uri.strip_prefix("./").unwrap_or(uri);
        if let Some((dir, _)) = self.gltf.as_deref().and_then(|name| name.rsplit_once('/')) {
            if let Some(bytes) = self.entries.get(&format!("{dir}/{uri}")) {
                return Some(bytes.clone());
            }
        }
        self.entries.get(uri).cloned()
    }
}

impl Storage for ZipStorage {
    fn get_binary(&self, uri: &str) -> Option<Bytes> {
        if uri.starts_with("data:") {
            return decode_data_uri(uri).ok().map(Bytes::from);
        }
        self.entry(uri)
    }

    async fn load_binary(&self, uri: &str, progress: Progress<'_>) -> Result<Bytes> {
        tokio::task::yield_now().await;
        let bytes = if uri.starts_with("data:") {
            Bytes::from(decode_data_uri(uri)?)
        } else {
            self.entry(uri).ok_or_else(|| GltfError::Storage {
                uri: uri.to_string(),
                message: "not found in zip archive".to_string(),
            })?
        };
        progress(1.0);
        Ok(bytes)
    }

    fn get_path(&self, _uri: &str) -> Option<PathBuf> {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn archive(entries: &[(&str, &[u8])]) -> Vec<u8> {
        let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
        for (name, bytes) in entries {
            writer
                .start_file(*name, zip::write::SimpleFileOptions::default())
                .unwrap();
            writer.write_all(bytes).unwrap();
        }
        writer.finish().unwrap().into_inner()
    }

    #[test]
    fn test_decode_data_uri() {
        let uri = encode_data_uri("application/octet-stream", &[1, 2, 3, 250]);
        assert!(uri.starts_with("data:application/octet-stream;base64,"));
        assert_eq!(decode_data_uri(&uri).unwrap(), vec![1, 2, 3, 250]);
        assert_eq!(data_uri_mime(&uri), Some("application/octet-stream"));
    }

    #[test]
    fn test_decode_rejects_non_base64() {
        assert!(matches!(
            decode_data_uri("data:text/plain,hello"),
            Err(GltfError::InvalidDataUri(_))
        ));
        assert!(matches!(
            decode_data_uri("data:;base64,!!!"),
            Err(GltfError::Base64(_))
        ));
        assert!(decode_data_uri("file.bin").is_err());
    }

    #[test]
    fn test_memory_storage_glb_chunk() {
        let mut storage = MemoryStorage::with_glb_bin(vec![9u8, 8, 7]);
        storage.insert("side.bin", vec![1u8]);
        assert_eq!(storage.get_binary("").as_deref(), Some(&[9u8, 8, 7][..]));
        assert_eq!(storage.get_binary("side.bin").as_deref(), Some(&[1u8][..]));
        assert!(storage.get_binary("missing.bin").is_none());
        assert!(storage.get_path("side.bin").is_none());
    }

    #[tokio::test]
    async fn test_memory_storage_load_string() {
        let mut storage = MemoryStorage::new();
        storage.insert("scene.gltf", b"{}".to_vec());
        let text = storage.load_string("scene.gltf", &no_progress).await.unwrap();
        assert_eq!(text, "{}");
        assert!(storage.load_binary("nope", &no_progress).await.is_err());
    }

    #[tokio::test]
    async fn test_cache_coalesces_concurrent_loads() {
        let cache = LoadCache::new();
        let fetches = AtomicUsize::new(0);
        let load = || async {
            fetches.fetch_add(1, Ordering::SeqCst);
            for _ in 0..4 {
                tokio::task::yield_now().await;
            }
            Ok(Bytes::from(vec![42u8]))
        };

        let (a, b, c) = tokio::join!(
            cache.get_or_load("a.bin", load),
            cache.get_or_load("a.bin", load),
            cache.get_or_load("a.bin", load),
        );
        assert_eq!(&*a.unwrap(), &[42]);
        assert_eq!(&*b.unwrap(), &[42]);
        assert_eq!(&*c.unwrap(), &[42]);
        assert_eq!(fetches.load(Ordering::SeqCst), 1);
        assert_eq!(cache.len(), 1);
    }

    #[tokio::test]
    async fn test_cache_does_not_keep_failures() {
        let cache = LoadCache::new();
        let failed = cache
            .get_or_load("x", || async {
                Err(GltfError::Storage {
                    uri: "x".into(),
                    message: "offline".into(),
                })
            })
            .await;
        assert!(failed.is_err());
        assert!(cache.peek("x").is_none());

        let ok = cache
            .get_or_load("x", || async { Ok(Bytes::from(vec![1u8])) })
            .await
            .unwrap();
        assert_eq!(&*ok, &[1]);
        assert!(cache.peek("x").is_some());
    }

    #[tokio::test]
    async fn test_file_system_storage() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("mesh.bin"), [5u8, 6, 7]).unwrap();

        let storage = FileSystemStorage::new(dir.path());
        assert!(storage.get_binary("mesh.bin").is_none());

        let reported = std::sync::Mutex::new(Vec::new());
        let progress = |p: f32| reported.lock().unwrap().push(p);
        let bytes = storage.load_binary("mesh.bin", &progress).await.unwrap();
        assert_eq!(&*bytes, &[5, 6, 7]);
        assert_eq!(reported.lock().unwrap().last(), Some(&1.0));

        // Cached after the first load
        assert!(storage.get_binary("mesh.bin").is_some());
        assert_eq!(storage.get_path("mesh.bin"), Some(dir.path().join("mesh.bin")));
        assert_eq!(storage.get_path("data:;base64,AA=="), None);

        assert!(matches!(
            storage.load_binary("absent.bin", &no_progress).await,
            Err(GltfError::Storage { .. })
        ));
    }

    #[tokio::test]
    async fn test_zip_storage_resolves_next_to_gltf() {
        let bytes = archive(&[
            ("readme.txt", b"hello".as_slice()),
            ("model/scene.gltf", b"{}".as_slice()),
            ("model/scene.bin", [1u8, 2, 3].as_slice()),
            ("shared.png", [0x89u8, b'P'].as_slice()),
        ]);
        let storage = ZipStorage::parse(&bytes).unwrap();

        let (name, json) = storage.gltf_entry().unwrap();
        assert_eq!(name, "model/scene.gltf");
        assert_eq!(&*json, b"{}");

        let bin = storage.load_binary("scene.bin", &no_progress).await.unwrap();
        assert_eq!(&*bin, &[1, 2, 3]);
        assert_eq!(storage.get_binary("./scene.bin").as_deref(), Some(&[1u8, 2, 3][..]));
        // Falls back to the archive root
        assert!(storage.get_binary("shared.png").is_some());
        assert!(storage.get_path("scene.bin").is_none());
        assert!(matches!(
            storage.load_binary("absent.bin", &no_progress).await,
            Err(GltfError::Storage { .. })
        ));
    }

    #[test]
    fn test_zip_without_gltf() {
        let storage = ZipStorage::parse(&archive(&[("scene.glb", b"glTF".as_slice())])).unwrap();
        assert!(matches!(
            storage.gltf_entry(),
            Err(GltfError::UnsupportedContainer(_))
        ));
        assert!(matches!(ZipStorage::parse(b"not a zip"), Err(GltfError::Zip(_))));
    }
}
