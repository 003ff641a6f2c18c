//! Upload payload sources
//!
//! [`ChunkSource`] abstracts where the bytes come from so the manager can
//! be driven by files on disk or in-memory buffers (small exports, tests)
//! alike. Sources are stateless between reads: a chunk is addressed by
//! offset, which is what lets a restarted session re-read from byte zero.

use std::io::SeekFrom;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::io::{AsyncReadExt, AsyncSeekExt};

/// A readable upload payload.
#[async_trait]
pub trait ChunkSource: Send + Sync {
    /// File name reported to the server at session creation.
    fn file_name(&self) -> &str;

    /// Content type checked against the allow-list and reported to the
    /// server.
    fn content_type(&self) -> &str;

    /// Total payload size in bytes.
    fn total_bytes(&self) -> u64;

    /// Read up to `max_len` bytes starting at `offset`.
    ///
    /// # Errors
    /// Returns the underlying I/O error.
    async fn read_chunk(&self, offset: u64, max_len: u64) -> std::io::Result<Vec<u8>>;
}

/// File-backed payload.
pub struct FileChunkSource {
    path: PathBuf,
    file_name: String,
    content_type: String,
    total_bytes: u64,
}

impl FileChunkSource {
    /// Open a file as an upload source.
    ///
    /// # Errors
    /// Returns error if the file cannot be inspected.
    pub async fn open(
        path: impl AsRef<Path>,
        content_type: impl Into<String>,
    ) -> std::io::Result<Self> {
        let path = path.as_ref().to_path_buf();
        let metadata = tokio::fs::metadata(&path).await?;
        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| "upload.bin".to_string());

        Ok(Self { path, file_name, content_type: content_type.into(), total_bytes: metadata.len() })
    }
}

#[async_trait]
impl ChunkSource for FileChunkSource {
    fn file_name(&self) -> &str {
        &self.file_name
    }

    fn content_type(&self) -> &str {
        &self.content_type
    }

    fn total_bytes(&self) -> u64 {
        self.total_bytes
    }

    async fn read_chunk(&self, offset: u64, max_len: u64) -> std::io::Result<Vec<u8>> {
        // Re-opened per read so the source stays shareable without a lock;
        // the manager reads sequentially, one chunk at a time.
        let mut file = tokio::fs::File::open(&self.path).await?;
        file.seek(SeekFrom::Start(offset)).await?;

        let remaining = self.total_bytes.saturating_sub(offset);
        let len = remaining.min(max_len) as usize;
        let mut buffer = vec![0u8; len];
        file.read_exact(&mut buffer).await?;
        Ok(buffer)
    }
}

/// In-memory payload, used by small callers and throughout the tests.
pub struct MemoryChunkSource {
    file_name: String,
    content_type: String,
    data: Vec<u8>,
}

impl MemoryChunkSource {
    #[must_use]
    pub fn new(
        file_name: impl Into<String>,
        content_type: impl Into<String>,
        data: Vec<u8>,
    ) -> Self {
        Self { file_name: file_name.into(), content_type: content_type.into(), data }
    }
}

#[async_trait]
impl ChunkSource for MemoryChunkSource {
    fn file_name(&self) -> &str {
        &self.file_name
    }

    fn content_type(&self) -> &str {
        &self.content_type
    }

    fn total_bytes(&self) -> u64 {
        self.data.len() as u64
    }

    async fn read_chunk(&self, offset: u64, max_len: u64) -> std::io::Result<Vec<u8>> {
        let start = offset as usize;
        if start > self.data.len() {
            return Err(std::io::Error::new(
                std::io::ErrorKind::UnexpectedEof,
                "chunk offset beyond end of payload",
            ));
        }
        let end = (start + max_len as usize).min(self.data.len());
        Ok(self.data[start..end].to_vec())
    }
}
