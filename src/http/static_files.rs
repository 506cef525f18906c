//! Static file responder.
//!
//! Maps a request target to a file under the content root and answers with
//! a complete HTTP/1.1 response. Nothing escapes [`StaticFiles::serve`]: a
//! missing file becomes a 404, a storage failure a 500, and the stream is
//! closed on every path.
//!
//! Traversal policy: targets are resolved segment by segment and any `.` or
//! `..` segment, backslash or NUL byte is answered with 404. The resolved
//! file is always a direct child of a directory below the root, and its
//! name must appear in that directory's listing.

use std::future::Future;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader};
use tracing::{debug, info, warn};

use crate::http::mime;
use crate::http::response::{Response, StatusCode};
use crate::http::writer::{ResponseWriter, close_gracefully};

/// Local storage as seen by the responder.
pub trait Storage {
    type Reader: AsyncBufRead + Unpin;

    /// Names of the regular files directly inside `dir`.
    fn list(&self, dir: &Path) -> impl Future<Output = io::Result<Vec<String>>>;

    /// Size of the file at `path` in bytes.
    fn size(&self, path: &Path) -> impl Future<Output = io::Result<u64>>;

    /// Opens the file at `path` for buffered reading.
    fn open(&self, path: &Path) -> impl Future<Output = io::Result<Self::Reader>>;
}

/// [`Storage`] backed by the local filesystem.
#[derive(Debug, Clone, Copy, Default)]
pub struct DiskStorage;

impl Storage for DiskStorage {
    type Reader = BufReader<tokio::fs::File>;

    async fn list(&self, dir: &Path) -> io::Result<Vec<String>> {
        let mut entries = tokio::fs::read_dir(dir).await?;
        let mut names = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            if !entry.file_type().await?.is_file() {
                continue;
            }
            if let Ok(name) = entry.file_name().into_string() {
                names.push(name);
            }
        }
        Ok(names)
    }

    async fn size(&self, path: &Path) -> io::Result<u64> {
        Ok(tokio::fs::metadata(path).await?.len())
    }

    async fn open(&self, path: &Path) -> io::Result<Self::Reader> {
        Ok(BufReader::new(tokio::fs::File::open(path).await?))
    }
}

/// Why a request could not be answered with a file.
#[derive(Debug)]
pub enum ServeError {
    /// No such file under the root, or the target was rejected.
    NotFound,
    /// Storage failed before anything was written.
    Storage(io::Error),
    /// The response head is out; the connection can only be dropped.
    Interrupted(io::Error),
}

/// Serves files below `root` through a [`Storage`].
pub struct StaticFiles<S = DiskStorage> {
    storage: S,
    root: PathBuf,
    server_name: String,
    linger: Duration,
}

impl StaticFiles<DiskStorage> {
    pub fn on_disk(root: impl Into<PathBuf>, server_name: impl Into<String>) -> Self {
        Self::new(DiskStorage, root, server_name)
    }
}

impl<S: Storage> StaticFiles<S> {
    pub fn new(storage: S, root: impl Into<PathBuf>, server_name: impl Into<String>) -> Self {
        Self {
            storage,
            root: root.into(),
            server_name: server_name.into(),
            linger: Duration::from_millis(100),
        }
    }

    /// Sets how long the closing stream waits for the peer to hang up.
    pub fn with_linger(mut self, linger: Duration) -> Self {
        self.linger = linger;
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Answers `target` on `stream`, then closes the stream.
    ///
    /// Returns the status that was sent, or `None` when the connection broke
    /// before a complete response could be written.
    pub async fn serve<T>(&self, target: &str, mut stream: T) -> Option<StatusCode>
    where
        T: AsyncRead + AsyncWrite + Unpin,
    {
        let status = match self.respond(target, &mut stream).await {
            Ok(bytes) => {
                info!(path = %target, bytes, "Served file");
                Some(StatusCode::Ok)
            }
            Err(ServeError::NotFound) => {
                info!(path = %target, "File not found");
                self.send_page(Response::not_found(&self.server_name), &mut stream)
                    .await
            }
            Err(ServeError::Storage(e)) => {
                warn!(path = %target, error = %e, "Storage failure while serving");
                self.send_page(Response::internal_error(&self.server_name), &mut stream)
                    .await
            }
            Err(ServeError::Interrupted(e)) => {
                debug!(path = %target, error = %e, "Response interrupted");
                None
            }
        };

        close_gracefully(stream, self.linger).await;
        status
    }

    async fn send_page<T>(&self, page: Response, stream: &mut T) -> Option<StatusCode>
    where
        T: AsyncWrite + Unpin,
    {
        let status = page.status;
        ResponseWriter::new(&page)
            .write_to_stream(stream)
            .await
            .ok()
            .map(|_| status)
    }

    /// Writes a 200 response for `target`; returns the body size.
    async fn respond<T>(&self, target: &str, stream: &mut T) -> Result<u64, ServeError>
    where
        T: AsyncWrite + Unpin,
    {
        let segments = resolve_target(target).ok_or(ServeError::NotFound)?;
        let (&name, parents) = segments.split_last().ok_or(ServeError::NotFound)?;

        let dir = parents.iter().fold(self.root.clone(), |dir, s| dir.join(s));
        let listing = self.storage.list(&dir).await.map_err(|e| match e.kind() {
            // A file used as a directory, e.g. `/index.html/foo`.
            io::ErrorKind::NotFound | io::ErrorKind::NotADirectory => ServeError::NotFound,
            _ => ServeError::Storage(e),
        })?;
        if !listing.iter().any(|entry| entry.as_str() == name) {
            return Err(ServeError::NotFound);
        }

        let path = dir.join(name);
        let length = self.storage.size(&path).await.map_err(ServeError::Storage)?;
        let mut reader = self.storage.open(&path).await.map_err(ServeError::Storage)?;

        let head = Response::file_head(mime::from_path(name), length, &self.server_name);
        ResponseWriter::new(&head)
            .write_to_stream(stream)
            .await
            .map_err(ServeError::Interrupted)?;

        let sent = stream_lines(&mut reader, stream)
            .await
            .map_err(ServeError::Interrupted)?;
        Ok(sent)
    }
}

/// Copies `reader` to `stream` one line at a time.
///
/// A line longer than the reader's buffer is sent in buffer-sized pieces, so
/// memory use stays bounded whatever the file looks like.
async fn stream_lines<R, W>(reader: &mut R, stream: &mut W) -> io::Result<u64>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut sent = 0u64;
    loop {
        let chunk = reader.fill_buf().await?;
        if chunk.is_empty() {
            break;
        }
        let end = chunk
            .iter()
            .position(|&b| b == b'\n')
            .map_or(chunk.len(), |i| i + 1);
        stream.write_all(&chunk[..end]).await?;
        reader.consume(end);
        sent += end as u64;
    }
    stream.flush().await?;
    Ok(sent)
}

/// Splits a request target into path segments relative to the content root.
///
/// Drops the query and fragment, maps `""` and `"/"` to `index.html` (as
/// well as any target ending in `/`), and returns `None` for targets that
/// try to leave the root.
pub fn resolve_target(target: &str) -> Option<Vec<&str>> {
    let path = target.split(['?', '#']).next().unwrap_or("");

    let mut segments = Vec::new();
    for segment in path.split('/') {
        match segment {
            "" => continue,
            "." | ".." => return None,
            s if s.contains(['\\', '\0']) => return None,
            s => segments.push(s),
        }
    }

    if path.is_empty() || path.ends_with('/') {
        segments.push("index.html");
    }
    Some(segments)
}
