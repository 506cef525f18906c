//! Minimal HTTP/1.1 support.
//!
//! Just enough HTTP to tell a WebSocket upgrade from a file request and to
//! answer the latter. There is no keep-alive: every response ends with
//! `Connection: close` and the stream is closed afterwards.
//!
//! # Architecture
//!
//! - **`parser`**: Parses a request head from a byte buffer
//! - **`request`**: HTTP request representation and header lookup
//! - **`response`**: Status codes, response builder and canned pages
//! - **`writer`**: Serializes responses and closes streams gracefully
//! - **`mime`**: MIME type detection based on file extensions
//! - **`static_files`**: Resolves a target under the content root and streams the file
//!
//! # Example
//!
//! ```ignore
//! use switchyard::http::static_files::StaticFiles;
//! use tokio::net::TcpListener;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let files = StaticFiles::on_disk("www", "switchyard");
//!     let listener = TcpListener::bind("127.0.0.1:8080").await?;
//!
//!     loop {
//!         let (socket, _addr) = listener.accept().await?;
//!         files.serve("/index.html", socket).await;
//!     }
//! }
//! ```

pub mod mime;
pub mod parser;
pub mod request;
pub mod response;
pub mod static_files;
pub mod writer;
