//! I/O managers for the locations containers are read from and written to

use crate::error::{DocumentError, Result};
use async_trait::async_trait;
use bytes::Bytes;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;

/// Storage backend types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageBackend {
    /// Local file system
    FileSystem,
    /// Read-only HTTP(S) location
    Http,
}

impl StorageBackend {
    /// Parse storage backend from URL scheme
    pub fn from_url(url: &str) -> Result<Self> {
        if let Some(scheme_end) = url.find("://") {
            let scheme = &url[..scheme_end];
            match scheme {
                "file" => Ok(StorageBackend::FileSystem),
                "http" | "https" => Ok(StorageBackend::Http),
                _ => Err(DocumentError::InvalidUrl(format!("Unknown scheme: {}", scheme))),
            }
        } else {
            // Assume file system if no scheme
            Ok(StorageBackend::FileSystem)
        }
    }
}

/// Trait for byte-level access to a storage location
#[async_trait]
pub trait IOManager: Send + Sync {
    /// Read data from a path
    async fn read(&self, path: &str) -> Result<Bytes>;

    /// Write data to a path
    async fn write(&self, path: &str, data: &[u8]) -> Result<()>;

    /// Check if a path exists
    async fn exists(&self, path: &str) -> Result<bool>;

    /// Delete data at a path
    async fn delete(&self, path: &str) -> Result<()>;

    /// Get the size of data at a path
    async fn size(&self, path: &str) -> Result<usize>;

    /// Get the backend type
    fn backend(&self) -> StorageBackend;
}

/// File system I/O manager
pub struct FileSystemIOManager {
    base_path: PathBuf,
}

impl FileSystemIOManager {
    /// Create a new file system I/O manager
    pub fn new(base_path: impl AsRef<Path>) -> Self {
        Self {
            base_path: base_path.as_ref().to_path_buf(),
        }
    }

    /// Get the full path for a relative path
    fn full_path(&self, path: &str) -> PathBuf {
        self.base_path.join(path)
    }
}

#[async_trait]
impl IOManager for FileSystemIOManager {
    async fn read(&self, path: &str) -> Result<Bytes> {
        let full_path = self.full_path(path);
        let data = fs::read(&full_path).await.map_err(DocumentError::Io)?;
        Ok(Bytes::from(data))
    }

    async fn write(&self, path: &str, data: &[u8]) -> Result<()> {
        let full_path = self.full_path(path);

        // Create parent directories if they don't exist
        if let Some(parent) = full_path.parent() {
            fs::create_dir_all(parent).await.map_err(DocumentError::Io)?;
        }

        let mut file = fs::File::create(&full_path).await.map_err(DocumentError::Io)?;
        file.write_all(data).await.map_err(DocumentError::Io)?;
        file.flush().await.map_err(DocumentError::Io)?;
        Ok(())
    }

    async fn exists(&self, path: &str) -> Result<bool> {
        Ok(fs::try_exists(self.full_path(path)).await?)
    }

    async fn delete(&self, path: &str) -> Result<()> {
        let full_path = self.full_path(path);
        fs::remove_file(&full_path).await.map_err(DocumentError::Io)?;
        Ok(())
    }

    async fn size(&self, path: &str) -> Result<usize> {
        let full_path = self.full_path(path);
        let metadata = fs::metadata(&full_path).await.map_err(DocumentError::Io)?;
        Ok(metadata.len() as usize)
    }

    fn backend(&self) -> StorageBackend {
        StorageBackend::FileSystem
    }
}

/// Read-only HTTP(S) I/O manager. Paths are full URLs.
#[cfg(feature = "http-client")]
pub struct HttpIOManager {
    client: reqwest::Client,
}

#[cfg(feature = "http-client")]
impl HttpIOManager {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
        }
    }

    async fn get(&self, url: &str) -> Result<reqwest::Response> {
        self.send(self.client.get(url), url).await
    }

    async fn head(&self, url: &str) -> Result<reqwest::Response> {
        self.send(self.client.head(url), url).await
    }

    async fn send(
        &self,
        request: reqwest::RequestBuilder,
        url: &str,
    ) -> Result<reqwest::Response> {
        let response = request
            .send()
            .await
            .map_err(|e| DocumentError::Network(e.to_string()))?;
        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Err(DocumentError::NotFound(url.to_string()));
        }
        response
            .error_for_status()
            .map_err(|e| DocumentError::Network(e.to_string()))
    }
}

#[cfg(feature = "http-client")]
impl Default for HttpIOManager {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(feature = "http-client")]
#[async_trait]
impl IOManager for HttpIOManager {
    async fn read(&self, path: &str) -> Result<Bytes> {
        self.get(path)
            .await?
            .bytes()
            .await
            .map_err(|e| DocumentError::Network(e.to_string()))
    }

    async fn write(&self, path: &str, _data: &[u8]) -> Result<()> {
        Err(DocumentError::Unsupported(format!(
            "cannot write to HTTP location {}",
            path
        )))
    }

    async fn exists(&self, path: &str) -> Result<bool> {
        match self.head(path).await {
            Ok(_) => Ok(true),
            Err(DocumentError::NotFound(_)) => Ok(false),
            Err(e) => Err(e),
        }
    }

    async fn delete(&self, path: &str) -> Result<()> {
        Err(DocumentError::Unsupported(format!(
            "cannot delete HTTP location {}",
            path
        )))
    }

    async fn size(&self, path: &str) -> Result<usize> {
        let response = self.head(path).await?;
        match declared_length(response.headers()) {
            Some(length) => Ok(length),
            // no length header, fall back to fetching the body
            None => Ok(self.read(path).await?.len()),
        }
    }

    fn backend(&self) -> StorageBackend {
        StorageBackend::Http
    }
}

/// Body length announced by a `Content-Length` header.
///
/// Read from the header itself: `Response::content_length` reports the body
/// size hint, which is zero for a HEAD response.
#[cfg(feature = "http-client")]
fn declared_length(headers: &reqwest::header::HeaderMap) -> Option<usize> {
    headers
        .get(reqwest::header::CONTENT_LENGTH)?
        .to_str()
        .ok()?
        .trim()
        .parse()
        .ok()
}

/// Parse a locator and create the I/O manager that serves it.
///
/// Returns the manager and the path to hand to it.
pub fn create_io_manager(url: &str) -> Result<(Box<dyn IOManager>, String)> {
    let backend = StorageBackend::from_url(url)?;

    match backend {
        StorageBackend::FileSystem => {
            // Extract path from file:// URL or use as-is
            let path = url.strip_prefix("file://").unwrap_or(url);
            Ok((Box::new(FileSystemIOManager::new("")), path.to_string()))
        }
        #[cfg(feature = "http-client")]
        StorageBackend::Http => Ok((Box::new(HttpIOManager::new()), url.to_string())),
        #[cfg(not(feature = "http-client"))]
        StorageBackend::Http => Err(DocumentError::Configuration(
            "HTTP locations require the `http-client` feature".to_string(),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_file_system_io() {
        let temp_dir = TempDir::new().unwrap();
        let io = FileSystemIOManager::new(temp_dir.path());

        // Write
        let data = b"{\"opts\":{}}";
        io.write("sessions/test.nvd", data).await.unwrap();

        // Read
        let read_data = io.read("sessions/test.nvd").await.unwrap();
        assert_eq!(&read_data[..], data);

        // Exists
        assert!(io.exists("sessions/test.nvd").await.unwrap());
        assert!(!io.exists("nonexistent.nvd").await.unwrap());

        // Size
        assert_eq!(io.size("sessions/test.nvd").await.unwrap(), data.len());

        // Delete
        io.delete("sessions/test.nvd").await.unwrap();
        assert!(!io.exists("sessions/test.nvd").await.unwrap());
    }

    #[test]
    fn test_backend_from_url() {
        assert_eq!(
            StorageBackend::from_url("file:///data/session.nvd").unwrap(),
            StorageBackend::FileSystem
        );
        assert_eq!(
            StorageBackend::from_url("/data/session.nvd").unwrap(),
            StorageBackend::FileSystem
        );
        assert_eq!(
            StorageBackend::from_url("https://example.org/session.nvd").unwrap(),
            StorageBackend::Http
        );
        assert!(StorageBackend::from_url("s3://bucket/session.nvd").is_err());
    }

    #[cfg(feature = "http-client")]
    #[test]
    fn test_declared_length() {
        use reqwest::header::{HeaderMap, HeaderValue, CONTENT_LENGTH};

        let mut headers = HeaderMap::new();
        assert_eq!(declared_length(&headers), None);
        headers.insert(CONTENT_LENGTH, HeaderValue::from_static("2048"));
        assert_eq!(declared_length(&headers), Some(2048));
        headers.insert(CONTENT_LENGTH, HeaderValue::from_static("many"));
        assert_eq!(declared_length(&headers), None);
    }

    #[test]
    fn test_create_io_manager_strips_file_scheme() {
        let (io, path) = create_io_manager("file:///tmp/session.nvd").unwrap();
        assert_eq!(io.backend(), StorageBackend::FileSystem);
        assert_eq!(path, "/tmp/session.nvd");
    }
}
