//! Save and load entry points
//!
//! Byte acquisition is asynchronous; decompression and parsing run
//! synchronously once the bytes have arrived. Neither operation supports
//! cancellation.

use crate::compression::{get_compressor, CompressionLevel, CompressionMethod};
use crate::container::export;
use crate::document::Document;
use crate::error::Result;
use crate::import::import_from_bytes;
use crate::io::create_io_manager;
use crate::utils::format_bytes;
use serde::{Deserialize, Serialize};

/// How a document is encoded when saved
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PersistenceConfig {
    /// Whole-container compression
    pub compression: CompressionMethod,

    /// Level used when `compression` is not `None`
    pub compression_level: CompressionLevel,

    /// Indent the JSON text
    pub pretty: bool,
}

impl PersistenceConfig {
    /// Plain config, or gzip at the default level when `compress` is set
    pub fn new(compress: bool) -> Self {
        let compression = if compress {
            CompressionMethod::Gzip
        } else {
            CompressionMethod::None
        };
        Self::default().with_compression(compression)
    }

    /// Set compression method
    pub fn with_compression(mut self, method: CompressionMethod) -> Self {
        self.compression = method;
        self
    }

    /// Set compression level
    pub fn with_compression_level(mut self, level: CompressionLevel) -> Self {
        self.compression_level = level;
        self
    }

    /// Set pretty printing
    pub fn with_pretty(mut self, pretty: bool) -> Self {
        self.pretty = pretty;
        self
    }

    /// Parse a config from JSON; missing fields take their defaults
    pub fn from_json(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }
}

/// Encode a document as container bytes
pub fn to_bytes(document: &Document, config: &PersistenceConfig) -> Result<Vec<u8>> {
    let text = export(document)?.to_json(config.pretty)?;
    let bytes = get_compressor(config.compression).compress(&text, config.compression_level)?;
    tracing::debug!(
        plain = %format_bytes(text.len()),
        stored = %format_bytes(bytes.len()),
        method = ?config.compression,
        "encoded container"
    );
    Ok(bytes)
}

/// Save a document, gzip-compressed when `compress` is set
pub async fn save(document: &Document, destination: &str, compress: bool) -> Result<()> {
    save_with_config(document, destination, &PersistenceConfig::new(compress)).await
}

/// Save a document with explicit encoding settings
pub async fn save_with_config(
    document: &Document,
    destination: &str,
    config: &PersistenceConfig,
) -> Result<()> {
    let bytes = to_bytes(document, config)?;
    let (io, path) = create_io_manager(destination)?;
    io.write(&path, &bytes).await?;
    tracing::info!(destination, size = %format_bytes(bytes.len()), "saved document");
    Ok(())
}

/// Load a document from a file path, `file://` or (with `http-client`) an
/// `http(s)://` locator
pub async fn load(source: &str) -> Result<Document> {
    let (io, path) = create_io_manager(source)?;
    let bytes = io.read(&path).await?;
    tracing::info!(source, size = %format_bytes(bytes.len()), "loading document");
    import_from_bytes(&bytes)
}
