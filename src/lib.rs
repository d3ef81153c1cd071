//! scenedoc - document persistence and scene state for volume visualization
//!
//! Owns the canonical in-memory representation of a visualization session
//! (per-image load options, 3D scene state, drawing bitmap, labels, meshes and
//! connectomes) and converts it to and from a portable container.
//!
//! # Features
//!
//! - Observable scene state: camera changes notify a single observer slot
//! - Ordered load-option registries that stay consistent under removal
//! - JSON containers with base64-embedded volume and drawing payloads
//! - Optional whole-container gzip or zstd compression, detected on load
//! - Backward-compatible import (defaults for missing fields, legacy renames)
//! - Async save/load for local files and, with `http-client`, HTTP(S)
//!
//! Voxel decoding, mesh geometry and rendering stay with the caller, behind
//! the [`VolumeImage`], [`MeshSource`] and [`CollaboratorFactory`] traits.
//!
//! # Example
//!
//! ```rust,ignore
//! use scenedoc::{load, save, Document};
//!
//! # async fn example() -> scenedoc::Result<()> {
//! let mut doc = Document::new();
//! doc.scene_mut().set_azimuth(45.0);
//! save(&doc, "/tmp/session.nvd", true).await?;
//!
//! let restored = load("/tmp/session.nvd").await?;
//! assert_eq!(restored.scene().azimuth(), 45.0);
//! # Ok(())
//! # }
//! ```

pub mod compression;
pub mod container;
pub mod document;
pub mod error;
pub mod image;
pub mod import;
pub mod io;
pub mod label;
pub mod mesh;
pub mod options;
pub mod persistence;
pub mod registry;
pub mod scene;
pub mod structured;
pub mod types;
pub mod utils;

// Re-exports
pub use compression::{CompressionLevel, CompressionMethod, Compressor};
pub use container::{export, ExportContainer};
pub use document::{CollaboratorFactory, Document, ImportedPayloads};
pub use error::{DocumentError, Result};
pub use image::{ImageLoadOptions, ImageOptionsRegistry, VolumeImage};
pub use import::{import_from_bytes, import_from_str};
pub use io::{IOManager, StorageBackend};
pub use label::Label3D;
pub use mesh::{MeshLayer, MeshLoadOptions, MeshOptionsRegistry, MeshRecord, MeshSource};
pub use options::DocumentOptions;
pub use persistence::{load, save, save_with_config, to_bytes, PersistenceConfig};
pub use scene::{Scene, SceneData};
pub use types::{ImageId, ImageType, MeshId, MeshKind};

/// Version of the scenedoc implementation
pub const SCENEDOC_VERSION: &str = env!("CARGO_PKG_VERSION");
