//! The document aggregate - canonical state of a visualization session

use crate::error::{DocumentError, Result};
use crate::image::{ImageLoadOptions, ImageOptionsRegistry, VolumeImage};
use crate::label::Label3D;
use crate::mesh::{MeshLoadOptions, MeshOptionsRegistry, MeshRecord, MeshSource};
use crate::options::DocumentOptions;
use crate::scene::Scene;
use crate::types::{ImageId, ImageType, MeshId};
use crate::utils::decode_base64;
use serde_json::Value;
use std::fmt;
use std::sync::Arc;

/// Raw container payloads kept on an imported document until the caller
/// rebuilds live collaborators from them.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ImportedPayloads {
    /// Base64 volume payloads, positionally matching the image registry
    pub encoded_image_blobs: Vec<String>,
    pub encoded_drawing_blob: Option<String>,
    pub mesh_records: Vec<MeshRecord>,
    /// One JSON string per connectome
    pub connectomes: Vec<String>,
}

impl ImportedPayloads {
    pub fn is_empty(&self) -> bool {
        self.encoded_image_blobs.is_empty()
            && self.encoded_drawing_blob.is_none()
            && self.mesh_records.is_empty()
            && self.connectomes.is_empty()
    }
}

/// Factories that turn retained payloads back into live collaborators
pub trait CollaboratorFactory {
    /// Build a volume from a raw file payload. The volume must report `id`.
    fn create_volume(
        &self,
        id: ImageId,
        options: &ImageLoadOptions,
        raw: Vec<u8>,
    ) -> Result<Arc<dyn VolumeImage>>;

    /// Decode a drawing payload encoded on `base`'s grid into a voxel bitmap
    fn decode_drawing(&self, base: &dyn VolumeImage, raw: Vec<u8>) -> Result<Vec<u8>>;

    fn create_mesh(&self, record: &MeshRecord) -> Result<Arc<dyn MeshSource>>;

    fn create_connectome(&self, graph: Value) -> Result<Arc<dyn MeshSource>>;
}

/// In-memory session state.
///
/// The first volume is the base volume. A drawing bitmap, when present,
/// always has exactly the base volume's voxel count. Volumes and meshes are
/// shared with the caller; everything else is owned here.
#[derive(Default)]
pub struct Document {
    title: String,
    options: DocumentOptions,
    scene: Scene,
    volumes: Vec<Arc<dyn VolumeImage>>,
    meshes: Vec<Arc<dyn MeshSource>>,
    labels: Vec<Label3D>,
    drawing: Option<Vec<u8>>,
    image_options: ImageOptionsRegistry,
    mesh_options: MeshOptionsRegistry,
    preview_image_data_url: String,
    custom_data: String,
    payloads: ImportedPayloads,
}

impl Document {
    /// Create an empty document with default options and baseline scene
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    pub(crate) fn from_import(
        options: DocumentOptions,
        scene: Scene,
        labels: Vec<Label3D>,
        image_options: ImageOptionsRegistry,
        preview_image_data_url: String,
        custom_data: String,
        payloads: ImportedPayloads,
    ) -> Self {
        Self {
            options,
            scene,
            labels,
            image_options,
            preview_image_data_url,
            custom_data,
            payloads,
            ..Self::default()
        }
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn set_title(&mut self, title: impl Into<String>) {
        self.title = title.into();
    }

    pub fn options(&self) -> &DocumentOptions {
        &self.options
    }

    pub fn options_mut(&mut self) -> &mut DocumentOptions {
        &mut self.options
    }

    /// Replace the options wholesale
    pub fn set_options(&mut self, options: DocumentOptions) {
        self.options = options;
    }

    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    pub fn scene_mut(&mut self) -> &mut Scene {
        &mut self.scene
    }

    /// Register an image with its load options.
    ///
    /// Returns `false` without changing anything when an image with the same
    /// identifier is already registered. Otherwise fills the display name from
    /// the source locator when absent, tags the options as NIfTI, appends them
    /// to the registry and appends the image to the volume list.
    pub fn add_image(&mut self, image: Arc<dyn VolumeImage>, mut options: ImageLoadOptions) -> bool {
        let id = image.id();
        if self.image_options.contains(&id) {
            tracing::debug!(image = %id, "image already registered, ignoring");
            return false;
        }

        options.ensure_name();
        options.image_type = Some(ImageType::Nii);
        tracing::debug!(image = %id, name = %options.name, "registering image");
        self.image_options.insert(id, options);

        if !self.has_image(&id) {
            self.volumes.push(image);
        }
        true
    }

    /// Append a live volume without registering load options
    pub fn add_volume_unregistered(&mut self, image: Arc<dyn VolumeImage>) {
        if !self.has_image(&image.id()) {
            self.volumes.push(image);
        }
    }

    /// Unregister an image and drop it from the volume list.
    ///
    /// Removing the base volume also discards the drawing, which was defined
    /// on its grid.
    pub fn remove_image(&mut self, id: &ImageId) -> Option<ImageLoadOptions> {
        let removed = self.image_options.remove(id);
        let was_base = self.base_volume().map(|v| v.id()) == Some(*id);
        self.volumes.retain(|v| v.id() != *id);
        if was_base && self.drawing.take().is_some() {
            tracing::debug!(image = %id, "base volume removed, discarding drawing");
        }
        removed
    }

    /// Load options registered for an image
    pub fn image_options(&self, id: &ImageId) -> Option<&ImageLoadOptions> {
        self.image_options.get(id)
    }

    /// Modify the load options registered for an image
    pub fn update_image_options<F>(&mut self, id: &ImageId, f: F) -> Result<()>
    where
        F: FnOnce(&mut ImageLoadOptions),
    {
        self.image_options.update(id, f)
    }

    pub fn image_registry(&self) -> &ImageOptionsRegistry {
        &self.image_options
    }

    /// Whether a live volume with this identifier is loaded
    pub fn has_image(&self, id: &ImageId) -> bool {
        self.volumes.iter().any(|v| v.id() == *id)
    }

    /// Whether any registered image was loaded from `url`
    pub fn has_image_from_source(&self, url: &str) -> bool {
        self.image_options.values().any(|o| o.url == url)
    }

    pub fn volumes(&self) -> &[Arc<dyn VolumeImage>] {
        &self.volumes
    }

    pub fn base_volume(&self) -> Option<&Arc<dyn VolumeImage>> {
        self.volumes.first()
    }

    /// Refresh every registered record from its live volume
    pub fn sync_display_state(&mut self) {
        for volume in &self.volumes {
            if let Some(options) = self.image_options.get_mut(&volume.id()) {
                options.apply_display_state(volume.as_ref());
            }
        }
    }

    /// Register a mesh with its load options. Returns `false` if already present.
    pub fn add_mesh(&mut self, mesh: Arc<dyn MeshSource>, options: MeshLoadOptions) -> bool {
        let id = mesh.id();
        if self.mesh_options.contains(&id) {
            tracing::debug!(mesh = %id, "mesh already registered, ignoring");
            return false;
        }
        self.mesh_options.insert(id, options);
        if !self.has_mesh(&id) {
            self.meshes.push(mesh);
        }
        true
    }

    pub fn remove_mesh(&mut self, id: &MeshId) -> Option<MeshLoadOptions> {
        self.meshes.retain(|m| m.id() != *id);
        self.mesh_options.remove(id)
    }

    pub fn mesh_options(&self, id: &MeshId) -> Option<&MeshLoadOptions> {
        self.mesh_options.get(id)
    }

    pub fn update_mesh_options<F>(&mut self, id: &MeshId, f: F) -> Result<()>
    where
        F: FnOnce(&mut MeshLoadOptions),
    {
        self.mesh_options.update(id, f)
    }

    pub fn has_mesh(&self, id: &MeshId) -> bool {
        self.meshes.iter().any(|m| m.id() == *id)
    }

    pub fn meshes(&self) -> &[Arc<dyn MeshSource>] {
        &self.meshes
    }

    pub fn labels(&self) -> &[Label3D] {
        &self.labels
    }

    pub fn add_label(&mut self, label: Label3D) {
        self.labels.push(label);
    }

    pub fn remove_label(&mut self, index: usize) -> Option<Label3D> {
        (index < self.labels.len()).then(|| self.labels.remove(index))
    }

    /// Drawing bitmap on the base volume's grid
    pub fn drawing(&self) -> Option<&[u8]> {
        self.drawing.as_deref()
    }

    /// Attach a drawing bitmap. It must match the base volume's voxel count.
    pub fn set_drawing(&mut self, bitmap: Vec<u8>) -> Result<()> {
        let base = self.base_volume().ok_or_else(|| {
            DocumentError::InvalidDimensions("a drawing requires a base volume".to_string())
        })?;
        let expected = base.voxel_count();
        if bitmap.len() != expected {
            return Err(DocumentError::InvalidDimensions(format!(
                "drawing has {} voxels, base volume has {}",
                bitmap.len(),
                expected
            )));
        }
        self.drawing = Some(bitmap);
        Ok(())
    }

    pub fn clear_drawing(&mut self) -> Option<Vec<u8>> {
        self.drawing.take()
    }

    pub fn preview_image_data_url(&self) -> &str {
        &self.preview_image_data_url
    }

    pub fn set_preview_image(&mut self, data_url: impl Into<String>) {
        self.preview_image_data_url = data_url.into();
    }

    pub fn custom_data(&self) -> &str {
        &self.custom_data
    }

    pub fn set_custom_data(&mut self, data: impl Into<String>) {
        self.custom_data = data.into();
    }

    /// Payloads retained from an import that have not been rehydrated yet
    pub fn payloads(&self) -> &ImportedPayloads {
        &self.payloads
    }

    /// Rebuild live volumes, the drawing, meshes and connectomes from the
    /// payloads retained by an import.
    ///
    /// Nothing is committed unless every payload decodes. On success the
    /// retained payloads are released.
    pub fn rehydrate(&mut self, factory: &dyn CollaboratorFactory) -> Result<()> {
        let blobs = &self.payloads.encoded_image_blobs;
        if blobs.len() != self.image_options.len() {
            return Err(DocumentError::InvalidShape(format!(
                "{} image payloads for {} load option records",
                blobs.len(),
                self.image_options.len()
            )));
        }

        let mut volumes = Vec::with_capacity(blobs.len());
        for ((id, options), blob) in self.image_options.iter().zip(blobs) {
            let raw = decode_base64(blob)?;
            let volume = factory.create_volume(*id, options, raw)?;
            if volume.id() != *id {
                return Err(DocumentError::InvalidShape(format!(
                    "factory returned volume {} for record {}",
                    volume.id(),
                    id
                )));
            }
            volumes.push(volume);
        }

        let drawing = match (&self.payloads.encoded_drawing_blob, volumes.first()) {
            (Some(blob), Some(base)) => {
                let bitmap = factory.decode_drawing(base.as_ref(), decode_base64(blob)?)?;
                if bitmap.len() != base.voxel_count() {
                    return Err(DocumentError::InvalidDimensions(format!(
                        "drawing has {} voxels, base volume has {}",
                        bitmap.len(),
                        base.voxel_count()
                    )));
                }
                Some(bitmap)
            }
            (Some(_), None) => {
                tracing::warn!("drawing payload without any volume, discarding");
                None
            }
            (None, _) => None,
        };

        let mut meshes = Vec::new();
        for record in &self.payloads.mesh_records {
            let mesh = factory.create_mesh(record)?;
            let options = MeshLoadOptions {
                name: record.name.clone(),
                opacity: record.opacity,
                visible: record.visible,
                ..MeshLoadOptions::default()
            };
            meshes.push((mesh, options));
        }
        for text in &self.payloads.connectomes {
            let graph: Value = serde_json::from_str(text)?;
            let mesh = factory.create_connectome(graph)?;
            let options = MeshLoadOptions {
                name: mesh.name(),
                ..MeshLoadOptions::default()
            };
            meshes.push((mesh, options));
        }

        tracing::debug!(
            volumes = volumes.len(),
            meshes = meshes.len(),
            drawing = drawing.is_some(),
            "rehydrated document"
        );
        self.volumes = volumes;
        self.drawing = drawing;
        for (mesh, options) in meshes {
            self.add_mesh(mesh, options);
        }
        self.payloads = ImportedPayloads::default();
        Ok(())
    }
}

impl fmt::Debug for Document {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Document")
            .field("title", &self.title)
            .field("volumes", &self.volumes.len())
            .field("meshes", &self.meshes.len())
            .field("labels", &self.labels.len())
            .field("drawing", &self.drawing.as_ref().map(Vec::len))
            .field("image_options", &self.image_options)
            .field("scene", &self.scene)
            .finish()
    }
}
