//! Export container - the portable wire representation of a document
//!
//! The container deliberately carries neither the document title nor any
//! image or mesh identifier. Payloads are associated with their load options
//! purely by array position.

use crate::document::Document;
use crate::error::Result;
use crate::image::{ImageLoadOptions, VolumeImage};
use crate::label::Label3D;
use crate::mesh::MeshRecord;
use crate::options::normalize_for_export;
use crate::scene::SceneData;
use crate::structured::to_structured_string;
use crate::types::{ImageType, MeshKind};
use crate::utils::{encode_base64, format_bytes};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Serialized session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportContainer {
    #[serde(default)]
    pub image_options_array: Vec<ImageLoadOptions>,
    #[serde(default)]
    pub encoded_image_blobs: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub encoded_drawing_blob: Option<String>,
    #[serde(default, rename = "previewImageDataURL")]
    pub preview_image_data_url: String,
    #[serde(default)]
    pub labels: Vec<Label3D>,
    /// Options with the sentinel substitution applied
    pub opts: Value,
    #[serde(default)]
    pub scene_data: SceneData,
    #[serde(default)]
    pub meshes_string: String,
    #[serde(default)]
    pub connectomes: Vec<String>,
    #[serde(default)]
    pub custom_data: String,
}

impl ExportContainer {
    /// Encode as JSON text
    pub fn to_json(&self, pretty: bool) -> Result<Vec<u8>> {
        let bytes = if pretty {
            serde_json::to_vec_pretty(self)?
        } else {
            serde_json::to_vec(self)?
        };
        Ok(bytes)
    }
}

/// Load options for a volume at export time.
///
/// Works on a copy of the registered record (or of the default template when
/// none is registered) with display fields refreshed from the live volume.
fn refreshed_options(document: &Document, volume: &dyn VolumeImage) -> ImageLoadOptions {
    let mut options = match document.image_options(&volume.id()) {
        Some(options) => options.clone(),
        None => {
            tracing::warn!(
                image = %volume.id(),
                "no load options registered for volume, using default template"
            );
            ImageLoadOptions::default_template()
        }
    };
    if options.image_type.is_none() {
        options.image_type = Some(ImageType::Nii);
    }
    options.apply_display_state(volume);
    options
}

/// Turn a document into a container.
///
/// Never mutates the document: registry records are copied before the live
/// display state of each volume is written into them.
pub fn export(document: &Document) -> Result<ExportContainer> {
    let opts = normalize_for_export(document.options())?;
    let scene_data = document.scene().snapshot();
    scene_data.ensure_finite()?;

    let mut image_options_array = Vec::with_capacity(document.volumes().len());
    let mut encoded_image_blobs = Vec::with_capacity(document.volumes().len());
    let mut encoded_drawing_blob = None;

    for (i, volume) in document.volumes().iter().enumerate() {
        image_options_array.push(refreshed_options(document, volume.as_ref()));

        let raw = volume.encode_raw_bytes(None)?;
        tracing::debug!(image = %volume.id(), size = %format_bytes(raw.len()), "encoded volume");
        encoded_image_blobs.push(encode_base64(&raw));

        if i == 0 {
            if let Some(drawing) = document.drawing() {
                let raw = volume.encode_raw_bytes(Some(drawing))?;
                encoded_drawing_blob = Some(encode_base64(&raw));
            }
        }
    }

    let mut mesh_records = Vec::new();
    let mut connectomes = Vec::new();
    for mesh in document.meshes() {
        if document.mesh_options(&mesh.id()).is_none() {
            tracing::warn!(mesh = %mesh.id(), "no load options registered for mesh");
        }
        match mesh.kind() {
            MeshKind::Connectome => {
                let graph = mesh.serialize_graph()?;
                connectomes.push(serde_json::to_string(&graph)?);
            }
            MeshKind::Standard => mesh_records.push(MeshRecord::from_source(mesh.as_ref())),
        }
    }
    let meshes_string = to_structured_string(&mesh_records)?;

    Ok(ExportContainer {
        image_options_array,
        encoded_image_blobs,
        encoded_drawing_blob,
        preview_image_data_url: document.preview_image_data_url().to_string(),
        labels: document.labels().to_vec(),
        opts,
        scene_data,
        meshes_string,
        connectomes,
        custom_data: document.custom_data().to_string(),
    })
}

impl Document {
    /// Convenience for [`export`]
    pub fn to_container(&self) -> Result<ExportContainer> {
        export(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DocumentError;
    use crate::mesh::{MeshLayer, MeshLoadOptions, MeshSource};
    use crate::structured::from_structured_str;
    use crate::types::{ImageId, MeshId};
    use serde_json::json;
    use std::sync::Arc;

    struct Volume {
        id: ImageId,
        colormap: &'static str,
        negative: Option<&'static str>,
    }

    impl VolumeImage for Volume {
        fn id(&self) -> ImageId {
            self.id
        }
        fn colormap(&self) -> String {
            self.colormap.to_string()
        }
        fn colormap_negative(&self) -> Option<String> {
            self.negative.map(str::to_string)
        }
        fn opacity(&self) -> f64 {
            0.8
        }
        fn cal_min(&self) -> f64 {
            -1.0
        }
        fn cal_max(&self) -> f64 {
            1.0
        }
        fn voxel_count(&self) -> usize {
            4
        }
        fn encode_raw_bytes(&self, overlay: Option<&[u8]>) -> Result<Vec<u8>> {
            match overlay {
                Some(bitmap) => Ok([b"DRAW".as_slice(), bitmap].concat()),
                None => Ok(b"NIFTI".to_vec()),
            }
        }
    }

    fn volume(colormap: &'static str) -> Arc<dyn VolumeImage> {
        Arc::new(Volume {
            id: ImageId::new(),
            colormap,
            negative: None,
        })
    }

    struct Graph {
        id: MeshId,
    }

    impl MeshSource for Graph {
        fn id(&self) -> MeshId {
            self.id
        }
        fn kind(&self) -> MeshKind {
            MeshKind::Connectome
        }
        fn name(&self) -> String {
            "graph".to_string()
        }
        fn points(&self) -> &[f32] {
            &[]
        }
        fn triangles(&self) -> &[u32] {
            &[]
        }
        fn rgba255(&self) -> &[u8] {
            &[]
        }
        fn opacity(&self) -> f64 {
            1.0
        }
        fn serialize_graph(&self) -> Result<Value> {
            Ok(json!({"nodes": {"names": ["a", "b"]}, "edges": [0, 1, 1, 0]}))
        }
    }

    struct Surface {
        id: MeshId,
    }

    impl MeshSource for Surface {
        fn id(&self) -> MeshId {
            self.id
        }
        fn name(&self) -> String {
            "lh.pial".to_string()
        }
        fn points(&self) -> &[f32] {
            &[0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0]
        }
        fn triangles(&self) -> &[u32] {
            &[0, 1, 2]
        }
        fn rgba255(&self) -> &[u8] {
            &[255, 0, 0, 255]
        }
        fn opacity(&self) -> f64 {
            0.7
        }
        fn layers(&self) -> Vec<MeshLayer> {
            vec![MeshLayer {
                colormap: "hot".to_string(),
                ..MeshLayer::default()
            }]
        }
    }

    #[test]
    fn test_empty_document_is_well_formed() {
        let container = export(&Document::new()).unwrap();
        assert!(container.image_options_array.is_empty());
        assert!(container.encoded_image_blobs.is_empty());
        assert!(container.encoded_drawing_blob.is_none());
        assert_eq!(container.opts["meshThicknessOn2D"], json!("infinity"));
        assert_eq!(container.meshes_string, "[]");
    }

    #[test]
    fn test_export_reflects_live_state_without_mutating() {
        let mut doc = Document::new();
        let base = volume("hot");
        let id = base.id();
        doc.add_image(base, ImageLoadOptions::from_url("t1.nii").with_colormap("gray"));

        let container = export(&doc).unwrap();
        let exported = &container.image_options_array[0];
        assert_eq!(exported.colormap, "hot");
        assert_eq!(exported.opacity, 0.8);
        assert_eq!(exported.cal_min, Some(-1.0));
        assert_eq!(exported.cal_max, Some(1.0));
        assert_eq!(container.encoded_image_blobs, vec![encode_base64(b"NIFTI")]);

        let registered = doc.image_options(&id).unwrap();
        assert_eq!(registered.colormap, "gray");
        assert!(registered.cal_min.is_none());
    }

    #[test]
    fn test_unregistered_volume_gets_default_record() {
        let mut doc = Document::new();
        doc.add_image(volume("gray"), ImageLoadOptions::from_url("base.nii"));
        doc.add_volume_unregistered(volume("gray"));

        let container = export(&doc).unwrap();
        assert_eq!(container.image_options_array.len(), 2);
        let synthesized = &container.image_options_array[1];
        assert_eq!(synthesized.colormap, "gray");
        assert_eq!(synthesized.name, "");
        assert_eq!(synthesized.image_type, Some(ImageType::Nii));
        assert_eq!(container.encoded_image_blobs.len(), 2);
    }

    #[test]
    fn test_drawing_uses_base_codec() {
        let mut doc = Document::new();
        doc.add_image(volume("gray"), ImageLoadOptions::default());
        doc.set_drawing(vec![0, 1, 2, 3]).unwrap();

        let container = export(&doc).unwrap();
        assert_eq!(
            container.encoded_drawing_blob,
            Some(encode_base64(b"DRAW\x00\x01\x02\x03"))
        );
    }

    #[test]
    fn test_negative_colormap_copied_when_present() {
        let mut doc = Document::new();
        let image: Arc<dyn VolumeImage> = Arc::new(Volume {
            id: ImageId::new(),
            colormap: "warm",
            negative: Some("winter"),
        });
        doc.add_image(image, ImageLoadOptions::default());

        let container = export(&doc).unwrap();
        assert_eq!(
            container.image_options_array[0].colormap_negative.as_deref(),
            Some("winter")
        );
    }

    #[test]
    fn test_meshes_split_by_kind() {
        let mut doc = Document::new();
        doc.add_mesh(Arc::new(Graph { id: MeshId::new() }), MeshLoadOptions::default());
        doc.add_mesh(Arc::new(Surface { id: MeshId::new() }), MeshLoadOptions::default());

        let container = export(&doc).unwrap();
        assert_eq!(container.connectomes.len(), 1);
        let graph: Value = serde_json::from_str(&container.connectomes[0]).unwrap();
        assert_eq!(graph["edges"], json!([0, 1, 1, 0]));

        let meshes = from_structured_str(&container.meshes_string).unwrap();
        let records: Vec<MeshRecord> = serde_json::from_value(meshes).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].name, "lh.pial");
        assert_eq!(records[0].tris.as_slice(), &[0, 1, 2]);
        assert_eq!(records[0].layers[0].colormap, "hot");
    }

    #[test]
    fn test_container_omits_title() {
        let doc = Document::new().with_title("my session");
        let json = export(&doc).unwrap().to_json(false).unwrap();
        let text = String::from_utf8(json).unwrap();
        assert!(!text.contains("my session"));
        assert!(!text.contains("title"));
    }

    #[test]
    fn test_encode_failure_propagates() {
        struct Broken(ImageId);
        impl VolumeImage for Broken {
            fn id(&self) -> ImageId {
                self.0
            }
            fn colormap(&self) -> String {
                "gray".into()
            }
            fn opacity(&self) -> f64 {
                1.0
            }
            fn cal_min(&self) -> f64 {
                0.0
            }
            fn cal_max(&self) -> f64 {
                1.0
            }
            fn voxel_count(&self) -> usize {
                0
            }
            fn encode_raw_bytes(&self, _overlay: Option<&[u8]>) -> Result<Vec<u8>> {
                Err(DocumentError::Encoding("codec unavailable".into()))
            }
        }

        let mut doc = Document::new();
        doc.add_image(Arc::new(Broken(ImageId::new())), ImageLoadOptions::default());
        assert!(export(&doc).unwrap_err().is_codec_error());
    }

    #[test]
    fn test_non_finite_scene_is_rejected() {
        let mut doc = Document::new();
        doc.scene_mut().set_elevation(f64::NAN);
        let err = export(&doc).unwrap_err();
        assert!(matches!(err, DocumentError::Serialization(_)));

        doc.scene_mut().set_elevation(15.0);
        doc.options_mut().mesh_thickness_on_2d = f64::NEG_INFINITY;
        let container = export(&doc).unwrap();
        assert_eq!(container.opts["meshThicknessOn2D"], json!("-infinity"));
    }
}
