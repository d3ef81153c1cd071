//! Import - rebuild a document from container bytes
//!
//! Shape problems in the container are fatal. Missing per-entity metadata is
//! filled from defaults so a session still opens when it was written by an
//! older or newer version.

use crate::compression::decompress_detected;
use crate::container::ExportContainer;
use crate::document::{Document, ImportedPayloads};
use crate::error::{DocumentError, Result};
use crate::image::ImageOptionsRegistry;
use crate::mesh::{rename_legacy_layer_fields, MeshRecord};
use crate::options::normalize_for_import;
use crate::scene::{Scene, SceneData};
use crate::structured::from_structured_str;
use crate::types::ImageId;
use crate::utils::format_bytes;
use serde_json::Value;

/// Top-level fields a container must carry
const REQUIRED_FIELDS: &[&str] = &["opts"];

/// Import a container, compressed or not
pub fn import_from_bytes(bytes: &[u8]) -> Result<Document> {
    let (plain, method) = decompress_detected(bytes)?;
    tracing::debug!(
        compressed = %format_bytes(bytes.len()),
        plain = %format_bytes(plain.len()),
        ?method,
        "decoded container stream"
    );
    let text = std::str::from_utf8(&plain)?;
    import_from_str(text)
}

/// Import a container from its JSON text
pub fn import_from_str(text: &str) -> Result<Document> {
    let value: Value = serde_json::from_str(text)?;
    import_value(value)
}

/// Import a container from a parsed JSON value
pub fn import_value(value: Value) -> Result<Document> {
    let Value::Object(map) = &value else {
        return Err(DocumentError::InvalidShape(
            "container must be a JSON object".to_string(),
        ));
    };
    for field in REQUIRED_FIELDS {
        match map.get(*field) {
            Some(Value::Object(_)) => {}
            Some(_) => {
                return Err(DocumentError::InvalidShape(format!(
                    "{} must be an object",
                    field
                )))
            }
            None => return Err(DocumentError::MissingField(field.to_string())),
        }
    }

    let mut value = value;
    let scene_value = value
        .as_object_mut()
        .and_then(|m| m.remove("sceneData"))
        .unwrap_or(Value::Null);
    let mut container: ExportContainer = serde_json::from_value(value)?;
    container.scene_data = SceneData::merged_over_baseline(scene_value)?;
    import_container(container)
}

/// Build a document from an already decoded container.
///
/// Options are merged over defaults with the sentinel reversed, the mesh
/// collection goes through the legacy field rename, and every load option
/// record receives a fresh identifier. Live volumes and meshes are not
/// created; see [`Document::rehydrate`].
pub fn import_container(container: ExportContainer) -> Result<Document> {
    let options = normalize_for_import(container.opts)?;
    let scene = Scene::from_data(container.scene_data);

    let mesh_records = if container.meshes_string.is_empty() {
        Vec::new()
    } else {
        let mut meshes = from_structured_str(&container.meshes_string)?;
        let renamed = rename_legacy_layer_fields(&mut meshes);
        if renamed > 0 {
            tracing::debug!(renamed, "renamed legacy mesh layer fields");
        }
        serde_json::from_value::<Vec<MeshRecord>>(meshes)?
    };

    if container.encoded_image_blobs.len() != container.image_options_array.len() {
        tracing::warn!(
            blobs = container.encoded_image_blobs.len(),
            records = container.image_options_array.len(),
            "image payload count does not match load option records"
        );
    }

    let mut registry = ImageOptionsRegistry::new();
    for options in container.image_options_array {
        registry.insert(ImageId::new(), options);
    }

    tracing::info!(
        images = registry.len(),
        meshes = mesh_records.len(),
        connectomes = container.connectomes.len(),
        labels = container.labels.len(),
        "imported document"
    );

    Ok(Document::from_import(
        options,
        scene,
        container.labels,
        registry,
        container.preview_image_data_url,
        container.custom_data,
        ImportedPayloads {
            encoded_image_blobs: container.encoded_image_blobs,
            encoded_drawing_blob: container.encoded_drawing_blob,
            mesh_records,
            connectomes: container.connectomes,
        },
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compression::{get_compressor, CompressionLevel, CompressionMethod};
    use serde_json::json;

    fn minimal() -> Value {
        json!({
            "opts": {"meshThicknessOn2D": "infinity", "textHeight": 0.1},
            "sceneData": {"azimuth": 45, "elevation": -5},
            "labels": [{"text": "a"}],
            "customData": "{\"k\":1}"
        })
    }

    #[test]
    fn test_minimal_container() {
        let doc = import_value(minimal()).unwrap();
        assert_eq!(doc.options().mesh_thickness_on_2d, f64::INFINITY);
        assert_eq!(doc.options().text_height, 0.1);
        assert_eq!(doc.scene().azimuth(), 45.0);
        assert_eq!(doc.scene().elevation(), -5.0);
        assert_eq!(doc.scene().vol_scale_multiplier(), 1.0);
        assert_eq!(doc.labels()[0].text, "a");
        assert_eq!(doc.custom_data(), "{\"k\":1}");
        assert!(doc.payloads().is_empty());
        assert!(doc.volumes().is_empty());
    }

    #[test]
    fn test_missing_opts_is_fatal() {
        let err = import_value(json!({"sceneData": {}})).unwrap_err();
        assert!(matches!(err, DocumentError::MissingField(ref f) if f == "opts"));

        let err = import_value(json!({"opts": 3})).unwrap_err();
        assert!(matches!(err, DocumentError::InvalidShape(_)));

        let err = import_value(json!([1, 2, 3])).unwrap_err();
        assert!(err.is_shape_error());
    }

    #[test]
    fn test_malformed_json() {
        let err = import_from_str("{\"opts\": ").unwrap_err();
        assert!(matches!(err, DocumentError::Serialization(_)));
    }

    #[test]
    fn test_invalid_utf8() {
        let err = import_from_bytes(&[0xff, 0xfe, 0xfd]).unwrap_err();
        assert!(err.is_codec_error());
    }

    #[test]
    fn test_compressed_and_plain_match() {
        let text = serde_json::to_vec(&minimal()).unwrap();
        let gz = get_compressor(CompressionMethod::Gzip)
            .compress(&text, CompressionLevel::default())
            .unwrap();
        let zst = get_compressor(CompressionMethod::Zstd)
            .compress(&text, CompressionLevel::default())
            .unwrap();

        let plain = import_from_bytes(&text).unwrap();
        for bytes in [gz, zst] {
            let doc = import_from_bytes(&bytes).unwrap();
            assert_eq!(doc.options(), plain.options());
            assert_eq!(doc.scene().data(), plain.scene().data());
            assert_eq!(doc.labels(), plain.labels());
        }
    }

    #[test]
    fn test_legacy_mesh_layers() {
        let meshes = json!([{
            "name": "lh.pial",
            "pts": [0.0, 0.0, 0.0],
            "tris": [0, 0, 0],
            "layers": [{"colorMap": "warm", "colorMapNegative": "winter"}]
        }]);
        let mut container = minimal();
        container["meshesString"] = json!(meshes.to_string());

        let doc = import_value(container).unwrap();
        let layer = &doc.payloads().mesh_records[0].layers[0];
        assert_eq!(layer.colormap, "warm");
        assert_eq!(layer.colormap_negative.as_deref(), Some("winter"));
    }

    #[test]
    fn test_records_get_fresh_identifiers() {
        let mut container = minimal();
        container["imageOptionsArray"] = json!([{"name": "a.nii"}, {"name": "b.nii"}]);
        container["encodedImageBlobs"] = json!(["AAAA", "AQID"]);

        let doc = import_value(container).unwrap();
        let names: Vec<_> = doc
            .image_registry()
            .values()
            .map(|o| o.name.as_str())
            .collect();
        assert_eq!(names, vec!["a.nii", "b.nii"]);
        let ids: Vec<_> = doc.image_registry().keys().copied().collect();
        assert_ne!(ids[0], ids[1]);
        assert_eq!(doc.payloads().encoded_image_blobs.len(), 2);
    }
}
