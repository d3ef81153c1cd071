//! Mesh records, mesh load options and the mesh collaborator contract

use crate::error::{DocumentError, Result};
use crate::registry::OptionsRegistry;
use crate::structured::{Float32Array, Uint32Array, Uint8Array};
use crate::types::{MeshId, MeshKind};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Field names renamed between container revisions, as `(old, current)`
pub const LEGACY_LAYER_FIELDS: [(&str, &str); 2] = [
    ("colorMap", "colormap"),
    ("colorMapNegative", "colormapNegative"),
];

/// Per-vertex overlay on a mesh with its statistics and color mapping.
///
/// Scalars may be NaN (unset) or infinite and are written as tokens then.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct MeshLayer {
    pub values: Float32Array,
    #[serde(rename = "nFrame4D")]
    pub n_frame_4d: u32,
    #[serde(rename = "frame4D")]
    pub frame_4d: u32,
    #[serde(with = "crate::options::float_token")]
    pub opacity: f64,
    pub colormap: String,
    pub colormap_negative: Option<String>,
    pub use_negative_cmap: bool,
    pub colormap_invert: bool,
    #[serde(rename = "cal_min", with = "crate::options::float_token")]
    pub cal_min: f64,
    #[serde(rename = "cal_max", with = "crate::options::float_token")]
    pub cal_max: f64,
    #[serde(rename = "cal_minNeg", with = "crate::options::float_token")]
    pub cal_min_neg: f64,
    #[serde(rename = "cal_maxNeg", with = "crate::options::float_token")]
    pub cal_max_neg: f64,
    pub is_transparent_below_cal_min: bool,
    pub is_additive_blend: bool,
    #[serde(with = "crate::options::float_token")]
    pub outline_border: f64,
    pub colorbar_visible: bool,
    pub show_legend: bool,
    #[serde(rename = "global_min", with = "crate::options::float_token")]
    pub global_min: f64,
    #[serde(rename = "global_max", with = "crate::options::float_token")]
    pub global_max: f64,
}

impl Default for MeshLayer {
    fn default() -> Self {
        Self {
            values: Float32Array::default(),
            n_frame_4d: 1,
            frame_4d: 0,
            opacity: 0.5,
            colormap: "warm".to_string(),
            colormap_negative: None,
            use_negative_cmap: false,
            colormap_invert: false,
            cal_min: 0.0,
            cal_max: 0.0,
            cal_min_neg: 0.0,
            cal_max_neg: 0.0,
            is_transparent_below_cal_min: true,
            is_additive_blend: false,
            outline_border: 0.0,
            colorbar_visible: true,
            show_legend: true,
            global_min: 0.0,
            global_max: 0.0,
        }
    }
}

/// Tractography properties, present only on meshes that carry fiber offsets
#[derive(Debug, Clone, PartialEq)]
pub struct FiberProperties {
    pub offset_pt0: Vec<u32>,
    pub group_colormap: Option<String>,
    pub color: String,
    pub dither: f64,
    pub radius: f64,
    pub decimation_stride: u32,
    pub length: f64,
    pub occlusion: f64,
}

/// Plain-value copy of a standard mesh as written into a container
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct MeshRecord {
    pub pts: Float32Array,
    pub tris: Uint32Array,
    pub name: String,
    pub rgba255: Uint8Array,
    #[serde(with = "crate::options::float_token")]
    pub opacity: f64,
    pub visible: bool,
    pub mesh_shader_index: u32,
    pub layers: Vec<MeshLayer>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub offset_pt0: Option<Uint32Array>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fiber_group_colormap: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fiber_color: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fiber_dither: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fiber_radius: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fiber_decimation_stride: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fiber_length: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fiber_occlusion: Option<f64>,
}

impl MeshRecord {
    /// Copy the allow-listed fields off a live mesh
    pub fn from_source(mesh: &dyn MeshSource) -> Self {
        let mut record = Self {
            pts: Float32Array(mesh.points().to_vec()),
            tris: Uint32Array(mesh.triangles().to_vec()),
            name: mesh.name(),
            rgba255: Uint8Array(mesh.rgba255().to_vec()),
            opacity: mesh.opacity(),
            visible: mesh.visible(),
            mesh_shader_index: mesh.shader_index(),
            layers: mesh.layers(),
            ..Self::default()
        };
        if let Some(fiber) = mesh.fiber() {
            record.offset_pt0 = Some(Uint32Array(fiber.offset_pt0));
            record.fiber_group_colormap = fiber.group_colormap;
            record.fiber_color = Some(fiber.color);
            record.fiber_dither = Some(fiber.dither);
            record.fiber_radius = Some(fiber.radius);
            record.fiber_decimation_stride = Some(fiber.decimation_stride);
            record.fiber_length = Some(fiber.length);
            record.fiber_occlusion = Some(fiber.occlusion);
        }
        record
    }

    /// Whether the record describes tractography fibers
    pub fn is_fiber(&self) -> bool {
        self.offset_pt0.is_some()
    }

    /// Number of vertices (three coordinates each)
    pub fn vertex_count(&self) -> usize {
        self.pts.len() / 3
    }
}

/// Rewrite legacy color map field names on every layer of every mesh.
///
/// Runs on the generic value before typed decoding; returns the number of
/// fields renamed. A value that is not a mesh array is left untouched.
pub fn rename_legacy_layer_fields(meshes: &mut Value) -> usize {
    let mut renamed = 0;
    let Some(meshes) = meshes.as_array_mut() else {
        return 0;
    };
    for mesh in meshes {
        let Some(layers) = mesh.get_mut("layers").and_then(Value::as_array_mut) else {
            continue;
        };
        for layer in layers.iter_mut().filter_map(Value::as_object_mut) {
            for (old, current) in LEGACY_LAYER_FIELDS {
                if let Some(value) = layer.remove(old) {
                    layer.insert(current.to_string(), value);
                    renamed += 1;
                }
            }
        }
    }
    renamed
}

/// Load-time parameters of a mesh
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct MeshLoadOptions {
    pub url: String,
    pub name: String,
    pub rgba255: [u8; 4],
    pub opacity: f64,
    pub visible: bool,
}

impl Default for MeshLoadOptions {
    fn default() -> Self {
        Self {
            url: String::new(),
            name: String::new(),
            rgba255: [255, 255, 255, 255],
            opacity: 1.0,
            visible: true,
        }
    }
}

impl MeshLoadOptions {
    pub fn from_url(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Self::default()
        }
    }
}

/// Registry of mesh load options keyed by mesh identifier
pub type MeshOptionsRegistry = OptionsRegistry<MeshId, MeshLoadOptions>;

/// Contract required from a loaded mesh or connectome
pub trait MeshSource: Send + Sync {
    fn id(&self) -> MeshId;

    fn kind(&self) -> MeshKind {
        MeshKind::Standard
    }

    fn name(&self) -> String;

    /// Vertex coordinates, three per vertex
    fn points(&self) -> &[f32];

    /// Triangle vertex indices, three per triangle
    fn triangles(&self) -> &[u32];

    /// Per-vertex RGBA colors
    fn rgba255(&self) -> &[u8];

    fn opacity(&self) -> f64;

    fn visible(&self) -> bool {
        true
    }

    fn shader_index(&self) -> u32 {
        0
    }

    fn layers(&self) -> Vec<MeshLayer> {
        Vec::new()
    }

    fn fiber(&self) -> Option<FiberProperties> {
        None
    }

    /// Graph export for connectome meshes
    fn serialize_graph(&self) -> Result<Value> {
        Err(DocumentError::Unsupported(format!(
            "mesh {} is not a connectome",
            self.id()
        )))
    }
}
