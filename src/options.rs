//! Rendering and interaction options carried by a document
//!
//! Every option has a compiled-in default. Containers written by older or
//! newer versions are read permissively: unknown keys are ignored and missing
//! keys fall back to their defaults.

use crate::error::{DocumentError, Result};
use crate::types::Vec4;
use crate::utils::{ensure_finite, merge_json};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Wire token standing in for `f64::INFINITY`
pub const INFINITY_TOKEN: &str = "infinity";

/// Wire token standing in for `f64::NEG_INFINITY`
pub const NEG_INFINITY_TOKEN: &str = "-infinity";

/// Wire token standing in for NaN
pub const NAN_TOKEN: &str = "nan";

/// 2D slice layout shown by the viewer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SliceType {
    Axial,
    Coronal,
    Sagittal,
    Multiplanar,
    Render,
}

/// Behavior of a secondary-button drag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DragMode {
    None,
    Contrast,
    Measurement,
    Pan,
    #[serde(rename = "slicer3D")]
    Slicer3D,
    CallbackOnly,
    RoiSelection,
}

/// Arrangement of tiles in multiplanar view
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum MultiplanarLayout {
    Auto,
    Column,
    Grid,
    Row,
}

/// Flat options record.
///
/// `mesh_thickness_on_2d` is the one numeric field whose domain includes an
/// unbounded value; it is written as [`INFINITY_TOKEN`] when infinite. Every
/// other numeric field must be finite to be exported.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct DocumentOptions {
    pub text_height: f64,
    pub colorbar_height: f64,
    pub colorbar_margin: f64,
    pub crosshair_width: f64,
    pub ruler_width: f64,
    pub show_3d_crosshair: bool,
    pub back_color: Vec4,
    pub crosshair_color: Vec4,
    pub font_color: Vec4,
    pub selection_box_color: Vec4,
    pub clip_plane_color: Vec4,
    pub ruler_color: Vec4,
    pub legend_background_color: Vec4,
    pub legend_text_color: Vec4,
    pub trust_cal_min_max: bool,
    pub clip_plane_hot_key: String,
    pub view_mode_hot_key: String,
    pub double_touch_timeout: u32,
    pub long_touch_timeout: u32,
    pub key_debounce_time: u32,
    pub is_nearest_interpolation: bool,
    pub is_resize_canvas: bool,
    pub is_atlas_outline: bool,
    pub is_ruler: bool,
    pub is_colorbar: bool,
    pub is_orient_cube: bool,
    pub multiplanar_pad_pixels: u32,
    pub multiplanar_force_render: bool,
    pub multiplanar_layout: MultiplanarLayout,
    pub is_radiological_convention: bool,
    #[serde(rename = "meshThicknessOn2D", with = "float_token")]
    pub mesh_thickness_on_2d: f64,
    pub drag_mode: DragMode,
    #[serde(rename = "yoke3Dto2DZoom")]
    pub yoke_3d_to_2d_zoom: bool,
    pub is_depth_pick_mesh: bool,
    pub is_corner_orientation_text: bool,
    pub sagittal_nose_left: bool,
    #[serde(rename = "isSliceMM")]
    pub is_slice_mm: bool,
    pub is_high_resolution_capable: bool,
    pub loading_text: String,
    pub is_force_mouse_click_to_voxel_centers: bool,
    pub drag_and_drop_enabled: bool,
    pub drawing_enabled: bool,
    pub pen_value: f64,
    pub pen_size: u32,
    pub flood_fill_neighbors: u32,
    pub is_filled_pen: bool,
    pub thumbnail: String,
    pub max_draw_undo_bitmaps: u32,
    pub slice_type: SliceType,
    #[serde(rename = "meshXRay")]
    pub mesh_xray: f64,
    pub is_anti_alias: Option<bool>,
    #[serde(rename = "limitFrames4D")]
    pub limit_frames_4d: Option<u32>,
    pub is_additive_blend: bool,
    pub show_legend: bool,
    pub render_overlay_blend: f64,
    pub slice_mosaic_string: String,
    pub center_mosaic: bool,
    pub interactive: bool,
    pub is_alpha_clip_dark: bool,
    pub gradient_order: u32,
}

impl Default for DocumentOptions {
    fn default() -> Self {
        Self {
            text_height: 0.06,
            colorbar_height: 0.05,
            colorbar_margin: 0.05,
            crosshair_width: 1.0,
            ruler_width: 4.0,
            show_3d_crosshair: false,
            back_color: [0.0, 0.0, 0.0, 1.0],
            crosshair_color: [1.0, 0.0, 0.0, 1.0],
            font_color: [0.5, 0.5, 0.5, 1.0],
            selection_box_color: [1.0, 1.0, 1.0, 0.5],
            clip_plane_color: [0.7, 0.0, 0.7, 0.5],
            ruler_color: [1.0, 0.0, 0.0, 0.8],
            legend_background_color: [0.3, 0.3, 0.3, 0.5],
            legend_text_color: [1.0, 1.0, 1.0, 1.0],
            trust_cal_min_max: true,
            clip_plane_hot_key: "KeyC".to_string(),
            view_mode_hot_key: "KeyV".to_string(),
            double_touch_timeout: 500,
            long_touch_timeout: 1000,
            key_debounce_time: 50,
            is_nearest_interpolation: false,
            is_resize_canvas: true,
            is_atlas_outline: false,
            is_ruler: false,
            is_colorbar: false,
            is_orient_cube: false,
            multiplanar_pad_pixels: 0,
            multiplanar_force_render: false,
            multiplanar_layout: MultiplanarLayout::Auto,
            is_radiological_convention: false,
            mesh_thickness_on_2d: f64::INFINITY,
            drag_mode: DragMode::Contrast,
            yoke_3d_to_2d_zoom: false,
            is_depth_pick_mesh: false,
            is_corner_orientation_text: false,
            sagittal_nose_left: false,
            is_slice_mm: false,
            is_high_resolution_capable: true,
            loading_text: "loading ...".to_string(),
            is_force_mouse_click_to_voxel_centers: false,
            drag_and_drop_enabled: true,
            drawing_enabled: false,
            pen_value: 1.0,
            pen_size: 1,
            flood_fill_neighbors: 6,
            is_filled_pen: false,
            thumbnail: String::new(),
            max_draw_undo_bitmaps: 8,
            slice_type: SliceType::Multiplanar,
            mesh_xray: 0.0,
            is_anti_alias: None,
            limit_frames_4d: None,
            is_additive_blend: false,
            show_legend: true,
            render_overlay_blend: 1.0,
            slice_mosaic_string: String::new(),
            center_mosaic: false,
            interactive: true,
            is_alpha_clip_dark: false,
            gradient_order: 1,
        }
    }
}

impl DocumentOptions {
    /// Whether 2D mesh rendering is unbounded in thickness
    pub fn is_mesh_thickness_unbounded(&self) -> bool {
        self.mesh_thickness_on_2d == f64::INFINITY
    }

    /// Fail on any NaN or infinite value outside `mesh_thickness_on_2d`
    pub fn ensure_finite(&self) -> Result<()> {
        ensure_finite("textHeight", &[self.text_height])?;
        ensure_finite("colorbarHeight", &[self.colorbar_height])?;
        ensure_finite("colorbarMargin", &[self.colorbar_margin])?;
        ensure_finite("crosshairWidth", &[self.crosshair_width])?;
        ensure_finite("rulerWidth", &[self.ruler_width])?;
        ensure_finite("penValue", &[self.pen_value])?;
        ensure_finite("meshXRay", &[self.mesh_xray])?;
        ensure_finite("renderOverlayBlend", &[self.render_overlay_blend])?;
        ensure_finite("backColor", &self.back_color)?;
        ensure_finite("crosshairColor", &self.crosshair_color)?;
        ensure_finite("fontColor", &self.font_color)?;
        ensure_finite("selectionBoxColor", &self.selection_box_color)?;
        ensure_finite("clipPlaneColor", &self.clip_plane_color)?;
        ensure_finite("rulerColor", &self.ruler_color)?;
        ensure_finite("legendBackgroundColor", &self.legend_background_color)?;
        ensure_finite("legendTextColor", &self.legend_text_color)
    }
}

/// Serialize options for a container.
///
/// Returns a deep copy with the sentinel substitution applied.
pub fn normalize_for_export(options: &DocumentOptions) -> Result<Value> {
    options.ensure_finite()?;
    Ok(serde_json::to_value(options)?)
}

/// Rebuild options from a container value.
///
/// The value is merged over the serialized defaults so fields introduced after
/// the container was written are populated, then the sentinel token is
/// reversed during deserialization.
pub fn normalize_for_import(value: Value) -> Result<DocumentOptions> {
    if !value.is_object() {
        return Err(DocumentError::InvalidShape(
            "opts must be an object".to_string(),
        ));
    }
    let mut merged = serde_json::to_value(DocumentOptions::default())?;
    merge_json(&mut merged, value);
    Ok(serde_json::from_value(merged)?)
}

/// Serde adapter for numbers that may be non-finite.
///
/// Non-finite values are written as [`INFINITY_TOKEN`], [`NEG_INFINITY_TOKEN`]
/// or [`NAN_TOKEN`]. Tokens are matched case-insensitively. `null` reads as
/// NaN, which is what a plain JSON encoder writes for it.
pub(crate) mod float_token {
    use super::{INFINITY_TOKEN, NAN_TOKEN, NEG_INFINITY_TOKEN};
    use serde::de::{self, Deserializer, Unexpected};
    use serde::{Deserialize, Serializer};

    pub fn serialize<S: Serializer>(value: &f64, serializer: S) -> Result<S::Ok, S::Error> {
        if value.is_nan() {
            serializer.serialize_str(NAN_TOKEN)
        } else if *value == f64::INFINITY {
            serializer.serialize_str(INFINITY_TOKEN)
        } else if *value == f64::NEG_INFINITY {
            serializer.serialize_str(NEG_INFINITY_TOKEN)
        } else {
            serializer.serialize_f64(*value)
        }
    }

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum NumberOrToken {
        Number(f64),
        Token(String),
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
        match Option::<NumberOrToken>::deserialize(deserializer)? {
            None => Ok(f64::NAN),
            Some(NumberOrToken::Number(n)) => Ok(n),
            Some(NumberOrToken::Token(token)) => parse(&token).ok_or_else(|| {
                de::Error::invalid_value(
                    Unexpected::Str(&token),
                    &"a number, \"infinity\", \"-infinity\" or \"nan\"",
                )
            }),
        }
    }

    fn parse(token: &str) -> Option<f64> {
        if token.eq_ignore_ascii_case(INFINITY_TOKEN) {
            Some(f64::INFINITY)
        } else if token.eq_ignore_ascii_case(NEG_INFINITY_TOKEN) {
            Some(f64::NEG_INFINITY)
        } else if token.eq_ignore_ascii_case(NAN_TOKEN) {
            Some(f64::NAN)
        } else {
            None
        }
    }
}
