//! 3D scene state: camera, clip planes and 2D pan
//!
//! [`SceneData`] is the plain snapshot written to containers. [`Scene`] wraps
//! it for live use: azimuth, elevation and volume scale are only written
//! through setters that notify the registered observer synchronously, on the
//! caller's thread. Other setters are plain writes and never notify.
//!
//! There is no re-entrancy guard. An observer must not mutate the scene that
//! invoked it.

use crate::error::Result;
use crate::types::{Vec3, Vec4};
use crate::utils::{ensure_finite, merge_json};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Snapshot of the scene, as stored in a container
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SceneData {
    pub gamma: f64,
    pub azimuth: f64,
    pub elevation: f64,
    pub crosshair_pos: Vec3,
    pub clip_plane: Vec4,
    pub clip_plane_depth_azi_elev: Vec3,
    pub vol_scale_multiplier: f64,
    #[serde(rename = "pan2Dxyzmm")]
    pub pan_2d_xyzmm: Vec4,
    pub clip_thick: f64,
    pub clip_volume_low: Vec3,
    pub clip_volume_high: Vec3,
}

impl Default for SceneData {
    fn default() -> Self {
        Self {
            gamma: 1.0,
            azimuth: 110.0,
            elevation: 10.0,
            crosshair_pos: [0.5, 0.5, 0.5],
            clip_plane: [0.0, 0.0, 0.0, 0.0],
            clip_plane_depth_azi_elev: [2.0, 0.0, 0.0],
            vol_scale_multiplier: 1.0,
            pan_2d_xyzmm: [0.0, 0.0, 0.0, 1.0],
            clip_thick: 2.0,
            clip_volume_low: [0.0, 0.0, 0.0],
            clip_volume_high: [1.0, 1.0, 1.0],
        }
    }
}

impl SceneData {
    /// Rebuild a snapshot from a container value, keeping baseline values
    /// for every field the container lacks.
    pub fn merged_over_baseline(value: Value) -> Result<Self> {
        let mut merged = serde_json::to_value(SceneData::default())?;
        merge_json(&mut merged, value);
        Ok(serde_json::from_value(merged)?)
    }

    /// Fail on any NaN or infinite field, which JSON cannot carry
    pub fn ensure_finite(&self) -> Result<()> {
        ensure_finite("gamma", &[self.gamma])?;
        ensure_finite("azimuth", &[self.azimuth])?;
        ensure_finite("elevation", &[self.elevation])?;
        ensure_finite("crosshairPos", &self.crosshair_pos)?;
        ensure_finite("clipPlane", &self.clip_plane)?;
        ensure_finite("clipPlaneDepthAziElev", &self.clip_plane_depth_azi_elev)?;
        ensure_finite("volScaleMultiplier", &[self.vol_scale_multiplier])?;
        ensure_finite("pan2Dxyzmm", &self.pan_2d_xyzmm)?;
        ensure_finite("clipThick", &[self.clip_thick])?;
        ensure_finite("clipVolumeLow", &self.clip_volume_low)?;
        ensure_finite("clipVolumeHigh", &self.clip_volume_high)
    }
}

/// Called with `(azimuth, elevation)` after either angle changes
pub type AzimuthElevationObserver = Box<dyn FnMut(f64, f64) + Send + Sync>;

/// Called with the new volume scale after it changes
pub type ZoomObserver = Box<dyn FnMut(f64) + Send + Sync>;

/// Live scene with single-slot change observers
#[derive(Default)]
pub struct Scene {
    data: SceneData,
    on_azimuth_elevation_change: Option<AzimuthElevationObserver>,
    on_zoom_3d_change: Option<ZoomObserver>,
}

impl Scene {
    /// Create a scene at baseline values with no observers
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a scene from a snapshot with no observers
    pub fn from_data(data: SceneData) -> Self {
        Self {
            data,
            on_azimuth_elevation_change: None,
            on_zoom_3d_change: None,
        }
    }

    /// Replace the azimuth/elevation observer
    pub fn set_on_azimuth_elevation_change<F>(&mut self, observer: F)
    where
        F: FnMut(f64, f64) + Send + Sync + 'static,
    {
        self.on_azimuth_elevation_change = Some(Box::new(observer));
    }

    /// Replace the zoom observer
    pub fn set_on_zoom_3d_change<F>(&mut self, observer: F)
    where
        F: FnMut(f64) + Send + Sync + 'static,
    {
        self.on_zoom_3d_change = Some(Box::new(observer));
    }

    /// Drop both observers
    pub fn clear_observers(&mut self) {
        self.on_azimuth_elevation_change = None;
        self.on_zoom_3d_change = None;
    }

    /// Copy of the current state
    pub fn snapshot(&self) -> SceneData {
        self.data.clone()
    }

    /// Borrow the current state
    pub fn data(&self) -> &SceneData {
        &self.data
    }

    /// Replace the state wholesale. Observers are kept and not notified.
    pub fn replace_data(&mut self, data: SceneData) {
        self.data = data;
    }

    /// Return to baseline values. Observers are kept and not notified.
    pub fn reset(&mut self) {
        self.data = SceneData::default();
    }

    pub fn azimuth(&self) -> f64 {
        self.data.azimuth
    }

    pub fn set_azimuth(&mut self, azimuth: f64) {
        self.data.azimuth = azimuth;
        self.notify_azimuth_elevation();
    }

    pub fn elevation(&self) -> f64 {
        self.data.elevation
    }

    pub fn set_elevation(&mut self, elevation: f64) {
        self.data.elevation = elevation;
        self.notify_azimuth_elevation();
    }

    pub fn vol_scale_multiplier(&self) -> f64 {
        self.data.vol_scale_multiplier
    }

    pub fn set_vol_scale_multiplier(&mut self, scale: f64) {
        self.data.vol_scale_multiplier = scale;
        if let Some(observer) = self.on_zoom_3d_change.as_mut() {
            observer(scale);
        }
    }

    pub fn crosshair_pos(&self) -> Vec3 {
        self.data.crosshair_pos
    }

    pub fn set_crosshair_pos(&mut self, pos: Vec3) {
        self.data.crosshair_pos = pos;
    }

    pub fn clip_plane(&self) -> Vec4 {
        self.data.clip_plane
    }

    pub fn set_clip_plane(&mut self, plane: Vec4) {
        self.data.clip_plane = plane;
    }

    pub fn clip_plane_depth_azi_elev(&self) -> Vec3 {
        self.data.clip_plane_depth_azi_elev
    }

    pub fn set_clip_plane_depth_azi_elev(&mut self, value: Vec3) {
        self.data.clip_plane_depth_azi_elev = value;
    }

    pub fn pan_2d_xyzmm(&self) -> Vec4 {
        self.data.pan_2d_xyzmm
    }

    pub fn set_pan_2d_xyzmm(&mut self, pan: Vec4) {
        self.data.pan_2d_xyzmm = pan;
    }

    pub fn gamma(&self) -> f64 {
        self.data.gamma
    }

    pub fn set_gamma(&mut self, gamma: f64) {
        self.data.gamma = gamma;
    }

    pub fn clip_thick(&self) -> f64 {
        self.data.clip_thick
    }

    pub fn set_clip_thick(&mut self, thickness: f64) {
        self.data.clip_thick = thickness;
    }

    /// Low and high clip volume bounds
    pub fn clip_volume(&self) -> (Vec3, Vec3) {
        (self.data.clip_volume_low, self.data.clip_volume_high)
    }

    pub fn set_clip_volume(&mut self, low: Vec3, high: Vec3) {
        self.data.clip_volume_low = low;
        self.data.clip_volume_high = high;
    }

    fn notify_azimuth_elevation(&mut self) {
        let (azimuth, elevation) = (self.data.azimuth, self.data.elevation);
        if let Some(observer) = self.on_azimuth_elevation_change.as_mut() {
            observer(azimuth, elevation);
        }
    }
}

impl fmt::Debug for Scene {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Scene")
            .field("data", &self.data)
            .field(
                "on_azimuth_elevation_change",
                &self.on_azimuth_elevation_change.is_some(),
            )
            .field("on_zoom_3d_change", &self.on_zoom_3d_change.is_some())
            .finish()
    }
}
