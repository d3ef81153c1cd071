//! Image load options and the volume collaborator contract

use crate::error::Result;
use crate::registry::OptionsRegistry;
use crate::types::{ImageId, ImageType};
use serde::{Deserialize, Serialize};
use url::Url;

/// Name given to images registered without any source locator
pub const UNTITLED_IMAGE_NAME: &str = "untitled.nii";

/// Color map used when no load options exist for a volume
pub const DEFAULT_COLORMAP: &str = "gray";

/// Base used to resolve relative source locators
const LOCAL_BASE_URL: &str = "http://127.0.0.1";

/// Parameters used to interpret and display a single image payload.
///
/// `Default` yields the template synthesized for volumes that have no
/// registered record: no name, gray color map, full opacity, calibration unset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ImageLoadOptions {
    pub url: String,
    pub url_image_data: String,
    pub name: String,
    pub colormap: String,
    pub opacity: f64,
    #[serde(rename = "cal_min")]
    pub cal_min: Option<f64>,
    #[serde(rename = "cal_max")]
    pub cal_max: Option<f64>,
    pub trust_cal_min_max: bool,
    pub percentile_frac: f64,
    pub ignore_zero_voxels: bool,
    pub use_q_form_not_s_form: bool,
    pub colormap_negative: Option<String>,
    pub image_type: Option<ImageType>,
    #[serde(rename = "frame4D")]
    pub frame_4d: u32,
    #[serde(rename = "limitFrames4D")]
    pub limit_frames_4d: Option<u32>,
}

impl Default for ImageLoadOptions {
    fn default() -> Self {
        Self {
            url: String::new(),
            url_image_data: String::new(),
            name: String::new(),
            colormap: DEFAULT_COLORMAP.to_string(),
            opacity: 1.0,
            cal_min: None,
            cal_max: None,
            trust_cal_min_max: true,
            percentile_frac: 0.02,
            ignore_zero_voxels: false,
            use_q_form_not_s_form: false,
            colormap_negative: None,
            image_type: Some(ImageType::Nii),
            frame_4d: 0,
            limit_frames_4d: None,
        }
    }
}

impl ImageLoadOptions {
    /// The record synthesized when a live volume has no registered options
    pub fn default_template() -> Self {
        Self::default()
    }

    /// Options for an image fetched from `url`
    pub fn from_url(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Self::default()
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_colormap(mut self, colormap: impl Into<String>) -> Self {
        self.colormap = colormap.into();
        self
    }

    pub fn with_colormap_negative(mut self, colormap: impl Into<String>) -> Self {
        self.colormap_negative = Some(colormap.into());
        self
    }

    pub fn with_opacity(mut self, opacity: f64) -> Self {
        self.opacity = opacity;
        self
    }

    pub fn with_cal_range(mut self, cal_min: f64, cal_max: f64) -> Self {
        self.cal_min = Some(cal_min);
        self.cal_max = Some(cal_max);
        self
    }

    /// Fill `name` from the source locator when it is empty
    pub fn ensure_name(&mut self) {
        if self.name.is_empty() {
            self.name = display_name_for(&self.url);
        }
    }

    /// Overwrite display fields with the live state of `volume`
    pub fn apply_display_state(&mut self, volume: &dyn VolumeImage) {
        self.colormap = volume.colormap();
        self.opacity = volume.opacity();
        self.cal_min = Some(volume.cal_min());
        self.cal_max = Some(volume.cal_max());
        match volume.colormap_negative() {
            Some(negative) => self.colormap_negative = Some(negative),
            None if self.colormap_negative.is_some() => {
                tracing::warn!(
                    image = %volume.id(),
                    name = %self.name,
                    "record has a negative color map but the volume does not, keeping recorded value"
                );
            }
            None => {}
        }
    }
}

/// Derive a display name from a source locator.
///
/// Takes the last path segment, strips a `.gz` suffix and guarantees a `.nii`
/// suffix. An empty locator yields [`UNTITLED_IMAGE_NAME`].
pub fn display_name_for(locator: &str) -> String {
    if locator.is_empty() {
        return UNTITLED_IMAGE_NAME.to_string();
    }

    let path = match Url::parse(locator) {
        Ok(url) => url.path().to_string(),
        Err(_) => Url::parse(LOCAL_BASE_URL)
            .and_then(|base| base.join(locator))
            .map(|url| url.path().to_string())
            .unwrap_or_else(|_| locator.to_string()),
    };

    let mut name = path.rsplit('/').next().unwrap_or_default().to_string();
    if name.to_ascii_lowercase().ends_with(".gz") {
        name.truncate(name.len() - 3);
    }
    if !name.to_ascii_lowercase().ends_with(".nii") {
        name.push_str(".nii");
    }
    name
}

/// Contract required from a loaded volume
pub trait VolumeImage: Send + Sync {
    /// Stable identifier for the lifetime of the object
    fn id(&self) -> ImageId;

    /// Current positive color map
    fn colormap(&self) -> String;

    /// Current negative color map, if the volume has one configured
    fn colormap_negative(&self) -> Option<String> {
        None
    }

    fn opacity(&self) -> f64;

    fn cal_min(&self) -> f64;

    fn cal_max(&self) -> f64;

    /// Number of voxels in the volume grid
    fn voxel_count(&self) -> usize;

    /// Encode the volume as a raw file payload.
    ///
    /// With `Some(overlay)`, encode that bitmap on this volume's grid instead
    /// of the volume's own data.
    fn encode_raw_bytes(&self, overlay: Option<&[u8]>) -> Result<Vec<u8>>;
}

/// Registry of image load options keyed by image identifier
pub type ImageOptionsRegistry = OptionsRegistry<ImageId, ImageLoadOptions>;

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_display_name_from_absolute_url() {
        assert_eq!(
            display_name_for("https://example.org/data/mni152.nii.gz"),
            "mni152.nii"
        );
        assert_eq!(
            display_name_for("https://example.org/data/brain.NII.GZ?x=1"),
            "brain.NII"
        );
    }

    #[test]
    fn test_display_name_from_relative_path() {
        assert_eq!(display_name_for("images/chris_t1.nii"), "chris_t1.nii");
        assert_eq!(display_name_for("/abs/path/scan.mgz"), "scan.mgz.nii");
        assert_eq!(display_name_for("hippo.gz"), "hippo.nii");
    }

    #[test]
    fn test_display_name_without_locator() {
        assert_eq!(display_name_for(""), UNTITLED_IMAGE_NAME);
    }

    #[test]
    fn test_default_template() {
        let template = ImageLoadOptions::default_template();
        assert_eq!(template.name, "");
        assert_eq!(template.colormap, "gray");
        assert_eq!(template.opacity, 1.0);
        assert!(template.cal_min.is_none());
        assert!(template.cal_max.is_none());
        assert_eq!(template.image_type, Some(ImageType::Nii));
    }

    #[test]
    fn test_wire_names() {
        let options = ImageLoadOptions::from_url("a.nii").with_cal_range(1.0, 2.0);
        let value = serde_json::to_value(&options).unwrap();
        assert_eq!(value["cal_min"], json!(1.0));
        assert_eq!(value["urlImageData"], json!(""));
        assert_eq!(value["frame4D"], json!(0));
        assert_eq!(value["imageType"], json!(1));
    }

    #[test]
    fn test_unset_calibration_reads_null() {
        let options: ImageLoadOptions =
            serde_json::from_value(json!({"name": "x.nii", "cal_min": null})).unwrap();
        assert!(options.cal_min.is_none());
        assert_eq!(options.colormap, "gray");
    }
}
