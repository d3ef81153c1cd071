//! Core identifier and marker types

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// 3-component vector (RAS position, depth/azimuth/elevation, ...)
pub type Vec3 = [f64; 3];

/// 4-component vector (clip plane, pan offset, RGBA color)
pub type Vec4 = [f64; 4];

/// Opaque identifier of a loaded image.
///
/// Identifiers are never written to a container; they are regenerated on import.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ImageId(pub Uuid);

impl ImageId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ImageId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ImageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Opaque identifier of a loaded mesh or connectome
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MeshId(pub Uuid);

impl MeshId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for MeshId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for MeshId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Image format marker stored in load options.
///
/// Serialized as its numeric code to stay compatible with existing containers.
/// Codes this crate does not know read as [`ImageType::Unknown`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "u64", into = "u8")]
#[repr(u8)]
pub enum ImageType {
    Unknown = 0,
    /// NIfTI, the primary format every registered image is tagged with
    Nii = 1,
    Dcm = 2,
    DcmManifest = 3,
    Mih = 4,
    Mif = 5,
    Nhdr = 6,
    Nrrd = 7,
    Mhd = 8,
    Mha = 9,
    Mgh = 10,
    Mgz = 11,
    V = 12,
    V16 = 13,
    Vmr = 14,
    Head = 15,
    DcmFolder = 16,
}

impl ImageType {
    /// Get the marker from its numeric code
    pub fn from_u8(value: u8) -> Option<Self> {
        let kind = match value {
            0 => ImageType::Unknown,
            1 => ImageType::Nii,
            2 => ImageType::Dcm,
            3 => ImageType::DcmManifest,
            4 => ImageType::Mih,
            5 => ImageType::Mif,
            6 => ImageType::Nhdr,
            7 => ImageType::Nrrd,
            8 => ImageType::Mhd,
            9 => ImageType::Mha,
            10 => ImageType::Mgh,
            11 => ImageType::Mgz,
            12 => ImageType::V,
            13 => ImageType::V16,
            14 => ImageType::Vmr,
            15 => ImageType::Head,
            16 => ImageType::DcmFolder,
            _ => return None,
        };
        Some(kind)
    }
}

impl From<u64> for ImageType {
    fn from(value: u64) -> Self {
        let known = u8::try_from(value).ok().and_then(ImageType::from_u8);
        known.unwrap_or_else(|| {
            tracing::warn!(code = value, "unknown image type code, reading as unknown");
            ImageType::Unknown
        })
    }
}

impl From<ImageType> for u8 {
    fn from(kind: ImageType) -> Self {
        kind as u8
    }
}

impl fmt::Display for ImageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

/// Kind of a mesh collaborator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MeshKind {
    /// Triangulated surface (or tractography fibers)
    Standard,
    /// Node/edge graph serialized through its own graph export
    Connectome,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_image_type_codes() {
        assert_eq!(ImageType::from_u8(1), Some(ImageType::Nii));
        assert_eq!(ImageType::from_u8(16), Some(ImageType::DcmFolder));
        assert_eq!(ImageType::from_u8(200), None);
        assert_eq!(u8::from(ImageType::Mgz), 11);
    }

    #[test]
    fn test_image_type_wire_format() {
        let json = serde_json::to_string(&ImageType::Nii).unwrap();
        assert_eq!(json, "1");
        let parsed: ImageType = serde_json::from_str("7").unwrap();
        assert_eq!(parsed, ImageType::Nrrd);
        let parsed: ImageType = serde_json::from_str("99").unwrap();
        assert_eq!(parsed, ImageType::Unknown);
        let parsed: ImageType = serde_json::from_str("4096").unwrap();
        assert_eq!(parsed, ImageType::Unknown);
        assert!(serde_json::from_str::<ImageType>("-1").is_err());
    }

    #[test]
    fn test_ids_are_unique() {
        assert_ne!(ImageId::new(), ImageId::new());
        assert_ne!(MeshId::new(), MeshId::new());
    }
}
