//! Utility functions

use crate::error::{DocumentError, Result};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde_json::Value;

/// Encode a binary payload for embedding in the textual container
pub fn encode_base64(bytes: &[u8]) -> String {
    STANDARD.encode(bytes)
}

/// Decode a payload previously produced by [`encode_base64`]
pub fn decode_base64(text: &str) -> Result<Vec<u8>> {
    Ok(STANDARD.decode(text.trim())?)
}

/// Convert little-endian bytes to `f32` values
pub fn bytes_to_f32(bytes: &[u8]) -> Result<Vec<f32>> {
    if bytes.len() % 4 != 0 {
        return Err(DocumentError::Encoding(
            "Byte length not aligned with Float32 size".to_string(),
        ));
    }
    Ok(bytes
        .chunks_exact(4)
        .map(|c| f32::from_le_bytes([c[0], c[1], c[2], c[3]]))
        .collect())
}

/// Convert little-endian bytes to `u32` values
pub fn bytes_to_u32(bytes: &[u8]) -> Result<Vec<u32>> {
    if bytes.len() % 4 != 0 {
        return Err(DocumentError::Encoding(
            "Byte length not aligned with Uint32 size".to_string(),
        ));
    }
    Ok(bytes
        .chunks_exact(4)
        .map(|c| u32::from_le_bytes([c[0], c[1], c[2], c[3]]))
        .collect())
}

/// Convert `f32` values to little-endian bytes
pub fn f32_to_bytes(data: &[f32]) -> Vec<u8> {
    data.iter().flat_map(|v| v.to_le_bytes()).collect()
}

/// Convert `u32` values to little-endian bytes
pub fn u32_to_bytes(data: &[u32]) -> Vec<u8> {
    data.iter().flat_map(|v| v.to_le_bytes()).collect()
}

/// Deep-merge `overlay` into `base`.
///
/// Objects merge key by key, every other value in `overlay` replaces the
/// corresponding value in `base`. `null` in the overlay keeps the base value.
pub fn merge_json(base: &mut Value, overlay: Value) {
    match (base, overlay) {
        (Value::Object(base_map), Value::Object(overlay_map)) => {
            for (key, value) in overlay_map {
                match base_map.get_mut(&key) {
                    Some(existing) => merge_json(existing, value),
                    None => {
                        base_map.insert(key, value);
                    }
                }
            }
        }
        (_, Value::Null) => {}
        (slot, value) => *slot = value,
    }
}

/// Fail unless every value can be written as a JSON number
pub fn ensure_finite(field: &str, values: &[f64]) -> Result<()> {
    if values.iter().all(|v| v.is_finite()) {
        Ok(())
    } else {
        Err(DocumentError::Serialization(format!(
            "{} holds a non-finite value",
            field
        )))
    }
}

/// Format byte size in human-readable form
pub fn format_bytes(bytes: usize) -> String {
    const UNITS: &[&str] = &["B", "KB", "MB", "GB", "TB", "PB"];

    let mut size = bytes as f64;
    let mut unit_idx = 0;

    while size >= 1024.0 && unit_idx < UNITS.len() - 1 {
        size /= 1024.0;
        unit_idx += 1;
    }

    if unit_idx == 0 {
        format!("{} {}", bytes, UNITS[0])
    } else {
        format!("{:.2} {}", size, UNITS[unit_idx])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_base64() {
        let data = vec![0u8, 1, 2, 250, 255];
        let text = encode_base64(&data);
        assert_eq!(decode_base64(&text).unwrap(), data);
        assert!(decode_base64("not base64!").is_err());
    }

    #[test]
    fn test_typed_bytes() {
        let data = vec![1.5f32, -2.0, 3.25];
        assert_eq!(bytes_to_f32(&f32_to_bytes(&data)).unwrap(), data);
        assert_eq!(bytes_to_u32(&u32_to_bytes(&[7, 9])).unwrap(), vec![7, 9]);
        assert!(bytes_to_f32(&[0, 1, 2]).is_err());
    }

    #[test]
    fn test_ensure_finite() {
        assert!(ensure_finite("pos", &[0.0, -1.5, 1e300]).is_ok());
        assert!(ensure_finite("pos", &[0.0, f64::NAN]).is_err());
        assert!(ensure_finite("pos", &[f64::NEG_INFINITY]).is_err());
    }

    #[test]
    fn test_merge_json() {
        let mut base = json!({"a": 1, "b": {"c": 2, "d": 3}, "e": [1, 2]});
        merge_json(
            &mut base,
            json!({"b": {"c": 5}, "e": [9], "f": true, "a": null}),
        );
        assert_eq!(
            base,
            json!({"a": 1, "b": {"c": 5, "d": 3}, "e": [9], "f": true})
        );
    }

    #[test]
    fn test_format_bytes() {
        assert_eq!(format_bytes(512), "512 B");
        assert_eq!(format_bytes(1536), "1.50 KB");
        assert_eq!(format_bytes(1048576), "1.00 MB");
    }
}
