//! 3D text labels attached to a scene

use crate::types::{Vec3, Vec4};
use serde::{Deserialize, Serialize};

/// Horizontal alignment of label text
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TextAlignment {
    #[default]
    Left,
    Center,
    Right,
}

/// Shape drawn at the end of a label's leader line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum LineTerminator {
    #[default]
    None,
    Circle,
    Ring,
}

/// Screen corner or edge a label is pinned to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum LabelAnchor {
    TopLeft,
    TopCenter,
    TopRight,
    MiddleLeft,
    MiddleCenter,
    MiddleRight,
    BottomLeft,
    BottomCenter,
    BottomRight,
}

/// One point or a list of points in millimeter space
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum LabelPoints {
    Single(Vec3),
    Many(Vec<Vec3>),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LabelStyle {
    pub text_color: Vec4,
    pub text_scale: f64,
    pub text_alignment: TextAlignment,
    pub line_width: f64,
    pub line_color: Vec4,
    pub line_terminator: LineTerminator,
    pub bullet_scale: Option<f64>,
    pub bullet_color: Option<Vec4>,
    pub background_color: Option<Vec4>,
}

impl Default for LabelStyle {
    fn default() -> Self {
        Self {
            text_color: [1.0, 1.0, 1.0, 1.0],
            text_scale: 1.0,
            text_alignment: TextAlignment::Left,
            line_width: 0.0,
            line_color: [0.0, 0.0, 0.0, 1.0],
            line_terminator: LineTerminator::None,
            bullet_scale: None,
            bullet_color: None,
            background_color: None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Label3D {
    pub text: String,
    pub style: LabelStyle,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub points: Option<LabelPoints>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub anchor: Option<LabelAnchor>,
}

impl Label3D {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Self::default()
        }
    }

    pub fn with_style(mut self, style: LabelStyle) -> Self {
        self.style = style;
        self
    }

    pub fn with_point(mut self, point: Vec3) -> Self {
        self.points = Some(LabelPoints::Single(point));
        self
    }

    pub fn with_points(mut self, points: Vec<Vec3>) -> Self {
        self.points = Some(LabelPoints::Many(points));
        self
    }

    pub fn with_anchor(mut self, anchor: LabelAnchor) -> Self {
        self.anchor = Some(anchor);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_points_shapes() {
        let single: LabelPoints = serde_json::from_value(json!([1.0, 2.0, 3.0])).unwrap();
        assert_eq!(single, LabelPoints::Single([1.0, 2.0, 3.0]));
        let many: LabelPoints =
            serde_json::from_value(json!([[1.0, 2.0, 3.0], [4.0, 5.0, 6.0]])).unwrap();
        assert_eq!(many, LabelPoints::Many(vec![[1.0, 2.0, 3.0], [4.0, 5.0, 6.0]]));
    }

    #[test]
    fn test_label_wire_format() {
        let label = Label3D::new("hippocampus")
            .with_point([10.0, -20.0, 5.0])
            .with_anchor(LabelAnchor::TopRight);
        let value = serde_json::to_value(&label).unwrap();
        assert_eq!(value["anchor"], json!("topRight"));
        assert_eq!(value["style"]["textAlignment"], json!("left"));
        let parsed: Label3D = serde_json::from_value(value).unwrap();
        assert_eq!(parsed, label);
    }
}
