//! Page layout: field placement and page geometry
//!
//! PDF user space has its origin at the bottom-left of the page with Y
//! increasing upward. All coordinates here are in points (1/72 inch).

use std::collections::BTreeMap;
use serde::{Deserialize, Serialize};

/// Field name for the doctor overlay
pub const FIELD_DOCTOR: &str = "doctor";
/// Field name for the date overlay
pub const FIELD_DATE: &str = "date";
/// Field name for the number overlay
pub const FIELD_NUMBER: &str = "number";

/// Simple length type in millimeters
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Length(pub f64);

impl Length {
    /// Create a length from millimeters
    pub fn from_mm(mm: f64) -> Self {
        Length(mm)
    }

    /// Create a length from inches
    pub fn from_inches(inches: f64) -> Self {
        Length(inches * 25.4)
    }

    /// Create a length from points
    pub fn from_pt(pt: f64) -> Self {
        Length(pt * 25.4 / 72.0)
    }

    /// Get the value in millimeters
    pub fn mm(&self) -> f64 {
        self.0
    }

    /// Get the value in points (1/72 inch)
    pub fn pt(&self) -> f64 {
        self.0 * 72.0 / 25.4
    }
}

/// Page dimensions
#[derive(Debug, Clone, Copy)]
pub struct PageDimensions {
    pub width: Length,
    pub height: Length,
}

impl PageDimensions {
    /// US Letter size (8.5" × 11")
    pub fn letter() -> Self {
        Self {
            width: Length::from_mm(215.9),
            height: Length::from_mm(279.4),
        }
    }

    /// Build from a MediaBox `[llx lly urx ury]` in points
    pub fn from_media_box(media_box: [f32; 4]) -> Self {
        Self {
            width: Length::from_pt((media_box[2] - media_box[0]).abs() as f64),
            height: Length::from_pt((media_box[3] - media_box[1]).abs() as f64),
        }
    }
}

/// Where and how large one field's text is drawn
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldCoordinate {
    /// Baseline start, points from the left edge
    pub x: f32,
    /// Baseline, points from the bottom edge
    pub y: f32,
    /// Font size in points
    pub font_size: f32,
}

impl FieldCoordinate {
    pub fn new(x: f32, y: f32, font_size: f32) -> Self {
        Self { x, y, font_size }
    }
}

/// Fixed mapping from field name to placement on the template page
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CoordinateTable(BTreeMap<String, FieldCoordinate>);

impl CoordinateTable {
    /// An empty table; every overlay against it is a no-op
    pub fn empty() -> Self {
        Self(BTreeMap::new())
    }

    /// Placement of the three fields on the PhysicianQA template
    pub fn physician_qa() -> Self {
        let mut fields = BTreeMap::new();
        fields.insert(FIELD_DOCTOR.to_string(), FieldCoordinate::new(150.0, 652.0, 12.0));
        fields.insert(FIELD_DATE.to_string(), FieldCoordinate::new(430.0, 652.0, 12.0));
        fields.insert(FIELD_NUMBER.to_string(), FieldCoordinate::new(150.0, 610.0, 12.0));
        Self(fields)
    }

    /// Add or replace a field, returning the table (builder style)
    pub fn with(mut self, field: &str, coordinate: FieldCoordinate) -> Self {
        self.0.insert(field.to_string(), coordinate);
        self
    }

    pub fn get(&self, field: &str) -> Option<&FieldCoordinate> {
        self.0.get(field)
    }

    pub fn contains(&self, field: &str) -> bool {
        self.0.contains_key(field)
    }

    /// Iterate fields in name order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &FieldCoordinate)> {
        self.0.iter().map(|(name, coord)| (name.as_str(), coord))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Default for CoordinateTable {
    fn default() -> Self {
        Self::physician_qa()
    }
}

/// RGB color with components in 0.0..=1.0
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rgb {
    pub r: f32,
    pub g: f32,
    pub b: f32,
}

impl Rgb {
    pub const BLACK: Rgb = Rgb { r: 0.0, g: 0.0, b: 0.0 };
    pub const RED: Rgb = Rgb { r: 1.0, g: 0.0, b: 0.0 };
    pub const BLUE: Rgb = Rgb { r: 0.0, g: 0.0, b: 1.0 };
}

impl Default for Rgb {
    fn default() -> Self {
        Rgb::BLACK
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_length_conversions() {
        let len = Length::from_inches(1.0);
        assert!((len.mm() - 25.4).abs() < 0.01);
        assert!((len.pt() - 72.0).abs() < 0.01);

        let len = Length::from_pt(72.0);
        assert!((len.mm() - 25.4).abs() < 0.01);
    }

    #[test]
    fn test_letter_size() {
        let letter = PageDimensions::letter();
        assert!((letter.width.pt() - 612.0).abs() < 0.1);
        assert!((letter.height.pt() - 792.0).abs() < 0.1);
    }

    #[test]
    fn test_from_media_box() {
        let dims = PageDimensions::from_media_box([0.0, 0.0, 595.0, 842.0]);
        assert!((dims.width.pt() - 595.0).abs() < 0.01);
        assert!((dims.height.pt() - 842.0).abs() < 0.01);
    }

    #[test]
    fn test_physician_qa_table_has_exactly_three_fields() {
        let table = CoordinateTable::physician_qa();
        assert_eq!(table.len(), 3);
        assert!(table.contains(FIELD_DOCTOR));
        assert!(table.contains(FIELD_DATE));
        assert!(table.contains(FIELD_NUMBER));
        assert!(table.get("signature").is_none());
    }

    #[test]
    fn test_coordinate_table_json_shape() {
        let json = r#"{ "doctor": { "x": 10, "y": 20, "fontSize": 9 } }"#;
        let table: CoordinateTable = serde_json::from_str(json).unwrap();
        assert_eq!(table.get("doctor"), Some(&FieldCoordinate::new(10.0, 20.0, 9.0)));
        assert_eq!(table.len(), 1);
    }
}
