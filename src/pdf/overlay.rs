//! Field overlay: text drawn at a field's registered coordinate

use tracing::{debug, warn};

use crate::config::FormConfig;
use crate::layout::{CoordinateTable, FieldCoordinate, Rgb};
use super::canvas::PageCanvas;

/// What happened to one field
#[derive(Debug, Clone, PartialEq)]
pub enum OverlayOutcome {
    /// Text was drawn at this coordinate
    Drawn(FieldCoordinate),
    /// The field has no coordinate; nothing was drawn
    MissingCoordinate,
    /// Drawing failed; the rest of the document is unaffected
    Failed(String),
}

impl OverlayOutcome {
    pub fn is_drawn(&self) -> bool {
        matches!(self, OverlayOutcome::Drawn(_))
    }
}

/// Draws field values at the positions in a [`CoordinateTable`]
///
/// Neither a missing coordinate nor a draw failure is an error: both are
/// logged and reported through [`OverlayOutcome`], and the fill carries on
/// with the remaining fields.
pub struct FieldOverlayWriter<'c> {
    coordinates: &'c CoordinateTable,
    color: Rgb,
    missing_label: &'c str,
}

impl<'c> FieldOverlayWriter<'c> {
    pub fn new(coordinates: &'c CoordinateTable, color: Rgb, missing_label: &'c str) -> Self {
        Self {
            coordinates,
            color,
            missing_label,
        }
    }

    pub fn from_config(config: &'c FormConfig) -> Self {
        Self::new(
            &config.coordinates,
            config.text_color,
            &config.messages.coordinates_not_found,
        )
    }

    /// Draw `value` for `field` onto the page
    pub fn overlay(&self, page: &mut PageCanvas<'_>, field: &str, value: &str) -> OverlayOutcome {
        let Some(coordinate) = self.coordinates.get(field) else {
            warn!(field, "{}: {}", self.missing_label, field);
            return OverlayOutcome::MissingCoordinate;
        };

        debug!(field, value, x = coordinate.x, y = coordinate.y, "Adding text");

        match page.draw_text(value, coordinate.x, coordinate.y, coordinate.font_size, self.color) {
            Ok(()) => OverlayOutcome::Drawn(*coordinate),
            Err(e) => {
                warn!(field, error = %e, "Error adding text for field");
                OverlayOutcome::Failed(e.to_string())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lopdf::content::Content;
    use lopdf::{Dictionary, Document, Object, Stream};
    use crate::layout::{FIELD_DATE, FIELD_DOCTOR, FIELD_NUMBER};

    fn blank_page() -> Document {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        let content_id = doc.add_object(Stream::new(Dictionary::new(), Vec::new()));
        let page_id = doc.add_object(Object::Dictionary(Dictionary::from_iter(vec![
            ("Type", Object::Name(b"Page".to_vec())),
            ("Parent", Object::Reference(pages_id)),
            ("Contents", Object::Reference(content_id)),
        ])));
        doc.objects.insert(pages_id, Object::Dictionary(Dictionary::from_iter(vec![
            ("Type", Object::Name(b"Pages".to_vec())),
            ("Count", Object::Integer(1)),
            ("Kids", Object::Array(vec![Object::Reference(page_id)])),
        ])));
        let catalog_id = doc.add_object(Object::Dictionary(Dictionary::from_iter(vec![
            ("Type", Object::Name(b"Catalog".to_vec())),
            ("Pages", Object::Reference(pages_id)),
        ])));
        doc.trailer.set("Root", Object::Reference(catalog_id));
        doc
    }

    /// (x, y, text) of every Td/Tj pair on the first page
    fn placed_text(doc: &Document) -> Vec<(f32, f32, Vec<u8>)> {
        let page_id = doc.get_pages()[&1];
        let content = Content::decode(&doc.get_page_content(page_id).unwrap()).unwrap();

        let mut placed = Vec::new();
        let mut position = (0.0, 0.0);
        for op in &content.operations {
            match op.operator.as_str() {
                "Td" => {
                    position = (
                        op.operands[0].as_float().unwrap(),
                        op.operands[1].as_float().unwrap(),
                    );
                }
                "Tj" => {
                    placed.push((position.0, position.1, op.operands[0].as_str().unwrap().to_vec()));
                }
                _ => {}
            }
        }
        placed
    }

    #[test]
    fn test_recognized_fields_land_on_their_coordinates() {
        let table = CoordinateTable::physician_qa();
        let writer = FieldOverlayWriter::new(&table, Rgb::BLACK, "No coordinates found for field");
        let mut doc = blank_page();

        {
            let mut canvas = PageCanvas::first_page(&mut doc).unwrap();
            for (field, value) in [(FIELD_DOCTOR, "Dr. Wheatley"), (FIELD_DATE, "05/03/2024"), (FIELD_NUMBER, "7")] {
                let outcome = writer.overlay(&mut canvas, field, value);
                assert_eq!(outcome, OverlayOutcome::Drawn(*table.get(field).unwrap()));
            }
        }

        let placed = placed_text(&doc);
        assert_eq!(placed.len(), 3);
        for ((field, value), (x, y, text)) in [
            (FIELD_DOCTOR, "Dr. Wheatley"),
            (FIELD_DATE, "05/03/2024"),
            (FIELD_NUMBER, "7"),
        ]
        .iter()
        .zip(placed)
        {
            let coord = table.get(field).unwrap();
            assert_eq!((x, y), (coord.x, coord.y), "field {}", field);
            assert_eq!(text, value.as_bytes());
        }
    }

    #[test]
    fn test_unrecognized_field_is_noop() {
        let table = CoordinateTable::physician_qa();
        let writer = FieldOverlayWriter::new(&table, Rgb::BLACK, "No coordinates found for field");
        let mut doc = blank_page();
        let before = doc.get_dictionary(doc.get_pages()[&1]).unwrap().clone();

        {
            let mut canvas = PageCanvas::first_page(&mut doc).unwrap();
            assert_eq!(writer.overlay(&mut canvas, "signature", "X"), OverlayOutcome::MissingCoordinate);
        }

        let after = doc.get_dictionary(doc.get_pages()[&1]).unwrap();
        assert_eq!(format!("{:?}", before), format!("{:?}", after));
        assert!(placed_text(&doc).is_empty());
    }

    #[test]
    fn test_empty_table_draws_nothing() {
        let table = CoordinateTable::empty();
        let writer = FieldOverlayWriter::new(&table, Rgb::BLACK, "missing");
        let mut doc = blank_page();
        {
            let mut canvas = PageCanvas::first_page(&mut doc).unwrap();
            assert!(!writer.overlay(&mut canvas, FIELD_DOCTOR, "x").is_drawn());
        }
        assert!(placed_text(&doc).is_empty());
    }

    #[test]
    fn test_draw_failure_is_reported_not_raised() {
        let table = CoordinateTable::physician_qa();
        let writer = FieldOverlayWriter::new(&table, Rgb::BLACK, "missing");
        let mut doc = blank_page();
        let bogus = doc.add_object(Object::Null);

        let mut canvas = PageCanvas::new(&mut doc, bogus);
        assert!(matches!(
            writer.overlay(&mut canvas, FIELD_NUMBER, "3"),
            OverlayOutcome::Failed(_)
        ));
    }
}
