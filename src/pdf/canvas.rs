//! Drawing text and lines onto an existing PDF page using lopdf
//!
//! Every draw call appends a small content stream to the page. Before the
//! first draw, the page's original content is wrapped in a `q`/`Q` pair so
//! any transformation it leaves behind does not move our overlay; overlay
//! coordinates are therefore always in default user space.

use std::collections::HashSet;

use lopdf::{Dictionary, Document, Object, ObjectId, Stream};

use crate::error::{Error, Result};
use crate::layout::{PageDimensions, Rgb};

/// Resource name of the overlay font, chosen not to clash with template fonts
pub const FONT_RESOURCE: &str = "PQAHelv";

/// A page of a document we are allowed to draw on
pub struct PageCanvas<'a> {
    doc: &'a mut Document,
    page_id: ObjectId,
    isolated: bool,
    font_registered: bool,
    graphics_states: HashSet<String>,
}

impl<'a> PageCanvas<'a> {
    pub fn new(doc: &'a mut Document, page_id: ObjectId) -> Self {
        Self {
            doc,
            page_id,
            isolated: false,
            font_registered: false,
            graphics_states: HashSet::new(),
        }
    }

    /// Canvas over the document's first page
    pub fn first_page(doc: &'a mut Document) -> Result<Self> {
        let page_id = doc
            .get_pages()
            .values()
            .next()
            .copied()
            .ok_or_else(|| Error::General("Document has no pages".to_string()))?;
        Ok(Self::new(doc, page_id))
    }

    pub fn page_id(&self) -> ObjectId {
        self.page_id
    }

    /// The page's MediaBox `[llx lly urx ury]`, US Letter at the origin if it
    /// can't be read
    pub fn media_box(&self) -> [f32; 4] {
        self.doc
            .get_dictionary(self.page_id)
            .and_then(|page| page.get(b"MediaBox"))
            .and_then(|mb| mb.as_array())
            .ok()
            .and_then(|values| {
                let nums: Vec<f32> = values.iter().filter_map(|v| v.as_float().ok()).collect();
                match nums.as_slice() {
                    [a, b, c, d] => Some([a.min(*c), b.min(*d), a.max(*c), b.max(*d)]),
                    _ => None,
                }
            })
            .unwrap_or([0.0, 0.0, 612.0, 792.0])
    }

    /// Page size from the MediaBox
    pub fn page_size(&self) -> PageDimensions {
        PageDimensions::from_media_box(self.media_box())
    }

    /// Draw a single line of text with its baseline starting at (x, y)
    pub fn draw_text(&mut self, text: &str, x: f32, y: f32, size: f32, color: Rgb) -> Result<()> {
        self.prepare()?;
        self.ensure_font()?;

        let mut content = Vec::new();
        content.extend_from_slice(b"q\nBT\n");
        content.extend_from_slice(format!("{} {} {} rg\n", color.r, color.g, color.b).as_bytes());
        content.extend_from_slice(format!("/{} {} Tf\n", FONT_RESOURCE, size).as_bytes());
        content.extend_from_slice(format!("{} {} Td\n", x, y).as_bytes());
        content.push(b'(');
        content.extend(escape_pdf_string(&encode_win_ansi(text)));
        content.extend_from_slice(b") Tj\nET\nQ\n");

        self.append_content(content)
    }

    /// Stroke a straight line, optionally translucent
    pub fn draw_line(
        &mut self,
        start: (f32, f32),
        end: (f32, f32),
        thickness: f32,
        color: Rgb,
        opacity: f32,
    ) -> Result<()> {
        self.prepare()?;
        let gs = self.ensure_opacity(opacity)?;

        let content = format!(
            "q\n/{gs} gs\n{r} {g} {b} RG\n{w} w\n{x1} {y1} m\n{x2} {y2} l\nS\nQ\n",
            gs = gs,
            r = color.r,
            g = color.g,
            b = color.b,
            w = thickness,
            x1 = start.0,
            y1 = start.1,
            x2 = end.0,
            y2 = end.1,
        );

        self.append_content(content.into_bytes())
    }

    /// Verify the page is drawable and isolate its original content once
    fn prepare(&mut self) -> Result<()> {
        self.doc.get_dictionary(self.page_id)?;

        if !self.isolated {
            let save_id = self.doc.add_object(Stream::new(Dictionary::new(), b"q\n".to_vec()));
            let restore_id = self.doc.add_object(Stream::new(Dictionary::new(), b"Q\n".to_vec()));
            prepend_content_to_page(self.doc, self.page_id, save_id)?;
            append_content_to_page(self.doc, self.page_id, restore_id)?;
            self.isolated = true;
        }

        Ok(())
    }

    fn ensure_font(&mut self) -> Result<()> {
        if !self.font_registered {
            let font_id = use_helvetica_font(self.doc);
            add_page_resource(self.doc, self.page_id, b"Font", FONT_RESOURCE, font_id)?;
            self.font_registered = true;
        }
        Ok(())
    }

    /// Register an ExtGState for the given opacity and return its name
    fn ensure_opacity(&mut self, opacity: f32) -> Result<String> {
        let opacity = opacity.clamp(0.0, 1.0);
        let name = format!("PQAGs{}", (opacity * 100.0).round() as u32);

        if !self.graphics_states.contains(&name) {
            let mut gs = Dictionary::new();
            gs.set("Type", Object::Name(b"ExtGState".to_vec()));
            gs.set("CA", Object::Real(opacity));
            gs.set("ca", Object::Real(opacity));
            let gs_id = self.doc.add_object(Object::Dictionary(gs));

            add_page_resource(self.doc, self.page_id, b"ExtGState", &name, gs_id)?;
            self.graphics_states.insert(name.clone());
        }

        Ok(name)
    }

    fn append_content(&mut self, content: Vec<u8>) -> Result<()> {
        let stream_id = self.doc.add_object(Stream::new(Dictionary::new(), content));
        append_content_to_page(self.doc, self.page_id, stream_id)
    }
}

/// Use Helvetica (standard PDF font - nothing to embed)
fn use_helvetica_font(doc: &mut Document) -> ObjectId {
    let mut font = Dictionary::new();
    font.set("Type", Object::Name(b"Font".to_vec()));
    font.set("Subtype", Object::Name(b"Type1".to_vec()));
    font.set("BaseFont", Object::Name(b"Helvetica".to_vec()));
    font.set("Encoding", Object::Name(b"WinAnsiEncoding".to_vec()));

    doc.add_object(Object::Dictionary(font))
}

/// Map text to single-byte WinAnsi codes; anything WinAnsi lacks becomes '?'
fn encode_win_ansi(text: &str) -> Vec<u8> {
    text.chars()
        .map(|c| match c as u32 {
            code @ 0x20..=0x7E => code as u8,
            code @ 0xA0..=0xFF => code as u8,
            _ => win_ansi_extra(c).unwrap_or(b'?'),
        })
        .collect()
}

/// Characters WinAnsi places in 0x80-0x9F, where Latin-1 has controls
fn win_ansi_extra(c: char) -> Option<u8> {
    let code = match c {
        '\u{20AC}' => 0x80, // euro
        '\u{201A}' => 0x82,
        '\u{0192}' => 0x83,
        '\u{201E}' => 0x84,
        '\u{2026}' => 0x85,
        '\u{2020}' => 0x86,
        '\u{2021}' => 0x87,
        '\u{02C6}' => 0x88,
        '\u{2030}' => 0x89,
        '\u{0160}' => 0x8A,
        '\u{2039}' => 0x8B,
        '\u{0152}' => 0x8C,
        '\u{017D}' => 0x8E,
        '\u{2018}' => 0x91,
        '\u{2019}' => 0x92,
        '\u{201C}' => 0x93,
        '\u{201D}' => 0x94,
        '\u{2022}' => 0x95,
        '\u{2013}' => 0x96,
        '\u{2014}' => 0x97,
        '\u{02DC}' => 0x98,
        '\u{2122}' => 0x99,
        '\u{0161}' => 0x9A,
        '\u{203A}' => 0x9B,
        '\u{0153}' => 0x9C,
        '\u{017E}' => 0x9E,
        '\u{0178}' => 0x9F,
        _ => return None,
    };
    Some(code)
}

/// Escape special characters in PDF literal strings
fn escape_pdf_string(bytes: &[u8]) -> Vec<u8> {
    let mut escaped = Vec::with_capacity(bytes.len());
    for &b in bytes {
        if matches!(b, b'\\' | b'(' | b')') {
            escaped.push(b'\\');
        }
        escaped.push(b);
    }
    escaped
}

/// Resolve a possibly-indirect dictionary to an owned copy
fn resolve_dictionary(doc: &Document, object: &Object) -> Dictionary {
    match object {
        Object::Dictionary(dict) => dict.clone(),
        Object::Reference(id) => doc.get_dictionary(*id).cloned().unwrap_or_else(|_| Dictionary::new()),
        _ => Dictionary::new(),
    }
}

/// Add `/category << /name id >>` to the page's Resources
///
/// The page gets its own direct Resources dictionary so shared resource
/// dictionaries of the template are never modified.
fn add_page_resource(
    doc: &mut Document,
    page_id: ObjectId,
    category: &[u8],
    name: &str,
    object_id: ObjectId,
) -> Result<()> {
    let mut resources = {
        let page_dict = doc.get_dictionary(page_id)?;
        match page_dict.get(b"Resources") {
            Ok(res) => resolve_dictionary(doc, res),
            Err(_) => Dictionary::new(),
        }
    };

    let mut entries = match resources.get(category) {
        Ok(existing) => resolve_dictionary(doc, existing),
        Err(_) => Dictionary::new(),
    };
    entries.set(name, Object::Reference(object_id));
    resources.set(category.to_vec(), Object::Dictionary(entries));

    let page_dict = doc.get_dictionary_mut(page_id)?;
    page_dict.set("Resources", Object::Dictionary(resources));

    Ok(())
}

/// Where a new content stream goes relative to the page's existing ones
#[derive(Clone, Copy)]
enum Placement {
    Before,
    After,
}

fn prepend_content_to_page(doc: &mut Document, page_id: ObjectId, new_content_id: ObjectId) -> Result<()> {
    splice_content(doc, page_id, new_content_id, Placement::Before)
}

/// Appended content is drawn on top of the template
fn append_content_to_page(doc: &mut Document, page_id: ObjectId, new_content_id: ObjectId) -> Result<()> {
    splice_content(doc, page_id, new_content_id, Placement::After)
}

/// Rewrite the page's Contents as a direct array including the new stream
///
/// Contents may be a single stream reference, a direct array, or a reference
/// to an array; all three are flattened to a direct array.
fn splice_content(
    doc: &mut Document,
    page_id: ObjectId,
    new_content_id: ObjectId,
    placement: Placement,
) -> Result<()> {
    let existing = doc.get_dictionary(page_id)?.get(b"Contents").ok().cloned();

    let mut streams = match existing {
        Some(Object::Reference(id)) => match doc.get_object(id) {
            Ok(Object::Array(items)) => items.clone(),
            _ => vec![Object::Reference(id)],
        },
        Some(Object::Array(items)) => items,
        _ => Vec::new(),
    };

    match placement {
        Placement::Before => streams.insert(0, Object::Reference(new_content_id)),
        Placement::After => streams.push(Object::Reference(new_content_id)),
    }

    doc.get_dictionary_mut(page_id)?.set("Contents", Object::Array(streams));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use lopdf::content::Content;

    fn single_page_doc(contents: &[u8]) -> (Document, ObjectId) {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        let content_id = doc.add_object(Stream::new(Dictionary::new(), contents.to_vec()));
        let page_id = doc.add_object(Object::Dictionary(Dictionary::from_iter(vec![
            ("Type", Object::Name(b"Page".to_vec())),
            ("Parent", Object::Reference(pages_id)),
            ("Contents", Object::Reference(content_id)),
            ("MediaBox", Object::Array(vec![
                Object::Integer(0),
                Object::Integer(0),
                Object::Integer(595),
                Object::Integer(842),
            ])),
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
        (doc, page_id)
    }

    #[test]
    fn test_escape_pdf_string() {
        assert_eq!(escape_pdf_string(b"a(b)c\\"), b"a\\(b\\)c\\\\".to_vec());
    }

    #[test]
    fn test_encode_win_ansi() {
        assert_eq!(encode_win_ansi("Dr. Zoë"), vec![b'D', b'r', b'.', b' ', b'Z', b'o', 0xEB]);
        assert_eq!(encode_win_ansi("李"), b"?".to_vec());
    }

    #[test]
    fn test_encode_win_ansi_punctuation_range() {
        assert_eq!(
            encode_win_ansi("\u{20AC}5 \u{2018}a\u{2019} \u{201C}b\u{201D} 1\u{2013}2\u{2014}3"),
            vec![0x80, b'5', b' ', 0x91, b'a', 0x92, b' ', 0x93, b'b', 0x94, b' ', b'1', 0x96, b'2', 0x97, b'3']
        );
        assert_eq!(encode_win_ansi("\u{2122}\u{0178}"), vec![0x99, 0x9F]);
        // C1 controls are not printable
        assert_eq!(encode_win_ansi("\u{0081}"), b"?".to_vec());
    }

    #[test]
    fn test_draw_text_wraps_original_and_registers_font() {
        let (mut doc, page_id) = single_page_doc(b"2 0 0 2 0 0 cm\n");
        {
            let mut canvas = PageCanvas::new(&mut doc, page_id);
            canvas.draw_text("Hello", 100.0, 200.0, 12.0, Rgb::BLACK).unwrap();
        }

        let content = Content::decode(&doc.get_page_content(page_id).unwrap()).unwrap();
        let ops: Vec<&str> = content.operations.iter().map(|op| op.operator.as_str()).collect();

        // q (original cm) Q, then the overlay
        assert_eq!(ops[0], "q");
        assert_eq!(ops[1], "cm");
        assert_eq!(ops[2], "Q");
        assert!(ops.contains(&"Tj"));

        let td = content.operations.iter().find(|op| op.operator == "Td").unwrap();
        assert_eq!(td.operands[0].as_float().unwrap(), 100.0);
        assert_eq!(td.operands[1].as_float().unwrap(), 200.0);

        let resources = doc.get_dictionary(page_id).unwrap().get(b"Resources").unwrap().as_dict().unwrap();
        let fonts = resources.get(b"Font").unwrap().as_dict().unwrap();
        assert!(fonts.has(FONT_RESOURCE.as_bytes()));
    }

    #[test]
    fn test_isolation_happens_once() {
        let (mut doc, page_id) = single_page_doc(b"");
        {
            let mut canvas = PageCanvas::new(&mut doc, page_id);
            canvas.draw_text("a", 1.0, 1.0, 8.0, Rgb::BLACK).unwrap();
            canvas.draw_text("b", 2.0, 2.0, 8.0, Rgb::BLACK).unwrap();
        }

        let contents = doc.get_dictionary(page_id).unwrap().get(b"Contents").unwrap().as_array().unwrap();
        // save, original, restore, two overlays
        assert_eq!(contents.len(), 5);
    }

    #[test]
    fn test_indirect_contents_array_is_flattened() {
        let (mut doc, page_id) = single_page_doc(b"");
        let original = doc.get_dictionary(page_id).unwrap().get(b"Contents").unwrap().clone();
        let array_id = doc.add_object(Object::Array(vec![original]));
        doc.get_dictionary_mut(page_id).unwrap().set("Contents", Object::Reference(array_id));

        PageCanvas::new(&mut doc, page_id)
            .draw_text("x", 0.0, 0.0, 10.0, Rgb::BLACK)
            .unwrap();

        let contents = doc.get_dictionary(page_id).unwrap().get(b"Contents").unwrap().as_array().unwrap();
        assert_eq!(contents.len(), 4);
        assert!(contents.iter().all(|c| c.as_reference().is_ok()));
    }

    #[test]
    fn test_draw_line_registers_opacity_state() {
        let (mut doc, page_id) = single_page_doc(b"");
        {
            let mut canvas = PageCanvas::new(&mut doc, page_id);
            canvas.draw_line((0.0, 0.0), (10.0, 0.0), 0.5, Rgb::BLUE, 0.7).unwrap();
            canvas.draw_line((0.0, 5.0), (10.0, 5.0), 0.5, Rgb::BLUE, 0.7).unwrap();
        }

        let resources = doc.get_dictionary(page_id).unwrap().get(b"Resources").unwrap().as_dict().unwrap();
        let states = resources.get(b"ExtGState").unwrap().as_dict().unwrap();
        assert_eq!(states.len(), 1);
        assert!(states.has(b"PQAGs70"));
    }

    #[test]
    fn test_page_size_from_media_box() {
        let (mut doc, page_id) = single_page_doc(b"");
        let canvas = PageCanvas::new(&mut doc, page_id);
        let size = canvas.page_size();
        assert!((size.width.pt() - 595.0).abs() < 0.01);
        assert!((size.height.pt() - 842.0).abs() < 0.01);
    }

    #[test]
    fn test_media_box_is_normalized() {
        let (mut doc, page_id) = single_page_doc(b"");
        doc.get_dictionary_mut(page_id).unwrap().set(
            "MediaBox",
            Object::Array(vec![
                Object::Integer(712),
                Object::Integer(992),
                Object::Integer(100),
                Object::Integer(200),
            ]),
        );
        let canvas = PageCanvas::new(&mut doc, page_id);
        assert_eq!(canvas.media_box(), [100.0, 200.0, 712.0, 992.0]);
    }

    #[test]
    fn test_draw_on_non_dictionary_fails() {
        let (mut doc, _) = single_page_doc(b"");
        let bogus = doc.add_object(Object::Integer(7));
        let mut canvas = PageCanvas::new(&mut doc, bogus);
        assert!(canvas.draw_text("x", 0.0, 0.0, 10.0, Rgb::BLACK).is_err());
    }
}
