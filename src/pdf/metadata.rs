//! PDF metadata extraction

use std::path::Path;
use lopdf::{Document, Object};
use crate::error::{Error, Result};

/// Count pages by reading the Count field from the Pages dictionary
/// This is more reliable than get_pages() which doesn't handle nested page trees
pub fn count_pages_in(doc: &Document) -> Result<usize> {
    let catalog = doc.catalog()
        .map_err(|_| Error::General("No catalog in trailer".to_string()))?;

    let pages_id = catalog.get(b"Pages")
        .and_then(|p| p.as_reference())
        .map_err(|_| Error::General("No Pages reference in catalog".to_string()))?;

    let pages_dict = doc.get_dictionary(pages_id)?;

    match pages_dict.get(b"Count") {
        Ok(Object::Integer(n)) if *n >= 0 => Ok(*n as usize),
        Ok(_) => Err(Error::General("Count is not a non-negative integer".to_string())),
        Err(_) => Err(Error::General("No Count in Pages".to_string())),
    }
}

/// PDF metadata
#[derive(Debug, Clone)]
pub struct PdfMetadata {
    /// Number of pages in the PDF
    pub page_count: usize,
    /// Document title (if present)
    pub title: Option<String>,
    /// Document author (if present)
    pub author: Option<String>,
    /// Serialized size in bytes
    pub size: usize,
}

/// Read a text entry from the Info dictionary
fn info_string(doc: &Document, key: &[u8]) -> Option<String> {
    let info_id = doc.trailer.get(b"Info").and_then(|i| i.as_reference()).ok()?;
    let info = doc.get_dictionary(info_id).ok()?;
    let bytes = info.get(key).and_then(|v| v.as_str()).ok()?;
    String::from_utf8(bytes.to_vec()).ok()
}

/// Extract metadata from an in-memory PDF
pub fn extract_metadata_mem(bytes: &[u8]) -> Result<PdfMetadata> {
    let doc = Document::load_mem(bytes)?;
    let page_count = count_pages_in(&doc)?;

    Ok(PdfMetadata {
        page_count,
        title: info_string(&doc, b"Title"),
        author: info_string(&doc, b"Author"),
        size: bytes.len(),
    })
}

/// Extract metadata from a PDF file
pub fn extract_metadata(path: &Path) -> Result<PdfMetadata> {
    let bytes = read_existing(path)?;
    let metadata = extract_metadata_mem(&bytes)?;

    if metadata.page_count == 0 {
        return Err(Error::General(format!("PDF has no pages: {}", path.display())));
    }

    Ok(metadata)
}

/// Count the number of pages in an in-memory PDF
pub fn count_pages_mem(bytes: &[u8]) -> Result<usize> {
    let doc = Document::load_mem(bytes)?;
    count_pages_in(&doc)
}

/// Count the number of pages in a PDF file
pub fn count_pages(path: &Path) -> Result<usize> {
    let bytes = read_existing(path)?;
    count_pages_mem(&bytes)
}

fn read_existing(path: &Path) -> Result<Vec<u8>> {
    if !path.exists() {
        return Err(Error::Io(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            format!("File not found: {}", path.display()),
        )));
    }
    Ok(std::fs::read(path)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_count_pages_nonexistent_file() {
        let result = count_pages(Path::new("nonexistent.pdf"));
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("File not found"));
    }

    #[test]
    fn test_extract_metadata_nonexistent_file() {
        let result = extract_metadata(Path::new("nonexistent.pdf"));
        assert!(matches!(result.unwrap_err(), Error::Io(_)));
    }

    #[test]
    fn test_count_pages_mem_rejects_garbage() {
        assert!(count_pages_mem(b"%PDF-1.4 garbage").is_err());
    }

    // Integration tests with generated PDFs are in tests/ directory
}
