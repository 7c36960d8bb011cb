//! PDF manipulation module

pub mod canvas;
pub mod debug;
pub mod fill;
pub mod merge;
pub mod metadata;
pub mod overlay;

// Re-export commonly used items
pub use canvas::PageCanvas;
pub use debug::draw_debug_overlay;
pub use fill::DocumentFiller;
pub use merge::{assemble, combine_documents, to_bytes, PageSelection};
pub use metadata::{count_pages, count_pages_mem, extract_metadata, extract_metadata_mem, PdfMetadata};
pub use overlay::{FieldOverlayWriter, OverlayOutcome};
