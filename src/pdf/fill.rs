//! Filling the template with one document's values

use std::sync::Arc;

use lopdf::Document;
use tracing::{debug, error, warn};

use crate::config::FormConfig;
use crate::date::format_date;
use crate::document::{DocumentRequest, FilledDocument};
use crate::error::{Error, Result};
use crate::filename::pdf_filename_with;
use crate::layout::{FIELD_DATE, FIELD_DOCTOR, FIELD_NUMBER};
use crate::template::TemplateSource;
use super::canvas::PageCanvas;
use super::debug::draw_debug_overlay;
use super::merge::{assemble, to_bytes, PageSelection};
use super::overlay::FieldOverlayWriter;

/// Produces filled copies of the template
///
/// The template is read again for every fill; nothing is cached between
/// documents.
#[derive(Debug, Clone)]
pub struct DocumentFiller {
    config: Arc<FormConfig>,
    template: TemplateSource,
}

impl DocumentFiller {
    pub fn new(config: Arc<FormConfig>, template: TemplateSource) -> Self {
        Self { config, template }
    }

    pub fn config(&self) -> &FormConfig {
        &self.config
    }

    pub fn template(&self) -> &TemplateSource {
        &self.template
    }

    /// Fill one document and return the serialized PDF
    ///
    /// A template that cannot be loaded is reported as
    /// [`Error::TemplateLoad`]; anything that goes wrong afterwards is a
    /// single [`Error::PdfProcessing`].
    pub fn fill(&self, request: &DocumentRequest) -> Result<Vec<u8>> {
        debug!(doctor = %request.doctor, date = %request.date, number = request.number, "Starting PDF generation");
        let template = self.template.load(&self.config.messages)?;
        self.fill_from_bytes(&template, request)
    }

    /// Fill one document and name it
    pub fn fill_document(&self, request: &DocumentRequest) -> Result<FilledDocument> {
        let data = self.fill(request)?;
        Ok(FilledDocument {
            name: pdf_filename_with(&request.doctor, &request.date, request.number, &self.config.filename),
            date: request.date,
            data,
        })
    }

    /// Fill using template bytes the caller already holds
    pub fn fill_from_bytes(&self, template: &[u8], request: &DocumentRequest) -> Result<Vec<u8>> {
        self.render(template, request).map_err(|e| {
            error!(error = %e, "Error creating filled PDF");
            Error::processing(&self.config.messages.pdf_processing_failed, e)
        })
    }

    fn render(&self, template: &[u8], request: &DocumentRequest) -> Result<Vec<u8>> {
        let original = Document::load_mem(template)?;

        // Fresh document holding only a copy of the template's first page
        let mut doc = assemble(vec![(original, PageSelection::First)])?;

        {
            let mut page = PageCanvas::first_page(&mut doc)?;
            let writer = FieldOverlayWriter::from_config(&self.config);

            writer.overlay(&mut page, FIELD_DOCTOR, &request.doctor);
            writer.overlay(&mut page, FIELD_DATE, &format_date(&request.date));
            writer.overlay(&mut page, FIELD_NUMBER, &request.number.to_string());

            if self.config.debug.enabled {
                debug!("Drawing debug overlay");
                if let Err(e) = draw_debug_overlay(&mut page, &self.config.coordinates, &self.config.debug) {
                    warn!(error = %e, "Debug overlay incomplete");
                }
            }
        }

        let bytes = to_bytes(&mut doc)?;
        debug!(size = bytes.len(), "PDF saved");
        Ok(bytes)
    }
}
