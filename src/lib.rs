//! PhysicianQA form library
//!
//! Fills a one-page PDF form template with a doctor's name, a date and a
//! number, then delivers the results. This library provides functionality to:
//! - Fill the template's first page with text overlays at configured coordinates
//! - Name filled documents from their contents
//! - Bundle a batch into a single ZIP archive
//! - Combine a batch into one PDF and send it to print
//! - Generate randomized batches for a month's QA paperwork
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use chrono::NaiveDate;
//! use physician_qa::config::FormConfig;
//! use physician_qa::document::DocumentRequest;
//! use physician_qa::pdf::DocumentFiller;
//! use physician_qa::template::TemplateSource;
//!
//! let filler = DocumentFiller::new(Arc::new(FormConfig::default()), TemplateSource::default());
//! let request = DocumentRequest::new("Dr. Wheatley", NaiveDate::from_ymd_opt(2024, 5, 3).unwrap(), 7);
//!
//! let document = filler.fill_document(&request).expect("Failed to fill PDF");
//! std::fs::write(&document.name, &document.data).unwrap();
//! ```

pub mod archive;
pub mod batch;
pub mod config;
pub mod date;
pub mod document;
pub mod error;
pub mod filename;
pub mod layout;
pub mod pdf;
pub mod print;
pub mod schedule;
pub mod template;

// Re-export commonly used items
pub use error::{Error, Result};
