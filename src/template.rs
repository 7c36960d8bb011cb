//! Where the base template PDF comes from

use std::fmt;
use std::io::Read;
use std::path::PathBuf;

use tracing::{debug, error};

use crate::config::{ErrorMessages, DEFAULT_TEMPLATE};
use crate::error::{Error, Result};

/// Location of the template PDF: a local file or an http(s) URL
#[derive(Debug, Clone, PartialEq)]
pub enum TemplateSource {
    File(PathBuf),
    Url(String),
}

impl TemplateSource {
    /// Interpret a command-line value; anything not starting with
    /// `http://` or `https://` is a path
    pub fn parse(location: &str) -> Self {
        if location.starts_with("http://") || location.starts_with("https://") {
            TemplateSource::Url(location.to_string())
        } else {
            TemplateSource::File(PathBuf::from(location))
        }
    }

    /// Read the template bytes
    ///
    /// Every failure is reported as [`Error::TemplateLoad`] carrying the
    /// configured user-facing message; the cause is logged.
    pub fn load(&self, messages: &ErrorMessages) -> Result<Vec<u8>> {
        let result = match self {
            TemplateSource::File(path) => std::fs::read(path).map_err(|e| format!("{}: {}", path.display(), e)),
            TemplateSource::Url(url) => fetch(url),
        };

        match result {
            Ok(bytes) => {
                debug!(source = %self, size = bytes.len(), "Base PDF loaded");
                Ok(bytes)
            }
            Err(detail) => {
                error!(source = %self, %detail, "Error loading base PDF");
                Err(Error::TemplateLoad {
                    message: messages.pdf_load_failed.clone(),
                    detail,
                })
            }
        }
    }
}

impl Default for TemplateSource {
    fn default() -> Self {
        TemplateSource::File(PathBuf::from(DEFAULT_TEMPLATE))
    }
}

impl fmt::Display for TemplateSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TemplateSource::File(path) => write!(f, "{}", path.display()),
            TemplateSource::Url(url) => f.write_str(url),
        }
    }
}

/// Fetch a URL, treating any non-2xx status as a failure
fn fetch(url: &str) -> std::result::Result<Vec<u8>, String> {
    let response = match ureq::get(url).call() {
        Ok(response) => response,
        Err(ureq::Error::Status(code, response)) => {
            return Err(format!("Failed to load PDF: {} {}", code, response.status_text()));
        }
        Err(e) => return Err(format!("Failed to fetch URL: {}", e)),
    };

    let mut bytes = Vec::new();
    response
        .into_reader()
        .read_to_end(&mut bytes)
        .map_err(|e| format!("Failed to read response: {}", e))?;

    Ok(bytes)
}
