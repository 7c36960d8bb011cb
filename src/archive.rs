//! ZIP archives of a filled batch
//!
//! The whole archive is built in memory first; it only reaches the
//! destination directory, atomically and under its final name, once every
//! document has been added. A failure leaves nothing behind.

use std::collections::HashSet;
use std::io::{Cursor, Write};
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

use tempfile::NamedTempFile;
use tracing::{debug, error, info, warn};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::config::FormConfig;
use crate::document::FilledDocument;
use crate::error::{Error, Result};

pub struct BatchArchiver {
    config: Arc<FormConfig>,
}

impl BatchArchiver {
    pub fn new(config: Arc<FormConfig>) -> Self {
        Self { config }
    }

    /// Build the archive bytes, members in input order
    pub fn build_archive(&self, documents: &[FilledDocument]) -> Result<Vec<u8>> {
        self.write_members(documents).map_err(|e| {
            error!(error = %e, "Error creating ZIP file");
            Error::archive(&self.config.messages.zip_creation_failed, e)
        })
    }

    /// Build the archive and save it as `destination/archive_name`
    ///
    /// `archive_name` defaults to the configured name
    /// (`physician-qa-pdfs.zip`). Returns the path written.
    pub fn archive_and_download(
        &self,
        documents: &[FilledDocument],
        archive_name: Option<&str>,
        destination: &Path,
    ) -> Result<PathBuf> {
        let name = archive_name.unwrap_or(self.config.archive.default_name.as_str());
        if !is_plain_file_name(name) {
            error!(name, "Archive name must be a plain file name");
            return Err(Error::archive(
                &self.config.messages.zip_creation_failed,
                format!("Invalid archive name: {}", name),
            ));
        }
        let bytes = self.build_archive(documents)?;

        let target = destination.join(name);
        persist_atomically(&bytes, destination, &target).map_err(|e| {
            error!(error = %e, path = %target.display(), "Error saving ZIP file");
            Error::archive(&self.config.messages.zip_creation_failed, e)
        })?;

        info!(path = %target.display(), documents = documents.len(), size = bytes.len(), "ZIP archive saved");
        Ok(target)
    }

    fn write_members(&self, documents: &[FilledDocument]) -> Result<Vec<u8>> {
        let options = SimpleFileOptions::default()
            .compression_method(CompressionMethod::Deflated)
            .compression_level(Some(self.config.archive.compression_level));

        let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
        let mut used = HashSet::new();

        for document in documents {
            let member = unique_member_name(&document.name, &mut used);
            if member != document.name {
                warn!(original = %document.name, renamed = %member, "Duplicate file name in archive");
            }

            zip.start_file(member.as_str(), options)?;
            zip.write_all(&document.data)?;
            debug!(member = %member, size = document.data.len(), "Added to archive");
        }

        Ok(zip.finish()?.into_inner())
    }
}

/// Return `name`, or `stem-N.ext` for the smallest N >= 2 not yet used
fn unique_member_name(name: &str, used: &mut HashSet<String>) -> String {
    if used.insert(name.to_string()) {
        return name.to_string();
    }

    let (stem, ext) = match name.rfind('.') {
        Some(dot) if dot > 0 => (&name[..dot], &name[dot..]),
        _ => (name, ""),
    };

    let mut n = 2;
    loop {
        let candidate = format!("{}-{}{}", stem, n, ext);
        if used.insert(candidate.clone()) {
            return candidate;
        }
        n += 1;
    }
}

/// A single normal path component: no separators, no `..`, not absolute
fn is_plain_file_name(name: &str) -> bool {
    let mut components = Path::new(name).components();
    matches!(
        (components.next(), components.next()),
        (Some(Component::Normal(_)), None)
    )
}

fn persist_atomically(bytes: &[u8], directory: &Path, target: &Path) -> Result<()> {
    let mut file = NamedTempFile::new_in(directory)?;
    file.write_all(bytes)?;
    file.as_file().sync_all()?;
    file.persist(target).map_err(|e| Error::Io(e.error))?;
    Ok(())
}
