//! Combining a batch into one PDF and sending it to print
//!
//! The combined PDF lives in a transient directory owned by the returned
//! [`PrintSession`]. Two delayed tasks hang off the session: one invokes the
//! print dialog shortly after the viewer opens, the other releases the
//! transient file after a longer delay whether or not printing happened.
//! Ending the session early cancels the pending print and releases the file
//! immediately.

use std::path::{Path, PathBuf};
use std::process::Command;
use std::sync::Arc;

use tempfile::TempDir;
use tracing::{debug, error, info, warn};

use crate::config::FormConfig;
use crate::document::FilledDocument;
use crate::error::{Error, Result};
use crate::filename::combined_filename;
use crate::pdf::merge::{combine_documents, to_bytes};
use crate::schedule::Scheduled;

/// Where combined documents are shown and printed
pub trait PrintHost: Send + Sync {
    /// Open the document in a new viewer; an error means it could not be
    /// opened (e.g. no viewer available)
    fn open(&self, path: &Path) -> Result<()>;

    /// Show the document without printing
    fn display(&self, path: &Path) -> Result<()>;

    /// Invoke printing of an already opened document
    fn print(&self, path: &Path) -> Result<()>;
}

/// Opens files with the platform's default application and prints with the
/// platform's print command
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemPrintHost;

impl SystemPrintHost {
    fn launch(path: &Path) -> Result<()> {
        #[cfg(target_os = "macos")]
        let command = {
            let mut command = Command::new("open");
            command.arg(path);
            command
        };
        #[cfg(all(unix, not(target_os = "macos")))]
        let command = {
            let mut command = Command::new("xdg-open");
            command.arg(path);
            command
        };
        #[cfg(target_os = "windows")]
        let command = {
            let mut command = Command::new("cmd");
            command.args(["/C", "start", "", &path.display().to_string()]);
            command
        };
        run_to_completion(command)
    }
}

/// Run a command and wait for it, so no child is left unreaped
///
/// The platform openers hand the file to the viewer and exit, so this does
/// not block on the viewer itself.
fn run_to_completion(mut command: Command) -> Result<()> {
    let status = command.status()?;
    if status.success() {
        Ok(())
    } else {
        Err(Error::General(format!("{:?} exited with {}", command.get_program(), status)))
    }
}

impl PrintHost for SystemPrintHost {
    fn open(&self, path: &Path) -> Result<()> {
        Self::launch(path)
    }

    /// Best effort: the same opener as [`PrintHost::open`], so it only helps
    /// when the first attempt failed transiently. The path is always logged
    /// so the file can be opened by hand.
    fn display(&self, path: &Path) -> Result<()> {
        info!(path = %path.display(), "Combined PDF available for viewing");
        Self::launch(path)
    }

    fn print(&self, path: &Path) -> Result<()> {
        #[cfg(unix)]
        let command = {
            let mut command = Command::new("lp");
            command.arg(path);
            command
        };

        #[cfg(windows)]
        let command = {
            let mut command = Command::new("powershell");
            command.args([
                "-NoProfile",
                "-Command",
                &format!("Start-Process -FilePath '{}' -Verb Print", path.display()),
            ]);
            command
        };

        run_to_completion(command)
    }
}

pub struct BatchPrinter {
    config: Arc<FormConfig>,
    host: Arc<dyn PrintHost>,
}

impl BatchPrinter {
    pub fn new(config: Arc<FormConfig>, host: Arc<dyn PrintHost>) -> Self {
        Self { config, host }
    }

    /// Every page of every document, in order, as one serialized PDF
    pub fn combine(&self, documents: &[FilledDocument]) -> Result<Vec<u8>> {
        if documents.is_empty() {
            return Err(self.failure("No documents to print"));
        }

        let inputs: Vec<&[u8]> = documents.iter().map(|d| d.data.as_slice()).collect();
        let mut combined = combine_documents(&inputs).map_err(|e| self.failure(e))?;
        let bytes = to_bytes(&mut combined).map_err(|e| self.failure(e))?;

        debug!(documents = documents.len(), size = bytes.len(), "Combined PDF created");
        Ok(bytes)
    }

    /// Combine the batch, open it and schedule printing and release
    pub fn print_combined(&self, documents: &[FilledDocument]) -> Result<PrintSession> {
        let bytes = self.combine(documents)?;

        let dir = tempfile::Builder::new()
            .prefix("physician-qa-print-")
            .tempdir()
            .map_err(|e| self.failure(e))?;
        let path = dir.path().join(combined_filename(documents));
        std::fs::write(&path, &bytes).map_err(|e| self.failure(e))?;

        let timing = &self.config.print;
        let opened = match self.host.open(&path) {
            Ok(()) => true,
            Err(e) => {
                warn!(error = %e, "Could not open print viewer, displaying instead");
                if let Err(e) = self.host.display(&path) {
                    warn!(error = %e, "Could not display combined PDF");
                }
                false
            }
        };

        // shared by both tasks; the directory goes when the last holder drops it
        let transient = Arc::new(TransientDir(Some(dir)));

        let print_task = opened.then(|| {
            let host = Arc::clone(&self.host);
            let target = path.clone();
            let held = Arc::clone(&transient);
            Scheduled::after(timing.print_delay(), move || {
                if let Err(e) = host.print(&target) {
                    error!(error = %e, "Print failed");
                }
                drop(held);
            })
        });

        let release_task = Scheduled::after(timing.release_delay(), move || drop(transient));

        info!(path = %path.display(), documents = documents.len(), opened, "Combined PDF ready");
        Ok(PrintSession {
            path,
            opened,
            print_task,
            release_task: Some(release_task),
        })
    }

    fn failure(&self, detail: impl std::fmt::Display) -> Error {
        error!(%detail, "Error printing combined PDF");
        Error::print(&self.config.messages.print_failed, detail)
    }
}

/// Directory holding the combined PDF, removed on drop
///
/// A release that comes due while a print is still pending or running only
/// gives up its share; removal happens once the print task lets go too.
struct TransientDir(Option<TempDir>);

impl Drop for TransientDir {
    fn drop(&mut self) {
        let Some(dir) = self.0.take() else { return };
        let path = dir.path().to_path_buf();
        match dir.close() {
            Ok(()) => debug!(path = %path.display(), "Released combined PDF"),
            Err(e) => warn!(error = %e, path = %path.display(), "Could not remove combined PDF"),
        }
    }
}

/// A combined document that is open for printing
///
/// Dropping the session cancels a print that has not started yet and
/// removes the transient file.
pub struct PrintSession {
    path: PathBuf,
    opened: bool,
    print_task: Option<Scheduled>,
    release_task: Option<Scheduled>,
}

impl PrintSession {
    /// Location of the transient combined PDF
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Whether the viewer opened (and so printing was scheduled)
    pub fn opened(&self) -> bool {
        self.opened
    }

    /// Block until printing has been invoked and the file released
    pub fn wait(mut self) {
        if let Some(task) = self.print_task.take() {
            task.wait();
        }
        if let Some(task) = self.release_task.take() {
            task.wait();
        }
    }

    /// Cancel any pending print and release the file now
    pub fn close(self) {
        drop(self);
    }
}

impl Drop for PrintSession {
    fn drop(&mut self) {
        // print must be settled before the file can go
        if let Some(task) = self.print_task.take() {
            task.cancel();
        }
        if let Some(task) = self.release_task.take() {
            task.cancel();
        }
    }
}
