//! Configuration for the form filler
//!
//! A single [`FormConfig`] value is built once (from defaults or a JSON file)
//! and shared read-only by the filler, archiver and printer. Every section is
//! optional in the file; omitted sections keep their defaults.

use std::path::Path;
use std::time::Duration;

use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::layout::{CoordinateTable, Rgb};

/// Default template location, relative to the working directory
pub const DEFAULT_TEMPLATE: &str = "./PhysicianQA.pdf";

/// Default archive name used by the batch archiver
pub const DEFAULT_ARCHIVE_NAME: &str = "physician-qa-pdfs.zip";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct FormConfig {
    /// Field placements on page 0 of the template
    pub coordinates: CoordinateTable,
    /// Fill color for overlay text
    pub text_color: Rgb,
    pub debug: DebugOverlayOptions,
    pub filename: FilenameOptions,
    pub defaults: DefaultValues,
    pub messages: ErrorMessages,
    pub archive: ArchiveOptions,
    pub print: PrintTiming,
    /// IANA timezone that defines "the current month"
    pub timezone: String,
}

impl Default for FormConfig {
    fn default() -> Self {
        Self {
            coordinates: CoordinateTable::default(),
            text_color: Rgb::BLACK,
            debug: DebugOverlayOptions::default(),
            filename: FilenameOptions::default(),
            defaults: DefaultValues::default(),
            messages: ErrorMessages::default(),
            archive: ArchiveOptions::default(),
            print: PrintTiming::default(),
            timezone: "America/Chicago".to_string(),
        }
    }
}

impl FormConfig {
    /// Load a configuration file, validating it before returning
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        let config: FormConfig = serde_json::from_str(&text).map_err(|e| Error::Config {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;

        config.validate().map_err(|message| Error::Config {
            path: path.to_path_buf(),
            message,
        })?;

        Ok(config)
    }

    /// The configured timezone
    pub fn tz(&self) -> Result<Tz> {
        self.timezone
            .parse::<Tz>()
            .map_err(|e| Error::General(format!("Unknown timezone {}: {}", self.timezone, e)))
    }

    fn validate(&self) -> std::result::Result<(), String> {
        if self.timezone.parse::<Tz>().is_err() {
            return Err(format!("unknown timezone: {}", self.timezone));
        }
        if self.defaults.number_min > self.defaults.number_max {
            return Err(format!(
                "numberMin ({}) is greater than numberMax ({})",
                self.defaults.number_min, self.defaults.number_max
            ));
        }
        if self.defaults.doctors.is_empty() {
            return Err("defaults.doctors must not be empty".to_string());
        }
        if !(0..=9).contains(&self.archive.compression_level) {
            return Err(format!(
                "archive.compressionLevel must be 0-9, got {}",
                self.archive.compression_level
            ));
        }
        if self.print.release_delay_ms < self.print.print_delay_ms {
            return Err(format!(
                "print.releaseDelayMs ({}) must not be shorter than print.printDelayMs ({})",
                self.print.release_delay_ms, self.print.print_delay_ms
            ));
        }
        Ok(())
    }
}

/// Coordinate debugging pass, off unless explicitly enabled
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct DebugOverlayOptions {
    pub enabled: bool,
    pub crosshair_color: Rgb,
    pub crosshair_opacity: f32,
    pub crosshair_thickness: f32,
    pub ruler_color: Rgb,
    pub ruler_opacity: f32,
    pub ruler_thickness: f32,
    pub label_font_size: f32,
}

impl Default for DebugOverlayOptions {
    fn default() -> Self {
        Self {
            enabled: false,
            crosshair_color: Rgb::RED,
            crosshair_opacity: 0.3,
            crosshair_thickness: 0.25,
            ruler_color: Rgb::BLUE,
            ruler_opacity: 0.7,
            ruler_thickness: 0.5,
            label_font_size: 8.0,
        }
    }
}

/// How generated PDF names are built
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct FilenameOptions {
    pub prefix: String,
    pub separator: String,
    pub doctor_name_max_length: usize,
    pub remove_dr_prefix: bool,
}

impl Default for FilenameOptions {
    fn default() -> Self {
        Self {
            prefix: "doc".to_string(),
            separator: "-".to_string(),
            doctor_name_max_length: 20,
            remove_dr_prefix: true,
        }
    }
}

/// Values used when generating a randomized batch
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct DefaultValues {
    pub doctors: Vec<String>,
    pub number_min: u32,
    pub number_max: u32,
    pub pdf_count: usize,
}

impl Default for DefaultValues {
    fn default() -> Self {
        Self {
            doctors: vec![
                "Dr. Wheatley".to_string(),
                "Dr. Hamlett".to_string(),
                "Dr. Hutchins".to_string(),
            ],
            number_min: 1,
            number_max: 10,
            pdf_count: 5,
        }
    }
}

/// User-facing messages, surfaced verbatim as error labels
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ErrorMessages {
    pub pdf_load_failed: String,
    pub pdf_processing_failed: String,
    pub coordinates_not_found: String,
    pub zip_creation_failed: String,
    pub print_failed: String,
}

impl Default for ErrorMessages {
    fn default() -> Self {
        Self {
            pdf_load_failed: "Failed to load the base PDF template. Please ensure PhysicianQA.pdf is in the public folder.".to_string(),
            pdf_processing_failed: "Failed to create filled PDF".to_string(),
            coordinates_not_found: "No coordinates found for field".to_string(),
            zip_creation_failed: "Failed to create ZIP file".to_string(),
            print_failed: "Failed to print combined PDF".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ArchiveOptions {
    pub default_name: String,
    /// DEFLATE level, 0-9
    pub compression_level: i64,
}

impl Default for ArchiveOptions {
    fn default() -> Self {
        Self {
            default_name: DEFAULT_ARCHIVE_NAME.to_string(),
            compression_level: 6,
        }
    }
}

/// Heuristic waits used by the batch printer
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PrintTiming {
    /// Wait between opening the combined PDF and invoking print
    pub print_delay_ms: u64,
    /// Lifetime of the transient combined PDF
    pub release_delay_ms: u64,
}

impl PrintTiming {
    pub fn print_delay(&self) -> Duration {
        Duration::from_millis(self.print_delay_ms)
    }

    pub fn release_delay(&self) -> Duration {
        Duration::from_millis(self.release_delay_ms)
    }
}

impl Default for PrintTiming {
    fn default() -> Self {
        Self {
            print_delay_ms: 1_000,
            release_delay_ms: 60_000,
        }
    }
}
