//! File names for generated PDFs

use chrono::NaiveDate;

use crate::config::FilenameOptions;
use crate::date::format_compact;
use crate::document::FilledDocument;

/// Name used for a combined document when the batch is empty
pub const EMPTY_COMBINED_NAME: &str = "combined-pdfs.pdf";

/// Remove a leading "Dr", an optional period and any whitespace after it
///
/// Matches case-insensitively and, like the pattern `^Dr\.?\s*`, does not
/// require a word boundary.
fn strip_dr_prefix(name: &str) -> &str {
    match name.get(..2) {
        Some(head) if head.eq_ignore_ascii_case("dr") => {
            let rest = &name[2..];
            let rest = rest.strip_prefix('.').unwrap_or(rest);
            rest.trim_start()
        }
        _ => name,
    }
}

/// Reduce a doctor name to at most `max_length` ASCII letters and digits
pub fn clean_doctor_name(doctor: &str, options: &FilenameOptions) -> String {
    let name = if options.remove_dr_prefix {
        strip_dr_prefix(doctor)
    } else {
        doctor
    };

    name.chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .take(options.doctor_name_max_length)
        .collect()
}

/// Build a file name like `doc-Wheatley-20240503-7.pdf`
pub fn pdf_filename_with(doctor: &str, date: &NaiveDate, number: u32, options: &FilenameOptions) -> String {
    let sep = &options.separator;
    format!(
        "{prefix}{sep}{name}{sep}{date}{sep}{number}.pdf",
        prefix = options.prefix,
        name = clean_doctor_name(doctor, options),
        date = format_compact(date),
    )
}

/// [`pdf_filename_with`] using the default options
pub fn pdf_filename(doctor: &str, date: &NaiveDate, number: u32) -> String {
    pdf_filename_with(doctor, date, number, &FilenameOptions::default())
}

/// Name for the combined print document, derived from the first document's
/// date and the batch size
pub fn combined_filename(documents: &[FilledDocument]) -> String {
    match documents.first() {
        None => EMPTY_COMBINED_NAME.to_string(),
        Some(first) => format!(
            "combined-docs-{}-{}pdfs.pdf",
            format_compact(&first.date),
            documents.len()
        ),
    }
}
