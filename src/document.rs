//! Batch data: what goes into one fill and what comes out

use chrono::NaiveDate;

/// Input to one fill operation
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentRequest {
    pub doctor: String,
    pub date: NaiveDate,
    pub number: u32,
}

impl DocumentRequest {
    pub fn new(doctor: impl Into<String>, date: NaiveDate, number: u32) -> Self {
        Self {
            doctor: doctor.into(),
            date,
            number,
        }
    }
}

/// Output of one fill operation, consumed by the archiver or the printer
#[derive(Debug, Clone, PartialEq)]
pub struct FilledDocument {
    /// File name, as produced by the filename generator
    pub name: String,
    /// Date the document was filled with
    pub date: NaiveDate,
    /// Serialized PDF
    pub data: Vec<u8>,
}
