//! Randomized batches of filled documents

use chrono_tz::Tz;
use rand::seq::SliceRandom;
use rand::Rng;
use tracing::{info, warn};

use crate::config::DefaultValues;
use crate::date::random_date_in_current_month;
use crate::document::{DocumentRequest, FilledDocument};
use crate::error::Error;
use crate::pdf::DocumentFiller;

/// Result of filling a batch: what succeeded, in input order, and what didn't
#[derive(Debug, Default)]
pub struct BatchOutcome {
    pub documents: Vec<FilledDocument>,
    pub failures: Vec<(DocumentRequest, Error)>,
}

impl BatchOutcome {
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Build `count` requests with a random doctor, date and number
///
/// Dates fall between the first of the current month and today in `tz`.
/// An empty doctor list yields an empty doctor name.
pub fn random_requests<R: Rng + ?Sized>(
    count: usize,
    defaults: &DefaultValues,
    tz: Tz,
    rng: &mut R,
) -> Vec<DocumentRequest> {
    let (low, high) = if defaults.number_min <= defaults.number_max {
        (defaults.number_min, defaults.number_max)
    } else {
        (defaults.number_max, defaults.number_min)
    };

    (0..count)
        .map(|_| {
            let doctor = defaults.doctors.choose(rng).cloned().unwrap_or_default();
            let date = random_date_in_current_month(tz, rng);
            let number = rng.gen_range(low..=high);
            DocumentRequest::new(doctor, date, number)
        })
        .collect()
}

/// Fill every request in order; a failed document is recorded and skipped
pub fn fill_batch(filler: &DocumentFiller, requests: &[DocumentRequest]) -> BatchOutcome {
    let mut outcome = BatchOutcome::default();

    for (index, request) in requests.iter().enumerate() {
        match filler.fill_document(request) {
            Ok(document) => {
                info!(index, name = %document.name, "Filled PDF");
                outcome.documents.push(document);
            }
            Err(e) => {
                warn!(index, doctor = %request.doctor, error = %e, "Skipping document");
                outcome.failures.push((request.clone(), e));
            }
        }
    }

    outcome
}
