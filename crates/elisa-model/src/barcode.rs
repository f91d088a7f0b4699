//! Plate barcode parsing.
//!
//! Barcodes are laid out as an optional leading prefix letter, the plate
//! id (serotype plus block letter), two technician initials, a `ddmmyy`
//! date and an optional trailing `R` marking a repeat plate.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::{ElisaError, Result};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Barcode {
    raw: String,
    plate_id: String,
    technician: String,
    date: NaiveDate,
    repeat: bool,
}

impl Barcode {
    pub fn parse(raw: &str) -> Result<Barcode> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(ElisaError::MalformedPlate("empty barcode".to_string()));
        }

        // Strip the single prefix letter when present.
        let body = match trimmed.chars().next() {
            Some(first) if first.is_ascii_alphabetic() && trimmed.len() > 1 => &trimmed[1..],
            _ => trimmed,
        };

        let repeat = body.ends_with('R');
        let core = if repeat { &body[..body.len() - 1] } else { body };

        // Fixed-position decomposition below; only ASCII barcodes have
        // well-defined positions.
        if !core.is_ascii() {
            return Err(ElisaError::MalformedPlate(format!(
                "barcode {trimmed:?} contains non-ASCII characters"
            )));
        }

        // plate id (>= 2 chars) + 2 technician initials + 6 date digits
        if core.len() < 10 {
            return Err(ElisaError::MalformedPlate(format!(
                "barcode {trimmed:?} too short"
            )));
        }
        let (rest, date_text) = core.split_at(core.len() - 6);
        let (plate_id, technician) = rest.split_at(rest.len() - 2);

        let date = NaiveDate::parse_from_str(date_text, "%d%m%y").map_err(|_| {
            ElisaError::MalformedPlate(format!("barcode {trimmed:?}: bad date {date_text:?}"))
        })?;

        Ok(Barcode {
            raw: trimmed.to_string(),
            plate_id: plate_id.to_string(),
            technician: technician.to_string(),
            date,
            repeat,
        })
    }

    pub fn raw(&self) -> &str {
        &self.raw
    }

    /// Plate id: serotype plus trailing block letter.
    pub fn plate_id(&self) -> &str {
        &self.plate_id
    }

    /// Serotype implied by the barcode (plate id minus its block letter).
    pub fn serotype(&self) -> &str {
        &self.plate_id[..self.plate_id.len() - 1]
    }

    /// Block letter used to look up first-run sample assignments.
    pub fn block(&self) -> Option<char> {
        self.plate_id.chars().last()
    }

    pub fn technician(&self) -> &str {
        &self.technician
    }

    pub fn date(&self) -> NaiveDate {
        self.date
    }

    /// Barcode date in clinical `dd-Mon-yy` form.
    pub fn date_display(&self) -> String {
        self.date.format("%d-%b-%y").to_string()
    }

    /// True when the barcode marks a repeat plate (trailing `R`).
    pub fn is_repeat(&self) -> bool {
        self.repeat
    }
}
