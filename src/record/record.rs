use serde::Serialize;

use super::error::{RecordError, RecordResult};

/// Ordering key of a record: the mean yearly variation ("FM")
pub type Key = f64;

/// Opaque record identifier, carried for display and debugging only
pub type RecordId = i64;

/// One country's yearly temperature-variation series
///
/// The key is computed once, at construction, as the arithmetic mean of
/// `measurements` (0.0 when there are none). Fields are private so a record
/// stored in a tree can never have its key changed in place; updating a key
/// means removing the record and inserting a new one.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Record {
    id: RecordId,
    name: String,
    code: String,
    measurements: Vec<f64>,
    key: Key,
}

impl Record {
    /// Create a record and derive its key
    ///
    /// # Errors
    /// * `RecordError::InvalidCode` - `code` is not exactly 3 characters
    /// * `RecordError::NonFiniteMeasurement` - a measurement is NaN or infinite
    /// * `RecordError::NonFiniteKey` - the mean is not representable as a finite `f64`
    pub fn new(
        id: RecordId,
        name: impl Into<String>,
        code: impl Into<String>,
        measurements: Vec<f64>,
    ) -> RecordResult<Self> {
        let code = code.into();
        if code.chars().count() != 3 {
            return Err(RecordError::InvalidCode(code));
        }

        if let Some((index, &value)) = measurements
            .iter()
            .enumerate()
            .find(|(_, v)| !v.is_finite())
        {
            return Err(RecordError::NonFiniteMeasurement { index, value });
        }

        let key = mean(&measurements);
        if !key.is_finite() {
            return Err(RecordError::NonFiniteKey(key));
        }

        Ok(Self {
            id,
            name: name.into(),
            code,
            measurements,
            key,
        })
    }

    pub fn id(&self) -> RecordId {
        self.id
    }

    /// Country name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// ISO3 country code
    pub fn code(&self) -> &str {
        &self.code
    }

    pub fn measurements(&self) -> &[f64] {
        &self.measurements
    }

    /// Mean of the measurements, fixed at construction
    pub fn key(&self) -> Key {
        self.key
    }

    /// Measurement reported for `year`, given the year of the first column
    ///
    /// Returns `None` if `year` falls before `first_year` or past the last
    /// reported year.
    pub fn measurement_for_year(&self, first_year: i32, year: i32) -> Option<f64> {
        let offset = year.checked_sub(first_year)?;
        let index = usize::try_from(offset).ok()?;
        self.measurements.get(index).copied()
    }

    /// Display form without the debug id
    pub fn summary(&self) -> String {
        format!(
            "Country: {} | ISO3: {} | FM: {}",
            self.name, self.code, self.key
        )
    }
}

/// Arithmetic mean, 0.0 for an empty slice
///
/// Finite inputs whose sum overflows are averaged from pre-scaled terms, so
/// `[f64::MAX, f64::MAX]` has mean `f64::MAX` rather than infinity.
pub(crate) fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let len = values.len() as f64;
    let sum: f64 = values.iter().sum();
    if sum.is_finite() || values.iter().any(|v| !v.is_finite()) {
        return sum / len;
    }
    values.iter().map(|v| v / len).sum()
}
