//! The crate's half of the insert-step contract: rendering records as
//! fixed-column rows in order `(location, time, temp_celsius, condition)`.
//! Executing the SQL belongs to the warehouse side.

use crate::model::WeatherRecord;

impl WeatherRecord {
    /// Column-ordered tuple view matching the warehouse table.
    #[must_use]
    pub fn as_row(&self) -> (&str, &str, f64, &str) {
        (&self.location, &self.time, self.temp_celsius, &self.condition)
    }
}

/// Render one record as a SQL `VALUES` tuple. Single quotes inside strings
/// are doubled.
#[must_use]
pub fn to_values_row(record: &WeatherRecord) -> String {
    let (location, time, temp_celsius, condition) = record.as_row();
    format!(
        "('{}', '{}', {}, '{}')",
        escape(location),
        escape(time),
        temp_celsius,
        escape(condition)
    )
}

/// Render a record batch, one `VALUES` tuple per record, order preserved.
#[must_use]
pub fn to_values_list(records: &[WeatherRecord]) -> Vec<String> {
    records.iter().map(to_values_row).collect()
}

fn escape(value: &str) -> String {
    value.replace('\'', "''")
}
