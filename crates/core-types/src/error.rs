use chrono::NaiveDate;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum CoreError {
    #[error("Series for '{symbol}' is not strictly increasing by date at {date}")]
    UnorderedDates { symbol: String, date: NaiveDate },

    #[error("Series for '{symbol}' holds an invalid value {value} at {date}")]
    InvalidValue {
        symbol: String,
        date: NaiveDate,
        value: f64,
    },
}
