use chrono::NaiveDate;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DateSeqError {
    #[error("cannot parse date string `{0}'")]
    ParseDate(String),

    #[error("cannot parse duration string `{0}'")]
    ParseDuration(String),

    #[error("invalid output format `{0}'")]
    InvalidFormat(String),

    #[error("increment must not be naught")]
    ZeroStep,

    #[error("cannot convert calendric system internally ({date} precedes {epoch})")]
    Conversion { date: NaiveDate, epoch: NaiveDate },

    #[error("increment does not advance the sequence past {0}")]
    StepDoesNotAdvance(NaiveDate),
}
