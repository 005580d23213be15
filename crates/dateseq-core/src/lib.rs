//! Sequences of calendar dates, like seq(1) but for dates.

pub mod date;
pub mod duration;
pub mod error;
pub mod format;
pub mod sequence;
pub mod skip;
