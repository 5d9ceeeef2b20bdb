use thiserror::Error;

/// Why a candidate never became a [`RaceRecord`](super::races::RaceRecord).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Rejection {
    #[error("candidate `{name}` has no date text")]
    MissingDate { name: String },
    #[error("candidate `{name}` has unrecognised date `{date_text}`")]
    UnparseableDate { name: String, date_text: String },
    #[error("candidate `{name}` dated {date_iso} is outside {start}..={end}")]
    OutOfWindow {
        name: String,
        date_iso: String,
        start: String,
        end: String,
    },
}

impl Rejection {
    pub fn kind(&self) -> &'static str {
        match self {
            Rejection::MissingDate { .. } => "missing_date",
            Rejection::UnparseableDate { .. } => "unparseable_date",
            Rejection::OutOfWindow { .. } => "out_of_window",
        }
    }
}
