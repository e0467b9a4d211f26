use std::path::PathBuf;

use thiserror::Error;

/// Convenient result alias for the mariner library.
pub type Result<T> = std::result::Result<T, Error>;

/// Top-level library error type.
#[derive(Debug, Error)]
pub enum Error {
    /// Raised when a port name could not be found in the reference table.
    #[error("unknown port: {name}{}", format_suggestions(.suggestions))]
    UnknownPort {
        name: String,
        suggestions: Vec<String>,
    },

    /// Raised when an IMO number has no MRV intensity record.
    #[error("ship IMO {imo} not found in the MRV intensity table")]
    UnknownShip { imo: String },

    /// Raised when no EUA price is recorded for the requested year.
    #[error("no EUA price recorded for year {year}")]
    UnknownPriceYear { year: i32 },

    /// Raised for compliance years before the scheme's 2024 start.
    #[error("ETS phase-in is undefined before 2024 (requested {year})")]
    YearBeforeScheme { year: i32 },

    /// Raised when coordinates fall outside valid longitude/latitude ranges.
    #[error("coordinates out of range: lon {lon}, lat {lat}")]
    InvalidCoordinates { lon: f64, lat: f64 },

    /// Raised when the routing engine cannot be used at all.
    #[error("routing engine unavailable: {message}")]
    EngineUnavailable { message: String },

    /// Raised when the routing engine exceeded its time budget.
    #[error("routing engine timed out after {seconds}s")]
    EngineTimeout { seconds: u64 },

    /// Raised when the routing engine exited abnormally or produced
    /// unusable output.
    #[error("routing engine produced unusable output: {message}")]
    EngineOutput { message: String },

    /// Raised when a distance strategy command could not be located.
    #[error("distance strategy binary not found at {}", .path.display())]
    StrategyBinaryMissing { path: PathBuf },

    /// Raised when every distance strategy in the chain failed.
    #[error("all distance strategies failed for the requested leg")]
    DistanceExhausted,

    /// Wrapper for IO errors.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Wrapper for JSON parsing errors.
    #[error(transparent)]
    Json(#[from] serde_json::Error),

    /// Wrapper for CSV parsing errors.
    #[error(transparent)]
    Csv(#[from] csv::Error),
}

fn format_suggestions(suggestions: &[String]) -> String {
    if suggestions.is_empty() {
        String::new()
    } else if suggestions.len() == 1 {
        format!(". Did you mean '{}'?", suggestions[0])
    } else {
        format!(
            ". Did you mean one of: {}?",
            suggestions
                .iter()
                .map(|s| format!("'{}'", s))
                .collect::<Vec<_>>()
                .join(", ")
        )
    }
}
