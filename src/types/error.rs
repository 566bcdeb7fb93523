use thiserror::Error;

/// curlens error types
#[derive(Error, Debug)]
pub enum CurError {
    /// A mandatory canonical field could not be resolved from any known alias
    #[error("schema error: no column found for canonical field '{field}'")]
    Schema { field: &'static str },

    /// Normalization produced zero usable rows
    #[error("empty dataset: no usable rows after normalization")]
    EmptyDataset,

    /// Invalid analysis configuration
    #[error("config error: {0}")]
    Config(String),

    /// File I/O error from the input reader
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Failed to decode input CSV
    #[error("parse error: {0}")]
    Parse(String),
}

impl From<csv::Error> for CurError {
    fn from(err: csv::Error) -> Self {
        CurError::Parse(err.to_string())
    }
}

/// Result type alias for curlens
pub type Result<T> = std::result::Result<T, CurError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schema_error_names_field() {
        let err = CurError::Schema { field: "cost" };
        assert_eq!(
            err.to_string(),
            "schema error: no column found for canonical field 'cost'"
        );
    }

    #[test]
    fn test_empty_dataset_display() {
        let err = CurError::EmptyDataset;
        assert!(err.to_string().contains("empty dataset"));
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: CurError = io_err.into();
        assert!(err.to_string().contains("io error"));
    }
}
