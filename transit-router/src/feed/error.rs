//! Feed error types.

/// Errors that can occur while reading the transit feed.
#[derive(Debug, thiserror::Error)]
pub enum DataSourceError {
    /// The source could not be reached at all
    #[error("data source unreachable: {message}")]
    Unreachable { message: String },

    /// Reading a relation failed
    #[error("failed to read {relation}: {source}")]
    Io {
        relation: &'static str,
        #[source]
        source: std::io::Error,
    },

    /// A relation could not be parsed as CSV
    #[error("malformed {relation}: {source}")]
    Csv {
        relation: &'static str,
        #[source]
        source: csv::Error,
    },

    /// A relation produced no usable rows
    #[error("no usable rows in {relation}")]
    Empty { relation: &'static str },
}
