use thiserror::Error;

pub type Result<T> = std::result::Result<T, StoreError>;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("table store request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// The store answered with a non-success status.
    #[error("table store returned {status}: {message}")]
    Api { status: u16, message: String },

    #[error("row for `{table}` could not be serialized: {source}")]
    Encode {
        table: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("unexpected row shape in `{table}`: {source}")]
    Decode {
        table: String,
        #[source]
        source: serde_json::Error,
    },
}

impl StoreError {
    /// True when the store rejected an insert on a uniqueness constraint.
    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::Api { status: 409, .. })
    }
}
