use std::time::Duration;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Invalid YAML in style document.")]
    StyleYaml(#[from] serde_yaml::Error),

    #[error("Invalid style: {0}")]
    InvalidStyle(String),

    #[error("Tile {zoom}/{column}/{row} is outside the tile pyramid.")]
    InvalidTile { zoom: u8, column: u32, row: u32 },

    #[error("Malformed tile path: {0}")]
    MalformedPath(String),

    #[error("Unsupported output format: {0}")]
    UnsupportedFormat(String),

    #[error("Feature source request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Feature source returned HTTP {status}")]
    SourceStatus { status: u16 },

    #[error("Feature database query failed: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Unable to decode feature data: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("Feature fetch timed out after {0:?}")]
    FetchTimeout(Duration),

    #[error("Unable to load font {family}: {reason}")]
    Font { family: String, reason: String },

    #[error("Invalid canvas size {width}x{height}")]
    InvalidCanvas { width: u32, height: u32 },

    #[error("Unable to encode image: {0}")]
    Encode(String),
}

impl Error {
    /// True for failures of the upstream feature source, as opposed to bad
    /// requests or local faults.
    pub fn is_upstream(&self) -> bool {
        matches!(
            self,
            Error::Http(_)
                | Error::SourceStatus { .. }
                | Error::Database(_)
                | Error::Decode(_)
                | Error::FetchTimeout(_)
        )
    }
}
