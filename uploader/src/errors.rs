use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum UploadError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    /// The file is not UTF-8 delimited text
    #[error("cannot decode {0} as delimited text")]
    Undecodable(String),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("no cluster assignments to submit")]
    NothingToSubmit,

    #[error("invalid gateway URL: {0}")]
    InvalidGatewayUrl(String),

    #[error("request to gateway failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The gateway answered with a non-2xx status
    #[error("gateway rejected the batch with status {status}: {message}")]
    Rejected { status: u16, message: String },
}
