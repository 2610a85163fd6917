use thiserror::Error;

/// Why a page could not be fetched at the transport level
#[derive(Error, Debug)]
pub enum FetchError {
    #[error("request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

/// Why a property page produced no records
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ExtractError {
    #[error("required element missing: {0}")]
    MissingRequired(String),

    #[error("basic info table missing")]
    MissingBasicInfo,

    #[error("basic info row missing: {0}")]
    MissingBasicInfoRow(String),

    #[error("malformed number in {field}: {raw:?}")]
    MalformedNumber { field: String, raw: String },
}
