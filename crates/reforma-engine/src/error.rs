use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AnalysisError {
    /// Non-success status or transport failure while fetching a URL.
    #[error("fetch failed for {url}: {reason}")]
    Fetch { url: String, reason: String },

    /// The body was fetched but is not a decodable image.
    #[error("image decode failed for {url}: {reason}")]
    Decode { url: String, reason: String },

    /// Model reply could not be turned into a verdict.
    #[error("classification failed: {0}")]
    Classification(String),

    /// An expected listing field was absent; callers substitute a default.
    #[error("listing field missing: {0}")]
    MissingData(String),

    /// The listing lookup itself failed. This is the only fatal kind.
    #[error("listing lookup failed: {0}")]
    ListingUnavailable(String),

    #[error("could not find a property id in {0:?}")]
    InvalidProperty(String),

    #[error("invalid configuration: {0}")]
    Config(String),
}
