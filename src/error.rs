use thiserror::Error;

/// Failure taxonomy for one extraction run. All variants are terminal for the
/// run; no partial record is ever produced alongside one of these.
#[derive(Debug, Error)]
pub enum ExtractError {
    /// The URL's host is not recognized by any profile. User input error.
    #[error("unsupported source: {detail}")]
    Unsupported { detail: String },

    /// The host is recognized but the path shape is wrong. User input error.
    #[error("url format error for {site}; expected {expected}")]
    InvalidFormat { site: String, expected: String },

    /// Every extraction strategy of a required field failed to resolve.
    /// Indicates the target site changed structure or the page is in an
    /// unexpected state.
    #[error("required field {field} not found on page")]
    MissingRequiredField { field: String },

    /// The page or the layer that produced it became unusable.
    #[error(transparent)]
    Page(#[from] PageFault),
}

impl ExtractError {
    pub fn kind(&self) -> &'static str {
        match self {
            ExtractError::Unsupported { .. } => "unsupported",
            ExtractError::InvalidFormat { .. } => "invalid_format",
            ExtractError::MissingRequiredField { .. } => "missing_required_field",
            ExtractError::Page(_) => "page_fault",
        }
    }
}

/// Opaque page-level fault: fetch failure, unusable document, or a selector
/// the page layer could not evaluate.
#[derive(Debug, Error)]
#[error("page fault: {message}")]
pub struct PageFault {
    message: String,
}

impl PageFault {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}
