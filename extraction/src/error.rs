use llm_client::LlmError;
use thiserror::Error;

/// The model response could not be read as a list of items.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("response is not valid JSON: {0}")]
    InvalidJson(String),
    #[error("response is not an array of item objects: {0}")]
    UnexpectedShape(String),
    #[error("response contains no items")]
    Empty,
}

/// Why an extraction attempt produced no items of its own.
#[derive(Error, Debug)]
pub enum ExtractionError {
    #[error("nothing to extract from")]
    EmptyInput,
    #[error(transparent)]
    ExternalCall(#[from] LlmError),
    #[error(transparent)]
    Parse(#[from] ParseError),
}

#[derive(Error, Debug)]
pub enum SavableCheckError {
    #[error(transparent)]
    ExternalCall(#[from] LlmError),
    #[error("unrecognized verdict: {0}")]
    UnrecognizedVerdict(String),
}
