use thiserror::Error;

#[derive(Error, Debug)]
pub enum ToolError {
    #[error("request failed: {0}")]
    Request(String),

    #[error("malformed payload: {0}")]
    MalformedPayload(String),

    #[error("no results")]
    NoResults,
}

pub type ToolResult<T> = Result<T, ToolError>;
