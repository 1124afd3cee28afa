// Error taxonomy for the dispatch boundary
//
// Every failure that can occur while routing a tool call is one of these
// kinds. All of them are flattened to a result string at the dispatch
// boundary; nothing propagates past it.

use thiserror::Error;

/// Failures raised by a capability provider.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// The backend session could not be established (missing, corrupt,
    /// or unrefreshable credential material).
    #[error("authentication failed: {0}")]
    Auth(String),

    /// The backend accepted the session but rejected or failed the
    /// specific operation.
    #[error("{0}")]
    Operation(String),
}

/// Failures raised while routing a single tool call.
#[derive(Debug, Error)]
pub enum DispatchError {
    /// No catalog entry matches the requested tool name.
    #[error("unrecognized tool '{0}'")]
    UnknownTool(String),

    /// A required parameter is missing, a value has the wrong type,
    /// or a value violates an enum constraint.
    #[error("invalid arguments: {0}")]
    Validation(String),

    #[error(transparent)]
    Provider(#[from] ProviderError),
}

impl DispatchError {
    /// Flatten to the wire payload the conversation driver receives.
    pub fn into_output(self) -> String {
        format!("Error: {}", self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_tool_names_the_tool() {
        let err = DispatchError::UnknownTool("make_coffee".to_string());
        assert!(err.into_output().contains("unrecognized tool 'make_coffee'"));
    }

    #[test]
    fn test_auth_error_is_marked() {
        let err = DispatchError::from(ProviderError::Auth("token file not found".to_string()));
        let output = err.into_output();
        assert!(output.starts_with("Error: "));
        assert!(output.contains("authentication failed"));
    }
}
