use thiserror::Error;

#[derive(Error, Debug)]
pub enum BastionError {
    // External command errors
    #[error("Command `{command}` failed: {reason}")]
    Execution { command: String, reason: String },

    // Address resolution errors
    #[error("Unsupported infrastructure type: {0:?}")]
    UnsupportedInfrastructure(String),

    #[error("No IP address found in output of `{0}`")]
    IpNotFound(String),

    #[error("Unexpected provider response: {0}")]
    ProviderQuery(String),

    #[error("Cannot read infrastructure type from {path}: {reason}")]
    InfrastructureDescriptor { path: String, reason: String },

    #[error("Invalid node address: {0:?}")]
    InvalidAddress(String),

    #[error("Cannot resolve address of node {node}: {source}")]
    Resolution {
        node: String,
        #[source]
        source: Box<BastionError>,
    },

    // Path Errors
    #[error("Path not found: {0}")]
    PathNotFound(String),

    // Config Errors
    #[error("Configuration error: {0}")]
    Config(String),

    // File/IO Errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    // Interrupted by a signal
    #[error("Session interrupted")]
    Interrupted,
}

/// Exit code for failures while resolving the node address.
pub const EXIT_RESOLUTION_FAILURE: u8 = 2;

/// Exit code for sessions ended by SIGINT/SIGTERM/SIGHUP.
pub const EXIT_INTERRUPTED: u8 = 130;

pub const EXIT_GENERIC_FAILURE: u8 = 1;

impl BastionError {
    pub fn execution(command: impl std::fmt::Display, reason: impl std::fmt::Display) -> Self {
        BastionError::Execution {
            command: command.to_string(),
            reason: reason.to_string(),
        }
    }

    pub fn provider_query(err: impl std::fmt::Display) -> Self {
        BastionError::ProviderQuery(err.to_string())
    }

    /// Wrap an error raised while resolving `node`, marking it fatal for the session.
    pub fn resolution(node: &str, source: BastionError) -> Self {
        BastionError::Resolution {
            node: node.to_string(),
            source: Box::new(source),
        }
    }

    pub fn exit_code(&self) -> u8 {
        match self {
            BastionError::Resolution { .. }
            | BastionError::UnsupportedInfrastructure(_)
            | BastionError::InfrastructureDescriptor { .. } => EXIT_RESOLUTION_FAILURE,
            BastionError::Interrupted => EXIT_INTERRUPTED,
            _ => EXIT_GENERIC_FAILURE,
        }
    }
}

pub type Result<T> = std::result::Result<T, BastionError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolution_errors_exit_with_two() {
        let err = BastionError::resolution(
            "node-1",
            BastionError::IpNotFound("gcloud compute instances describe node-1".to_string()),
        );
        assert_eq!(err.exit_code(), 2);
        assert!(err.to_string().contains("node-1"));
        assert_eq!(
            BastionError::UnsupportedInfrastructure("vsphere".to_string()).exit_code(),
            2
        );
    }

    #[test]
    fn test_other_exit_codes() {
        assert_eq!(BastionError::Interrupted.exit_code(), 130);
        assert_eq!(BastionError::execution("kubectl", "boom").exit_code(), 1);
        assert_eq!(BastionError::Config("bad".to_string()).exit_code(), 1);
    }
}
