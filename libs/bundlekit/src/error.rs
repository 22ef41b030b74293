use crate::lifecycle::BundleState;

/// Errors produced by [`crate::ServiceRegistry`] and [`crate::ServiceRef`].
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum RegistryError {
    #[error("service '{name}' is already registered")]
    DuplicateName { name: String },

    #[error("service '{name}' is not registered")]
    NotFound { name: String },

    #[error("service '{name}' is registered as {actual}, not {expected}")]
    TypeMismatch {
        name: String,
        expected: &'static str,
        actual: &'static str,
    },
}

/// Errors produced by [`crate::BundleHost`].
///
/// `Start` and `Stop` carry whatever the activator returned; the host has already
/// logged them and put the bundle back into a well-defined state.
#[derive(Debug, thiserror::Error)]
pub enum HostError {
    #[error("bundle '{bundle}' is already installed")]
    DuplicateBundle { bundle: String },

    #[error("bundle '{bundle}' is not installed")]
    UnknownBundle { bundle: String },

    #[error("bundle '{bundle}' cannot {action} while {state}")]
    InvalidState {
        bundle: String,
        action: &'static str,
        state: BundleState,
    },

    #[error("bundle '{bundle}' failed to start: {source:#}")]
    Start {
        bundle: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("bundle '{bundle}' failed to stop: {source:#}")]
    Stop {
        bundle: String,
        #[source]
        source: anyhow::Error,
    },
}
