/// Construction-time failures. Nothing is attached when one of these is
/// returned.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ControllerError {
    /// No window/document to attach to.
    #[error("{0}")]
    Environment(String),

    /// The dialog argument is not a dialog, or the overflow policy is not
    /// one of `auto`/`manual`.
    #[error("{0}")]
    InvalidArgument(String),
}

impl ControllerError {
    /// Error name as surfaced to script hosts.
    pub fn name(&self) -> &'static str {
        match self {
            ControllerError::Environment(_) => "EnvironmentError",
            ControllerError::InvalidArgument(_) => "InvalidArgumentError",
        }
    }
}

/// A widget command the host refused.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum WidgetError {
    /// e.g. `showModal()` on a dialog that is already open.
    #[error("invalid widget state: {0}")]
    InvalidState(String),

    #[error("widget command failed: {0}")]
    Host(String),
}
