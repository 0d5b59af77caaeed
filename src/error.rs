//! Error types for the Brain SDK
//!
//! Every variant carries a stable string code (see [`Error::code`]) so the
//! inbound router and callers can match on the same identifiers the Brain
//! uses on the wire.

use thiserror::Error;

/// Result type alias for SDK operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in the Brain SDK
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),

    /// Device name is empty
    #[error("INVALID_DEVICE_NAME")]
    InvalidDeviceName,

    /// A declared control has an empty name
    #[error("INVALID_COMPONENT_NAME: {0}")]
    InvalidComponentName(String),

    /// Buttons were declared but no button handler was set
    #[error("BUTTON_HANDLER_MISSING: {0}")]
    ButtonHandlerMissing(String),

    /// Slider range lower bound is not below upper bound
    #[error("INVALID_SLIDER_RANGE: {0}")]
    InvalidSliderRange(String),

    /// Two capabilities of one adapter resolve to the same path
    #[error("DUPLICATE_PATH_DETECTED: {0}")]
    DuplicatePath(String),

    /// Adapter declares discovery-dependent capabilities without discovery
    #[error("DISCOVERY_REQUIRED: {0}")]
    DiscoveryRequired(String),

    /// Get request without handler, component type or controller
    #[error("INVALID_GET_PARAMETER")]
    InvalidGetParameter,

    /// Set request without handler, component type or controller
    #[error("INVALID_SET_PARAMETER")]
    InvalidSetParameter,

    /// Action request without handler, component type or controller
    #[error("INVALID_ACTION_PARAMETER")]
    InvalidActionParameter,

    /// Component type not supported for get
    #[error("INVALID_GET_COMPONENT: {0}")]
    InvalidGetComponent(String),

    /// Component type not supported for set
    #[error("INVALID_SET_COMPONENT: {0}")]
    InvalidSetComponent(String),

    /// Component type not supported for action
    #[error("INVALID_ACTION_COMPONENT: {0}")]
    InvalidActionComponent(String),

    /// Controller is missing the callback the component type requires
    #[error("CONTROLLER_IS_NOT_A_FUNCTION: {0}")]
    ControllerNotAFunction(String),

    /// Directory getter resolved without a browse result
    #[error("DIRECTORY_NO_BROWSERESULT_RETURNED_FROM_GETTER")]
    DirectoryNoBrowseResult,

    /// Discovery controller returned something that is not a device list
    #[error("INVALID_DISCOVERY_RESULT: {0}")]
    InvalidDiscoveryResult(String),

    /// Discovery controller returned an entry without id or name
    #[error("INVALID_DISCOVERY_PARAMETER: {0}")]
    InvalidDiscoveryParameter(String),

    /// Discovery controller returned the same id twice
    #[error("INVALID_DISCOVERY_DUPLICATE_DEVICE_IDS")]
    DuplicateDiscoveryIds,

    /// Brain answered with an unexpected payload shape
    #[error("INVALID_SERVER_RESPONSE: {0}")]
    InvalidServerResponse(String),

    /// No event key for the requested component
    #[error("COMPONENTNAME_NOT_FOUND: {0}")]
    ComponentNameNotFound(String),

    /// Too many notifications in flight
    #[error("MAX_QUEUESIZE_REACHED")]
    MaxQueueSizeReached,

    /// Notification lacks the fields needed to deliver it
    #[error("INVALID_NOTIFICATION_DATA: {0}")]
    InvalidNotification(String),

    /// List limit outside the supported window
    #[error("INVALID_LIST_LIMIT: {0}")]
    InvalidListLimit(usize),

    /// Discovery finished without a compatible brain
    #[error("No Brain found after {0}ms!")]
    BrainNotFound(u128),

    /// Brain answered a REST call with a failure status
    #[error("brain request failed: {0}")]
    BrainRequest(String),

    /// mDNS browsing error
    #[error("mdns error: {0}")]
    Mdns(String),

    /// User controller callback failed
    #[error("controller error: {0}")]
    Controller(anyhow::Error),

    /// Resource not found
    #[error("not found: {0}")]
    NotFound(String),

    /// IO error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// HTTP error
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// TOML parsing error
    #[error("toml error: {0}")]
    Toml(#[from] toml::de::Error),
}

impl Error {
    /// Stable string code for this error
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::Config(_) => "CONFIGURATION_ERROR",
            Self::InvalidDeviceName => "INVALID_DEVICE_NAME",
            Self::InvalidComponentName(_) => "INVALID_COMPONENT_NAME",
            Self::ButtonHandlerMissing(_) => "BUTTON_HANDLER_MISSING",
            Self::InvalidSliderRange(_) => "INVALID_SLIDER_RANGE",
            Self::DuplicatePath(_) => "DUPLICATE_PATH_DETECTED",
            Self::DiscoveryRequired(_) => "DISCOVERY_REQUIRED",
            Self::InvalidGetParameter => "INVALID_GET_PARAMETER",
            Self::InvalidSetParameter => "INVALID_SET_PARAMETER",
            Self::InvalidActionParameter => "INVALID_ACTION_PARAMETER",
            Self::InvalidGetComponent(_) => "INVALID_GET_COMPONENT",
            Self::InvalidSetComponent(_) => "INVALID_SET_COMPONENT",
            Self::InvalidActionComponent(_) => "INVALID_ACTION_COMPONENT",
            Self::ControllerNotAFunction(_) => "CONTROLLER_IS_NOT_A_FUNCTION",
            Self::DirectoryNoBrowseResult => "DIRECTORY_NO_BROWSERESULT_RETURNED_FROM_GETTER",
            Self::InvalidDiscoveryResult(_) => "INVALID_DISCOVERY_RESULT",
            Self::InvalidDiscoveryParameter(_) => "INVALID_DISCOVERY_PARAMETER",
            Self::DuplicateDiscoveryIds => "INVALID_DISCOVERY_DUPLICATE_DEVICE_IDS",
            Self::InvalidServerResponse(_) => "INVALID_SERVER_RESPONSE",
            Self::ComponentNameNotFound(_) => "COMPONENTNAME_NOT_FOUND",
            Self::MaxQueueSizeReached => "MAX_QUEUESIZE_REACHED",
            Self::InvalidNotification(_) => "INVALID_NOTIFICATION_DATA",
            Self::InvalidListLimit(_) => "INVALID_LIST_LIMIT",
            Self::BrainNotFound(_) => "BRAIN_NOT_FOUND",
            Self::BrainRequest(_) => "BRAIN_REQUEST_FAILED",
            Self::Mdns(_) => "MDNS_ERROR",
            Self::Controller(_) => "CONTROLLER_FAILED",
            Self::NotFound(_) => "NOT_FOUND",
            Self::Io(_) => "IO_ERROR",
            Self::Http(_) => "HTTP_ERROR",
            Self::Serialization(_) => "SERIALIZATION_ERROR",
            Self::Toml(_) => "TOML_ERROR",
        }
    }

    /// Whether this error comes from validating an inbound request
    ///
    /// The router answers these with a 404-class status.
    #[must_use]
    pub const fn is_dispatch_error(&self) -> bool {
        matches!(
            self,
            Self::InvalidGetParameter
                | Self::InvalidSetParameter
                | Self::InvalidActionParameter
                | Self::InvalidGetComponent(_)
                | Self::InvalidSetComponent(_)
                | Self::InvalidActionComponent(_)
                | Self::ControllerNotAFunction(_)
                | Self::NotFound(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_match_display_prefix() {
        let err = Error::DuplicatePath("POWER".to_string());
        assert_eq!(err.code(), "DUPLICATE_PATH_DETECTED");
        assert!(err.to_string().starts_with(err.code()));

        let err = Error::MaxQueueSizeReached;
        assert_eq!(err.to_string(), "MAX_QUEUESIZE_REACHED");
    }

    #[test]
    fn brain_not_found_message() {
        assert_eq!(Error::BrainNotFound(30).to_string(), "No Brain found after 30ms!");
    }

    #[test]
    fn dispatch_errors_are_classified() {
        assert!(Error::InvalidGetParameter.is_dispatch_error());
        assert!(Error::ControllerNotAFunction("getter".into()).is_dispatch_error());
        assert!(!Error::MaxQueueSizeReached.is_dispatch_error());
    }
}
