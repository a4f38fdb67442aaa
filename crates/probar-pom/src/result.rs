//! Result and error types for the action engine.

use thiserror::Error;

/// Result type for engine operations
pub type ActionResult<T> = Result<T, ActionError>;

/// How an [`ActionError`] is treated by the fail-fast guard
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    /// Broken test fixture (bad delegate, missing locator data). Always surfaced.
    Fixture,
    /// Flaky or wrong UI state. Absorbed into the run state.
    Interaction,
    /// Explicit validation failure. Always surfaced.
    Assertion,
    /// Artifact, config or serialization trouble outside the action itself.
    Infrastructure,
}

/// Errors that can occur while resolving locators or driving elements
#[derive(Debug, Error)]
pub enum ActionError {
    /// Delegate is neither a raw XPath nor a `component.widgetType.key` triple
    #[error("Malformed locator delegate '{delegate}': expected raw XPath or component.widgetType.key")]
    MalformedDelegate {
        /// Offending delegate
        delegate: String,
    },

    /// Property store for a component could not be located or opened
    #[error("Property store for component '{component}' unavailable: {message}")]
    PropertyStoreUnavailable {
        /// Component name
        component: String,
        /// Error message
        message: String,
    },

    /// Key absent (or empty) in the component's property store
    #[error("Locator key '{key}' missing in property store '{component}'")]
    PropertyKeyMissing {
        /// Component name
        component: String,
        /// Missing key
        key: String,
    },

    /// Element absent, disabled, or never became interactable
    #[error("Element '{locator}' not interactable: {reason}")]
    ElementNotInteractable {
        /// Resolved locator
        locator: String,
        /// Why the element was rejected
        reason: String,
    },

    /// Widget tag the input dispatcher cannot handle
    #[error("Unknown widget type '{widget}'")]
    UnknownWidgetType {
        /// Widget tag
        widget: String,
    },

    /// Value that cannot be applied to the widget in its current state
    #[error("Value '{value}' not applicable to {widget} '{locator}'")]
    ValueNotApplicable {
        /// Widget type name
        widget: String,
        /// Resolved locator
        locator: String,
        /// Offending value (already masked when secret)
        value: String,
    },

    /// Screenshot could not be captured or written
    #[error("Screenshot capture failed: {message}")]
    ScreenshotCapture {
        /// Error message
        message: String,
    },

    /// `validate` condition was false
    #[error("Validation failed: {description}")]
    ValidationFailed {
        /// Validation description
        description: String,
    },

    /// Driver collaborator reported an error
    #[error("Driver error: {message}")]
    Driver {
        /// Error message
        message: String,
    },

    /// Explicit wait expired
    #[error("Timed out after {ms}ms waiting for {waited_for}")]
    Timeout {
        /// Timeout in milliseconds
        ms: u64,
        /// Description of the awaited condition
        waited_for: String,
    },

    /// Configuration could not be read or parsed
    #[error("Configuration error: {message}")]
    Config {
        /// Error message
        message: String,
    },

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl ActionError {
    /// Classify this error for the fail-fast guard
    #[must_use]
    pub const fn class(&self) -> ErrorClass {
        match self {
            Self::MalformedDelegate { .. }
            | Self::PropertyStoreUnavailable { .. }
            | Self::PropertyKeyMissing { .. } => ErrorClass::Fixture,
            Self::ElementNotInteractable { .. }
            | Self::UnknownWidgetType { .. }
            | Self::ValueNotApplicable { .. }
            | Self::Driver { .. }
            | Self::Timeout { .. } => ErrorClass::Interaction,
            Self::ValidationFailed { .. } => ErrorClass::Assertion,
            Self::ScreenshotCapture { .. } | Self::Config { .. } | Self::Io(_) | Self::Json(_) => {
                ErrorClass::Infrastructure
            }
        }
    }

    /// True when the guard swallows this error into the run state
    #[must_use]
    pub const fn is_absorbed(&self) -> bool {
        matches!(self.class(), ErrorClass::Interaction)
    }

    /// Shorthand for a driver failure
    pub fn driver(message: impl Into<String>) -> Self {
        Self::Driver {
            message: message.into(),
        }
    }

    /// Shorthand for a not-interactable element
    pub fn not_interactable(locator: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::ElementNotInteractable {
            locator: locator.into(),
            reason: reason.into(),
        }
    }
}

/// `Io` and `Json` sources are not `Clone`; their copies keep kind and message.
impl Clone for ActionError {
    fn clone(&self) -> Self {
        match self {
            Self::MalformedDelegate { delegate } => Self::MalformedDelegate {
                delegate: delegate.clone(),
            },
            Self::PropertyStoreUnavailable { component, message } => {
                Self::PropertyStoreUnavailable {
                    component: component.clone(),
                    message: message.clone(),
                }
            }
            Self::PropertyKeyMissing { component, key } => Self::PropertyKeyMissing {
                component: component.clone(),
                key: key.clone(),
            },
            Self::ElementNotInteractable { locator, reason } => Self::ElementNotInteractable {
                locator: locator.clone(),
                reason: reason.clone(),
            },
            Self::UnknownWidgetType { widget } => Self::UnknownWidgetType {
                widget: widget.clone(),
            },
            Self::ValueNotApplicable {
                widget,
                locator,
                value,
            } => Self::ValueNotApplicable {
                widget: widget.clone(),
                locator: locator.clone(),
                value: value.clone(),
            },
            Self::ScreenshotCapture { message } => Self::ScreenshotCapture {
                message: message.clone(),
            },
            Self::ValidationFailed { description } => Self::ValidationFailed {
                description: description.clone(),
            },
            Self::Driver { message } => Self::Driver {
                message: message.clone(),
            },
            Self::Timeout { ms, waited_for } => Self::Timeout {
                ms: *ms,
                waited_for: waited_for.clone(),
            },
            Self::Config { message } => Self::Config {
                message: message.clone(),
            },
            Self::Io(err) => Self::Io(std::io::Error::new(err.kind(), err.to_string())),
            Self::Json(err) => Self::Json(serde_json::Error::io(std::io::Error::new(
                std::io::ErrorKind::InvalidData,
                err.to_string(),
            ))),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    mod classification_tests {
        use super::*;

        #[test]
        fn test_fixture_errors_are_not_absorbed() {
            let errors = [
                ActionError::MalformedDelegate {
                    delegate: "a.b".into(),
                },
                ActionError::PropertyStoreUnavailable {
                    component: "Login".into(),
                    message: "missing".into(),
                },
                ActionError::PropertyKeyMissing {
                    component: "Login".into(),
                    key: "Submit".into(),
                },
            ];
            for err in &errors {
                assert_eq!(err.class(), ErrorClass::Fixture);
                assert!(!err.is_absorbed());
            }
        }

        #[test]
        fn test_interaction_errors_are_absorbed() {
            let errors = [
                ActionError::not_interactable("//button", "disabled"),
                ActionError::UnknownWidgetType {
                    widget: "Canvas".into(),
                },
                ActionError::ValueNotApplicable {
                    widget: "CheckBox".into(),
                    locator: "//input".into(),
                    value: "ON".into(),
                },
                ActionError::driver("session lost"),
                ActionError::Timeout {
                    ms: 10,
                    waited_for: "x".into(),
                },
            ];
            for err in &errors {
                assert_eq!(err.class(), ErrorClass::Interaction);
                assert!(err.is_absorbed());
            }
        }

        #[test]
        fn test_validation_is_assertion() {
            let err = ActionError::ValidationFailed {
                description: "title matches".into(),
            };
            assert_eq!(err.class(), ErrorClass::Assertion);
            assert!(!err.is_absorbed());
        }

        #[test]
        fn test_io_is_infrastructure() {
            let err: ActionError = std::io::Error::new(std::io::ErrorKind::Other, "disk").into();
            assert_eq!(err.class(), ErrorClass::Infrastructure);
        }
    }

    mod clone_tests {
        use super::*;

        #[test]
        fn test_clone_keeps_variant_and_message() {
            let err = ActionError::PropertyKeyMissing {
                component: "Login".into(),
                key: "Submit".into(),
            };
            let copy = err.clone();
            assert!(matches!(copy, ActionError::PropertyKeyMissing { .. }));
            assert_eq!(copy.to_string(), err.to_string());
        }

        #[test]
        fn test_clone_io_keeps_kind() {
            let err: ActionError =
                std::io::Error::new(std::io::ErrorKind::NotFound, "gone").into();
            match err.clone() {
                ActionError::Io(io) => {
                    assert_eq!(io.kind(), std::io::ErrorKind::NotFound);
                    assert!(io.to_string().contains("gone"));
                }
                other => panic!("unexpected variant: {other}"),
            }
        }
    }

    mod display_tests {
        use super::*;

        #[test]
        fn test_malformed_delegate_message() {
            let err = ActionError::MalformedDelegate {
                delegate: "Login.Submit".into(),
            };
            assert!(err.to_string().contains("Login.Submit"));
        }

        #[test]
        fn test_timeout_message() {
            let err = ActionError::Timeout {
                ms: 250,
                waited_for: "//a".into(),
            };
            assert_eq!(err.to_string(), "Timed out after 250ms waiting for //a");
        }
    }
}
