//! Non-fatal diagnostics produced during lattice generation.
//!
//! Problems that do not stop a build, such as a device of unrecognised kind
//! being placed as a marker, are reported as [`Diagnostic`]s alongside the
//! generated lattice instead of as errors.

use std::fmt;

use latgen_core::identifier::Id;

/// The severity level of a diagnostic.
///
/// Builds either succeed with warnings or fail with a
/// [`crate::LatticeError`], so warnings are the only level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Severity {
    /// An advisory issue; the result is still valid.
    Warning,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Warning => write!(f, "warning"),
        }
    }
}

/// Codes for categorizing diagnostics.
///
/// - `W0xx` - Device hierarchy warnings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    /// Unknown device kind.
    ///
    /// The device kind tag matched no known kind; the device was placed as a
    /// permanent marker at its position.
    W001,
}

impl ErrorCode {
    /// Returns the code as a string, e.g. `"W001"`.
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::W001 => "W001",
        }
    }

    /// Returns a short description of what this code means.
    pub fn description(&self) -> &'static str {
        match self {
            ErrorCode::W001 => "unknown device kind",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A single diagnostic message.
#[derive(Debug, Clone, PartialEq)]
pub struct Diagnostic {
    severity: Severity,
    code: Option<ErrorCode>,
    message: String,
    device: Option<Id>,
    help: Option<String>,
}

impl Diagnostic {
    fn new(severity: Severity, message: impl Into<String>) -> Self {
        Self {
            severity,
            code: None,
            message: message.into(),
            device: None,
            help: None,
        }
    }

    /// Creates a warning diagnostic.
    pub fn warning(message: impl Into<String>) -> Self {
        Self::new(Severity::Warning, message)
    }

    /// Attaches a code.
    pub fn with_code(mut self, code: ErrorCode) -> Self {
        self.code = Some(code);
        self
    }

    /// Attaches the device the diagnostic is about.
    pub fn with_device(mut self, device: Id) -> Self {
        self.device = Some(device);
        self
    }

    /// Attaches help text.
    pub fn with_help(mut self, help: impl Into<String>) -> Self {
        self.help = Some(help.into());
        self
    }

    pub fn severity(&self) -> Severity {
        self.severity
    }

    pub fn code(&self) -> Option<ErrorCode> {
        self.code
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn device(&self) -> Option<Id> {
        self.device
    }

    pub fn help(&self) -> Option<&str> {
        self.help.as_deref()
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.code {
            Some(code) => write!(f, "{}[{}]: {}", self.severity, code, self.message),
            None => write!(f, "{}: {}", self.severity, self.message),
        }
    }
}
