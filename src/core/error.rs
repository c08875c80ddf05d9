//! Error types for the logger system

pub type Result<T> = std::result::Result<T, LoggerError>;

#[derive(Debug, thiserror::Error)]
pub enum LoggerError {
    /// Module name exceeds the handle limit
    #[error("Module name '{module}' is {len} bytes, limit is {max}")]
    ModuleNameTooLong {
        module: String,
        len: usize,
        max: usize,
    },

    /// A setting was changed after the sink was committed
    #[error("Cannot change {setting}: the log sink is already initialized")]
    AlreadyInitialized { setting: String },

    /// Executable name could not be determined
    #[error("Cannot resolve executable identity: {0}")]
    ExecutableIdentity(String),

    /// Current user could not be determined
    #[error("Cannot resolve current user identity: {0}")]
    UserIdentity(String),

    /// Level name rejected by the strict parser
    #[error("Invalid channel: '{0}'")]
    InvalidChannel(String),

    /// Invalid configuration with details
    #[error("Invalid configuration for {component}: {message}")]
    InvalidConfiguration { component: String, message: String },

    /// IO error with context
    #[error("IO error while {operation}: {message}")]
    IoOperation {
        operation: String,
        message: String,
        #[source]
        source: std::io::Error,
    },

    /// File appender error with path
    #[error("File appender error for '{path}': {message}")]
    FileAppenderError { path: String, message: String },

    /// File rotation error
    #[error("File rotation failed for '{path}': {message}")]
    FileRotationError { path: String, message: String },

    /// Writer error (generic)
    #[error("Writer error: {0}")]
    WriterError(String),
}

impl LoggerError {
    /// Create an IO operation error with context
    pub fn io_operation(
        operation: impl Into<String>,
        message: impl Into<String>,
        source: std::io::Error,
    ) -> Self {
        LoggerError::IoOperation {
            operation: operation.into(),
            message: message.into(),
            source,
        }
    }

    pub fn module_name_too_long(module: impl Into<String>, max: usize) -> Self {
        let module = module.into();
        LoggerError::ModuleNameTooLong {
            len: module.len(),
            module,
            max,
        }
    }

    pub fn already_initialized(setting: impl Into<String>) -> Self {
        LoggerError::AlreadyInitialized {
            setting: setting.into(),
        }
    }

    /// Create an invalid configuration error
    pub fn config(component: impl Into<String>, message: impl Into<String>) -> Self {
        LoggerError::InvalidConfiguration {
            component: component.into(),
            message: message.into(),
        }
    }

    /// Create a file appender error
    pub fn file_appender(path: impl Into<String>, message: impl Into<String>) -> Self {
        LoggerError::FileAppenderError {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create a file rotation error
    pub fn file_rotation(path: impl Into<String>, message: impl Into<String>) -> Self {
        LoggerError::FileRotationError {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create a writer error (generic)
    pub fn writer<S: Into<String>>(msg: S) -> Self {
        LoggerError::WriterError(msg.into())
    }
}
