use std::error::Error as StdError;
use std::fmt;
use std::path::PathBuf;

use tracing_error::{SpanTrace, SpanTraceStatus};

/* 📖 # Why a custom error type and not anyhow/thiserror?

Every failure inside prefscope is absorbed at the accessor boundary: a missing
store reads as empty, a half-written store reads as the last good snapshot, a
watch that cannot be installed leaves monitoring off. The error type therefore
mostly travels into log lines, so it carries what a log reader needs: a kind to
match on, a stack of context strings and the span trace that was active when the
error was created.
*/

/// Error variants that can occur while locating, reading or watching a store.
#[derive(Debug)]
pub enum ErrorKind {
    /// File system operation failed
    FileError {
        path: PathBuf,
        source: std::io::Error,
    },

    /// The requested capability does not exist on this platform
    Unsupported { what: String },

    /// A store was found but its contents could not be parsed
    Parse { what: String, message: String },

    /// Catch-all for other errors with a message
    Message { message: String },
}

impl ErrorKind {
    /// True for file errors caused by a missing file or directory.
    pub fn is_not_found(&self) -> bool {
        matches!(self, ErrorKind::FileError { source, .. } if source.kind() == std::io::ErrorKind::NotFound)
    }
}

/// Error wrapping an [`ErrorKind`] with context and a span trace.
pub struct PrefsError {
    kind: ErrorKind,
    context: Vec<String>,
    span_trace: SpanTrace,
}

impl PrefsError {
    /// Creates a new error from an ErrorKind, capturing the current span trace.
    pub fn new(kind: ErrorKind) -> Self {
        Self {
            kind,
            context: vec![],
            span_trace: SpanTrace::capture(),
        }
    }

    /// Shorthand for [`ErrorKind::Message`].
    pub fn message(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Message {
            message: message.into(),
        })
    }

    /// Shorthand for [`ErrorKind::Unsupported`].
    pub fn unsupported(what: impl Into<String>) -> Self {
        Self::new(ErrorKind::Unsupported { what: what.into() })
    }

    /// Shorthand for [`ErrorKind::Parse`].
    pub fn parse(what: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Parse {
            what: what.into(),
            message: message.into(),
        })
    }

    /// Shorthand for [`ErrorKind::FileError`].
    pub fn file(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::new(ErrorKind::FileError {
            path: path.into(),
            source,
        })
    }

    /// Attaches context to an error.
    pub fn context(mut self, context: impl Into<String>) -> Self {
        self.context.push(context.into());
        self
    }

    /// Attaches context using lazy evaluation.
    pub fn with_context<F>(mut self, f: F) -> Self
    where
        F: FnOnce() -> String,
    {
        self.context.push(f());
        self
    }

    pub fn kind(&self) -> &ErrorKind {
        &self.kind
    }

    pub fn get_context(&self) -> &[String] {
        &self.context
    }

    fn fmt_kind(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            ErrorKind::FileError { path, source } => {
                write!(f, "File error at {}: {}", path.display(), source)
            }
            ErrorKind::Unsupported { what } => write!(f, "Unsupported: {}", what),
            ErrorKind::Parse { what, message } => {
                write!(f, "Failed to parse {}: {}", what, message)
            }
            ErrorKind::Message { message } => write!(f, "{}", message),
        }
    }

    fn fmt_tree(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (index, ctx) in self.context.iter().enumerate() {
            let branch = if index + 1 == self.context.len() { "└─" } else { "├─" };
            writeln!(f, "{} {}", branch, ctx)?;
        }
        Ok(())
    }
}

impl StdError for PrefsError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match &self.kind {
            ErrorKind::FileError { source, .. } => Some(source),
            _ => None,
        }
    }
}

impl fmt::Display for PrefsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for ctx in &self.context {
            write!(f, "{}: ", ctx)?;
        }
        self.fmt_kind(f)?;
        Ok(())
    }
}

impl fmt::Debug for PrefsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.fmt_kind(f)?;
        writeln!(f)?;
        self.fmt_tree(f)?;
        if self.span_trace.status() == SpanTraceStatus::CAPTURED {
            writeln!(f, "Trace: {}", self.span_trace)?;
        }
        Ok(())
    }
}

/// Standard result type for prefscope operations.
pub type PrefsResult<T> = std::result::Result<T, Box<PrefsError>>;

/// Extension trait for attaching context to Results.
pub trait ResultExt<T> {
    /// Attaches context to an error, consuming and re-wrapping it.
    fn context(self, context: impl Into<String>) -> PrefsResult<T>;

    /// Attaches context that is only built if the result is an error.
    fn with_context<F>(self, f: F) -> PrefsResult<T>
    where
        F: FnOnce() -> String;
}

impl<T> ResultExt<T> for PrefsResult<T> {
    fn context(self, context: impl Into<String>) -> PrefsResult<T> {
        self.map_err(|err| Box::new(err.context(context)))
    }

    fn with_context<F>(self, f: F) -> PrefsResult<T>
    where
        F: FnOnce() -> String,
    {
        self.map_err(|err| Box::new(err.with_context(f)))
    }
}

/// Creates a boxed [`PrefsError`] from a format string.
#[macro_export]
macro_rules! err {
    ($($arg:tt)*) => {
        Box::new($crate::PrefsError::message(format!($($arg)*)))
    };
}

/// Returns early with a boxed [`PrefsError`] built from a format string.
#[macro_export]
macro_rules! bail {
    ($($arg:tt)*) => {
        return Err($crate::err!($($arg)*))
    };
}
