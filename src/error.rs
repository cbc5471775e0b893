use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Config,
    Connection,
    Query,
    Input,
    Export,
    Internal,
}

impl ErrorKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorKind::Config => "Config",
            ErrorKind::Connection => "Connection",
            ErrorKind::Query => "Query",
            ErrorKind::Input => "Input",
            ErrorKind::Export => "Export",
            ErrorKind::Internal => "Internal",
        }
    }
}

#[derive(Debug)]
pub struct AppError {
    pub kind: ErrorKind,
    pub message: String,
}

impl AppError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for AppError {}

/// Kind of the first [`AppError`] in the chain, `Internal` when there is none.
pub fn classify_error(err: &anyhow::Error) -> ErrorKind {
    err.chain()
        .find_map(|cause| cause.downcast_ref::<AppError>())
        .map(|app| app.kind)
        .unwrap_or(ErrorKind::Internal)
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Context;

    #[test]
    fn classifies_wrapped_app_errors() {
        let err: anyhow::Error = AppError::new(ErrorKind::Export, "disk full").into();
        let err = Err::<(), _>(err).context("writing report").unwrap_err();
        assert_eq!(classify_error(&err), ErrorKind::Export);
    }

    #[test]
    fn plain_errors_are_internal() {
        let err = anyhow::anyhow!("boom");
        assert_eq!(classify_error(&err), ErrorKind::Internal);
    }
}
