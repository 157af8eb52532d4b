pub(crate) type DynError = Box<dyn std::error::Error + Send + Sync>;

/// Why an operation of this crate did not produce a value.
///
/// Carries an [`ErrorKind`] for callers to branch on, plus a message or the underlying error
/// for logs.
#[derive(Debug)]
pub struct Error {
    kind: ErrorKind,
    message: Option<String>,
    source: Option<DynError>,
}

/// The category of an [`Error`].
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ErrorKind {
    /// Reading input or reaching the service failed.
    IO,
    /// The service answered but refused the request, either with a non-success status or with
    /// an anti-robot page.
    Service,
    /// A response or export did not have the expected shape.
    Deserialize,
    /// An operation completed but did not find a value, e.g. a search without results.
    NoValue,
}

impl Error {
    /// An error of `kind` described by `message`.
    pub fn new<S: Into<String>>(kind: ErrorKind, message: S) -> Self {
        Self {
            kind,
            message: Some(message.into()),
            source: None,
        }
    }

    /// An error of `kind` caused by `source`, which is reported by [`std::error::Error::source`].
    pub fn wrap<E>(kind: ErrorKind, source: E) -> Self
    where
        E: Into<DynError>,
    {
        Self {
            kind,
            message: None,
            source: Some(source.into()),
        }
    }

    /// What went wrong, for branching on.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// Whether the lookup failed only because nothing matched.
    #[must_use]
    pub fn is_no_value(&self) -> bool {
        self.kind == ErrorKind::NoValue
    }
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.kind {
            ErrorKind::IO => f.write_str("IO error")?,
            ErrorKind::Service => f.write_str("Service error")?,
            ErrorKind::Deserialize => f.write_str("Deserialize error")?,
            ErrorKind::NoValue => f.write_str("No value error")?,
        };

        if let Some(message) = &self.message {
            write!(f, ": {message}")?;
        }

        if let Some(cause) = &self.source {
            write!(f, ": caused by {cause}")?;
        }
        Ok(())
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source.as_ref().map(|e| &**e as _)
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Self::wrap(ErrorKind::IO, err)
    }
}
