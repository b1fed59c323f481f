use thiserror::Error;

#[derive(Debug, Error)]
#[error(transparent)]
pub struct Error(Box<ErrorKind>);

pub type StdErrorBoxed = Box<dyn std::error::Error + Send + Sync + 'static>;

impl Error {
    pub fn kind(&self) -> &ErrorKind {
        self.0.as_ref()
    }

    pub fn into_kind(self) -> ErrorKind {
        *self.0
    }

    pub fn invalid_format(name: impl Into<String>) -> Error {
        Error(
            ErrorKind::InvalidFormat {
                element: name.into(),
                message: Default::default(),
            }
            .into(),
        )
    }

    pub fn invalid_arg(name: impl Into<String>, message: impl Into<String>) -> Error {
        Error(
            ErrorKind::InvalidArgument {
                name: name.into(),
                message: message.into(),
            }
            .into(),
        )
    }

    pub fn invalid_operation(name: impl Into<String>) -> Error {
        Error(ErrorKind::InvalidOperation { name: name.into() }.into())
    }

    /// A partition stream violated the block framing or row encoding rules.
    ///
    /// `offset` is the absolute byte offset within the partition file of the
    /// block header that was being processed when the corruption was detected.
    pub fn corrupt_partition(
        partition: impl Into<String>,
        offset: u64,
        message: impl Into<String>,
    ) -> Error {
        Error(
            ErrorKind::CorruptPartition {
                partition: partition.into(),
                offset,
                message: message.into(),
            }
            .into(),
        )
    }

    /// A type or layout invariant was broken, e.g. a non-fundamental type reached
    /// the decoder or a view was read as an incompatible kind.
    pub fn invariant_violation(message: impl Into<String>) -> Error {
        Error(
            ErrorKind::InvariantViolation {
                message: message.into(),
            }
            .into(),
        )
    }

    pub fn parse(position: usize, token: impl Into<String>, message: impl Into<String>) -> Error {
        Error(
            ErrorKind::Parse {
                position,
                token: token.into(),
                message: message.into(),
            }
            .into(),
        )
    }

    pub fn io(context: impl Into<String>, source: std::io::Error) -> Error {
        Error(
            ErrorKind::Io {
                context: context.into(),
                source,
            }
            .into(),
        )
    }

    pub fn metadata<E>(context: impl Into<String>, source: E) -> Error
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Error(
            ErrorKind::Metadata {
                context: context.into(),
                source: Box::new(source),
            }
            .into(),
        )
    }

    pub fn is_corrupt_partition(&self) -> bool {
        matches!(self.kind(), ErrorKind::CorruptPartition { .. })
    }

    pub fn is_invariant_violation(&self) -> bool {
        matches!(self.kind(), ErrorKind::InvariantViolation { .. })
    }
}

#[derive(Debug, Error)]
pub enum ErrorKind {
    #[error("invalid argument {name}: {message}")]
    InvalidArgument { name: String, message: String },

    #[error("invalid operation {name}")]
    InvalidOperation { name: String },

    #[error("invalid storage format for '{element}': {message}")]
    InvalidFormat { element: String, message: String },

    #[error("corrupt partition '{partition}' at byte {offset}: {message}")]
    CorruptPartition {
        partition: String,
        offset: u64,
        message: String,
    },

    #[error("invariant violation: {message}")]
    InvariantViolation { message: String },

    #[error("type parse error at {position} near '{token}': {message}")]
    Parse {
        position: usize,
        token: String,
        message: String,
    },

    #[error("IO error for '{context}': {source}")]
    Io {
        context: String,
        source: std::io::Error,
    },

    #[error("invalid table metadata: {context}")]
    Metadata {
        context: String,
        source: StdErrorBoxed,
    },
}

impl From<ErrorKind> for Error {
    fn from(kind: ErrorKind) -> Self {
        Error(kind.into())
    }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Error::io("", e)
    }
}

#[cfg(test)]
mod tests {
    use super::{Error, ErrorKind};

    #[test]
    fn test_error_kind_predicates() {
        let e = Error::corrupt_partition("parts/part-0", 128, "truncated block");
        assert!(e.is_corrupt_partition());
        assert!(!e.is_invariant_violation());
        assert_eq!(
            e.to_string(),
            "corrupt partition 'parts/part-0' at byte 128: truncated block"
        );

        let e = Error::invariant_violation("Set reached the decoder");
        assert!(e.is_invariant_violation());
        match e.into_kind() {
            ErrorKind::InvariantViolation { message } => {
                assert_eq!(message, "Set reached the decoder")
            }
            other => panic!("unexpected kind {other:?}"),
        }
    }

    #[test]
    fn test_io_conversion() {
        let io = std::io::Error::from(std::io::ErrorKind::NotFound);
        let e: Error = io.into();
        assert!(matches!(e.kind(), ErrorKind::Io { .. }));
    }
}
