use thiserror::Error;

#[derive(Debug, Error)]
#[error(transparent)]
pub struct Error(Box<ErrorKind>);

impl Error {
    pub fn kind(&self) -> &ErrorKind {
        self.0.as_ref()
    }

    pub fn into_kind(self) -> ErrorKind {
        *self.0
    }

    /// Returns `true` if this error reports an argument that violates its precondition.
    pub fn is_invalid_arg(&self) -> bool {
        matches!(self.kind(), ErrorKind::InvalidArgument { .. })
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

    pub fn null_buffer(name: impl Into<String>) -> Error {
        Error(ErrorKind::NullBuffer { name: name.into() }.into())
    }

    pub fn index_out_of_bounds(
        condition: impl Into<String>,
        offset: i64,
        count: i64,
        len: usize,
    ) -> Error {
        Error(
            ErrorKind::IndexOutOfBounds {
                condition: condition.into(),
                offset,
                count,
                len,
            }
            .into(),
        )
    }

    /// Returns `true` if this error reports a missing destination buffer.
    pub fn is_null_buffer(&self) -> bool {
        matches!(self.kind(), ErrorKind::NullBuffer { .. })
    }

    /// Returns `true` if this error reports an offset or count outside of the
    /// target buffer.
    pub fn is_out_of_bounds(&self) -> bool {
        matches!(self.kind(), ErrorKind::IndexOutOfBounds { .. })
    }
}

#[derive(Debug, Error)]
pub enum ErrorKind {
    #[error("invalid argument {name}: {message}")]
    InvalidArgument { name: String, message: String },

    #[error("invalid operation {name}")]
    InvalidOperation { name: String },

    #[error("destination buffer '{name}' is null")]
    NullBuffer { name: String },

    #[error("index out of bounds ({condition}): offset {offset}, count {count}, length {len}")]
    IndexOutOfBounds {
        condition: String,
        offset: i64,
        count: i64,
        len: usize,
    },
}

impl From<ErrorKind> for Error {
    fn from(kind: ErrorKind) -> Self {
        Error(kind.into())
    }
}
