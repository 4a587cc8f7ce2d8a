use std::io;

use thiserror::Error;

/// A unified result type for all of the crate's fallible operations.
pub type IonResult<T> = Result<T, IonError>;

/// Represents the different types of failure that can occur while reading or writing Ion data.
#[derive(Debug, Error)]
pub enum IonError {
    /// Indicates that an IO error was encountered while reading or writing.
    #[error("an IO error occurred: {source:?}")]
    IoError {
        #[from]
        source: io::Error,
    },

    /// Indicates that the input buffer did not contain enough data to perform the requested
    /// read operation. For example: the stream ended in the middle of a value, or a container's
    /// contents would extend beyond the end of the container itself.
    #[error("the input stream ended unexpectedly while reading {label} (position {position})")]
    IncompleteData {
        label: &'static str,
        position: usize,
    },

    /// Indicates that the data stream being read was not syntactically or structurally valid Ion.
    #[error("could not parse the provided data as Ion: {description}")]
    DecodingError { description: String },

    /// Returned when a value cannot be serialized in the requested form; for example, a raw
    /// binary writer being handed a symbol with inline text instead of a symbol ID.
    #[error("could not encode the provided data as Ion: {description}")]
    EncodingError { description: String },

    /// Returned when the user has performed an operation that is not legal in the reader's or
    /// writer's current state. For example: calling `step_out()` at the top level, or calling
    /// `read_bool()` when the cursor is positioned over a string.
    #[error("the requested operation is not legal in the current state: {operation}")]
    IllegalOperation { operation: String },
}

// `io::Error` does not implement `PartialEq`; comparing the error kinds is close enough for the
// assertions the test suites need to make.
impl PartialEq for IonError {
    fn eq(&self, other: &Self) -> bool {
        use IonError::*;
        match (self, other) {
            (IoError { source: s1 }, IoError { source: s2 }) => s1.kind() == s2.kind(),
            (
                IncompleteData {
                    label: l1,
                    position: p1,
                },
                IncompleteData {
                    label: l2,
                    position: p2,
                },
            ) => l1 == l2 && p1 == p2,
            (DecodingError { description: d1 }, DecodingError { description: d2 }) => d1 == d2,
            (EncodingError { description: d1 }, EncodingError { description: d2 }) => d1 == d2,
            (IllegalOperation { operation: o1 }, IllegalOperation { operation: o2 }) => o1 == o2,
            _ => false,
        }
    }
}

pub fn incomplete_data_error<T>(label: &'static str, position: usize) -> IonResult<T> {
    Err(incomplete_data_error_raw(label, position))
}

pub fn incomplete_data_error_raw(label: &'static str, position: usize) -> IonError {
    IonError::IncompleteData { label, position }
}

/// A convenience method for creating an IonResult containing an IonError::DecodingError with the
/// provided description text.
pub fn decoding_error<T, S: AsRef<str>>(description: S) -> IonResult<T> {
    Err(decoding_error_raw(description))
}

/// A convenience method for creating an IonError::DecodingError with the provided description
/// text. Useful in contexts where the only error that could occur is a decoding error.
pub fn decoding_error_raw<S: AsRef<str>>(description: S) -> IonError {
    IonError::DecodingError {
        description: description.as_ref().to_string(),
    }
}

pub fn encoding_error<T, S: AsRef<str>>(description: S) -> IonResult<T> {
    Err(encoding_error_raw(description))
}

pub fn encoding_error_raw<S: AsRef<str>>(description: S) -> IonError {
    IonError::EncodingError {
        description: description.as_ref().to_string(),
    }
}

pub fn illegal_operation<T, S: AsRef<str>>(operation: S) -> IonResult<T> {
    Err(illegal_operation_raw(operation))
}

pub fn illegal_operation_raw<S: AsRef<str>>(operation: S) -> IonError {
    IonError::IllegalOperation {
        operation: operation.as_ref().to_string(),
    }
}
