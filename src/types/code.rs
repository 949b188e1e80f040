//! Outcome codes.
//!
//! The closed set of terminal RPC results is the 17 gRPC status codes,
//! represented by [`tonic::Code`]. Label values follow the canonical gRPC
//! names ("OK", "Canceled", ...), not the Rust variant names.

use std::error::Error;

use tonic::{Code, Status};

/// Every known outcome code, in numeric order.
pub const ALL_CODES: [Code; 17] = [
    Code::Ok,
    Code::Cancelled,
    Code::Unknown,
    Code::InvalidArgument,
    Code::DeadlineExceeded,
    Code::NotFound,
    Code::AlreadyExists,
    Code::PermissionDenied,
    Code::ResourceExhausted,
    Code::FailedPrecondition,
    Code::Aborted,
    Code::OutOfRange,
    Code::Unimplemented,
    Code::Internal,
    Code::Unavailable,
    Code::DataLoss,
    Code::Unauthenticated,
];

/// The `grpc_code` label value for a code.
pub fn code_label(code: Code) -> &'static str {
    match code {
        Code::Ok => "OK",
        Code::Cancelled => "Canceled",
        Code::Unknown => "Unknown",
        Code::InvalidArgument => "InvalidArgument",
        Code::DeadlineExceeded => "DeadlineExceeded",
        Code::NotFound => "NotFound",
        Code::AlreadyExists => "AlreadyExists",
        Code::PermissionDenied => "PermissionDenied",
        Code::ResourceExhausted => "ResourceExhausted",
        Code::FailedPrecondition => "FailedPrecondition",
        Code::Aborted => "Aborted",
        Code::OutOfRange => "OutOfRange",
        Code::Unimplemented => "Unimplemented",
        Code::Internal => "Internal",
        Code::Unavailable => "Unavailable",
        Code::DataLoss => "DataLoss",
        Code::Unauthenticated => "Unauthenticated",
    }
}

/// Anything an RPC can finish with that maps onto an outcome code.
pub trait OutcomeCode {
    fn outcome_code(&self) -> Code;
}

impl OutcomeCode for Code {
    fn outcome_code(&self) -> Code {
        *self
    }
}

impl OutcomeCode for Status {
    fn outcome_code(&self) -> Code {
        self.code()
    }
}

impl<T, E: OutcomeCode> OutcomeCode for Result<T, E> {
    fn outcome_code(&self) -> Code {
        match self {
            Ok(_) => Code::Ok,
            Err(e) => e.outcome_code(),
        }
    }
}

impl OutcomeCode for std::io::Error {
    fn outcome_code(&self) -> Code {
        // io::Error hides its payload from `source()`, so look inside first.
        match self.get_ref() {
            Some(inner) => code_from_error(inner),
            None => Code::Unknown,
        }
    }
}

impl OutcomeCode for Box<dyn Error + Send + Sync> {
    fn outcome_code(&self) -> Code {
        code_from_error(&**self)
    }
}

/// Classify an arbitrary error.
///
/// Walks the `source()` chain looking for a [`Status`]; errors that wrap a
/// status at any depth keep its code. Anything else is `Unknown`.
pub fn code_from_error(err: &(dyn Error + 'static)) -> Code {
    let mut current = Some(err);
    while let Some(e) = current {
        if let Some(status) = e.downcast_ref::<Status>() {
            return status.code();
        }
        if let Some(io) = e.downcast_ref::<std::io::Error>() {
            if let Some(inner) = io.get_ref() {
                return code_from_error(inner);
            }
        }
        current = e.source();
    }
    Code::Unknown
}
