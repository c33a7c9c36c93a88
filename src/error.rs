//! Unified error type.

use std::convert::Infallible;

use crate::method::Method;

/// The error type returned by envreq's fallible operations.
///
/// Missing headers, parameters and content-type fields are not errors: their
/// accessors return `None`. Malformed metadata such as a non-numeric
/// `Content-Length` degrades to a documented fallback. This type only surfaces
/// missing host wiring and invalid caller arguments.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The host never supplied a required environment key.
    #[error("missing `{0}` in environment")]
    MissingEnv(&'static str),

    /// `REQUEST_METHOD` holds a method outside the supported set.
    #[error("unsupported request method `{0}`")]
    UnsupportedMethod(String),

    /// A per-verb body accessor was called on a request that carries no body.
    #[error("request body is not parseable for {0} requests")]
    BodyUnavailable(Method),

    /// A log level outside the defined severities.
    #[error("invalid log level `{0}`")]
    InvalidLevel(String),
}

impl Error {
    /// True for failures caused by the host's environment wiring rather than
    /// by the inbound request or the caller.
    pub fn is_configuration(&self) -> bool {
        matches!(self, Self::MissingEnv(_))
    }
}

impl From<Infallible> for Error {
    fn from(never: Infallible) -> Self {
        match never {}
    }
}
