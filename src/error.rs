use rocket::{http::Status, response::Responder};
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can arise while handling a request.
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Db(#[from] mongodb::error::Error),
    #[error(transparent)]
    Jwt(#[from] jsonwebtoken::errors::Error),
    #[error("{1}")]
    Status(Status, String),
}

impl Error {
    /// The request was well-formed but invalid.
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::Status(Status::BadRequest, message.into())
    }

    /// The caller is not allowed to do this.
    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::Status(Status::Unauthorized, message.into())
    }

    /// The named resource does not exist (any more).
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::Status(Status::NotFound, message.into())
    }
}

impl<'r, 'o: 'r> Responder<'r, 'o> for Error {
    fn respond_to(self, _: &'r rocket::Request<'_>) -> rocket::response::Result<'o> {
        match &self {
            Self::Status(status, message) => warn!("{status}: {message}"),
            other => error!("{other}"),
        }
        Err(match self {
            Self::Db(_) | Self::Jwt(_) => Status::InternalServerError,
            Self::Status(status, _) => status,
        })
    }
}
