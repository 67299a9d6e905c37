use rocket::http::Status;
use rocket::response::Responder;
use rocket::{Request, Response};
use std::io::Cursor;
use thiserror::Error;
use tracing::error;
use validator::ValidationErrors;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Internal server error")]
    Db {
        message: String,
        #[source]
        source: sqlx::error::Error,
    },
    #[error("Internal server error")]
    Storage {
        message: String,
        #[source]
        source: redis::RedisError,
    },
    #[error("Internal server error")]
    ObjectStorage { message: String },
    #[error("Authentication required")]
    Unauthenticated,
    #[error("Authentication failed")]
    OAuth { message: String },
    #[error("{0}")]
    Billing(String),
    #[error("Failed to refresh session")]
    SessionRefresh,
    #[error("User not found")]
    UserNotFound,
    #[error("Bad request: {0}")]
    BadRequest(String),
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Validation error: {0}")]
    ValidationError(#[from] ValidationErrors),
    #[error("Internal server error")]
    ConfigurationError {
        message: String,
        #[source]
        source: figment::Error,
    },
}

impl AppError {
    pub fn db(message: impl Into<String>, source: sqlx::error::Error) -> Self {
        Self::Db {
            message: message.into(),
            source,
        }
    }

    pub fn storage(message: impl Into<String>, source: redis::RedisError) -> Self {
        Self::Storage {
            message: message.into(),
            source,
        }
    }

    pub fn object_storage(message: impl Into<String>) -> Self {
        Self::ObjectStorage { message: message.into() }
    }

    pub fn oauth(message: impl Into<String>) -> Self {
        Self::OAuth { message: message.into() }
    }
}

impl From<redis::RedisError> for AppError {
    fn from(e: redis::RedisError) -> Self {
        AppError::storage("Session store error", e)
    }
}

impl From<sqlx::Error> for AppError {
    fn from(e: sqlx::Error) -> Self {
        match e {
            sqlx::Error::RowNotFound => AppError::NotFound("Resource not found".to_string()),
            _ => AppError::db("Database error", e),
        }
    }
}

impl From<figment::Error> for AppError {
    fn from(e: figment::Error) -> Self {
        AppError::ConfigurationError {
            message: "Failed to read configuration".to_string(),
            source: e,
        }
    }
}

impl From<&AppError> for Status {
    fn from(e: &AppError) -> Self {
        match e {
            AppError::Db { .. } => Status::InternalServerError,
            AppError::Storage { .. } => Status::InternalServerError,
            AppError::ObjectStorage { .. } => Status::InternalServerError,
            AppError::Unauthenticated => Status::Unauthorized,
            AppError::OAuth { .. } => Status::InternalServerError,
            AppError::Billing(_) => Status::InternalServerError,
            AppError::SessionRefresh => Status::InternalServerError,
            AppError::UserNotFound => Status::NotFound,
            AppError::BadRequest(_) => Status::BadRequest,
            AppError::NotFound(_) => Status::NotFound,
            AppError::ValidationError(_) => Status::BadRequest,
            AppError::ConfigurationError { .. } => Status::InternalServerError,
        }
    }
}

impl<'r> Responder<'r, 'static> for AppError {
    fn respond_to(self, req: &Request<'_>) -> rocket::response::Result<'static> {
        let method = req.method();
        let uri = req.uri();

        let request_id = req
            .local_cache(|| None::<crate::middleware::RequestId>)
            .as_ref()
            .map(|r| r.0.as_str())
            .unwrap_or("unknown");

        let user_id = req
            .local_cache(|| None::<crate::auth::CurrentSession>)
            .as_ref()
            .map(|s| s.0.user_id.to_string())
            .unwrap_or_else(|| "anonymous".to_string());

        error!(
            error = ?self,
            request_id = %request_id,
            user_id = %user_id,
            method = %method,
            uri = %uri,
            "request failed"
        );

        let status = Status::from(&self);
        let body = self.to_string();

        Response::build().status(status).sized_body(body.len(), Cursor::new(body)).ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn store_errors_map_to_server_error() {
        let err = AppError::from(redis::RedisError::from((redis::ErrorKind::Io, "connection refused")));
        assert_eq!(Status::from(&err), Status::InternalServerError);
        // Backend detail never reaches the response body.
        assert_eq!(err.to_string(), "Internal server error");
    }

    #[test]
    fn unauthenticated_maps_to_401() {
        assert_eq!(Status::from(&AppError::Unauthenticated), Status::Unauthorized);
    }

    #[test]
    fn row_not_found_maps_to_404() {
        let err = AppError::from(sqlx::Error::RowNotFound);
        assert!(matches!(err, AppError::NotFound(_)));
        assert_eq!(Status::from(&err), Status::NotFound);
    }
}
