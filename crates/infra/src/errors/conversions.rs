//! Conversions from external infrastructure errors into domain errors.

use reqwest::Error as HttpError;
use rusqlite::Error as SqlError;
use slotwise_domain::SlotwiseError;

/// Error newtype that keeps conversions on the infrastructure side and can be
/// converted back into the domain error.
#[derive(Debug)]
pub struct InfraError(pub SlotwiseError);

impl From<InfraError> for SlotwiseError {
    fn from(value: InfraError) -> Self {
        value.0
    }
}

impl From<SlotwiseError> for InfraError {
    fn from(value: SlotwiseError) -> Self {
        Self(value)
    }
}

trait IntoSlotwiseError {
    fn into_slotwise(self) -> SlotwiseError;
}

/* -------------------------------------------------------------------------- */
/* rusqlite::Error → SlotwiseError */
/* -------------------------------------------------------------------------- */

impl IntoSlotwiseError for SqlError {
    fn into_slotwise(self) -> SlotwiseError {
        use rusqlite::ffi::ErrorCode;
        use rusqlite::Error as RE;

        match self {
            RE::SqliteFailure(err, maybe_message) => {
                let message = maybe_message.unwrap_or_default();
                match (err.code, err.extended_code) {
                    (ErrorCode::DatabaseBusy, _) => {
                        SlotwiseError::Database("database is busy".into())
                    }
                    (ErrorCode::DatabaseLocked, _) => {
                        SlotwiseError::Database("database is locked".into())
                    }
                    (ErrorCode::ConstraintViolation, 2067) => {
                        SlotwiseError::Conflict("unique constraint violation".into())
                    }
                    (ErrorCode::ConstraintViolation, 787) => {
                        SlotwiseError::InvalidInput("foreign key constraint violation".into())
                    }
                    _ => SlotwiseError::Database(format!(
                        "sqlite failure {:?} (code {}): {}",
                        err.code, err.extended_code, message
                    )),
                }
            }
            RE::QueryReturnedNoRows => SlotwiseError::NotFound("no rows returned by query".into()),
            RE::FromSqlConversionFailure(_, _, cause) => {
                SlotwiseError::Database(format!("failed to convert sqlite value: {cause}"))
            }
            RE::InvalidColumnType(_, _, ty) => {
                SlotwiseError::Database(format!("invalid column type: {ty}"))
            }
            RE::InvalidParameterName(name) => {
                SlotwiseError::Database(format!("invalid parameter name: {name}"))
            }
            RE::InvalidPath(path) => SlotwiseError::Database(format!(
                "invalid database path: {}",
                path.to_string_lossy()
            )),
            RE::InvalidQuery => SlotwiseError::Database("invalid SQL query".into()),
            other => SlotwiseError::Database(other.to_string()),
        }
    }
}

impl From<SqlError> for InfraError {
    fn from(value: SqlError) -> Self {
        Self(value.into_slotwise())
    }
}

impl From<r2d2::Error> for InfraError {
    fn from(value: r2d2::Error) -> Self {
        Self(SlotwiseError::Database(format!("connection pool error: {value}")))
    }
}

/* -------------------------------------------------------------------------- */
/* reqwest::Error → SlotwiseError */
/* -------------------------------------------------------------------------- */

impl IntoSlotwiseError for HttpError {
    fn into_slotwise(self) -> SlotwiseError {
        if self.is_timeout() {
            return SlotwiseError::Network("HTTP request timed out".into());
        }

        if self.is_connect() {
            return SlotwiseError::Network("HTTP connection failure".into());
        }

        if let Some(status) = self.status() {
            let code = status.as_u16();
            let reason = status.canonical_reason().unwrap_or("unknown status");
            let message = format!("HTTP {code} {reason}");

            return match code {
                401 | 403 => SlotwiseError::Auth(message),
                404 => SlotwiseError::NotFound(message),
                400..=499 if code != 429 => SlotwiseError::InvalidInput(message),
                _ => SlotwiseError::Network(message),
            };
        }

        SlotwiseError::Network(self.to_string())
    }
}

impl From<HttpError> for InfraError {
    fn from(value: HttpError) -> Self {
        Self(value.into_slotwise())
    }
}

/* -------------------------------------------------------------------------- */
/* Serialisation and file errors */
/* -------------------------------------------------------------------------- */

impl From<serde_json::Error> for InfraError {
    fn from(value: serde_json::Error) -> Self {
        Self(SlotwiseError::InvalidInput(format!("invalid JSON: {value}")))
    }
}

impl From<toml::de::Error> for InfraError {
    fn from(value: toml::de::Error) -> Self {
        Self(SlotwiseError::Config(format!("invalid TOML: {value}")))
    }
}

impl From<std::io::Error> for InfraError {
    fn from(value: std::io::Error) -> Self {
        match value.kind() {
            std::io::ErrorKind::NotFound => Self(SlotwiseError::NotFound(value.to_string())),
            _ => Self(SlotwiseError::Internal(format!("I/O error: {value}"))),
        }
    }
}

/// Shorthand used by adapters that hold a foreign error
pub(crate) fn to_domain<E>(err: E) -> SlotwiseError
where
    InfraError: From<E>,
{
    InfraError::from(err).into()
}
