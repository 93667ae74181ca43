use crate::db::DbError;
use crate::query::SchemaError;
use crate::topic::DispatchError;
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

pub type RegistryResult<T> = Result<T, RegistryError>;
pub(crate) type KindResult<T> = Result<T, RegistryErrorKind>;

/// Failure category of a registry call.
#[derive(Debug)]
pub enum RegistryErrorKind {
    Schema(SchemaError),
    /// No live row matched. Carries the id for by-id operations.
    NotFound(Option<Uuid>),
    Storage(DbError),
    /// Storage succeeded; the change notification did not.
    Dispatch(DispatchError),
    Cancelled,
}

impl Display for RegistryErrorKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Schema(err) => write!(f, "{err}"),
            Self::NotFound(Some(id)) => write!(f, "record not found: {id}"),
            Self::NotFound(None) => write!(f, "no matching record"),
            Self::Storage(err) => write!(f, "{err}"),
            Self::Dispatch(err) => write!(f, "{err}"),
            Self::Cancelled => write!(f, "operation cancelled"),
        }
    }
}

impl From<SchemaError> for RegistryErrorKind {
    fn from(value: SchemaError) -> Self {
        Self::Schema(value)
    }
}

impl From<DbError> for RegistryErrorKind {
    fn from(value: DbError) -> Self {
        Self::Storage(value)
    }
}

impl From<DispatchError> for RegistryErrorKind {
    fn from(value: DispatchError) -> Self {
        Self::Dispatch(value)
    }
}

impl From<rusqlite::Error> for RegistryErrorKind {
    fn from(value: rusqlite::Error) -> Self {
        if value.sqlite_error_code() == Some(rusqlite::ErrorCode::OperationInterrupted) {
            return Self::Cancelled;
        }
        Self::Storage(DbError::Sqlite(value))
    }
}

/// Registry failure with the entity and operation it happened in.
#[derive(Debug)]
pub struct RegistryError {
    pub entity: &'static str,
    pub operation: &'static str,
    pub kind: RegistryErrorKind,
}

impl RegistryError {
    pub fn new(entity: &'static str, operation: &'static str, kind: RegistryErrorKind) -> Self {
        Self {
            entity,
            operation,
            kind,
        }
    }

    pub fn kind(&self) -> &RegistryErrorKind {
        &self.kind
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self.kind, RegistryErrorKind::NotFound(_))
    }

    pub fn is_schema(&self) -> bool {
        matches!(self.kind, RegistryErrorKind::Schema(_))
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self.kind, RegistryErrorKind::Cancelled)
    }

    pub fn is_dispatch(&self) -> bool {
        matches!(self.kind, RegistryErrorKind::Dispatch(_))
    }

    /// Stable code used in log lines.
    pub fn code(&self) -> &'static str {
        match self.kind {
            RegistryErrorKind::Schema(_) => "schema",
            RegistryErrorKind::NotFound(_) => "not_found",
            RegistryErrorKind::Storage(_) => "storage",
            RegistryErrorKind::Dispatch(_) => "dispatch",
            RegistryErrorKind::Cancelled => "cancelled",
        }
    }
}

impl Display for RegistryError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}: {}", self.entity, self.operation, self.kind)
    }
}

impl Error for RegistryError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match &self.kind {
            RegistryErrorKind::Schema(err) => Some(err),
            RegistryErrorKind::Storage(err) => Some(err),
            RegistryErrorKind::Dispatch(err) => Some(err),
            RegistryErrorKind::NotFound(_) | RegistryErrorKind::Cancelled => None,
        }
    }
}
