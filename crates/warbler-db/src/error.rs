use rusqlite::ErrorCode;
use rusqlite::ffi;

/// Which declared constraint the store rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Constraint {
    Unique,
    NotNull,
    ForeignKey,
    PrimaryKey,
    Check,
    Other,
}

impl Constraint {
    fn from_extended_code(code: i32) -> Self {
        match code {
            ffi::SQLITE_CONSTRAINT_UNIQUE => Constraint::Unique,
            ffi::SQLITE_CONSTRAINT_NOTNULL => Constraint::NotNull,
            ffi::SQLITE_CONSTRAINT_FOREIGNKEY => Constraint::ForeignKey,
            ffi::SQLITE_CONSTRAINT_PRIMARYKEY => Constraint::PrimaryKey,
            ffi::SQLITE_CONSTRAINT_CHECK => Constraint::Check,
            _ => Constraint::Other,
        }
    }
}

/// Errors raised by the persistence layer.
#[derive(Debug, thiserror::Error)]
pub enum DbError {
    /// The store refused a staged change at flush or commit time. The
    /// session that hit it is poisoned until rolled back.
    #[error("DB: integrity violation ({constraint:?}): {message}")]
    IntegrityViolation {
        constraint: Constraint,
        message: String,
    },

    /// The session is poisoned by an earlier failure; call `rollback()` first.
    #[error("DB: this session's transaction has been rolled back due to a previous error; call rollback() before reusing it")]
    InvalidTransaction,

    #[error("DB: connection lock poisoned")]
    LockPoisoned,

    #[error("DB: SQLite error: {0}")]
    Sqlite(rusqlite::Error),
}

impl DbError {
    pub fn is_integrity_violation(&self) -> bool {
        matches!(self, DbError::IntegrityViolation { .. })
    }

    pub fn constraint(&self) -> Option<Constraint> {
        match self {
            DbError::IntegrityViolation { constraint, .. } => Some(*constraint),
            _ => None,
        }
    }
}

impl From<rusqlite::Error> for DbError {
    fn from(err: rusqlite::Error) -> Self {
        match err {
            rusqlite::Error::SqliteFailure(code, message)
                if code.code == ErrorCode::ConstraintViolation =>
            {
                DbError::IntegrityViolation {
                    constraint: Constraint::from_extended_code(code.extended_code),
                    message: message.unwrap_or_else(|| code.to_string()),
                }
            }
            other => DbError::Sqlite(other),
        }
    }
}

pub type Result<T> = std::result::Result<T, DbError>;
