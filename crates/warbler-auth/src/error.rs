use warbler_db::DbError;

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("Auth: password hashing failed: {0}")]
    Hashing(String),

    #[error(transparent)]
    Db(#[from] DbError),
}
