use bar_core::CoreError;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("Migration error: {0}")]
    Migrate(#[from] sqlx::migrate::MigrateError),
    #[error("Malformed change payload: {0}")]
    Payload(#[from] serde_json::Error),
    #[error("Unknown column: {0}")]
    UnknownColumn(String),
}

impl From<StoreError> for CoreError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::UnknownColumn(field) => CoreError::Validation(format!("unknown column `{field}`")),
            other => CoreError::Storage(other.to_string()),
        }
    }
}

pub type StoreResult<T> = Result<T, StoreError>;
