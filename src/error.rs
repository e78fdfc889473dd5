use std::fmt;

#[derive(Debug)]
pub enum AppError {
    Validation(String),
    Auth(String),
    NotFound(String),
    Capacity(String),
    Database(sqlx::Error),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Validation(msg) => write!(f, "invalid input: {msg}"),
            AppError::Auth(msg) => write!(f, "unauthorized: {msg}"),
            AppError::NotFound(msg) => write!(f, "not found: {msg}"),
            AppError::Capacity(msg) => write!(f, "out of stock: {msg}"),
            AppError::Database(e) => write!(f, "database error: {e}"),
        }
    }
}

impl From<sqlx::Error> for AppError {
    fn from(e: sqlx::Error) -> Self {
        AppError::Database(e)
    }
}
