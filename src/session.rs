use crate::error::AppError;

/// The authenticated user of the current interactive session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CurrentUser {
    Patient(String),
    Caregiver(String),
}

impl CurrentUser {
    pub fn username(&self) -> &str {
        match self {
            CurrentUser::Patient(name) | CurrentUser::Caregiver(name) => name,
        }
    }
}

/// At most one user is logged in at a time; login while a session is active
/// is refused, logout without one likewise.
#[derive(Debug, Default)]
pub struct Session {
    current: Option<CurrentUser>,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn login(&mut self, user: CurrentUser) -> Result<(), AppError> {
        if self.current.is_some() {
            return Err(AppError::Auth("already logged in, log out first".into()));
        }
        tracing::info!(username = user.username(), "Session: login");
        self.current = Some(user);
        Ok(())
    }

    pub fn logout(&mut self) -> Result<(), AppError> {
        match self.current.take() {
            Some(user) => {
                tracing::info!(username = user.username(), "Session: logout");
                Ok(())
            }
            None => Err(AppError::Auth("please login first".into())),
        }
    }

    pub fn current(&self) -> Option<&CurrentUser> {
        self.current.as_ref()
    }
}
