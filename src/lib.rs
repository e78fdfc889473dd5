pub mod commands;
pub mod config;
pub mod credentials;
pub mod date;
pub mod db;
pub mod error;
pub mod models;
pub mod repository;
pub mod session;
pub mod sqlite_repo;
pub mod util;

use std::sync::Arc;

use repository::SchedulerRepository;
use session::Session;

/// State for one interactive session (used by main and tests): the store,
/// the single login session, and the credential-hashing work factor.
pub struct App {
    pub repo: Arc<dyn SchedulerRepository>,
    pub session: Session,
    pub hash_iterations: u32,
}

impl App {
    pub fn new(repo: Arc<dyn SchedulerRepository>, hash_iterations: u32) -> Self {
        Self {
            repo,
            session: Session::new(),
            hash_iterations,
        }
    }
}
