use std::io::{self, BufRead, Write};
use std::sync::Arc;

use tracing_subscriber::EnvFilter;

use vaccine_scheduler::commands::{self, Outcome};
use vaccine_scheduler::config::Config;
use vaccine_scheduler::sqlite_repo::SqliteRepository;
use vaccine_scheduler::{db, App};

#[tokio::main]
async fn main() {
    // Logs go to stderr; stdout is reserved for command output.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(io::stderr)
        .init();

    let config = Config::from_env();

    let pool = db::init_pool(&config.database_url)
        .await
        .expect("Failed to initialize database");

    tracing::info!("Database initialized at {}", config.database_url);

    let repo = Arc::new(SqliteRepository::new(pool));
    let mut app = App::new(repo, config.hash_iterations);

    println!();
    println!("Welcome to the Vaccine Reservation Scheduling Application!");
    commands::print_menu();

    let stdin = io::stdin();
    let mut input = stdin.lock();
    let mut line = String::new();

    loop {
        print!("> ");
        io::stdout().flush().expect("Failed to flush stdout");

        line.clear();
        match input.read_line(&mut line) {
            Ok(0) => break, // EOF
            Ok(_) => {}
            Err(e) => {
                tracing::error!("Failed to read input: {e}");
                break;
            }
        }

        match commands::dispatch(&mut app, line.trim()).await {
            Ok(Outcome::Continue) => {}
            Ok(Outcome::Quit) => break,
            Err(e) => {
                tracing::warn!(error = %e, "Command failed");
                println!("{e}");
            }
        }
    }
}
