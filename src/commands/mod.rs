pub mod accounts;
pub mod booking;
pub mod schedule;

use crate::error::AppError;
use crate::App;

/// What the interactive loop should do after a command completes.
#[derive(Debug, PartialEq, Eq)]
pub enum Outcome {
    Continue,
    Quit,
}

pub fn print_menu() {
    println!();
    println!(" *** Please enter one of the following commands *** ");
    println!("> create_patient <username> <password>");
    println!("> create_caregiver <username> <password>");
    println!("> login_patient <username> <password>");
    println!("> login_caregiver <username> <password>");
    println!("> search_caregiver_schedule <date>");
    println!("> reserve <date> <vaccine>");
    println!("> upload_availability <date>");
    println!("> cancel <appointment_id>");
    println!("> add_doses <vaccine> <number>");
    println!("> show_appointments");
    println!("> logout");
    println!("> quit");
    println!();
}

/// Tokenize one input line and route it to its handler. Handler errors are
/// returned to the caller, which reports them and keeps the loop running.
pub async fn dispatch(app: &mut App, line: &str) -> Result<Outcome, AppError> {
    let tokens: Vec<&str> = line.split_whitespace().collect();
    let Some(&operation) = tokens.first() else {
        return Ok(Outcome::Continue);
    };

    tracing::info!(command = operation, "Dispatching command");

    match operation {
        "create_patient" => accounts::create_patient(app, &tokens).await?,
        "create_caregiver" => accounts::create_caregiver(app, &tokens).await?,
        "login_patient" => accounts::login_patient(app, &tokens).await?,
        "login_caregiver" => accounts::login_caregiver(app, &tokens).await?,
        "search_caregiver_schedule" => schedule::search_caregiver_schedule(app, &tokens).await?,
        "reserve" => booking::reserve(app, &tokens).await?,
        "upload_availability" => schedule::upload_availability(app, &tokens).await?,
        "cancel" => booking::cancel(app, &tokens).await?,
        "add_doses" => schedule::add_doses(app, &tokens).await?,
        "show_appointments" => schedule::show_appointments(app, &tokens).await?,
        "logout" => accounts::logout(app, &tokens)?,
        "quit" => {
            println!("Bye!");
            return Ok(Outcome::Quit);
        }
        _ => println!("Invalid operation name!"),
    }

    Ok(Outcome::Continue)
}

/// Commands take a fixed number of tokens, operation name included.
pub(crate) fn expect_arity(tokens: &[&str], arity: usize, usage: &str) -> Result<(), AppError> {
    if tokens.len() != arity {
        return Err(AppError::Validation(format!("usage: {usage}")));
    }
    Ok(())
}
