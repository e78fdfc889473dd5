use super::expect_arity;
use crate::credentials::{check_password_strength, generate_salt, hash_password, verify_password};
use crate::error::AppError;
use crate::models::account::Credential;
use crate::session::CurrentUser;
use crate::App;

pub async fn create_patient(app: &mut App, tokens: &[&str]) -> Result<(), AppError> {
    expect_arity(tokens, 3, "create_patient <username> <password>")?;
    let (username, password) = (tokens[1], tokens[2]);

    tracing::info!(command = "create_patient", username, "Handler: create_patient");

    check_password_strength(password)?;
    if app.repo.find_patient(username).await?.is_some() {
        return Err(AppError::Validation(format!(
            "username {username} already taken"
        )));
    }

    let salt = generate_salt();
    let hash = hash_password(password, &salt, app.hash_iterations);
    app.repo.create_patient(username, &salt, &hash).await?;

    println!("Created user {username}");
    Ok(())
}

pub async fn create_caregiver(app: &mut App, tokens: &[&str]) -> Result<(), AppError> {
    expect_arity(tokens, 3, "create_caregiver <username> <password>")?;
    let (username, password) = (tokens[1], tokens[2]);

    tracing::info!(command = "create_caregiver", username, "Handler: create_caregiver");

    check_password_strength(password)?;
    if app.repo.find_caregiver(username).await?.is_some() {
        return Err(AppError::Validation(format!(
            "username {username} already taken"
        )));
    }

    let salt = generate_salt();
    let hash = hash_password(password, &salt, app.hash_iterations);
    app.repo.create_caregiver(username, &salt, &hash).await?;

    println!("Created user {username}");
    Ok(())
}

pub async fn login_patient(app: &mut App, tokens: &[&str]) -> Result<(), AppError> {
    expect_arity(tokens, 3, "login_patient <username> <password>")?;
    let (username, password) = (tokens[1], tokens[2]);

    tracing::info!(command = "login_patient", username, "Handler: login_patient");

    if app.session.current().is_some() {
        return Err(AppError::Auth("already logged in, log out first".into()));
    }

    let credential = app.repo.find_patient(username).await?;
    check_credential(app, credential, password)?;

    app.session.login(CurrentUser::Patient(username.to_string()))?;
    println!("Logged in as {username}");
    Ok(())
}

pub async fn login_caregiver(app: &mut App, tokens: &[&str]) -> Result<(), AppError> {
    expect_arity(tokens, 3, "login_caregiver <username> <password>")?;
    let (username, password) = (tokens[1], tokens[2]);

    tracing::info!(command = "login_caregiver", username, "Handler: login_caregiver");

    if app.session.current().is_some() {
        return Err(AppError::Auth("already logged in, log out first".into()));
    }

    let credential = app.repo.find_caregiver(username).await?;
    check_credential(app, credential, password)?;

    app.session.login(CurrentUser::Caregiver(username.to_string()))?;
    println!("Logged in as {username}");
    Ok(())
}

pub fn logout(app: &mut App, tokens: &[&str]) -> Result<(), AppError> {
    expect_arity(tokens, 1, "logout")?;

    tracing::info!(command = "logout", "Handler: logout");

    app.session.logout()?;
    println!("Successfully logged out");
    Ok(())
}

/// Unknown username and wrong password produce the same error, so a failed
/// login does not reveal which accounts exist.
fn check_credential(
    app: &App,
    credential: Option<Credential>,
    password: &str,
) -> Result<(), AppError> {
    let valid = credential
        .map(|c| verify_password(password, &c.salt, &c.hash, app.hash_iterations))
        .unwrap_or(false);

    if !valid {
        tracing::warn!("Login rejected: bad credentials");
        return Err(AppError::Auth("login failed".into()));
    }
    Ok(())
}
