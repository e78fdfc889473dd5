use super::expect_arity;
use crate::date::ScheduleDate;
use crate::error::AppError;
use crate::session::CurrentUser;
use crate::App;

/// Book the requesting patient with the first available caregiver on the
/// given date. All booking effects happen in one repository transaction.
pub async fn reserve(app: &App, tokens: &[&str]) -> Result<(), AppError> {
    let patient = match app.session.current() {
        Some(CurrentUser::Patient(name)) => name.clone(),
        Some(CurrentUser::Caregiver(_)) => {
            return Err(AppError::Auth("please login as a patient".into()))
        }
        None => return Err(AppError::Auth("please login first".into())),
    };

    expect_arity(tokens, 3, "reserve <date> <vaccine>")?;
    let date = ScheduleDate::parse(tokens[1])?;
    let vaccine = tokens[2];

    tracing::info!(
        command = "reserve",
        patient = %patient,
        date = %date,
        vaccine,
        "Handler: reserve"
    );

    let reservation = app
        .repo
        .reserve_appointment(&date.storage_key(), &patient, vaccine)
        .await?;

    tracing::info!(
        command = "reserve",
        appointment_id = reservation.appointment_id,
        caregiver = %reservation.caregiver,
        "Reservation booked"
    );

    println!(
        "Appointment ID {}, Caregiver username {}",
        reservation.appointment_id, reservation.caregiver
    );
    Ok(())
}

/// Cancel a booked appointment by id. Any logged-in user may cancel any
/// appointment; there is no ownership check.
pub async fn cancel(app: &App, tokens: &[&str]) -> Result<(), AppError> {
    if app.session.current().is_none() {
        return Err(AppError::Auth("please login first".into()));
    }

    expect_arity(tokens, 2, "cancel <appointment_id>")?;
    let id: i64 = tokens[1]
        .parse()
        .map_err(|_| AppError::Validation(format!("appointment id must be a number, got '{}'", tokens[1])))?;

    tracing::info!(command = "cancel", appointment_id = id, "Handler: cancel");

    app.repo.cancel_appointment(id).await?;

    println!("Appointment {id} canceled");
    Ok(())
}
