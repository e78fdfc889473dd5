use super::expect_arity;
use crate::date::ScheduleDate;
use crate::error::AppError;
use crate::session::CurrentUser;
use crate::App;

/// List every caregiver available on a date, then the full vaccine
/// inventory. Open to both roles.
pub async fn search_caregiver_schedule(app: &App, tokens: &[&str]) -> Result<(), AppError> {
    expect_arity(tokens, 2, "search_caregiver_schedule <date>")?;

    // Date shape is checked before anything touches the database.
    let date = ScheduleDate::parse(tokens[1])?;

    if app.session.current().is_none() {
        return Err(AppError::Auth("please login first".into()));
    }

    tracing::info!(command = "search_caregiver_schedule", date = %date, "Handler: search");

    let caregivers = app.repo.caregivers_for_date(&date.storage_key()).await?;
    if caregivers.is_empty() {
        println!("No caregivers available on {date}");
    } else {
        println!("{}", caregivers.join(" "));
    }

    for lot in app.repo.list_lots().await? {
        println!("{} {}", lot.name, lot.doses);
    }

    Ok(())
}

pub async fn upload_availability(app: &App, tokens: &[&str]) -> Result<(), AppError> {
    let caregiver = match app.session.current() {
        Some(CurrentUser::Caregiver(name)) => name.clone(),
        _ => return Err(AppError::Auth("please login as a caregiver first".into())),
    };

    expect_arity(tokens, 2, "upload_availability <date>")?;
    let date = ScheduleDate::parse(tokens[1])?;

    tracing::info!(
        command = "upload_availability",
        caregiver = %caregiver,
        date = %date,
        "Handler: upload_availability"
    );

    app.repo.add_slot(&date.storage_key(), &caregiver).await?;

    println!("Availability uploaded!");
    Ok(())
}

/// Create the lot on first sight of a vaccine name, top it up afterwards.
pub async fn add_doses(app: &App, tokens: &[&str]) -> Result<(), AppError> {
    if !matches!(app.session.current(), Some(CurrentUser::Caregiver(_))) {
        return Err(AppError::Auth("please login as a caregiver first".into()));
    }

    expect_arity(tokens, 3, "add_doses <vaccine> <number>")?;
    let vaccine = tokens[1];
    let doses: i64 = tokens[2]
        .parse()
        .map_err(|_| AppError::Validation(format!("dose count must be a number, got '{}'", tokens[2])))?;
    if doses <= 0 {
        return Err(AppError::Validation("dose count must be positive".into()));
    }

    tracing::info!(command = "add_doses", vaccine, doses, "Handler: add_doses");

    match app.repo.find_lot(vaccine).await? {
        Some(_) => app.repo.increase_doses(vaccine, doses).await?,
        None => app.repo.create_lot(vaccine, doses).await?,
    }

    println!("Doses updated!");
    Ok(())
}

/// Patients see their appointments with the caregiver column; caregivers see
/// theirs with the patient column. Ordered by appointment id.
pub async fn show_appointments(app: &App, tokens: &[&str]) -> Result<(), AppError> {
    expect_arity(tokens, 1, "show_appointments")?;

    let user = app
        .session
        .current()
        .ok_or_else(|| AppError::Auth("please login first".into()))?;

    tracing::info!(
        command = "show_appointments",
        username = user.username(),
        "Handler: show_appointments"
    );

    let appointments = match user {
        CurrentUser::Patient(name) => app.repo.appointments_for_patient(name).await?,
        CurrentUser::Caregiver(name) => app.repo.appointments_for_caregiver(name).await?,
    };

    if appointments.is_empty() {
        println!("No appointments scheduled");
        return Ok(());
    }

    for a in appointments {
        match user {
            CurrentUser::Patient(_) => println!("{} {} {} {}", a.id, a.vaccine, a.date, a.caregiver),
            CurrentUser::Caregiver(_) => println!("{} {} {} {}", a.id, a.vaccine, a.date, a.patient),
        }
    }

    Ok(())
}
