use std::sync::Arc;

use vaccine_scheduler::commands::{self, Outcome};
use vaccine_scheduler::credentials::{generate_salt, hash_password, verify_password};
use vaccine_scheduler::db;
use vaccine_scheduler::error::AppError;
use vaccine_scheduler::session::CurrentUser;
use vaccine_scheduler::sqlite_repo::SqliteRepository;
use vaccine_scheduler::App;

// Small work factor keeps the PBKDF2 calls cheap in tests.
const TEST_ITERATIONS: u32 = 1_000;

// -- Helpers ------------------------------------------------------------------

async fn setup_app() -> App {
    let pool = db::init_pool("sqlite::memory:").await.unwrap();
    App::new(Arc::new(SqliteRepository::new(pool)), TEST_ITERATIONS)
}

async fn register_patient(app: &App, username: &str, password: &str) {
    let salt = generate_salt();
    let hash = hash_password(password, &salt, TEST_ITERATIONS);
    app.repo
        .create_patient(username, &salt, &hash)
        .await
        .unwrap();
}

async fn register_caregiver(app: &App, username: &str, password: &str) {
    let salt = generate_salt();
    let hash = hash_password(password, &salt, TEST_ITERATIONS);
    app.repo
        .create_caregiver(username, &salt, &hash)
        .await
        .unwrap();
}

/// Accounts plus a stocked lot and one slot: caregiver "alice" available on
/// 2024-03-01, patient "paula", 10 doses of Pfizer.
async fn setup_booking_fixture(app: &App) {
    register_caregiver(app, "alice", "Caregiver1?").await;
    register_patient(app, "paula", "Patient1?").await;
    app.repo.create_lot("Pfizer", 10).await.unwrap();
    app.repo.add_slot("2024-03-01", "alice").await.unwrap();
}

async fn doses(app: &App, vaccine: &str) -> i64 {
    app.repo.find_lot(vaccine).await.unwrap().unwrap().doses
}

async fn run(app: &mut App, line: &str) -> Outcome {
    commands::dispatch(app, line).await.unwrap()
}

// -- Reservation workflow -----------------------------------------------------

#[tokio::test]
async fn test_reserve_books_first_appointment() {
    let app = setup_app().await;
    setup_booking_fixture(&app).await;

    let reservation = app
        .repo
        .reserve_appointment("2024-03-01", "paula", "Pfizer")
        .await
        .unwrap();

    assert_eq!(reservation.appointment_id, 1);
    assert_eq!(reservation.caregiver, "alice");

    // Exactly one dose gone, exactly one slot gone, exactly one appointment.
    assert_eq!(doses(&app, "Pfizer").await, 9);
    assert!(app
        .repo
        .caregivers_for_date("2024-03-01")
        .await
        .unwrap()
        .is_empty());

    let appointment = app.repo.find_appointment(1).await.unwrap().unwrap();
    assert_eq!(appointment.date, "2024-03-01");
    assert_eq!(appointment.patient, "paula");
    assert_eq!(appointment.caregiver, "alice");
    assert_eq!(appointment.vaccine, "Pfizer");
}

#[tokio::test]
async fn test_reserve_picks_lexicographically_first_caregiver() {
    let app = setup_app().await;
    setup_booking_fixture(&app).await;
    register_caregiver(&app, "bob", "Caregiver1?").await;
    app.repo.add_slot("2024-03-01", "bob").await.unwrap();

    let reservation = app
        .repo
        .reserve_appointment("2024-03-01", "paula", "Pfizer")
        .await
        .unwrap();

    assert_eq!(reservation.caregiver, "alice");
    // Bob's slot is untouched.
    assert_eq!(
        app.repo.caregivers_for_date("2024-03-01").await.unwrap(),
        vec!["bob".to_string()]
    );
}

#[tokio::test]
async fn test_reserve_fails_without_availability() {
    let app = setup_app().await;
    register_patient(&app, "paula", "Patient1?").await;
    app.repo.create_lot("Pfizer", 5).await.unwrap();

    let err = app
        .repo
        .reserve_appointment("2024-03-01", "paula", "Pfizer")
        .await;

    assert!(matches!(err, Err(AppError::NotFound(_))));
    // The failed attempt must not touch inventory.
    assert_eq!(doses(&app, "Pfizer").await, 5);
    assert!(app.repo.find_appointment(1).await.unwrap().is_none());
}

#[tokio::test]
async fn test_reserve_with_empty_lot_rolls_back_slot() {
    let app = setup_app().await;
    register_caregiver(&app, "alice", "Caregiver1?").await;
    register_patient(&app, "paula", "Patient1?").await;
    app.repo.create_lot("Moderna", 0).await.unwrap();
    app.repo.add_slot("2024-03-01", "alice").await.unwrap();

    let err = app
        .repo
        .reserve_appointment("2024-03-01", "paula", "Moderna")
        .await;

    assert!(matches!(err, Err(AppError::Capacity(_))));
    // The slot survives the rolled-back attempt.
    assert_eq!(
        app.repo.caregivers_for_date("2024-03-01").await.unwrap(),
        vec!["alice".to_string()]
    );
    assert_eq!(doses(&app, "Moderna").await, 0);
}

#[tokio::test]
async fn test_reserve_unknown_vaccine_rolls_back_slot() {
    let app = setup_app().await;
    setup_booking_fixture(&app).await;

    let err = app
        .repo
        .reserve_appointment("2024-03-01", "paula", "Novavax")
        .await;

    assert!(matches!(err, Err(AppError::NotFound(_))));
    assert_eq!(
        app.repo.caregivers_for_date("2024-03-01").await.unwrap(),
        vec!["alice".to_string()]
    );
}

#[tokio::test]
async fn test_duplicate_slots_are_consumed_one_at_a_time() {
    let app = setup_app().await;
    setup_booking_fixture(&app).await;
    // Second identical (date, caregiver) row; the store does not deduplicate.
    app.repo.add_slot("2024-03-01", "alice").await.unwrap();

    app.repo
        .reserve_appointment("2024-03-01", "paula", "Pfizer")
        .await
        .unwrap();

    assert_eq!(
        app.repo.caregivers_for_date("2024-03-01").await.unwrap(),
        vec!["alice".to_string()]
    );

    app.repo
        .reserve_appointment("2024-03-01", "paula", "Pfizer")
        .await
        .unwrap();

    assert!(app
        .repo
        .caregivers_for_date("2024-03-01")
        .await
        .unwrap()
        .is_empty());
}

// -- Cancellation workflow ----------------------------------------------------

#[tokio::test]
async fn test_cancel_restores_reservation_effects() {
    let app = setup_app().await;
    setup_booking_fixture(&app).await;

    let reservation = app
        .repo
        .reserve_appointment("2024-03-01", "paula", "Pfizer")
        .await
        .unwrap();

    app.repo
        .cancel_appointment(reservation.appointment_id)
        .await
        .unwrap();

    // Dose back, slot back, appointment gone.
    assert_eq!(doses(&app, "Pfizer").await, 10);
    assert_eq!(
        app.repo.caregivers_for_date("2024-03-01").await.unwrap(),
        vec!["alice".to_string()]
    );
    assert!(app
        .repo
        .find_appointment(reservation.appointment_id)
        .await
        .unwrap()
        .is_none());
}

#[tokio::test]
async fn test_appointment_ids_are_not_reused_after_cancel() {
    let app = setup_app().await;
    setup_booking_fixture(&app).await;
    app.repo.add_slot("2024-03-02", "alice").await.unwrap();

    let first = app
        .repo
        .reserve_appointment("2024-03-01", "paula", "Pfizer")
        .await
        .unwrap();
    let second = app
        .repo
        .reserve_appointment("2024-03-02", "paula", "Pfizer")
        .await
        .unwrap();
    assert_eq!(first.appointment_id, 1);
    assert_eq!(second.appointment_id, 2);

    app.repo.cancel_appointment(1).await.unwrap();

    // Max id is still 2, so the next booking gets 3.
    assert_eq!(app.repo.next_appointment_id().await.unwrap(), 3);
    let third = app
        .repo
        .reserve_appointment("2024-03-01", "paula", "Pfizer")
        .await
        .unwrap();
    assert_eq!(third.appointment_id, 3);
}

#[tokio::test]
async fn test_cancel_unknown_appointment() {
    let app = setup_app().await;

    let err = app.repo.cancel_appointment(42).await;
    assert!(matches!(err, Err(AppError::NotFound(_))));
}

// -- Inventory store ----------------------------------------------------------

#[tokio::test]
async fn test_decrease_doses_never_goes_negative() {
    let app = setup_app().await;
    app.repo.create_lot("Pfizer", 3).await.unwrap();

    let err = app.repo.decrease_doses("Pfizer", 5).await;
    assert!(matches!(err, Err(AppError::Capacity(_))));
    assert_eq!(doses(&app, "Pfizer").await, 3);

    // Decrementing exactly to zero is fine.
    app.repo.decrease_doses("Pfizer", 3).await.unwrap();
    assert_eq!(doses(&app, "Pfizer").await, 0);
}

#[tokio::test]
async fn test_create_lot_rejects_duplicate() {
    let app = setup_app().await;
    app.repo.create_lot("Pfizer", 3).await.unwrap();

    let err = app.repo.create_lot("Pfizer", 7).await;
    assert!(matches!(err, Err(AppError::Validation(_))));
    assert_eq!(doses(&app, "Pfizer").await, 3);
}

#[tokio::test]
async fn test_dose_mutations_require_known_lot() {
    let app = setup_app().await;

    assert!(matches!(
        app.repo.increase_doses("Pfizer", 5).await,
        Err(AppError::NotFound(_))
    ));
    assert!(matches!(
        app.repo.decrease_doses("Pfizer", 1).await,
        Err(AppError::NotFound(_))
    ));
}

// -- Availability store -------------------------------------------------------

#[tokio::test]
async fn test_remove_slot_removes_exactly_one_row() {
    let app = setup_app().await;
    register_caregiver(&app, "alice", "Caregiver1?").await;
    app.repo.add_slot("2024-03-01", "alice").await.unwrap();
    app.repo.add_slot("2024-03-01", "alice").await.unwrap();

    app.repo.remove_slot("2024-03-01", "alice").await.unwrap();
    assert_eq!(
        app.repo.caregivers_for_date("2024-03-01").await.unwrap(),
        vec!["alice".to_string()]
    );

    app.repo.remove_slot("2024-03-01", "alice").await.unwrap();

    let err = app.repo.remove_slot("2024-03-01", "alice").await;
    assert!(matches!(err, Err(AppError::NotFound(_))));
}

// -- Accounts -----------------------------------------------------------------

#[tokio::test]
async fn test_credential_round_trip() {
    let app = setup_app().await;
    register_patient(&app, "paula", "Patient1?").await;

    let credential = app.repo.find_patient("paula").await.unwrap().unwrap();
    assert!(verify_password(
        "Patient1?",
        &credential.salt,
        &credential.hash,
        TEST_ITERATIONS
    ));
    assert!(!verify_password(
        "Patient2?",
        &credential.salt,
        &credential.hash,
        TEST_ITERATIONS
    ));

    // Roles have separate namespaces.
    assert!(app.repo.find_caregiver("paula").await.unwrap().is_none());
}

// -- Command surface ----------------------------------------------------------

#[tokio::test]
async fn test_full_booking_flow_via_commands() {
    let mut app = setup_app().await;

    run(&mut app, "create_caregiver alice Caregiver1?").await;
    run(&mut app, "login_caregiver alice Caregiver1?").await;
    run(&mut app, "upload_availability 03-01-2024").await;
    run(&mut app, "add_doses Pfizer 10").await;
    run(&mut app, "logout").await;

    run(&mut app, "create_patient paula Patient1?").await;
    run(&mut app, "login_patient paula Patient1?").await;
    run(&mut app, "reserve 03-01-2024 Pfizer").await;
    run(&mut app, "show_appointments").await;

    assert_eq!(doses(&app, "Pfizer").await, 9);

    let appointment = app.repo.find_appointment(1).await.unwrap().unwrap();
    assert_eq!(appointment.patient, "paula");
    assert_eq!(appointment.caregiver, "alice");
    assert_eq!(appointment.date, "2024-03-01");

    let mine = app.repo.appointments_for_patient("paula").await.unwrap();
    assert_eq!(mine.len(), 1);
    let theirs = app.repo.appointments_for_caregiver("alice").await.unwrap();
    assert_eq!(theirs.len(), 1);

    // Either role may cancel; the patient cancels their own booking here.
    run(&mut app, "cancel 1").await;
    assert_eq!(doses(&app, "Pfizer").await, 10);
    assert!(app.repo.find_appointment(1).await.unwrap().is_none());
}

#[tokio::test]
async fn test_login_while_logged_in_is_rejected() {
    let mut app = setup_app().await;
    register_patient(&app, "paula", "Patient1?").await;
    run(&mut app, "login_patient paula Patient1?").await;

    let err = commands::dispatch(&mut app, "login_patient paula Patient1?").await;
    assert!(matches!(err, Err(AppError::Auth(_))));
    // Session is unchanged.
    assert_eq!(
        app.session.current(),
        Some(&CurrentUser::Patient("paula".into()))
    );
}

#[tokio::test]
async fn test_wrong_password_is_rejected() {
    let mut app = setup_app().await;
    register_patient(&app, "paula", "Patient1?").await;

    let err = commands::dispatch(&mut app, "login_patient paula Wr0ng?pw").await;
    assert!(matches!(err, Err(AppError::Auth(_))));
    assert!(app.session.current().is_none());

    let err = commands::dispatch(&mut app, "login_patient nobody Patient1?").await;
    assert!(matches!(err, Err(AppError::Auth(_))));
}

#[tokio::test]
async fn test_search_rejects_malformed_date_before_anything_else() {
    let mut app = setup_app().await;

    // Month 13: validation fires before the login check or any query.
    let err = commands::dispatch(&mut app, "search_caregiver_schedule 13-01-2024").await;
    assert!(matches!(err, Err(AppError::Validation(_))));

    // Unpadded month is a shape error too.
    let err = commands::dispatch(&mut app, "search_caregiver_schedule 3-01-2024").await;
    assert!(matches!(err, Err(AppError::Validation(_))));
}

#[tokio::test]
async fn test_reserve_requires_patient_role() {
    let mut app = setup_app().await;
    register_caregiver(&app, "alice", "Caregiver1?").await;

    let err = commands::dispatch(&mut app, "reserve 03-01-2024 Pfizer").await;
    assert!(matches!(err, Err(AppError::Auth(_))));

    run(&mut app, "login_caregiver alice Caregiver1?").await;
    let err = commands::dispatch(&mut app, "reserve 03-01-2024 Pfizer").await;
    assert!(matches!(err, Err(AppError::Auth(_))));
}

#[tokio::test]
async fn test_inventory_and_availability_commands_require_caregiver() {
    let mut app = setup_app().await;
    register_patient(&app, "paula", "Patient1?").await;
    run(&mut app, "login_patient paula Patient1?").await;

    let err = commands::dispatch(&mut app, "add_doses Pfizer 10").await;
    assert!(matches!(err, Err(AppError::Auth(_))));

    let err = commands::dispatch(&mut app, "upload_availability 03-01-2024").await;
    assert!(matches!(err, Err(AppError::Auth(_))));
}

#[tokio::test]
async fn test_search_lists_caregivers_and_inventory() {
    let mut app = setup_app().await;
    setup_booking_fixture(&app).await;
    app.repo.create_lot("Moderna", 5).await.unwrap();
    run(&mut app, "login_patient paula Patient1?").await;

    run(&mut app, "search_caregiver_schedule 03-01-2024").await;

    let lots = app.repo.list_lots().await.unwrap();
    assert_eq!(lots.len(), 2);
    // Ordered by name.
    assert_eq!(lots[0].name, "Moderna");
    assert_eq!(lots[1].name, "Pfizer");
}

#[tokio::test]
async fn test_add_doses_validates_count() {
    let mut app = setup_app().await;
    register_caregiver(&app, "alice", "Caregiver1?").await;
    run(&mut app, "login_caregiver alice Caregiver1?").await;

    let err = commands::dispatch(&mut app, "add_doses Pfizer ten").await;
    assert!(matches!(err, Err(AppError::Validation(_))));

    let err = commands::dispatch(&mut app, "add_doses Pfizer -5").await;
    assert!(matches!(err, Err(AppError::Validation(_))));

    assert!(app.repo.find_lot("Pfizer").await.unwrap().is_none());
}

#[tokio::test]
async fn test_cancel_requires_login() {
    let mut app = setup_app().await;

    let err = commands::dispatch(&mut app, "cancel 1").await;
    assert!(matches!(err, Err(AppError::Auth(_))));
}

#[tokio::test]
async fn test_create_account_enforces_password_policy() {
    let mut app = setup_app().await;

    let err = commands::dispatch(&mut app, "create_patient paula weakpass").await;
    assert!(matches!(err, Err(AppError::Validation(_))));
    assert!(app.repo.find_patient("paula").await.unwrap().is_none());

    run(&mut app, "create_patient paula Patient1?").await;
    let err = commands::dispatch(&mut app, "create_patient paula Patient1?").await;
    assert!(matches!(err, Err(AppError::Validation(_))));
}

#[tokio::test]
async fn test_dispatch_outcomes() {
    let mut app = setup_app().await;

    assert_eq!(run(&mut app, "quit").await, Outcome::Quit);
    assert_eq!(run(&mut app, "").await, Outcome::Continue);
    assert_eq!(run(&mut app, "frobnicate").await, Outcome::Continue);
}
