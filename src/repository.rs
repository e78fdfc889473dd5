use async_trait::async_trait;

use crate::error::AppError;
use crate::models::account::Credential;
use crate::models::appointment::Appointment;
use crate::models::vaccine::Lot;

/// Outcome of a successful reservation.
#[derive(Debug)]
pub struct Reservation {
    pub appointment_id: i64,
    pub caregiver: String,
}

/// All persistent state behind the scheduler. Dates are canonical
/// `YYYY-MM-DD` storage keys throughout (see `ScheduleDate::storage_key`).
#[async_trait]
pub trait SchedulerRepository: Send + Sync {
    // accounts
    async fn create_patient(
        &self,
        username: &str,
        salt: &[u8],
        hash: &[u8],
    ) -> Result<(), AppError>;
    async fn create_caregiver(
        &self,
        username: &str,
        salt: &[u8],
        hash: &[u8],
    ) -> Result<(), AppError>;
    async fn find_patient(&self, username: &str) -> Result<Option<Credential>, AppError>;
    async fn find_caregiver(&self, username: &str) -> Result<Option<Credential>, AppError>;

    // inventory
    async fn find_lot(&self, name: &str) -> Result<Option<Lot>, AppError>;
    async fn list_lots(&self) -> Result<Vec<Lot>, AppError>;
    async fn create_lot(&self, name: &str, doses: i64) -> Result<(), AppError>;
    async fn increase_doses(&self, name: &str, delta: i64) -> Result<(), AppError>;
    async fn decrease_doses(&self, name: &str, delta: i64) -> Result<(), AppError>;

    // availability
    async fn caregivers_for_date(&self, date: &str) -> Result<Vec<String>, AppError>;
    async fn add_slot(&self, date: &str, caregiver: &str) -> Result<(), AppError>;
    async fn remove_slot(&self, date: &str, caregiver: &str) -> Result<(), AppError>;

    // appointments
    async fn next_appointment_id(&self) -> Result<i64, AppError>;
    async fn find_appointment(&self, id: i64) -> Result<Option<Appointment>, AppError>;
    async fn appointments_for_patient(&self, username: &str)
        -> Result<Vec<Appointment>, AppError>;
    async fn appointments_for_caregiver(
        &self,
        username: &str,
    ) -> Result<Vec<Appointment>, AppError>;

    /// Book an appointment for `patient` on `date`: pick the first available
    /// caregiver, take one dose of `vaccine`, consume the availability slot,
    /// and insert the appointment — all in one transaction.
    async fn reserve_appointment(
        &self,
        date: &str,
        patient: &str,
        vaccine: &str,
    ) -> Result<Reservation, AppError>;

    /// Exact inverse of `reserve_appointment` for a booked id: delete the
    /// appointment, restore the dose, re-insert the slot — one transaction.
    async fn cancel_appointment(&self, id: i64) -> Result<(), AppError>;
}
