/// A booked appointment. `date` is the canonical `YYYY-MM-DD` storage key.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Appointment {
    pub id: i64,
    pub date: String,
    pub patient: String,
    pub caregiver: String,
    pub vaccine: String,
}
