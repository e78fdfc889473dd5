use async_trait::async_trait;
use sqlx::SqlitePool;

use crate::error::AppError;
use crate::models::account::Credential;
use crate::models::appointment::Appointment;
use crate::models::vaccine::Lot;
use crate::repository::{Reservation, SchedulerRepository};
use crate::util::now_millis;

pub struct SqliteRepository {
    pool: SqlitePool,
}

impl SqliteRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

fn map_unique_violation(e: sqlx::Error, what: String) -> AppError {
    match &e {
        sqlx::Error::Database(db) if db.is_unique_violation() => AppError::Validation(what),
        _ => AppError::Database(e),
    }
}

#[async_trait]
impl SchedulerRepository for SqliteRepository {
    async fn create_patient(
        &self,
        username: &str,
        salt: &[u8],
        hash: &[u8],
    ) -> Result<(), AppError> {
        tracing::debug!(username, "db: INSERT patients");

        sqlx::query("INSERT INTO patients (username, salt, hash, created_at) VALUES (?, ?, ?, ?)")
            .bind(username)
            .bind(salt)
            .bind(hash)
            .bind(now_millis())
            .execute(&self.pool)
            .await
            .map_err(|e| map_unique_violation(e, format!("username {username} already taken")))?;

        Ok(())
    }

    async fn create_caregiver(
        &self,
        username: &str,
        salt: &[u8],
        hash: &[u8],
    ) -> Result<(), AppError> {
        tracing::debug!(username, "db: INSERT caregivers");

        sqlx::query(
            "INSERT INTO caregivers (username, salt, hash, created_at) VALUES (?, ?, ?, ?)",
        )
        .bind(username)
        .bind(salt)
        .bind(hash)
        .bind(now_millis())
        .execute(&self.pool)
        .await
        .map_err(|e| map_unique_violation(e, format!("username {username} already taken")))?;

        Ok(())
    }

    async fn find_patient(&self, username: &str) -> Result<Option<Credential>, AppError> {
        tracing::debug!(username, "db: SELECT patient");

        let row: Option<Credential> =
            sqlx::query_as("SELECT username, salt, hash FROM patients WHERE username = ?")
                .bind(username)
                .fetch_optional(&self.pool)
                .await?;

        tracing::debug!(username, found = row.is_some(), "db: patient lookup result");

        Ok(row)
    }

    async fn find_caregiver(&self, username: &str) -> Result<Option<Credential>, AppError> {
        tracing::debug!(username, "db: SELECT caregiver");

        let row: Option<Credential> =
            sqlx::query_as("SELECT username, salt, hash FROM caregivers WHERE username = ?")
                .bind(username)
                .fetch_optional(&self.pool)
                .await?;

        tracing::debug!(username, found = row.is_some(), "db: caregiver lookup result");

        Ok(row)
    }

    async fn find_lot(&self, name: &str) -> Result<Option<Lot>, AppError> {
        tracing::debug!(vaccine = name, "db: SELECT vaccine lot");

        let row: Option<Lot> = sqlx::query_as("SELECT name, doses FROM vaccines WHERE name = ?")
            .bind(name)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row)
    }

    async fn list_lots(&self) -> Result<Vec<Lot>, AppError> {
        tracing::debug!("db: SELECT all vaccine lots");

        let rows = sqlx::query_as("SELECT name, doses FROM vaccines ORDER BY name ASC")
            .fetch_all(&self.pool)
            .await?;

        Ok(rows)
    }

    async fn create_lot(&self, name: &str, doses: i64) -> Result<(), AppError> {
        if doses < 0 {
            return Err(AppError::Validation("dose count must not be negative".into()));
        }

        tracing::debug!(vaccine = name, doses, "db: INSERT vaccine lot");

        sqlx::query("INSERT INTO vaccines (name, doses) VALUES (?, ?)")
            .bind(name)
            .bind(doses)
            .execute(&self.pool)
            .await
            .map_err(|e| map_unique_violation(e, format!("vaccine {name} already exists")))?;

        Ok(())
    }

    async fn increase_doses(&self, name: &str, delta: i64) -> Result<(), AppError> {
        if delta <= 0 {
            return Err(AppError::Validation("dose count must be positive".into()));
        }

        tracing::debug!(vaccine = name, delta, "db: UPDATE vaccines doses + delta");

        let result = sqlx::query("UPDATE vaccines SET doses = doses + ? WHERE name = ?")
            .bind(delta)
            .bind(name)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("vaccine {name}")));
        }

        Ok(())
    }

    async fn decrease_doses(&self, name: &str, delta: i64) -> Result<(), AppError> {
        if delta <= 0 {
            return Err(AppError::Validation("dose count must be positive".into()));
        }

        tracing::debug!(vaccine = name, delta, "db: UPDATE vaccines doses - delta (guarded)");

        // The guard keeps the count non-negative; a failed match is either an
        // unknown lot or insufficient stock, disambiguated below.
        let result = sqlx::query("UPDATE vaccines SET doses = doses - ? WHERE name = ? AND doses >= ?")
            .bind(delta)
            .bind(name)
            .bind(delta)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return match self.find_lot(name).await? {
                Some(lot) => Err(AppError::Capacity(format!(
                    "only {} doses of {name} left",
                    lot.doses
                ))),
                None => Err(AppError::NotFound(format!("vaccine {name}"))),
            };
        }

        Ok(())
    }

    async fn caregivers_for_date(&self, date: &str) -> Result<Vec<String>, AppError> {
        tracing::debug!(date, "db: SELECT caregivers for date");

        let rows: Vec<(String,)> = sqlx::query_as(
            "SELECT caregiver FROM availabilities WHERE date = ? ORDER BY caregiver ASC",
        )
        .bind(date)
        .fetch_all(&self.pool)
        .await?;

        tracing::debug!(date, rows_returned = rows.len(), "db: availability fetched");

        Ok(rows.into_iter().map(|(caregiver,)| caregiver).collect())
    }

    async fn add_slot(&self, date: &str, caregiver: &str) -> Result<(), AppError> {
        tracing::debug!(date, caregiver, "db: INSERT availability slot");

        sqlx::query("INSERT INTO availabilities (date, caregiver) VALUES (?, ?)")
            .bind(date)
            .bind(caregiver)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn remove_slot(&self, date: &str, caregiver: &str) -> Result<(), AppError> {
        tracing::debug!(date, caregiver, "db: DELETE one availability slot");

        // Duplicate (date, caregiver) rows are legal, so delete exactly one.
        let result = sqlx::query(
            "DELETE FROM availabilities WHERE rowid = \
             (SELECT MIN(rowid) FROM availabilities WHERE date = ? AND caregiver = ?)",
        )
        .bind(date)
        .bind(caregiver)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!(
                "availability for {caregiver} on {date}"
            )));
        }

        Ok(())
    }

    async fn next_appointment_id(&self) -> Result<i64, AppError> {
        tracing::debug!("db: SELECT max appointment id");

        let row: (i64,) = sqlx::query_as("SELECT COALESCE(MAX(id), 0) + 1 FROM appointments")
            .fetch_one(&self.pool)
            .await?;

        Ok(row.0)
    }

    async fn find_appointment(&self, id: i64) -> Result<Option<Appointment>, AppError> {
        tracing::debug!(appointment_id = id, "db: SELECT appointment");

        let row: Option<Appointment> = sqlx::query_as(
            "SELECT id, date, patient, caregiver, vaccine FROM appointments WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row)
    }

    async fn appointments_for_patient(
        &self,
        username: &str,
    ) -> Result<Vec<Appointment>, AppError> {
        tracing::debug!(patient = username, "db: SELECT appointments by patient");

        let rows = sqlx::query_as(
            "SELECT id, date, patient, caregiver, vaccine FROM appointments \
             WHERE patient = ? ORDER BY id ASC",
        )
        .bind(username)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    async fn appointments_for_caregiver(
        &self,
        username: &str,
    ) -> Result<Vec<Appointment>, AppError> {
        tracing::debug!(caregiver = username, "db: SELECT appointments by caregiver");

        let rows = sqlx::query_as(
            "SELECT id, date, patient, caregiver, vaccine FROM appointments \
             WHERE caregiver = ? ORDER BY id ASC",
        )
        .bind(username)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    async fn reserve_appointment(
        &self,
        date: &str,
        patient: &str,
        vaccine: &str,
    ) -> Result<Reservation, AppError> {
        tracing::debug!(date, patient, vaccine, "db: BEGIN reserve transaction");

        // Every mutating step runs inside one transaction; returning early on
        // any error drops the transaction and rolls everything back.
        let mut tx = self.pool.begin().await?;

        let chosen: Option<(String,)> = sqlx::query_as(
            "SELECT caregiver FROM availabilities WHERE date = ? \
             ORDER BY caregiver ASC LIMIT 1",
        )
        .bind(date)
        .fetch_optional(&mut *tx)
        .await?;

        let caregiver = match chosen {
            Some((caregiver,)) => caregiver,
            None => {
                tracing::debug!(date, "db: no availability, rolling back");
                return Err(AppError::NotFound(format!(
                    "no caregiver is available on {date}"
                )));
            }
        };

        let lot: Option<(i64,)> = sqlx::query_as("SELECT doses FROM vaccines WHERE name = ?")
            .bind(vaccine)
            .fetch_optional(&mut *tx)
            .await?;

        match lot {
            None => {
                tracing::debug!(vaccine, "db: unknown vaccine, rolling back");
                return Err(AppError::NotFound(format!("vaccine {vaccine}")));
            }
            Some((0,)) => {
                tracing::debug!(vaccine, "db: no doses left, rolling back");
                return Err(AppError::Capacity(format!("no doses of {vaccine} left")));
            }
            Some(_) => {}
        }

        sqlx::query("UPDATE vaccines SET doses = doses - 1 WHERE name = ? AND doses > 0")
            .bind(vaccine)
            .execute(&mut *tx)
            .await?;

        let removed = sqlx::query(
            "DELETE FROM availabilities WHERE rowid = \
             (SELECT MIN(rowid) FROM availabilities WHERE date = ? AND caregiver = ?)",
        )
        .bind(date)
        .bind(&caregiver)
        .execute(&mut *tx)
        .await?;

        // The slot was observed at the top of this transaction; zero rows
        // here means the store is inconsistent.
        if removed.rows_affected() != 1 {
            tracing::error!(date, caregiver = %caregiver, "db: chosen slot vanished, rolling back");
            return Err(AppError::Database(sqlx::Error::RowNotFound));
        }

        let next: (i64,) = sqlx::query_as("SELECT COALESCE(MAX(id), 0) + 1 FROM appointments")
            .fetch_one(&mut *tx)
            .await?;
        let id = next.0;

        sqlx::query(
            "INSERT INTO appointments (id, date, patient, caregiver, vaccine) \
             VALUES (?, ?, ?, ?, ?)",
        )
        .bind(id)
        .bind(date)
        .bind(patient)
        .bind(&caregiver)
        .bind(vaccine)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        tracing::debug!(
            appointment_id = id,
            caregiver = %caregiver,
            "db: reserve transaction committed"
        );

        Ok(Reservation {
            appointment_id: id,
            caregiver,
        })
    }

    async fn cancel_appointment(&self, id: i64) -> Result<(), AppError> {
        tracing::debug!(appointment_id = id, "db: BEGIN cancel transaction");

        let mut tx = self.pool.begin().await?;

        let appointment: Option<Appointment> = sqlx::query_as(
            "SELECT id, date, patient, caregiver, vaccine FROM appointments WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?;

        let appointment = match appointment {
            Some(appointment) => appointment,
            None => {
                tracing::debug!(appointment_id = id, "db: appointment not found, rolling back");
                return Err(AppError::NotFound(format!("appointment {id}")));
            }
        };

        sqlx::query("DELETE FROM appointments WHERE id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        // Lots are never deleted, so the referenced row still exists.
        sqlx::query("UPDATE vaccines SET doses = doses + 1 WHERE name = ?")
            .bind(&appointment.vaccine)
            .execute(&mut *tx)
            .await?;

        sqlx::query("INSERT INTO availabilities (date, caregiver) VALUES (?, ?)")
            .bind(&appointment.date)
            .bind(&appointment.caregiver)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        tracing::debug!(
            appointment_id = id,
            caregiver = %appointment.caregiver,
            "db: cancel transaction committed"
        );

        Ok(())
    }
}
