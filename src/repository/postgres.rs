//! Postgres store. Calendar exclusivity is a `FOR UPDATE` lock on the staff
//! row; promo redemption locks the promo row inside the same transaction.

use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveDate;
use sqlx::{Pool, Postgres, Transaction};
use uuid::Uuid;

use super::{BookingStore, CalendarTx};
use crate::{
    error::{AppError, AppResult},
    models::{
        appointment::{Appointment, AppointmentStatus, NewAppointment},
        notification::{NewNotification, Notification},
        payment::{NewPayment, Payment, PaymentMethod, PaymentStatus},
        promo::PromoCode,
        service::Service,
        slot::TimeRange,
        staff::{StaffWorkingHours, WorkingDay},
    },
};

#[derive(Clone)]
pub struct PgBookingStore {
    pool: Pool<Postgres>,
}

impl PgBookingStore {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl BookingStore for PgBookingStore {
    async fn ping(&self) -> AppResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await.map_err(AppError::from_db)?;
        Ok(())
    }

    async fn get_service(&self, id: Uuid) -> AppResult<Option<Service>> {
        let service = sqlx::query_as::<_, Service>(
            r#"
            SELECT id, salon_id, name, duration_minutes, buffer_minutes, price, is_active
            FROM services
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await.map_err(AppError::from_db)?;
        Ok(service)
    }

    async fn get_working_hours(
        &self,
        staff_id: Uuid,
        day_of_week: i16,
    ) -> AppResult<Option<StaffWorkingHours>> {
        let hours = sqlx::query_as::<_, StaffWorkingHours>(
            "SELECT * FROM staff_working_hours WHERE staff_id = $1 AND day_of_week = $2",
        )
        .bind(staff_id)
        .bind(day_of_week)
        .fetch_optional(&self.pool)
        .await.map_err(AppError::from_db)?;
        Ok(hours)
    }

    async fn list_working_hours(&self, staff_id: Uuid) -> AppResult<Vec<StaffWorkingHours>> {
        let rows = sqlx::query_as::<_, StaffWorkingHours>(
            "SELECT * FROM staff_working_hours WHERE staff_id = $1 ORDER BY day_of_week",
        )
        .bind(staff_id)
        .fetch_all(&self.pool)
        .await.map_err(AppError::from_db)?;
        Ok(rows)
    }

    async fn replace_working_hours(
        &self,
        staff_id: Uuid,
        hours: Vec<WorkingDay>,
    ) -> AppResult<Vec<StaffWorkingHours>> {
        let mut tx = self.pool.begin().await.map_err(AppError::from_db)?;

        sqlx::query("DELETE FROM staff_working_hours WHERE staff_id = $1")
            .bind(staff_id)
            .execute(&mut *tx)
            .await.map_err(AppError::from_db)?;

        for day in &hours {
            sqlx::query(
                r#"
                INSERT INTO staff_working_hours (staff_id, day_of_week, start_time, end_time, is_off)
                VALUES ($1, $2, $3, $4, $5)
                "#,
            )
            .bind(staff_id)
            .bind(day.day_of_week)
            .bind(day.start_time)
            .bind(day.end_time)
            .bind(day.is_off)
            .execute(&mut *tx)
            .await
            .map_err(AppError::from_db)?;
        }

        tx.commit().await.map_err(AppError::from_db)?;
        self.list_working_hours(staff_id).await
    }

    async fn active_appointments(
        &self,
        staff_id: Uuid,
        date: NaiveDate,
    ) -> AppResult<Vec<Appointment>> {
        let rows = sqlx::query_as::<_, Appointment>(
            r#"
            SELECT * FROM appointments
            WHERE staff_id = $1 AND appointment_date = $2
              AND status NOT IN ('cancelled', 'no_show')
            ORDER BY start_time
            "#,
        )
        .bind(staff_id)
        .bind(date)
        .fetch_all(&self.pool)
        .await.map_err(AppError::from_db)?;
        Ok(rows)
    }

    async fn get_appointment(&self, id: Uuid) -> AppResult<Option<Appointment>> {
        let appointment = sqlx::query_as::<_, Appointment>("SELECT * FROM appointments WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await.map_err(AppError::from_db)?;
        Ok(appointment)
    }

    async fn list_customer_appointments(&self, customer_id: Uuid) -> AppResult<Vec<Appointment>> {
        let rows = sqlx::query_as::<_, Appointment>(
            r#"
            SELECT * FROM appointments
            WHERE customer_id = $1
            ORDER BY appointment_date DESC, start_time DESC
            "#,
        )
        .bind(customer_id)
        .fetch_all(&self.pool)
        .await.map_err(AppError::from_db)?;
        Ok(rows)
    }

    async fn transition_appointment(
        &self,
        id: Uuid,
        to: AppointmentStatus,
        payment_status: Option<PaymentStatus>,
    ) -> AppResult<Appointment> {
        let mut tx = self.pool.begin().await.map_err(AppError::from_db)?;

        let updated = sqlx::query_as::<_, Appointment>(
            r#"
            UPDATE appointments SET status = $1, updated_at = NOW()
            WHERE id = $2 AND status IN ('pending', 'confirmed')
            RETURNING *
            "#,
        )
        .bind(to)
        .bind(id)
        .fetch_optional(&mut *tx)
        .await.map_err(AppError::from_db)?;

        let Some(appointment) = updated else {
            return match self.get_appointment(id).await? {
                Some(current) => Err(AppError::InvalidState(format!(
                    "Cannot mark a {} appointment as {}",
                    current.status, to
                ))),
                None => Err(AppError::NotFound(format!("Appointment {} not found", id))),
            };
        };

        if let Some(status) = payment_status {
            sqlx::query("UPDATE payments SET status = $1, updated_at = NOW() WHERE appointment_id = $2")
                .bind(status)
                .bind(id)
                .execute(&mut *tx)
                .await.map_err(AppError::from_db)?;
        }

        tx.commit().await.map_err(AppError::from_db)?;
        Ok(appointment)
    }

    async fn get_payment(&self, appointment_id: Uuid) -> AppResult<Option<Payment>> {
        let payment = sqlx::query_as::<_, Payment>("SELECT * FROM payments WHERE appointment_id = $1")
            .bind(appointment_id)
            .fetch_optional(&self.pool)
            .await.map_err(AppError::from_db)?;
        Ok(payment)
    }

    async fn complete_payment(
        &self,
        appointment_id: Uuid,
        method: PaymentMethod,
    ) -> AppResult<Payment> {
        let updated = sqlx::query_as::<_, Payment>(
            r#"
            UPDATE payments SET method = $1, status = 'completed', updated_at = NOW()
            WHERE appointment_id = $2 AND status <> 'refunded'
            RETURNING *
            "#,
        )
        .bind(method.as_str())
        .bind(appointment_id)
        .fetch_optional(&self.pool)
        .await.map_err(AppError::from_db)?;

        match updated {
            Some(payment) => Ok(payment),
            None => match self.get_payment(appointment_id).await? {
                Some(_) => Err(AppError::InvalidState(
                    "Cannot process a refunded payment".to_string(),
                )),
                None => Err(AppError::NotFound(format!(
                    "Payment for appointment {} not found",
                    appointment_id
                ))),
            },
        }
    }

    async fn get_promo(&self, salon_id: Uuid, code: &str) -> AppResult<Option<PromoCode>> {
        let promo = sqlx::query_as::<_, PromoCode>(
            "SELECT * FROM promo_codes WHERE salon_id = $1 AND code = $2",
        )
        .bind(salon_id)
        .bind(code)
        .fetch_optional(&self.pool)
        .await.map_err(AppError::from_db)?;
        Ok(promo)
    }

    async fn begin_calendar(
        &self,
        staff_id: Uuid,
        lock_timeout: Duration,
    ) -> AppResult<Box<dyn CalendarTx>> {
        let mut tx = self.pool.begin().await.map_err(AppError::from_db)?;

        // SET does not accept bind parameters; the value is an integer.
        sqlx::query(&format!("SET LOCAL lock_timeout = '{}ms'", lock_timeout.as_millis()))
            .execute(&mut *tx)
            .await
            .map_err(AppError::from_db)?;

        let locked: Option<Uuid> =
            sqlx::query_scalar("SELECT id FROM staff WHERE id = $1 FOR UPDATE")
                .bind(staff_id)
                .fetch_optional(&mut *tx)
                .await
                .map_err(AppError::from_db)?;

        if locked.is_none() {
            return Err(AppError::NotFound(format!("Staff member {} not found", staff_id)));
        }

        Ok(Box::new(PgCalendarTx { staff_id, tx }))
    }
}

/// Open Postgres transaction holding the staff row lock
pub struct PgCalendarTx {
    staff_id: Uuid,
    tx: Transaction<'static, Postgres>,
}

#[async_trait]
impl CalendarTx for PgCalendarTx {
    async fn active_appointments(&mut self, date: NaiveDate) -> AppResult<Vec<Appointment>> {
        let rows = sqlx::query_as::<_, Appointment>(
            r#"
            SELECT * FROM appointments
            WHERE staff_id = $1 AND appointment_date = $2
              AND status NOT IN ('cancelled', 'no_show')
            ORDER BY start_time
            "#,
        )
        .bind(self.staff_id)
        .bind(date)
        .fetch_all(&mut *self.tx)
        .await
        .map_err(AppError::from_db)?;
        Ok(rows)
    }

    async fn lock_promo(&mut self, salon_id: Uuid, code: &str) -> AppResult<Option<PromoCode>> {
        let promo = sqlx::query_as::<_, PromoCode>(
            "SELECT * FROM promo_codes WHERE salon_id = $1 AND code = $2 FOR UPDATE",
        )
        .bind(salon_id)
        .bind(code)
        .fetch_optional(&mut *self.tx)
        .await
        .map_err(AppError::from_db)?;
        Ok(promo)
    }

    async fn increment_promo_usage(&mut self, promo_id: Uuid) -> AppResult<()> {
        sqlx::query("UPDATE promo_codes SET used_count = used_count + 1 WHERE id = $1")
            .bind(promo_id)
            .execute(&mut *self.tx)
            .await
            .map_err(AppError::from_db)?;
        Ok(())
    }

    async fn insert_appointment(&mut self, new: NewAppointment) -> AppResult<Appointment> {
        let appointment = sqlx::query_as::<_, Appointment>(
            r#"
            INSERT INTO appointments (
                id, customer_id, salon_id, staff_id, service_id, appointment_date,
                start_time, end_time, status, notes, promo_code_id
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            RETURNING *
            "#,
        )
        .bind(new.id)
        .bind(new.customer_id)
        .bind(new.salon_id)
        .bind(new.staff_id)
        .bind(new.service_id)
        .bind(new.appointment_date)
        .bind(new.start_time)
        .bind(new.end_time)
        .bind(new.status)
        .bind(&new.notes)
        .bind(new.promo_code_id)
        .fetch_one(&mut *self.tx)
        .await
        .map_err(AppError::from_db)?;
        Ok(appointment)
    }

    async fn move_appointment(
        &mut self,
        id: Uuid,
        date: NaiveDate,
        range: TimeRange,
    ) -> AppResult<Appointment> {
        sqlx::query_as::<_, Appointment>(
            r#"
            UPDATE appointments
            SET appointment_date = $1, start_time = $2, end_time = $3,
                status = 'confirmed', updated_at = NOW()
            WHERE id = $4 AND staff_id = $5 AND status IN ('pending', 'confirmed')
            RETURNING *
            "#,
        )
        .bind(date)
        .bind(range.start)
        .bind(range.end)
        .bind(id)
        .bind(self.staff_id)
        .fetch_optional(&mut *self.tx)
        .await
        .map_err(AppError::from_db)?
        .ok_or_else(|| {
            AppError::InvalidState(format!("Appointment {} can no longer be rescheduled", id))
        })
    }

    async fn insert_payment(&mut self, new: NewPayment) -> AppResult<Payment> {
        let payment = sqlx::query_as::<_, Payment>(
            r#"
            INSERT INTO payments (
                id, appointment_id, amount, discount, tax, total, method, status, receipt_number
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, 'pending', $8)
            RETURNING *
            "#,
        )
        .bind(new.id)
        .bind(new.appointment_id)
        .bind(new.charge.amount)
        .bind(new.charge.discount)
        .bind(new.charge.tax)
        .bind(new.charge.total)
        .bind(new.method.as_str())
        .bind(&new.receipt_number)
        .fetch_one(&mut *self.tx)
        .await
        .map_err(AppError::from_db)?;
        Ok(payment)
    }

    async fn insert_notification(&mut self, new: NewNotification) -> AppResult<Notification> {
        let notification = sqlx::query_as::<_, Notification>(
            r#"
            INSERT INTO notifications (id, user_id, kind, title, message, appointment_id)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING *
            "#,
        )
        .bind(new.id)
        .bind(new.user_id)
        .bind(new.kind)
        .bind(&new.title)
        .bind(&new.message)
        .bind(new.appointment_id)
        .fetch_one(&mut *self.tx)
        .await
        .map_err(AppError::from_db)?;
        Ok(notification)
    }

    async fn credit_loyalty(&mut self, customer_id: Uuid, points: i32) -> AppResult<()> {
        let result = sqlx::query(
            "UPDATE users SET loyalty_points = loyalty_points + $1, updated_at = NOW() WHERE id = $2",
        )
        .bind(points)
        .bind(customer_id)
        .execute(&mut *self.tx)
        .await
        .map_err(AppError::from_db)?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Customer {} not found", customer_id)));
        }
        Ok(())
    }

    async fn commit(self: Box<Self>) -> AppResult<()> {
        self.tx
            .commit()
            .await
            .map_err(|e| AppError::Persistence(format!("failed to commit booking: {}", e)))
    }
}
