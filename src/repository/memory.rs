//! In-memory store used by the `memory` backend and by the test suite.
//!
//! Every calendar transaction holds the staff member's lock from
//! [`KeyedLocks`] and buffers its writes; `commit` applies them in one step
//! while holding the table mutex, so an aborted booking leaves nothing behind.

use std::{
    collections::{BTreeMap, HashMap, HashSet},
    sync::Arc,
    time::Duration,
};

use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use tokio::sync::{Mutex, OwnedMutexGuard};
use uuid::Uuid;

use super::{locks::KeyedLocks, BookingStore, CalendarTx};
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

#[derive(Default)]
struct Tables {
    /// customer id -> loyalty points
    customers: HashMap<Uuid, i32>,
    staff: HashSet<Uuid>,
    services: HashMap<Uuid, Service>,
    working_hours: BTreeMap<(Uuid, i16), StaffWorkingHours>,
    appointments: HashMap<Uuid, Appointment>,
    promos: HashMap<Uuid, PromoCode>,
    /// keyed by appointment id
    payments: HashMap<Uuid, Payment>,
    notifications: Vec<Notification>,
}

impl Tables {
    fn active_appointments(&self, staff_id: Uuid, date: NaiveDate) -> Vec<Appointment> {
        let mut rows: Vec<Appointment> = self
            .appointments
            .values()
            .filter(|a| {
                a.staff_id == staff_id
                    && a.appointment_date == date
                    && a.status.occupies_calendar()
            })
            .cloned()
            .collect();
        rows.sort_by_key(|a| a.start_time);
        rows
    }

    fn find_promo(&self, salon_id: Uuid, code: &str) -> Option<&PromoCode> {
        self.promos
            .values()
            .find(|p| p.salon_id == salon_id && p.code == code)
    }
}

#[derive(Clone)]
pub struct MemoryBookingStore {
    tables: Arc<Mutex<Tables>>,
    staff_locks: KeyedLocks,
    promo_locks: KeyedLocks,
}

impl Default for MemoryBookingStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryBookingStore {
    pub fn new() -> Self {
        Self {
            tables: Arc::default(),
            staff_locks: KeyedLocks::new("staff calendar"),
            promo_locks: KeyedLocks::new("promo code"),
        }
    }

    // Seeding for rows owned by the surrounding platform

    pub async fn add_customer(&self, id: Uuid) {
        self.tables.lock().await.customers.entry(id).or_insert(0);
    }

    pub async fn add_staff(&self, id: Uuid) {
        self.tables.lock().await.staff.insert(id);
    }

    pub async fn add_service(&self, service: Service) {
        self.tables.lock().await.services.insert(service.id, service);
    }

    pub async fn add_promo(&self, promo: PromoCode) {
        self.tables.lock().await.promos.insert(promo.id, promo);
    }

    // Inspection

    pub async fn loyalty_points(&self, customer_id: Uuid) -> Option<i32> {
        self.tables.lock().await.customers.get(&customer_id).copied()
    }

    pub async fn promo(&self, id: Uuid) -> Option<PromoCode> {
        self.tables.lock().await.promos.get(&id).cloned()
    }

    pub async fn appointments(&self) -> Vec<Appointment> {
        self.tables.lock().await.appointments.values().cloned().collect()
    }

    pub async fn payments(&self) -> Vec<Payment> {
        self.tables.lock().await.payments.values().cloned().collect()
    }

    pub async fn notifications_for(&self, user_id: Uuid) -> Vec<Notification> {
        self.tables
            .lock()
            .await
            .notifications
            .iter()
            .filter(|n| n.user_id == user_id)
            .cloned()
            .collect()
    }
}

#[async_trait]
impl BookingStore for MemoryBookingStore {
    async fn ping(&self) -> AppResult<()> {
        Ok(())
    }

    async fn get_service(&self, id: Uuid) -> AppResult<Option<Service>> {
        Ok(self.tables.lock().await.services.get(&id).cloned())
    }

    async fn get_working_hours(
        &self,
        staff_id: Uuid,
        day_of_week: i16,
    ) -> AppResult<Option<StaffWorkingHours>> {
        Ok(self
            .tables
            .lock()
            .await
            .working_hours
            .get(&(staff_id, day_of_week))
            .cloned())
    }

    async fn list_working_hours(&self, staff_id: Uuid) -> AppResult<Vec<StaffWorkingHours>> {
        Ok(self
            .tables
            .lock()
            .await
            .working_hours
            .range((staff_id, i16::MIN)..=(staff_id, i16::MAX))
            .map(|(_, hours)| hours.clone())
            .collect())
    }

    async fn replace_working_hours(
        &self,
        staff_id: Uuid,
        hours: Vec<WorkingDay>,
    ) -> AppResult<Vec<StaffWorkingHours>> {
        let mut tables = self.tables.lock().await;
        if !tables.staff.contains(&staff_id) {
            return Err(AppError::NotFound(format!("Staff member {} not found", staff_id)));
        }

        tables.working_hours.retain(|(id, _), _| *id != staff_id);
        for day in hours {
            tables.working_hours.insert(
                (staff_id, day.day_of_week),
                StaffWorkingHours {
                    staff_id,
                    day_of_week: day.day_of_week,
                    start_time: day.start_time,
                    end_time: day.end_time,
                    is_off: day.is_off,
                },
            );
        }

        Ok(tables
            .working_hours
            .range((staff_id, i16::MIN)..=(staff_id, i16::MAX))
            .map(|(_, hours)| hours.clone())
            .collect())
    }

    async fn active_appointments(
        &self,
        staff_id: Uuid,
        date: NaiveDate,
    ) -> AppResult<Vec<Appointment>> {
        Ok(self.tables.lock().await.active_appointments(staff_id, date))
    }

    async fn get_appointment(&self, id: Uuid) -> AppResult<Option<Appointment>> {
        Ok(self.tables.lock().await.appointments.get(&id).cloned())
    }

    async fn list_customer_appointments(&self, customer_id: Uuid) -> AppResult<Vec<Appointment>> {
        let tables = self.tables.lock().await;
        let mut rows: Vec<Appointment> = tables
            .appointments
            .values()
            .filter(|a| a.customer_id == customer_id)
            .cloned()
            .collect();
        rows.sort_by(|a, b| {
            (b.appointment_date, b.start_time).cmp(&(a.appointment_date, a.start_time))
        });
        Ok(rows)
    }

    async fn transition_appointment(
        &self,
        id: Uuid,
        to: AppointmentStatus,
        payment_status: Option<PaymentStatus>,
    ) -> AppResult<Appointment> {
        let mut tables = self.tables.lock().await;
        let now = Utc::now();

        let appointment = tables
            .appointments
            .get_mut(&id)
            .ok_or_else(|| AppError::NotFound(format!("Appointment {} not found", id)))?;
        if !appointment.status.is_open() {
            return Err(AppError::InvalidState(format!(
                "Cannot mark a {} appointment as {}",
                appointment.status, to
            )));
        }
        appointment.status = to;
        appointment.updated_at = now;
        let appointment = appointment.clone();

        if let Some(status) = payment_status {
            if let Some(payment) = tables.payments.get_mut(&id) {
                payment.status = status;
                payment.updated_at = now;
            }
        }

        Ok(appointment)
    }

    async fn get_payment(&self, appointment_id: Uuid) -> AppResult<Option<Payment>> {
        Ok(self.tables.lock().await.payments.get(&appointment_id).cloned())
    }

    async fn complete_payment(
        &self,
        appointment_id: Uuid,
        method: PaymentMethod,
    ) -> AppResult<Payment> {
        let mut tables = self.tables.lock().await;
        let payment = tables.payments.get_mut(&appointment_id).ok_or_else(|| {
            AppError::NotFound(format!("Payment for appointment {} not found", appointment_id))
        })?;
        if payment.status == PaymentStatus::Refunded {
            return Err(AppError::InvalidState(
                "Cannot process a refunded payment".to_string(),
            ));
        }
        payment.method = method.as_str().to_string();
        payment.status = PaymentStatus::Completed;
        payment.updated_at = Utc::now();
        Ok(payment.clone())
    }

    async fn get_promo(&self, salon_id: Uuid, code: &str) -> AppResult<Option<PromoCode>> {
        Ok(self.tables.lock().await.find_promo(salon_id, code).cloned())
    }

    async fn begin_calendar(
        &self,
        staff_id: Uuid,
        lock_timeout: Duration,
    ) -> AppResult<Box<dyn CalendarTx>> {
        if !self.tables.lock().await.staff.contains(&staff_id) {
            return Err(AppError::NotFound(format!("Staff member {} not found", staff_id)));
        }

        let guard = self.staff_locks.acquire(staff_id, lock_timeout).await?;

        Ok(Box::new(MemoryCalendarTx {
            tables: self.tables.clone(),
            promo_locks: self.promo_locks.clone(),
            lock_timeout,
            staff_id,
            _staff_guard: guard,
            promo_guards: HashMap::new(),
            staged: Staged::default(),
        }))
    }
}

#[derive(Default)]
struct Staged {
    /// inserted or moved appointments, by id
    appointments: HashMap<Uuid, Appointment>,
    promo_uses: HashMap<Uuid, i32>,
    payments: Vec<Payment>,
    notifications: Vec<Notification>,
    loyalty: Vec<(Uuid, i32)>,
}

pub struct MemoryCalendarTx {
    tables: Arc<Mutex<Tables>>,
    promo_locks: KeyedLocks,
    lock_timeout: Duration,
    staff_id: Uuid,
    _staff_guard: OwnedMutexGuard<()>,
    promo_guards: HashMap<Uuid, OwnedMutexGuard<()>>,
    staged: Staged,
}

impl MemoryCalendarTx {
    fn with_staged_uses(&self, mut promo: PromoCode) -> PromoCode {
        promo.used_count += self.staged.promo_uses.get(&promo.id).copied().unwrap_or(0);
        promo
    }

    async fn current_appointment(&self, id: Uuid) -> Option<Appointment> {
        match self.staged.appointments.get(&id) {
            Some(staged) => Some(staged.clone()),
            None => self.tables.lock().await.appointments.get(&id).cloned(),
        }
    }
}

#[async_trait]
impl CalendarTx for MemoryCalendarTx {
    async fn active_appointments(&mut self, date: NaiveDate) -> AppResult<Vec<Appointment>> {
        let committed = self.tables.lock().await.active_appointments(self.staff_id, date);

        let mut rows: Vec<Appointment> = committed
            .into_iter()
            .filter(|a| !self.staged.appointments.contains_key(&a.id))
            .chain(self.staged.appointments.values().cloned())
            .filter(|a| {
                a.staff_id == self.staff_id
                    && a.appointment_date == date
                    && a.status.occupies_calendar()
            })
            .collect();
        rows.sort_by_key(|a| a.start_time);
        Ok(rows)
    }

    async fn lock_promo(&mut self, salon_id: Uuid, code: &str) -> AppResult<Option<PromoCode>> {
        let promo_id = match self.tables.lock().await.find_promo(salon_id, code) {
            Some(promo) => promo.id,
            None => return Ok(None),
        };

        if !self.promo_guards.contains_key(&promo_id) {
            let guard = self.promo_locks.acquire(promo_id, self.lock_timeout).await?;
            self.promo_guards.insert(promo_id, guard);
        }

        // Re-read under the lock: a concurrent redemption may have committed.
        let promo = self.tables.lock().await.promos.get(&promo_id).cloned();
        Ok(promo.map(|p| self.with_staged_uses(p)))
    }

    async fn increment_promo_usage(&mut self, promo_id: Uuid) -> AppResult<()> {
        if !self.promo_guards.contains_key(&promo_id) {
            return Err(AppError::Internal(format!(
                "promo code {} incremented without holding its lock",
                promo_id
            )));
        }
        *self.staged.promo_uses.entry(promo_id).or_insert(0) += 1;
        Ok(())
    }

    async fn insert_appointment(&mut self, new: NewAppointment) -> AppResult<Appointment> {
        if new.start_time >= new.end_time {
            return Err(AppError::Persistence(
                "appointment must start before it ends".to_string(),
            ));
        }
        let now = Utc::now();
        let appointment = Appointment {
            id: new.id,
            customer_id: new.customer_id,
            salon_id: new.salon_id,
            staff_id: new.staff_id,
            service_id: new.service_id,
            appointment_date: new.appointment_date,
            start_time: new.start_time,
            end_time: new.end_time,
            status: new.status,
            notes: new.notes,
            promo_code_id: new.promo_code_id,
            created_at: now,
            updated_at: now,
        };
        self.staged
            .appointments
            .insert(appointment.id, appointment.clone());
        Ok(appointment)
    }

    async fn move_appointment(
        &mut self,
        id: Uuid,
        date: NaiveDate,
        range: TimeRange,
    ) -> AppResult<Appointment> {
        let mut appointment = self
            .current_appointment(id)
            .await
            .filter(|a| a.staff_id == self.staff_id && a.status.is_open())
            .ok_or_else(|| {
                AppError::InvalidState(format!("Appointment {} can no longer be rescheduled", id))
            })?;

        appointment.appointment_date = date;
        appointment.start_time = range.start;
        appointment.end_time = range.end;
        appointment.status = AppointmentStatus::Confirmed;
        appointment.updated_at = Utc::now();

        self.staged.appointments.insert(id, appointment.clone());
        Ok(appointment)
    }

    async fn insert_payment(&mut self, new: NewPayment) -> AppResult<Payment> {
        let now = Utc::now();
        let payment = Payment {
            id: new.id,
            appointment_id: new.appointment_id,
            amount: new.charge.amount,
            discount: new.charge.discount,
            tax: new.charge.tax,
            total: new.charge.total,
            method: new.method.as_str().to_string(),
            status: PaymentStatus::Pending,
            receipt_number: new.receipt_number,
            created_at: now,
            updated_at: now,
        };
        self.staged.payments.push(payment.clone());
        Ok(payment)
    }

    async fn insert_notification(&mut self, new: NewNotification) -> AppResult<Notification> {
        let notification = Notification {
            id: new.id,
            user_id: new.user_id,
            kind: new.kind.to_string(),
            title: new.title,
            message: new.message,
            is_read: false,
            appointment_id: new.appointment_id,
            created_at: Utc::now(),
        };
        self.staged.notifications.push(notification.clone());
        Ok(notification)
    }

    async fn credit_loyalty(&mut self, customer_id: Uuid, points: i32) -> AppResult<()> {
        if !self.tables.lock().await.customers.contains_key(&customer_id) {
            return Err(AppError::NotFound(format!("Customer {} not found", customer_id)));
        }
        self.staged.loyalty.push((customer_id, points));
        Ok(())
    }

    async fn commit(self: Box<Self>) -> AppResult<()> {
        let MemoryCalendarTx {
            tables,
            staged,
            _staff_guard,
            promo_guards,
            ..
        } = *self;
        let mut tables = tables.lock().await;

        for (promo_id, uses) in &staged.promo_uses {
            let promo = tables.promos.get(promo_id).ok_or_else(|| {
                AppError::Persistence(format!("promo code {} disappeared", promo_id))
            })?;
            if promo.max_uses.is_some_and(|max| promo.used_count + uses > max) {
                return Err(AppError::Persistence(format!(
                    "promo code {} would exceed its usage cap",
                    promo_id
                )));
            }
        }
        // Transitions do not take the calendar lock, so a moved appointment
        // may have been closed since it was staged.
        for id in staged.appointments.keys() {
            if let Some(current) = tables.appointments.get(id) {
                if !current.status.is_open() {
                    return Err(AppError::InvalidState(format!(
                        "Appointment {} is {} and can no longer be rescheduled",
                        id, current.status
                    )));
                }
            }
        }
        for payment in &staged.payments {
            if tables.payments.contains_key(&payment.appointment_id) {
                return Err(AppError::Persistence(format!(
                    "appointment {} already has a payment",
                    payment.appointment_id
                )));
            }
        }

        for (promo_id, uses) in staged.promo_uses {
            if let Some(promo) = tables.promos.get_mut(&promo_id) {
                promo.used_count += uses;
            }
        }
        tables.appointments.extend(staged.appointments);
        for payment in staged.payments {
            tables.payments.insert(payment.appointment_id, payment);
        }
        tables.notifications.extend(staged.notifications);
        for (customer_id, points) in staged.loyalty {
            *tables.customers.entry(customer_id).or_insert(0) += points;
        }

        // Locks are released only once the writes are visible.
        drop(tables);
        drop(promo_guards);
        drop(_staff_guard);
        Ok(())
    }
}
