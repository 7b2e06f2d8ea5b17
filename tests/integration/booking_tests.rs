//! Booking transaction behaviour under concurrency, rollback and lifecycle

use std::time::Duration;

use chrono::NaiveTime;
use rust_decimal::Decimal;
use salon_booking::{
    models::{
        appointment::RescheduleAppointment,
        payment::PaymentStatus,
        user::{Role, UserClaims},
        AppointmentStatus,
    },
    repository::BookingStore,
    AppError,
};
use uuid::Uuid;

use crate::fixtures::{Salon, MONDAY, SUNDAY};

fn t(h: u32, m: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(h, m, 0).unwrap()
}

fn actor(user_id: Uuid, role: Role) -> UserClaims {
    UserClaims {
        sub: user_id,
        role,
        exp: chrono::Utc::now().timestamp() + 3600,
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_bookings_for_same_slot_one_wins() {
    let salon = Salon::new().await;
    let other = salon.add_customer().await;

    let first = {
        let services = salon.state.services.clone();
        let request = salon.request(MONDAY, "14:00");
        let customer = salon.customer_id;
        tokio::spawn(async move { services.booking.book(customer, request).await })
    };
    let second = {
        let services = salon.state.services.clone();
        let request = salon.request(MONDAY, "14:00");
        tokio::spawn(async move { services.booking.book(other, request).await })
    };

    let results = [first.await.unwrap(), second.await.unwrap()];
    let winners: Vec<_> = results.iter().filter_map(|r| r.as_ref().ok()).collect();
    assert_eq!(winners.len(), 1);
    assert_eq!(winners[0].appointment.status, AppointmentStatus::Confirmed);

    let loser = results.iter().find_map(|r| r.as_ref().err()).unwrap();
    assert!(matches!(loser, AppError::AvailabilityConflict(_)));

    assert_eq!(salon.store.appointments().await.len(), 1);
    assert_eq!(salon.store.payments().await.len(), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_last_promo_use_goes_to_one_booking() {
    let salon = Salon::new().await;
    let promo = salon.add_promo("LASTONE", 20, Some(1)).await;
    let other = salon.add_customer().await;

    let mut handles = Vec::new();
    for (customer, start) in [(salon.customer_id, "10:00"), (other, "14:00")] {
        let services = salon.state.services.clone();
        let mut request = salon.request(MONDAY, start);
        request.promo_code = Some("LASTONE".to_string());
        handles.push(tokio::spawn(async move {
            (customer, services.booking.book(customer, request).await)
        }));
    }

    let mut winner = None;
    let mut loser = None;
    for handle in handles {
        match handle.await.unwrap() {
            (customer, Ok(confirmation)) => winner = Some((customer, confirmation)),
            (customer, Err(e)) => loser = Some((customer, e)),
        }
    }

    let (_, confirmation) = winner.expect("one booking must succeed");
    assert_eq!(confirmation.payment.discount, "10.00".parse::<Decimal>().unwrap());
    assert_eq!(confirmation.appointment.promo_code_id, Some(promo.id));

    let (losing_customer, error) = loser.expect("one booking must fail");
    assert!(matches!(error, AppError::PromoIneligible(_)));

    assert_eq!(salon.store.promo(promo.id).await.unwrap().used_count, 1);
    assert_eq!(salon.store.appointments().await.len(), 1);
    assert_eq!(salon.store.payments().await.len(), 1);
    assert_eq!(salon.store.loyalty_points(losing_customer).await, Some(0));
    assert!(salon.store.notifications_for(losing_customer).await.is_empty());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_promo_cap_holds_under_contention() {
    let salon = Salon::new().await;
    let promo = salon.add_promo("THREE", 10, Some(3)).await;

    // Eight non-overlapping hours so only the promo cap limits success
    let mut handles = Vec::new();
    for hour in 9..17 {
        let customer = salon.add_customer().await;
        let services = salon.state.services.clone();
        let mut request = salon.request(MONDAY, &format!("{:02}:00", hour));
        request.promo_code = Some("THREE".to_string());
        handles.push(tokio::spawn(async move {
            services.booking.book(customer, request).await
        }));
    }

    let mut succeeded = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(_) => succeeded += 1,
            Err(e) => assert!(matches!(e, AppError::PromoIneligible(_)), "{e}"),
        }
    }

    assert_eq!(succeeded, 3);
    assert_eq!(salon.store.promo(promo.id).await.unwrap().used_count, 3);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn test_promo_cap_holds_across_staff_members() {
    let salon = Salon::new().await;
    let promo = salon.add_promo("SHARED", 15, Some(2)).await;

    // Separate calendars: only the promo lock serializes these bookings
    let mut requests = Vec::new();
    for _ in 0..12 {
        let customer = salon.add_customer().await;
        let mut request = salon.request(MONDAY, "10:00");
        request.staff_id = salon.add_staff().await;
        request.promo_code = Some("SHARED".to_string());
        requests.push((customer, request));
    }

    let handles: Vec<_> = requests
        .into_iter()
        .map(|(customer, request)| {
            let services = salon.state.services.clone();
            tokio::spawn(async move { services.booking.book(customer, request).await })
        })
        .collect();

    let mut succeeded = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(confirmation) => {
                assert_eq!(confirmation.appointment.promo_code_id, Some(promo.id));
                succeeded += 1;
            }
            Err(e) => assert!(matches!(e, AppError::PromoIneligible(_)), "{e}"),
        }
    }

    assert_eq!(succeeded, 2);
    assert_eq!(salon.store.promo(promo.id).await.unwrap().used_count, 2);
    assert_eq!(salon.store.appointments().await.len(), 2);
    assert_eq!(salon.store.payments().await.len(), 2);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn test_no_overlap_under_many_concurrent_bookings() {
    let salon = Salon::new().await;

    let mut handles = Vec::new();
    for round in 0..3 {
        for slot in 0..15u32 {
            let customer = salon.add_customer().await;
            let services = salon.state.services.clone();
            let start = format!("{:02}:{:02}", 9 + slot / 2, (slot % 2) * 30 + round * 5);
            let request = salon.request(MONDAY, &start);
            handles.push(tokio::spawn(async move {
                services.booking.book(customer, request).await
            }));
        }
    }

    for handle in handles {
        if let Err(e) = handle.await.unwrap() {
            assert!(
                matches!(e, AppError::AvailabilityConflict(_)),
                "unexpected failure: {e}"
            );
        }
    }

    let booked = salon
        .store
        .active_appointments(salon.staff_id, chrono::NaiveDate::from_ymd_opt(2025, 6, 2).unwrap())
        .await
        .unwrap();
    assert!(!booked.is_empty());
    for (i, a) in booked.iter().enumerate() {
        for b in &booked[i + 1..] {
            assert!(
                !a.range().overlaps(&b.range()),
                "{} {}-{} overlaps {} {}-{}",
                a.id,
                a.start_time,
                a.end_time,
                b.id,
                b.start_time,
                b.end_time
            );
        }
    }
    assert_eq!(salon.store.payments().await.len(), booked.len());
}

#[tokio::test]
async fn test_day_off_rejects_without_writes() {
    let salon = Salon::new().await;

    let err = salon
        .state
        .services
        .booking
        .book(salon.customer_id, salon.request(SUNDAY, "11:00"))
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::AvailabilityConflict(_)));
    assert!(salon.store.appointments().await.is_empty());
    assert!(salon.store.payments().await.is_empty());
}

#[tokio::test]
async fn test_ineligible_promo_rolls_back_everything() {
    let salon = Salon::new().await;
    let promo = salon.add_promo("USED", 15, Some(0)).await;

    let mut request = salon.request(MONDAY, "10:00");
    request.promo_code = Some("USED".to_string());
    let err = salon
        .state
        .services
        .booking
        .book(salon.customer_id, request)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::PromoIneligible(_)));

    let mut request = salon.request(MONDAY, "10:00");
    request.promo_code = Some("UNKNOWN".to_string());
    let err = salon
        .state
        .services
        .booking
        .book(salon.customer_id, request)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::PromoIneligible(_)));

    assert_eq!(salon.store.promo(promo.id).await.unwrap().used_count, 0);
    assert!(salon.store.appointments().await.is_empty());
    assert_eq!(salon.store.loyalty_points(salon.customer_id).await, Some(0));
    assert!(salon
        .store
        .notifications_for(salon.customer_id)
        .await
        .is_empty());

    // The calendar lock was released by the aborted attempt
    assert!(salon
        .state
        .services
        .booking
        .book(salon.customer_id, salon.request(MONDAY, "10:00"))
        .await
        .is_ok());
}

#[tokio::test]
async fn test_booked_slot_disappears_from_availability() {
    let salon = Salon::new().await;
    let availability = &salon.state.services.availability;

    let before = availability
        .available_slots(salon.staff_id, salon.service_id, MONDAY)
        .await
        .unwrap();
    let again = availability
        .available_slots(salon.staff_id, salon.service_id, MONDAY)
        .await
        .unwrap();
    assert_eq!(before, again);
    assert!(before.iter().all(|s| s.available));

    salon
        .state
        .services
        .booking
        .book(salon.customer_id, salon.request(MONDAY, "10:00"))
        .await
        .unwrap();

    let after = availability
        .available_slots(salon.staff_id, salon.service_id, MONDAY)
        .await
        .unwrap();
    let slot = |h, m| after.iter().find(|s| s.start_time == t(h, m)).unwrap();
    assert!(!slot(10, 0).available);
    assert!(!slot(9, 30).available);
    assert!(slot(9, 0).available);
    assert!(slot(11, 0).available);

    // 09:00 ends exactly where the booking starts
    assert!(salon
        .state
        .services
        .booking
        .book(salon.customer_id, salon.request(MONDAY, "09:00"))
        .await
        .is_ok());
}

#[tokio::test]
async fn test_lock_timeout_is_retryable() {
    let salon = Salon::with_lock_timeout(50).await;

    let held = salon
        .store
        .begin_calendar(salon.staff_id, Duration::from_secs(1))
        .await
        .unwrap();

    let err = salon
        .state
        .services
        .booking
        .book(salon.customer_id, salon.request(MONDAY, "10:00"))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::LockTimeout(_)));
    assert!(err.is_retryable());

    // Another staff member is not blocked by the held calendar
    let other_staff = salon.add_staff().await;
    let mut request = salon.request(MONDAY, "10:00");
    request.staff_id = other_staff;
    assert!(salon
        .state
        .services
        .booking
        .book(salon.customer_id, request)
        .await
        .is_ok());

    drop(held);
    assert!(salon
        .state
        .services
        .booking
        .book(salon.customer_id, salon.request(MONDAY, "10:00"))
        .await
        .is_ok());
}

#[tokio::test]
async fn test_reschedule_checks_other_appointments_only() {
    let salon = Salon::new().await;
    let booking = &salon.state.services.booking;
    let other = salon.add_customer().await;

    let mine = booking
        .book(salon.customer_id, salon.request(MONDAY, "10:00"))
        .await
        .unwrap()
        .appointment;
    booking
        .book(other, salon.request(MONDAY, "12:00"))
        .await
        .unwrap();

    let move_to = |start: &str| RescheduleAppointment {
        date: MONDAY.to_string(),
        start_time: start.to_string(),
    };

    // Overlapping only itself is fine
    let moved = booking
        .reschedule(salon.customer_id, mine.id, move_to("10:30"))
        .await
        .unwrap();
    assert_eq!(moved.end_time, t(11, 30));
    assert_eq!(moved.status, AppointmentStatus::Confirmed);

    let err = booking
        .reschedule(salon.customer_id, mine.id, move_to("11:30"))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::AvailabilityConflict(_)));

    let moved = booking
        .reschedule(salon.customer_id, mine.id, move_to("11:00"))
        .await
        .unwrap();
    assert_eq!(moved.end_time, t(12, 0));

    // Not the customer's appointment
    let err = booking
        .reschedule(other, mine.id, move_to("15:00"))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));
}

#[tokio::test]
async fn test_closed_appointments_cannot_be_rescheduled() {
    let salon = Salon::new().await;
    let services = &salon.state.services;
    let customer = actor(salon.customer_id, Role::Customer);

    let appointment = services
        .booking
        .book(salon.customer_id, salon.request(MONDAY, "10:00"))
        .await
        .unwrap()
        .appointment;
    services
        .appointments
        .cancel(&customer, appointment.id)
        .await
        .unwrap();

    let err = services
        .booking
        .reschedule(
            salon.customer_id,
            appointment.id,
            RescheduleAppointment {
                date: MONDAY.to_string(),
                start_time: "15:00".to_string(),
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::InvalidState(_)));
}

#[tokio::test]
async fn test_cancel_refunds_and_frees_slot() {
    let salon = Salon::new().await;
    let services = &salon.state.services;
    let other = salon.add_customer().await;

    let appointment = services
        .booking
        .book(salon.customer_id, salon.request(MONDAY, "14:00"))
        .await
        .unwrap()
        .appointment;

    let cancelled = services
        .appointments
        .cancel(&actor(salon.customer_id, Role::Customer), appointment.id)
        .await
        .unwrap();
    assert_eq!(cancelled.status, AppointmentStatus::Cancelled);

    let payment = salon
        .store
        .get_payment(appointment.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(payment.status, PaymentStatus::Refunded);

    assert!(services
        .booking
        .book(other, salon.request(MONDAY, "14:00"))
        .await
        .is_ok());

    let err = services
        .appointments
        .cancel(&actor(salon.customer_id, Role::Customer), appointment.id)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::InvalidState(_)));
}

#[tokio::test]
async fn test_no_show_frees_slot_and_complete_settles_payment() {
    let salon = Salon::new().await;
    let services = &salon.state.services;
    let owner = actor(Uuid::new_v4(), Role::SalonOwner);

    let first = services
        .booking
        .book(salon.customer_id, salon.request(MONDAY, "09:00"))
        .await
        .unwrap()
        .appointment;
    let second = services
        .booking
        .book(salon.customer_id, salon.request(MONDAY, "11:00"))
        .await
        .unwrap()
        .appointment;

    services.appointments.mark_no_show(&owner, first.id).await.unwrap();
    services.appointments.complete(&owner, second.id).await.unwrap();

    let settled = salon.store.get_payment(second.id).await.unwrap().unwrap();
    assert_eq!(settled.status, PaymentStatus::Completed);

    assert!(services
        .booking
        .book(salon.customer_id, salon.request(MONDAY, "09:00"))
        .await
        .is_ok());

    let mine = services
        .appointments
        .list_for_customer(salon.customer_id)
        .await
        .unwrap();
    assert_eq!(mine.len(), 3);
    assert_eq!(mine[0].start_time, t(11, 0));
}
