//! Data models for the reservation core

pub mod appointment;
pub mod notification;
pub mod payment;
pub mod promo;
pub mod service;
pub mod slot;
pub mod staff;
pub mod user;

// Re-export commonly used types
pub use appointment::{Appointment, AppointmentStatus, BookingConfirmation};
pub use notification::Notification;
pub use payment::{Payment, PaymentStatus};
pub use promo::PromoCode;
pub use service::Service;
pub use slot::{TimeRange, TimeSlot};
pub use staff::StaffWorkingHours;
pub use user::UserClaims;
