pub mod handlers;
pub mod models;
pub mod router;
pub mod services;

// Re-export the domain models for external use
pub use models::{
    Appointment, AppointmentStatus, BookSlotRequest, CustomerIdentity, DayAvailability,
    SlotKey, WorkingSlot, GUEST_CUSTOMER_ID,
};
