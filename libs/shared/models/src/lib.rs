pub mod status;

pub use status::AppointmentStatus;
