pub mod booking;
pub mod consistency;
pub mod lifecycle;

pub use booking::SchedulingService;
pub use consistency::PartitionLockService;
pub use lifecycle::AppointmentLifecycleService;
