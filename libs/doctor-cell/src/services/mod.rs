pub mod inventory;
pub mod registry;

pub use inventory::SlotInventoryService;
pub use registry::DoctorRegistryService;
