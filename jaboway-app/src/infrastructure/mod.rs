mod admin_gate;
mod guest_storage;
pub mod remote;

pub use admin_gate::AdminGate;
pub use guest_storage::MemoryGuestStore;
