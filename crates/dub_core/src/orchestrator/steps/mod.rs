//! Concrete pipeline steps.

pub mod master;
pub mod pace;
pub mod retime;

pub use master::MasterStep;
pub use pace::PaceStep;
pub use retime::RetimeStep;
