//! The COM boundary: raw vtable layouts, inbound adapters over the real
//! objects, and the outbound projection of wrappers back to the
//! application.

pub mod export;
pub mod raw;
pub mod types;
pub mod vtbl;
