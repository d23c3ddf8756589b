//! Persistent tile cache: storage, expiry timestamps and bulk import.

mod import;
mod store;
mod timestamp;

pub use import::*;
pub use store::*;
pub use timestamp::*;
