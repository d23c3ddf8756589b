pub mod evict;
pub mod fetch;
pub mod import;
pub mod resolve;
