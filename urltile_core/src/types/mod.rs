//! Value types shared by every urltile crate.

mod blob;
pub use blob::*;

mod tile_address;
pub use tile_address::*;

mod tile_extension;
pub use tile_extension::*;

mod tile_key;
pub use tile_key::*;
