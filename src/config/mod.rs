//! Configuration inputs: per-directory `.stowconfig` files and the user
//! defaults file.
pub mod defaults;
pub mod ignore;
pub mod pattern;

pub use defaults::Defaults;
pub use ignore::{CONFIG_FILE_NAME, IgnoreConfig, Ignorable, Redirect};
