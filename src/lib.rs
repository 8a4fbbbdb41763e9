pub mod api;
pub mod config;
pub mod domain;
pub mod error;
pub mod loader;
pub mod logger;
pub mod stages;

pub use stages::lrb::run_lrb;
pub use stages::mrs::run_mrs;
pub use stages::srfs::run_srfs;
