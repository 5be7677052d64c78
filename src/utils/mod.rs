pub mod config;
pub mod eicbuild_toml;
pub mod logger;
pub mod runtime;

pub use config::*;
pub use logger::{Colors, setup_logging};
pub use runtime::{Runtime, load_dotenv, locate_runtime};
