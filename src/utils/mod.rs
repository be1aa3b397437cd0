//! Utility modules

pub mod env;
pub mod logging;

pub use env::{env_is_set, env_opt, split_list};
#[cfg(feature = "json-logging")]
pub use logging::init_json_logging;
pub use logging::{init_logging, init_logging_from_config};
