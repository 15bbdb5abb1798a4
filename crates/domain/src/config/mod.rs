mod errors;
mod filtering;
mod logging;
mod root;

pub use errors::ConfigError;
pub use filtering::FilteringConfig;
pub use logging::LoggingConfig;
pub use root::Config;
