//! Command implementations.

pub mod chunk;
pub mod config;
pub mod extract;
pub mod prompt;

pub use self::chunk::execute_chunk;
pub use self::config::execute_config;
pub use self::extract::execute_extract;
pub use self::prompt::execute_prompt;
