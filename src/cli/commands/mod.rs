//! CLI command implementations

pub mod config;
pub mod init;
pub mod plan;
pub mod run;

pub use config::execute as config;
pub use init::execute as init;
pub use plan::execute as plan;
pub use run::execute as run;
