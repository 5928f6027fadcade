//! Command implementations.

mod info;
mod init;
mod listen;
mod run;
mod validate;

pub use info::run_info;
pub use init::run_init;
pub use listen::run_listen;
pub use run::run_relay;
pub use validate::run_validate;
