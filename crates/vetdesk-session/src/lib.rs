pub mod config;
pub mod error;
pub mod session;

pub use config::SessionConfig;
pub use error::SessionError;
pub use session::{ClinicSession, FetchStatus};
