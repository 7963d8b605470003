pub mod error;
pub mod http;
pub mod provider;

pub use error::MailError;
pub use http::HttpMailGateway;
pub use provider::MailProvider;
