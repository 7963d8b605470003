pub mod client;
pub mod error;
pub mod store;

pub use client::BackendClient;
pub use error::BackendError;
pub use store::RecordStore;
