pub mod composer;
pub mod threads;

pub use composer::{Composer, DraftAttachment, RecipientField};
pub use threads::{aggregate_threads, unread_total};
