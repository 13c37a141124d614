//! Task store client — task creation, attachment upload, publishing.

pub mod attachments;
pub mod client;
pub mod publisher;

pub use attachments::{AttachmentUploader, UploadStrategy};
pub use client::TodoistClient;
pub use publisher::TaskPublisher;
