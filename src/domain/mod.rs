pub mod actor;
pub mod merkle;
pub mod message;
pub mod note;
