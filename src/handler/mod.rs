pub mod chat;
pub mod job;
