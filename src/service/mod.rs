pub mod chat_service;
pub mod error;
pub mod feed;
pub mod ledger;
pub mod locator;
