pub mod autosave;
pub mod config;
pub mod draft;
pub mod error;
pub mod field_mapper;
pub mod listing;
pub mod listing_wizard;
pub mod naming;
pub mod notices;
pub mod profile;
pub mod retry;
pub mod session;
pub mod store;
pub mod types;
pub mod validation;
