//! Core of the meetbook meeting client.
//!
//! - [`editor`] holds the save protocol: optimistic versioning, conflict
//!   reload and the draft backup written before every request
//! - [`api`] is the REST surface, with [`api::HttpClient`] talking to the server
//! - [`draft`] and [`store`] cache unsaved edits in a key-value store
//! - [`query`] and [`calendar`] turn list responses into calendar views

pub mod api;
pub mod board;
pub mod calendar;
pub mod config;
pub mod draft;
pub mod editor;
pub mod error;
pub mod generation;
pub mod meeting;
pub mod query;
pub mod store;
pub mod timestamp;

pub use error::{MeetbookError, MeetbookResult};
