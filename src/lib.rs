#![doc = "The `taskflow` library crate."]
#![doc = ""]
#![doc = "Task management API with one-way Google Calendar synchronization: credential"]
#![doc = "handling, the identity middleware, the task and user stores, the calendar adapter,"]
#![doc = "the task/calendar synchronizer and the HTTP handlers. The binary (`main.rs`) wires"]
#![doc = "them together from `Config`."]

pub mod auth;
pub mod calendar;
pub mod config;
pub mod error;
pub mod models;
pub mod routes;
pub mod state;
pub mod store;
pub mod sync;

pub use error::AppError;
pub use state::AppState;
