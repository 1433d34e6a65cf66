pub mod engine;
pub mod error;
pub mod handlers;
pub mod message;
pub mod models;
pub mod rules;
