//! Confluent Cloud adapter for the platform port.

pub mod client;
pub mod models;

pub use client::ConfluentClient;
