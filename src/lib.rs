// Re-export all public modules so they can be used from main.rs
pub mod logging;
pub mod config;
pub mod error;

// MVC Architecture
pub mod model;
pub mod view;
pub mod controller;

pub mod transport;

#[cfg(target_arch = "wasm32")]
mod web;
