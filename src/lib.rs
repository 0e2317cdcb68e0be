// Core layer - shared types and configuration
pub mod core;

// Features layer - stateful and I/O building blocks
pub mod features;

// Application layer
pub mod commands;
pub mod events;

pub use core::Config;
