//! Core type definitions used across the EventHub workspace.

pub mod id;

pub use id::*;
