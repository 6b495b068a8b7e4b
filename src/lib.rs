//! SoleMate Core Library
//!
//! Multi-provider AI shoe identification engine.
//! Photographs come in from the capture UI; this crate preprocesses them,
//! fans the request out to several AI vision backends concurrently,
//! arbitrates the answers into a single enriched identification, and
//! exposes the observable scan state the screens render.

pub mod core;

pub use crate::core::{CoreError, CoreResult};
