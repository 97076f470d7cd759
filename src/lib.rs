//! vidtrack - client-side tracker for a remote video-processing pipeline
//!
//! A caller submits a media file once; the backend runs an ordered sequence
//! of processing stages out of the caller's control. This crate reconciles
//! the eventually-consistent view of that run by polling, derives per-stage
//! and per-job state from the raw snapshots, and exposes read-only views for
//! presentation. The server is the single source of truth; everything here
//! is a read-mostly cache with a derived display layer.

pub mod api;
pub mod config;
pub mod display;
pub mod error;
pub mod model;
pub mod poll;
pub mod submit;

pub use error::{Error, Result};
