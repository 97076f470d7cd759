//! Remote pipeline service contract and its HTTP implementation.

mod client;

pub use client::{HttpPipelineApi, PipelineApi};
