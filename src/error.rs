//! Engine-wide error type.
//!
//! The engine operates under a pre-validated contract (§7): malformed
//! layer tables, out-of-range DRAM offsets, and cache capacity overflows
//! are all fatal, non-recoverable conditions. Rather than aborting the
//! process directly, every fallible operation returns a `Result` so the
//! caller (CLI, test harness, embedder) decides how to surface the
//! failure — there are no retries either way.

use thiserror::Error;

/// Fatal, non-recoverable engine errors.
#[derive(Debug, Error, PartialEq)]
pub enum EngineError {
    #[error("layer table requires {needed} floats but DRAM only has {available}")]
    DramOutOfRange { needed: usize, available: usize },

    #[error(
        "layer {layer}: kernel size {kernel} is not supported (only 1x1 and 3x3 kernels exist)"
    )]
    UnsupportedKernel { layer: usize, kernel: u32 },

    #[error("layer {layer}: stride {stride} is not supported (only stride 1 and 2 exist)")]
    UnsupportedStride { layer: usize, stride: u32 },

    #[error("layer {layer}: pad {pad} is not supported (only pad 0 and 1 exist)")]
    UnsupportedPad { layer: usize, pad: u32 },

    #[error("layer {layer}: pool flag {flag} is not 0 (NONE) or 1 (GLOBAL)")]
    MalformedPoolFlag { layer: usize, flag: u32 },

    #[error(
        "layer {layer}: weights cache capacity {capacity} exceeded by {needed} required weights"
    )]
    WeightsCacheOverflow {
        layer: usize,
        needed: usize,
        capacity: usize,
    },

    #[error(
        "layer {layer}: image cache capacity {capacity} exceeded by {needed} required elements"
    )]
    ImageCacheOverflow {
        layer: usize,
        needed: usize,
        capacity: usize,
    },

    #[error("layer {layer}: channels_out {channels_out} exceeds output cache capacity {capacity}")]
    OutputCacheOverflow {
        layer: usize,
        channels_out: usize,
        capacity: usize,
    },

    #[error("illegal pixel access at x={x} (width_in={width_in})")]
    IllegalPixelAccess { x: i64, width_in: usize },

    #[error(
        "write-back of layer {layer} at pixel ({y_out},{x_out}) would write past the end of DRAM (offset {offset}, available {available})"
    )]
    WriteBackOutOfRange {
        layer: usize,
        y_out: usize,
        x_out: usize,
        offset: usize,
        available: usize,
    },

    #[error("engine config is invalid: {0}")]
    InvalidConfig(String),
}

pub type Result<T> = std::result::Result<T, EngineError>;
