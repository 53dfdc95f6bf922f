//! An all-convolutional, SqueezeNet-style CNN inference engine.
//!
//! Modeled on a streaming, fixed-function accelerator: a Memory
//! Controller streams weights and activations out of one shared DRAM
//! buffer, an Image Cache keeps a rolling 3-row window of the current
//! layer's input resident, a Weights Cache holds one layer's filters and
//! biases, a Processing Element performs the 3×3 multiply-accumulate, and
//! an Output Cache accumulates each pixel's output channels before
//! write-back. The top driver (`compute::run`) wires these together in
//! the same nested layer → y → x → ci loop the accelerator's control path
//! follows.
//!
//! # Architecture
//!
//! - `schema`: layer descriptors, DRAM layer-table decoding, and engine
//!   sizing configuration
//! - `compute`: the five hardware-modeled units and the top driver
//!
//! # Example
//!
//! ```rust,no_run
//! use squeezenet_engine::{compute, schema::EngineConfig};
//!
//! // `dram` holds the layer table, weights, and input activations,
//! // already laid out by an offline planner.
//! let mut dram: Vec<f32> = vec![0.0; 1 << 20];
//! let num_layers = 8;
//! let weights_offset = 12 * num_layers; // past the layer table
//! let input_offset = 0;
//!
//! compute::run(&mut dram, num_layers as u32, weights_offset as u32, input_offset as u32)
//!     .expect("network execution failed");
//! ```

pub mod compute;
pub mod error;
pub mod schema;

pub use compute::{run, run_with_config, Engine};
pub use error::{EngineError, Result};
pub use schema::{EngineConfig, LayerDescriptor, Pool};
