//! Schema module — layer descriptors, DRAM layer-table decoding, and
//! engine tuning configuration.

mod config;
mod dram;
mod layer;

pub use config::EngineConfig;
pub use dram::{LAYER_TABLE_STRIDE, decode_layer_table, encode_layer_table};
pub use layer::{LayerDescriptor, Pool};
