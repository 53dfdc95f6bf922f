//! Compute module — the five hardware-modeled units and the top driver
//! that wires them together (§4).

mod driver;
mod image_cache;
mod memory_controller;
mod output_cache;
mod processing_element;
mod weights_cache;

pub use driver::{Engine, run, run_with_config};
pub use image_cache::ImageCache;
pub use memory_controller::MemoryController;
pub use output_cache::OutputCache;
pub use processing_element::ProcessingElement;
pub use weights_cache::WeightsCache;
