//! Top driver — §4.6.
//!
//! The four nested loops (layer → y → x → ci) plus per-pixel
//! post-processing (bias + ReLU, optional global accumulate, write-back).
//! This is the crate's single public entry point (§6).

use log::{debug, trace};

use crate::compute::image_cache::ImageCache;
use crate::compute::memory_controller::MemoryController;
use crate::compute::output_cache::OutputCache;
use crate::compute::processing_element::ProcessingElement;
use crate::compute::weights_cache::WeightsCache;
use crate::error::{EngineError, Result};
use crate::schema::{EngineConfig, LayerDescriptor, Pool};

/// Bundles the four caches and the memory controller for one engine run.
/// All caches live for the lifetime of one `run()` invocation; each layer
/// reconfigures them in place — no per-layer allocation (§3 "Lifecycle").
pub struct Engine {
    config: EngineConfig,
    mc: MemoryController,
    ic: ImageCache,
    wc: WeightsCache,
    oc: OutputCache,
    global_pool_oc: OutputCache,
    pe: ProcessingElement,
}

impl Engine {
    pub fn new(config: EngineConfig, weights_base: usize, data_base: usize) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            mc: MemoryController::new(weights_base, data_base),
            ic: ImageCache::new(config.max_image_cache_size, config.num_img_cache_lines),
            wc: WeightsCache::new(config.max_weights_per_layer),
            oc: OutputCache::new(config.max_num_chout),
            global_pool_oc: OutputCache::new(config.max_num_chout),
            pe: ProcessingElement::new(),
            config,
        })
    }

    /// Run one layer end to end, following the five steps of §4.6.
    fn run_layer(&mut self, layer_idx: usize, layer: &LayerDescriptor, dram: &mut [f32]) -> Result<()> {
        debug!(
            "layer {layer_idx} ({}): {}x{}x{} -> {} channels, kernel={}, stride={}",
            layer.name, layer.width, layer.height, layer.channels_in, layer.channels_out, layer.kernel, layer.stride
        );

        // 1. Configure IC/WC/MC/PE with this layer.
        self.mc.set_layer_config(layer);
        self.ic.set_layer_config(layer).map_err(|e| match e {
            EngineError::ImageCacheOverflow { needed, capacity, .. } => {
                EngineError::ImageCacheOverflow { layer: layer_idx, needed, capacity }
            }
            other => other,
        })?;
        self.wc.set_layer_config(layer);
        self.pe.set_layer_config(layer);

        if layer.channels_out > self.oc.capacity() {
            return Err(EngineError::OutputCacheOverflow {
                layer: layer_idx,
                channels_out: layer.channels_out,
                capacity: self.oc.capacity(),
            });
        }

        // 2. WC.loadFromDRAM(MC).
        self.wc
            .load_from_dram(dram, &mut self.mc)
            .map_err(|e| match e {
                EngineError::WeightsCacheOverflow { needed, capacity, .. } => {
                    EngineError::WeightsCacheOverflow { layer: layer_idx, needed, capacity }
                }
                other => other,
            })?;

        // 3. Preload row 0 and the first pixel of row 1.
        self.mc.set_pixel_load_row(0);
        self.ic.preload_row_from_dram(dram, &mut self.mc);
        if layer.height > 1 {
            self.mc.set_pixel_load_row(1);
            self.ic.preload_pixel_from_dram(dram, &mut self.mc);
        }

        let parallel = self.config.n_pe > 1;
        let stride_two = layer.stride == 2;

        for y in 0..layer.height {
            for x in 0..layer.width {
                // a. Reset the output accumulator for this pixel.
                self.oc.reset();

                // b. Stream the look-ahead pixel for the 3x3 window two
                // iterations hence. IC's own `loads_left` guard stops
                // once the whole image has been streamed.
                self.ic.preload_pixel_from_dram(dram, &mut self.mc);

                // c. Stride-2 skip: odd (x, y) produce no output. The
                // distilled source used bitwise `&` here; this crate
                // uses logical `||`, the intended reading (§9).
                if stride_two && (x % 2 == 1 || y % 2 == 1) {
                    continue;
                }

                // d. Accumulate every input channel's contribution.
                for ci in 0..layer.channels_in {
                    self.pe.process_input_channel(
                        &self.ic, &mut self.wc, &mut self.oc, y, x, ci, parallel,
                    )?;
                }

                // e. Post-process: bias + ReLU, optional global accumulate.
                self.wc.set_input_channel(layer.channels_in);
                for co in 0..layer.channels_out {
                    let raw = self.oc.get_channel(co);
                    let biased = raw + self.wc.get_one_weight(co);
                    let rectified = biased.max(0.0);
                    self.oc.set_channel(co, rectified);
                    if layer.pool == Pool::Global {
                        self.global_pool_oc.accumulate_channel(co, rectified);
                    }
                }

                // f. Write back this output pixel.
                let y_out = if stride_two { y / 2 } else { y };
                let x_out = if stride_two { x / 2 } else { x };
                trace!("  pixel ({y},{x}) -> out ({y_out},{x_out})");
                self.mc
                    .write_back_output_pixel(dram, y_out, x_out, self.oc.channels_mut(layer.channels_out))
                    .map_err(|e| match e {
                        EngineError::WriteBackOutOfRange { y_out, x_out, offset, available, .. } => {
                            EngineError::WriteBackOutOfRange { layer: layer_idx, y_out, x_out, offset, available }
                        }
                        other => other,
                    })?;
            }
        }

        Ok(())
    }

    /// Run the whole network, writing the terminal global-pooled result
    /// at the end (§4.6 step 5, §6).
    pub fn run(&mut self, dram: &mut [f32], num_layers: u32) -> Result<()> {
        self.global_pool_oc.reset();

        let layers = MemoryController::load_config(dram, num_layers)?;
        let mut last_layer_idx = None;

        for (layer_idx, layer) in layers.iter().enumerate() {
            self.run_layer(layer_idx, layer, dram)?;
            last_layer_idx = Some(layer_idx);
        }

        if let Some(last) = last_layer_idx {
            let last_layer = &layers[last];
            self.mc.set_layer_config(last_layer);
            self.mc
                .write_back_result(dram, self.global_pool_oc.channels_mut(last_layer.channels_out))?;
        }

        Ok(())
    }
}

/// Run the full network described by the layer table at DRAM offset 0
/// (§6 entry point).
///
/// `shared_dram` is externally owned; the caller passes exclusive access
/// for the duration of the call (§5). `weights_offset`/`input_offset`
/// locate the `DRAM_WEIGHTS`/`DRAM_DATA` base pointers (§3); the final
/// tensor is written at `shared_dram[input_offset..input_offset +
/// channels_out_of_last_layer)`.
pub fn run(
    shared_dram: &mut [f32],
    num_layers: u32,
    weights_offset: u32,
    input_offset: u32,
) -> Result<()> {
    run_with_config(
        shared_dram,
        num_layers,
        weights_offset,
        input_offset,
        EngineConfig::default(),
    )
}

/// Same as [`run`], but with an explicit [`EngineConfig`] instead of the
/// default cache sizing.
pub fn run_with_config(
    shared_dram: &mut [f32],
    num_layers: u32,
    weights_offset: u32,
    input_offset: u32,
    config: EngineConfig,
) -> Result<()> {
    let mut engine = Engine::new(config, weights_offset as usize, input_offset as usize)?;
    engine.run(shared_dram, num_layers)
}
