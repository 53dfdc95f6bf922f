//! Memory Controller (MC) — §4.1.
//!
//! Addresses the shared DRAM buffer for weights, input pixels, and output
//! pixels of the currently executing layer. All access is by index into
//! the caller-owned `&mut [f32]`; the controller performs no internal
//! allocation and holds no aliasing cursors by construction of the
//! offline planner (§9).
//!
//! Two base pointers are derived once per engine run (§3): `DRAM_WEIGHTS
//! = base + weights_offset` and `DRAM_DATA = base + input_offset`. Every
//! layer's `mem_addr_weights`/`mem_addr_input`/`mem_addr_output` is an
//! offset relative to these bases, not an absolute DRAM index.

use crate::error::{EngineError, Result};
use crate::schema::{LayerDescriptor, decode_layer_table};

/// Streaming, offset-bookkeeping memory controller over one shared DRAM
/// region (§4.1).
pub struct MemoryController {
    /// `DRAM_WEIGHTS` base (§3).
    weights_base: usize,
    /// `DRAM_DATA` base (§3).
    data_base: usize,
    dram_weights_offset: usize,
    dram_input_offset: usize,
    dram_output_offset: usize,
    dram_pixel_offset: usize,
    pixels_per_row: usize,
    ch_out: usize,
    width_out: usize,
    is_expand_layer: bool,
    /// Running cursor into the weights region; advances on every
    /// `loadNextWeight` call.
    weights_cursor: usize,
    /// Running cursor into the input activations region; advances on
    /// every `loadNextChannel` call.
    channel_cursor: usize,
}

impl MemoryController {
    pub fn new(weights_base: usize, data_base: usize) -> Self {
        Self {
            weights_base,
            data_base,
            dram_weights_offset: 0,
            dram_input_offset: 0,
            dram_output_offset: 0,
            dram_pixel_offset: 0,
            pixels_per_row: 0,
            ch_out: 0,
            width_out: 0,
            is_expand_layer: false,
            weights_cursor: 0,
            channel_cursor: 0,
        }
    }

    /// Decode the layer table at DRAM offset 0 (§4.1 `loadConfig`).
    pub fn load_config(dram: &[f32], num_layers: u32) -> Result<Vec<LayerDescriptor>> {
        decode_layer_table(dram, num_layers)
    }

    /// Reconfigure the controller for a new layer (§4.1 `setLayerConfig`).
    pub fn set_layer_config(&mut self, layer: &LayerDescriptor) {
        self.dram_weights_offset = self.weights_base + layer.mem_addr_weights;
        self.dram_input_offset = self.data_base + layer.mem_addr_input;
        self.dram_output_offset = self.data_base + layer.mem_addr_output;
        self.pixels_per_row = layer.width * layer.channels_in;
        self.ch_out = layer.channels_out;
        self.width_out = layer.width_out();
        self.is_expand_layer = layer.is_expand_layer;
        self.weights_cursor = self.dram_weights_offset;
    }

    /// Pull the next weight/bias value from DRAM (§4.1
    /// `loadNextWeight`). No bounds check: the caller (weights cache)
    /// bounds the loop by the layer's known weight footprint.
    #[inline]
    pub fn load_next_weight(&mut self, dram: &[f32]) -> f32 {
        let v = dram[self.weights_cursor];
        self.weights_cursor += 1;
        v
    }

    /// Position the pixel-load cursor at the start of row `y` of the
    /// current layer's input (§4.1 `setPixelLoadRow`).
    #[inline]
    pub fn set_pixel_load_row(&mut self, y: usize) {
        self.dram_pixel_offset = self.dram_input_offset + self.pixels_per_row * y;
        self.channel_cursor = self.dram_pixel_offset;
    }

    /// Pull the next input activation value from DRAM (§4.1
    /// `loadNextChannel`), feeding the image cache sequentially.
    #[inline]
    pub fn load_next_channel(&mut self, dram: &[f32]) -> f32 {
        let v = dram[self.channel_cursor];
        self.channel_cursor += 1;
        v
    }

    /// Write back one output pixel's `ch_out` channel values (§4.1
    /// `writeBackOutputPixel`). The expand-layer stride factor doubles
    /// the channel stride so a twin expand3x3 layer can interleave its
    /// own channels into the gaps (§4.1, "the expand trick").
    pub fn write_back_output_pixel(
        &self,
        dram: &mut [f32],
        y_out: usize,
        x_out: usize,
        oc: &[f32],
    ) -> Result<()> {
        let stride_factor = if self.is_expand_layer { 2 } else { 1 };
        let base = self.dram_output_offset
            + stride_factor * self.ch_out * (self.width_out * y_out + x_out);

        let end = base + self.ch_out;
        if end > dram.len() {
            return Err(EngineError::WriteBackOutOfRange {
                layer: 0,
                y_out,
                x_out,
                offset: base,
                available: dram.len(),
            });
        }
        dram[base..end].copy_from_slice(&oc[..self.ch_out]);
        Ok(())
    }

    /// Write the final global-pooled result into `DRAM_DATA[0..ch_out)`
    /// (§4.1 `writeBackResult`).
    pub fn write_back_result(&self, dram: &mut [f32], global_pool_oc: &[f32]) -> Result<()> {
        let end = self.data_base + self.ch_out;
        if end > dram.len() {
            return Err(EngineError::WriteBackOutOfRange {
                layer: 0,
                y_out: 0,
                x_out: 0,
                offset: self.data_base,
                available: dram.len(),
            });
        }
        dram[self.data_base..end].copy_from_slice(&global_pool_oc[..self.ch_out]);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::Pool;

    fn layer() -> LayerDescriptor {
        LayerDescriptor {
            name: "L0".into(),
            width: 2,
            height: 2,
            channels_in: 1,
            channels_out: 1,
            kernel: 1,
            pad: 0,
            stride: 1,
            mem_addr_input: 0,
            mem_addr_output: 10,
            mem_addr_weights: 20,
            is_expand_layer: false,
            pool: Pool::None,
        }
    }

    #[test]
    fn streams_weights_sequentially() {
        let mut mc = MemoryController::new(0, 0);
        let l = layer();
        mc.set_layer_config(&l);
        let mut dram = vec![0.0f32; 30];
        dram[20] = 1.0;
        dram[21] = 2.0;
        assert_eq!(mc.load_next_weight(&dram), 1.0);
        assert_eq!(mc.load_next_weight(&dram), 2.0);
    }

    #[test]
    fn pixel_rows_address_sequential_channels() {
        let mut mc = MemoryController::new(0, 0);
        let mut l = layer();
        l.channels_in = 2;
        mc.set_layer_config(&l);
        let mut dram = vec![0.0f32; 30];
        dram[0] = 1.0;
        dram[1] = 2.0;
        dram[2] = 3.0;
        dram[3] = 4.0;

        mc.set_pixel_load_row(0);
        assert_eq!(mc.load_next_channel(&dram), 1.0);
        assert_eq!(mc.load_next_channel(&dram), 2.0);

        mc.set_pixel_load_row(1);
        assert_eq!(mc.load_next_channel(&dram), 3.0);
        assert_eq!(mc.load_next_channel(&dram), 4.0);
    }

    #[test]
    fn write_back_applies_expand_stride_factor() {
        let mut mc = MemoryController::new(0, 0);
        let mut l = layer();
        l.is_expand_layer = true;
        l.channels_out = 2;
        mc.set_layer_config(&l);

        let mut dram = vec![0.0f32; 30];
        mc.write_back_output_pixel(&mut dram, 0, 1, &[7.0, 8.0])
            .unwrap();

        // width_out=2, ch_out=2, stride_factor=2: base = 10 + 2*2*(2*0+1) = 18
        assert_eq!(dram[18], 7.0);
        assert_eq!(dram[19], 8.0);
    }

    #[test]
    fn write_back_rejects_out_of_range() {
        let mut mc = MemoryController::new(0, 0);
        let l = layer();
        mc.set_layer_config(&l);
        let mut dram = vec![0.0f32; 5];
        assert!(
            mc.write_back_output_pixel(&mut dram, 10, 10, &[1.0])
                .is_err()
        );
    }

    #[test]
    fn respects_weights_and_data_bases() {
        let mut mc = MemoryController::new(100, 50);
        let l = layer();
        mc.set_layer_config(&l);

        let mut dram = vec![0.0f32; 200];
        dram[120] = 3.0; // weights_base(100) + mem_addr_weights(20)
        assert_eq!(mc.load_next_weight(&dram), 3.0);

        dram[50] = 9.0; // data_base(50) + mem_addr_input(0)
        mc.set_pixel_load_row(0);
        assert_eq!(mc.load_next_channel(&dram), 9.0);

        mc.write_back_result(&mut dram, &[42.0]).unwrap();
        assert_eq!(dram[50], 42.0); // data_base(50) + 0
    }
}
