//! Image Cache (IC) — §4.2.
//!
//! A rolling ring of `num_img_cache_lines` (3) rows of the current
//! layer's input feature map. A single write cursor advances
//! channel-by-channel and wraps at `line_width * num_img_cache_lines`;
//! reads are random-access by `(y, x, ci)` using row index `y mod
//! num_img_cache_lines`.

use crate::error::{EngineError, Result};
use crate::schema::LayerDescriptor;

pub struct ImageCache {
    bram: Vec<f32>,
    next_addr: usize,
    line_width: usize,
    loads_left: usize,
    width_in: usize,
    ch_in: usize,
    num_lines: usize,
}

impl ImageCache {
    pub fn new(capacity: usize, num_lines: usize) -> Self {
        Self {
            bram: vec![0.0; capacity],
            next_addr: 0,
            line_width: 0,
            loads_left: 0,
            width_in: 0,
            ch_in: 0,
            num_lines,
        }
    }

    /// Zero the write cursor (§4.2 `reset`). The underlying storage is
    /// not cleared — stale values from the previous layer are overwritten
    /// by the preload before they can be read, since `getPixel` is only
    /// ever called for rows already streamed in by the driver.
    pub fn reset(&mut self) {
        self.next_addr = 0;
    }

    /// Reconfigure for a new layer and reset the write cursor (§4.2
    /// `setLayerConfig`).
    pub fn set_layer_config(&mut self, layer: &LayerDescriptor) -> Result<()> {
        self.width_in = layer.width;
        self.ch_in = layer.channels_in;
        self.line_width = layer.width * layer.channels_in;
        self.loads_left = self.line_width * layer.height;

        let needed = self.line_width * self.num_lines;
        if needed > self.bram.len() {
            return Err(EngineError::ImageCacheOverflow {
                layer: 0,
                needed,
                capacity: self.bram.len(),
            });
        }
        self.reset();
        Ok(())
    }

    /// Write one value at the current cursor and advance, wrapping at
    /// `line_width * num_lines` (§4.2 `setNextChannel`).
    #[inline]
    fn set_next_channel(&mut self, v: f32) {
        self.bram[self.next_addr] = v;
        self.next_addr += 1;
        let wrap = self.line_width * self.num_lines;
        if self.next_addr >= wrap {
            self.next_addr = 0;
        }
    }

    /// Stream one pixel's `ch_in` channel values from the memory
    /// controller into the ring (§4.2 `preloadPixelFromDRAM`). Stops
    /// early once the whole image has been streamed — this is the
    /// expected, non-fatal end-of-image condition (§7).
    pub fn preload_pixel_from_dram(
        &mut self,
        dram: &[f32],
        mc: &mut super::memory_controller::MemoryController,
    ) {
        for _ in 0..self.ch_in {
            if self.loads_left == 0 {
                return;
            }
            let v = mc.load_next_channel(dram);
            self.set_next_channel(v);
            self.loads_left -= 1;
        }
    }

    /// Stream an entire row, `width_in` pixels at a time (§4.2
    /// `preloadRowFromDRAM`).
    pub fn preload_row_from_dram(
        &mut self,
        dram: &[f32],
        mc: &mut super::memory_controller::MemoryController,
    ) {
        for _ in 0..self.width_in {
            self.preload_pixel_from_dram(dram, mc);
        }
    }

    /// Random-access read of one channel of one resident pixel (§4.2
    /// `getPixel`). Asserts only on `x`: the caller (top driver) is
    /// responsible for never requesting a `y` whose row is not currently
    /// resident in the ring (§9).
    #[inline]
    pub fn get_pixel(&self, y: usize, x: usize, ci: usize) -> Result<f32> {
        if x >= self.width_in {
            return Err(EngineError::IllegalPixelAccess {
                x: x as i64,
                width_in: self.width_in,
            });
        }
        let row = y % self.num_lines;
        Ok(self.bram[row * self.width_in * self.ch_in + x * self.ch_in + ci])
    }
}
