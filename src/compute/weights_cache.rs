//! Weights Cache (WC) — §4.3.
//!
//! Holds all weights and biases for the currently executing layer,
//! laid out as: all filters for `ci=0` (all `co`), then `ci=1`, ...,
//! then the `channels_out` biases. A filter occupies
//! `weights_per_filter` (9 for a 3×3 kernel, 1 for 1×1) slots in
//! row-major order.

use crate::compute::memory_controller::MemoryController;
use crate::error::{EngineError, Result};
use crate::schema::LayerDescriptor;

pub struct WeightsCache {
    bram: Vec<f32>,
    write_addr: usize,
    kernel: u32,
    ch_in: usize,
    ch_out: usize,
    ci_offset: usize,
    weights_per_filter: usize,
}

impl WeightsCache {
    pub fn new(capacity: usize) -> Self {
        Self {
            bram: vec![0.0; capacity],
            write_addr: 0,
            kernel: 3,
            ch_in: 0,
            ch_out: 0,
            ci_offset: 0,
            weights_per_filter: 9,
        }
    }

    /// Reconfigure for a new layer (§4.3 `setLayerConfig`).
    pub fn set_layer_config(&mut self, layer: &LayerDescriptor) {
        self.kernel = layer.kernel;
        self.ch_in = layer.channels_in;
        self.ch_out = layer.channels_out;
        self.weights_per_filter = layer.weights_per_filter();
        self.write_addr = 0;
        self.ci_offset = 0;
    }

    #[inline]
    fn add_weight(&mut self, v: f32) {
        self.bram[self.write_addr] = v;
        self.write_addr += 1;
    }

    /// Pull this layer's weights then biases from DRAM via the memory
    /// controller, storing them sequentially (§4.3 `loadFromDRAM`).
    pub fn load_from_dram(&mut self, dram: &[f32], mc: &mut MemoryController) -> Result<()> {
        let total = self.ch_in * self.ch_out * self.weights_per_filter + self.ch_out;
        if total > self.bram.len() {
            return Err(EngineError::WeightsCacheOverflow {
                layer: 0,
                needed: total,
                capacity: self.bram.len(),
            });
        }
        for _ in 0..total {
            let v = mc.load_next_weight(dram);
            self.add_weight(v);
        }
        Ok(())
    }

    /// Select the filter segment for input channel `ci` (§4.3
    /// `setInputChannel`). Calling this with `ci = channels_in` points
    /// past all filters, at the bias segment, so biases are fetched with
    /// the same [`Self::get_one_weight`] accessor used for filter taps.
    #[inline]
    pub fn set_input_channel(&mut self, ci: usize) {
        self.ci_offset = ci * self.ch_out * self.weights_per_filter;
    }

    /// Fetch the 9 taps (row-major) of output channel `co`'s filter for
    /// the currently-selected input channel (§4.3 `getNineWeights`). A
    /// 1×1 filter is lifted into the same 3×3 datapath by placing its
    /// single scalar at the kernel centre and zeroing the rest.
    pub fn get_nine_weights(&self, co: usize, out: &mut [f32; 9]) {
        let addr = self.ci_offset + co * self.weights_per_filter;
        if self.kernel == 3 {
            out.copy_from_slice(&self.bram[addr..addr + 9]);
        } else {
            *out = [0.0; 9];
            out[4] = self.bram[addr];
        }
    }

    /// Fetch a single weight (used for bias lookup after
    /// `set_input_channel(channels_in)`) (§4.3 `getOneWeight`).
    #[inline]
    pub fn get_one_weight(&self, co: usize) -> f32 {
        self.bram[self.ci_offset + co]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::Pool;

    fn layer(kernel: u32, ch_in: usize, ch_out: usize) -> LayerDescriptor {
        LayerDescriptor {
            name: "L0".into(),
            width: 4,
            height: 4,
            channels_in: ch_in,
            channels_out: ch_out,
            kernel,
            pad: if kernel == 3 { 1 } else { 0 },
            stride: 1,
            mem_addr_input: 0,
            mem_addr_output: 100,
            mem_addr_weights: 0,
            is_expand_layer: false,
            pool: Pool::None,
        }
    }

    #[test]
    fn loads_filters_then_biases_in_order() {
        let l = layer(3, 2, 2);
        let mut wc = WeightsCache::new(64);
        wc.set_layer_config(&l);

        // 2 ci * 2 co * 9 weights + 2 biases = 38 values
        let dram: Vec<f32> = (0..38).map(|i| i as f32).collect();
        let mut mc = MemoryController::new(0, 0);
        mc.set_layer_config(&l);
        wc.load_from_dram(&dram, &mut mc).unwrap();

        wc.set_input_channel(0);
        let mut taps = [0.0f32; 9];
        wc.get_nine_weights(0, &mut taps);
        assert_eq!(taps, [0.0, 1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0]);

        wc.set_input_channel(1);
        wc.get_nine_weights(1, &mut taps);
        // ci=1 -> offset 18, co=1 -> +9 = 27
        assert_eq!(taps, [27.0, 28.0, 29.0, 30.0, 31.0, 32.0, 33.0, 34.0, 35.0]);

        wc.set_input_channel(2); // channels_in -> bias segment
        assert_eq!(wc.get_one_weight(0), 36.0);
        assert_eq!(wc.get_one_weight(1), 37.0);
    }

    #[test]
    fn one_by_one_kernel_lifts_scalar_to_centre() {
        let l = layer(1, 1, 1);
        let mut wc = WeightsCache::new(8);
        wc.set_layer_config(&l);

        let dram = vec![5.0f32, 9.0]; // 1 weight + 1 bias
        let mut mc = MemoryController::new(0, 0);
        mc.set_layer_config(&l);
        wc.load_from_dram(&dram, &mut mc).unwrap();

        wc.set_input_channel(0);
        let mut taps = [1.0f32; 9];
        wc.get_nine_weights(0, &mut taps);
        assert_eq!(taps, [0.0, 0.0, 0.0, 0.0, 5.0, 0.0, 0.0, 0.0, 0.0]);
    }

    #[test]
    fn reports_capacity_overflow() {
        let l = layer(3, 8, 8);
        let mut wc = WeightsCache::new(4);
        let mut mc = MemoryController::new(0, 0);
        mc.set_layer_config(&l);
        wc.set_layer_config(&l);
        let dram = vec![0.0f32; 1000];
        assert!(wc.load_from_dram(&dram, &mut mc).is_err());
    }
}
