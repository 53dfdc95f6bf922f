//! Processing Element (PE) — §4.5.
//!
//! For one `(y, x, ci)` triple: loads the 3×3 neighbourhood from the
//! image cache, iterates all output channels, fetches 9 weights from the
//! weights cache per channel, performs the multiply-accumulate, and adds
//! the result into the output cache. The PE never resets the output
//! cache; the top driver does so once per output pixel, before the `ci`
//! loop (§4.6).

use crate::compute::image_cache::ImageCache;
use crate::compute::output_cache::OutputCache;
use crate::compute::weights_cache::WeightsCache;
use crate::error::Result;
use crate::schema::LayerDescriptor;

pub struct ProcessingElement {
    kernel: u32,
    ch_out: usize,
    width_in: usize,
    height_in: usize,
}

impl ProcessingElement {
    pub fn new() -> Self {
        Self {
            kernel: 3,
            ch_out: 0,
            width_in: 0,
            height_in: 0,
        }
    }

    /// Reconfigure for a new layer (§4.5 `setLayerConfig`).
    pub fn set_layer_config(&mut self, layer: &LayerDescriptor) {
        self.kernel = layer.kernel;
        self.ch_out = layer.channels_out;
        self.width_in = layer.width;
        self.height_in = layer.height;
    }

    /// Gather the 3×3 neighbourhood of `(y_center, x_center)` for input
    /// channel `ci`, zero-padding samples that fall outside the image
    /// (§4.5 `preloadPixels`). Correct for both 3×3 (pad=1) and 1×1
    /// kernels, since the weights cache supplies an all-zero filter for
    /// the eight non-centre taps in the 1×1 case.
    pub fn preload_pixels(
        &self,
        ic: &ImageCache,
        y_center: usize,
        x_center: usize,
        ci: usize,
        out: &mut [f32; 9],
    ) -> Result<()> {
        for k in 0..3i64 {
            for l in 0..3i64 {
                let y = y_center as i64 + k - 1;
                let x = x_center as i64 + l - 1;
                let idx = (k * 3 + l) as usize;

                if x < 0 || y < 0 || x >= self.width_in as i64 || y >= self.height_in as i64 {
                    out[idx] = 0.0;
                } else {
                    out[idx] = ic.get_pixel(y as usize, x as usize, ci)?;
                }
            }
        }
        Ok(())
    }

    /// Multiply-accumulate 9 pixel/weight taps (§4.5 `macc2d`).
    /// Sequential left-to-right accumulation, chosen for reproducibility
    /// (§4.5, §5) — any associative-equivalent order is numerically
    /// permissible but this crate fixes one so repeated runs agree
    /// bit-for-bit (§8 property 8).
    #[inline]
    pub fn macc2d(pixels: &[f32; 9], weights: &[f32; 9]) -> f32 {
        let mut sum = 0.0f32;
        for i in 0..9 {
            sum += pixels[i] * weights[i];
        }
        sum
    }

    /// Accumulate this input channel's contribution into every output
    /// channel's accumulator (§4.5 `processAllCHout`). When `parallel` is
    /// set (`EngineConfig::n_pe > 1`), output channels are processed
    /// concurrently — each owns a disjoint `OutputCache` slot, so no
    /// synchronization beyond the initial borrow split is required, and
    /// per-slot accumulation order across `ci` is unaffected since the
    /// `ci` loop itself (§4.6) stays strictly sequential.
    pub fn process_all_chout(
        &self,
        wc: &WeightsCache,
        oc: &mut OutputCache,
        pixels: &[f32; 9],
        parallel: bool,
    ) {
        if parallel {
            #[cfg(not(target_arch = "wasm32"))]
            {
                use rayon::prelude::*;
                let slots = oc.channels_mut(self.ch_out);
                slots.par_iter_mut().enumerate().for_each(|(co, slot)| {
                    let mut weights = [0.0f32; 9];
                    wc.get_nine_weights(co, &mut weights);
                    *slot += Self::macc2d(pixels, &weights);
                });
                return;
            }
        }

        let mut weights = [0.0f32; 9];
        for co in 0..self.ch_out {
            wc.get_nine_weights(co, &mut weights);
            let result = Self::macc2d(pixels, &weights);
            oc.accumulate_channel(co, result);
        }
    }

    /// Run one `(y, x, ci)` step end to end (§4.5 `processInputChannel`):
    /// select the input channel's filter segment, gather its 3×3
    /// neighbourhood, then accumulate into every output channel.
    #[allow(clippy::too_many_arguments)]
    pub fn process_input_channel(
        &self,
        ic: &ImageCache,
        wc: &mut WeightsCache,
        oc: &mut OutputCache,
        y: usize,
        x: usize,
        ci: usize,
        parallel: bool,
    ) -> Result<()> {
        wc.set_input_channel(ci);
        let mut pixels = [0.0f32; 9];
        self.preload_pixels(ic, y, x, ci, &mut pixels)?;
        self.process_all_chout(wc, oc, &pixels, parallel);
        Ok(())
    }
}

impl Default for ProcessingElement {
    fn default() -> Self {
        Self::new()
    }
}
