//! Layer descriptor — an immutable-per-layer record decoded from the
//! shared-DRAM layer table (§3, §6).

/// Terminal pooling mode. Only the last layer may be `Global`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pool {
    None,
    Global,
}

impl Pool {
    #[inline]
    pub(crate) fn from_flag(flag: u32) -> Self {
        if flag == 1 { Pool::Global } else { Pool::None }
    }
}

/// One layer's configuration, as decoded from the DRAM layer table.
///
/// `name` and `kernel`/`stride`/`pad` are debug-only and validation-only
/// respectively; the hot loop never branches on `name`.
#[derive(Debug, Clone)]
pub struct LayerDescriptor {
    /// Debug-only identifier; not transferred from DRAM (§4.1).
    pub name: String,
    pub width: usize,
    pub height: usize,
    pub channels_in: usize,
    pub channels_out: usize,
    /// Kernel diameter: 1 or 3.
    pub kernel: u32,
    /// Zero-padding applied symmetrically around the input: 0 or 1.
    pub pad: u32,
    /// Output stride: 1 or 2.
    pub stride: u32,
    pub mem_addr_input: usize,
    pub mem_addr_output: usize,
    pub mem_addr_weights: usize,
    /// True for both branches of a fire module's expand pair (§4.1).
    pub is_expand_layer: bool,
    pub pool: Pool,
}

impl LayerDescriptor {
    /// Output spatial size for one dimension, given this layer's kernel/
    /// pad/stride (§3 invariants).
    #[inline]
    pub fn output_size(&self, input_size: usize) -> usize {
        let padded = input_size + 2 * self.pad as usize;
        (padded - self.kernel as usize) / self.stride as usize + 1
    }

    #[inline]
    pub fn width_out(&self) -> usize {
        self.output_size(self.width)
    }

    #[inline]
    pub fn height_out(&self) -> usize {
        self.output_size(self.height)
    }

    /// Number of (kernel==3 ? 9 : 1) weight slots per filter (§4.3).
    #[inline]
    pub fn weights_per_filter(&self) -> usize {
        if self.kernel == 3 { 9 } else { 1 }
    }

    /// Total weights + biases this layer occupies in the weights cache.
    #[inline]
    pub fn weights_footprint(&self) -> usize {
        self.channels_in * self.channels_out * self.weights_per_filter() + self.channels_out
    }

    /// DRAM write stride factor for `writeBackOutputPixel` (§4.1): the
    /// "expand" trick doubles the channel stride so a twin expand3x3
    /// layer can interleave its channels into the gaps.
    #[inline]
    pub fn stride_factor(&self) -> usize {
        if self.is_expand_layer { 2 } else { 1 }
    }
}
