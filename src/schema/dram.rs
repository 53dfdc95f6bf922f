//! Decoding of the shared-DRAM layer table (§3, §6).
//!
//! Each layer occupies 12 consecutive `f32` slots at DRAM offset 0. Every
//! slot carries a 32-bit integer bit-reinterpreted into the float, never
//! transferred as an actual floating-point value — this is a wire-format
//! artifact of streaming layer metadata through the same DRAM channel as
//! activations and weights (§9).

use crate::error::{EngineError, Result};
use crate::schema::layer::{LayerDescriptor, Pool};

/// Number of `f32` slots one layer record occupies in the layer table.
pub const LAYER_TABLE_STRIDE: usize = 12;

/// Reinterpret an `f32` slot as the 32-bit integer it actually carries.
#[inline]
fn slot_as_u32(slot: f32) -> u32 {
    slot.to_bits()
}

/// Decode the `num_layers`-entry layer table at DRAM offset 0.
///
/// Returns one [`LayerDescriptor`] per layer, in ascending order. Every
/// layer is validated against the kernel/stride/pad contract (§7); a
/// violation is reported with the offending layer index rather than
/// aborting, so the caller can decide how to fail.
pub fn decode_layer_table(dram: &[f32], num_layers: u32) -> Result<Vec<LayerDescriptor>> {
    let num_layers = num_layers as usize;
    let needed = num_layers * LAYER_TABLE_STRIDE;
    if dram.len() < needed {
        return Err(EngineError::DramOutOfRange {
            needed,
            available: dram.len(),
        });
    }

    let mut layers = Vec::with_capacity(num_layers);
    for layer_idx in 0..num_layers {
        let rec = &dram[layer_idx * LAYER_TABLE_STRIDE..(layer_idx + 1) * LAYER_TABLE_STRIDE];

        let width = slot_as_u32(rec[0]) as usize;
        let height = slot_as_u32(rec[1]) as usize;
        let channels_in = slot_as_u32(rec[2]) as usize;
        let channels_out = slot_as_u32(rec[3]) as usize;
        let kernel = slot_as_u32(rec[4]);
        let stride = slot_as_u32(rec[5]);
        let pad = slot_as_u32(rec[6]);
        let mem_addr_input = slot_as_u32(rec[7]) as usize;
        let mem_addr_output = slot_as_u32(rec[8]) as usize;
        let mem_addr_weights = slot_as_u32(rec[9]) as usize;
        let is_expand_layer = slot_as_u32(rec[10]) != 0;
        let pool_flag = slot_as_u32(rec[11]);

        if kernel != 1 && kernel != 3 {
            return Err(EngineError::UnsupportedKernel {
                layer: layer_idx,
                kernel,
            });
        }
        if stride != 1 && stride != 2 {
            return Err(EngineError::UnsupportedStride {
                layer: layer_idx,
                stride,
            });
        }
        if pad != 0 && pad != 1 {
            return Err(EngineError::UnsupportedPad {
                layer: layer_idx,
                pad,
            });
        }
        if pool_flag != 0 && pool_flag != 1 {
            return Err(EngineError::MalformedPoolFlag {
                layer: layer_idx,
                flag: pool_flag,
            });
        }

        layers.push(LayerDescriptor {
            name: format!("L{layer_idx}"),
            width,
            height,
            channels_in,
            channels_out,
            kernel,
            pad,
            stride,
            mem_addr_input,
            mem_addr_output,
            mem_addr_weights,
            is_expand_layer,
            pool: Pool::from_flag(pool_flag),
        });
    }

    Ok(layers)
}

/// Encode a layer table into `out` (the inverse of [`decode_layer_table`]).
///
/// Exposed primarily for tests and tooling that build synthetic DRAM
/// buffers; the offline planner (§6) is the real-world producer and is
/// out of scope for this crate.
pub fn encode_layer_table(layers: &[LayerDescriptor]) -> Vec<f32> {
    let mut out = Vec::with_capacity(layers.len() * LAYER_TABLE_STRIDE);
    for layer in layers {
        let pool_flag: u32 = match layer.pool {
            Pool::Global => 1,
            Pool::None => 0,
        };
        let fields: [u32; LAYER_TABLE_STRIDE] = [
            layer.width as u32,
            layer.height as u32,
            layer.channels_in as u32,
            layer.channels_out as u32,
            layer.kernel,
            layer.stride,
            layer.pad,
            layer.mem_addr_input as u32,
            layer.mem_addr_output as u32,
            layer.mem_addr_weights as u32,
            layer.is_expand_layer as u32,
            pool_flag,
        ];
        for field in fields {
            out.push(f32::from_bits(field));
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::layer::Pool;

    fn sample_layer() -> LayerDescriptor {
        LayerDescriptor {
            name: "L0".into(),
            width: 4,
            height: 4,
            channels_in: 3,
            channels_out: 2,
            kernel: 3,
            pad: 1,
            stride: 1,
            mem_addr_input: 100,
            mem_addr_output: 200,
            mem_addr_weights: 300,
            is_expand_layer: false,
            pool: Pool::None,
        }
    }

    #[test]
    fn round_trips_through_encode_decode() {
        let layers = vec![sample_layer()];
        let encoded = encode_layer_table(&layers);
        let decoded = decode_layer_table(&encoded, 1).unwrap();

        assert_eq!(decoded.len(), 1);
        assert_eq!(decoded[0].width, 4);
        assert_eq!(decoded[0].height, 4);
        assert_eq!(decoded[0].channels_in, 3);
        assert_eq!(decoded[0].channels_out, 2);
        assert_eq!(decoded[0].kernel, 3);
        assert_eq!(decoded[0].pad, 1);
        assert_eq!(decoded[0].stride, 1);
        assert_eq!(decoded[0].mem_addr_input, 100);
        assert_eq!(decoded[0].mem_addr_output, 200);
        assert_eq!(decoded[0].mem_addr_weights, 300);
        assert!(!decoded[0].is_expand_layer);
        assert_eq!(decoded[0].pool, Pool::None);
    }

    #[test]
    fn rejects_short_dram_buffer() {
        let dram = vec![0.0f32; 5];
        let err = decode_layer_table(&dram, 1).unwrap_err();
        assert_eq!(
            err,
            EngineError::DramOutOfRange {
                needed: 12,
                available: 5
            }
        );
    }

    #[test]
    fn rejects_unsupported_kernel_size() {
        let mut layer = sample_layer();
        layer.kernel = 5;
        let encoded = encode_layer_table(&[layer]);
        let err = decode_layer_table(&encoded, 1).unwrap_err();
        assert_eq!(
            err,
            EngineError::UnsupportedKernel {
                layer: 0,
                kernel: 5
            }
        );
    }

    #[test]
    fn rejects_unsupported_stride() {
        let mut layer = sample_layer();
        layer.stride = 4;
        let encoded = encode_layer_table(&[layer]);
        let err = decode_layer_table(&encoded, 1).unwrap_err();
        assert_eq!(
            err,
            EngineError::UnsupportedStride {
                layer: 0,
                stride: 4
            }
        );
    }
}
