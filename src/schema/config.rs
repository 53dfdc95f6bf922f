//! Engine tuning configuration.
//!
//! Cache capacities (image cache, weights cache, output cache) and ring
//! depth are supplied by the embedding application at construction time
//! rather than fixed as compile-time constants, so the engine can be
//! sized for a given network without a recompile.

use serde::{Deserialize, Serialize};

use crate::error::{EngineError, Result};

/// Number of rows of the current feature map kept resident in the image
/// cache ring (§3). Fixed at 3 by the 3×3-kernel contract; kept as a
/// config field (rather than a literal constant) so tests can exercise
/// the ring-wrap logic with a deliberately-mismatched value.
fn default_num_img_cache_lines() -> usize {
    3
}

/// Number of output-channel-parallel processing elements (§5, §9). `1`
/// reproduces the strictly-sequential reference behavior; values `> 1`
/// partition `co` by `co mod N_PE` across a rayon thread pool.
fn default_n_pe() -> usize {
    1
}

/// Engine sizing and parallelism tunables.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Largest `width * channels_in * num_img_cache_lines` any one layer
    /// requires of the image cache ring.
    pub max_image_cache_size: usize,
    /// Largest `channels_in * channels_out * weights_per_filter +
    /// channels_out` any one layer requires.
    pub max_weights_per_layer: usize,
    /// Largest `channels_out` across all layers.
    pub max_num_chout: usize,
    #[serde(default = "default_num_img_cache_lines")]
    pub num_img_cache_lines: usize,
    #[serde(default = "default_n_pe")]
    pub n_pe: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_image_cache_size: 224 * 96 * 3,
            max_weights_per_layer: 512 * 512 * 9 + 512,
            max_num_chout: 1000,
            num_img_cache_lines: default_num_img_cache_lines(),
            n_pe: default_n_pe(),
        }
    }
}

impl EngineConfig {
    /// Validate tunables before constructing the engine's caches.
    pub fn validate(&self) -> Result<()> {
        if self.max_image_cache_size == 0 {
            return Err(EngineError::InvalidConfig(
                "max_image_cache_size must be non-zero".into(),
            ));
        }
        if self.max_weights_per_layer == 0 {
            return Err(EngineError::InvalidConfig(
                "max_weights_per_layer must be non-zero".into(),
            ));
        }
        if self.max_num_chout == 0 {
            return Err(EngineError::InvalidConfig(
                "max_num_chout must be non-zero".into(),
            ));
        }
        if self.num_img_cache_lines < 3 {
            return Err(EngineError::InvalidConfig(
                "num_img_cache_lines must be at least 3 to hold a 3x3 window".into(),
            ));
        }
        if self.n_pe == 0 {
            return Err(EngineError::InvalidConfig("n_pe must be non-zero".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_validates() {
        assert!(EngineConfig::default().validate().is_ok());
    }

    #[test]
    fn rejects_zero_capacity() {
        let mut config = EngineConfig::default();
        config.max_weights_per_layer = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn rejects_too_few_cache_lines() {
        let mut config = EngineConfig::default();
        config.num_img_cache_lines = 2;
        assert!(config.validate().is_err());
    }
}
