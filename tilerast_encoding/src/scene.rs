// Copyright 2026 the Tilerast Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use crate::{ConfigUniform, Encoder};

/// Output of the upstream encoder and coarse stages for one frame.
///
/// `heap` holds the initial heap contents: annotated elements, paths,
/// tiles, tile segments and the initial command tape area. Dynamic
/// allocations start right after it.
#[derive(Clone, Debug, Default)]
pub struct EncodedScene {
    pub config: ConfigUniform,
    pub heap: Vec<u32>,
}

impl EncodedScene {
    pub fn new(config: ConfigUniform, heap: Vec<u32>) -> Self {
        Self { config, heap }
    }

    pub fn from_encoder(config: ConfigUniform, encoder: Encoder) -> Self {
        Self::new(config, encoder.into_words())
    }

    /// Size of the initial heap contents in bytes.
    pub fn heap_size_in_bytes(&self) -> u32 {
        (self.heap.len() * 4) as u32
    }

    /// Checks that every region named by the config lies within the initial
    /// heap and that the regions are disjoint.
    pub fn check_regions(&self) -> Result<(), &'static str> {
        let size = self.heap_size_in_bytes();
        let mut end = 0;
        for region in self.config.regions() {
            if region.offset < end {
                return Err("overlapping heap regions");
            }
            if region.end() > size {
                return Err("heap region beyond the encoded heap");
            }
            end = region.end();
        }
        Ok(())
    }
}
