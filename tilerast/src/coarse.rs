// Copyright 2026 the Tilerast Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use tilerast_encoding::ConfigUniform;
use tilerast_shaders::cpu::Memory;

/// The stage that writes the per-tile command tapes.
///
/// It runs after backdrop propagation, so the backdrops it reads from the
/// tiles are already row prefix sums. It may allocate from `memory` to chain
/// tapes longer than one initial allocation.
pub trait CoarseStage {
    fn write_tapes(&self, config: &ConfigUniform, memory: &Memory);
}

/// Tapes that were encoded with the scene and need no further work.
#[derive(Clone, Copy, Debug, Default)]
pub struct EncodedTapes;

impl CoarseStage for EncodedTapes {
    fn write_tapes(&self, _config: &ConfigUniform, _memory: &Memory) {}
}

impl<F: Fn(&ConfigUniform, &Memory)> CoarseStage for F {
    fn write_tapes(&self, config: &ConfigUniform, memory: &Memory) {
        self(config, memory);
    }
}
