// Copyright 2026 the Tilerast Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The Tilerast rasterization kernels and the table they are dispatched from.
//!
//! Two compute kernels make up the rasterization core:
//!
//! - `backdrop` turns the per-tile backdrop deltas written by the coarse stage
//!   into inclusive row prefix sums, seeding nonzero winding for every tile.
//! - `fine` interprets each tile's command tape and produces the final pixels,
//!   including a nested clip stack that spills to the shared heap.
//!
//! Both are implemented for the CPU in the [`cpu`] module, written to follow
//! the structure of a GPU workgroup: shared arrays, explicit barrier points and
//! one shared heap with a bump allocator and a failure flag.

// LINEBENDER LINT SET - lib.rs - v2
// These lints aren't included in Cargo.toml because they
// shouldn't apply to examples and tests
#![warn(unused_crate_dependencies)]
#![warn(clippy::print_stdout, clippy::print_stderr)]
// Targeting e.g. 32-bit means structs containing usize can give false positives for 64-bit.
#![cfg_attr(target_pointer_width = "64", warn(clippy::trivially_copy_pass_by_ref))]
// END LINEBENDER LINT SET
#![cfg_attr(docsrs, feature(doc_cfg))]
#![allow(missing_docs, reason = "We have many as-yet undocumented items.")]
#![allow(
    missing_debug_implementations,
    clippy::cast_possible_truncation,
    clippy::missing_assert_message,
    reason = "Deferred"
)]

pub mod cpu;

use cpu::CpuBinding;

/// Signature of a CPU kernel: workgroup count and bound resources.
pub type CpuShaderFn = fn(u32, &[CpuBinding<'_>]);

/// A kernel the renderer dispatches by name.
#[derive(Clone, Copy, Debug)]
pub struct ComputeShader {
    pub name: &'static str,
    pub cpu: CpuShaderFn,
}

pub struct Shaders {
    pub backdrop: ComputeShader,
    pub fine: ComputeShader,
}

pub const SHADERS: Shaders = Shaders {
    backdrop: ComputeShader {
        name: "backdrop",
        cpu: cpu::backdrop,
    },
    fine: ComputeShader {
        name: "fine",
        cpu: cpu::fine,
    },
};
