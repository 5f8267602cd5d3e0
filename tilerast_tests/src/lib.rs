// Copyright 2026 the Tilerast Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Tilerast tests.
//!
//! [`SceneBuilder`] bins polygons into tiles and encodes them the way the
//! upstream stages would, and [`FixtureTapes`] writes the per-tile command
//! tapes, so whole frames can be rendered from simple geometry.

// LINEBENDER LINT SET - lib.rs - v2
// These lints aren't included in Cargo.toml because they
// shouldn't apply to examples and tests
#![warn(unused_crate_dependencies)]
#![warn(clippy::print_stdout, clippy::print_stderr)]
// Targeting e.g. 32-bit means structs containing usize can give false positives for 64-bit.
#![cfg_attr(target_pointer_width = "64", warn(clippy::trivially_copy_pass_by_ref))]
// END LINEBENDER LINT SET
#![cfg_attr(docsrs, feature(doc_auto_cfg))]
// The following lints are part of the Linebender standard set,
// but resolving them has been deferred for now.
#![allow(
    missing_debug_implementations,
    unreachable_pub,
    missing_docs,
    clippy::cast_possible_truncation,
    clippy::missing_assert_message,
    clippy::print_stderr,
    clippy::print_stdout,
    clippy::allow_attributes_without_reason
)]

use std::env;
use std::path::Path;

use anyhow::{anyhow, Result};
use tilerast::{CpuTexture, Renderer, RendererOptions};

mod geometry;
mod scene;
mod tapes;

pub use geometry::Point;
pub use scene::{rect, Fixture, SceneBuilder};
pub use tapes::FixtureTapes;

/// Enables `RUST_LOG` controlled logging for a test, once per process.
pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Renders `fixture` with a heap grown as needed, saving the result as
/// `{name}.png` when `TILERAST_DEBUG_DIR` is set.
pub fn render(name: &str, fixture: &Fixture, images: &[CpuTexture]) -> Result<CpuTexture> {
    init_logging();
    let renderer = Renderer::new(RendererOptions {
        heap_size: 0,
        ..Default::default()
    });
    let mut target = fixture.target();
    renderer.render_robust(&fixture.scene, &fixture.tapes, images, &mut target)?;
    dump_png(name, &target)?;
    Ok(target)
}

/// Writes `texture` to `$TILERAST_DEBUG_DIR/{name}.png`, if the variable is set.
pub fn dump_png(name: &str, texture: &CpuTexture) -> Result<()> {
    let Ok(dir) = env::var("TILERAST_DEBUG_DIR") else {
        return Ok(());
    };
    let dir = Path::new(&dir);
    std::fs::create_dir_all(dir)?;
    let image = image::RgbaImage::from_raw(
        texture.width as u32,
        texture.height as u32,
        texture.as_bytes().to_vec(),
    )
    .ok_or_else(|| anyhow!("texture of {}x{} is short", texture.width, texture.height))?;
    let path = dir.join(name).with_extension("png");
    image.save(&path)?;
    println!("Wrote debug image to {}", path.display());
    Ok(())
}

/// The bytes of a target pixel in `[r, g, b, a]` order.
pub fn rgba8(texture: &CpuTexture, x: usize, y: usize) -> [u8; 4] {
    texture.pixel(x, y).to_le_bytes()
}
