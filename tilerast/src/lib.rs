// Copyright 2026 the Tilerast Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Tilerast renders encoded vector scenes into raster images, one 32×32 tile
//! at a time.
//!
//! A frame is a fixed pipeline of compute dispatches over one shared heap:
//!
//! 1. The encoded scene (annotated elements, paths, tiles with their segment
//!    lists) is copied into a fresh heap.
//! 2. `backdrop` turns the per-tile backdrop deltas into row prefix sums.
//! 3. A [`CoarseStage`] writes one command tape per tile.
//! 4. `fine` runs every tape and writes the target texture.
//!
//! The heap is fixed in size for the frame. When a dispatch runs out of it,
//! [`Renderer::render`] reports [`Error::HeapExhausted`] and the frame must be
//! rendered again with a larger heap, which [`Renderer::render_robust`] does.
//!
//! ```ignore
//! let renderer = Renderer::new(RendererOptions::default());
//! let mut target = CpuTexture::new(width, height);
//! renderer.render_robust(&scene, &EncodedTapes, &images, &mut target)?;
//! ```

// LINEBENDER LINT SET - lib.rs - v2
// These lints aren't included in Cargo.toml because they
// shouldn't apply to examples and tests
#![warn(unused_crate_dependencies)]
#![warn(clippy::print_stdout, clippy::print_stderr)]
// Targeting e.g. 32-bit means structs containing usize can give false positives for 64-bit.
#![cfg_attr(target_pointer_width = "64", warn(clippy::trivially_copy_pass_by_ref))]
// END LINEBENDER LINT SET
#![cfg_attr(docsrs, feature(doc_auto_cfg))]
#![allow(missing_docs, reason = "We have many as-yet undocumented items.")]
#![allow(
    missing_debug_implementations,
    clippy::cast_possible_truncation,
    clippy::missing_assert_message,
    reason = "Deferred"
)]

mod coarse;

use std::cell::RefCell;

use tilerast_encoding::{Annotated, Path, WorkgroupCounts, PTCL_INITIAL_ALLOC};
use tilerast_shaders::cpu::CpuBinding;
use tilerast_shaders::{ComputeShader, SHADERS};

pub use coarse::{CoarseStage, EncodedTapes};
pub use tilerast_encoding::{ConfigUniform, EncodedScene};
pub use tilerast_shaders::cpu::{CpuTexture, Memory};

/// Errors that can occur in Tilerast.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// A dispatch ran out of heap.
    ///
    /// `requested` is how far the bump allocator got, including the failed
    /// requests, so a heap of that size may be enough for a retry.
    #[error("Heap exhausted: {requested} bytes requested of {capacity}")]
    HeapExhausted { requested: u32, capacity: u32 },
    /// The target texture does not cover the tile grid of the scene.
    #[error("Target is {actual:?} pixels but the scene needs {expected:?}")]
    TargetSizeMismatch {
        expected: (usize, usize),
        actual: (usize, usize),
    },
    /// The encoded scene is inconsistent.
    #[error("Invalid scene: {0}")]
    InvalidScene(&'static str),
}

pub(crate) type Result<T, E = Error> = std::result::Result<T, E>;

/// Options which are set at renderer creation time, used in [`Renderer::new`].
#[derive(Clone, Debug)]
pub struct RendererOptions {
    /// Heap size in bytes for [`Renderer::render`], and the first attempt of
    /// [`Renderer::render_robust`].
    ///
    /// The heap is never smaller than the encoded scene.
    pub heap_size: u32,

    /// The largest heap [`Renderer::render_robust`] will try.
    pub max_heap_size: u32,
}

impl Default for RendererOptions {
    fn default() -> Self {
        Self {
            heap_size: 1 << 22,
            max_heap_size: 1 << 28,
        }
    }
}

/// Renders encoded scenes into textures.
pub struct Renderer {
    options: RendererOptions,
    #[cfg(feature = "background")]
    background: Option<CpuTexture>,
}

static_assertions::assert_impl_all!(Renderer: Send);

impl Renderer {
    /// Creates a new renderer.
    ///
    /// With the `multithreading` feature, workgroups run on the global rayon
    /// thread pool.
    pub fn new(options: RendererOptions) -> Self {
        Self {
            options,
            #[cfg(feature = "background")]
            background: None,
        }
    }

    /// Sets the texture frames are composited over before they are stored.
    #[cfg(feature = "background")]
    pub fn set_background(&mut self, background: Option<CpuTexture>) {
        self.background = background;
    }

    /// Renders `scene` into `target` with a heap of the configured size.
    ///
    /// On [`Error::HeapExhausted`], tiles that were being rasterized when the
    /// heap ran out keep stale contents, and the frame should be rendered
    /// again with a larger heap.
    pub fn render(
        &self,
        scene: &EncodedScene,
        coarse: &dyn CoarseStage,
        images: &[CpuTexture],
        target: &mut CpuTexture,
    ) -> Result<()> {
        self.render_with_heap(scene, coarse, images, target, self.options.heap_size)
    }

    /// Renders `scene` into `target`, growing the heap until the frame fits.
    ///
    /// Each attempt starts from the encoded scene; nothing of a failed
    /// attempt carries over except the heap size it needed.
    pub fn render_robust(
        &self,
        scene: &EncodedScene,
        coarse: &dyn CoarseStage,
        images: &[CpuTexture],
        target: &mut CpuTexture,
    ) -> Result<()> {
        let max = self.options.max_heap_size;
        let mut heap_size = self.options.heap_size;
        loop {
            match self.render_with_heap(scene, coarse, images, target, heap_size) {
                Err(Error::HeapExhausted {
                    requested,
                    capacity,
                }) if capacity < max => {
                    heap_size = capacity.saturating_mul(2).max(requested).min(max);
                    log::warn!(
                        "Heap exhausted with {capacity} bytes ({requested} requested), \
                         retrying with {heap_size}"
                    );
                }
                result => return result,
            }
        }
    }

    fn render_with_heap(
        &self,
        scene: &EncodedScene,
        coarse: &dyn CoarseStage,
        images: &[CpuTexture],
        target: &mut CpuTexture,
        heap_size: u32,
    ) -> Result<()> {
        validate(scene, target)?;
        let config = scene.config;
        let memory = Memory::with_contents(&scene.heap, heap_size);
        log::debug!(
            "Rendering {}x{} tiles, heap {} of {} bytes in use",
            config.width_in_tiles,
            config.height_in_tiles,
            memory.requested(),
            memory.capacity()
        );
        let wg_counts = WorkgroupCounts::new(&config);
        let config_buf = bytemuck::bytes_of(&config);

        dispatch(
            &SHADERS.backdrop,
            wg_counts.backdrop,
            &[CpuBinding::Buffer(config_buf), CpuBinding::Memory(&memory)],
        );
        check_heap(&memory)?;

        coarse.write_tapes(&config, &memory);
        check_heap(&memory)?;

        let output = RefCell::new(std::mem::take(target));
        #[cfg_attr(
            not(feature = "background"),
            expect(unused_mut, reason = "background is bound conditionally")
        )]
        let mut resources = vec![
            CpuBinding::Buffer(config_buf),
            CpuBinding::Memory(&memory),
            CpuBinding::Textures(images),
            CpuBinding::TextureRW(&output),
        ];
        #[cfg(feature = "background")]
        if let Some(background) = &self.background {
            resources.push(CpuBinding::Texture(background));
        }
        dispatch(
            &SHADERS.fine,
            wg_counts.fine.0 * wg_counts.fine.1,
            &resources,
        );
        drop(resources);
        *target = output.into_inner();
        check_heap(&memory)?;
        log::debug!("Frame done, heap high-water mark {} bytes", memory.requested());
        Ok(())
    }
}

fn dispatch(shader: &ComputeShader, n_wg: u32, resources: &[CpuBinding<'_>]) {
    log::trace!("Dispatching {} with {n_wg} workgroups", shader.name);
    (shader.cpu)(n_wg, resources);
}

fn validate(scene: &EncodedScene, target: &CpuTexture) -> Result<()> {
    let config = &scene.config;
    let expected = (config.width_px() as usize, config.height_px() as usize);
    let actual = (target.width, target.height);
    if expected != actual {
        return Err(Error::TargetSizeMismatch { expected, actual });
    }
    scene.check_regions().map_err(Error::InvalidScene)?;
    let n_elements = u64::from(config.n_elements);
    if u64::from(config.anno_alloc.size) < n_elements * u64::from(Annotated::SIZE) {
        return Err(Error::InvalidScene(
            "annotated region smaller than the element count",
        ));
    }
    if u64::from(config.tile_alloc.size) < n_elements * u64::from(Path::SIZE) {
        return Err(Error::InvalidScene("tile region too small for one path per element"));
    }
    if u64::from(config.ptcl_alloc.size) < u64::from(config.n_tiles()) * u64::from(PTCL_INITIAL_ALLOC)
    {
        return Err(Error::InvalidScene(
            "command tape region smaller than one initial allocation per tile",
        ));
    }
    Ok(())
}

fn check_heap(memory: &Memory) -> Result<()> {
    if memory.mem_ok() {
        Ok(())
    } else {
        Err(Error::HeapExhausted {
            requested: memory.requested(),
            capacity: memory.capacity(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tilerast_encoding::Alloc;

    fn empty_scene(width_in_tiles: u32, height_in_tiles: u32) -> EncodedScene {
        let n_tiles = width_in_tiles * height_in_tiles;
        let config = ConfigUniform {
            n_elements: 0,
            width_in_tiles,
            height_in_tiles,
            anno_alloc: Alloc::new(4, 0),
            tile_alloc: Alloc::new(4, 0),
            ptcl_alloc: Alloc::new(4, n_tiles * PTCL_INITIAL_ALLOC),
        };
        EncodedScene::new(
            config,
            vec![0; 1 + (n_tiles * PTCL_INITIAL_ALLOC / 4) as usize],
        )
    }

    #[test]
    fn empty_scene_is_transparent() {
        let renderer = Renderer::new(RendererOptions::default());
        let mut target = CpuTexture::from_pixels(64, 32, vec![9; 64 * 32]);
        renderer
            .render(&empty_scene(2, 1), &EncodedTapes, &[], &mut target)
            .unwrap();
        assert!(target.pixels.iter().all(|&p| p == 0));
    }

    #[cfg(feature = "background")]
    #[test]
    fn empty_scene_shows_background() {
        let mut renderer = Renderer::new(RendererOptions::default());
        renderer.set_background(Some(CpuTexture::from_pixels(
            32,
            32,
            vec![0xffff_0000; 32 * 32],
        )));
        let mut target = CpuTexture::new(32, 32);
        renderer
            .render(&empty_scene(1, 1), &EncodedTapes, &[], &mut target)
            .unwrap();
        assert!(target.pixels.iter().all(|&p| p == 0xffff_0000));
    }

    #[test]
    fn rejects_target_of_wrong_size() {
        let renderer = Renderer::new(RendererOptions::default());
        let mut target = CpuTexture::new(32, 32);
        let err = renderer
            .render(&empty_scene(2, 1), &EncodedTapes, &[], &mut target)
            .unwrap_err();
        assert!(matches!(
            err,
            Error::TargetSizeMismatch {
                expected: (64, 32),
                actual: (32, 32)
            }
        ));
    }

    #[test]
    fn rejects_short_tape_region() {
        let renderer = Renderer::new(RendererOptions::default());
        let mut scene = empty_scene(2, 1);
        scene.config.ptcl_alloc.size = PTCL_INITIAL_ALLOC;
        let mut target = CpuTexture::new(64, 32);
        let err = renderer
            .render(&scene, &EncodedTapes, &[], &mut target)
            .unwrap_err();
        assert!(matches!(err, Error::InvalidScene(_)));
    }

    #[test]
    fn rejects_element_count_beyond_regions() {
        let renderer = Renderer::new(RendererOptions::default());
        let mut target = CpuTexture::new(32, 32);
        let mut scene = empty_scene(1, 1);
        scene.config.n_elements = 1000;
        let err = renderer
            .render(&scene, &EncodedTapes, &[], &mut target)
            .unwrap_err();
        assert!(matches!(err, Error::InvalidScene(_)));

        // Enough annotated elements, but no paths for them.
        let mut scene = empty_scene(1, 1);
        scene.heap.splice(1..1, [0; 8]);
        scene.config.n_elements = 1;
        scene.config.anno_alloc = Alloc::new(4, Annotated::SIZE);
        scene.config.tile_alloc = Alloc::new(4 + Annotated::SIZE, 0);
        scene.config.ptcl_alloc.offset += Annotated::SIZE;
        let err = renderer
            .render(&scene, &EncodedTapes, &[], &mut target)
            .unwrap_err();
        assert!(matches!(
            err,
            Error::InvalidScene(msg) if msg.contains("one path per element")
        ));
    }

    #[test]
    fn coarse_allocation_failure_is_reported() {
        let renderer = Renderer::new(RendererOptions {
            heap_size: 0,
            max_heap_size: 0,
        });
        let scene = empty_scene(1, 1);
        let mut target = CpuTexture::new(32, 32);
        let greedy = |_: &ConfigUniform, memory: &Memory| {
            memory.malloc(64);
        };
        let err = renderer
            .render(&scene, &greedy, &[], &mut target)
            .unwrap_err();
        let size = scene.heap_size_in_bytes();
        assert!(matches!(
            err,
            Error::HeapExhausted { requested, capacity }
                if requested == size + 64 && capacity == size
        ));
    }

    #[test]
    fn robust_render_grows_heap() {
        let renderer = Renderer::new(RendererOptions {
            heap_size: 0,
            max_heap_size: 1 << 20,
        });
        let scene = empty_scene(1, 1);
        let mut target = CpuTexture::new(32, 32);
        let greedy = |_: &ConfigUniform, memory: &Memory| {
            memory.malloc(10_000);
        };
        renderer
            .render_robust(&scene, &greedy, &[], &mut target)
            .unwrap();
    }

    #[test]
    fn robust_render_stops_at_max() {
        let renderer = Renderer::new(RendererOptions {
            heap_size: 0,
            max_heap_size: 8192,
        });
        let scene = empty_scene(1, 1);
        let mut target = CpuTexture::new(32, 32);
        let greedy = |_: &ConfigUniform, memory: &Memory| {
            memory.malloc(10_000);
        };
        let err = renderer
            .render_robust(&scene, &greedy, &[], &mut target)
            .unwrap_err();
        assert!(matches!(
            err,
            Error::HeapExhausted {
                capacity: 8192,
                ..
            }
        ));
    }
}
