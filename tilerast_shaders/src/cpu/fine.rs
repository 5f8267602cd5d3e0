// Copyright 2026 the Tilerast Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Fine rasterization: runs the command tape of each tile and writes its pixels.

use tilerast_encoding::{
    ClipFrame, Cmd, CmdFill, CmdImage, CmdStroke, ConfigUniform, TileSeg, TILE_HEIGHT_PX,
    TILE_SIZE_PX, TILE_WIDTH_PX,
};

use super::util::{
    mix, pack4x8unorm, pack_srgb, sign, texel_to_linear, texel_to_srgb, unpack4x8unorm,
    unpack_srgb, Vec2,
};
use super::{for_each_workgroup, CpuBinding, CpuTexture, Memory};

/// Pixels handled by one invocation, stacked vertically.
const CHUNK: u32 = 8;
/// Rows of invocations in a fine workgroup.
const CHUNK_DY: u32 = TILE_HEIGHT_PX / CHUNK;
/// Depth of the clip stack kept in registers before spilling to the heap.
const BLEND_STACK_SIZE: usize = 4;

const N_CHUNK: usize = CHUNK as usize;
const N_LANES: usize = (TILE_WIDTH_PX * CHUNK_DY) as usize;
const TILE_SIZE: usize = TILE_SIZE_PX as usize;

/// Registers of one invocation.
#[derive(Clone, Copy)]
struct Lane<const DEPTH: usize> {
    /// Tile-local coordinates of the first pixel of the chunk.
    x: u32,
    y: u32,
    rgba: [[f32; 4]; N_CHUNK],
    area: [f32; N_CHUNK],
    /// Packed sRGB backgrounds of the open clips.
    blend_stack: [[u32; N_CHUNK]; DEPTH],
    blend_alpha_stack: [[f32; N_CHUNK]; DEPTH],
}

impl<const DEPTH: usize> Lane<DEPTH> {
    fn new(ix: usize) -> Self {
        Self {
            x: ix as u32 % TILE_WIDTH_PX,
            y: ix as u32 / TILE_WIDTH_PX,
            rgba: [[0.0; 4]; N_CHUNK],
            area: [0.0; N_CHUNK],
            blend_stack: [[0; N_CHUNK]; DEPTH],
            blend_alpha_stack: [[0.0; N_CHUNK]; DEPTH],
        }
    }

    /// Tile-local coordinates of pixel `k` of the chunk.
    fn pixel(&self, k: usize) -> (u32, u32) {
        (self.x, self.y + k as u32 * CHUNK_DY)
    }

    fn fill(&mut self, memory: &Memory, fill: &CmdFill, origin: Vec2) {
        let backdrop = fill.backdrop as f32;
        let mut area = [backdrop; N_CHUNK];
        for seg in TileSeg::iter(memory, fill.tile_ref) {
            let vector = Vec2::from_array(seg.vector);
            for k in 0..N_CHUNK {
                let (x, y) = self.pixel(k);
                let my_xy = origin + Vec2::new(x as f32, y as f32);
                let start = Vec2::from_array(seg.origin) - my_xy;
                let end = start + vector;
                let window = Vec2::new(start.y.clamp(0.0, 1.0), end.y.clamp(0.0, 1.0));
                if window.x != window.y {
                    let t = (window - Vec2::splat(start.y)) * vector.y.recip();
                    let xs = Vec2::new(mix(start.x, end.x, t.x), mix(start.x, end.x, t.y));
                    let xmin = xs.x.min(xs.y).min(1.0) - 1e-6;
                    let xmax = xs.x.max(xs.y);
                    let b = xmax.min(1.0);
                    let c = b.max(0.0);
                    let d = xmin.max(0.0);
                    let a = (b + 0.5 * (d * d - c * c) - xmin) / (xmax - xmin);
                    area[k] += a * (window.x - window.y);
                }
                area[k] += sign(vector.x) * (my_xy.y - seg.y_edge + 1.0).clamp(0.0, 1.0);
            }
        }
        for k in 0..N_CHUNK {
            self.area[k] = area[k].abs().min(1.0);
        }
    }

    fn stroke(&mut self, memory: &Memory, stroke: &CmdStroke, origin: Vec2) {
        let mut df = [1e9_f32; N_CHUNK];
        for seg in TileSeg::iter(memory, stroke.tile_ref) {
            let line_vec = Vec2::from_array(seg.vector);
            let len_sq = line_vec.length_squared();
            for k in 0..N_CHUNK {
                let (x, y) = self.pixel(k);
                let dpos = origin + Vec2::new(x as f32 + 0.5, y as f32 + 0.5)
                    - Vec2::from_array(seg.origin);
                let t = if len_sq > 0.0 {
                    (line_vec.dot(dpos) / len_sq).clamp(0.0, 1.0)
                } else {
                    0.0
                };
                df[k] = df[k].min((line_vec * t - dpos).length());
            }
        }
        for k in 0..N_CHUNK {
            self.area[k] = (stroke.half_width + 0.5 - df[k]).clamp(0.0, 1.0);
        }
    }

    /// Source-over of `fg`, scaled by the current coverage.
    fn blend(&mut self, k: usize, fg: [f32; 4]) {
        let fg = fg.map(|c| c * self.area[k]);
        let rgba = &mut self.rgba[k];
        for i in 0..4 {
            rgba[i] = rgba[i] * (1.0 - fg[3]) + fg[i];
        }
    }

    fn image(&mut self, image: &CmdImage, images: &[CpuTexture], origin: Vec2) {
        #[cfg(feature = "image_indices")]
        let texture = images.get(image.index as usize);
        #[cfg(not(feature = "image_indices"))]
        let texture = images.first();
        for k in 0..N_CHUNK {
            let (x, y) = self.pixel(k);
            let texel = texture.map_or(0, |texture| {
                texture.load(
                    origin.x as i32 + x as i32 + i32::from(image.offset[0]),
                    origin.y as i32 + y as i32 + i32::from(image.offset[1]),
                )
            });
            self.blend(k, texel_to_linear(unpack4x8unorm(texel)));
        }
    }
}

/// Clip stack and pixel state of a tile being rasterized.
///
/// The open clips are numbered from 0; entries below `blend_spill` live in
/// frames on the heap, the rest in the lanes' register stacks at index
/// `entry % DEPTH`.
struct TileState<const DEPTH: usize> {
    lanes: Vec<Lane<DEPTH>>,
    blend_sp: usize,
    blend_spill: usize,
    /// Byte offset of the most recently spilled frame, 0 if none.
    clip_tos: u32,
}

impl<const DEPTH: usize> TileState<DEPTH> {
    fn new() -> Self {
        Self {
            lanes: (0..N_LANES).map(Lane::new).collect(),
            blend_sp: 0,
            blend_spill: 0,
            clip_tos: 0,
        }
    }

    /// Pushes the current color and coverage; `false` if a spill failed.
    fn begin_clip(&mut self, memory: &Memory) -> bool {
        if self.blend_sp == self.blend_spill + DEPTH {
            // Invocation 0 allocates and shares the result after a barrier.
            let result = memory.malloc(ClipFrame::SIZE_IN_BYTES);
            if result.failed {
                return false;
            }
            let frame = ClipFrame::new(result.alloc.offset);
            memory.write(frame.link_ix(), self.clip_tos);
            let slot = self.blend_spill % DEPTH;
            for lane in &self.lanes {
                for k in 0..N_CHUNK {
                    let (x, y) = lane.pixel(k);
                    memory.write(frame.color_ix(x, y), lane.blend_stack[slot][k]);
                    memory.write(frame.area_ix(x, y), lane.blend_alpha_stack[slot][k].to_bits());
                }
            }
            log::trace!("clip entry {} spilled to {}", self.blend_spill, frame.offset);
            self.clip_tos = frame.offset;
            self.blend_spill += 1;
        }
        let slot = self.blend_sp % DEPTH;
        for lane in &mut self.lanes {
            for k in 0..N_CHUNK {
                lane.blend_stack[slot][k] = pack_srgb(lane.rgba[k]);
                lane.blend_alpha_stack[slot][k] = lane.area[k].abs().clamp(0.0, 1.0);
                lane.rgba[k] = [0.0; 4];
            }
        }
        self.blend_sp += 1;
        true
    }

    /// Pops the innermost clip and composites the finished layer over it.
    fn end_clip(&mut self, memory: &Memory) {
        let Some(top) = self.blend_sp.checked_sub(1) else {
            return;
        };
        let slot = top % DEPTH;
        if self.blend_sp == self.blend_spill {
            let frame = ClipFrame::new(self.clip_tos);
            for lane in &mut self.lanes {
                for k in 0..N_CHUNK {
                    let (x, y) = lane.pixel(k);
                    lane.blend_stack[slot][k] = memory.read(frame.color_ix(x, y));
                    lane.blend_alpha_stack[slot][k] =
                        f32::from_bits(memory.read(frame.area_ix(x, y)));
                }
            }
            // Invocation 0 follows the link and shares it after a barrier.
            self.clip_tos = memory.read(frame.link_ix());
            self.blend_spill -= 1;
        }
        self.blend_sp = top;
        for lane in &mut self.lanes {
            for k in 0..N_CHUNK {
                let bg = unpack_srgb(lane.blend_stack[slot][k]);
                let alpha = lane.blend_alpha_stack[slot][k];
                let fg = lane.rgba[k].map(|c| c * alpha);
                for i in 0..4 {
                    lane.rgba[k][i] = bg[i] * (1.0 - fg[3]) + fg[i];
                }
            }
        }
    }

    /// Final pixels of the tile in row-major order.
    fn pixels(&self, origin: Vec2, background: Option<&CpuTexture>) -> [u32; TILE_SIZE] {
        let mut pixels = [0; TILE_SIZE];
        for lane in &self.lanes {
            for k in 0..N_CHUNK {
                let (x, y) = lane.pixel(k);
                let mut rgba = lane.rgba[k];
                if let Some(background) = background {
                    let bg = texel_to_linear(unpack4x8unorm(
                        background.load(origin.x as i32 + x as i32, origin.y as i32 + y as i32),
                    ));
                    for i in 0..4 {
                        rgba[i] = bg[i] * (1.0 - rgba[3]) + rgba[i];
                    }
                }
                pixels[(y * TILE_WIDTH_PX + x) as usize] = pack4x8unorm(texel_to_srgb(rgba));
            }
        }
        pixels
    }
}

/// Rasterizes one tile with a register clip stack of `DEPTH` entries.
///
/// Returns `None` when the heap's failure flag is raised, or when the tile
/// needed a clip frame the heap could not provide.
fn fine_tile<const DEPTH: usize>(
    config: &ConfigUniform,
    memory: &Memory,
    images: &[CpuTexture],
    background: Option<&CpuTexture>,
    tile_ix: u32,
) -> Option<[u32; TILE_SIZE]> {
    if !memory.mem_ok() {
        return None;
    }
    let tile_x = tile_ix % config.width_in_tiles;
    let tile_y = tile_ix / config.width_in_tiles;
    let origin = Vec2::new(
        (tile_x * TILE_WIDTH_PX) as f32,
        (tile_y * TILE_HEIGHT_PX) as f32,
    );
    let mut state = TileState::<DEPTH>::new();
    let mut cmd_ref = config.tape_offset(tile_ix);
    loop {
        match Cmd::read(memory, cmd_ref) {
            Cmd::End => break,
            Cmd::Fill(fill) => {
                for lane in &mut state.lanes {
                    lane.fill(memory, &fill, origin);
                }
            }
            Cmd::Stroke(stroke) => {
                for lane in &mut state.lanes {
                    lane.stroke(memory, &stroke, origin);
                }
            }
            Cmd::Solid => {
                for lane in &mut state.lanes {
                    lane.area = [1.0; N_CHUNK];
                }
            }
            Cmd::Alpha(alpha) => {
                for lane in &mut state.lanes {
                    lane.area = [alpha.alpha; N_CHUNK];
                }
            }
            Cmd::Color(color) => {
                let fg = unpack_srgb(color.rgba_color);
                for lane in &mut state.lanes {
                    for k in 0..N_CHUNK {
                        lane.blend(k, fg);
                    }
                }
            }
            Cmd::Image(image) => {
                for lane in &mut state.lanes {
                    lane.image(&image, images, origin);
                }
            }
            Cmd::BeginClip => {
                if !state.begin_clip(memory) {
                    return None;
                }
            }
            Cmd::EndClip => state.end_clip(memory),
            Cmd::Jump(jump) => {
                cmd_ref = jump.new_ref;
                continue;
            }
        }
        cmd_ref += Cmd::SIZE;
    }
    Some(state.pixels(origin, background))
}

/// Rasterizes every tile of the target into `output`.
///
/// Tiles whose rasterization failed keep their previous contents.
pub fn fine_main(
    config: &ConfigUniform,
    memory: &Memory,
    images: &[CpuTexture],
    output: &mut CpuTexture,
    background: Option<&CpuTexture>,
) {
    if !memory.mem_ok() {
        return;
    }
    let tiles = for_each_workgroup(config.n_tiles(), |tile_ix| {
        fine_tile::<BLEND_STACK_SIZE>(config, memory, images, background, tile_ix)
    });
    write_tiles(config, output, tiles);
}

fn write_tiles(
    config: &ConfigUniform,
    output: &mut CpuTexture,
    tiles: Vec<Option<[u32; TILE_SIZE]>>,
) {
    let tile_w = TILE_WIDTH_PX as usize;
    let tile_h = TILE_HEIGHT_PX as usize;
    for (tile_ix, pixels) in tiles.into_iter().enumerate() {
        let Some(pixels) = pixels else {
            continue;
        };
        let tile_x = tile_ix % config.width_in_tiles as usize;
        let tile_y = tile_ix / config.width_in_tiles as usize;
        for y in 0..tile_h {
            let base = output.width * (tile_y * tile_h + y) + tile_x * tile_w;
            output.pixels[base..base + tile_w].copy_from_slice(&pixels[y * tile_w..][..tile_w]);
        }
    }
}

pub fn fine(_n_wg: u32, resources: &[CpuBinding<'_>]) {
    let config = resources[0].as_typed();
    let memory = resources[1].as_memory();
    let images = resources[2].as_textures();
    let mut output = resources[3].as_tex_mut();
    #[cfg(feature = "background")]
    let background = resources.get(4).map(CpuBinding::as_tex);
    #[cfg(not(feature = "background"))]
    let background = None;
    fine_main(&config, memory, images, &mut output, background);
}
