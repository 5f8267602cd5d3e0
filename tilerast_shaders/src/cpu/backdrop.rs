// Copyright 2026 the Tilerast Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Backdrop propagation: row-wise inclusive prefix sums of tile backdrops.

use tilerast_encoding::{
    fill_mode_from_flags, AnnotatedTag, Annotated, ConfigUniform, Path, Tile, BACKDROP_WG,
    LG_BACKDROP_WG, MODE_NONZERO,
};

use super::{for_each_workgroup, CpuBinding, Memory};

const WG_SIZE: usize = BACKDROP_WG as usize;
const TILE_WORDS: u32 = Tile::SIZE / 4;

/// Shared arrays of one backdrop workgroup.
struct Shared {
    /// Inclusive prefix sum of the row counts after the scan.
    row_count: [u32; WG_SIZE],
    row_width: [u32; WG_SIZE],
    /// Byte offset of the first tile of each element's path.
    offset: [u32; WG_SIZE],
}

/// Number of tile rows an element contributes to propagation.
fn row_count(tag: AnnotatedTag, path: &Path) -> u32 {
    match tag.tag {
        AnnotatedTag::COLOR | AnnotatedTag::IMAGE | AnnotatedTag::BEGIN_CLIP
            if fill_mode_from_flags(tag.flags) == MODE_NONZERO =>
        {
            let rows = path.height();
            // A single row below the top of the target never receives a
            // backdrop from above, so it needs no propagation.
            if rows == 1 && path.bbox[1] > 0 {
                0
            } else {
                rows
            }
        }
        _ => 0,
    }
}

fn backdrop_workgroup(wg_id: u32, config: &ConfigUniform, memory: &Memory) {
    let mut sh = Shared {
        row_count: [0; WG_SIZE],
        row_width: [0; WG_SIZE],
        offset: [0; WG_SIZE],
    };
    for th in 0..WG_SIZE {
        let element_ix = wg_id * BACKDROP_WG + th as u32;
        if element_ix >= config.n_elements {
            continue;
        }
        let tag = AnnotatedTag::read(
            memory,
            config.anno_alloc.offset + element_ix * Annotated::SIZE,
        );
        let path = Path::read(memory, config.tile_alloc.offset + element_ix * Path::SIZE);
        let rows = row_count(tag, &path);
        if rows > 0 {
            sh.row_width[th] = path.width();
            sh.offset[th] = path.tiles;
        }
        sh.row_count[th] = rows;
    }

    for i in 0..LG_BACKDROP_WG {
        // barrier
        let prev = sh.row_count;
        for th in 0..WG_SIZE {
            if th >= 1 << i {
                sh.row_count[th] += prev[th - (1 << i)];
            }
        }
        // barrier
    }

    let total_rows = sh.row_count[WG_SIZE - 1];
    for th in 0..WG_SIZE as u32 {
        let mut row = th;
        while row < total_rows {
            let mut el_ix = 0;
            for i in 0..LG_BACKDROP_WG {
                let probe = el_ix + ((WG_SIZE / 2) >> i);
                if row >= sh.row_count[probe - 1] {
                    el_ix = probe;
                }
            }
            let width = sh.row_width[el_ix];
            if width > 0 && memory.mem_ok() {
                let seq_ix = row - if el_ix > 0 { sh.row_count[el_ix - 1] } else { 0 };
                // Word index of the backdrop of the row's first tile.
                let mut tile_el_ix =
                    (sh.offset[el_ix] >> 2) + Tile::BACKDROP_WORD + seq_ix * TILE_WORDS * width;
                let mut sum = memory.read(tile_el_ix) as i32;
                for _ in 1..width {
                    tile_el_ix += TILE_WORDS;
                    sum = sum.wrapping_add(memory.read(tile_el_ix) as i32);
                    memory.write(tile_el_ix, sum as u32);
                }
            }
            row += BACKDROP_WG;
        }
    }
}

/// Propagates backdrops for every element of the scene.
///
/// Does nothing if the heap's failure flag is already raised.
pub fn backdrop_main(n_wg: u32, config: &ConfigUniform, memory: &Memory) {
    if !memory.mem_ok() {
        return;
    }
    for_each_workgroup(n_wg, |wg_id| backdrop_workgroup(wg_id, config, memory));
}

pub fn backdrop(n_wg: u32, resources: &[CpuBinding<'_>]) {
    let config = resources[0].as_typed();
    let memory = resources[1].as_memory();
    backdrop_main(n_wg, &config, memory);
}
