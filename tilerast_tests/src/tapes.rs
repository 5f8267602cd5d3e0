// Copyright 2026 the Tilerast Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! A coarse stage for scenes built with [`SceneBuilder`](crate::SceneBuilder).

use tilerast::{CoarseStage, ConfigUniform, Memory};
use tilerast_encoding::{
    Cmd, CmdAlpha, CmdColor, CmdFill, CmdImage, CmdJump, CmdStroke, Path, Tile,
    PTCL_INITIAL_ALLOC,
};

/// What an element draws, as far as its tape commands are concerned.
#[derive(Clone, Copy, Debug)]
pub(crate) enum Draw {
    Fill { rgba: u32 },
    Image(CmdImage),
    Stroke { half_width: f32, rgba: u32 },
    PushClip,
    PopClip,
}

/// Writes the tape of one tile, chaining new chunks with `Jump` commands.
struct TapeWriter<'a> {
    memory: &'a Memory,
    cmd_ref: u32,
    cmd_limit: u32,
    /// Commands left before a chunk is forced.
    split_in: Option<usize>,
    split_after: Option<usize>,
    failed: bool,
}

impl<'a> TapeWriter<'a> {
    fn new(memory: &'a Memory, start: u32, split_after: Option<usize>) -> Self {
        Self {
            memory,
            cmd_ref: start,
            cmd_limit: start + PTCL_INITIAL_ALLOC,
            split_in: split_after,
            split_after,
            failed: false,
        }
    }

    fn push(&mut self, cmd: Cmd) {
        if self.failed {
            return;
        }
        // Room for the command and a trailing jump or end.
        let full = self.cmd_ref + 2 * Cmd::SIZE > self.cmd_limit;
        if full || self.split_in == Some(0) {
            let chunk = self.memory.malloc(PTCL_INITIAL_ALLOC);
            if chunk.failed {
                self.failed = true;
                return;
            }
            self.write(Cmd::Jump(CmdJump {
                new_ref: chunk.alloc.offset,
            }));
            self.cmd_ref = chunk.alloc.offset;
            self.cmd_limit = chunk.alloc.offset + PTCL_INITIAL_ALLOC;
            self.split_in = self.split_after;
        }
        self.write(cmd);
        if let Some(n) = &mut self.split_in {
            *n = n.saturating_sub(1);
        }
    }

    fn write(&mut self, cmd: Cmd) {
        for (i, word) in cmd.to_words().into_iter().enumerate() {
            self.memory.write((self.cmd_ref >> 2) + i as u32, word);
        }
        self.cmd_ref += Cmd::SIZE;
    }

    fn finish(mut self) {
        if !self.failed {
            self.write(Cmd::End);
        }
    }
}

/// Writes one tape per tile for the elements of a built scene.
///
/// Reads the propagated backdrops, so it must run after the backdrop kernel.
#[derive(Clone, Debug)]
pub struct FixtureTapes {
    pub(crate) draws: Vec<Draw>,
    pub(crate) split_after: Option<usize>,
}

/// The command setting the coverage of a path in one tile, if any.
fn coverage(tile: Option<Tile>) -> Option<Cmd> {
    match tile {
        Some(tile) if tile.tile != 0 => Some(Cmd::Fill(CmdFill {
            tile_ref: tile.tile,
            backdrop: tile.backdrop,
        })),
        Some(tile) if tile.backdrop != 0 => Some(Cmd::Solid),
        _ => None,
    }
}

impl CoarseStage for FixtureTapes {
    fn write_tapes(&self, config: &ConfigUniform, memory: &Memory) {
        for tile_ix in 0..config.n_tiles() {
            let tx = tile_ix % config.width_in_tiles;
            let ty = tile_ix / config.width_in_tiles;
            let mut tape = TapeWriter::new(memory, config.tape_offset(tile_ix), self.split_after);
            for (element_ix, draw) in self.draws.iter().enumerate() {
                let path = Path::read(
                    memory,
                    config.tile_alloc.offset + element_ix as u32 * Path::SIZE,
                );
                let [x0, y0, x1, y1] = path.bbox.map(u32::from);
                let tile = ((x0..x1).contains(&tx) && (y0..y1).contains(&ty))
                    .then(|| Tile::read(memory, path.tile_offset(tx - x0, ty - y0)));
                match *draw {
                    Draw::Fill { rgba } => {
                        if let Some(cmd) = coverage(tile) {
                            tape.push(cmd);
                            tape.push(Cmd::Color(CmdColor { rgba_color: rgba }));
                        }
                    }
                    Draw::Image(image) => {
                        if let Some(cmd) = coverage(tile) {
                            tape.push(cmd);
                            tape.push(Cmd::Image(image));
                        }
                    }
                    Draw::Stroke { half_width, rgba } => {
                        if let Some(tile) = tile.filter(|tile| tile.tile != 0) {
                            tape.push(Cmd::Stroke(CmdStroke {
                                tile_ref: tile.tile,
                                half_width,
                            }));
                            tape.push(Cmd::Color(CmdColor { rgba_color: rgba }));
                        }
                    }
                    Draw::PushClip => {
                        tape.push(
                            coverage(tile).unwrap_or(Cmd::Alpha(CmdAlpha { alpha: 0.0 })),
                        );
                        tape.push(Cmd::BeginClip);
                    }
                    Draw::PopClip => tape.push(Cmd::EndClip),
                }
            }
            tape.finish();
        }
    }
}
