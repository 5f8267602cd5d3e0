// Copyright 2026 the Tilerast Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Command tapes chained across several chunks.

use tilerast::{CoarseStage, Memory};
use tilerast_encoding::Cmd;
use tilerast_tests::{rect, render, rgba8, Fixture, SceneBuilder};

/// Three layers of one pixel wide columns over the first tile; the last
/// layer's red channel encodes the column.
fn columns(split_after: Option<usize>) -> Fixture {
    let mut builder = SceneBuilder::new(2, 1);
    for layer in 0..3_u32 {
        for x in 0..32_u32 {
            let red = if layer == 2 { x * 8 } else { 255 - x };
            let column = rect(x as f32, 0.0, x as f32 + 1.0, 32.0);
            builder.fill(&column, (red << 24) | (layer << 8) | 0xff);
        }
    }
    builder.push_clip(&rect(40.0, 0.0, 56.0, 32.0));
    builder.fill(&rect(32.0, 0.0, 64.0, 32.0), 0x00ff_00ff);
    builder.pop_clip();
    if let Some(n) = split_after {
        builder.split_tapes_after(n);
    }
    builder.build()
}

/// Commands of the tape of `tile_ix`, and how many jumps it took.
fn walk_tape(fixture: &Fixture, tile_ix: u32) -> (Vec<Cmd>, usize) {
    let config = fixture.scene.config;
    let memory = Memory::with_contents(&fixture.scene.heap, 1 << 20);
    fixture.tapes.write_tapes(&config, &memory);
    assert!(memory.mem_ok());
    let mut cmds = Vec::new();
    let mut jumps = 0;
    let mut cmd_ref = config.tape_offset(tile_ix);
    loop {
        match Cmd::read(&memory, cmd_ref) {
            Cmd::End => return (cmds, jumps),
            Cmd::Jump(jump) => {
                jumps += 1;
                cmd_ref = jump.new_ref;
            }
            cmd => {
                cmds.push(cmd);
                cmd_ref += Cmd::SIZE;
            }
        }
    }
}

#[test]
fn long_tapes_chain_chunks() {
    let (cmds, jumps) = walk_tape(&columns(None), 0);
    // Coverage and color for each column, then the clip, which is empty
    // in this tile.
    assert_eq!(cmds.len(), 3 * 32 * 2 + 3);
    assert_eq!(jumps, 2);
    assert_eq!(cmds.last(), Some(&Cmd::EndClip));
}

#[test]
fn forced_splits_keep_the_command_sequence() {
    let (contiguous, _) = walk_tape(&columns(None), 1);
    for n in [0, 1, 3] {
        let (split, jumps) = walk_tape(&columns(Some(n)), 1);
        assert!(jumps > 0);
        assert_eq!(split, contiguous, "split after {n}");
    }
}

#[test]
fn split_tapes_render_identically() {
    let contiguous = render("columns", &columns(None), &[]).unwrap();
    for n in [0, 1, 3] {
        let split = render(&format!("columns_split_{n}"), &columns(Some(n)), &[]).unwrap();
        assert_eq!(split, contiguous, "split after {n}");
    }
    for x in 0..32 {
        let [r, g, b, a] = rgba8(&contiguous, x, 7);
        assert!(r.abs_diff(8 * x as u8) <= 1, "column {x}: {r}");
        assert_eq!((g, b, a), (0, 2, 255));
    }
    assert_eq!(rgba8(&contiguous, 36, 5), [0; 4]);
    assert_eq!(rgba8(&contiguous, 45, 5), [0, 255, 0, 255]);
}
