// Copyright 2026 the Tilerast Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Clip layers, including stacks deep enough to spill to the heap.

use tilerast_tests::{rect, render, rgba8, SceneBuilder};

const RED: u32 = 0xff00_00ff;
const BLUE: u32 = 0x0000_ffff;

/// A full-target fill inside `depth` nested clips, each inset by two pixels
/// from the one around it.
fn nested(depth: u32) -> SceneBuilder {
    let mut builder = SceneBuilder::new(2, 2);
    for k in 0..depth {
        let inset = (2 * k + 1) as f32;
        builder.push_clip(&rect(inset, inset, 64.0 - inset, 64.0 - inset));
    }
    builder.fill(&rect(0.0, 0.0, 64.0, 64.0), RED);
    for _ in 0..depth {
        builder.pop_clip();
    }
    builder
}

#[test]
fn nesting_depths() {
    for depth in [0, 3, 4, 5, 9] {
        let fixture = nested(depth).build();
        let target = render(&format!("nested_clips_{depth}"), &fixture, &[]).unwrap();
        // Inset of the innermost clip.
        let edge = (2 * depth).saturating_sub(1) as usize;
        for y in 0..64 {
            for x in 0..64 {
                let inside = (edge..64 - edge).contains(&x) && (edge..64 - edge).contains(&y);
                let expected = if inside { [255, 0, 0, 255] } else { [0; 4] };
                assert_eq!(
                    rgba8(&target, x, y),
                    expected,
                    "depth {depth}, pixel ({x}, {y})"
                );
            }
        }
    }
}

#[test]
fn clip_composites_over_what_is_below() {
    let fixture = SceneBuilder::new(2, 1)
        .fill(&rect(0.0, 0.0, 64.0, 32.0), BLUE)
        .push_clip(&rect(0.0, 0.0, 20.0, 32.0))
        .fill(&rect(0.0, 0.0, 64.0, 32.0), RED)
        .pop_clip()
        .build();
    let target = render("clip_composites_over_what_is_below", &fixture, &[]).unwrap();
    assert_eq!(rgba8(&target, 5, 5), [255, 0, 0, 255]);
    assert_eq!(rgba8(&target, 19, 31), [255, 0, 0, 255]);
    assert_eq!(rgba8(&target, 20, 5), [0, 0, 255, 255]);
    // The clip path never reaches the second tile.
    assert_eq!(rgba8(&target, 50, 16), [0, 0, 255, 255]);
}

#[test]
fn sibling_clips_are_independent() {
    let fixture = SceneBuilder::new(1, 1)
        .push_clip(&rect(0.0, 0.0, 16.0, 32.0))
        .fill(&rect(0.0, 0.0, 32.0, 32.0), RED)
        .pop_clip()
        .push_clip(&rect(16.0, 0.0, 32.0, 32.0))
        .fill(&rect(0.0, 0.0, 32.0, 32.0), BLUE)
        .pop_clip()
        .build();
    let target = render("sibling_clips_are_independent", &fixture, &[]).unwrap();
    assert_eq!(rgba8(&target, 15, 10), [255, 0, 0, 255]);
    assert_eq!(rgba8(&target, 16, 10), [0, 0, 255, 255]);
}
