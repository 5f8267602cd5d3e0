// Copyright 2026 the Tilerast Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Strokes of polylines.

use tilerast_tests::{rect, render, rgba8, SceneBuilder};

const RED: u32 = 0xff00_00ff;
const OPAQUE_RED: [u8; 4] = [255, 0, 0, 255];

#[test]
fn horizontal_line_spans_tiles() {
    let fixture = SceneBuilder::new(2, 1)
        .stroke(&[[4.0, 16.0], [60.0, 16.0]], 2.0, RED)
        .build();
    let target = render("horizontal_line_spans_tiles", &fixture, &[]).unwrap();
    for x in [10, 31, 32, 50] {
        for y in 14..18 {
            assert_eq!(rgba8(&target, x, y), OPAQUE_RED, "pixel ({x}, {y})");
        }
        assert_eq!(rgba8(&target, x, 12), [0; 4]);
        assert_eq!(rgba8(&target, x, 19), [0; 4]);
    }
    // Round ends, partially covered near the endpoint.
    let alpha = rgba8(&target, 2, 16)[3];
    assert!(alpha > 0 && alpha < 255, "end cap: {alpha}");
    assert_eq!(rgba8(&target, 0, 16), [0; 4]);
    assert_eq!(rgba8(&target, 62, 16), [0; 4]);
}

#[test]
fn polyline_turns_across_tile_rows() {
    let fixture = SceneBuilder::new(2, 2)
        .stroke(&[[8.0, 8.5], [56.5, 8.5], [56.5, 56.0]], 1.0, RED)
        .build();
    let target = render("polyline_turns_across_tile_rows", &fixture, &[]).unwrap();
    assert_eq!(rgba8(&target, 20, 8), OPAQUE_RED);
    assert_eq!(rgba8(&target, 56, 8), OPAQUE_RED);
    assert_eq!(rgba8(&target, 56, 40), OPAQUE_RED);
    assert_eq!(rgba8(&target, 20, 40), [0; 4]);
    assert_eq!(rgba8(&target, 40, 20), [0; 4]);
}

#[test]
fn stroke_paints_over_fill() {
    let fixture = SceneBuilder::new(1, 1)
        .fill(&rect(0.0, 0.0, 32.0, 32.0), 0x0000_ffff)
        .stroke(&[[0.0, 16.5], [32.0, 16.5]], 0.5, RED)
        .build();
    let target = render("stroke_paints_over_fill", &fixture, &[]).unwrap();
    assert_eq!(rgba8(&target, 16, 16), OPAQUE_RED);
    assert_eq!(rgba8(&target, 16, 15), [0, 0, 255, 255]);
    assert_eq!(rgba8(&target, 16, 17), [0, 0, 255, 255]);
}
