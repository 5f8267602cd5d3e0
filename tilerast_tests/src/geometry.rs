// Copyright 2026 the Tilerast Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Binning of polygons and polylines into tiles.

use tilerast_encoding::{TileSeg, TILE_HEIGHT_PX, TILE_WIDTH_PX, Y_EDGE_NONE};

const TW: f32 = TILE_WIDTH_PX as f32;
const TH: f32 = TILE_HEIGHT_PX as f32;

pub type Point = [f32; 2];

#[derive(Clone, Debug, Default)]
pub(crate) struct TileData {
    /// Segments in list order.
    pub(crate) segs: Vec<TileSeg>,
    /// Backdrop delta, before row propagation.
    pub(crate) backdrop: i32,
}

/// The tiles of one path before encoding.
#[derive(Clone, Debug, Default)]
pub(crate) struct PathTiles {
    pub(crate) bbox: [u16; 4],
    /// Row-major.
    pub(crate) tiles: Vec<TileData>,
}

impl PathTiles {
    fn new(bbox: [u16; 4]) -> Self {
        let n = usize::from(bbox[2] - bbox[0]) * usize::from(bbox[3] - bbox[1]);
        Self {
            bbox,
            tiles: vec![TileData::default(); n],
        }
    }

    /// The tile at target tile coordinates `(x, y)`, which must be in the bbox.
    fn tile_mut(&mut self, x: i32, y: i32) -> &mut TileData {
        let [x0, y0, x1, _] = self.bbox.map(i32::from);
        &mut self.tiles[((y - y0) * (x1 - x0) + x - x0) as usize]
    }

    fn tile_range(&self) -> (std::ops::Range<i32>, std::ops::Range<i32>) {
        let [x0, y0, x1, y1] = self.bbox.map(i32::from);
        (x0..x1, y0..y1)
    }
}

/// Bounding box of `points` grown by `pad`, in pixels.
pub(crate) fn bounds(points: &[Point], pad: f32) -> [f32; 4] {
    let mut bbox = [f32::MAX, f32::MAX, f32::MIN, f32::MIN];
    for p in points {
        bbox = [
            bbox[0].min(p[0]),
            bbox[1].min(p[1]),
            bbox[2].max(p[0]),
            bbox[3].max(p[1]),
        ];
    }
    if points.is_empty() {
        return [0.0; 4];
    }
    [bbox[0] - pad, bbox[1] - pad, bbox[2] + pad, bbox[3] + pad]
}

/// Tiles touched by the pixel rectangle `rect`, clamped to the grid.
fn tile_bbox(rect: [f32; 4], grid: [u32; 2]) -> [u16; 4] {
    let clamp_x = |v: f32| v.clamp(0.0, grid[0] as f32) as u16;
    let clamp_y = |v: f32| v.clamp(0.0, grid[1] as f32) as u16;
    let bbox = [
        clamp_x((rect[0] / TW).floor()),
        clamp_y((rect[1] / TH).floor()),
        clamp_x((rect[2] / TW).ceil()),
        clamp_y((rect[3] / TH).ceil()),
    ];
    if bbox[2] <= bbox[0] || bbox[3] <= bbox[1] {
        [0; 4]
    } else {
        bbox
    }
}

fn lerp(p0: Point, p1: Point, t: f32) -> Point {
    if t == 0.0 {
        p0
    } else if t == 1.0 {
        p1
    } else {
        [p0[0] + t * (p1[0] - p0[0]), p0[1] + t * (p1[1] - p0[1])]
    }
}

/// Liang-Barsky clipping of a line to `rect`; `None` if nothing of positive
/// length is left.
fn clip_line(p0: Point, p1: Point, rect: [f32; 4]) -> Option<(Point, Point)> {
    let d = [p1[0] - p0[0], p1[1] - p0[1]];
    let mut t0 = 0.0_f32;
    let mut t1 = 1.0_f32;
    for (p, q) in [
        (-d[0], p0[0] - rect[0]),
        (d[0], rect[2] - p0[0]),
        (-d[1], p0[1] - rect[1]),
        (d[1], rect[3] - p0[1]),
    ] {
        if p == 0.0 {
            if q < 0.0 {
                return None;
            }
        } else {
            let r = q / p;
            if p < 0.0 {
                t0 = t0.max(r);
            } else {
                t1 = t1.min(r);
            }
        }
    }
    (t0 < t1).then(|| (lerp(p0, p1, t0), lerp(p0, p1, t1)))
}

/// Where edge `ix` of a closed polygon crosses the vertical line at `x`.
///
/// Points on the line count as right of it. An edge that only reaches the
/// line has no piece right of it, so its crossing is carried by the
/// neighbouring edge that continues to the right.
fn crossing_y(edges: &[(Point, Point)], ix: usize, x: f32) -> Option<f32> {
    let n = edges.len();
    let (p0, p1) = edges[ix];
    if (p0[0] < x) != (p1[0] < x) {
        if p0[0] == x || p1[0] == x {
            return None;
        }
        return Some(p0[1] + (x - p0[0]) * (p1[1] - p0[1]) / (p1[0] - p0[0]));
    }
    let (prev, _) = edges[(ix + n - 1) % n];
    let (_, next) = edges[(ix + 1) % n];
    if p0[0] == x && p1[0] > x && prev[0] < x {
        Some(p0[1])
    } else if p1[0] == x && p0[0] > x && next[0] < x {
        Some(p1[1])
    } else {
        None
    }
}

/// Closed polygon edges, the last point joined back to the first.
fn edges(points: &[Point]) -> Vec<(Point, Point)> {
    points
        .iter()
        .zip(points.iter().cycle().skip(1))
        .map(|(p0, p1)| (*p0, *p1))
        .collect()
}

/// Bins a closed polygon for nonzero filling.
///
/// Each tile gets the edge pieces inside it, with `y_edge` set where an edge
/// crosses the tile's left side within its row. Horizontal edges are kept
/// for their `y_edge` alone. An edge crossing the top of a tile row adds its
/// winding to the backdrop delta of the tile right of the crossing; upward
/// edges count +1.
pub(crate) fn tile_fill(points: &[Point], grid: [u32; 2]) -> PathTiles {
    let mut path = PathTiles::new(tile_bbox(bounds(points, 0.0), grid));
    let (xs, ys) = path.tile_range();
    let edges = edges(points);
    for (ix, &(p0, p1)) in edges.iter().enumerate() {
        let delta = if p1[1] < p0[1] { 1 } else { -1 };
        for ty in ys.start + 1..ys.end {
            let top = ty as f32 * TH;
            if (p0[1] < top) != (p1[1] < top) {
                let x = p0[0] + (top - p0[1]) * (p1[0] - p0[0]) / (p1[1] - p0[1]);
                let tx = ((x / TW).floor() as i32 + 1).max(xs.start);
                if tx < xs.end {
                    path.tile_mut(tx, ty).backdrop += delta;
                }
            }
        }
        for ty in ys.clone() {
            let (top, bottom) = (ty as f32 * TH, (ty + 1) as f32 * TH);
            for tx in xs.clone() {
                let left = tx as f32 * TW;
                let rect = [left, top, left + TW, bottom];
                let Some((a, b)) = clip_line(p0, p1, rect) else {
                    continue;
                };
                let y_edge = crossing_y(&edges, ix, left)
                    .filter(|y| (top..bottom).contains(y))
                    .unwrap_or(Y_EDGE_NONE);
                path.tile_mut(tx, ty).segs.push(TileSeg {
                    origin: a,
                    vector: [b[0] - a[0], b[1] - a[1]],
                    y_edge,
                    next: 0,
                });
            }
        }
    }
    path
}

/// Bins an open polyline for stroking.
///
/// Every segment is added whole to each tile its stroke can reach.
pub(crate) fn tile_stroke(points: &[Point], half_width: f32, grid: [u32; 2]) -> PathTiles {
    let pad = half_width + 1.0;
    let mut path = PathTiles::new(tile_bbox(bounds(points, pad), grid));
    let (xs, ys) = path.tile_range();
    for pair in points.windows(2) {
        let [x0, y0, x1, y1] = tile_bbox(bounds(pair, pad), grid).map(i32::from);
        for ty in y0.max(ys.start)..y1.min(ys.end) {
            for tx in x0.max(xs.start)..x1.min(xs.end) {
                path.tile_mut(tx, ty).segs.push(TileSeg {
                    origin: pair[0],
                    vector: [pair[1][0] - pair[0][0], pair[1][1] - pair[0][1]],
                    y_edge: Y_EDGE_NONE,
                    next: 0,
                });
            }
        }
    }
    path
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clip_keeps_inner_part() {
        let (a, b) = clip_line([-16.0, 16.0], [48.0, 16.0], [0.0, 0.0, 32.0, 32.0]).unwrap();
        assert_eq!(a, [0.0, 16.0]);
        assert_eq!(b, [32.0, 16.0]);
        assert!(clip_line([40.0, 0.0], [50.0, 10.0], [0.0, 0.0, 32.0, 32.0]).is_none());
        // Touching a corner leaves nothing.
        assert!(clip_line([32.0, 32.0], [40.0, 40.0], [0.0, 0.0, 32.0, 32.0]).is_none());
    }

    #[test]
    fn rectangle_backdrops_and_segments() {
        // Spans tiles 0..3 horizontally and rows 0..2.
        let rect = [[10.0, 10.0], [70.0, 10.0], [70.0, 50.0], [10.0, 50.0]];
        let path = tile_fill(&rect, [4, 4]);
        assert_eq!(path.bbox, [0, 0, 3, 2]);
        let backdrops: Vec<i32> = path.tiles.iter().map(|t| t.backdrop).collect();
        // The left edge goes up and the right edge down across the top of
        // row 1.
        assert_eq!(backdrops, vec![0, 0, 0, 0, 1, 0]);
        let counts: Vec<usize> = path.tiles.iter().map(|t| t.segs.len()).collect();
        assert_eq!(counts, vec![2, 1, 2, 2, 1, 2]);
        let y_edges = |ix: usize| -> Vec<f32> {
            path.tiles[ix]
                .segs
                .iter()
                .map(|s| s.y_edge)
                .filter(|&y| y != Y_EDGE_NONE)
                .collect()
        };
        // The horizontal edges cross into the middle and right columns.
        assert_eq!(y_edges(0), Vec::<f32>::new());
        assert_eq!(y_edges(1), vec![10.0]);
        assert_eq!(y_edges(2), vec![10.0]);
        assert_eq!(y_edges(4), vec![50.0]);
        assert_eq!(y_edges(5), vec![50.0]);
    }

    #[test]
    fn y_edge_marks_left_side_crossings() {
        let triangle = [[4.0, 4.0], [60.0, 20.0], [4.0, 28.0]];
        let path = tile_fill(&triangle, [2, 1]);
        let right = &path.tiles[1];
        let y_edges: Vec<f32> = right.segs.iter().map(|s| s.y_edge).collect();
        assert_eq!(y_edges.len(), 2);
        assert!((y_edges[0] - 12.0).abs() < 1e-4);
        assert!((y_edges[1] - 24.0).abs() < 1e-4);
    }

    #[test]
    fn boundary_vertex_crosses_once() {
        // The polyline turns on the left side of tile 1 and heads right.
        let points = [[10.0, 4.0], [32.0, 10.0], [50.0, 20.0], [10.0, 28.0]];
        let path = tile_fill(&points, [2, 1]);
        let crossings = path.tiles[1]
            .segs
            .iter()
            .filter(|s| s.y_edge != Y_EDGE_NONE)
            .count();
        assert_eq!(crossings, 2);
    }

    #[test]
    fn edges_along_the_left_side_do_not_cross() {
        // A one pixel column at the left of its tile.
        let path = tile_fill(&[[32.0, 0.0], [33.0, 0.0], [33.0, 32.0], [32.0, 32.0]], [2, 1]);
        assert!(path.tiles[0]
            .segs
            .iter()
            .all(|s| s.y_edge == Y_EDGE_NONE));
    }

    #[test]
    fn stroke_segments_reach_padded_tiles() {
        let path = tile_stroke(&[[2.0, 2.0], [30.0, 2.0]], 2.0, [3, 3]);
        assert_eq!(path.bbox, [0, 0, 2, 1]);
        assert_eq!(path.tiles[0].segs.len(), 1);
        // 30 + 2 + 1 reaches into tile 1.
        assert_eq!(path.tiles[1].segs.len(), 1);
    }
}
