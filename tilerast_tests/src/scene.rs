// Copyright 2026 the Tilerast Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use tilerast::{CpuTexture, EncodedScene, Renderer};
use tilerast_encoding::{
    Alloc, AnnoBeginClip, AnnoColor, AnnoEndClip, AnnoImage, Annotated, CmdImage, ConfigUniform,
    Encode, Encoder, Path, Ref, TagFlags, Tile, TileSeg, PTCL_INITIAL_ALLOC, TILE_HEIGHT_PX,
    TILE_WIDTH_PX,
};

use crate::geometry::{bounds, tile_fill, tile_stroke, PathTiles, Point};
use crate::tapes::{Draw, FixtureTapes};

struct Element {
    anno: Annotated,
    tiles: PathTiles,
    draw: Draw,
}

/// Builds encoded scenes from polygons, standing in for the upstream
/// encoder and tiling stages.
///
/// Fills use the nonzero rule. Clips must be balanced when the scene is built.
pub struct SceneBuilder {
    grid: [u32; 2],
    elements: Vec<Element>,
    clip_bboxes: Vec<[f32; 4]>,
    split_after: Option<usize>,
}

/// A built scene with the coarse stage that writes its tapes.
pub struct Fixture {
    pub scene: EncodedScene,
    pub tapes: FixtureTapes,
}

/// The corners of an axis aligned rectangle.
pub fn rect(x0: f32, y0: f32, x1: f32, y1: f32) -> Vec<Point> {
    vec![[x0, y0], [x1, y0], [x1, y1], [x0, y1]]
}

impl SceneBuilder {
    pub fn new(width_in_tiles: u32, height_in_tiles: u32) -> Self {
        Self {
            grid: [width_in_tiles, height_in_tiles],
            elements: Vec::new(),
            clip_bboxes: Vec::new(),
            split_after: None,
        }
    }

    /// Fills a polygon with a solid sRGB color packed as `0xRRGGBBAA`.
    pub fn fill(&mut self, points: &[Point], rgba: u32) -> &mut Self {
        let anno = Annotated::Color(
            TagFlags::NONZERO,
            AnnoColor {
                bbox: bounds(points, 0.0),
                linewidth: 0.0,
                rgba_color: rgba,
            },
        );
        self.push(anno, tile_fill(points, self.grid), Draw::Fill { rgba })
    }

    /// Strokes an open polyline.
    pub fn stroke(&mut self, points: &[Point], half_width: f32, rgba: u32) -> &mut Self {
        let anno = Annotated::Color(
            TagFlags::STROKE,
            AnnoColor {
                bbox: bounds(points, half_width),
                linewidth: 2.0 * half_width,
                rgba_color: rgba,
            },
        );
        let tiles = tile_stroke(points, half_width, self.grid);
        self.push(anno, tiles, Draw::Stroke { half_width, rgba })
    }

    /// Fills a polygon with image `index`, sampled at the pixel position plus
    /// `offset`.
    pub fn fill_image(&mut self, points: &[Point], index: u32, offset: [i16; 2]) -> &mut Self {
        let anno = Annotated::Image(
            TagFlags::NONZERO,
            AnnoImage {
                bbox: bounds(points, 0.0),
                linewidth: 0.0,
                index,
                offset,
            },
        );
        let draw = Draw::Image(CmdImage { index, offset });
        self.push(anno, tile_fill(points, self.grid), draw)
    }

    /// Starts drawing into a layer masked by the polygon.
    pub fn push_clip(&mut self, points: &[Point]) -> &mut Self {
        let bbox = bounds(points, 0.0);
        self.clip_bboxes.push(bbox);
        let anno = Annotated::BeginClip(
            TagFlags::NONZERO,
            AnnoBeginClip {
                bbox,
                linewidth: 0.0,
            },
        );
        self.push(anno, tile_fill(points, self.grid), Draw::PushClip)
    }

    pub fn pop_clip(&mut self) -> &mut Self {
        let bbox = self.clip_bboxes.pop().expect("pop_clip without push_clip");
        let anno = Annotated::EndClip(AnnoEndClip { bbox });
        self.push(anno, PathTiles::default(), Draw::PopClip)
    }

    /// Chains every tape to a new chunk after `n_cmds` commands, so tapes
    /// exercise `Jump` well before running out of room.
    pub fn split_tapes_after(&mut self, n_cmds: usize) -> &mut Self {
        self.split_after = Some(n_cmds);
        self
    }

    fn push(&mut self, anno: Annotated, tiles: PathTiles, draw: Draw) -> &mut Self {
        self.elements.push(Element { anno, tiles, draw });
        self
    }

    /// Encodes the elements, their paths and tiles, and an empty tape area.
    pub fn build(&self) -> Fixture {
        assert!(self.clip_bboxes.is_empty(), "unbalanced clips");
        let mut encoder = Encoder::new();
        0_u32.encode(&mut encoder);
        let anno_start = encoder.len();
        for element in &self.elements {
            element.anno.encode(&mut encoder);
        }
        let tile_start = encoder.len();
        let path_refs: Vec<Ref<Path>> = self
            .elements
            .iter()
            .map(|element| Path::new(element.tiles.bbox, 0).encode(&mut encoder))
            .collect();
        let mut tile_refs = Vec::new();
        for (element, path_ref) in self.elements.iter().zip(&path_refs) {
            let tiles = encoder.len();
            encoder.patch(*path_ref, &Path::new(element.tiles.bbox, tiles));
            let refs: Vec<Ref<Tile>> = element
                .tiles
                .tiles
                .iter()
                .map(|tile| {
                    Tile {
                        tile: 0,
                        backdrop: tile.backdrop,
                    }
                    .encode(&mut encoder)
                })
                .collect();
            tile_refs.push(refs);
        }
        for (element, refs) in self.elements.iter().zip(&tile_refs) {
            for (tile, tile_ref) in element.tiles.tiles.iter().zip(refs) {
                // Encoded back to front, each segment links to the one after it.
                let head = tile.segs.iter().rev().fold(0, |next, seg| {
                    TileSeg { next, ..*seg }.encode(&mut encoder).offset()
                });
                encoder.patch(
                    *tile_ref,
                    &Tile {
                        tile: head,
                        backdrop: tile.backdrop,
                    },
                );
            }
        }
        let tile_end = encoder.len();
        let n_tiles = self.grid[0] * self.grid[1];
        let (ptcl_start, _) = encoder.alloc_chunk(n_tiles * PTCL_INITIAL_ALLOC);
        let n_elements = self.elements.len() as u32;
        let config = ConfigUniform {
            n_elements,
            width_in_tiles: self.grid[0],
            height_in_tiles: self.grid[1],
            anno_alloc: Alloc::new(anno_start, n_elements * Annotated::SIZE),
            tile_alloc: Alloc::new(tile_start, tile_end - tile_start),
            ptcl_alloc: Alloc::new(ptcl_start, n_tiles * PTCL_INITIAL_ALLOC),
        };
        Fixture {
            scene: EncodedScene::from_encoder(config, encoder),
            tapes: FixtureTapes {
                draws: self.elements.iter().map(|element| element.draw).collect(),
                split_after: self.split_after,
            },
        }
    }
}

impl Fixture {
    /// A transparent target covering the tile grid.
    pub fn target(&self) -> CpuTexture {
        let config = &self.scene.config;
        CpuTexture::new(
            (config.width_in_tiles * TILE_WIDTH_PX) as usize,
            (config.height_in_tiles * TILE_HEIGHT_PX) as usize,
        )
    }

    /// Renders into a fresh target with `renderer`'s heap settings.
    pub fn render(
        &self,
        renderer: &Renderer,
        images: &[CpuTexture],
    ) -> Result<CpuTexture, tilerast::Error> {
        let mut target = self.target();
        renderer.render(&self.scene, &self.tapes, images, &mut target)?;
        Ok(target)
    }
}
