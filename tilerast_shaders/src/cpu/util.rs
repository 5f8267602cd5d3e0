// Copyright 2026 the Tilerast Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Utility types

use std::ops::Mul;

#[derive(Clone, Copy, Default, Debug, PartialEq)]
#[repr(C)]
pub struct Vec2 {
    pub x: f32,
    pub y: f32,
}

impl std::ops::Add for Vec2 {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self {
            x: self.x + rhs.x,
            y: self.y + rhs.y,
        }
    }
}

impl std::ops::Sub for Vec2 {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self {
        Self {
            x: self.x - rhs.x,
            y: self.y - rhs.y,
        }
    }
}

impl Mul<f32> for Vec2 {
    type Output = Self;

    fn mul(self, rhs: f32) -> Self {
        Self {
            x: self.x * rhs,
            y: self.y * rhs,
        }
    }
}

impl Vec2 {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn splat(v: f32) -> Self {
        Self { x: v, y: v }
    }

    pub fn from_array(a: [f32; 2]) -> Self {
        Self { x: a[0], y: a[1] }
    }

    pub fn dot(self, other: Self) -> f32 {
        self.x * other.x + self.y * other.y
    }

    pub fn length(self) -> f32 {
        self.x.hypot(self.y)
    }

    pub fn length_squared(self) -> f32 {
        self.dot(self)
    }
}

/// Linear interpolation, `mix` in shading languages.
pub fn mix(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

/// `sign` in shading languages: unlike [`f32::signum`], zero maps to zero.
pub fn sign(x: f32) -> f32 {
    if x > 0.0 {
        1.0
    } else if x < 0.0 {
        -1.0
    } else {
        0.0
    }
}

pub fn unpack4x8unorm(x: u32) -> [f32; 4] {
    let mut result = [0.0; 4];
    for i in 0..4 {
        result[i] = ((x >> (i * 8)) & 0xff) as f32 * (1.0 / 255.0);
    }
    result
}

pub fn pack4x8unorm(x: [f32; 4]) -> u32 {
    let mut result = 0;
    for i in 0..4 {
        let byte = (x[i].clamp(0.0, 1.0) * 255.0).round() as u32;
        result |= byte << (i * 8);
    }
    result
}

/// Linear to sRGB transfer function for one channel.
pub fn to_srgb(linear: f32) -> f32 {
    if linear >= 0.0031308 {
        1.055 * linear.powf(1.0 / 2.4) - 0.055
    } else {
        12.92 * linear
    }
}

/// sRGB to linear transfer function for one channel (EXT_sRGB).
pub fn from_srgb(srgb: f32) -> f32 {
    if srgb >= 0.04045 {
        ((srgb + 0.055) / 1.055).powf(2.4)
    } else {
        srgb / 12.92
    }
}

/// Unpacks a `0xRRGGBBAA` sRGB color into linear `[r, g, b, a]`.
pub fn unpack_srgb(srgba: u32) -> [f32; 4] {
    let [a, b, g, r] = unpack4x8unorm(srgba);
    [from_srgb(r), from_srgb(g), from_srgb(b), a]
}

/// Packs linear `[r, g, b, a]` into `0xRRGGBBAA` sRGB.
pub fn pack_srgb(rgba: [f32; 4]) -> u32 {
    pack4x8unorm([rgba[3], to_srgb(rgba[2]), to_srgb(rgba[1]), to_srgb(rgba[0])])
}

/// Converts the color channels of a texel from sRGB to linear.
pub fn texel_to_linear(texel: [f32; 4]) -> [f32; 4] {
    [
        from_srgb(texel[0]),
        from_srgb(texel[1]),
        from_srgb(texel[2]),
        texel[3],
    ]
}

/// Converts the color channels of a texel from linear to sRGB.
pub fn texel_to_srgb(texel: [f32; 4]) -> [f32; 4] {
    [
        to_srgb(texel[0]),
        to_srgb(texel[1]),
        to_srgb(texel[2]),
        texel[3],
    ]
}
