// SPDX-FileCopyrightText: 2025 Jens Pitkänen <jens.pitkanen@helsinki.fi>
//
// SPDX-License-Identifier: GPL-3.0-or-later

use bytemuck::{Pod, Zeroable};

/// 8-bit per channel RGBA color, laid out in memory exactly like the
/// [`VertexElementFormat::Color`](crate::VertexElementFormat::Color) vertex
/// element: `[red, green, blue, alpha]`.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Zeroable, Pod)]
#[repr(C)]
pub struct Color {
    /// The red channel.
    pub r: u8,
    /// The green channel.
    pub g: u8,
    /// The blue channel.
    pub b: u8,
    /// The alpha channel.
    pub a: u8,
}

#[allow(missing_docs)]
impl Color {
    pub const TRANSPARENT: Color = Color::new(0, 0, 0, 0);
    pub const BLACK: Color = Color::new(0, 0, 0, 0xFF);
    pub const WHITE: Color = Color::new(0xFF, 0xFF, 0xFF, 0xFF);
    pub const RED: Color = Color::new(0xFF, 0, 0, 0xFF);
    pub const GREEN: Color = Color::new(0, 0xFF, 0, 0xFF);
    pub const BLUE: Color = Color::new(0, 0, 0xFF, 0xFF);
    pub const CORNFLOWER_BLUE: Color = Color::new(0x64, 0x95, 0xED, 0xFF);
}

impl Color {
    /// Creates a [`Color`] from its channels.
    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Color {
        Color { r, g, b, a }
    }

    /// Creates a [`Color`] from floating point channels in the range `0..=1`.
    /// Values outside the range are clamped.
    pub fn from_floats([r, g, b, a]: [f32; 4]) -> Color {
        fn channel(value: f32) -> u8 {
            (value.clamp(0.0, 1.0) * 255.0).round() as u8
        }
        Color::new(channel(r), channel(g), channel(b), channel(a))
    }

    /// Returns the channels as floats in the range `0..=1`, in RGBA order.
    pub fn to_floats(self) -> [f32; 4] {
        [
            self.r as f32 / 255.0,
            self.g as f32 / 255.0,
            self.b as f32 / 255.0,
            self.a as f32 / 255.0,
        ]
    }

    /// The color as a single `u32`, red in the lowest byte. On little-endian
    /// machines this has the same memory representation as [`Color`].
    pub const fn packed_value(self) -> u32 {
        u32::from_le_bytes([self.r, self.g, self.b, self.a])
    }

    /// Multiplies every channel (including alpha) by `alpha`.
    pub fn multiply_alpha(self, alpha: f32) -> Color {
        let [r, g, b, a] = self.to_floats();
        Color::from_floats([r * alpha, g * alpha, b * alpha, a * alpha])
    }
}

#[cfg(test)]
mod tests {
    use super::Color;

    #[test]
    fn color_is_four_packed_bytes() {
        assert_eq!(4, size_of::<Color>());
        assert_eq!(
            [0x11, 0x22, 0x33, 0x44],
            bytemuck::bytes_of(&Color::new(0x11, 0x22, 0x33, 0x44))
        );
        assert_eq!(0x4433_2211, Color::new(0x11, 0x22, 0x33, 0x44).packed_value());
    }

    #[test]
    fn float_conversion_clamps() {
        assert_eq!(Color::RED, Color::from_floats([1.5, -1.0, 0.0, 1.0]));
        assert_eq!([1.0, 0.0, 0.0, 1.0], Color::RED.to_floats());
    }
}
