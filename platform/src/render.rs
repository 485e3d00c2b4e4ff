// SPDX-FileCopyrightText: 2024 Jens Pitkänen <jens.pitkanen@helsinki.fi>
//
// SPDX-License-Identifier: GPL-3.0-or-later

use core::mem::size_of;

use bytemuck::{Pod, Zeroable};

use crate::{
    Color, GraphicsError, VertexDeclaration, VertexElement, VertexElementFormat,
    VertexElementUsage, VertexType,
};

/// How vertices are assembled into primitives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PrimitiveType {
    /// Every three vertices form a triangle.
    TriangleList,
    /// The first three vertices form a triangle, and every vertex after that
    /// forms a triangle with the two vertices before it.
    TriangleStrip,
    /// Every two vertices form a line.
    LineList,
    /// The first two vertices form a line, and every vertex after that forms
    /// a line with the vertex before it.
    LineStrip,
    /// Every vertex is a point.
    PointList,
}

impl PrimitiveType {
    /// Returns the amount of vertices `primitive_count` primitives of this
    /// type consist of, or `None` if that doesn't fit in a `usize`.
    pub const fn vertex_count(self, primitive_count: usize) -> Option<usize> {
        match self {
            PrimitiveType::TriangleList => primitive_count.checked_mul(3),
            PrimitiveType::TriangleStrip => primitive_count.checked_add(2),
            PrimitiveType::LineList => primitive_count.checked_mul(2),
            PrimitiveType::LineStrip => primitive_count.checked_add(1),
            PrimitiveType::PointList => Some(primitive_count),
        }
    }
}

/// Conversion from the raw values used across scripting and FFI boundaries.
/// Unknown values are an error, they never map to a default.
impl TryFrom<i32> for PrimitiveType {
    type Error = GraphicsError;

    fn try_from(value: i32) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(PrimitiveType::TriangleList),
            1 => Ok(PrimitiveType::TriangleStrip),
            2 => Ok(PrimitiveType::LineList),
            3 => Ok(PrimitiveType::LineStrip),
            4 => Ok(PrimitiveType::PointList),
            _ => Err(GraphicsError::UnsupportedPrimitiveType(value)),
        }
    }
}

bitflags::bitflags! {
    /// The parts of the render target affected by
    /// [`GraphicsDevice::clear`](crate::GraphicsDevice::clear).
    pub struct ClearOptions: u32 {
        /// The color buffer.
        const TARGET = 0x1;
        /// The depth buffer.
        const DEPTH_BUFFER = 0x2;
        /// The stencil buffer.
        const STENCIL = 0x4;
    }
}

/// Usage hint for buffers.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum BufferUsage {
    /// No restrictions.
    #[default]
    None,
    /// The buffer is only written to by the application.
    WriteOnly,
}

/// How a buffer upload interacts with draws which may still be reading the
/// buffer.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum SetDataOptions {
    /// Just write the data.
    #[default]
    None,
    /// The previous contents of the buffer are not needed anymore, so the
    /// backend can allocate fresh storage instead of waiting for in-flight
    /// draws.
    Discard,
    /// The caller promises not to overwrite anything in-flight draws use.
    NoOverwrite,
}

/// Vertex with a position and a color.
#[derive(Debug, Default, Clone, Copy, PartialEq)]
#[repr(C)]
pub struct VertexPositionColor {
    #[allow(missing_docs)]
    pub position: [f32; 3],
    #[allow(missing_docs)]
    pub color: Color,
}

// Safety: VertexPositionColor is inhabited and all zeroes is a valid value for
// it, all the fields are Zeroable.
unsafe impl Zeroable for VertexPositionColor {}

// Safety: manually checked, f32 typed position followed by a 4-byte, 1-aligned
// color. repr(C), 4-aligned, 16 bytes, no padding, no pointers or interior
// mutability, and every field is Pod.
unsafe impl Pod for VertexPositionColor {}

impl VertexPositionColor {
    /// Creates a new [`VertexPositionColor`].
    pub const fn new(position: [f32; 3], color: Color) -> VertexPositionColor {
        VertexPositionColor { position, color }
    }
}

impl VertexType for VertexPositionColor {
    fn declaration() -> VertexDeclaration {
        use VertexElementFormat as F;
        use VertexElementUsage as U;
        declaration_of::<Self>(&[
            VertexElement::new(0, F::Vector3, U::Position, 0),
            VertexElement::new(12, F::Color, U::Color, 0),
        ])
    }
}

/// Vertex with a position and a texture coordinate.
#[derive(Debug, Default, Clone, Copy, PartialEq)]
#[repr(C)]
pub struct VertexPositionTexture {
    #[allow(missing_docs)]
    pub position: [f32; 3],
    /// The texture coordinate, `[0, 0]` being the top-left corner of the
    /// texture.
    pub texture_coordinate: [f32; 2],
}

// Safety: all fields are f32 arrays, so all zeroes is valid.
unsafe impl Zeroable for VertexPositionTexture {}

// Safety: five tightly packed f32s in a repr(C) struct: no padding, no
// pointers, any bit pattern is valid.
unsafe impl Pod for VertexPositionTexture {}

impl VertexType for VertexPositionTexture {
    fn declaration() -> VertexDeclaration {
        use VertexElementFormat as F;
        use VertexElementUsage as U;
        declaration_of::<Self>(&[
            VertexElement::new(0, F::Vector3, U::Position, 0),
            VertexElement::new(12, F::Vector2, U::TextureCoordinate, 0),
        ])
    }
}

/// Vertex with a position, a color, and a texture coordinate.
#[derive(Debug, Default, Clone, Copy, PartialEq)]
#[repr(C)]
pub struct VertexPositionColorTexture {
    #[allow(missing_docs)]
    pub position: [f32; 3],
    /// Multiplied with the texture's color.
    pub color: Color,
    /// The texture coordinate, `[0, 0]` being the top-left corner of the
    /// texture.
    pub texture_coordinate: [f32; 2],
}

// Safety: VertexPositionColorTexture is inhabited and all zeroes is a valid
// value for it, all the fields are Zeroable.
unsafe impl Zeroable for VertexPositionColorTexture {}

// Safety: manually checked for the layout `[f32; 3]`, `[u8; 4]`, `[f32; 2]`:
// - The type must be inhabited: it is.
// - The type must allow any bit pattern: it does, f32 and u8 are Pod.
// - The type must not contain any uninit (or padding) bytes: it does not, the
//   color ends at byte 16 which is 4-aligned for the texture coordinate, and
//   the struct ends at byte 24.
// - The type needs to be `repr(C)`: it is.
// - No pointers or interior mutability.
unsafe impl Pod for VertexPositionColorTexture {}

impl VertexType for VertexPositionColorTexture {
    fn declaration() -> VertexDeclaration {
        use VertexElementFormat as F;
        use VertexElementUsage as U;
        declaration_of::<Self>(&[
            VertexElement::new(0, F::Vector3, U::Position, 0),
            VertexElement::new(12, F::Color, U::Color, 0),
            VertexElement::new(16, F::Vector2, U::TextureCoordinate, 0),
        ])
    }
}

fn declaration_of<T>(elements: &[VertexElement]) -> VertexDeclaration {
    match VertexDeclaration::with_stride(size_of::<T>(), elements) {
        Ok(declaration) => declaration,
        Err(err) => unreachable!("built-in vertex declaration is invalid: {err}"),
    }
}
