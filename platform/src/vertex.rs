// SPDX-FileCopyrightText: 2025 Jens Pitkänen <jens.pitkanen@helsinki.fi>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Descriptions of the binary layout of vertex data.
//!
//! A [`VertexDeclaration`] is the equivalent of a `#[repr(C)]` struct
//! definition for the GPU: offsets are byte offsets from the start of one
//! vertex, and the stride is the distance between two consecutive vertices.
//! The declaration is a contract between the code uploading vertex data and
//! the backend reading it. Nothing checks that the uploaded bytes actually
//! match it.

use std::sync::Arc;

use bytemuck::Pod;

use crate::GraphicsError;

/// The data type of a single vertex element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VertexElementFormat {
    /// One `f32`.
    Single,
    /// Two `f32`s.
    Vector2,
    /// Three `f32`s.
    Vector3,
    /// Four `f32`s.
    Vector4,
    /// Four `u8`s, normalized to `0..=1`, in RGBA order. See
    /// [`Color`](crate::Color).
    Color,
    /// Four `u8`s, not normalized.
    Byte4,
    /// Two `i16`s, not normalized.
    Short2,
    /// Four `i16`s, not normalized.
    Short4,
    /// Two `i16`s, normalized to `-1..=1`.
    NormalizedShort2,
    /// Four `i16`s, normalized to `-1..=1`.
    NormalizedShort4,
    /// Two half-precision floats.
    HalfVector2,
    /// Four half-precision floats.
    HalfVector4,
}

impl VertexElementFormat {
    /// Size of the element in bytes.
    pub const fn size(self) -> usize {
        match self {
            VertexElementFormat::Single => 4,
            VertexElementFormat::Vector2 => 8,
            VertexElementFormat::Vector3 => 12,
            VertexElementFormat::Vector4 => 16,
            VertexElementFormat::Color => 4,
            VertexElementFormat::Byte4 => 4,
            VertexElementFormat::Short2 => 4,
            VertexElementFormat::Short4 => 8,
            VertexElementFormat::NormalizedShort2 => 4,
            VertexElementFormat::NormalizedShort4 => 8,
            VertexElementFormat::HalfVector2 => 4,
            VertexElementFormat::HalfVector4 => 8,
        }
    }

    /// The amount of scalar components in the element, e.g. 3 for
    /// [`VertexElementFormat::Vector3`].
    pub const fn component_count(self) -> usize {
        match self {
            VertexElementFormat::Single => 1,
            VertexElementFormat::Vector2
            | VertexElementFormat::Short2
            | VertexElementFormat::NormalizedShort2
            | VertexElementFormat::HalfVector2 => 2,
            VertexElementFormat::Vector3 => 3,
            VertexElementFormat::Vector4
            | VertexElementFormat::Color
            | VertexElementFormat::Byte4
            | VertexElementFormat::Short4
            | VertexElementFormat::NormalizedShort4
            | VertexElementFormat::HalfVector4 => 4,
        }
    }
}

/// What a vertex element is used for, i.e. which shader input it feeds.
#[allow(missing_docs)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VertexElementUsage {
    Position,
    Color,
    TextureCoordinate,
    Normal,
    Binormal,
    Tangent,
    BlendIndices,
    BlendWeight,
    Depth,
    Fog,
    PointSize,
    Sample,
    TessellateFactor,
}

/// One element of a vertex, e.g. the position or the color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct VertexElement {
    /// Offset of the element from the start of the vertex, in bytes.
    pub offset: usize,
    /// The data type of the element.
    pub format: VertexElementFormat,
    /// What the element is used for.
    pub usage: VertexElementUsage,
    /// Distinguishes elements with the same usage, e.g. multiple texture
    /// coordinates.
    pub usage_index: u32,
}

impl VertexElement {
    /// Creates a new [`VertexElement`].
    pub const fn new(
        offset: usize,
        format: VertexElementFormat,
        usage: VertexElementUsage,
        usage_index: u32,
    ) -> VertexElement {
        VertexElement {
            offset,
            format,
            usage,
            usage_index,
        }
    }

    /// The byte offset right after this element.
    pub const fn end(&self) -> usize {
        self.offset + self.format.size()
    }
}

/// The layout of one vertex: an ordered list of elements and the stride
/// between consecutive vertices.
///
/// Immutable after creation. Cloning is cheap, the element list is shared.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct VertexDeclaration {
    elements: Arc<[VertexElement]>,
    stride: usize,
}

impl VertexDeclaration {
    /// Creates a declaration with the stride computed from the elements: the
    /// end of the last-ending element.
    pub fn new(elements: &[VertexElement]) -> Result<VertexDeclaration, GraphicsError> {
        let stride = required_stride(elements)?;
        Ok(VertexDeclaration {
            elements: elements.into(),
            stride,
        })
    }

    /// Creates a declaration with an explicit stride, e.g. for vertices with
    /// trailing padding or with data the GPU doesn't read.
    pub fn with_stride(
        stride: usize,
        elements: &[VertexElement],
    ) -> Result<VertexDeclaration, GraphicsError> {
        let required = required_stride(elements)?;
        if stride < required {
            return Err(GraphicsError::InvalidVertexStride { stride, required });
        }
        Ok(VertexDeclaration {
            elements: elements.into(),
            stride,
        })
    }

    /// The elements, in the order they were declared in.
    pub fn elements(&self) -> &[VertexElement] {
        &self.elements
    }

    /// The distance between consecutive vertices, in bytes.
    pub fn stride(&self) -> usize {
        self.stride
    }

    /// Finds the element with the given usage and usage index.
    pub fn element(&self, usage: VertexElementUsage, usage_index: u32) -> Option<&VertexElement> {
        self.elements
            .iter()
            .find(|element| element.usage == usage && element.usage_index == usage_index)
    }
}

fn required_stride(elements: &[VertexElement]) -> Result<usize, GraphicsError> {
    elements
        .iter()
        .map(VertexElement::end)
        .max()
        .ok_or(GraphicsError::EmptyVertexDeclaration)
}

/// Vertex types with a fixed, known layout.
///
/// Implementors must make sure [`VertexType::declaration`] describes the
/// actual memory layout of the type: it is what the backends use to
/// interpret the bytes of `&[Self]`.
pub trait VertexType: Pod {
    /// The layout of `Self`.
    fn declaration() -> VertexDeclaration;
}
