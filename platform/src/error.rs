// SPDX-FileCopyrightText: 2025 Jens Pitkänen <jens.pitkanen@helsinki.fi>
//
// SPDX-License-Identifier: GPL-3.0-or-later

use crate::{DeviceState, PresentInterval};

/// Errors returned by the graphics device, its backends and the platform
/// implementations.
///
/// Nothing in this layer retries or rolls back: an error means the operation
/// did not happen (or, for [`GraphicsDevice::reset`], happened partially) and
/// the caller decides what to do next.
///
/// [`GraphicsDevice::reset`]: crate::GraphicsDevice::reset
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum GraphicsError {
    /// A parameter was invalid. Checked before any native call is made.
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(&'static str),
    /// A [`VertexDeclaration`](crate::VertexDeclaration) was created without
    /// any elements.
    #[error("vertex declarations need at least one element")]
    EmptyVertexDeclaration,
    /// An explicit vertex stride was too small to fit all the elements.
    #[error("vertex stride {stride} is smaller than the {required} bytes the elements need")]
    InvalidVertexStride {
        /// The stride that was passed in.
        stride: usize,
        /// The end of the last-ending element, i.e. the smallest valid stride.
        required: usize,
    },
    /// A draw referred to vertices past the end of the bound vertex buffer or
    /// the passed in vertex data.
    #[error("vertices {first}..{end} are out of bounds for {available} vertices")]
    VertexRangeOutOfBounds {
        /// The first vertex the draw would read.
        first: usize,
        /// One past the last vertex the draw would read.
        end: usize,
        /// The amount of vertices actually available.
        available: usize,
    },
    /// A buffer upload would have written past the end of the buffer's
    /// original allocation.
    #[error("writing {len} bytes at offset {offset} overflows a buffer of {capacity} bytes")]
    BufferOverflow {
        /// Byte offset of the upload.
        offset: usize,
        /// Length of the upload in bytes.
        len: usize,
        /// Size of the buffer in bytes.
        capacity: usize,
    },
    /// A draw was issued without a vertex buffer set.
    #[error("no vertex buffer is set")]
    NoVertexBuffer,
    /// The device (or window, or context) could not be created at the native
    /// layer.
    #[error("could not create the graphics device: {0}")]
    DeviceCreation(String),
    /// There's no adapter (display) with the given index.
    #[error("graphics adapter {0} is not available")]
    AdapterUnavailable(usize),
    /// A native call failed after the device was created.
    #[error("native graphics call failed: {0}")]
    Native(String),
    /// The backend can't do the requested operation.
    #[error("unsupported operation: {0}")]
    Unsupported(&'static str),
    /// A raw primitive type value did not match any [`PrimitiveType`].
    ///
    /// [`PrimitiveType`]: crate::PrimitiveType
    #[error("unsupported primitive type {0}")]
    UnsupportedPrimitiveType(i32),
    /// A presentation interval the backend (or the raw value conversion)
    /// doesn't support.
    #[error("unsupported presentation interval {0:?}")]
    UnsupportedPresentInterval(PresentIntervalValue),
    /// A native entry point that is marked as required was not found.
    #[error("required native entry point {0} was not found")]
    MissingEntryPoint(&'static str),
    /// The operation is not valid in the device's current state.
    #[error("{operation} is not valid while the device is {state:?}")]
    InvalidDeviceState {
        /// Name of the attempted operation.
        operation: &'static str,
        /// The state the device was in.
        state: DeviceState,
    },
    /// The engine driving the run loop was used out of order, e.g. run after
    /// being disposed.
    #[error("invalid engine state: {0}")]
    InvalidEngineState(&'static str),
    /// The resource has already been disposed.
    #[error("the graphics resource has been disposed")]
    StaleResource,
}

/// The value carried by [`GraphicsError::UnsupportedPresentInterval`]: either
/// a known interval a backend can't honor, or a raw value which isn't an
/// interval at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PresentIntervalValue {
    /// A valid interval that the backend does not support.
    Interval(PresentInterval),
    /// A raw swap interval value.
    Raw(i32),
}
