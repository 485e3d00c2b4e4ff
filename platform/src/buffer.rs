// SPDX-FileCopyrightText: 2025 Jens Pitkänen <jens.pitkanen@helsinki.fi>
//
// SPDX-License-Identifier: GPL-3.0-or-later

use crate::{BufferUsage, GraphicsResource, ResourceId, VertexDeclaration};

/// Backend-specific buffer reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NativeBuffer(u64);

impl NativeBuffer {
    /// Creates a new [`NativeBuffer`]. Should only be created in the backend
    /// implementation, which also knows how the inner value is going to be
    /// used.
    pub fn new(id: u64) -> NativeBuffer {
        NativeBuffer(id)
    }

    /// Returns the inner value passed into [`NativeBuffer::new`]. Generally
    /// only relevant to the backend implementation.
    pub fn inner(self) -> u64 {
        self.0
    }
}

/// A buffer of vertices in GPU memory, created with
/// [`GraphicsDevice::create_vertex_buffer`].
///
/// This is a reference to the storage owned by the device: clones refer to
/// the same buffer, and disposing through any of them disposes it for all.
///
/// [`GraphicsDevice::create_vertex_buffer`]: crate::GraphicsDevice::create_vertex_buffer
#[derive(Debug, Clone, PartialEq)]
pub struct VertexBuffer {
    pub(crate) id: ResourceId,
    pub(crate) native: NativeBuffer,
    pub(crate) declaration: VertexDeclaration,
    pub(crate) vertex_count: usize,
    pub(crate) usage: BufferUsage,
    pub(crate) dynamic: bool,
}

impl VertexBuffer {
    /// The layout of the vertices in this buffer.
    pub fn declaration(&self) -> &VertexDeclaration {
        &self.declaration
    }

    /// The amount of vertices this buffer has room for. Fixed at creation.
    pub fn vertex_count(&self) -> usize {
        self.vertex_count
    }

    #[allow(missing_docs)]
    pub fn usage(&self) -> BufferUsage {
        self.usage
    }

    /// True if the buffer was created for frequent updates.
    pub fn is_dynamic(&self) -> bool {
        self.dynamic
    }

    /// The size of the buffer's storage: vertex count times stride.
    pub fn size_in_bytes(&self) -> usize {
        self.vertex_count * self.declaration.stride()
    }

    /// The backend's handle for this buffer.
    pub fn native(&self) -> NativeBuffer {
        self.native
    }
}

impl GraphicsResource for VertexBuffer {
    fn resource_id(&self) -> ResourceId {
        self.id
    }
}
