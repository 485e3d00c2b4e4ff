// SPDX-FileCopyrightText: 2025 Jens Pitkänen <jens.pitkanen@helsinki.fi>
//
// SPDX-License-Identifier: GPL-3.0-or-later

use serde::{Deserialize, Serialize};

use crate::{GraphicsError, PresentIntervalValue, Rectangle, SurfaceFormat, WindowHandle};

/// Vsync policy: how [`GraphicsDevice::present`] paces frames against the
/// display's refresh.
///
/// [`GraphicsDevice::present`]: crate::GraphicsDevice::present
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PresentInterval {
    /// Same as [`PresentInterval::One`].
    #[default]
    Default,
    /// Wait for one vertical blank, adaptively if the platform supports it.
    One,
    /// Wait for two vertical blanks.
    Two,
    /// Don't wait.
    Immediate,
}

impl PresentInterval {
    /// The native swap interval for this policy. Negative means adaptive
    /// vsync ("late swap tearing"): wait for the vertical blank unless the
    /// frame already missed it.
    pub const fn swap_interval(self, late_swap_tear: bool) -> i32 {
        match self {
            PresentInterval::Default | PresentInterval::One if late_swap_tear => -1,
            PresentInterval::Default | PresentInterval::One => 1,
            PresentInterval::Two => 2,
            PresentInterval::Immediate => 0,
        }
    }
}

/// Conversion from the raw values used across scripting and FFI boundaries.
impl TryFrom<i32> for PresentInterval {
    type Error = GraphicsError;

    fn try_from(value: i32) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(PresentInterval::Default),
            1 => Ok(PresentInterval::One),
            2 => Ok(PresentInterval::Two),
            3 => Ok(PresentInterval::Immediate),
            _ => Err(GraphicsError::UnsupportedPresentInterval(
                PresentIntervalValue::Raw(value),
            )),
        }
    }
}

/// Depth and stencil buffer formats.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DepthFormat {
    /// No depth or stencil buffer.
    None,
    /// 16-bit depth buffer.
    Depth16,
    /// 24-bit depth buffer.
    Depth24,
    /// 24-bit depth buffer with an 8-bit stencil buffer.
    #[default]
    Depth24Stencil8,
}

impl DepthFormat {
    /// True if the format has a stencil component.
    pub const fn has_stencil(self) -> bool {
        matches!(self, DepthFormat::Depth24Stencil8)
    }
}

/// The configuration of a [`GraphicsDevice`]'s back buffer and presentation.
///
/// The device owns its copy. To change the configuration, clone the device's
/// parameters, modify the clone, and pass it to [`GraphicsDevice::reset`], so
/// the live configuration is never modified mid-transition.
///
/// [`GraphicsDevice`]: crate::GraphicsDevice
/// [`GraphicsDevice::reset`]: crate::GraphicsDevice::reset
#[derive(Debug, Clone, PartialEq)]
pub struct PresentationParameters {
    #[allow(missing_docs)]
    pub back_buffer_width: u32,
    #[allow(missing_docs)]
    pub back_buffer_height: u32,
    #[allow(missing_docs)]
    pub back_buffer_format: SurfaceFormat,
    #[allow(missing_docs)]
    pub depth_stencil_format: DepthFormat,
    #[allow(missing_docs)]
    pub is_full_screen: bool,
    #[allow(missing_docs)]
    pub presentation_interval: PresentInterval,
    /// The window the device presents into. Not owned by the device.
    pub device_window_handle: WindowHandle,
}

impl PresentationParameters {
    /// Creates windowed parameters with the given back buffer size and
    /// defaults for everything else.
    pub fn new(
        device_window_handle: WindowHandle,
        back_buffer_width: u32,
        back_buffer_height: u32,
    ) -> PresentationParameters {
        PresentationParameters {
            back_buffer_width,
            back_buffer_height,
            back_buffer_format: SurfaceFormat::Color,
            depth_stencil_format: DepthFormat::default(),
            is_full_screen: false,
            presentation_interval: PresentInterval::Default,
            device_window_handle,
        }
    }

    /// The area of the back buffer.
    pub fn bounds(&self) -> Rectangle {
        Rectangle::new(
            0,
            0,
            self.back_buffer_width as i32,
            self.back_buffer_height as i32,
        )
    }

    /// Checks the parameters for values no backend can work with.
    pub fn validate(&self) -> Result<(), GraphicsError> {
        if self.back_buffer_width == 0 || self.back_buffer_height == 0 {
            return Err(GraphicsError::InvalidConfiguration(
                "the back buffer must not be zero-sized",
            ));
        }
        if self.back_buffer_width > i32::MAX as u32 || self.back_buffer_height > i32::MAX as u32 {
            return Err(GraphicsError::InvalidConfiguration(
                "the back buffer is too large",
            ));
        }
        Ok(())
    }
}
