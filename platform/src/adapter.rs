// SPDX-FileCopyrightText: 2025 Jens Pitkänen <jens.pitkanen@helsinki.fi>
//
// SPDX-License-Identifier: GPL-3.0-or-later

use serde::{Deserialize, Serialize};

use crate::Rectangle;

/// Pixel formats of render targets and display outputs.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SurfaceFormat {
    /// 8-bit per channel RGBA.
    #[default]
    Color,
    /// 16-bit, 5 bits of blue, 6 bits of green, 5 bits of red.
    Bgr565,
    /// 16-bit, 5 bits per color channel and a 1-bit alpha.
    Bgra5551,
    /// 16-bit, 4 bits per channel.
    Bgra4444,
}

impl SurfaceFormat {
    /// Returns the amount of bytes each pixel takes up in this format.
    pub const fn bytes_per_pixel(self) -> usize {
        match self {
            SurfaceFormat::Color => 4,
            SurfaceFormat::Bgr565 | SurfaceFormat::Bgra5551 | SurfaceFormat::Bgra4444 => 2,
        }
    }
}

/// A resolution and format a display can output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DisplayMode {
    #[allow(missing_docs)]
    pub width: u32,
    #[allow(missing_docs)]
    pub height: u32,
    #[allow(missing_docs)]
    pub format: SurfaceFormat,
}

impl DisplayMode {
    /// Creates a new [`DisplayMode`].
    pub const fn new(width: u32, height: u32, format: SurfaceFormat) -> DisplayMode {
        DisplayMode {
            width,
            height,
            format,
        }
    }

    /// Width divided by height, or 0 for a mode without height.
    pub fn aspect_ratio(&self) -> f32 {
        if self.height == 0 {
            0.0
        } else {
            self.width as f32 / self.height as f32
        }
    }

    /// The area of the screen that is safe for important content on
    /// televisions, i.e. the center 90%.
    pub fn title_safe_area(&self) -> Rectangle {
        let margin_x = (self.width / 20) as i32;
        let margin_y = (self.height / 20) as i32;
        Rectangle::new(
            margin_x,
            margin_y,
            self.width as i32 - 2 * margin_x,
            self.height as i32 - 2 * margin_y,
        )
    }
}

/// One display output, as enumerated by the platform.
///
/// Adapters are immutable once enumerated. Platforms enumerate them once and
/// hand out clones.
#[derive(Debug, Clone, PartialEq)]
pub struct GraphicsAdapter {
    index: usize,
    device_name: String,
    description: String,
    display_modes: Vec<DisplayMode>,
    current_display_mode: DisplayMode,
}

impl GraphicsAdapter {
    /// Creates a new [`GraphicsAdapter`]. Should only be created in the
    /// platform implementation.
    ///
    /// Duplicate display modes are removed, keeping the first occurrence, so
    /// the modes stay in the order the platform listed them in.
    pub fn new(
        index: usize,
        device_name: String,
        description: String,
        display_modes: impl IntoIterator<Item = DisplayMode>,
        current_display_mode: DisplayMode,
    ) -> GraphicsAdapter {
        let mut unique_modes: Vec<DisplayMode> = Vec::new();
        for mode in display_modes {
            if !unique_modes.contains(&mode) {
                unique_modes.push(mode);
            }
        }
        GraphicsAdapter {
            index,
            device_name,
            description,
            display_modes: unique_modes,
            current_display_mode,
        }
    }

    /// The index of the adapter in [`Platform::adapters`].
    ///
    /// [`Platform::adapters`]: crate::Platform::adapters
    pub fn index(&self) -> usize {
        self.index
    }

    /// Platform-specific name of the output device.
    pub fn device_name(&self) -> &str {
        &self.device_name
    }

    /// Human-readable description of the adapter.
    pub fn description(&self) -> &str {
        &self.description
    }

    /// The supported display modes, without duplicates.
    pub fn display_modes(&self) -> &[DisplayMode] {
        &self.display_modes
    }

    /// The display mode the output is currently in.
    pub fn current_display_mode(&self) -> DisplayMode {
        self.current_display_mode
    }

    /// True if the current display mode is wider than 16:10.
    pub fn is_wide_screen(&self) -> bool {
        self.current_display_mode.aspect_ratio() > 1.6
    }
}

#[cfg(test)]
mod tests {
    use super::{DisplayMode, GraphicsAdapter, SurfaceFormat};
    use crate::Rectangle;

    #[test]
    fn duplicate_display_modes_are_collapsed_in_order() {
        let hd = DisplayMode::new(1280, 720, SurfaceFormat::Color);
        let full_hd = DisplayMode::new(1920, 1080, SurfaceFormat::Color);
        let full_hd_565 = DisplayMode::new(1920, 1080, SurfaceFormat::Bgr565);
        // Displays list the same resolution once per refresh rate.
        let adapter = GraphicsAdapter::new(
            0,
            "display 0".into(),
            "test display".into(),
            [full_hd, full_hd, full_hd_565, hd, full_hd],
            full_hd,
        );
        assert_eq!(&[full_hd, full_hd_565, hd], adapter.display_modes());
        assert!(adapter.is_wide_screen());
    }

    #[test]
    fn title_safe_area_is_the_center() {
        let mode = DisplayMode::new(1000, 500, SurfaceFormat::Color);
        assert_eq!(Rectangle::new(50, 25, 900, 450), mode.title_safe_area());
    }
}
