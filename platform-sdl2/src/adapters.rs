// SPDX-FileCopyrightText: 2025 Jens Pitkänen <jens.pitkanen@helsinki.fi>
//
// SPDX-License-Identifier: GPL-3.0-or-later

use platform::{DisplayMode, GraphicsAdapter, GraphicsError, SurfaceFormat};
use sdl2::{pixels::PixelFormatEnum, VideoSubsystem};
use tracing::{debug, info};

/// Lists the connected displays as [`GraphicsAdapter`]s, in SDL's display
/// index order.
pub(crate) fn enumerate_adapters(
    video: &VideoSubsystem,
) -> Result<Vec<GraphicsAdapter>, GraphicsError> {
    let display_count = video
        .num_video_displays()
        .map_err(GraphicsError::DeviceCreation)?;
    let description = video.current_video_driver();

    let mut adapters = Vec::with_capacity(display_count.max(0) as usize);
    for display_index in 0..display_count {
        let name = video
            .display_name(display_index)
            .unwrap_or_else(|_| format!("Display {display_index}"));
        let current_mode = video
            .current_display_mode(display_index)
            .map(convert_display_mode)
            .map_err(GraphicsError::DeviceCreation)?;
        let mode_count = video.num_display_modes(display_index).unwrap_or(0);
        let modes = (0..mode_count)
            .filter_map(|mode_index| video.display_mode(display_index, mode_index).ok())
            .map(convert_display_mode);

        let adapter = GraphicsAdapter::new(
            display_index as usize,
            name,
            description.to_string(),
            modes,
            current_mode,
        );
        debug!(
            "Display {display_index} has {} distinct display modes",
            adapter.display_modes().len(),
        );
        info!(
            "Found display {display_index}: {} ({}x{})",
            adapter.device_name(),
            current_mode.width,
            current_mode.height,
        );
        adapters.push(adapter);
    }
    Ok(adapters)
}

/// Converts an SDL display mode. The refresh rate is dropped, so modes that
/// only differ by it end up as duplicates, which [`GraphicsAdapter::new`]
/// removes.
pub(crate) fn convert_display_mode(mode: sdl2::video::DisplayMode) -> DisplayMode {
    DisplayMode::new(
        mode.w.max(0) as u32,
        mode.h.max(0) as u32,
        surface_format(mode.format),
    )
}

pub(crate) fn surface_format(format: PixelFormatEnum) -> SurfaceFormat {
    match format {
        PixelFormatEnum::RGB565 | PixelFormatEnum::BGR565 => SurfaceFormat::Bgr565,
        PixelFormatEnum::RGB555
        | PixelFormatEnum::BGR555
        | PixelFormatEnum::ARGB1555
        | PixelFormatEnum::ABGR1555
        | PixelFormatEnum::RGBA5551
        | PixelFormatEnum::BGRA5551 => SurfaceFormat::Bgra5551,
        PixelFormatEnum::RGB444
        | PixelFormatEnum::ARGB4444
        | PixelFormatEnum::ABGR4444
        | PixelFormatEnum::RGBA4444
        | PixelFormatEnum::BGRA4444 => SurfaceFormat::Bgra4444,
        _ => SurfaceFormat::Color,
    }
}

#[cfg(test)]
mod tests {
    use platform::{DisplayMode, GraphicsAdapter, SurfaceFormat};
    use sdl2::pixels::PixelFormatEnum;

    use super::{convert_display_mode, surface_format};

    #[test]
    fn pixel_formats_map_to_the_closest_surface_format() {
        assert_eq!(SurfaceFormat::Color, surface_format(PixelFormatEnum::RGB888));
        assert_eq!(SurfaceFormat::Color, surface_format(PixelFormatEnum::ARGB8888));
        assert_eq!(SurfaceFormat::Bgr565, surface_format(PixelFormatEnum::RGB565));
        assert_eq!(SurfaceFormat::Bgra5551, surface_format(PixelFormatEnum::ARGB1555));
        assert_eq!(SurfaceFormat::Bgra4444, surface_format(PixelFormatEnum::RGBA4444));
    }

    #[test]
    fn refresh_rates_collapse_into_one_mode() {
        let sdl_modes = [
            sdl2::video::DisplayMode::new(PixelFormatEnum::RGB888, 1920, 1080, 144),
            sdl2::video::DisplayMode::new(PixelFormatEnum::RGB888, 1920, 1080, 60),
            sdl2::video::DisplayMode::new(PixelFormatEnum::RGB888, 1280, 720, 60),
        ];
        let current = convert_display_mode(sdl_modes[0]);
        let adapter = GraphicsAdapter::new(
            0,
            String::from("Test display"),
            String::from("test"),
            sdl_modes.into_iter().map(convert_display_mode),
            current,
        );
        assert_eq!(
            &[
                DisplayMode::new(1920, 1080, SurfaceFormat::Color),
                DisplayMode::new(1280, 720, SurfaceFormat::Color),
            ],
            adapter.display_modes(),
        );
    }
}
