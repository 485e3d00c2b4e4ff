// SPDX-FileCopyrightText: 2025 Jens Pitkänen <jens.pitkanen@helsinki.fi>
//
// SPDX-License-Identifier: GPL-3.0-or-later

use core::f32::consts::TAU;

use bytemuck::{Pod, Zeroable};
use engine::{Game, GameContext, GameTime};
use platform::{
    BufferUsage, ClearOptions, Color, GraphicsDevice, GraphicsError, Key, PrimitiveType,
    SetDataOptions, VertexBuffer, VertexDeclaration, VertexElement, VertexElementFormat,
    VertexElementUsage,
};
use tracing::{debug, info};

/// The platform-specific keys the demo reacts to.
#[derive(Debug, Clone, Copy)]
pub struct DemoKeys {
    pub exit: Key,
    pub toggle_fullscreen: Key,
}

/// A 2D vertex, the smallest layout both graphics backends can draw.
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
#[repr(C)]
struct ColoredVertex {
    position: [f32; 2],
    color: Color,
}

const fn vertex(x: f32, y: f32, color: Color) -> ColoredVertex {
    ColoredVertex {
        position: [x, y],
        color,
    }
}

const TRIANGLES: [ColoredVertex; 6] = [
    vertex(-0.9, -0.3, Color::RED),
    vertex(-0.1, -0.3, Color::GREEN),
    vertex(-0.5, 0.7, Color::BLUE),
    vertex(0.1, -0.3, Color::BLUE),
    vertex(0.9, -0.3, Color::RED),
    vertex(0.5, 0.7, Color::GREEN),
];

const STRIP: [ColoredVertex; 4] = [
    vertex(-0.9, -0.5, Color::WHITE),
    vertex(-0.9, -0.9, Color::CORNFLOWER_BLUE),
    vertex(0.9, -0.5, Color::WHITE),
    vertex(0.9, -0.9, Color::CORNFLOWER_BLUE),
];

/// Draws two triangles from a vertex buffer and a band from user vertices,
/// over a slowly pulsing background.
pub struct DemoGame {
    keys: DemoKeys,
    declaration: VertexDeclaration,
    triangles: Option<VertexBuffer>,
    phase: f32,
    toggle_held: bool,
}

impl DemoGame {
    pub fn new(keys: DemoKeys) -> Result<DemoGame, GraphicsError> {
        let declaration = VertexDeclaration::new(&[
            VertexElement::new(
                0,
                VertexElementFormat::Vector2,
                VertexElementUsage::Position,
                0,
            ),
            VertexElement::new(8, VertexElementFormat::Color, VertexElementUsage::Color, 0),
        ])?;
        Ok(DemoGame {
            keys,
            declaration,
            triangles: None,
            phase: 0.0,
            toggle_held: false,
        })
    }

    fn clear_color(&self) -> Color {
        let t = (self.phase * TAU).sin() * 0.5 + 0.5;
        Color::from_floats([0.1 + 0.2 * t, 0.15, 0.35 + 0.2 * (1.0 - t), 1.0])
    }
}

impl Game for DemoGame {
    fn initialize(&mut self, context: &mut GameContext) -> Result<(), GraphicsError> {
        let triangles = context.device.create_vertex_buffer(
            &self.declaration,
            TRIANGLES.len(),
            BufferUsage::WriteOnly,
        )?;
        context
            .device
            .set_vertex_buffer_data(&triangles, 0, &TRIANGLES, SetDataOptions::None)?;
        self.triangles = Some(triangles);
        info!(
            backend = context.device.backend_name(),
            adapter = context.device.adapter().device_name(),
            "demo initialized",
        );
        Ok(())
    }

    fn update(&mut self, context: &mut GameContext, time: &GameTime) -> Result<(), GraphicsError> {
        let input = context.input;
        if input.is_key_down(self.keys.exit) {
            debug!("exit key pressed");
            context.exit();
            return Ok(());
        }

        let toggle = input.is_key_down(self.keys.toggle_fullscreen);
        if toggle && !self.toggle_held {
            let mut parameters = context.device.presentation_parameters().clone();
            parameters.is_full_screen = !parameters.is_full_screen;
            let adapter = context.device.adapter().clone();
            info!(fullscreen = parameters.is_full_screen, "toggling fullscreen");
            context.device.reset(parameters, adapter)?;
        }
        self.toggle_held = toggle;

        self.phase = (self.phase + time.elapsed.as_secs_f32() * 0.2).fract();
        Ok(())
    }

    fn draw(&mut self, context: &mut GameContext, _time: &GameTime) -> Result<(), GraphicsError> {
        let device = &mut *context.device;
        device.clear(
            ClearOptions::TARGET | ClearOptions::DEPTH_BUFFER,
            self.clear_color(),
            1.0,
            0,
        )?;
        device.set_vertex_buffer(self.triangles.as_ref(), 0)?;
        device.draw_primitives(PrimitiveType::TriangleList, 0, 2)?;
        device.draw_user_primitives(
            PrimitiveType::TriangleStrip,
            &STRIP,
            0,
            STRIP.len() - 2,
            &self.declaration,
        )
    }

    fn unload_content(&mut self, device: &mut GraphicsDevice) {
        if let Some(triangles) = self.triangles.take() {
            device.dispose_resource(&triangles);
        }
    }
}
