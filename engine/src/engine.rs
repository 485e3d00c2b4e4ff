// SPDX-FileCopyrightText: 2024 Jens Pitkänen <jens.pitkanen@helsinki.fi>
//
// SPDX-License-Identifier: GPL-3.0-or-later

use core::time::Duration;

use platform::{
    EngineCallbacks, GameWindow, GraphicsDevice, GraphicsError, InputState, Instant, Platform,
    Rectangle, Signal,
};
use tracing::{debug, trace};

use crate::{Game, GameContext, GameTime};

/// Where an [`Engine`] is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineState {
    /// Created, but never run.
    Constructed,
    /// The window and the graphics device exist, and the game has been
    /// initialized.
    Initialized,
    /// Inside [`Engine::run`].
    Running,
    /// The run loop has ended.
    Exiting,
    /// [`Engine::dispose`] has been called.
    Disposed,
}

/// The top-level structure of the game engine which owns the game, its window
/// and its graphics device, and drives the game through the platform's run
/// loop.
pub struct Engine<G: Game> {
    game: G,
    title: String,
    state: EngineState,
    window: Option<GameWindow>,
    device: Option<GraphicsDevice>,
    run_application: bool,
    /// Skips the draw of the current tick. Set when exiting.
    suppress_draw: bool,
    is_active: bool,
    previous_tick: Option<Instant>,
    /// Time passed since the last update, reset after every tick.
    accumulated_elapsed: Duration,
    total_game_time: Duration,
    /// Emitted when the run loop has ended.
    pub exiting: Signal<()>,
    /// Emitted once, at the end of [`Engine::dispose`].
    pub disposed: Signal<()>,
}

impl<G: Game> Engine<G> {
    /// Creates an engine for the game. Nothing platform-specific happens
    /// until [`Engine::run`].
    pub fn new(game: G, title: impl Into<String>) -> Engine<G> {
        Engine {
            game,
            title: title.into(),
            state: EngineState::Constructed,
            window: None,
            device: None,
            run_application: false,
            suppress_draw: false,
            is_active: false,
            previous_tick: None,
            accumulated_elapsed: Duration::ZERO,
            total_game_time: Duration::ZERO,
            exiting: Signal::new(),
            disposed: Signal::new(),
        }
    }

    #[allow(missing_docs)]
    pub fn game(&self) -> &G {
        &self.game
    }

    #[allow(missing_docs)]
    pub fn game_mut(&mut self) -> &mut G {
        &mut self.game
    }

    #[allow(missing_docs)]
    pub fn state(&self) -> EngineState {
        self.state
    }

    /// True if the game window has input focus.
    pub fn is_active(&self) -> bool {
        self.is_active
    }

    /// The time passed since the last update. Zero outside of ticks.
    pub fn accumulated_elapsed(&self) -> Duration {
        self.accumulated_elapsed
    }

    /// The graphics device, once the engine has been run.
    pub fn graphics_device(&self) -> Option<&GraphicsDevice> {
        self.device.as_ref()
    }

    /// The game window, once the engine has been run.
    pub fn window(&self) -> Option<&GameWindow> {
        self.window.as_ref()
    }

    /// Runs the game until it exits.
    ///
    /// The first run creates the window and the graphics device and
    /// initializes the game. Every run then calls [`Game::begin_run`], hands
    /// control to [`Platform::run_loop`], and calls [`Game::end_run`] when
    /// the loop ends.
    pub fn run(&mut self, platform: &mut dyn Platform) -> Result<(), GraphicsError> {
        match self.state {
            EngineState::Disposed => {
                return Err(GraphicsError::InvalidEngineState(
                    "the engine has been disposed",
                ))
            }
            EngineState::Running => {
                return Err(GraphicsError::InvalidEngineState(
                    "the engine is already running",
                ))
            }
            EngineState::Constructed => self.initialize(platform)?,
            EngineState::Initialized | EngineState::Exiting => {}
        }

        self.state = EngineState::Running;
        self.run_application = true;
        self.suppress_draw = false;
        self.previous_tick = None;
        self.with_context(&InputState::default(), |game, context| game.begin_run(context))?;

        debug!(title = self.title, "starting the run loop");
        let result = platform.run_loop(self);

        self.game.end_run();
        self.state = EngineState::Exiting;
        self.exiting.emit(&());
        result
    }

    fn initialize(&mut self, platform: &mut dyn Platform) -> Result<(), GraphicsError> {
        // A previous run may have failed in Game::initialize, after the
        // window and the device were created.
        self.release(platform);

        let mut window = platform.create_window(&self.title)?;
        let config = platform.config();
        let parameters = config.presentation_parameters(window.handle());
        let adapter_index = config.adapter_index;
        let device = match platform.create_graphics_device(&window, parameters, adapter_index) {
            Ok(device) => device,
            Err(err) => {
                platform.dispose_window(&mut window);
                return Err(err);
            }
        };
        debug!(
            backend = device.backend_name(),
            adapter = device.adapter().device_name(),
            "created the window and the graphics device"
        );
        self.window = Some(window);
        self.device = Some(device);

        self.with_context(&InputState::default(), |game, context| game.initialize(context))??;
        self.state = EngineState::Initialized;
        Ok(())
    }

    /// Calls `f` with the game and a context made of the engine's parts.
    /// Fails if there's no window or device yet.
    fn with_context<R>(
        &mut self,
        input: &InputState,
        f: impl FnOnce(&mut G, &mut GameContext) -> R,
    ) -> Result<R, GraphicsError> {
        let (Some(window), Some(device)) = (self.window.as_mut(), self.device.as_mut()) else {
            return Err(GraphicsError::InvalidEngineState(
                "the engine has no window or graphics device",
            ));
        };
        let mut context = GameContext {
            device,
            window,
            input,
            is_active: self.is_active,
            exit_requested: false,
        };
        let result = f(&mut self.game, &mut context);
        if context.exit_requested {
            self.exit();
        }
        Ok(result)
    }

    fn run_frame(&mut self, input: &InputState, time: &GameTime) -> Result<(), GraphicsError> {
        self.with_context(input, |game, context| game.update(context, time))??;

        if self.suppress_draw {
            trace!("draw suppressed for this tick");
            self.suppress_draw = false;
            return Ok(());
        }

        let draw = self.with_context(input, |game, context| game.begin_draw(context))?;
        if draw {
            self.with_context(input, |game, context| game.draw(context, time))??;
            self.end_draw()?;
        }
        Ok(())
    }

    fn end_draw(&mut self) -> Result<(), GraphicsError> {
        match self.device.as_mut() {
            Some(device) => device.present(),
            None => Ok(()),
        }
    }

    /// Stops the run loop after the current tick, without drawing anything
    /// more.
    pub fn exit(&mut self) {
        if self.run_application {
            debug!("exit requested");
        }
        self.run_application = false;
        self.suppress_draw = true;
    }

    /// Disposes the graphics device and destroys the window. Calling this
    /// more than once does nothing.
    pub fn dispose(&mut self, platform: &mut dyn Platform) {
        if self.state == EngineState::Disposed {
            return;
        }
        self.release(platform);
        self.state = EngineState::Disposed;
        self.disposed.emit(&());
        debug!(title = self.title, "disposed the engine");
    }

    /// Unloads the game's content, then disposes the device and the window,
    /// if they exist.
    fn release(&mut self, platform: &mut dyn Platform) {
        if let Some(mut device) = self.device.take() {
            self.game.unload_content(&mut device);
            device.dispose();
        }
        if let Some(mut window) = self.window.take() {
            platform.dispose_window(&mut window);
        }
    }
}

impl<G: Game> EngineCallbacks for Engine<G> {
    fn run_application(&self) -> bool {
        self.run_application
    }

    fn stop_running(&mut self) {
        self.run_application = false;
    }

    fn set_active(&mut self, active: bool) {
        if self.is_active != active {
            self.is_active = active;
            self.game.active_changed(active);
        }
    }

    fn window(&self) -> Option<&GameWindow> {
        self.window.as_ref()
    }

    fn graphics_device(&mut self) -> Option<&mut GraphicsDevice> {
        self.device.as_mut()
    }

    fn client_size_changed(&mut self, width: u32, height: u32) -> Result<(), GraphicsError> {
        let (Some(window), Some(device)) = (self.window.as_mut(), self.device.as_mut()) else {
            return Ok(());
        };
        window
            .client_size_changed
            .emit(&Rectangle::new(0, 0, width as i32, height as i32));

        let mut parameters = device.presentation_parameters().clone();
        parameters.back_buffer_width = width;
        parameters.back_buffer_height = height;
        let adapter = device.adapter().clone();
        device.reset(parameters, adapter)
    }

    fn tick(&mut self, timestamp: Instant, input: &InputState) -> Result<(), GraphicsError> {
        let elapsed = match self.previous_tick {
            Some(previous) => timestamp.saturating_duration_since(previous),
            None => Duration::ZERO,
        };
        self.previous_tick = Some(timestamp);
        self.accumulated_elapsed += elapsed;
        self.total_game_time += self.accumulated_elapsed;

        let time = GameTime {
            elapsed: self.accumulated_elapsed,
            total: self.total_game_time,
        };
        let result = self.run_frame(input, &time);
        self.accumulated_elapsed = Duration::ZERO;
        result
    }

    fn exit(&mut self) {
        Engine::exit(self);
    }
}

#[cfg(test)]
mod tests {
    use core::time::Duration;
    use std::{cell::RefCell, rc::Rc};

    use platform::{
        headless::{HeadlessPlatform, NativeCall},
        BufferUsage, ClearOptions, Color, DeviceState, GraphicsDevice, GraphicsError, Key, Platform,
        PlatformConfig, PlatformEvent, PrimitiveType, Rectangle, SetDataOptions, VertexBuffer,
        VertexPositionColor, VertexType, WindowHandle,
    };

    use super::{Engine, EngineState};
    use crate::{Game, GameContext, GameTime};

    const ESCAPE: Key = Key::new(27);

    #[derive(Default)]
    struct TestGame {
        initialized: u32,
        begin_runs: u32,
        end_runs: u32,
        updates: Vec<GameTime>,
        draws: u32,
        skip_draws: bool,
        exit_on_update: Option<usize>,
        active_changes: Vec<bool>,
        resizes: Rc<RefCell<Vec<Rectangle>>>,
        buffer: Option<VertexBuffer>,
        unloads: u32,
        fail_initialize: bool,
    }

    impl Game for TestGame {
        fn initialize(&mut self, context: &mut GameContext) -> Result<(), GraphicsError> {
            self.initialized += 1;
            if self.fail_initialize {
                return Err(GraphicsError::InvalidConfiguration("no content to load"));
            }
            let resizes = self.resizes.clone();
            context
                .window
                .client_size_changed
                .connect(move |bounds| resizes.borrow_mut().push(*bounds));

            let white = |x, y| VertexPositionColor::new([x, y, 0.0], Color::WHITE);
            let triangle = [white(-1.0, -1.0), white(1.0, -1.0), white(0.0, 1.0)];
            let buffer = context.device.create_vertex_buffer(
                &VertexPositionColor::declaration(),
                triangle.len(),
                BufferUsage::WriteOnly,
            )?;
            context
                .device
                .set_vertex_buffer_data(&buffer, 0, &triangle, SetDataOptions::None)?;
            self.buffer = Some(buffer);
            Ok(())
        }

        fn begin_run(&mut self, _: &mut GameContext) {
            self.begin_runs += 1;
        }

        fn update(&mut self, context: &mut GameContext, time: &GameTime) -> Result<(), GraphicsError> {
            self.updates.push(*time);
            if self.exit_on_update == Some(self.updates.len()) || context.input.is_key_down(ESCAPE) {
                context.exit();
            }
            Ok(())
        }

        fn begin_draw(&mut self, _: &mut GameContext) -> bool {
            !self.skip_draws
        }

        fn draw(&mut self, context: &mut GameContext, _: &GameTime) -> Result<(), GraphicsError> {
            self.draws += 1;
            context
                .device
                .clear(ClearOptions::all(), Color::CORNFLOWER_BLUE, 1.0, 0)?;
            context.device.set_vertex_buffer(self.buffer.as_ref(), 0)?;
            context
                .device
                .draw_primitives(PrimitiveType::TriangleList, 0, 1)
        }

        fn end_run(&mut self) {
            self.end_runs += 1;
        }

        fn active_changed(&mut self, active: bool) {
            self.active_changes.push(active);
        }

        fn unload_content(&mut self, device: &mut GraphicsDevice) {
            self.unloads += 1;
            if let Some(buffer) = self.buffer.take() {
                device.dispose_resource(&buffer);
            }
        }
    }

    fn platform(frames: u32) -> HeadlessPlatform {
        let mut platform = HeadlessPlatform::new(PlatformConfig::default());
        platform.set_frame_limit(frames);
        platform.set_frame_step(Duration::from_millis(10));
        platform
    }

    fn presents(platform: &HeadlessPlatform) -> usize {
        platform
            .log()
            .borrow()
            .count(|call| *call == NativeCall::Present)
    }

    /// Runs a few frames of the whole loop, like a game would.
    #[test]
    fn smoke_test() {
        let mut platform = platform(5);
        let mut engine = Engine::new(TestGame::default(), "smoke test");
        engine.run(&mut platform).unwrap();

        let game = engine.game();
        assert_eq!(1, game.initialized);
        assert_eq!(5, game.updates.len());
        assert_eq!(5, game.draws);
        assert_eq!(5, presents(&platform));
        assert_eq!(EngineState::Exiting, engine.state());
        assert_eq!(1, game.end_runs);
        assert_eq!(
            Duration::from_millis(40),
            game.updates.last().unwrap().total
        );
        assert_eq!(
            5,
            platform
                .log()
                .borrow()
                .count(|call| matches!(call, NativeCall::DrawPrimitives { .. }))
        );
    }

    #[test]
    fn accumulator_resets_even_when_draws_are_skipped() {
        let mut platform = platform(4);
        let game = TestGame {
            skip_draws: true,
            ..Default::default()
        };
        let mut engine = Engine::new(game, "skipped draws");
        engine.run(&mut platform).unwrap();

        let elapsed: Vec<Duration> = engine.game().updates.iter().map(|t| t.elapsed).collect();
        let step = Duration::from_millis(10);
        assert_eq!(vec![Duration::ZERO, step, step, step], elapsed);
        assert_eq!(Duration::ZERO, engine.accumulated_elapsed());
        assert_eq!(0, engine.game().draws);
        assert_eq!(0, presents(&platform));
    }

    #[test]
    fn exit_finishes_the_tick_without_drawing() {
        let mut platform = platform(10);
        let game = TestGame {
            exit_on_update: Some(3),
            ..Default::default()
        };
        let mut engine = Engine::new(game, "exit");
        engine.run(&mut platform).unwrap();

        assert_eq!(3, engine.game().updates.len());
        assert_eq!(2, engine.game().draws);
        assert_eq!(2, presents(&platform));
        assert_eq!(1, engine.game().end_runs);
    }

    #[test]
    fn quit_event_ends_the_loop_after_its_tick() {
        let mut platform = platform(10);
        platform.push_frame([]);
        platform.push_frame([PlatformEvent::Quit]);
        let mut engine = Engine::new(TestGame::default(), "quit");
        engine.run(&mut platform).unwrap();
        assert_eq!(2, engine.game().updates.len());
        assert_eq!(2, engine.game().draws);
    }

    #[test]
    fn key_input_reaches_the_game() {
        let mut platform = platform(10);
        platform.push_frame([]);
        platform.push_frame([PlatformEvent::KeyDown(ESCAPE)]);
        let mut engine = Engine::new(TestGame::default(), "escape");
        engine.run(&mut platform).unwrap();
        assert_eq!(2, engine.game().updates.len());
        assert_eq!(1, engine.game().draws);
    }

    #[test]
    fn user_resize_resets_the_device() {
        let config = PlatformConfig {
            allow_user_resizing: true,
            ..Default::default()
        };
        let mut platform = HeadlessPlatform::new(config);
        platform.set_frame_limit(2);
        platform.push_frame([PlatformEvent::Resized {
            width: 1024,
            height: 600,
            user_initiated: true,
        }]);
        let mut engine = Engine::new(TestGame::default(), "resize");
        engine.run(&mut platform).unwrap();

        let device = engine.graphics_device().unwrap();
        let bounds = Rectangle::new(0, 0, 1024, 600);
        assert_eq!(bounds, device.viewport().bounds());
        assert_eq!(bounds, device.scissor_rectangle());
        assert_eq!(vec![bounds], *engine.game().resizes.borrow());
        let window = engine.window().unwrap();
        assert_eq!(bounds, platform.client_bounds(window));
    }

    #[test]
    fn focus_changes_reach_the_game() {
        let mut platform = platform(3);
        platform.push_frame([PlatformEvent::FocusLost]);
        platform.push_frame([PlatformEvent::FocusGained]);
        let mut engine = Engine::new(TestGame::default(), "focus");
        engine.run(&mut platform).unwrap();
        assert_eq!(vec![true, false, true], engine.game().active_changes);
        assert!(engine.is_active());
    }

    #[test]
    fn display_change_resets_onto_the_new_display() {
        let mut platform = platform(2);
        platform.push_frame([PlatformEvent::DisplayChanged { display_index: 1 }]);
        let mut engine = Engine::new(TestGame::default(), "display change");
        engine.run(&mut platform).unwrap();
        let device = engine.graphics_device().unwrap();
        assert_eq!(1, device.adapter().index());
        assert_eq!(DeviceState::Ready, device.state());
    }

    #[test]
    fn engines_can_run_again_but_initialize_once() {
        let mut platform = platform(2);
        let mut engine = Engine::new(TestGame::default(), "rerun");
        engine.run(&mut platform).unwrap();
        engine.run(&mut platform).unwrap();
        assert_eq!(1, engine.game().initialized);
        assert_eq!(2, engine.game().begin_runs);
        assert_eq!(4, engine.game().updates.len());
        // The first tick of every run starts from zero elapsed time.
        assert_eq!(Duration::ZERO, engine.game().updates[2].elapsed);
    }

    #[test]
    fn dispose_is_idempotent() {
        let mut platform = platform(1);
        let mut engine = Engine::new(TestGame::default(), "dispose");
        let disposed = Rc::new(RefCell::new(0));
        {
            let disposed = disposed.clone();
            engine.disposed.connect(move |_| *disposed.borrow_mut() += 1);
        }
        engine.run(&mut platform).unwrap();
        let window = engine.window().unwrap().handle();

        engine.dispose(&mut platform);
        engine.dispose(&mut platform);
        assert_eq!(1, *disposed.borrow());
        assert_eq!(&[window], platform.disposed_windows());
        assert_eq!(
            1,
            platform
                .log()
                .borrow()
                .count(|call| *call == NativeCall::Dispose)
        );
        // The game unloads its vertex buffer before the device goes away.
        assert_eq!(1, engine.game().unloads);
        assert!(engine.game().buffer.is_none());
        assert_eq!(
            1,
            platform
                .log()
                .borrow()
                .count(|call| matches!(call, NativeCall::DestroyVertexBuffer(_)))
        );
        assert_eq!(EngineState::Disposed, engine.state());
        assert!(matches!(
            engine.run(&mut platform),
            Err(GraphicsError::InvalidEngineState(_))
        ));
    }

    #[test]
    fn window_is_disposed_when_the_device_cannot_be_created() {
        let mut platform = HeadlessPlatform::new(PlatformConfig {
            adapter_index: 5,
            ..PlatformConfig::default()
        });
        let mut engine = Engine::new(TestGame::default(), "no device");
        assert_eq!(
            Err(GraphicsError::AdapterUnavailable(5)),
            engine.run(&mut platform)
        );
        assert!(engine.window().is_none());
        assert_eq!(EngineState::Constructed, engine.state());
        assert_eq!(&[WindowHandle::new(1)], platform.disposed_windows());

        engine.dispose(&mut platform);
        assert_eq!(&[WindowHandle::new(1)], platform.disposed_windows());
    }

    #[test]
    fn failed_initialize_is_torn_down_before_the_next_run() {
        let mut platform = platform(1);
        let mut engine = Engine::new(
            TestGame {
                fail_initialize: true,
                ..TestGame::default()
            },
            "retry",
        );
        assert!(matches!(
            engine.run(&mut platform),
            Err(GraphicsError::InvalidConfiguration(_))
        ));
        assert_eq!(EngineState::Constructed, engine.state());
        assert!(platform.disposed_windows().is_empty());

        engine.game_mut().fail_initialize = false;
        engine.run(&mut platform).unwrap();
        assert_eq!(2, engine.game().initialized);
        assert_eq!(&[WindowHandle::new(1)], platform.disposed_windows());
        assert_eq!(Some(WindowHandle::new(2)), engine.window().map(|w| w.handle()));
        assert_eq!(
            1,
            platform
                .log()
                .borrow()
                .count(|call| *call == NativeCall::Dispose)
        );

        engine.dispose(&mut platform);
        assert_eq!(
            &[WindowHandle::new(1), WindowHandle::new(2)],
            platform.disposed_windows()
        );
    }
}
