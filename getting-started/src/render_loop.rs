//! The per-frame state machine every lesson runs inside.

use crate::error::AppError;
use crate::lessons::Lesson;
use gl::types::GLsizei;
use gl_thin::api::GraphicsApi;
use gl_thin::gl_fancy::GPUState;
use log::{debug, error};
use winit::keyboard::KeyCode;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum LoopState {
    Running,
    ShouldClose,
}

/// Told about framebuffer size changes while events are polled.
pub trait FramebufferSizeCallback {
    fn framebuffer_resized(&mut self, width: u32, height: u32);
}

/// The window, its event queue and the clock, as seen by the render loop.
pub trait WindowSystem {
    fn should_close(&self) -> bool;
    fn set_should_close(&mut self, value: bool);
    fn is_key_down(&self, key: KeyCode) -> bool;
    fn swap_buffers(&mut self) -> Result<(), AppError>;
    /// Drain pending events without blocking. Resizes are reported through `on_resize`.
    fn poll_events(
        &mut self,
        on_resize: &mut dyn FramebufferSizeCallback,
    ) -> Result<(), AppError>;
    /// seconds since the window opened
    fn elapsed_seconds(&self) -> f64;
}

/// Keeps the GL viewport covering the whole framebuffer.
pub struct ViewportSync<G: GraphicsApi> {
    api: G,
}

impl<G: GraphicsApi> ViewportSync<G> {
    pub fn new(api: G) -> Self {
        Self { api }
    }
}

impl<G: GraphicsApi> FramebufferSizeCallback for ViewportSync<G> {
    fn framebuffer_resized(&mut self, width: u32, height: u32) {
        debug!("framebuffer resized to {}x{}", width, height);
        let width = GLsizei::try_from(width).unwrap_or(GLsizei::MAX);
        let height = GLsizei::try_from(height).unwrap_or(GLsizei::MAX);
        if let Err(e) = self.api.viewport(0, 0, width, height) {
            error!("failed to update viewport: {}", e);
        }
    }
}

pub struct RenderLoop<W: WindowSystem, G: GraphicsApi> {
    window: W,
    viewport: ViewportSync<G>,
    gpu_state: GPUState,
    state: LoopState,
    frames: u64,
}

impl<W: WindowSystem, G: GraphicsApi> RenderLoop<W, G> {
    pub fn new(window: W, api: G) -> Self {
        Self {
            window,
            viewport: ViewportSync::new(api),
            gpu_state: GPUState::new(),
            state: LoopState::Running,
            frames: 0,
        }
    }

    pub fn gpu_state(&mut self) -> &mut GPUState {
        &mut self.gpu_state
    }

    pub fn window(&self) -> &W {
        &self.window
    }

    pub fn state(&self) -> LoopState {
        self.state
    }

    /// frames presented so far
    pub fn frames(&self) -> u64 {
        self.frames
    }

    /// Escape asks the window to close.
    pub fn process_input(&mut self) -> LoopState {
        if self.window.is_key_down(KeyCode::Escape) {
            self.window.set_should_close(true);
        }
        if self.window.should_close() {
            self.state = LoopState::ShouldClose;
        }
        self.state
    }

    /// Input, render, present, poll. A close request seen during input skips the rest.
    pub fn run_frame<L: Lesson<G>>(&mut self, lesson: &mut L) -> Result<LoopState, AppError> {
        if self.process_input() == LoopState::ShouldClose {
            return Ok(self.state);
        }
        lesson.render(&mut self.gpu_state, self.window.elapsed_seconds())?;
        self.window.swap_buffers()?;
        self.frames += 1;
        self.window.poll_events(&mut self.viewport)?;
        if self.window.should_close() {
            self.state = LoopState::ShouldClose;
        }
        Ok(self.state)
    }

    /// Run frames until the window should close. Returns the number of frames presented.
    pub fn run<L: Lesson<G>>(&mut self, lesson: &mut L) -> Result<u64, AppError> {
        while self.state == LoopState::Running {
            self.run_frame(lesson)?;
        }
        debug!("render loop finished after {} frames", self.frames);
        Ok(self.frames)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::config::WindowConfig;
    use crate::lessons::hello_triangle::HelloTriangle;
    use crate::lessons::hello_window_clear::HelloWindowClear;
    use crate::lessons::shaders_uniform::ShadersUniform;
    use crate::geometry::{upload_positions, TRIANGLE};
    use crate::lessons::{clear_background, DrawGate};
    use gl_thin::gl_fancy::VertexBufferBundle;
    use gl_thin::gl_helper::{GLErrorWrapper, Program};
    use gl_thin::recording::{Call, RecordingApi};
    use lesson_shaders::solid_color_shader::VERTEX_SHADER;
    use std::collections::VecDeque;

    /// What the fake window does on one `poll_events`.
    #[derive(Clone, Debug, Default)]
    pub struct PollScript {
        pub press: Vec<KeyCode>,
        pub resize: Option<(u32, u32)>,
        pub close: bool,
    }

    pub struct ScriptedWindow {
        pub close_requested: bool,
        pub keys_down: Vec<KeyCode>,
        pub polls: VecDeque<PollScript>,
        pub swaps: usize,
        pub clock: f64,
        pub seconds_per_poll: f64,
    }

    impl ScriptedWindow {
        pub fn new(polls: Vec<PollScript>) -> Self {
            Self {
                close_requested: false,
                keys_down: Vec::new(),
                polls: polls.into(),
                swaps: 0,
                clock: 0.0,
                seconds_per_poll: 1.0 / 60.0,
            }
        }
    }

    impl WindowSystem for ScriptedWindow {
        fn should_close(&self) -> bool {
            self.close_requested
        }

        fn set_should_close(&mut self, value: bool) {
            self.close_requested = value;
        }

        fn is_key_down(&self, key: KeyCode) -> bool {
            self.keys_down.contains(&key)
        }

        fn swap_buffers(&mut self) -> Result<(), AppError> {
            self.swaps += 1;
            Ok(())
        }

        fn poll_events(
            &mut self,
            on_resize: &mut dyn FramebufferSizeCallback,
        ) -> Result<(), AppError> {
            self.clock += self.seconds_per_poll;
            // an exhausted script behaves like the user clicking the close button
            let script = self.polls.pop_front().unwrap_or(PollScript {
                close: true,
                ..PollScript::default()
            });
            self.keys_down.extend(script.press);
            if let Some((width, height)) = script.resize {
                on_resize.framebuffer_resized(width, height);
            }
            if script.close {
                self.close_requested = true;
            }
            Ok(())
        }

        fn elapsed_seconds(&self) -> f64 {
            self.clock
        }
    }

    fn setup<L: Lesson<RecordingApi>>(
        polls: Vec<PollScript>,
    ) -> (RecordingApi, RenderLoop<ScriptedWindow, RecordingApi>, L) {
        let api = RecordingApi::new();
        let mut render_loop = RenderLoop::new(ScriptedWindow::new(polls), api.clone());
        let lesson = L::new(&api, render_loop.gpu_state(), &WindowConfig::DEFAULT).unwrap();
        api.forget_calls();
        (api, render_loop, lesson)
    }

    #[test]
    fn escape_stops_before_the_next_draw() {
        let polls = vec![
            PollScript::default(),
            PollScript {
                press: vec![KeyCode::Escape],
                ..PollScript::default()
            },
        ];
        let (api, mut render_loop, mut lesson) = setup::<HelloTriangle<RecordingApi>>(polls);

        let frames = render_loop.run(&mut lesson).unwrap();
        assert_eq!(frames, 2);
        assert_eq!(api.draws().len(), 2);
        assert_eq!(render_loop.window().swaps, 2);
        assert_eq!(render_loop.state(), LoopState::ShouldClose);
        assert!(render_loop.window().should_close());
    }

    #[test]
    fn close_request_ends_the_loop() {
        let polls = vec![
            PollScript::default(),
            PollScript::default(),
            PollScript {
                close: true,
                ..PollScript::default()
            },
        ];
        let (api, mut render_loop, mut lesson) = setup::<HelloWindowClear<RecordingApi>>(polls);

        assert_eq!(render_loop.run(&mut lesson).unwrap(), 3);
        let clears = api
            .calls()
            .into_iter()
            .filter(|c| *c == Call::Clear(gl::COLOR_BUFFER_BIT))
            .count();
        assert_eq!(clears, 3);
        assert!(api.draws().is_empty());
    }

    #[test]
    fn process_input_without_escape_keeps_running() {
        let (_api, mut render_loop, _lesson) = setup::<HelloWindowClear<RecordingApi>>(vec![]);
        assert_eq!(render_loop.process_input(), LoopState::Running);
        assert_eq!(render_loop.frames(), 0);
    }

    /// unbalanced braces, so the fragment stage never compiles
    const UNFINISHED_FRAGMENT_SHADER: &str = "#version 330 core
out vec4 FragColor;
void main()
{
   FragColor = vec4(1.0, 0.5, 0.2, 1.0);
";

    struct UnfinishedShaderLesson {
        api: RecordingApi,
        program: Program<RecordingApi>,
        usable: bool,
        diagnostics: usize,
        geometry: VertexBufferBundle<RecordingApi, f32, u32>,
        gate: DrawGate,
    }

    impl Lesson<RecordingApi> for UnfinishedShaderLesson {
        fn new(
            api: &RecordingApi,
            gpu_state: &mut GPUState,
            _config: &WindowConfig,
        ) -> Result<Self, GLErrorWrapper> {
            let build = Program::build(api, VERTEX_SHADER, UNFINISHED_FRAGMENT_SHADER)?;
            let usable = build.is_usable();
            let diagnostics = build.diagnostics.len();
            let geometry = upload_positions(api, gpu_state, &TRIANGLE, None)?;
            Ok(Self {
                api: api.clone(),
                program: build.program,
                usable,
                diagnostics,
                geometry,
                gate: DrawGate::default(),
            })
        }

        fn render(
            &mut self,
            gpu_state: &mut GPUState,
            _seconds: f64,
        ) -> Result<(), GLErrorWrapper> {
            clear_background(&self.api)?;
            if !self.gate.allows(self.usable, "unfinished_shader") {
                return Ok(());
            }
            self.program.use_()?;
            let bound = self.geometry.bind(gpu_state)?;
            bound.draw_arrays(gl::TRIANGLES, 0, 3)
        }
    }

    #[test]
    fn failed_shader_build_still_clears_and_closes() {
        let polls = vec![
            PollScript::default(),
            PollScript::default(),
            PollScript {
                close: true,
                ..PollScript::default()
            },
        ];
        let (api, mut render_loop, mut lesson) = setup::<UnfinishedShaderLesson>(polls);
        assert!(!lesson.usable);
        // the fragment compile and the link both fail
        assert_eq!(lesson.diagnostics, 2);
        assert!(!lesson.program.is_linked());

        assert_eq!(render_loop.run(&mut lesson).unwrap(), 3);
        assert_eq!(render_loop.state(), LoopState::ShouldClose);
        let calls = api.calls();
        let clears = calls
            .iter()
            .filter(|c| **c == Call::Clear(gl::COLOR_BUFFER_BIT))
            .count();
        assert_eq!(clears, 3);
        assert!(api.draws().is_empty());
        assert!(calls.iter().all(|c| !matches!(c, Call::UseProgram(_))));
        assert!(calls
            .iter()
            .all(|c| !matches!(c, Call::DrawArrays { .. } | Call::DrawElements { .. })));
    }

    #[test]
    fn resize_updates_the_viewport() {
        let polls = vec![
            PollScript {
                resize: Some((1024, 768)),
                ..PollScript::default()
            },
            PollScript {
                close: true,
                ..PollScript::default()
            },
        ];
        let (api, mut render_loop, mut lesson) = setup::<HelloTriangle<RecordingApi>>(polls);

        render_loop.run(&mut lesson).unwrap();
        let viewports: Vec<Call> = api
            .calls()
            .into_iter()
            .filter(|c| matches!(c, Call::Viewport { .. }))
            .collect();
        assert_eq!(
            viewports,
            vec![Call::Viewport {
                x: 0,
                y: 0,
                width: 1024,
                height: 768
            }]
        );
    }

    #[test]
    fn uniform_follows_the_clock() {
        let polls = vec![PollScript::default(), PollScript::default()];
        let (api, mut render_loop, mut lesson) = setup::<ShadersUniform<RecordingApi>>(polls);
        {
            let window = &mut render_loop.window;
            window.clock = std::f64::consts::FRAC_PI_2;
            window.seconds_per_poll = std::f64::consts::PI;
        }

        assert_eq!(render_loop.run(&mut lesson).unwrap(), 3);
        let greens: Vec<f32> = api.uniform_4f_values().iter().map(|v| v[1]).collect();
        assert_eq!(greens.len(), 3);
        assert!((greens[0] - 1.0).abs() < 1e-5);
        assert!(greens[1].abs() < 1e-5);
        assert!((greens[2] - 1.0).abs() < 1e-5);
    }
}
