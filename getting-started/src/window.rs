//! A desktop window with a current OpenGL core context, built on winit and glutin.
//!
//! winit wants to own the event loop, so events are pumped with a zero timeout
//! once per frame instead of handing control over with `run_app`.

use crate::config::WindowConfig;
use crate::error::AppError;
use crate::input::Keyboard;
use crate::render_loop::{FramebufferSizeCallback, WindowSystem};
use gl_thin::gl_helper::GlApi;
use glutin::config::{Config, ConfigTemplateBuilder, GlConfig};
use glutin::context::{
    ContextApi, ContextAttributesBuilder, GlProfile, NotCurrentGlContext, PossiblyCurrentContext,
    Version,
};
use glutin::display::{GetGlDisplay, GlDisplay};
use glutin::surface::{GlSurface, Surface, SwapInterval, WindowSurface};
use glutin_winit::{DisplayBuilder, GlWindow};
use log::{debug, info, trace, warn};
use std::ffi::CString;
use std::num::NonZeroU32;
use std::time::{Duration, Instant};
use winit::application::ApplicationHandler;
use winit::dpi::LogicalSize;
use winit::event::{ElementState, KeyEvent, WindowEvent};
use winit::event_loop::{ActiveEventLoop, EventLoop};
use winit::keyboard::{KeyCode, PhysicalKey};
use winit::platform::pump_events::{EventLoopExtPumpEvents, PumpStatus};
use winit::raw_window_handle::HasWindowHandle;
use winit::window::{Window, WindowId};

/// Field order is drop order: the surface and context go before the window.
struct GlContext {
    surface: Surface<WindowSurface>,
    context: PossiblyCurrentContext,
    window: Window,
}

struct WindowHandler {
    config: WindowConfig,
    gl: Option<GlContext>,
    /// set when creation fails inside `resumed`
    failure: Option<AppError>,
    keyboard: Keyboard,
    close_requested: bool,
    /// the most recent size reported since the last poll
    pending_resize: Option<(u32, u32)>,
}

impl WindowHandler {
    fn new(config: WindowConfig) -> Self {
        Self {
            config,
            gl: None,
            failure: None,
            keyboard: Keyboard::new(),
            close_requested: false,
            pending_resize: None,
        }
    }

    fn create_context(&self, event_loop: &ActiveEventLoop) -> Result<GlContext, AppError> {
        let window_attributes = Window::default_attributes()
            .with_title(self.config.title.to_string())
            .with_inner_size(LogicalSize::new(self.config.width, self.config.height))
            .with_resizable(true);

        let template = ConfigTemplateBuilder::new().with_alpha_size(8);
        let (window, gl_config) = DisplayBuilder::new()
            .with_window_attributes(Some(window_attributes))
            .build(event_loop, template, pick_config)
            .map_err(|e| AppError::WindowCreationFailed(e.to_string()))?;
        let window = window.ok_or_else(|| {
            AppError::WindowCreationFailed("display builder returned no window".to_string())
        })?;

        let raw_window_handle = window
            .window_handle()
            .map_err(|e| AppError::WindowCreationFailed(e.to_string()))?
            .as_raw();
        let (major, minor) = self.config.gl_version;
        let context_attributes = ContextAttributesBuilder::new()
            .with_profile(GlProfile::Core)
            .with_context_api(ContextApi::OpenGl(Some(Version::new(major, minor))))
            .build(Some(raw_window_handle));

        let display = gl_config.display();
        let not_current = unsafe { display.create_context(&gl_config, &context_attributes) }
            .map_err(|e| {
                AppError::WindowCreationFailed(format!(
                    "no OpenGL {}.{} core context: {}",
                    major, minor, e
                ))
            })?;

        let surface_attributes = window
            .build_surface_attributes(Default::default())
            .map_err(|e| AppError::WindowCreationFailed(e.to_string()))?;
        let surface = unsafe { display.create_window_surface(&gl_config, &surface_attributes) }
            .map_err(|e| AppError::WindowCreationFailed(e.to_string()))?;
        let context = not_current
            .make_current(&surface)
            .map_err(|e| AppError::Context(e.to_string()))?;

        let interval = if self.config.vsync {
            SwapInterval::Wait(NonZeroU32::MIN)
        } else {
            SwapInterval::DontWait
        };
        if let Err(e) = surface.set_swap_interval(&context, interval) {
            warn!("could not set swap interval: {}", e);
        }

        info!(
            "created {}x{} window with an OpenGL {}.{} core context",
            self.config.width, self.config.height, major, minor
        );
        Ok(GlContext {
            surface,
            context,
            window,
        })
    }
}

/// The config with the most multisampling.
/// glutin only calls this after `find_configs` succeeded, and an empty match is an error there,
/// so the iterator always has at least one config.
fn pick_config(configs: Box<dyn Iterator<Item = Config> + '_>) -> Config {
    configs
        .reduce(|best, config| {
            if config.num_samples() > best.num_samples() {
                config
            } else {
                best
            }
        })
        .expect("the display offered no GL configs")
}

impl ApplicationHandler for WindowHandler {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.gl.is_some() || self.failure.is_some() {
            return;
        }
        match self.create_context(event_loop) {
            Ok(gl) => self.gl = Some(gl),
            Err(e) => self.failure = Some(e),
        }
    }

    fn window_event(
        &mut self,
        _event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        trace!("window event {:?}", event);
        match event {
            WindowEvent::CloseRequested => self.close_requested = true,
            WindowEvent::Resized(size) => {
                if let (Some(gl), Some(width), Some(height)) = (
                    self.gl.as_ref(),
                    NonZeroU32::new(size.width),
                    NonZeroU32::new(size.height),
                ) {
                    gl.surface.resize(&gl.context, width, height);
                }
                self.pending_resize = Some((size.width, size.height));
            }
            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        physical_key: PhysicalKey::Code(code),
                        state,
                        repeat: false,
                        ..
                    },
                ..
            } => match state {
                ElementState::Pressed => self.keyboard.press_key(code),
                ElementState::Released => self.keyboard.release_key(code),
            },
            _ => {}
        }
    }
}

pub struct GlutinWindow {
    event_loop: EventLoop<()>,
    handler: WindowHandler,
    api: GlApi,
    started: Instant,
}

impl GlutinWindow {
    /// Open the window, make its context current on this thread and load the GL functions.
    pub fn open(config: &WindowConfig) -> Result<Self, AppError> {
        let mut event_loop =
            EventLoop::new().map_err(|e| AppError::WindowCreationFailed(e.to_string()))?;
        let mut handler = WindowHandler::new(config.clone());

        while handler.gl.is_none() {
            if let Some(e) = handler.failure.take() {
                return Err(e);
            }
            if let PumpStatus::Exit(code) =
                event_loop.pump_app_events(Some(Duration::from_millis(10)), &mut handler)
            {
                return Err(AppError::WindowCreationFailed(format!(
                    "event loop exited with status {} before the window was ready",
                    code
                )));
            }
        }

        let api = match handler.gl.as_ref() {
            Some(gl) => {
                let display = gl.context.display();
                GlApi::load_with(|symbol| match CString::new(symbol) {
                    Ok(symbol) => display.get_proc_address(symbol.as_c_str()),
                    Err(_) => std::ptr::null(),
                })
                .map_err(|e| AppError::WindowCreationFailed(e.to_string()))?
            }
            None => {
                return Err(AppError::Context("context vanished while loading".to_string()))
            }
        };
        debug!("OpenGL functions loaded");

        Ok(Self {
            event_loop,
            handler,
            api,
            started: Instant::now(),
        })
    }

    pub fn gl_api(&self) -> GlApi {
        self.api
    }

    fn gl(&self) -> Result<&GlContext, AppError> {
        self.handler
            .gl
            .as_ref()
            .ok_or_else(|| AppError::Context("window has no GL context".to_string()))
    }
}

impl WindowSystem for GlutinWindow {
    fn should_close(&self) -> bool {
        self.handler.close_requested
    }

    fn set_should_close(&mut self, value: bool) {
        self.handler.close_requested = value;
    }

    fn is_key_down(&self, key: KeyCode) -> bool {
        self.handler.keyboard.is_key_down(key)
    }

    fn swap_buffers(&mut self) -> Result<(), AppError> {
        let gl = self.gl()?;
        gl.window.pre_present_notify();
        gl.surface
            .swap_buffers(&gl.context)
            .map_err(|e| AppError::Context(e.to_string()))
    }

    fn poll_events(
        &mut self,
        on_resize: &mut dyn FramebufferSizeCallback,
    ) -> Result<(), AppError> {
        self.handler.keyboard.update_keys();
        if let PumpStatus::Exit(code) = self
            .event_loop
            .pump_app_events(Some(Duration::ZERO), &mut self.handler)
        {
            debug!("event loop exited with status {}", code);
            self.handler.close_requested = true;
        }
        if let Some(e) = self.handler.failure.take() {
            return Err(e);
        }
        if let Some((width, height)) = self.handler.pending_resize.take() {
            on_resize.framebuffer_resized(width, height);
        }
        Ok(())
    }

    fn elapsed_seconds(&self) -> f64 {
        self.started.elapsed().as_secs_f64()
    }
}
