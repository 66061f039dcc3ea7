//! Flow control and application event loop.
//!
//! A demo is split into two halves. [`Demo::assemble`] builds the scene once
//! and hands back a [`Stage`]; [`Demo::update`] moves things around as a pure
//! function of the frame time. The [`FrameDriver`] owns both halves plus a
//! [`FrameClock`] and runs one frame per [`FrameDriver::step`], drawing
//! through whatever [`FrameRenderer`] it is given. This keeps everything but
//! the GPU testable without a window.
//!
//! # Lifecycle
//!
//! The winit [`App`] follows this pattern:
//! 1. On `resumed`, create the window and assemble the demo
//! 2. Initialize the GPU context and load textures (blocking natively,
//!    `spawn_local` on the web)
//! 3. On every `RedrawRequested`, step the driver once and request the next
//!    redraw
//! 4. On resize, reconfigure the surface now and let the driver pick up the
//!    new viewport at the start of the next frame

use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};

use rand::{RngCore, SeedableRng, rngs::StdRng};
use winit::{
    application::ApplicationHandler,
    event::WindowEvent,
    event_loop::{ActiveEventLoop, EventLoop},
    window::Window,
};

use crate::{
    camera::{Camera, Projection, Viewport},
    clock::{FrameClock, SystemClock},
    data_structures::scene_graph::SceneGraph,
    post::PostProcess,
    render::GpuRenderer,
};

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

/// Everything a renderer needs to draw one frame.
#[derive(Debug)]
pub struct Stage {
    pub camera: Camera,
    pub projection: Projection,
    pub scene: SceneGraph,
    pub post: PostProcess,
}

/// A fixed scene composition with time-driven animation.
pub trait Demo {
    /// Tuning constants. `Default` is the hand-tuned composition.
    type Config: Default;

    /// Window title.
    const TITLE: &'static str;

    /// Builds the scene for a target viewport. Called exactly once per run.
    fn assemble(
        config: Self::Config,
        viewport: Viewport,
        rng: &mut dyn RngCore,
    ) -> anyhow::Result<(Self, Stage)>
    where
        Self: Sized;

    /// Applies the state for frame time `time_ms`. Must not depend on how
    /// often or at which instants it was called before.
    fn update(&mut self, stage: &mut Stage, time_ms: f64);
}

/// Draws a stage. Implemented by [`GpuRenderer`] and by test doubles.
pub trait FrameRenderer {
    fn render(&mut self, stage: &Stage) -> anyhow::Result<()>;
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum FrameStatus {
    Rendered { time_ms: f64 },
    Stopped,
}

/// Stops a [`FrameDriver`] from outside. Cloning shares the same flag.
#[derive(Clone, Debug)]
pub struct CancelHandle(Arc<AtomicBool>);

impl CancelHandle {
    pub fn cancel(&self) {
        self.0.store(false, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        !self.0.load(Ordering::Relaxed)
    }
}

pub struct FrameDriver<D: Demo, C: FrameClock = SystemClock> {
    demo: D,
    stage: Stage,
    clock: C,
    running: Arc<AtomicBool>,
    pending_viewport: Option<Viewport>,
    last_time_ms: Option<f64>,
    frames: u64,
}

impl<D: Demo, C: FrameClock> FrameDriver<D, C> {
    pub fn new(demo: D, stage: Stage, clock: C) -> Self {
        Self {
            demo,
            stage,
            clock,
            running: Arc::new(AtomicBool::new(true)),
            pending_viewport: None,
            last_time_ms: None,
            frames: 0,
        }
    }

    /// Assembles `D` with `config` and wraps it in a driver.
    pub fn assemble(
        config: D::Config,
        viewport: Viewport,
        rng: &mut dyn RngCore,
        clock: C,
    ) -> anyhow::Result<Self> {
        let (demo, stage) = D::assemble(config, viewport, rng)?;
        if let Err(e) = stage.scene.check_blend_order() {
            log::warn!("{}: {}", D::TITLE, e);
        }
        Ok(Self::new(demo, stage, clock))
    }

    pub fn cancel_handle(&self) -> CancelHandle {
        CancelHandle(self.running.clone())
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Relaxed)
    }

    /// Number of frames rendered so far.
    pub fn frames(&self) -> u64 {
        self.frames
    }

    pub fn stage(&self) -> &Stage {
        &self.stage
    }

    pub fn demo(&self) -> &D {
        &self.demo
    }

    /// Records a new viewport. It is applied at the start of the next frame.
    pub fn resize(&mut self, viewport: Viewport) {
        self.pending_viewport = Some(viewport);
    }

    /// Runs one frame at the clock's current time.
    pub fn step(&mut self, renderer: &mut dyn FrameRenderer) -> anyhow::Result<FrameStatus> {
        if !self.is_running() {
            return Ok(FrameStatus::Stopped);
        }
        let now = self.clock.now_ms();
        self.step_at(now, renderer)
    }

    /// Runs one frame at an explicit time.
    ///
    /// A time earlier than the previous frame's is clamped to it. A NaN time
    /// holds the previous frame's time, or starts at zero on the first frame.
    pub fn step_at(
        &mut self,
        time_ms: f64,
        renderer: &mut dyn FrameRenderer,
    ) -> anyhow::Result<FrameStatus> {
        if !self.is_running() {
            return Ok(FrameStatus::Stopped);
        }

        if let Some(viewport) = self.pending_viewport.take() {
            self.stage.projection.resize(viewport);
        }

        let time_ms = match self.last_time_ms {
            Some(last) if time_ms < last || time_ms.is_nan() => {
                log::debug!("Clock went backwards ({} < {}), holding time", time_ms, last);
                last
            }
            None if time_ms.is_nan() => {
                log::debug!("First frame time is NaN, starting at 0");
                0.0
            }
            _ => time_ms,
        };
        self.last_time_ms = Some(time_ms);

        self.demo.update(&mut self.stage, time_ms);
        renderer.render(&self.stage)?;
        self.frames += 1;

        Ok(FrameStatus::Rendered { time_ms })
    }
}

/// Process-level switches that are not part of a demo's composition.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RunOptions {
    /// Seed for the scene's random placement. Entropy when `None`.
    pub seed: Option<u64>,
    /// Stop after this many rendered frames.
    pub max_frames: Option<u64>,
}

impl RunOptions {
    pub const SEED_VAR: &'static str = "VISTA_SEED";
    pub const MAX_FRAMES_VAR: &'static str = "VISTA_MAX_FRAMES";

    /// Reads `VISTA_SEED` and `VISTA_MAX_FRAMES`. Unparsable values are ignored.
    pub fn from_env() -> Self {
        Self {
            seed: env_u64(Self::SEED_VAR),
            max_frames: env_u64(Self::MAX_FRAMES_VAR),
        }
    }

    pub fn rng(&self) -> StdRng {
        match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        }
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn env_u64(name: &str) -> Option<u64> {
    let value = std::env::var(name).ok()?;
    match value.trim().parse() {
        Ok(parsed) => Some(parsed),
        Err(e) => {
            log::warn!("Ignoring {}={:?}: {}", name, value, e);
            None
        }
    }
}

#[cfg(target_arch = "wasm32")]
fn env_u64(_name: &str) -> Option<u64> {
    None
}

pub(crate) enum AppEvent {
    #[allow(dead_code)]
    Initialized(GpuRenderer),
    #[allow(dead_code)]
    Exit,
}

impl std::fmt::Debug for AppEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Initialized(_) => f.write_str("Initialized(GpuRenderer)"),
            Self::Exit => f.write_str("Exit"),
        }
    }
}

pub struct App<D: Demo + 'static> {
    #[cfg(not(target_arch = "wasm32"))]
    async_runtime: tokio::runtime::Runtime,
    #[cfg(target_arch = "wasm32")]
    proxy: winit::event_loop::EventLoopProxy<AppEvent>,
    options: RunOptions,
    config: Option<D::Config>,
    window: Option<Arc<Window>>,
    driver: Option<FrameDriver<D>>,
    renderer: Option<GpuRenderer>,
}

impl<D: Demo + 'static> App<D> {
    #[cfg_attr(not(target_arch = "wasm32"), allow(unused_variables))]
    fn new(event_loop: &EventLoop<AppEvent>, options: RunOptions) -> anyhow::Result<Self> {
        #[cfg(target_arch = "wasm32")]
        let proxy = event_loop.create_proxy();
        #[cfg(not(target_arch = "wasm32"))]
        let async_runtime = tokio::runtime::Runtime::new()?;
        Ok(Self {
            #[cfg(not(target_arch = "wasm32"))]
            async_runtime,
            #[cfg(target_arch = "wasm32")]
            proxy,
            options,
            config: Some(D::Config::default()),
            window: None,
            driver: None,
            renderer: None,
        })
    }

    fn on_frame_rendered(&mut self) {
        let (Some(driver), Some(max_frames)) = (&self.driver, self.options.max_frames) else {
            return;
        };
        if driver.frames() >= max_frames {
            log::info!("Rendered {} frames, stopping", driver.frames());
            driver.cancel_handle().cancel();
        }
    }
}

impl<D: Demo + 'static> ApplicationHandler<AppEvent> for App<D> {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }

        #[allow(unused_mut)]
        let mut window_attributes = Window::default_attributes().with_title(D::TITLE);

        #[cfg(target_arch = "wasm32")]
        {
            use wasm_bindgen::JsCast;
            use winit::platform::web::WindowAttributesExtWebSys;

            const CANVAS_ID: &str = "canvas";

            let window = wgpu::web_sys::window().unwrap_throw();
            let document = window.document().unwrap_throw();
            let canvas = document.get_element_by_id(CANVAS_ID).unwrap_throw();
            let html_canvas_element = canvas.unchecked_into();
            window_attributes = window_attributes.with_canvas(Some(html_canvas_element));
        }

        let window = match event_loop.create_window(window_attributes) {
            Ok(window) => Arc::new(window),
            Err(e) => {
                log::error!("Cannot create window: {}", e);
                event_loop.exit();
                return;
            }
        };

        let config = self.config.take().unwrap_or_default();
        let mut rng = self.options.rng();
        let driver = match FrameDriver::<D>::assemble(
            config,
            window.inner_size().into(),
            &mut rng,
            SystemClock::new(),
        ) {
            Ok(driver) => driver,
            Err(e) => {
                log::error!("Cannot assemble {}: {:#}", D::TITLE, e);
                event_loop.exit();
                return;
            }
        };
        log::info!("{} assembled", D::TITLE);

        let texture_sources = driver.stage().scene.texture_sources();
        self.driver = Some(driver);
        self.window = Some(window.clone());

        let init_future = GpuRenderer::new(window, texture_sources);

        #[cfg(not(target_arch = "wasm32"))]
        {
            match self.async_runtime.block_on(init_future) {
                Ok(renderer) => {
                    self.renderer = Some(renderer);
                    if let Some(window) = &self.window {
                        window.request_redraw();
                    }
                }
                Err(e) => {
                    log::error!("App initialization failed: {:#}", e);
                    event_loop.exit();
                }
            }
        }

        #[cfg(target_arch = "wasm32")]
        {
            let proxy = self.proxy.clone();
            wasm_bindgen_futures::spawn_local(async move {
                let event = match init_future.await {
                    Ok(renderer) => AppEvent::Initialized(renderer),
                    Err(e) => {
                        log::error!("App initialization failed: {:#}", e);
                        AppEvent::Exit
                    }
                };
                if proxy.send_event(event).is_err() {
                    log::error!("Event loop closed before the renderer was ready");
                }
            });
        }
    }

    fn user_event(&mut self, event_loop: &ActiveEventLoop, event: AppEvent) {
        match event {
            AppEvent::Initialized(mut renderer) => {
                // This is the message from our wasm `spawn_local`
                if let Some(window) = &self.window {
                    let size = window.inner_size();
                    renderer.resize(size);
                    if let Some(driver) = &mut self.driver {
                        driver.resize(size.into());
                    }
                    window.request_redraw();
                }
                self.renderer = Some(renderer);
            }
            AppEvent::Exit => event_loop.exit(),
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: winit::window::WindowId,
        event: WindowEvent,
    ) {
        match event {
            WindowEvent::CloseRequested => event_loop.exit(),
            WindowEvent::Resized(size) => {
                if let Some(renderer) = &mut self.renderer {
                    renderer.resize(size);
                }
                if let Some(driver) = &mut self.driver {
                    driver.resize(size.into());
                }
            }
            WindowEvent::RedrawRequested => {
                let (Some(driver), Some(renderer)) = (&mut self.driver, &mut self.renderer) else {
                    return;
                };
                match driver.step(renderer) {
                    Ok(FrameStatus::Rendered { .. }) => self.on_frame_rendered(),
                    Ok(FrameStatus::Stopped) => {
                        event_loop.exit();
                        return;
                    }
                    Err(e) => log::error!("Unable to render {:#}", e),
                }
                if let Some(window) = &self.window {
                    window.request_redraw();
                }
            }
            _ => {}
        }
    }
}

/// Opens a window and runs demo `D` until it is closed.
pub fn run<D: Demo + 'static>(options: RunOptions) -> anyhow::Result<()> {
    #[cfg(not(target_arch = "wasm32"))]
    {
        if let Err(e) = env_logger::try_init() {
            println!("Warning: Could not initialize logger: {}", e);
        };
    }

    #[cfg(target_arch = "wasm32")]
    {
        if let Err(e) = console_log::init_with_level(log::Level::Info) {
            web_sys_warn(&e.to_string());
        }
    }

    #[cfg(all(feature = "integration-tests", target_os = "linux"))]
    let event_loop: EventLoop<AppEvent> = {
        use winit::platform::wayland::EventLoopBuilderExtWayland;

        winit::event_loop::EventLoop::with_user_event()
            .with_any_thread(true)
            .build()?
    };

    #[cfg(all(feature = "integration-tests", target_os = "windows"))]
    let event_loop: EventLoop<AppEvent> = {
        use winit::platform::windows::EventLoopBuilderExtWindows;

        winit::event_loop::EventLoop::with_user_event()
            .with_any_thread(true)
            .build()?
    };

    #[cfg(not(all(
        feature = "integration-tests",
        any(target_os = "linux", target_os = "windows")
    )))]
    let event_loop: EventLoop<AppEvent> = EventLoop::with_user_event().build()?;

    let mut app: App<D> = App::new(&event_loop, options)?;

    event_loop.run_app(&mut app)?;

    Ok(())
}

#[cfg(target_arch = "wasm32")]
fn web_sys_warn(message: &str) {
    web_sys::console::warn_1(&message.into());
}

/// Web entry point: runs the demo called `name` on the `canvas` element.
#[cfg(target_arch = "wasm32")]
#[wasm_bindgen]
pub fn run_demo(name: &str) -> Result<(), JsValue> {
    use crate::demos::{digital_path::DigitalPath, earth::Earth, wire_sphere::WireSphere};

    let options = RunOptions::default();
    let result = match name {
        "earth" => run::<Earth>(options),
        "wire-sphere" => run::<WireSphere>(options),
        "digital-path" => run::<DigitalPath>(options),
        other => return Err(JsValue::from_str(&format!("unknown demo '{other}'"))),
    };
    result.map_err(|e| JsValue::from_str(&format!("{e:#}")))
}
