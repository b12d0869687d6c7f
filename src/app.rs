use std::sync::Arc;
use std::time::Duration;

use instant::Instant;
use winit::application::ApplicationHandler;
use winit::dpi::LogicalSize;
use winit::event::{ElementState, KeyEvent, MouseButton, WindowEvent};
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::keyboard::{Key, NamedKey};
use winit::window::{Window, WindowAttributes, WindowId};

use crate::config::AppConfig;
use crate::ecs::components::Direction;
use crate::geometry::ContainerSize;
use crate::hunger;
use crate::pet::animation::{LogSurface, PetFrame, RenderSurface};
use crate::pet::generate_pet_name;
use crate::settings::{PetSettings, SettingsBus, SettingsChanged, SettingsPublisher};
use crate::sim::Simulation;
use crate::species::{Roster, SpeciesId};
use crate::store::{JsonFileStore, KvStore, MemoryStore};

/// How often to log loop stats (seconds).
const STATS_LOG_INTERVAL: f64 = 5.0;

// ---------------------------------------------------------------------------
// Frame timing
// ---------------------------------------------------------------------------

struct FrameStats {
    frame_count: u64,
    last_log_time: Instant,
    frame_time_sum: f64,
    frame_time_min: f64,
    frame_time_max: f64,
    frames_since_log: u32,
}

impl FrameStats {
    fn new() -> Self {
        Self {
            frame_count: 0,
            last_log_time: Instant::now(),
            frame_time_sum: 0.0,
            frame_time_min: f64::MAX,
            frame_time_max: 0.0,
            frames_since_log: 0,
        }
    }

    fn record_frame(&mut self, dt_ms: f64, sim: &Simulation) {
        self.frame_count += 1;
        self.frames_since_log += 1;
        self.frame_time_sum += dt_ms;
        self.frame_time_min = self.frame_time_min.min(dt_ms);
        self.frame_time_max = self.frame_time_max.max(dt_ms);

        let elapsed = self.last_log_time.elapsed().as_secs_f64();
        if elapsed >= STATS_LOG_INTERVAL {
            log::info!(
                "Loop: {:.0}/s | avg: {:.2}ms | min: {:.2}ms | max: {:.2}ms | frames: {} | ticks: {} | {:?} at x={:.0} | hunger: {} | items: {}",
                self.frames_since_log as f64 / elapsed,
                self.frame_time_sum / self.frames_since_log as f64,
                self.frame_time_min,
                self.frame_time_max,
                self.frame_count,
                sim.tick_count(),
                sim.state().behavior,
                sim.position().x,
                sim.hunger().level(),
                sim.collectibles().len(),
            );
            self.last_log_time = Instant::now();
            self.frame_time_sum = 0.0;
            self.frame_time_min = f64::MAX;
            self.frame_time_max = 0.0;
            self.frames_since_log = 0;
        }
    }
}

// ---------------------------------------------------------------------------
// Title surface
// ---------------------------------------------------------------------------

/// Shows the pet's state in the window title, and logs animation changes.
struct TitleSurface {
    window: Arc<Window>,
    last: String,
    log: LogSurface,
}

impl TitleSurface {
    fn new(window: Arc<Window>) -> Self {
        Self {
            window,
            last: String::new(),
            log: LogSurface::default(),
        }
    }

    fn set(&mut self, title: String) {
        if title != self.last {
            self.window.set_title(&title);
            self.last = title;
        }
    }
}

fn title_for(frame: &PetFrame) -> String {
    let facing = match frame.direction {
        Direction::Left => "←",
        Direction::Right => "→",
    };
    let pending = frame.collectibles.iter().filter(|c| !c.collected).count();
    let mut title = format!(
        "{} · {} · {} · hunger {}",
        frame.name,
        frame.action.label(),
        facing,
        frame.hunger
    );
    if pending > 0 {
        title.push_str(&format!(" · {pending} treat(s)"));
    }
    title
}

impl RenderSurface for TitleSurface {
    fn present(&mut self, frame: &PetFrame) {
        self.log.present(frame);
        self.set(title_for(frame));
    }
}

// ---------------------------------------------------------------------------
// App
// ---------------------------------------------------------------------------

/// Top-level application state.
struct App {
    config: AppConfig,
    roster: Roster,
    store: Box<dyn KvStore>,

    settings: PetSettings,
    bus: SettingsBus,
    publisher: SettingsPublisher,

    window: Option<Arc<Window>>,
    surface: Option<TitleSurface>,
    sim: Option<Simulation>,

    // Fixed timestep (ms)
    last_frame_time: Option<Instant>,
    accumulator: f64,

    frame_stats: FrameStats,

    // Container in logical pixels
    container: ContainerSize,
    cursor_x: f32,

    // Name generator
    rng: fastrand::Rng,
}

impl App {
    fn new(config: AppConfig, mut store: Box<dyn KvStore>) -> Self {
        let roster = Roster::with_overrides(&config.species);
        let settings = PetSettings::load(store.as_mut());
        let bus = SettingsBus::new();
        let publisher = bus.publisher();
        let container = ContainerSize {
            width: config.window.width as f32,
            height: config.window.height as f32,
        };

        Self {
            config,
            roster,
            store,
            settings,
            bus,
            publisher,
            window: None,
            surface: None,
            sim: None,
            last_frame_time: None,
            accumulator: 0.0,
            frame_stats: FrameStats::new(),
            container,
            cursor_x: 0.0,
            rng: fastrand::Rng::new(),
        }
    }

    fn tick_ms(&self) -> f64 {
        self.config.simulation.tick_ms as f64
    }

    /// Drop the running pet (and everything it had scheduled) and build the
    /// one the current settings ask for.
    fn rebuild_sim(&mut self) {
        self.sim = None;
        self.accumulator = 0.0;
        self.last_frame_time = None;

        self.sim = Simulation::from_settings(
            &self.settings,
            &self.roster,
            self.container,
            self.config.simulation.tick_ms,
            self.store.as_mut(),
        );

        if let Some(sim) = &self.sim {
            log::info!("Showing {} the {}", sim.name(), sim.species());
        } else {
            log::info!(
                "No pet shown (enabled: {}, type: {})",
                self.settings.enable_pets,
                self.settings.pet_type
            );
            let title = self.config.window.title.clone();
            if let Some(surface) = &mut self.surface {
                surface.set(title);
            }
        }
    }

    /// Apply queued settings changes in order.
    fn apply_settings(&mut self) {
        for change in self.bus.drain() {
            let delta = self.settings.apply(&change, self.store.as_mut());
            if !delta.any() {
                continue;
            }
            log::debug!("Settings changed: {delta:?}");

            if delta.enabled || delta.species {
                self.rebuild_sim();
            } else if delta.name {
                if let Some(sim) = &mut self.sim {
                    sim.rename(self.settings.pet_name.clone());
                }
            }
        }
    }

    /// Run fixed-timestep simulation ticks for the time since the last call.
    fn run_fixed_update(&mut self) {
        let now = Instant::now();
        let Some(sim) = &mut self.sim else {
            self.last_frame_time = None;
            return;
        };
        let Some(surface) = &mut self.surface else {
            return;
        };

        if let Some(last) = self.last_frame_time {
            let dt_ms = now.duration_since(last).as_secs_f64() * 1000.0;
            self.frame_stats.record_frame(dt_ms, sim);

            self.accumulator += dt_ms;
            let cap = self.config.simulation.max_catch_up_ms as f64;
            if self.accumulator > cap {
                self.accumulator = cap;
            }

            let tick_ms = self.config.simulation.tick_ms;
            while self.accumulator >= tick_ms as f64 {
                sim.tick(
                    tick_ms,
                    hunger::wall_clock_ms(),
                    self.container,
                    self.store.as_mut(),
                    surface,
                );
                self.accumulator -= tick_ms as f64;
            }
        }
        self.last_frame_time = Some(now);
    }

    fn on_key(&mut self, event: &KeyEvent, event_loop: &ActiveEventLoop) {
        if event.state != ElementState::Pressed || event.repeat {
            return;
        }

        match &event.logical_key {
            Key::Named(NamedKey::Escape) => {
                log::info!("ESC pressed, exiting");
                event_loop.exit();
            }
            Key::Named(NamedKey::Space) => self.publisher.publish(SettingsChanged {
                enable_pets: Some(!self.settings.enable_pets),
                ..Default::default()
            }),
            Key::Named(NamedKey::Tab) => {
                let next = self
                    .settings
                    .species()
                    .map(SpeciesId::next)
                    .unwrap_or(SpeciesId::Cat);
                self.publisher.publish(SettingsChanged {
                    pet_type: Some(next),
                    ..Default::default()
                });
            }
            Key::Character(c) if c.eq_ignore_ascii_case("n") => {
                self.publisher.publish(SettingsChanged {
                    pet_name: Some(generate_pet_name(&mut self.rng)),
                    ..Default::default()
                });
            }
            _ => {}
        }
    }

    fn update_container(&mut self, window: &Window) {
        let size: LogicalSize<f32> = window.inner_size().to_logical(window.scale_factor());
        self.container = ContainerSize {
            width: size.width,
            height: size.height,
        };
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }

        let attrs = WindowAttributes::default()
            .with_title(self.config.window.title.clone())
            .with_inner_size(LogicalSize::new(
                self.config.window.width,
                self.config.window.height,
            ));

        let window = match event_loop.create_window(attrs) {
            Ok(window) => Arc::new(window),
            Err(e) => {
                log::error!("Failed to create window: {e}");
                event_loop.exit();
                return;
            }
        };

        self.update_container(&window);
        log::info!(
            "Window created: {:.0}x{:.0}",
            self.container.width,
            self.container.height
        );

        self.surface = Some(TitleSurface::new(window.clone()));
        self.window = Some(window);
        self.rebuild_sim();
    }

    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        self.apply_settings();
        self.run_fixed_update();

        if self.sim.is_some() {
            let tick = Duration::from_secs_f64(self.tick_ms() / 1000.0);
            event_loop.set_control_flow(ControlFlow::WaitUntil(Instant::now() + tick));
        } else {
            event_loop.set_control_flow(ControlFlow::Wait);
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        match event {
            WindowEvent::CloseRequested => {
                log::info!("Close requested, exiting");
                event_loop.exit();
            }
            WindowEvent::Resized(_) | WindowEvent::ScaleFactorChanged { .. } => {
                if let Some(window) = self.window.clone() {
                    self.update_container(&window);
                }
            }
            WindowEvent::CursorMoved { position, .. } => {
                let scale = self.window.as_ref().map_or(1.0, |w| w.scale_factor());
                self.cursor_x = (position.x / scale) as f32;
            }
            WindowEvent::MouseInput {
                state: ElementState::Pressed,
                button: MouseButton::Left,
                ..
            } => {
                if let Some(sim) = &mut self.sim {
                    sim.pointer_down(self.cursor_x, self.container);
                }
            }
            WindowEvent::KeyboardInput { event, .. } => self.on_key(&event, event_loop),
            _ => {}
        }
    }
}

fn open_store(config: &AppConfig) -> Box<dyn KvStore> {
    let path = config.store.resolved_path();
    match JsonFileStore::open(&path) {
        Ok(store) => {
            log::info!("Using store at {}", store.path().display());
            Box::new(store)
        }
        Err(e) => {
            log::warn!("Cannot open store at {}, keeping state in memory: {e}", path.display());
            Box::new(MemoryStore::new())
        }
    }
}

/// Entry point: create event loop and run.
pub fn run(config: AppConfig) -> crate::error::Result<()> {
    let event_loop = EventLoop::new()?;
    let store = open_store(&config);
    let mut app = App::new(config, store);
    event_loop.run_app(&mut app)?;
    Ok(())
}
