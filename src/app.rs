// =============================================================================
// duskgreet — Orchestrator
//
// Owns everything for the process lifetime: configuration, the style
// registry, the monitor inventory, and every window. Drives the event loop:
// composition happens once during initialization, placement is deferred to
// each window's first redraw (measurement is final by then), and the clock
// and battery timers only ever touch leaf label text.
// =============================================================================

use std::num::NonZeroU32;
use std::rc::Rc;
use std::time::{Duration, Instant};

use chrono::Local;
use softbuffer::{Context, Surface};
use tiny_skia::Pixmap;
use winit::application::ApplicationHandler;
use winit::dpi::{PhysicalPosition, PhysicalSize};
use winit::event::WindowEvent;
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::window::{Window, WindowAttributes, WindowId, WindowLevel};

use tracing::{debug, error, info, warn};

use crate::auth::{AuthOutcome, SessionClient};
use crate::battery::{percentage_text, BatteryReader};
use crate::config::Config;
use crate::input::{translate_key, EntryAction};
use crate::layout::{self, BackgroundPlan, BatteryAnchor, Rect};
use crate::monitor::{self, Monitor};
use crate::render::{self, BackgroundArt};
use crate::style::{StyleProvider, StyleRegistry, Theme, PRIORITY_GREETER};
use crate::text::TextRenderer;
use crate::ui::{compose_battery_ui, compose_credential_ui, BatteryUi, CredentialUi};

const CLOCK_INTERVAL: Duration = Duration::from_secs(15);
const BATTERY_INTERVAL: Duration = Duration::from_secs(5);
const TIME_FORMAT: &str = "%H:%M";

/// Inner padding of the dedicated battery window.
const BATTERY_WINDOW_PADDING: u32 = 8;

/// Shutdown signal: published when any top-level window reaches its terminal
/// "closed" transition, consumed by the orchestrator on the next loop turn.
/// Widgets never call process-exit themselves.
#[derive(Debug, Default)]
pub struct Shutdown {
    requested: bool,
}

impl Shutdown {
    pub fn request(&mut self) {
        self.requested = true;
    }

    pub fn requested(&self) -> bool {
        self.requested
    }
}

type SoftSurface = Surface<Rc<Window>, Rc<Window>>;

/// One window plus its presentation surface.
struct WindowPixels {
    window: Rc<Window>,
    _context: Context<Rc<Window>>,
    surface: SoftSurface,
}

impl WindowPixels {
    fn create(
        event_loop: &ActiveEventLoop,
        attrs: WindowAttributes,
    ) -> Result<Self, Box<dyn std::error::Error>> {
        let window = Rc::new(event_loop.create_window(attrs)?);
        // Cursor suppression scoped to this surface, applied on realization.
        window.set_cursor_visible(false);

        let context = Context::new(window.clone())?;
        let surface = Surface::new(&context, window.clone())?;
        Ok(Self {
            window,
            _context: context,
            surface,
        })
    }

    /// Copy a finished pixmap to the screen.
    fn present(&mut self, pixmap: &Pixmap) {
        let (Some(width), Some(height)) =
            (NonZeroU32::new(pixmap.width()), NonZeroU32::new(pixmap.height()))
        else {
            return;
        };
        if let Err(e) = self.surface.resize(width, height) {
            warn!("Surface resize failed: {e}");
            return;
        }
        let mut buffer = match self.surface.buffer_mut() {
            Ok(buffer) => buffer,
            Err(e) => {
                warn!("Could not map the window buffer: {e}");
                return;
            }
        };
        for (dst, px) in buffer.iter_mut().zip(pixmap.pixels()) {
            let px = px.demultiply();
            *dst = (px.red() as u32) << 16 | (px.green() as u32) << 8 | px.blue() as u32;
        }
        if let Err(e) = buffer.present() {
            warn!("Present failed: {e}");
        }
    }
}

struct BackgroundSurface {
    pixels: WindowPixels,
    plan: BackgroundPlan,
}

struct CredentialSurface {
    pixels: WindowPixels,
    ui: CredentialUi,
    /// One-shot recentering continuation, consumed on the first redraw.
    pending_center: bool,
}

struct BatterySurface {
    pixels: WindowPixels,
    ui: BatteryUi,
    anchor: BatteryAnchor,
    /// One-shot placement continuation, consumed on the first redraw.
    pending_place: bool,
}

pub struct Greeter {
    config: Config,
    registry: StyleRegistry,
    text: TextRenderer,
    art: Option<BackgroundArt>,
    session: SessionClient,
    battery_reader: BatteryReader,

    monitors: Vec<Monitor>,
    backgrounds: Vec<BackgroundSurface>,
    credential: Option<CredentialSurface>,
    battery: Option<BatterySurface>,

    next_clock_tick: Option<Instant>,
    next_battery_tick: Option<Instant>,
    shutdown: Shutdown,
    initialized: bool,
    fatal: Option<String>,
}

impl Greeter {
    /// Build the greeter and run it to completion.
    pub fn run(config: Config) -> Result<(), Box<dyn std::error::Error>> {
        let event_loop = EventLoop::new()?;
        let mut greeter = Self::new(config);
        event_loop.run_app(&mut greeter)?;

        // The registry (and with it the installed style provider) is
        // released here, together with the rest of the greeter state.
        match greeter.fatal.take() {
            Some(message) => Err(message.into()),
            None => Ok(()),
        }
    }

    fn new(config: Config) -> Self {
        let mut registry = StyleRegistry::new();
        match StyleProvider::synthesize(&config) {
            Ok(provider) => registry.install(PRIORITY_GREETER, provider),
            // Degrade to built-in styling rather than aborting a login screen.
            Err(e) => warn!("Theme synthesis failed, keeping defaults: {e}"),
        }

        let art = registry
            .effective()
            .background_image
            .as_deref()
            .and_then(|path| match BackgroundArt::load(path) {
                Ok(art) => Some(art),
                Err(e) => {
                    warn!("Could not load background image {path:?}: {e}");
                    None
                }
            });

        let session = SessionClient::new(&config.login_user, &config.session_command);

        Self {
            config,
            registry,
            text: TextRenderer::new(),
            art,
            session,
            battery_reader: BatteryReader::new(),
            monitors: Vec::new(),
            backgrounds: Vec::new(),
            credential: None,
            battery: None,
            next_clock_tick: None,
            next_battery_tick: None,
            shutdown: Shutdown::default(),
            initialized: false,
            fatal: None,
        }
    }

    fn theme(&self) -> Theme {
        self.registry.effective().clone()
    }

    fn fail(&mut self, event_loop: &ActiveEventLoop, message: String) {
        error!("{message}");
        self.fatal = Some(message);
        event_loop.exit();
    }

    // ---- Initialization (construction happens-before timers and input) ----

    fn initialize(&mut self, event_loop: &ActiveEventLoop) {
        let monitors = match monitor::enumerate_monitors(event_loop) {
            Ok(monitors) => monitors,
            Err(e) => {
                return self.fail(event_loop, format!("cannot start a login screen: {e}"));
            }
        };
        self.monitors = monitors;

        self.provision_backgrounds(event_loop);
        self.warp_pointer_to_origin();

        if let Err(e) = self.create_credential_window(event_loop) {
            return self.fail(event_loop, format!("cannot create the credential window: {e}"));
        }

        if layout::wants_battery_window(&self.config) {
            if let Err(e) = self.create_battery_window(event_loop) {
                return self.fail(event_loop, format!("cannot create the battery window: {e}"));
            }
        }

        let now = Instant::now();
        if self.config.show_sys_info {
            self.tick_clock();
            self.next_clock_tick = Some(now + CLOCK_INTERVAL);
        }
        if self.config.show_battery_info {
            self.tick_battery();
            self.next_battery_tick = Some(now + BATTERY_INTERVAL);
        }

        info!(
            "Composed: {} background surface(s), credential window{}",
            self.backgrounds.len(),
            if self.battery.is_some() {
                ", battery window"
            } else {
                ""
            }
        );
    }

    /// One borderless, always-below surface per monitor, in inventory order.
    fn provision_backgrounds(&mut self, event_loop: &ActiveEventLoop) {
        let plans = layout::plan_background_surfaces(&self.monitors, &self.config);
        for (idx, plan) in plans.into_iter().enumerate() {
            let attrs = Window::default_attributes()
                .with_title("duskgreet-background")
                .with_decorations(false)
                .with_resizable(false)
                .with_window_level(WindowLevel::AlwaysOnBottom)
                .with_inner_size(PhysicalSize::new(plan.bounds.width, plan.bounds.height))
                .with_position(PhysicalPosition::new(plan.bounds.x, plan.bounds.y));

            match WindowPixels::create(event_loop, attrs) {
                Ok(pixels) => {
                    // The size request alone does not position the surface on
                    // layouts with non-zero origins; move explicitly too.
                    pixels
                        .window
                        .set_outer_position(PhysicalPosition::new(plan.bounds.x, plan.bounds.y));
                    pixels.window.request_redraw();
                    self.backgrounds.push(BackgroundSurface { pixels, plan });
                }
                Err(e) => {
                    // The monitor may have vanished under us; keep what we
                    // have instead of failing the built surfaces.
                    warn!("Stopped provisioning at monitor {idx}: {e}");
                    break;
                }
            }
        }
    }

    /// The cursor cannot be suppressed over the entry itself, so park the
    /// pointer over the origin background surface, whose cursor is hidden.
    /// Known-fragile workaround; failure is cosmetic.
    fn warp_pointer_to_origin(&self) {
        let Some(background) = self.backgrounds.first() else {
            return;
        };
        if let Err(e) = background
            .pixels
            .window
            .set_cursor_position(PhysicalPosition::new(0, 0))
        {
            warn!("Could not park the pointer: {e}");
        }
    }

    fn create_credential_window(
        &mut self,
        event_loop: &ActiveEventLoop,
    ) -> Result<(), Box<dyn std::error::Error>> {
        let ui = compose_credential_ui(&self.config);
        let theme = self.theme();

        // Natural size first; the configured screen-space fraction can only
        // ever grow it.
        let (grid_w, grid_h) = render::natural_size(&ui.grid, &mut self.text, &theme);
        let inset = 2 * (self.config.layout_spacing + theme.border_width);
        let primary = *monitor::primary(&self.monitors);
        let (width, height) =
            layout::adjust_screen_space(grid_w + inset, grid_h + inset, &primary, &self.config);

        let attrs = Window::default_attributes()
            .with_title("duskgreet")
            .with_decorations(false)
            .with_resizable(false)
            .with_inner_size(PhysicalSize::new(width, height));
        let pixels = WindowPixels::create(event_loop, attrs)?;
        pixels.window.focus_window();
        pixels.window.request_redraw();

        self.credential = Some(CredentialSurface {
            pixels,
            ui,
            pending_center: true,
        });
        Ok(())
    }

    fn create_battery_window(
        &mut self,
        event_loop: &ActiveEventLoop,
    ) -> Result<(), Box<dyn std::error::Error>> {
        let ui = compose_battery_ui();
        let theme = self.theme();
        let (grid_w, grid_h) = render::natural_size(&ui.grid, &mut self.text, &theme);
        let pad = 2 * BATTERY_WINDOW_PADDING;

        let attrs = Window::default_attributes()
            .with_title("duskgreet-battery")
            .with_decorations(false)
            .with_resizable(false)
            .with_inner_size(PhysicalSize::new(grid_w.max(1) + pad, grid_h + pad));
        let pixels = WindowPixels::create(event_loop, attrs)?;
        pixels.window.request_redraw();

        self.battery = Some(BatterySurface {
            pixels,
            ui,
            anchor: BatteryAnchor::from_name(&self.config.battery_info_position),
            pending_place: true,
        });
        Ok(())
    }

    // ---- Redraw & deferred placement ----

    fn draw_background(&mut self, idx: usize) {
        let theme = self.theme();
        let art = self.art.as_ref();
        let Some(background) = self.backgrounds.get_mut(idx) else {
            return;
        };
        let size = background.pixels.window.inner_size();
        let Some(mut pixmap) = Pixmap::new(size.width, size.height) else {
            return;
        };
        render::paint_background(&mut pixmap, &theme, background.plan.with_image, art);
        background.pixels.present(&pixmap);
    }

    fn draw_credential(&mut self) {
        let theme = self.theme();
        let primary = *monitor::primary(&self.monitors);
        let layout_spacing = self.config.layout_spacing;
        let Some(credential) = self.credential.as_mut() else {
            return;
        };

        let size = credential.pixels.window.inner_size();

        // First-visible continuation: recenter using the final measured
        // size. Fires exactly once.
        if credential.pending_center {
            credential.pending_center = false;
            let (x, y) = layout::center_on(&primary, size.width, size.height);
            credential
                .pixels
                .window
                .set_outer_position(PhysicalPosition::new(x, y));
            debug!("credential window centered at ({x}, {y})");
        }

        let Some(mut pixmap) = Pixmap::new(size.width, size.height) else {
            return;
        };
        render::paint_main_chrome(&mut pixmap, &theme);

        let inset = (layout_spacing + theme.border_width) as i32;
        let bounds = Rect::new(
            inset,
            inset,
            size.width.saturating_sub(2 * inset as u32),
            size.height.saturating_sub(2 * inset as u32),
        );
        render::render_grid(&mut pixmap, &credential.ui.grid, bounds, &mut self.text, &theme);
        credential.pixels.present(&pixmap);
    }

    fn draw_battery(&mut self) {
        let theme = self.theme();
        let primary = *monitor::primary(&self.monitors);
        let Some(battery) = self.battery.as_mut() else {
            return;
        };

        let size = battery.pixels.window.inner_size();
        if battery.pending_place {
            battery.pending_place = false;
            let (x, y) = battery.anchor.position(&primary, size.width, size.height);
            battery
                .pixels
                .window
                .set_outer_position(PhysicalPosition::new(x, y));
            debug!("battery window placed at ({x}, {y}) ({:?})", battery.anchor);
        }

        let Some(mut pixmap) = Pixmap::new(size.width, size.height) else {
            return;
        };
        render::paint_battery_chrome(&mut pixmap, &theme);
        let pad = BATTERY_WINDOW_PADDING as i32;
        let bounds = Rect::new(
            pad,
            pad,
            size.width.saturating_sub(2 * BATTERY_WINDOW_PADDING),
            size.height.saturating_sub(2 * BATTERY_WINDOW_PADDING),
        );
        render::render_grid(&mut pixmap, &battery.ui.grid, bounds, &mut self.text, &theme);
        battery.pixels.present(&pixmap);
    }

    // ---- Timers (leaf text only, never structure) ----

    fn tick_clock(&mut self) {
        let Some(credential) = self.credential.as_mut() else {
            return;
        };
        let now = Local::now().format(TIME_FORMAT).to_string();
        credential.ui.set_time_text(&now);
        credential.pixels.window.request_redraw();
    }

    fn tick_battery(&mut self) {
        let sample = self.battery_reader.sample();
        let (status, percentage) = match &sample {
            Some(sample) => (sample.status.clone(), percentage_text(sample)),
            None => ("No battery".to_string(), String::new()),
        };

        if let Some(battery) = self.battery.as_mut() {
            battery.ui.set_status(&status);
            battery.ui.set_percentage(&percentage);
            battery.pixels.window.request_redraw();
        } else if let Some(credential) = self
            .credential
            .as_mut()
            .filter(|c| c.ui.has_battery_row())
        {
            credential.ui.set_battery_status(&status);
            credential.ui.set_battery_percentage(&percentage);
            credential.pixels.window.request_redraw();
        }
    }

    fn service_timers(&mut self) {
        let now = Instant::now();
        if let Some(due) = self.next_clock_tick {
            if now >= due {
                self.tick_clock();
                self.next_clock_tick = Some(now + CLOCK_INTERVAL);
            }
        }
        if let Some(due) = self.next_battery_tick {
            if now >= due {
                self.tick_battery();
                self.next_battery_tick = Some(now + BATTERY_INTERVAL);
            }
        }
    }

    fn next_deadline(&self) -> Option<Instant> {
        [self.next_clock_tick, self.next_battery_tick]
            .into_iter()
            .flatten()
            .min()
    }

    // ---- Input ----

    fn apply_entry_action(&mut self, action: EntryAction) {
        let Some(credential) = self.credential.as_mut() else {
            return;
        };
        match action {
            EntryAction::Insert(text) => {
                for c in text.chars() {
                    credential.ui.entry_mut().push_char(c);
                }
            }
            EntryAction::Backspace => credential.ui.entry_mut().backspace(),
            EntryAction::Clear => credential.ui.entry_mut().clear(),
            EntryAction::Submit => {
                self.submit_secret();
                return;
            }
            EntryAction::None => return,
        }
        credential.pixels.window.request_redraw();
    }

    fn submit_secret(&mut self) {
        let Some(credential) = self.credential.as_mut() else {
            return;
        };
        if credential.ui.entry().is_empty() {
            return;
        }
        let secret = credential.ui.entry_mut().take_secret();

        match self.session.authenticate(&secret) {
            AuthOutcome::Success => {
                info!("Authentication succeeded, handing over the seat");
                self.shutdown.request();
            }
            AuthOutcome::Failure(message) => {
                credential.ui.set_feedback(&message);
                credential.pixels.window.request_redraw();
            }
        }
    }

    // ---- Window lookup ----

    fn is_background(&self, id: WindowId) -> bool {
        self.backgrounds
            .iter()
            .any(|b| b.pixels.window.id() == id)
    }

    fn background_index(&self, id: WindowId) -> Option<usize> {
        self.backgrounds
            .iter()
            .position(|b| b.pixels.window.id() == id)
    }

    fn is_credential(&self, id: WindowId) -> bool {
        self.credential
            .as_ref()
            .is_some_and(|c| c.pixels.window.id() == id)
    }

    fn is_battery(&self, id: WindowId) -> bool {
        self.battery
            .as_ref()
            .is_some_and(|b| b.pixels.window.id() == id)
    }
}

impl ApplicationHandler for Greeter {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if !self.initialized {
            self.initialized = true;
            self.initialize(event_loop);
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        window_id: WindowId,
        event: WindowEvent,
    ) {
        match event {
            WindowEvent::CloseRequested | WindowEvent::Destroyed => {
                // Terminal transition of any top-level window ends the
                // process; there is no window-recreation path.
                info!("Window closed, shutting down");
                self.shutdown.request();
            }
            WindowEvent::RedrawRequested => {
                if let Some(idx) = self.background_index(window_id) {
                    self.draw_background(idx);
                } else if self.is_credential(window_id) {
                    self.draw_credential();
                } else if self.is_battery(window_id) {
                    self.draw_battery();
                }
            }
            WindowEvent::KeyboardInput { event, .. } => {
                // Keystrokes landing on a background surface belong to the
                // credential window; refocus it as we consume them.
                if self.is_background(window_id) {
                    if let Some(credential) = &self.credential {
                        credential.pixels.window.focus_window();
                    }
                }
                let action = translate_key(&event);
                self.apply_entry_action(action);
            }
            _ => {}
        }

        if self.shutdown.requested() {
            event_loop.exit();
        }
    }

    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        if self.shutdown.requested() {
            event_loop.exit();
            return;
        }

        self.service_timers();
        match self.next_deadline() {
            Some(deadline) => event_loop.set_control_flow(ControlFlow::WaitUntil(deadline)),
            None => event_loop.set_control_flow(ControlFlow::Wait),
        }
    }
}
