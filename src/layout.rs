// =============================================================================
// duskgreet — Placement & Sizing
//
// The geometric core: background surface plans for every monitor, centered
// placement and adaptive sizing of the credential window, and the six-way
// anchor table for the battery panel. Everything here is pure arithmetic
// over the monitor inventory; the window layer applies the results.
// =============================================================================

use crate::config::{Config, MAIN_WINDOW_POSITION};
use crate::monitor::Monitor;

use tracing::debug;

/// A window-sized pixel rectangle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

impl Rect {
    pub fn new(x: i32, y: i32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }
}

impl Monitor {
    pub fn rect(&self) -> Rect {
        Rect::new(self.x, self.y, self.width, self.height)
    }
}

/// Margin in pixels between the battery panel and the screen border.
pub const BATTERY_MARGIN: i32 = 10;

/// Tolerance when comparing the configured screen-space fraction against the
/// window's natural fraction.
pub const SCREEN_SPACE_EPSILON: f32 = 1e-5;

// -----------------------------------------------------------------------------
// Background surfaces
// -----------------------------------------------------------------------------

/// Everything the window layer needs to provision one background surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BackgroundPlan {
    /// Exact pixel bounds of the monitor this surface covers. Both the size
    /// request and an explicit move are required: size alone does not
    /// position a surface on layouts with non-zero origins.
    pub bounds: Rect,
    /// Whether the stylesheet's background-image rule applies to this
    /// surface.
    pub with_image: bool,
}

/// Whether a surface on the given monitor shows the background image.
pub fn wants_background_image(primary: bool, show_on_all: bool, image_path: &str) -> bool {
    (primary || show_on_all) && !image_path.is_empty()
}

/// One plan per monitor, in inventory order.
pub fn plan_background_surfaces(monitors: &[Monitor], config: &Config) -> Vec<BackgroundPlan> {
    monitors
        .iter()
        .map(|m| BackgroundPlan {
            bounds: m.rect(),
            with_image: wants_background_image(
                m.primary,
                config.show_image_on_all_monitors,
                &config.background_image,
            ),
        })
        .collect()
}

// -----------------------------------------------------------------------------
// Credential window
// -----------------------------------------------------------------------------

/// Center a window of the given measured size on a monitor.
pub fn center_on(monitor: &Monitor, width: u32, height: u32) -> (i32, i32) {
    (
        monitor.x + monitor.width as i32 / 2 - width as i32 / 2,
        monitor.y + monitor.height as i32 / 2 - height as i32 / 2,
    )
}

/// Grow a window's natural size to cover the configured fraction of the
/// primary monitor. The configuration can only ever request *more* space:
/// a fraction at or below the natural one leaves the natural size intact.
pub fn adjust_screen_space(
    natural_width: u32,
    natural_height: u32,
    monitor: &Monitor,
    config: &Config,
) -> (u32, u32) {
    let natural_h = natural_width as f32 / monitor.width as f32;
    let natural_v = natural_height as f32 / monitor.height as f32;

    let mut width = natural_width;
    let mut height = natural_height;
    if (config.screen_space_h - natural_h).abs() > SCREEN_SPACE_EPSILON
        && config.screen_space_h > natural_h
    {
        width = (config.screen_space_h * monitor.width as f32) as u32;
    }
    if (config.screen_space_v - natural_v).abs() > SCREEN_SPACE_EPSILON
        && config.screen_space_v > natural_v
    {
        height = (config.screen_space_v * monitor.height as f32) as u32;
    }

    if (width, height) != (natural_width, natural_height) {
        debug!(
            "credential window grown {natural_width}x{natural_height} -> {width}x{height}"
        );
    }
    (width, height)
}

// -----------------------------------------------------------------------------
// Battery panel anchors
// -----------------------------------------------------------------------------

/// The six fixed battery-panel positions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BatteryAnchor {
    TopLeft,
    Top,
    #[default]
    TopRight,
    BottomLeft,
    Bottom,
    BottomRight,
}

impl BatteryAnchor {
    /// Resolve a configured position name. Unknown names fall back to the
    /// top-right corner; `main-window` is a sentinel handled by the caller
    /// and is not an anchor.
    pub fn from_name(name: &str) -> Self {
        match name {
            "topleft" => BatteryAnchor::TopLeft,
            "top" => BatteryAnchor::Top,
            "topright" => BatteryAnchor::TopRight,
            "bottomleft" => BatteryAnchor::BottomLeft,
            "bottom" => BatteryAnchor::Bottom,
            "bottomright" => BatteryAnchor::BottomRight,
            other => {
                if other != MAIN_WINDOW_POSITION {
                    debug!("unknown battery position {other:?}, using topright");
                }
                BatteryAnchor::TopRight
            }
        }
    }

    /// Top-left corner for a panel of the given measured size on a monitor.
    pub fn position(self, monitor: &Monitor, width: u32, height: u32) -> (i32, i32) {
        let r = monitor.rect();
        let (w, h) = (width as i32, height as i32);
        let m = BATTERY_MARGIN;
        let (rw, rh) = (r.width as i32, r.height as i32);

        match self {
            BatteryAnchor::TopLeft => (r.x + m, r.y + m),
            BatteryAnchor::Top => (r.x + rw / 2 - w / 2, r.y + m),
            BatteryAnchor::TopRight => (r.x + rw - w - m, r.y + m),
            BatteryAnchor::BottomLeft => (r.x + m, r.y + rh - h - m),
            // The x offset lands right of center, not centered; deliberate
            // compatibility quirk (see DESIGN.md).
            BatteryAnchor::Bottom => (r.x + rw / 2 + w / 2, r.y + rh - h - m),
            BatteryAnchor::BottomRight => (r.x + rw - w - m, r.y + rh - h - m),
        }
    }
}

/// Whether a dedicated battery window exists at all.
pub fn wants_battery_window(config: &Config) -> bool {
    config.show_battery_info && config.battery_info_position != MAIN_WINDOW_POSITION
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;

    fn primary() -> Monitor {
        Monitor::new(0, 0, 1920, 1080, true)
    }

    #[test]
    fn one_plan_per_monitor_with_exact_bounds() {
        let monitors = vec![
            Monitor::new(0, 0, 1920, 1080, true),
            Monitor::new(1920, 0, 2560, 1440, false),
            Monitor::new(-1280, 0, 1280, 1024, false),
        ];
        let plans = plan_background_surfaces(&monitors, &Config::default());
        assert_eq!(plans.len(), monitors.len());
        for (plan, monitor) in plans.iter().zip(&monitors) {
            assert_eq!(plan.bounds, monitor.rect());
        }
    }

    #[test]
    fn image_visibility_truth_table() {
        // (primary, show_on_all, image set) -> visible
        for (primary, all, image, expected) in [
            (true, false, "bg.png", true),
            (true, true, "bg.png", true),
            (false, true, "bg.png", true),
            (false, false, "bg.png", false),
            (true, false, "", false),
            (true, true, "", false),
            (false, true, "", false),
            (false, false, "", false),
        ] {
            assert_eq!(
                wants_background_image(primary, all, image),
                expected,
                "primary={primary} all={all} image={image:?}"
            );
        }
    }

    #[test]
    fn only_primary_surface_is_tagged_by_default() {
        let monitors = vec![
            Monitor::new(0, 0, 1920, 1080, true),
            Monitor::new(1920, 0, 1920, 1080, false),
        ];
        let config = Config {
            background_image: "/usr/share/wallpaper.png".to_string(),
            show_image_on_all_monitors: false,
            ..Config::default()
        };
        let plans = plan_background_surfaces(&monitors, &config);
        assert!(plans[0].with_image);
        assert!(!plans[1].with_image);
    }

    #[test]
    fn centering_uses_the_monitor_origin() {
        let monitor = Monitor::new(1920, 200, 1920, 1080, true);
        assert_eq!(center_on(&monitor, 400, 200), (1920 + 960 - 200, 200 + 540 - 100));
    }

    #[test]
    fn adaptive_sizing_never_shrinks() {
        let config = Config {
            screen_space_h: 0.1,
            screen_space_v: 0.1,
            ..Config::default()
        };
        // Natural fraction 400/1920 > 0.1: natural size stands.
        assert_eq!(adjust_screen_space(400, 300, &primary(), &config), (400, 300));
    }

    #[test]
    fn adaptive_sizing_grows_to_configured_fraction() {
        let config = Config {
            screen_space_h: 0.5,
            screen_space_v: 0.0,
            ..Config::default()
        };
        // Natural width fraction 0.3 of 1920 -> grown to half the monitor.
        let (width, height) = adjust_screen_space(576, 300, &primary(), &config);
        assert_eq!(width, 960);
        assert_eq!(height, 300);
    }

    #[test]
    fn adaptive_sizing_ignores_fractions_within_epsilon() {
        let config = Config {
            screen_space_h: 576.0 / 1920.0 + 1e-6,
            ..Config::default()
        };
        assert_eq!(adjust_screen_space(576, 300, &primary(), &config).0, 576);
    }

    #[test]
    fn anchor_table_matches_fixed_geometry() {
        let monitor = Monitor::new(100, 50, 1920, 1080, true);
        let (w, h) = (200, 80);
        let cases = [
            (BatteryAnchor::TopLeft, (110, 60)),
            (BatteryAnchor::Top, (100 + 960 - 100, 60)),
            (BatteryAnchor::TopRight, (100 + 1920 - 200 - 10, 60)),
            (BatteryAnchor::BottomLeft, (110, 50 + 1080 - 80 - 10)),
            // "bottom" adds half the panel width instead of subtracting it.
            (BatteryAnchor::Bottom, (100 + 960 + 100, 50 + 1080 - 80 - 10)),
            (BatteryAnchor::BottomRight, (100 + 1920 - 200 - 10, 50 + 1080 - 80 - 10)),
        ];
        for (anchor, expected) in cases {
            assert_eq!(anchor.position(&monitor, w, h), expected, "{anchor:?}");
        }
    }

    #[test]
    fn bottom_anchor_at_origin_monitor() {
        // 200x80 panel on a 1920x1080 monitor at the origin.
        let pos = BatteryAnchor::Bottom.position(&primary(), 200, 80);
        assert_eq!(pos, (1060, 990));
    }

    #[test]
    fn anchor_names_resolve_exactly() {
        assert_eq!(BatteryAnchor::from_name("topleft"), BatteryAnchor::TopLeft);
        assert_eq!(BatteryAnchor::from_name("top"), BatteryAnchor::Top);
        assert_eq!(BatteryAnchor::from_name("topright"), BatteryAnchor::TopRight);
        assert_eq!(BatteryAnchor::from_name("bottomleft"), BatteryAnchor::BottomLeft);
        assert_eq!(BatteryAnchor::from_name("bottom"), BatteryAnchor::Bottom);
        assert_eq!(BatteryAnchor::from_name("bottomright"), BatteryAnchor::BottomRight);
    }

    #[test]
    fn unknown_anchor_falls_back_to_topright() {
        let monitor = primary();
        let fallback = BatteryAnchor::from_name("center-of-the-universe");
        assert_eq!(
            fallback.position(&monitor, 200, 80),
            BatteryAnchor::TopRight.position(&monitor, 200, 80)
        );
    }

    #[test]
    fn battery_window_presence() {
        let mut config = Config {
            show_battery_info: true,
            battery_info_position: "bottomleft".to_string(),
            ..Config::default()
        };
        assert!(wants_battery_window(&config));

        config.battery_info_position = MAIN_WINDOW_POSITION.to_string();
        assert!(!wants_battery_window(&config));

        config.show_battery_info = false;
        config.battery_info_position = "topright".to_string();
        assert!(!wants_battery_window(&config));
    }
}
