// =============================================================================
// duskgreet — Monitor Inventory
//
// Takes a one-time snapshot of the attached monitors and their pixel
// geometries. The inventory is ordered, carries exactly one primary, and is
// never refreshed: hot-plug is out of scope for a login screen.
// =============================================================================

use std::fmt;

use winit::event_loop::ActiveEventLoop;

use tracing::{debug, info};

/// Pixel geometry of one attached monitor, plus the primary flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Monitor {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
    pub primary: bool,
}

impl Monitor {
    pub fn new(x: i32, y: i32, width: u32, height: u32, primary: bool) -> Self {
        Self {
            x,
            y,
            width,
            height,
            primary,
        }
    }
}

/// The display system cannot be used for a login screen.
#[derive(Debug, PartialEq, Eq)]
pub enum MonitorError {
    /// The display reported zero attached monitors.
    NoMonitors,
}

impl fmt::Display for MonitorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MonitorError::NoMonitors => write!(f, "display reported zero monitors"),
        }
    }
}

impl std::error::Error for MonitorError {}

/// Query the display system for the current monitor layout.
///
/// Returns an ordered inventory with at least one element and exactly one
/// primary. Failing here is unrecoverable: the caller is expected to abort.
pub fn enumerate_monitors(event_loop: &ActiveEventLoop) -> Result<Vec<Monitor>, MonitorError> {
    let primary = event_loop.primary_monitor();

    let mut monitors = Vec::new();
    for handle in event_loop.available_monitors() {
        let position = handle.position();
        let size = handle.size();
        let is_primary = primary
            .as_ref()
            .map(|p| p.position() == position && p.size() == size && p.name() == handle.name())
            .unwrap_or(false);
        debug!(
            "monitor {:?}: {}x{} at ({}, {}){}",
            handle.name(),
            size.width,
            size.height,
            position.x,
            position.y,
            if is_primary { " [primary]" } else { "" }
        );
        monitors.push(Monitor::new(
            position.x,
            position.y,
            size.width,
            size.height,
            is_primary,
        ));
    }

    if monitors.is_empty() {
        return Err(MonitorError::NoMonitors);
    }

    normalize_primary(&mut monitors);
    info!("Monitor inventory: {} attached", monitors.len());
    Ok(monitors)
}

/// Return the primary monitor of a normalized inventory.
pub fn primary(monitors: &[Monitor]) -> &Monitor {
    monitors
        .iter()
        .find(|m| m.primary)
        .unwrap_or(&monitors[0])
}

/// Ensure exactly one monitor is flagged primary.
///
/// If the display system reported none, the monitor at the origin is
/// promoted (else the first); if it reported several, the first flagged one
/// wins.
fn normalize_primary(monitors: &mut [Monitor]) {
    let mut seen = false;
    for m in monitors.iter_mut() {
        if m.primary {
            if seen {
                m.primary = false;
            }
            seen = true;
        }
    }
    if !seen && !monitors.is_empty() {
        let idx = monitors
            .iter()
            .position(|m| m.x == 0 && m.y == 0)
            .unwrap_or(0);
        monitors[idx].primary = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn promotes_origin_monitor_when_no_primary_reported() {
        let mut monitors = vec![
            Monitor::new(1920, 0, 1920, 1080, false),
            Monitor::new(0, 0, 1920, 1080, false),
        ];
        normalize_primary(&mut monitors);
        assert!(!monitors[0].primary);
        assert!(monitors[1].primary);
    }

    #[test]
    fn falls_back_to_first_monitor_without_an_origin() {
        let mut monitors = vec![
            Monitor::new(100, 50, 1280, 720, false),
            Monitor::new(1380, 50, 1280, 720, false),
        ];
        normalize_primary(&mut monitors);
        assert!(monitors[0].primary);
        assert!(!monitors[1].primary);
    }

    #[test]
    fn keeps_a_single_primary_when_several_are_flagged() {
        let mut monitors = vec![
            Monitor::new(0, 0, 1920, 1080, true),
            Monitor::new(1920, 0, 1920, 1080, true),
        ];
        normalize_primary(&mut monitors);
        assert_eq!(
            monitors.iter().filter(|m| m.primary).count(),
            1,
            "exactly one primary"
        );
        assert!(monitors[0].primary);
    }
}
