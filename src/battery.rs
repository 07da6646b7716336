// =============================================================================
// duskgreet — Battery Sampler
//
// Polls /sys/class/power_supply for the battery panel's labels. Charge is
// derived from charge_now/charge_full where available, falling back to the
// kernel's capacity field. A machine without a battery yields "not present"
// rather than an error.
// =============================================================================

use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

/// Candidate supply directories, checked in order on every sample.
const SUPPLY_DIRS: [&str; 2] = [
    "/sys/class/power_supply/BAT0",
    "/sys/class/power_supply/BAT1",
];

/// One reading of the battery state.
#[derive(Debug, Clone, PartialEq)]
pub struct BatterySample {
    /// 0..=100.
    pub percentage: f32,
    /// Kernel status string ("Charging", "Discharging", "Full", ...).
    pub status: String,
}

pub struct BatteryReader {
    candidates: Vec<PathBuf>,
}

impl BatteryReader {
    pub fn new() -> Self {
        Self {
            candidates: SUPPLY_DIRS.iter().map(PathBuf::from).collect(),
        }
    }

    #[cfg(test)]
    fn with_candidates(candidates: Vec<PathBuf>) -> Self {
        Self { candidates }
    }

    /// Read the current battery state, or `None` when no battery is present.
    pub fn sample(&self) -> Option<BatterySample> {
        let base = self.candidates.iter().find(|p| p.is_dir())?;
        let sample = read_supply(base);
        if sample.is_none() {
            debug!("battery at {} present but unreadable", base.display());
        }
        sample
    }
}

impl Default for BatteryReader {
    fn default() -> Self {
        Self::new()
    }
}

fn read_supply(base: &Path) -> Option<BatterySample> {
    let status = fs::read_to_string(base.join("status")).ok()?;

    let percentage = match (
        fs::read_to_string(base.join("charge_now")),
        fs::read_to_string(base.join("charge_full")),
    ) {
        (Ok(now), Ok(full)) => charge_percentage(&now, &full),
        _ => fs::read_to_string(base.join("capacity"))
            .ok()
            .and_then(|raw| parse_capacity(&raw)),
    }?;

    Some(BatterySample {
        percentage,
        status: status.trim().to_string(),
    })
}

/// Percentage from raw charge_now/charge_full file contents.
fn charge_percentage(now: &str, full: &str) -> Option<f32> {
    let now: f32 = now.trim().parse().ok()?;
    let full: f32 = full.trim().parse().ok()?;
    if full <= 0.0 {
        return None;
    }
    Some((now / full * 100.0).clamp(0.0, 100.0))
}

fn parse_capacity(raw: &str) -> Option<f32> {
    let capacity: f32 = raw.trim().parse().ok()?;
    Some(capacity.clamp(0.0, 100.0))
}

/// Label text for a sample's percentage.
pub fn percentage_text(sample: &BatterySample) -> String {
    format!("{:.0}%", sample.percentage)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn percentage_from_charge_files() {
        assert_eq!(charge_percentage("2500000\n", "5000000\n"), Some(50.0));
        assert_eq!(charge_percentage("6000000", "5000000"), Some(100.0));
        assert_eq!(charge_percentage("0", "0"), None);
        assert_eq!(charge_percentage("garbage", "5000000"), None);
    }

    #[test]
    fn capacity_fallback_is_clamped() {
        assert_eq!(parse_capacity(" 87 \n"), Some(87.0));
        assert_eq!(parse_capacity("150"), Some(100.0));
        assert_eq!(parse_capacity("n/a"), None);
    }

    #[test]
    fn absent_battery_yields_none() {
        let reader =
            BatteryReader::with_candidates(vec![PathBuf::from("/nonexistent/power_supply/BAT9")]);
        assert_eq!(reader.sample(), None);
    }

    #[test]
    fn percentage_label_is_rounded() {
        let sample = BatterySample {
            percentage: 66.6,
            status: "Discharging".to_string(),
        };
        assert_eq!(percentage_text(&sample), "67%");
    }
}
