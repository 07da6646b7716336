// =============================================================================
// duskgreet — Panel Composition
//
// Builds the credential window's widget tree and the battery panel's labels.
// Composition order matters: the sys-info row decides the entry's row, the
// password label decides where (and how wide) the feedback label attaches.
// This layer is pure structure; windows and painting live elsewhere.
// =============================================================================

use crate::config::{Config, MAIN_WINDOW_POSITION};
use crate::widget::{CellId, Child, Grid, Label, LabelClass, PasswordEntry, Side};

use tracing::warn;

/// Column/row spacing of the credential grid and sub-rows.
const GRID_SPACING: u32 = 5;

/// Cell handles into a nested sys-info row.
struct InfoCells {
    container: CellId,
    time: CellId,
}

/// Cell handles into a nested battery row.
pub struct BatteryCells {
    container: CellId,
    status: CellId,
    percentage: CellId,
}

/// The credential window's widget tree and the handles the orchestrator
/// needs to update leaf text.
pub struct CredentialUi {
    pub grid: Grid,
    entry: CellId,
    password_label: Option<CellId>,
    feedback: CellId,
    info: Option<InfoCells>,
    /// Present only in "main-window" battery mode.
    battery: Option<BatteryCells>,
}

/// A dedicated battery window's widget tree.
pub struct BatteryUi {
    pub grid: Grid,
    status: CellId,
    percentage: CellId,
}

/// Build the credential panel from configuration.
pub fn compose_credential_ui(config: &Config) -> CredentialUi {
    let mut grid = Grid::new(GRID_SPACING, GRID_SPACING);

    // System info & clock row, spanning both columns above the entry.
    let info = config.show_sys_info.then(|| {
        let mut row = Grid::new(0, GRID_SPACING);
        row.attach(
            Child::Label(Label::new(sys_info_text(&config.login_user)).class(LabelClass::SysInfo)),
            0,
            0,
            1,
            1,
        );
        // The clock starts blank; the timer owns its text.
        let time = row.attach(
            Child::Label(Label::new("").xalign(1.0).hexpand().class(LabelClass::SysInfo)),
            1,
            0,
            1,
            1,
        );
        let container = grid.attach(Child::Grid(row), 0, 0, 2, 1);
        InfoCells { container, time }
    });

    // Password entry, with its optional label immediately to the left.
    let top = if config.show_sys_info { 1 } else { 0 };
    let entry = grid.attach(
        Child::Entry(PasswordEntry::new(
            config.password_char,
            config.password_alignment,
            config.password_input_width,
        )),
        1,
        top,
        1,
        1,
    );
    let password_label = config.show_password_label.then(|| {
        grid.attach_next_to(
            Child::Label(Label::new(config.password_label_text.clone()).xalign(1.0)),
            entry,
            Side::Left,
            1,
            1,
        )
    });

    // Feedback sits directly beneath the password label when there is one
    // (spanning both columns), else beneath the entry alone.
    let (anchor, span) = match password_label {
        Some(label) => (label, 2),
        None => (entry, 1),
    };
    let feedback = grid.attach_next_to(
        Child::Label(Label::new("").xalign(0.5).hidden().class(LabelClass::Error)),
        anchor,
        Side::Bottom,
        span,
        1,
    );

    // Battery labels inside the credential window instead of a dedicated
    // window, as the bottom row.
    let battery = (config.show_battery_info
        && config.battery_info_position == MAIN_WINDOW_POSITION)
        .then(|| {
            let (row, status, percentage) = compose_battery_row();
            let container = grid.attach(Child::Grid(row), 0, top + 2, 2, 1);
            BatteryCells {
                container,
                status,
                percentage,
            }
        });

    CredentialUi {
        grid,
        entry,
        password_label,
        feedback,
        info,
        battery,
    }
}

/// Build the contents of a dedicated battery window.
pub fn compose_battery_ui() -> BatteryUi {
    let (grid, status, percentage) = compose_battery_row();
    BatteryUi {
        grid,
        status,
        percentage,
    }
}

/// Two-column battery row: status right-aligned, percentage left-aligned,
/// both expanding.
fn compose_battery_row() -> (Grid, CellId, CellId) {
    let mut row = Grid::new(0, GRID_SPACING);
    let status = row.attach(
        Child::Label(Label::new("").xalign(1.0).hexpand().class(LabelClass::SysInfo)),
        0,
        0,
        1,
        1,
    );
    let percentage = row.attach(
        Child::Label(Label::new("").xalign(0.0).hexpand().class(LabelClass::SysInfo)),
        1,
        0,
        1,
        1,
    );
    (row, status, percentage)
}

/// `user@hostname` for the sys-info label. A hostname lookup failure
/// degrades to an empty label rather than aborting.
pub fn sys_info_text(login_user: &str) -> String {
    match nix::unistd::gethostname() {
        Ok(hostname) => format!("{login_user}@{}", hostname.to_string_lossy()),
        Err(e) => {
            warn!("Could not read hostname for the sys-info label: {e}");
            String::new()
        }
    }
}

fn label_mut(grid: &mut Grid, id: CellId) -> &mut Label {
    match grid.child_mut(id) {
        Child::Label(label) => label,
        _ => unreachable!("cell attached as a label"),
    }
}

fn nested_mut(grid: &mut Grid, container: CellId) -> &mut Grid {
    match grid.child_mut(container) {
        Child::Grid(inner) => inner,
        _ => unreachable!("cell attached as a container"),
    }
}

impl CredentialUi {
    pub fn entry(&self) -> &PasswordEntry {
        match self.grid.child(self.entry) {
            Child::Entry(entry) => entry,
            _ => unreachable!("cell attached as the entry"),
        }
    }

    pub fn entry_mut(&mut self) -> &mut PasswordEntry {
        match self.grid.child_mut(self.entry) {
            Child::Entry(entry) => entry,
            _ => unreachable!("cell attached as the entry"),
        }
    }

    /// Show feedback text (authentication errors and the like).
    pub fn set_feedback(&mut self, text: &str) {
        let label = label_mut(&mut self.grid, self.feedback);
        label.text = text.to_string();
        label.visible = !text.is_empty();
    }

    /// Refresh the clock; a no-op without the sys-info row.
    pub fn set_time_text(&mut self, text: &str) {
        if let Some(info) = &self.info {
            let (container, time) = (info.container, info.time);
            label_mut(nested_mut(&mut self.grid, container), time).text = text.to_string();
        }
    }

    /// Battery setters for "main-window" mode; no-ops otherwise.
    pub fn set_battery_status(&mut self, text: &str) {
        if let Some(battery) = &self.battery {
            let (container, status) = (battery.container, battery.status);
            label_mut(nested_mut(&mut self.grid, container), status).text = text.to_string();
        }
    }

    pub fn set_battery_percentage(&mut self, text: &str) {
        if let Some(battery) = &self.battery {
            let (container, percentage) = (battery.container, battery.percentage);
            label_mut(nested_mut(&mut self.grid, container), percentage).text = text.to_string();
        }
    }

    pub fn has_battery_row(&self) -> bool {
        self.battery.is_some()
    }
}

impl BatteryUi {
    pub fn set_status(&mut self, text: &str) {
        label_mut(&mut self.grid, self.status).text = text.to_string();
    }

    pub fn set_percentage(&mut self, text: &str) {
        label_mut(&mut self.grid, self.percentage).text = text.to_string();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn feedback_spans_two_columns_beneath_the_password_label() {
        let config = Config {
            show_password_label: true,
            show_sys_info: false,
            ..Config::default()
        };
        let ui = compose_credential_ui(&config);

        let label = ui.grid.cell(ui.password_label.unwrap());
        let feedback = ui.grid.cell(ui.feedback);
        assert_eq!((label.col, label.row), (0, 0));
        assert_eq!(feedback.width, 2);
        assert_eq!(feedback.col, label.col);
        assert_eq!(feedback.row, label.row + 1);
    }

    #[test]
    fn feedback_spans_one_column_beneath_the_entry_alone() {
        let config = Config {
            show_password_label: false,
            show_sys_info: false,
            ..Config::default()
        };
        let ui = compose_credential_ui(&config);
        assert!(ui.password_label.is_none());

        let entry = ui.grid.cell(ui.entry);
        let feedback = ui.grid.cell(ui.feedback);
        assert_eq!(feedback.width, 1);
        assert_eq!(feedback.col, entry.col);
        assert_eq!(feedback.row, entry.row + 1);
    }

    #[test]
    fn sys_info_row_pushes_the_entry_down() {
        let without = compose_credential_ui(&Config {
            show_sys_info: false,
            ..Config::default()
        });
        assert_eq!(without.grid.cell(without.entry).row, 0);

        let with = compose_credential_ui(&Config {
            show_sys_info: true,
            ..Config::default()
        });
        assert_eq!(with.grid.cell(with.entry).row, 1);
        let info = with.info.as_ref().unwrap();
        let container = with.grid.cell(info.container);
        assert_eq!((container.col, container.row, container.width), (0, 0, 2));
    }

    #[test]
    fn main_window_battery_row_attaches_at_the_bottom() {
        let config = Config {
            show_battery_info: true,
            battery_info_position: MAIN_WINDOW_POSITION.to_string(),
            show_sys_info: true,
            ..Config::default()
        };
        let ui = compose_credential_ui(&config);
        assert!(ui.has_battery_row());

        let battery = ui.battery.as_ref().unwrap();
        let cell = ui.grid.cell(battery.container);
        assert_eq!((cell.col, cell.width), (0, 2));
        assert_eq!(cell.row, 3, "below info, entry and feedback rows");
    }

    #[test]
    fn anchored_battery_mode_leaves_the_credential_grid_alone() {
        let config = Config {
            show_battery_info: true,
            battery_info_position: "bottomleft".to_string(),
            ..Config::default()
        };
        let ui = compose_credential_ui(&config);
        assert!(!ui.has_battery_row());
    }

    #[test]
    fn battery_row_alignment_matches_its_contract() {
        let ui = compose_battery_ui();
        let status = ui.grid.cell(ui.status);
        let percentage = ui.grid.cell(ui.percentage);
        match (&status.child, &percentage.child) {
            (Child::Label(status), Child::Label(percentage)) => {
                assert_eq!(status.xalign, 1.0);
                assert!(status.hexpand);
                assert_eq!(percentage.xalign, 0.0);
                assert!(percentage.hexpand);
            }
            _ => panic!("battery row holds two labels"),
        }
    }

    #[test]
    fn feedback_starts_hidden_and_shows_on_text() {
        let mut ui = compose_credential_ui(&Config::default());
        match ui.grid.child(ui.feedback) {
            Child::Label(label) => assert!(!label.visible),
            _ => panic!("feedback is a label"),
        }
        ui.set_feedback("Invalid password");
        match ui.grid.child(ui.feedback) {
            Child::Label(label) => {
                assert!(label.visible);
                assert_eq!(label.text, "Invalid password");
            }
            _ => panic!("feedback is a label"),
        }
    }

    #[test]
    fn typed_characters_round_trip_through_the_entry() {
        let mut ui = compose_credential_ui(&Config::default());
        ui.entry_mut().push_char('h');
        ui.entry_mut().push_char('i');
        assert_eq!(ui.entry().masked_text().chars().count(), 2);
        assert_eq!(ui.entry_mut().take_secret(), "hi");
    }
}
