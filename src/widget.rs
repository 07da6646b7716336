// =============================================================================
// duskgreet — Widgets
//
// A deliberately small widget set: labels, a masked password entry and a
// grid container with span-aware attachment. Widgets are plain data; natural
// sizing and placement are pure functions over an injected measurement
// callback, so the layout logic is testable without fonts or windows.
// =============================================================================

use crate::config::TextAlign;
use crate::layout::Rect;

/// Mask glyph used when the configuration does not override it.
pub const DEFAULT_MASK_CHAR: char = '\u{2022}';

/// Inner padding of the password entry, each side, in pixels.
pub const ENTRY_PADDING: u32 = 6;

/// Which theme fonts/colors a label is drawn with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LabelClass {
    /// Regular text in the credential window.
    Body,
    /// The user@hostname / clock row.
    SysInfo,
    /// The authentication feedback line.
    Error,
}

#[derive(Debug, Clone)]
pub struct Label {
    pub text: String,
    /// 0.0 = left, 0.5 = center, 1.0 = right within the allocated cell.
    pub xalign: f32,
    /// Whether this label's column soaks up extra horizontal space.
    pub hexpand: bool,
    pub visible: bool,
    pub class: LabelClass,
}

impl Label {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            xalign: 0.0,
            hexpand: false,
            visible: true,
            class: LabelClass::Body,
        }
    }

    pub fn xalign(mut self, xalign: f32) -> Self {
        self.xalign = xalign;
        self
    }

    pub fn hexpand(mut self) -> Self {
        self.hexpand = true;
        self
    }

    pub fn hidden(mut self) -> Self {
        self.visible = false;
        self
    }

    pub fn class(mut self, class: LabelClass) -> Self {
        self.class = class;
        self
    }
}

/// Masked single-line secret entry.
#[derive(Debug)]
pub struct PasswordEntry {
    secret: String,
    pub mask_char: char,
    pub alignment: TextAlign,
    /// Display width in characters; the entry never grows with its content.
    pub width_chars: u32,
}

impl PasswordEntry {
    pub fn new(mask_char: Option<char>, alignment: TextAlign, width_chars: u32) -> Self {
        Self {
            secret: String::new(),
            mask_char: mask_char.unwrap_or(DEFAULT_MASK_CHAR),
            alignment,
            width_chars,
        }
    }

    pub fn push_char(&mut self, c: char) {
        self.secret.push(c);
    }

    pub fn backspace(&mut self) {
        self.secret.pop();
    }

    pub fn clear(&mut self) {
        self.secret.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.secret.is_empty()
    }

    /// Hand the secret to the authentication collaborator, leaving the
    /// entry empty.
    pub fn take_secret(&mut self) -> String {
        std::mem::take(&mut self.secret)
    }

    /// What the renderer paints: one mask glyph per entered character.
    pub fn masked_text(&self) -> String {
        self.mask_char.to_string().repeat(self.secret.chars().count())
    }
}

/// A grid child. Nested grids serve as sub-rows (system info, battery).
#[derive(Debug)]
pub enum Child {
    Label(Label),
    Entry(PasswordEntry),
    Grid(Grid),
}

impl Child {
    fn hexpand(&self) -> bool {
        match self {
            Child::Label(label) => label.hexpand,
            Child::Entry(_) => false,
            Child::Grid(grid) => grid.cells.iter().any(|c| c.child.hexpand()),
        }
    }
}

/// Handle to an attached cell, stable for the grid's lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CellId(usize);

/// Side used by [`Grid::attach_next_to`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Left,
    Bottom,
}

#[derive(Debug)]
pub struct Cell {
    pub child: Child,
    pub col: i32,
    pub row: i32,
    pub width: i32,
    pub height: i32,
}

#[derive(Debug)]
pub struct Grid {
    cells: Vec<Cell>,
    pub col_spacing: u32,
    pub row_spacing: u32,
}

impl Grid {
    pub fn new(col_spacing: u32, row_spacing: u32) -> Self {
        Self {
            cells: Vec::new(),
            col_spacing,
            row_spacing,
        }
    }

    pub fn attach(&mut self, child: Child, col: i32, row: i32, width: i32, height: i32) -> CellId {
        self.cells.push(Cell {
            child,
            col,
            row,
            width: width.max(1),
            height: height.max(1),
        });
        CellId(self.cells.len() - 1)
    }

    /// Attach relative to an existing cell, mirroring the sibling's
    /// placement on the given side.
    pub fn attach_next_to(
        &mut self,
        child: Child,
        sibling: CellId,
        side: Side,
        width: i32,
        height: i32,
    ) -> CellId {
        let anchor = &self.cells[sibling.0];
        let (col, row) = match side {
            Side::Left => (anchor.col - width.max(1), anchor.row),
            Side::Bottom => (anchor.col, anchor.row + anchor.height),
        };
        self.attach(child, col, row, width, height)
    }

    pub fn cell(&self, id: CellId) -> &Cell {
        &self.cells[id.0]
    }

    pub fn child(&self, id: CellId) -> &Child {
        &self.cells[id.0].child
    }

    pub fn child_mut(&mut self, id: CellId) -> &mut Child {
        &mut self.cells[id.0].child
    }
}

/// Measurement callback: natural (width, height) of a child.
pub type Measure<'a> = dyn FnMut(&Child) -> (u32, u32) + 'a;

/// A cell's resolved screen rectangle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlacedCell {
    pub id: CellId,
    pub rect: Rect,
}

struct AxisSizes {
    col_w: Vec<u32>,
    row_h: Vec<u32>,
    min_col: i32,
    min_row: i32,
}

/// Per-axis natural sizes. Single-span cells set the baseline; spanning
/// cells grow their last column/row when the span comes up short.
fn axis_sizes(grid: &Grid, measure: &mut Measure) -> AxisSizes {
    let min_col = grid.cells.iter().map(|c| c.col).min().unwrap_or(0);
    let min_row = grid.cells.iter().map(|c| c.row).min().unwrap_or(0);
    let n_cols = grid
        .cells
        .iter()
        .map(|c| c.col + c.width - min_col)
        .max()
        .unwrap_or(0) as usize;
    let n_rows = grid
        .cells
        .iter()
        .map(|c| c.row + c.height - min_row)
        .max()
        .unwrap_or(0) as usize;

    let mut col_w = vec![0u32; n_cols];
    let mut row_h = vec![0u32; n_rows];
    let sizes: Vec<(u32, u32)> = grid.cells.iter().map(|c| measure(&c.child)).collect();

    for (cell, &(w, h)) in grid.cells.iter().zip(&sizes) {
        let col = (cell.col - min_col) as usize;
        let row = (cell.row - min_row) as usize;
        if cell.width == 1 {
            col_w[col] = col_w[col].max(w);
        }
        if cell.height == 1 {
            row_h[row] = row_h[row].max(h);
        }
    }
    for (cell, &(w, h)) in grid.cells.iter().zip(&sizes) {
        let col = (cell.col - min_col) as usize;
        let row = (cell.row - min_row) as usize;
        if cell.width > 1 {
            let span: u32 = col_w[col..col + cell.width as usize].iter().sum::<u32>()
                + grid.col_spacing * (cell.width as u32 - 1);
            if w > span {
                col_w[col + cell.width as usize - 1] += w - span;
            }
        }
        if cell.height > 1 {
            let span: u32 = row_h[row..row + cell.height as usize].iter().sum::<u32>()
                + grid.row_spacing * (cell.height as u32 - 1);
            if h > span {
                row_h[row + cell.height as usize - 1] += h - span;
            }
        }
    }

    AxisSizes {
        col_w,
        row_h,
        min_col,
        min_row,
    }
}

fn axis_total(sizes: &[u32], spacing: u32) -> u32 {
    let sum: u32 = sizes.iter().sum();
    sum + spacing * sizes.len().saturating_sub(1) as u32
}

/// Natural size of the whole grid.
pub fn grid_natural_size(grid: &Grid, measure: &mut Measure) -> (u32, u32) {
    let axes = axis_sizes(grid, measure);
    (
        axis_total(&axes.col_w, grid.col_spacing),
        axis_total(&axes.row_h, grid.row_spacing),
    )
}

/// Place every cell within `bounds`. Extra width goes to columns holding an
/// expanding child; with none, the block is centered horizontally. Rows
/// never expand, so the block is always centered vertically.
pub fn place_grid(grid: &Grid, bounds: Rect, measure: &mut Measure) -> Vec<PlacedCell> {
    let mut axes = axis_sizes(grid, measure);
    let natural_w = axis_total(&axes.col_w, grid.col_spacing);
    let natural_h = axis_total(&axes.row_h, grid.row_spacing);

    let mut x_off = 0u32;
    let extra_w = bounds.width.saturating_sub(natural_w);
    if extra_w > 0 {
        let expanding: Vec<usize> = grid
            .cells
            .iter()
            .filter(|c| c.width == 1 && c.child.hexpand())
            .map(|c| (c.col - axes.min_col) as usize)
            .collect();
        if expanding.is_empty() {
            x_off = extra_w / 2;
        } else {
            let share = extra_w / expanding.len() as u32;
            for &col in &expanding {
                axes.col_w[col] += share;
            }
        }
    }
    let y_off = bounds.height.saturating_sub(natural_h) / 2;

    let mut col_x = Vec::with_capacity(axes.col_w.len());
    let mut acc = bounds.x + x_off as i32;
    for &w in &axes.col_w {
        col_x.push(acc);
        acc += (w + grid.col_spacing) as i32;
    }
    let mut row_y = Vec::with_capacity(axes.row_h.len());
    let mut acc = bounds.y + y_off as i32;
    for &h in &axes.row_h {
        row_y.push(acc);
        acc += (h + grid.row_spacing) as i32;
    }

    grid.cells
        .iter()
        .enumerate()
        .map(|(idx, cell)| {
            let col = (cell.col - axes.min_col) as usize;
            let row = (cell.row - axes.min_row) as usize;
            let width = axis_total(&axes.col_w[col..col + cell.width as usize], grid.col_spacing);
            let height = axis_total(&axes.row_h[row..row + cell.height as usize], grid.row_spacing);
            PlacedCell {
                id: CellId(idx),
                rect: Rect::new(col_x[col], row_y[row], width, height),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    // Fixed-size stub measurer: labels 50x10, entries 100x20, grids recurse.
    fn stub(child: &Child) -> (u32, u32) {
        match child {
            Child::Label(_) => (50, 10),
            Child::Entry(_) => (100, 20),
            Child::Grid(grid) => grid_natural_size(grid, &mut stub),
        }
    }

    #[test]
    fn attach_next_to_left_lands_one_column_over() {
        let mut grid = Grid::new(5, 5);
        let entry = grid.attach(
            Child::Entry(PasswordEntry::new(None, TextAlign::Left, 10)),
            1,
            0,
            1,
            1,
        );
        let label = grid.attach_next_to(Child::Label(Label::new("Password:")), entry, Side::Left, 1, 1);
        assert_eq!(grid.cell(label).col, 0);
        assert_eq!(grid.cell(label).row, 0);
    }

    #[test]
    fn attach_next_to_bottom_spans_requested_width() {
        let mut grid = Grid::new(5, 5);
        let label = grid.attach(Child::Label(Label::new("Password:")), 0, 0, 1, 1);
        let feedback = grid.attach_next_to(Child::Label(Label::new("")), label, Side::Bottom, 2, 1);
        let cell = grid.cell(feedback);
        assert_eq!((cell.col, cell.row, cell.width), (0, 1, 2));
    }

    #[test]
    fn natural_size_sums_columns_and_spacing() {
        let mut grid = Grid::new(5, 5);
        grid.attach(Child::Label(Label::new("a")), 0, 0, 1, 1);
        grid.attach(
            Child::Entry(PasswordEntry::new(None, TextAlign::Left, 10)),
            1,
            0,
            1,
            1,
        );
        // 50 + 5 + 100 wide, one 20-high row.
        assert_eq!(grid_natural_size(&grid, &mut stub), (155, 20));
    }

    #[test]
    fn spanning_cell_grows_its_last_column() {
        let mut grid = Grid::new(5, 5);
        grid.attach(Child::Label(Label::new("a")), 0, 1, 1, 1);
        grid.attach(Child::Label(Label::new("b")), 1, 1, 1, 1);
        // A 200-wide entry spanning both 50-wide columns forces the second
        // column to 200 - 50 - 5 = 145.
        grid.attach(
            Child::Entry(PasswordEntry::new(None, TextAlign::Left, 10)),
            0,
            0,
            2,
            1,
        );
        let mut wide = |child: &Child| match child {
            Child::Entry(_) => (200, 20),
            other => stub(other),
        };
        assert_eq!(grid_natural_size(&grid, &mut wide), (200, 35));
    }

    #[test]
    fn extra_width_goes_to_expanding_column() {
        let mut grid = Grid::new(0, 0);
        grid.attach(Child::Label(Label::new("left")), 0, 0, 1, 1);
        grid.attach(Child::Label(Label::new("right").xalign(1.0).hexpand()), 1, 0, 1, 1);
        let placed = place_grid(&grid, Rect::new(0, 0, 300, 10), &mut stub);
        // Expanding column soaks up 300 - 100 = 200 extra.
        assert_eq!(placed[0].rect, Rect::new(0, 0, 50, 10));
        assert_eq!(placed[1].rect, Rect::new(50, 0, 250, 10));
    }

    #[test]
    fn block_centers_without_expanding_children() {
        let mut grid = Grid::new(0, 0);
        grid.attach(Child::Label(Label::new("only")), 0, 0, 1, 1);
        let placed = place_grid(&grid, Rect::new(0, 0, 150, 50), &mut stub);
        assert_eq!(placed[0].rect, Rect::new(50, 20, 50, 10));
    }

    #[test]
    fn negative_columns_from_left_attachment_are_normalized() {
        let mut grid = Grid::new(5, 5);
        let entry = grid.attach(
            Child::Entry(PasswordEntry::new(None, TextAlign::Left, 10)),
            0,
            0,
            1,
            1,
        );
        grid.attach_next_to(Child::Label(Label::new("Password:")), entry, Side::Left, 1, 1);
        let placed = place_grid(&grid, Rect::new(0, 0, 155, 20), &mut stub);
        // Label column comes first even though its index is -1.
        assert_eq!(placed[1].rect.x, 0);
        assert_eq!(placed[0].rect.x, 55);
    }

    #[test]
    fn masked_text_covers_multibyte_secrets() {
        let mut entry = PasswordEntry::new(Some('*'), TextAlign::Left, 10);
        entry.push_char('p');
        entry.push_char('ä');
        entry.push_char('s');
        assert_eq!(entry.masked_text(), "***");
        entry.backspace();
        assert_eq!(entry.masked_text(), "**");
        assert_eq!(entry.take_secret(), "pä");
        assert!(entry.is_empty());
    }
}
