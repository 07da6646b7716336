// =============================================================================
// duskgreet — Software Renderer
//
// Paints whole frames into per-window pixmaps: background fills and the
// optional wallpaper, the credential panel chrome, and the widget tree.
// Everything is CPU-side tiny-skia; the windowing layer presents the pixels.
// =============================================================================

use std::path::Path;

use tiny_skia::{
    FillRule, FilterQuality, IntSize, Paint, Path as SkiaPath, PathBuilder, Pixmap, PixmapPaint,
    Stroke, Transform,
};

use crate::config::{ImageSizing, Rgba};
use crate::layout::Rect;
use crate::style::Theme;
use crate::text::{FontDesc, TextRenderer};
use crate::widget::{place_grid, Child, Grid, LabelClass, ENTRY_PADDING};

use tracing::warn;

// -----------------------------------------------------------------------------
// Primitives
// -----------------------------------------------------------------------------

pub fn fill(pixmap: &mut Pixmap, color: Rgba) {
    pixmap.fill(color.to_color());
}

pub fn fill_rect(pixmap: &mut Pixmap, x: f32, y: f32, w: f32, h: f32, color: Rgba) {
    let Some(rect) = tiny_skia::Rect::from_xywh(x, y, w, h) else {
        return;
    };
    let mut paint = Paint::default();
    paint.set_color(color.to_color());
    paint.anti_alias = false;
    pixmap.fill_rect(rect, &paint, Transform::identity(), None);
}

/// Border drawn as four edge rectangles around the pixmap rim.
pub fn stroke_edges(pixmap: &mut Pixmap, width: u32, color: Rgba) {
    if width == 0 {
        return;
    }
    let (w, h) = (pixmap.width() as f32, pixmap.height() as f32);
    let bw = width as f32;
    fill_rect(pixmap, 0.0, 0.0, w, bw, color);
    fill_rect(pixmap, 0.0, h - bw, w, bw, color);
    fill_rect(pixmap, 0.0, 0.0, bw, h, color);
    fill_rect(pixmap, w - bw, 0.0, bw, h, color);
}

fn rounded_rect_path(x: f32, y: f32, w: f32, h: f32, radius: f32) -> Option<SkiaPath> {
    let r = radius.min(w / 2.0).min(h / 2.0);
    if r <= 0.0 {
        return Some(PathBuilder::from_rect(tiny_skia::Rect::from_xywh(x, y, w, h)?));
    }

    // Circular corners approximated with cubics.
    let k = 0.552_285 * r;
    let mut pb = PathBuilder::new();
    pb.move_to(x + r, y);
    pb.line_to(x + w - r, y);
    pb.cubic_to(x + w - r + k, y, x + w, y + r - k, x + w, y + r);
    pb.line_to(x + w, y + h - r);
    pb.cubic_to(x + w, y + h - r + k, x + w - r + k, y + h, x + w - r, y + h);
    pb.line_to(x + r, y + h);
    pb.cubic_to(x + r - k, y + h, x, y + h - r + k, x, y + h - r);
    pb.line_to(x, y + r);
    pb.cubic_to(x, y + r - k, x + r - k, y, x + r, y);
    pb.close();
    pb.finish()
}

fn fill_rounded_rect(pixmap: &mut Pixmap, rect: Rect, radius: f32, color: Rgba) {
    let Some(path) = rounded_rect_path(
        rect.x as f32,
        rect.y as f32,
        rect.width as f32,
        rect.height as f32,
        radius,
    ) else {
        return;
    };
    let mut paint = Paint::default();
    paint.set_color(color.to_color());
    pixmap.fill_path(&path, &paint, FillRule::Winding, Transform::identity(), None);
}

fn stroke_rounded_rect(pixmap: &mut Pixmap, rect: Rect, radius: f32, width: u32, color: Rgba) {
    if width == 0 {
        return;
    }
    let inset = width as f32 / 2.0;
    let Some(path) = rounded_rect_path(
        rect.x as f32 + inset,
        rect.y as f32 + inset,
        rect.width as f32 - width as f32,
        rect.height as f32 - width as f32,
        radius,
    ) else {
        return;
    };
    let mut paint = Paint::default();
    paint.set_color(color.to_color());
    let stroke = Stroke {
        width: width as f32,
        ..Stroke::default()
    };
    pixmap.stroke_path(&path, &paint, &stroke, Transform::identity(), None);
}

// -----------------------------------------------------------------------------
// Background image
// -----------------------------------------------------------------------------

/// The wallpaper, decoded once and drawn onto every tagged surface.
pub struct BackgroundArt {
    pixmap: Pixmap,
}

impl BackgroundArt {
    pub fn load(path: &Path) -> Result<Self, Box<dyn std::error::Error>> {
        let decoded = image::open(path)?.to_rgba8();
        let (width, height) = decoded.dimensions();
        let size =
            IntSize::from_wh(width, height).ok_or_else(|| format!("empty image {path:?}"))?;

        // tiny-skia wants premultiplied RGBA.
        let mut data = decoded.into_raw();
        for px in data.chunks_exact_mut(4) {
            let a = px[3] as u16;
            px[0] = (px[0] as u16 * a / 255) as u8;
            px[1] = (px[1] as u16 * a / 255) as u8;
            px[2] = (px[2] as u16 * a / 255) as u8;
        }
        let pixmap = Pixmap::from_vec(data, size)
            .ok_or_else(|| format!("image buffer mismatch for {path:?}"))?;
        Ok(Self { pixmap })
    }

    /// Draw centered on the target, scaled per the configured sizing mode.
    pub fn draw(&self, target: &mut Pixmap, mode: ImageSizing) {
        let (tw, th) = (target.width() as f32, target.height() as f32);
        let (iw, ih) = (self.pixmap.width() as f32, self.pixmap.height() as f32);
        let scale = match mode {
            ImageSizing::Auto => 1.0,
            ImageSizing::Contain => (tw / iw).min(th / ih),
            ImageSizing::Cover => (tw / iw).max(th / ih),
        };
        let tx = (tw - iw * scale) / 2.0;
        let ty = (th - ih * scale) / 2.0;

        let paint = PixmapPaint {
            quality: FilterQuality::Bilinear,
            ..PixmapPaint::default()
        };
        target.draw_pixmap(
            0,
            0,
            self.pixmap.as_ref(),
            &paint,
            Transform::from_row(scale, 0.0, 0.0, scale, tx, ty),
            None,
        );
    }
}

/// Paint one background surface: base color, plus the wallpaper when the
/// surface is tagged for it.
pub fn paint_background(
    pixmap: &mut Pixmap,
    theme: &Theme,
    with_image: bool,
    art: Option<&BackgroundArt>,
) {
    fill(pixmap, theme.background_color);
    if with_image {
        match art {
            Some(art) => art.draw(pixmap, theme.background_image_size),
            None => warn!("surface tagged for an image but none is loaded"),
        }
    }
}

/// Credential window chrome: fill plus edge border.
pub fn paint_main_chrome(pixmap: &mut Pixmap, theme: &Theme) {
    fill(pixmap, theme.window_color);
    stroke_edges(pixmap, theme.border_width, theme.border_color);
}

/// Battery window chrome: fill only.
pub fn paint_battery_chrome(pixmap: &mut Pixmap, theme: &Theme) {
    fill(pixmap, theme.window_color);
}

// -----------------------------------------------------------------------------
// Widgets
// -----------------------------------------------------------------------------

pub fn label_font(theme: &Theme, class: LabelClass) -> FontDesc {
    match class {
        LabelClass::SysInfo => FontDesc {
            family: theme.sys_info_font.clone(),
            size: theme.sys_info_font_size,
            weight: theme.font_weight,
            style: theme.font_style,
        },
        LabelClass::Body | LabelClass::Error => FontDesc {
            family: theme.font_family.clone(),
            size: theme.font_size,
            weight: theme.font_weight,
            style: theme.font_style,
        },
    }
}

fn label_color(theme: &Theme, class: LabelClass) -> Rgba {
    match class {
        LabelClass::Body => theme.text_color,
        LabelClass::SysInfo => theme.sys_info_color,
        LabelClass::Error => theme.error_color,
    }
}

/// Natural size of any widget. Hidden labels keep their slot so late
/// feedback does not reflow the window.
pub fn measure_child(child: &Child, text: &mut TextRenderer, theme: &Theme) -> (u32, u32) {
    match child {
        Child::Label(label) => {
            let font = label_font(theme, label.class);
            let (w, h) = text.measure(&label.text, &font);
            (w.ceil() as u32, h.ceil() as u32)
        }
        Child::Entry(entry) => {
            let font = label_font(theme, LabelClass::Body);
            let (digit_w, line_h) = text.measure("0", &font);
            let pad = 2 * (theme.password_border_width + ENTRY_PADDING);
            (
                (digit_w.ceil() as u32) * entry.width_chars + pad,
                line_h.ceil() as u32 + pad,
            )
        }
        Child::Grid(grid) => {
            crate::widget::grid_natural_size(grid, &mut |c| measure_child(c, text, theme))
        }
    }
}

/// Natural size of a whole widget tree.
pub fn natural_size(grid: &Grid, text: &mut TextRenderer, theme: &Theme) -> (u32, u32) {
    crate::widget::grid_natural_size(grid, &mut |c| measure_child(c, text, theme))
}

/// Render a widget tree into `bounds`.
pub fn render_grid(pixmap: &mut Pixmap, grid: &Grid, bounds: Rect, text: &mut TextRenderer, theme: &Theme) {
    let placed = place_grid(grid, bounds, &mut |c| measure_child(c, text, theme));
    for cell in placed {
        render_child(pixmap, grid.child(cell.id), cell.rect, text, theme);
    }
}

fn render_child(pixmap: &mut Pixmap, child: &Child, rect: Rect, text: &mut TextRenderer, theme: &Theme) {
    match child {
        Child::Label(label) => {
            if !label.visible || label.text.is_empty() {
                return;
            }
            let font = label_font(theme, label.class);
            let (tw, th) = text.measure(&label.text, &font);
            let x = rect.x + ((rect.width as f32 - tw) * label.xalign) as i32;
            let y = rect.y + ((rect.height as f32 - th) / 2.0) as i32;
            text.draw(pixmap, &label.text, x, y, &font, label_color(theme, label.class));
        }
        Child::Entry(entry) => {
            fill_rounded_rect(
                pixmap,
                rect,
                theme.password_border_radius,
                theme.password_background_color,
            );
            stroke_rounded_rect(
                pixmap,
                rect,
                theme.password_border_radius,
                theme.password_border_width,
                theme.password_border_color,
            );

            let font = label_font(theme, LabelClass::Body);
            let masked = entry.masked_text();
            let (tw, th) = text.measure(&masked, &font);
            let pad = (theme.password_border_width + ENTRY_PADDING) as i32;
            let inner_w = rect.width as i32 - 2 * pad;
            let tx = rect.x
                + pad
                + ((inner_w as f32 - tw).max(0.0) * entry.alignment.xalign()) as i32;
            let ty = rect.y + ((rect.height as f32 - th) / 2.0) as i32;
            if !masked.is_empty() {
                text.draw(pixmap, &masked, tx, ty, &font, theme.password_color);
            }

            // Caret after the masked text; the theme blends it away when the
            // input cursor is disabled.
            let caret_x = (tx + tw.ceil() as i32 + 1).min(rect.x + rect.width as i32 - pad);
            fill_rect(
                pixmap,
                caret_x as f32,
                (rect.y as f32 + rect.height as f32 / 2.0) - font.line_height() / 2.0,
                1.0,
                font.line_height(),
                theme.caret_color,
            );
        }
        Child::Grid(inner) => {
            render_grid(pixmap, inner, rect, text, theme);
        }
    }
}
