// =============================================================================
// duskgreet — Configuration
//
// A fully-typed configuration with a documented default for every field,
// loaded once at startup from a JSON file. All colors are parsed into
// resolved RGBA values at load time, so the style synthesizer and the
// renderer never see raw strings.
// =============================================================================

use std::fmt;
use std::path::Path;

use serde::de::{self, Deserializer};
use serde::Deserialize;
use tracing::{info, warn};

/// Sentinel accepted in `battery_info_position` to place the battery labels
/// inside the credential window instead of a dedicated window.
pub const MAIN_WINDOW_POSITION: &str = "main-window";

/// A resolved RGBA color.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Rgba {
    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    /// Parse `#rgb`, `#rrggbb` or `#rrggbbaa`.
    pub fn parse(s: &str) -> Result<Self, ColorParseError> {
        let hex = s
            .strip_prefix('#')
            .ok_or_else(|| ColorParseError(s.to_string()))?;
        let err = || ColorParseError(s.to_string());

        match hex.len() {
            3 => {
                let mut ch = [0u8; 3];
                for (i, c) in hex.chars().enumerate() {
                    let v = c.to_digit(16).ok_or_else(err)? as u8;
                    ch[i] = v << 4 | v;
                }
                Ok(Self::rgb(ch[0], ch[1], ch[2]))
            }
            6 | 8 => {
                let mut ch = [255u8; 4];
                for (i, pair) in hex.as_bytes().chunks(2).enumerate() {
                    let pair = std::str::from_utf8(pair).map_err(|_| err())?;
                    ch[i] = u8::from_str_radix(pair, 16).map_err(|_| err())?;
                }
                Ok(Self::new(ch[0], ch[1], ch[2], ch[3]))
            }
            _ => Err(err()),
        }
    }

    /// Canonical text form used by the stylesheet synthesizer:
    /// `rgb(r,g,b)` for opaque colors, `rgba(r,g,b,a)` otherwise.
    pub fn to_css(self) -> String {
        if self.a == 255 {
            format!("rgb({},{},{})", self.r, self.g, self.b)
        } else {
            // Alpha rendered with three decimals, trailing zeros trimmed.
            let alpha = (self.a as f64 / 255.0 * 1000.0).round() / 1000.0;
            format!("rgba({},{},{},{})", self.r, self.g, self.b, alpha)
        }
    }

    pub fn to_color(self) -> tiny_skia::Color {
        tiny_skia::Color::from_rgba8(self.r, self.g, self.b, self.a)
    }
}

impl<'de> Deserialize<'de> for Rgba {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Rgba::parse(&s).map_err(de::Error::custom)
    }
}

/// Error for a color string that is not `#rgb` / `#rrggbb` / `#rrggbbaa`.
#[derive(Debug)]
pub struct ColorParseError(String);

impl fmt::Display for ColorParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid color {:?} (expected #rgb, #rrggbb or #rrggbbaa)", self.0)
    }
}

impl std::error::Error for ColorParseError {}

/// Horizontal alignment of text within its allocated space.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TextAlign {
    #[default]
    Left,
    Center,
    Right,
}

impl TextAlign {
    /// Fractional alignment: 0.0 = left, 0.5 = center, 1.0 = right.
    pub fn xalign(self) -> f32 {
        match self {
            TextAlign::Left => 0.0,
            TextAlign::Center => 0.5,
            TextAlign::Right => 1.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FontStyle {
    #[default]
    Normal,
    Italic,
    Oblique,
}

impl FontStyle {
    pub fn as_css(self) -> &'static str {
        match self {
            FontStyle::Normal => "normal",
            FontStyle::Italic => "italic",
            FontStyle::Oblique => "oblique",
        }
    }
}

/// How the background image is fitted to a surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageSizing {
    /// Natural image size, centered.
    #[default]
    Auto,
    /// Scale to fit entirely within the surface.
    Contain,
    /// Scale to fill the surface, cropping overflow.
    Cover,
}

impl ImageSizing {
    pub fn as_css(self) -> &'static str {
        match self {
            ImageSizing::Auto => "auto",
            ImageSizing::Contain => "contain",
            ImageSizing::Cover => "cover",
        }
    }
}

/// Greeter configuration. Every field has a default; a missing config file
/// yields a fully usable dark theme.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Account whose password the greeter collects.
    pub login_user: String,
    /// Command handed to the session manager after authentication.
    pub session_command: String,

    // ---- Layout ----
    /// Outer border spacing of the credential window, in pixels.
    pub layout_spacing: u32,
    /// Fraction (0..=1) of the primary monitor's width the credential window
    /// should cover. Only ever grows the window beyond its natural size.
    pub screen_space_h: f32,
    /// Same as `screen_space_h`, vertically.
    pub screen_space_v: f32,

    // ---- Colors ----
    pub text_color: Rgba,
    pub error_color: Rgba,
    pub background_color: Rgba,
    pub window_color: Rgba,
    pub border_color: Rgba,
    pub password_color: Rgba,
    pub password_background_color: Rgba,
    pub password_border_color: Rgba,
    pub sys_info_color: Rgba,

    // ---- Fonts ----
    pub font: String,
    pub font_size: f32,
    /// CSS-style weight, 100..=900.
    pub font_weight: u16,
    pub font_style: FontStyle,
    pub sys_info_font: String,
    pub sys_info_font_size: f32,

    // ---- Borders ----
    pub border_width: u32,
    pub password_border_width: u32,
    pub password_border_radius: f32,

    // ---- Background image ----
    /// Path to the background image; empty string means "no image".
    pub background_image: String,
    pub background_image_size: ImageSizing,
    pub show_image_on_all_monitors: bool,

    // ---- Feature toggles ----
    pub show_sys_info: bool,
    pub show_battery_info: bool,
    pub show_password_label: bool,
    pub show_input_cursor: bool,

    /// One of `topleft`, `top`, `topright`, `bottomleft`, `bottom`,
    /// `bottomright`, or `main-window`. Unknown names fall back to
    /// `topright`.
    pub battery_info_position: String,

    // ---- Password field ----
    pub password_label_text: String,
    /// Mask character override; `None` uses the bullet glyph.
    pub password_char: Option<char>,
    /// Display width of the entry, in characters.
    pub password_input_width: u32,
    pub password_alignment: TextAlign,

    pub sys_info_margin: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            login_user: "greeter".to_string(),
            session_command: "sway".to_string(),

            layout_spacing: 15,
            screen_space_h: 0.0,
            screen_space_v: 0.0,

            text_color: Rgba::rgb(0xc8, 0xc8, 0xc8),
            error_color: Rgba::rgb(0xcc, 0x57, 0x5d),
            background_color: Rgba::rgb(0x1b, 0x1d, 0x1e),
            window_color: Rgba::rgb(0x2a, 0x2e, 0x32),
            border_color: Rgba::rgb(0x59, 0x63, 0x6b),
            password_color: Rgba::rgb(0xe8, 0xe8, 0xe8),
            password_background_color: Rgba::rgb(0x1b, 0x1d, 0x1e),
            password_border_color: Rgba::rgb(0x59, 0x63, 0x6b),
            sys_info_color: Rgba::rgb(0xc8, 0xc8, 0xc8),

            font: "Sans".to_string(),
            font_size: 13.0,
            font_weight: 400,
            font_style: FontStyle::Normal,
            sys_info_font: "Sans".to_string(),
            sys_info_font_size: 11.0,

            border_width: 2,
            password_border_width: 1,
            password_border_radius: 3.0,

            background_image: String::new(),
            background_image_size: ImageSizing::Auto,
            show_image_on_all_monitors: false,

            show_sys_info: false,
            show_battery_info: false,
            show_password_label: true,
            show_input_cursor: true,

            battery_info_position: "topright".to_string(),

            password_label_text: "Password:".to_string(),
            password_char: None,
            password_input_width: 14,
            password_alignment: TextAlign::Left,

            sys_info_margin: 5,
        }
    }
}

impl Config {
    /// Load the configuration from `path`. A missing file is not an error
    /// (defaults apply); a malformed file is, since a half-applied theme on
    /// a login screen is worse than none.
    pub fn load(path: &Path) -> Result<Self, Box<dyn std::error::Error>> {
        let raw = match std::fs::read_to_string(path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                info!("No config at {}, using defaults", path.display());
                return Ok(Self::default());
            }
            Err(e) => return Err(format!("failed to read {}: {e}", path.display()).into()),
        };

        let mut config: Config = serde_json::from_str(&raw)
            .map_err(|e| format!("failed to parse {}: {e}", path.display()))?;
        config.sanitize();
        Ok(config)
    }

    /// Clamp out-of-range numeric fields rather than failing on them.
    fn sanitize(&mut self) {
        for (name, field) in [
            ("screen_space_h", &mut self.screen_space_h),
            ("screen_space_v", &mut self.screen_space_v),
        ] {
            if !(0.0..=1.0).contains(field) {
                warn!("{name} = {field} out of range, clamping to 0..=1");
                *field = field.clamp(0.0, 1.0);
            }
        }
        if self.font_size <= 0.0 {
            warn!("font_size must be positive, using 13");
            self.font_size = 13.0;
        }
        if self.sys_info_font_size <= 0.0 {
            warn!("sys_info_font_size must be positive, using 11");
            self.sys_info_font_size = 11.0;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_hex_colors() {
        assert_eq!(Rgba::parse("#fff").unwrap(), Rgba::rgb(255, 255, 255));
        assert_eq!(Rgba::parse("#1b1d1e").unwrap(), Rgba::rgb(0x1b, 0x1d, 0x1e));
        assert_eq!(
            Rgba::parse("#11223380").unwrap(),
            Rgba::new(0x11, 0x22, 0x33, 0x80)
        );
    }

    #[test]
    fn rejects_malformed_colors() {
        assert!(Rgba::parse("fff").is_err());
        assert!(Rgba::parse("#ggg").is_err());
        assert!(Rgba::parse("#12345").is_err());
        assert!(Rgba::parse("").is_err());
    }

    #[test]
    fn css_form_is_canonical() {
        assert_eq!(Rgba::rgb(1, 2, 3).to_css(), "rgb(1,2,3)");
        assert_eq!(Rgba::new(0, 0, 0, 0).to_css(), "rgba(0,0,0,0)");
        assert_eq!(Rgba::new(255, 255, 255, 128).to_css(), "rgba(255,255,255,0.502)");
    }

    #[test]
    fn config_parses_typed_fields() {
        let config: Config = serde_json::from_str(
            r##"{
                "login_user": "kiosk",
                "text_color": "#abcdef",
                "password_alignment": "center",
                "background_image_size": "cover",
                "font_style": "italic",
                "password_char": "*"
            }"##,
        )
        .unwrap();
        assert_eq!(config.login_user, "kiosk");
        assert_eq!(config.text_color, Rgba::rgb(0xab, 0xcd, 0xef));
        assert_eq!(config.password_alignment, TextAlign::Center);
        assert_eq!(config.background_image_size, ImageSizing::Cover);
        assert_eq!(config.font_style, FontStyle::Italic);
        assert_eq!(config.password_char, Some('*'));
        // Unspecified fields keep their defaults.
        assert_eq!(config.password_input_width, 14);
    }

    #[test]
    fn sanitize_clamps_fractions() {
        let mut config = Config {
            screen_space_h: 1.5,
            screen_space_v: -0.2,
            ..Config::default()
        };
        config.sanitize();
        assert_eq!(config.screen_space_h, 1.0);
        assert_eq!(config.screen_space_v, 0.0);
    }
}
