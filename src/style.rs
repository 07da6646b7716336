// =============================================================================
// duskgreet — Theme Synthesis
//
// Renders the configuration into the greeter's theme exactly once: a
// canonical stylesheet text (the serialized form, dumped at debug level and
// pinned by tests) plus the resolved values the renderer consumes. The
// result lives in an explicitly owned StyleProvider, installed into a
// priority-ordered registry held by the orchestrator; there is no ambient
// global style state.
// =============================================================================

use std::fmt::Write;
use std::path::PathBuf;

use crate::config::{Config, FontStyle, ImageSizing, Rgba};

use tracing::debug;

// Provider priorities, lowest to highest. The synthesized theme is installed
// one step above user-level defaults so it overrides them while staying
// below an explicit override layer.
pub const PRIORITY_FALLBACK: u32 = 1;
pub const PRIORITY_USER: u32 = 800;
pub const PRIORITY_GREETER: u32 = PRIORITY_USER + 1;

/// Resolved style values consumed by the renderer.
#[derive(Debug, Clone, PartialEq)]
pub struct Theme {
    pub font_family: String,
    pub font_size: f32,
    pub font_weight: u16,
    pub font_style: FontStyle,

    pub text_color: Rgba,
    pub error_color: Rgba,

    pub background_color: Rgba,
    pub background_image: Option<PathBuf>,
    pub background_image_size: ImageSizing,

    pub window_color: Rgba,
    pub border_width: u32,
    pub border_color: Rgba,

    pub password_color: Rgba,
    pub caret_color: Rgba,
    pub password_background_color: Rgba,
    pub password_border_width: u32,
    pub password_border_color: Rgba,
    pub password_border_radius: f32,

    pub sys_info_font: String,
    pub sys_info_font_size: f32,
    pub sys_info_color: Rgba,
    pub sys_info_margin: u32,
}

impl Theme {
    /// Built-in defaults, always present at the bottom of the registry.
    pub fn fallback() -> Self {
        Self::from_config(&Config::default())
    }

    pub fn from_config(config: &Config) -> Self {
        Self {
            font_family: config.font.clone(),
            font_size: config.font_size,
            font_weight: config.font_weight,
            font_style: config.font_style,

            text_color: config.text_color,
            error_color: config.error_color,

            background_color: config.background_color,
            background_image: if config.background_image.is_empty() {
                None
            } else {
                Some(PathBuf::from(&config.background_image))
            },
            background_image_size: config.background_image_size,

            window_color: config.window_color,
            border_width: config.border_width,
            border_color: config.border_color,

            password_color: config.password_color,
            caret_color: caret_color(config),
            password_background_color: config.password_background_color,
            password_border_width: config.password_border_width,
            password_border_color: config.password_border_color,
            password_border_radius: config.password_border_radius,

            sys_info_font: config.sys_info_font.clone(),
            sys_info_font_size: config.sys_info_font_size,
            sys_info_color: config.sys_info_color,
            sys_info_margin: config.sys_info_margin,
        }
    }
}

/// The caret blends into the field background when the input cursor is
/// disabled, rendering it invisible without a separate code path.
fn caret_color(config: &Config) -> Rgba {
    if config.show_input_cursor {
        config.password_color
    } else {
        config.password_background_color
    }
}

/// Render the configuration into the canonical stylesheet text. One fixed
/// template; identical configuration input yields byte-identical output.
pub fn synthesize_stylesheet(config: &Config) -> Result<String, std::fmt::Error> {
    let mut css = String::new();

    writeln!(css, "* {{")?;
    writeln!(css, "  font-family: {};", config.font)?;
    writeln!(css, "  font-size: {}px;", config.font_size)?;
    writeln!(css, "  font-weight: {};", config.font_weight)?;
    writeln!(css, "  font-style: {};", config.font_style.as_css())?;
    writeln!(css, "}}")?;

    writeln!(css, "label {{")?;
    writeln!(css, "  color: {};", config.text_color.to_css())?;
    writeln!(css, "}}")?;
    writeln!(css, "label#error {{")?;
    writeln!(css, "  color: {};", config.error_color.to_css())?;
    writeln!(css, "}}")?;

    writeln!(css, "#background {{")?;
    writeln!(css, "  background-color: {};", config.background_color.to_css())?;
    writeln!(css, "}}")?;
    writeln!(css, "#background.with-image {{")?;
    writeln!(css, "  background-image: url({});", config.background_image)?;
    writeln!(css, "  background-repeat: no-repeat;")?;
    writeln!(css, "  background-size: {};", config.background_image_size.as_css())?;
    writeln!(css, "  background-position: center;")?;
    writeln!(css, "}}")?;

    writeln!(css, "#main, #password {{")?;
    writeln!(css, "  border-width: {}px;", config.border_width)?;
    writeln!(css, "  border-color: {};", config.border_color.to_css())?;
    writeln!(css, "  border-style: solid;")?;
    writeln!(css, "}}")?;
    writeln!(css, "#main, #battery {{")?;
    writeln!(css, "  background-color: {};", config.window_color.to_css())?;
    writeln!(css, "}}")?;

    writeln!(css, "#password {{")?;
    writeln!(css, "  color: {};", config.password_color.to_css())?;
    writeln!(css, "  caret-color: {};", caret_color(config).to_css())?;
    writeln!(css, "  background-color: {};", config.password_background_color.to_css())?;
    writeln!(css, "  border-width: {}px;", config.password_border_width)?;
    writeln!(css, "  border-color: {};", config.password_border_color.to_css())?;
    writeln!(css, "  border-radius: {}px;", config.password_border_radius)?;
    writeln!(css, "}}")?;

    writeln!(css, "#info {{")?;
    writeln!(css, "  margin: {}px;", config.sys_info_margin)?;
    writeln!(css, "}}")?;
    writeln!(css, "#info label {{")?;
    writeln!(css, "  font-family: {};", config.sys_info_font)?;
    writeln!(css, "  font-size: {}px;", config.sys_info_font_size)?;
    writeln!(css, "  color: {};", config.sys_info_color.to_css())?;
    writeln!(css, "}}")?;

    Ok(css)
}

/// An owned style source: the synthesized text plus its resolved theme.
#[derive(Debug, Clone)]
pub struct StyleProvider {
    pub theme: Theme,
    pub stylesheet: String,
}

impl StyleProvider {
    pub fn synthesize(config: &Config) -> Result<Self, std::fmt::Error> {
        let stylesheet = synthesize_stylesheet(config)?;
        debug!("synthesized stylesheet:\n{stylesheet}");
        Ok(Self {
            theme: Theme::from_config(config),
            stylesheet,
        })
    }
}

/// Priority-ordered set of style providers. The highest-priority provider's
/// theme is in effect; a fallback provider is always present so resolution
/// never fails.
pub struct StyleRegistry {
    providers: Vec<(u32, StyleProvider)>,
}

impl StyleRegistry {
    pub fn new() -> Self {
        Self {
            providers: vec![(
                PRIORITY_FALLBACK,
                StyleProvider {
                    theme: Theme::fallback(),
                    stylesheet: String::new(),
                },
            )],
        }
    }

    /// Install a provider, replacing any existing one at the same priority.
    pub fn install(&mut self, priority: u32, provider: StyleProvider) {
        self.remove(priority);
        let at = self
            .providers
            .partition_point(|(p, _)| *p <= priority);
        self.providers.insert(at, (priority, provider));
    }

    /// Release the provider at a priority, if any.
    pub fn remove(&mut self, priority: u32) -> Option<StyleProvider> {
        let at = self.providers.iter().position(|(p, _)| *p == priority)?;
        Some(self.providers.remove(at).1)
    }

    /// The theme currently in effect.
    pub fn effective(&self) -> &Theme {
        // The fallback provider guarantees at least one entry.
        &self.providers[self.providers.len() - 1].1.theme
    }
}

impl Default for StyleRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn synthesis_is_deterministic() {
        let config = Config {
            background_image: "/usr/share/wall.png".to_string(),
            ..Config::default()
        };
        let first = synthesize_stylesheet(&config).unwrap();
        let second = synthesize_stylesheet(&config).unwrap();
        assert_eq!(first, second);
        assert!(first.contains("background-image: url(/usr/share/wall.png);"));
        assert!(first.contains("border-radius: 3px;"));
    }

    #[test]
    fn caret_follows_input_cursor_toggle() {
        let mut config = Config {
            show_input_cursor: true,
            password_color: Rgba::rgb(1, 2, 3),
            password_background_color: Rgba::rgb(9, 8, 7),
            ..Config::default()
        };
        assert_eq!(Theme::from_config(&config).caret_color, Rgba::rgb(1, 2, 3));
        assert!(synthesize_stylesheet(&config)
            .unwrap()
            .contains("caret-color: rgb(1,2,3);"));

        config.show_input_cursor = false;
        assert_eq!(Theme::from_config(&config).caret_color, Rgba::rgb(9, 8, 7));
        assert!(synthesize_stylesheet(&config)
            .unwrap()
            .contains("caret-color: rgb(9,8,7);"));
    }

    #[test]
    fn registry_prefers_highest_priority() {
        let mut registry = StyleRegistry::new();
        assert_eq!(registry.effective(), &Theme::fallback());

        let config = Config {
            text_color: Rgba::rgb(10, 20, 30),
            ..Config::default()
        };
        let provider = StyleProvider::synthesize(&config).unwrap();
        registry.install(PRIORITY_GREETER, provider);
        assert_eq!(registry.effective().text_color, Rgba::rgb(10, 20, 30));

        // An override layer above the greeter wins.
        let over = Config {
            text_color: Rgba::rgb(99, 99, 99),
            ..Config::default()
        };
        registry.install(PRIORITY_GREETER + 1, StyleProvider::synthesize(&over).unwrap());
        assert_eq!(registry.effective().text_color, Rgba::rgb(99, 99, 99));

        // Releasing it falls back to the greeter theme.
        registry.remove(PRIORITY_GREETER + 1);
        assert_eq!(registry.effective().text_color, Rgba::rgb(10, 20, 30));
    }

    #[test]
    fn install_replaces_same_priority() {
        let mut registry = StyleRegistry::new();
        let a = StyleProvider::synthesize(&Config::default()).unwrap();
        registry.install(PRIORITY_GREETER, a);

        let b = Config {
            window_color: Rgba::rgb(5, 5, 5),
            ..Config::default()
        };
        registry.install(PRIORITY_GREETER, StyleProvider::synthesize(&b).unwrap());
        assert_eq!(registry.effective().window_color, Rgba::rgb(5, 5, 5));
    }
}
