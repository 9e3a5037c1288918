//! Colour palettes the renderer applies for each [`ThemeId`].

use serde::Serialize;

use crate::settings::ThemeId;

/// Background, foreground and the sixteen ANSI colours, as CSS hex strings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Palette {
    pub background: &'static str,
    pub foreground: &'static str,
    pub black: &'static str,
    pub red: &'static str,
    pub green: &'static str,
    pub yellow: &'static str,
    pub blue: &'static str,
    pub magenta: &'static str,
    pub cyan: &'static str,
    pub white: &'static str,
    pub bright_black: &'static str,
    pub bright_red: &'static str,
    pub bright_green: &'static str,
    pub bright_yellow: &'static str,
    pub bright_blue: &'static str,
    pub bright_magenta: &'static str,
    pub bright_cyan: &'static str,
    pub bright_white: &'static str,
}

pub const DARK: Palette = Palette {
    background: "#1e1e1e",
    foreground: "#f0f0f0",
    black: "#000000",
    red: "#e74c3c",
    green: "#2ecc71",
    yellow: "#f1c40f",
    blue: "#3498db",
    magenta: "#9b59b6",
    cyan: "#1abc9c",
    white: "#ecf0f1",
    bright_black: "#95a5a6",
    bright_red: "#e74c3c",
    bright_green: "#2ecc71",
    bright_yellow: "#f1c40f",
    bright_blue: "#3498db",
    bright_magenta: "#9b59b6",
    bright_cyan: "#1abc9c",
    bright_white: "#ffffff",
};

pub const LIGHT: Palette = Palette {
    background: "#ffffff",
    foreground: "#333333",
    black: "#000000",
    red: "#c0392b",
    green: "#27ae60",
    yellow: "#f39c12",
    blue: "#2980b9",
    magenta: "#8e44ad",
    cyan: "#16a085",
    white: "#bdc3c7",
    bright_black: "#7f8c8d",
    bright_red: "#e74c3c",
    bright_green: "#2ecc71",
    bright_yellow: "#f1c40f",
    bright_blue: "#3498db",
    bright_magenta: "#9b59b6",
    bright_cyan: "#1abc9c",
    bright_white: "#ecf0f1",
};

impl ThemeId {
    pub fn palette(self) -> &'static Palette {
        match self {
            ThemeId::Dark => &DARK,
            ThemeId::Light => &LIGHT,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_palettes_differ_in_base_colours() {
        let dark = ThemeId::Dark.palette();
        let light = ThemeId::Light.palette();
        assert_ne!(dark.background, light.background);
        assert_ne!(dark.foreground, light.foreground);
    }

    #[test]
    fn test_palette_serializes_camel_case() {
        let value = serde_json::to_value(ThemeId::Light.palette()).unwrap();
        assert_eq!(value["brightWhite"], "#ecf0f1");
        assert_eq!(value["background"], "#ffffff");
    }
}
