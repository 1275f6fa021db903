//! Copyable text renderings of palette entries.

use crate::error::AnalysisError;
use crate::model::ColorEntry;
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ColorFormat {
    #[default]
    Hex,
    Rgb,
    Hsl,
    Hsv,
}

impl ColorFormat {
    pub const ALL: [ColorFormat; 4] = [
        ColorFormat::Hex,
        ColorFormat::Rgb,
        ColorFormat::Hsl,
        ColorFormat::Hsv,
    ];

    /// Render one entry, e.g. `#1E90FF`, `rgb(30, 144, 255)`,
    /// `hsl(210, 100.0%, 55.9%)` or `hsv(210, 88.2%, 100.0%)`.
    pub fn render(self, entry: &ColorEntry) -> String {
        match self {
            ColorFormat::Hex => entry.hex_code(),
            ColorFormat::Rgb => {
                let (r, g, b) = entry.rgb_tuple();
                format!("rgb({r}, {g}, {b})")
            }
            ColorFormat::Hsl => {
                let (h, s, l) = entry.hsl();
                format!("hsl({h:.0}, {s:.1}%, {l:.1}%)")
            }
            ColorFormat::Hsv => {
                let (h, s, v) = entry.hsv();
                format!("hsv({h:.0}, {s:.1}%, {v:.1}%)")
            }
        }
    }
}

/// One rendering per line, in palette order
pub fn format_all(entries: &[ColorEntry], format: ColorFormat) -> String {
    entries
        .iter()
        .map(|e| format.render(e))
        .collect::<Vec<_>>()
        .join("\n")
}

impl FromStr for ColorFormat {
    type Err = AnalysisError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "HEX" => Ok(ColorFormat::Hex),
            "RGB" => Ok(ColorFormat::Rgb),
            "HSL" => Ok(ColorFormat::Hsl),
            "HSV" => Ok(ColorFormat::Hsv),
            _ => Err(AnalysisError::invalid_config("format", s)),
        }
    }
}

impl fmt::Display for ColorFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ColorFormat::Hex => "HEX",
            ColorFormat::Rgb => "RGB",
            ColorFormat::Hsl => "HSL",
            ColorFormat::Hsv => "HSV",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use palette::Srgb;

    fn entry(r: u8, g: u8, b: u8) -> ColorEntry {
        ColorEntry::new(Srgb::new(r, g, b), 10.0, 1, None)
    }

    #[test]
    fn test_render_each_format() {
        let red = entry(255, 0, 0);
        assert_eq!(ColorFormat::Hex.render(&red), "#FF0000");
        assert_eq!(ColorFormat::Rgb.render(&red), "rgb(255, 0, 0)");
        assert_eq!(ColorFormat::Hsl.render(&red), "hsl(0, 100.0%, 50.0%)");
        assert_eq!(ColorFormat::Hsv.render(&red), "hsv(0, 100.0%, 100.0%)");
    }

    #[test]
    fn test_render_gray() {
        let gray = entry(128, 128, 128);
        assert_eq!(ColorFormat::Hsv.render(&gray), "hsv(0, 0.0%, 50.2%)");
    }

    #[test]
    fn test_format_all_joins_lines() {
        let entries = [entry(0, 0, 0), entry(255, 255, 255)];
        assert_eq!(format_all(&entries, ColorFormat::Hex), "#000000\n#FFFFFF");
        assert_eq!(format_all(&[], ColorFormat::Rgb), "");
    }

    #[test]
    fn test_parse_and_display() {
        for format in ColorFormat::ALL {
            assert_eq!(format.to_string().parse::<ColorFormat>().unwrap(), format);
        }
        assert_eq!("hsl".parse::<ColorFormat>().unwrap(), ColorFormat::Hsl);
        assert!("cmyk".parse::<ColorFormat>().is_err());
    }
}
