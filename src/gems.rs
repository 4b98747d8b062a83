//! Display metadata for the four achievement tiers

use colored::{ColoredString, Colorize};

use crate::api::models::GemType;

/// Fill colour used when a project has no gem yet
pub const UNKNOWN_GEM_COLOR: &str = "#6B7280";

const UNKNOWN_GEM_NAME: &str = "Desconhecida";
const DEFAULT_DESCRIPTION: &str = "Continue progredindo!";
const OUTLINE_COLOR: &str = "#1a202c";

impl GemType {
    pub fn display_name(&self) -> &'static str {
        match self {
            GemType::Esmeralda => "Esmeralda",
            GemType::Rubi => "Rubi",
            GemType::Safira => "Safira",
            GemType::Diamante => "Diamante",
        }
    }

    pub fn emoji(&self) -> &'static str {
        match self {
            GemType::Esmeralda => "💚",
            GemType::Rubi => "❤️",
            GemType::Safira => "💙",
            GemType::Diamante => "💎",
        }
    }

    pub fn fill_color(&self) -> &'static str {
        match self {
            GemType::Esmeralda => "#10B981",
            GemType::Rubi => "#EF4444",
            GemType::Safira => "#3B82F6",
            GemType::Diamante => "#E5E7EB",
        }
    }

    pub fn shine_color(&self) -> &'static str {
        match self {
            GemType::Esmeralda => "#34D399",
            GemType::Rubi => "#F87171",
            GemType::Safira => "#60A5FA",
            GemType::Diamante => "#F9FAFB",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            GemType::Esmeralda => {
                "Você deu os primeiros passos em sua jornada! A Esmeralda representa o início de grandes conquistas."
            }
            GemType::Rubi => {
                "Seu progresso está impressionante! O Rubi simboliza a determinação e persistência."
            }
            GemType::Safira => {
                "Você está dominando o processo! A Safira representa sabedoria e excelência."
            }
            GemType::Diamante => {
                "Parabéns! Você alcançou o nível máximo! O Diamante é a prova de sua dedicação total."
            }
        }
    }

    /// Faceted gem drawn as an SVG square of `size` pixels
    pub fn svg_icon(&self, size: u32) -> String {
        format!(
            concat!(
                r#"<svg width="{size}" height="{size}" viewBox="0 0 24 24" fill="none" xmlns="http://www.w3.org/2000/svg">"#,
                r#"<path d="M12 2L3 9L12 22L21 9L12 2Z" fill="{fill}" stroke="{outline}" stroke-width="1.5" stroke-linejoin="round"/>"#,
                r#"<path d="M12 2L21 9L12 12L3 9L12 2Z" fill="{shine}" opacity="0.6"/>"#,
                r#"<line x1="3" y1="9" x2="12" y2="12" stroke="{outline}" stroke-width="0.5" opacity="0.3"/>"#,
                r#"<line x1="21" y1="9" x2="12" y2="12" stroke="{outline}" stroke-width="0.5" opacity="0.3"/>"#,
                r#"</svg>"#
            ),
            size = size,
            fill = self.fill_color(),
            shine = self.shine_color(),
            outline = OUTLINE_COLOR,
        )
    }

    /// Paints `text` in the gem's fill colour
    pub fn paint(&self, text: &str) -> ColoredString {
        let (r, g, b) = hex_to_rgb(self.fill_color()).unwrap_or((107, 114, 128));
        text.truecolor(r, g, b)
    }
}

pub fn gem_name(gem: Option<GemType>) -> &'static str {
    gem.map(|g| g.display_name()).unwrap_or(UNKNOWN_GEM_NAME)
}

pub fn gem_emoji(gem: Option<GemType>) -> &'static str {
    gem.map(|g| g.emoji()).unwrap_or("💎")
}

pub fn gem_color(gem: Option<GemType>) -> &'static str {
    gem.map(|g| g.fill_color()).unwrap_or(UNKNOWN_GEM_COLOR)
}

pub fn gem_description(gem: Option<GemType>) -> &'static str {
    gem.map(|g| g.description()).unwrap_or(DEFAULT_DESCRIPTION)
}

/// `"#10B981"` to `(16, 185, 129)`
pub fn hex_to_rgb(hex: &str) -> Option<(u8, u8, u8)> {
    let hex = hex.strip_prefix('#')?;
    if hex.len() != 6 {
        return None;
    }
    let channel = |range: std::ops::Range<usize>| u8::from_str_radix(hex.get(range)?, 16).ok();
    Some((channel(0..2)?, channel(2..4)?, channel(4..6)?))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_tables() {
        assert_eq!(GemType::Rubi.display_name(), "Rubi");
        assert_eq!(GemType::Diamante.emoji(), "💎");
        assert_eq!(GemType::Safira.fill_color(), "#3B82F6");
        assert!(GemType::Esmeralda.description().contains("primeiros passos"));
    }

    #[test]
    fn test_missing_gem_fallbacks() {
        assert_eq!(gem_name(None), "Desconhecida");
        assert_eq!(gem_color(None), "#6B7280");
        assert_eq!(gem_description(None), "Continue progredindo!");
        assert_eq!(gem_emoji(None), "💎");
        assert_eq!(gem_name(Some(GemType::Safira)), "Safira");
    }

    #[test]
    fn test_svg_icon_uses_gem_colors() {
        let svg = GemType::Rubi.svg_icon(32);
        assert!(svg.starts_with(r#"<svg width="32" height="32""#));
        assert!(svg.contains(r##"fill="#EF4444""##));
        assert!(svg.contains(r##"fill="#F87171""##));
        assert!(svg.ends_with("</svg>"));
    }

    #[test]
    fn test_hex_to_rgb() {
        assert_eq!(hex_to_rgb("#10B981"), Some((16, 185, 129)));
        assert_eq!(hex_to_rgb("10B981"), None);
        assert_eq!(hex_to_rgb("#XYZ123"), None);
    }
}
