use crate::store::settings::Theme;
use ratatui::style::{Color, Modifier, Style};
use ratatui::widgets::BorderType;

/// Colors for one resolved theme.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Palette {
    pub bg: Color,
    pub bg_elevated: Color,
    pub text: Color,
    pub text_muted: Color,
    pub border: Color,
    pub accent: Color,
    pub gain: Color,
    pub loss: Color,
    pub warn: Color,
}

impl Palette {
    pub const DARK: Palette = Palette {
        bg: Color::Rgb(17, 24, 39),
        bg_elevated: Color::Rgb(31, 41, 55),
        text: Color::Rgb(243, 244, 246),
        text_muted: Color::Rgb(156, 163, 175),
        border: Color::Rgb(75, 85, 99),
        accent: Color::Rgb(45, 212, 191),
        gain: Color::Rgb(34, 197, 94),
        loss: Color::Rgb(239, 68, 68),
        warn: Color::Rgb(250, 204, 21),
    };

    pub const LIGHT: Palette = Palette {
        bg: Color::Rgb(249, 250, 251),
        bg_elevated: Color::Rgb(229, 231, 235),
        text: Color::Rgb(17, 24, 39),
        text_muted: Color::Rgb(107, 114, 128),
        border: Color::Rgb(156, 163, 175),
        accent: Color::Rgb(13, 148, 136),
        gain: Color::Rgb(22, 163, 74),
        loss: Color::Rgb(220, 38, 38),
        warn: Color::Rgb(202, 138, 4),
    };

    pub fn for_theme(theme: Theme) -> Palette {
        match resolve(theme, std::env::var("COLORFGBG").ok().as_deref()) {
            Theme::Light => Palette::LIGHT,
            _ => Palette::DARK,
        }
    }

    pub fn base(&self) -> Style {
        Style::default().fg(self.text).bg(self.bg)
    }

    pub fn border(&self) -> Style {
        Style::default().fg(self.border)
    }

    pub fn border_focused(&self) -> Style {
        Style::default().fg(self.accent)
    }

    pub fn border_type(&self) -> BorderType {
        BorderType::Rounded
    }

    pub fn border_type_focused(&self) -> BorderType {
        BorderType::Thick
    }

    pub fn title(&self) -> Style {
        Style::default().fg(self.text).add_modifier(Modifier::BOLD)
    }

    pub fn muted(&self) -> Style {
        Style::default().fg(self.text_muted)
    }

    pub fn error(&self) -> Style {
        Style::default().fg(self.loss)
    }

    pub fn header_bar(&self) -> Style {
        Style::default().fg(self.text).bg(self.bg_elevated)
    }

    /// Green for gains, red for losses, muted when flat.
    pub fn change(&self, value: f64) -> Style {
        let color = if value > 0.0 {
            self.gain
        } else if value < 0.0 {
            self.loss
        } else {
            self.text_muted
        };
        Style::default().fg(color)
    }
}

/// Resolve `system` from the terminal's `COLORFGBG` hint (`fg;bg`). A light
/// background is 7 or 15; anything else, or no hint, means dark.
pub fn resolve(theme: Theme, colorfgbg: Option<&str>) -> Theme {
    match theme {
        Theme::System => {
            let bg = colorfgbg
                .and_then(|v| v.rsplit(';').next())
                .and_then(|bg| bg.trim().parse::<u8>().ok());
            match bg {
                Some(7) | Some(15) => Theme::Light,
                _ => Theme::Dark,
            }
        }
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_system_theme() {
        assert_eq!(resolve(Theme::System, Some("0;15")), Theme::Light);
        assert_eq!(resolve(Theme::System, Some("15;0")), Theme::Dark);
        assert_eq!(resolve(Theme::System, Some("garbage")), Theme::Dark);
        assert_eq!(resolve(Theme::System, None), Theme::Dark);
        assert_eq!(resolve(Theme::Light, Some("15;0")), Theme::Light);
    }

    #[test]
    fn test_change_colors() {
        let p = Palette::DARK;
        assert_eq!(p.change(1.0).fg, Some(p.gain));
        assert_eq!(p.change(-0.5).fg, Some(p.loss));
        assert_eq!(p.change(0.0).fg, Some(p.text_muted));
    }
}
