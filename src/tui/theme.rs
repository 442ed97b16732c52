// Theme system for the TUI
//
// Two palettes, dark and light, switched by the persisted dark-mode flag.
// The flag is read before the first frame so there is no light-mode flash
// when dark mode is on.

use ratatui::style::{Color, Modifier, Style};

/// Complete theme definition with all UI colors
#[derive(Debug, Clone)]
pub struct Theme {
    // Base colors
    pub bg: Color,
    pub fg: Color,
    pub border: Color,
    pub title: Color,
    pub muted: Color,

    // Sentiment and status accents
    pub positive: Color,
    pub neutral: Color,
    pub negative: Color,
    pub accent: Color,

    // Selection in lists and tables
    pub selected_bg: Color,
    pub selected_fg: Color,

    // Badge for sample-data views
    pub badge: Color,
}

impl Theme {
    /// Palette for the given dark-mode flag
    pub fn for_mode(dark_mode: bool) -> Self {
        if dark_mode {
            Self::dark()
        } else {
            Self::light()
        }
    }

    pub fn dark() -> Self {
        Self {
            bg: Color::Rgb(15, 23, 42),
            fg: Color::Rgb(226, 232, 240),
            border: Color::Rgb(51, 65, 85),
            title: Color::Rgb(96, 165, 250),
            muted: Color::Rgb(100, 116, 139),
            positive: Color::Rgb(16, 185, 129),
            neutral: Color::Rgb(251, 191, 36),
            negative: Color::Rgb(239, 68, 68),
            accent: Color::Rgb(59, 130, 246),
            selected_bg: Color::Rgb(30, 41, 59),
            selected_fg: Color::Rgb(248, 250, 252),
            badge: Color::Rgb(251, 191, 36),
        }
    }

    pub fn light() -> Self {
        Self {
            bg: Color::Rgb(248, 250, 252),
            fg: Color::Rgb(15, 23, 42),
            border: Color::Rgb(203, 213, 225),
            title: Color::Rgb(37, 99, 235),
            muted: Color::Rgb(100, 116, 139),
            positive: Color::Rgb(5, 150, 105),
            neutral: Color::Rgb(245, 158, 11),
            negative: Color::Rgb(220, 38, 38),
            accent: Color::Rgb(59, 130, 246),
            selected_bg: Color::Rgb(219, 234, 254),
            selected_fg: Color::Rgb(15, 23, 42),
            badge: Color::Rgb(180, 83, 9),
        }
    }

    /// Base style for full-frame backgrounds
    pub fn base(&self) -> Style {
        Style::default().bg(self.bg).fg(self.fg)
    }

    /// Style for panel titles
    pub fn title_style(&self) -> Style {
        Style::default().fg(self.title).add_modifier(Modifier::BOLD)
    }

    /// Style for the sample-data badge
    pub fn badge_style(&self) -> Style {
        Style::default().fg(self.badge).add_modifier(Modifier::BOLD)
    }

    /// Style for dimmed secondary text
    pub fn muted_style(&self) -> Style {
        Style::default().fg(self.muted)
    }

    /// Color for a sentiment class name
    pub fn sentiment_color(&self, sentiment: &str) -> Color {
        match sentiment.to_ascii_lowercase().as_str() {
            "positive" => self.positive,
            "negative" => self.negative,
            _ => self.neutral,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mode_flag_picks_the_palette() {
        assert_eq!(Theme::for_mode(true).bg, Theme::dark().bg);
        assert_eq!(Theme::for_mode(false).bg, Theme::light().bg);
    }

    #[test]
    fn sentiment_colors_are_case_insensitive() {
        let theme = Theme::dark();
        assert_eq!(theme.sentiment_color("Positive"), theme.positive);
        assert_eq!(theme.sentiment_color("NEGATIVE"), theme.negative);
        assert_eq!(theme.sentiment_color("Neutral"), theme.neutral);
        assert_eq!(theme.sentiment_color("other"), theme.neutral);
    }
}
