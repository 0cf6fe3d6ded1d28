//! Centralized theme module for TUI color constants and styles

use ratatui::prelude::*;

use crate::config::ThemeMode;
use crate::table::HeatGradient;

/// Resolved palette variant
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Theme {
    Dark,
    Light,
}

/// Pick the palette for `mode`. `Auto` queries the terminal background and
/// falls back to dark when the terminal doesn't answer.
pub fn resolve_theme(mode: ThemeMode) -> Theme {
    match mode {
        ThemeMode::Dark => Theme::Dark,
        ThemeMode::Light => Theme::Light,
        ThemeMode::Auto => match terminal_light::luma() {
            Ok(luma) if luma > 0.6 => Theme::Light,
            Ok(_) => Theme::Dark,
            Err(e) => {
                log::debug!("Could not detect terminal background ({}), using dark theme", e);
                Theme::Dark
            }
        },
    }
}

/// Complete color palette for the TUI
#[derive(Debug, Clone)]
pub struct ThemeColors {
    // Score-based colors (traffic light pattern)
    pub score_high: Color,
    pub score_mid: Color,
    pub score_low: Color,

    // Weight gauge colors
    pub gauge_filled: Color,
    pub gauge_empty: Color,
    pub weight_sum_ok: Color,
    pub weight_sum_bad: Color,
    pub weight_pending: Color,

    // Table colors
    pub row_alt_bg: Color,
    pub index_color: Color,

    // Styles
    pub title_style: Style,
    pub header_style: Style,
    pub row_selected: Style,

    // General colors
    pub muted: Color,
    pub title_color: Color,

    // Tab colors
    pub tab_active_style: Style,
    pub tab_inactive_style: Style,

    // Status bar colors
    pub status_bar_bg: Color,
    pub status_key_color: Color,
    pub flash_success: Color,
    pub flash_error: Color,

    // Divider and separator colors
    pub divider_color: Color,

    // Popup overlay colors
    pub popup_border: Color,
    pub popup_title: Style,
    pub popup_bg: Color,

    // Chart colors
    pub bar_color: Color,
    pub map_background: Color,
}

impl ThemeColors {
    pub fn for_theme(theme: Theme) -> Self {
        match theme {
            Theme::Dark => Self::dark(),
            Theme::Light => Self::light(),
        }
    }

    /// Dark theme palette
    pub fn dark() -> Self {
        Self {
            score_high: Color::Red,
            score_mid: Color::Yellow,
            score_low: Color::Blue,
            gauge_filled: Color::Cyan,
            gauge_empty: Color::DarkGray,
            weight_sum_ok: Color::Green,
            weight_sum_bad: Color::Red,
            weight_pending: Color::Yellow,
            row_alt_bg: Color::Indexed(235),
            index_color: Color::DarkGray,
            title_style: Style::new().bold(),
            header_style: Style::new().bold(),
            row_selected: Style::new().reversed(),
            muted: Color::Gray,
            title_color: Color::Cyan,
            tab_active_style: Style::new().fg(Color::Cyan).bold(),
            tab_inactive_style: Style::new().fg(Color::DarkGray),
            status_bar_bg: Color::Indexed(236),
            status_key_color: Color::Cyan,
            flash_success: Color::Green,
            flash_error: Color::Red,
            divider_color: Color::Indexed(238),
            popup_border: Color::Cyan,
            popup_title: Style::new().fg(Color::Cyan).bold(),
            popup_bg: Color::Indexed(234),
            bar_color: Color::Indexed(203),
            map_background: Color::Reset,
        }
    }

    /// Light theme palette, darker accents for contrast on light backgrounds
    pub fn light() -> Self {
        Self {
            score_high: Color::Red,
            score_mid: Color::Indexed(130),
            score_low: Color::Blue,
            gauge_filled: Color::Blue,
            gauge_empty: Color::Indexed(252),
            weight_sum_ok: Color::Indexed(28),
            weight_sum_bad: Color::Red,
            weight_pending: Color::Indexed(130),
            row_alt_bg: Color::Indexed(254),
            index_color: Color::Indexed(244),
            title_style: Style::new().bold(),
            header_style: Style::new().bold(),
            row_selected: Style::new().reversed(),
            muted: Color::Indexed(240),
            title_color: Color::Blue,
            tab_active_style: Style::new().fg(Color::Blue).bold(),
            tab_inactive_style: Style::new().fg(Color::Indexed(244)),
            status_bar_bg: Color::Indexed(253),
            status_key_color: Color::Blue,
            flash_success: Color::Indexed(28),
            flash_error: Color::Red,
            divider_color: Color::Indexed(250),
            popup_border: Color::Blue,
            popup_title: Style::new().fg(Color::Blue).bold(),
            popup_bg: Color::Indexed(255),
            bar_color: Color::Indexed(160),
            map_background: Color::Reset,
        }
    }

    /// Returns the appropriate color for a score based on its percentage of max score
    pub fn score_color(&self, score: f64, max_score: f64) -> Color {
        let percentage = if max_score > 0.0 {
            (score / max_score) * 100.0
        } else {
            0.0
        };

        if percentage >= 70.0 {
            self.score_high
        } else if percentage >= 40.0 {
            self.score_mid
        } else {
            self.score_low
        }
    }
}

/// Heat map color of a score as a terminal RGB color
pub fn heat_color(gradient: &HeatGradient, score: f64) -> Color {
    let (r, g, b) = gradient.color(score);
    Color::Rgb(r, g, b)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_explicit_modes_skip_detection() {
        assert_eq!(resolve_theme(ThemeMode::Dark), Theme::Dark);
        assert_eq!(resolve_theme(ThemeMode::Light), Theme::Light);
    }

    #[test]
    fn test_score_color_bands() {
        let colors = ThemeColors::dark();
        assert_eq!(colors.score_color(0.9, 1.0), colors.score_high);
        assert_eq!(colors.score_color(0.5, 1.0), colors.score_mid);
        assert_eq!(colors.score_color(0.1, 1.0), colors.score_low);
        assert_eq!(colors.score_color(0.5, 0.0), colors.score_low);
    }

    #[test]
    fn test_heat_color() {
        let gradient = HeatGradient::default();
        assert_eq!(heat_color(&gradient, 1.0), Color::Rgb(255, 0, 0));
        assert_eq!(heat_color(&gradient, 0.0), Color::Rgb(0, 0, 255));
    }
}
