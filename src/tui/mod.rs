pub mod app;
pub mod event;
pub mod theme;
pub mod ui;

pub use app::App;
pub use theme::{resolve_theme, Theme, ThemeColors};

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use event::{Event, EventHandler};

/// Slider step for `H`/`L`
const COARSE_STEP: f64 = 0.10;

pub async fn run_tui(mut app: App) -> anyhow::Result<()> {
    // Buffer stderr while TUI is active to prevent output corrupting the display
    crate::stderr_buffer::activate();

    // Init terminal (sets up panic hooks automatically)
    let mut terminal = ratatui::init();

    let mut events = EventHandler::new(250);

    let result = loop {
        if let Err(e) = terminal.draw(|frame| ui::draw(frame, &mut app)) {
            break Err(e.into());
        }

        match events.next().await {
            Event::Key(key) => handle_key_event(&mut app, key),
            Event::Tick => app.update_flash(),
            Event::Resize => {}
        }

        if app.should_quit {
            break Ok(());
        }
    };

    // Restore terminal
    ratatui::restore();

    // Flush buffered stderr messages now that the terminal is restored
    for msg in crate::stderr_buffer::drain() {
        eprintln!("{}", msg);
    }

    result
}

fn handle_key_event(app: &mut App, key: KeyEvent) {
    // Ctrl-c quits from anywhere
    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
        app.should_quit = true;
        return;
    }

    match app.input_mode {
        app::InputMode::Normal | app::InputMode::WeightEditor => {
            let editing = app.input_mode == app::InputMode::WeightEditor;
            match key.code {
                KeyCode::Char('q') => app.should_quit = true,

                // Navigation: features while editing, table rows otherwise
                KeyCode::Char('j') | KeyCode::Down if editing => app.next_weight(),
                KeyCode::Char('k') | KeyCode::Up if editing => app.previous_weight(),
                KeyCode::Char('j') | KeyCode::Down => app.next_row(),
                KeyCode::Char('k') | KeyCode::Up => app.previous_row(),

                // Weight editor
                KeyCode::Char('w') if !editing => app.start_weight_editor(),
                KeyCode::Esc | KeyCode::Char('w') if editing => app.stop_weight_editor(),
                KeyCode::Char('l') | KeyCode::Right => {
                    app.nudge_selected_weight(crate::scoring::WEIGHT_STEP)
                }
                KeyCode::Char('h') | KeyCode::Left => {
                    app.nudge_selected_weight(-crate::scoring::WEIGHT_STEP)
                }
                KeyCode::Char('L') => app.nudge_selected_weight(COARSE_STEP),
                KeyCode::Char('H') => app.nudge_selected_weight(-COARSE_STEP),
                KeyCode::Char('a') => app.apply_weights(),
                KeyCode::Char('n') => app.normalize_pending(),
                KeyCode::Char('d') => app.reset_pending(),
                KeyCode::Char('z') => app.undo_last(),

                // Filters
                KeyCode::Char('g') => app.cycle_region(),
                KeyCode::Char('p') => app.open_province_picker(),

                // Tab switching
                KeyCode::Tab => app.toggle_view(),

                // Help
                KeyCode::Char('?') => app.show_help(),

                // Score breakdown
                KeyCode::Char('b') => app.show_score_breakdown(),

                _ => {}
            }
        }
        app::InputMode::ProvincePicker => match key.code {
            KeyCode::Char('j') | KeyCode::Down => app.picker_next(),
            KeyCode::Char('k') | KeyCode::Up => app.picker_previous(),
            KeyCode::Char(' ') => app.picker_toggle(),
            KeyCode::Enter => app.confirm_province_picker(),
            KeyCode::Esc => app.cancel_province_picker(),
            // Ignore all other keys (don't propagate to Normal mode)
            _ => {}
        },
        app::InputMode::ScoreBreakdown => match key.code {
            KeyCode::Esc | KeyCode::Char('b') => app.dismiss_score_breakdown(),
            KeyCode::Char('j') | KeyCode::Down => app.next_row(),
            KeyCode::Char('k') | KeyCode::Up => app.previous_row(),
            _ => {}
        },
        app::InputMode::Help => {
            // Any key exits help
            app.dismiss_help();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::data::parse_dataset;
    use crate::scoring::ScoringSession;
    use crate::tui::app::{InputMode, View, WEIGHT_SUM_WARNING};

    const DATASET: &str = r#"{
        "features": ["A", "B"],
        "default_weights": {"A": 0.5, "B": 0.5},
        "entities": [
            {"region": "NCR", "province": "Metro Manila", "city_municipality": "Pasig", "lat": 14.57, "long": 121.08},
            {"region": "NCR", "province": "Metro Manila", "city_municipality": "Makati", "lat": 14.55, "long": 121.02}
        ],
        "scaled": [{"A": 0.2, "B": 0.6}, {"A": 0.8, "B": 0.4}]
    }"#;

    fn app() -> App {
        let session = ScoringSession::new(parse_dataset(DATASET).unwrap()).unwrap();
        App::new(session, &Config::default())
    }

    fn press(app: &mut App, code: KeyCode) {
        handle_key_event(app, KeyEvent::new(code, KeyModifiers::NONE));
    }

    #[test]
    fn test_quit_keys() {
        let mut a = app();
        press(&mut a, KeyCode::Char('q'));
        assert!(a.should_quit);

        let mut a = app();
        a.show_help();
        handle_key_event(&mut a, KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL));
        assert!(a.should_quit);
    }

    #[test]
    fn test_jk_moves_rows_outside_editor() {
        let mut a = app();
        press(&mut a, KeyCode::Char('j'));
        assert_eq!(a.table_state.selected(), Some(1));
        assert_eq!(a.selected_weight, 0);
    }

    #[test]
    fn test_editor_keys() {
        let mut a = app();
        press(&mut a, KeyCode::Char('w'));
        assert_eq!(a.input_mode, InputMode::WeightEditor);

        press(&mut a, KeyCode::Char('j'));
        assert_eq!(a.selected_weight, 1);
        assert_eq!(a.table_state.selected(), Some(0));

        press(&mut a, KeyCode::Char('L'));
        assert_eq!(a.pending.get("B"), Some(0.6));
        press(&mut a, KeyCode::Left);
        assert_eq!(a.pending.get("B"), Some(0.59));

        press(&mut a, KeyCode::Esc);
        assert_eq!(a.input_mode, InputMode::Normal);
    }

    #[test]
    fn test_apply_invalid_then_normalize() {
        let mut a = app();
        let before = a.scores().clone();
        press(&mut a, KeyCode::Char('H'));
        press(&mut a, KeyCode::Char('a'));
        assert_eq!(a.scores(), &before);
        assert_eq!(
            a.flash_message.as_ref().map(|(m, _, _)| m.as_str()),
            Some(WEIGHT_SUM_WARNING)
        );

        press(&mut a, KeyCode::Char('n'));
        press(&mut a, KeyCode::Char('a'));
        assert_ne!(a.scores(), &before);
        assert!(a.session.applied_weights().is_valid());

        press(&mut a, KeyCode::Char('z'));
        assert_eq!(a.scores().scores(), before.scores());
    }

    #[test]
    fn test_picker_swallows_keys() {
        let mut a = app();
        press(&mut a, KeyCode::Char('p'));
        assert_eq!(a.input_mode, InputMode::ProvincePicker);
        press(&mut a, KeyCode::Char('q'));
        assert!(!a.should_quit);
        press(&mut a, KeyCode::Char(' '));
        press(&mut a, KeyCode::Enter);
        assert_eq!(a.input_mode, InputMode::ProvincePicker);
        press(&mut a, KeyCode::Char(' '));
        press(&mut a, KeyCode::Enter);
        assert_eq!(a.input_mode, InputMode::Normal);
        assert!(a.region_filter.provinces.is_empty());
    }

    #[test]
    fn test_tab_and_help() {
        let mut a = app();
        press(&mut a, KeyCode::Tab);
        assert_eq!(a.current_view, View::Rankings);
        press(&mut a, KeyCode::Char('?'));
        assert_eq!(a.input_mode, InputMode::Help);
        press(&mut a, KeyCode::Char('x'));
        assert_eq!(a.input_mode, InputMode::Normal);
    }
}
