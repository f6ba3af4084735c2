use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use crate::app::{App, Screen};

#[derive(Debug, Clone, Copy)]
pub(crate) enum Action {
    None,
    Quit,
    /// Finish setup, then run `service.get_data(false)`
    StartSchedule,
    /// Run `service.get_data(true)` for the active zone
    ForceRefresh,
}

pub(crate) fn handle_key_event(key: KeyEvent, app: &mut App) -> Action {
    use KeyCode::{Char, Down, Enter, Esc, Left, Right, Up};

    // Global quit shortcuts
    if key.code == Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
        return Action::Quit;
    }
    if key.code == Char('q') && key.modifiers.is_empty() {
        return Action::Quit;
    }

    let mut action = Action::None;

    match app.screen {
        Screen::ZoneSelect => match key.code {
            Up | Char('k') => {
                if app.zone_list_index > 0 {
                    app.zone_list_index -= 1;
                }
            }
            Down | Char('j') => {
                if app.zone_list_index + 1 < app.zones.len() {
                    app.zone_list_index += 1;
                }
            }
            Enter | Char(' ') => {
                app.select_current_zone();
            }
            _ => {}
        },

        Screen::Setup => match key.code {
            Up | Char('k') => {
                if app.setup_index > 0 {
                    app.setup_index -= 1;
                }
            }
            Down | Char('j') => {
                if app.setup_index + 1 < app.setup_rows() {
                    app.setup_index += 1;
                }
            }
            Char(' ') => {
                if app.on_ttl_row() {
                    app.adjust_cache_hours(1);
                } else {
                    app.toggle_current_waste();
                }
            }
            Left | Char('h') => {
                if app.on_ttl_row() {
                    app.adjust_cache_hours(-1);
                }
            }
            Right | Char('l') => {
                if app.on_ttl_row() {
                    app.adjust_cache_hours(1);
                }
            }
            Enter => {
                action = Action::StartSchedule;
            }
            Esc => {
                app.screen = Screen::ZoneSelect;
                app.error_message = None;
            }
            _ => {}
        },

        Screen::ScheduleView => match key.code {
            Char('r') => {
                action = Action::ForceRefresh;
            }
            Left | Esc | Char('b') => {
                app.screen = Screen::Setup;
                app.error_message = None;
            }
            _ => {}
        },
    }
    action
}
