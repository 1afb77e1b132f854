use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use crate::app::{App, LoginField, Screen};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Action {
    None,
    Quit,
    /// Log in with the typed credentials
    Login,
    /// Reload the data of the current screen
    Refresh,
    /// Ask the server to rescore the resident's bin
    RecalculateRewards,
    /// Load the pickup request list
    ShowPickups,
    /// Accept the highlighted pickup request
    AcceptPickup,
}

pub(crate) fn handle_key_event(key: KeyEvent, app: &mut App) -> Action {
    use KeyCode::{Backspace, BackTab, Char, Down, Enter, Esc, Left, Tab, Up};

    // Global quit shortcut
    if key.code == Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
        return Action::Quit;
    }

    let mut action = Action::None;

    match app.screen {
        Screen::Login => match key.code {
            Tab | BackTab | Up | Down => {
                app.login_field = match app.login_field {
                    LoginField::Email => LoginField::Password,
                    LoginField::Password => LoginField::Email,
                };
            }
            Char(character) => {
                if !key.modifiers.contains(KeyModifiers::CONTROL)
                    && !key.modifiers.contains(KeyModifiers::ALT)
                {
                    match app.login_field {
                        LoginField::Email => app.email_input.push(character),
                        LoginField::Password => app.password_input.push(character),
                    }
                }
            }
            Backspace => {
                match app.login_field {
                    LoginField::Email => app.email_input.pop(),
                    LoginField::Password => app.password_input.pop(),
                };
            }
            Enter => {
                if app.login_field == LoginField::Email {
                    app.login_field = LoginField::Password;
                } else {
                    action = Action::Login;
                }
            }
            Esc => {
                action = Action::Quit;
            }
            _ => {}
        },

        Screen::Resident => match key.code {
            Char('q') => action = Action::Quit,
            Char('r') => action = Action::RecalculateRewards,
            Char('u') => action = Action::Refresh,
            Char('l') | Esc => app.logout(),
            _ => {}
        },

        Screen::Overview => match key.code {
            Char('q') => action = Action::Quit,
            Up | Char('k') => {
                if app.house_list_index > 0 {
                    app.house_list_index -= 1;
                }
            }
            Down | Char('j') => {
                if app.house_list_index + 1 < app.house_count() {
                    app.house_list_index += 1;
                }
            }
            Char('p') | Tab => action = Action::ShowPickups,
            Char('u') => action = Action::Refresh,
            Char('l') | Esc => app.logout(),
            _ => {}
        },

        Screen::Pickups => match key.code {
            Char('q') => action = Action::Quit,
            Up | Char('k') => {
                if app.pickup_list_index > 0 {
                    app.pickup_list_index -= 1;
                }
            }
            Down | Char('j') => {
                if app.pickup_list_index + 1 < app.pickups.len() {
                    app.pickup_list_index += 1;
                }
            }
            Char('a') | Enter => action = Action::AcceptPickup,
            Char('u') => action = Action::ShowPickups,
            Left | Esc | Char('b') | Tab => {
                app.screen = Screen::Overview;
            }
            _ => {}
        },
    }
    action
}

#[cfg(test)]
mod tests {
    use binwatch_core::Role;
    use binwatch_core::api::AuthResponse;
    use chrono::Utc;
    use reqwest::Client;

    use super::*;
    use crate::client::ApiClient;

    fn app() -> App {
        App::new(ApiClient::new(Client::new(), "http://localhost:5000"))
    }

    fn press(app: &mut App, code: KeyCode) -> Action {
        handle_key_event(KeyEvent::new(code, KeyModifiers::NONE), app)
    }

    #[test]
    fn typing_fills_the_focused_login_field() {
        let mut app = app();
        for character in "ada@x.org".chars() {
            press(&mut app, KeyCode::Char(character));
        }
        assert_eq!(press(&mut app, KeyCode::Enter), Action::None);
        for character in "pq".chars() {
            press(&mut app, KeyCode::Char(character));
        }
        press(&mut app, KeyCode::Backspace);

        assert_eq!(app.email_input, "ada@x.org");
        assert_eq!(app.password_input, "p");
        assert_eq!(press(&mut app, KeyCode::Enter), Action::Login);
    }

    #[test]
    fn authorities_land_on_the_overview() {
        let mut app = app();
        app.logged_in(&AuthResponse {
            message: "Login successful".to_owned(),
            token: "token".to_owned(),
            expires_at: Utc::now(),
            name: "City".to_owned(),
            role: Role::Authority,
        });
        assert_eq!(app.screen, Screen::Overview);
        assert_eq!(press(&mut app, KeyCode::Char('p')), Action::ShowPickups);
        assert_eq!(press(&mut app, KeyCode::Esc), Action::None);
        assert_eq!(app.screen, Screen::Login);
    }

    #[test]
    fn ctrl_c_always_quits() {
        let mut app = app();
        let key = KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL);
        assert_eq!(handle_key_event(key, &mut app), Action::Quit);
    }
}
