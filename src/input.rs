use ratatui::crossterm::event::{self, KeyCode, KeyModifiers};

use crate::app::{App, Screen};
use crate::preference::FontScale;

// --- Event Handling ---

pub fn handle_key_event(app: &mut App, key: event::KeyEvent) {
  if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
    app.should_quit = true;
    return;
  }

  if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('t') {
    app.next_theme();
    return;
  }

  match key.code {
    KeyCode::Tab | KeyCode::BackTab => {
      app.screen = app.screen.next();
      return;
    }
    KeyCode::Esc | KeyCode::Char('q') => {
      app.should_quit = true;
      return;
    }
    _ => {}
  }

  match app.screen {
    Screen::Home => {}
    Screen::Settings => handle_settings_key(app, key),
  }
}

fn handle_settings_key(app: &mut App, key: event::KeyEvent) {
  app.clear_error();
  app.info_message = None;
  match key.code {
    KeyCode::Left | KeyCode::Char('h') => app.step_font_scale(-1),
    KeyCode::Right | KeyCode::Char('l') => app.step_font_scale(1),
    KeyCode::Char(c @ '1'..='4') => {
      if let Some(idx) = c.to_digit(10)
        && let Some(scale) = FontScale::ALL.get(idx as usize - 1)
      {
        app.set_font_scale(*scale);
      }
    }
    _ => {}
  }
}
