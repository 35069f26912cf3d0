use ratatui::{
  Frame,
  layout::{Alignment, Constraint, Layout, Rect},
  style::{Modifier, Style},
  text::{Line, Span},
  widgets::{Block, BorderType, Padding, Paragraph},
};

use crate::app::{App, Screen};
use crate::constants::constants;
use crate::preference::FontScale;
use crate::scale::{ScaledText, TextKind};
use crate::theme::Theme;

// --- Helpers ---

/// A line of text styled for its role, and the rows it takes at its scale.
fn scaled_line<'a>(content: impl Into<String>, text: ScaledText, theme: &Theme) -> (Line<'a>, u16) {
  let mut style = Style::default().fg(theme.fg);
  if text.kind.is_bold() {
    style = style.add_modifier(Modifier::BOLD);
  }
  if text.kind == TextKind::Link {
    style = style.fg(theme.accent).add_modifier(Modifier::UNDERLINED);
  }
  let rows = text.style().rows(constants().row_unit);
  (Line::from(Span::styled(content.into(), style)), rows)
}

/// Stack scaled lines top to bottom, each in a slot as tall as its rows.
fn render_scaled_lines(frame: &mut Frame, lines: Vec<(Line<'_>, u16)>, area: Rect) {
  let constraints: Vec<Constraint> =
    lines.iter().map(|(_, rows)| Constraint::Length(*rows)).chain([Constraint::Min(0)]).collect();
  let slots = Layout::vertical(constraints).split(area);
  for ((line, _), slot) in lines.into_iter().zip(slots.iter()) {
    frame.render_widget(Paragraph::new(line), *slot);
  }
}

pub fn segment_label(scale: FontScale, selected: bool) -> String {
  if selected { format!("● {}", scale.label()) } else { scale.label().to_string() }
}

// --- UI Rendering ---

pub fn ui(frame: &mut Frame, app: &App) {
  let theme = app.theme();
  frame.render_widget(Block::default().style(Style::default().bg(theme.bg)), frame.area());

  let [header_area, main_area, status_area, footer_area] =
    Layout::vertical([Constraint::Length(1), Constraint::Min(3), Constraint::Length(1), Constraint::Length(1)])
      .areas(frame.area());

  render_header(frame, app, header_area);
  let block = Block::bordered()
    .border_type(BorderType::Rounded)
    .border_style(Style::default().fg(theme.border))
    .padding(Padding::new(2, 2, 1, 0));
  let inner = block.inner(main_area);
  frame.render_widget(block, main_area);
  match app.screen {
    Screen::Home => render_home(frame, app, inner),
    Screen::Settings => render_settings(frame, app, inner),
  }
  render_status(frame, app, status_area);
  render_footer(frame, app, footer_area);
}

fn render_header(frame: &mut Frame, app: &App, area: Rect) {
  let theme = app.theme();
  let mut spans = vec![Span::styled(" tp ", Style::default().fg(theme.accent).add_modifier(Modifier::BOLD))];
  for screen in Screen::ALL {
    let style = if screen == app.screen {
      Style::default().fg(theme.bg).bg(theme.accent).add_modifier(Modifier::BOLD)
    } else {
      Style::default().fg(theme.muted)
    };
    spans.push(Span::raw(" "));
    spans.push(Span::styled(format!(" {} ", screen.label()), style));
  }
  frame.render_widget(Line::from(spans), area);

  let version = format!("v{} ", env!("CARGO_PKG_VERSION"));
  let right = Line::from(Span::styled(&version, Style::default().fg(theme.muted)));
  let right_area =
    Rect { x: area.x + area.width.saturating_sub(version.len() as u16), width: version.len() as u16, ..area };
  frame.render_widget(right, right_area);
}

fn render_home(frame: &mut Frame, app: &App, area: Rect) {
  let theme = app.theme();
  let mut lines = vec![scaled_line("Blank Screen", app.text(TextKind::Default), theme)];

  let factor = app.text_scale.factor();
  lines.push((
    Line::from(Span::styled(format!("Text scale ×{:.2}", factor), Style::default().fg(theme.muted))),
    1,
  ));
  for (kind, name) in [
    (TextKind::Title, "title"),
    (TextKind::Subtitle, "subtitle"),
    (TextKind::Large, "large"),
    (TextKind::Default, "body"),
    (TextKind::Link, "link"),
    (TextKind::Small, "small"),
    (TextKind::DefaultSemiBold, "fixed"),
  ] {
    // "fixed" pins its own factor and ignores the ambient scale.
    let text = if name == "fixed" { ScaledText::new(kind).with_override(1.0) } else { app.text(kind) };
    let style = text.style();
    let line_height = style.line_height.map_or_else(|| "auto".to_string(), |h| format!("{:.1}", h));
    lines.push((
      Line::from(vec![
        Span::styled(format!("{:<10}", name), Style::default().fg(theme.muted)),
        Span::styled(format!("{:.1}pt / {}", style.font_size, line_height), Style::default().fg(theme.fg)),
      ]),
      1,
    ));
  }
  render_scaled_lines(frame, lines, area);
}

fn render_settings(frame: &mut Frame, app: &App, area: Rect) {
  let theme = app.theme();
  let lines = vec![
    scaled_line("Settings", app.text(TextKind::Title), theme),
    scaled_line("App Font Size", app.text(TextKind::Subtitle), theme),
    scaled_line("Adjust the global font size for better readability.", app.text(TextKind::Small), theme),
  ];
  let text_rows: u16 = lines.iter().map(|(_, rows)| *rows).sum();

  let [text_area, control_area, _] =
    Layout::vertical([Constraint::Length(text_rows + 1), Constraint::Length(3), Constraint::Min(0)]).areas(area);
  render_scaled_lines(frame, lines, text_area);

  if app.is_hydrated() {
    render_segmented_control(frame, app, control_area);
  } else {
    let waiting = Paragraph::new("Loading settings…").style(Style::default().fg(theme.muted));
    frame.render_widget(waiting, control_area);
  }
}

/// One bordered row, one segment per font scale, selected segment tinted.
fn render_segmented_control(frame: &mut Frame, app: &App, area: Rect) {
  let theme = app.theme();
  let block =
    Block::bordered().border_type(BorderType::Rounded).border_style(Style::default().fg(theme.border));
  let inner = block.inner(area);
  frame.render_widget(block, area);

  let current = app.font_scale();
  let segments = Layout::horizontal(FontScale::ALL.map(|_| Constraint::Ratio(1, FontScale::ALL.len() as u32)))
    .split(inner);
  for (scale, segment) in FontScale::ALL.into_iter().zip(segments.iter()) {
    let selected = scale == current;
    let style = if selected { Style::default().fg(theme.bg).bg(theme.accent) } else { Style::default().fg(theme.fg) };
    let line = Line::from(Span::styled(segment_label(scale, selected), style.add_modifier(Modifier::BOLD)));
    frame.render_widget(Paragraph::new(line).alignment(Alignment::Center).style(style), *segment);
  }
}

fn render_status(frame: &mut Frame, app: &App, area: Rect) {
  let theme = app.theme();
  let (text, style) = if let Some(msg) = &app.status_message {
    (format!(" ⏳ {}", msg), Style::default().fg(theme.status))
  } else if let Some(err) = &app.last_error {
    (format!(" ⚠  {}", err), Style::default().fg(theme.error))
  } else if let Some(info) = &app.info_message {
    (format!(" ℹ  {}", info), Style::default().fg(theme.muted))
  } else {
    (format!(" Font scale: {}", app.font_scale().label()), Style::default().fg(theme.muted))
  };
  frame.render_widget(Paragraph::new(text).style(style), area);
}

fn render_footer(frame: &mut Frame, app: &App, area: Rect) {
  let theme = app.theme();
  let mut keys: Vec<(&str, &str)> = vec![("Tab", "Screen")];
  if app.screen == Screen::Settings {
    keys.push(("←/→", "Size"));
    keys.push(("1-4", "Pick"));
  }
  keys.push(("^t", "Theme"));
  keys.push(("Esc", "Quit"));

  let spans: Vec<Span> = keys
    .iter()
    .enumerate()
    .flat_map(|(i, (key, action))| {
      let mut s = vec![
        Span::styled(format!(" {} ", key), Style::default().fg(theme.key_fg).bg(theme.key_bg)),
        Span::styled(format!(" {} ", action), Style::default().fg(theme.muted)),
      ];
      if i < keys.len() - 1 {
        s.push(Span::raw("  "));
      }
      s
    })
    .collect();

  frame.render_widget(Line::from(spans), area);

  let theme_label = format!("{} ", theme.name);
  let right = Line::from(Span::styled(&theme_label, Style::default().fg(theme.muted)));
  let right_area =
    Rect { x: area.x + area.width.saturating_sub(theme_label.len() as u16), width: theme_label.len() as u16, ..area };
  frame.render_widget(right, right_area);
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::config::Config;
  use crate::settings::SettingsStore;
  use crate::storage::MemoryStore;
  use ratatui::{Terminal, backend::TestBackend};
  use std::sync::Arc;

  fn buffer_text(terminal: &Terminal<TestBackend>) -> String {
    terminal.backend().buffer().content().iter().map(|c| c.symbol()).collect()
  }

  #[test]
  fn segment_label_marks_selection() {
    assert_eq!(segment_label(FontScale::Large, true), "● Large");
    assert_eq!(segment_label(FontScale::ExtraLarge, false), "Extra large");
  }

  #[test]
  fn settings_screen_gates_control_until_hydrated() {
    let store = SettingsStore::new();
    let mut app = App::new(store.clone(), Arc::new(MemoryStore::new()), Config::default());
    app.screen = Screen::Settings;

    let mut terminal = Terminal::new(TestBackend::new(100, 24)).unwrap();
    terminal.draw(|f| ui(f, &app)).unwrap();
    let text = buffer_text(&terminal);
    assert!(text.contains("Loading settings"));
    assert!(!text.contains("Extra large"));

    store.set_hydrated(true);
    terminal.draw(|f| ui(f, &app)).unwrap();
    let text = buffer_text(&terminal);
    assert!(text.contains("● Default"));
    assert!(text.contains("Extra large"));
  }

  #[test]
  fn home_screen_shows_scaled_sizes() {
    let store = SettingsStore::new();
    store.set_font_scale(FontScale::Large);
    let app = App::new(store, Arc::new(MemoryStore::new()), Config::default());

    let mut terminal = Terminal::new(TestBackend::new(100, 24)).unwrap();
    terminal.draw(|f| ui(f, &app)).unwrap();
    let text = buffer_text(&terminal);
    assert!(text.contains("Blank Screen"));
    assert!(text.contains("×1.25"));
    assert!(text.contains("40.0pt / 40.0"));
    assert!(text.contains("fixed     16.0pt / 24.0"));
  }
}
