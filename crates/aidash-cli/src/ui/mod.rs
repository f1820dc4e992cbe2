//! TUI rendering: orchestrates all panes.

pub mod services;
pub mod subscriptions;

use chrono::Local;
use ratatui::{
  Frame,
  layout::{Constraint, Direction, Flex, Layout, Rect},
  style::{Color, Modifier, Style},
  text::{Line, Span},
  widgets::{Block, Borders, Clear, Paragraph},
};

use crate::app::{App, Screen, rate_origin_label};

// ─── Root draw ────────────────────────────────────────────────────────────────

/// Main draw function called each frame.
pub fn draw(f: &mut Frame, app: &App) {
  let area = f.area();

  // Vertical stack: header, body, status bar.
  let rows = Layout::default()
    .direction(Direction::Vertical)
    .constraints([
      Constraint::Length(1), // header
      Constraint::Min(0),    // body
      Constraint::Length(1), // status bar
    ])
    .split(area);

  draw_header(f, rows[0], app);
  match app.screen {
    Screen::Subscriptions => subscriptions::draw(f, rows[1], app),
    Screen::Services => services::draw(f, rows[1], app),
  }
  draw_status(f, rows[2], app);

  if let Some(form) = &app.form {
    draw_form(f, area, form);
  }
}

// ─── Header ───────────────────────────────────────────────────────────────────

fn draw_header(f: &mut Frame, area: Rect, app: &App) {
  let date = Local::now().format("%Y-%m-%d").to_string();

  let mut spans = vec![Span::styled(
    " aidash ",
    Style::default().fg(Color::White).add_modifier(Modifier::BOLD),
  )];
  for screen in [Screen::Subscriptions, Screen::Services] {
    let style = if screen == app.screen {
      Style::default().fg(Color::Black).bg(Color::Cyan).add_modifier(Modifier::BOLD)
    } else {
      Style::default().fg(Color::Gray)
    };
    spans.push(Span::raw(" "));
    spans.push(Span::styled(format!(" {} ", screen.title()), style));
  }

  let right_text = match &app.snapshot {
    Some(snap) => format!(
      "₩{:.2}/$ ({})  {date} ",
      snap.rate.rate.krw_per_usd(),
      rate_origin_label(&snap.rate)
    ),
    None => format!("{date} "),
  };
  let right = Span::styled(right_text, Style::default().fg(Color::Gray));

  // Pad the middle so the rate sits on the right edge.
  let left_width: usize = spans.iter().map(|s| s.content.chars().count()).sum();
  let right_width = right.content.chars().count();
  let pad = (area.width as usize)
    .saturating_sub(left_width)
    .saturating_sub(right_width);
  spans.push(Span::raw(" ".repeat(pad)));
  spans.push(right);

  let block = Block::default().style(Style::default().bg(Color::DarkGray));
  let inner = block.inner(area);
  f.render_widget(block, area);
  f.render_widget(Paragraph::new(Line::from(spans)), inner);
}

// ─── Form popup ───────────────────────────────────────────────────────────────

fn draw_form(f: &mut Frame, area: Rect, form: &crate::app::Form) {
  let height = form.fields.len() as u16 + 4;
  let popup = centered(area, 56, height);

  let block = Block::default()
    .title(format!(" {} ", form.title()))
    .borders(Borders::ALL)
    .border_style(Style::default().fg(Color::Cyan));
  let inner = block.inner(popup);
  f.render_widget(Clear, popup);
  f.render_widget(block, popup);

  let mut lines: Vec<Line> = form
    .fields
    .iter()
    .enumerate()
    .map(|(i, field)| {
      let focused = i == form.cursor;
      let label_style = if focused {
        Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD)
      } else {
        Style::default().fg(Color::DarkGray)
      };
      let value = match (&field.choices, focused) {
        (Some(_), true) => format!("◀ {} ▶", field.value),
        (None, true) => format!("{}_", field.value),
        _ => field.value.clone(),
      };
      Line::from(vec![
        Span::styled(format!("{:>10}  ", field.label), label_style),
        Span::raw(value),
      ])
    })
    .collect();
  lines.push(Line::from(""));
  lines.push(Line::from(Span::styled(
    "Tab/↑↓ field  ←→ choice  Enter save  Esc cancel",
    Style::default().fg(Color::DarkGray),
  )));

  f.render_widget(Paragraph::new(lines), inner);
}

fn centered(area: Rect, width: u16, height: u16) -> Rect {
  let [row] = Layout::vertical([Constraint::Length(height)])
    .flex(Flex::Center)
    .areas(area);
  let [cell] = Layout::horizontal([Constraint::Length(width)])
    .flex(Flex::Center)
    .areas(row);
  cell
}

// ─── Status bar ───────────────────────────────────────────────────────────────

fn draw_status(f: &mut Frame, area: Rect, app: &App) {
  let (mode_label, hints) = if let Some(pending) = &app.confirm {
    ("CONFIRM", pending.prompt())
  } else if app.form.is_some() {
    ("FORM", "Enter save  Esc cancel".to_string())
  } else if app.filter_active {
    ("SEARCH", "Type to filter  Esc clear  Enter keep".to_string())
  } else {
    let hints = match app.screen {
      Screen::Subscriptions => {
        "jk move  a add  e edit  d delete  / search  R rate  x export  Tab services  q quit"
      }
      Screen::Services => "jk move  a add  d delete  / search  Tab subscriptions  q quit",
    };
    ("NORMAL", hints.to_string())
  };

  let status = if app.status_msg.is_empty() || app.confirm.is_some() {
    hints
  } else {
    app.status_msg.clone()
  };

  let mode_span = Span::styled(
    format!(" {mode_label} "),
    Style::default()
      .fg(Color::Black)
      .bg(Color::Cyan)
      .add_modifier(Modifier::BOLD),
  );
  let hint_span = Span::styled(
    format!("  {status}"),
    Style::default().fg(Color::DarkGray),
  );

  f.render_widget(
    Paragraph::new(Line::from(vec![mode_span, hint_span])).style(Style::default().bg(Color::Black)),
    area,
  );
}

/// Filter line shown at the bottom of a list pane; shrinks `inner` to make
/// room for it.
fn draw_filter_line(f: &mut Frame, inner: &mut Rect, app: &App) {
  if !(app.filter_active || !app.filter.is_empty()) || inner.height <= 2 {
    return;
  }
  let filter_area = Rect {
    x:      inner.x,
    y:      inner.y + inner.height - 1,
    width:  inner.width,
    height: 1,
  };
  inner.height = inner.height.saturating_sub(1);

  let text = if app.filter_active {
    format!("/{}_", app.filter)
  } else {
    format!("/{}", app.filter)
  };
  f.render_widget(
    Paragraph::new(text).style(Style::default().fg(Color::Yellow)),
    filter_area,
  );
}
