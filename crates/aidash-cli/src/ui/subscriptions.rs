//! Subscriptions screen: table on the left, cost summary on the right.

use aidash_core::{
  dashboard::{DashboardSnapshot, format_amount, format_krw, format_usd},
  renewal::Severity,
};
use ratatui::{
  Frame,
  layout::{Constraint, Direction, Layout, Rect},
  style::{Color, Modifier, Style},
  text::{Line, Span},
  widgets::{Block, Borders, Cell, Paragraph, Row, Table, TableState},
};

use crate::app::App;

/// Render the subscriptions screen into `area`.
pub fn draw(f: &mut Frame, area: Rect, app: &App) {
  let cols = Layout::default()
    .direction(Direction::Horizontal)
    .constraints([Constraint::Percentage(68), Constraint::Percentage(32)])
    .split(area);

  draw_table(f, cols[0], app);
  match &app.snapshot {
    Some(snapshot) => draw_summary(f, cols[1], snapshot),
    None => {
      let block = Block::default()
        .title(" Summary ")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray));
      f.render_widget(block, cols[1]);
    }
  }
}

fn severity_color(severity: Severity) -> Color {
  match severity {
    Severity::Normal => Color::Green,
    Severity::Warning => Color::Yellow,
    Severity::Critical => Color::Red,
  }
}

// ─── Table ────────────────────────────────────────────────────────────────────

fn draw_table(f: &mut Frame, area: Rect, app: &App) {
  let rows = app.filtered_rows();
  let total = app.snapshot.as_ref().map_or(0, |s| s.rows.len());

  let title = if app.filter_active || !app.filter.is_empty() {
    format!(" Subscriptions ({}/{}) ", rows.len(), total)
  } else {
    format!(" Subscriptions ({total}) ")
  };
  let block = Block::default()
    .title(title)
    .borders(Borders::ALL)
    .border_style(Style::default().fg(Color::DarkGray));

  let mut inner = block.inner(area);
  f.render_widget(block, area);
  super::draw_filter_line(f, &mut inner, app);

  if rows.is_empty() {
    let hint = if total == 0 {
      "No subscriptions yet. Press a to add one."
    } else {
      "Nothing matches the filter."
    };
    f.render_widget(
      Paragraph::new(hint).style(Style::default().fg(Color::DarkGray)),
      inner,
    );
    return;
  }

  let header = Row::new(["Name", "Price", "Monthly", "Next renewal", "Status"])
    .style(Style::default().fg(Color::Gray).add_modifier(Modifier::BOLD));

  let body: Vec<Row> = rows
    .iter()
    .map(|row| {
      let price = format!(
        "{}/{}",
        format_amount(row.price.in_currency(row.currency), row.currency),
        if row.period.months() == 1 { "mo" } else { "yr" },
      );
      let monthly = format!(
        "{} · {}",
        format_usd(row.cost.monthly_usd),
        format_krw(row.cost.monthly_krw)
      );
      let next = row
        .next_renewal
        .map_or_else(|| "—".to_string(), |d| d.format("%Y-%m-%d").to_string());
      Row::new(vec![
        Cell::from(row.name.clone()),
        Cell::from(price),
        Cell::from(monthly),
        Cell::from(next),
        Cell::from(row.status_label.clone())
          .style(Style::default().fg(severity_color(row.status.severity()))),
      ])
    })
    .collect();

  let widths = [
    Constraint::Fill(2),
    Constraint::Length(16),
    Constraint::Length(22),
    Constraint::Length(12),
    Constraint::Length(18),
  ];

  let mut state = TableState::default();
  state.select(Some(app.sub_cursor));

  f.render_stateful_widget(
    Table::new(body, widths)
      .header(header)
      .row_highlight_style(
        Style::default()
          .bg(Color::Blue)
          .fg(Color::White)
          .add_modifier(Modifier::BOLD),
      ),
    inner,
    &mut state,
  );
}

// ─── Summary ──────────────────────────────────────────────────────────────────

fn draw_summary(f: &mut Frame, area: Rect, snapshot: &DashboardSnapshot) {
  let block = Block::default()
    .title(" Summary ")
    .borders(Borders::ALL)
    .border_style(Style::default().fg(Color::DarkGray));
  let inner = block.inner(area);
  f.render_widget(block, area);

  let label = Style::default().fg(Color::DarkGray);
  let value = Style::default().fg(Color::White).add_modifier(Modifier::BOLD);
  let t = snapshot.totals;

  let mut lines = vec![
    Line::from(Span::styled("Monthly", label)),
    Line::from(vec![
      Span::styled(format!("  {}", format_usd(t.monthly_usd)), value),
      Span::raw("  "),
      Span::styled(format_krw(t.monthly_krw), value),
    ]),
    Line::from(Span::styled("Yearly", label)),
    Line::from(vec![
      Span::styled(format!("  {}", format_usd(t.yearly_usd)), value),
      Span::raw("  "),
      Span::styled(format_krw(t.yearly_krw), value),
    ]),
    Line::from(""),
    Line::from(Span::styled("Share of monthly spend", label)),
  ];

  // Horizontal bars scaled to the pane width.
  let bar_width = inner.width.saturating_sub(8) as usize;
  let mut shares: Vec<_> = snapshot.shares.iter().collect();
  shares.sort_by(|a, b| b.fraction.total_cmp(&a.fraction));
  for share in shares {
    let filled = (share.fraction * bar_width as f64).round() as usize;
    lines.push(Line::from(Span::raw(format!("  {}", share.name))));
    lines.push(Line::from(vec![
      Span::styled(
        format!("  {}", "█".repeat(filled)),
        Style::default().fg(Color::Cyan),
      ),
      Span::styled(
        format!(" {:>3.0}%", share.fraction * 100.0),
        Style::default().fg(Color::Gray),
      ),
    ]));
  }

  f.render_widget(Paragraph::new(lines), inner);
}
