//! Services screen: bookmarks grouped by category.

use ratatui::{
  Frame,
  layout::{Constraint, Direction, Layout, Rect},
  style::{Color, Modifier, Style},
  text::{Line, Span},
  widgets::{Block, Borders, List, ListItem, ListState, Paragraph},
};

use crate::app::App;

/// Render the services screen into `area`.
pub fn draw(f: &mut Frame, area: Rect, app: &App) {
  let cols = Layout::default()
    .direction(Direction::Horizontal)
    .constraints([Constraint::Percentage(45), Constraint::Percentage(55)])
    .split(area);

  draw_list(f, cols[0], app);
  draw_detail(f, cols[1], app);
}

fn draw_list(f: &mut Frame, area: Rect, app: &App) {
  let groups = app.service_groups();
  let shown: usize = groups.iter().map(|g| g.services.len()).sum();

  let title = if app.filter_active || !app.filter.is_empty() {
    format!(" Services ({}/{}) ", shown, app.services.len())
  } else {
    format!(" Services ({}) ", app.services.len())
  };
  let block = Block::default()
    .title(title)
    .borders(Borders::ALL)
    .border_style(Style::default().fg(Color::DarkGray));

  let mut inner = block.inner(area);
  f.render_widget(block, area);
  super::draw_filter_line(f, &mut inner, app);

  if groups.is_empty() {
    f.render_widget(
      Paragraph::new("No services found.").style(Style::default().fg(Color::DarkGray)),
      inner,
    );
    return;
  }

  // Category headings are list items too, so the selected index has to skip
  // them.
  let mut items = Vec::new();
  let mut selected = None;
  let mut index = 0;
  for group in &groups {
    items.push(ListItem::new(Line::from(Span::styled(
      group.category.title(),
      Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
    ))));
    for service in &group.services {
      if index == app.service_cursor {
        selected = Some(items.len());
      }
      items.push(ListItem::new(Line::from(format!("  {}", service.name))));
      index += 1;
    }
  }

  let mut state = ListState::default();
  state.select(selected);

  f.render_stateful_widget(
    List::new(items).highlight_style(
      Style::default()
        .bg(Color::Blue)
        .fg(Color::White)
        .add_modifier(Modifier::BOLD),
    ),
    inner,
    &mut state,
  );
}

fn draw_detail(f: &mut Frame, area: Rect, app: &App) {
  let Some(service) = app.cursor_service() else {
    let block = Block::default()
      .title(" Detail ")
      .borders(Borders::ALL)
      .border_style(Style::default().fg(Color::DarkGray));
    f.render_widget(block, area);
    return;
  };

  let block = Block::default()
    .title(format!(" {} ", service.name))
    .borders(Borders::ALL)
    .border_style(Style::default().fg(Color::DarkGray));
  let inner = block.inner(area);
  f.render_widget(block, area);

  let label = Style::default().fg(Color::DarkGray);
  let mut lines = vec![
    Line::from(vec![
      Span::styled("Category  ", label),
      Span::raw(service.category.title()),
    ]),
    Line::from(vec![
      Span::styled("URL       ", label),
      Span::styled(
        service.url.clone(),
        Style::default().fg(Color::Cyan).add_modifier(Modifier::UNDERLINED),
      ),
    ]),
  ];
  if let Some(icon) = service.favicon_url() {
    lines.push(Line::from(vec![
      Span::styled("Icon      ", label),
      Span::styled(icon, Style::default().fg(Color::Gray)),
    ]));
  }

  f.render_widget(Paragraph::new(lines), inner);
}
