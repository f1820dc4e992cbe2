//! Application state machine and event dispatcher.

use std::{path::PathBuf, sync::Arc};

use aidash_core::{
  backup::backup_file_name,
  dashboard::{DashboardSnapshot, SubscriptionRow},
  service::{Category, CategoryGroup, NewService, Service, search_services},
  subscription::{Currency, NewSubscription, Period},
};
use chrono::{Local, NaiveDate};
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use fuzzy_matcher::{FuzzyMatcher, skim::SkimMatcherV2};
use strum::IntoEnumIterator;
use uuid::Uuid;

use crate::client::ApiClient;

// ─── Screen ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
  /// Subscription table with the cost summary beside it.
  Subscriptions,
  /// Bookmarks grouped by category.
  Services,
}

impl Screen {
  pub fn title(self) -> &'static str {
    match self {
      Self::Subscriptions => "Subscriptions",
      Self::Services => "Services",
    }
  }

  fn toggled(self) -> Self {
    match self {
      Self::Subscriptions => Self::Services,
      Self::Services => Self::Subscriptions,
    }
  }
}

// ─── Forms ────────────────────────────────────────────────────────────────────

/// Wire names of every variant, in declaration order.
fn choices<E: IntoEnumIterator + AsRef<str>>() -> Vec<String> {
  E::iter().map(|e| e.as_ref().to_owned()).collect()
}

/// One input line of a [`Form`].
#[derive(Debug, Clone, PartialEq)]
pub struct FormField {
  pub label:   &'static str,
  pub value:   String,
  /// When set, the field cycles through these values instead of taking text.
  pub choices: Option<Vec<String>>,
}

impl FormField {
  fn text(label: &'static str, value: impl Into<String>) -> Self {
    Self { label, value: value.into(), choices: None }
  }

  fn choice(label: &'static str, choices: Vec<String>, value: &str) -> Self {
    Self { label, value: value.to_owned(), choices: Some(choices) }
  }

  fn cycle(&mut self, forward: bool) {
    let Some(choices) = &self.choices else { return };
    if choices.is_empty() {
      return;
    }
    let at = choices.iter().position(|c| *c == self.value).unwrap_or(0);
    let next = if forward {
      (at + 1) % choices.len()
    } else {
      (at + choices.len() - 1) % choices.len()
    };
    self.value = choices[next].clone();
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormKind {
  NewSubscription,
  EditSubscription(Uuid),
  NewService,
}

/// A modal input form.
#[derive(Debug, Clone, PartialEq)]
pub struct Form {
  pub kind:   FormKind,
  pub fields: Vec<FormField>,
  pub cursor: usize,
}

impl Form {
  pub fn new_subscription(today: NaiveDate) -> Self {
    Self {
      kind:   FormKind::NewSubscription,
      fields: vec![
        FormField::text("Name", ""),
        FormField::text("Price", ""),
        FormField::choice("Currency", choices::<Currency>(), Currency::Usd.as_ref()),
        FormField::choice("Period", choices::<Period>(), Period::Monthly.as_ref()),
        FormField::text("Start date", today.format("%Y-%m-%d").to_string()),
      ],
      cursor: 0,
    }
  }

  pub fn edit_subscription(row: &SubscriptionRow) -> Self {
    let price = match row.currency {
      Currency::Usd => row.price.usd,
      Currency::Krw => row.price.krw,
    };
    Self {
      kind:   FormKind::EditSubscription(row.subscription_id),
      fields: vec![
        FormField::text("Name", row.name.clone()),
        FormField::text("Price", price.to_string()),
        FormField::choice("Currency", choices::<Currency>(), row.currency.as_ref()),
        FormField::choice("Period", choices::<Period>(), row.period.as_ref()),
        FormField::text(
          "Start date",
          row.start_date.map(|d| d.format("%Y-%m-%d").to_string()).unwrap_or_default(),
        ),
      ],
      cursor: 0,
    }
  }

  pub fn new_service(category: Category) -> Self {
    Self {
      kind:   FormKind::NewService,
      fields: vec![
        FormField::text("Name", ""),
        FormField::text("URL", "https://"),
        FormField::choice("Category", choices::<Category>(), category.as_ref()),
      ],
      cursor: 0,
    }
  }

  pub fn title(&self) -> &'static str {
    match self.kind {
      FormKind::NewSubscription => " Add subscription ",
      FormKind::EditSubscription(_) => " Edit subscription ",
      FormKind::NewService => " Add service ",
    }
  }

  fn value(&self, label: &str) -> &str {
    self
      .fields
      .iter()
      .find(|f| f.label == label)
      .map(|f| f.value.as_str())
      .unwrap_or_default()
  }

  /// Parse and validate the subscription fields.
  pub fn subscription_input(&self) -> Result<NewSubscription, String> {
    let price_text = self.value("Price").trim().replace(',', "");
    let price: f64 = price_text
      .parse()
      .map_err(|_| format!("price {:?} is not a number", self.value("Price")))?;
    let date_text = self.value("Start date").trim();
    let start_date = if date_text.is_empty() {
      None
    } else {
      Some(
        NaiveDate::parse_from_str(date_text, "%Y-%m-%d")
          .map_err(|_| format!("start date {date_text:?} is not YYYY-MM-DD"))?,
      )
    };

    NewSubscription {
      name: self.value("Name").to_owned(),
      price,
      currency: Currency::parse(self.value("Currency")).map_err(|e| e.to_string())?,
      period: Period::parse(self.value("Period")).map_err(|e| e.to_string())?,
      start_date,
    }
    .validate_entry()
    .map_err(|e| e.to_string())
  }

  /// Parse and validate the bookmark fields.
  pub fn service_input(&self) -> Result<NewService, String> {
    let category = Category::parse(self.value("Category")).map_err(|e| e.to_string())?;
    NewService::new(self.value("Name"), self.value("URL"), category)
      .validate()
      .map_err(|e| e.to_string())
  }
}

/// An action waiting for a y/n answer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PendingDelete {
  Subscription { id: Uuid, name: String },
  Service { id: Uuid, name: String },
}

impl PendingDelete {
  pub fn prompt(&self) -> String {
    match self {
      Self::Subscription { name, .. } => format!("Delete subscription {name:?}? [y/N]"),
      Self::Service { name, .. } => format!("Delete service {name:?}? [y/N]"),
    }
  }
}

// ─── App ──────────────────────────────────────────────────────────────────────

/// Top-level application state.
pub struct App {
  /// Current screen / keyboard focus.
  pub screen: Screen,

  /// The latest read model from the server.
  pub snapshot: Option<DashboardSnapshot>,

  /// All bookmarks, in category order.
  pub services: Vec<Service>,

  /// Current filter string; fuzzy on subscriptions, substring on services.
  pub filter: String,

  /// Whether the user is typing a filter query.
  pub filter_active: bool,

  /// Cursor position within the *filtered* subscription rows.
  pub sub_cursor: usize,

  /// Cursor position within the *filtered* services, across groups.
  pub service_cursor: usize,

  /// Open modal form, if any.
  pub form: Option<Form>,

  /// Delete awaiting confirmation, if any.
  pub confirm: Option<PendingDelete>,

  /// One-line status message shown in the status bar.
  pub status_msg: String,

  /// Directory backups are exported to.
  pub export_dir: PathBuf,

  /// Shared HTTP client.
  pub client: Arc<ApiClient>,
}

impl App {
  pub fn new(client: ApiClient, export_dir: PathBuf) -> Self {
    Self {
      screen: Screen::Subscriptions,
      snapshot: None,
      services: Vec::new(),
      filter: String::new(),
      filter_active: false,
      sub_cursor: 0,
      service_cursor: 0,
      form: None,
      confirm: None,
      status_msg: String::new(),
      export_dir,
      client: Arc::new(client),
    }
  }

  // ── Data loading ──────────────────────────────────────────────────────────

  /// Fetch the dashboard and bookmarks from the API.
  pub async fn load(&mut self) -> anyhow::Result<()> {
    self.status_msg = "Loading…".into();
    let loaded = async {
      let snapshot = self.client.dashboard().await?;
      let services = self.client.list_services().await?;
      anyhow::Ok((snapshot, services))
    }
    .await;

    match loaded {
      Ok((snapshot, services)) => {
        self.snapshot = Some(snapshot);
        self.services = services;
        self.clamp_cursors();
        self.status_msg = String::new();
        Ok(())
      }
      Err(e) => {
        self.status_msg = format!("Error: {e}");
        Err(e)
      }
    }
  }

  /// Reload, keeping any message the caller already set.
  async fn reload_quietly(&mut self) {
    let msg = std::mem::take(&mut self.status_msg);
    if self.load().await.is_ok() {
      self.status_msg = msg;
    }
  }

  fn clamp_cursors(&mut self) {
    self.sub_cursor = self.sub_cursor.min(self.filtered_rows().len().saturating_sub(1));
    let services = self.filtered_service_count();
    self.service_cursor = self.service_cursor.min(services.saturating_sub(1));
  }

  // ── Filtered views ────────────────────────────────────────────────────────

  /// Subscription rows matching the current filter query.
  pub fn filtered_rows(&self) -> Vec<&SubscriptionRow> {
    let Some(snapshot) = &self.snapshot else {
      return Vec::new();
    };
    if self.filter.is_empty() || self.screen != Screen::Subscriptions {
      return snapshot.rows.iter().collect();
    }
    let matcher = SkimMatcherV2::default();
    snapshot
      .rows
      .iter()
      .filter(|r| matcher.fuzzy_match(&r.name, &self.filter).is_some())
      .collect()
  }

  /// Bookmarks matching the current filter, grouped by category.
  pub fn service_groups(&self) -> Vec<CategoryGroup<'_>> {
    let term = if self.screen == Screen::Services { self.filter.as_str() } else { "" };
    search_services(&self.services, term)
  }

  fn filtered_service_count(&self) -> usize {
    self.service_groups().iter().map(|g| g.services.len()).sum()
  }

  pub fn cursor_row(&self) -> Option<&SubscriptionRow> {
    self.filtered_rows().get(self.sub_cursor).copied()
  }

  pub fn cursor_service(&self) -> Option<&Service> {
    self
      .service_groups()
      .into_iter()
      .flat_map(|g| g.services)
      .nth(self.service_cursor)
  }

  // ── Key handling ──────────────────────────────────────────────────────────

  /// Process a key event. Returns `true` to continue, `false` to quit.
  pub async fn handle_key(&mut self, key: KeyEvent) -> anyhow::Result<bool> {
    // Global: Ctrl-C quits from anywhere.
    if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
      return Ok(false);
    }

    if self.confirm.is_some() {
      self.handle_confirm_key(key).await;
      return Ok(true);
    }
    if self.form.is_some() {
      self.handle_form_key(key).await;
      return Ok(true);
    }
    if self.filter_active {
      self.handle_filter_key(key);
      return Ok(true);
    }
    self.handle_normal_key(key).await
  }

  fn handle_filter_key(&mut self, key: KeyEvent) {
    match key.code {
      KeyCode::Esc => {
        self.filter_active = false;
        self.filter.clear();
      }
      KeyCode::Enter => self.filter_active = false,
      KeyCode::Backspace => {
        self.filter.pop();
      }
      KeyCode::Char(c) => self.filter.push(c),
      _ => return,
    }
    self.sub_cursor = 0;
    self.service_cursor = 0;
  }

  async fn handle_normal_key(&mut self, key: KeyEvent) -> anyhow::Result<bool> {
    match key.code {
      // Quit
      KeyCode::Char('q') => return Ok(false),

      // Screens
      KeyCode::Tab | KeyCode::BackTab => {
        self.screen = self.screen.toggled();
        self.filter.clear();
      }

      // Navigation
      KeyCode::Down | KeyCode::Char('j') => self.move_cursor(1),
      KeyCode::Up | KeyCode::Char('k') => self.move_cursor(-1),

      // Filter
      KeyCode::Char('/') => {
        self.filter_active = true;
        self.filter.clear();
        self.sub_cursor = 0;
        self.service_cursor = 0;
      }

      // Data
      KeyCode::Char('r') => {
        let _ = self.load().await;
      }
      KeyCode::Char('R') => self.refresh_rate().await,
      KeyCode::Char('x') => self.export().await,

      // Editing
      KeyCode::Char('a') => {
        self.form = Some(match self.screen {
          Screen::Subscriptions => Form::new_subscription(Local::now().date_naive()),
          Screen::Services => Form::new_service(
            self.cursor_service().map(|s| s.category).unwrap_or(Category::Agent),
          ),
        });
      }
      KeyCode::Char('e') | KeyCode::Enter if self.screen == Screen::Subscriptions => {
        if let Some(row) = self.cursor_row() {
          self.form = Some(Form::edit_subscription(row));
        }
      }
      KeyCode::Char('d') | KeyCode::Delete => {
        self.confirm = match self.screen {
          Screen::Subscriptions => self.cursor_row().map(|r| PendingDelete::Subscription {
            id:   r.subscription_id,
            name: r.name.clone(),
          }),
          Screen::Services => self.cursor_service().map(|s| PendingDelete::Service {
            id:   s.service_id,
            name: s.name.clone(),
          }),
        };
      }

      _ => {}
    }
    Ok(true)
  }

  fn move_cursor(&mut self, delta: isize) {
    let len = match self.screen {
      Screen::Subscriptions => self.filtered_rows().len(),
      Screen::Services => self.filtered_service_count(),
    };
    let cursor = match self.screen {
      Screen::Subscriptions => &mut self.sub_cursor,
      Screen::Services => &mut self.service_cursor,
    };
    if len == 0 {
      *cursor = 0;
    } else {
      *cursor = cursor.saturating_add_signed(delta).min(len - 1);
    }
  }

  async fn handle_confirm_key(&mut self, key: KeyEvent) {
    let Some(pending) = self.confirm.take() else { return };
    if !matches!(key.code, KeyCode::Char('y') | KeyCode::Char('Y')) {
      self.status_msg = "Cancelled".into();
      return;
    }

    let result = match &pending {
      PendingDelete::Subscription { id, .. } => self.client.delete_subscription(*id).await,
      PendingDelete::Service { id, .. } => self.client.delete_service(*id).await,
    };
    match result {
      Ok(()) => {
        self.status_msg = "Deleted".into();
        self.reload_quietly().await;
      }
      Err(e) => self.status_msg = format!("Error: {e}"),
    }
  }

  async fn handle_form_key(&mut self, key: KeyEvent) {
    let Some(form) = self.form.as_mut() else { return };
    match key.code {
      KeyCode::Esc => {
        self.form = None;
        return;
      }
      KeyCode::Tab | KeyCode::Down => form.cursor = (form.cursor + 1) % form.fields.len(),
      KeyCode::BackTab | KeyCode::Up => {
        form.cursor = (form.cursor + form.fields.len() - 1) % form.fields.len();
      }
      KeyCode::Left => form.fields[form.cursor].cycle(false),
      KeyCode::Right | KeyCode::Char(' ') if form.fields[form.cursor].choices.is_some() => {
        form.fields[form.cursor].cycle(true);
      }
      KeyCode::Backspace => {
        let field = &mut form.fields[form.cursor];
        if field.choices.is_none() {
          field.value.pop();
        }
      }
      KeyCode::Char(c) => {
        let field = &mut form.fields[form.cursor];
        if field.choices.is_none() {
          field.value.push(c);
        }
      }
      KeyCode::Enter => {
        let form = form.clone();
        self.submit(form).await;
      }
      _ => {}
    }
  }

  /// Send a completed form. On a validation or server error the form stays
  /// open and the message is shown in the status bar.
  async fn submit(&mut self, form: Form) {
    let outcome = match form.kind {
      FormKind::NewSubscription | FormKind::EditSubscription(_) => {
        match form.subscription_input() {
          Err(msg) => Err(msg),
          Ok(input) => {
            let sent = match form.kind {
              FormKind::EditSubscription(id) => {
                self.client.update_subscription(id, &input).await.map(|s| s.name)
              }
              _ => self.client.add_subscription(&input).await.map(|s| s.name),
            };
            sent.map_err(|e| e.to_string())
          }
        }
      }
      FormKind::NewService => match form.service_input() {
        Err(msg) => Err(msg),
        Ok(input) => self
          .client
          .add_service(&input)
          .await
          .map(|s| s.name)
          .map_err(|e| e.to_string()),
      },
    };

    match outcome {
      Ok(name) => {
        self.form = None;
        self.status_msg = format!("Saved {name}");
        self.reload_quietly().await;
      }
      Err(msg) => self.status_msg = format!("Error: {msg}"),
    }
  }

  async fn refresh_rate(&mut self) {
    self.status_msg = "Refreshing exchange rate…".into();
    match self.client.refresh_rate().await {
      Ok(snapshot) => {
        self.status_msg = format!(
          "₩{:.2} per $1 ({})",
          snapshot.rate.krw_per_usd(),
          rate_origin_label(&snapshot)
        );
        self.reload_quietly().await;
      }
      Err(e) => self.status_msg = format!("Error: {e}"),
    }
  }

  async fn export(&mut self) {
    let path = self.export_dir.join(backup_file_name(Local::now().date_naive()));
    let written = async {
      let document = self.client.export().await?;
      tokio::fs::write(&path, document).await?;
      anyhow::Ok(())
    }
    .await;
    self.status_msg = match written {
      Ok(()) => format!("Exported to {}", path.display()),
      Err(e) => format!("Error: {e}"),
    };
  }
}

/// Human wording for where a rate came from.
pub fn rate_origin_label(snapshot: &aidash_core::rate::RateSnapshot) -> String {
  use aidash_core::rate::RateOrigin;
  match (snapshot.origin, snapshot.updated_at) {
    (RateOrigin::Live, Some(at)) => {
      format!("live, {}", at.with_timezone(&Local).format("%Y-%m-%d %H:%M"))
    }
    (RateOrigin::Cached, Some(at)) => {
      format!("cached from {}", at.with_timezone(&Local).format("%Y-%m-%d %H:%M"))
    }
    (RateOrigin::Default, _) | (_, None) => "default".to_owned(),
  }
}
