//! Bookmarked AI-tool links, grouped by category.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumIter, EnumString, IntoEnumIterator, IntoStaticStr};
use url::Url;
use uuid::Uuid;

use crate::{Error, Result};

// ─── Category ────────────────────────────────────────────────────────────────

/// The tab a bookmark is shown under. Variant order is display order.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  PartialOrd,
  Ord,
  Hash,
  Serialize,
  Deserialize,
  Display,
  EnumString,
  AsRefStr,
  EnumIter,
  IntoStaticStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum Category {
  Agent,
  Image,
  Video,
  Tts,
  Music,
  Editing,
}

impl Category {
  pub fn title(self) -> &'static str {
    match self {
      Self::Agent => "AI Agents",
      Self::Image => "Image Generation",
      Self::Video => "Video Generation",
      Self::Tts => "Text to Speech",
      Self::Music => "Music",
      Self::Editing => "Editing",
    }
  }

  pub fn parse(s: &str) -> Result<Self> {
    s.trim()
      .parse()
      .map_err(|_| Error::UnknownCategory(s.to_owned()))
  }
}

// ─── Service ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Service {
  pub service_id: Uuid,
  pub name:       String,
  pub url:        String,
  pub category:   Category,
  pub created_at: DateTime<Utc>,
}

impl Service {
  pub fn favicon_url(&self) -> Option<String> { favicon_url(&self.url) }
}

/// Input for [`crate::store::DashboardStore::add_service`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewService {
  pub name:     String,
  pub url:      String,
  pub category: Category,
}

impl NewService {
  pub fn new(
    name: impl Into<String>,
    url: impl Into<String>,
    category: Category,
  ) -> Self {
    Self { name: name.into(), url: url.into(), category }
  }

  /// Trim both fields and require an absolute http(s) URL.
  pub fn validate(self) -> Result<Self> {
    let name = self.name.trim().to_owned();
    let url = self.url.trim().to_owned();
    if name.is_empty() {
      return Err(Error::EmptyName);
    }

    let parsed = Url::parse(&url).map_err(|e| Error::InvalidUrl {
      url:    url.clone(),
      reason: e.to_string(),
    })?;
    if !matches!(parsed.scheme(), "http" | "https") {
      return Err(Error::InvalidUrl {
        url,
        reason: format!("unsupported scheme {:?}", parsed.scheme()),
      });
    }

    Ok(Self { name, url, category: self.category })
  }

  pub fn into_service(self, service_id: Uuid, created_at: DateTime<Utc>) -> Service {
    Service {
      service_id,
      name: self.name,
      url: self.url,
      category: self.category,
      created_at,
    }
  }
}

/// Google's favicon endpoint for the URL's host, or `None` if there is no host.
pub fn favicon_url(url: &str) -> Option<String> {
  let parsed = Url::parse(url).ok()?;
  let host = parsed.host_str()?;
  Some(format!("https://www.google.com/s2/favicons?domain={host}&sz=32"))
}

// ─── Default catalogue ───────────────────────────────────────────────────────

/// Bookmarks seeded into an empty store.
pub fn default_catalogue() -> Vec<NewService> {
  use Category::*;
  [
    ("Manus", "https://manus.im", Agent),
    ("ChatGPT", "https://chat.openai.com", Agent),
    ("Gemini", "https://gemini.google.com", Agent),
    ("Flowith", "https://flowith.io/blank", Agent),
    ("Higgsfield", "https://higgsfield.ai/", Image),
    ("Midjourney", "https://midjourney.com", Image),
    ("Google AI Studio", "https://aistudio.google.com", Image),
    ("Higgsfield", "https://higgsfield.ai/", Video),
    ("Flow", "https://labs.google/fx/ko/tools/flow", Video),
    ("Sora 2", "https://openai.com/sora", Video),
    ("Meme Gen", "https://meme-gen.ai/", Video),
    ("Wan", "https://wan.video/", Video),
    ("TopView", "https://www.topview.ai/", Video),
    ("Hailuo", "https://hailuoai.video/", Video),
    ("Runway", "https://runwayml.com/", Video),
    ("MiniMax Audio", "https://www.minimax.io/audio", Tts),
    ("Suno", "https://suno.ai", Music),
    ("CapCut", "https://capcut.com", Editing),
    ("Vrew", "https://vrew.ai/ko/try/index.html", Editing),
    ("Edimakor", "https://edimakor.hitpaw.kr/", Editing),
  ]
  .into_iter()
  .map(|(name, url, category)| NewService::new(name, url, category))
  .collect()
}

// ─── Search ──────────────────────────────────────────────────────────────────

/// Services of one category that matched a search.
#[derive(Debug, Clone, Serialize)]
pub struct CategoryGroup<'a> {
  pub category: Category,
  pub services: Vec<&'a Service>,
}

/// Case-insensitive substring search over service names, grouped by category
/// in display order. Categories with no match are omitted; a blank term
/// matches everything.
pub fn search_services<'a>(services: &'a [Service], term: &str) -> Vec<CategoryGroup<'a>> {
  let needle = term.trim().to_lowercase();
  Category::iter()
    .filter_map(|category| {
      let matched: Vec<&Service> = services
        .iter()
        .filter(|s| s.category == category)
        .filter(|s| needle.is_empty() || s.name.to_lowercase().contains(&needle))
        .collect();
      (!matched.is_empty()).then_some(CategoryGroup { category, services: matched })
    })
    .collect()
}
