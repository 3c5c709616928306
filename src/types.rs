//! Core data types for user state and catalog parameters.
//!
//! - [`LibraryEntry`] - A manga a user has shelved, with its [`ReadingStatus`]
//! - [`ReadingProgress`] - Page position within one chapter
//! - [`UserPreferences`] / [`PreferencesPatch`] - Reader and app settings
//! - [`SearchHistoryEntry`] / [`RecentlyViewed`] - Bounded per-user history
//! - [`BrowseKind`] - Catalog browse categories
//!
//! Field names serialize in camelCase so snapshots stay readable by the
//! hosted document store's tooling.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::Error;

/// Unix timestamp in milliseconds.
pub type Millis = i64;

/// Identifier of a stored record, unique across all tables of a store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordId(pub u64);

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Shelf a library entry sits on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReadingStatus {
    Reading,
    WantToRead,
    Completed,
    Dropped,
}

impl ReadingStatus {
    pub const ALL: [ReadingStatus; 4] = [
        ReadingStatus::Reading,
        ReadingStatus::WantToRead,
        ReadingStatus::Completed,
        ReadingStatus::Dropped,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ReadingStatus::Reading => "reading",
            ReadingStatus::WantToRead => "want_to_read",
            ReadingStatus::Completed => "completed",
            ReadingStatus::Dropped => "dropped",
        }
    }
}

impl FromStr for ReadingStatus {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ReadingStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| Error::invalid_input(format!("unknown reading status: {s}")))
    }
}

impl fmt::Display for ReadingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A manga in a user's library.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LibraryEntry {
    pub id: RecordId,
    pub user_id: String,
    pub manga_slug: String,
    pub status: ReadingStatus,
    pub added_at: Millis,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_read_at: Option<Millis>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_chapter: Option<String>,
    pub is_favorite: bool,
}

/// Per-user library totals.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LibraryStats {
    pub reading: usize,
    pub want_to_read: usize,
    pub completed: usize,
    pub dropped: usize,
    pub favorites: usize,
}

impl LibraryStats {
    pub fn total(&self) -> usize {
        self.reading + self.want_to_read + self.completed + self.dropped
    }
}

/// Where a user is inside one chapter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReadingProgress {
    pub id: RecordId,
    pub user_id: String,
    pub manga_slug: String,
    pub chapter_slug: String,
    pub current_page: u32,
    pub total_pages: u32,
    pub is_completed: bool,
    pub read_at: Millis,
}

impl ReadingProgress {
    /// Fraction of the chapter read, in `[0, 1]`.
    pub fn fraction(&self) -> f64 {
        if self.is_completed {
            return 1.0;
        }
        if self.total_pages == 0 {
            return 0.0;
        }
        (f64::from(self.current_page) / f64::from(self.total_pages)).clamp(0.0, 1.0)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Theme {
    Light,
    Dark,
    #[default]
    Auto,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReadingMode {
    #[default]
    Vertical,
    Horizontal,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DownloadQuality {
    #[default]
    High,
    Medium,
    Low,
}

/// Reader and app settings for one user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserPreferences {
    pub theme: Theme,
    pub reading_mode: ReadingMode,
    pub auto_scroll: bool,
    pub brightness: f64,
    pub page_sound: bool,
    pub notifications: bool,
    pub download_quality: DownloadQuality,
}

impl Default for UserPreferences {
    fn default() -> Self {
        Self {
            theme: Theme::Auto,
            reading_mode: ReadingMode::Vertical,
            auto_scroll: false,
            brightness: 1.0,
            page_sound: true,
            notifications: true,
            download_quality: DownloadQuality::High,
        }
    }
}

/// Partial preferences update; `None` fields keep their current value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PreferencesPatch {
    pub theme: Option<Theme>,
    pub reading_mode: Option<ReadingMode>,
    pub auto_scroll: Option<bool>,
    pub brightness: Option<f64>,
    pub page_sound: Option<bool>,
    pub notifications: Option<bool>,
    pub download_quality: Option<DownloadQuality>,
}

impl PreferencesPatch {
    /// Merges this patch onto `base`. Brightness is clamped to `[0, 1]`.
    pub fn apply_to(&self, base: &mut UserPreferences) {
        if let Some(theme) = self.theme {
            base.theme = theme;
        }
        if let Some(mode) = self.reading_mode {
            base.reading_mode = mode;
        }
        if let Some(auto_scroll) = self.auto_scroll {
            base.auto_scroll = auto_scroll;
        }
        if let Some(brightness) = self.brightness.filter(|b| b.is_finite()) {
            base.brightness = brightness.clamp(0.0, 1.0);
        }
        if let Some(page_sound) = self.page_sound {
            base.page_sound = page_sound;
        }
        if let Some(notifications) = self.notifications {
            base.notifications = notifications;
        }
        if let Some(quality) = self.download_quality {
            base.download_quality = quality;
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchHistoryEntry {
    pub id: RecordId,
    pub user_id: String,
    pub query: String,
    pub searched_at: Millis,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecentlyViewed {
    pub id: RecordId,
    pub user_id: String,
    pub manga_slug: String,
    pub manga_title: String,
    pub manga_image: String,
    pub viewed_at: Millis,
}

/// Catalog browse category.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BrowseKind {
    #[default]
    Manga,
    Manhwa,
    Manhua,
}

impl BrowseKind {
    pub fn as_str(self) -> &'static str {
        match self {
            BrowseKind::Manga => "manga",
            BrowseKind::Manhwa => "manhwa",
            BrowseKind::Manhua => "manhua",
        }
    }
}

impl FromStr for BrowseKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "manga" => Ok(BrowseKind::Manga),
            "manhwa" => Ok(BrowseKind::Manhwa),
            "manhua" => Ok(BrowseKind::Manhua),
            other => Err(Error::invalid_input(format!("unknown browse kind: {other}"))),
        }
    }
}

impl fmt::Display for BrowseKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_round_trips_through_str() {
        for status in ReadingStatus::ALL {
            assert_eq!(status.as_str().parse::<ReadingStatus>().unwrap(), status);
        }
        assert!("paused".parse::<ReadingStatus>().is_err());
    }

    #[test]
    fn status_serializes_snake_case() {
        let json = serde_json::to_string(&ReadingStatus::WantToRead).unwrap();
        assert_eq!(json, "\"want_to_read\"");
    }

    #[test]
    fn patch_keeps_explicit_false() {
        let mut prefs = UserPreferences::default();
        let patch = PreferencesPatch {
            page_sound: Some(false),
            notifications: Some(false),
            brightness: Some(3.0),
            ..Default::default()
        };
        patch.apply_to(&mut prefs);

        assert!(!prefs.page_sound);
        assert!(!prefs.notifications);
        assert_eq!(prefs.brightness, 1.0);
        assert_eq!(prefs.theme, Theme::Auto);
    }

    #[test]
    fn progress_fraction_is_clamped() {
        let progress = ReadingProgress {
            id: RecordId(1),
            user_id: "u".into(),
            manga_slug: "m".into(),
            chapter_slug: "c".into(),
            current_page: 12,
            total_pages: 10,
            is_completed: false,
            read_at: 0,
        };
        assert_eq!(progress.fraction(), 1.0);
    }

    #[test]
    fn browse_kind_parses_case_insensitively() {
        assert_eq!("Manhwa".parse::<BrowseKind>().unwrap(), BrowseKind::Manhwa);
        assert_eq!(BrowseKind::default().as_str(), "manga");
    }
}
