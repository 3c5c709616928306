//! Library shelf operations.

use tracing::debug;

use super::{Store, newest_first, now_ms};
use crate::types::{LibraryEntry, LibraryStats, ReadingStatus, RecordId};

fn matches(entry: &LibraryEntry, user_id: &str, manga_slug: &str) -> bool {
    entry.user_id == user_id && entry.manga_slug == manga_slug
}

impl Store {
    /// Shelves a manga, or moves it to `status` if already shelved.
    ///
    /// Re-shelving also stamps `last_read_at`. New entries start unfavourited.
    pub fn add_to_library(
        &self,
        user_id: &str,
        manga_slug: &str,
        status: ReadingStatus,
    ) -> RecordId {
        let now = now_ms();
        let mut tables = self.tables.write();

        if let Some(entry) = tables
            .library
            .iter_mut()
            .find(|e| matches(e, user_id, manga_slug))
        {
            entry.status = status;
            entry.last_read_at = Some(now);
            debug!(user_id, manga_slug, %status, "library entry updated");
            return entry.id;
        }

        let id = tables.allocate_id();
        tables.library.push(LibraryEntry {
            id,
            user_id: user_id.to_string(),
            manga_slug: manga_slug.to_string(),
            status,
            added_at: now,
            last_read_at: None,
            current_chapter: None,
            is_favorite: false,
        });
        debug!(user_id, manga_slug, %status, "library entry added");
        id
    }

    /// Removes a manga from the library. Returns whether it was shelved.
    pub fn remove_from_library(&self, user_id: &str, manga_slug: &str) -> bool {
        let mut tables = self.tables.write();
        let before = tables.library.len();
        tables.library.retain(|e| !matches(e, user_id, manga_slug));
        before != tables.library.len()
    }

    /// Flips the favourite flag and returns the new value.
    ///
    /// Returns `false` without creating anything when the manga is not shelved.
    pub fn toggle_favorite(&self, user_id: &str, manga_slug: &str) -> bool {
        let mut tables = self.tables.write();
        match tables
            .library
            .iter_mut()
            .find(|e| matches(e, user_id, manga_slug))
        {
            Some(entry) => {
                entry.is_favorite = !entry.is_favorite;
                entry.is_favorite
            }
            None => false,
        }
    }

    /// Records the chapter most recently opened for a shelved manga.
    ///
    /// Returns `false` when the manga is not shelved.
    pub fn set_current_chapter(&self, user_id: &str, manga_slug: &str, chapter_slug: &str) -> bool {
        let now = now_ms();
        let mut tables = self.tables.write();
        match tables
            .library
            .iter_mut()
            .find(|e| matches(e, user_id, manga_slug))
        {
            Some(entry) => {
                entry.current_chapter = Some(chapter_slug.to_string());
                entry.last_read_at = Some(now);
                true
            }
            None => false,
        }
    }

    /// All entries of a user, newest first.
    pub fn user_library(&self, user_id: &str) -> Vec<LibraryEntry> {
        let rows = self
            .tables
            .read()
            .library
            .iter()
            .filter(|e| e.user_id == user_id)
            .cloned()
            .collect();
        newest_first(rows, |e: &LibraryEntry| e.id)
    }

    /// Entries of a user on one shelf, newest first.
    pub fn library_by_status(&self, user_id: &str, status: ReadingStatus) -> Vec<LibraryEntry> {
        let rows = self
            .tables
            .read()
            .library
            .iter()
            .filter(|e| e.user_id == user_id && e.status == status)
            .cloned()
            .collect();
        newest_first(rows, |e: &LibraryEntry| e.id)
    }

    /// The entry for one manga, if shelved.
    pub fn library_entry(&self, user_id: &str, manga_slug: &str) -> Option<LibraryEntry> {
        self.tables
            .read()
            .library
            .iter()
            .find(|e| matches(e, user_id, manga_slug))
            .cloned()
    }

    /// Per-shelf counts for a user.
    pub fn library_stats(&self, user_id: &str) -> LibraryStats {
        let tables = self.tables.read();
        let mut stats = LibraryStats::default();
        for entry in tables.library.iter().filter(|e| e.user_id == user_id) {
            match entry.status {
                ReadingStatus::Reading => stats.reading += 1,
                ReadingStatus::WantToRead => stats.want_to_read += 1,
                ReadingStatus::Completed => stats.completed += 1,
                ReadingStatus::Dropped => stats.dropped += 1,
            }
            if entry.is_favorite {
                stats.favorites += 1;
            }
        }
        stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn upsert_keeps_one_entry_per_manga() {
        let store = Store::in_memory();
        let first = store.add_to_library("u", "berserk", ReadingStatus::WantToRead);
        let second = store.add_to_library("u", "berserk", ReadingStatus::Reading);

        assert_eq!(first, second);
        let library = store.user_library("u");
        assert_eq!(library.len(), 1);
        assert_eq!(library[0].status, ReadingStatus::Reading);
        assert!(library[0].last_read_at.is_some());
    }

    #[test]
    fn new_entries_have_no_last_read() {
        let store = Store::in_memory();
        store.add_to_library("u", "vagabond", ReadingStatus::Reading);
        let entry = store.library_entry("u", "vagabond").unwrap();
        assert!(entry.last_read_at.is_none());
        assert!(!entry.is_favorite);
    }

    #[test]
    fn toggle_favorite_on_missing_entry_is_false() {
        let store = Store::in_memory();
        assert!(!store.toggle_favorite("u", "ghost"));
        assert!(store.user_library("u").is_empty());
    }

    #[test]
    fn set_current_chapter_requires_entry() {
        let store = Store::in_memory();
        assert!(!store.set_current_chapter("u", "m", "c1"));
        store.add_to_library("u", "m", ReadingStatus::Reading);
        assert!(store.set_current_chapter("u", "m", "c1"));
        assert_eq!(
            store.library_entry("u", "m").unwrap().current_chapter.as_deref(),
            Some("c1")
        );
    }
}
