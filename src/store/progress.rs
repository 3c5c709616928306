//! Per-chapter reading progress.

use super::{Store, newest_first, now_ms};
use crate::types::{ReadingProgress, RecordId};

/// Page position reported by the reader.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageUpdate {
    pub current_page: u32,
    pub total_pages: u32,
    pub is_completed: bool,
}

impl Store {
    /// Upserts the progress row for one chapter and stamps `read_at`.
    pub fn update_reading_progress(
        &self,
        user_id: &str,
        manga_slug: &str,
        chapter_slug: &str,
        update: PageUpdate,
    ) -> RecordId {
        let now = now_ms();
        let mut tables = self.tables.write();

        if let Some(row) = tables.reading_progress.iter_mut().find(|p| {
            p.user_id == user_id && p.manga_slug == manga_slug && p.chapter_slug == chapter_slug
        }) {
            row.current_page = update.current_page;
            row.total_pages = update.total_pages;
            row.is_completed = update.is_completed;
            row.read_at = now;
            return row.id;
        }

        let id = tables.allocate_id();
        tables.reading_progress.push(ReadingProgress {
            id,
            user_id: user_id.to_string(),
            manga_slug: manga_slug.to_string(),
            chapter_slug: chapter_slug.to_string(),
            current_page: update.current_page,
            total_pages: update.total_pages,
            is_completed: update.is_completed,
            read_at: now,
        });
        id
    }

    /// Progress within one chapter, if the user has opened it.
    pub fn reading_progress(
        &self,
        user_id: &str,
        manga_slug: &str,
        chapter_slug: &str,
    ) -> Option<ReadingProgress> {
        self.tables
            .read()
            .reading_progress
            .iter()
            .find(|p| {
                p.user_id == user_id && p.manga_slug == manga_slug && p.chapter_slug == chapter_slug
            })
            .cloned()
    }

    /// Progress rows for every chapter of a manga, newest first.
    pub fn manga_progress(&self, user_id: &str, manga_slug: &str) -> Vec<ReadingProgress> {
        let rows = self
            .tables
            .read()
            .reading_progress
            .iter()
            .filter(|p| p.user_id == user_id && p.manga_slug == manga_slug)
            .cloned()
            .collect();
        newest_first(rows, |p: &ReadingProgress| p.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn upsert_updates_existing_row() {
        let store = Store::in_memory();
        let update = PageUpdate {
            current_page: 3,
            total_pages: 40,
            is_completed: false,
        };
        let id = store.update_reading_progress("u", "m", "c1", update);
        let again = store.update_reading_progress(
            "u",
            "m",
            "c1",
            PageUpdate {
                current_page: 40,
                is_completed: true,
                ..update
            },
        );

        assert_eq!(id, again);
        let row = store.reading_progress("u", "m", "c1").unwrap();
        assert_eq!(row.current_page, 40);
        assert!(row.is_completed);
        assert_eq!(store.manga_progress("u", "m").len(), 1);
    }
}
