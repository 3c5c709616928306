//! Bounded per-user search and recently-viewed history.
//!
//! Both lists keep at most [`HISTORY_CAPACITY`] rows per user and hand out the
//! [`HISTORY_PAGE`] most recent. Re-adding an existing item moves it to the
//! front instead of duplicating it.

use super::{HISTORY_CAPACITY, HISTORY_PAGE, Store, now_ms};
use crate::types::{RecentlyViewed, RecordId, SearchHistoryEntry};

/// Drops everything but the `keep` newest rows belonging to `user_id`.
fn trim_user<T>(
    rows: &mut Vec<T>,
    user_id: &str,
    keep: usize,
    owner: fn(&T) -> &str,
    id: fn(&T) -> RecordId,
) {
    let mut ids: Vec<RecordId> = rows
        .iter()
        .filter(|row| owner(row) == user_id)
        .map(id)
        .collect();
    if ids.len() <= keep {
        return;
    }
    ids.sort_unstable_by(|a, b| b.cmp(a));
    let cutoff = ids[keep - 1];
    rows.retain(|row| owner(row) != user_id || id(row) >= cutoff);
}

fn newest<T: Clone>(
    rows: &[T],
    user_id: &str,
    owner: fn(&T) -> &str,
    id: fn(&T) -> RecordId,
) -> Vec<T> {
    let mut out: Vec<T> = rows
        .iter()
        .filter(|row| owner(row) == user_id)
        .cloned()
        .collect();
    out.sort_by_key(|row| std::cmp::Reverse(id(row)));
    out.truncate(HISTORY_PAGE);
    out
}

impl Store {
    /// Records a search query. Blank queries are ignored and return `None`.
    pub fn add_to_search_history(&self, user_id: &str, query: &str) -> Option<RecordId> {
        if query.trim().is_empty() {
            return None;
        }

        let now = now_ms();
        let mut tables = self.tables.write();
        tables
            .search_history
            .retain(|e| !(e.user_id == user_id && e.query == query));

        let id = tables.allocate_id();
        tables.search_history.push(SearchHistoryEntry {
            id,
            user_id: user_id.to_string(),
            query: query.to_string(),
            searched_at: now,
        });
        trim_user(
            &mut tables.search_history,
            user_id,
            HISTORY_CAPACITY,
            |e| e.user_id.as_str(),
            |e| e.id,
        );
        Some(id)
    }

    /// Most recent searches, newest first.
    pub fn search_history(&self, user_id: &str) -> Vec<SearchHistoryEntry> {
        newest(
            &self.tables.read().search_history,
            user_id,
            |e| e.user_id.as_str(),
            |e| e.id,
        )
    }

    /// Forgets every search of a user.
    pub fn clear_search_history(&self, user_id: &str) {
        self.tables
            .write()
            .search_history
            .retain(|e| e.user_id != user_id);
    }

    /// Records that a user opened a series page.
    pub fn add_to_recently_viewed(
        &self,
        user_id: &str,
        manga_slug: &str,
        manga_title: &str,
        manga_image: &str,
    ) -> RecordId {
        let now = now_ms();
        let mut tables = self.tables.write();
        tables
            .recently_viewed
            .retain(|v| !(v.user_id == user_id && v.manga_slug == manga_slug));

        let id = tables.allocate_id();
        tables.recently_viewed.push(RecentlyViewed {
            id,
            user_id: user_id.to_string(),
            manga_slug: manga_slug.to_string(),
            manga_title: manga_title.to_string(),
            manga_image: manga_image.to_string(),
            viewed_at: now,
        });
        trim_user(
            &mut tables.recently_viewed,
            user_id,
            HISTORY_CAPACITY,
            |v| v.user_id.as_str(),
            |v| v.id,
        );
        id
    }

    /// Most recently viewed series, newest first.
    pub fn recently_viewed(&self, user_id: &str) -> Vec<RecentlyViewed> {
        newest(
            &self.tables.read().recently_viewed,
            user_id,
            |v| v.user_id.as_str(),
            |v| v.id,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_queries_are_ignored() {
        let store = Store::in_memory();
        assert!(store.add_to_search_history("u", "   ").is_none());
        assert!(store.search_history("u").is_empty());
    }

    #[test]
    fn repeated_query_moves_to_front() {
        let store = Store::in_memory();
        store.add_to_search_history("u", "berserk");
        store.add_to_search_history("u", "vinland");
        store.add_to_search_history("u", "berserk");

        let queries: Vec<_> = store
            .search_history("u")
            .into_iter()
            .map(|e| e.query)
            .collect();
        assert_eq!(queries, vec!["berserk", "vinland"]);
    }

    #[test]
    fn trimming_only_touches_one_user() {
        let store = Store::in_memory();
        store.add_to_search_history("other", "kept");
        for i in 0..25 {
            store.add_to_search_history("u", &format!("q{i}"));
        }

        let stored = store
            .tables
            .read()
            .search_history
            .iter()
            .filter(|e| e.user_id == "u")
            .count();
        assert_eq!(stored, HISTORY_CAPACITY);
        assert_eq!(store.search_history("other").len(), 1);
    }

    #[test]
    fn recently_viewed_dedupes_caps_and_pages() {
        let store = Store::in_memory();
        store.add_to_recently_viewed("other", "kept", "Kept", "kept.jpg");
        for i in 0..25 {
            store.add_to_recently_viewed("u", &format!("series-{i}"), "Title", "cover.jpg");
        }
        store.add_to_recently_viewed("u", "series-22", "Renamed", "new.jpg");

        let stored: Vec<String> = store
            .tables
            .read()
            .recently_viewed
            .iter()
            .filter(|v| v.user_id == "u")
            .map(|v| v.manga_slug.clone())
            .collect();
        assert_eq!(stored.len(), HISTORY_CAPACITY);
        assert_eq!(stored.iter().filter(|s| *s == "series-22").count(), 1);
        assert!(!stored.iter().any(|s| s == "series-4"));

        let recent = store.recently_viewed("u");
        assert_eq!(recent.len(), HISTORY_PAGE);
        assert_eq!(recent[0].manga_slug, "series-22");
        assert_eq!(recent[0].manga_title, "Renamed");
        assert_eq!(recent[1].manga_slug, "series-24");
        assert_eq!(store.recently_viewed("other").len(), 1);
    }
}
