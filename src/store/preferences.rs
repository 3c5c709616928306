//! User preferences with defaults.

use super::{PreferencesRecord, Store};
use crate::types::{PreferencesPatch, RecordId, UserPreferences};

impl Store {
    /// Stored preferences, or [`UserPreferences::default`] if none were saved.
    pub fn user_preferences(&self, user_id: &str) -> UserPreferences {
        self.tables
            .read()
            .user_preferences
            .iter()
            .find(|r| r.user_id == user_id)
            .map(|r| r.preferences.clone())
            .unwrap_or_default()
    }

    /// Merges `patch` onto the stored (or default) preferences.
    pub fn update_user_preferences(&self, user_id: &str, patch: &PreferencesPatch) -> RecordId {
        let mut tables = self.tables.write();

        if let Some(record) = tables
            .user_preferences
            .iter_mut()
            .find(|r| r.user_id == user_id)
        {
            patch.apply_to(&mut record.preferences);
            return record.id;
        }

        let mut preferences = UserPreferences::default();
        patch.apply_to(&mut preferences);
        let id = tables.allocate_id();
        tables.user_preferences.push(PreferencesRecord {
            id,
            user_id: user_id.to_string(),
            preferences,
        });
        id
    }
}
