//! One data bag per view, mirrored to durable storage on every mutation

use tracing::{error, info, warn};

use super::LocalStorage;
use crate::constants::storage::VIEWS_KEY;
use crate::error::AppError;
use crate::model::{ViewData, ViewDataMap, ViewName};

pub struct ViewStore {
    views: ViewDataMap,
    storage: LocalStorage,
}

impl ViewStore {
    /// Open the store, restoring whatever the previous session left behind
    pub fn open(storage: LocalStorage) -> Self {
        let views = match storage.get_item(VIEWS_KEY) {
            Ok(Some(contents)) => match serde_json::from_str::<ViewDataMap>(&contents) {
                Ok(views) => {
                    info!("Restored view data from local storage");
                    views
                }
                Err(e) => {
                    warn!(error = %e, "Stored view data is unreadable, starting empty");
                    Self::set_aside(&storage);
                    ViewDataMap::default()
                }
            },
            Ok(None) => ViewDataMap::default(),
            Err(e) => {
                error!(error = ?e, "Failed to read stored view data, starting empty");
                Self::set_aside(&storage);
                ViewDataMap::default()
            }
        };

        Self { views, storage }
    }

    /// The next write would replace the slot, so keep what is there
    fn set_aside(storage: &LocalStorage) {
        if let Err(e) = storage.quarantine(VIEWS_KEY) {
            error!(error = ?e, "Unreadable view data will be overwritten by the next save");
        }
    }

    /// Stored bag for `view` (empty if never set)
    pub fn get(&self, view: ViewName) -> ViewData {
        self.views.get(view).clone()
    }

    /// Replace one bag. Durability is best-effort.
    pub fn set(&mut self, view: ViewName, data: ViewData) {
        self.views.set(view, data);
        self.persist_logged();
    }

    /// All four bags. Callers flush the live view first.
    pub fn get_all(&self) -> &ViewDataMap {
        &self.views
    }

    /// Replace every bag at once
    pub fn set_all(&mut self, views: ViewDataMap) {
        self.views = views;
        self.persist_logged();
    }

    /// Reset to four empty bags and erase the durable slot
    pub fn clear(&mut self) {
        self.views = ViewDataMap::default();
        if let Err(e) = self.storage.remove_item(VIEWS_KEY) {
            warn!(error = ?e, "Failed to erase stored view data");
        }
        info!("Cleared all view data");
    }

    /// Write the whole map to durable storage
    pub fn persist(&self) -> Result<(), AppError> {
        let json = serde_json::to_string(&self.views)
            .map_err(|e| AppError::PersistenceWrite(e.to_string()))?;
        self.storage
            .set_item(VIEWS_KEY, &json)
            .map_err(|e| AppError::PersistenceWrite(format!("{e:#}")))
    }

    /// Periodic and exit-time flush
    pub fn flush(&self) {
        self.persist_logged();
    }

    fn persist_logged(&self) {
        if let Err(e) = self.persist() {
            warn!(error = %e, "View data kept in memory only");
        }
    }

    pub fn storage(&self) -> &LocalStorage {
        &self.storage
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bag(key: &str, value: &str) -> ViewData {
        let mut data = ViewData::new();
        data.set_text(key, value);
        data
    }

    #[test]
    fn test_get_unknown_bag_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = ViewStore::open(LocalStorage::open(dir.path()));
        assert!(store.get(ViewName::Vista2).is_empty());
    }

    #[test]
    fn test_set_persists_and_restores() {
        let dir = tempfile::tempdir().unwrap();
        {
            let mut store = ViewStore::open(LocalStorage::open(dir.path()));
            store.set(ViewName::Vista1, bag("articulo", "A-99"));
        }
        let store = ViewStore::open(LocalStorage::open(dir.path()));
        assert_eq!(store.get(ViewName::Vista1).text("articulo"), Some("A-99"));
    }

    #[test]
    fn test_failed_write_keeps_memory_value() {
        let dir = tempfile::tempdir().unwrap();
        let storage = LocalStorage::open(dir.path()).with_quota(Some(8));
        let mut store = ViewStore::open(storage);

        store.set(ViewName::Vista4, bag("observacionesMuestra", "far too long for the quota"));

        assert_eq!(
            store.get(ViewName::Vista4).text("observacionesMuestra"),
            Some("far too long for the quota")
        );
        assert!(matches!(store.persist(), Err(AppError::PersistenceWrite(_))));
    }

    #[test]
    fn test_clear_resets_and_erases_slot() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = ViewStore::open(LocalStorage::open(dir.path()));
        store.set(ViewName::Vista3, bag("tizada", "T-1"));

        store.clear();

        assert_eq!(store.get_all(), &ViewDataMap::default());
        assert_eq!(store.storage().get_item(VIEWS_KEY).unwrap(), None);
    }

    #[test]
    fn test_get_all_always_has_four_views() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = ViewStore::open(LocalStorage::open(dir.path()));
        store.set(ViewName::Vista2, bag("taller", "Norte"));
        store.clear();
        store.set(ViewName::Vista4, bag("aprobadoPor", "Ana"));

        let json = serde_json::to_value(store.get_all()).unwrap();
        let keys: Vec<&String> = json.as_object().unwrap().keys().collect();
        assert_eq!(keys, vec!["vista1", "vista2", "vista3", "vista4"]);
    }

    #[test]
    fn test_corrupt_slot_starts_empty_and_is_kept_aside() {
        let dir = tempfile::tempdir().unwrap();
        let storage = LocalStorage::open(dir.path());
        storage.set_item(VIEWS_KEY, "{ not json").unwrap();

        let mut store = ViewStore::open(storage);
        assert_eq!(store.get_all(), &ViewDataMap::default());

        store.set(ViewName::Vista1, bag("articulo", "nuevo"));
        let backup = dir.path().join(VIEWS_KEY).with_extension("bak");
        assert_eq!(std::fs::read_to_string(backup).unwrap(), "{ not json");
    }

    #[test]
    fn test_unexpected_values_do_not_discard_the_slot() {
        let dir = tempfile::tempdir().unwrap();
        let storage = LocalStorage::open(dir.path());
        storage
            .set_item(
                VIEWS_KEY,
                r#"{"vista1":{"articulo":"A-99","x":1},"vista2":{},"vista3":{},"vista4":{}}"#,
            )
            .unwrap();

        let mut store = ViewStore::open(storage);
        assert_eq!(store.get(ViewName::Vista1).text("articulo"), Some("A-99"));

        store.set(ViewName::Vista2, bag("taller", "Norte"));
        let restored = ViewStore::open(LocalStorage::open(dir.path()));
        assert_eq!(restored.get(ViewName::Vista1).text("articulo"), Some("A-99"));
        assert_eq!(restored.get(ViewName::Vista2).text("taller"), Some("Norte"));
    }
}
