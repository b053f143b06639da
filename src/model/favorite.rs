//! The single favorite track, persisted as JSON

use std::fs;
use std::path::PathBuf;

use crate::error::DrawerError;
use super::types::Track;

/// Holds at most one favorite. Saving overwrites whatever was there.
#[derive(Clone, Debug)]
pub struct FavoriteStore {
    path: PathBuf,
}

impl FavoriteStore {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    /// Read the stored favorite. Missing or unreadable records yield `None`.
    pub fn load(&self) -> Option<Track> {
        match self.try_load() {
            Ok(favorite) => favorite,
            Err(e) => {
                tracing::warn!(path = %self.path.display(), error = %e, "Ignoring unreadable favorite");
                None
            }
        }
    }

    fn try_load(&self) -> Result<Option<Track>, DrawerError> {
        if !self.path.exists() {
            return Ok(None);
        }
        let content = fs::read_to_string(&self.path)?;
        Ok(Some(serde_json::from_str(&content)?))
    }

    pub fn save(&self, track: &Track) -> Result<(), DrawerError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        fs::write(&self.path, serde_json::to_string(track)?)?;
        tracing::info!(track_id = %track.id, name = %track.name, "Saved favorite");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::fixtures::track;
    use tempfile::tempdir;

    #[test]
    fn missing_favorite_is_none() {
        let dir = tempdir().unwrap();
        assert!(FavoriteStore::new(dir.path().join("selected_song.json")).load().is_none());
    }

    #[test]
    fn saved_favorite_reloads_identically() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("cache").join("selected_song.json");
        let favorite = track("69kOkLUCkxIZYexIgSG8rq", "Get Lucky");

        FavoriteStore::new(path.clone()).save(&favorite).unwrap();

        // A fresh store stands in for the next startup
        assert_eq!(FavoriteStore::new(path).load(), Some(favorite));
    }

    #[test]
    fn saving_overwrites_instead_of_merging() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("selected_song.json");
        let store = FavoriteStore::new(path.clone());

        store.save(&track("1", "First")).unwrap();
        store.save(&track("2", "Second")).unwrap();

        let raw: serde_json::Value = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert!(raw.is_object(), "exactly one record is stored");
        assert_eq!(store.load().unwrap().id, "2");
    }

    #[test]
    fn corrupt_favorite_is_ignored() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("selected_song.json");
        fs::write(&path, "{ broken").unwrap();
        assert!(FavoriteStore::new(path).load().is_none());
    }
}
