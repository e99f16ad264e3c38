use crate::Result;
use serde_json::Value;
use std::fs::{create_dir_all, write};
use std::path::PathBuf;
use strum::IntoEnumIterator;

/// Category directories under the data dir
#[derive(Clone, Copy, Debug, PartialEq, Eq, strum::Display, strum::EnumString, strum::EnumIter)]
pub enum CacheDir {
    #[strum(serialize = "parkings")]
    Parkings,
    #[strum(serialize = "fuel")]
    Fuel,
}

/// One pretty-printed JSON file per feature, `<root>/<dir>/<id>.json`.
/// Writes overwrite, there is no expiry and no locking.
pub struct Cache {
    root: PathBuf,
}

impl Cache {
    pub fn new(root: impl Into<PathBuf>) -> Cache {
        Cache { root: root.into() }
    }

    pub fn ensure_dirs(&self) -> Result<()> {
        for dir in CacheDir::iter() {
            create_dir_all(self.root.join(dir.to_string()))?;
        }
        Ok(())
    }

    pub fn save(&self, dir: CacheDir, id: &str, feature: &Value) -> Result<PathBuf> {
        let path = self.file_path(dir, &file_stem(id));
        write(&path, serde_json::to_string_pretty(feature)?)?;
        Ok(path)
    }

    /// Path of a cached entry, `None` for ids which would point outside of
    /// the category dir
    pub fn lookup(&self, dir: CacheDir, id: &str) -> Option<PathBuf> {
        if id.is_empty() || id.contains(['/', '\\', '\0']) {
            return None;
        }
        Some(self.file_path(dir, id))
    }

    fn file_path(&self, dir: CacheDir, stem: &str) -> PathBuf {
        self.root.join(dir.to_string()).join(format!("{stem}.json"))
    }
}

fn file_stem(id: &str) -> String {
    id.replace(['/', '\\', '\0'], "_")
}
