use std::collections::BTreeMap;

use crate::core::{EngineError, Result};

/// Named blobs holding serialized save records.
pub trait SlotStore {
    /// Create or overwrite `name`.
    fn write(&mut self, name: &str, data: &str) -> Result<()>;
    /// `NotFound` when the slot does not exist.
    fn read(&self, name: &str) -> Result<String>;
    /// Slot names, sorted.
    fn list(&self) -> Result<Vec<String>>;
}

/// Reject names that cannot be used as a slot key (and never as a path).
pub fn check_slot_name(name: &str) -> Result<()> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(EngineError::InvalidName(name.to_string()));
    }
    let path_like = trimmed == "."
        || trimmed == ".."
        || name.chars().any(|c| matches!(c, '/' | '\\' | ':' | '\0') || c.is_control());
    if path_like || trimmed != name {
        return Err(EngineError::InvalidName(name.to_string()));
    }
    Ok(())
}

/// In-memory store; the browser facade mirrors it into `localStorage`.
#[derive(Clone, Debug, Default)]
pub struct MemorySlotStore {
    slots: BTreeMap<String, String>,
}

impl MemorySlotStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn remove(&mut self, name: &str) -> bool {
        self.slots.remove(name).is_some()
    }
}

impl SlotStore for MemorySlotStore {
    fn write(&mut self, name: &str, data: &str) -> Result<()> {
        check_slot_name(name)?;
        self.slots.insert(name.to_string(), data.to_string());
        Ok(())
    }

    fn read(&self, name: &str) -> Result<String> {
        self.slots
            .get(name)
            .cloned()
            .ok_or_else(|| EngineError::NotFound(name.to_string()))
    }

    fn list(&self) -> Result<Vec<String>> {
        Ok(self.slots.keys().cloned().collect())
    }
}

#[cfg(not(target_arch = "wasm32"))]
pub use dir::DirSlotStore;

#[cfg(not(target_arch = "wasm32"))]
mod dir {
    use std::fs;
    use std::io::ErrorKind;
    use std::path::{Path, PathBuf};

    use super::{check_slot_name, SlotStore};
    use crate::core::{EngineError, Result};

    const EXTENSION: &str = "json";

    /// One `<name>.json` file per slot under a directory.
    #[derive(Clone, Debug)]
    pub struct DirSlotStore {
        root: PathBuf,
    }

    impl DirSlotStore {
        /// Uses `root`, creating it if needed.
        pub fn open(root: impl AsRef<Path>) -> Result<Self> {
            let root = root.as_ref().to_path_buf();
            fs::create_dir_all(&root).map_err(|e| storage(&root, e))?;
            Ok(Self { root })
        }

        fn path_of(&self, name: &str) -> Result<PathBuf> {
            check_slot_name(name)?;
            Ok(self.root.join(format!("{name}.{EXTENSION}")))
        }
    }

    fn storage(path: &Path, e: std::io::Error) -> EngineError {
        EngineError::Storage(format!("{}: {e}", path.display()))
    }

    impl SlotStore for DirSlotStore {
        fn write(&mut self, name: &str, data: &str) -> Result<()> {
            let path = self.path_of(name)?;
            fs::write(&path, data).map_err(|e| storage(&path, e))
        }

        fn read(&self, name: &str) -> Result<String> {
            let path = self.path_of(name).map_err(|_| EngineError::NotFound(name.to_string()))?;
            match fs::read_to_string(&path) {
                Ok(data) => Ok(data),
                Err(e) if e.kind() == ErrorKind::NotFound => {
                    Err(EngineError::NotFound(name.to_string()))
                }
                Err(e) if e.kind() == ErrorKind::InvalidData => {
                    Err(EngineError::corrupt(format!("{}: {e}", path.display())))
                }
                Err(e) => Err(storage(&path, e)),
            }
        }

        fn list(&self) -> Result<Vec<String>> {
            let entries = fs::read_dir(&self.root).map_err(|e| storage(&self.root, e))?;
            let mut names = Vec::new();
            for entry in entries {
                let path = entry.map_err(|e| storage(&self.root, e))?.path();
                if path.extension().and_then(|x| x.to_str()) != Some(EXTENSION) {
                    continue;
                }
                if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                    names.push(stem.to_string());
                }
            }
            names.sort();
            Ok(names)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_are_checked() {
        assert!(check_slot_name("level 1").is_ok());
        for bad in ["", "   ", "a/b", "..", "x\\y", " padded"] {
            assert!(matches!(check_slot_name(bad), Err(EngineError::InvalidName(_))), "{bad:?}");
        }
    }

    #[test]
    fn memory_store_overwrites_and_sorts() {
        let mut store = MemorySlotStore::new();
        store.write("b", "1").unwrap();
        store.write("a", "2").unwrap();
        store.write("b", "3").unwrap();
        assert_eq!(store.read("b").unwrap(), "3");
        assert_eq!(store.list().unwrap(), vec!["a".to_string(), "b".to_string()]);
        assert!(matches!(store.read("zz"), Err(EngineError::NotFound(_))));
    }

    #[cfg(not(target_arch = "wasm32"))]
    #[test]
    fn dir_store_keeps_one_file_per_slot() {
        let root = std::env::temp_dir().join(format!("physbox-slots-{}", std::process::id()));
        let mut store = DirSlotStore::open(&root).unwrap();
        store.write("first", "{}").unwrap();
        store.write("second", "[]").unwrap();
        assert_eq!(store.read("second").unwrap(), "[]");
        assert_eq!(store.list().unwrap(), vec!["first".to_string(), "second".to_string()]);
        assert!(matches!(store.read("third"), Err(EngineError::NotFound(_))));
        std::fs::remove_dir_all(&root).unwrap();
    }
}
