use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Bearer token pair, stored under the well-known `access` / `refresh` keys.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenPair {
    pub access: String,
    pub refresh: String,
}

/// Persistence for the token pair across process restarts.
///
/// Only [`Session`](crate::session::Session) writes through this.
pub trait TokenStore {
    fn load(&self) -> Result<Option<TokenPair>>;
    fn save(&mut self, tokens: &TokenPair) -> Result<()>;
    fn clear(&mut self) -> Result<()>;
}

#[derive(Debug, Default, Clone)]
pub struct MemoryTokenStore {
    tokens: Option<TokenPair>,
}

impl MemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_tokens(tokens: TokenPair) -> Self {
        Self {
            tokens: Some(tokens),
        }
    }
}

impl TokenStore for MemoryTokenStore {
    fn load(&self) -> Result<Option<TokenPair>> {
        Ok(self.tokens.clone())
    }

    fn save(&mut self, tokens: &TokenPair) -> Result<()> {
        self.tokens = Some(tokens.clone());
        Ok(())
    }

    fn clear(&mut self) -> Result<()> {
        self.tokens = None;
        Ok(())
    }
}

/// Token pair kept in a small YAML file.
#[derive(Debug, Clone)]
pub struct FileTokenStore {
    path: PathBuf,
}

impl FileTokenStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl TokenStore for FileTokenStore {
    fn load(&self) -> Result<Option<TokenPair>> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        serde_yaml_ng::from_str(&content)
            .map(Some)
            .map_err(|e| Error::TokenStore(format!("{}: {}", self.path.display(), e)))
    }

    fn save(&mut self, tokens: &TokenPair) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let content =
            serde_yaml_ng::to_string(tokens).map_err(|e| Error::TokenStore(e.to_string()))?;
        fs::write(&self.path, content)?;
        Ok(())
    }

    fn clear(&mut self) -> Result<()> {
        match fs::remove_file(&self.path) {
            Err(e) if e.kind() != ErrorKind::NotFound => Err(e.into()),
            _ => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pair() -> TokenPair {
        TokenPair {
            access: "a.b.c".into(),
            refresh: "r.s.t".into(),
        }
    }

    #[test]
    fn memory_store_lifecycle() {
        let mut store = MemoryTokenStore::new();
        assert_eq!(store.load().unwrap(), None);
        store.save(&pair()).unwrap();
        assert_eq!(store.load().unwrap(), Some(pair()));
        store.clear().unwrap();
        assert_eq!(store.load().unwrap(), None);
    }

    #[test]
    fn file_store_uses_well_known_keys() {
        let dir = tempfile::TempDir::new().unwrap();
        let mut store = FileTokenStore::new(dir.path().join("nested").join("tokens.yaml"));

        assert_eq!(store.load().unwrap(), None);
        store.save(&pair()).unwrap();

        let raw = fs::read_to_string(store.path()).unwrap();
        assert!(raw.contains("access: a.b.c"));
        assert!(raw.contains("refresh: r.s.t"));
        assert_eq!(store.load().unwrap(), Some(pair()));

        store.clear().unwrap();
        assert!(!store.path().exists());
        // clearing twice is fine
        store.clear().unwrap();
    }

    #[test]
    fn corrupt_file_is_a_store_error() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("tokens.yaml");
        fs::write(&path, "just a string\n").unwrap();

        let store = FileTokenStore::new(path);
        assert!(matches!(store.load(), Err(Error::TokenStore(_))));
    }
}
