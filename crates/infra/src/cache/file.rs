//! File-backed token cache
//!
//! One JSON object per identity at `{directory}/{namespace}.json`. Writes go
//! to a sibling temp file that is renamed over the target, so a crash never
//! leaves a half-written token behind.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use grantflow_core::TokenCache;
use grantflow_domain::{AppIdentity, TokenCacheError, TokenFields};
use tracing::debug;

/// [`TokenCache`] storing each identity in its own JSON file
#[derive(Debug, Clone)]
pub struct FileTokenCache {
    directory: PathBuf,
}

impl FileTokenCache {
    /// Cache rooted at `directory`; the directory is created on first save
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        Self { directory: directory.into() }
    }

    #[must_use]
    pub fn directory(&self) -> &Path {
        &self.directory
    }

    /// Path of the file holding `identity`'s token
    #[must_use]
    pub fn path_for(&self, identity: &AppIdentity) -> PathBuf {
        self.directory.join(format!("{}.json", file_stem(identity.cache_namespace())))
    }

    fn write_atomically(&self, target: &Path, contents: &[u8]) -> io::Result<()> {
        fs::create_dir_all(&self.directory)?;

        let tmp = target.with_extension("json.tmp");
        {
            let mut file = fs::File::create(&tmp)?;
            file.write_all(contents)?;
            file.sync_all()?;
        }
        fs::rename(&tmp, target)
    }
}

/// Escape a namespace into a file stem
///
/// ASCII alphanumerics and `-` are kept; every other byte, `_` included,
/// becomes `_xx` in lowercase hex, so distinct namespaces never share a file.
fn file_stem(namespace: &str) -> String {
    let mut stem = String::with_capacity(namespace.len());
    for byte in namespace.bytes() {
        if byte.is_ascii_alphanumeric() || byte == b'-' {
            stem.push(char::from(byte));
        } else {
            stem.push_str(&format!("_{byte:02x}"));
        }
    }
    stem
}

fn unavailable(err: &io::Error) -> TokenCacheError {
    TokenCacheError::Unavailable(err.to_string())
}

impl TokenCache for FileTokenCache {
    fn load(&self, identity: &AppIdentity) -> Result<TokenFields, TokenCacheError> {
        let path = self.path_for(identity);
        let raw = match fs::read(&path) {
            Ok(raw) => raw,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(TokenFields::new()),
            Err(err) => return Err(unavailable(&err)),
        };

        serde_json::from_slice(&raw)
            .map_err(|err| TokenCacheError::Corrupted(format!("{}: {err}", path.display())))
    }

    fn save(&self, identity: &AppIdentity, fields: &TokenFields) -> Result<(), TokenCacheError> {
        let path = self.path_for(identity);
        let contents = serde_json::to_vec_pretty(fields)
            .map_err(|err| TokenCacheError::Corrupted(err.to_string()))?;

        self.write_atomically(&path, &contents).map_err(|err| unavailable(&err))?;
        debug!(path = %path.display(), "saved token file");
        Ok(())
    }

    fn clear(&self, identity: &AppIdentity) -> Result<(), TokenCacheError> {
        match fs::remove_file(self.path_for(identity)) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(unavailable(&err)),
        }
    }
}

#[cfg(test)]
mod tests {
    //! Unit tests for cache::file.
    use super::*;

    /// Validates `file_stem` for the unsafe namespace scenario.
    ///
    /// Assertions:
    /// - Ensures path separators and dots cannot escape the directory.
    /// - Ensures namespaces differing only in escaped characters stay apart.
    #[test]
    fn test_file_stem_escapes_unsafe_bytes() {
        assert_eq!(file_stem("../etc/passwd"), "_2e_2e_2fetc_2fpasswd");
        assert_eq!(file_stem("demo-app1"), "demo-app1");
        assert_eq!(file_stem("app.one"), "app_2eone");
        assert_eq!(file_stem("app_one"), "app_5fone");
        assert_ne!(file_stem("a_2e"), file_stem("a."));
    }

    /// Validates `FileTokenCache::path_for` for the per-identity file
    /// scenario.
    ///
    /// Assertions:
    /// - Confirms the file is named after the app key.
    #[test]
    fn test_path_for_uses_namespace() {
        let cache = FileTokenCache::new("/var/lib/grantflow");
        let path = cache.path_for(&AppIdentity::new("demo").unwrap());

        assert_eq!(path, PathBuf::from("/var/lib/grantflow/demo.json"));
    }
}
