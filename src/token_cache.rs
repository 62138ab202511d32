use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use yup_oauth2::storage::{TokenInfo, TokenStorage};

/// On-disk shape of the token file.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct CachedToken {
    pub scopes: Vec<String>,
    pub saved_at: DateTime<Utc>,
    pub token: TokenInfo,
}

/// Single-token file cache handed to the authenticator as its storage.
#[derive(Debug, Clone)]
pub struct TokenCache {
    path: PathBuf,
}

impl TokenCache {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns `Ok(None)` when there is no cache file yet.
    pub fn load(&self) -> Result<Option<CachedToken>> {
        if !self.path.exists() {
            debug!("Token cache not found: {}", self.path.display());
            return Ok(None);
        }

        debug!("Loading token from: {}", self.path.display());
        let content = fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read token file {}", self.path.display()))?;
        let cached: CachedToken = serde_json::from_str(&content)
            .map_err(|e| anyhow::anyhow!("Failed to parse token file: {}", e))?;

        info!("Loaded cached token saved at {}", cached.saved_at.to_rfc3339());
        Ok(Some(cached))
    }

    pub fn save(&self, scopes: &[&str], token: TokenInfo) -> Result<()> {
        println!("Saving credential file to: {}", self.path.display());

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let cached = CachedToken {
            scopes: scopes.iter().map(|s| s.to_string()).collect(),
            saved_at: Utc::now(),
            token,
        };
        let json = serde_json::to_string_pretty(&cached)?;

        let mut options = OpenOptions::new();
        options.write(true).create(true).truncate(true);
        #[cfg(unix)]
        {
            use std::os::unix::fs::OpenOptionsExt;
            options.mode(0o600);
        }
        let mut file = options
            .open(&self.path)
            .with_context(|| format!("Unable to cache oauth token at {}", self.path.display()))?;

        // mode() only applies on creation
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            file.set_permissions(fs::Permissions::from_mode(0o600))?;
        }

        file.write_all(json.as_bytes())?;
        file.flush()?;

        info!("Saved token to {}", self.path.display());
        Ok(())
    }
}

#[async_trait]
impl TokenStorage for TokenCache {
    async fn set(&self, scopes: &[&str], token: TokenInfo) -> anyhow::Result<()> {
        self.save(scopes, token)
    }

    async fn get(&self, scopes: &[&str]) -> Option<TokenInfo> {
        match self.load() {
            Ok(Some(cached)) => {
                let matches = scopes.iter().all(|s| cached.scopes.iter().any(|c| c == s));
                if !matches {
                    warn!(
                        "Cached token scopes {:?} differ from requested {:?}; delete {} to re-authorize",
                        cached.scopes,
                        scopes,
                        self.path.display()
                    );
                }
                Some(cached.token)
            }
            Ok(None) => None,
            Err(e) => {
                warn!("Ignoring unusable token cache: {:#}", e);
                None
            }
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use serde_json::json;

    pub(crate) fn token_info(access_token: &str) -> TokenInfo {
        serde_json::from_value(json!({
            "access_token": access_token,
            "refresh_token": "refresh-1",
            "expires_at": null,
            "id_token": null,
        }))
        .unwrap()
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let cache = TokenCache::new(dir.path().join("token.json"));
        assert!(cache.load().unwrap().is_none());
    }

    #[test]
    fn test_save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let cache = TokenCache::new(dir.path().join("nested").join("token.json"));

        cache.save(&["scope-a"], token_info("abc")).unwrap();
        let cached = cache.load().unwrap().unwrap();

        assert_eq!(cached.scopes, vec!["scope-a"]);
        assert_eq!(cached.token.refresh_token.as_deref(), Some("refresh-1"));
        let raw: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(cache.path()).unwrap()).unwrap();
        assert_eq!(raw["token"]["access_token"], "abc");
    }

    #[test]
    fn test_save_truncates_previous_content() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("token.json");
        fs::write(&path, "x".repeat(10_000)).unwrap();

        let cache = TokenCache::new(&path);
        cache.save(&["scope-a"], token_info("short")).unwrap();

        assert!(cache.load().unwrap().is_some());
    }

    #[cfg(unix)]
    #[test]
    fn test_save_restricts_permissions() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("token.json");
        fs::write(&path, "{}").unwrap();
        fs::set_permissions(&path, fs::Permissions::from_mode(0o644)).unwrap();

        TokenCache::new(&path).save(&["scope-a"], token_info("abc")).unwrap();

        let mode = fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }

    #[test]
    fn test_load_malformed_file_errors() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("token.json");
        fs::write(&path, "not json").unwrap();

        assert!(TokenCache::new(&path).load().is_err());
    }

    #[tokio::test]
    async fn test_storage_treats_malformed_file_as_miss() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("token.json");
        fs::write(&path, "{\"scopes\": 3}").unwrap();

        let cache = TokenCache::new(&path);
        assert!(cache.get(&["scope-a"]).await.is_none());
    }

    #[tokio::test]
    async fn test_storage_returns_token_despite_scope_mismatch() {
        let dir = tempfile::tempdir().unwrap();
        let cache = TokenCache::new(dir.path().join("token.json"));
        cache.set(&["scope-a"], token_info("abc")).await.unwrap();

        let token = cache.get(&["scope-b"]).await.unwrap();
        assert_eq!(token.refresh_token.as_deref(), Some("refresh-1"));
    }
}
