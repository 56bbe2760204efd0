//! Saved account sessions applied to fresh automation handles.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use chrono::Utc;
use parking_lot::RwLock;
use reviewsweep_core::config::write_json;
use reviewsweep_core::{Error, Result};
use tracing::{debug, info, warn};

use crate::handle::AutomationHandle;
use crate::types::{CookieJar, ImportedCookie};

/// Saved sessions expire after this many minutes.
pub const COOKIE_EXPIRY_MINUTES: i64 = 180;

/// Page visited before cookies are installed, so they land on the right domain.
pub const COOKIE_ORIGIN: &str = "https://www.google.com";

/// Something that can log a fresh handle into a saved account.
pub trait CredentialStore {
    fn apply(&self, account: &str, handle: &mut dyn AutomationHandle) -> Result<()>;
}

/// One JSON cookie jar per account under a directory.
pub struct CookieJarStore {
    dir: PathBuf,
    max_age: chrono::Duration,
    jars: RwLock<BTreeMap<String, CookieJar>>,
}

fn jar_file_name(account: &str) -> String {
    let safe: String = account
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.' | '@') { c } else { '_' })
        .collect();
    format!("{}.json", safe)
}

impl CookieJarStore {
    /// Open the store, loading every live jar and deleting expired ones.
    pub fn open(dir: &Path) -> Result<Self> {
        Self::with_max_age(dir, chrono::Duration::minutes(COOKIE_EXPIRY_MINUTES))
    }

    pub fn with_max_age(dir: &Path, max_age: chrono::Duration) -> Result<Self> {
        std::fs::create_dir_all(dir)?;
        let store = Self {
            dir: dir.to_path_buf(),
            max_age,
            jars: RwLock::new(BTreeMap::new()),
        };
        store.reload()?;
        Ok(store)
    }

    /// Re-read the directory. Corrupt jars are skipped, expired ones removed.
    pub fn reload(&self) -> Result<()> {
        let now = Utc::now();
        let mut jars = BTreeMap::new();

        for entry in std::fs::read_dir(&self.dir)? {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }

            let jar: CookieJar = match std::fs::read_to_string(&path)
                .map_err(Error::from)
                .and_then(|s| serde_json::from_str(&s).map_err(Error::from))
            {
                Ok(jar) => jar,
                Err(e) => {
                    warn!("Skipping unreadable cookie jar {}: {}", path.display(), e);
                    continue;
                }
            };

            if jar.is_expired(now, self.max_age) {
                info!("Cookies for {} expired; removing", jar.reporter_key());
                if let Err(e) = std::fs::remove_file(&path) {
                    warn!("Failed to remove {}: {}", path.display(), e);
                }
                continue;
            }

            jars.insert(jar.account.clone(), jar);
        }

        info!("Loaded {} saved account sessions", jars.len());
        *self.jars.write() = jars;
        Ok(())
    }

    /// Persist a freshly captured session, replacing any previous one.
    pub fn save(&self, account: &str, email: Option<String>, cookies: Vec<ImportedCookie>) -> Result<CookieJar> {
        let jar = CookieJar {
            account: account.to_string(),
            email,
            cookies,
            saved_at: Utc::now(),
        };
        write_json(&self.dir.join(jar_file_name(account)), &jar)?;
        self.jars.write().insert(account.to_string(), jar.clone());
        info!("Saved {} cookies for {}", jar.cookies.len(), jar.reporter_key());
        Ok(jar)
    }

    pub fn get(&self, account: &str) -> Option<CookieJar> {
        self.jars.read().get(account).cloned()
    }

    pub fn accounts(&self) -> Vec<String> {
        self.jars.read().keys().cloned().collect()
    }

    pub fn remove(&self, account: &str) -> Result<bool> {
        let removed = self.jars.write().remove(account).is_some();
        let path = self.dir.join(jar_file_name(account));
        if path.exists() {
            std::fs::remove_file(path)?;
        }
        Ok(removed)
    }
}

impl CredentialStore for CookieJarStore {
    fn apply(&self, account: &str, handle: &mut dyn AutomationHandle) -> Result<()> {
        let jar = self
            .get(account)
            .ok_or_else(|| Error::Config(format!("no saved session for '{}'", account)))?;
        if jar.is_expired(Utc::now(), self.max_age) {
            return Err(Error::Config(format!("saved session for '{}' has expired", account)));
        }

        handle.navigate(COOKIE_ORIGIN)?;
        handle.delete_all_cookies()?;

        let mut applied = 0usize;
        for cookie in &jar.cookies {
            // Drivers reject some expiry values; retry as a session cookie.
            let ok = handle.add_cookie(cookie).is_ok()
                || (cookie.expiration_date.is_some() && handle.add_cookie(&cookie.without_expiry()).is_ok());
            if ok {
                applied += 1;
            } else {
                debug!("Cookie {} rejected", cookie.name);
            }
        }

        handle.refresh()?;
        info!(
            "Applied {}/{} cookies for {}",
            applied,
            jar.cookies.len(),
            jar.reporter_key()
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::FakeBrowser;

    fn cookie(name: &str, expiry: Option<f64>) -> ImportedCookie {
        ImportedCookie {
            name: name.into(),
            value: "v".into(),
            domain: ".google.com".into(),
            path: "/".into(),
            secure: true,
            http_only: true,
            same_site: None,
            expiration_date: expiry,
        }
    }

    #[test]
    fn test_save_and_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let store = CookieJarStore::open(dir.path()).unwrap();
        store
            .save("acct/1", Some("ann@example.com".into()), vec![cookie("SID", None)])
            .unwrap();
        assert!(dir.path().join("acct_1.json").exists());

        let reopened = CookieJarStore::open(dir.path()).unwrap();
        assert_eq!(reopened.accounts(), vec!["acct/1".to_string()]);
        assert_eq!(reopened.get("acct/1").unwrap().reporter_key(), "ann@example.com");
    }

    #[test]
    fn test_expired_and_corrupt_jars_are_dropped() {
        let dir = tempfile::tempdir().unwrap();
        let old = CookieJar {
            account: "old".into(),
            email: None,
            cookies: vec![],
            saved_at: Utc::now() - chrono::Duration::minutes(COOKIE_EXPIRY_MINUTES + 1),
        };
        write_json(&dir.path().join("old.json"), &old).unwrap();
        std::fs::write(dir.path().join("bad.json"), "{not json").unwrap();

        let store = CookieJarStore::open(dir.path()).unwrap();
        assert!(store.accounts().is_empty());
        assert!(!dir.path().join("old.json").exists());
        assert!(dir.path().join("bad.json").exists());
    }

    #[test]
    fn test_apply_installs_cookies_with_expiry_fallback() {
        let dir = tempfile::tempdir().unwrap();
        let store = CookieJarStore::open(dir.path()).unwrap();
        store
            .save("a", None, vec![cookie("SID", None), cookie("HSID", Some(1.9e9))])
            .unwrap();

        let mut browser = FakeBrowser::with_blocks(vec![]);
        browser.reject_expiring_cookies = true;
        store.apply("a", &mut browser).unwrap();

        assert_eq!(browser.log[0], format!("navigate:{}", COOKIE_ORIGIN));
        assert_eq!(browser.log[1], "delete_all_cookies");
        assert_eq!(browser.cookies.len(), 2);
        assert!(browser.cookies.iter().all(|c| c.expiration_date.is_none()));
        assert_eq!(browser.log.last().map(String::as_str), Some("refresh"));
    }

    #[test]
    fn test_apply_unknown_account_fails() {
        let dir = tempfile::tempdir().unwrap();
        let store = CookieJarStore::open(dir.path()).unwrap();
        let mut browser = FakeBrowser::with_blocks(vec![]);
        assert!(store.apply("nobody", &mut browser).is_err());
        assert!(browser.log.is_empty());
    }

    #[test]
    fn test_remove() {
        let dir = tempfile::tempdir().unwrap();
        let store = CookieJarStore::open(dir.path()).unwrap();
        store.save("a", None, vec![]).unwrap();
        assert!(store.remove("a").unwrap());
        assert!(!store.remove("a").unwrap());
        assert!(store.get("a").is_none());
    }
}
