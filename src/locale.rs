//! Locale selection and message-bundle loading.
//!
//! The active locale starts at the fallback and is switched by
//! [`LocaleStore::activate`], which loads the bundle for the requested tag
//! before committing the switch. Bootstrap uses
//! [`LocaleStore::activate_or_fallback`] so a failed load never blocks
//! navigation.

use std::sync::{Arc, Mutex};

use futures::future::BoxFuture;

use crate::error::TransportError;

/// Locale used when no preference is stored or a load fails.
pub const FALLBACK_LOCALE: &str = "en";

/// Loads the message bundle for a locale tag.
pub type LocaleLoader =
    Arc<dyn Fn(String) -> BoxFuture<'static, Result<(), TransportError>> + Send + Sync>;

/// Tracks the active locale and loads bundles on switch.
pub struct LocaleStore {
    active: Mutex<String>,
    fallback: String,
    loader: LocaleLoader,
}

impl LocaleStore {
    /// Create a store with the given fallback and bundle loader.
    pub fn new(fallback: impl Into<String>, loader: LocaleLoader) -> Self {
        let fallback = fallback.into();
        Self {
            active: Mutex::new(fallback.clone()),
            fallback,
            loader,
        }
    }

    /// Create a store whose loader accepts every tag without work.
    pub fn accepting(fallback: impl Into<String>) -> Self {
        Self::new(fallback, Arc::new(|_| Box::pin(async { Ok(()) })))
    }

    /// The locale currently in effect.
    pub fn active(&self) -> String {
        self.active.lock().unwrap().clone()
    }

    /// The configured fallback locale.
    pub fn fallback(&self) -> &str {
        &self.fallback
    }

    /// Load and switch to `tag`, normalized to its language subtag.
    ///
    /// The active locale changes only if the bundle load succeeds.
    pub async fn activate(&self, tag: &str) -> Result<(), TransportError> {
        let normalized = normalize_locale(tag);
        (self.loader)(normalized.to_string()).await?;
        crate::debug_log!("locale activated: {}", normalized);
        *self.active.lock().unwrap() = normalized.to_string();
        Ok(())
    }

    /// Like [`activate`](Self::activate), but a failed load keeps the
    /// current locale instead of surfacing the error.
    pub async fn activate_or_fallback(&self, tag: &str) {
        if let Err(err) = self.activate(tag).await {
            crate::warn_log!(
                "locale load failed for '{}', keeping '{}': {}",
                tag,
                self.active(),
                err
            );
        }
    }
}

impl std::fmt::Debug for LocaleStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LocaleStore")
            .field("active", &self.active())
            .field("fallback", &self.fallback)
            .finish_non_exhaustive()
    }
}

/// Reduce a BCP 47 tag to its language subtag ("en-US" becomes "en").
fn normalize_locale(tag: &str) -> &str {
    match tag.split_once('-') {
        Some((language, _)) if !language.is_empty() => language,
        _ => tag,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_locale() {
        assert_eq!(normalize_locale("en-US"), "en");
        assert_eq!(normalize_locale("es"), "es");
        assert_eq!(normalize_locale("zh-Hant-TW"), "zh");
        assert_eq!(normalize_locale("-odd"), "-odd");
    }

    #[tokio::test]
    async fn test_activate_switches_on_success() {
        let locales = LocaleStore::accepting(FALLBACK_LOCALE);
        locales.activate("es-MX").await.unwrap();
        assert_eq!(locales.active(), "es");
    }

    #[tokio::test]
    async fn test_failed_load_keeps_current() {
        let loader: LocaleLoader = Arc::new(|tag| {
            Box::pin(async move {
                if tag == "en" {
                    Ok(())
                } else {
                    Err(TransportError::Network {
                        message: format!("no bundle for {tag}"),
                    })
                }
            })
        });
        let locales = LocaleStore::new(FALLBACK_LOCALE, loader);

        locales.activate_or_fallback("fr").await;
        assert_eq!(locales.active(), "en");

        assert!(locales.activate("fr").await.is_err());
        assert_eq!(locales.active(), "en");
    }
}
