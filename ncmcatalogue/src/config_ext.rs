//! Extension pour intégrer la configuration du catalogue dans ncmconfig
//!
//! Ce module fournit le trait `CatalogueConfigExt` qui ajoute à
//! `ncmconfig::Config` les paramètres d'accès à la passerelle.

use crate::models::AudioQuality;
use anyhow::{Result, anyhow};
use ncmconfig::Config;
use serde_yaml::Value;
use tracing::warn;

const DEFAULT_API_URL: &str = "http://localhost:3000";
const DEFAULT_TIMEOUT_SECS: usize = 15;
const DEFAULT_CACHE_CAPACITY: usize = 1000;

/// Trait d'extension pour gérer la configuration du catalogue
///
/// # Exemple
///
/// ```rust,ignore
/// use ncmconfig::Config;
/// use ncmcatalogue::CatalogueConfigExt;
///
/// let config = Config::load_config("")?;
/// println!("Gateway: {}", config.get_catalogue_api_url()?);
/// ```
pub trait CatalogueConfigExt {
    /// URL de base de la passerelle
    fn get_catalogue_api_url(&self) -> Result<String>;

    /// Définit l'URL de base de la passerelle
    fn set_catalogue_api_url(&self, url: &str) -> Result<()>;

    /// Qualité audio demandée pour les URLs de streaming
    ///
    /// Une valeur inconnue est signalée et remplacée par la qualité par défaut.
    fn get_catalogue_audio_quality(&self) -> Result<AudioQuality>;

    /// Définit la qualité audio
    fn set_catalogue_audio_quality(&self, quality: AudioQuality) -> Result<()>;

    /// Timeout des requêtes HTTP, en secondes
    fn get_catalogue_timeout_secs(&self) -> Result<u64>;

    /// Cookie de session transmis tel quel à la passerelle (None si vide)
    fn get_catalogue_cookie(&self) -> Result<Option<String>>;

    /// Capacité du cache mémoire
    fn get_catalogue_cache_capacity(&self) -> Result<u64>;

    /// Sources externes interrogées, dans l'ordre, par la recherche de secours
    fn get_catalogue_search_sources(&self) -> Result<Vec<String>>;
}

impl CatalogueConfigExt for Config {
    fn get_catalogue_api_url(&self) -> Result<String> {
        let url = self.get_string_or(&["catalogue", "api_url"], DEFAULT_API_URL);
        if url.trim().is_empty() {
            return Err(anyhow!("catalogue.api_url is empty"));
        }
        Ok(url)
    }

    fn set_catalogue_api_url(&self, url: &str) -> Result<()> {
        self.set_value(&["catalogue", "api_url"], Value::String(url.to_string()))
    }

    fn get_catalogue_audio_quality(&self) -> Result<AudioQuality> {
        let raw = self.get_string_or(&["catalogue", "audio_quality"], "exhigh");
        Ok(raw.parse().unwrap_or_else(|e| {
            warn!("{}, falling back to {}", e, AudioQuality::default());
            AudioQuality::default()
        }))
    }

    fn set_catalogue_audio_quality(&self, quality: AudioQuality) -> Result<()> {
        self.set_value(
            &["catalogue", "audio_quality"],
            Value::String(quality.as_str().to_string()),
        )
    }

    fn get_catalogue_timeout_secs(&self) -> Result<u64> {
        Ok(self.get_usize_or(&["catalogue", "timeout_secs"], DEFAULT_TIMEOUT_SECS) as u64)
    }

    fn get_catalogue_cookie(&self) -> Result<Option<String>> {
        let cookie = self.get_string_or(&["catalogue", "cookie"], "");
        Ok(Some(cookie).filter(|c| !c.trim().is_empty()))
    }

    fn get_catalogue_cache_capacity(&self) -> Result<u64> {
        Ok(self.get_usize_or(&["catalogue", "cache_capacity"], DEFAULT_CACHE_CAPACITY) as u64)
    }

    fn get_catalogue_search_sources(&self) -> Result<Vec<String>> {
        match self.get_string_list(&["catalogue", "search_sources"]) {
            Ok(sources) => Ok(sources),
            Err(_) => Ok(Vec::new()),
        }
    }
}
