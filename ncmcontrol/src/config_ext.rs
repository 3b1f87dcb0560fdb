//! Extension pour intégrer les réglages de lecture dans ncmconfig
//!
//! Le trait `PlaybackConfigExt` ajoute à `ncmconfig::Config` les sections
//! `playback` et `radio`, et sait construire un [`PlaybackSettings`] complet.

use crate::radio::RadioMode;
use crate::settings::{PlaybackSettings, ShuffleStrategy};
use anyhow::Result;
use ncmcatalogue::CatalogueConfigExt;
use ncmconfig::Config;
use serde_yaml::Value;
use std::time::Duration;
use tracing::warn;

const DEFAULT_TICK_INTERVAL_MS: usize = 1000;
const DEFAULT_PRELOAD_WATERMARK: usize = 2;

/// Trait d'extension pour la configuration du moteur de lecture
///
/// # Exemple
///
/// ```rust,ignore
/// use ncmconfig::Config;
/// use ncmcontrol::PlaybackConfigExt;
///
/// let config = Config::load_config("")?;
/// let settings = config.get_playback_settings()?;
/// ```
pub trait PlaybackConfigExt {
    /// Période du tick, en millisecondes (jamais nulle)
    fn get_tick_interval_ms(&self) -> Result<u64>;

    /// Décalage de fin de piste, en secondes (borné à ±5 par l'horloge)
    fn get_next_track_timing_offset(&self) -> Result<f64>;

    /// Définit le décalage de fin de piste
    fn set_next_track_timing_offset(&self, offset: f64) -> Result<()>;

    /// Stratégie de navigation en mode aléatoire
    fn get_shuffle_strategy(&self) -> Result<ShuffleStrategy>;

    /// Noms des sorties audio pilotées, une instance par sortie
    fn get_playback_devices(&self) -> Result<Vec<String>>;

    /// Mode radio utilisé quand aucun mode n'est précisé
    fn get_radio_default_mode(&self) -> Result<RadioMode>;

    /// Seuil de rechargement de la file radio
    fn get_radio_preload_watermark(&self) -> Result<usize>;

    /// Rassemble tous les réglages d'une instance
    fn get_playback_settings(&self) -> Result<PlaybackSettings>;
}

impl PlaybackConfigExt for Config {
    fn get_tick_interval_ms(&self) -> Result<u64> {
        let ms = self.get_usize_or(&["playback", "tick_interval_ms"], DEFAULT_TICK_INTERVAL_MS);
        if ms == 0 {
            warn!("playback.tick_interval_ms is 0, using {}", DEFAULT_TICK_INTERVAL_MS);
            return Ok(DEFAULT_TICK_INTERVAL_MS as u64);
        }
        Ok(ms as u64)
    }

    fn get_next_track_timing_offset(&self) -> Result<f64> {
        Ok(self.get_f64_or(&["playback", "next_track_timing_offset"], 0.0))
    }

    fn set_next_track_timing_offset(&self, offset: f64) -> Result<()> {
        self.set_value(
            &["playback", "next_track_timing_offset"],
            Value::Number(offset.into()),
        )
    }

    fn get_shuffle_strategy(&self) -> Result<ShuffleStrategy> {
        let raw = self.get_string_or(&["playback", "shuffle_strategy"], "pass");
        Ok(raw.parse().unwrap_or_else(|e| {
            warn!("{}, falling back to {}", e, ShuffleStrategy::default());
            ShuffleStrategy::default()
        }))
    }

    fn get_playback_devices(&self) -> Result<Vec<String>> {
        let devices = self
            .get_string_list(&["playback", "devices"])
            .unwrap_or_default();
        if devices.is_empty() {
            return Ok(vec!["default".to_string()]);
        }
        Ok(devices)
    }

    fn get_radio_default_mode(&self) -> Result<RadioMode> {
        let raw = self.get_string_or(&["radio", "default_mode"], "DEFAULT");
        Ok(RadioMode::from_name_or(&raw, RadioMode::Default))
    }

    fn get_radio_preload_watermark(&self) -> Result<usize> {
        Ok(self.get_usize_or(&["radio", "preload_watermark"], DEFAULT_PRELOAD_WATERMARK))
    }

    fn get_playback_settings(&self) -> Result<PlaybackSettings> {
        Ok(PlaybackSettings {
            tick_interval: Duration::from_millis(self.get_tick_interval_ms()?),
            next_track_timing_offset: self.get_next_track_timing_offset()?,
            shuffle_strategy: self.get_shuffle_strategy()?,
            radio_default_mode: self.get_radio_default_mode()?,
            preload_watermark: self.get_radio_preload_watermark()?,
            search_sources: self.get_catalogue_search_sources()?,
            shuffle_seed: None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn load() -> (tempfile::TempDir, Config) {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load_config(dir.path().to_str().unwrap()).unwrap();
        (dir, config)
    }

    #[test]
    fn test_playback_defaults() {
        let (_dir, config) = load();
        let settings = config.get_playback_settings().unwrap();

        assert_eq!(settings.tick_interval, Duration::from_secs(1));
        assert_eq!(settings.next_track_timing_offset, 0.0);
        assert_eq!(settings.shuffle_strategy, ShuffleStrategy::Pass);
        assert_eq!(settings.radio_default_mode, RadioMode::Default);
        assert_eq!(settings.preload_watermark, 2);
        assert_eq!(settings.search_sources, vec!["migu", "kuwo"]);
        assert_eq!(config.get_playback_devices().unwrap(), vec!["living_room"]);
    }

    #[test]
    fn test_playback_overrides() {
        let (_dir, config) = load();
        config
            .set_value(
                &["playback", "shuffle_strategy"],
                Value::String("RANDOM".into()),
            )
            .unwrap();
        config
            .set_value(&["radio", "default_mode"], Value::String("ai dj".into()))
            .unwrap();
        config
            .set_value(&["playback", "tick_interval_ms"], Value::Number(0.into()))
            .unwrap();
        config.set_next_track_timing_offset(-2.5).unwrap();

        assert_eq!(config.get_shuffle_strategy().unwrap(), ShuffleStrategy::Random);
        assert_eq!(config.get_radio_default_mode().unwrap(), RadioMode::AiDj);
        assert_eq!(config.get_tick_interval_ms().unwrap(), 1000);
        assert_eq!(config.get_next_track_timing_offset().unwrap(), -2.5);
    }

    #[test]
    fn test_unknown_values_fall_back() {
        let (_dir, config) = load();
        config
            .set_value(&["playback", "shuffle_strategy"], Value::String("chaos".into()))
            .unwrap();
        config
            .set_value(&["radio", "default_mode"], Value::String("polka".into()))
            .unwrap();
        config
            .set_value(&["playback", "devices"], Value::Sequence(Vec::new()))
            .unwrap();

        assert_eq!(config.get_shuffle_strategy().unwrap(), ShuffleStrategy::Pass);
        assert_eq!(config.get_radio_default_mode().unwrap(), RadioMode::Default);
        assert_eq!(config.get_playback_devices().unwrap(), vec!["default"]);
    }
}
