//! Configuration management for OpenEduVoice.
//!
//! This module provides:
//! - TOML-based configuration with logical sections
//! - Atomic file writes (write to temp, then rename)
//! - Section-level updates (only changed section is modified)
//! - Automatic defaults for missing keys
//!
//! # Example
//!
//! ```no_run
//! use oev_core::config::{ConfigManager, ConfigSection};
//!
//! let mut config = ConfigManager::new(".config/settings.toml");
//! config.load_or_create().unwrap();
//!
//! println!("Chunk size: {}", config.settings().translation.max_chars);
//!
//! config.settings_mut().backend.force_cpu = true;
//! config.update_section(ConfigSection::Backend).unwrap();
//! ```

mod manager;
mod settings;

pub use manager::{ConfigError, ConfigManager, ConfigResult};
pub use settings::{
    BackendSettings, ConfigSection, LoggingSettings, PathSettings, Settings, SpeechSettings,
    ToolSettings, TranscriptionSettings, TranslationSettings,
};
