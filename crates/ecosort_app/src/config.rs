//! Frame loop configuration.
//!
//! Defaults can be overridden per field through `ECOSORT_*` environment
//! variables, read once at startup by [`FrameConfig::from_env`].

use std::str::FromStr;

use anyhow::{Context, Result};

/// Environment variable overriding [`FrameConfig::frame_rate`].
pub const FRAME_RATE_ENV: &str = "ECOSORT_FRAME_RATE";
/// Environment variable overriding [`FrameConfig::max_frames`].
pub const MAX_FRAMES_ENV: &str = "ECOSORT_MAX_FRAMES";
/// Environment variable overriding [`FrameConfig::menu_frames`].
pub const MENU_FRAMES_ENV: &str = "ECOSORT_MENU_FRAMES";
/// Environment variable overriding [`FrameConfig::spawn_interval`].
pub const SPAWN_INTERVAL_ENV: &str = "ECOSORT_SPAWN_INTERVAL";

/// Configuration for the frame loop and the gameplay systems it drives.
#[derive(Debug, Clone, PartialEq)]
pub struct FrameConfig {
    /// Target frames per second.
    pub frame_rate: f64,
    /// Maximum number of frames to run (0 = unlimited).
    pub max_frames: u64,
    /// Frames spent in the menu before the game scene is activated.
    pub menu_frames: u64,
    /// Frames between two rubbish spawns in the game scene.
    pub spawn_interval: u64,
}

impl Default for FrameConfig {
    fn default() -> Self {
        Self {
            frame_rate: 60.0,
            max_frames: 0,
            menu_frames: 120,
            spawn_interval: 90,
        }
    }
}

impl FrameConfig {
    /// Build a config from the defaults plus any `ECOSORT_*` overrides
    /// present in the process environment.
    ///
    /// # Errors
    ///
    /// Fails if a variable is set but does not parse, or if the resulting
    /// config is unusable (see [`FrameConfig::validate`]).
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`FrameConfig::from_env`] with an arbitrary variable source.
    ///
    /// # Errors
    ///
    /// See [`FrameConfig::from_env`].
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut config = Self::default();
        if let Some(rate) = parse_var(&lookup, FRAME_RATE_ENV)? {
            config.frame_rate = rate;
        }
        if let Some(frames) = parse_var(&lookup, MAX_FRAMES_ENV)? {
            config.max_frames = frames;
        }
        if let Some(frames) = parse_var(&lookup, MENU_FRAMES_ENV)? {
            config.menu_frames = frames;
        }
        if let Some(interval) = parse_var(&lookup, SPAWN_INTERVAL_ENV)? {
            config.spawn_interval = interval;
        }
        config.validate()?;
        Ok(config)
    }

    /// Check that the frame rate is positive and finite and that rubbish
    /// spawns at a non-zero interval.
    ///
    /// # Errors
    ///
    /// Returns an error naming the offending field.
    pub fn validate(&self) -> Result<()> {
        if !(self.frame_rate.is_finite() && self.frame_rate > 0.0) {
            anyhow::bail!("frame_rate must be positive, got {}", self.frame_rate);
        }
        if self.spawn_interval == 0 {
            anyhow::bail!("spawn_interval must be at least one frame");
        }
        Ok(())
    }

    /// Override the target frame rate.
    #[must_use]
    pub fn with_frame_rate(mut self, frame_rate: f64) -> Self {
        self.frame_rate = frame_rate;
        self
    }

    /// Stop after `max_frames` frames (0 = never).
    #[must_use]
    pub fn with_max_frames(mut self, max_frames: u64) -> Self {
        self.max_frames = max_frames;
        self
    }

    /// Override how long the menu is shown.
    #[must_use]
    pub fn with_menu_frames(mut self, menu_frames: u64) -> Self {
        self.menu_frames = menu_frames;
        self
    }

    /// Override the rubbish spawn interval.
    #[must_use]
    pub fn with_spawn_interval(mut self, spawn_interval: u64) -> Self {
        self.spawn_interval = spawn_interval;
        self
    }

    /// Fixed timestep in seconds.
    #[must_use]
    pub fn frame_time(&self) -> f64 {
        1.0 / self.frame_rate
    }
}

fn parse_var<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    lookup(key)
        .map(|raw| {
            raw.trim()
                .parse::<T>()
                .with_context(|| format!("invalid value {raw:?} for {key}"))
        })
        .transpose()
}
