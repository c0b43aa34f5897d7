//! Optimizer configuration
//!
//! Stored as JSON. Every field has a default so a partial file, or no file at
//! all, still yields a usable configuration.

use sceneopt_backup::DEFAULT_SNAPSHOT_PATH;
use sceneopt_core::{Error, LightmapCompression, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Default location of verbatim asset copies, relative to the project root
pub const DEFAULT_BACKUP_DIR: &str = "Assets/SceneOpt/Backups";

/// Preset for texture and lightmap quality
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Profile {
    /// Smaller builds first
    #[default]
    Standard,
    /// Visual quality first
    HighQuality,
    /// Use the values stored in the configuration
    Custom,
}

impl Profile {
    pub fn max_texture_size(self) -> Option<u32> {
        match self {
            Profile::Standard => Some(2048),
            Profile::HighQuality => Some(4096),
            Profile::Custom => None,
        }
    }

    pub fn compression_quality(self) -> Option<u32> {
        match self {
            Profile::Standard => Some(50),
            Profile::HighQuality => Some(85),
            Profile::Custom => None,
        }
    }
}

impl std::str::FromStr for Profile {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "standard" => Ok(Profile::Standard),
            "high-quality" | "highquality" | "high_quality" => Ok(Profile::HighQuality),
            "custom" => Ok(Profile::Custom),
            other => Err(Error::InvalidData(format!("unknown profile '{other}'"))),
        }
    }
}

/// Which passes `run_all` executes
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PassToggles {
    pub remove_missing: bool,
    pub gpu_instancing: bool,
    pub textures: bool,
    pub audio: bool,
    pub static_flags: bool,
    /// Forcing back-face culling changes how double sided meshes look, so it
    /// only runs when asked for
    pub backface_culling: bool,
    /// Lightmap settings only take effect on the next bake
    pub lighting: bool,
    /// Baking every light removes realtime shadows and dynamic lighting
    pub baked_lights: bool,
}

impl Default for PassToggles {
    fn default() -> Self {
        Self {
            remove_missing: true,
            gpu_instancing: true,
            textures: true,
            audio: true,
            static_flags: true,
            backface_culling: false,
            lighting: false,
            baked_lights: false,
        }
    }
}

/// Lightmap parameters the lighting pass converges to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LightmapTarget {
    pub max_size: u32,
    pub direct_sample_count: u32,
    /// `None` keeps whatever compression the scene uses
    pub compression: Option<LightmapCompression>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OptimizerConfig {
    pub profile: Profile,
    pub passes: PassToggles,
    /// Used by [`Profile::Custom`]
    pub max_texture_size: u32,
    /// Used by [`Profile::Custom`], 0..=100
    pub compression_quality: u32,
    /// Crunch normal maps too, at `crunch_quality`
    pub force_crunch: bool,
    pub crunch_quality: u32,
    /// Used by [`Profile::Custom`]
    pub lightmap_max_size: u32,
    /// Used by [`Profile::Custom`]
    pub direct_sample_count: u32,
    /// Used by [`Profile::Custom`]
    pub lightmap_compression: Option<LightmapCompression>,
    /// Copy source files under `backup_dir` before changing them
    pub file_backup: bool,
    /// Run all passes when play mode starts and revert them when it ends
    pub auto_optimize_on_play: bool,
    /// Relative to the project root
    pub snapshot_path: PathBuf,
    /// Relative to the project root
    pub backup_dir: PathBuf,
    /// Append pass failures to this file
    pub error_log: Option<PathBuf>,
}

impl Default for OptimizerConfig {
    fn default() -> Self {
        Self {
            profile: Profile::Standard,
            passes: PassToggles::default(),
            max_texture_size: 2048,
            compression_quality: 50,
            force_crunch: false,
            crunch_quality: 50,
            lightmap_max_size: 2048,
            direct_sample_count: 32,
            lightmap_compression: None,
            file_backup: false,
            auto_optimize_on_play: false,
            snapshot_path: PathBuf::from(DEFAULT_SNAPSHOT_PATH),
            backup_dir: PathBuf::from(DEFAULT_BACKUP_DIR),
            error_log: None,
        }
    }
}

impl OptimizerConfig {
    /// Load from `path`; a missing file gives the defaults
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            log::debug!("no config at {}, using defaults", path.display());
            return Ok(Self::default());
        }
        let text = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let text = serde_json::to_string_pretty(self)?;
        std::fs::write(path.as_ref(), text)?;
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        for (name, value) in [
            ("max_texture_size", self.max_texture_size),
            ("lightmap_max_size", self.lightmap_max_size),
            ("direct_sample_count", self.direct_sample_count),
        ] {
            if value == 0 {
                return Err(Error::InvalidData(format!("{name} must be positive")));
            }
        }
        for (name, value) in [
            ("compression_quality", self.compression_quality),
            ("crunch_quality", self.crunch_quality),
        ] {
            if value > 100 {
                return Err(Error::InvalidData(format!(
                    "{name} must be in 0..=100, got {value}"
                )));
            }
        }
        Ok(())
    }

    /// Upper bound for texture import size under the current profile
    pub fn texture_size_limit(&self) -> u32 {
        self.profile
            .max_texture_size()
            .unwrap_or(self.max_texture_size)
    }

    /// Compression quality for crunched textures under the current profile
    pub fn texture_quality(&self) -> u32 {
        if self.force_crunch {
            self.crunch_quality
        } else {
            self.profile
                .compression_quality()
                .unwrap_or(self.compression_quality)
        }
    }

    pub fn lightmap_target(&self) -> LightmapTarget {
        match self.profile {
            Profile::Standard => LightmapTarget {
                max_size: 2048,
                direct_sample_count: 32,
                compression: Some(LightmapCompression::NormalQuality),
            },
            Profile::HighQuality => LightmapTarget {
                max_size: 4096,
                direct_sample_count: 64,
                compression: None,
            },
            Profile::Custom => LightmapTarget {
                max_size: self.lightmap_max_size,
                direct_sample_count: self.direct_sample_count,
                compression: self.lightmap_compression,
            },
        }
    }
}
