//! Import settings of the asset kinds the optimizer touches
//!
//! These mirror what a host editor exposes through its importer API. The
//! optimizer reads them, decides on new values and hands them back through
//! [`AssetDatabase`](crate::host::AssetDatabase).

use serde::{Deserialize, Serialize};

/// How a texture is used; decides which compression rules apply
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum TextureType {
    #[default]
    Default,
    NormalMap,
    Gui,
    Sprite,
}

impl TextureType {
    /// GUI and sprite textures break under lossy crunching (alpha, 9-slice)
    pub fn is_ui(self) -> bool {
        matches!(self, TextureType::Gui | TextureType::Sprite)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TextureSettings {
    pub texture_type: TextureType,
    pub max_texture_size: u32,
    pub crunched_compression: bool,
    /// 0..=100
    pub compression_quality: u32,
    pub streaming_mipmaps: bool,
    /// Largest dimension of the source image, 0 when unknown
    pub source_size: u32,
}

impl Default for TextureSettings {
    fn default() -> Self {
        Self {
            texture_type: TextureType::Default,
            max_texture_size: 2048,
            crunched_compression: false,
            compression_quality: 50,
            streaming_mipmaps: false,
            source_size: 0,
        }
    }
}

impl TextureSettings {
    /// Size the texture is imported at
    pub fn effective_size(&self) -> u32 {
        if self.source_size == 0 {
            self.max_texture_size
        } else {
            self.source_size.min(self.max_texture_size)
        }
    }

    /// Rough runtime footprint: one byte per texel of a block-compressed
    /// square texture plus a third for the mip chain.
    pub fn estimated_memory_bytes(&self) -> u64 {
        let size = self.effective_size() as u64;
        size * size * 4 / 3
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum AudioLoadType {
    #[default]
    DecompressOnLoad,
    CompressedInMemory,
    Streaming,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum AudioCompressionFormat {
    #[default]
    Pcm,
    Vorbis,
    Adpcm,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AudioSettings {
    pub force_to_mono: bool,
    pub load_type: AudioLoadType,
    pub compression_format: AudioCompressionFormat,
    /// 0.0..=1.0
    pub quality: f32,
}

impl Default for AudioSettings {
    fn default() -> Self {
        Self {
            force_to_mono: false,
            load_type: AudioLoadType::DecompressOnLoad,
            compression_format: AudioCompressionFormat::Pcm,
            quality: 1.0,
        }
    }
}

/// Cull mode values as stored on materials
pub mod cull_mode {
    pub const OFF: i32 = 0;
    pub const FRONT: i32 = 1;
    pub const BACK: i32 = 2;
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MaterialSettings {
    pub enable_instancing: bool,
    /// `None` when the material's shader has no cull property
    pub cull_mode: Option<i32>,
}

/// When global illumination is recomputed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum GiWorkflow {
    /// Rebake whenever the scene changes
    #[default]
    Iterative,
    /// Only when a bake is requested
    OnDemand,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum LightmapCompression {
    None,
    LowQuality,
    NormalQuality,
    #[default]
    HighQuality,
}

/// Baked lighting parameters of one scene, stored as their own asset
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LightingSettings {
    pub gi_workflow: GiWorkflow,
    pub lightmap_compression: LightmapCompression,
    /// Largest lightmap atlas edge in texels
    pub lightmap_max_size: u32,
    pub direct_sample_count: u32,
}

impl Default for LightingSettings {
    fn default() -> Self {
        Self {
            gi_workflow: GiWorkflow::Iterative,
            lightmap_compression: LightmapCompression::HighQuality,
            lightmap_max_size: 1024,
            direct_sample_count: 32,
        }
    }
}
