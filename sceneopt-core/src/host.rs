//! Seams to the host editor
//!
//! The optimizer never owns assets. It resolves them by path through an
//! [`AssetDatabase`], writes new settings back through the same trait and walks
//! the live scene through a [`SceneHost`].

use crate::asset::{AudioSettings, LightingSettings, MaterialSettings, TextureSettings};
use crate::scene::SceneGraph;
use crate::Result;

/// Resource lookup and the "persist and re-apply" calls of the host's import API
pub trait AssetDatabase {
    /// Current import settings of the texture at `path`, `None` if there is no such texture
    fn texture(&self, path: &str) -> Option<TextureSettings>;

    /// Store new texture settings and re-import the texture
    fn apply_texture(&mut self, path: &str, settings: &TextureSettings) -> Result<()>;

    fn audio(&self, path: &str) -> Option<AudioSettings>;

    /// Store new audio settings and re-import the clip
    fn apply_audio(&mut self, path: &str, settings: &AudioSettings) -> Result<()>;

    fn material(&self, path: &str) -> Option<MaterialSettings>;

    /// Update a material in memory and mark it dirty; written on [`save_assets`](Self::save_assets)
    fn apply_material(&mut self, path: &str, settings: &MaterialSettings) -> Result<()>;

    fn lighting(&self, path: &str) -> Option<LightingSettings>;

    fn apply_lighting(&mut self, path: &str, settings: &LightingSettings) -> Result<()>;

    /// Persist every pending change
    fn save_assets(&mut self) -> Result<()>;
}

/// Access to the scene currently open in the host
pub trait SceneHost: AssetDatabase {
    fn scene(&self) -> &SceneGraph;

    fn scene_mut(&mut self) -> &mut SceneGraph;

    /// Asset paths the live scene depends on, directly or indirectly
    fn scene_dependencies(&self) -> Vec<String>;

    /// Path of the lighting settings asset assigned to the open scene
    fn scene_lighting_path(&self) -> Option<String>;
}
