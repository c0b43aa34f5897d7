//! In-memory project implementing the host traits
//!
//! A `Project` holds import settings keyed by asset path together with the
//! open scene. It backs the command line tool, which keeps it in a JSON file,
//! and the test suites.

use crate::asset::{AudioSettings, LightingSettings, MaterialSettings, TextureSettings};
use crate::host::{AssetDatabase, SceneHost};
use crate::scene::{Component, SceneGraph};
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

/// Number of successful applies per asset kind
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ApplyCounts {
    pub textures: usize,
    pub audio: usize,
    pub materials: usize,
    pub lighting: usize,
}

impl ApplyCounts {
    pub fn total(&self) -> usize {
        self.textures + self.audio + self.materials + self.lighting
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Project {
    pub textures: BTreeMap<String, TextureSettings>,
    pub audio: BTreeMap<String, AudioSettings>,
    pub materials: BTreeMap<String, MaterialSettings>,
    pub lighting: BTreeMap<String, LightingSettings>,
    pub scene: SceneGraph,
    /// Lighting settings asset of the scene, a key of `lighting`
    pub scene_lighting: Option<String>,
    /// Asset paths referenced by the scene that are not visible through its
    /// components, e.g. textures used by materials
    pub dependencies: Vec<String>,

    /// Paths whose applies fail with [`Error::Locked`]
    #[serde(skip)]
    pub locked: BTreeSet<String>,
    /// Makes [`save_assets`](AssetDatabase::save_assets) fail
    #[serde(skip)]
    pub read_only: bool,
    #[serde(skip)]
    applies: ApplyCounts,
    #[serde(skip)]
    dirty_materials: BTreeSet<String>,
    #[serde(skip)]
    saves: usize,
}

impl Project {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let text = std::fs::read_to_string(path.as_ref())?;
        let project: Project = serde_json::from_str(&text)?;
        project.scene.validate()?;
        Ok(project)
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let text = serde_json::to_string_pretty(self)?;
        std::fs::write(path.as_ref(), text)?;
        Ok(())
    }

    pub fn applies(&self) -> ApplyCounts {
        self.applies
    }

    pub fn save_count(&self) -> usize {
        self.saves
    }

    pub fn lock(&mut self, path: impl Into<String>) {
        self.locked.insert(path.into());
    }

    fn check_unlocked(&self, path: &str) -> Result<()> {
        if self.locked.contains(path) {
            Err(Error::Locked(path.to_string()))
        } else {
            Ok(())
        }
    }
}

impl AssetDatabase for Project {
    fn texture(&self, path: &str) -> Option<TextureSettings> {
        self.textures.get(path).cloned()
    }

    fn apply_texture(&mut self, path: &str, settings: &TextureSettings) -> Result<()> {
        self.check_unlocked(path)?;
        let slot = self
            .textures
            .get_mut(path)
            .ok_or_else(|| Error::NotFound(path.to_string()))?;
        *slot = settings.clone();
        self.applies.textures += 1;
        log::debug!("reimported texture {path}");
        Ok(())
    }

    fn audio(&self, path: &str) -> Option<AudioSettings> {
        self.audio.get(path).cloned()
    }

    fn apply_audio(&mut self, path: &str, settings: &AudioSettings) -> Result<()> {
        self.check_unlocked(path)?;
        let slot = self
            .audio
            .get_mut(path)
            .ok_or_else(|| Error::NotFound(path.to_string()))?;
        *slot = settings.clone();
        self.applies.audio += 1;
        log::debug!("reimported audio clip {path}");
        Ok(())
    }

    fn material(&self, path: &str) -> Option<MaterialSettings> {
        self.materials.get(path).cloned()
    }

    fn apply_material(&mut self, path: &str, settings: &MaterialSettings) -> Result<()> {
        self.check_unlocked(path)?;
        let slot = self
            .materials
            .get_mut(path)
            .ok_or_else(|| Error::NotFound(path.to_string()))?;
        *slot = settings.clone();
        self.applies.materials += 1;
        self.dirty_materials.insert(path.to_string());
        Ok(())
    }

    fn lighting(&self, path: &str) -> Option<LightingSettings> {
        self.lighting.get(path).cloned()
    }

    fn apply_lighting(&mut self, path: &str, settings: &LightingSettings) -> Result<()> {
        self.check_unlocked(path)?;
        let slot = self
            .lighting
            .get_mut(path)
            .ok_or_else(|| Error::NotFound(path.to_string()))?;
        *slot = settings.clone();
        self.applies.lighting += 1;
        Ok(())
    }

    fn save_assets(&mut self) -> Result<()> {
        if self.read_only {
            return Err(Error::Host("project is read-only".to_string()));
        }
        if !self.dirty_materials.is_empty() {
            log::debug!("saving {} dirty materials", self.dirty_materials.len());
            self.dirty_materials.clear();
        }
        self.saves += 1;
        Ok(())
    }
}

impl SceneHost for Project {
    fn scene(&self) -> &SceneGraph {
        &self.scene
    }

    fn scene_mut(&mut self) -> &mut SceneGraph {
        &mut self.scene
    }

    fn scene_dependencies(&self) -> Vec<String> {
        let mut paths: BTreeSet<String> = self.dependencies.iter().cloned().collect();
        for id in self.scene.live_nodes() {
            let Some(node) = self.scene.node(id) else {
                continue;
            };
            for component in &node.components {
                match component {
                    Component::Renderer(renderer) => {
                        paths.extend(renderer.materials.iter().flatten().cloned());
                    }
                    Component::AudioSource { clip: Some(clip) } => {
                        paths.insert(clip.clone());
                    }
                    _ => {}
                }
            }
        }
        paths.into_iter().collect()
    }

    fn scene_lighting_path(&self) -> Option<String> {
        self.scene_lighting.clone()
    }
}
