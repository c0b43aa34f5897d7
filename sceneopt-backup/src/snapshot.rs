//! Captured pre-optimization settings
//!
//! One snapshot records the fields the optimizer may change on one asset.
//! Field names are part of the persisted document; every struct defaults
//! missing fields so older or hand-edited documents still load.

use sceneopt_core::{
    AudioCompressionFormat, AudioLoadType, AudioSettings, GiWorkflow, Light, LightBakeType,
    LightingSettings, LightmapCompression, MaterialSettings, TextureSettings,
};
use serde::{Deserialize, Serialize};

/// Stored in place of a cull mode when the material had none
pub const CULL_MODE_NOT_CAPTURED: i32 = -1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ResourceKind {
    Texture,
    Audio,
    Material,
    Lighting,
    /// Keyed by scene node path rather than asset path
    Light,
}

impl std::fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ResourceKind::Texture => "texture",
            ResourceKind::Audio => "audio",
            ResourceKind::Material => "material",
            ResourceKind::Lighting => "lighting settings",
            ResourceKind::Light => "light",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TextureSnapshot {
    pub path: String,
    pub max_texture_size: u32,
    pub crunched_compression: bool,
    pub compression_quality: u32,
    pub streaming_mipmaps: bool,
}

impl TextureSnapshot {
    pub fn capture(path: impl Into<String>, settings: &TextureSettings) -> Self {
        Self {
            path: path.into(),
            max_texture_size: settings.max_texture_size,
            crunched_compression: settings.crunched_compression,
            compression_quality: settings.compression_quality,
            streaming_mipmaps: settings.streaming_mipmaps,
        }
    }

    pub fn apply_to(&self, settings: &mut TextureSettings) {
        settings.max_texture_size = self.max_texture_size;
        settings.crunched_compression = self.crunched_compression;
        settings.compression_quality = self.compression_quality;
        settings.streaming_mipmaps = self.streaming_mipmaps;
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AudioSnapshot {
    pub path: String,
    pub force_to_mono: bool,
    pub load_type: AudioLoadType,
    pub compression_format: AudioCompressionFormat,
    pub quality: f32,
}

impl AudioSnapshot {
    pub fn capture(path: impl Into<String>, settings: &AudioSettings) -> Self {
        Self {
            path: path.into(),
            force_to_mono: settings.force_to_mono,
            load_type: settings.load_type,
            compression_format: settings.compression_format,
            quality: settings.quality,
        }
    }

    pub fn apply_to(&self, settings: &mut AudioSettings) {
        settings.force_to_mono = self.force_to_mono;
        settings.load_type = self.load_type;
        settings.compression_format = self.compression_format;
        settings.quality = self.quality;
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MaterialSnapshot {
    pub path: String,
    pub enable_instancing: bool,
    /// [`CULL_MODE_NOT_CAPTURED`] when the material had no cull property
    pub cull_mode: i32,
}

impl Default for MaterialSnapshot {
    fn default() -> Self {
        Self {
            path: String::new(),
            enable_instancing: false,
            cull_mode: CULL_MODE_NOT_CAPTURED,
        }
    }
}

impl MaterialSnapshot {
    pub fn capture(path: impl Into<String>, settings: &MaterialSettings) -> Self {
        Self {
            path: path.into(),
            enable_instancing: settings.enable_instancing,
            cull_mode: settings.cull_mode.unwrap_or(CULL_MODE_NOT_CAPTURED),
        }
    }

    pub fn cull_mode(&self) -> Option<i32> {
        (self.cull_mode != CULL_MODE_NOT_CAPTURED).then_some(self.cull_mode)
    }

    /// The cull mode is only written back when one was captured and the
    /// material still has the property.
    pub fn apply_to(&self, settings: &mut MaterialSettings) {
        settings.enable_instancing = self.enable_instancing;
        if let (Some(captured), Some(current)) = (self.cull_mode(), settings.cull_mode.as_mut()) {
            *current = captured;
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LightingSnapshot {
    pub path: String,
    pub gi_workflow: GiWorkflow,
    pub lightmap_compression: LightmapCompression,
    pub lightmap_max_size: u32,
    pub direct_sample_count: u32,
}

impl LightingSnapshot {
    pub fn capture(path: impl Into<String>, settings: &LightingSettings) -> Self {
        Self {
            path: path.into(),
            gi_workflow: settings.gi_workflow,
            lightmap_compression: settings.lightmap_compression,
            lightmap_max_size: settings.lightmap_max_size,
            direct_sample_count: settings.direct_sample_count,
        }
    }

    pub fn apply_to(&self, settings: &mut LightingSettings) {
        settings.gi_workflow = self.gi_workflow;
        settings.lightmap_compression = self.lightmap_compression;
        settings.lightmap_max_size = self.lightmap_max_size;
        settings.direct_sample_count = self.direct_sample_count;
    }
}

/// A scene light, identified by its node path
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LightSnapshot {
    pub path: String,
    pub bake_type: LightBakeType,
}

impl LightSnapshot {
    pub fn capture(node_path: impl Into<String>, light: &Light) -> Self {
        Self {
            path: node_path.into(),
            bake_type: light.bake_type,
        }
    }

    pub fn apply_to(&self, light: &mut Light) {
        light.bake_type = self.bake_type;
    }
}

/// A snapshot of any kind
#[derive(Debug, Clone, PartialEq)]
pub enum PropertySnapshot {
    Texture(TextureSnapshot),
    Audio(AudioSnapshot),
    Material(MaterialSnapshot),
    Lighting(LightingSnapshot),
    Light(LightSnapshot),
}

impl PropertySnapshot {
    pub fn kind(&self) -> ResourceKind {
        match self {
            PropertySnapshot::Texture(_) => ResourceKind::Texture,
            PropertySnapshot::Audio(_) => ResourceKind::Audio,
            PropertySnapshot::Material(_) => ResourceKind::Material,
            PropertySnapshot::Lighting(_) => ResourceKind::Lighting,
            PropertySnapshot::Light(_) => ResourceKind::Light,
        }
    }

    pub fn path(&self) -> &str {
        match self {
            PropertySnapshot::Texture(s) => &s.path,
            PropertySnapshot::Audio(s) => &s.path,
            PropertySnapshot::Material(s) => &s.path,
            PropertySnapshot::Lighting(s) => &s.path,
            PropertySnapshot::Light(s) => &s.path,
        }
    }
}

impl From<TextureSnapshot> for PropertySnapshot {
    fn from(s: TextureSnapshot) -> Self {
        PropertySnapshot::Texture(s)
    }
}

impl From<AudioSnapshot> for PropertySnapshot {
    fn from(s: AudioSnapshot) -> Self {
        PropertySnapshot::Audio(s)
    }
}

impl From<MaterialSnapshot> for PropertySnapshot {
    fn from(s: MaterialSnapshot) -> Self {
        PropertySnapshot::Material(s)
    }
}

impl From<LightingSnapshot> for PropertySnapshot {
    fn from(s: LightingSnapshot) -> Self {
        PropertySnapshot::Lighting(s)
    }
}

impl From<LightSnapshot> for PropertySnapshot {
    fn from(s: LightSnapshot) -> Self {
        PropertySnapshot::Light(s)
    }
}

/// The persisted form of a snapshot store: one list per kind, in capture order
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SnapshotDocument {
    pub textures: Vec<TextureSnapshot>,
    pub audios: Vec<AudioSnapshot>,
    pub materials: Vec<MaterialSnapshot>,
    pub lighting: Vec<LightingSnapshot>,
    pub lights: Vec<LightSnapshot>,
}

impl SnapshotDocument {
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn len(&self) -> usize {
        self.textures.len()
            + self.audios.len()
            + self.materials.len()
            + self.lighting.len()
            + self.lights.len()
    }

    /// Append without checking for duplicates
    pub fn push(&mut self, snapshot: PropertySnapshot) {
        match snapshot {
            PropertySnapshot::Texture(s) => self.textures.push(s),
            PropertySnapshot::Audio(s) => self.audios.push(s),
            PropertySnapshot::Material(s) => self.materials.push(s),
            PropertySnapshot::Lighting(s) => self.lighting.push(s),
            PropertySnapshot::Light(s) => self.lights.push(s),
        }
    }

    /// All `(kind, path)` keys in document order
    pub fn keys(&self) -> impl Iterator<Item = (ResourceKind, &str)> {
        self.textures
            .iter()
            .map(|s| (ResourceKind::Texture, s.path.as_str()))
            .chain(self.audios.iter().map(|s| (ResourceKind::Audio, s.path.as_str())))
            .chain(
                self.materials
                    .iter()
                    .map(|s| (ResourceKind::Material, s.path.as_str())),
            )
            .chain(
                self.lighting
                    .iter()
                    .map(|s| (ResourceKind::Lighting, s.path.as_str())),
            )
            .chain(self.lights.iter().map(|s| (ResourceKind::Light, s.path.as_str())))
    }

    /// Every snapshot in document order
    pub fn into_snapshots(self) -> impl Iterator<Item = PropertySnapshot> {
        let Self {
            textures,
            audios,
            materials,
            lighting,
            lights,
        } = self;
        textures
            .into_iter()
            .map(PropertySnapshot::from)
            .chain(audios.into_iter().map(PropertySnapshot::from))
            .chain(materials.into_iter().map(PropertySnapshot::from))
            .chain(lighting.into_iter().map(PropertySnapshot::from))
            .chain(lights.into_iter().map(PropertySnapshot::from))
    }

    pub fn to_json(&self) -> sceneopt_core::Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(text: &str) -> sceneopt_core::Result<Self> {
        Ok(serde_json::from_str(text)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_fields_default() {
        let doc = SnapshotDocument::from_json(
            r#"{ "materials": [ { "path": "Assets/a.mat", "future_field": 3 } ] }"#,
        )
        .unwrap();
        assert!(doc.textures.is_empty());
        assert_eq!(doc.materials[0].path, "Assets/a.mat");
        assert_eq!(doc.materials[0].cull_mode, CULL_MODE_NOT_CAPTURED);
        assert!(!doc.materials[0].enable_instancing);
    }

    #[test]
    fn test_document_uses_field_names() {
        let mut doc = SnapshotDocument::default();
        doc.push(
            TextureSnapshot::capture(
                "Assets/t.png",
                &TextureSettings {
                    max_texture_size: 4096,
                    ..Default::default()
                },
            )
            .into(),
        );
        let json = doc.to_json().unwrap();
        assert!(json.contains("\"max_texture_size\": 4096"));
        assert!(json.contains("\"textures\""));
    }

    #[test]
    fn test_material_cull_sentinel() {
        let no_cull = MaterialSnapshot::capture("m", &MaterialSettings::default());
        assert_eq!(no_cull.cull_mode, CULL_MODE_NOT_CAPTURED);
        assert_eq!(no_cull.cull_mode(), None);

        // A captured sentinel never overwrites a real cull mode
        let mut settings = MaterialSettings {
            enable_instancing: true,
            cull_mode: Some(2),
        };
        no_cull.apply_to(&mut settings);
        assert_eq!(settings.cull_mode, Some(2));
        assert!(!settings.enable_instancing);

        let with_cull = MaterialSnapshot::capture(
            "m",
            &MaterialSettings {
                enable_instancing: false,
                cull_mode: Some(0),
            },
        );
        with_cull.apply_to(&mut settings);
        assert_eq!(settings.cull_mode, Some(0));
    }

    #[test]
    fn test_light_snapshot_restores_bake_type() {
        let original = Light {
            bake_type: LightBakeType::Mixed,
            intensity: 2.0,
        };
        let snapshot = LightSnapshot::capture("Lights/Sun", &original);
        let mut light = Light {
            bake_type: LightBakeType::Baked,
            intensity: 2.0,
        };
        snapshot.apply_to(&mut light);
        assert_eq!(light, original);
        assert_eq!(PropertySnapshot::from(snapshot).kind(), ResourceKind::Light);
    }

    #[test]
    fn test_keys_in_document_order() {
        let mut doc = SnapshotDocument::default();
        doc.push(MaterialSnapshot::capture("m", &MaterialSettings::default()).into());
        doc.push(AudioSnapshot::capture("a", &AudioSettings::default()).into());
        let keys: Vec<_> = doc.keys().collect();
        assert_eq!(
            keys,
            vec![(ResourceKind::Audio, "a"), (ResourceKind::Material, "m")]
        );
    }
}
