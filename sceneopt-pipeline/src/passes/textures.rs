use crate::config::OptimizerConfig;
use crate::pass::{OptimizationPass, PassContext};
use sceneopt_core::{Result, TextureSettings, TextureType};

/// Largest texture size the download-size preset allows
pub const DOWNLOAD_MAX_TEXTURE_SIZE: u32 = 1024;
pub const DOWNLOAD_COMPRESSION_QUALITY: u32 = 50;

/// Target settings for scene textures
///
/// UI textures (GUI, sprite) are never crunched and never stream mipmaps.
/// Normal maps are only crunched when crunching is forced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextureRules {
    pub max_size: u32,
    pub quality: u32,
    pub force_crunch: bool,
}

impl TextureRules {
    pub fn from_config(config: &OptimizerConfig) -> Self {
        Self {
            max_size: config.texture_size_limit(),
            quality: config.texture_quality(),
            force_crunch: config.force_crunch,
        }
    }

    /// New settings for `current`, `None` if it already complies
    pub fn apply(&self, current: &TextureSettings) -> Option<TextureSettings> {
        let ui = current.texture_type.is_ui();
        let normal_map = current.texture_type == TextureType::NormalMap;

        let mut next = current.clone();
        if !ui {
            next.streaming_mipmaps = true;
        }
        if !ui && (!normal_map || self.force_crunch) {
            next.crunched_compression = true;
            next.compression_quality = self.quality;
        }
        next.max_texture_size = next.max_texture_size.min(self.max_size);
        (next != *current).then_some(next)
    }
}

/// Download-size preset: small and crunched, except UI textures and normal maps
pub fn download_size_texture(current: &TextureSettings) -> Option<TextureSettings> {
    let mut next = current.clone();
    next.max_texture_size = next.max_texture_size.min(DOWNLOAD_MAX_TEXTURE_SIZE);
    if !current.texture_type.is_ui() && current.texture_type != TextureType::NormalMap {
        next.crunched_compression = true;
        next.compression_quality = DOWNLOAD_COMPRESSION_QUALITY;
    }
    (next != *current).then_some(next)
}

/// Apply `rule` to every texture the live scene depends on
///
/// Each texture is captured, and its file backed up, before it changes.
/// Returns the number of textures changed.
pub fn optimize_textures_with<F>(ctx: &mut PassContext<'_>, rule: F) -> usize
where
    F: Fn(&TextureSettings) -> Option<TextureSettings>,
{
    let mut count = 0;
    for path in ctx.host.scene_dependencies() {
        let Some(current) = ctx.host.texture(&path) else {
            continue;
        };
        let Some(next) = rule(&current) else {
            continue;
        };
        ctx.store.capture_texture(&path, &current);
        ctx.backup_file(&path);
        match ctx.host.apply_texture(&path, &next) {
            Ok(()) => {
                count += 1;
                ctx.stats.textures_optimized += 1;
                ctx.stats.texture_bytes_saved +=
                    current.estimated_memory_bytes() as i64 - next.estimated_memory_bytes() as i64;
            }
            Err(e) => log::warn!("could not optimize texture '{path}': {e}"),
        }
    }
    count
}

/// Compresses and clamps the textures used by the live scene
#[derive(Debug, Clone, Copy, Default)]
pub struct OptimizeTextures;

impl OptimizationPass for OptimizeTextures {
    fn name(&self) -> &'static str {
        "textures"
    }

    fn run(&self, ctx: &mut PassContext<'_>) -> Result<usize> {
        let rules = TextureRules::from_config(ctx.config);
        let count = optimize_textures_with(ctx, |current| rules.apply(current));
        log::info!("optimized {count} textures");
        Ok(count)
    }
}
