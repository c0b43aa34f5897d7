use crate::pass::{live_audio_clips, OptimizationPass, PassContext};
use sceneopt_core::{AudioCompressionFormat, AudioLoadType, AudioSettings, Result};

/// Vorbis quality for clips moved off uncompressed PCM
pub const COMPRESSED_AUDIO_QUALITY: f32 = 0.7;
/// Quality cap of the download-size preset
pub const DOWNLOAD_AUDIO_QUALITY: f32 = 0.5;

/// Mono, and compressed in memory when the clip was decompressed PCM
pub fn optimized_audio(current: &AudioSettings) -> Option<AudioSettings> {
    let mut next = current.clone();
    next.force_to_mono = true;
    if current.load_type == AudioLoadType::DecompressOnLoad
        && current.compression_format == AudioCompressionFormat::Pcm
    {
        next.load_type = AudioLoadType::CompressedInMemory;
        next.compression_format = AudioCompressionFormat::Vorbis;
        next.quality = COMPRESSED_AUDIO_QUALITY;
    }
    (next != *current).then_some(next)
}

/// Download-size preset: mono Vorbis kept compressed in memory, quality capped
pub fn download_size_audio(current: &AudioSettings) -> Option<AudioSettings> {
    let mut next = current.clone();
    next.force_to_mono = true;
    next.load_type = AudioLoadType::CompressedInMemory;
    next.compression_format = AudioCompressionFormat::Vorbis;
    next.quality = next.quality.min(DOWNLOAD_AUDIO_QUALITY);
    (next != *current).then_some(next)
}

/// Apply `rule` to each clip in `paths` that the host knows as audio
pub fn optimize_audio_with<F>(ctx: &mut PassContext<'_>, paths: Vec<String>, rule: F) -> usize
where
    F: Fn(&AudioSettings) -> Option<AudioSettings>,
{
    let mut count = 0;
    for path in paths {
        let Some(current) = ctx.host.audio(&path) else {
            continue;
        };
        let Some(next) = rule(&current) else {
            continue;
        };
        ctx.store.capture_audio(&path, &current);
        ctx.backup_file(&path);
        match ctx.host.apply_audio(&path, &next) {
            Ok(()) => {
                count += 1;
                ctx.stats.audio_optimized += 1;
            }
            Err(e) => log::warn!("could not optimize audio clip '{path}': {e}"),
        }
    }
    count
}

/// Compresses the clips played by audio sources in the live scene
#[derive(Debug, Clone, Copy, Default)]
pub struct OptimizeAudio;

impl OptimizationPass for OptimizeAudio {
    fn name(&self) -> &'static str {
        "audio"
    }

    fn run(&self, ctx: &mut PassContext<'_>) -> Result<usize> {
        let clips = live_audio_clips(ctx.host.scene());
        let count = optimize_audio_with(ctx, clips, optimized_audio);
        log::info!("optimized {count} audio clips");
        Ok(count)
    }
}
