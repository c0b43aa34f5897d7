//! Per-run counters and the run report

use std::fmt;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OptimizationStats {
    pub missing_components_removed: usize,
    pub materials_instanced: usize,
    pub textures_optimized: usize,
    /// Estimated runtime memory saved; negative if textures grew
    pub texture_bytes_saved: i64,
    pub audio_optimized: usize,
    pub static_flags_set: usize,
    pub materials_culled: usize,
    pub lighting_settings_changed: usize,
    pub lights_baked: usize,
}

impl OptimizationStats {
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    pub fn total_changes(&self) -> usize {
        self.missing_components_removed
            + self.materials_instanced
            + self.textures_optimized
            + self.audio_optimized
            + self.static_flags_set
            + self.materials_culled
            + self.lighting_settings_changed
            + self.lights_baked
    }
}

impl fmt::Display for OptimizationStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Optimization report")?;
        writeln!(
            f,
            "  missing components removed: {}",
            self.missing_components_removed
        )?;
        writeln!(f, "  materials instanced:        {}", self.materials_instanced)?;
        writeln!(f, "  textures optimized:         {}", self.textures_optimized)?;
        writeln!(
            f,
            "    estimated memory saved:   {}",
            format_bytes(self.texture_bytes_saved)
        )?;
        writeln!(f, "  audio clips optimized:      {}", self.audio_optimized)?;
        writeln!(f, "  static flags set:           {}", self.static_flags_set)?;
        writeln!(f, "  materials culled:           {}", self.materials_culled)?;
        writeln!(
            f,
            "  lighting settings changed:  {}",
            self.lighting_settings_changed
        )?;
        write!(f, "  lights set to baked:        {}", self.lights_baked)
    }
}

/// Human readable byte count with binary units
pub fn format_bytes(bytes: i64) -> String {
    const UNITS: [&str; 4] = ["B", "KB", "MB", "GB"];
    let sign = if bytes < 0 { "-" } else { "" };
    let mut value = bytes.unsigned_abs() as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{sign}{value} {}", UNITS[unit])
    } else {
        format!("{sign}{value:.1} {}", UNITS[unit])
    }
}
