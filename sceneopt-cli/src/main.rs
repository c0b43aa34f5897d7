//! sceneopt - reversible optimization of a scene project
//!
//! Operates on a project JSON file holding asset import settings and the
//! scene graph. Snapshots, file backups and the error log live next to it.

use anyhow::{anyhow, bail, Context, Result};
use clap::{Parser, Subcommand};
use sceneopt_core::{NodeId, Project, SceneHost};
use sceneopt_pipeline::{
    analyze_meshes, AutoOptimizeSession, LodSettings, Optimizer, OptimizerConfig, Profile,
    RunReport,
};
use std::path::{Path, PathBuf};

#[derive(Debug, Parser)]
#[command(name = "sceneopt")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Project file
    #[arg(long, default_value = "sceneopt-project.json")]
    project: PathBuf,

    /// Optimizer configuration; defaults to sceneopt.json next to the project
    #[arg(long)]
    config: Option<PathBuf>,

    /// Override the configured profile
    #[arg(long)]
    profile: Option<Profile>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Run every enabled pass
    Run,
    /// Run a single pass by name
    Pass { name: String },
    /// Restore every captured setting
    Revert,
    /// Show passes and snapshot state
    Status,
    /// Apply aggressive download-size settings
    DownloadSize,
    /// Merge primitives below a node that share a material
    Merge { root: String },
    /// Generate LOD levels for a node
    Lods {
        target: String,
        /// Replace an existing LOD group
        #[arg(long)]
        overwrite: bool,
    },
    /// List the heaviest meshes in the scene
    Analyze,
    /// Run a command against the optimized project, then revert
    ///
    /// Optimization only happens when `auto_optimize_on_play` is set.
    Play {
        #[arg(trailing_var_arg = true, allow_hyphen_values = true, required = true)]
        command: Vec<String>,
    },
}

fn project_root(project: &Path) -> PathBuf {
    project
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("."))
}

fn print_failures(report: &RunReport) {
    for failure in report.failures() {
        if let Err(message) = &failure.result {
            eprintln!("{message}");
        }
    }
    if let Some(e) = &report.save_error {
        eprintln!("{e}");
    }
}

fn find_node(project: &Project, name: &str) -> Result<NodeId> {
    project
        .scene()
        .find_by_name(name)
        .ok_or_else(|| anyhow!("no scene node named '{name}'"))
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let root = project_root(&cli.project);
    let config_path = cli.config.clone().unwrap_or_else(|| root.join("sceneopt.json"));
    let mut config = OptimizerConfig::load(&config_path)
        .with_context(|| format!("loading config {}", config_path.display()))?;
    if let Some(profile) = cli.profile {
        config.profile = profile;
    }

    let mut project = Project::load(&cli.project)
        .with_context(|| format!("loading project {}", cli.project.display()))?;
    let mut optimizer = Optimizer::open(config, &root);

    let modified = match cli.command {
        Commands::Run => {
            let report = optimizer.run_all(&mut project);
            print_failures(&report);
            println!("{}", optimizer.stats());
            true
        }
        Commands::Pass { name } => {
            let report = optimizer.run_pass(&mut project, &name)?;
            print_failures(&report);
            println!("{name}: {} changes", report.changed());
            true
        }
        Commands::Revert => {
            if !optimizer.store().has_backup() {
                println!("nothing to revert");
                false
            } else {
                let report = optimizer.revert(&mut project);
                for failure in &report.failures {
                    eprintln!("{failure}");
                }
                if let Some(e) = &report.save_error {
                    eprintln!("{e}");
                }
                println!("restored {} settings", report.restored);
                true
            }
        }
        Commands::Status => {
            for (name, enabled) in optimizer.passes() {
                println!("{:<18} {}", name, if enabled { "on" } else { "off" });
            }
            let session = AutoOptimizeSession::from_config(optimizer.config());
            println!(
                "auto-optimize on play: {}",
                if session.is_enabled() { "on" } else { "off" }
            );
            let document = optimizer.store().document();
            println!(
                "snapshots: {} textures, {} audio clips, {} materials, {} lighting settings, {} lights",
                document.textures.len(),
                document.audios.len(),
                document.materials.len(),
                document.lighting.len(),
                document.lights.len()
            );
            false
        }
        Commands::DownloadSize => {
            let report = optimizer.optimize_for_download_size(&mut project);
            print_failures(&report);
            println!(
                "download size settings applied to {} assets",
                report.changed()
            );
            true
        }
        Commands::Merge { root: name } => {
            let node = find_node(&project, &name)?;
            let report = optimizer.merge_meshes(&mut project, node)?;
            for merged in &report.merged {
                println!(
                    "{}: {} primitives -> {} vertices, {} triangles",
                    merged.material,
                    merged.sources.len(),
                    merged.vertex_count,
                    merged.face_count
                );
            }
            for error in &report.errors {
                eprintln!("{error}");
            }
            !report.merged.is_empty()
        }
        Commands::Lods { target, overwrite } => {
            let node = find_node(&project, &target)?;
            let settings = LodSettings {
                overwrite,
                ..Default::default()
            };
            let report = optimizer.generate_lods(&mut project, node, &settings)?;
            for lod in &report.generated {
                println!(
                    "LOD{}: resolution {}, {} triangles",
                    lod.level, lod.resolution, lod.face_count
                );
            }
            for level in &report.collapsed {
                println!("LOD{level}: collapsed, omitted");
            }
            true
        }
        Commands::Play { command } => {
            let Some((program, args)) = command.split_first() else {
                bail!("no command to run");
            };
            let mut session = AutoOptimizeSession::from_config(optimizer.config());
            if let Some(report) = session.on_enter_play(&mut optimizer, &mut project) {
                print_failures(&report);
                project
                    .save(&cli.project)
                    .with_context(|| format!("saving project {}", cli.project.display()))?;
            }
            let status = std::process::Command::new(program).args(args).status();
            if let Some(report) = session.on_exit_play(&mut optimizer, &mut project) {
                for failure in &report.failures {
                    eprintln!("{failure}");
                }
            }
            let status = status.with_context(|| format!("running {program}"))?;
            if !status.success() {
                log::warn!("{program} exited with {status}");
            }
            session.is_enabled()
        }
        Commands::Analyze => {
            let heavy = analyze_meshes(project.scene());
            if heavy.is_empty() {
                println!("no meshes above 1000 triangles");
            }
            for mesh in heavy {
                println!("{:>8}  {}", mesh.triangles, mesh.name);
            }
            false
        }
    };

    if modified {
        project
            .save(&cli.project)
            .with_context(|| format!("saving project {}", cli.project.display()))?;
        log::debug!("saved {}", cli.project.display());
    }
    Ok(())
}
