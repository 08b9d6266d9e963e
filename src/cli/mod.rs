//! CLI subcommands — init, validate, plan, resolve, verify, status,
//! completions.

use crate::core::types::RunEvent;
use crate::core::{emit, parser, planner, snapshot, types};
use crate::runlog;
use clap::{CommandFactory, Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::time::Instant;

#[derive(Parser, Debug)]
#[command(
    name = "cimiento",
    version,
    about = "Declarative landing-zone compiler — create-or-reuse resolution, deterministic naming, dependency-ordered plans"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Initialize a new zone manifest
    Init {
        /// Directory to initialize (default: current)
        #[arg(default_value = ".")]
        path: PathBuf,
    },

    /// Validate zone.yaml without resolving
    Validate {
        /// Path to zone.yaml
        #[arg(short, long, default_value = "zone.yaml")]
        file: PathBuf,
    },

    /// Show the resolved plan without writing anything
    Plan {
        /// Path to zone.yaml
        #[arg(short, long, default_value = "zone.yaml")]
        file: PathBuf,

        /// Show a single resource
        #[arg(short, long)]
        resource: Option<String>,
    },

    /// Resolve the zone: write the snapshot, run log, and outputs
    Resolve {
        /// Path to zone.yaml
        #[arg(short, long, default_value = "zone.yaml")]
        file: PathBuf,

        /// State directory
        #[arg(long, default_value = "state")]
        state_dir: PathBuf,

        /// Write the outputs document here (stdout when omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Emit outputs as JSON instead of YAML
        #[arg(long)]
        json: bool,
    },

    /// Compare a fresh resolution against the stored snapshot
    Verify {
        /// Path to zone.yaml
        #[arg(short, long, default_value = "zone.yaml")]
        file: PathBuf,

        /// State directory
        #[arg(long, default_value = "state")]
        state_dir: PathBuf,

        /// Exit non-zero on any changed decision (for CI)
        #[arg(long)]
        strict: bool,
    },

    /// Show stored snapshots
    Status {
        /// State directory
        #[arg(long, default_value = "state")]
        state_dir: PathBuf,

        /// Target a specific zone
        #[arg(short, long)]
        zone: Option<String>,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate for
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

/// Dispatch a CLI command.
pub fn dispatch(cmd: Commands) -> Result<(), String> {
    match cmd {
        Commands::Init { path } => cmd_init(&path),
        Commands::Validate { file } => cmd_validate(&file),
        Commands::Plan { file, resource } => cmd_plan(&file, resource.as_deref()),
        Commands::Resolve {
            file,
            state_dir,
            output,
            json,
        } => cmd_resolve(&file, &state_dir, output.as_deref(), json),
        Commands::Verify {
            file,
            state_dir,
            strict,
        } => cmd_verify(&file, &state_dir, strict),
        Commands::Status { state_dir, zone } => cmd_status(&state_dir, zone.as_deref()),
        Commands::Completions { shell } => {
            let mut cmd = Cli::command();
            clap_complete::generate(shell, &mut cmd, "cimiento", &mut std::io::stdout());
            Ok(())
        }
    }
}

fn cmd_init(path: &Path) -> Result<(), String> {
    let manifest_path = path.join("zone.yaml");
    if manifest_path.exists() {
        return Err(format!("{} already exists", manifest_path.display()));
    }

    let state_dir = path.join("state");
    std::fs::create_dir_all(&state_dir).map_err(|e| format!("cannot create state dir: {}", e))?;

    let template = r#"version: "1.0"
name: my-landing-zone
description: "Managed by cimiento"

scope:
  subscription: 00000000-0000-0000-0000-000000000000
  resource_group: rg-landing-zone
  location: eastus2

params: {}

resources: {}

policy:
  run_log: true
  snapshot: true
  strict_ids: true
"#;
    std::fs::write(&manifest_path, template)
        .map_err(|e| format!("cannot write {}: {}", manifest_path.display(), e))?;

    println!("Initialized zone at {}", path.display());
    println!("  Created: {}", manifest_path.display());
    println!("  Created: {}/", state_dir.display());
    Ok(())
}

fn cmd_validate(file: &Path) -> Result<(), String> {
    let config = parser::parse_config_file(file)?;
    let errors = parser::validate_config(&config);

    if errors.is_empty() {
        println!("OK: {} ({} resources)", config.name, config.resources.len());
        Ok(())
    } else {
        for e in &errors {
            eprintln!("  ERROR: {}", e);
        }
        Err(format!("{} validation error(s)", errors.len()))
    }
}

/// Parse and validate a manifest file, returning errors if invalid.
fn parse_and_validate(file: &Path) -> Result<types::ZoneConfig, String> {
    let config = parser::parse_config_file(file)?;
    let errors = parser::validate_config(&config);
    if errors.is_empty() {
        return Ok(config);
    }
    for e in &errors {
        eprintln!("  ERROR: {}", e);
    }
    Err("validation failed".to_string())
}

fn cmd_plan(file: &Path, resource_filter: Option<&str>) -> Result<(), String> {
    let config = parse_and_validate(file)?;
    let plan = planner::plan(&config)?;
    emit::print_plan(&plan, resource_filter);
    Ok(())
}

fn cmd_resolve(
    file: &Path,
    state_dir: &Path,
    output: Option<&Path>,
    json: bool,
) -> Result<(), String> {
    let start = Instant::now();
    let config = parse_and_validate(file)?;
    let plan = planner::plan(&config)?;
    let run_id = runlog::generate_run_id();

    if config.policy.run_log {
        let _ = runlog::append_event(
            state_dir,
            &config.name,
            RunEvent::ResolveStarted {
                zone: config.name.clone(),
                run_id: run_id.clone(),
                cimiento_version: env!("CARGO_PKG_VERSION").to_string(),
            },
        );
        for step in &plan.steps {
            let _ = runlog::append_event(
                state_dir,
                &config.name,
                RunEvent::ResourceResolved {
                    zone: config.name.clone(),
                    resource: step.key.clone(),
                    action: step.action.to_string(),
                    name: step.name.clone(),
                },
            );
        }
    }

    if config.policy.snapshot {
        snapshot::save_snapshot(state_dir, &snapshot::from_plan(&plan))?;
    }

    if config.policy.run_log {
        let _ = runlog::append_event(
            state_dir,
            &config.name,
            RunEvent::ResolveCompleted {
                zone: config.name.clone(),
                run_id,
                created: plan.to_create,
                reused: plan.to_reuse,
                skipped: plan.skipped,
                total_seconds: start.elapsed().as_secs_f64(),
            },
        );
    }

    match output {
        Some(path) => {
            emit::write_outputs(&plan, path, json)?;
            println!(
                "Resolved {}: {} to create, {} reused, {} skipped.",
                plan.zone, plan.to_create, plan.to_reuse, plan.skipped
            );
            println!("  Outputs: {}", path.display());
        }
        None => {
            let rendered = if json {
                emit::render_outputs_json(&plan)?
            } else {
                emit::render_outputs_yaml(&plan)?
            };
            print!("{}", rendered);
        }
    }

    Ok(())
}

fn cmd_verify(file: &Path, state_dir: &Path, strict: bool) -> Result<(), String> {
    let config = parse_and_validate(file)?;
    let stored = snapshot::load_snapshot(state_dir, &config.name)?.ok_or_else(|| {
        format!(
            "no snapshot for '{}'; run `cimiento resolve` first",
            config.name
        )
    })?;

    let plan = planner::plan(&config)?;
    let changes = snapshot::compare(&stored, &plan);

    if changes.is_empty() {
        println!(
            "No decision changes: {} matches the stored snapshot.",
            config.name
        );
        return Ok(());
    }

    for c in &changes {
        println!("  CHANGED: {} ({})", c.resource, c.field);
        println!("    Expected: {}", c.expected);
        println!("    Actual:   {}", c.actual);
        if config.policy.run_log {
            let _ = runlog::append_event(
                state_dir,
                &config.name,
                RunEvent::DecisionDrift {
                    zone: config.name.clone(),
                    resource: c.resource.clone(),
                    field: c.field.clone(),
                    expected: c.expected.clone(),
                    actual: c.actual.clone(),
                },
            );
        }
    }

    println!();
    println!("Decision changes: {}", changes.len());
    if strict {
        return Err(format!("{} decision change(s)", changes.len()));
    }
    Ok(())
}

fn cmd_status(state_dir: &Path, zone_filter: Option<&str>) -> Result<(), String> {
    let entries = std::fs::read_dir(state_dir)
        .map_err(|e| format!("cannot read state dir {}: {}", state_dir.display(), e))?;

    let mut found = false;

    for entry in entries.flatten() {
        let name = entry.file_name().to_string_lossy().to_string();
        if let Some(filter) = zone_filter {
            if name != filter {
                continue;
            }
        }
        if !entry.path().is_dir() {
            continue;
        }

        if let Some(snap) = snapshot::load_snapshot(state_dir, &name)? {
            found = true;
            println!("Zone: {}", snap.zone);
            println!("  Generated: {}", snap.generated_at);
            println!("  Generator: {}", snap.generator);
            println!("  Token:     {}", snap.token);
            println!("  Digest:    {}", snap.digest);
            println!("  Resources: {}", snap.resources.len());

            for (key, step) in &snap.resources {
                println!("    {}: {} {} [{}]", key, step.action, step.name, step.kind);
            }
            println!();
        }
    }

    if !found {
        println!("No state found. Run `cimiento resolve` first.");
    }

    Ok(())
}
