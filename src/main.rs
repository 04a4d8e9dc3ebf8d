mod cli;

use splitforge::{
    cache::{FileDescriptor, JsonFileCache},
    config::{self, Config},
    export::Exporter,
    store::{OpenOutcome, SessionStore},
};
use splitforge_av::ExportProgress;
use splitforge_core::SegmentId;
use splitforge_timeline::{Timeline, Transition, MARKER_EPSILON};

use anyhow::{Context, Result};
use clap::Parser;
use cli::{format_time, Cli, Commands};
use std::io::Write;
use std::path::Path;
use tokio_util::sync::CancellationToken;

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Respect RUST_LOG env var if set, otherwise use defaults based on verbose flag
    let env_filter = std::env::var("RUST_LOG").unwrap_or_else(|_| {
        if cli.verbose {
            "splitforge=trace,splitforge_timeline=trace,splitforge_av=debug".to_string()
        } else {
            "splitforge=warn,splitforge_timeline=warn,splitforge_av=warn".to_string()
        }
    });

    tracing_subscriber::fmt()
        .with_env_filter(&env_filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Open { file, fresh } => {
            let config = config::load_config_or_default(cli.config.as_deref())?;
            open_file(&config, &file, fresh)
        }
        Commands::Show { json } => {
            let config = config::load_config_or_default(cli.config.as_deref())?;
            show(&session_store(&config), json)
        }
        Commands::Mark { time } => edit(cli.config.as_deref(), |t| t.add_marker(time)),
        Commands::MoveMarker { id, at, to } => {
            let config = config::load_config_or_default(cli.config.as_deref())?;
            let store = session_store(&config);
            let marker = resolve_marker(&store.snapshot(), id.as_deref(), at)?;
            commit(&store, |t| t.update_marker(marker, to))
        }
        Commands::Unmark { id, at } => {
            let config = config::load_config_or_default(cli.config.as_deref())?;
            let store = session_store(&config);
            let marker = resolve_marker(&store.snapshot(), id.as_deref(), at)?;
            commit(&store, |t| t.delete_marker(marker))
        }
        Commands::Rename { segment, name } => edit_segment(cli.config.as_deref(), &segment, |t, id| {
            t.rename_segment(id, &name)
        }),
        Commands::Toggle { segment } => edit_segment(cli.config.as_deref(), &segment, |t, id| {
            t.toggle_segment_selected(id)
        }),
        Commands::RemoveSegment { segment } => {
            edit_segment(cli.config.as_deref(), &segment, |t, id| t.delete_segment(id))
        }
        Commands::SetBounds {
            segment,
            start,
            end,
        } => edit_segment(cli.config.as_deref(), &segment, |t, id| {
            t.update_segment_time(id, start, end)
        }),
        Commands::Cut {
            source,
            segment,
            output,
        } => {
            let config = config::load_config_or_default(cli.config.as_deref())?;
            cut(&config, &source, &segment, output)
        }
        Commands::Export { source, merge } => {
            let config = config::load_config_or_default(cli.config.as_deref())?;
            export(&config, &source, merge)
        }
        Commands::Clear => {
            let config = config::load_config_or_default(cli.config.as_deref())?;
            session_store(&config).clear();
            println!("Session cleared");
            Ok(())
        }
        Commands::CheckTools => {
            let config = config::load_config_or_default(cli.config.as_deref())?;
            check_tools(&config)
        }
        Commands::InitConfig { path, force } => init_config(&path, force),
        Commands::Version => {
            println!("splitforge {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}

/// The store for this invocation, resumed from the configured cache.
fn session_store(config: &Config) -> SessionStore {
    if config.state.enabled {
        let path = config.state.resolved_cache_path();
        tracing::debug!("Using state cache {:?}", path);
        SessionStore::restore(Box::new(JsonFileCache::new(path)))
    } else {
        SessionStore::in_memory()
    }
}

fn open_file(config: &Config, file: &Path, fresh: bool) -> Result<()> {
    let exporter = Exporter::from_config(config);
    let rt = tokio::runtime::Runtime::new()?;
    let info = rt
        .block_on(splitforge_av::probe(exporter.tools(), file))
        .with_context(|| format!("Failed to probe {:?}", file))?;

    let store = session_store(config);
    let outcome = store.open(FileDescriptor::from(&info), info.duration, fresh);
    let t = store.snapshot();
    match outcome {
        OpenOutcome::Restored => println!(
            "Restored session for {} ({} markers, {} segments)",
            info.file_name,
            t.markers().len(),
            t.segments().len()
        ),
        OpenOutcome::Fresh => println!(
            "Opened {} ({})",
            info.file_name,
            format_time(info.duration)
        ),
    }
    Ok(())
}

fn show(store: &SessionStore, json: bool) -> Result<()> {
    let t = store.snapshot();

    if json {
        let out = serde_json::json!({
            "file": store.file(),
            "timeline": t,
        });
        println!("{}", serde_json::to_string_pretty(&out)?);
        return Ok(());
    }

    let Some(file) = store.file().filter(|_| t.is_loaded()) else {
        println!("No file open. Use `splitforge open <file>` first.");
        return Ok(());
    };

    println!("File: {} ({} bytes)", file.name, file.size);
    println!("Duration: {}", format_time(t.duration()));

    println!("\nMarkers: {}", t.markers().len());
    for m in t.markers() {
        println!("  {}  {}", format_time(m.time), m.id);
    }

    println!("\nSegments: {}", t.segments().len());
    for (i, s) in t.segments().iter().enumerate() {
        println!(
            "  {:>2}. [{}] {:<24} {} - {}  ({:.3}s)  {}",
            i + 1,
            if s.selected { "x" } else { " " },
            s.name,
            format_time(s.start_time),
            format_time(s.end_time),
            s.duration(),
            s.id
        );
    }
    Ok(())
}

/// Apply `edit` and report the outcome. A rejection exits with an error and
/// leaves the session as it was.
fn commit(store: &SessionStore, edit: impl FnOnce(&Timeline) -> Transition) -> Result<()> {
    store
        .apply(edit)
        .map_err(|rejection| anyhow::anyhow!("Rejected: {rejection}"))?;
    let t = store.snapshot();
    println!(
        "OK: {} markers, {} segments",
        t.markers().len(),
        t.segments().len()
    );
    Ok(())
}

fn edit(config_path: Option<&Path>, edit: impl FnOnce(&Timeline) -> Transition) -> Result<()> {
    let config = config::load_config_or_default(config_path)?;
    commit(&session_store(&config), edit)
}

fn edit_segment(
    config_path: Option<&Path>,
    segment: &str,
    edit: impl FnOnce(&Timeline, SegmentId) -> Transition,
) -> Result<()> {
    let config = config::load_config_or_default(config_path)?;
    let store = session_store(&config);
    let id = resolve_segment(&store.snapshot(), segment)?;
    commit(&store, |t| edit(t, id))
}

/// Resolve a 1-based position or a segment id.
fn resolve_segment(t: &Timeline, reference: &str) -> Result<SegmentId> {
    if let Some(time) = reference.strip_prefix('@') {
        let time = cli::parse_time(time).map_err(anyhow::Error::msg)?;
        return t
            .segment_at(time)
            .map(|s| s.id)
            .with_context(|| format!("No segment covers {}", format_time(time)));
    }
    if let Ok(position) = reference.parse::<usize>() {
        return t
            .segments()
            .get(position.wrapping_sub(1))
            .map(|s| s.id)
            .with_context(|| {
                format!(
                    "No segment at position {position} (there are {})",
                    t.segments().len()
                )
            });
    }
    reference
        .parse::<SegmentId>()
        .with_context(|| format!("'{reference}' is neither a segment position, @time nor an id"))
}

fn resolve_marker(
    t: &Timeline,
    id: Option<&str>,
    at: Option<f64>,
) -> Result<splitforge_core::MarkerId> {
    match (id, at) {
        (Some(id), _) => id
            .parse()
            .with_context(|| format!("'{id}' is not a marker id")),
        (None, Some(at)) => t
            .marker_near(at, MARKER_EPSILON)
            .map(|m| m.id)
            .with_context(|| format!("No marker within {MARKER_EPSILON}s of {}", format_time(at))),
        (None, None) => anyhow::bail!("Give a marker id or --at <time>"),
    }
}

/// Check that `source` is the file the session was opened with.
fn check_source(store: &SessionStore, source: &Path) -> Result<()> {
    let meta = std::fs::metadata(source)
        .with_context(|| format!("Source file does not exist: {:?}", source))?;
    let name = source
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();
    let given = FileDescriptor::new(name, meta.len());

    match store.file() {
        Some(open) if open == given => Ok(()),
        Some(open) => anyhow::bail!(
            "The session belongs to {} ({} bytes), not {:?}",
            open.name,
            open.size,
            source
        ),
        None => anyhow::bail!("No file open. Use `splitforge open <file>` first."),
    }
}

/// A token cancelled on Ctrl-C.
fn ctrl_c_token(rt: &tokio::runtime::Runtime) -> CancellationToken {
    let token = CancellationToken::new();
    let trigger = token.clone();
    rt.spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            trigger.cancel();
        }
    });
    token
}

fn print_progress(p: ExportProgress) {
    let speed = p.speed.as_deref().unwrap_or("");
    eprint!("\r{:5.1}% {speed:<10}", p.percent);
    let _ = std::io::stderr().flush();
}

fn cut(config: &Config, source: &Path, segment: &str, output: Option<std::path::PathBuf>) -> Result<()> {
    let store = session_store(config);
    check_source(&store, source)?;
    let t = store.snapshot();
    let id = resolve_segment(&t, segment)?;

    let exporter = Exporter::from_config(config);
    let rt = tokio::runtime::Runtime::new()?;
    let cancel = ctrl_c_token(&rt);
    let file = rt.block_on(exporter.export_segment(
        source,
        &t,
        id,
        output,
        print_progress,
        Some(cancel),
    ));
    eprintln!();

    let file = file?;
    println!("{} ({} bytes)", file.path.display(), file.size);
    Ok(())
}

fn export(config: &Config, source: &Path, merge: bool) -> Result<()> {
    let store = session_store(config);
    check_source(&store, source)?;
    let t = store.snapshot();

    let exporter = Exporter::from_config(config);
    let rt = tokio::runtime::Runtime::new()?;
    let cancel = ctrl_c_token(&rt);
    let files = rt.block_on(exporter.export_selected(
        source,
        &t,
        merge,
        print_progress,
        Some(cancel),
    ));
    eprintln!();

    for file in files? {
        println!("{} ({} bytes)", file.path.display(), file.size);
    }
    Ok(())
}

fn check_tools(config: &Config) -> Result<()> {
    println!("Checking external tools...\n");

    let exporter = Exporter::from_config(config);
    let mut all_ok = true;

    for tool in exporter.tools().check_all() {
        let status = if tool.available {
            "✓"
        } else {
            all_ok = false;
            "✗"
        };

        print!("{} {}", status, tool.name);

        if let Some(ref version) = tool.version {
            print!(" ({})", version);
        }

        if let Some(ref path) = tool.path {
            print!(" - {}", path.display());
        }

        println!();
    }

    println!();
    if all_ok {
        println!("All required tools are available!");
    } else {
        println!("Some tools are missing. Install ffmpeg to probe and export.");
    }

    Ok(())
}

fn init_config(path: &Path, force: bool) -> Result<()> {
    if path.exists() && !force {
        anyhow::bail!("{:?} already exists (use --force to replace it)", path);
    }
    config::persist::save_config(path, &Config::default())?;
    println!("Wrote default configuration to {}", path.display());
    Ok(())
}
