use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use timecrunch_core::{Bindings, Threshold, TimeCrunch, default_definitions_dir, load_file};
use timecrunch_types::formatting::format_human_time;
use tracing_subscriber::filter::EnvFilter;

#[derive(Parser)]
#[command(version, about = "Validate a unit definitions file and run it forward")]
struct Args {
    /// Definitions file (defaults to units.toml in the user config directory)
    #[arg(short, long)]
    file: Option<PathBuf>,

    /// Advance the tick unit this many times before reporting
    #[arg(short, long, default_value_t = 0)]
    ticks: u64,

    /// Print the update object as JSON
    #[arg(long)]
    json: bool,
}

/// Initialize logging to stderr; RUST_LOG overrides the `info` default.
fn init_logging() {
    let filter = EnvFilter::builder()
        .with_default_directive(tracing::Level::INFO.into())
        .from_env_lossy();

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();
}

/// Names a definitions file can use without any Rust code of its own.
fn bindings() -> Bindings {
    Bindings::new().with_hook("log_time", |crunch| {
        tracing::info!(
            time = %format_human_time(crunch.human_time().iter()),
            "Hook fired"
        );
    })
}

fn main() -> ExitCode {
    init_logging();
    let args = Args::parse();

    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::error!("{err}");
            ExitCode::FAILURE
        }
    }
}

fn run(args: &Args) -> Result<(), String> {
    let path = match &args.file {
        Some(path) => path.clone(),
        None => default_definitions_dir()
            .map(|dir| dir.join("units.toml"))
            .ok_or("No --file given and no config directory available")?,
    };

    let units = load_file(&path, &bindings()).map_err(|e| e.to_string())?;
    let mut crunch = TimeCrunch::from_raw(units).map_err(|e| e.to_string())?;
    tracing::info!(file = %path.display(), "Definitions are valid");

    if !args.json {
        print_hierarchy(&crunch);
    }

    for _ in 0..args.ticks {
        crunch.advance().map_err(|e| e.to_string())?;
    }

    let update = crunch.update_object().map_err(|e| e.to_string())?;
    if args.json {
        let json = serde_json::to_string_pretty(&update).map_err(|e| e.to_string())?;
        println!("{json}");
        return Ok(());
    }

    println!();
    println!("Time: {}", format_human_time(update.time.iter()));
    for (unit, state) in &update.states {
        if let Some(state) = state {
            println!("  {unit}: {state}");
        }
    }
    Ok(())
}

fn print_hierarchy(crunch: &TimeCrunch) {
    println!("Units:");
    for unit in crunch.system().iter() {
        let marker = if unit.tick { " [tick]" } else { "" };
        match (&unit.next, &unit.max) {
            (Some(next), Some(Threshold::Fixed(max))) => {
                println!("  {}{marker} → {next} ({max})", unit.id);
            }
            (Some(next), _) => println!("  {}{marker} → {next} (computed)", unit.id),
            (None, _) => println!("  {}{marker}", unit.id),
        }
    }
}
