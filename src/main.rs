//! Tickwire - Digital Logic Circuit Simulator
//!
//! Loads a saved circuit, runs it for a number of ticks and reports the
//! resulting circuit states.
//!
//! # Usage
//!
//! ```bash
//! tickwire counter.json --ticks 16 --interval-ms 250 --output counter-after.json
//! ```

use std::path::PathBuf;
use std::time::{Duration, Instant};

use clap::Parser;
use tickwire_core::{
    components::{CircuitKind, SEGMENTS},
    error::Result,
    save::{self, SaveOptions},
    Circuit, CircuitType, Controller, SimulationConfig,
};

/// Tick-based digital logic circuit simulator
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the save file (plain JSON or compressed)
    #[arg(value_name = "SAVE_FILE", required_unless_present = "list_types")]
    save_file: Option<PathBuf>,

    /// Number of ticks to run
    #[arg(short, long, default_value_t = 1)]
    ticks: u64,

    /// Pace ticks with this interval instead of running them back to back
    #[arg(short, long, value_name = "MS")]
    interval_ms: Option<u64>,

    /// Write the resulting simulation to this file
    #[arg(short, long, value_name = "PATH")]
    output: Option<PathBuf>,

    /// Include runtime state in the written save
    #[arg(long)]
    include_state: bool,

    /// Write plain JSON
    #[arg(long, conflicts_with = "force_compress")]
    no_compress: bool,

    /// Compress even when the result is larger
    #[arg(long)]
    force_compress: bool,

    /// Do not print circuit states
    #[arg(short, long)]
    quiet: bool,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,

    /// List the known circuit types and exit
    #[arg(long)]
    list_types: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let level = if args.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    if args.list_types {
        for circuit_type in CircuitType::ALL {
            println!("{:<16} {}", circuit_type.type_name(), circuit_type.display_name());
        }
        return Ok(());
    }

    let Some(path) = args.save_file.as_deref() else {
        return Ok(());
    };

    // Load the save
    let save = save::read_file(path)?;
    let mut controller = Controller::new(&SimulationConfig::new());
    controller.simulation_mut().load(&save)?;

    // Run
    match args.interval_ms.map(Duration::from_millis) {
        Some(interval) if !interval.is_zero() => run_paced(&mut controller, args.ticks, interval),
        _ => controller.run_ticks(args.ticks),
    }
    log::info!(
        "Ran {} ticks, simulation is at tick {}",
        controller.ticks_run(),
        controller.simulation().current_tick()
    );

    if !args.quiet {
        for circuit in controller.simulation().circuits().values() {
            println!("{}", describe(circuit));
        }
    }

    // Write the result
    if let Some(output) = args.output.as_deref() {
        let options = SaveOptions::new()
            .with_state(args.include_state)
            .with_compression(!args.no_compress)
            .with_forced_compression(args.force_compress);
        let save = controller.simulation_mut().save(options.include_state)?;
        save::write_file(output, &save, &options)?;
        log::info!("Wrote {}", output.display());
    }

    Ok(())
}

/// Run `ticks` ticks, one per `interval` of wall clock time.
fn run_paced(controller: &mut Controller, ticks: u64, interval: Duration) {
    let start = Instant::now();
    controller.set_tick_interval(Some(interval), Duration::ZERO);
    let mut ran = 0;
    while ran < ticks {
        let now = start.elapsed();
        if controller.poll(now) {
            ran += 1;
        } else if let Some(due) = controller.scheduler().next_due() {
            std::thread::sleep(due.saturating_sub(now));
        }
    }
}

/// One line summary of a circuit.
fn describe(circuit: &Circuit) -> String {
    let (x, y) = circuit.position();
    let mut line = format!(
        "#{:<4} {:<16} ({x}, {y})",
        circuit.id(),
        circuit.circuit_type().type_name()
    );
    match circuit.kind() {
        CircuitKind::SevenSegment(display) => {
            let lit: String = SEGMENTS
                .iter()
                .zip(display.segments())
                .filter(|(_, on)| *on)
                .map(|(id, _)| *id)
                .collect();
            line.push_str(&format!(" segments={lit}"));
        }
        CircuitKind::SevenSegmentDecoder(decoder) => match decoder.value() {
            Some(num) => line.push_str(&format!(" value={num:X}")),
            None => line.push_str(" value=-"),
        },
        kind => {
            if let Some(on) = kind.is_on() {
                line.push_str(if on { " on" } else { " off" });
            }
        }
    }
    line
}
