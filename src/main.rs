mod cli;

use clap::Parser;
use fragscope::capture::{self, CapturedFrame};
use fragscope::config::{self, Config};
use fragscope::display;
use fragscope::fragment::{
    DetectOptions, DetectReport, Detector, RepairOptions, RepairReport, Repairer,
};
use fragscope::logs;
use fragscope::replay::{self, ReplayConfig};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

fn main() {
    let args = cli::Cli::parse();

    // Initialize tracing/logging
    let log_level = match args.verbose {
        0 => tracing::Level::WARN,
        1 => tracing::Level::INFO,
        2 => tracing::Level::DEBUG,
        _ => tracing::Level::TRACE,
    };

    tracing_subscriber::fmt()
        .with_max_level(log_level)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    let config = match load_config(&args) {
        Ok(config) => config,
        Err(err) => {
            eprintln!("error: {}", err);
            std::process::exit(1);
        }
    };

    let running = Arc::new(AtomicBool::new(true));
    let running_clone = running.clone();
    if let Err(err) = ctrlc::set_handler(move || {
        running_clone.store(false, Ordering::SeqCst);
        eprintln!("\nInterrupt received, stopping...");
    }) {
        tracing::warn!(error = %err, "cannot install Ctrl-C handler");
    }

    let result = match args.command {
        cli::Command::Check { trace, .. } => run_check(&trace, &config, &running),
        cli::Command::Repair { input, output, .. } => {
            run_repair(&input, &output, &config, &running)
        }
        cli::Command::Replay {
            trace, ip, port, ..
        } => run_replay(&trace, SocketAddr::new(ip, port), &config, &running),
        cli::Command::CollectLogs { file } => run_collect_logs(&file),
    };

    if let Err(e) = result {
        eprintln!("error: {}", e);
        std::process::exit(1);
    }
}

fn run_check(
    path: &Path,
    config: &Config,
    running: &AtomicBool,
) -> Result<(), Box<dyn std::error::Error>> {
    let trace = capture::read_trace(path)?;
    let options = DetectOptions {
        fraglen: config.detect.fraglen,
        number: config.detect.number,
        exclude_newest: config.detect.exclude_newest,
    };
    tracing::debug!(?options, "scanning for fragments");

    let mut detector = Detector::new(options);
    let mut matches = Vec::new();
    for (index, frame) in trace.frames.iter().enumerate() {
        if !running.load(Ordering::SeqCst) {
            tracing::warn!(index, "scan interrupted");
            break;
        }
        for m in detector.observe(index, &frame.packet) {
            if !config.output.quiet {
                display::print_match(&m);
            }
            matches.push(m);
        }
    }

    let counts = detector.counts();
    let report = DetectReport {
        total: counts.total,
        fragments: counts.fragments,
        broken: counts.broken,
        matches,
    };
    tracing::info!(
        total = report.total,
        fragments = report.fragments,
        broken = report.broken,
        "scan finished"
    );
    println!("{}", display::detect_summary(&report));

    if let Some(path) = &config.output.report_json {
        display::write_report_json(path, &report)?;
    }
    Ok(())
}

fn run_repair(
    input: &Path,
    output: &Path,
    config: &Config,
    running: &AtomicBool,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut trace = capture::read_trace(input)?;
    let options = RepairOptions {
        fraglen: config.repair.fraglen,
        window: config.repair.window,
    };
    tracing::debug!(?options, "repairing fragments");

    let mut repairer = Repairer::new(options);
    let mut moves = Vec::new();
    let frames: &mut [CapturedFrame] = &mut trace.frames;
    for i in 0..frames.len() {
        if !running.load(Ordering::SeqCst) {
            tracing::warn!(index = i, "repair interrupted, nothing written");
            return Ok(());
        }
        if let Some(m) = repairer.inspect(frames, i) {
            if !config.output.quiet {
                display::print_move(&m);
            }
            moves.push(m);
        }
    }

    let counts = repairer.counts();
    let report = RepairReport {
        total: counts.total,
        fragments: counts.fragments,
        reordered: counts.broken,
        moves,
    };
    tracing::info!(
        total = report.total,
        fragments = report.fragments,
        reordered = report.reordered,
        "repair finished"
    );
    println!("{}", display::repair_summary(&report, output));

    capture::write_trace(output, &trace)?;
    if let Some(path) = &config.output.report_json {
        display::write_report_json(path, &report)?;
    }
    Ok(())
}

fn run_replay(
    path: &Path,
    target: SocketAddr,
    config: &Config,
    running: &AtomicBool,
) -> Result<(), Box<dyn std::error::Error>> {
    let trace = capture::read_trace(path)?;
    let replay_config = ReplayConfig {
        target,
        delay: Duration::from_millis(config.replay.delay_ms),
        progress: !config.output.quiet,
    };
    let stats = replay::replay(&trace.frames, &replay_config, running)?;
    println!("{}", display::replay_summary(&stats));
    Ok(())
}

fn run_collect_logs(path: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let stdin = std::io::stdin();
    let stdout = std::io::stdout();
    logs::collect_logs(stdin.lock(), stdout.lock(), path)?;
    Ok(())
}

/// Load the config file, if any, and apply command-line overrides.
fn load_config(args: &cli::Cli) -> Result<Config, config::ConfigError> {
    let mut config = match &args.config {
        Some(path) => Config::load(path)?,
        None => Config::default(),
    };

    match &args.command {
        cli::Command::Check {
            fraglen,
            number,
            exclude_newest,
            report_json,
            ..
        } => {
            if let Some(value) = fraglen {
                config.detect.fraglen = *value;
            }
            if let Some(value) = number {
                config.detect.number = *value;
            }
            if *exclude_newest {
                config.detect.exclude_newest = true;
            }
            apply_report_path(&mut config, report_json);
        }
        cli::Command::Repair {
            fraglen,
            window,
            report_json,
            ..
        } => {
            if let Some(value) = fraglen {
                config.repair.fraglen = *value;
            }
            if let Some(value) = window {
                config.repair.window = *value;
            }
            apply_report_path(&mut config, report_json);
        }
        cli::Command::Replay { delay, .. } => {
            if let Some(value) = delay {
                config.replay.delay_ms = *value;
            }
        }
        cli::Command::CollectLogs { .. } => {}
    }

    Ok(config)
}

fn apply_report_path(config: &mut Config, value: &Option<PathBuf>) {
    if let Some(value) = value {
        if value.as_os_str().is_empty() {
            config.output.report_json = None;
        } else {
            config.output.report_json = Some(value.clone());
        }
    }
}
