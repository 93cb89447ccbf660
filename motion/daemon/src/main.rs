//! Motion Daemon - Drive the Robot from Tool-Call Lines
//!
//! Reads one tool call per line on stdin, runs it through the motion
//! controller and prints the resulting status on stdout. Logs go to stderr.
//!
//! # Usage
//!
//! ```bash
//! # Run against the simulated device
//! echo "express_emotion happy" | motion-daemon
//!
//! # Interactive, without simulated motor latency
//! motion-daemon --no-latency
//!
//! # Print the tool declarations for the conversational API
//! motion-daemon --list-tools
//!
//! # Verbose logging
//! RUST_LOG=motion_core=debug motion-daemon
//! ```
//!
//! # Input
//!
//! ```text
//! move_head left
//! nod_yes times=3
//! move_antennas {"right_angle": 45, "left_angle": -45}
//! ```
//!
//! Blank lines and lines starting with `#` are ignored.
//!
//! # Signals
//!
//! - `SIGINT`: stop the running choreography and exit
//! - EOF on stdin: finish the running command and exit
//!
//! Stdin is read on its own thread, so a pending read never holds up exit.

use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::signal;
use tokio::sync::{mpsc, watch};
use tracing::{error, info, warn};

use motion_core::{
    declarations, default_config_path, load_config_from_path, tools, BusyPolicy, ConfigOverrides,
    MotionController, SimulatedDevice, ToolCall,
};

/// Motion Daemon - expressive motion for a desktop robot
#[derive(Parser, Debug)]
#[command(name = "motion-daemon")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Configuration file path
    #[arg(short = 'c', long, env = "MOTION_CONFIG", value_name = "FILE")]
    config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short = 'd', long)]
    debug: bool,

    /// Do not block for each move's duration on the simulated device
    #[arg(long)]
    no_latency: bool,

    /// What a command does while another is running (queue, interrupt)
    #[arg(long, value_name = "POLICY")]
    busy_policy: Option<BusyPolicy>,

    /// Print the tool declarations as JSON and exit
    #[arg(long)]
    list_tools: bool,
}

/// Initialize logging on stderr
fn init_logging(debug: bool) -> Result<()> {
    let level = if debug { "debug" } else { "info" };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        tracing_subscriber::EnvFilter::new(format!("motion_daemon={level},motion_core={level}"))
    });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    Ok(())
}

/// Handle one input line, returning the text to print
async fn handle_line(controller: &MotionController, line: &str) -> Option<String> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return None;
    }

    match ToolCall::parse_line(line) {
        Ok(call) => Some(tools::dispatch_call(controller, &call).await),
        Err(e) => {
            warn!(error = %e, line, "Could not parse tool call");
            Some(format!("error: {e}"))
        }
    }
}

/// Forward input lines from a dedicated thread
///
/// The thread is detached: a read that never returns does not keep the
/// process alive once `main` is done.
fn spawn_line_reader<R>(reader: R) -> Result<mpsc::Receiver<io::Result<String>>>
where
    R: BufRead + Send + 'static,
{
    let (tx, rx) = mpsc::channel(16);

    std::thread::Builder::new()
        .name("stdin-reader".to_string())
        .spawn(move || {
            for line in reader.lines() {
                if tx.blocking_send(line).is_err() {
                    break;
                }
            }
        })
        .context("Failed to start input reader")?;

    Ok(rx)
}

/// Run tool-call lines until input ends or a stop is requested
async fn run_loop(
    controller: &MotionController,
    lines: &mut mpsc::Receiver<io::Result<String>>,
    mut stop_rx: watch::Receiver<bool>,
    out: &mut impl Write,
) {
    loop {
        tokio::select! {
            line = lines.recv() => match line {
                Some(Ok(line)) => {
                    if let Some(status) = handle_line(controller, &line).await {
                        if let Err(e) = writeln!(out, "{status}").and_then(|()| out.flush()) {
                            error!(error = %e, "Failed to write status");
                            break;
                        }
                    }
                }
                Some(Err(e)) => {
                    error!(error = %e, "Failed to read input");
                    break;
                }
                None => {
                    info!("Input closed");
                    break;
                }
            },
            Ok(()) = stop_rx.changed() => break,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    if args.list_tools {
        println!("{}", serde_json::to_string_pretty(&declarations())?);
        return Ok(());
    }

    init_logging(args.debug)?;

    let config_path = args.config.clone().or_else(default_config_path);
    let mut config = load_config_from_path(config_path).context("Failed to load configuration")?;

    let mut overrides = ConfigOverrides::new();
    if args.no_latency {
        overrides = overrides.with_simulate_latency(false);
    }
    if let Some(policy) = args.busy_policy {
        overrides = overrides.with_busy_policy(policy);
    }
    overrides.apply(&mut config);

    info!(
        source = %config.source(),
        busy_policy = %config.busy_policy,
        simulate_latency = config.simulate_latency,
        "Starting motion daemon"
    );

    let device = SimulatedDevice::new(config.simulate_latency);
    let controller = Arc::new(
        MotionController::spawn(device, &config).context("Failed to start actuator worker")?,
    );

    // Ctrl-C stops the running choreography right away
    let (stop_tx, stop_rx) = watch::channel(false);
    {
        let controller = Arc::clone(&controller);
        tokio::spawn(async move {
            match signal::ctrl_c().await {
                Ok(()) => {
                    info!("Received SIGINT, shutting down");
                    let _ = stop_tx.send(true);
                    controller.shutdown().await;
                }
                Err(e) => error!(error = %e, "Failed to listen for SIGINT"),
            }
        });
    }

    let mut lines = spawn_line_reader(io::BufReader::new(io::stdin()))?;
    run_loop(&controller, &mut lines, stop_rx, &mut io::stdout()).await;

    controller.shutdown().await;
    info!("Motion daemon stopped");
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::io::{BufReader, Cursor, Read};
    use std::time::Duration;

    use motion_core::MotionConfigFile;

    use super::*;

    /// Input whose reads block until the paired sender is dropped
    struct StalledInput(std::sync::mpsc::Receiver<()>);

    impl Read for StalledInput {
        fn read(&mut self, _buf: &mut [u8]) -> io::Result<usize> {
            let _ = self.0.recv();
            Ok(0)
        }
    }

    fn controller() -> MotionController {
        MotionController::spawn(SimulatedDevice::new(false), &MotionConfigFile::default()).unwrap()
    }

    #[tokio::test]
    async fn test_lines_run_until_eof() {
        let controller = controller();
        let input = Cursor::new("# greeting\n\nlook_at_camera\nnod_yes times=1\nfly away\n");
        let mut lines = spawn_line_reader(input).unwrap();
        let (_stop_tx, stop_rx) = watch::channel(false);
        let mut out = Vec::new();

        run_loop(&controller, &mut lines, stop_rx, &mut out).await;
        controller.shutdown().await;

        let out = String::from_utf8(out).unwrap();
        let printed: Vec<&str> = out.lines().collect();
        assert_eq!(printed.len(), 3);
        assert_eq!(printed[0], "Looking at camera");
        assert_eq!(printed[1], "Nodded yes 1 times");
        assert!(printed[2].starts_with("error: "));
    }

    #[test]
    fn test_stop_does_not_wait_for_pending_input() {
        let (done_tx, done_rx) = std::sync::mpsc::channel();

        std::thread::spawn(move || {
            let (_hold_input, blocker) = std::sync::mpsc::channel::<()>();
            let runtime = tokio::runtime::Runtime::new().unwrap();
            runtime.block_on(async {
                let controller = controller();
                let mut lines = spawn_line_reader(BufReader::new(StalledInput(blocker))).unwrap();
                let (stop_tx, stop_rx) = watch::channel(false);
                stop_tx.send(true).unwrap();

                run_loop(&controller, &mut lines, stop_rx, &mut io::sink()).await;
                controller.shutdown().await;
            });
            // Dropping the runtime must not wait on the stalled reader
            drop(runtime);
            done_tx.send(()).unwrap();
        });

        assert!(
            done_rx.recv_timeout(Duration::from_secs(5)).is_ok(),
            "runtime shutdown blocked on pending input"
        );
    }
}
