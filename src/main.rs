//! Lakshya - pursuit controller for the simulated robot
//!
//! Usage:
//!
//! ```text
//! lakshya [config.toml] [--duration <seconds>]
//! ```
//!
//! Without a path, `lakshya.toml` in the working directory is used if it
//! exists, otherwise built-in defaults. Runs until Ctrl-C, the tag's X
//! button, or the optional duration elapses.

use std::path::Path;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use tracing::{error, info, warn};

use lakshya::config::LakshyaConfig;
use lakshya::devices::mock::Simulation;
use lakshya::error::{LakshyaError, Result};
use lakshya::io::{MotionActuator, RangingMonitor, create_shared_actuator};
use lakshya::shared::PursuitContext;
use lakshya::threads::spawn_threads;

fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(
                "lakshya=info"
                    .parse::<tracing_subscriber::filter::Directive>()
                    .map_err(|e| LakshyaError::Config(format!("Bad log directive: {}", e)))?,
            ),
        )
        .init();

    // Parse command line arguments
    let args: Vec<String> = std::env::args().collect();

    let duration = args
        .iter()
        .position(|a| a == "--duration")
        .and_then(|i| args.get(i + 1))
        .map(|s| {
            s.parse::<f32>()
                .map_err(|e| e.to_string())
                .and_then(|secs| Duration::try_from_secs_f32(secs).map_err(|e| e.to_string()))
                .map_err(|e| LakshyaError::Config(format!("Invalid --duration '{}': {}", s, e)))
        })
        .transpose()?;

    let config = if args.len() > 1 && !args[1].starts_with("--") {
        let config_path = Path::new(&args[1]);
        info!("Loading configuration from {:?}", config_path);
        LakshyaConfig::load(config_path)?
    } else if Path::new("lakshya.toml").exists() {
        info!("Loading configuration from lakshya.toml");
        LakshyaConfig::load(Path::new("lakshya.toml"))?
    } else {
        info!("Using default configuration");
        LakshyaConfig::default()
    };

    info!("Lakshya v{}", env!("CARGO_PKG_VERSION"));
    info!(
        "Pursuing '{}': ROI {:?}, hold {:.1}s, cooldown {:.1}s",
        config.detection.target_class,
        config.approach.roi_norm,
        config.behavior.hold_seconds,
        config.behavior.cooldown_seconds
    );

    let context = PursuitContext::new();

    // Ctrl-C requests a clean shutdown
    let ctrlc_cancel = context.cancel.clone();
    ctrlc::set_handler(move || {
        info!("Interrupt received, shutting down");
        ctrlc_cancel.cancel();
    })
    .map_err(|e| LakshyaError::Thread(format!("Failed to install Ctrl-C handler: {}", e)))?;

    let Simulation {
        camera,
        detector,
        mut actuator,
        mut beacon,
        ..
    } = Simulation::new(&config);

    actuator.set_remote_command_mode(true)?;
    let actuator = create_shared_actuator(actuator);

    // Beacon subscription
    let mut monitor = RangingMonitor::new(Arc::clone(&context.ranging), context.cancel.clone());
    let beacon_cancel = context.cancel.clone();
    let beacon_handle = thread::Builder::new()
        .name("beacon".into())
        .spawn(move || beacon.run(&mut monitor, &beacon_cancel))
        .map_err(|e| LakshyaError::Thread(format!("Failed to spawn beacon thread: {}", e)))?;

    info!("Starting pursuit threads...");
    let handles = spawn_threads(
        &config,
        context.clone(),
        actuator,
        Box::new(camera),
        Box::new(detector),
    )?;

    // Main thread: monitor until something asks us to stop
    let check_interval = Duration::from_millis(500);
    let started = Instant::now();

    loop {
        if context.cancel.sleep(check_interval) {
            info!("Shutdown requested");
            break;
        }

        if handles.any_finished() || beacon_handle.is_finished() {
            warn!("A worker thread exited unexpectedly");
            break;
        }

        if let Some(limit) = duration
            && started.elapsed() >= limit
        {
            info!("Run duration of {:.1}s reached", limit.as_secs_f32());
            break;
        }

        let behavior = context.behavior.snapshot();
        info!(
            "Status: mode={}, target={}",
            behavior.mode,
            if behavior.target_box.is_some() { "locked" } else { "none" }
        );
    }

    // Signal shutdown to all threads
    context.cancel.cancel();

    info!("Waiting for threads to finish...");
    handles.join();
    if let Err(e) = beacon_handle.join() {
        error!("Beacon thread panicked: {:?}", e);
    }

    info!("Lakshya finished");
    Ok(())
}
