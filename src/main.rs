//! capkeys - capacitive-touch sensor board to keyboard bridge
//!
//! Main entry point: startup port selection, then the poller thread and the
//! console thread run until Ctrl+C.

use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use anyhow::{anyhow, Result};
use clap::Parser;
use tracing::{info, warn};

use capkeys::cli::Cli;
use capkeys::config::BridgeConfig;
use capkeys::console;
use capkeys::{StdoutReporter, Supervisor};
use capkeys_keyboard::{InputSink, LogSink};
use capkeys_transport::{PortDiscovery, SerialDiscovery, SerialLink};

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Logs go to stderr so they never interleave with console replies
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&cli.log_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(io::stderr)
        .init();

    // Load config
    let config_path = cli.config.clone().unwrap_or_else(BridgeConfig::default_path);
    info!("Loading config from {:?}", config_path);
    let mut config = BridgeConfig::load(&config_path)?;
    cli.apply(&mut config);

    if cli.save_config {
        config.save(&config_path)?;
        info!("Saved config to {:?}", config_path);
    }

    let discovery = Arc::new(SerialDiscovery::new());

    if cli.list_ports {
        return list_ports(discovery.as_ref());
    }

    let sink = create_sink(&config, cli.dry_run)?;
    let link = SerialLink::new(discovery, config.serial_settings());
    let supervisor = Arc::new(
        Supervisor::new(link, sink, Arc::new(StdoutReporter))
            .with_poll_interval(config.poll_interval()),
    );
    supervisor.set_keys(&config.keys);

    // Nothing can run without a link, so this blocks until one opens
    console::acquire_port(&supervisor, config.port.as_deref(), &mut io::stdin().lock())?;
    supervisor.report("Type 'help' for a list of commands.");

    let running = setup_interrupt_handler();

    let poller = {
        let supervisor = Arc::clone(&supervisor);
        let running = Arc::clone(&running);
        std::thread::Builder::new()
            .name("capkeys-poller".into())
            .spawn(move || supervisor.run_poller(&running))?
    };

    {
        let supervisor = Arc::clone(&supervisor);
        std::thread::Builder::new()
            .name("capkeys-console".into())
            .spawn(move || {
                if let Err(e) = console::run_console(&supervisor, io::stdin().lock()) {
                    warn!("Console read failed: {}", e);
                }
            })?;
    }

    // The console thread may still be blocked on stdin; process exit ends it
    poller
        .join()
        .map_err(|_| anyhow!("Poller thread panicked"))?;
    info!("Exiting");
    Ok(())
}

/// Virtual keyboard unless dry-running
fn create_sink(config: &BridgeConfig, dry_run: bool) -> Result<Box<dyn InputSink>> {
    if dry_run {
        info!("Dry run: key events are logged only");
        return Ok(Box::new(LogSink));
    }

    #[cfg(target_os = "linux")]
    {
        let mut keyboard = capkeys_keyboard::VirtualKeyboard::new(&config.device_name)?;
        info!("Created virtual keyboard: {}", config.device_name);
        if let Some(path) = keyboard.device_path() {
            info!("Device path: {}", path.display());
        }
        Ok(Box::new(keyboard))
    }

    #[cfg(not(target_os = "linux"))]
    {
        warn!(
            "No virtual keyboard backend for this platform; logging events for {}",
            config.device_name
        );
        Ok(Box::new(LogSink))
    }
}

fn list_ports(discovery: &dyn PortDiscovery) -> Result<()> {
    let ports = discovery.list_ports()?;
    if ports.is_empty() {
        println!("No serial ports found");
    }
    for port in ports {
        println!("{}  ({})", port.name, port.kind.label());
    }
    Ok(())
}

/// Set up a Ctrl-C handler that clears the returned flag when triggered.
fn setup_interrupt_handler() -> Arc<AtomicBool> {
    let running = Arc::new(AtomicBool::new(true));
    let running_clone = Arc::clone(&running);

    ctrlc::set_handler(move || {
        running_clone.store(false, Ordering::SeqCst);
    })
    .ok();

    running
}
