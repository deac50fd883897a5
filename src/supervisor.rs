//! Arbitration between the sensor poller and the operator console
//!
//! Two threads share one `Supervisor`:
//!
//! ```text
//!  poller thread                      console thread
//!  ─────────────                      ──────────────
//!  mode == Normal?  ──no──► sleep     line ──► mode == AwaitingPort?
//!        │ yes                                    │ yes: line is a port name
//!  link.read_byte()                               │ no:  command::parse(line)
//!  mode/generation unchanged?                     ▼
//!        │ yes                        setkeys / setport / ports / status / help
//!  detect_edges ──► InputSink
//! ```
//!
//! The input mode is the gate: the poller only reads while it is `Normal`,
//! and a failed read flips it to `AwaitingPort`. Locks are always taken in
//! the order mode → link → keys → sink. Every reconfiguration bumps a
//! generation counter so a byte read across a reconfiguration is discarded.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tracing::{debug, info, trace, warn};

use capkeys_keyboard::{detect_edges, InputSink, KeyMapping, KeyState};
use capkeys_transport::{LinkError, LinkStatus, SerialLink};

use crate::command::{self, Command, HELP};

/// Poll delay while the poller is gated off
const SUSPENDED_POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Who may act on the shared link right now
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputMode {
    /// Poller reads the link; console lines are commands
    Normal,
    /// Poller is suspended; the next console line is a port name
    AwaitingPort,
}

impl InputMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            InputMode::Normal => "normal",
            InputMode::AwaitingPort => "awaiting port",
        }
    }
}

/// What a single poll did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollOutcome {
    /// Mode was not `Normal`, no read issued
    Suspended,
    /// Read timed out with nothing pending
    Idle,
    /// A sample was applied
    Sample { events: usize },
    /// A byte was read but the link or mapping changed meanwhile
    Discarded,
    /// The read failed; now `AwaitingPort`
    Disconnected,
}

/// Operator-facing output
pub trait Reporter: Send + Sync {
    fn report(&self, line: &str);
}

/// Prints operator messages on stdout
#[derive(Debug, Default)]
pub struct StdoutReporter;

impl Reporter for StdoutReporter {
    fn report(&self, line: &str) {
        println!("{line}");
    }
}

/// Active mapping and the pressed state that goes with it
struct Keys {
    mapping: KeyMapping,
    state: KeyState,
}

pub struct Supervisor {
    mode: Mutex<InputMode>,
    link: Mutex<SerialLink>,
    keys: Mutex<Keys>,
    sink: Mutex<Box<dyn InputSink>>,
    generation: AtomicU64,
    reporter: Arc<dyn Reporter>,
    poll_interval: Duration,
}

impl Supervisor {
    /// Create a supervisor with an empty mapping
    ///
    /// Starts in `AwaitingPort`: nothing is polled until a port is accepted.
    pub fn new(
        link: SerialLink,
        sink: Box<dyn InputSink>,
        reporter: Arc<dyn Reporter>,
    ) -> Self {
        Self {
            mode: Mutex::new(InputMode::AwaitingPort),
            link: Mutex::new(link),
            keys: Mutex::new(Keys {
                mapping: KeyMapping::default(),
                state: KeyState::default(),
            }),
            sink: Mutex::new(sink),
            generation: AtomicU64::new(0),
            reporter,
            poll_interval: Duration::from_millis(1),
        }
    }

    /// Set the delay between polls (default 1ms)
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    pub fn mode(&self) -> InputMode {
        *self.mode.lock()
    }

    pub fn key_mapping(&self) -> KeyMapping {
        self.keys.lock().mapping.clone()
    }

    pub fn key_state(&self) -> KeyState {
        self.keys.lock().state.clone()
    }

    pub fn link_status(&self) -> LinkStatus {
        self.link.lock().status()
    }

    pub fn port_name(&self) -> Option<String> {
        self.link.lock().port_name().map(str::to_string)
    }

    /// Reconfiguration counter
    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::Acquire)
    }

    // ------------------------------------------------------------------
    // Control path
    // ------------------------------------------------------------------

    /// Handle one console line
    ///
    /// While `AwaitingPort` the whole line is a port name, whatever it looks
    /// like. Otherwise it is parsed as a command.
    pub fn handle_line(&self, line: &str) {
        let mut mode = self.mode.lock();
        match *mode {
            InputMode::AwaitingPort => self.accept_port(&mut mode, line.trim()),
            InputMode::Normal => self.dispatch(&mut mode, command::parse(line)),
        }
    }

    /// Send a line to the operator
    pub fn report(&self, line: &str) {
        self.reporter.report(line);
    }

    /// Ask the operator for a port, listing what the host offers
    pub fn prompt_for_port(&self) {
        self.report_ports();
        self.reporter.report("Enter a serial port name:");
    }

    fn dispatch(&self, mode: &mut InputMode, cmd: Command) {
        debug!("Command: {:?}", cmd);
        match cmd {
            Command::SetKeys(chars) => self.set_keys(&chars),
            Command::SetPort(name) => self.set_port(mode, &name),
            Command::Ports => self.report_ports(),
            Command::Status => self.report_status(*mode),
            Command::Help => self.reporter.report(HELP),
            Command::MissingArgument(name) => self.reporter.report(&format!(
                "Missing argument for {}. Usage: {}",
                name.as_str(),
                name.usage()
            )),
            Command::Unknown(token) => self.reporter.report(&format!(
                "Unknown command '{token}'. Type 'help' for a list of commands."
            )),
            Command::Empty => {}
        }
    }

    /// Replace the key mapping and forget every press
    ///
    /// Held keys of the old mapping are released first.
    pub fn set_keys(&self, chars: &str) {
        let (mapping, rejected) = KeyMapping::build(chars);
        for e in &rejected {
            self.reporter.report(&format!("Skipping key: {e}"));
        }

        let mut keys = self.keys.lock();
        self.release_held(&mut keys);
        keys.state.reset(mapping.len());
        keys.mapping = mapping;
        self.generation.fetch_add(1, Ordering::AcqRel);

        info!("Key mapping: {}", keys.mapping);
        self.reporter
            .report(&format!("Keys set to {}", keys.mapping.to_chars()));
    }

    /// `setport` while `Normal`: close the current link and open `name`
    fn set_port(&self, mode: &mut InputMode, name: &str) {
        let mut link = self.link.lock();
        self.generation.fetch_add(1, Ordering::AcqRel);

        match link.try_open(name) {
            Ok(()) => {
                drop(link);
                self.reset_keys();
                self.reporter.report(&format!("Now using port {name}"));
            }
            Err(e @ LinkError::Open { .. }) => {
                // Old connection is already gone
                drop(link);
                warn!("{}", e);
                self.release_all();
                *mode = InputMode::AwaitingPort;
                self.reporter.report(&format!("Failed to use port {name}: {e}"));
                self.prompt_for_port();
            }
            Err(e) => {
                let current = link.port_name().unwrap_or("none").to_string();
                drop(link);
                self.reporter.report(&format!(
                    "Failed to use port {name}: {e}. Still using {current}"
                ));
            }
        }
    }

    /// `AwaitingPort`: try the line as a port name
    fn accept_port(&self, mode: &mut InputMode, name: &str) {
        if name.is_empty() {
            self.prompt_for_port();
            return;
        }

        let result = {
            let mut link = self.link.lock();
            self.generation.fetch_add(1, Ordering::AcqRel);
            link.try_open(name)
        };

        match result {
            Ok(()) => {
                // A key held before the link dropped must be able to press again
                self.reset_keys();
                *mode = InputMode::Normal;
                self.reporter.report(&format!("Using port {name}"));
            }
            Err(e) => {
                debug!("Port {} rejected: {}", name, e);
                self.reporter.report(&format!("Failed to use port {name}: {e}"));
                self.prompt_for_port();
            }
        }
    }

    fn report_ports(&self) {
        let mut link = self.link.lock();
        match link.refresh_ports() {
            Ok([]) => self.reporter.report("No serial ports found"),
            Ok(ports) => {
                let mut lines = vec!["Available ports:".to_string()];
                lines.extend(
                    ports
                        .iter()
                        .map(|p| format!("  {}  ({})", p.name, p.kind.label())),
                );
                self.reporter.report(&lines.join("\n"));
            }
            Err(e) => self.reporter.report(&e.to_string()),
        }
    }

    fn report_status(&self, mode: InputMode) {
        let (port, status) = {
            let link = self.link.lock();
            (
                link.port_name().unwrap_or("none").to_string(),
                link.status(),
            )
        };
        let keys = self.keys.lock();
        self.reporter.report(&format!(
            "Mode: {}\nPort: {} ({})\nKeys: {}",
            mode.as_str(),
            port,
            status.as_str(),
            keys.mapping
        ));
    }

    // ------------------------------------------------------------------
    // Hot path
    // ------------------------------------------------------------------

    /// One poll: gate on mode, read, re-validate, apply
    pub fn poll_once(&self) -> PollOutcome {
        let generation = self.generation.load(Ordering::Acquire);
        if *self.mode.lock() != InputMode::Normal {
            return PollOutcome::Suspended;
        }

        let read = self.link.lock().read_byte();

        if *self.mode.lock() != InputMode::Normal
            || self.generation.load(Ordering::Acquire) != generation
        {
            trace!("Discarding read across reconfiguration");
            return PollOutcome::Discarded;
        }

        match read {
            Ok(None) => PollOutcome::Idle,
            Ok(Some(sample)) => match self.apply_sample(sample, generation) {
                Some(events) => PollOutcome::Sample { events },
                None => PollOutcome::Discarded,
            },
            Err(e) => {
                self.on_link_lost(generation, e);
                PollOutcome::Disconnected
            }
        }
    }

    fn apply_sample(&self, sample: u8, generation: u64) -> Option<usize> {
        let mut guard = self.keys.lock();
        // set_keys bumps the generation under this lock
        if self.generation.load(Ordering::Acquire) != generation {
            return None;
        }
        let keys = &mut *guard;
        let mut sink = self.sink.lock();

        let events = detect_edges(sample, &mut keys.state, &keys.mapping, |event| {
            trace!("{:?} {} (bit {})", event.transition, event.key, event.bit);
            if let Err(e) = sink.send(&event) {
                warn!("Failed to send {:?} {}: {}", event.transition, event.key, e);
            }
        });
        Some(events)
    }

    fn on_link_lost(&self, generation: u64, error: LinkError) {
        let mut mode = self.mode.lock();
        if *mode != InputMode::Normal || self.generation.load(Ordering::Acquire) != generation {
            // The console reconfigured the link while we were reading
            return;
        }

        let port = {
            let mut link = self.link.lock();
            link.close();
            self.generation.fetch_add(1, Ordering::AcqRel);
            link.port_name().unwrap_or("?").to_string()
        };
        self.release_all();
        *mode = InputMode::AwaitingPort;

        warn!("Serial link lost: {}", error);
        self.reporter
            .report(&format!("Lost connection to {port}. Select a new port."));
        self.prompt_for_port();
    }

    /// Poll until `running` is cleared, then release any held keys
    pub fn run_poller(&self, running: &AtomicBool) {
        info!("Poller started");
        while running.load(Ordering::SeqCst) {
            let outcome = self.poll_once();
            trace!("Poll: {:?}", outcome);
            let delay = match outcome {
                PollOutcome::Suspended => SUSPENDED_POLL_INTERVAL,
                _ => self.poll_interval,
            };
            std::thread::sleep(delay);
        }
        self.release_all();
        info!("Poller stopped");
    }

    // ------------------------------------------------------------------
    // Key state helpers
    // ------------------------------------------------------------------

    /// Release held keys and clear the pressed state
    pub fn release_all(&self) {
        let mut keys = self.keys.lock();
        self.release_held(&mut keys);
    }

    /// Clear the pressed state to the mapping width
    fn reset_keys(&self) {
        let mut keys = self.keys.lock();
        self.release_held(&mut keys);
        let width = keys.mapping.len();
        keys.state.reset(width);
    }

    fn release_held(&self, keys: &mut Keys) {
        let mut sink = self.sink.lock();
        for bit in keys.state.held_bits() {
            if let Some(key) = keys.mapping.key(bit) {
                debug!("Releasing held key {}", key);
                if let Err(e) = sink.key_up(key) {
                    warn!("Failed to release {}: {}", key, e);
                }
            }
        }
        let width = keys.mapping.len();
        keys.state.reset(width);
    }
}
