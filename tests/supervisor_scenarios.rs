//! Integration tests for the poller/console arbitration.
//!
//! The supervisor runs against scripted ports and a recording key sink, so
//! every scenario is deterministic and needs no hardware.

use std::collections::VecDeque;
use std::io::{self, Cursor};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Barrier, Mutex};
use std::time::Duration;

use capkeys::console;
use capkeys::{InputMode, PollOutcome, Reporter, Supervisor};
use capkeys_keyboard::{InputSink, KeyId, SinkError};
use capkeys_transport::{
    ByteSource, LinkError, LinkStatus, PortDiscovery, PortInfo, PortKind, SerialLink,
    SerialSettings,
};

// ── Test doubles ──

type Script = Arc<Mutex<VecDeque<io::Result<Option<u8>>>>>;

/// Holds one read open until the test lets it finish
struct ReadGate {
    entered: Barrier,
    release: Barrier,
}

impl ReadGate {
    fn new() -> Arc<Self> {
        Arc::new(Self {
            entered: Barrier::new(2),
            release: Barrier::new(2),
        })
    }
}

type GateSlot = Arc<Mutex<Option<Arc<ReadGate>>>>;

/// Reads from a script shared with the test; an empty script is a timeout
struct ScriptedSource {
    script: Script,
    gate: GateSlot,
}

impl ByteSource for ScriptedSource {
    fn read_byte(&mut self) -> io::Result<Option<u8>> {
        let gate = self.gate.lock().unwrap().take();
        if let Some(gate) = gate {
            gate.entered.wait();
            gate.release.wait();
        }
        self.script.lock().unwrap().pop_front().unwrap_or(Ok(None))
    }
}

#[derive(Default)]
struct FakePorts {
    listed: Mutex<Vec<String>>,
    /// Ports that are listed but fail to open
    broken: Mutex<Vec<String>>,
    opened: Mutex<Vec<String>>,
    script: Script,
    gate: GateSlot,
}

impl FakePorts {
    fn new(listed: &[&str]) -> Arc<Self> {
        let ports = Self::default();
        *ports.listed.lock().unwrap() = listed.iter().map(|s| s.to_string()).collect();
        Arc::new(ports)
    }

    fn push(&self, item: io::Result<Option<u8>>) {
        self.script.lock().unwrap().push_back(item);
    }

    fn sample(&self, byte: u8) {
        self.push(Ok(Some(byte)));
    }

    fn unplug(&self) {
        self.push(Err(io::Error::new(io::ErrorKind::BrokenPipe, "device removed")));
    }

    /// Make the next read block until the returned gate is released
    fn gate_next_read(&self) -> Arc<ReadGate> {
        let gate = ReadGate::new();
        *self.gate.lock().unwrap() = Some(Arc::clone(&gate));
        gate
    }
}

impl PortDiscovery for FakePorts {
    fn list_ports(&self) -> Result<Vec<PortInfo>, LinkError> {
        Ok(self
            .listed
            .lock()
            .unwrap()
            .iter()
            .map(|n| PortInfo::new(n.clone(), PortKind::Unknown))
            .collect())
    }

    fn open_port(
        &self,
        name: &str,
        _settings: &SerialSettings,
    ) -> Result<Box<dyn ByteSource>, LinkError> {
        if self.broken.lock().unwrap().iter().any(|b| b == name) {
            return Err(LinkError::Open {
                port: name.to_string(),
                reason: "No such device".to_string(),
            });
        }
        self.opened.lock().unwrap().push(name.to_string());
        Ok(Box::new(ScriptedSource {
            script: Arc::clone(&self.script),
            gate: Arc::clone(&self.gate),
        }))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Sent {
    Down(KeyId),
    Up(KeyId),
}

#[derive(Clone, Default)]
struct RecordingSink(Arc<Mutex<Vec<Sent>>>);

impl RecordingSink {
    fn take(&self) -> Vec<Sent> {
        std::mem::take(&mut *self.0.lock().unwrap())
    }
}

impl InputSink for RecordingSink {
    fn key_down(&mut self, key: KeyId) -> Result<(), SinkError> {
        self.0.lock().unwrap().push(Sent::Down(key));
        Ok(())
    }

    fn key_up(&mut self, key: KeyId) -> Result<(), SinkError> {
        self.0.lock().unwrap().push(Sent::Up(key));
        Ok(())
    }
}

#[derive(Default)]
struct CapturedReports(Mutex<Vec<String>>);

impl CapturedReports {
    fn take(&self) -> Vec<String> {
        std::mem::take(&mut *self.0.lock().unwrap())
    }

    fn contains(&self, needle: &str) -> bool {
        self.0.lock().unwrap().iter().any(|l| l.contains(needle))
    }
}

impl Reporter for CapturedReports {
    fn report(&self, line: &str) {
        self.0.lock().unwrap().push(line.to_string());
    }
}

struct Harness {
    ports: Arc<FakePorts>,
    sink: RecordingSink,
    reports: Arc<CapturedReports>,
    supervisor: Supervisor,
}

fn harness(listed: &[&str], keys: &str) -> Harness {
    let ports = FakePorts::new(listed);
    let sink = RecordingSink::default();
    let reports = Arc::new(CapturedReports::default());
    let link = SerialLink::new(ports.clone(), SerialSettings::default());
    let supervisor = Supervisor::new(link, Box::new(sink.clone()), reports.clone());
    supervisor.set_keys(keys);
    reports.take();
    Harness {
        ports,
        sink,
        reports,
        supervisor,
    }
}

/// Harness already past startup on `port`
fn connected(listed: &[&str], port: &str, keys: &str) -> Harness {
    let h = harness(listed, keys);
    h.supervisor.handle_line(port);
    assert_eq!(h.supervisor.mode(), InputMode::Normal);
    h.reports.take();
    h
}

// ── Startup ──

#[test]
fn starts_awaiting_port_and_does_not_poll() {
    let h = harness(&["COM3"], "DFJK");
    h.ports.sample(0b0001);
    assert_eq!(h.supervisor.mode(), InputMode::AwaitingPort);
    assert_eq!(h.supervisor.poll_once(), PollOutcome::Suspended);
    assert!(h.sink.take().is_empty());
}

#[test]
fn startup_prompts_until_a_port_is_accepted() {
    let h = harness(&["/dev/ttyACM0"], "DFJK");
    let mut input = Cursor::new("COM9\n\n/dev/ttyACM0\nsetkeys AB\n");

    console::acquire_port(&h.supervisor, Some("/dev/ttyUSB0"), &mut input).unwrap();

    assert_eq!(h.supervisor.mode(), InputMode::Normal);
    assert_eq!(h.supervisor.port_name().as_deref(), Some("/dev/ttyACM0"));
    assert_eq!(h.supervisor.link_status(), LinkStatus::Open);
    assert!(h.reports.contains("Attempting to use /dev/ttyUSB0"));
    assert!(h.reports.contains("Failed to use port COM9"));
    // The line after the accepted port is left for the command console
    assert_eq!(h.supervisor.key_mapping().to_chars(), "DFJK");
}

#[test]
fn startup_skips_console_lines_that_are_not_utf8() {
    let h = harness(&["COM3"], "DFJK");
    let mut input = Cursor::new(b"\xff\nCOM3\n".to_vec());
    console::acquire_port(&h.supervisor, None, &mut input).unwrap();
    assert_eq!(h.supervisor.mode(), InputMode::Normal);
    assert_eq!(h.supervisor.port_name().as_deref(), Some("COM3"));
}

#[test]
fn console_survives_a_line_that_is_not_utf8() {
    let h = connected(&["COM3"], "COM3", "DF");
    let input = Cursor::new(b"\xffoops\nsetkeys AB\r\n".to_vec());
    console::run_console(&h.supervisor, input).unwrap();
    assert_eq!(h.supervisor.key_mapping().to_chars(), "AB");
}

#[test]
fn startup_fails_when_console_closes_first() {
    let h = harness(&[], "DFJK");
    let mut input = Cursor::new("COM3\n");
    assert!(console::acquire_port(&h.supervisor, None, &mut input).is_err());
    assert_eq!(h.supervisor.mode(), InputMode::AwaitingPort);
}

// ── Hot path ──

#[test]
fn press_hold_release_reaches_the_sink() {
    let h = connected(&["COM3"], "COM3", "DFJK");
    for byte in [0b0001, 0b0001, 0b0000] {
        h.ports.sample(byte);
    }

    assert_eq!(h.supervisor.poll_once(), PollOutcome::Sample { events: 1 });
    assert_eq!(h.sink.take(), vec![Sent::Down(KeyId::D)]);
    assert_eq!(h.supervisor.poll_once(), PollOutcome::Sample { events: 0 });
    assert!(h.sink.take().is_empty());
    assert_eq!(h.supervisor.poll_once(), PollOutcome::Sample { events: 1 });
    assert_eq!(h.sink.take(), vec![Sent::Up(KeyId::D)]);
    assert_eq!(h.supervisor.poll_once(), PollOutcome::Idle);
}

#[test]
fn bits_beyond_mapping_are_ignored() {
    let h = connected(&["COM3"], "COM3", "DF");
    h.ports.sample(0b1111_0010);
    assert_eq!(h.supervisor.poll_once(), PollOutcome::Sample { events: 1 });
    assert_eq!(h.sink.take(), vec![Sent::Down(KeyId::F)]);
}

// ── Disconnect and reconnect ──

#[test]
fn read_failure_moves_to_awaiting_port() {
    let h = connected(&["COM3"], "COM3", "DFJK");
    h.ports.unplug();

    assert_eq!(h.supervisor.poll_once(), PollOutcome::Disconnected);
    assert_eq!(h.supervisor.mode(), InputMode::AwaitingPort);
    assert_eq!(h.supervisor.link_status(), LinkStatus::Closed);
    assert!(h.reports.contains("Lost connection to COM3"));
    assert!(h.reports.contains("Enter a serial port name:"));

    // Gated: no further reads while awaiting a port
    h.ports.sample(0b0001);
    assert_eq!(h.supervisor.poll_once(), PollOutcome::Suspended);
}

#[test]
fn reconnect_clears_stale_presses() {
    let h = connected(&["COM3", "COM4"], "COM3", "DF");
    h.ports.sample(0b01);
    h.supervisor.poll_once();
    assert_eq!(h.supervisor.key_state().as_slice(), &[true, false]);
    h.sink.take();

    h.ports.unplug();
    assert_eq!(h.supervisor.poll_once(), PollOutcome::Disconnected);
    // The held key is let go on the host when the board disappears
    assert_eq!(h.sink.take(), vec![Sent::Up(KeyId::D)]);

    h.supervisor.handle_line("COM4");
    assert_eq!(h.supervisor.mode(), InputMode::Normal);
    assert_eq!(h.supervisor.key_state().as_slice(), &[false, false]);

    // Bit 0 still low after reconnect: no spurious release
    h.ports.sample(0b00);
    assert_eq!(h.supervisor.poll_once(), PollOutcome::Sample { events: 0 });
    // And it can press again
    h.ports.sample(0b01);
    assert_eq!(h.supervisor.poll_once(), PollOutcome::Sample { events: 1 });
    assert_eq!(h.sink.take(), vec![Sent::Down(KeyId::D)]);
}

#[test]
fn unavailable_port_keeps_awaiting() {
    let h = harness(&["COM3"], "DFJK");
    h.supervisor.handle_line("COM9");
    assert_eq!(h.supervisor.mode(), InputMode::AwaitingPort);
    assert!(h.reports.contains("Port COM9 is not available"));
    assert!(h.ports.opened.lock().unwrap().is_empty());
}

#[test]
fn open_error_keeps_awaiting() {
    let h = harness(&["COM3"], "DFJK");
    h.ports.broken.lock().unwrap().push("COM3".to_string());
    h.supervisor.handle_line("COM3");
    assert_eq!(h.supervisor.mode(), InputMode::AwaitingPort);
    assert!(h.reports.contains("Failed to open COM3"));
}

#[test]
fn awaiting_port_treats_commands_as_port_names() {
    let h = harness(&["COM3"], "DFJK");
    h.supervisor.handle_line("setkeys AB");
    assert_eq!(h.supervisor.mode(), InputMode::AwaitingPort);
    assert_eq!(h.supervisor.key_mapping().to_chars(), "DFJK");
    assert!(h.reports.contains("Port setkeys AB is not available"));
}

// ── Commands ──

#[test]
fn setkeys_rebuilds_mapping_and_resets_state() {
    let h = connected(&["COM3"], "COM3", "DFJK");
    h.ports.sample(0b0010);
    h.supervisor.poll_once();
    h.sink.take();

    h.supervisor.handle_line("setkeys as!d");
    let mapping = h.supervisor.key_mapping();
    assert_eq!(mapping.to_chars(), "ASD");
    assert_eq!(h.supervisor.key_state().as_slice(), &[false, false, false]);
    // F was held under the old mapping
    assert_eq!(h.sink.take(), vec![Sent::Up(KeyId::F)]);
    assert!(h.reports.contains("Skipping key: Unrecognized key character '!'"));
    assert!(h.reports.contains("Keys set to ASD"));
}

#[test]
fn setkeys_without_argument_keeps_mapping() {
    let h = connected(&["COM3"], "COM3", "DFJK");
    let before = h.supervisor.generation();
    h.supervisor.handle_line("setkeys");
    assert_eq!(h.supervisor.key_mapping().to_chars(), "DFJK");
    assert_eq!(h.supervisor.generation(), before);
    assert_eq!(
        h.reports.take(),
        vec!["Missing argument for setkeys. Usage: setkeys <chars>"]
    );
}

#[test]
fn setport_success_reports_success() {
    let h = connected(&["COM3", "COM4"], "COM3", "DFJK");
    h.supervisor.handle_line("setport COM4");
    assert_eq!(h.supervisor.mode(), InputMode::Normal);
    assert_eq!(h.supervisor.port_name().as_deref(), Some("COM4"));
    assert_eq!(h.reports.take(), vec!["Now using port COM4"]);
}

#[test]
fn setport_unavailable_keeps_current_link() {
    let h = connected(&["COM3"], "COM3", "DFJK");
    h.supervisor.handle_line("setport COM9");
    assert_eq!(h.supervisor.mode(), InputMode::Normal);
    assert_eq!(h.supervisor.port_name().as_deref(), Some("COM3"));
    assert_eq!(h.supervisor.link_status(), LinkStatus::Open);
    assert!(h.reports.contains("Still using COM3"));
}

#[test]
fn setport_open_error_falls_back_to_awaiting_port() {
    let h = connected(&["COM3", "COM4"], "COM3", "DFJK");
    h.ports.broken.lock().unwrap().push("COM4".to_string());
    h.supervisor.handle_line("setport COM4");
    assert_eq!(h.supervisor.mode(), InputMode::AwaitingPort);
    assert_eq!(h.supervisor.link_status(), LinkStatus::Closed);

    h.supervisor.handle_line("COM3");
    assert_eq!(h.supervisor.mode(), InputMode::Normal);
}

#[test]
fn setport_bumps_generation_and_polling_resumes() {
    let h = connected(&["COM3", "COM4"], "COM3", "DFJK");
    let before = h.supervisor.generation();
    h.supervisor.handle_line("setport COM4");
    assert!(h.supervisor.generation() > before);
    h.ports.sample(0b0001);
    assert_eq!(h.supervisor.poll_once(), PollOutcome::Sample { events: 1 });
}

// ── Reads racing reconfiguration ──

#[test]
fn sample_read_during_setkeys_is_discarded() {
    let h = connected(&["COM3"], "COM3", "DF");
    h.sink.take();
    let gate = h.ports.gate_next_read();
    h.ports.sample(0b0011);

    let outcome = std::thread::scope(|s| {
        let poll = s.spawn(|| h.supervisor.poll_once());
        gate.entered.wait();
        // setkeys never takes the link lock, so it completes mid-read
        h.supervisor.handle_line("setkeys JK");
        gate.release.wait();
        poll.join().unwrap()
    });

    assert_eq!(outcome, PollOutcome::Discarded);
    assert!(h.sink.take().is_empty());
    assert_eq!(h.supervisor.key_state().held_bits().count(), 0);

    // The next sample is applied under the new mapping
    h.ports.sample(0b0001);
    assert_eq!(h.supervisor.poll_once(), PollOutcome::Sample { events: 1 });
    assert_eq!(h.sink.take(), vec![Sent::Down(KeyId::J)]);
}

#[test]
fn read_failure_during_setkeys_keeps_the_link() {
    let h = connected(&["COM3"], "COM3", "DF");
    let gate = h.ports.gate_next_read();
    h.ports.unplug();

    let outcome = std::thread::scope(|s| {
        let poll = s.spawn(|| h.supervisor.poll_once());
        gate.entered.wait();
        h.supervisor.handle_line("setkeys JK");
        gate.release.wait();
        poll.join().unwrap()
    });

    assert_eq!(outcome, PollOutcome::Discarded);
    assert_eq!(h.supervisor.mode(), InputMode::Normal);
    assert_eq!(h.supervisor.link_status(), LinkStatus::Open);
    assert!(!h.reports.contains("Lost connection"));
}

#[test]
fn read_failure_during_setport_leaves_new_port_in_use() {
    let h = connected(&["COM3", "COM4"], "COM3", "DF");
    let gate = h.ports.gate_next_read();
    h.ports.unplug();

    let outcome = std::thread::scope(|s| {
        let poll = s.spawn(|| h.supervisor.poll_once());
        gate.entered.wait();
        // setport holds the mode lock while it waits for the in-flight read
        let setport = s.spawn(|| h.supervisor.handle_line("setport COM4"));
        std::thread::sleep(Duration::from_millis(100));
        gate.release.wait();
        setport.join().unwrap();
        poll.join().unwrap()
    });

    assert_eq!(outcome, PollOutcome::Discarded);
    assert_eq!(h.supervisor.mode(), InputMode::Normal);
    assert_eq!(h.supervisor.port_name().as_deref(), Some("COM4"));
    assert_eq!(h.supervisor.link_status(), LinkStatus::Open);
    assert!(h.reports.contains("Now using port COM4"));
    assert!(!h.reports.contains("Lost connection"));
}

#[test]
fn unknown_command_gets_a_diagnostic() {
    let h = connected(&["COM3"], "COM3", "DFJK");
    h.supervisor.handle_line("frobnicate now");
    assert_eq!(
        h.reports.take(),
        vec!["Unknown command 'frobnicate'. Type 'help' for a list of commands."]
    );
    h.supervisor.handle_line("   ");
    assert!(h.reports.take().is_empty());
}

#[test]
fn help_ports_and_status() {
    let h = connected(&["COM3", "COM4"], "COM3", "DF");

    h.supervisor.handle_line("help");
    let help = h.reports.take().join("\n");
    for cmd in ["setkeys", "setport", "ports", "status", "help"] {
        assert!(help.contains(cmd), "help should list {cmd}");
    }

    h.supervisor.handle_line("ports");
    let ports = h.reports.take().join("\n");
    assert!(ports.contains("COM3") && ports.contains("COM4"));

    h.supervisor.handle_line("status");
    let status = h.reports.take().join("\n");
    assert!(status.contains("Mode: normal"));
    assert!(status.contains("Port: COM3 (open)"));
    assert!(status.contains("Keys: 0:D 1:F"));
}

// ── Threads ──

#[test]
fn poller_thread_and_console_cooperate() {
    let h = Arc::new(connected(&["COM3", "COM4"], "COM3", "DF"));
    let running = Arc::new(AtomicBool::new(true));

    let poller = {
        let h = Arc::clone(&h);
        let running = Arc::clone(&running);
        std::thread::spawn(move || h.supervisor.run_poller(&running))
    };

    h.ports.sample(0b01);
    wait_for(|| h.sink.0.lock().unwrap().contains(&Sent::Down(KeyId::D)));

    h.ports.unplug();
    wait_for(|| h.supervisor.mode() == InputMode::AwaitingPort);

    console::run_console(&h.supervisor, Cursor::new("COM4\n")).unwrap();
    assert_eq!(h.supervisor.mode(), InputMode::Normal);

    h.ports.sample(0b10);
    wait_for(|| h.sink.0.lock().unwrap().contains(&Sent::Down(KeyId::F)));

    running.store(false, Ordering::SeqCst);
    poller.join().unwrap();

    // F was still held at shutdown
    assert_eq!(h.sink.take().last(), Some(&Sent::Up(KeyId::F)));
}

fn wait_for(cond: impl Fn() -> bool) {
    for _ in 0..500 {
        if cond() {
            return;
        }
        std::thread::sleep(Duration::from_millis(5));
    }
    panic!("condition not reached within 2.5s");
}
