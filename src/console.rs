//! Line-oriented operator console
//!
//! Startup blocks in [`acquire_port`] until a port opens; after that
//! [`run_console`] feeds every line to the supervisor.

use std::io::{self, BufRead};

use anyhow::bail;
use tracing::{debug, info, warn};

use crate::supervisor::{InputMode, Supervisor};

/// Block until the supervisor has an open port
///
/// `preferred` is tried first without prompting. Fails only if `input` ends
/// before any port was accepted.
pub fn acquire_port<R: BufRead>(
    supervisor: &Supervisor,
    preferred: Option<&str>,
    input: &mut R,
) -> anyhow::Result<()> {
    match preferred {
        Some(port) => {
            supervisor.report(&format!("Attempting to use {port}"));
            supervisor.handle_line(port);
        }
        None => supervisor.prompt_for_port(),
    }

    while supervisor.mode() != InputMode::Normal {
        match next_line(input)? {
            Some(line) => supervisor.handle_line(&line),
            None => bail!("Console closed before a serial port was selected"),
        }
    }

    info!(
        "Serial link ready on {}",
        supervisor.port_name().unwrap_or_default()
    );
    Ok(())
}

/// Feed console lines to the supervisor until input ends
pub fn run_console<R: BufRead>(supervisor: &Supervisor, mut input: R) -> io::Result<()> {
    while let Some(line) = next_line(&mut input)? {
        debug!("Console: {:?}", line);
        supervisor.handle_line(&line);
    }
    info!("Console input closed; operator commands unavailable");
    Ok(())
}

/// Read the next line, skipping lines that are not UTF-8
///
/// Returns `None` at end of input.
fn next_line<R: BufRead>(input: &mut R) -> io::Result<Option<String>> {
    let mut buf = Vec::new();
    loop {
        buf.clear();
        if input.read_until(b'\n', &mut buf)? == 0 {
            return Ok(None);
        }
        match String::from_utf8(buf) {
            Ok(mut line) => {
                let len = line.trim_end_matches(['\r', '\n']).len();
                line.truncate(len);
                return Ok(Some(line));
            }
            Err(e) => {
                warn!("Ignoring console line that is not valid UTF-8: {}", e.utf8_error());
                buf = e.into_bytes();
            }
        }
    }
}
