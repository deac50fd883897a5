//! Operator command parsing
//!
//! One line in, one [`Command`] out. The first whitespace-separated token
//! selects the command (case-sensitive); everything after the first run of
//! whitespace is the argument. Parsing has no side effects.

/// Commands that take an argument
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandName {
    SetKeys,
    SetPort,
}

impl CommandName {
    pub fn as_str(&self) -> &'static str {
        match self {
            CommandName::SetKeys => "setkeys",
            CommandName::SetPort => "setport",
        }
    }

    /// What the argument should look like, for diagnostics
    pub fn usage(&self) -> &'static str {
        match self {
            CommandName::SetKeys => "setkeys <chars>",
            CommandName::SetPort => "setport <name>",
        }
    }
}

/// A parsed operator line
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Rebuild the key mapping from these characters
    SetKeys(String),
    /// Switch the serial link to this port
    SetPort(String),
    /// List enumerable ports
    Ports,
    /// Report mode, link and mapping
    Status,
    Help,
    /// A command that needs an argument was given none
    MissingArgument(CommandName),
    /// First token matched no command
    Unknown(String),
    /// Blank line
    Empty,
}

/// Parse a single line
pub fn parse(line: &str) -> Command {
    let line = line.trim();
    if line.is_empty() {
        return Command::Empty;
    }

    let (name, arg) = match line.split_once(char::is_whitespace) {
        Some((name, rest)) => (name, rest.trim_start()),
        None => (line, ""),
    };

    let with_arg = |cmd: CommandName, make: fn(String) -> Command| {
        if arg.is_empty() {
            Command::MissingArgument(cmd)
        } else {
            make(arg.to_string())
        }
    };

    match name {
        "setkeys" => with_arg(CommandName::SetKeys, Command::SetKeys),
        "setport" => with_arg(CommandName::SetPort, Command::SetPort),
        "ports" => Command::Ports,
        "status" => Command::Status,
        "help" => Command::Help,
        other => Command::Unknown(other.to_string()),
    }
}

/// Text for the `help` command
pub const HELP: &str = "\
Commands:
  setkeys <chars>  map sensor bits to keys, bit 0 first (e.g. setkeys DFJK)
  setport <name>   switch to another serial port
  ports            list available serial ports
  status           show port, link and key mapping
  help             show this list";
