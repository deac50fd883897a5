// capkeys - capacitive-touch sensor board to keyboard bridge
// Configuration, operator commands and the poller/console arbitration

pub mod cli;
pub mod command;
pub mod config;
pub mod console;
pub mod supervisor;

pub use command::{Command, CommandName};
pub use config::BridgeConfig;
pub use supervisor::{InputMode, PollOutcome, Reporter, StdoutReporter, Supervisor};
