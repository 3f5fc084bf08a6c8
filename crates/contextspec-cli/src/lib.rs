//! The `contextspec` command: prints usage or the version.
//!
//! Output and process exit go through an explicit [`Environment`] so the
//! command can be driven in-process.

use std::io::{self, Write};

use clap::Parser;
use tracing::debug;

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub const USAGE: &str = "Usage: contextspec --version\n  --version: Show the version\n";

/// Where the command writes and how it exits.
pub struct Environment {
    pub console: Box<dyn Write>,
    pub exit: Box<dyn FnMut(i32)>,
}

impl Environment {
    /// Real stdout and `std::process::exit`.
    pub fn process() -> Self {
        Self {
            console: Box::new(io::stdout()),
            exit: Box::new(|code| std::process::exit(code)),
        }
    }
}

#[derive(Debug, Parser)]
#[command(name = "contextspec", disable_help_flag = true, disable_version_flag = true)]
struct Cli {
    /// Show the version
    #[arg(long)]
    version: bool,

    #[arg(long)]
    help: bool,
}

/// Run the command with `args` (program name first) and exit through `env`.
pub fn run<I, T>(args: I, env: &mut Environment) -> io::Result<()>
where
    I: IntoIterator<Item = T>,
    T: Into<std::ffi::OsString> + Clone,
{
    let code = match Cli::try_parse_from(args) {
        Ok(Cli {
            version: true,
            help: false,
        }) => {
            writeln!(env.console, "contextspec {VERSION}")?;
            0
        }
        Ok(Cli { version: false, .. }) => {
            write!(env.console, "{USAGE}")?;
            0
        }
        // Exactly one option is accepted.
        Ok(cli) => {
            debug!(?cli, "conflicting options");
            write!(env.console, "{USAGE}")?;
            1
        }
        Err(err) => {
            debug!(kind = ?err.kind(), "unrecognized arguments");
            write!(env.console, "{USAGE}")?;
            1
        }
    };
    env.console.flush()?;
    (env.exit)(code);
    Ok(())
}
