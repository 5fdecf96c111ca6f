use std::thread;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use signal_hook::consts::{SIGINT, SIGTERM};
use signal_hook::iterator::Signals;

use hawaii::config::SessionConfig;
use hawaii::session::{SessionExit, Supervisor};
use hawaii::util::logging;

/// Hawaii desktop session.
#[derive(Parser, Debug)]
#[command(author, about, version, max_term_width = 80)]
struct Options {
    /// Run inside a helper display server on the current display.
    #[arg(long)]
    nested: bool,

    /// Helper display server program used with --nested.
    #[arg(long, value_name = "PROGRAM")]
    helper: Option<String>,

    /// Compositor program.
    #[arg(long, value_name = "PROGRAM")]
    compositor: Option<String>,

    /// Seconds to wait for a child to exit before killing it.
    #[arg(long, value_name = "SECS")]
    stop_timeout: Option<u64>,
}

impl Options {
    fn apply(self, config: &mut SessionConfig) {
        config.nested |= self.nested;
        if let Some(program) = self.helper {
            config.helper.program = program;
        }
        if let Some(program) = self.compositor {
            config.compositor.program = program;
        }
        if let Some(secs) = self.stop_timeout {
            config.stop_timeout = Duration::from_secs(secs);
        }
    }
}

fn main() -> Result<()> {
    let options = Options::parse();
    logging::init();

    let mut config = SessionConfig::from_env().context("Cannot start the session")?;
    options.apply(&mut config);
    tracing::info!(
        "Starting Hawaii session ({})",
        if config.nested { "nested" } else { "direct" }
    );

    let mut supervisor = Supervisor::new(config);

    let handle = supervisor.handle();
    let mut signals =
        Signals::new([SIGINT, SIGTERM]).context("Failed to install signal handlers")?;
    thread::Builder::new()
        .name("signal-handler".to_string())
        .spawn(move || {
            for signal in signals.forever() {
                tracing::info!("Received signal {}, stopping the session", signal);
                if !handle.stop() {
                    break;
                }
            }
        })
        .context("Failed to spawn signal handler thread")?;

    match supervisor.run()? {
        SessionExit::CompositorExited(Some(0)) | SessionExit::Stopped => {}
        SessionExit::CompositorExited(code) => {
            tracing::warn!("Compositor exited abnormally ({:?})", code)
        }
        SessionExit::HelperExited(code) => {
            tracing::warn!("Helper display server went away ({:?})", code)
        }
    }

    tracing::info!("Session finished");
    Ok(())
}
