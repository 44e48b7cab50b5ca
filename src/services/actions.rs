//! User-defined external actions and the detached command runner.

use std::os::unix::process::CommandExt;
use std::process::{Command, Stdio};
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::models::{ActionEffect, ExternalActionSpec, IconSpec, MenuAction};

/// Placeholder replaced by the captured text inside argument tokens.
pub const TEXT_PLACEHOLDER: &str = "{text}";

/// Starts external programs without waiting for them.
pub trait CommandRunner: Send + Sync {
    /// Returns true when the process was started (not when it finished).
    fn launch_detached(&self, command: &str, args: &[String]) -> bool;
}

/// Runs commands in their own session with stdio closed.
#[derive(Debug, Default)]
pub struct ProcessRunner;

impl CommandRunner for ProcessRunner {
    fn launch_detached(&self, command: &str, args: &[String]) -> bool {
        let mut cmd = Command::new(command);
        cmd.args(args);
        match spawn_detached(&mut cmd) {
            Ok(mut child) => {
                let pid = child.id();
                // Reap in the background so finished children don't linger as zombies.
                std::thread::spawn(move || match child.wait() {
                    Ok(status) => debug!(pid, %status, "external command exited"),
                    Err(e) => debug!(pid, error = %e, "failed to wait for external command"),
                });
                true
            }
            Err(e) => {
                warn!(command, error = %e, "failed to launch external command");
                false
            }
        }
    }
}

/// Spawn a command detached from the current terminal session.
///
/// Uses setsid() in a pre_exec hook to create a new session, so the child
/// won't receive SIGHUP when the terminal running us closes.
fn spawn_detached(cmd: &mut Command) -> std::io::Result<std::process::Child> {
    unsafe {
        cmd.pre_exec(|| {
            libc::setsid();
            Ok(())
        });
    }
    cmd.stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()
}

/// Replace the placeholder in every token with the literal `text`.
pub fn expand_args(args: &[String], text: &str) -> Vec<String> {
    args.iter()
        .map(|arg| arg.replace(TEXT_PLACEHOLDER, text))
        .collect()
}

/// The external actions declared in configuration, in declaration order.
pub struct ExternalActionRegistry {
    specs: Vec<ExternalActionSpec>,
    runner: Arc<dyn CommandRunner>,
}

impl ExternalActionRegistry {
    pub fn new(specs: Vec<ExternalActionSpec>, runner: Arc<dyn CommandRunner>) -> Self {
        Self { specs, runner }
    }

    pub fn len(&self) -> usize {
        self.specs.len()
    }


    /// Menu entries for every enabled spec, bound to `text`.
    pub fn menu_actions(&self, text: &str) -> Vec<MenuAction> {
        self.specs
            .iter()
            .filter(|spec| spec.enabled)
            .map(|spec| {
                let effect = ActionEffect::Launch {
                    command: spec.command.clone(),
                    args: expand_args(&spec.args, text),
                };
                MenuAction::new(&spec.label, effect)
                    .with_icon(spec.icon.as_deref().and_then(IconSpec::parse))
            })
            .collect()
    }

    /// Hand an already-expanded command to the runner.
    pub fn launch(&self, command: &str, args: &[String]) -> bool {
        let started = self.runner.launch_detached(command, args);
        info!(command, started, "external action");
        started
    }
}
