//! Reaching the system under test: readiness polling and optional process launch

use std::process::{Child, Command, Stdio};
use std::time::{Duration, Instant};

use tokio::time::sleep;
use tracing::{debug, info, warn};

use crate::config::LaunchCommand;
use crate::error::{E2eError, E2eResult};

const POLL_INTERVAL: Duration = Duration::from_millis(250);
const STOP_GRACE: Duration = Duration::from_millis(500);

/// Poll `url` until it answers with a success status or `timeout_duration` elapses
pub async fn wait_for_ready(url: &str, timeout_duration: Duration) -> E2eResult<()> {
    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(2))
        .build()?;

    let start = Instant::now();
    let mut attempts = 0;

    loop {
        attempts += 1;

        match client.get(url).send().await {
            Ok(resp) if resp.status().is_success() => {
                debug!("{} ready after {} attempt(s)", url, attempts);
                return Ok(());
            }
            Ok(resp) => {
                warn!("Readiness check on {} returned {}", url, resp.status());
            }
            Err(e) => {
                if attempts == 1 {
                    info!("Waiting for {} ...", url);
                }
                // Connection refused is expected while the server starts
                if !e.is_connect() {
                    warn!("Readiness check error: {}", e);
                }
            }
        }

        if start.elapsed() >= timeout_duration {
            return Err(E2eError::ServerHealthCheck {
                url: url.to_string(),
                attempts,
            });
        }
        sleep(POLL_INTERVAL).await;
    }
}

/// Handle to a process started by the harness; stopped on drop
pub struct ServerHandle {
    name: String,
    child: Child,
}

impl ServerHandle {
    /// Spawn `command` and wait until its `ready_url` answers
    pub async fn spawn(command: &LaunchCommand, ready_timeout: Duration) -> E2eResult<Self> {
        info!("Starting {}: {} {}", command.name, command.program, command.args.join(" "));

        let mut cmd = Command::new(&command.program);
        cmd.args(&command.args)
            .envs(&command.env)
            .stdout(Stdio::null())
            .stderr(Stdio::inherit());
        if let Some(cwd) = &command.cwd {
            cmd.current_dir(cwd);
        }

        let child = cmd.spawn().map_err(|e| {
            E2eError::ServerStartup(format!("Failed to spawn {}: {}", command.program, e))
        })?;

        let mut handle = ServerHandle {
            name: command.name.clone(),
            child,
        };

        if let Err(e) = wait_for_ready(&command.ready_url, ready_timeout).await {
            handle.stop();
            return Err(e);
        }

        info!("{} is ready at {}", command.name, command.ready_url);
        Ok(handle)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn id(&self) -> u32 {
        self.child.id()
    }

    /// SIGTERM first, then kill whatever is left after a short grace period
    pub fn stop(&mut self) {
        if let Ok(Some(_)) = self.child.try_wait() {
            return;
        }
        info!("Stopping {} (pid: {})", self.name, self.child.id());

        #[cfg(unix)]
        {
            use nix::sys::signal::{kill, Signal};
            use nix::unistd::Pid;

            let pid = Pid::from_raw(self.child.id() as i32);
            if kill(pid, Signal::SIGTERM).is_ok() {
                let deadline = Instant::now() + STOP_GRACE;
                while Instant::now() < deadline {
                    if let Ok(Some(_)) = self.child.try_wait() {
                        return;
                    }
                    std::thread::sleep(Duration::from_millis(50));
                }
            }
        }

        let _ = self.child.kill();
        let _ = self.child.wait();
    }
}

impl Drop for ServerHandle {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Start every configured process in order; on failure, already started ones are stopped
pub async fn launch_all(
    commands: &[LaunchCommand],
    ready_timeout: Duration,
) -> E2eResult<Vec<ServerHandle>> {
    let mut handles = Vec::with_capacity(commands.len());
    for command in commands {
        handles.push(ServerHandle::spawn(command, ready_timeout).await?);
    }
    Ok(handles)
}
