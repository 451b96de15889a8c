//! Backend process supervision.
//!
//! The sandboxed backend is a long-running listener, so any exit is
//! unexpected and reported as fatal. The child is killed if the supervising
//! task is dropped.

use std::process::Stdio;

use tokio::process::Command;
use tokio::task::JoinHandle;

use crate::lifecycle::fatal::{FatalError, FatalSender};

#[derive(Debug, Clone)]
pub struct BackendSupervisor {
    program: String,
    args: Vec<String>,
}

impl BackendSupervisor {
    /// `None` for an empty command (backend managed elsewhere).
    pub fn from_command(command: &[String]) -> Option<Self> {
        let (program, args) = command.split_first()?;
        Some(Self {
            program: program.clone(),
            args: args.to_vec(),
        })
    }

    pub fn spawn(self, fatal: FatalSender) -> JoinHandle<()> {
        tokio::spawn(async move {
            if let Err(error) = self.run().await {
                fatal.report(error);
            }
        })
    }

    /// Run the backend to completion. Always ends in an error.
    pub async fn run(&self) -> Result<(), FatalError> {
        let mut child = Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::null())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| FatalError::BackendSpawn {
                program: self.program.clone(),
                source,
            })?;

        tracing::info!(program = %self.program, pid = ?child.id(), "Backend started");

        let status = child.wait().await.map_err(FatalError::BackendWait)?;
        Err(FatalError::BackendExited(status))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lifecycle::fatal::fatal_channel;

    fn command(parts: &[&str]) -> Vec<String> {
        parts.iter().map(|p| p.to_string()).collect()
    }

    #[test]
    fn empty_command_is_unsupervised() {
        assert!(BackendSupervisor::from_command(&[]).is_none());
    }

    #[tokio::test]
    async fn missing_program_is_spawn_error() {
        let supervisor =
            BackendSupervisor::from_command(&command(&["/nonexistent/backend"])).unwrap();
        assert!(matches!(
            supervisor.run().await,
            Err(FatalError::BackendSpawn { .. })
        ));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn exit_is_reported() {
        let (tx, rx) = fatal_channel();
        let supervisor =
            BackendSupervisor::from_command(&command(&["sh", "-c", "exit 3"])).unwrap();
        supervisor.spawn(tx).await.unwrap();

        match rx.wait().await {
            Some(FatalError::BackendExited(status)) => assert_eq!(status.code(), Some(3)),
            other => panic!("unexpected {other:?}"),
        }
    }
}
