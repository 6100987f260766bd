/// Camera capture through an external program
///
/// The program is told where to write (the `{output}` placeholder) and
/// only reports success or failure, the same contract as handing a file
/// URI to a system camera app.

use async_trait::async_trait;
use std::path::Path;
use tokio::process::Command;

use super::Camera;
use crate::config::OUTPUT_PLACEHOLDER;

#[derive(Debug, Clone)]
pub struct CommandCamera {
    command: Vec<String>,
}

impl CommandCamera {
    pub fn new(command: Vec<String>) -> Self {
        Self { command }
    }

    /// Program arguments with the destination substituted in
    fn args_for(&self, destination: &Path) -> Vec<String> {
        let output = destination.to_string_lossy();
        self.command
            .iter()
            .skip(1)
            .map(|arg| arg.replace(OUTPUT_PLACEHOLDER, &output))
            .collect()
    }
}

#[async_trait]
impl Camera for CommandCamera {
    async fn capture(&self, destination: &Path) -> bool {
        let Some(program) = self.command.first() else {
            tracing::warn!("no camera command configured");
            return false;
        };

        tracing::info!(%program, destination = %destination.display(), "📷 launching camera");

        let status = Command::new(program)
            .args(self.args_for(destination))
            .kill_on_drop(true)
            .status()
            .await;

        match status {
            Ok(status) if status.success() => true,
            Ok(status) => {
                tracing::info!(%program, %status, "camera exited without a photo");
                false
            }
            Err(e) => {
                tracing::warn!(%program, error = %e, "could not launch camera");
                false
            }
        }
    }
}
