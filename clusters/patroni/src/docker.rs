use std::process::Stdio;
use std::time::Duration;

use tokio::process::Command;
use tracing::debug;
use tracing::info;

#[derive(Debug, thiserror::Error)]
pub enum DockerError {
    #[error("failed to run `{cmd}`: {source}")]
    Spawn {
        cmd: String,
        source: std::io::Error,
    },

    #[error("`{cmd}` exited with {code:?}: {stderr}")]
    Failed {
        cmd: String,
        code: Option<i32>,
        stderr: String,
    },

    #[error("`{cmd}` timeout after {timeout:?}")]
    Timeout { cmd: String, timeout: Duration },
}

/// Runs `docker` subcommands.
#[derive(Debug, Clone)]
pub struct Docker {
    bin: String,
}

impl Default for Docker {
    fn default() -> Self {
        Self::new("docker")
    }
}

impl Docker {
    pub fn new(bin: impl ToString) -> Self {
        Self {
            bin: bin.to_string(),
        }
    }

    /// Run `docker <args>` and return its stdout.
    ///
    /// The child is killed if `timeout` expires.
    pub async fn run(
        &self,
        args: &[&str],
        timeout: Duration,
    ) -> Result<String, DockerError> {
        self.run_with_env(args, &[], timeout).await
    }

    /// Like [`run`](Self::run), with extra environment variables for the
    /// docker client process. Their values are not logged.
    pub async fn run_with_env(
        &self,
        args: &[&str],
        envs: &[(&str, &str)],
        timeout: Duration,
    ) -> Result<String, DockerError> {
        let cmd = format!("{} {}", self.bin, args.join(" "));
        debug!("run: {}", cmd);

        let mut command = Command::new(&self.bin);
        command
            .args(args)
            .envs(envs.iter().copied())
            .stdin(Stdio::null())
            .kill_on_drop(true);

        let output = tokio::time::timeout(timeout, command.output())
            .await
            .map_err(|_| DockerError::Timeout {
                cmd: cmd.clone(),
                timeout,
            })?
            .map_err(|source| DockerError::Spawn {
                cmd: cmd.clone(),
                source,
            })?;

        if !output.status.success() {
            return Err(DockerError::Failed {
                cmd,
                code: output.status.code(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        Ok(String::from_utf8_lossy(&output.stdout).to_string())
    }

    /// Run `command` inside `container`.
    pub async fn exec(
        &self,
        container: &str,
        command: &[&str],
        timeout: Duration,
    ) -> Result<String, DockerError> {
        let mut args = vec!["exec", container];
        args.extend_from_slice(command);
        self.run(&args, timeout).await
    }

    /// Run `command` inside `container` with `envs` set in it.
    ///
    /// Values travel through the client's environment (`docker exec -e NAME`)
    /// so they never show up in the command line.
    pub async fn exec_with_env(
        &self,
        container: &str,
        envs: &[(&str, &str)],
        command: &[&str],
        timeout: Duration,
    ) -> Result<String, DockerError> {
        let mut args = vec!["exec"];
        for (name, _) in envs {
            args.extend_from_slice(&["-e", *name]);
        }
        args.push(container);
        args.extend_from_slice(command);
        self.run_with_env(&args, envs, timeout).await
    }

    /// Graceful stop, with `grace` before docker kills the container.
    pub async fn stop(
        &self,
        container: &str,
        grace: Duration,
    ) -> Result<(), DockerError> {
        info!("stop container {}", container);
        let secs = grace.as_secs().to_string();
        self.run(
            &["stop", "-t", &secs, container],
            grace + Duration::from_secs(20),
        )
        .await?;
        Ok(())
    }

    pub async fn start(&self, container: &str) -> Result<(), DockerError> {
        info!("start container {}", container);
        self.run(&["start", container], Duration::from_secs(30)).await?;
        Ok(())
    }

    pub async fn kill(&self, container: &str) -> Result<(), DockerError> {
        info!("kill container {}", container);
        self.run(&["kill", container], Duration::from_secs(10)).await?;
        Ok(())
    }

    pub async fn pause(&self, container: &str) -> Result<(), DockerError> {
        info!("pause container {}", container);
        self.run(&["pause", container], Duration::from_secs(5)).await?;
        Ok(())
    }

    pub async fn unpause(&self, container: &str) -> Result<(), DockerError> {
        info!("unpause container {}", container);
        self.run(&["unpause", container], Duration::from_secs(5)).await?;
        Ok(())
    }

    pub async fn is_running(&self, container: &str) -> bool {
        let res = self
            .run(
                &["inspect", "-f", "{{.State.Running}}", container],
                Duration::from_secs(5),
            )
            .await;

        matches!(res, Ok(out) if out.trim() == "true")
    }
}
