//! npm peer dependency installation
//!
//! Components lean on a couple of runtime packages. Installation is offered
//! during setup, runs through the project's npm, and streams the installer
//! output so the user sees what is happening.

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use colored::Colorize;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::Command as TokioCommand;
use tokio::time::timeout;

use crate::ops::DependencyInstaller;

/// Timeout for installation (2 minutes; npm can be slow on cold caches)
const INSTALL_TIMEOUT: Duration = Duration::from_secs(120);

/// Packages the published components expect at runtime
pub const PEER_PACKAGES: &[&str] = &["framer-motion", "clsx"];

/// Installs peer packages with npm in a given project directory
pub struct NpmInstaller {
    project_dir: PathBuf,
}

impl NpmInstaller {
    pub fn new(project_dir: impl AsRef<Path>) -> Self {
        Self {
            project_dir: project_dir.as_ref().to_path_buf(),
        }
    }
}

#[async_trait]
impl DependencyInstaller for NpmInstaller {
    fn command(&self) -> String {
        format!("npm install {}", PEER_PACKAGES.join(" "))
    }

    /// Run the install command, streaming its output with a timeout
    async fn install(&self) -> Result<()> {
        let cmd = self.command();
        println!();
        println!("{} {}", "Running:".dimmed(), cmd.yellow());
        println!();

        let mut child = TokioCommand::new("sh")
            .arg("-c")
            .arg(&cmd)
            .current_dir(&self.project_dir)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()?;

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| anyhow!("Failed to capture installer stdout"))?;
        let stderr = child
            .stderr
            .take()
            .ok_or_else(|| anyhow!("Failed to capture installer stderr"))?;

        let mut stdout_reader = BufReader::new(stdout).lines();
        let mut stderr_reader = BufReader::new(stderr).lines();

        let output_task = async {
            loop {
                tokio::select! {
                    line = stdout_reader.next_line() => {
                        match line {
                            Ok(Some(line)) => println!("  {}", line),
                            Ok(None) => break,
                            Err(e) => {
                                eprintln!("{} {}", "Error reading stdout:".red(), e);
                                break;
                            }
                        }
                    }
                    line = stderr_reader.next_line() => {
                        match line {
                            Ok(Some(line)) => eprintln!("  {}", line.yellow()),
                            Ok(None) => {}
                            Err(e) => {
                                eprintln!("{} {}", "Error reading stderr:".red(), e);
                            }
                        }
                    }
                }
            }
        };

        match timeout(INSTALL_TIMEOUT, output_task).await {
            Ok(_) => {}
            Err(_) => {
                let _ = child.kill().await;
                println!();
                anyhow::bail!(
                    "Installation timed out after {} seconds.\n\
                     The registry may be unreachable. Please try again later or install manually:\n\
                     {}",
                    INSTALL_TIMEOUT.as_secs(),
                    cmd
                );
            }
        }

        match timeout(Duration::from_secs(5), child.wait()).await {
            Ok(Ok(status)) => {
                println!();
                if status.success() {
                    Ok(())
                } else {
                    anyhow::bail!(
                        "Installation failed with exit code: {}\n\
                         Please try installing manually: {}",
                        status.code().unwrap_or(-1),
                        cmd
                    );
                }
            }
            Ok(Err(e)) => {
                anyhow::bail!("Failed to wait for npm: {}", e);
            }
            Err(_) => {
                let _ = child.kill().await;
                anyhow::bail!(
                    "Installation process hung. Please try installing manually:\n{}",
                    cmd
                );
            }
        }
    }
}
