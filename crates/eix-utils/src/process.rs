//! Running external conversion tools (ImageMagick, Ghostscript).

use std::ffi::OsString;
use std::io::Read;
use std::process::{Child, Command, ExitStatus, Stdio};
use std::thread;
use std::time::{Duration, Instant};

use eix_core::error::{CoverError, Result};
use eix_core::plugin::ToolRunner;

const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Runs tools as child processes, killing any that outlive the timeout.
#[derive(Debug, Clone, Default)]
pub struct SystemRunner {
    timeout: Option<Duration>,
}

impl SystemRunner {
    pub fn new(timeout: Option<Duration>) -> Self {
        Self { timeout }
    }

    fn wait(&self, program: &str, child: &mut Child) -> Result<ExitStatus> {
        let Some(timeout) = self.timeout else {
            return Ok(child.wait()?);
        };

        let start = Instant::now();
        loop {
            if let Some(status) = child.try_wait()? {
                return Ok(status);
            }
            if start.elapsed() >= timeout {
                let _ = child.kill();
                let _ = child.wait();
                return Err(CoverError::ConversionFailed(format!(
                    "{} timed out after {}s",
                    program,
                    timeout.as_secs_f32()
                )));
            }
            thread::sleep(POLL_INTERVAL);
        }
    }
}

impl ToolRunner for SystemRunner {
    fn run(&self, program: &str, args: &[OsString]) -> Result<()> {
        log::debug!("Running {} {:?}", program, args);

        let mut child = Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| {
                log::debug!("Failed to spawn {}: {}", program, e);
                CoverError::ConversionToolMissing(program.to_string())
            })?;

        // Drained on a separate thread so a chatty tool cannot block on a full pipe.
        let stderr_reader = child.stderr.take().map(|mut stderr| {
            thread::spawn(move || {
                let mut buf = Vec::new();
                let _ = stderr.read_to_end(&mut buf);
                buf
            })
        });

        let status = self.wait(program, &mut child);
        let stderr = stderr_reader
            .and_then(|handle| handle.join().ok())
            .map(|buf| String::from_utf8_lossy(&buf).trim().to_string())
            .unwrap_or_default();
        let status = status?;

        if !status.success() {
            let mut message = format!("{} exited with {}", program, status);
            if !stderr.is_empty() {
                message.push_str(": ");
                message.push_str(&stderr);
            }
            return Err(CoverError::ConversionFailed(message));
        }
        Ok(())
    }
}
