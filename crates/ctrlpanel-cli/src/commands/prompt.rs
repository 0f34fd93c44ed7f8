//! Line-oriented prompts over async stdin.

use std::io::Write as _;

use anyhow::anyhow;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader, Lines, Stdin};

use crate::client::{CliError, CliResult};

/// Reads answers one line at a time; `None` means input is exhausted.
pub(crate) struct Console<R> {
    lines: Lines<R>,
}

impl Console<BufReader<Stdin>> {
    pub(crate) fn stdin() -> Self {
        Self::new(BufReader::new(tokio::io::stdin()))
    }
}

impl<R: AsyncBufRead + Unpin> Console<R> {
    pub(crate) fn new(reader: R) -> Self {
        Self {
            lines: reader.lines(),
        }
    }

    pub(crate) async fn ask(&mut self, prompt: &str) -> CliResult<Option<String>> {
        print!("{prompt}");
        std::io::stdout()
            .flush()
            .map_err(|err| CliError::failure(anyhow!("failed to flush stdout: {err}")))?;
        self.lines
            .next_line()
            .await
            .map(|line| line.map(|text| text.trim().to_string()))
            .map_err(|err| CliError::failure(anyhow!("failed to read from stdin: {err}")))
    }

    /// `y` or `yes`, case-insensitive; anything else declines.
    pub(crate) async fn confirm(&mut self, question: &str) -> CliResult<bool> {
        let answer = self.ask(&format!("{question} [y/N] ")).await?;
        Ok(answer.is_some_and(|text| matches!(text.to_ascii_lowercase().as_str(), "y" | "yes")))
    }
}
