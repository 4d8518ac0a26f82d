use anyhow::{bail, Context};
use async_trait::async_trait;
use client_core::{Confirmation, Confirmer};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::warn;

/// Asks on stderr and reads the answer from stdin. Anything but an explicit
/// yes declines.
pub struct StdinConfirmer;

#[async_trait]
impl Confirmer for StdinConfirmer {
    async fn confirm(&self, request: &Confirmation) -> bool {
        eprint!(
            "{} {} [{} / no]: ",
            request.title, request.text, request.confirm_label
        );
        match read_line().await {
            Ok(answer) => is_yes(&answer),
            Err(err) => {
                warn!(error = %err, "could not read confirmation; treating as no");
                false
            }
        }
    }
}

pub fn is_yes(answer: &str) -> bool {
    matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes")
}

/// Prompts for a value that was not given on the command line.
pub async fn ask(label: &str) -> anyhow::Result<String> {
    eprint!("{label}: ");
    let answer = read_line().await?;
    let answer = answer.trim_end_matches(['\r', '\n']).to_string();
    if answer.is_empty() {
        bail!("{label} is required");
    }
    Ok(answer)
}

async fn read_line() -> anyhow::Result<String> {
    let mut line = String::new();
    let read = BufReader::new(tokio::io::stdin())
        .read_line(&mut line)
        .await
        .context("failed to read from stdin")?;
    if read == 0 {
        bail!("stdin closed");
    }
    Ok(line)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_explicit_yes_confirms() {
        assert!(is_yes("y\n"));
        assert!(is_yes(" YES "));
        assert!(!is_yes(""));
        assert!(!is_yes("yep"));
        assert!(!is_yes("n"));
    }
}
