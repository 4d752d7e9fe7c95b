//! `docstash delete`: remove one saved document after confirmation.

use std::io::{self, BufRead, Write};

use anyhow::{bail, Result};
use docstash_core::DocumentId;

use crate::app::App;
use crate::config::Config;

/// `y` or `yes`, any case. Everything else, including an empty line, is no.
pub fn is_confirmation(answer: &str) -> bool {
    matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes")
}

fn confirm(id: &str) -> Result<bool> {
    if !atty::is(atty::Stream::Stdin) {
        bail!("refusing to delete without confirmation; pass --yes");
    }
    eprint!("Delete document {}? [y/N] ", id);
    io::stderr().flush()?;

    let mut input = String::new();
    io::stdin().lock().read_line(&mut input)?;
    Ok(is_confirmation(&input))
}

pub async fn run_delete(config: &Config, id: &str, yes: bool) -> Result<()> {
    if !yes && !confirm(id)? {
        println!("Cancelled.");
        return Ok(());
    }

    let app = App::open(config).await?;
    let outcome = app.controller.delete(&DocumentId::new(id)).await;
    app.close().await;
    let outcome = outcome?;

    if !outcome.was_listed {
        println!("No saved document {}; nothing to delete.", id);
    } else if outcome.reclaimed {
        println!("Deleted document {}.", id);
    } else {
        println!(
            "Deleted document {} from the list; some stored data could not be removed.",
            id
        );
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_confirmation_answers() {
        assert!(is_confirmation("y\n"));
        assert!(is_confirmation("YES"));
        assert!(!is_confirmation("\n"));
        assert!(!is_confirmation("n"));
        assert!(!is_confirmation("yep"));
    }
}
