//! Result rendering: a text listing on stdout or a CSV file.

use anyhow::{Context, Result};
use deskenum_scanner::{Document, User};
use std::fs::File;
use std::io::Write;
use std::path::Path;
use std::time::Duration;

const RULE_WIDTH: usize = 100;

/// Counters shown after every run.
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct Summary {
    pub(crate) unique: usize,
    pub(crate) searches: usize,
    pub(crate) failed_branches: usize,
    pub(crate) capped: bool,
    pub(crate) interrupted: bool,
    pub(crate) elapsed: Duration,
}

impl Summary {
    pub(crate) fn render<W: Write>(&self, out: &mut W, noun: &str) -> std::io::Result<()> {
        writeln!(out)?;
        writeln!(
            out,
            "Found {} unique {noun} in {} search(es) ({:.1}s)",
            self.unique,
            self.searches,
            self.elapsed.as_secs_f64()
        )?;
        if self.capped {
            writeln!(out, "Stopped at the configured maximum")?;
        }
        if self.interrupted {
            writeln!(out, "Interrupted: results are partial")?;
        }
        if self.failed_branches > 0 {
            writeln!(
                out,
                "{} search(es) failed: enumeration may be incomplete",
                self.failed_branches
            )?;
        }
        Ok(())
    }
}

pub(crate) fn print_users<W: Write>(out: &mut W, users: &[User]) -> std::io::Result<()> {
    writeln!(out, "\nUnique Users ({}):", users.len())?;
    writeln!(out, "{}", "-".repeat(RULE_WIDTH))?;

    for user in users {
        writeln!(out, "\nAccountID: {}", user.account_id)?;
        writeln!(out, "  Name: {}", user.display_name)?;
        if !user.email_address.is_empty() {
            writeln!(out, "  Email: {}", user.email_address)?;
        }
        if let Some(avatar) = user.custom_avatar() {
            writeln!(out, "  Avatar: {avatar}")?;
        }
    }
    Ok(())
}

pub(crate) fn print_documents<W: Write>(out: &mut W, documents: &[Document]) -> std::io::Result<()> {
    writeln!(out, "\nUnique Documents ({}):", documents.len())?;
    writeln!(out, "{}", "-".repeat(RULE_WIDTH))?;

    for doc in documents {
        writeln!(out, "\nTitle: {}", doc.title)?;
        writeln!(out, "  URL: {}", doc.full_url)?;
        writeln!(out, "  ARI: {}", doc.ari)?;
        if !doc.source_system.is_empty() {
            writeln!(out, "  Source: {}", doc.source_system)?;
        }
        if doc.is_external {
            writeln!(out, "  External: yes")?;
        }
    }
    Ok(())
}

pub(crate) fn write_users_csv<W: Write>(writer: W, users: &[User]) -> Result<()> {
    let mut csv = csv::Writer::from_writer(writer);
    csv.write_record(["AccountID", "DisplayName", "Email", "Avatar"])?;
    for user in users {
        csv.write_record([
            user.account_id.as_str(),
            user.display_name.as_str(),
            user.email_address.as_str(),
            user.custom_avatar().unwrap_or_default(),
        ])?;
    }
    csv.flush()?;
    Ok(())
}

pub(crate) fn write_documents_csv<W: Write>(writer: W, documents: &[Document]) -> Result<()> {
    let mut csv = csv::Writer::from_writer(writer);
    csv.write_record(["Title", "URL", "ARI", "Source", "IsExternal"])?;
    for doc in documents {
        csv.write_record([
            doc.title.as_str(),
            doc.full_url.as_str(),
            doc.ari.as_str(),
            doc.source_system.as_str(),
            if doc.is_external { "true" } else { "false" },
        ])?;
    }
    csv.flush()?;
    Ok(())
}

/// Create `path` and hand it to `write`.
pub(crate) fn save<F>(path: &Path, write: F) -> Result<()>
where
    F: FnOnce(File) -> Result<()>,
{
    let file =
        File::create(path).with_context(|| format!("create CSV file {}", path.display()))?;
    write(file).with_context(|| format!("write CSV file {}", path.display()))
}
