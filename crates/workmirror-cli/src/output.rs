//! Output formatting helpers.

use anyhow::Result;
use colored::Colorize;

use workmirror_core::{CycleReport, MirrorDocument};

/// Print a success message.
pub fn success(msg: &str) {
    println!("{} {}", "✓".green(), msg);
}

/// Print an error message.
pub fn error(msg: &str) {
    eprintln!("{} {}", "✗".red(), msg);
}

/// Print a labeled field.
pub fn field(label: &str, value: &str) {
    println!("{}: {}", label.dimmed(), value);
}

/// Print a mirrored document, one compact JSON line unless `pretty`.
pub fn document(doc: &MirrorDocument, pretty: bool) -> Result<()> {
    let json = if pretty {
        serde_json::to_string_pretty(doc)?
    } else {
        serde_json::to_string(doc)?
    };
    println!("{}", json);
    Ok(())
}

/// Print one line per source in a cycle report.
pub fn report(report: &CycleReport) {
    for source in &report.succeeded {
        success(&format!(
            "{}: fetched {}, reconciled {}",
            source.source, source.fetched, source.reconciled
        ));
    }
    for failure in &report.failed {
        error(&format!("{}: {}", failure.source, failure.error));
    }
}
