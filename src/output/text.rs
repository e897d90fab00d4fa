//! Human-readable text report.
//!
//! ```text
//! [DUPLICATE SET] Hash: 1f0b...c3 (Size: 5 bytes)
//!   -> /data/a.txt
//!   -> /data/b.txt
//! ___________________
//!
//! Skipped entries (1):
//!   [traversal] /data/locked: Permission denied (os error 13)
//!
//! 1 duplicate set, 1 redundant file, 5 B reclaimable (20.0%), 1 entry skipped (scanned 4 files in 0.01s)
//! ```
//!
//! Diagnostics always come after every set, never between them.

use std::fmt::{Display, Write as _};
use std::io::{self, Write};

use bytesize::ByteSize;
use yansi::{Paint, Style};

use crate::diagnostics::Diagnostics;
use crate::duplicates::{DuplicateSet, ScanReport, ScanSummary};

/// Line printed after each duplicate set.
pub const SET_DELIMITER: &str = "___________________";

/// Text renderer for a scan report.
pub struct TextOutput<'a> {
    sets: &'a [DuplicateSet],
    diagnostics: &'a Diagnostics,
    summary: &'a ScanSummary,
    color: bool,
}

impl<'a> TextOutput<'a> {
    /// Create a renderer. Colors are only emitted when `color` is true.
    #[must_use]
    pub fn new(
        sets: &'a [DuplicateSet],
        diagnostics: &'a Diagnostics,
        summary: &'a ScanSummary,
        color: bool,
    ) -> Self {
        Self {
            sets,
            diagnostics,
            summary,
            color,
        }
    }

    /// Renderer over a finished scan.
    #[must_use]
    pub fn from_report(report: &'a ScanReport, color: bool) -> Self {
        Self::new(&report.sets, &report.diagnostics, &report.summary, color)
    }

    fn paint<T: Display>(&self, value: T, style: Style) -> String {
        if self.color {
            value.paint(style).to_string()
        } else {
            value.to_string()
        }
    }

    /// Write the full report.
    ///
    /// # Errors
    ///
    /// Returns any error from the writer.
    pub fn write_to<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        for set in self.sets {
            writeln!(
                writer,
                "{} Hash: {} (Size: {} bytes)",
                self.paint("[DUPLICATE SET]", Style::new().yellow().bold()),
                set.hash_hex(),
                set.size
            )?;
            for path in &set.files {
                writeln!(writer, "  -> {}", path.display())?;
            }
            writeln!(writer, "{SET_DELIMITER}")?;
        }

        if !self.diagnostics.is_empty() {
            writeln!(writer)?;
            writeln!(
                writer,
                "{}",
                self.paint(
                    format!("Skipped entries ({}):", self.diagnostics.len()),
                    Style::new().red().bold()
                )
            )?;
            for entry in self.diagnostics {
                writeln!(
                    writer,
                    "  [{}] {}: {}",
                    self.paint(entry.kind, Style::new().red()),
                    entry.path.display(),
                    entry.reason
                )?;
            }
        }

        writeln!(writer)?;
        writeln!(writer, "{}", self.summary_line())
    }

    /// One-line summary of the scan.
    #[must_use]
    pub fn summary_line(&self) -> String {
        let s = self.summary;
        if self.sets.is_empty() {
            let mut line = format!("No duplicates found (scanned {} files", s.total_files);
            if !self.diagnostics.is_empty() {
                let skipped = plural(self.diagnostics.len(), "entry", "entries");
                let _ = write!(line, ", {skipped} skipped");
            }
            line.push(')');
            return self.paint(line, Style::new().green());
        }

        format!(
            "{}, {}, {} reclaimable ({:.1}%), {} skipped (scanned {} files in {:.2}s)",
            self.paint(
                plural(s.duplicate_sets, "duplicate set", "duplicate sets"),
                Style::new().bold()
            ),
            plural(s.duplicate_files, "redundant file", "redundant files"),
            ByteSize::b(s.reclaimable_space),
            s.wasted_percentage(),
            plural(self.diagnostics.len(), "entry", "entries"),
            s.total_files,
            s.scan_duration.as_secs_f64()
        )
    }
}

fn plural(n: usize, one: &str, many: &str) -> String {
    if n == 1 {
        format!("{n} {one}")
    } else {
        format!("{n} {many}")
    }
}
