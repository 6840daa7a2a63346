use core::fmt;
use std::fs::File;
use std::io::{self, BufWriter};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use itertools::Itertools;
use webuntis_api::class::Class;

use crate::aggregate::StudentSummary;

pub const HEADERS: [&str; 6] = [
    "Name",
    "Ges. Fehlstunden",
    "Unentsch. Fehlstunden",
    "Ges. Fehltage",
    "Unentsch. Fehltage",
    "Verspätungen",
];

/// Summaries of all students of one class, sorted by name.
#[derive(Debug, Clone)]
pub struct ReportTable {
    class_label: String,
    rows: Vec<StudentSummary>,
}

impl ReportTable {
    pub fn new(class: &Class, rows: impl IntoIterator<Item = StudentSummary>) -> Self {
        let rows = rows
            .into_iter()
            .sorted_by(|a, b| a.name().cmp(b.name()))
            .collect();

        Self {
            class_label: class.label(),
            rows,
        }
    }

    pub fn rows(&self) -> &[StudentSummary] {
        &self.rows
    }

    pub fn export_filename(&self) -> String {
        format!("fehlzeiten_{}.csv", self.class_label.replace(' ', "_"))
    }

    pub fn write_csv(&self, writer: impl io::Write) -> Result<()> {
        let mut csv = csv::WriterBuilder::new()
            .has_headers(false)
            .terminator(csv::Terminator::Any(b'\n'))
            .from_writer(writer);

        csv.write_record(HEADERS)?;
        for row in &self.rows {
            csv.serialize(row)?;
        }
        csv.flush()?;

        Ok(())
    }

    pub fn csv_string(&self) -> Result<String> {
        let mut buf = Vec::new();
        self.write_csv(&mut buf)?;
        Ok(String::from_utf8(buf)?)
    }

    /// Writes the CSV export into `dir`, returning the path of the new file.
    pub fn export_to(&self, dir: &Path) -> Result<PathBuf> {
        let path = dir.join(self.export_filename());
        let file = File::create(&path)
            .with_context(|| format!("could not create `{}`", path.display()))?;
        self.write_csv(BufWriter::new(file))
            .with_context(|| format!("could not write `{}`", path.display()))?;
        Ok(path)
    }
}

impl fmt::Display for ReportTable {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let cells = self.rows.iter().map(StudentSummary::cells).collect_vec();
        let widths: [usize; 6] = std::array::from_fn(|column| {
            cells
                .iter()
                .map(|row| row[column].chars().count())
                .chain([HEADERS[column].chars().count()])
                .max()
                .unwrap_or(0)
        });

        write_row(f, &HEADERS, &widths)?;
        writeln!(
            f,
            "{}",
            widths.iter().map(|width| "-".repeat(*width)).format("  ")
        )?;
        for row in &cells {
            write_row(f, row, &widths)?;
        }
        Ok(())
    }
}

// Names are left-aligned, counts right-aligned.
fn write_row<S: AsRef<str>>(
    f: &mut fmt::Formatter,
    row: &[S; 6],
    widths: &[usize; 6],
) -> fmt::Result {
    write!(f, "{:<width$}", row[0].as_ref(), width = widths[0])?;
    for (cell, width) in row[1..].iter().zip(&widths[1..]) {
        write!(f, "  {:>width$}", cell.as_ref(), width = *width)?;
    }
    writeln!(f)
}
