//! Writing responses to stdout and the hunt results file.

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

use anyhow::{Context, Result};
use serde::Serialize;

/// Pretty-prints a JSON value to stdout.
pub fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    let stdout = io::stdout();
    let mut out = stdout.lock();
    serde_json::to_writer_pretty(&mut out, value).context("cannot write to stdout")?;
    writeln!(out)?;
    Ok(())
}

/// Serializes `value` as JSON indented with four spaces.
pub fn to_writer_indented<W: Write, T: Serialize + ?Sized>(writer: W, value: &T) -> Result<()> {
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut ser = serde_json::Serializer::with_formatter(writer, formatter);
    value.serialize(&mut ser)?;
    Ok(())
}

/// Writes hunt results to `path`, replacing any existing file.
pub fn save_results<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<()> {
    let file = File::create(path)
        .with_context(|| format!("cannot create output file '{}'", path.display()))?;
    let mut writer = BufWriter::new(file);
    to_writer_indented(&mut writer, value)?;
    writer
        .flush()
        .with_context(|| format!("cannot write output file '{}'", path.display()))?;
    Ok(())
}

/// Writes raw bytes (a downloaded sample) to `path`.
pub fn save_bytes(path: &Path, bytes: &[u8]) -> Result<()> {
    std::fs::write(path, bytes).with_context(|| format!("cannot write '{}'", path.display()))
}
