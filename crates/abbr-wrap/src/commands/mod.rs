//! Command implementations.

use std::io::Read;

use anyhow::Context;
use camino::Utf8Path;

pub mod annotate;
pub mod info;
pub mod list;
#[cfg(feature = "mcp")]
pub mod serve;

/// Read a file and validate its size against the configured limit.
pub fn read_input_file(path: &Utf8Path, max_bytes: Option<usize>) -> anyhow::Result<String> {
    // Preflight: check file size via metadata before reading into memory.
    let metadata =
        std::fs::metadata(path.as_std_path()).with_context(|| format!("failed to read {path}"))?;
    if let Some(max) = max_bytes {
        let size = metadata.len() as usize;
        if size > max {
            anyhow::bail!("input too large: {path} is {size} bytes (limit: {max} bytes)");
        }
    }

    let content = std::fs::read_to_string(path.as_std_path())
        .with_context(|| format!("failed to read {path}"))?;
    Ok(content)
}

/// Read standard input, stopping one byte past the limit so oversized
/// input is rejected without buffering all of it.
pub fn read_stdin(max_bytes: Option<usize>) -> anyhow::Result<String> {
    read_limited(std::io::stdin().lock(), max_bytes)
}

fn read_limited(reader: impl Read, max_bytes: Option<usize>) -> anyhow::Result<String> {
    let limit = max_bytes
        .map_or(u64::MAX, |max| u64::try_from(max).unwrap_or(u64::MAX).saturating_add(1));
    let mut buf = Vec::new();
    reader
        .take(limit)
        .read_to_end(&mut buf)
        .context("failed to read stdin")?;
    if let Some(max) = max_bytes
        && buf.len() > max
    {
        anyhow::bail!("input too large: stdin exceeds {max} bytes");
    }
    String::from_utf8(buf).context("stdin is not valid UTF-8")
}
