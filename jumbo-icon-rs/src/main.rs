//! Write the jumbo shell icon for a path to a PNG file.
//!
//! Usage: jumbo-icon <path> [output.png]

use anyhow::{bail, Context, Result};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let mut args = std::env::args_os().skip(1);
    let Some(path) = args.next().map(PathBuf::from) else {
        bail!("usage: jumbo-icon <path> [output.png]");
    };
    let output = args.next().map(PathBuf::from).unwrap_or_else(|| {
        let stem = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "icon".to_string());
        PathBuf::from(format!("{stem}.png"))
    });

    let png = extract_png(&path).with_context(|| format!("no icon for {}", path.display()))?;
    std::fs::write(&output, &png).with_context(|| format!("failed to write {}", output.display()))?;
    tracing::info!(output = %output.display(), bytes = png.len(), "wrote icon");

    Ok(())
}

#[cfg(windows)]
fn extract_png(path: &std::path::Path) -> Result<Vec<u8>> {
    use jumbo_icon::{IconEngine, IconResolver, WindowsShell};

    let engine = IconEngine::new(IconResolver::new(WindowsShell));
    Ok(engine.icon_png(path)?)
}

#[cfg(not(windows))]
fn extract_png(_path: &std::path::Path) -> Result<Vec<u8>> {
    bail!("shell icons are only available on Windows")
}
