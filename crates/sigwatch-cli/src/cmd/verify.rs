//! Verify command

use anyhow::{Context, Result};
use crossterm::style::Stylize;
use sigwatch_core::{Config, TrustAnchor, parse_manifest};
use sigwatch_schema::HexDigest;
use std::path::Path;

/// Verify a local manifest and list its entries. Returns whether the
/// signature is valid; entries are only listed for a valid signature.
pub fn verify(config: &Config, manifest: &Path, signature: &Path) -> Result<bool> {
    let anchor = TrustAnchor::load(&config.trust_anchor, config.scheme)?;
    let text = std::fs::read_to_string(manifest)
        .with_context(|| format!("Failed to read {}", manifest.display()))?;
    let sig = std::fs::read(signature)
        .with_context(|| format!("Failed to read {}", signature.display()))?;

    if !sigwatch_core::verify(text.as_bytes(), &sig, &anchor)? {
        eprintln!(
            "{} {} does not match its signature {}",
            "SECURITY".red().bold(),
            manifest.display(),
            signature.display()
        );
        return Ok(false);
    }

    println!(
        "{} {} ({})",
        "signature ok".green().bold(),
        manifest.display(),
        anchor.scheme()
    );

    let parsed = parse_manifest(&text)?;
    for (filename, expected) in parsed.iter() {
        let algorithm = HexDigest::new(expected)
            .map_or_else(|_| "unsupported".to_string(), |d| d.algorithm().to_string());
        println!("  {} {filename}", format!("{algorithm:<11}").dark_grey());
    }
    if parsed.skipped() > 0 {
        println!("  {} malformed lines skipped", parsed.skipped());
    }

    Ok(true)
}
