//! Hash command

use anyhow::{Context, Result};
use sigwatch_core::hashing::hash_file;
use sigwatch_schema::HashAlgorithm;
use std::path::PathBuf;

/// Print both supported digests of each file, one line per digest.
pub fn hash(files: &[PathBuf]) -> Result<()> {
    for path in files {
        for algorithm in [HashAlgorithm::Sha256, HashAlgorithm::Sha512] {
            let digest = hash_file(algorithm, path)
                .with_context(|| format!("Failed to read {}", path.display()))?;
            println!("{algorithm}  {digest}  {}", path.display());
        }
    }
    Ok(())
}
