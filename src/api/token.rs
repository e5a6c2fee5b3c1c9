//! Bearer token persistence. The token is the only durable client-side
//! state; everything else is recomputed per run.

use anyhow::{Context, Result};
use std::fs;
use std::path::Path;

pub fn save(path: &Path, token: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
    }
    fs::write(path, token).with_context(|| format!("Failed to write token: {}", path.display()))
}

pub fn load(path: &Path) -> Result<Option<String>> {
    if !path.exists() {
        return Ok(None);
    }
    let token = fs::read_to_string(path)
        .with_context(|| format!("Failed to read token: {}", path.display()))?;
    let token = token.trim();
    Ok(if token.is_empty() {
        None
    } else {
        Some(token.to_string())
    })
}

pub fn clear(path: &Path) -> Result<()> {
    if path.exists() {
        fs::remove_file(path)
            .with_context(|| format!("Failed to remove token: {}", path.display()))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_save_load_clear_round_trip() -> Result<()> {
        let dir = TempDir::new()?;
        let path = dir.path().join("nested").join("token");

        assert_eq!(load(&path)?, None);

        save(&path, "abc123")?;
        assert_eq!(load(&path)?, Some("abc123".to_string()));

        clear(&path)?;
        assert_eq!(load(&path)?, None);
        // Clearing twice is fine.
        clear(&path)?;
        Ok(())
    }

    #[test]
    fn test_blank_token_treated_as_absent() -> Result<()> {
        let dir = TempDir::new()?;
        let path = dir.path().join("token");
        save(&path, "  \n")?;
        assert_eq!(load(&path)?, None);
        Ok(())
    }
}
