//! Pre-flight checks for sdt-probes
//!
//! Validates the input binary and the output directory before a session
//! starts. Provides clear, actionable error messages when something is off.

use anyhow::{bail, Context, Result};
use object::{Object, ObjectSection};
use std::path::Path;

/// Run all pre-flight checks before loading debug info
pub fn run_preflight_checks(binary: &Path, output_dir: &Path) -> Result<()> {
    check_binary_exists(binary)?;
    check_debug_info(binary)?;
    prepare_output_dir(output_dir)?;
    Ok(())
}

/// Check if the input binary exists and is a regular file
pub fn check_binary_exists(binary: &Path) -> Result<()> {
    if !binary.exists() {
        bail!(
            "Binary not found: {}\n\n\
             Make sure the path is correct and the binary exists.",
            binary.display()
        );
    }
    if !binary.is_file() {
        bail!(
            "Not a file: {}\n\n\
             BINARY must point to an object file, not a directory.",
            binary.display()
        );
    }
    Ok(())
}

/// Check that the binary parses and carries DWARF debug info
pub fn check_debug_info(binary: &Path) -> Result<()> {
    let file_data = std::fs::read(binary)
        .with_context(|| format!("Failed to read binary: {}", binary.display()))?;

    let obj = object::File::parse(&*file_data)
        .with_context(|| format!("Not an object file: {}", binary.display()))?;

    let has_debug_info = obj.section_by_name(".debug_info").is_some_and(|s| s.size() > 0);
    if !has_debug_info {
        bail!(
            "No DWARF debug info in {}\n\n\
             Rebuild with -g (or debug = true in the Cargo profile) and do not strip the binary.",
            binary.display()
        );
    }

    if !obj.section_by_name(".symtab").is_some_and(|s| s.size() > 0) {
        eprintln!("warning: no symbol table, diagnostics will show addresses only");
    }
    Ok(())
}

/// Create the output directory if needed and make sure it is a directory
pub fn prepare_output_dir(output_dir: &Path) -> Result<()> {
    if output_dir.exists() && !output_dir.is_dir() {
        bail!("Output path exists and is not a directory: {}", output_dir.display());
    }
    std::fs::create_dir_all(output_dir)
        .with_context(|| format!("Cannot create output directory {}", output_dir.display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_binary_not_found() {
        let result = check_binary_exists(Path::new("/nonexistent/path/to/binary"));
        assert!(result.is_err());
        let err = result.unwrap_err().to_string();
        assert!(err.contains("Binary not found"));
    }

    #[test]
    fn test_directory_is_not_a_binary() {
        let dir = tempfile::tempdir().unwrap();
        let err = check_binary_exists(dir.path()).unwrap_err().to_string();
        assert!(err.contains("Not a file"));
    }

    #[test]
    fn test_garbage_is_not_an_object() {
        let file = tempfile::NamedTempFile::new().unwrap();
        std::fs::write(file.path(), b"definitely not ELF").unwrap();
        let err = check_debug_info(file.path()).unwrap_err().to_string();
        assert!(err.contains("Not an object file"));
    }

    #[test]
    fn test_prepare_output_dir_creates_nested() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("a/b/c");
        prepare_output_dir(&nested).unwrap();
        assert!(nested.is_dir());
        // Idempotent
        prepare_output_dir(&nested).unwrap();
    }

    #[test]
    fn test_prepare_output_dir_rejects_file() {
        let file = tempfile::NamedTempFile::new().unwrap();
        let err = prepare_output_dir(file.path()).unwrap_err().to_string();
        assert!(err.contains("not a directory"));
    }
}
