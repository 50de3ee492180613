use std::path::{Path, PathBuf};

pub mod commands;

/// Derive the instrumented output path from the input path by inserting
/// `_ilc` before the extension: `test.c` becomes `test_ilc.c`, an
/// extensionless `test` becomes `test_ilc`.
pub fn derive_output_path(input: &Path) -> PathBuf {
    let name = input.file_name().and_then(|os| os.to_str()).unwrap_or("out");
    let derived = match name.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() => format!("{stem}_ilc.{ext}"),
        _ => format!("{name}_ilc"),
    };
    input.with_file_name(derived)
}
