//! Golden-file discovery for the aggregator tests.
//!
//! A case is a `<name>.txt` input next to a `<name>.out` file holding the
//! exact expected report.

use std::path::{Path, PathBuf};
use std::{fs, io};

pub const INPUT_EXT: &str = "txt";
pub const EXPECTED_EXT: &str = "out";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Case {
    pub name: String,
    pub input: PathBuf,
    pub expected: PathBuf,
}

pub fn read_file<P: AsRef<Path>>(file_name: P) -> String {
    fs::read_to_string(&file_name)
        .unwrap_or_else(|e| panic!("failed to read {}: {e}", file_name.as_ref().display()))
}

/// Paths (without extension) of every file under `root` ending in `ext`,
/// sorted so cases run in a stable order.
pub fn find(root: &Path, ext: &str) -> io::Result<Vec<PathBuf>> {
    fn walk(dir: &Path, ext: &str, out: &mut Vec<PathBuf>) -> io::Result<()> {
        for entry in fs::read_dir(dir)? {
            let path = entry?.path();
            if path.is_dir() {
                walk(&path, ext, out)?;
            } else if path.extension().and_then(|e| e.to_str()) == Some(ext) {
                out.push(path.with_extension(""));
            }
        }
        Ok(())
    }

    let mut res = Vec::new();
    walk(root, ext.trim_start_matches('.'), &mut res)?;
    res.sort();
    Ok(res)
}

/// Every input under `root` that has a matching expected-output file.
pub fn cases(root: &Path) -> io::Result<Vec<Case>> {
    Ok(find(root, INPUT_EXT)?
        .into_iter()
        .map(|base| Case {
            name: base
                .strip_prefix(root)
                .unwrap_or(&base)
                .display()
                .to_string(),
            input: base.with_extension(INPUT_EXT),
            expected: base.with_extension(EXPECTED_EXT),
        })
        .filter(|case| case.expected.is_file())
        .collect())
}
