//! Result CSV writer — one file per CPU count, `T` rows of `n` counts each.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use ipid_core::MethodKind;

pub struct Writer {
    dir: PathBuf,
    stub: String,
}

impl Writer {
    pub fn new(dir: &Path, kind: MethodKind) -> Result<Self> {
        fs::create_dir_all(dir)
            .with_context(|| format!("failed to create results directory: {}", dir.display()))?;
        Ok(Self { dir: dir.to_path_buf(), stub: kind.file_stub() })
    }

    /// Writes one `<method><arg?>_<n>.csv` file for CPU count `n`, overwriting
    /// whatever was there from a previous run. Each row is one trial's
    /// per-thread counts, comma-separated.
    pub fn write(&self, n: usize, matrix: &[Vec<u64>]) -> Result<()> {
        let path = self.dir.join(format!("{}_{n}.csv", self.stub));
        let mut body = String::new();
        for row in matrix {
            let line = row.iter().map(u64::to_string).collect::<Vec<_>>().join(",");
            body.push_str(&line);
            body.push('\n');
        }
        fs::write(&path, body).with_context(|| format!("failed to write results file: {}", path.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn writes_one_row_per_trial() {
        let dir = tempfile::tempdir().unwrap();
        let writer = Writer::new(dir.path(), MethodKind::Global).unwrap();
        writer.write(2, &[vec![10, 20], vec![11, 19]]).unwrap();

        let contents = fs::read_to_string(dir.path().join("global_2.csv")).unwrap();
        assert_eq!(contents, "10,20\n11,19\n");
    }

    #[test]
    fn filename_includes_method_argument_where_documented() {
        let dir = tempfile::tempdir().unwrap();
        let writer = Writer::new(dir.path(), MethodKind::PerDest(32768)).unwrap();
        writer.write(1, &[vec![5]]).unwrap();
        assert!(dir.path().join("perdest32768_1.csv").exists());
    }

    #[test]
    fn rerunning_overwrites_the_previous_file() {
        let dir = tempfile::tempdir().unwrap();
        let writer = Writer::new(dir.path(), MethodKind::Global).unwrap();
        writer.write(1, &[vec![1, 2, 3]]).unwrap();
        writer.write(1, &[vec![9]]).unwrap();
        let contents = fs::read_to_string(dir.path().join("global_1.csv")).unwrap();
        assert_eq!(contents, "9\n");
    }
}
