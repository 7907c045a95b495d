use std::path::{Path, PathBuf};

use log::{debug, info};
use walkdir::WalkDir;

use crate::error::WorkerError;
use crate::processor::is_supported;

/// Top-level listing of the data directory.
pub struct DirectoryScanner {
    data_directory: PathBuf,
}

impl DirectoryScanner {
    pub fn new<P: AsRef<Path>>(data_directory: P) -> Self {
        Self {
            data_directory: data_directory.as_ref().to_path_buf(),
        }
    }

    pub fn data_directory(&self) -> &Path {
        &self.data_directory
    }

    /// Regular files directly under the data directory. A missing directory
    /// yields an empty list.
    fn regular_files(&self) -> Result<Vec<PathBuf>, WorkerError> {
        if !self.data_directory.exists() {
            return Ok(Vec::new());
        }

        let mut files = Vec::new();
        for entry in WalkDir::new(&self.data_directory)
            .min_depth(1)
            .max_depth(1)
        {
            let entry = entry.map_err(|e| WorkerError::ScanFailed {
                path: self.data_directory.clone(),
                source: e,
            })?;

            if entry.file_type().is_file() {
                files.push(entry.into_path());
            }
        }

        Ok(files)
    }

    /// Eligible documents, sorted case-insensitively by file name.
    pub fn scan(&self) -> Result<Vec<PathBuf>, WorkerError> {
        let mut documents: Vec<PathBuf> = self
            .regular_files()?
            .into_iter()
            .filter(|path| {
                let supported = is_supported(path);
                if !supported {
                    debug!("Skipping unsupported file: {}", path.display());
                }
                supported
            })
            .collect();

        documents.sort_by_key(|path| sort_key(path));

        info!(
            "Scanned {} documents in {}",
            documents.len(),
            self.data_directory.display()
        );
        Ok(documents)
    }

    /// Names of every regular file, supported or not, as storage sees them.
    pub fn file_names(&self) -> Result<Vec<String>, WorkerError> {
        Ok(self
            .regular_files()?
            .iter()
            .filter_map(|path| path.file_name())
            .map(|name| name.to_string_lossy().into_owned())
            .collect())
    }
}

fn sort_key(path: &Path) -> (String, String) {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    (name.to_lowercase(), name)
}
