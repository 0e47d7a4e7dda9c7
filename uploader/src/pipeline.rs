use crate::assignment::{ClusterAssignment, parse_assignments};
use crate::client::{ClusterBatch, ClusterSubmitter, SubmitResult};
use crate::errors::UploadError;
use std::collections::VecDeque;
use std::path::{Path, PathBuf};

/// An uploaded file: its display name and raw contents.
#[derive(Clone, Debug, PartialEq)]
pub struct FileHandle {
    pub name: String,
    pub data: Vec<u8>,
}

impl FileHandle {
    pub fn new(name: impl Into<String>, data: impl Into<Vec<u8>>) -> Self {
        FileHandle {
            name: name.into(),
            data: data.into(),
        }
    }

    pub fn open(path: &Path) -> Result<Self, UploadError> {
        let data = std::fs::read(path).map_err(|source| UploadError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        Ok(FileHandle { name, data })
    }
}

/// Source of user-chosen files. `None` means the pick was cancelled.
pub trait FilePicker {
    fn pick(&mut self) -> Result<Option<FileHandle>, UploadError>;
}

/// Picks files from a fixed list of paths, in order.
#[derive(Debug, Default)]
pub struct PathPicker {
    paths: VecDeque<PathBuf>,
}

impl PathPicker {
    pub fn new(paths: impl IntoIterator<Item = PathBuf>) -> Self {
        PathPicker {
            paths: paths.into_iter().collect(),
        }
    }
}

impl FilePicker for PathPicker {
    fn pick(&mut self) -> Result<Option<FileHandle>, UploadError> {
        self.paths
            .pop_front()
            .map(|path| FileHandle::open(&path))
            .transpose()
    }
}

/// State of one upload dialog session.
///
/// Every chosen file is listed, but only the most recently parsed file feeds
/// the batch: parsing replaces the active assignments, it never merges them.
pub struct UploadPipeline<S> {
    submitter: S,
    displayed_files: Vec<FileHandle>,
    active_assignments: Vec<ClusterAssignment>,
}

impl<S: ClusterSubmitter> UploadPipeline<S> {
    pub fn new(submitter: S) -> Self {
        UploadPipeline {
            submitter,
            displayed_files: Vec::new(),
            active_assignments: Vec::new(),
        }
    }

    pub fn submitter(&self) -> &S {
        &self.submitter
    }

    pub fn displayed_files(&self) -> &[FileHandle] {
        &self.displayed_files
    }

    pub fn active_assignments(&self) -> &[ClusterAssignment] {
        &self.active_assignments
    }

    /// Asks the picker for a file. Returns the number of parsed assignments,
    /// or `None` when the pick was cancelled.
    pub fn select_file(&mut self, picker: &mut dyn FilePicker) -> Result<Option<usize>, UploadError> {
        match picker.pick()? {
            Some(file) => self.on_file_chosen(file).map(Some),
            None => Ok(None),
        }
    }

    pub fn on_file_chosen(&mut self, file: FileHandle) -> Result<usize, UploadError> {
        let parsed = parse_assignments(&file.name, &file.data);
        let name = file.name.clone();
        self.displayed_files.push(file);

        let assignments = parsed.inspect_err(|e| {
            tracing::warn!(file = %name, error = %e, "could not parse uploaded file");
        })?;

        tracing::info!(file = %name, records = assignments.len(), "parsed cluster assignments");
        self.active_assignments = assignments;
        Ok(self.active_assignments.len())
    }

    /// Sends the active batch to the gateway. The batch is cleared only when
    /// the gateway accepts it.
    pub async fn submit(&mut self, project_id: &str) -> Result<SubmitResult, UploadError> {
        if self.active_assignments.is_empty() {
            return Err(UploadError::NothingToSubmit);
        }

        let batch = ClusterBatch {
            cluster_data: &self.active_assignments,
            proj_id: project_id,
        };
        let result = self.submitter.submit(&batch).await?;

        if !result.is_success() {
            return Err(UploadError::Rejected {
                status: result.status,
                message: result.error_message(),
            });
        }

        tracing::info!(
            project_id,
            records = self.active_assignments.len(),
            "cluster batch submitted"
        );
        self.reset();
        Ok(result)
    }

    pub fn reset(&mut self) {
        self.displayed_files.clear();
        self.active_assignments.clear();
    }
}
