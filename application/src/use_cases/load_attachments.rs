//! Load Attachments use case
//!
//! Reads files from disk and extracts their text. A file that cannot be
//! read or extracted is dropped with a warning; it never fails the turn.

use crate::ports::attachment_extractor::AttachmentExtractor;
use draftsmith_domain::Attachment;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, warn};

pub struct LoadAttachmentsUseCase {
    extractor: Arc<dyn AttachmentExtractor>,
}

impl LoadAttachmentsUseCase {
    pub fn new(extractor: Arc<dyn AttachmentExtractor>) -> Self {
        Self { extractor }
    }

    /// Load all `paths` concurrently, keeping the input order.
    ///
    /// Returns the extracted attachments and one warning per dropped file.
    pub async fn execute(&self, paths: &[PathBuf]) -> (Vec<Attachment>, Vec<String>) {
        let futures = paths.iter().map(|path| self.load_one(path));
        let results: Vec<_> = futures::future::join_all(futures).await;

        let mut attachments = Vec::new();
        let mut warnings = Vec::new();
        for result in results {
            match result {
                Ok(attachment) => attachments.push(attachment),
                Err(warning) => {
                    warn!("{}", warning);
                    warnings.push(warning);
                }
            }
        }
        (attachments, warnings)
    }

    async fn load_one(&self, path: &Path) -> Result<Attachment, String> {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        let extension = path
            .extension()
            .map(|e| e.to_string_lossy().into_owned())
            .unwrap_or_default();

        if !self.extractor.supports(&extension) {
            return Err(format!("{}: unsupported file type, skipped", name));
        }

        let bytes = tokio::fs::read(path)
            .await
            .map_err(|e| format!("{}: could not read file ({})", name, e))?;
        let text = self
            .extractor
            .extract_text(&bytes, &extension)
            .map_err(|e| format!("{}: {}", name, e))?;

        debug!(file = %name, bytes = bytes.len(), "Attachment loaded");
        Ok(Attachment::new(name, text))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::attachment_extractor::ExtractError;
    use std::fs;

    /// Accepts `.txt` only and rejects empty files
    struct TxtOnly;

    impl AttachmentExtractor for TxtOnly {
        fn extract_text(&self, bytes: &[u8], _extension: &str) -> Result<String, ExtractError> {
            if bytes.is_empty() {
                return Err(ExtractError::Decode("empty file".to_string()));
            }
            Ok(String::from_utf8_lossy(bytes).into_owned())
        }

        fn supports(&self, extension: &str) -> bool {
            extension.eq_ignore_ascii_case("txt")
        }
    }

    #[tokio::test]
    async fn test_loads_supported_and_warns_for_the_rest() {
        let dir = tempfile::tempdir().unwrap();
        let notes = dir.path().join("notes.txt");
        let empty = dir.path().join("empty.TXT");
        let report = dir.path().join("report.pdf");
        fs::write(&notes, "alpha beta").unwrap();
        fs::write(&empty, "").unwrap();
        fs::write(&report, b"%PDF").unwrap();
        let missing = dir.path().join("missing.txt");

        let use_case = LoadAttachmentsUseCase::new(Arc::new(TxtOnly));
        let (attachments, warnings) = use_case
            .execute(&[notes, empty, report, missing])
            .await;

        assert_eq!(attachments, vec![Attachment::new("notes.txt", "alpha beta")]);
        assert_eq!(warnings.len(), 3);
        assert!(warnings[0].starts_with("empty.TXT: Could not decode file"));
        assert!(warnings[1].contains("report.pdf: unsupported"));
        assert!(warnings[2].contains("could not read file"));
    }

    #[tokio::test]
    async fn test_no_paths() {
        let use_case = LoadAttachmentsUseCase::new(Arc::new(TxtOnly));
        let (attachments, warnings) = use_case.execute(&[]).await;
        assert!(attachments.is_empty());
        assert!(warnings.is_empty());
    }
}
