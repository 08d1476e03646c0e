//! The transient uploads directory that generated documents pass through.
//!
//! Every document gets a unique name, is handed out as a [`TransientReport`] and is
//! removed when that handle is dropped. Files left behind (crashes, aborted transfers)
//! are reclaimed by [`UploadsDir::sweep`].

use super::domain::ReportFormat;
use chrono::Local;
use serde::Serialize;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};
use tracing::{debug, warn};

/// Default age after which a leftover file is swept.
pub const DEFAULT_RETENTION: Duration = Duration::from_secs(24 * 60 * 60);

#[derive(Debug, Clone)]
pub struct UploadsDir {
    root: PathBuf,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CleanupSummary {
    pub removed: usize,
    pub retained: usize,
    pub failed: usize,
}

impl UploadsDir {
    /// Creates the directory when missing. Safe to call repeatedly.
    pub fn init(root: impl Into<PathBuf>) -> io::Result<Self> {
        let root = root.into();
        fs::create_dir_all(&root)?;
        Ok(Self { root })
    }

    pub fn path(&self) -> &Path {
        &self.root
    }

    /// Path for a new document; nothing is created on disk.
    pub fn allocate(&self, kind: &str, label: &str, format: ReportFormat) -> PathBuf {
        self.root.join(unique_file_name(kind, label, format))
    }

    pub fn sweep(&self, max_age: Duration) -> io::Result<CleanupSummary> {
        self.sweep_at(max_age, SystemTime::now())
    }

    pub fn sweep_at(&self, max_age: Duration, now: SystemTime) -> io::Result<CleanupSummary> {
        let mut summary = CleanupSummary::default();

        // Renders and downloads share the directory, so entries may vanish mid-scan.
        for entry in fs::read_dir(&self.root)? {
            let stat = entry.and_then(|entry| entry.metadata().map(|metadata| (entry, metadata)));
            let (entry, metadata) = match stat {
                Ok(found) => found,
                Err(err) if err.kind() == io::ErrorKind::NotFound => continue,
                Err(err) => {
                    warn!(root = %self.root.display(), error = %err, "uploads entry could not be inspected");
                    summary.failed += 1;
                    continue;
                }
            };
            if !metadata.is_file() {
                continue;
            }

            let age = metadata
                .modified()
                .ok()
                .and_then(|modified| now.duration_since(modified).ok())
                .unwrap_or_default();
            if age <= max_age {
                summary.retained += 1;
                continue;
            }

            match fs::remove_file(entry.path()) {
                Ok(()) => {
                    debug!(path = %entry.path().display(), "expired report removed");
                    summary.removed += 1;
                }
                Err(err) if err.kind() == io::ErrorKind::NotFound => {}
                Err(err) => {
                    warn!(path = %entry.path().display(), error = %err, "expired report could not be removed");
                    summary.failed += 1;
                }
            }
        }

        Ok(summary)
    }
}

/// `<kind>_<label>_<yyyymmddHHMMSSmmm>_<suffix>.<ext>`
pub fn unique_file_name(kind: &str, label: &str, format: ReportFormat) -> String {
    let stamp = Local::now().format("%Y%m%d%H%M%S%3f");
    let suffix = uuid::Uuid::new_v4().simple().to_string();
    format!(
        "{}_{}_{}_{}.{}",
        sanitize(kind),
        sanitize(label),
        stamp,
        &suffix[..8],
        format.extension()
    )
}

/// ASCII letters, digits and single underscores only.
pub fn sanitize(label: &str) -> String {
    let mut output = String::with_capacity(label.len());
    for c in label.chars() {
        let mapped = match c {
            'à' | 'â' | 'ä' | 'á' => 'a',
            'À' | 'Â' | 'Ä' | 'Á' => 'A',
            'é' | 'è' | 'ê' | 'ë' => 'e',
            'É' | 'È' | 'Ê' | 'Ë' => 'E',
            'î' | 'ï' => 'i',
            'Î' | 'Ï' => 'I',
            'ô' | 'ö' => 'o',
            'Ô' | 'Ö' => 'O',
            'ù' | 'û' | 'ü' => 'u',
            'Ù' | 'Û' | 'Ü' => 'U',
            'ç' => 'c',
            'Ç' => 'C',
            c if c.is_ascii_alphanumeric() => c,
            _ => '_',
        };
        if mapped == '_' && (output.is_empty() || output.ends_with('_')) {
            continue;
        }
        output.push(mapped);
    }

    while output.ends_with('_') {
        output.pop();
    }

    if output.is_empty() {
        output.push_str("rapport");
    }
    output
}

/// A generated document that is deleted when this handle goes away.
#[derive(Debug)]
pub struct TransientReport {
    path: PathBuf,
    file_name: String,
    format: ReportFormat,
    armed: bool,
}

impl TransientReport {
    pub(crate) fn new(path: PathBuf, format: ReportFormat) -> Self {
        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| format!("rapport.{}", format.extension()));
        Self {
            path,
            file_name,
            format,
            armed: true,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    pub fn format(&self) -> ReportFormat {
        self.format
    }

    pub fn content_type(&self) -> &'static str {
        self.format.content_type()
    }

    /// Reads the document and deletes it, whether or not the read succeeded.
    pub async fn into_bytes(self) -> io::Result<Vec<u8>> {
        tokio::fs::read(&self.path).await
    }

    /// Moves the document out of the uploads directory; the handle no longer owns it.
    pub fn persist(mut self, destination: &Path) -> io::Result<PathBuf> {
        if fs::rename(&self.path, destination).is_err() {
            fs::copy(&self.path, destination)?;
            return Ok(destination.to_path_buf());
        }
        self.armed = false;
        Ok(destination.to_path_buf())
    }
}

impl Drop for TransientReport {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        match fs::remove_file(&self.path) {
            Ok(()) => debug!(path = %self.path.display(), "transient report deleted"),
            Err(err) if err.kind() == io::ErrorKind::NotFound => {}
            Err(err) => {
                warn!(path = %self.path.display(), error = %err, "transient report could not be deleted")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn init_is_idempotent() {
        let temp = tempfile::tempdir().expect("tempdir");
        let nested = temp.path().join("uploads").join("reports");
        UploadsDir::init(&nested).expect("first init");
        let uploads = UploadsDir::init(&nested).expect("second init");
        assert!(uploads.path().is_dir());
    }

    #[test]
    fn file_names_embed_kind_label_and_extension() {
        let name = unique_file_name("activities", "Deuxième trimestre 2025", ReportFormat::Pdf);
        assert!(name.starts_with("activities_Deuxieme_trimestre_2025_"));
        assert!(name.ends_with(".pdf"));
        let other = unique_file_name("activities", "Deuxième trimestre 2025", ReportFormat::Pdf);
        assert_ne!(name, other);
    }

    #[test]
    fn sanitize_collapses_separators() {
        assert_eq!(sanitize("Du 01/01/2025 au 31/01/2025"), "Du_01_01_2025_au_31_01_2025");
        assert_eq!(sanitize("  ///  "), "rapport");
    }

    #[test]
    fn sweep_removes_only_expired_files() {
        let temp = tempfile::tempdir().expect("tempdir");
        let uploads = UploadsDir::init(temp.path()).expect("init");
        let old = temp.path().join("old.pdf");
        let fresh = temp.path().join("fresh.docx");
        fs::write(&old, b"old").expect("write old");
        fs::write(&fresh, b"fresh").expect("write fresh");
        fs::create_dir(temp.path().join("nested")).expect("nested dir");

        let two_days_ago = SystemTime::now() - Duration::from_secs(48 * 3600);
        fs::File::options()
            .write(true)
            .open(&old)
            .expect("open old")
            .set_modified(two_days_ago)
            .expect("backdate");

        let summary = uploads.sweep(DEFAULT_RETENTION).expect("sweep runs");
        assert_eq!(
            summary,
            CleanupSummary {
                removed: 1,
                retained: 1,
                failed: 0
            }
        );
        assert!(!old.exists());
        assert!(fresh.exists());
    }

    #[test]
    fn sweep_tolerates_files_deleted_during_the_scan() {
        use std::sync::atomic::{AtomicBool, Ordering};
        use std::sync::Arc;

        let temp = tempfile::tempdir().expect("tempdir");
        let uploads = UploadsDir::init(temp.path()).expect("init");
        let done = Arc::new(AtomicBool::new(false));

        let churn = {
            let root = temp.path().to_path_buf();
            let done = Arc::clone(&done);
            std::thread::spawn(move || {
                let mut i = 0usize;
                while !done.load(Ordering::Relaxed) {
                    let path = root.join(format!("r{}.pdf", i % 64));
                    let _ = fs::write(&path, b"%PDF");
                    let _ = fs::remove_file(&path);
                    i += 1;
                }
            })
        };

        let mut failures = 0;
        for _ in 0..5_000 {
            match uploads.sweep(DEFAULT_RETENTION) {
                Ok(summary) => failures += summary.failed,
                Err(_) => failures += 1,
            }
        }
        done.store(true, Ordering::Relaxed);
        churn.join().expect("churn thread finishes");

        assert_eq!(failures, 0);
    }

    #[tokio::test]
    async fn transient_report_is_deleted_after_read() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = temp.path().join("report.pdf");
        fs::write(&path, b"%PDF-1.5").expect("write");

        let report = TransientReport::new(path.clone(), ReportFormat::Pdf);
        assert_eq!(report.file_name(), "report.pdf");
        let bytes = report.into_bytes().await.expect("read");
        assert_eq!(bytes, b"%PDF-1.5");
        assert!(!path.exists());
    }

    #[test]
    fn transient_report_is_deleted_on_drop() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = temp.path().join("report.docx");
        fs::write(&path, b"PK").expect("write");
        drop(TransientReport::new(path.clone(), ReportFormat::Docx));
        assert!(!path.exists());
    }

    #[test]
    fn persist_moves_the_file_out() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = temp.path().join("report.pdf");
        let destination = temp.path().join("kept.pdf");
        fs::write(&path, b"%PDF").expect("write");

        let kept = TransientReport::new(path.clone(), ReportFormat::Pdf)
            .persist(&destination)
            .expect("persist");
        assert_eq!(kept, destination);
        assert!(destination.exists());
        assert!(!path.exists());
    }
}
