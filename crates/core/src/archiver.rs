use std::sync::Arc;
use std::time::Instant;

use anyhow::Result;
use serde::Serialize;
use tracing::{debug, warn};

use crate::backend::local::LocalBackend;
use crate::backend::{Backend, EntryKind};
use crate::build::BuildCommand;
use crate::path::{self, DirPath};

pub const PDF_MIME: &str = "application/pdf";

const PDF_DIR: &str = "pdf";
const DEFAULT_BUILD_FILE: &str = "Makefile";

/// Walks the local tree, runs the build step in every trigger directory,
/// and ships the resulting PDFs to the remote backend.
pub struct Archiver {
    local: Arc<LocalBackend>,
    remote: Arc<dyn Backend>,
    build: BuildCommand,
    build_file: String,
}

/// Counters for a single run. Derived fresh each time; nothing is persisted
/// between runs.
#[derive(Debug, Default, Clone, Serialize)]
pub struct RunReport {
    pub directories_visited: u64,
    pub trigger_directories: u64,
    pub files_uploaded: u64,
    pub bytes_uploaded: u64,
    pub failed_builds: u64,
    pub duration_secs: f64,
}

impl Archiver {
    pub fn new(local: Arc<LocalBackend>, remote: Arc<dyn Backend>) -> Self {
        Self {
            local,
            remote,
            build: BuildCommand::default(),
            build_file: DEFAULT_BUILD_FILE.to_string(),
        }
    }

    pub fn with_build(mut self, build: BuildCommand) -> Self {
        self.build = build;
        self
    }

    pub fn with_build_file(mut self, name: impl Into<String>) -> Self {
        self.build_file = name.into();
        self
    }

    /// Process the whole tree from the backend root.
    pub async fn run(&self) -> Result<RunReport> {
        self.run_from(DirPath::Root).await
    }

    /// Process `start` and every directory below it, depth-first pre-order:
    /// a trigger directory's build and transfer run before its children are
    /// visited, and siblings follow the backend listing order. Every
    /// directory is recursed into whether or not it triggered.
    pub async fn run_from(&self, start: DirPath) -> Result<RunReport> {
        let started = Instant::now();
        let mut report = RunReport::default();
        let mut pending = vec![start];

        while let Some(dir) = pending.pop() {
            report.directories_visited += 1;

            if self.should_process(&dir).await? {
                report.trigger_directories += 1;
                println!("Processing directory {dir}");

                let workdir = self.local.resolve(dir.as_prefix());
                let outcome = self.build.run_in(&workdir).await;
                if !outcome.succeeded() {
                    report.failed_builds += 1;
                    warn!(
                        directory = %dir,
                        exit_code = ?outcome.exit_code,
                        "build step failed, continuing"
                    );
                }

                let (files, bytes) = self.move_pdfs_to_remote(&dir.child(PDF_DIR)).await?;
                report.files_uploaded += files;
                report.bytes_uploaded += bytes;
            }

            // Children are pushed in reverse so the stack pops them in
            // listing order.
            let mut subdirs = self.subdirectories(&dir).await?;
            subdirs.reverse();
            pending.append(&mut subdirs);
        }

        report.duration_secs = started.elapsed().as_secs_f64();
        Ok(report)
    }

    /// The directories a run would trigger on, in visit order, without any
    /// side effects.
    pub async fn scan(&self) -> Result<Vec<DirPath>> {
        self.scan_from(DirPath::Root).await
    }

    pub async fn scan_from(&self, start: DirPath) -> Result<Vec<DirPath>> {
        let mut triggers = Vec::new();
        let mut pending = vec![start];

        while let Some(dir) = pending.pop() {
            if self.should_process(&dir).await? {
                triggers.push(dir.clone());
            }
            let mut subdirs = self.subdirectories(&dir).await?;
            subdirs.reverse();
            pending.append(&mut subdirs);
        }

        Ok(triggers)
    }

    /// True when `dir` holds both the build file and a `pdf` entry directly
    /// beneath it.
    async fn should_process(&self, dir: &DirPath) -> Result<bool> {
        Ok(self.local.exists(&dir.child(&self.build_file)).await?
            && self.local.exists(&dir.child(PDF_DIR)).await?)
    }

    async fn subdirectories(&self, dir: &DirPath) -> Result<Vec<DirPath>> {
        let entries = self.local.list(dir.as_prefix(), false).await?;
        Ok(entries
            .into_iter()
            .filter(|e| e.kind == EntryKind::Dir)
            .map(|e| DirPath::Rel(e.path))
            .collect())
    }

    /// Copy every PDF directly inside `pdf_dir` to the remote backend under
    /// its normalized path. Only entries whose mime type is exactly
    /// `application/pdf` transfer; entries without a mime type are skipped.
    /// Nested folders inside `pdf_dir` are not descended into.
    async fn move_pdfs_to_remote(&self, pdf_dir: &str) -> Result<(u64, u64)> {
        let mut files = 0u64;
        let mut bytes = 0u64;

        for entry in self.local.list(pdf_dir, true).await? {
            if entry.kind != EntryKind::File {
                continue;
            }
            if entry.mime_type.as_deref() != Some(PDF_MIME) {
                continue;
            }
            let data = self.local.read(&entry.path).await?;
            let dest = path::normalize_remote_path(&entry.path);
            debug!(source = %entry.path, dest = %dest, size = data.len(), "uploading");
            self.remote.write(&dest, &data).await?;
            files += 1;
            bytes += data.len() as u64;
        }

        Ok((files, bytes))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::path::Path;
    use tempfile::TempDir;

    fn touch(root: &Path, rel: &str, contents: &[u8]) {
        let full = root.join(rel);
        fs::create_dir_all(full.parent().unwrap()).unwrap();
        fs::write(full, contents).unwrap();
    }

    fn archiver(local: &TempDir, remote: &TempDir) -> (Archiver, Arc<LocalBackend>) {
        let remote_backend = Arc::new(LocalBackend::new(remote.path()).unwrap());
        let archiver = Archiver::new(
            Arc::new(LocalBackend::new(local.path()).unwrap()),
            remote_backend.clone(),
        )
        .with_build(BuildCommand::new("true"));
        (archiver, remote_backend)
    }

    #[tokio::test]
    async fn trigger_needs_both_build_file_and_pdf_folder() {
        let local = tempfile::tempdir().unwrap();
        let remote = tempfile::tempdir().unwrap();
        touch(local.path(), "only-makefile/Makefile", b"all:");
        touch(local.path(), "only-pdf/pdf/x.pdf", b"%PDF");
        touch(local.path(), "both/Makefile", b"all:");
        touch(local.path(), "both/pdf/x.pdf", b"%PDF");

        let (archiver, _) = archiver(&local, &remote);
        assert!(!archiver.should_process(&DirPath::parse("only-makefile")).await.unwrap());
        assert!(!archiver.should_process(&DirPath::parse("only-pdf")).await.unwrap());
        assert!(archiver.should_process(&DirPath::parse("both")).await.unwrap());

        let triggers = archiver.scan().await.unwrap();
        assert_eq!(triggers, vec![DirPath::parse("both")]);
    }

    #[tokio::test]
    async fn root_can_be_a_trigger_directory() {
        let local = tempfile::tempdir().unwrap();
        let remote = tempfile::tempdir().unwrap();
        touch(local.path(), "Makefile", b"all:");
        touch(local.path(), "pdf/x.pdf", b"%PDF root");
        touch(local.path(), "pdf/y.txt", b"plain");

        let (archiver, remote_backend) = archiver(&local, &remote);
        let report = archiver.run().await.unwrap();

        assert_eq!(report.trigger_directories, 1);
        assert_eq!(report.files_uploaded, 1);
        assert_eq!(
            remote_backend.read("x.pdf").await.unwrap(),
            b"%PDF root"
        );
        assert!(!remote_backend.exists("y.txt").await.unwrap());
    }

    #[tokio::test]
    async fn only_pdf_mime_transfers() {
        let local = tempfile::tempdir().unwrap();
        let remote = tempfile::tempdir().unwrap();
        touch(local.path(), "docs/Makefile", b"all:");
        touch(local.path(), "docs/pdf/report.pdf", b"%PDF report");
        touch(local.path(), "docs/pdf/notes.txt", b"plain");
        touch(local.path(), "docs/pdf/data.bin", b"\x00\x01");
        // No extension means no mime type, which counts as not a PDF.
        touch(local.path(), "docs/pdf/README", b"readme");

        let (archiver, remote_backend) = archiver(&local, &remote);
        let report = archiver.run().await.unwrap();

        assert_eq!(report.files_uploaded, 1);
        assert_eq!(report.bytes_uploaded, b"%PDF report".len() as u64);
        assert!(remote_backend.exists("docs/report.pdf").await.unwrap());
        assert!(!remote_backend.exists("docs/notes.txt").await.unwrap());
        assert!(!remote_backend.exists("docs/data.bin").await.unwrap());
        assert!(!remote_backend.exists("docs/README").await.unwrap());
    }

    #[tokio::test]
    async fn remote_paths_lose_the_pdf_segment() {
        let local = tempfile::tempdir().unwrap();
        let remote = tempfile::tempdir().unwrap();
        touch(local.path(), "a/b/Makefile", b"all:");
        touch(local.path(), "a/b/pdf/report.pdf", b"%PDF");

        let (archiver, remote_backend) = archiver(&local, &remote);
        archiver.run().await.unwrap();

        assert!(remote_backend.exists("a/b/report.pdf").await.unwrap());
        assert!(!remote_backend.exists("a/b/pdf/report.pdf").await.unwrap());
    }

    #[tokio::test]
    async fn traversal_visits_every_directory() {
        let local = tempfile::tempdir().unwrap();
        let remote = tempfile::tempdir().unwrap();
        // A trigger at the top must not stop recursion below it.
        touch(local.path(), "Makefile", b"all:");
        touch(local.path(), "pdf/top.pdf", b"%PDF top");
        touch(local.path(), "nested/inner/Makefile", b"all:");
        touch(local.path(), "nested/inner/pdf/deep.pdf", b"%PDF deep");
        fs::create_dir_all(local.path().join("empty/leaf")).unwrap();

        let (archiver, remote_backend) = archiver(&local, &remote);
        let report = archiver.run().await.unwrap();

        // Root, pdf, nested, nested/inner, nested/inner/pdf, empty,
        // empty/leaf.
        assert_eq!(report.directories_visited, 7);
        assert_eq!(report.trigger_directories, 2);
        assert!(remote_backend.exists("top.pdf").await.unwrap());
        assert!(remote_backend.exists("nested/inner/deep.pdf").await.unwrap());
    }

    #[tokio::test]
    async fn folders_nested_inside_pdf_are_not_transferred() {
        let local = tempfile::tempdir().unwrap();
        let remote = tempfile::tempdir().unwrap();
        touch(local.path(), "Makefile", b"all:");
        touch(local.path(), "pdf/top.pdf", b"%PDF");
        touch(local.path(), "pdf/sub/hidden.pdf", b"%PDF hidden");

        let (archiver, remote_backend) = archiver(&local, &remote);
        let report = archiver.run().await.unwrap();

        assert_eq!(report.files_uploaded, 1);
        assert!(remote_backend.exists("top.pdf").await.unwrap());
        assert!(!remote_backend.exists("sub/hidden.pdf").await.unwrap());
        assert!(!remote_backend.exists("hidden.pdf").await.unwrap());
    }

    #[tokio::test]
    async fn tree_without_build_files_has_no_side_effects() {
        let local = tempfile::tempdir().unwrap();
        let remote = tempfile::tempdir().unwrap();
        touch(local.path(), "a/pdf/x.pdf", b"%PDF");
        touch(local.path(), "b/c/notes.txt", b"plain");

        let (archiver, remote_backend) = archiver(&local, &remote);
        let report = archiver.run().await.unwrap();

        assert_eq!(report.trigger_directories, 0);
        assert_eq!(report.files_uploaded, 0);
        // Traversal still covered the whole tree: a, a/pdf, b, b/c, root.
        assert_eq!(report.directories_visited, 5);
        assert!(remote_backend.list("", false).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn second_run_overwrites_without_error() {
        let local = tempfile::tempdir().unwrap();
        let remote = tempfile::tempdir().unwrap();
        touch(local.path(), "Makefile", b"all:");
        touch(local.path(), "pdf/x.pdf", b"%PDF");

        let (archiver, remote_backend) = archiver(&local, &remote);
        let first = archiver.run().await.unwrap();
        let second = archiver.run().await.unwrap();

        assert_eq!(first.files_uploaded, 1);
        assert_eq!(second.files_uploaded, 1);
        assert_eq!(remote_backend.read("x.pdf").await.unwrap(), b"%PDF");
    }

    #[tokio::test]
    async fn failed_build_does_not_stop_the_transfer() {
        let local = tempfile::tempdir().unwrap();
        let remote = tempfile::tempdir().unwrap();
        touch(local.path(), "Makefile", b"all:");
        touch(local.path(), "pdf/x.pdf", b"%PDF");

        let remote_backend = Arc::new(LocalBackend::new(remote.path()).unwrap());
        let archiver = Archiver::new(
            Arc::new(LocalBackend::new(local.path()).unwrap()),
            remote_backend.clone(),
        )
        .with_build(BuildCommand::new("false"));

        let report = archiver.run_from(DirPath::Root).await.unwrap();
        assert_eq!(report.failed_builds, 1);
        assert_eq!(report.files_uploaded, 1);
        assert!(remote_backend.exists("x.pdf").await.unwrap());
    }

    #[tokio::test]
    async fn custom_build_file_name_is_honored() {
        let local = tempfile::tempdir().unwrap();
        let remote = tempfile::tempdir().unwrap();
        touch(local.path(), "site/Justfile", b"build:");
        touch(local.path(), "site/pdf/x.pdf", b"%PDF");

        let (archiver, _) = archiver(&local, &remote);
        assert!(archiver.scan().await.unwrap().is_empty());

        let archiver = archiver.with_build_file("Justfile");
        assert_eq!(archiver.scan().await.unwrap(), vec![DirPath::parse("site")]);
    }

    #[tokio::test]
    async fn run_from_limits_the_subtree() {
        let local = tempfile::tempdir().unwrap();
        let remote = tempfile::tempdir().unwrap();
        touch(local.path(), "a/Makefile", b"all:");
        touch(local.path(), "a/pdf/in.pdf", b"%PDF in");
        touch(local.path(), "b/Makefile", b"all:");
        touch(local.path(), "b/pdf/out.pdf", b"%PDF out");

        let (archiver, remote_backend) = archiver(&local, &remote);
        let report = archiver.run_from(DirPath::parse("a")).await.unwrap();

        assert_eq!(report.trigger_directories, 1);
        assert!(remote_backend.exists("a/in.pdf").await.unwrap());
        assert!(!remote_backend.exists("b/out.pdf").await.unwrap());
    }
}
