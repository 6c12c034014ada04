/*!
 * Remote folder workflow.
 *
 * Captions are dropped into `<remote>:<folder>/input`, pulled into a local
 * working directory with rclone, translated, and pushed back to
 * `<remote>:<folder>/output` together with their review logs. A marker file in
 * `<work>/.processed` records every file that translated successfully, so each
 * run only picks up new captions.
 */

use anyhow::{anyhow, Context, Result};
use log::{error, info, warn};
use std::path::{Path, PathBuf};
use tokio::process::Command as TokioCommand;

use crate::app_config::DriveConfig;
use crate::app_controller::Controller;
use crate::file_utils::FileManager;
use crate::glossary::Glossary;

const MARKER_DIR: &str = ".processed";
const MARKER_EXTENSION: &str = "done";

/// Flags for one drive run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DriveOptions {
    /// List what would happen without translating or syncing up
    pub dry_run: bool,
    /// Work only with files already in the local input folder
    pub skip_sync: bool,
    /// Translate this one input file again, processed or not
    pub reprocess: Option<String>,
    /// Glossary used for every file
    pub glossary: Option<PathBuf>,
}

/// What a drive run did
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DriveReport {
    /// Files selected for translation
    pub selected: Vec<PathBuf>,
    /// Files translated and marked done
    pub translated: Vec<PathBuf>,
    /// Files that failed and will be retried next run
    pub failed: Vec<PathBuf>,
}

/// Local working directory layout and remote paths
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DriveLayout {
    remote: String,
    folder: String,
    work_dir: PathBuf,
}

impl DriveLayout {
    pub fn new(remote: impl Into<String>, folder: impl Into<String>, work_dir: impl Into<PathBuf>) -> Self {
        Self {
            remote: remote.into(),
            folder: folder.into(),
            work_dir: work_dir.into(),
        }
    }

    pub fn from_config(config: &DriveConfig) -> Self {
        Self::new(&config.remote, &config.folder, &config.work_dir)
    }

    pub fn input_dir(&self) -> PathBuf {
        self.work_dir.join("input")
    }

    pub fn output_dir(&self) -> PathBuf {
        self.work_dir.join("output")
    }

    pub fn marker_dir(&self) -> PathBuf {
        self.work_dir.join(MARKER_DIR)
    }

    /// `<work>/.processed/<name>.done`
    pub fn marker_path(&self, input: &Path) -> PathBuf {
        let name = input.file_name().map(|n| n.to_string_lossy().to_string()).unwrap_or_default();
        self.marker_dir().join(format!("{}.{}", name, MARKER_EXTENSION))
    }

    /// `<work>/output/<stem>_review.log`
    pub fn review_log_path(&self, input: &Path) -> PathBuf {
        FileManager::generate_output_path(input, self.output_dir(), "_review", "log")
    }

    pub fn remote_input(&self) -> String {
        format!("{}:{}/input", self.remote, self.folder)
    }

    pub fn remote_output(&self) -> String {
        format!("{}:{}/output", self.remote, self.folder)
    }
}

/// Runs the sync, translate, sync-back cycle
pub struct DriveSync {
    layout: DriveLayout,
    rclone: String,
}

impl DriveSync {
    pub fn new(layout: DriveLayout) -> Self {
        Self {
            layout,
            rclone: "rclone".to_string(),
        }
    }

    /// Use another rclone executable
    pub fn with_rclone(mut self, program: impl Into<String>) -> Self {
        self.rclone = program.into();
        self
    }

    pub fn layout(&self) -> &DriveLayout {
        &self.layout
    }

    /// Input captions without a processed marker, sorted by name
    pub fn pending_files(&self) -> Result<Vec<PathBuf>> {
        let input_dir = self.layout.input_dir();
        if !FileManager::dir_exists(&input_dir) {
            return Ok(Vec::new());
        }

        Ok(FileManager::find_files(&input_dir, "srt")?
            .into_iter()
            .filter(|file| !FileManager::file_exists(self.layout.marker_path(file)))
            .collect())
    }

    /// Files for this run: the reprocess target, or every pending file
    pub fn select_files(&self, reprocess: Option<&str>) -> Result<Vec<PathBuf>> {
        let Some(name) = reprocess else {
            return self.pending_files();
        };

        let target = self.layout.input_dir().join(name);
        if !FileManager::file_exists(&target) {
            return Err(anyhow!("File not found: {}", target.display()));
        }

        let marker = self.layout.marker_path(&target);
        if FileManager::file_exists(&marker) {
            std::fs::remove_file(&marker)
                .with_context(|| format!("Failed to remove marker: {}", marker.display()))?;
        }
        Ok(vec![target])
    }

    /// Record a successful translation
    pub fn mark_done(&self, input: &Path) -> Result<()> {
        let name = input.file_name().map(|n| n.to_string_lossy().to_string()).unwrap_or_default();
        FileManager::write_to_file(self.layout.marker_path(input), &format!("Processed: {}\n", name))
    }

    /// Pull new captions from the remote input folder
    pub async fn sync_down(&self) -> Result<()> {
        let input_dir = self.layout.input_dir();
        FileManager::ensure_dir(&input_dir)?;
        let remote = self.layout.remote_input();
        info!("Syncing from Drive: {} -> {}", remote, input_dir.display());

        self.rclone_copy(&remote, &input_dir.to_string_lossy(), Some("*.srt")).await
    }

    /// Push translations and review logs to the remote output folder
    pub async fn sync_up(&self) -> Result<()> {
        let output_dir = self.layout.output_dir();
        let remote = self.layout.remote_output();
        info!("Syncing to Drive: {} -> {}", output_dir.display(), remote);

        self.rclone_copy(&output_dir.to_string_lossy(), &remote, None).await
    }

    async fn rclone_copy(&self, from: &str, to: &str, include: Option<&str>) -> Result<()> {
        let mut command = TokioCommand::new(&self.rclone);
        command.args(["copy", from, to]);
        if let Some(pattern) = include {
            command.args(["--include", pattern]);
        }
        command.arg("--verbose");

        let status = match command.status().await {
            Ok(status) => status,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(anyhow!(
                    "{} not found. Install it or use --skip-sync to work with files already in {}",
                    self.rclone,
                    self.layout.input_dir().display()
                ));
            }
            Err(e) => return Err(e).with_context(|| format!("Failed to run {}", self.rclone)),
        };

        if !status.success() {
            return Err(anyhow!("{} copy {} -> {} failed with {}", self.rclone, from, to, status));
        }
        Ok(())
    }

    /// Run one cycle.
    ///
    /// `controller` may be `None` only for a dry run.
    pub async fn run(&self, options: &DriveOptions, controller: Option<&Controller>) -> Result<DriveReport> {
        if !options.skip_sync {
            self.sync_down().await.context("Error syncing from Drive")?;
        }

        FileManager::ensure_dir(self.layout.marker_dir())?;
        let files = self.select_files(options.reprocess.as_deref())?;
        let mut report = DriveReport {
            selected: files.clone(),
            ..DriveReport::default()
        };

        if files.is_empty() {
            info!("No new .srt files to process.");
            return Ok(report);
        }

        info!("Found {} file(s) to translate:", files.len());
        for file in &files {
            info!("  - {}", file.display());
        }

        if options.dry_run {
            for file in &files {
                let output = FileManager::generate_output_path(file, self.layout.output_dir(), "_en", "srt");
                info!(
                    "[DRY RUN] Would translate {} -> {} (review log {})",
                    file.display(),
                    output.display(),
                    self.layout.review_log_path(file).display()
                );
            }
            info!("[DRY RUN] No files were translated.");
            return Ok(report);
        }

        let controller = controller.ok_or_else(|| anyhow!("A translation controller is required unless --dry-run is set"))?;
        let glossary = match &options.glossary {
            Some(path) if FileManager::file_exists(path) => Glossary::from_file(path)?,
            Some(path) => {
                warn!("Glossary not found, translating without it: {}", path.display());
                Glossary::default()
            }
            None => Glossary::default(),
        };

        let output_dir = self.layout.output_dir();
        FileManager::ensure_dir(&output_dir)?;

        for file in files {
            match self.translate_one(controller, &file, &output_dir, &glossary).await {
                Ok(()) => {
                    info!("Finished: {}", file.display());
                    report.translated.push(file);
                }
                Err(e) => {
                    error!("Error translating {}: {:#}", file.display(), e);
                    warn!("File will be retried on next run.");
                    report.failed.push(file);
                }
            }
        }

        if options.skip_sync {
            info!("Results available in: {}", output_dir.display());
        } else if let Err(e) = self.sync_up().await {
            warn!("Failed to sync results to Drive: {:#}", e);
            warn!("Results are available locally in: {}", output_dir.display());
        } else {
            info!("Results synced back to Google Drive.");
        }

        Ok(report)
    }

    async fn translate_one(&self, controller: &Controller, file: &Path, output_dir: &Path, glossary: &Glossary) -> Result<()> {
        let output = controller.output_path_for(file, Some(output_dir))?;
        let review_log = self.layout.review_log_path(file);
        info!("Translating: {}", file.display());
        info!("  Output:     {}", output.display());
        info!("  Review log: {}", review_log.display());

        let result = controller.translate_file(file, &output, glossary).await?;
        FileManager::write_to_file(&review_log, &result.review_log())?;
        self.mark_done(file)
    }
}
