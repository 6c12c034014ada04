use anyhow::{anyhow, Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use log::{debug, error, info, warn};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::app_config::Config;
use crate::file_utils::FileManager;
use crate::glossary::Glossary;
use crate::language_utils;
use crate::phase::{DetectorConfig, PhaseDetector};
use crate::subtitle_processor::{CaptionRecord, SrtCodec};
use crate::translation::{
    assemble, BatchBackend, BatchPlanner, PlannerConfig, TranslationOrchestrator, TranslationResult,
    TranslationService,
};

// @module: Application controller for caption translation

/// Totals for one `run`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    // @field: Output files written
    pub outputs: Vec<PathBuf>,
    // @field: Records flagged for review across all files
    pub flagged: usize,
}

/// Main application controller for caption translation
pub struct Controller {
    // @field: App configuration
    config: Config,
    // @field: Batch translation backend
    backend: Arc<dyn BatchBackend>,
    // @field: Provider-backed service, when the backend is one
    service: Option<Arc<TranslationService>>,
}

impl Controller {
    // @method: Create a controller that talks to the configured provider
    pub fn with_config(config: Config) -> Result<Self> {
        let service = Arc::new(TranslationService::new(&config).context("Failed to create translation service")?);
        Ok(Self {
            config,
            backend: service.clone(),
            service: Some(service),
        })
    }

    // @method: Create a controller around any batch backend
    pub fn with_backend(config: Config, backend: Arc<dyn BatchBackend>) -> Self {
        Self {
            config,
            backend,
            service: None,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Test the provider connection; backends without a provider always pass
    pub async fn test_connection(&self) -> Result<()> {
        match &self.service {
            Some(service) => service.test_connection().await,
            None => Ok(()),
        }
    }

    /// Detect, plan, translate and assemble one caption sequence
    pub async fn translate_records(&self, records: &[CaptionRecord], glossary: &Glossary) -> Result<TranslationResult> {
        let detector = PhaseDetector::new(DetectorConfig::try_from(&self.config.phase_detection)?);
        let detection = detector.detect(records);
        debug!(
            "Phase boundary at position {} ({:?}), {} flagged",
            detection.boundary,
            detection.decided_by,
            detection.flagged.len()
        );

        let planner = BatchPlanner::new(PlannerConfig::try_from(&self.config.batching)?);
        let batches = planner.plan(records, detection.boundary);
        let glossary_text = glossary.render();

        let progress_bar = ProgressBar::new(batches.len() as u64);
        let style = ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} batches ({percent}%) {msg} {eta}")
            .or_else(|_| ProgressStyle::default_bar().template("{spinner} [{elapsed_precise}] [{bar:40}] {pos}/{len} ({percent}%) {msg}"))
            .unwrap_or_else(|_| ProgressStyle::default_bar());
        progress_bar.set_style(style.progress_chars("█▓▒░"));
        progress_bar.set_message("Translating");

        let orchestrator = TranslationOrchestrator::new(self.backend.clone(), self.config.orchestrator_options());
        let map = orchestrator
            .run(&batches, &glossary_text, |done, _total| progress_bar.set_position(done as u64))
            .await;
        progress_bar.finish_and_clear();
        let map = map?;

        Ok(assemble(records, &map, detection))
    }

    /// Translate one SRT file and write the result to `output`
    pub async fn translate_file(&self, input: &Path, output: &Path, glossary: &Glossary) -> Result<TranslationResult> {
        let records = SrtCodec::read_file(input)?;
        info!("Parsed {} subtitles from {}", records.len(), input.display());

        let result = self
            .translate_records(&records, glossary)
            .await
            .with_context(|| format!("Failed to translate {}", input.display()))?;

        SrtCodec::write_file(&result.subtitles, output)?;
        info!("Written to: {}", output.display());
        Ok(result)
    }

    /// Translate a file or every `.srt` file in a directory
    pub async fn run(
        &self,
        input: &Path,
        output: Option<&Path>,
        glossary_path: Option<&Path>,
        review_log: Option<&Path>,
    ) -> Result<RunSummary> {
        let start_time = Instant::now();

        let glossary = match glossary_path {
            Some(path) if !FileManager::file_exists(path) => {
                return Err(anyhow!("Glossary file not found: {}", path.display()));
            }
            Some(path) => {
                let glossary = Glossary::from_file(path)?;
                info!("Loaded {} glossary entries from {}", glossary.len(), path.display());
                glossary
            }
            None => Glossary::default(),
        };

        let inputs = Self::collect_inputs(input)?;
        let multiple = inputs.len() > 1;
        if multiple && output.map(Self::is_srt_path).unwrap_or(false) {
            warn!("Output is a single .srt file but {} inputs were found; each result overwrites it", inputs.len());
        }

        let mut summary = RunSummary::default();
        let mut failures = 0;
        let mut review_log_started = false;

        for input_file in &inputs {
            let name = Self::file_name(input_file);
            info!("Processing: {}", name);

            let output_path = self.output_path_for(input_file, output)?;
            let result = match self.translate_file(input_file, &output_path, &glossary).await {
                Ok(result) => result,
                Err(e) if multiple => {
                    error!("Failed to process {}: {:#}", name, e);
                    failures += 1;
                    continue;
                }
                Err(e) => return Err(e),
            };

            summary.flagged += result.flagged.len();
            summary.outputs.push(output_path);

            if let Some(log_path) = review_log {
                if multiple {
                    let section = format!("\n--- {} ---\n{}\n", name, result.review_log());
                    if review_log_started {
                        FileManager::append_to_file(log_path, &section)?;
                    } else {
                        FileManager::write_to_file(log_path, &section)?;
                        review_log_started = true;
                    }
                } else {
                    FileManager::write_to_file(log_path, &result.review_log())?;
                    info!("Review log written to: {}", log_path.display());
                }
            }
        }

        if summary.flagged > 0 && review_log.is_none() {
            warn!("{} subtitle(s) had ambiguous phase context.", summary.flagged);
            info!("Re-run with --review-log <path> to save details for review.");
        }

        if let Some(service) = &self.service {
            info!("{}", service.token_usage().summary());
        }

        info!(
            "Processed {} file(s) in {}",
            summary.outputs.len(),
            Self::format_duration(start_time.elapsed())
        );

        if failures > 0 {
            return Err(anyhow!("{} of {} file(s) failed to translate", failures, inputs.len()));
        }
        Ok(summary)
    }

    /// Output path for one input.
    ///
    /// Without `output` the result lands next to the input as `<stem>_<target>.srt`;
    /// an `output` ending in `.srt` is used as-is; anything else is a directory.
    pub fn output_path_for(&self, input: &Path, output: Option<&Path>) -> Result<PathBuf> {
        let suffix = format!("_{}", self.target_code());

        match output {
            None => {
                let parent = input.parent().unwrap_or_else(|| Path::new(""));
                Ok(FileManager::generate_output_path(input, parent, &suffix, "srt"))
            }
            Some(path) if Self::is_srt_path(path) => Ok(path.to_path_buf()),
            Some(dir) => {
                FileManager::ensure_dir(dir)?;
                Ok(FileManager::generate_output_path(input, dir, &suffix, "srt"))
            }
        }
    }

    /// Short code for output names, `en` rather than `eng`
    pub fn target_code(&self) -> String {
        language_utils::normalize_to_part1_or_part2t(&self.config.target_language)
            .unwrap_or_else(|_| self.config.target_language.to_lowercase())
    }

    fn collect_inputs(input: &Path) -> Result<Vec<PathBuf>> {
        if FileManager::dir_exists(input) {
            let files = FileManager::find_files(input, "srt")?;
            if files.is_empty() {
                return Err(anyhow!("No .srt files found in {}", input.display()));
            }
            Ok(files)
        } else if FileManager::file_exists(input) {
            Ok(vec![input.to_path_buf()])
        } else {
            Err(anyhow!("Input not found: {}", input.display()))
        }
    }

    fn is_srt_path(path: &Path) -> bool {
        path.extension()
            .map(|ext| ext.to_string_lossy().eq_ignore_ascii_case("srt"))
            .unwrap_or(false)
    }

    fn file_name(path: &Path) -> String {
        path.file_name()
            .map(|name| name.to_string_lossy().to_string())
            .unwrap_or_else(|| path.display().to_string())
    }

    fn format_duration(duration: Duration) -> String {
        let total_seconds = duration.as_secs();
        let hours = total_seconds / 3600;
        let minutes = (total_seconds % 3600) / 60;
        let seconds = total_seconds % 60;

        if hours > 0 {
            format!("{}h {}m {}s", hours, minutes, seconds)
        } else if minutes > 0 {
            format!("{}m {}s", minutes, seconds)
        } else {
            format!("{}.{:03}s", seconds, duration.subsec_millis())
        }
    }
}
