//! Per-session generation state.
//!
//! A [`GenerationSession`] belongs to a single caller (one upload, one
//! user). It holds the staged export path and tracks whether a generation
//! run is idle, running, done or failed. Nothing here is shared between
//! sessions.

use crate::aggregate::HourlyAggregate;
use crate::config::ExtractionConfig;
use crate::error::{HealthError, Result};
use crate::extractor::{CategoryExtractor, CategoryTable};
use crate::models::Category;
use crate::range::DateRange;
use crate::report::CollectionReport;
use crate::store::RecordStore;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{info, warn};

/// One category's data for a date range
#[derive(Debug, Clone)]
pub struct CategoryView {
    pub table: CategoryTable,
    /// Present for the hourly categories
    pub hourly: Option<HourlyAggregate>,
}

/// Lifecycle of a generation run
#[derive(Debug)]
pub enum GenerationState {
    Idle,
    Running,
    Done(CollectionReport<CategoryView>),
    Failed(String),
}

impl GenerationState {
    pub fn is_running(&self) -> bool {
        matches!(self, GenerationState::Running)
    }

    pub fn label(&self) -> &'static str {
        match self {
            GenerationState::Idle => "idle",
            GenerationState::Running => "running",
            GenerationState::Done(_) => "done",
            GenerationState::Failed(_) => "failed",
        }
    }
}

/// Generation state scoped to one caller
#[derive(Debug)]
pub struct GenerationSession {
    source: Option<PathBuf>,
    config: ExtractionConfig,
    state: GenerationState,
}

impl GenerationSession {
    pub fn new(config: ExtractionConfig) -> Self {
        Self {
            source: None,
            config,
            state: GenerationState::Idle,
        }
    }

    /// Stage the export file used by the next run
    pub fn stage_source(&mut self, path: impl Into<PathBuf>) {
        self.source = Some(path.into());
    }

    pub fn source(&self) -> Option<&Path> {
        self.source.as_deref()
    }

    pub fn state(&self) -> &GenerationState {
        &self.state
    }

    /// Move to `Running`; refused while a run is already in progress
    pub fn begin(&mut self) -> Result<()> {
        if self.state.is_running() {
            return Err(HealthError::GenerationInProgress);
        }
        self.state = GenerationState::Running;
        Ok(())
    }

    /// Record the outcome of the current run
    pub fn finish(&mut self, outcome: Result<CollectionReport<CategoryView>>) {
        self.state = match outcome {
            Ok(report) => GenerationState::Done(report),
            Err(e) => {
                warn!("Generation failed: {}", e);
                GenerationState::Failed(e.to_string())
            }
        };
    }

    /// Run a full generation over the staged export
    ///
    /// Every category is extracted and filtered to `range`. Categories left
    /// empty by the filter are reported as failed; hourly categories also
    /// get their hour-by-date aggregate.
    pub fn generate(&mut self, range: &DateRange) -> Result<&GenerationState> {
        let source = self.source.clone().ok_or(HealthError::NoSourceStaged)?;
        self.begin()?;

        let start = Instant::now();
        info!("Generating category views for {} over {}", source.display(), range);

        let outcome = run_generation(&source, &self.config, range);
        self.finish(outcome);

        info!(
            "Generation {} in {}ms",
            self.state.label(),
            start.elapsed().as_millis()
        );

        Ok(&self.state)
    }
}

fn run_generation(
    source: &Path,
    config: &ExtractionConfig,
    range: &DateRange,
) -> Result<CollectionReport<CategoryView>> {
    let store = RecordStore::open_with_tag(source, &config.record_tag)?;
    let extractor = CategoryExtractor::new(config.clone());

    CollectionReport::collect(&Category::ALL, |category| {
        let table = extractor.extract(&store, category)?.filter_range(range);
        if table.is_empty() {
            return Err(HealthError::EmptyCategory {
                category: category.to_string(),
            });
        }

        let hourly = if category.is_hourly() {
            Some(HourlyAggregate::from_table(&table)?)
        } else {
            None
        };

        Ok(CategoryView { table, hourly })
    })
}
