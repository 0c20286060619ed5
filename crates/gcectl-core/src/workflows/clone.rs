//! Snapshot -> clone pipeline
//!
//! Snapshots a source instance's boot disk once, then creates `count`
//! instances whose boot disks initialize from that snapshot, timing each
//! creation from submission to `DONE`.

use futures::{StreamExt, TryStreamExt, stream};
use std::path::Path;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::compute::spec::{DEFAULT_MACHINE_TYPE, validate_resource_name};
use crate::compute::{BootSource, ComputeApi, InstanceSpec, Snapshot};
use crate::error::{CoreError, Result};
use crate::progress::WaitOptions;
use crate::report::TimingReport;

use super::existence::instance_exists;
use super::instance::create_instance_and_wait;
use super::snapshot::{SnapshotOutcome, default_snapshot_name, ensure_snapshot};

pub const DEFAULT_CLONE_COUNT: u32 = 3;

/// What to clone and how
#[derive(Debug, Clone)]
pub struct ClonePlan {
    pub source_instance: String,
    pub zone: String,
    pub snapshot_name: String,
    /// Highest clone index; clones are numbered `start_index..=count`
    pub count: u32,
    pub start_index: u32,
    pub machine_type: String,
    pub tags: Vec<String>,
    pub startup_script: Option<String>,
    /// Clones in flight at once; 1 creates them strictly one after another
    pub concurrency: usize,
}

impl ClonePlan {
    pub fn new(source_instance: impl Into<String>, zone: impl Into<String>) -> Self {
        let source_instance = source_instance.into();
        Self {
            snapshot_name: default_snapshot_name(&source_instance),
            source_instance,
            zone: zone.into(),
            count: DEFAULT_CLONE_COUNT,
            start_index: 1,
            machine_type: DEFAULT_MACHINE_TYPE.to_string(),
            tags: Vec::new(),
            startup_script: None,
            concurrency: 1,
        }
    }

    pub fn snapshot_name(mut self, name: impl Into<String>) -> Self {
        self.snapshot_name = name.into();
        self
    }

    pub fn count(mut self, count: u32) -> Self {
        self.count = count;
        self
    }

    pub fn start_index(mut self, start_index: u32) -> Self {
        self.start_index = start_index;
        self
    }

    pub fn machine_type(mut self, machine_type: impl Into<String>) -> Self {
        self.machine_type = machine_type.into();
        self
    }

    pub fn tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags.extend(tags.into_iter().map(Into::into));
        self
    }

    pub fn startup_script(mut self, script: impl Into<String>) -> Self {
        self.startup_script = Some(script.into());
        self
    }

    pub fn concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency;
        self
    }

    pub fn clone_name(&self, index: u32) -> String {
        format!("clone-{}-{}", index, self.source_instance)
    }

    /// Index encoded in a name produced by [`clone_name`](Self::clone_name)
    pub fn clone_index(&self, name: &str) -> Option<u32> {
        name.strip_prefix("clone-")?
            .strip_suffix(self.source_instance.as_str())?
            .strip_suffix('-')?
            .parse()
            .ok()
    }

    pub fn clone_names(&self) -> Vec<String> {
        (self.start_index..=self.count)
            .map(|i| self.clone_name(i))
            .collect()
    }

    pub fn validate(&self) -> Result<()> {
        if self.count == 0 {
            return Err(CoreError::Configuration(
                "clone count must be at least 1".to_string(),
            ));
        }
        if self.start_index == 0 || self.start_index > self.count {
            return Err(CoreError::Configuration(format!(
                "start index {} is outside 1..={}",
                self.start_index, self.count
            )));
        }
        if self.concurrency == 0 {
            return Err(CoreError::Configuration(
                "concurrency must be at least 1".to_string(),
            ));
        }
        validate_resource_name(&self.snapshot_name)?;
        for name in self.clone_names() {
            validate_resource_name(&name)?;
        }
        Ok(())
    }

    fn clone_spec(&self, name: String, snapshot_link: &str) -> InstanceSpec {
        let spec = InstanceSpec::new(name, BootSource::Snapshot(snapshot_link.to_string()))
            .machine_type(self.machine_type.clone())
            .tags(self.tags.iter().cloned());
        match &self.startup_script {
            Some(script) => spec.startup_script(script.clone()),
            None => spec,
        }
    }
}

/// Outcome of a pipeline run
#[derive(Debug, Clone)]
pub struct CloneRun {
    pub snapshot: SnapshotOutcome,
    /// Clones created by this run, in submission order
    pub report: TimingReport,
    /// Clones that already existed and were left alone
    pub skipped: Vec<String>,
}

impl CloneRun {
    /// `true` when this run covered only part of the plan's clones
    pub fn is_partial(&self, plan: &ClonePlan) -> bool {
        plan.start_index > 1 || !self.skipped.is_empty()
    }
}

/// Write the run's timings to `path`, returning whether the file was written
///
/// A run that created nothing leaves the file alone. A partial run (resumed
/// with `start_index > 1`, or with clones skipped) merges its rows into the
/// existing table by name; rows are kept in clone index order.
pub fn write_timing_report(plan: &ClonePlan, run: &CloneRun, path: &Path) -> Result<bool> {
    if run.report.is_empty() {
        info!("No clones created, leaving {} unchanged", path.display());
        return Ok(false);
    }
    if !run.is_partial(plan) {
        run.report.write_to(path)?;
        return Ok(true);
    }

    let mut merged = match std::fs::read_to_string(path) {
        Ok(existing) => TimingReport::parse_markdown(&existing),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => TimingReport::new(),
        Err(e) => return Err(e.into()),
    };
    debug!(
        "Merging {} new row(s) into {} existing row(s) of {}",
        run.report.len(),
        merged.len(),
        path.display()
    );
    merged.merge(&run.report);
    // rows of other sources sort after this plan's clones
    merged.sort_by_key(|row| plan.clone_index(&row.name).map_or((1, 0), |i| (0, i)));
    merged.write_to(path)?;
    Ok(true)
}

/// Reference used as `sourceSnapshot` for every clone
fn snapshot_link(project: &str, snapshot: &Snapshot) -> String {
    snapshot
        .self_link
        .clone()
        .unwrap_or_else(|| format!("projects/{}/global/snapshots/{}", project, snapshot.name))
}

/// Create one clone unless it already exists; `None` means skipped
async fn create_clone(
    api: &dyn ComputeApi,
    plan: &ClonePlan,
    name: String,
    snapshot_link: &str,
    options: &WaitOptions,
) -> Result<Option<Duration>> {
    if instance_exists(api, &plan.zone, &name).await? {
        warn!("Instance {} already exists, skipping", name);
        return Ok(None);
    }

    let spec = plan.clone_spec(name.clone(), snapshot_link);
    let provisioned = create_instance_and_wait(api, &plan.zone, &spec, options).await?;
    info!(
        "Created {} in {:.2}s",
        name,
        provisioned.duration.as_secs_f64()
    );
    Ok(Some(provisioned.duration))
}

/// Snapshot the source once, then create the clones
///
/// The snapshot is created (or reused) and confirmed `READY` before any clone
/// is submitted. In sequential mode the first failing clone stops the run and
/// its error is returned unchanged; nothing after it is submitted. With
/// `concurrency > 1` up to that many clones are in flight at once, results
/// stay in submission order, and the first failure in that order aborts the
/// clones still waiting.
pub async fn run_clone_pipeline(
    api: &dyn ComputeApi,
    plan: &ClonePlan,
    options: &WaitOptions,
) -> Result<CloneRun> {
    plan.validate()?;

    let snapshot = ensure_snapshot(
        api,
        &plan.zone,
        &plan.source_instance,
        &plan.snapshot_name,
        options,
    )
    .await?;
    let link = snapshot_link(api.project(), &snapshot.snapshot);
    let link = link.as_str();
    let names = plan.clone_names();

    let results: Vec<Option<Duration>> = if plan.concurrency <= 1 {
        let mut results = Vec::with_capacity(names.len());
        for name in &names {
            results.push(create_clone(api, plan, name.clone(), link, options).await?);
        }
        results
    } else {
        stream::iter(names.clone())
            .map(move |name| create_clone(api, plan, name, link, options))
            .buffered(plan.concurrency)
            .try_collect()
            .await?
    };

    let mut report = TimingReport::new();
    let mut skipped = Vec::new();
    for (name, result) in names.into_iter().zip(results) {
        match result {
            Some(duration) => report.push(name, duration),
            None => skipped.push(name),
        }
    }

    Ok(CloneRun {
        snapshot,
        report,
        skipped,
    })
}
