//! Parallel encoding of a whole binary
//!
//! A session hands compilation units to a pool of worker threads over a job
//! channel. Each worker builds one encoder per unit, writes
//! `cu-NNNN.stapsdt` into the output directory and reports back on an
//! outcome channel. All encoders share the session's registry.

use crossbeam_channel::unbounded;
use log::{debug, info, warn};
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::config::LoadConfig;
use crate::debug_info::{CompileUnit, SymbolTable};
use crate::domain::EncodeError;
use crate::encoder::{EncoderRegistry, ProbeEncoder};

/// What to do once a unit fails
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FailurePolicy {
    /// Stop handing out units; those already running still finish
    #[default]
    Abort,
    /// Record the failure and keep going
    Skip,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionOptions {
    /// Worker threads; never more than there are units
    pub jobs: usize,
    pub policy: FailurePolicy,
    /// Log encoder diagnostics at `Info` instead of `Debug`
    pub verbose: bool,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            jobs: std::thread::available_parallelism().map_or(1, NonZeroUsize::get),
            policy: FailurePolicy::default(),
            verbose: false,
        }
    }
}

/// A unit that was encoded successfully
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnitOutput {
    pub index: usize,
    pub unit: String,
    pub path: PathBuf,
    pub probes: usize,
}

#[derive(Debug)]
pub struct UnitFailure {
    pub index: usize,
    pub unit: String,
    pub error: EncodeError,
}

#[derive(Debug, Default)]
pub struct SessionReport {
    /// Units handed to the session
    pub units: usize,
    /// Records written across all successful units
    pub probes: usize,
    pub failures: Vec<UnitFailure>,
    pub outputs: Vec<UnitOutput>,
}

impl SessionReport {
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.failures.is_empty() && self.outputs.len() == self.units
    }

    /// Units never started because an earlier failure aborted the session
    #[must_use]
    pub fn skipped(&self) -> usize {
        self.units - self.outputs.len() - self.failures.len()
    }
}

/// Output file for the unit at `index`
#[must_use]
pub fn output_path(output_dir: &Path, index: usize) -> PathBuf {
    output_dir.join(format!("cu-{index:04}.stapsdt"))
}

type Outcome = (usize, Result<UnitOutput, EncodeError>);

pub struct EncodingSession {
    registry: Arc<EncoderRegistry>,
    conf: LoadConfig,
    options: SessionOptions,
}

impl EncodingSession {
    #[must_use]
    pub fn new(registry: Arc<EncoderRegistry>, conf: LoadConfig, options: SessionOptions) -> Self {
        Self { registry, conf, options }
    }

    /// Encode every unit into `output_dir`
    ///
    /// Failures are collected in the report, never returned: one unit
    /// failing does not affect the encoders of other units.
    pub fn run(
        &self,
        units: &[CompileUnit],
        output_dir: &Path,
        base_symbols: Option<&SymbolTable>,
    ) -> SessionReport {
        let mut report = SessionReport { units: units.len(), ..SessionReport::default() };
        if units.is_empty() {
            return report;
        }

        let jobs = self.options.jobs.clamp(1, units.len());
        info!("Encoding {} compilation units on {jobs} threads", units.len());

        let (job_tx, job_rx) = unbounded::<(usize, &CompileUnit)>();
        let (outcome_tx, outcome_rx) = unbounded::<Outcome>();
        for job in units.iter().enumerate() {
            // Receiver is still held here
            let _ = job_tx.send(job);
        }
        drop(job_tx);

        let stop = AtomicBool::new(false);
        std::thread::scope(|scope| {
            for worker in 0..jobs {
                let job_rx = job_rx.clone();
                let outcome_tx = outcome_tx.clone();
                let stop = &stop;
                scope.spawn(move || {
                    for (index, unit) in job_rx.iter() {
                        if stop.load(Ordering::Acquire) {
                            break;
                        }
                        debug!("worker {worker}: unit {index} ({})", unit.name());
                        let result = self.encode_unit(index, unit, output_dir, base_symbols);
                        if result.is_err() && self.options.policy == FailurePolicy::Abort {
                            stop.store(true, Ordering::Release);
                        }
                        if outcome_tx.send((index, result)).is_err() {
                            break;
                        }
                    }
                });
            }
        });
        drop(outcome_tx);

        let mut outcomes: Vec<Outcome> = outcome_rx.iter().collect();
        outcomes.sort_by_key(|(index, _)| *index);
        for (index, result) in outcomes {
            match result {
                Ok(output) => {
                    report.probes += output.probes;
                    report.outputs.push(output);
                }
                Err(error) => {
                    let unit = units[index].name().to_string();
                    warn!("Unit {index} ({unit}) failed: {error}");
                    report.failures.push(UnitFailure { index, unit, error });
                }
            }
        }

        self.registry.for_each(|leftover| {
            warn!("{} for {} still registered after the session", leftover.id, leftover.unit);
        });

        info!(
            "Session done: {} probes in {} files, {} failed, {} skipped",
            report.probes,
            report.outputs.len(),
            report.failures.len(),
            report.skipped()
        );
        report
    }

    fn encode_unit(
        &self,
        index: usize,
        unit: &CompileUnit,
        output_dir: &Path,
        base_symbols: Option<&SymbolTable>,
    ) -> Result<UnitOutput, EncodeError> {
        let path = output_path(output_dir, index);
        let mut encoder = ProbeEncoder::create(
            unit,
            &path,
            base_symbols,
            self.options.verbose,
            Arc::clone(&self.registry),
        )?;
        let probes = encoder.encode_cu(&self.conf)?;
        encoder.close()?;

        Ok(UnitOutput { index, unit: unit.name().to_string(), path, probes })
    }
}
