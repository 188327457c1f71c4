//! Data models for fleet sampling.
//!
//! This module contains the core data structures shared by the store,
//! the sampling engine and the report generator.

use crate::nevra::Nevra;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;
use std::ops::{Add, AddAssign};

/// Opaque system identifier (the inventory id).
pub type SystemId = String;

/// How an advisory can be remediated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RemediationClass {
    /// An automated remediation playbook exists.
    PlaybookFixable,
    /// The fix requires manual intervention.
    ManualOnly,
    /// No fix is currently available.
    Unfixed,
}

/// A package string as listed in a profile.
///
/// Not every installed package is a NEVRA (`gpg-pubkey-<keyid>-<date>` has
/// no architecture), so the raw string is always kept and counted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Package {
    pub raw: String,
    pub nevra: Option<Nevra>,
}

impl Package {
    pub fn parse(raw: &str) -> Self {
        Self {
            raw: raw.to_string(),
            nevra: Nevra::parse(raw),
        }
    }

    /// Name used to tell packages apart; the raw string when it is not a NEVRA.
    pub fn name(&self) -> &str {
        match self.nevra {
            Some(ref nevra) => &nevra.name,
            None => &self.raw,
        }
    }
}

/// One CVE applicable to one system.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Advisory {
    /// CVE identifier, e.g. `CVE-2023-0286`.
    pub cve: String,
    /// Remediation classification.
    pub remediation: RemediationClass,
    /// Installed packages the CVE applies to.
    pub affected_packages: Vec<Package>,
}

/// Evaluated vulnerability profile of one host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SystemProfile {
    pub id: SystemId,
    /// Enabled repositories.
    pub repositories: Vec<String>,
    /// Installed packages.
    pub packages: Vec<Package>,
    /// Applicable advisories, already classified.
    pub advisories: Vec<Advisory>,
}

impl SystemProfile {
    /// Repositories belonging to the base OS channels.
    pub fn rhel_repositories(&self) -> Vec<String> {
        self.repositories
            .iter()
            .filter(|repo| repo.starts_with("rhel"))
            .cloned()
            .collect()
    }
}

/// The five reported metrics, in report order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Metric {
    PlaybookCves,
    ManualCves,
    UnfixedCves,
    UnfixedPackages,
    TotalPackages,
}

impl Metric {
    /// All metrics in fixed report order.
    pub const ALL: [Metric; 5] = [
        Metric::PlaybookCves,
        Metric::ManualCves,
        Metric::UnfixedCves,
        Metric::UnfixedPackages,
        Metric::TotalPackages,
    ];

    /// Label of the total line.
    pub fn total_label(&self) -> &'static str {
        match self {
            Metric::PlaybookCves => "total playbook cves",
            Metric::ManualCves => "total manual cves",
            Metric::UnfixedCves => "total unfixed cves",
            Metric::UnfixedPackages => "total unfixed packages",
            Metric::TotalPackages => "total packages",
        }
    }

    /// Label of the per-system average line.
    pub fn average_label(&self) -> &'static str {
        match self {
            Metric::PlaybookCves => "average playbook cves per system",
            Metric::ManualCves => "average manual cves per system",
            Metric::UnfixedCves => "average unfixed cves per system",
            Metric::UnfixedPackages => "average unfixed packages per system",
            Metric::TotalPackages => "average packages per system",
        }
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Metric::PlaybookCves => write!(f, "Playbook CVEs"),
            Metric::ManualCves => write!(f, "Manual CVEs"),
            Metric::UnfixedCves => write!(f, "Unfixed CVEs"),
            Metric::UnfixedPackages => write!(f, "Unfixed packages"),
            Metric::TotalPackages => write!(f, "Packages"),
        }
    }
}

/// Per-system contribution to the five metrics.
///
/// Also used for sample totals, since summing contributions is the whole
/// aggregation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SystemCounts {
    pub playbook_cves: u64,
    pub manual_cves: u64,
    pub unfixed_cves: u64,
    pub unfixed_packages: u64,
    pub total_packages: u64,
}

impl SystemCounts {
    /// Value of one metric.
    pub fn get(&self, metric: Metric) -> u64 {
        match metric {
            Metric::PlaybookCves => self.playbook_cves,
            Metric::ManualCves => self.manual_cves,
            Metric::UnfixedCves => self.unfixed_cves,
            Metric::UnfixedPackages => self.unfixed_packages,
            Metric::TotalPackages => self.total_packages,
        }
    }

    /// Number of classified advisories.
    #[allow(dead_code)]
    pub fn advisories(&self) -> u64 {
        self.playbook_cves + self.manual_cves + self.unfixed_cves
    }
}

impl Add for SystemCounts {
    type Output = SystemCounts;

    fn add(self, rhs: SystemCounts) -> SystemCounts {
        SystemCounts {
            playbook_cves: self.playbook_cves + rhs.playbook_cves,
            manual_cves: self.manual_cves + rhs.manual_cves,
            unfixed_cves: self.unfixed_cves + rhs.unfixed_cves,
            unfixed_packages: self.unfixed_packages + rhs.unfixed_packages,
            total_packages: self.total_packages + rhs.total_packages,
        }
    }
}

impl AddAssign for SystemCounts {
    fn add_assign(&mut self, rhs: SystemCounts) {
        *self = *self + rhs;
    }
}

/// Per-system averages of the five metrics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct MetricAverages {
    pub playbook_cves: f64,
    pub manual_cves: f64,
    pub unfixed_cves: f64,
    pub unfixed_packages: f64,
    pub total_packages: f64,
}

impl MetricAverages {
    pub fn get(&self, metric: Metric) -> f64 {
        match metric {
            Metric::PlaybookCves => self.playbook_cves,
            Metric::ManualCves => self.manual_cves,
            Metric::UnfixedCves => self.unfixed_cves,
            Metric::UnfixedPackages => self.unfixed_packages,
            Metric::TotalPackages => self.total_packages,
        }
    }
}

/// Aggregated statistics over one sample.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SampleResult {
    /// Number of systems the statistics were computed over.
    pub sample_size: u64,
    /// Metric totals.
    pub totals: SystemCounts,
    /// Metric totals divided by the sample size.
    pub averages: MetricAverages,
}

/// Distribution of one metric across the sampled systems.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricDistribution {
    pub metric: Metric,
    pub count: u64,
    pub mean: f64,
    /// Sample standard deviation; undefined for a single system.
    pub std: Option<f64>,
    pub min: u64,
    pub p25: f64,
    pub p50: f64,
    pub p75: f64,
    pub max: u64,
}

/// Per-system line of a sampling run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SystemReport {
    pub id: SystemId,
    /// Base OS repositories of the system.
    pub repositories: Vec<String>,
    pub counts: SystemCounts,
    /// Package name and number of unfixed CVEs affecting it, most affected first.
    pub unfixed_breakdown: Vec<(String, usize)>,
}

/// Metadata about a sampling run.
#[derive(Debug, Clone, Serialize)]
pub struct ReportMetadata {
    /// Path of the profile database.
    pub database: String,
    /// When the report was generated.
    pub generated_at: DateTime<Utc>,
    /// Number of evaluated systems in the store.
    pub population: u64,
    /// Sample size asked for.
    pub requested: u64,
    /// Sample size actually used (capped at the population).
    pub sampled: u64,
    /// Sampling strategy name.
    pub strategy: String,
    /// Seed used by the reservoir sampler, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
    /// Duration of the run in seconds.
    pub duration_seconds: f64,
}

/// The complete sampling report.
#[derive(Debug, Clone, Serialize)]
pub struct Report {
    pub metadata: ReportMetadata,
    pub result: SampleResult,
    /// Per-system lines, only when requested.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub systems: Vec<SystemReport>,
    /// Per-metric distributions, only when requested.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub distribution: Option<Vec<MetricDistribution>>,
}
