//! Per-system classification of advisories.

use crate::error::{Result, SampleError};
use crate::models::{RemediationClass, SystemCounts, SystemProfile};
use std::collections::{HashMap, HashSet};

/// Compute one system's contribution to the five metrics.
///
/// Each CVE may appear in exactly one remediation class; a CVE listed twice
/// makes the whole profile malformed. Unfixed packages are counted by
/// distinct package name, or by the raw string for non-NEVRA packages.
pub fn classify(profile: &SystemProfile) -> Result<SystemCounts> {
    let mut counts = SystemCounts {
        total_packages: profile.packages.len() as u64,
        ..SystemCounts::default()
    };
    let mut seen_cves: HashSet<&str> = HashSet::new();
    let mut unfixed_packages: HashSet<&str> = HashSet::new();

    for advisory in &profile.advisories {
        if !seen_cves.insert(advisory.cve.as_str()) {
            return Err(SampleError::malformed(
                &profile.id,
                format!("{} is listed more than once", advisory.cve),
            ));
        }

        match advisory.remediation {
            RemediationClass::PlaybookFixable => counts.playbook_cves += 1,
            RemediationClass::ManualOnly => counts.manual_cves += 1,
            RemediationClass::Unfixed => {
                counts.unfixed_cves += 1;
                for package in &advisory.affected_packages {
                    unfixed_packages.insert(package.name());
                }
            }
        }
    }

    counts.unfixed_packages = unfixed_packages.len() as u64;
    Ok(counts)
}

/// Number of unfixed CVEs per affected package name, most affected first.
pub fn unfixed_breakdown(profile: &SystemProfile) -> Vec<(String, usize)> {
    let mut per_package: HashMap<&str, usize> = HashMap::new();

    for advisory in profile
        .advisories
        .iter()
        .filter(|a| a.remediation == RemediationClass::Unfixed)
    {
        for package in &advisory.affected_packages {
            *per_package.entry(package.name()).or_default() += 1;
        }
    }

    let mut breakdown: Vec<(String, usize)> = per_package
        .into_iter()
        .map(|(name, count)| (name.to_string(), count))
        .collect();
    breakdown.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    breakdown
}
