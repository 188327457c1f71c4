//! Stored profile document decoding.
//!
//! `profile_json` holds the evaluated profile of one system: its package
//! list plus the three CVE lists returned by the vulnerability evaluation.

use crate::error::{Result, SampleError};
use crate::models::{Advisory, Package, RemediationClass, SystemProfile};
use serde::Deserialize;

/// Raw shape of `profile_json`.
#[derive(Debug, Deserialize)]
pub struct ProfileDocument {
    pub package_list: Vec<String>,
    #[serde(default)]
    pub repository_list: Vec<String>,
    /// CVEs fixable with a remediation playbook.
    pub cve_list: Vec<CveEntry>,
    pub manually_fixable_cve_list: Vec<CveEntry>,
    pub unpatched_cve_list: Vec<CveEntry>,
}

#[derive(Debug, Deserialize)]
pub struct CveEntry {
    pub cve: String,
    #[serde(default)]
    pub affected_packages: Vec<String>,
}

/// Decode a stored document into a [`SystemProfile`].
pub fn decode_profile(system: &str, raw: &str) -> Result<SystemProfile> {
    if raw.trim().is_empty() {
        return Err(SampleError::malformed(system, "profile has not been evaluated"));
    }

    let document: ProfileDocument =
        serde_json::from_str(raw).map_err(|e| SampleError::malformed(system, e.to_string()))?;

    document.into_profile(system)
}

impl ProfileDocument {
    /// Convert into the domain profile.
    ///
    /// Package strings that are not NEVRAs are kept as they are.
    pub fn into_profile(self, system: &str) -> Result<SystemProfile> {
        let packages = self.package_list.iter().map(|raw| Package::parse(raw)).collect();

        let classified = [
            (RemediationClass::PlaybookFixable, self.cve_list),
            (RemediationClass::ManualOnly, self.manually_fixable_cve_list),
            (RemediationClass::Unfixed, self.unpatched_cve_list),
        ];

        let mut advisories = Vec::new();
        for (remediation, entries) in classified {
            for entry in entries {
                if entry.cve.trim().is_empty() {
                    return Err(SampleError::malformed(system, "advisory with empty CVE id"));
                }
                let affected_packages = entry
                    .affected_packages
                    .iter()
                    .map(|raw| Package::parse(raw))
                    .collect();
                advisories.push(Advisory {
                    cve: entry.cve,
                    remediation,
                    affected_packages,
                });
            }
        }

        Ok(SystemProfile {
            id: system.to_string(),
            repositories: self.repository_list,
            packages,
            advisories,
        })
    }
}
