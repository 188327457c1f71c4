//! RPM package identity parsing.
//!
//! Package strings in profiles use the `name-[epoch:]version-release.arch`
//! form, with the epoch allowed either before the name (`1:openssl-3.0.7-6.el9.x86_64`)
//! or after the first dash (`openssl-1:3.0.7-6.el9.x86_64`), never both.

use regex::Regex;
use std::fmt;
use std::sync::OnceLock;

fn nevra_regex() -> &'static Regex {
    static NEVRA_RE: OnceLock<Regex> = OnceLock::new();
    NEVRA_RE.get_or_init(|| {
        Regex::new(
            r"^(?:(?P<e1>[0-9]+):)?(?P<name>[^:]+)-(?:(?P<e2>[0-9]+):)?(?P<ver>[^-:]+)-(?P<rel>[^-:]+)\.(?P<arch>[a-z0-9_]+)",
        )
        .expect("NEVRA pattern is valid")
    })
}

/// Parsed RPM package identity.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Nevra {
    pub name: String,
    pub epoch: Option<String>,
    pub version: String,
    pub release: String,
    pub arch: String,
}

impl Nevra {
    /// Parse a package string, tolerating a trailing `.rpm`.
    ///
    /// Returns `None` when the string is not a NEVRA.
    pub fn parse(raw: &str) -> Option<Self> {
        let filename = raw.strip_suffix(".rpm").unwrap_or(raw);
        let caps = nevra_regex().captures(filename)?;

        let leading = caps.name("e1").map(|m| m.as_str().to_string());
        let inner = caps.name("e2").map(|m| m.as_str().to_string());
        if leading.is_some() && inner.is_some() {
            return None;
        }

        Some(Self {
            name: caps["name"].to_string(),
            epoch: leading.or(inner),
            version: caps["ver"].to_string(),
            release: caps["rel"].to_string(),
            arch: caps["arch"].to_string(),
        })
    }
}

impl fmt::Display for Nevra {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.epoch {
            Some(ref epoch) => write!(
                f,
                "{}-{}:{}-{}.{}",
                self.name, epoch, self.version, self.release, self.arch
            ),
            None => write!(
                f,
                "{}-{}-{}.{}",
                self.name, self.version, self.release, self.arch
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_without_epoch() {
        let nevra = Nevra::parse("kernel-5.14.0-70.13.1.el9_0.x86_64").unwrap();
        assert_eq!(nevra.name, "kernel");
        assert_eq!(nevra.epoch, None);
        assert_eq!(nevra.version, "5.14.0");
        assert_eq!(nevra.release, "70.13.1.el9_0");
        assert_eq!(nevra.arch, "x86_64");
    }

    #[test]
    fn test_parse_inner_epoch() {
        let nevra = Nevra::parse("openssl-1:3.0.7-6.el9_2.x86_64").unwrap();
        assert_eq!(nevra.name, "openssl");
        assert_eq!(nevra.epoch.as_deref(), Some("1"));
        assert_eq!(nevra.version, "3.0.7");
        assert_eq!(nevra.release, "6.el9_2");
    }

    #[test]
    fn test_parse_leading_epoch_and_rpm_suffix() {
        let nevra = Nevra::parse("2:vim-enhanced-8.2.2637-20.el9_1.x86_64.rpm").unwrap();
        assert_eq!(nevra.name, "vim-enhanced");
        assert_eq!(nevra.epoch.as_deref(), Some("2"));
        assert_eq!(nevra.version, "8.2.2637");
        assert_eq!(nevra.arch, "x86_64");
    }

    #[test]
    fn test_parse_noarch_and_dashed_name() {
        let nevra = Nevra::parse("python3-dnf-plugins-core-4.3.0-5.el9_2.noarch").unwrap();
        assert_eq!(nevra.name, "python3-dnf-plugins-core");
        assert_eq!(nevra.arch, "noarch");
    }

    #[test]
    fn test_parse_source_package() {
        let nevra = Nevra::parse("bash-5.1.8-6.el9_1.src.rpm").unwrap();
        assert_eq!(nevra.name, "bash");
        assert_eq!(nevra.release, "6.el9_1");
        assert_eq!(nevra.arch, "src");
    }

    #[test]
    fn test_parse_rejects_gpg_pubkey() {
        assert!(Nevra::parse("gpg-pubkey-fd431d51-4ae0493b").is_none());
    }

    #[test]
    fn test_parse_rejects_garbage_and_double_epoch() {
        assert!(Nevra::parse("not a package").is_none());
        assert!(Nevra::parse("").is_none());
        assert!(Nevra::parse("1:bash-2:5.1.8-6.el9.x86_64").is_none());
    }

    #[test]
    fn test_display() {
        let raw = "openssl-1:3.0.7-6.el9_2.x86_64";
        assert_eq!(Nevra::parse(raw).unwrap().to_string(), raw);
        let raw = "bash-5.1.8-6.el9_1.x86_64";
        assert_eq!(Nevra::parse(raw).unwrap().to_string(), raw);
    }
}
