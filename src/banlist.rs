use std::collections::BTreeSet;

use anyhow::{Context, Result};
use regex::Regex;

/// Field names from the pre-unified scenario format.
const LEGACY_FIELDS: &str =
    r"\b(suspicionIncrease|resistanceIncrease|trustScore|nextMessageId|messageId)\b";

const BANNED_PATTERNS: &[&str] = &[
    r"manipulationIntensity",
    r"isFromScammer",
    r"phase:",
    r"tactics:\s*\[",
];

/// Flags scenario documents that still carry legacy-format fields. Runs on
/// raw text so it also catches fields serde would silently ignore.
pub struct LegacyBanlist {
    legacy_fields: Regex,
    banned: Vec<Regex>,
}

impl LegacyBanlist {
    pub fn new() -> Result<Self> {
        let legacy_fields = Regex::new(LEGACY_FIELDS).context("invalid legacy field pattern")?;
        let banned = BANNED_PATTERNS
            .iter()
            .map(|p| Regex::new(p).with_context(|| format!("invalid banned pattern {p}")))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self {
            legacy_fields,
            banned,
        })
    }

    /// One message per offence; empty when the document is clean.
    pub fn check(&self, content: &str) -> Vec<String> {
        let mut errors = Vec::new();

        let legacy: BTreeSet<&str> = self
            .legacy_fields
            .find_iter(content)
            .map(|m| m.as_str())
            .collect();
        if !legacy.is_empty() {
            errors.push(format!(
                "Legacy fields found: {}",
                legacy.into_iter().collect::<Vec<_>>().join(", ")
            ));
        }

        for pattern in &self.banned {
            if let Some(m) = pattern.find(content) {
                errors.push(format!("Banned pattern found: {}", m.as_str()));
            }
        }

        errors
    }
}
