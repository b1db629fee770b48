//! Audit frontmatter for agent results
//!
//! Every result file starts with a block recording which prompt produced
//! which output:
//!
//! ```text
//! ---
//! feature: login
//! agent: 01-architect
//! prompt_spec_version: 1.0.0
//! generated_at: 2025-01-01T12:00:00.000000Z
//! prompt_hash: <sha256 hex>
//! output_hash: <sha256 hex>
//! conversation_id: login-01-architect
//! ---
//! ```

use std::collections::BTreeMap;
use std::sync::LazyLock;

use chrono::{DateTime, Utc};
use regex::Regex;

static FRONTMATTER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)^---\s*\n(.*?)\n---\s*\n").expect("Invalid frontmatter regex")
});

/// SHA-256 hex digest of `content`.
pub fn compute_hash(content: &str) -> String {
    weft_fs::checksum::sha256_hex(content)
}

/// Hash of a model output as recorded in `output_hash`.
///
/// Surrounding whitespace is ignored so the hash survives re-reading the file.
pub fn hash_output(output: &str) -> String {
    compute_hash(output.trim())
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuditRecord {
    pub feature: String,
    pub agent: String,
    pub prompt_spec_version: String,
    pub generated_at: DateTime<Utc>,
    pub prompt_hash: String,
    pub output_hash: String,
    pub conversation_id: Option<String>,
}

impl AuditRecord {
    pub fn to_frontmatter(&self) -> String {
        let mut out = format!(
            "---\nfeature: {}\nagent: {}\nprompt_spec_version: {}\ngenerated_at: {}\nprompt_hash: {}\noutput_hash: {}\n",
            self.feature,
            self.agent,
            self.prompt_spec_version,
            format_timestamp(&self.generated_at),
            self.prompt_hash,
            self.output_hash,
        );
        if let Some(id) = &self.conversation_id {
            out.push_str(&format!("conversation_id: {id}\n"));
        }
        out.push_str("---\n");
        out
    }
}

/// ISO-8601 UTC with microseconds and a `Z` suffix.
pub fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.format("%Y-%m-%dT%H:%M:%S%.6fZ").to_string()
}

/// Key/value pairs of a leading `---` block, if present.
pub fn parse_audit_frontmatter(content: &str) -> Option<BTreeMap<String, String>> {
    let caps = FRONTMATTER.captures(content)?;
    let body = caps.get(1)?.as_str();
    let fields = body
        .lines()
        .filter_map(|line| line.split_once(':'))
        .map(|(k, v)| (k.trim().to_string(), v.trim().to_string()))
        .filter(|(k, _)| !k.is_empty())
        .collect();
    Some(fields)
}

/// Raw frontmatter block and trimmed body, split on whole `---` lines.
pub fn split_frontmatter(content: &str) -> Option<(&str, &str)> {
    let caps = FRONTMATTER.captures(content)?;
    let end = caps.get(0)?.end();
    Some((caps.get(1)?.as_str(), content[end..].trim()))
}

/// Content after the frontmatter block, trimmed.
pub fn strip_frontmatter(content: &str) -> &str {
    match FRONTMATTER.find(content) {
        Some(m) => content[m.end()..].trim(),
        None => content.trim(),
    }
}

/// True if the body of `content` hashes to `expected`.
pub fn verify_audit_hash(content: &str, expected: &str) -> bool {
    hash_output(strip_frontmatter(content)) == expected
}

/// True if the body matches the `output_hash` recorded in its own frontmatter.
pub fn verify_result_file(content: &str) -> bool {
    parse_audit_frontmatter(content)
        .and_then(|fields| fields.get("output_hash").cloned())
        .is_some_and(|hash| verify_audit_hash(content, &hash))
}
