use std::sync::LazyLock;

use regex::Regex;

use super::models::{CodeArtifact, CodePatch, PatchAction};

static CODE_BLOCK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)```(\w+)[ \t]+path=(\S+)(?:[ \t]+action=(\w+))?[ \t]*\n(.*?)```")
        .expect("Invalid code block regex")
});

static CODE_BLOCK_HEADER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"```\w+[ \t]+path=").expect("Invalid code block header regex"));

/// True if `output` contains at least one annotated code fence.
pub fn has_code_patches(output: &str) -> bool {
    CODE_BLOCK_HEADER.is_match(output)
}

/// Extract every annotated code fence from `output`, in order.
///
/// A missing action means create; an unknown one is logged and treated as
/// create. Trailing newlines in the body are dropped.
pub fn extract_code_blocks(output: &str) -> CodeArtifact {
    let patches: Vec<CodePatch> = CODE_BLOCK
        .captures_iter(output)
        .map(|caps| {
            let language = caps[1].to_string();
            let file_path = caps[2].to_string();
            let action = match caps.get(3) {
                None => PatchAction::Create,
                Some(raw) => raw.as_str().parse().unwrap_or_else(|_| {
                    tracing::warn!(path = %file_path, action = raw.as_str(), "Unknown patch action, using create");
                    PatchAction::Create
                }),
            };
            CodePatch {
                content: caps[4].trim_end_matches('\n').to_string(),
                file_path,
                language,
                action,
            }
        })
        .collect();

    let summary = (!patches.is_empty()).then(|| {
        format!(
            "{} file(s): {}",
            patches.len(),
            patches
                .iter()
                .map(|p| format!("{} ({})", p.file_path, p.action))
                .collect::<Vec<_>>()
                .join(", ")
        )
    });

    CodeArtifact {
        patches,
        summary,
        metadata: Default::default(),
    }
}
