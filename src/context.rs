//! Prompt-context shaping and vendor-output cleanup shared by every backend.

use std::collections::HashMap;

/// File type assumed when the request metadata carries none.
pub const DEFAULT_FILE_TYPE: &str = "playbook";

const METADATA_FILE_TYPE: &str = "file_type";
const METADATA_DOCUMENT: &str = "document";
const METADATA_WORKSPACE: &str = "workspace";

/// Editor context handed to the adapter alongside the raw prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptContext {
    pub file_type: String,
    pub document: Option<String>,
    pub workspace: Option<String>,
}

impl PromptContext {
    pub fn from_metadata(metadata: Option<&HashMap<String, String>>) -> Self {
        let lookup = |key: &str| metadata.and_then(|m| m.get(key)).cloned();
        Self {
            file_type: lookup(METADATA_FILE_TYPE)
                .unwrap_or_else(|| DEFAULT_FILE_TYPE.to_string()),
            document: lookup(METADATA_DOCUMENT),
            workspace: lookup(METADATA_WORKSPACE),
        }
    }
}

/// External collaborator that enriches a raw prompt with editor context.
/// Only the calling contract is owned here; adapter internals are not.
pub trait ContextAdapter: Send + Sync {
    fn enhance_prompt_for_ansible(&self, prompt: &str, context: Option<&PromptContext>)
    -> String;
}

/// Pass-through adapter used as the default wiring.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopContextAdapter;

impl ContextAdapter for NoopContextAdapter {
    fn enhance_prompt_for_ansible(
        &self,
        prompt: &str,
        _context: Option<&PromptContext>,
    ) -> String {
        prompt.to_string()
    }
}

/// Builds the [`PromptContext`] from request metadata and delegates to the
/// adapter. Every backend runs its prompts through this before dispatch.
pub fn apply_ansible_context(
    adapter: &dyn ContextAdapter,
    prompt: &str,
    metadata: Option<&HashMap<String, String>>,
) -> String {
    let context = PromptContext::from_metadata(metadata);
    adapter.enhance_prompt_for_ansible(prompt, Some(&context))
}

/// Strips Markdown code-fence wrapping from vendor output.
///
/// Removes a leading ```` ```yaml ````/```` ```yml ```` marker and a trailing
/// ```` ``` ```` marker, case-insensitively, repeating until a fixed point so
/// the function is idempotent for every input. Empty input stays empty.
pub fn clean_ansible_output(output: &str) -> String {
    let mut current = output.trim().to_string();
    loop {
        let next = strip_fence_markers(&current);
        if next == current {
            return current;
        }
        current = next;
    }
}

fn strip_fence_markers(text: &str) -> String {
    let mut s = text.trim();
    let lower = s.to_ascii_lowercase();
    for marker in ["```yaml", "```yml"] {
        if lower.starts_with(marker) {
            s = s[marker.len()..].trim_start();
            break;
        }
    }
    if let Some(stripped) = s.strip_suffix("```") {
        s = stripped.trim_end();
    }
    s.to_string()
}

/// Synthesizes an outline when the caller supplied none: numbered steps from
/// the task names of the generated content, falling back to a single step
/// derived from the prompt. Never returns an empty string.
pub fn outline_from_content(content: &str, prompt: &str) -> String {
    let steps: Vec<&str> = content
        .lines()
        .filter_map(|line| line.trim().strip_prefix("- name:"))
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .collect();

    if !steps.is_empty() {
        return steps
            .iter()
            .enumerate()
            .map(|(i, step)| format!("{}. {}", i + 1, step))
            .collect::<Vec<_>>()
            .join("\n");
    }

    let fallback = prompt.trim();
    if fallback.is_empty() {
        "1. Generate the requested Ansible content".to_string()
    } else {
        format!("1. {}", fallback)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clean_strips_yaml_fences() {
        let cleaned = clean_ansible_output("```yaml\n---\n- name: test\n```");
        assert!(!cleaned.contains("```yaml"));
        assert!(!cleaned.ends_with("```"));
        assert_eq!(cleaned, "---\n- name: test");
    }

    #[test]
    fn clean_strips_yml_fences_case_insensitively() {
        let cleaned = clean_ansible_output("```YML\n- name: a\n```");
        assert_eq!(cleaned, "- name: a");
    }

    #[test]
    fn clean_of_empty_input_is_empty() {
        assert_eq!(clean_ansible_output(""), "");
        assert_eq!(clean_ansible_output("   \n  "), "");
    }

    #[test]
    fn clean_is_idempotent() {
        let samples = [
            "```yaml\n---\n- name: test\n```",
            "plain text, no fences",
            "```yml\nfoo```",
            "```yaml\n```yaml\nnested\n```\n```",
            "",
            "trailing only```",
        ];
        for sample in samples {
            let once = clean_ansible_output(sample);
            let twice = clean_ansible_output(&once);
            assert_eq!(once, twice, "not idempotent for {:?}", sample);
        }
    }

    #[test]
    fn clean_leaves_unfenced_output_untouched_apart_from_trim() {
        assert_eq!(clean_ansible_output("  - name: keep me  "), "- name: keep me");
    }

    #[test]
    fn context_defaults_file_type_to_playbook() {
        let context = PromptContext::from_metadata(None);
        assert_eq!(context.file_type, "playbook");
        assert_eq!(context.document, None);
        assert_eq!(context.workspace, None);
    }

    #[test]
    fn context_reads_metadata_keys() {
        let mut metadata = HashMap::new();
        metadata.insert("file_type".to_string(), "role".to_string());
        metadata.insert("document".to_string(), "site.yml".to_string());

        let context = PromptContext::from_metadata(Some(&metadata));
        assert_eq!(context.file_type, "role");
        assert_eq!(context.document.as_deref(), Some("site.yml"));
        assert_eq!(context.workspace, None);
    }

    #[test]
    fn outline_is_numbered_task_names() {
        let content = "---\n- name: Install nginx\n  hosts: all\n  tasks:\n    - name: Start the service\n      ansible.builtin.service:\n        name: nginx";
        let outline = outline_from_content(content, "unused");
        assert_eq!(outline, "1. Install nginx\n2. Start the service");
    }

    #[test]
    fn outline_falls_back_to_the_prompt() {
        let outline = outline_from_content("no tasks here", "install nginx");
        assert_eq!(outline, "1. install nginx");
    }

    #[test]
    fn outline_is_never_empty() {
        assert!(!outline_from_content("", "").is_empty());
    }
}
