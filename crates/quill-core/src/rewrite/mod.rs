//! Ordered find/replace rewriting of transcripts.
//!
//! Rules are loaded as an ordered list and executed strictly in declaration
//! order. Each rule operates on the output of the prior rule — compounding
//! semantics. That ordering is a documented contract: downstream rule files
//! depend on earlier rules feeding later ones, so it must not be "fixed"
//! into independent application against a frozen original.
//!
//! Two file formats are supported:
//! - newline-delimited `find,replace` pairs (literal rules; `#` comments)
//! - a JSON array of `{type, find, replace, transforms?}` objects, where
//!   `type` is `regex` or `literal` and transforms attach named operations
//!   to capture groups
//!
//! Invalid rows and patterns are skipped with a diagnostic, never fatal.

mod transforms;

pub use transforms::TransformOp;

use regex::{Captures, Regex};
use serde::Deserialize;
use std::collections::HashMap;
use std::fs;
use std::path::Path;

/// How a rule finds its target text.
#[derive(Debug, Clone)]
pub enum Matcher {
    /// Case-sensitive whole-substring replacement.
    Literal(String),
    /// Regex with `$n` numbered-backreference replacement template.
    Pattern(Regex),
}

/// One ordered rewrite rule.
#[derive(Debug, Clone)]
pub struct FindReplaceRule {
    pub matcher: Matcher,
    pub replace: String,
    /// Capture-group index to ordered transform chain.
    pub transforms: HashMap<usize, Vec<TransformOp>>,
}

impl FindReplaceRule {
    pub fn literal(find: impl Into<String>, replace: impl Into<String>) -> Self {
        Self {
            matcher: Matcher::Literal(find.into()),
            replace: replace.into(),
            transforms: HashMap::new(),
        }
    }

    pub fn pattern(pattern: Regex, replace: impl Into<String>) -> Self {
        Self {
            matcher: Matcher::Pattern(pattern),
            replace: replace.into(),
            transforms: HashMap::new(),
        }
    }

    pub fn with_transforms(mut self, group: usize, chain: Vec<TransformOp>) -> Self {
        self.transforms.insert(group, chain);
        self
    }
}

/// Post-rule options applied after the rule list.
#[derive(Debug, Clone, Copy, Default)]
pub struct RewriteOptions {
    pub remove_trailing_period: bool,
    pub add_trailing_space: bool,
    pub remove_capitalization: bool,
}

#[derive(Deserialize)]
struct JsonRule {
    #[serde(rename = "type")]
    kind: String,
    find: String,
    replace: String,
    #[serde(default)]
    transforms: Vec<JsonTransform>,
}

#[derive(Deserialize)]
struct JsonTransform {
    group: usize,
    #[serde(default)]
    operations: Vec<String>,
}

/// Load rules from a file, dispatching on extension (`.json` for the
/// structured format, anything else for `find,replace` pairs).
///
/// A missing file yields an empty rule list.
pub fn load_rules(path: &Path) -> Vec<FindReplaceRule> {
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) => {
            crate::verbose!("Could not read rules file {}: {e}", path.display());
            return Vec::new();
        }
    };

    let is_json = path
        .extension()
        .map(|ext| ext.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    if is_json {
        parse_json_rules(&content)
    } else {
        parse_literal_rules(&content)
    }
}

/// Parse newline-delimited `find,replace` pairs. Lines starting with `#`
/// and lines without both fields are skipped.
pub fn parse_literal_rules(content: &str) -> Vec<FindReplaceRule> {
    let mut rules = Vec::new();
    for line in content.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let Some((find, replace)) = line.split_once(',') else {
            crate::verbose!("Skipping rule line without replacement: {line}");
            continue;
        };
        let find = find.trim();
        let replace = replace.trim();
        if find.is_empty() || replace.is_empty() {
            continue;
        }
        rules.push(FindReplaceRule::literal(find, replace));
    }
    rules
}

/// Parse the JSON rule format.
pub fn parse_json_rules(content: &str) -> Vec<FindReplaceRule> {
    let parsed: Vec<JsonRule> = match serde_json::from_str(content) {
        Ok(parsed) => parsed,
        Err(e) => {
            crate::verbose!("Invalid JSON rules file: {e}");
            return Vec::new();
        }
    };

    let mut rules = Vec::new();
    for entry in parsed {
        let find = entry.find.trim();
        let replace = entry.replace.trim();
        if find.is_empty() || replace.is_empty() {
            continue;
        }

        let mut transforms: HashMap<usize, Vec<TransformOp>> = HashMap::new();
        for transform in &entry.transforms {
            let mut chain = Vec::new();
            for op in &transform.operations {
                match op.parse::<TransformOp>() {
                    Ok(op) => chain.push(op),
                    Err(e) => crate::verbose!("Skipping transform: {e}"),
                }
            }
            if !chain.is_empty() {
                transforms.insert(transform.group, chain);
            }
        }

        match entry.kind.to_lowercase().as_str() {
            "regex" => match Regex::new(find) {
                Ok(pattern) => rules.push(FindReplaceRule {
                    matcher: Matcher::Pattern(pattern),
                    replace: replace.to_string(),
                    transforms,
                }),
                Err(e) => crate::verbose!("Invalid regex pattern '{find}': {e}"),
            },
            "literal" | "simple" => rules.push(FindReplaceRule {
                matcher: Matcher::Literal(find.to_string()),
                replace: replace.to_string(),
                transforms,
            }),
            other => crate::verbose!("Skipping rule with unknown type: {other}"),
        }
    }
    rules
}

/// Apply the rule list in declaration order.
///
/// Compounding contract: rule N operates on the output of rule N-1, not on
/// the original text. Re-applying a rule set whose patterns no longer match
/// is a no-op.
pub fn apply_rules(text: &str, rules: &[FindReplaceRule]) -> String {
    let mut result = text.to_string();
    for rule in rules {
        result = match &rule.matcher {
            Matcher::Literal(find) => result.replace(find.as_str(), &rule.replace),
            Matcher::Pattern(pattern) => pattern
                .replace_all(&result, |caps: &Captures| {
                    expand_template(caps, &rule.replace, &rule.transforms)
                })
                .into_owned(),
        };
    }
    result
}

/// Substitute `$n` references in the replacement template, applying each
/// group's transform chain to the captured substring first.
///
/// Higher group indexes are substituted first so `$1` cannot corrupt `$10`.
fn expand_template(
    caps: &Captures,
    template: &str,
    transforms: &HashMap<usize, Vec<TransformOp>>,
) -> String {
    let mut result = template.to_string();
    for group in (0..caps.len()).rev() {
        let Some(matched) = caps.get(group) else {
            continue;
        };
        let mut content = matched.as_str().to_string();
        if let Some(chain) = transforms.get(&group) {
            for op in chain {
                content = op.apply(&content);
            }
        }
        result = result.replace(&format!("${group}"), &content);
    }
    result
}

/// Run the full find/replace stage: trim, apply rules, then the trailing
/// punctuation/spacing/case options.
pub fn apply_pipeline(text: &str, rules: &[FindReplaceRule], options: &RewriteOptions) -> String {
    let mut result = apply_rules(text.trim(), rules);

    if options.remove_trailing_period {
        if let Some(stripped) = result.strip_suffix('.') {
            result = stripped.to_string();
        }
    }
    if options.remove_capitalization {
        result = result.to_lowercase();
    }
    if options.add_trailing_space {
        result.push(' ');
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_literal_rule_replaces_substring() {
        let rules = vec![FindReplaceRule::literal("soda", "coke")];
        assert_eq!(apply_rules("I like soda", &rules), "I like coke");
    }

    #[test]
    fn test_literal_rule_is_case_sensitive() {
        let rules = vec![FindReplaceRule::literal("soda", "coke")];
        assert_eq!(apply_rules("I like Soda", &rules), "I like Soda");
    }

    #[test]
    fn test_regex_rule_with_backreference() {
        let rules = vec![FindReplaceRule::pattern(
            Regex::new(r"(\d+)").unwrap(),
            "[$1]",
        )];
        assert_eq!(apply_rules("I have 5 apples", &rules), "I have [5] apples");
    }

    #[test]
    fn test_rules_compound_in_order() {
        // the second rule must see the first rule's output
        let rules = vec![
            FindReplaceRule::literal("cat", "dog"),
            FindReplaceRule::literal("dog", "wolf"),
        ];
        assert_eq!(apply_rules("my cat", &rules), "my wolf");
    }

    #[test]
    fn test_exhausted_rules_are_idempotent() {
        let rules = vec![
            FindReplaceRule::literal("soda", "coke"),
            FindReplaceRule::pattern(Regex::new(r"(\d+) pct").unwrap(), "$1%"),
        ];
        let once = apply_rules("50 pct soda", &rules);
        assert_eq!(once, "50% coke");
        let twice = apply_rules(&once, &rules);
        assert_eq!(twice, once);
    }

    #[test]
    fn test_transforms_apply_before_substitution() {
        let rule = FindReplaceRule::pattern(
            Regex::new(r"name: (\w+)").unwrap(),
            "Name: $1",
        )
        .with_transforms(1, vec![TransformOp::Capitalize]);
        assert_eq!(apply_rules("name: alice", &[rule]), "Name: Alice");
    }

    #[test]
    fn test_transform_chain_runs_in_listed_order() {
        let rule = FindReplaceRule::pattern(Regex::new(r"\[(.+)\]").unwrap(), "$1")
            .with_transforms(1, vec![TransformOp::Strip, TransformOp::Upper]);
        assert_eq!(apply_rules("[ loud ]", &[rule]), "LOUD");
    }

    #[test]
    fn test_high_group_indexes_survive_low_ones() {
        let pattern = Regex::new(r"(a)(b)(c)(d)(e)(f)(g)(h)(i)(j)(k)").unwrap();
        let rule = FindReplaceRule::pattern(pattern, "$11$1");
        assert_eq!(apply_rules("abcdefghijk", &[rule]), "ka");
    }

    #[test]
    fn test_parse_literal_rules_skips_comments() {
        let content = "# comment\nsoda,coke\n\nbroken line\nteh , the\n";
        let rules = parse_literal_rules(content);
        assert_eq!(rules.len(), 2);
        assert_eq!(apply_rules("teh soda", &rules), "the coke");
    }

    #[test]
    fn test_parse_json_rules_with_transforms() {
        let content = r#"[
            {"type": "regex", "find": "(\\d+)", "replace": "[$1]"},
            {"type": "literal", "find": "soda", "replace": "coke"},
            {"type": "regex", "find": "(", "replace": "skipped"},
            {"type": "regex", "find": "go (\\w+)", "replace": "go $1",
             "transforms": [{"group": 1, "operations": ["upper"]}]}
        ]"#;
        let rules = parse_json_rules(content);
        // the invalid pattern is dropped
        assert_eq!(rules.len(), 3);
        assert_eq!(apply_rules("soda go fast 12", &rules), "coke go FAST [12]");
    }

    #[test]
    fn test_pipeline_options_after_rules() {
        let options = RewriteOptions {
            remove_trailing_period: true,
            add_trailing_space: true,
            remove_capitalization: true,
        };
        assert_eq!(apply_pipeline("  Hello World.  ", &[], &options), "hello world ");
    }
}
