//! Code Insights - 성공한 설명에서 집계한 경향

use lens_foundation::{Explanation, ExplanationRecord, ExplanationResult};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

const TOP_PATTERNS: usize = 5;
const TOP_DEPENDENCIES: usize = 10;

/// A name and how many explanations mentioned it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Mention {
    pub name: String,
    pub count: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodeInsights {
    /// First word of the complexity label → file count
    pub complexity_distribution: BTreeMap<String, usize>,
    pub common_patterns: Vec<Mention>,
    pub common_dependencies: Vec<Mention>,
    /// Theme → number of suggestions touching it
    pub improvement_themes: BTreeMap<String, usize>,
}

impl CodeInsights {
    pub fn is_empty(&self) -> bool {
        self.complexity_distribution.is_empty()
            && self.common_patterns.is_empty()
            && self.common_dependencies.is_empty()
            && self.improvement_themes.is_empty()
    }
}

const THEMES: &[(&str, &[&str])] = &[
    ("Testing", &["test"]),
    ("Error Handling", &["error", "exception"]),
    ("Performance", &["performance", "optimi", "cache"]),
    ("Documentation", &["document", "docstring", "comment"]),
];

/// Count desc, name asc, truncated
fn top(counts: BTreeMap<String, usize>, limit: usize) -> Vec<Mention> {
    let mut mentions: Vec<Mention> = counts
        .into_iter()
        .map(|(name, count)| Mention { name, count })
        .collect();
    mentions.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.name.cmp(&b.name)));
    mentions.truncate(limit);
    mentions
}

/// Aggregate over the successful explanations, one vote per file
pub fn derive<'a>(records: impl IntoIterator<Item = &'a ExplanationRecord>) -> CodeInsights {
    let mut insights = CodeInsights::default();
    let mut patterns: BTreeMap<String, usize> = BTreeMap::new();
    let mut dependencies: BTreeMap<String, usize> = BTreeMap::new();

    let successes = records.into_iter().filter_map(|r| match &r.result {
        ExplanationResult::Success(e) => Some(e),
        _ => None,
    });

    for Explanation {
        complexity,
        design_patterns,
        dependencies: deps,
        suggestions,
        ..
    } in successes
    {
        if let Some(word) = complexity.split_whitespace().next() {
            let word = word.trim_matches(|c: char| !c.is_alphanumeric());
            if !word.is_empty() {
                *insights
                    .complexity_distribution
                    .entry(word.to_lowercase())
                    .or_default() += 1;
            }
        }

        for pattern in design_patterns {
            *patterns.entry(pattern.clone()).or_default() += 1;
        }
        for dep in deps {
            *dependencies.entry(dep.clone()).or_default() += 1;
        }

        for suggestion in suggestions {
            let lower = suggestion.to_lowercase();
            for (theme, keywords) in THEMES {
                if keywords.iter().any(|k| lower.contains(k)) {
                    *insights
                        .improvement_themes
                        .entry(theme.to_string())
                        .or_default() += 1;
                }
            }
        }
    }

    insights.common_patterns = top(patterns, TOP_PATTERNS);
    insights.common_dependencies = top(dependencies, TOP_DEPENDENCIES);
    insights
}

#[cfg(test)]
mod tests {
    use super::*;
    use lens_foundation::ErrorKind;

    fn success(complexity: &str, patterns: &[&str], suggestions: &[&str]) -> ExplanationRecord {
        let strings = |items: &[&str]| items.iter().map(|s| s.to_string()).collect();
        ExplanationRecord::unsubmitted(ExplanationResult::Success(Explanation {
            summary: "s".into(),
            functionality: "f".into(),
            key_components: vec![],
            dependencies: strings(&["serde"]),
            design_patterns: strings(patterns),
            suggestions: strings(suggestions),
            language: "Rust".into(),
            complexity: complexity.into(),
        }))
    }

    #[test]
    fn test_derive_counts_successes_only() {
        let records = vec![
            success("Low - simple helpers", &["Builder"], &["Add unit tests"]),
            success("low", &["Builder", "Factory"], &["Improve error handling"]),
            success("High. Many branches", &[], &["Cache results for performance"]),
            ExplanationRecord::unsubmitted(ExplanationResult::failed(ErrorKind::Timeout, 3)),
        ];

        let insights = derive(&records);

        assert_eq!(insights.complexity_distribution["low"], 2);
        assert_eq!(insights.complexity_distribution["high"], 1);
        assert_eq!(
            insights.common_patterns[0],
            Mention {
                name: "Builder".into(),
                count: 2
            }
        );
        assert_eq!(insights.common_patterns.len(), 2);
        assert_eq!(insights.common_dependencies[0].count, 3);
        assert_eq!(insights.improvement_themes["Testing"], 1);
        assert_eq!(insights.improvement_themes["Error Handling"], 1);
        assert_eq!(insights.improvement_themes["Performance"], 1);
        assert!(!insights.improvement_themes.contains_key("Documentation"));
    }

    #[test]
    fn test_no_successes_is_empty() {
        let records = [ExplanationRecord::unsubmitted(ExplanationResult::cancelled())];
        assert!(derive(&records).is_empty());
    }
}
