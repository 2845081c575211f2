//! Request classifier.
//!
//! Pure, deterministic routing from (declared model, user content) to an
//! agent key. Precedence is an explicit ordered rule table rather than a
//! chain of conditionals, so it can be audited and tested as data:
//!
//! 1. exact model alias;
//! 2. script detection (any character in the Bengali block);
//! 3. keyword rule sets, in fixed order (code, review, documentation,
//!    testing, deployment, audio);
//! 4. the default agent.
//!
//! First match wins. Script detection deliberately precedes every keyword
//! rule, so Bengali content about "docker" still reaches the language agent.

use std::sync::Arc;

use crate::registry::AgentRegistry;

pub const CODE_KEYWORDS: &[&str] = &[
    "function",
    "class",
    "def",
    "import",
    "code",
    "program",
    "script",
    "algorithm",
];

pub const REVIEW_KEYWORDS: &[&str] = &[
    "review", "check", "analyze", "security", "bug", "error", "fix",
];

pub const DOC_KEYWORDS: &[&str] = &[
    "documentation",
    "doc",
    "readme",
    "api",
    "guide",
    "manual",
    "tutorial",
];

pub const TEST_KEYWORDS: &[&str] = &[
    "test", "unit test", "pytest", "assert", "mock", "coverage",
];

pub const DEPLOY_KEYWORDS: &[&str] = &[
    "deploy",
    "docker",
    "dockerfile",
    "kubernetes",
    "server",
    "production",
    "infrastructure",
];

pub const AUDIO_KEYWORDS: &[&str] = &[
    "speech",
    "audio",
    "voice",
    "sound",
    "tts",
    "text-to-speech",
];

/// Bengali Unicode block.
const SCRIPT_RANGE: (char, char) = ('\u{0980}', '\u{09FF}');

enum Matcher {
    /// Any character inside an inclusive code-point range.
    Script(char, char),
    /// Any keyword present in the content. Single-word keywords match
    /// whole words; phrases and hyphenated keywords match as substrings.
    Keywords(&'static [&'static str]),
}

/// One content rule in priority order.
pub struct RouteRule {
    pub name: &'static str,
    pub target: &'static str,
    matcher: Matcher,
}

impl RouteRule {
    fn matches(&self, raw: &str, lower: &str, words: &[&str]) -> bool {
        match &self.matcher {
            Matcher::Script(start, end) => raw.chars().any(|c| c >= *start && c <= *end),
            Matcher::Keywords(set) => set.iter().any(|k| keyword_hit(lower, words, k)),
        }
    }
}

fn keyword_hit(lower: &str, words: &[&str], keyword: &str) -> bool {
    if keyword.contains(' ') || keyword.contains('-') {
        lower.contains(keyword)
    } else {
        words.iter().any(|w| *w == keyword)
    }
}

/// Deterministic request classifier.
pub struct Classifier {
    registry: Arc<AgentRegistry>,
    rules: Vec<RouteRule>,
    default_target: &'static str,
}

impl Classifier {
    /// Build the standard rule table.
    pub fn new(registry: Arc<AgentRegistry>) -> Self {
        let rules = vec![
            RouteRule {
                name: "bengali-script",
                target: "bengali_nlp",
                matcher: Matcher::Script(SCRIPT_RANGE.0, SCRIPT_RANGE.1),
            },
            RouteRule {
                name: "code",
                target: "code_generation",
                matcher: Matcher::Keywords(CODE_KEYWORDS),
            },
            RouteRule {
                name: "review",
                target: "code_review",
                matcher: Matcher::Keywords(REVIEW_KEYWORDS),
            },
            RouteRule {
                name: "documentation",
                target: "documentation",
                matcher: Matcher::Keywords(DOC_KEYWORDS),
            },
            RouteRule {
                name: "testing",
                target: "testing",
                matcher: Matcher::Keywords(TEST_KEYWORDS),
            },
            RouteRule {
                name: "deployment",
                target: "deployment",
                matcher: Matcher::Keywords(DEPLOY_KEYWORDS),
            },
            RouteRule {
                name: "audio",
                target: "voice_processor",
                matcher: Matcher::Keywords(AUDIO_KEYWORDS),
            },
        ];

        Self {
            registry,
            rules,
            default_target: "bengali_nlp",
        }
    }

    /// The ordered rule table, for inspection.
    pub fn rules(&self) -> &[RouteRule] {
        &self.rules
    }

    /// Classify a request. Never fails: requests matching nothing route
    /// to the default agent.
    pub fn classify(&self, model: &str, content: &str) -> String {
        if let Some(agent) = self.registry.alias_target(model) {
            tracing::debug!(model = %model, agent = %agent, "model alias matched");
            return agent.to_string();
        }

        let lower = content.to_lowercase();
        let words: Vec<&str> = lower
            .split(|c: char| !c.is_alphanumeric())
            .filter(|w| !w.is_empty())
            .collect();

        for rule in &self.rules {
            if rule.matches(content, &lower, &words) {
                tracing::debug!(rule = rule.name, agent = rule.target, "content rule matched");
                return rule.target.to_string();
            }
        }

        self.default_target.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use relay_core::AppConfig;

    fn classifier() -> Classifier {
        let registry = Arc::new(AgentRegistry::from_config(&AppConfig::default()).unwrap());
        Classifier::new(registry)
    }

    #[test]
    fn alias_dominates_content() {
        let c = classifier();
        assert_eq!(c.classify("gpt-4", "Hello"), "bengali_nlp");
        assert_eq!(c.classify("codex", "deploy with docker"), "code_generation");
        // Alias is rule one; it even outranks script detection.
        assert_eq!(c.classify("claude", "আমি docker শিখছি"), "documentation");
    }

    #[test]
    fn script_detection_overrides_keywords() {
        let c = classifier();
        assert_eq!(c.classify("local-model", "আমার docker সাহায্য দরকার"), "bengali_nlp");
    }

    #[test]
    fn keyword_rules_fire_in_fixed_order() {
        let c = classifier();
        assert_eq!(c.classify("local-model", "write a function for me"), "code_generation");
        assert_eq!(c.classify("local-model", "please review this patch"), "code_review");
        assert_eq!(c.classify("local-model", "draft a readme"), "documentation");
        assert_eq!(c.classify("local-model", "add unit test coverage"), "testing");
        assert_eq!(
            c.classify("local-model", "Write a Dockerfile for my app"),
            "deployment"
        );
        assert_eq!(c.classify("local-model", "convert this to speech"), "voice_processor");

        // "review" (rule 2) wins over "deploy" (rule 5) in the same content.
        assert_eq!(
            c.classify("local-model", "review the deploy pipeline"),
            "code_review"
        );
    }

    #[test]
    fn matching_is_case_insensitive_and_word_bounded() {
        let c = classifier();
        assert_eq!(c.classify("local-model", "REVIEW THIS"), "code_review");
        // "dockerfile" must not trip the earlier documentation rule via "doc".
        assert_eq!(c.classify("local-model", "a Dockerfile please"), "deployment");
    }

    #[test]
    fn unmatched_content_routes_to_default() {
        let c = classifier();
        assert_eq!(c.classify("local-model", "good morning"), "bengali_nlp");
        assert_eq!(c.classify("", ""), "bengali_nlp");
    }

    #[test]
    fn classification_is_deterministic() {
        let c = classifier();
        let first = c.classify("local-model", "fix the bug in my script");
        for _ in 0..50 {
            assert_eq!(c.classify("local-model", "fix the bug in my script"), first);
        }
    }

    #[test]
    fn rule_table_order_is_auditable() {
        let c = classifier();
        let names: Vec<_> = c.rules().iter().map(|r| r.name).collect();
        assert_eq!(
            names,
            vec![
                "bengali-script",
                "code",
                "review",
                "documentation",
                "testing",
                "deployment",
                "audio"
            ]
        );
    }
}
