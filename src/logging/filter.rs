// src/logging/filter.rs
use axum::http::Uri;
use regex::Regex;
use serde::{Deserialize, Serialize};

/// A configured exclusion: `{ regex = "^/@.+$" }` or `{ glob = "/assets/**" }`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExclusionPattern {
    Regex(String),
    Glob(String),
}

/// Dev-server request paths that only add noise: app sources, `/@vite/...`
/// style internal modules and dependency resolution.
pub fn default_exclusions() -> Vec<ExclusionPattern> {
    vec![
        ExclusionPattern::Regex(r"^/(app)/.+".to_string()),
        ExclusionPattern::Regex(r"^/@.+$".to_string()),
        ExclusionPattern::Regex(r"^/node_modules/.*".to_string()),
    ]
}

#[derive(Debug, Clone)]
enum Matcher {
    Regex(Regex),
    Glob(glob::Pattern),
}

impl Matcher {
    fn matches(&self, path: &str) -> bool {
        match self {
            Matcher::Regex(re) => re.is_match(path),
            Matcher::Glob(pattern) => pattern.matches(path),
        }
    }
}

/// A configured pattern that failed to compile.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RejectedPattern {
    pub pattern: ExclusionPattern,
    pub error: String,
}

/// Suppresses access lines for URLs matching any exclusion pattern.
#[derive(Debug, Clone, Default)]
pub struct NoiseFilter {
    matchers: Vec<Matcher>,
    rejected: Vec<RejectedPattern>,
}

impl NoiseFilter {
    /// Compiles the patterns. Invalid patterns are skipped so that a bad
    /// entry never hides log lines; they are kept in [`rejected`](Self::rejected)
    /// for the caller to report.
    pub fn new(patterns: &[ExclusionPattern]) -> Self {
        let mut filter = Self::default();
        for pattern in patterns {
            let compiled = match pattern {
                ExclusionPattern::Regex(src) => Regex::new(src)
                    .map(Matcher::Regex)
                    .map_err(|e| e.to_string()),
                ExclusionPattern::Glob(src) => glob::Pattern::new(src)
                    .map(Matcher::Glob)
                    .map_err(|e| e.to_string()),
            };
            match compiled {
                Ok(matcher) => filter.matchers.push(matcher),
                Err(error) => filter.rejected.push(RejectedPattern {
                    pattern: pattern.clone(),
                    error,
                }),
            }
        }
        filter
    }

    pub fn rejected(&self) -> &[RejectedPattern] {
        &self.rejected
    }

    /// Whether the line for `url` should be dropped. URLs that cannot be
    /// parsed are never excluded.
    pub fn excludes(&self, url: &str) -> bool {
        let Ok(uri) = url.parse::<Uri>() else {
            return false;
        };
        let path = uri.path();
        self.matchers.iter().any(|m| m.matches(path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_patterns_match_dev_noise() {
        let filter = NoiseFilter::new(&default_exclusions());
        assert!(filter.rejected().is_empty());

        assert!(filter.excludes("/node_modules/react/index.js"));
        assert!(filter.excludes("/@vite/client"));
        assert!(filter.excludes("/@fs/home/app/root.tsx"));
        assert!(filter.excludes("/app/routes/_index.tsx?import"));

        assert!(!filter.excludes("/"));
        assert!(!filter.excludes("/application"));
        assert!(!filter.excludes("/test"));
    }

    #[test]
    fn glob_patterns() {
        let filter = NoiseFilter::new(&[ExclusionPattern::Glob("/assets/*.js".into())]);
        assert!(filter.excludes("/assets/entry.client-3x7f.js"));
        assert!(!filter.excludes("/assets/style.css"));
    }

    #[test]
    fn unparseable_urls_are_kept() {
        let filter = NoiseFilter::new(&default_exclusions());
        assert!(!filter.excludes("/node_modules/a b"));
        assert!(!filter.excludes(""));
    }

    #[test]
    fn invalid_patterns_are_skipped() {
        let filter = NoiseFilter::new(&[
            ExclusionPattern::Regex("(".into()),
            ExclusionPattern::Glob("[".into()),
            ExclusionPattern::Regex("^/x$".into()),
        ]);
        let rejected: Vec<_> = filter.rejected().iter().map(|r| &r.pattern).collect();
        assert_eq!(
            rejected,
            [&ExclusionPattern::Regex("(".into()), &ExclusionPattern::Glob("[".into())]
        );
        assert!(filter.excludes("/x"));
        assert!(!filter.excludes("/y"));
    }
}
