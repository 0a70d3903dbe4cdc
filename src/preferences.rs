//! Filter preferences for one session or request.
//!
//! A [`PreferenceStore`] is an ordinary value owned by whoever handles the
//! session and passed down into planning. Nothing is shared between
//! requests.

use std::collections::HashSet;
use std::time::Duration;
use log::{debug, info, warn};
use rand::seq::SliceRandom;
use rand::Rng;
use serde::Serialize;
use crate::categories::expand;
use crate::services::TagClassifier;

/// Ordered place-type filters. Earlier filters win when the aggregator caps
/// how many are applied.
pub type FilterSet = Vec<String>;

/// Outcome of setting preferences, as reported back to the caller.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PreferenceUpdate {
    pub status: &'static str,
    pub filter_count: usize,
    pub filters: FilterSet,
    pub custom_input: Option<String>,
}

#[derive(Debug, Clone)]
pub struct PreferenceStore {
    filters: FilterSet,
    custom_input: Option<String>,
    classifier_timeout: Duration,
}

impl Default for PreferenceStore {
    fn default() -> Self {
        Self::new(Duration::from_secs(15))
    }
}

impl PreferenceStore {
    pub fn new(classifier_timeout: Duration) -> Self {
        Self {
            filters: Vec::new(),
            custom_input: None,
            classifier_timeout,
        }
    }

    /// Most recently set filters; empty if never set.
    pub fn get(&self) -> &[String] {
        &self.filters
    }

    pub fn custom_input(&self) -> Option<&str> {
        self.custom_input.as_deref()
    }

    /// Replace the active filters.
    ///
    /// Categories are expanded to their place types and shuffled with `rng`
    /// (the order matters: only the first few filters get applied). When
    /// `custom_input` has text, the classifier's tags are put in front. A
    /// failed, slow or empty classification adds nothing. A filter listed
    /// twice keeps its first position.
    pub async fn set<S, R>(
        &mut self,
        categories: &[S],
        custom_input: Option<&str>,
        classifier: &dyn TagClassifier,
        rng: &mut R,
    ) -> PreferenceUpdate
    where
        S: AsRef<str>,
        R: Rng + ?Sized,
    {
        let mut derived = expand(categories);
        derived.shuffle(rng);

        let custom_input = custom_input.map(str::trim).filter(|s| !s.is_empty());
        let tags = match custom_input {
            Some(text) => self.classify(text, classifier).await,
            None => Vec::new(),
        };

        let mut seen = HashSet::new();
        let filters: FilterSet = tags
            .into_iter()
            .chain(derived)
            .filter(|f| seen.insert(f.clone()))
            .collect();

        info!(
            "[Preferences] {} categories + custom input {:?} -> {} filters",
            categories.len(),
            custom_input,
            filters.len()
        );

        self.filters = filters;
        self.custom_input = custom_input.map(str::to_string);

        PreferenceUpdate {
            status: "success",
            filter_count: self.filters.len(),
            filters: self.filters.clone(),
            custom_input: self.custom_input.clone(),
        }
    }

    async fn classify(&self, text: &str, classifier: &dyn TagClassifier) -> Vec<String> {
        match tokio::time::timeout(self.classifier_timeout, classifier.classify_tags(text)).await {
            Ok(Ok(reply)) => {
                let tags = parse_tags(&reply);
                debug!("[Preferences] Classifier reply {:?} -> {:?}", reply, tags);
                tags
            }
            Ok(Err(e)) => {
                warn!("[Preferences] Tag classification failed: {}", e);
                Vec::new()
            }
            Err(_) => {
                warn!("[Preferences] Tag classification timed out after {:?}", self.classifier_timeout);
                Vec::new()
            }
        }
    }
}

/// Parse a comma-separated tag reply.
///
/// Tokens are trimmed, stripped of wrapping brackets, quotes and backticks,
/// and lowercased. Empty tokens are dropped.
///
/// # Example
/// ```
/// use route_poi::preferences::parse_tags;
///
/// assert_eq!(parse_tags("museum, [zoo],'Park'"), vec!["museum", "zoo", "park"]);
/// assert!(parse_tags("").is_empty());
/// ```
pub fn parse_tags(reply: &str) -> Vec<String> {
    reply
        .split(',')
        .map(|token| {
            token
                .trim()
                .trim_matches(|c: char| matches!(c, '[' | ']' | '"' | '\'' | '`') || c.is_whitespace())
                .to_lowercase()
        })
        .filter(|token| !token.is_empty())
        .collect()
}
