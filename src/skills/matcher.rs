//! Skill allow-list matching: turns a preset's plain-text skill entries
//! into token queries that can disambiguate names like "standard" vs
//! "non-standard" distance aptitude skills, then ranks OCR title
//! candidates against them with fuzzy scoring for the final tie-break.

use nucleo_matcher::pattern::{CaseMatching, Normalization, Pattern};
use nucleo_matcher::{Config, Matcher};

use crate::memory::SkillGrade;
use crate::model::normalize_text;

/// A parsed allow-list entry. Preset syntax: `"<name tokens><::grade>"`
/// where any token prefixed with `!` is a negative (forbidden) token and
/// `::double` requests the double-circle grade (default single-circle).
///
/// Example: `"standard !non-standard::double"` matches a tile titled
/// "Standard Distance Expert" but not "Non-standard Distance Expert", and
/// only counts as satisfied once the double-circle version is bought.
#[derive(Debug, Clone)]
pub struct SkillQuery {
    pub label: String,
    pub grade: SkillGrade,
    positive_tokens: Vec<String>,
    negative_tokens: Vec<String>,
}

impl SkillQuery {
    pub fn parse(spec: &str) -> Self {
        let (name_part, grade) = match spec.rsplit_once("::") {
            Some((name, "double")) => (name, SkillGrade::DoubleCircle),
            Some((name, _)) => (name, SkillGrade::SingleCircle),
            None => (spec, SkillGrade::SingleCircle),
        };

        let mut positive_tokens = Vec::new();
        let mut negative_tokens = Vec::new();
        for token in name_part.split_whitespace() {
            if let Some(negated) = token.strip_prefix('!') {
                negative_tokens.push(normalize_text(negated));
            } else {
                positive_tokens.push(normalize_text(token));
            }
        }

        Self {
            label: positive_tokens.join(" "),
            grade,
            positive_tokens,
            negative_tokens,
        }
    }

    /// A normalized title matches this query only if every positive token
    /// is a substring and no negative (disambiguation) token is.
    pub fn matches_title(&self, normalized_title: &str) -> bool {
        self.positive_tokens
            .iter()
            .all(|t| normalized_title.contains(t.as_str()))
            && !self
                .negative_tokens
                .iter()
                .any(|t| normalized_title.contains(t.as_str()))
    }
}

/// Fuzzy-score a candidate title against a query's label, for breaking
/// ties when more than one visible tile passes token matching.
pub fn fuzzy_score(query: &SkillQuery, normalized_title: &str) -> u32 {
    let mut matcher = Matcher::new(Config::DEFAULT);
    let mut buf = Vec::new();
    let haystack = nucleo_matcher::Utf32Str::new(normalized_title, &mut buf);
    Pattern::parse(&query.label, CaseMatching::Ignore, Normalization::Smart)
        .score(haystack, &mut matcher)
        .unwrap_or(0)
}

/// Pick the best-matching query (if any) for one observed tile title.
pub fn best_match<'a>(queries: &'a [SkillQuery], normalized_title: &str) -> Option<&'a SkillQuery> {
    queries
        .iter()
        .filter(|q| q.matches_title(normalized_title))
        .max_by_key(|q| fuzzy_score(q, normalized_title))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn negative_token_excludes_the_disambiguated_variant() {
        let query = SkillQuery::parse("standard !non-standard");
        assert!(query.matches_title("standard distance corners"));
        assert!(!query.matches_title("non-standard distance corners"));
    }

    #[test]
    fn grade_suffix_parses_double_circle() {
        let query = SkillQuery::parse("arc sprinter::double");
        assert_eq!(query.grade, SkillGrade::DoubleCircle);
    }

    #[test]
    fn default_grade_is_single_circle() {
        let query = SkillQuery::parse("arc sprinter");
        assert_eq!(query.grade, SkillGrade::SingleCircle);
    }

    #[test]
    fn best_match_picks_the_only_satisfying_query() {
        let queries = vec![
            SkillQuery::parse("standard !non-standard"),
            SkillQuery::parse("homestretch haste"),
        ];
        let chosen = best_match(&queries, "standard distance corners");
        assert!(chosen.is_some());
        assert_eq!(chosen.unwrap().label, "standard");
    }
}
