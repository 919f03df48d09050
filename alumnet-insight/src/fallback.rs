//! Deterministic fallback tier for the analysis pipeline.
//!
//! When every hosted provider is exhausted (or none is configured), the
//! pipeline synthesizes its output locally from a fixed rule table:
//! keyword-triggered story templates, keyword topic extraction, and a small
//! sentiment lexicon. One table serves every entry point.

use crate::types::{Sentiment, StorySummary};
use alumnet_common::util::truncate_with_ellipsis;
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashMap;

/// Confidence reported for fallback-produced values.
pub const FALLBACK_CONFIDENCE: f64 = 0.85;

/// Topic used when no keyword matches.
pub const DEFAULT_TOPIC: &str = "Campus Life";

/// Maximum number of topics ever returned.
pub const MAX_TOPICS: usize = 5;

const MAX_TITLE_CHARS: usize = 80;
const MAX_SUBTITLE_CHARS: usize = 140;

// ============================================================================
// Story Rules
// ============================================================================

/// A keyword-triggered story template.
///
/// `capture` is matched case-insensitively against the original content;
/// when it hits, `value_subtitle` is used with `{value}` substituted by the
/// first capture group, otherwise `subtitle` is used as-is.
struct StoryRule {
    name: &'static str,
    keywords: &'static [&'static str],
    capture: Option<&'static str>,
    title: &'static str,
    subtitle: &'static str,
    value_subtitle: Option<&'static str>,
}

/// Rule order is fixed; the first matching rule wins.
static STORY_RULES: &[StoryRule] = &[
    StoryRule {
        name: "academics",
        keywords: &["sgpa", "cgpa", "gpa"],
        capture: Some(r"(?i)(?:sgpa|cgpa|gpa)\s*(?:of\s*)?(\d+(?:\.\d+)?)"),
        title: "Academic Milestone",
        subtitle: "A strong semester result worth celebrating.",
        value_subtitle: Some("Closed the semester at {value} and aiming higher."),
    },
    StoryRule {
        name: "placement",
        keywords: &["placed", "placement", "job offer", "offer letter"],
        capture: Some(r"(?i:placed|offer(?:\s+letter)?)\s+(?i:at|from|with)\s+([A-Z][\w&.]*(?:\s+[A-Z][\w&.]*)*)"),
        title: "Placement Success",
        subtitle: "An offer letter is in hand and a new career begins.",
        value_subtitle: Some("Signed with {value} and ready for day one."),
    },
    StoryRule {
        name: "interview",
        keywords: &["interview"],
        capture: None,
        title: "Interview Experience",
        subtitle: "Lessons from the interview room, shared for the next batch.",
        value_subtitle: None,
    },
    StoryRule {
        name: "hackathon",
        keywords: &["hackathon", "codefest", "devfest"],
        capture: None,
        title: "Hackathon Story",
        subtitle: "Built under pressure and shipped before the clock ran out.",
        value_subtitle: None,
    },
    StoryRule {
        name: "internship",
        keywords: &["internship", "intern at", "interning"],
        capture: None,
        title: "Internship Update",
        subtitle: "First steps into the industry, one sprint at a time.",
        value_subtitle: None,
    },
    StoryRule {
        name: "scholarship",
        keywords: &["scholarship", "fellowship"],
        capture: None,
        title: "Scholarship News",
        subtitle: "Recognition that funds the next stretch of the journey.",
        value_subtitle: None,
    },
    StoryRule {
        name: "research",
        keywords: &["research", "paper accepted", "published", "conference"],
        capture: None,
        title: "Research Spotlight",
        subtitle: "New work from the community reaches a wider audience.",
        value_subtitle: None,
    },
    StoryRule {
        name: "graduation",
        keywords: &["graduated", "graduation", "convocation"],
        capture: None,
        title: "Graduation Day",
        subtitle: "Caps in the air and a chapter well finished.",
        value_subtitle: None,
    },
    StoryRule {
        name: "reunion",
        keywords: &["reunion", "alumni meet", "homecoming"],
        capture: None,
        title: "Alumni Reunion",
        subtitle: "Old batchmates, new stories, same campus spirit.",
        value_subtitle: None,
    },
    StoryRule {
        name: "giving",
        keywords: &["donation", "fundraiser", "giving back", "mentoring"],
        capture: None,
        title: "Giving Back",
        subtitle: "Support flowing back to the campus that started it all.",
        value_subtitle: None,
    },
];

/// Compiled capture patterns, keyed by rule name.
static CAPTURES: Lazy<HashMap<&'static str, Regex>> = Lazy::new(|| {
    STORY_RULES
        .iter()
        .filter_map(|rule| {
            rule.capture
                .map(|pattern| (rule.name, Regex::new(pattern).expect("static rule pattern")))
        })
        .collect()
});

/// Build a story summary for content without any hosted model.
pub fn story_for(content: &str) -> StorySummary {
    let lower = content.to_lowercase();

    for rule in STORY_RULES {
        if !rule.keywords.iter().any(|k| lower.contains(k)) {
            continue;
        }

        let subtitle = match (rule.value_subtitle, CAPTURES.get(rule.name)) {
            (Some(template), Some(re)) => match re.captures(content) {
                Some(caps) => {
                    let value = caps.get(1).map(|m| m.as_str().trim()).unwrap_or_default();
                    template.replace("{value}", value)
                }
                None => rule.subtitle.to_string(),
            },
            _ => rule.subtitle.to_string(),
        };

        return StorySummary {
            title: rule.title.to_string(),
            subtitle,
        };
    }

    generic_story(content)
}

/// Generic template for content matching no rule: first sentence becomes the
/// title, the remainder (or a stock line) the subtitle.
fn generic_story(content: &str) -> StorySummary {
    let cleaned = content.split_whitespace().collect::<Vec<_>>().join(" ");
    let (first, rest) = split_first_sentence(&cleaned);

    let title = truncate_with_ellipsis(first.trim().trim_end_matches(['.', '!', '?']), MAX_TITLE_CHARS);
    let subtitle = if rest.trim().is_empty() {
        "An update from the alumni community.".to_string()
    } else {
        truncate_with_ellipsis(rest.trim(), MAX_SUBTITLE_CHARS)
    };

    StorySummary { title, subtitle }
}

/// Split text at the end of its first sentence.
pub fn split_first_sentence(text: &str) -> (&str, &str) {
    static SENTENCE_END: Lazy<Regex> =
        Lazy::new(|| Regex::new(r"[.!?]\s").expect("static pattern"));

    match SENTENCE_END.find(text) {
        Some(m) => text.split_at(m.end()),
        None => (text, ""),
    }
}

// ============================================================================
// Topic Extraction
// ============================================================================

/// Topic labels with their trigger keywords, in priority order.
static TOPIC_KEYWORDS: &[(&str, &[&str])] = &[
    ("Placements", &["placed", "placement", "offer letter", "recruit"]),
    ("Interviews", &["interview"]),
    ("Hackathons", &["hackathon", "codefest", "devfest"]),
    ("Academics", &["sgpa", "cgpa", "gpa", "exam", "semester", "grade"]),
    ("Internships", &["internship", "intern at", "interning"]),
    ("Higher Studies", &["masters", "m.s.", "gre", "phd", "grad school"]),
    ("Research", &["research", "paper", "publication", "conference"]),
    ("Events", &["event", "meetup", "reunion", "fest", "workshop"]),
    ("Career Growth", &["promotion", "promoted", "startup", "founder", "switched"]),
    ("Giving Back", &["donation", "fundraiser", "mentoring", "giving back"]),
];

/// Extract up to [`MAX_TOPICS`] topics from content.
///
/// Never returns an empty list: content matching nothing gets
/// [`DEFAULT_TOPIC`].
pub fn extract_topics(content: &str) -> Vec<String> {
    let lower = content.to_lowercase();

    let mut topics: Vec<String> = TOPIC_KEYWORDS
        .iter()
        .filter(|(_, keywords)| keywords.iter().any(|k| lower.contains(k)))
        .map(|(topic, _)| (*topic).to_string())
        .take(MAX_TOPICS)
        .collect();

    if topics.is_empty() {
        topics.push(DEFAULT_TOPIC.to_string());
    }

    topics
}

// ============================================================================
// Sentiment Lexicon
// ============================================================================

static POSITIVE_WORDS: &[&str] = &[
    "congratulations", "proud", "excited", "happy", "thrilled", "grateful", "achieved",
    "cleared", "selected", "won", "awarded", "amazing", "great", "love", "success",
];

static NEGATIVE_WORDS: &[&str] = &[
    "rejected", "failed", "sad", "unfortunately", "struggle", "difficult", "lost",
    "missed", "stress", "worried", "disappointed", "tough",
];

/// Classify sentiment from the lexicon. Ties and no-hits are `Neutral`.
pub fn sentiment_of(content: &str) -> Sentiment {
    let lower = content.to_lowercase();

    let positives = POSITIVE_WORDS.iter().filter(|w| lower.contains(*w)).count();
    let negatives = NEGATIVE_WORDS.iter().filter(|w| lower.contains(*w)).count();

    match positives.cmp(&negatives) {
        std::cmp::Ordering::Greater => Sentiment::Positive,
        std::cmp::Ordering::Less => Sentiment::Negative,
        std::cmp::Ordering::Equal => Sentiment::Neutral,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sgpa_number_lands_in_subtitle() {
        let story = story_for("Scored an SGPA of 9.2 this semester, feeling proud!");
        assert_eq!(story.title, "Academic Milestone");
        assert!(story.subtitle.contains("9.2"));
    }

    #[test]
    fn sgpa_without_number_uses_plain_subtitle() {
        let story = story_for("My sgpa finally recovered this semester");
        assert_eq!(story.title, "Academic Milestone");
        assert!(!story.subtitle.contains("{value}"));
        assert!(!story.subtitle.is_empty());
    }

    #[test]
    fn placement_company_is_captured() {
        let story = story_for("Thrilled to share that I got placed at Infosys this week!");
        assert_eq!(story.title, "Placement Success");
        assert!(story.subtitle.contains("Infosys"));
    }

    #[test]
    fn rule_order_breaks_keyword_ties() {
        // Contains both "interview" and "hackathon"; "interview" rule comes first
        let story = story_for("The hackathon win led to an interview invite");
        assert_eq!(story.title, "Interview Experience");
    }

    #[test]
    fn unmatched_content_gets_generic_story() {
        let story = story_for("Visited the old campus library today. The renovation looks wonderful.");
        assert_eq!(story.title, "Visited the old campus library today");
        assert!(story.subtitle.contains("renovation"));
    }

    #[test]
    fn unmatched_single_sentence_gets_stock_subtitle() {
        let story = story_for("Hello everyone");
        assert_eq!(story.title, "Hello everyone");
        assert!(!story.subtitle.is_empty());
    }

    #[test]
    fn long_title_is_truncated() {
        let long = "word ".repeat(60);
        let story = story_for(&long);
        assert!(story.title.chars().count() <= MAX_TITLE_CHARS + 3);
        assert!(story.title.ends_with("..."));
    }

    #[test]
    fn topics_never_empty_and_capped() {
        let topics = extract_topics("nothing relevant here at all");
        assert_eq!(topics, vec![DEFAULT_TOPIC.to_string()]);

        let busy = "placement interview hackathon sgpa internship research \
                    reunion promotion donation masters";
        let topics = extract_topics(busy);
        assert!(!topics.is_empty());
        assert!(topics.len() <= MAX_TOPICS);
    }

    #[test]
    fn topics_preserve_priority_order() {
        let topics = extract_topics("After the interview I got placed!");
        assert_eq!(topics[0], "Placements");
        assert_eq!(topics[1], "Interviews");
    }

    #[test]
    fn lexicon_sentiment() {
        assert_eq!(
            sentiment_of("So proud and excited, we won the finals!"),
            Sentiment::Positive
        );
        assert_eq!(
            sentiment_of("Unfortunately I was rejected again, feeling sad"),
            Sentiment::Negative
        );
        assert_eq!(sentiment_of("The seminar is on Tuesday"), Sentiment::Neutral);
        // One positive and one negative word tie back to Neutral
        assert_eq!(
            sentiment_of("Happy about the offer but sad to leave campus"),
            Sentiment::Neutral
        );
    }
}
