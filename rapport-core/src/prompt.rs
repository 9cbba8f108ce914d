//! Prompt generator: rendering the relationship into instructions for a
//! downstream text-generation call.
//!
//! Output is plain text assembled from fixed templates, in this order:
//!
//! 1. base counselor instruction
//! 2. phase instruction
//! 3. adaptation guide (only once the profile has enough evidence)
//! 4. what the agent knows about the user
//! 5. remembered episodes (familiar and trusted phases only)
//!
//! Rendering is pure: the same inputs always produce the same string.

use chrono::{DateTime, Utc};

use crate::config::PromptConfig;
use crate::memory::{AdaptiveProfile, Episode, RelationshipState};
use crate::types::{DepthLevel, RelationshipPhase, ToneLevel, clamp_unit};

// ---------------------------------------------------------------------------
// Templates
// ---------------------------------------------------------------------------

/// Always the first block of a system prompt.
pub const BASE_INSTRUCTION: &str = "You are a supportive listener for the person you are talking with.
First acknowledge their feelings, then think the problem through together when it helps.
In a crisis, guide them toward professional support.";

const PHASE_STRANGER: &str = "First meeting. Be polite and attentive.";
const PHASE_ACQUAINTANCE: &str = "You have talked before. Past conversations may be referenced.";
const PHASE_FAMILIAR: &str = "A close relationship. Talk naturally.";
const PHASE_TRUSTED: &str = "Established trust. Be candid and direct.";

/// Crisis addendum; `{resources}` expands to one indented line per resource.
pub const CRISIS_TEMPLATE: &str = "
!! IMPORTANT: this may be a crisis !!
- Put the user's safety first
- Strongly recommend contacting professional support
{resources}
- Let them know they are not alone
- Confirm a concrete plan for getting through today safely";

const ADAPTATION_HEADER: &str = "\n**How to respond to this user:**";
const KNOWN_INFO_HEADER: &str = "\n**What you know about the user:**";
const EPISODE_HEADER: &str = "\n**Important episodes you remember:**";

const KNOWN_FACTS_SHOWN: usize = 5;
const KNOWN_TOPICS_SHOWN: usize = 3;
const EPISODES_SHOWN: usize = 3;
const EPISODE_MIN_IMPORTANCE: f32 = 0.5;
const SHARED_EXCERPT_CHARS: usize = 50;

/// Replace `{key}` placeholders in `template`.
#[must_use]
pub fn render_template(template: &str, vars: &[(&str, &str)]) -> String {
    let mut result = template.to_string();
    for (key, value) in vars {
        result = result.replace(&format!("{{{key}}}"), value);
    }
    result
}

fn phase_instruction(phase: RelationshipPhase) -> &'static str {
    match phase {
        RelationshipPhase::Stranger => PHASE_STRANGER,
        RelationshipPhase::Acquaintance => PHASE_ACQUAINTANCE,
        RelationshipPhase::Familiar => PHASE_FAMILIAR,
        RelationshipPhase::Trusted => PHASE_TRUSTED,
    }
}

fn tone_instruction(tone: ToneLevel) -> &'static str {
    match tone {
        ToneLevel::Warm => "Respond warmly and with encouragement",
        ToneLevel::Professional => "Respond calmly and professionally",
        ToneLevel::Casual => "Respond in a friendly, casual way",
        ToneLevel::Balanced => "Keep a balanced tone",
    }
}

fn depth_instruction(depth: DepthLevel) -> &'static str {
    match depth {
        DepthLevel::Shallow => "Keep answers brief",
        DepthLevel::Medium => "Answer with moderate detail",
        DepthLevel::Deep => "Include detailed explanations and concrete examples",
    }
}

// ---------------------------------------------------------------------------
// Generator
// ---------------------------------------------------------------------------

/// Per-turn context rendered by [`PromptGenerator::context_addendum`].
#[derive(Debug, Clone, Default)]
pub struct TurnContext {
    /// Emotion label.
    pub emotion: String,
    /// Emotion intensity (0.0 to 1.0).
    pub intensity: f32,
    /// Topics of the current turn.
    pub topics: Vec<String>,
    /// Display name, if the caller knows one.
    pub user_name: Option<String>,
}

/// Renders system prompts from relationship data.
#[derive(Debug, Clone, Default)]
pub struct PromptGenerator {
    config: PromptConfig,
}

impl PromptGenerator {
    /// Create a generator with the given settings.
    #[must_use]
    pub fn new(config: PromptConfig) -> Self {
        Self { config }
    }

    /// Render the full system prompt.
    ///
    /// `recent_episodes` should be newest first; only the first three with
    /// importance ≥ 0.5 are shown.
    #[must_use]
    pub fn generate(
        &self,
        state: &RelationshipState,
        profile: &AdaptiveProfile,
        recent_episodes: &[Episode],
    ) -> String {
        let mut parts: Vec<String> = vec![
            BASE_INSTRUCTION.to_string(),
            format!("\n{}", phase_instruction(state.phase)),
        ];

        if profile.confidence_score > self.config.adaptation_confidence_threshold {
            parts.push(adaptation_section(profile));
        }
        if let Some(section) = known_info_section(state) {
            parts.push(section);
        }
        if matches!(state.phase, RelationshipPhase::Familiar | RelationshipPhase::Trusted) {
            if let Some(section) = episode_section(recent_episodes) {
                parts.push(section);
            }
        }

        parts.join("\n")
    }

    /// Safety instructions to append when the current turn is a crisis.
    #[must_use]
    pub fn crisis_addendum(&self) -> String {
        let resources = self
            .config
            .crisis_resources
            .iter()
            .map(|r| format!("  - {r}"))
            .collect::<Vec<_>>()
            .join("\n");
        render_template(CRISIS_TEMPLATE, &[("resources", &resources)])
    }

    /// Date, user and emotion context for the current turn.
    #[must_use]
    pub fn context_addendum(&self, context: &TurnContext, now: DateTime<Utc>) -> String {
        let mut parts = vec![
            "---".to_string(),
            format!("Current time: {}", now.format("%Y-%m-%d %H:%M")),
        ];
        if let Some(name) = context.user_name.as_deref().filter(|n| !n.is_empty()) {
            parts.push(format!("User: {name}"));
        }
        let level = (clamp_unit(context.intensity) * 10.0).floor() as u8;
        parts.push(format!("Emotion: {} (intensity: {level}/10)", context.emotion));
        if !context.topics.is_empty() {
            parts.push(format!("Topics: {}", context.topics.join(", ")));
        }
        parts.join("\n")
    }
}

fn adaptation_section(profile: &AdaptiveProfile) -> String {
    let mut lines = vec![
        ADAPTATION_HEADER.to_string(),
        format!("- {}", tone_instruction(profile.preferred_tone)),
        format!("- {}", depth_instruction(profile.preferred_depth)),
    ];

    if profile.likes_empathy > 0.7 {
        lines.push("- Put empathy first and stay close to their feelings".to_string());
    }
    if profile.likes_questions > 0.6 {
        lines.push("- Draw out their thinking with questions".to_string());
    } else if profile.likes_questions < 0.3 {
        lines.push("- Keep questions to a minimum".to_string());
    }
    if profile.likes_advice > 0.6 {
        lines.push("- Offer concrete advice and suggestions".to_string());
    } else if profile.likes_advice < 0.3 {
        lines.push("- Prioritise listening over advice".to_string());
    }

    let top = profile.top_topics(3);
    if !top.is_empty() {
        let names: Vec<&str> = top.iter().map(|t| t.topic.as_str()).collect();
        lines.push(format!("- Topics they care about: {}", names.join(", ")));
    }

    lines.join("\n")
}

fn known_info_section(state: &RelationshipState) -> Option<String> {
    let mut lines = Vec::new();

    if !state.known_facts.is_empty() {
        lines.push(KNOWN_INFO_HEADER.to_string());
        let skip = state.known_facts.len().saturating_sub(KNOWN_FACTS_SHOWN);
        lines.extend(state.known_facts.iter().skip(skip).map(|f| format!("- {f}")));
    }
    if !state.known_topics.is_empty() {
        let skip = state.known_topics.len().saturating_sub(KNOWN_TOPICS_SHOWN);
        let recent: Vec<&str> = state.known_topics.iter().skip(skip).map(String::as_str).collect();
        lines.push(format!("- Recently discussed: {}", recent.join(", ")));
    }

    (!lines.is_empty()).then(|| lines.join("\n"))
}

fn episode_section(episodes: &[Episode]) -> Option<String> {
    let mut lines = vec![EPISODE_HEADER.to_string()];

    for episode in episodes
        .iter()
        .filter(|e| e.importance_score >= EPISODE_MIN_IMPORTANCE)
        .take(EPISODES_SHOWN)
    {
        let mut recap = Vec::new();
        if !episode.topics.is_empty() {
            let topics: Vec<&str> = episode.topics.iter().take(2).map(String::as_str).collect();
            recap.push(format!("Topics: {}", topics.join(", ")));
        }
        if let Some(shared) = episode.user_shared.first() {
            let excerpt: String = shared.chars().take(SHARED_EXCERPT_CHARS).collect();
            recap.push(format!("Shared: {excerpt}"));
        }
        if !episode.emotional_context.is_empty() {
            recap.push(format!("Emotion: {}", episode.emotional_context));
        }
        if !recap.is_empty() {
            lines.push(format!(
                "- [{}] {}",
                episode.created_at.format("%m/%d"),
                recap.join(" / ")
            ));
        }
    }

    (lines.len() > 1).then(|| lines.join("\n"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    use crate::memory::TopicAffinity;

    fn at(month: u32, day: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, month, day, 12, 0, 0).single().expect("valid date")
    }

    fn familiar_state() -> RelationshipState {
        let mut state = RelationshipState::new("u1", at(1, 1));
        state.phase = RelationshipPhase::Familiar;
        state
    }

    #[test]
    fn stranger_prompt_is_base_plus_phase() {
        let state = RelationshipState::new("u1", at(1, 1));
        let profile = AdaptiveProfile::new(at(1, 1));
        let prompt = PromptGenerator::default().generate(&state, &profile, &[]);
        assert!(prompt.starts_with(BASE_INSTRUCTION));
        assert!(prompt.contains(PHASE_STRANGER));
        assert!(!prompt.contains("How to respond"));
        assert!(!prompt.contains("What you know"));
    }

    #[test]
    fn adaptation_needs_confidence() {
        let state = RelationshipState::new("u1", at(1, 1));
        let mut profile = AdaptiveProfile::new(at(1, 1));
        profile.confidence_score = 0.5;
        profile.preferred_tone = ToneLevel::Warm;
        profile.likes_empathy = 0.8;
        profile.likes_questions = 0.2;
        profile.likes_advice = 0.7;
        for (topic, score) in [("work", 0.6), ("family", 0.4), ("money", 0.3), ("hobbies", 0.1)] {
            profile
                .topic_affinities
                .insert(topic.into(), TopicAffinity::first_mention(topic, score, at(1, 1)));
        }
        let prompt = PromptGenerator::default().generate(&state, &profile, &[]);
        assert!(prompt.contains("- Respond warmly and with encouragement"));
        assert!(prompt.contains("- Answer with moderate detail"));
        assert!(prompt.contains("- Put empathy first"));
        assert!(prompt.contains("- Keep questions to a minimum"));
        assert!(prompt.contains("- Offer concrete advice"));
        assert!(prompt.contains("- Topics they care about: work, family, money"));
    }

    #[test]
    fn known_info_shows_latest_facts_and_topics() {
        let mut state = RelationshipState::new("u1", at(1, 1));
        for i in 0..7 {
            state.learn_fact(&format!("fact {i}"));
        }
        for topic in ["a", "b", "c", "d"] {
            state.learn_topic(topic);
        }
        let prompt = PromptGenerator::default().generate(&state, &AdaptiveProfile::new(at(1, 1)), &[]);
        assert!(!prompt.contains("- fact 1\n"));
        assert!(prompt.contains("- fact 2\n"));
        assert!(prompt.contains("- fact 6"));
        assert!(prompt.contains("- Recently discussed: b, c, d"));
    }

    #[test]
    fn episodes_only_for_close_phases() {
        let episode = Episode::new("u1", "s", 0.8, 0.6, at(3, 7))
            .with_topics(vec!["work".into(), "health".into(), "money".into()])
            .with_shared(vec!["x".repeat(80)])
            .with_emotion("anxiety");
        let profile = AdaptiveProfile::new(at(1, 1));
        let generator = PromptGenerator::default();

        let stranger = RelationshipState::new("u1", at(1, 1));
        assert!(!generator.generate(&stranger, &profile, &[episode.clone()]).contains("episodes you remember"));

        let prompt = generator.generate(&familiar_state(), &profile, &[episode]);
        let expected = format!("- [03/07] Topics: work, health / Shared: {} / Emotion: anxiety", "x".repeat(50));
        assert!(prompt.contains(&expected), "{prompt}");
    }

    #[test]
    fn unimportant_episodes_are_skipped() {
        let low = Episode::new("u1", "s", 0.45, 0.6, at(3, 7)).with_emotion("calm");
        let prompt = PromptGenerator::default().generate(&familiar_state(), &AdaptiveProfile::new(at(1, 1)), &[low]);
        assert!(!prompt.contains("episodes you remember"));
    }

    #[test]
    fn at_most_three_episodes() {
        let eps: Vec<Episode> = (1..=5)
            .map(|d| Episode::new("u1", "s", 0.9, 0.5, at(4, d)).with_emotion("hope"))
            .collect();
        let prompt = PromptGenerator::default().generate(&familiar_state(), &AdaptiveProfile::new(at(1, 1)), &eps);
        assert_eq!(prompt.matches("Emotion: hope").count(), 3);
    }

    #[test]
    fn crisis_addendum_lists_resources() {
        let text = PromptGenerator::default().crisis_addendum();
        assert!(text.contains("  - Inochi no Denwa: 0570-783-556"));
        assert!(text.contains("  - Yorisoi Hotline: 0120-279-338"));
        assert!(!text.contains("{resources}"));

        let custom = PromptGenerator::new(PromptConfig {
            crisis_resources: vec!["988 Lifeline".into()],
            ..PromptConfig::default()
        });
        assert!(custom.crisis_addendum().contains("  - 988 Lifeline"));
    }

    #[test]
    fn context_addendum_format() {
        let context = TurnContext {
            emotion: "sadness".into(),
            intensity: 0.8,
            topics: vec!["work".into()],
            user_name: Some("Sam".into()),
        };
        let text = PromptGenerator::default().context_addendum(&context, at(5, 2));
        assert_eq!(
            text,
            "---\nCurrent time: 2025-05-02 12:00\nUser: Sam\nEmotion: sadness (intensity: 8/10)\nTopics: work"
        );
    }

    #[test]
    fn render_template_replaces_all() {
        assert_eq!(render_template("{a}-{b}-{a}", &[("a", "1"), ("b", "2")]), "1-2-1");
    }
}
