//! Adaptive profile manager: learning how a user likes to talk.
//!
//! Every interaction nudges the profile by small fixed steps. No single
//! message moves a preference far, and [`AdaptiveProfile::confidence_score`]
//! grows with the amount of evidence so the prompt generator can ignore a
//! profile that is still mostly defaults.

use chrono::{DateTime, Utc};

use crate::decay;
use crate::episodes::keywords::{matches_any, tokenize};
use crate::memory::{AdaptiveProfile, TopicAffinity};
use crate::types::{DepthLevel, ToneLevel, char_len, clamp_unit};

/// Topic label → words that imply it.
const TOPIC_KEYWORDS: &[(&str, &[&str])] = &[
    ("work", &["work", "job", "jobs", "office", "boss", "coworker", "coworkers", "colleague", "colleagues", "career", "overtime"]),
    ("romance", &["dating", "boyfriend", "girlfriend", "partner", "crush", "breakup", "marriage"]),
    ("family", &["family", "parent", "parents", "father", "mother", "brother", "sister", "kids", "childcare"]),
    ("friendships", &["friend", "friends", "friendship", "social life", "classmates"]),
    ("health", &["health", "sick", "illness", "hospital", "doctor", "therapy", "insomnia", "sleep"]),
    ("money", &["money", "salary", "savings", "debt", "invest", "budget", "rent"]),
    ("future", &["future", "dream", "dreams", "goal", "goals", "plans", "life plan"]),
    ("hobbies", &["hobby", "hobbies", "game", "games", "music", "movie", "movies", "travel", "sport", "sports", "reading"]),
    ("school", &["study", "school", "university", "college", "exam", "exams", "grades", "homework"]),
    ("stress", &["stress", "pressure", "anxious", "worried", "exhausted", "tired"]),
    ("self_esteem", &["confidence", "self-esteem", "worthless", "self-worth", "be myself"]),
];

/// Emotions counted toward a warm tone.
const NEGATIVE_EMOTIONS: &[&str] = &[
    "sadness", "anxiety", "anger", "loneliness", "depression", "stress", "confusion",
];

/// Emotions counted toward a casual tone.
const POSITIVE_EMOTIONS: &[&str] = &["happiness", "hope"];

/// Phrasing that suggests the user wants to be asked questions back.
const QUESTION_PHRASES: &[&str] = &["why", "how come", "how do i", "how should i", "what should i"];

const STYLE_STEP: f32 = 0.02;
const EXPLICIT_TOPIC_START: f32 = 0.2;
const EXPLICIT_TOPIC_STEP: f32 = 0.05;
const DETECTED_TOPIC_START: f32 = 0.1;
const DETECTED_TOPIC_STEP: f32 = 0.02;

/// Apply one interaction to `profile`.
pub fn update_profile(
    profile: &mut AdaptiveProfile,
    message: &str,
    topics: &[String],
    emotion: &str,
    intensity: f32,
    now: DateTime<Utc>,
) {
    update_topics(profile, message, topics, now);
    *profile
        .emotional_pattern_counts
        .entry(emotion.to_string())
        .or_insert(0) += 1;
    learn_style(profile, message, emotion, intensity);
    adjust_tone_and_depth(profile);
    profile.confidence_score = confidence(profile);
    profile.last_updated_at = now;
}

fn update_topics(profile: &mut AdaptiveProfile, message: &str, topics: &[String], now: DateTime<Utc>) {
    for topic in topics {
        profile
            .topic_affinities
            .entry(topic.clone())
            .and_modify(|a| {
                a.mention_count += 1;
                a.last_mentioned_at = Some(now);
                a.affinity_score = clamp_unit(a.affinity_score + EXPLICIT_TOPIC_STEP);
            })
            .or_insert_with(|| TopicAffinity::first_mention(topic.clone(), EXPLICIT_TOPIC_START, now));
    }

    for topic in detect_topics(message) {
        if topics.iter().any(|t| t == topic) {
            continue;
        }
        profile
            .topic_affinities
            .entry(topic.to_string())
            .and_modify(|a| {
                a.mention_count += 1;
                a.affinity_score = clamp_unit(a.affinity_score + DETECTED_TOPIC_STEP);
            })
            .or_insert_with(|| TopicAffinity::first_mention(topic, DETECTED_TOPIC_START, now));
    }

    decay::decay_topic_affinities(profile.topic_affinities.values_mut(), now);
}

/// Topic labels implied by whole words in `message`, in table order.
#[must_use]
pub fn detect_topics(message: &str) -> Vec<&'static str> {
    let tokens = tokenize(message);
    TOPIC_KEYWORDS
        .iter()
        .filter(|(_, words)| matches_any(&tokens, words))
        .map(|(topic, _)| *topic)
        .collect()
}

fn learn_style(profile: &mut AdaptiveProfile, message: &str, emotion: &str, intensity: f32) {
    let len = char_len(message);
    if len > 300 {
        profile.likes_detail = clamp_unit(profile.likes_detail + STYLE_STEP);
    } else if len < 50 {
        profile.likes_detail = clamp_unit(profile.likes_detail - STYLE_STEP);
    }

    // A question usually asks for advice.
    if message.contains('?') || message.contains('？') {
        profile.likes_advice = clamp_unit(profile.likes_advice + STYLE_STEP * 0.5);
    }

    if NEGATIVE_EMOTIONS.contains(&emotion) || intensity > 0.6 {
        profile.likes_empathy = clamp_unit(profile.likes_empathy + STYLE_STEP);
    }

    if matches_any(&tokenize(message), QUESTION_PHRASES) {
        profile.likes_questions = clamp_unit(profile.likes_questions + STYLE_STEP);
    }
}

fn adjust_tone_and_depth(profile: &mut AdaptiveProfile) {
    let count_of = |set: &[&str]| -> u32 {
        set.iter()
            .filter_map(|e| profile.emotional_pattern_counts.get(*e))
            .sum()
    };
    let negative = count_of(NEGATIVE_EMOTIONS);
    let positive = count_of(POSITIVE_EMOTIONS);
    let total = profile.emotion_samples().max(1);
    let negative_ratio = negative as f32 / total as f32;

    profile.preferred_tone = if negative_ratio > 0.6 {
        ToneLevel::Warm
    } else if negative_ratio < 0.3 && positive > negative {
        ToneLevel::Casual
    } else {
        ToneLevel::Balanced
    };

    profile.preferred_depth = if profile.likes_detail > 0.7 {
        DepthLevel::Deep
    } else if profile.likes_detail < 0.3 {
        DepthLevel::Shallow
    } else {
        DepthLevel::Medium
    };
}

fn confidence(profile: &AdaptiveProfile) -> f32 {
    let topics = profile.topic_affinities.len() as f32;
    let samples = profile.emotion_samples() as f32;
    clamp_unit(topics * 0.05 + samples * 0.01)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn explicit_topics_start_and_grow() {
        let now = Utc::now();
        let mut profile = AdaptiveProfile::new(now);
        let topics = vec!["art".to_string()];
        update_profile(&mut profile, "Painted all afternoon", &topics, "happiness", 0.4, now);
        let art = &profile.topic_affinities["art"];
        assert!((art.affinity_score - 0.2).abs() < 1e-6);
        assert_eq!(art.mention_count, 1);

        update_profile(&mut profile, "Painted again", &topics, "happiness", 0.4, now);
        let art = &profile.topic_affinities["art"];
        assert!((art.affinity_score - 0.25).abs() < 1e-6);
        assert_eq!(art.mention_count, 2);
    }

    #[test]
    fn keywords_detect_implicit_topics() {
        let now = Utc::now();
        let mut profile = AdaptiveProfile::new(now);
        update_profile(&mut profile, "My boss keeps piling on overtime", &[], "anger", 0.5, now);
        let work = &profile.topic_affinities["work"];
        assert!((work.affinity_score - 0.1).abs() < 1e-6);

        update_profile(&mut profile, "The office was quiet", &[], "neutral", 0.2, now);
        let work = &profile.topic_affinities["work"];
        assert!((work.affinity_score - 0.12).abs() < 1e-6);
        assert_eq!(work.mention_count, 2);
    }

    #[test]
    fn topics_need_whole_words() {
        assert!(detect_topics("I feel different about my current situation").is_empty());
        assert!(detect_topics("For example, the network was down").is_empty());
        assert_eq!(detect_topics("My parents want me to find a job"), vec!["work", "family"]);
        assert_eq!(detect_topics("Low self-esteem lately"), vec!["self_esteem"]);
    }

    #[test]
    fn word_fragments_leave_profile_untouched() {
        let now = Utc::now();
        let mut profile = AdaptiveProfile::new(now);
        update_profile(&mut profile, "Somehow the network is different", &[], "neutral", 0.2, now);
        assert!(profile.topic_affinities.is_empty());
        assert!((profile.likes_questions - 0.5).abs() < 1e-6);
        assert!((profile.confidence_score - 0.01).abs() < 1e-6);
    }

    #[test]
    fn explicit_topic_is_not_double_counted() {
        let now = Utc::now();
        let mut profile = AdaptiveProfile::new(now);
        update_profile(&mut profile, "Work is hard", &["work".to_string()], "stress", 0.5, now);
        assert_eq!(profile.topic_affinities["work"].mention_count, 1);
    }

    #[test]
    fn stale_topics_decay() {
        let start = Utc::now();
        let mut profile = AdaptiveProfile::new(start);
        update_profile(&mut profile, "Chess club tonight", &["chess".to_string()], "happiness", 0.3, start);
        let later = start + Duration::days(45);
        update_profile(&mut profile, "Nothing much", &[], "neutral", 0.1, later);
        assert!((profile.topic_affinities["chess"].affinity_score - 0.19).abs() < 1e-6);
    }

    #[test]
    fn style_signals_nudge_preferences() {
        let now = Utc::now();
        let mut profile = AdaptiveProfile::new(now);
        update_profile(&mut profile, "Why does this keep happening to me?", &[], "sadness", 0.3, now);
        assert!((profile.likes_advice - 0.51).abs() < 1e-6);
        assert!((profile.likes_empathy - 0.72).abs() < 1e-6);
        assert!((profile.likes_questions - 0.52).abs() < 1e-6);
        assert!((profile.likes_detail - 0.48).abs() < 1e-6);
    }

    #[test]
    fn negative_history_makes_tone_warm() {
        let now = Utc::now();
        let mut profile = AdaptiveProfile::new(now);
        for _ in 0..4 {
            update_profile(&mut profile, "Everything feels heavy lately", &[], "sadness", 0.5, now);
        }
        assert_eq!(profile.preferred_tone, ToneLevel::Warm);
    }

    #[test]
    fn positive_history_makes_tone_casual() {
        let now = Utc::now();
        let mut profile = AdaptiveProfile::new(now);
        for _ in 0..3 {
            update_profile(&mut profile, "Had a great day", &[], "happiness", 0.5, now);
        }
        assert_eq!(profile.preferred_tone, ToneLevel::Casual);
    }

    #[test]
    fn short_messages_make_depth_shallow() {
        let now = Utc::now();
        let mut profile = AdaptiveProfile::new(now);
        for _ in 0..11 {
            update_profile(&mut profile, "ok", &[], "neutral", 0.1, now);
        }
        assert_eq!(profile.preferred_depth, DepthLevel::Shallow);
    }

    #[test]
    fn confidence_tracks_evidence() {
        let now = Utc::now();
        let mut profile = AdaptiveProfile::new(now);
        let topics = vec!["a".to_string(), "b".to_string()];
        update_profile(&mut profile, "Nothing special", &topics, "neutral", 0.1, now);
        // 2 topics × 0.05 + 1 sample × 0.01
        assert!((profile.confidence_score - 0.11).abs() < 1e-6);
    }
}
