//! Phase manager: trust scores and the relationship phase.
//!
//! A pure state transition: one call per interaction updates the three
//! scores and recomputes the phase from them. The phase is never stored
//! independently of the scores that justify it:
//!
//! ```text
//! effective = total_interactions × (0.5 + 0.5 × trust)
//! phase     = highest p where effective ≥ threshold(p)   {0, 6, 21, 51}
//! ```

use chrono::{DateTime, Utc};

use crate::decay;
use crate::episodes::keywords;
use crate::memory::{PhaseTransition, RelationshipState};
use crate::types::{RelationshipPhase, TransitionTrigger, char_len, clamp_unit};

/// Words that mark an emotionally charged message (openness bonus).
const EMOTIONAL_KEYWORDS: &[&str] = &[
    "happy", "sad", "hurt", "painful", "anxious", "angry", "lonely", "hate", "love",
    "scared", "afraid", "worried",
];

/// Inputs to one phase update, derived from a single interaction.
#[derive(Debug, Clone, Copy)]
pub struct PhaseSignals<'a> {
    /// The user's message.
    pub message: &'a str,
    /// Emotion intensity (0.0 to 1.0).
    pub emotion_intensity: f32,
    /// Whether the user disclosed personal facts this turn.
    pub has_personal_disclosure: bool,
}

/// Progress toward the next phase.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct PhaseProgress {
    /// Current phase.
    pub current_phase: RelationshipPhase,
    /// Next phase, `None` once trusted.
    pub next_phase: Option<RelationshipPhase>,
    /// Fraction of the way from the current to the next threshold.
    pub progress: f32,
    /// Approximate interactions still needed at the current trust level.
    pub interactions_to_next: u64,
}

/// Apply one interaction to `state`.
///
/// Decay is measured from the *previous* `last_interaction_at`, so the first
/// interaction of a fresh record never decays. Returns the recorded
/// transition when the phase changed; the same transition has already been
/// appended to `state.phase_history`.
pub fn update(
    state: &mut RelationshipState,
    signals: PhaseSignals<'_>,
    now: DateTime<Utc>,
) -> Option<PhaseTransition> {
    let previous_interaction = state.last_interaction_at;
    state.total_interactions += 1;
    state.last_interaction_at = now;

    state.trust_score = next_trust(state.trust_score, signals, previous_interaction, now);
    state.openness_score = next_openness(state.openness_score, signals);
    state.rapport_score = next_rapport(
        state.rapport_score,
        state.trust_score,
        state.openness_score,
        state.total_interactions,
    );

    let old_phase = state.phase;
    let new_phase = calculate_phase(state.total_interactions, state.trust_score);
    if new_phase == old_phase {
        return None;
    }

    let trigger = if new_phase > old_phase {
        TransitionTrigger::InteractionMilestone
    } else {
        TransitionTrigger::TrustDecay
    };
    let transition = PhaseTransition {
        from_phase: old_phase,
        to_phase: new_phase,
        transitioned_at: now,
        interaction_count: state.total_interactions,
        trigger,
    };
    state.phase = new_phase;
    state.phase_history.push(transition.clone());
    Some(transition)
}

fn next_trust(
    current: f32,
    signals: PhaseSignals<'_>,
    previous_interaction: DateTime<Utc>,
    now: DateTime<Utc>,
) -> f32 {
    let mut score = current;
    if signals.has_personal_disclosure {
        score += 0.02;
    }
    if signals.emotion_intensity > 0.7 {
        score += 0.01;
    }
    if char_len(signals.message) > 200 {
        score += 0.005;
    }
    // Baseline accrual for showing up at all.
    score += 0.005;
    score -= decay::trust_decay(previous_interaction, now);
    clamp_unit(score)
}

fn next_openness(current: f32, signals: PhaseSignals<'_>) -> f32 {
    let mut score = current;
    let len = char_len(signals.message);
    if signals.has_personal_disclosure {
        score += 0.05;
    }
    if len > 300 {
        score += 0.02;
    } else if len > 150 {
        score += 0.01;
    }
    if contains_emotional_keyword(signals.message) {
        score += 0.01;
    }
    if !signals.has_personal_disclosure && len < 50 {
        score -= 0.005;
    }
    clamp_unit(score)
}

fn next_rapport(current: f32, trust: f32, openness: f32, interactions: u64) -> f32 {
    let interaction_bonus = (interactions as f32 / 100.0).min(0.2);
    let target = trust * 0.4 + openness * 0.4 + interaction_bonus;
    clamp_unit(current * 0.7 + target * 0.3)
}

fn contains_emotional_keyword(message: &str) -> bool {
    keywords::contains_any(message, EMOTIONAL_KEYWORDS)
}

/// Trust-weighted interaction count used to gate phases.
#[must_use]
pub fn effective_count(total_interactions: u64, trust: f32) -> f32 {
    total_interactions as f32 * (0.5 + clamp_unit(trust) * 0.5)
}

/// The highest phase whose threshold the effective count meets.
#[must_use]
pub fn calculate_phase(total_interactions: u64, trust: f32) -> RelationshipPhase {
    let effective = effective_count(total_interactions, trust);
    RelationshipPhase::ALL
        .into_iter()
        .rev()
        .find(|phase| effective >= phase.threshold())
        .unwrap_or(RelationshipPhase::Stranger)
}

/// Fixed human-readable description of a phase.
#[must_use]
pub fn phase_description(phase: RelationshipPhase) -> &'static str {
    match phase {
        RelationshipPhase::Stranger => {
            "First meetings. Be polite and exploratory, and get to know the user a little at a time."
        }
        RelationshipPhase::Acquaintance => {
            "Acquaintances. Past conversations can be referenced and the tone can relax slightly."
        }
        RelationshipPhase::Familiar => {
            "A close relationship. The user is well known and important episodes are remembered."
        }
        RelationshipPhase::Trusted => {
            "Established trust. Support can draw on deep understanding and a long-term view."
        }
    }
}

/// How far the relationship has come toward the next phase.
#[must_use]
pub fn phase_progress(state: &RelationshipState) -> PhaseProgress {
    let current = state.phase;
    let Some(next) = current.next() else {
        return PhaseProgress {
            current_phase: current,
            next_phase: None,
            progress: 1.0,
            interactions_to_next: 0,
        };
    };

    let effective = effective_count(state.total_interactions, state.trust_score);
    let floor = current.threshold();
    let ceiling = next.threshold();
    let progress = clamp_unit((effective - floor) / (ceiling - floor));

    let rate = 0.5 + clamp_unit(state.trust_score) * 0.5;
    let remaining = ((ceiling - effective) / rate).max(0.0);

    PhaseProgress {
        current_phase: current,
        next_phase: Some(next),
        progress,
        interactions_to_next: remaining as u64,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn neutral(message: &str) -> PhaseSignals<'_> {
        PhaseSignals {
            message,
            emotion_intensity: 0.5,
            has_personal_disclosure: false,
        }
    }

    #[test]
    fn twelve_neutral_interactions_reach_acquaintance() {
        let now = Utc::now();
        let mut state = RelationshipState::new("u1", now);
        for _ in 0..5 {
            update(&mut state, neutral("a test message"), now);
        }
        assert_eq!(state.phase, RelationshipPhase::Stranger);
        assert_eq!(state.total_interactions, 5);

        for _ in 0..7 {
            update(&mut state, neutral("a test message"), now);
        }
        assert_eq!(state.phase, RelationshipPhase::Acquaintance);
        assert_eq!(state.phase_history.len(), 1);
        let transition = &state.phase_history[0];
        assert_eq!(transition.from_phase, RelationshipPhase::Stranger);
        assert_eq!(transition.to_phase, RelationshipPhase::Acquaintance);
        assert_eq!(transition.trigger, TransitionTrigger::InteractionMilestone);
        assert_eq!(transition.interaction_count, 12);
    }

    #[test]
    fn disclosure_builds_trust_and_openness() {
        let now = Utc::now();
        let mut state = RelationshipState::new("u1", now);
        for _ in 0..5 {
            update(
                &mut state,
                PhaseSignals {
                    message: "Honestly, I work at a hospital",
                    emotion_intensity: 0.8,
                    has_personal_disclosure: true,
                },
                now,
            );
        }
        // 5 × (0.02 + 0.01 + 0.005)
        assert!((state.trust_score - 0.175).abs() < 1e-4);
        assert!(state.openness_score > 0.2);
    }

    #[test]
    fn long_message_raises_openness() {
        let now = Utc::now();
        let mut state = RelationshipState::new("u1", now);
        let long = "This is a fairly long message. ".repeat(12);
        update(&mut state, neutral(&long), now);
        assert!((state.openness_score - 0.02).abs() < 1e-6);
    }

    #[test]
    fn short_undisclosed_message_lowers_openness_but_not_below_zero() {
        let now = Utc::now();
        let mut state = RelationshipState::new("u1", now);
        update(&mut state, neutral("hi"), now);
        assert_eq!(state.openness_score, 0.0);
        state.openness_score = 0.1;
        update(&mut state, neutral("hi"), now);
        assert!((state.openness_score - 0.095).abs() < 1e-6);
    }

    #[test]
    fn emotional_keyword_counts_once() {
        let now = Utc::now();
        let mut state = RelationshipState::new("u1", now);
        let msg = "I have been feeling so lonely and sad these days, it's been a while";
        update(&mut state, neutral(msg), now);
        assert!((state.openness_score - 0.01).abs() < 1e-6);
    }

    #[test]
    fn emotional_word_inside_another_word_is_ignored() {
        let now = Utc::now();
        let mut state = RelationshipState::new("u1", now);
        state.openness_score = 0.5;
        // 44 chars: short and undisclosed, "hate" only inside "whatever"
        update(&mut state, neutral("Whatever, I guess it does not matter anyway."), now);
        assert!((state.openness_score - 0.495).abs() < 1e-6);
    }

    #[test]
    fn first_interaction_never_decays() {
        let now = Utc::now();
        let mut state = RelationshipState::new("u1", now);
        update(&mut state, neutral("hello there"), now);
        assert!((state.trust_score - 0.005).abs() < 1e-6);
    }

    #[test]
    fn inactivity_decays_trust() {
        let start = Utc::now();
        let mut state = RelationshipState::new("u1", start);
        state.trust_score = 0.5;
        let later = start + Duration::days(30);
        update(&mut state, neutral("back again"), later);
        // +0.005 baseline, -0.04 for four idle weeks
        assert!((state.trust_score - 0.465).abs() < 1e-5);
        assert_eq!(state.last_interaction_at, later);
    }

    #[test]
    fn rapport_is_smoothed() {
        let now = Utc::now();
        let mut state = RelationshipState::new("u1", now);
        state.trust_score = 1.0;
        state.openness_score = 1.0;
        state.total_interactions = 99;
        update(&mut state, neutral("hello again, friend"), now);
        // target ≈ 0.4 + 0.4 + 0.2 → roughly 0.3 after one step
        assert!((state.rapport_score - 0.3).abs() < 1e-3);
    }

    #[test]
    fn phase_thresholds() {
        assert_eq!(calculate_phase(0, 0.0), RelationshipPhase::Stranger);
        assert_eq!(calculate_phase(11, 0.0), RelationshipPhase::Stranger);
        assert_eq!(calculate_phase(12, 0.0), RelationshipPhase::Acquaintance);
        assert_eq!(calculate_phase(21, 1.0), RelationshipPhase::Familiar);
        assert_eq!(calculate_phase(102, 0.0), RelationshipPhase::Trusted);
        assert_eq!(calculate_phase(51, 1.0), RelationshipPhase::Trusted);
    }

    #[test]
    fn regression_is_recorded_as_trust_decay() {
        let start = Utc::now();
        let mut state = RelationshipState::new("u1", start);
        state.total_interactions = 40;
        state.trust_score = 0.1;
        state.phase = RelationshipPhase::Familiar;
        // 41 × (0.5 + 0.5 × 0.005) ≈ 20.6 < 21 after the trust collapses
        let transition = update(&mut state, neutral("long time no see"), start + Duration::days(400))
            .expect("phase should change");
        assert_eq!(transition.trigger, TransitionTrigger::TrustDecay);
        assert_eq!(state.phase, RelationshipPhase::Acquaintance);
    }

    #[test]
    fn progress_reports_next_phase() {
        let mut state = RelationshipState::new("u1", Utc::now());
        state.total_interactions = 3;
        state.trust_score = 0.1;
        let progress = phase_progress(&state);
        assert_eq!(progress.current_phase, RelationshipPhase::Stranger);
        assert_eq!(progress.next_phase, Some(RelationshipPhase::Acquaintance));
        assert!((0.0..=1.0).contains(&progress.progress));
        assert!(progress.interactions_to_next > 0);
    }

    #[test]
    fn trusted_has_no_next_phase() {
        let mut state = RelationshipState::new("u1", Utc::now());
        state.phase = RelationshipPhase::Trusted;
        state.total_interactions = 100;
        let progress = phase_progress(&state);
        assert_eq!(progress.next_phase, None);
        assert_eq!(progress.progress, 1.0);
        assert_eq!(progress.interactions_to_next, 0);
    }

    #[test]
    fn every_phase_has_a_description() {
        for phase in RelationshipPhase::ALL {
            assert!(!phase_description(phase).is_empty());
        }
    }
}
