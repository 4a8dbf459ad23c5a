//! Shared classification rule set: the on-screen UI vocabulary is
//! the same regardless of which scenario is running, so URA and Unity Cup
//! both register this rule set under their own scenario key rather than
//! each defining their own screen markers.

use crate::classifier::{ClassRule, ClassifierRules, ScreenLabel};

fn rule(class_label: &str, primary: f32, relaxed: f32) -> ClassRule {
    ClassRule {
        class_label: class_label.to_string(),
        primary_threshold: primary,
        relaxed_threshold: relaxed,
    }
}

/// Priority order matters: earlier entries win when more than one class
/// label clears its threshold in the same frame (e.g. a race-day banner
/// lingering behind a freshly opened event dialog).
pub fn default_rules() -> ClassifierRules {
    ClassifierRules {
        priority: vec![
            (ScreenLabel::Event, rule("event_dialog_marker", 0.8, 0.55)),
            (ScreenLabel::Raceday, rule("race_day_banner", 0.8, 0.55)),
            (ScreenLabel::Skills, rule("skills_screen_marker", 0.8, 0.55)),
            (ScreenLabel::Training, rule("training_screen_marker", 0.8, 0.55)),
            (ScreenLabel::Inspiration, rule("inspiration_marker", 0.8, 0.55)),
            (ScreenLabel::KashimotoTeam, rule("kashimoto_team_marker", 0.8, 0.55)),
            (ScreenLabel::ClawGame, rule("claw_game_marker", 0.8, 0.55)),
            (ScreenLabel::Lobby, rule("lobby_marker", 0.8, 0.55)),
        ],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::Classifier;
    use crate::model::{BBox, Detection};

    fn bbox() -> BBox {
        BBox { x: 0, y: 0, width: 10, height: 10 }
    }

    #[test]
    fn lobby_marker_resolves_to_lobby() {
        let mut classifier = Classifier::new(3);
        classifier.register("ura", default_rules());
        let detections = vec![Detection::new("lobby_marker", bbox(), 0.9)];
        assert_eq!(classifier.classify("ura", &detections), ScreenLabel::Lobby);
    }

    #[test]
    fn event_dialog_outranks_a_lingering_lobby_marker() {
        let mut classifier = Classifier::new(3);
        classifier.register("ura", default_rules());
        let detections = vec![
            Detection::new("lobby_marker", bbox(), 0.9),
            Detection::new("event_dialog_marker", bbox(), 0.9),
        ];
        assert_eq!(classifier.classify("ura", &detections), ScreenLabel::Event);
    }
}
