//! Result formatting for the status label
//!
//! Both request outcomes of a cycle are formatted together. The detect
//! formatter receives the info formatter's top label as an argument, so the
//! result never depends on which request finished first.

use animal_lens_types::{Observation, RequestOutcome};

/// Shown while a cycle is in flight
pub const CLASSIFYING: &str = "Classifying...";
/// Shown when a classifier returns no observations
pub const NOTHING_RECOGNIZED: &str = "Nothing recognized.";
/// Replaces the whole message when the detect model is sure there is no animal
pub const CANNOT_DETECT_ANIMAL: &str = "Model cannot\ndetect animal\nin this image";
/// Prefix of the message shown when a request reports an error
pub const UNABLE_TO_CLASSIFY: &str = "Unable to classify image.";

/// Header line above the info listing
const INFO_HEADER: &str = "Info:";

/// Tunables for the detect override and listing length
#[derive(Debug, Clone, PartialEq)]
pub struct FormatRules {
    pub max_results: usize,
    pub non_animal_label: String,
    pub non_animal_threshold: f32,
}

impl Default for FormatRules {
    fn default() -> Self {
        Self {
            max_results: 6,
            non_animal_label: "Animals".to_string(),
            non_animal_threshold: 0.99,
        }
    }
}

/// Info classifier output ready for display
#[derive(Debug, Clone, PartialEq)]
pub struct InfoSummary {
    pub message: String,
    /// Highest-confidence label, absent when the request produced nothing usable
    pub top_label: Option<String>,
}

/// First `max` observations in the order given
pub fn top_observations(observations: &[Observation], max: usize) -> &[Observation] {
    &observations[..observations.len().min(max)]
}

/// `"identifier: NN%"`
pub fn format_line(observation: &Observation) -> String {
    format!("{}: {}%", observation.identifier, observation.percent())
}

/// One line per observation, in the order given
pub fn format_listing(observations: &[Observation]) -> Vec<String> {
    observations.iter().map(format_line).collect()
}

/// Identifier with strictly the highest confidence; ties go to the first one seen.
///
/// Only confidences above zero can win, so an all-zero set has no top label.
pub fn top_label(observations: &[Observation]) -> Option<&str> {
    let mut best: Option<&Observation> = None;
    let mut best_confidence = 0.0;
    for observation in observations {
        if observation.confidence > best_confidence {
            best_confidence = observation.confidence;
            best = Some(observation);
        }
    }
    best.map(|o| o.identifier.as_str())
}

/// Message for a request that reported an error
pub fn error_message(description: &str) -> String {
    format!("{UNABLE_TO_CLASSIFY}\n{description}")
}

/// Whether any observation is the non-animal category at or above threshold
pub fn is_non_animal(observations: &[Observation], rules: &FormatRules) -> bool {
    observations.iter().any(|o| {
        o.identifier == rules.non_animal_label && o.confidence >= rules.non_animal_threshold
    })
}

pub fn format_info(outcome: &RequestOutcome, rules: &FormatRules) -> InfoSummary {
    match outcome {
        RequestOutcome::Failed { description } => InfoSummary {
            message: error_message(description),
            top_label: None,
        },
        RequestOutcome::Observations { observations } if observations.is_empty() => InfoSummary {
            message: NOTHING_RECOGNIZED.to_string(),
            top_label: None,
        },
        RequestOutcome::Observations { observations } => {
            let top = top_observations(observations, rules.max_results);
            let mut lines = vec![INFO_HEADER.to_string()];
            lines.extend(format_listing(top));
            InfoSummary {
                message: lines.join("\n"),
                top_label: top_label(top).map(str::to_string),
            }
        }
    }
}

/// Final label text given the info summary and the detect outcome.
pub fn format_detect(outcome: &RequestOutcome, info: &InfoSummary, rules: &FormatRules) -> String {
    match outcome {
        RequestOutcome::Failed { description } => error_message(description),
        RequestOutcome::Observations { observations } if observations.is_empty() => {
            NOTHING_RECOGNIZED.to_string()
        }
        RequestOutcome::Observations { observations } => {
            let top = top_observations(observations, rules.max_results);
            if is_non_animal(top, rules) {
                return CANNOT_DETECT_ANIMAL.to_string();
            }

            match info.top_label {
                Some(ref label) => format!("{}\nResult: {}", info.message, label),
                None => info.message.clone(),
            }
        }
    }
}

/// Label text for a whole cycle
pub fn compose_message(info: &RequestOutcome, detect: &RequestOutcome, rules: &FormatRules) -> String {
    let summary = format_info(info, rules);
    format_detect(detect, &summary, rules)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn obs(pairs: &[(&str, f32)]) -> Vec<Observation> {
        pairs.iter().map(|(id, c)| Observation::new(*id, *c)).collect()
    }

    fn six() -> Vec<Observation> {
        obs(&[
            ("Dog", 0.62),
            ("Wolf", 0.20),
            ("Fox", 0.081),
            ("Cat", 0.049),
            ("Bear", 0.03),
            ("Lion", 0.02),
        ])
    }

    #[test]
    fn test_listing_one_line_per_pair_in_order() {
        let lines = format_listing(&six());
        assert_eq!(
            lines,
            vec!["Dog: 62%", "Wolf: 20%", "Fox: 8%", "Cat: 5%", "Bear: 3%", "Lion: 2%"]
        );
    }

    #[test]
    fn test_listing_keeps_given_order_even_if_unsorted() {
        let lines = format_listing(&obs(&[("Cat", 0.1), ("Dog", 0.9)]));
        assert_eq!(lines, vec!["Cat: 10%", "Dog: 90%"]);
    }

    #[test]
    fn test_top_label_strict_max_first_on_ties() {
        assert_eq!(top_label(&six()), Some("Dog"));
        assert_eq!(
            top_label(&obs(&[("Cat", 0.4), ("Dog", 0.4), ("Fox", 0.2)])),
            Some("Cat")
        );
        assert_eq!(
            top_label(&obs(&[("Cat", 0.1), ("Dog", 0.5), ("Fox", 0.5)])),
            Some("Dog")
        );
        assert_eq!(top_label(&[]), None);
    }

    #[test]
    fn test_top_label_needs_positive_confidence() {
        assert_eq!(top_label(&obs(&[("Cat", 0.0), ("Dog", 0.0)])), None);
        assert_eq!(top_label(&obs(&[("Cat", 0.0), ("Dog", 0.01)])), Some("Dog"));
    }

    #[test]
    fn test_all_zero_info_omits_result_line() {
        let message = compose_message(
            &RequestOutcome::observations(obs(&[("Cat", 0.0), ("Dog", 0.0)])),
            &RequestOutcome::observations(obs(&[("Dogs", 0.7)])),
            &FormatRules::default(),
        );
        assert_eq!(message, "Info:\nCat: 0%\nDog: 0%");
    }

    #[test]
    fn test_info_uses_only_top_six() {
        let mut observations = six();
        observations.push(Observation::new("Zebra", 0.99));

        let summary = format_info(&RequestOutcome::observations(observations), &FormatRules::default());
        assert!(!summary.message.contains("Zebra"));
        assert_eq!(summary.message.lines().count(), 7);
        assert_eq!(summary.top_label.as_deref(), Some("Dog"));
    }

    #[test]
    fn test_info_message_has_header() {
        let summary = format_info(
            &RequestOutcome::observations(obs(&[("Dog", 0.97)])),
            &FormatRules::default(),
        );
        assert_eq!(summary.message, "Info:\nDog: 97%");
    }

    #[test]
    fn test_compose_appends_result_line() {
        let message = compose_message(
            &RequestOutcome::observations(six()),
            &RequestOutcome::observations(obs(&[("Dogs", 0.8), ("Animals", 0.2)])),
            &FormatRules::default(),
        );
        assert!(message.starts_with("Info:\nDog: 62%"));
        assert!(message.ends_with("\nResult: Dog"));
    }

    #[test]
    fn test_non_animal_override_replaces_everything() {
        let message = compose_message(
            &RequestOutcome::observations(six()),
            &RequestOutcome::observations(obs(&[("Animals", 0.995), ("Dogs", 0.005)])),
            &FormatRules::default(),
        );
        assert_eq!(message, CANNOT_DETECT_ANIMAL);
    }

    #[test]
    fn test_non_animal_threshold_is_inclusive() {
        let rules = FormatRules::default();
        assert!(is_non_animal(&obs(&[("Animals", 0.99)]), &rules));
        assert!(!is_non_animal(&obs(&[("Animals", 0.989)]), &rules));
        assert!(!is_non_animal(&obs(&[("Dogs", 1.0)]), &rules));
    }

    #[test]
    fn test_non_animal_below_threshold_keeps_result() {
        let message = compose_message(
            &RequestOutcome::observations(six()),
            &RequestOutcome::observations(obs(&[("Animals", 0.7), ("Dogs", 0.3)])),
            &FormatRules::default(),
        );
        assert!(message.ends_with("Result: Dog"));
    }

    #[test]
    fn test_empty_results_say_nothing_recognized() {
        let rules = FormatRules::default();
        let empty = RequestOutcome::observations(Vec::new());

        assert_eq!(
            compose_message(&RequestOutcome::observations(six()), &empty, &rules),
            NOTHING_RECOGNIZED
        );
        assert_eq!(format_info(&empty, &rules).message, NOTHING_RECOGNIZED);
    }

    #[test]
    fn test_error_outcome_embeds_description() {
        let rules = FormatRules::default();
        let failed = RequestOutcome::failed("model output shape mismatch");

        let message = compose_message(&RequestOutcome::observations(six()), &failed, &rules);
        assert_eq!(message, "Unable to classify image.\nmodel output shape mismatch");

        let summary = format_info(&failed, &rules);
        assert!(summary.message.contains("model output shape mismatch"));
        assert!(summary.top_label.is_none());
    }

    #[test]
    fn test_failed_info_omits_result_line() {
        let message = compose_message(
            &RequestOutcome::failed("no tensor"),
            &RequestOutcome::observations(obs(&[("Dogs", 0.9)])),
            &FormatRules::default(),
        );
        assert_eq!(message, "Unable to classify image.\nno tensor");
    }

    #[test]
    fn test_custom_rules() {
        let rules = FormatRules {
            max_results: 2,
            non_animal_label: "background".to_string(),
            non_animal_threshold: 0.5,
        };
        let summary = format_info(&RequestOutcome::observations(six()), &rules);
        assert_eq!(summary.message, "Info:\nDog: 62%\nWolf: 20%");

        let detect = RequestOutcome::observations(obs(&[("background", 0.6)]));
        assert_eq!(format_detect(&detect, &summary, &rules), CANNOT_DETECT_ANIMAL);
    }
}
