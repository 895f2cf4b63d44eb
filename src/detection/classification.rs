// Copyright (c) 2026 bad-antics
// Licensed under the MIT License. See LICENSE file in the project root.
// https://github.com/bad-antics/glowbarn-rs

//! Prohibited-object classification of raw detections

use serde::Serialize;
use std::collections::BTreeMap;

use super::Detection;
use crate::config::ProhibitedClass;

/// Class ids that must not appear during an exam, with their display names
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ProhibitedClasses {
    classes: BTreeMap<u32, String>,
}

impl ProhibitedClasses {
    pub fn from_config(entries: &[ProhibitedClass]) -> Self {
        Self {
            classes: entries
                .iter()
                .map(|entry| (entry.class_id, entry.name.clone()))
                .collect(),
        }
    }

    pub fn display_name(&self, class_id: u32) -> Option<&str> {
        self.classes.get(&class_id).map(String::as_str)
    }
}

/// Detections of one frame that passed the confidence threshold
#[derive(Debug, Clone, Default)]
pub struct FrameAnalysis {
    /// Kept detections in detector order
    pub detections: Vec<Detection>,
    /// Kept detections of the person class
    pub person_count: usize,
}

impl FrameAnalysis {
    /// Prohibited subset, detector order preserved
    pub fn prohibited(&self) -> Vec<Detection> {
        self.detections.iter().filter(|d| d.prohibited).cloned().collect()
    }

    pub fn has_prohibited(&self) -> bool {
        self.detections.iter().any(|d| d.prohibited)
    }
}

/// Drop detections below `threshold` and flag the prohibited ones.
///
/// A confidence equal to the threshold passes. Prohibited detections carry
/// the configured display name as their label.
pub fn analyze(
    raw: Vec<Detection>,
    threshold: f64,
    prohibited: &ProhibitedClasses,
    person_class: Option<u32>,
) -> FrameAnalysis {
    let mut analysis = FrameAnalysis::default();

    for mut detection in raw {
        if detection.confidence < threshold {
            continue;
        }

        if Some(detection.class_id) == person_class {
            analysis.person_count += 1;
        }

        if let Some(name) = prohibited.display_name(detection.class_id) {
            detection.prohibited = true;
            detection.label = name.to_string();
        }

        analysis.detections.push(detection);
    }

    analysis
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detection::BoundingBox;

    fn classes() -> ProhibitedClasses {
        ProhibitedClasses::from_config(&[
            ProhibitedClass { class_id: 67, name: "Phone".into() },
            ProhibitedClass { class_id: 73, name: "Book".into() },
        ])
    }

    fn det(class_id: u32, label: &str, confidence: f64) -> Detection {
        Detection::new(class_id, label, confidence, BoundingBox { x1: 0, y1: 0, x2: 10, y2: 10 })
    }

    #[test]
    fn test_threshold_boundary_passes() {
        let analysis = analyze(vec![det(67, "cell phone", 0.45)], 0.45, &classes(), Some(0));
        assert_eq!(analysis.prohibited().len(), 1);

        let analysis = analyze(vec![det(67, "cell phone", 0.4499)], 0.45, &classes(), Some(0));
        assert!(analysis.detections.is_empty());
        assert!(!analysis.has_prohibited());
    }

    #[test]
    fn test_partition_keeps_order_and_display_names() {
        let raw = vec![
            det(73, "book", 0.8),
            det(0, "person", 0.9),
            det(56, "chair", 0.7),
            det(67, "cell phone", 0.6),
            det(0, "person", 0.2),
        ];
        let analysis = analyze(raw, 0.45, &classes(), Some(0));

        assert_eq!(analysis.detections.len(), 4);
        assert_eq!(analysis.person_count, 1);

        let prohibited = analysis.prohibited();
        let labels: Vec<_> = prohibited.iter().map(|d| d.label.as_str()).collect();
        assert_eq!(labels, vec!["Book", "Phone"]);
        assert!(prohibited.iter().all(|d| d.prohibited));
    }

    #[test]
    fn test_no_person_class_counts_nothing() {
        let analysis = analyze(vec![det(0, "person", 0.9)], 0.45, &classes(), None);
        assert_eq!(analysis.person_count, 0);
        assert_eq!(analysis.detections.len(), 1);
    }

    #[test]
    fn test_serializes_as_id_map() {
        let json = serde_json::to_value(classes()).unwrap();
        assert_eq!(json, serde_json::json!({"67": "Phone", "73": "Book"}));
    }
}
