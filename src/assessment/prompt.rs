//! Assessment prompt construction

use std::fmt::Write;

use crate::detection::DetectedElement;

/// Build the instruction block sent alongside the annotated screenshot.
///
/// The prompt pins three things the rest of the pipeline depends on: the JSON
/// key names, the rating scale, and the requirement that element entries
/// reuse the detection ids verbatim.
pub fn build_prompt(elements: &[DetectedElement]) -> String {
    let mut summary = String::new();
    for (i, element) in elements.iter().enumerate() {
        let _ = writeln!(
            summary,
            "{}. ID: {}, Class: {}, Confidence: {:.2}, Box: [x={:.0}, y={:.0}, w={:.0}, h={:.0}]",
            i + 1,
            element.id,
            element.class,
            element.confidence,
            element.bbox.x,
            element.bbox.y,
            element.bbox.width,
            element.bbox.height,
        );
    }

    format!(
        r#"You are an expert UI/UX design reviewer. Assess the attached screenshot against these UX principles:
1. Relevance and value: does the design address the user's pain points?
2. Usability and clarity: can the user easily understand this layout?

The objects detected in the image are:
---
{summary}---

Reply with JSON only. Do not add any prose outside the JSON.
- General assessment: provide three complete entries, for typography, color scheme, and visual hierarchy.
- Element assessment: provide a critique and an improvement note for every detected element, reusing the element IDs EXACTLY as listed above (e.g. Button_1).

Grade every entry with one of: Excellent, Good, Fair, Poor, Very Poor. Each value must be a single string that is complete, informative, and concise.

The JSON you must produce:
{{
    "typography": "RATING: [grade]. [Full explanation, including the reasoning and a short suggestion].",
    "color_scheme": "RATING: [grade]. [Full explanation, including the reasoning and a short suggestion].",
    "visual_hierarchy": "RATING: [grade]. [Full explanation, including the reasoning and a short suggestion].",
    "elements": [
        {{
            "id": "[element id]",
            "critique": "RATING: [grade]. [Full explanation grounded in UX principles 1 and 2].",
            "notes": "[Specific note on how to improve this element]."
        }}
    ]
}}"#
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detection::BoundingBox;

    fn element(id: &str, class: &str) -> DetectedElement {
        DetectedElement {
            id: id.to_string(),
            class: class.to_string(),
            confidence: 0.87,
            bbox: BoundingBox {
                x: 120.4,
                y: 80.6,
                width: 200.0,
                height: 48.0,
            },
        }
    }

    #[test]
    fn prompt_lists_every_element_id() {
        let prompt = build_prompt(&[element("Button_1", "Button"), element("Input_1", "Input")]);
        assert!(prompt.contains("1. ID: Button_1, Class: Button"));
        assert!(prompt.contains("2. ID: Input_1, Class: Input"));
        assert!(prompt.contains("Confidence: 0.87"));
        assert!(prompt.contains("Box: [x=120, y=81, w=200, h=48]"));
    }

    #[test]
    fn prompt_pins_the_json_contract() {
        let prompt = build_prompt(&[element("Button_1", "Button")]);
        for key in ["\"typography\"", "\"color_scheme\"", "\"visual_hierarchy\"", "\"elements\""] {
            assert!(prompt.contains(key), "missing key {key}");
        }
        assert!(prompt.contains("Excellent, Good, Fair, Poor, Very Poor"));
    }
}
