mod common;

use rayon::prelude::*;

use common::{StubMetrics, assert_close, compact_text, layout, layout_with, strip_whitespace};
use lesson_notes_pdf::layout::{LayoutConfig, LayoutContext, LayoutState};
use lesson_notes_pdf::markdown::classify;
use lesson_notes_pdf::{Document, FontMetrics, FontWeight, layout_notes};

const LESSON: &str = "\
# Photosynthesis
Plants convert **light energy** into chemical energy stored in glucose. The process takes place in the chloroplasts of leaf cells and releases oxygen as a by-product.

## Light reactions
- Chlorophyll absorbs mostly blue and red light while reflecting green wavelengths back to our eyes
- Water molecules are split and **oxygen is released** into the atmosphere
+ ATP and NADPH carry energy to the next stage
### Calvin cycle
* Carbon dioxide is fixed by the enzyme RuBisCO
The **Calvin cycle** uses ATP and NADPH to build sugars, and **each turn of the cycle fixes exactly one molecule of carbon dioxide** which is why six turns are needed per glucose.

Key term: **stomata** regulate gas exchange.";

fn long_lesson() -> String {
    std::iter::repeat_n(LESSON, 6).collect::<Vec<_>>().join("\n\n")
}

#[test]
fn runs_stay_inside_right_margin() {
    for config in [LayoutConfig::default(), common::narrow_config(200.0)] {
        let doc = layout_with(&long_lesson(), &config);
        for run in doc.runs() {
            assert!(
                common::width(run) <= config.page_width - config.margin - run.x + 0.01,
                "{:?} at x={} overflows",
                run.text,
                run.x
            );
        }
    }
}

#[test]
fn runs_stay_inside_printable_height() {
    let config = LayoutConfig::default();
    let doc = layout("Photosynthesis", &long_lesson());
    assert!(doc.pages.len() >= 2);
    for page in &doc.pages {
        for run in &page.runs {
            assert!(run.y >= config.margin, "{:?} above top margin", run.text);
            assert!(
                run.y <= config.page_height - config.margin,
                "{:?} below bottom margin",
                run.text
            );
        }
    }
}

#[test]
fn runs_descend_within_each_page() {
    let doc = layout("Photosynthesis", &long_lesson());
    for page in &doc.pages {
        for pair in page.runs.windows(2) {
            assert!(pair[0].y <= pair[1].y);
        }
    }
}

#[test]
fn content_is_not_lost() {
    let doc = layout_with(&long_lesson(), &common::narrow_config(180.0));

    let mut expected = String::from("Topic");
    for _ in 0..6 {
        let stripped: String = LESSON
            .lines()
            .map(|l| {
                ["### ", "## ", "# ", "- ", "+ ", "* "]
                    .iter()
                    .find_map(|p| l.strip_prefix(p))
                    .unwrap_or(l)
            })
            .collect::<Vec<_>>()
            .join("\n")
            .replace("**", "");
        expected.push_str(&stripped);
    }

    assert_eq!(
        compact_text(&doc, '\u{2022}'),
        strip_whitespace(&expected)
    );
}

#[test]
fn layout_is_deterministic_across_threads() {
    let text = long_lesson();
    let docs: Vec<Document> = (0..16)
        .into_par_iter()
        .map(|_| layout("Photosynthesis", &text))
        .collect();
    assert!(docs.windows(2).all(|w| w[0] == w[1]));
}

#[test]
fn reducer_steps_advance_cursor() {
    let config = LayoutConfig::default();
    let metrics = StubMetrics::uniform();
    let ctx = LayoutContext {
        metrics: &metrics,
        config: &config,
    };

    let state = LayoutState::new(&config);
    assert_eq!(state.cursor(), (50.0, 50.0));

    let state = state.title("Topic", &ctx);
    assert_close(state.cursor().1, 90.0);

    let state = state.apply(&classify("Some text"), &ctx);
    assert_close(state.cursor().1, 108.0);
    assert_close(state.cursor().0, 50.0);

    let state = state.apply(&classify(""), &ctx);
    assert_close(state.cursor().1, 118.0);

    let state = state.apply(&classify("# Head"), &ctx);
    assert_close(state.cursor().1, 153.0);

    assert_eq!(state.pages().len(), 1);
    assert_eq!(state.pages()[0].runs.len(), 3);

    let doc = state.finish("Topic", "Biology");
    assert_eq!(doc.title, "Topic");
    assert_eq!(doc.subject, "Biology");
}

#[test]
fn wider_glyphs_wrap_earlier() {
    let mut metrics = StubMetrics::uniform();
    metrics.overrides.insert('W', 1000.0);
    let config = common::narrow_config(120.0);

    // At 12pt a W is 12pt wide and a space 6pt: three words fill the 120pt line exactly.
    let doc = layout_notes("T", "", "WWW WWW WWW WWW", &metrics, &config);
    let body: Vec<&str> = doc.runs().skip(1).map(|r| r.text.as_str()).collect();
    assert_eq!(body, ["WWW WWW WWW", "WWW"]);
    for run in doc.runs().skip(1) {
        assert!(
            metrics.measure_text(&run.text, FontWeight::Regular, 12.0)
                <= config.page_width - config.margin - run.x
        );
    }
}

#[test]
fn layout_dump_serializes_to_json() {
    let doc = layout("Cells", "**Key** idea");
    let value = serde_json::to_value(&doc).expect("serialize layout");
    assert_eq!(value["title"], "Cells");
    assert_eq!(value["pages"][0]["runs"][0]["weight"], "bold");
    assert_eq!(value["pages"][0]["runs"][1]["text"], "Key");
    assert_eq!(value["pages"][0]["runs"][2]["weight"], "regular");
}
