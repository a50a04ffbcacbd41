//! Integration tests for document structuring.
//!
//! These tests run the full path from classified blocks or plain text to
//! flattened chapter records.

use coursegen_structure::{
    build_tree, flatten, parse_text, to_outline, Block, BlockRole, KnowledgeId, SectionKind,
    StructureClassifier,
};
use pretty_assertions::assert_eq;

const LECTURE: &str = include_str!("fixtures/lecture.md");

fn textbook_blocks() -> Vec<Block> {
    vec![
        Block::new("Calculus Made Simple", 24.0),
        Block::new("Chapter 1 Limits", 18.0),
        Block::new("Limits describe behaviour near a point.", 10.0),
        Block::new("1.1 One-sided limits", 14.0),
        Block::new("Approach from the left.", 10.0),
        Block::new("- left limit", 10.0),
        Block::new("1.2 Continuity", 14.0),
        Block::new("A function is continuous when nothing jumps.", 10.0),
        Block::new("Chapter 2 Derivatives", 18.0).on_page(1),
        Block::new("Derivatives measure change.", 10.0).on_page(1),
        Block::new("Exercises", 14.0).on_page(1),
        Block::new("Differentiate x squared.", 10.0).on_page(1),
    ]
}

#[test]
fn test_blocks_to_records() {
    let mut blocks = textbook_blocks();
    StructureClassifier::new().classify(&mut blocks);

    assert_eq!(blocks[0].role, BlockRole::Title);
    assert_eq!(blocks[5].role, BlockRole::ListItem);

    let tree = build_tree(&blocks);
    assert_eq!(tree.title, "Calculus Made Simple");
    assert_eq!(tree.children.len(), 2);
    assert_eq!(tree.children[0].children.len(), 2);

    let outline = to_outline(&tree, KnowledgeId::from("kn-42"), "Calculus");
    let subtopics: Vec<&str> = outline.subtopics.iter().map(|s| s.title.as_str()).collect();
    assert_eq!(subtopics, vec!["Chapter 1 Limits", "Chapter 2 Derivatives"]);

    let records = flatten(&outline);
    let rows: Vec<(u32, &str)> = records
        .iter()
        .map(|r| (r.id, r.chapter_title.as_str()))
        .collect();
    assert_eq!(
        rows,
        vec![
            (1, "Chapter 1 Limits"),
            (2, "1.1 One-sided limits"),
            (3, "1.2 Continuity"),
            (4, "Chapter 2 Derivatives"),
            (5, "Exercises"),
        ]
    );
    assert_eq!(records[1].content, "Approach from the left.\n- left limit");
    assert!(records[1].metadata.has_bullets);
    assert_eq!(records[4].kind, SectionKind::Exercises);
    assert!(records.iter().all(|r| r.knowledge_id.as_str() == "kn-42"));
}

#[test]
fn test_transcript_to_records() {
    let tree = parse_text(LECTURE, "Lecture 7");
    let outline = to_outline(&tree, KnowledgeId::from("kn-7"), "Physics");

    let subtopics: Vec<(&str, u32, usize)> = outline
        .subtopics
        .iter()
        .map(|s| (s.title.as_str(), s.start_line, s.chapters.len()))
        .collect();
    assert_eq!(
        subtopics,
        vec![
            ("Lecture 7", 0, 1),
            ("Introduction", 5, 2),
            ("Chapter 2 Entropy", 11, 1),
            ("Summary", 19, 1),
        ]
    );

    let records = flatten(&outline);
    assert_eq!(records.len(), 5);
    assert_eq!(records[0].kind, SectionKind::Introduction);
    assert_eq!(
        records[2].content,
        "Temperature measures average kinetic energy."
    );
    assert!(records[3].metadata.has_code);
    assert!(records[3].content.contains("# not a heading"));
    assert_eq!(records[4].kind, SectionKind::Conclusion);
}

#[test]
fn test_degenerate_inputs_do_not_panic() {
    let classifier = StructureClassifier::new();

    let mut empty: Vec<Block> = Vec::new();
    classifier.classify(&mut empty);
    let outline = to_outline(&build_tree(&empty), KnowledgeId::from("k"), "T");
    assert!(flatten(&outline).is_empty());

    let mut zero_sizes = vec![Block::new("text", 0.0), Block::new("", -1.0)];
    classifier.classify(&mut zero_sizes);
    let tree = build_tree(&zero_sizes);
    assert_eq!(tree.content, "text");

    let outline = to_outline(&parse_text("", "Empty"), KnowledgeId::from("k"), "T");
    assert!(outline.is_empty());
}

#[test]
fn test_markdown_round_trip_keeps_structure() {
    let tree = parse_text(LECTURE, "Lecture 7");
    let reparsed = parse_text(&tree.to_markdown(), "");

    assert_eq!(reparsed.title, "");
    // The rendered document title comes back as a level-1 heading.
    assert_eq!(reparsed.children[0].title, "Lecture 7");
    let titles: Vec<&str> = reparsed.descendants().iter().map(|n| n.title.as_str()).collect();
    assert!(titles.contains(&"1.1 Temperature"));
    assert!(titles.contains(&"Chapter 2 Entropy"));
}
