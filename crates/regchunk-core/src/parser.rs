//! Structural parser for regulatory documents.
//!
//! Turns raw legal text into an ordered list of typed, parent-linked
//! [`Section`]s in a single pass over its physical lines.
//!
//! # Algorithm
//!
//! The scan threads a [`ScanState`] through every line: state in, state
//! out, plus at most one completed section.
//!
//! 1. Each line is matched against the dialect's heading rules. When more
//!    than one rule matches, the deepest-nesting rule wins.
//! 2. On a heading, the pending section (if any) is emitted: its lines are
//!    cleaned with [`clean_text`], metrics are computed, and the parent
//!    link captured when it was opened is attached. The heading then opens
//!    a new pending section and updates the enclosing context.
//! 3. A non-heading line is appended to the pending section. Before the
//!    first heading, lines are front matter: never emitted, only searched
//!    for mentions that seed the enclosing context (`PART 164` in a HIPAA
//!    preamble).
//! 4. At end of input the pending section is flushed.
//!
//! Recitals are flat: they are emitted in document order between chapters
//! and articles but neither read nor change the enclosing context.
//!
//! If nothing is recognized, the whole cleaned document becomes a single
//! [`SectionType::Document`] section. Only empty or non-UTF-8 input fails.

use crate::clean::{clean_text, strip_line_gutter};
use crate::dialect::{detect_dialect, heading_candidate, match_heading, Dialect, HeadingMatch, Level};
use crate::error::ParseError;
use crate::models::{Section, SectionMetrics, SectionType};
use crate::sentence::split_sentences;

/// Section id given to the synthetic whole-document fallback section.
pub const FALLBACK_SECTION_ID: &str = "1";

/// Parses regulatory text into [`Section`]s.
///
/// Holds no state between calls; every method is a pure function of its
/// arguments and the configured default dialect.
#[derive(Debug, Clone, Copy)]
pub struct StructuralParser {
    default_dialect: Dialect,
}

impl Default for StructuralParser {
    fn default() -> Self {
        Self::new(Dialect::Gdpr)
    }
}

impl StructuralParser {
    /// `default_dialect` is returned by detection when the text is ambiguous.
    pub fn new(default_dialect: Dialect) -> Self {
        Self { default_dialect }
    }

    pub fn default_dialect(&self) -> Dialect {
        self.default_dialect
    }

    pub fn detect_dialect(&self, text: &str) -> Dialect {
        detect_dialect(text, self.default_dialect)
    }

    pub fn clean_text(&self, text: &str) -> String {
        clean_text(text)
    }

    /// Parse `text` into sections, detecting the dialect when `dialect` is `None`.
    ///
    /// # Errors
    ///
    /// [`ParseError::Empty`] when the text is empty, whitespace-only, or
    /// nothing but OCR noise. Degraded structure is not an error.
    pub fn parse(&self, text: &str, dialect: Option<Dialect>) -> Result<Vec<Section>, ParseError> {
        if text.trim().is_empty() {
            return Err(ParseError::Empty);
        }
        let cleaned = clean_text(text);
        if cleaned.is_empty() {
            return Err(ParseError::Empty);
        }

        let dialect = dialect.unwrap_or_else(|| self.detect_dialect(text));
        tracing::info!(dialect = %dialect, "parsing document");

        let mut sections = dialect.extract(text);
        if sections.is_empty() {
            tracing::warn!(
                dialect = %dialect,
                "no headings recognized, treating the whole document as one section"
            );
            sections.push(build_section(
                cleaned,
                SectionType::Document,
                FALLBACK_SECTION_ID.to_string(),
                String::new(),
                None,
                dialect,
                0,
            ));
        }

        tracing::info!(sections = sections.len(), "extracted sections");
        Ok(sections)
    }

    /// Decode `bytes` as UTF-8, then [`parse`](Self::parse).
    pub fn parse_bytes(&self, bytes: &[u8], dialect: Option<Dialect>) -> Result<Vec<Section>, ParseError> {
        let text = std::str::from_utf8(bytes).map_err(|e| ParseError::Unreadable(e.to_string()))?;
        self.parse(text, dialect)
    }
}

impl Dialect {
    /// Run the line-scanning state machine with this dialect's rules.
    ///
    /// Returns no sections when no heading is recognized; the fallback
    /// section is added by [`StructuralParser::parse`].
    pub fn extract(&self, text: &str) -> Vec<Section> {
        let mut state = ScanState::default();
        let mut sections = Vec::new();

        for (i, line) in text.lines().enumerate() {
            let (next, emitted) = state.step(*self, i + 1, line);
            state = next;
            sections.extend(emitted);
        }
        sections.extend(state.finish(*self));

        sections
    }
}

/// A section whose heading has been seen but whose body is still being read.
#[derive(Debug, Clone, PartialEq, Eq)]
struct PendingSection {
    section_type: SectionType,
    id: String,
    title: String,
    parent_id: Option<String>,
    start_line: usize,
    lines: Vec<String>,
}

impl PendingSection {
    /// Heading had no inline title and no body text has been read yet.
    fn awaits_title(&self) -> bool {
        self.title.is_empty()
            && self.section_type != SectionType::Recital
            && self.lines[1..].iter().all(|l| l.trim().is_empty())
    }

    fn into_section(self, dialect: Dialect) -> Option<Section> {
        let content = clean_text(&self.lines.join("\n"));
        if content.is_empty() {
            return None;
        }
        Some(build_section(
            content,
            self.section_type,
            self.id,
            self.title,
            self.parent_id,
            dialect,
            self.start_line,
        ))
    }
}

/// Scanner state threaded through the line loop.
///
/// `root`/`top`/`mid` hold the ids of the currently open enclosing units
/// (e.g. title, part, subpart). `pending` is the section being accumulated.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScanState {
    root_id: Option<String>,
    top_id: Option<String>,
    mid_id: Option<String>,
    pending: Option<PendingSection>,
}

impl ScanState {
    /// Consume one physical line (1-based `line_no`).
    pub fn step(mut self, dialect: Dialect, line_no: usize, line: &str) -> (ScanState, Option<Section>) {
        match match_heading(dialect, line) {
            Some(heading) => {
                let emitted = self.pending.take().and_then(|p| p.into_section(dialect));
                let parent_id = self.enter(&heading);

                let (title, first_line) = if heading.level == Level::Flat {
                    (
                        format!("Recital {}", heading.id),
                        heading.title.clone(),
                    )
                } else {
                    (heading.title.clone(), heading_candidate(line).to_string())
                };

                self.pending = Some(PendingSection {
                    section_type: heading.section_type,
                    id: heading.id,
                    title,
                    parent_id,
                    start_line: line_no,
                    lines: vec![first_line],
                });
                (self, emitted)
            }
            None => {
                match self.pending.as_mut() {
                    Some(pending) => {
                        let text = strip_line_gutter(line);
                        if pending.awaits_title() && is_title_line(text) {
                            pending.title = text.trim().to_string();
                        }
                        pending.lines.push(line.to_string());
                    }
                    None => self.seed(dialect, line),
                }
                (self, None)
            }
        }
    }

    /// Flush the pending section at end of input.
    pub fn finish(self, dialect: Dialect) -> Option<Section> {
        self.pending.and_then(|p| p.into_section(dialect))
    }

    /// Open `heading`'s level and return the parent link for its section.
    fn enter(&mut self, heading: &HeadingMatch) -> Option<String> {
        let id = Some(heading.id.clone());
        match heading.level {
            Level::Root => {
                self.root_id = id;
                self.top_id = None;
                self.mid_id = None;
                None
            }
            Level::Top => {
                self.top_id = id;
                self.mid_id = None;
                self.root_id.clone()
            }
            Level::Mid => {
                let parent = self.top_id.clone().or_else(|| self.root_id.clone());
                self.mid_id = id;
                parent
            }
            Level::Leaf => match (&self.top_id, &self.mid_id) {
                (Some(top), Some(mid)) => Some(format!("{}.{}", top, mid)),
                (Some(top), None) => Some(top.clone()),
                (None, Some(mid)) => Some(mid.clone()),
                (None, None) => self.root_id.clone(),
            },
            Level::Flat => None,
        }
    }

    /// Pick up enclosing context mentioned in front matter.
    fn seed(&mut self, dialect: Dialect, line: &str) {
        for rule in dialect.seed_rules() {
            if let Some(id) = rule.find(line) {
                match rule.level {
                    Level::Root => {
                        self.root_id = Some(id);
                        self.top_id = None;
                        self.mid_id = None;
                    }
                    Level::Top => {
                        self.top_id = Some(id);
                        self.mid_id = None;
                    }
                    Level::Mid => self.mid_id = Some(id),
                    Level::Leaf | Level::Flat => {}
                }
            }
        }
    }
}

/// A short capitalized line with no clause punctuation, as in
/// `Article 17` followed by `Right to erasure`. A wrapped body line
/// (`The controller shall be responsible for, and be able to`) is not.
fn is_title_line(line: &str) -> bool {
    let line = line.trim();
    line.chars().next().is_some_and(char::is_uppercase)
        && !line.ends_with(['.', ':'])
        && !line.contains([',', ';'])
        && line.split_whitespace().count() <= 12
}

fn build_section(
    content: String,
    section_type: SectionType,
    section_id: String,
    title: String,
    parent_id: Option<String>,
    dialect: Dialect,
    start_line: usize,
) -> Section {
    let metrics = SectionMetrics {
        word_count: content.split_whitespace().count(),
        sentence_count: split_sentences(&content).len(),
        char_length: content.chars().count(),
    };
    Section {
        content,
        section_type,
        section_id,
        title,
        parent_id,
        metrics,
        dialect,
        start_line,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const HIPAA_SAMPLE: &str = "\
45 CFR Parts 160, 162, and 164
Administrative Simplification

PART 160—GENERAL ADMINISTRATIVE REQUIREMENTS

Subpart A—General Provisions

§ 160.101 Statutory basis.
The requirements of this subchapter implement sections 1171-1180 of the
Social Security Act.

§ 160.102 Applicability.
(a) Except as otherwise provided, the standards apply to health plans.

Subpart B—Preemption of State Law

§ 160.201 Statutory basis.
The provisions of this subpart implement section 1178 of the Act.

PART 164—SECURITY AND PRIVACY

§ 164.102 Statutory basis.
The provisions of this part are adopted pursuant to the Secretary's authority.
";

    const GDPR_SAMPLE: &str = "\
REGULATION (EU) 2016/679 OF THE EUROPEAN PARLIAMENT
General Data Protection Regulation

Whereas:

- (1) The protection of natural persons in relation to the processing of
personal data is a fundamental right.
- (2) The principles of the protection should respect fundamental rights.

CHAPTER I
General provisions

Article 1
Subject-matter and objectives
1. This Regulation lays down rules.

- (3) A recital interspersed between articles.

Article 2
Material scope
1. This Regulation applies to the processing of personal data.

CHAPTER II
Principles

Article 5
Principles relating to processing of personal data
";

    fn parse(text: &str, dialect: Option<Dialect>) -> Vec<Section> {
        StructuralParser::default().parse(text, dialect).unwrap()
    }

    #[test]
    fn test_part_and_section_scenario() {
        let text = "PART 160—GENERAL ADMINISTRATIVE REQUIREMENTS\n§ 160.101 Statutory basis.";
        let sections = parse(text, None);
        assert_eq!(sections.len(), 2);

        assert_eq!(sections[0].section_type, SectionType::Part);
        assert_eq!(sections[0].section_id, "160");
        assert_eq!(sections[0].title, "GENERAL ADMINISTRATIVE REQUIREMENTS");
        assert_eq!(sections[0].parent_id, None);

        assert_eq!(sections[1].section_type, SectionType::Section);
        assert_eq!(sections[1].section_id, "160.101");
        assert_eq!(sections[1].parent_id.as_deref(), Some("160"));
        assert_eq!(sections[1].dialect, Dialect::Hipaa);
    }

    #[test]
    fn test_recital_scenario() {
        let sections = parse("- (1) Whereas data protection is a fundamental right.", None);
        assert_eq!(sections.len(), 1);
        let recital = &sections[0];
        assert_eq!(recital.section_type, SectionType::Recital);
        assert_eq!(recital.section_id, "1");
        assert_eq!(recital.title, "Recital 1");
        assert_eq!(recital.parent_id, None);
        assert_eq!(recital.content, "Whereas data protection is a fundamental right.");
        assert_eq!(recital.metrics.word_count, 7);
        assert_eq!(recital.metrics.sentence_count, 1);
    }

    #[test]
    fn test_empty_input_is_error() {
        let parser = StructuralParser::default();
        assert_eq!(parser.parse("", None), Err(ParseError::Empty));
        assert_eq!(parser.parse("  \n\t\n", Some(Dialect::Hipaa)), Err(ParseError::Empty));
        assert_eq!(parser.parse("\u{0007}\n12\n", None), Err(ParseError::Empty));
    }

    #[test]
    fn test_unrecognized_prose_is_one_fallback_section() {
        for dialect in [Dialect::Gdpr, Dialect::Hipaa, Dialect::Generic] {
            let sections = parse("Just some prose.\n\nWith two paragraphs.", Some(dialect));
            assert_eq!(sections.len(), 1);
            assert_eq!(sections[0].section_type, SectionType::Document);
            assert_eq!(sections[0].section_id, FALLBACK_SECTION_ID);
            assert_eq!(sections[0].content, "Just some prose.\n\nWith two paragraphs.");
            assert_eq!(sections[0].dialect, dialect);
        }
    }

    #[test]
    fn test_invalid_utf8_is_unreadable() {
        let parser = StructuralParser::default();
        let err = parser.parse_bytes(&[0x50, 0xff, 0xfe], None).unwrap_err();
        assert!(matches!(err, ParseError::Unreadable(_)));
    }

    #[test]
    fn test_hipaa_hierarchy() {
        let sections = parse(HIPAA_SAMPLE, None);
        let summary: Vec<(SectionType, &str, Option<&str>)> = sections
            .iter()
            .map(|s| (s.section_type, s.section_id.as_str(), s.parent_id.as_deref()))
            .collect();
        assert_eq!(
            summary,
            vec![
                (SectionType::Part, "160", None),
                (SectionType::Subpart, "A", Some("160")),
                (SectionType::Section, "160.101", Some("160.A")),
                (SectionType::Section, "160.102", Some("160.A")),
                (SectionType::Subpart, "B", Some("160")),
                (SectionType::Section, "160.201", Some("160.B")),
                (SectionType::Part, "164", None),
                (SectionType::Section, "164.102", Some("164")),
            ]
        );

        let s = &sections[2];
        assert!(s.content.starts_with("§ 160.101 Statutory basis."));
        assert!(s.content.contains("Social Security Act."));
    }

    #[test]
    fn test_gdpr_recitals_do_not_change_context() {
        let sections = parse(GDPR_SAMPLE, None);
        let summary: Vec<(SectionType, &str, Option<&str>)> = sections
            .iter()
            .map(|s| (s.section_type, s.section_id.as_str(), s.parent_id.as_deref()))
            .collect();
        assert_eq!(
            summary,
            vec![
                (SectionType::Recital, "1", None),
                (SectionType::Recital, "2", None),
                (SectionType::Chapter, "I", None),
                (SectionType::Article, "1", Some("I")),
                (SectionType::Recital, "3", None),
                (SectionType::Article, "2", Some("I")),
                (SectionType::Chapter, "II", None),
                (SectionType::Article, "5", Some("II")),
            ]
        );
        assert_eq!(
            sections[0].content,
            "The protection of natural persons in relation to the processing of\npersonal data is a fundamental right."
        );
    }

    #[test]
    fn test_sections_in_document_order() {
        for text in [HIPAA_SAMPLE, GDPR_SAMPLE] {
            let sections = parse(text, None);
            for pair in sections.windows(2) {
                assert!(pair[0].start_line < pair[1].start_line);
            }
        }
    }

    #[test]
    fn test_front_matter_seeds_context() {
        let text = "Regulations under 45 CFR PART 164\nSubpart C—Security Standards\n";
        // The subpart line is itself a heading; the part comes from front matter.
        let sections = parse(&format!("{}§ 164.302 Applicability.\nText.", text), Some(Dialect::Hipaa));
        assert_eq!(sections[0].section_type, SectionType::Subpart);
        assert_eq!(sections[0].parent_id.as_deref(), Some("164"));
        assert_eq!(sections[1].parent_id.as_deref(), Some("164.C"));
    }

    #[test]
    fn test_title_is_root_of_parts() {
        let text = "TITLE II—ADMINISTRATIVE SIMPLIFICATION\nPART 160—GENERAL\nText.\n§ 160.101 Basis.\nMore.";
        let sections = parse(text, Some(Dialect::Hipaa));
        assert_eq!(sections[0].section_type, SectionType::Title);
        assert_eq!(sections[1].parent_id.as_deref(), Some("II"));
        assert_eq!(sections[2].parent_id.as_deref(), Some("160"));
    }

    #[test]
    fn test_markdown_headings() {
        let text = "## CHAPTER III\n### **Article 17**\nRight to erasure.";
        let sections = parse(text, Some(Dialect::Gdpr));
        assert_eq!(sections.len(), 2);
        assert_eq!(sections[1].section_id, "17");
        assert_eq!(sections[1].content, "Article 17\nRight to erasure.");
    }

    #[test]
    fn test_scan_state_step_by_step() {
        let state = ScanState::default();
        let (state, out) = state.step(Dialect::Gdpr, 1, "CHAPTER I");
        assert!(out.is_none());
        let (state, out) = state.step(Dialect::Gdpr, 2, "General provisions");
        assert!(out.is_none());
        let (state, out) = state.step(Dialect::Gdpr, 3, "Article 1");
        let chapter = out.unwrap();
        assert_eq!(chapter.content, "CHAPTER I\nGeneral provisions");
        assert_eq!(chapter.title, "General provisions");
        assert_eq!(chapter.start_line, 1);
        let last = state.finish(Dialect::Gdpr).unwrap();
        assert_eq!(last.section_type, SectionType::Article);
        assert_eq!(last.parent_id.as_deref(), Some("I"));
    }

    #[test]
    fn test_clean_text_applied_to_content() {
        let text = "Article 1\nSome    text\n\n\n\nwith gaps\n17\n";
        let sections = parse(text, Some(Dialect::Gdpr));
        assert_eq!(sections[0].content, "Article 1\nSome text\n\nwith gaps");
        assert_eq!(sections[0].metrics.char_length, sections[0].content.chars().count());
    }

    #[test]
    fn test_empty_recital_is_skipped() {
        let sections = parse("- (1)\n- (2) Second recital.", Some(Dialect::Gdpr));
        assert_eq!(sections.len(), 1);
        assert_eq!(sections[0].section_id, "2");
    }

    #[test]
    fn test_title_from_following_line() {
        let text = "Article 17\n\nRight to erasure ('right to be forgotten')\n\
                    1. The data subject shall have the right.\n\
                    Article 18\n\
                    1. Restriction applies where:";
        let sections = parse(text, Some(Dialect::Gdpr));
        assert_eq!(sections[0].title, "Right to erasure ('right to be forgotten')");
        // Body text is never taken as a title.
        assert_eq!(sections[1].title, "");
    }

    #[test]
    fn test_wrapped_body_line_is_not_a_title() {
        let text = "Article 5\n\
                    The controller shall be responsible for, and be able to\n\
                    demonstrate compliance with paragraph 1.";
        let sections = parse(text, Some(Dialect::Gdpr));
        assert_eq!(sections.len(), 1);
        assert_eq!(sections[0].title, "");
    }

    #[test]
    fn test_paragraph_reference_stays_in_article() {
        let text = "Article 21\n\
                    Right to object\n\
                    1. The data subject shall have the right to object to processing based on point (e) or (f) of\n\
                    Article 6(1), including profiling based on those provisions.\n\
                    2. Where personal data are processed for direct marketing purposes, the data subject may object.";
        let sections = parse(text, Some(Dialect::Gdpr));
        assert_eq!(sections.len(), 1);
        assert_eq!(sections[0].section_id, "21");
        assert_eq!(sections[0].title, "Right to object");
        assert!(sections[0].content.contains("Article 6(1), including profiling"));
        assert!(sections[0].content.ends_with("the data subject may object."));
    }

    #[test]
    fn test_gutter_numbered_headings() {
        let text = "1| PART 160—GENERAL\n\
                    2| Subpart A—General Provisions\n\
                    3| § 160.101 Statutory basis.\n\
                    4| The requirements apply.";
        let sections = parse(text, None);
        let summary: Vec<(SectionType, &str, Option<&str>)> = sections
            .iter()
            .map(|s| (s.section_type, s.section_id.as_str(), s.parent_id.as_deref()))
            .collect();
        assert_eq!(
            summary,
            vec![
                (SectionType::Part, "160", None),
                (SectionType::Subpart, "A", Some("160")),
                (SectionType::Section, "160.101", Some("160.A")),
            ]
        );
        assert_eq!(sections[2].content, "§ 160.101 Statutory basis.\nThe requirements apply.");
    }
}
