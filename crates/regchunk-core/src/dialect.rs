//! Document dialects: heading vocabularies and dialect detection.
//!
//! A [`Dialect`] is a named structure convention. Each one owns an ordered
//! table of heading rules (most to least structurally significant) and an
//! optional set of front-matter seed rules used to establish the enclosing
//! context before the first heading appears.
//!
//! | Dialect | Headings |
//! |---------|----------|
//! | [`Dialect::Hipaa`] | `TITLE II—` → `PART 160—` → `Subpart A—` → `§ 160.101` |
//! | [`Dialect::Gdpr`] | `- (1)` recitals, `CHAPTER IV` → `Article 17` |
//! | [`Dialect::Generic`] | `TITLE 1` → `CHAPTER 3` / `PART 2` → `Section 1798.100.` |

use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::clean::strip_line_gutter;
use crate::models::SectionType;

/// Closed set of supported document dialects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Dialect {
    /// Chapters, articles and interspersed numbered recitals (EU regulations).
    Gdpr,
    /// Titles, parts, subparts and `§` sections (US Code of Federal Regulations).
    Hipaa,
    /// Titles, chapters and numbered sections (state statutes such as the CCPA).
    Generic,
}

impl Dialect {
    pub fn as_str(&self) -> &'static str {
        match self {
            Dialect::Gdpr => "gdpr",
            Dialect::Hipaa => "hipaa",
            Dialect::Generic => "generic",
        }
    }

    /// Citation of the regulation this dialect is modelled on, if any.
    pub fn regulation(&self) -> Option<&'static str> {
        match self {
            Dialect::Gdpr => Some("EU 2016/679"),
            Dialect::Hipaa => Some("45 CFR Parts 160, 162, and 164"),
            Dialect::Generic => None,
        }
    }

    pub(crate) fn heading_rules(&self) -> &'static [HeadingRule] {
        match self {
            Dialect::Gdpr => &GDPR_RULES,
            Dialect::Hipaa => &HIPAA_RULES,
            Dialect::Generic => &GENERIC_RULES,
        }
    }

    pub(crate) fn seed_rules(&self) -> &'static [SeedRule] {
        match self {
            Dialect::Gdpr => &[],
            Dialect::Hipaa => &HIPAA_SEEDS,
            Dialect::Generic => &GENERIC_SEEDS,
        }
    }
}

impl fmt::Display for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Dialect {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "gdpr" | "articles" => Ok(Dialect::Gdpr),
            "hipaa" | "parts" | "cfr" => Ok(Dialect::Hipaa),
            "generic" | "ccpa" => Ok(Dialect::Generic),
            other => Err(format!(
                "unknown dialect '{}'. Must be gdpr, hipaa, or generic.",
                other
            )),
        }
    }
}

/// Nesting level a heading opens.
///
/// `Flat` headings (recitals) are leaves that neither read nor change the
/// enclosing context.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Level {
    Root,
    Top,
    Mid,
    Leaf,
    Flat,
}

impl Level {
    /// Nesting depth; deeper headings win ties between matching rules.
    pub(crate) fn depth(&self) -> u8 {
        match self {
            Level::Root => 0,
            Level::Top => 1,
            Level::Mid => 2,
            Level::Leaf | Level::Flat => 3,
        }
    }
}

pub(crate) struct HeadingRule {
    pub(crate) section_type: SectionType,
    pub(crate) level: Level,
    pattern: Regex,
    /// Reject in-sentence references: a lowercase title ("Article 6
    /// applies…"), a title opening with `(`, `,` or `;`, or an id glued to
    /// a paragraph marker ("Article 6(1)").
    prose_guard: bool,
}

/// A recognized heading line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct HeadingMatch {
    pub(crate) section_type: SectionType,
    pub(crate) level: Level,
    pub(crate) id: String,
    pub(crate) title: String,
}

impl HeadingRule {
    fn new(section_type: SectionType, level: Level, pattern: &str, prose_guard: bool) -> Self {
        HeadingRule {
            section_type,
            level,
            pattern: Regex::new(pattern).expect("heading pattern is valid"),
            prose_guard,
        }
    }

    fn apply(&self, line: &str) -> Option<HeadingMatch> {
        let caps = self.pattern.captures(line)?;
        let id_match = caps.get(1)?;
        let id = id_match.as_str().to_string();
        let title = caps
            .get(2)
            .map(|m| m.as_str().trim().trim_end_matches(['*', '_']).trim())
            .unwrap_or_default()
            .to_string();

        if self.prose_guard && is_prose_reference(&line[id_match.end()..], &title) {
            return None;
        }

        Some(HeadingMatch {
            section_type: self.section_type,
            level: self.level,
            id,
            title,
        })
    }
}

fn is_prose_reference(after_id: &str, title: &str) -> bool {
    after_id.starts_with('(')
        || title
            .chars()
            .next()
            .is_some_and(|c| c.is_lowercase() || matches!(c, '(' | ',' | ';'))
}

pub(crate) struct SeedRule {
    pub(crate) level: Level,
    pattern: Regex,
}

impl SeedRule {
    fn new(level: Level, pattern: &str) -> Self {
        SeedRule {
            level,
            pattern: Regex::new(pattern).expect("seed pattern is valid"),
        }
    }

    pub(crate) fn find(&self, line: &str) -> Option<String> {
        self.pattern
            .captures(line)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str().to_string())
    }
}

static HIPAA_RULES: LazyLock<Vec<HeadingRule>> = LazyLock::new(|| {
    vec![
        HeadingRule::new(
            SectionType::Title,
            Level::Root,
            r"^TITLE\s+([IVXLCDM]+)\b\s*[—–-]?\s*(.*)$",
            true,
        ),
        HeadingRule::new(
            SectionType::Part,
            Level::Top,
            r"^PART\s+(\d+)\b\s*[—–-]?\s*(.*)$",
            true,
        ),
        HeadingRule::new(
            SectionType::Subpart,
            Level::Mid,
            r"^(?:SUBPART|Subpart)\s+([A-Z])\b\s*[—–-]?\s*(.*)$",
            true,
        ),
        HeadingRule::new(
            SectionType::Section,
            Level::Leaf,
            r"^§\s*(\d+\.\d+[a-z]?)\b\s*(.*)$",
            true,
        ),
    ]
});

static GDPR_RULES: LazyLock<Vec<HeadingRule>> = LazyLock::new(|| {
    vec![
        HeadingRule::new(
            SectionType::Recital,
            Level::Flat,
            r"^[-*•]\s*\((\d+)\)\s*(.*)$",
            false,
        ),
        HeadingRule::new(
            SectionType::Chapter,
            Level::Top,
            r"^CHAPTER\s+([IVXLCDM]+)\b\s*[—–:.-]?\s*(.*)$",
            true,
        ),
        HeadingRule::new(
            SectionType::Article,
            Level::Leaf,
            r"^Article\s+(\d+)\b\s*[—–:.-]?\s*(.*)$",
            true,
        ),
    ]
});

static GENERIC_RULES: LazyLock<Vec<HeadingRule>> = LazyLock::new(|| {
    vec![
        HeadingRule::new(
            SectionType::Title,
            Level::Root,
            r"^TITLE\s+([IVXLCDM]+|\d+)\b\s*[—–:.-]?\s*(.*)$",
            true,
        ),
        HeadingRule::new(
            SectionType::Chapter,
            Level::Top,
            r"^(?:CHAPTER|Chapter|PART|Part)\s+([IVXLCDM]+|\d+[A-Z]?)\b\s*[—–:.-]?\s*(.*)$",
            true,
        ),
        HeadingRule::new(
            SectionType::Section,
            Level::Leaf,
            r"^(?:SECTION|Section|SEC\.|Sec\.)\s+(\d+(?:\.\d+)*[a-z]?)\b\.?\s*[—–:-]?\s*(.*)$",
            true,
        ),
    ]
});

static HIPAA_SEEDS: LazyLock<Vec<SeedRule>> = LazyLock::new(|| {
    vec![
        SeedRule::new(Level::Top, r"\bPART\s+(\d+)\b"),
        SeedRule::new(Level::Mid, r"\b(?:SUBPART|Subpart)\s+([A-Z])\b"),
    ]
});

static GENERIC_SEEDS: LazyLock<Vec<SeedRule>> =
    LazyLock::new(|| vec![SeedRule::new(Level::Root, r"\bTITLE\s+([IVXLCDM]+|\d+)\b")]);

/// Strip line-number gutters, Markdown heading markers and emphasis so
/// `12| ## **Article 5**` is matched like `Article 5`.
pub(crate) fn heading_candidate(line: &str) -> &str {
    let mut s = strip_line_gutter(line)
        .trim_matches(|c: char| c.is_whitespace() || c.is_control() || c == '\u{FEFF}')
        .trim_start_matches('#')
        .trim();
    for marker in ["**", "__"] {
        if let Some(inner) = s.strip_prefix(marker) {
            s = inner.strip_suffix(marker).unwrap_or(inner).trim();
        }
    }
    s
}

/// Match `line` against a dialect's heading rules.
///
/// Every rule is tried; if more than one matches, the deepest-nesting
/// rule wins. Rules at equal depth keep table order.
pub(crate) fn match_heading(dialect: Dialect, line: &str) -> Option<HeadingMatch> {
    let candidate = heading_candidate(line);
    if candidate.is_empty() {
        return None;
    }

    deepest_match(dialect.heading_rules(), candidate)
}

fn deepest_match(rules: &[HeadingRule], candidate: &str) -> Option<HeadingMatch> {
    let mut best: Option<HeadingMatch> = None;
    for rule in rules {
        if let Some(m) = rule.apply(candidate) {
            let deeper = match &best {
                Some(b) => m.level.depth() > b.level.depth(),
                None => true,
            };
            if deeper {
                best = Some(m);
            }
        }
    }
    best
}

const GDPR_INDICATORS: &[&str] = &[
    "general data protection regulation",
    "gdpr",
    "recital",
    "whereas",
];
const HIPAA_INDICATORS: &[&str] = &[
    "hipaa",
    "health insurance portability",
    "administrative simplification",
    "45 cfr",
];
const GENERIC_INDICATORS: &[&str] = &["california consumer privacy act", "ccpa"];

/// Guess the dialect of `text` from its vocabulary and heading shapes.
///
/// Each dialect scores one point per indicator phrase present and one
/// point per heading shape it recognizes. The unique highest score wins;
/// no signal or a tie returns `default`. Never fails.
pub fn detect_dialect(text: &str, default: Dialect) -> Dialect {
    let lower = text.to_lowercase();
    let indicator_score =
        |indicators: &[&str]| indicators.iter().filter(|i| lower.contains(*i)).count();

    let mut has_article = false;
    let mut has_paragraph_sign = false;
    let mut has_part = false;
    for line in text.lines() {
        let candidate = heading_candidate(line);
        if candidate.is_empty() {
            continue;
        }
        has_article |= GDPR_RULES[2].apply(candidate).is_some();
        has_paragraph_sign |= HIPAA_RULES[3].apply(candidate).is_some();
        has_part |= HIPAA_RULES[1].apply(candidate).is_some();
    }

    let scores = [
        (
            Dialect::Gdpr,
            indicator_score(GDPR_INDICATORS) + usize::from(has_article),
        ),
        (
            Dialect::Hipaa,
            indicator_score(HIPAA_INDICATORS)
                + usize::from(has_paragraph_sign)
                + usize::from(has_part),
        ),
        (Dialect::Generic, indicator_score(GENERIC_INDICATORS)),
    ];

    let best = scores.iter().map(|(_, s)| *s).max().unwrap_or(0);
    let leaders: Vec<Dialect> = scores
        .iter()
        .filter(|(_, s)| *s == best)
        .map(|(d, _)| *d)
        .collect();

    if best == 0 || leaders.len() > 1 {
        tracing::warn!(
            default = %default,
            "could not detect document dialect, using default"
        );
        return default;
    }
    leaders[0]
}
