//! `detect` and `sections` commands: look at a document's structure
//! without chunking it.

use anyhow::Result;
use serde::Serialize;
use std::path::Path;

use regchunk_core::dialect::Dialect;
use regchunk_core::models::Section;

use crate::config::Config;
use crate::ingest::Pipeline;

/// Run `regchunk detect`: print the detected dialect.
pub fn run_detect(config: &Config, path: &Path) -> Result<()> {
    let pipeline = Pipeline::from_config(config)?;
    let text = pipeline.read_text(path)?;
    let dialect = pipeline.parser().detect_dialect(&text);
    println!("{}", dialect);
    Ok(())
}

#[derive(Debug, Serialize)]
struct SectionSummary<'a> {
    key: String,
    #[serde(flatten)]
    section: &'a Section,
}

/// Run `regchunk sections`: print the parsed section outline, or the full
/// sections as JSON.
pub fn run_sections(config: &Config, path: &Path, dialect: Option<Dialect>, json: bool) -> Result<()> {
    let pipeline = Pipeline::from_config(config)?;
    let sections = pipeline.sections_for_path(path, dialect)?;

    if json {
        let summaries: Vec<SectionSummary> = sections
            .iter()
            .map(|section| SectionSummary {
                key: section.key(),
                section,
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&summaries)?);
        return Ok(());
    }

    if let Some(first) = sections.first() {
        println!("dialect: {}", first.dialect);
    }
    println!("sections: {}", sections.len());
    println!();
    for section in &sections {
        println!("{}", outline_line(section));
    }
    Ok(())
}

fn outline_line(section: &Section) -> String {
    let indent = match section.parent_id.as_deref() {
        None => "",
        Some(parent) if parent.contains('.') => "    ",
        Some(_) => "  ",
    };
    let title = if section.title.is_empty() {
        String::new()
    } else {
        format!(" {}", section.title)
    };
    format!(
        "{}{}{}  [line {}, {} words, {} sentences]",
        indent,
        section.label(),
        title,
        section.start_line,
        section.metrics.word_count,
        section.metrics.sentence_count
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use regchunk_core::parser::StructuralParser;

    #[test]
    fn test_outline_indents_by_depth() {
        let text = "PART 160—GENERAL\nSubpart A—General Provisions\n§ 160.101 Statutory basis.\nText.";
        let sections = StructuralParser::new(Dialect::Hipaa).parse(text, None).unwrap();
        let lines: Vec<String> = sections.iter().map(outline_line).collect();
        assert!(lines[0].starts_with("PART 160 GENERAL  [line 1"));
        assert!(lines[1].starts_with("  SUBPART A General Provisions"));
        assert!(lines[2].starts_with("    SECTION 160.101 Statutory basis."));
    }
}
