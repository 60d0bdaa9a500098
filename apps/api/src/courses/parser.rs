//! Course markdown splitter.
//!
//! `# ` is the course title, `## ` starts a chapter, `### ` starts a section.
//! Headings inside fenced code blocks are plain text. Markdown without any
//! chapter heading becomes one chapter holding one section. Text between the
//! title and the first chapter opens the first chapter's "Overview".

use serde::{Deserialize, Serialize};

const OVERVIEW_TITLE: &str = "Overview";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Section {
    pub title: String,
    pub content: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chapter {
    pub title: String,
    pub sections: Vec<Section>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParsedCourse {
    pub title: String,
    pub chapters: Vec<Chapter>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Kind<'a> {
    Title(&'a str),
    Chapter(&'a str),
    Section(&'a str),
    Text,
}

#[derive(Debug, Clone, Copy)]
struct Line<'a> {
    raw: &'a str,
    kind: Kind<'a>,
}

struct ChapterBuilder<'a> {
    title: String,
    /// Course text written before the first chapter heading.
    intro: Vec<&'a str>,
    preamble: Vec<&'a str>,
    sections: Vec<Section>,
    open_section: Option<(String, Vec<&'a str>)>,
}

impl<'a> ChapterBuilder<'a> {
    fn new(title: String) -> Self {
        Self {
            title,
            intro: Vec::new(),
            preamble: Vec::new(),
            sections: Vec::new(),
            open_section: None,
        }
    }

    fn push_text(&mut self, line: &'a str) {
        match &mut self.open_section {
            Some((_, lines)) => lines.push(line),
            None => self.preamble.push(line),
        }
    }

    fn start_section(&mut self, title: String) {
        self.close_section();
        self.open_section = Some((title, Vec::new()));
    }

    fn close_section(&mut self) {
        if let Some((title, lines)) = self.open_section.take() {
            self.sections.push(Section {
                title,
                content: join_lines(&lines),
            });
        }
    }

    fn next_section_number(&self) -> usize {
        self.sections.len() + usize::from(self.open_section.is_some()) + 1
    }

    fn finish(mut self) -> Chapter {
        self.close_section();
        let preamble = join_lines(&self.preamble);
        let mut sections = self.sections;
        if sections.is_empty() {
            sections.push(Section {
                title: self.title.clone(),
                content: preamble,
            });
        } else if !preamble.is_empty() {
            sections.insert(
                0,
                Section {
                    title: OVERVIEW_TITLE.to_string(),
                    content: preamble,
                },
            );
        }
        let intro = join_lines(&self.intro);
        if !intro.is_empty() {
            match sections.first_mut() {
                Some(first) if first.title == OVERVIEW_TITLE && !first.content.is_empty() => {
                    first.content = format!("{intro}\n\n{}", first.content);
                }
                _ => sections.insert(
                    0,
                    Section {
                        title: OVERVIEW_TITLE.to_string(),
                        content: intro,
                    },
                ),
            }
        }
        Chapter {
            title: self.title,
            sections,
        }
    }
}

/// Splits generated course markdown into chapters and sections.
pub fn parse_course_markdown(markdown: &str, fallback_title: &str) -> ParsedCourse {
    let lines = classify_lines(markdown);
    if lines.iter().any(|l| matches!(l.kind, Kind::Chapter(_))) {
        split_chapters(&lines, fallback_title)
    } else {
        single_section(&lines, fallback_title)
    }
}

fn single_section(lines: &[Line<'_>], fallback_title: &str) -> ParsedCourse {
    let mut title: Option<String> = None;
    let mut body: Vec<&str> = Vec::new();

    for line in lines {
        match line.kind {
            Kind::Title(t) if title.is_none() && join_lines(&body).is_empty() => {
                title = Some(heading_or(t, fallback_title));
            }
            _ => body.push(line.raw),
        }
    }

    let title = title.unwrap_or_else(|| fallback_title.to_string());
    ParsedCourse {
        chapters: vec![Chapter {
            title: title.clone(),
            sections: vec![Section {
                title: title.clone(),
                content: join_lines(&body),
            }],
        }],
        title,
    }
}

fn split_chapters(lines: &[Line<'_>], fallback_title: &str) -> ParsedCourse {
    let mut title: Option<String> = None;
    let mut intro: Vec<&str> = Vec::new();
    let mut chapters = Vec::new();
    let mut current: Option<ChapterBuilder<'_>> = None;

    for line in lines {
        if let Kind::Chapter(t) = line.kind {
            let number = chapters.len() + usize::from(current.is_some()) + 1;
            let mut next = ChapterBuilder::new(heading_or(t, &format!("Chapter {number}")));
            match current.take() {
                Some(previous) => chapters.push(previous.finish()),
                None => next.intro = std::mem::take(&mut intro),
            }
            current = Some(next);
            continue;
        }

        match current.as_mut() {
            Some(chapter) => match line.kind {
                Kind::Section(t) => {
                    let number = chapter.next_section_number();
                    chapter.start_section(heading_or(t, &format!("Section {number}")));
                }
                _ => chapter.push_text(line.raw),
            },
            None => match line.kind {
                Kind::Title(t) if title.is_none() && join_lines(&intro).is_empty() => {
                    title = Some(heading_or(t, fallback_title));
                }
                _ => intro.push(line.raw),
            },
        }
    }
    if let Some(chapter) = current {
        chapters.push(chapter.finish());
    }

    ParsedCourse {
        title: title.unwrap_or_else(|| fallback_title.to_string()),
        chapters,
    }
}

/// Tags each line, leaving anything inside ``` or ~~~ fences as text.
fn classify_lines(markdown: &str) -> Vec<Line<'_>> {
    let mut in_fence = false;
    let mut out = Vec::new();

    for raw in markdown.lines() {
        let trimmed = raw.trim_start();
        let kind = if trimmed.starts_with("```") || trimmed.starts_with("~~~") {
            in_fence = !in_fence;
            Kind::Text
        } else if in_fence {
            Kind::Text
        } else if let Some(text) = heading_text(trimmed, 1) {
            Kind::Title(text)
        } else if let Some(text) = heading_text(trimmed, 2) {
            Kind::Chapter(text)
        } else if let Some(text) = heading_text(trimmed, 3) {
            Kind::Section(text)
        } else {
            Kind::Text
        };
        out.push(Line { raw, kind });
    }
    out
}

/// Returns the heading text when `line` is an ATX heading of exactly `level`.
fn heading_text(line: &str, level: usize) -> Option<&str> {
    let hashes = line.chars().take_while(|c| *c == '#').count();
    if hashes != level {
        return None;
    }
    let rest = &line[level..];
    if !rest.is_empty() && !rest.starts_with(|c: char| c == ' ' || c == '\t') {
        return None;
    }
    // An optional closing run of `#` must be separated by a space ("C#" stays).
    let text = rest.trim();
    let unclosed = text.trim_end_matches('#');
    if unclosed.is_empty() {
        Some("")
    } else if unclosed.ends_with(' ') {
        Some(unclosed.trim_end())
    } else {
        Some(text)
    }
}

fn heading_or(text: &str, fallback: &str) -> String {
    if text.is_empty() {
        fallback.to_string()
    } else {
        text.to_string()
    }
}

fn join_lines(lines: &[&str]) -> String {
    lines.join("\n").trim().to_string()
}
