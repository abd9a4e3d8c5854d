//! Deterministic fallback synthesis.
//!
//! Each function turns the plan's project name, prompt, and goals into a
//! fixed-structure deliverable. Output depends only on [`SynthInput`]; the
//! run stamp appears solely inside comments, so two calls with the same input
//! produce byte-identical files.

mod documents;

use std::collections::BTreeMap;

pub use documents::{accessibility, architecture, component, performance, responsive, styling};

/// Everything a fallback document may depend on.
#[derive(Debug, Clone, Copy)]
pub struct SynthInput<'a> {
    pub project_name: &'a str,
    pub slug: &'a str,
    pub prompt: &'a str,
    pub goals: &'a [String],
    /// Generation stamp placed in document comments.
    pub stamp: &'a str,
}

/// A synthesized deliverable: narrative plus the files it produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Synthesis {
    pub summary: String,
    pub message: String,
    pub files: BTreeMap<String, String>,
}

/// Line-oriented markdown writer used by the document bodies.
#[derive(Debug, Default)]
pub(crate) struct Markdown {
    out: String,
}

impl Markdown {
    pub(crate) fn new(title: &str, stamp: &str) -> Self {
        let mut md = Self::default();
        md.line(&format!("# {title}"));
        md.blank();
        md.line(&format!("<!-- generated by swarm at {stamp} -->"));
        md.blank();
        md
    }

    pub(crate) fn line(&mut self, text: &str) -> &mut Self {
        self.out.push_str(text);
        self.out.push('\n');
        self
    }

    pub(crate) fn blank(&mut self) -> &mut Self {
        self.out.push('\n');
        self
    }

    pub(crate) fn section(&mut self, heading: &str, items: &[&str]) -> &mut Self {
        self.line(&format!("## {heading}"));
        self.blank();
        for item in items {
            self.line(&format!("- {item}"));
        }
        self.blank()
    }

    pub(crate) fn owned_section(&mut self, heading: &str, items: &[String]) -> &mut Self {
        let borrowed: Vec<&str> = items.iter().map(String::as_str).collect();
        self.section(heading, &borrowed)
    }

    pub(crate) fn finish(self) -> String {
        self.out
    }
}
