//! Database name filters: include, exclude and structure-only pattern lists.

use regex::Regex;

/// Where a discovered database falls after filtering.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    /// Matched `include` and no `exclude`: schema plus per-table data.
    Full,
    /// Matched `exclude` and `structure_only`: schema only.
    StructureOnly,
    /// Matched `exclude` only: nothing.
    Excluded,
    /// Matched neither list: nothing.
    Skipped,
}

/// Compiled filter lists. Patterns are searched unanchored against the bare database name.
#[derive(Debug, Clone, Default)]
pub struct FilterSet {
    include: Vec<Regex>,
    exclude: Vec<Regex>,
    structure_only: Vec<Regex>,
}

fn compile(patterns: &[String]) -> Result<Vec<Regex>, regex::Error> {
    patterns.iter().map(|p| Regex::new(p)).collect()
}

fn any_match(patterns: &[Regex], name: &str) -> bool {
    patterns.iter().any(|re| re.is_match(name))
}

impl FilterSet {
    pub fn new(
        include: &[String],
        exclude: &[String],
        structure_only: &[String],
    ) -> Result<Self, regex::Error> {
        Ok(Self {
            include: compile(include)?,
            exclude: compile(exclude)?,
            structure_only: compile(structure_only)?,
        })
    }

    /// Exclusion wins over inclusion; structure-only only rescues excluded names.
    pub fn scope(&self, database: &str) -> Scope {
        if any_match(&self.exclude, database) {
            if any_match(&self.structure_only, database) {
                Scope::StructureOnly
            } else {
                Scope::Excluded
            }
        } else if any_match(&self.include, database) {
            Scope::Full
        } else {
            Scope::Skipped
        }
    }
}
