/// Prompt search engine
///
/// Two modes are supported:
/// - `Exact`: the whole query (commas included) must appear in the prompt
/// - `AndTags`: the query is split on commas and every tag must appear,
///   in any order
///
/// Matching ignores case unless the query asks otherwise. A blank query
/// matches everything.
use std::fmt;

use super::data::ImageRecord;
use super::library::PromptIndex;

/// Delimiter between tags in `AndTags` mode
pub const TAG_DELIMITER: char = ',';

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SearchMode {
    #[default]
    Exact,
    AndTags,
}

impl fmt::Display for SearchMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SearchMode::Exact => write!(f, "Exact"),
            SearchMode::AndTags => write!(f, "Tag AND"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SearchQuery {
    pub raw_input: String,
    pub mode: SearchMode,
    pub case_sensitive: bool,
}

impl SearchQuery {
    pub fn new(raw_input: impl Into<String>, mode: SearchMode) -> Self {
        Self {
            raw_input: raw_input.into(),
            mode,
            case_sensitive: false,
        }
    }

    pub fn case_sensitive(mut self, case_sensitive: bool) -> Self {
        self.case_sensitive = case_sensitive;
        self
    }

    /// True when the query filters nothing
    pub fn is_blank(&self) -> bool {
        match self.mode {
            SearchMode::Exact => self.raw_input.trim().is_empty(),
            SearchMode::AndTags => self.tags().next().is_none(),
        }
    }

    /// Non-empty trimmed tags, in input order
    pub fn tags(&self) -> impl Iterator<Item = &str> {
        self.raw_input
            .split(TAG_DELIMITER)
            .map(str::trim)
            .filter(|tag| !tag.is_empty())
    }

    pub fn matcher(&self) -> Matcher {
        if self.is_blank() {
            return Matcher::All;
        }

        let fold = |needle: &str| {
            if self.case_sensitive {
                needle.to_string()
            } else {
                needle.to_lowercase()
            }
        };

        let needles = match self.mode {
            SearchMode::Exact => vec![fold(self.raw_input.as_str())],
            SearchMode::AndTags => self.tags().map(fold).collect(),
        };

        Matcher::AllOf {
            needles,
            case_sensitive: self.case_sensitive,
        }
    }
}

/// A query compiled once and applied to every record
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Matcher {
    All,
    AllOf {
        needles: Vec<String>,
        case_sensitive: bool,
    },
}

impl Matcher {
    pub fn matches(&self, record: &ImageRecord) -> bool {
        match self {
            Matcher::All => true,
            Matcher::AllOf {
                needles,
                case_sensitive,
            } => {
                let haystack = if *case_sensitive {
                    record.prompt()
                } else {
                    record.folded_prompt()
                };
                needles.iter().all(|needle| haystack.contains(needle.as_str()))
            }
        }
    }
}

/// Indices into a `PromptIndex`, in index order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchResult {
    indices: Vec<usize>,
}

impl SearchResult {
    pub fn len(&self) -> usize {
        self.indices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    pub fn indices(&self) -> &[usize] {
        &self.indices
    }

    /// Index position of the n-th hit
    pub fn get(&self, position: usize) -> Option<usize> {
        self.indices.get(position).copied()
    }

    pub fn position_of(&self, index: usize) -> Option<usize> {
        self.indices.iter().position(|&i| i == index)
    }

    pub fn contains(&self, index: usize) -> bool {
        self.position_of(index).is_some()
    }

    /// Resolve the hits to records of the index they were computed against
    #[cfg(test)]
    pub fn records<'a>(&'a self, index: &'a PromptIndex) -> impl Iterator<Item = &'a ImageRecord> {
        self.indices.iter().filter_map(move |&i| index.get(i))
    }
}

impl PromptIndex {
    pub fn search(&self, query: &SearchQuery) -> SearchResult {
        let matcher = query.matcher();
        let indices = self
            .records()
            .iter()
            .enumerate()
            .filter(|(_, record)| matcher.matches(record))
            .map(|(i, _)| i)
            .collect();

        SearchResult { indices }
    }
}
