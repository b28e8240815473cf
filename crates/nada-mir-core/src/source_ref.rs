use indexmap::IndexSet;
use serde::{Deserialize, Serialize};

/// Location of the DSL statement that produced a graph node.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SourceRef {
    pub file: String,
    pub lineno: u32,
    pub offset: u32,
    pub length: u32,
}

impl SourceRef {
    pub fn new(file: impl Into<String>, lineno: u32, offset: u32, length: u32) -> Self {
        Self {
            file: file.into(),
            lineno,
            offset,
            length,
        }
    }

    /// Placeholder for nodes built without a traceable origin.
    pub fn unknown() -> Self {
        Self::new("<unknown>", 0, 0, 0)
    }

    pub fn is_known(&self) -> bool {
        self.lineno != 0 || self.file != "<unknown>"
    }
}

impl Default for SourceRef {
    fn default() -> Self {
        Self::unknown()
    }
}

/// Deduplicated set of files referenced while building a document, in first-seen order.
#[derive(Debug, Clone, Default)]
pub struct SourceFiles {
    files: IndexSet<String>,
}

impl SourceFiles {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records the file of `source_ref` and hands the reference back for serialisation.
    pub fn record(&mut self, source_ref: &SourceRef) -> SourceRef {
        if source_ref.is_known() && !self.files.contains(&source_ref.file) {
            self.files.insert(source_ref.file.clone());
        }
        source_ref.clone()
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    pub fn clear(&mut self) {
        self.files.clear();
    }

    pub fn to_vec(&self) -> Vec<String> {
        self.files.iter().cloned().collect()
    }
}
