//! In-memory prompt history.

/// Insertion-ordered, append-only list of submitted prompts.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct History {
    prompts: Vec<String>,
}

impl History {
    pub(crate) fn push(&mut self, prompt: impl Into<String>) {
        self.prompts.push(prompt.into());
    }

    pub(crate) fn get(&self, index: usize) -> Option<&str> {
        self.prompts.get(index).map(String::as_str)
    }

    pub(crate) fn len(&self) -> usize {
        self.prompts.len()
    }

    pub(crate) fn to_vec(&self) -> Vec<String> {
        self.prompts.clone()
    }
}
