use std::{collections::HashSet, fmt};

use thiserror::Error;

/// Fully resolved gst-launch graph description.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct PipelineDescription(String);

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ReferenceError {
    #[error("element name {0:?} declared more than once")]
    DuplicateName(String),
    #[error("{0:?} referenced before it was declared")]
    Undeclared(String),
}

impl PipelineDescription {
    pub(crate) fn new(text: String) -> Self {
        Self(text)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }

    /// Names declared by `tee name=<x>`, in declaration order.
    pub fn tee_names(&self) -> Vec<&str> {
        let tokens: Vec<&str> = self.0.split_whitespace().collect();
        tokens
            .windows(2)
            .filter(|pair| pair[0] == "tee")
            .filter_map(|pair| pair[1].strip_prefix("name="))
            .collect()
    }

    /// Number of `<name>.` pad references to `name`.
    pub fn reference_count(&self, name: &str) -> usize {
        self.0
            .split_whitespace()
            .filter_map(reference_target)
            .filter(|target| *target == name)
            .count()
    }

    /// Every referenced element must be declared earlier, and no name twice.
    pub fn check_references(&self) -> Result<(), ReferenceError> {
        let mut declared = HashSet::new();
        for token in self.0.split_whitespace() {
            if let Some(name) = token.strip_prefix("name=") {
                if !declared.insert(name) {
                    return Err(ReferenceError::DuplicateName(name.to_string()));
                }
            } else if let Some(target) = reference_target(token) {
                if !declared.contains(target) {
                    return Err(ReferenceError::Undeclared(target.to_string()));
                }
            }
        }
        Ok(())
    }
}

/// `preproc.` refers to `preproc`; property assignments and caps never do.
fn reference_target(token: &str) -> Option<&str> {
    let target = token.strip_suffix('.')?;
    let is_name = !target.is_empty()
        && target
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
    is_name.then_some(target)
}

impl fmt::Display for PipelineDescription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for PipelineDescription {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// The description as a runnable `gst-launch-1.0` command line.
pub struct LaunchCommand<'a>(pub &'a PipelineDescription);

impl fmt::Display for LaunchCommand<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "gst-launch-1.0 {}", self.0)
    }
}
