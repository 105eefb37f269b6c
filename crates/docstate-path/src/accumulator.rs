//! Path accumulation for recursive walks over nested documents.

use crate::PathStep;

/// The rendered path of the node currently being visited, plus the list
/// boundaries crossed on the way down.
///
/// Every `descend` call returns a new accumulator and leaves `self` untouched,
/// so a recursive walker can hand a child path to each branch without undoing
/// anything on the way back up. The rendered form is extended in place, so
/// building a child path costs the length of the parent path once and never
/// re-renders earlier steps.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PathAccumulator {
    rendered: String,
    /// Byte lengths of `rendered` at each list boundary, outermost first.
    boundaries: Vec<usize>,
}

impl PathAccumulator {
    /// The document root.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the accumulator for a child step.
    ///
    /// # Example
    ///
    /// ```
    /// use docstate_path::{PathAccumulator, PathStep};
    ///
    /// let root = PathAccumulator::new();
    /// let deep = root.descend(&PathStep::from("files")).descend(&PathStep::Index(2));
    /// assert_eq!(deep.render(), "files.2");
    /// assert_eq!(root.render(), "");
    /// ```
    pub fn descend(&self, step: &PathStep) -> Self {
        match step {
            PathStep::Field(name) => self.field(name),
            PathStep::Index(i) => self.index(*i),
        }
    }

    /// Returns the accumulator for a field step.
    pub fn field(&self, name: &str) -> Self {
        let mut rendered = String::with_capacity(self.rendered.len() + name.len() + 1);
        rendered.push_str(&self.rendered);
        if !rendered.is_empty() {
            rendered.push('.');
        }
        rendered.push_str(name);
        Self {
            rendered,
            boundaries: self.boundaries.clone(),
        }
    }

    /// Returns the accumulator for a list index step.
    pub fn index(&self, i: usize) -> Self {
        let mut rendered = String::with_capacity(self.rendered.len() + 8);
        rendered.push_str(&self.rendered);
        if !rendered.is_empty() {
            rendered.push('.');
        }
        rendered.push_str(&i.to_string());
        Self {
            rendered,
            boundaries: self.boundaries.clone(),
        }
    }

    /// Marks the current position as a list boundary.
    ///
    /// Steps taken from the returned accumulator address elements of that
    /// list, and [`boundaries`](Self::boundaries) reports the list's path.
    pub fn enter_list(&self) -> Self {
        let mut boundaries = self.boundaries.clone();
        boundaries.push(self.rendered.len());
        Self {
            rendered: self.rendered.clone(),
            boundaries,
        }
    }

    /// The dot-joined rendering of the current path.
    pub fn render(&self) -> &str {
        &self.rendered
    }

    /// Rendered paths of every list boundary crossed, outermost first.
    ///
    /// # Example
    ///
    /// ```
    /// use docstate_path::PathAccumulator;
    ///
    /// let acc = PathAccumulator::new()
    ///     .field("outer")
    ///     .enter_list()
    ///     .index(0)
    ///     .field("inner")
    ///     .enter_list()
    ///     .index(1)
    ///     .field("key");
    /// assert_eq!(acc.render(), "outer.0.inner.1.key");
    /// assert_eq!(acc.boundaries().collect::<Vec<_>>(), vec!["outer", "outer.0.inner"]);
    /// ```
    pub fn boundaries(&self) -> impl Iterator<Item = &str> + '_ {
        self.boundaries.iter().map(move |&len| &self.rendered[..len])
    }
}
