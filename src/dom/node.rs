//! Element types: ElementId, ElementData.

use slotmap::new_key_type;

new_key_type! {
    /// Unique identifier for a document element. Copy, lightweight (u64).
    pub struct ElementId;
}

/// The style-relevant data of one element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElementData {
    /// Tag name (type selector), e.g. `"div"`.
    pub tag: String,
    /// Optional unique id (CSS #id selector).
    pub id: Option<String>,
    /// CSS classes in document order (for .class selector).
    pub classes: Vec<String>,
    /// Active pseudo-classes such as `hover` or `focus`.
    pub pseudo_classes: Vec<String>,
}

impl ElementData {
    /// Create a new element with the given tag and no id, classes or state.
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            id: None,
            classes: Vec::new(),
            pseudo_classes: Vec::new(),
        }
    }

    /// Set the CSS id (builder).
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// Add a single CSS class (builder).
    pub fn with_class(mut self, class: impl Into<String>) -> Self {
        self.add_class(&class.into());
        self
    }

    /// Add multiple CSS classes (builder).
    pub fn with_classes(mut self, classes: impl IntoIterator<Item = impl Into<String>>) -> Self {
        for class in classes {
            self.add_class(&class.into());
        }
        self
    }

    /// Activate a pseudo-class (builder).
    pub fn with_pseudo_class(mut self, pseudo_class: impl Into<String>) -> Self {
        self.set_pseudo_class(&pseudo_class.into(), true);
        self
    }

    /// Check whether this element has a given CSS class.
    pub fn has_class(&self, class: &str) -> bool {
        self.classes.iter().any(|c| c == class)
    }

    /// Add a CSS class. No-op if already present.
    pub fn add_class(&mut self, class: &str) {
        if !self.has_class(class) {
            self.classes.push(class.to_owned());
        }
    }

    /// Remove a CSS class. No-op if not present.
    pub fn remove_class(&mut self, class: &str) {
        self.classes.retain(|c| c != class);
    }

    /// Toggle a CSS class: add if absent, remove if present.
    pub fn toggle_class(&mut self, class: &str) {
        if self.has_class(class) {
            self.remove_class(class);
        } else {
            self.add_class(class);
        }
    }

    pub fn has_pseudo_class(&self, pseudo_class: &str) -> bool {
        self.pseudo_classes.iter().any(|p| p == pseudo_class)
    }

    /// Turn a pseudo-class on or off.
    pub fn set_pseudo_class(&mut self, pseudo_class: &str, active: bool) {
        match (active, self.has_pseudo_class(pseudo_class)) {
            (true, false) => self.pseudo_classes.push(pseudo_class.to_owned()),
            (false, true) => self.pseudo_classes.retain(|p| p != pseudo_class),
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_defaults() {
        let data = ElementData::new("button");
        assert_eq!(data.tag, "button");
        assert!(data.id.is_none());
        assert!(data.classes.is_empty());
        assert!(data.pseudo_classes.is_empty());
    }

    #[test]
    fn builder_with_id() {
        let data = ElementData::new("h1").with_id("title");
        assert_eq!(data.id.as_deref(), Some("title"));
    }

    #[test]
    fn builder_with_classes_dedup() {
        let data = ElementData::new("div").with_class("a").with_classes(["a", "b"]);
        assert_eq!(data.classes, vec!["a", "b"]);
    }

    #[test]
    fn toggle_class() {
        let mut data = ElementData::new("p");
        data.toggle_class("active");
        assert!(data.has_class("active"));
        data.toggle_class("active");
        assert!(!data.has_class("active"));
        data.remove_class("nonexistent");
        assert!(data.classes.is_empty());
    }

    #[test]
    fn pseudo_classes() {
        let mut data = ElementData::new("button").with_pseudo_class("hover");
        assert!(data.has_pseudo_class("hover"));
        data.set_pseudo_class("hover", true);
        assert_eq!(data.pseudo_classes.len(), 1);
        data.set_pseudo_class("hover", false);
        assert!(!data.has_pseudo_class("hover"));
    }

    #[test]
    fn element_id_is_copy() {
        fn assert_copy<T: Copy>() {}
        assert_copy::<ElementId>();
    }
}
