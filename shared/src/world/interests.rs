use std::collections::{HashMap, HashSet};

use crate::types::{AttributeHandle, ClassHandle};

/// The local federate's publication interests: which object classes, and
/// which attributes of them, it publishes. Acquisition requests are only
/// legal for published attributes.
#[derive(Debug, Default)]
pub struct InterestTable {
    published: HashMap<ClassHandle, HashSet<AttributeHandle>>,
}

impl InterestTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces any previous publication for the class.
    pub fn publish_object_class(
        &mut self,
        class: ClassHandle,
        attributes: HashSet<AttributeHandle>,
    ) {
        self.published.insert(class, attributes);
    }

    pub fn unpublish_object_class(&mut self, class: ClassHandle) {
        self.published.remove(&class);
    }

    pub fn is_class_published(&self, class: ClassHandle) -> bool {
        self.published.contains_key(&class)
    }

    pub fn is_attribute_published(&self, class: ClassHandle, attribute: AttributeHandle) -> bool {
        self.published
            .get(&class)
            .is_some_and(|attributes| attributes.contains(&attribute))
    }

    pub fn published_attributes(&self, class: ClassHandle) -> HashSet<AttributeHandle> {
        self.published.get(&class).cloned().unwrap_or_default()
    }
}
