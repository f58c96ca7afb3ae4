use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Capability contract of an embedded widget: how it is tagged in exports
/// and whether the editor treats it as one atomic unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InlineComponentSpec {
    pub name: String,
    pub tag: String,
    pub atomic: bool,
}

#[derive(Debug, Clone, Default)]
pub struct InlineComponentsRegistry {
    specs: HashMap<String, InlineComponentSpec>,
}

impl InlineComponentsRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register_component(&mut self, spec: InlineComponentSpec) {
        self.specs.insert(spec.name.clone(), spec);
    }

    pub fn lookup(&self, name: &str) -> Option<&InlineComponentSpec> {
        self.specs.get(name)
    }

    pub fn is_registered(&self, name: &str) -> bool {
        self.specs.contains_key(name)
    }
}
