//! Parent/sibling relations derived from each class's declared superclasses.

use std::sync::Arc;

use crate::class::OntologyClass;

/// Direction of a sibling step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum Direction {
    Previous,
    Next,
}

impl Direction {
    pub fn step(&self) -> isize {
        match self {
            Direction::Previous => -1,
            Direction::Next => 1,
        }
    }
}

/// The grouping parent: the first declared superclass, else the root class. A class with
/// neither has no parent and therefore no siblings.
pub fn parent_of(class: &OntologyClass) -> Option<&str> {
    class
        .superclasses_list
        .first()
        .map(String::as_str)
        .or_else(|| class.root())
}

/// Members of `visible` sharing `class`'s parent, the class itself included, in visible order.
pub fn siblings_of(class: &OntologyClass, visible: &[Arc<OntologyClass>]) -> Vec<Arc<OntologyClass>> {
    let Some(parent) = parent_of(class) else {
        return Vec::new();
    };
    visible
        .iter()
        .filter(|c| parent_of(c) == Some(parent))
        .cloned()
        .collect()
}

/// The sibling one step away from `class`, wrapping at both ends. `None` when `class` is not
/// in its own sibling set (a stale reference) or has no other siblings.
pub fn next_sibling(
    class: &OntologyClass,
    visible: &[Arc<OntologyClass>],
    direction: Direction,
) -> Option<Arc<OntologyClass>> {
    let siblings = siblings_of(class, visible);
    if siblings.len() <= 1 {
        return None;
    }
    let position = siblings.iter().position(|s| s.id == class.id)? as isize;
    let count = siblings.len() as isize;
    let mut target = position + direction.step();
    if target < 0 {
        target = count - 1;
    }
    if target >= count {
        target = 0;
    }
    siblings.get(target as usize).cloned()
}
