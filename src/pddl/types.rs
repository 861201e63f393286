use std::collections::HashMap;
use std::fmt;

use itertools::Itertools;

use super::ast::TypedList;
use super::DomainError;

/// Root of every PDDL type hierarchy. Accepts objects of any type.
pub const ROOT_TYPE: &str = "object";

/// Single-inheritance tree over object sorts, rooted at [`ROOT_TYPE`].
#[derive(Clone, Debug)]
pub struct TypeHierarchy {
    /// Map of type name to the index of its parent in `names`.
    parents: HashMap<String, Option<usize>>,
    names: Vec<String>,
}

impl Default for TypeHierarchy {
    fn default() -> Self {
        let mut parents = HashMap::new();
        parents.insert(ROOT_TYPE.to_string(), None);
        Self { parents, names: vec![ROOT_TYPE.to_string()] }
    }
}

impl TypeHierarchy {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds the hierarchy from a `:types` section. Parents that are never declared
    /// themselves hang directly under the root.
    pub fn from_ast(lists: &[TypedList]) -> Result<Self, DomainError> {
        let mut hierarchy = Self::new();
        for TypedList { identifiers, kind } in lists {
            hierarchy.intern(kind);
            for identifier in identifiers {
                hierarchy.declare(identifier, kind);
            }
        }
        for name in &hierarchy.names {
            if hierarchy.depth(name).is_none() {
                return Err(DomainError::CyclicType(name.clone()));
            }
        }
        Ok(hierarchy)
    }

    fn index(&self, name: &str) -> Option<usize> {
        self.names.iter().position(|n| n == name)
    }

    fn intern(&mut self, name: &str) -> usize {
        if let Some(idx) = self.index(name) {
            return idx;
        }
        self.names.push(name.to_string());
        self.parents.insert(name.to_string(), Some(0));
        self.names.len() - 1
    }

    /// Declares `name` as a direct subtype of `parent`, replacing an implicit root parent.
    pub fn declare(&mut self, name: &str, parent: &str) {
        if name == ROOT_TYPE {
            return;
        }
        let parent_idx = self.intern(parent);
        self.intern(name);
        self.parents.insert(name.to_string(), Some(parent_idx));
    }

    pub fn contains(&self, name: &str) -> bool {
        self.parents.contains_key(name)
    }

    pub fn parent(&self, name: &str) -> Option<&str> {
        match self.parents.get(name) {
            Some(Some(idx)) => Some(self.names[*idx].as_str()),
            _ => None,
        }
    }

    /// Number of parent links between `name` and the root, `None` for unknown or cyclic types.
    fn depth(&self, name: &str) -> Option<usize> {
        let mut current = name;
        for steps in 0..=self.names.len() {
            match self.parents.get(current)? {
                None => return Some(steps),
                Some(idx) => current = self.names[*idx].as_str(),
            }
        }
        None
    }

    /// True when `kind` equals `ancestor` or `ancestor` lies on its parent chain.
    pub fn is_subtype_of(&self, kind: &str, ancestor: &str) -> bool {
        if ancestor == ROOT_TYPE || kind == ancestor {
            return true;
        }
        let mut current = kind;
        for _ in 0..self.names.len() {
            match self.parent(current) {
                Some(parent) if parent == ancestor => return true,
                Some(parent) => current = parent,
                None => return false,
            }
        }
        false
    }

    /// Type names in declaration order, root first.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(String::as_str)
    }
}

impl fmt::Display for TypeHierarchy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let declared = self.iter().skip(1)
            .map(|name| format!("{} - {}", name, self.parent(name).unwrap_or(ROOT_TYPE)))
            .join(" ");
        write!(f, "{}", declared)
    }
}
