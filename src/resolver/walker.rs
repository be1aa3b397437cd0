//! Transitive reference walker
//!
//! Depth-first, pre-order traversal of the static reference graph starting at
//! a root module. Each newly discovered module is loaded through the registry
//! and yielded exactly once per visited set. The traversal keeps an explicit
//! stack of reference cursors, so pathological graph depth cannot overflow
//! the call stack.

use std::collections::HashSet;
use std::vec;
use tracing::trace;

use crate::module::traits::{ModuleIdentity, ModuleRc, ModuleRegistry};
use crate::resolver::error::ResolveError;
use crate::resolver::exclusion::ExclusionSet;

/// Codebases already entered during one resolution
#[derive(Debug, Clone, Default)]
pub struct VisitedSet {
    codebases: HashSet<String>,
}

impl VisitedSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark a codebase visited; returns false if it already was
    pub fn insert(&mut self, codebase: impl Into<String>) -> bool {
        self.codebases.insert(codebase.into())
    }

    pub fn contains(&self, codebase: &str) -> bool {
        self.codebases.contains(codebase)
    }

    pub fn len(&self) -> usize {
        self.codebases.len()
    }

    pub fn is_empty(&self) -> bool {
        self.codebases.is_empty()
    }
}

enum Visited<'a> {
    Owned(VisitedSet),
    Borrowed(&'a mut VisitedSet),
}

impl Visited<'_> {
    fn get(&self) -> &VisitedSet {
        match self {
            Visited::Owned(set) => set,
            Visited::Borrowed(set) => set,
        }
    }

    fn get_mut(&mut self) -> &mut VisitedSet {
        match self {
            Visited::Owned(set) => set,
            Visited::Borrowed(set) => set,
        }
    }
}

/// Lazy depth-first walk over a module's transitive references
///
/// Yields `Err` once if the registry fails to load a module, then ends.
pub struct TransitiveWalker<'a> {
    registry: &'a dyn ModuleRegistry,
    exclusions: &'a ExclusionSet,
    visited: Visited<'a>,
    /// One cursor per entered module, innermost last
    stack: Vec<vec::IntoIter<ModuleIdentity>>,
    failed: bool,
}

impl<'a> TransitiveWalker<'a> {
    /// Walk from `root` with a fresh visited set
    pub fn new(
        registry: &'a dyn ModuleRegistry,
        exclusions: &'a ExclusionSet,
        root: &ModuleRc,
    ) -> Self {
        Self::start(registry, exclusions, Visited::Owned(VisitedSet::new()), root)
    }

    /// Walk from `root`, sharing a visited set with earlier walks
    ///
    /// Modules entered by an earlier walk are neither loaded nor yielded again.
    pub fn with_visited(
        registry: &'a dyn ModuleRegistry,
        exclusions: &'a ExclusionSet,
        root: &ModuleRc,
        visited: &'a mut VisitedSet,
    ) -> Self {
        Self::start(registry, exclusions, Visited::Borrowed(visited), root)
    }

    fn start(
        registry: &'a dyn ModuleRegistry,
        exclusions: &'a ExclusionSet,
        visited: Visited<'a>,
        root: &ModuleRc,
    ) -> Self {
        let mut walker = Self {
            registry,
            exclusions,
            visited,
            stack: Vec::new(),
            failed: false,
        };
        walker.enter(root);
        walker
    }

    /// Visited set as it stands
    pub fn visited(&self) -> &VisitedSet {
        self.visited.get()
    }

    fn enter(&mut self, module: &ModuleRc) {
        let identity = module.identity();
        if !self.visited.get_mut().insert(identity.codebase.clone()) {
            trace!("Already entered {}, not descending", identity);
            return;
        }
        self.stack.push(module.static_references().into_iter());
    }
}

impl Iterator for TransitiveWalker<'_> {
    type Item = Result<ModuleRc, ResolveError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }

        loop {
            let cursor = self.stack.last_mut()?;
            let Some(reference) = cursor.next() else {
                self.stack.pop();
                continue;
            };

            if self.visited.get().contains(&reference.codebase) {
                trace!("Skipping visited reference {}", reference);
                continue;
            }

            if self.exclusions.is_excluded(&reference.name) {
                trace!("Skipping excluded reference {}", reference);
                continue;
            }

            let module = match self.registry.load_module(&reference) {
                Ok(module) => module,
                Err(e) => {
                    self.failed = true;
                    self.stack.clear();
                    return Some(Err(e.into()));
                }
            };

            self.enter(&module);
            return Some(Ok(module));
        }
    }
}
