//! Variable scopes.
//!
//! A [`Scope`] is a handle to one frame of a chain. Frames hold a strong
//! reference to their parent so that a closure keeps its defining frames
//! alive after the call that created them returns. The root of every chain
//! falls through to the shared [`Globals`] table (natives and constants).
//!
//! Frames come in two kinds. Function frames (and the root) are
//! *boundaries*: a plain assignment to a name that is not yet bound anywhere
//! declares it in the nearest boundary. Block frames only hold `var`
//! declarations made directly inside the block.

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use indexmap::IndexMap;

use crate::value::Value;

/// Names shared by every scope of an engine
pub struct Globals {
    table: RefCell<IndexMap<String, Value>>,
    max_call_depth: Cell<usize>,
}

impl Globals {
    pub fn new(max_call_depth: usize) -> Rc<Self> {
        Rc::new(Self {
            table: RefCell::new(IndexMap::new()),
            max_call_depth: Cell::new(max_call_depth),
        })
    }

    pub fn get(&self, name: &str) -> Option<Value> {
        self.table.borrow().get(name).cloned()
    }

    pub fn set(&self, name: impl Into<String>, value: Value) {
        self.table.borrow_mut().insert(name.into(), value);
    }

    pub fn remove(&self, name: &str) -> Option<Value> {
        self.table.borrow_mut().shift_remove(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.table.borrow().contains_key(name)
    }

    /// Names in registration order
    pub fn names(&self) -> Vec<String> {
        self.table.borrow().keys().cloned().collect()
    }

    pub fn max_call_depth(&self) -> usize {
        self.max_call_depth.get()
    }

    pub fn set_max_call_depth(&self, depth: usize) {
        self.max_call_depth.set(depth);
    }
}

impl fmt::Debug for Globals {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Globals")
            .field("names", &self.table.borrow().len())
            .field("max_call_depth", &self.max_call_depth.get())
            .finish()
    }
}

struct Frame {
    variables: RefCell<HashMap<String, Value>>,
    parent: Option<Scope>,
    globals: Rc<Globals>,
    boundary: bool,
}

#[derive(Clone)]
pub struct Scope(Rc<Frame>);

impl Scope {
    /// Root scope over `globals`
    pub fn new(globals: Rc<Globals>) -> Self {
        Self(Rc::new(Frame {
            variables: RefCell::new(HashMap::new()),
            parent: None,
            globals,
            boundary: true,
        }))
    }

    fn child(&self, boundary: bool) -> Self {
        Self(Rc::new(Frame {
            variables: RefCell::new(HashMap::new()),
            parent: Some(self.clone()),
            globals: self.0.globals.clone(),
            boundary,
        }))
    }

    /// Fresh frame for one function invocation
    pub fn function_scope(&self) -> Self {
        self.child(true)
    }

    /// Fresh frame for a `{ ... }` block
    pub fn block_scope(&self) -> Self {
        self.child(false)
    }

    pub fn parent(&self) -> Option<Scope> {
        self.0.parent.clone()
    }

    pub fn globals(&self) -> &Rc<Globals> {
        &self.0.globals
    }

    fn frames(&self) -> impl Iterator<Item = &Scope> {
        std::iter::successors(Some(self), |scope| scope.0.parent.as_ref())
    }

    /// Innermost binding of `name`, then the globals
    pub fn get(&self, name: &str) -> Option<Value> {
        self.frames()
            .find_map(|scope| scope.0.variables.borrow().get(name).cloned())
            .or_else(|| self.0.globals.get(name))
    }

    /// Bind `name` in this frame, shadowing outer bindings
    pub fn declare(&self, name: impl Into<String>, value: Value) {
        self.0.variables.borrow_mut().insert(name.into(), value);
    }

    /// Update the nearest frame already holding `name`, or declare it in the
    /// nearest function frame
    pub fn assign(&self, name: &str, value: Value) {
        for scope in self.frames() {
            let mut variables = scope.0.variables.borrow_mut();
            if let Some(slot) = variables.get_mut(name) {
                *slot = value;
                return;
            }
        }
        let target = self
            .frames()
            .find(|scope| scope.0.boundary)
            .unwrap_or(self);
        target.declare(name, value);
    }

    pub fn has_local(&self, name: &str) -> bool {
        self.0.variables.borrow().contains_key(name)
    }

    /// Every name visible from here: frame variables and globals, deduplicated
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = Vec::new();
        for scope in self.frames() {
            names.extend(scope.0.variables.borrow().keys().cloned());
        }
        names.extend(self.0.globals.names());
        names.sort();
        names.dedup();
        names
    }

    /// Variables bound in this frame only
    pub fn local_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.0.variables.borrow().keys().cloned().collect();
        names.sort();
        names
    }

    pub fn ptr_eq(&self, other: &Scope) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Debug for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Scope")
            .field("locals", &self.local_names())
            .field("depth", &self.frames().count())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn root() -> Scope {
        let globals = Globals::new(200);
        globals.set("pi", Value::Number(std::f64::consts::PI));
        Scope::new(globals)
    }

    #[test]
    fn test_lookup_walks_outward_then_globals() {
        let scope = root();
        scope.declare("x", Value::Number(1.0));
        let inner = scope.function_scope().block_scope();

        assert_eq!(inner.get("x"), Some(Value::Number(1.0)));
        assert_eq!(inner.get("pi"), Some(Value::Number(std::f64::consts::PI)));
        assert_eq!(inner.get("missing"), None);
    }

    #[test]
    fn test_declare_shadows() {
        let scope = root();
        scope.declare("x", Value::Number(1.0));
        let inner = scope.function_scope();
        inner.declare("x", Value::Number(2.0));

        assert_eq!(inner.get("x"), Some(Value::Number(2.0)));
        assert_eq!(scope.get("x"), Some(Value::Number(1.0)));
    }

    #[test]
    fn test_assign_updates_nearest_holder() {
        let scope = root();
        scope.declare("x", Value::Number(1.0));
        let inner = scope.function_scope();
        inner.assign("x", Value::Number(5.0));

        assert_eq!(scope.get("x"), Some(Value::Number(5.0)));
        assert!(!inner.has_local("x"));
    }

    #[test]
    fn test_assign_new_name_skips_block_frames() {
        let scope = root();
        let function = scope.function_scope();
        let block = function.block_scope().block_scope();
        block.assign("y", Value::Bool(true));

        assert!(function.has_local("y"));
        assert!(!block.has_local("y"));
        assert!(!scope.has_local("y"));
    }

    #[test]
    fn test_globals_can_be_shadowed_locally() {
        let scope = root();
        scope.assign("pi", Value::Number(3.0));

        assert_eq!(scope.get("pi"), Some(Value::Number(3.0)));
        assert!(scope.globals().contains("pi"));
    }

    #[test]
    fn test_names_are_sorted_and_unique() {
        let scope = root();
        scope.declare("b", Value::Nothing);
        let inner = scope.block_scope();
        inner.declare("a", Value::Nothing);
        inner.declare("b", Value::Nothing);

        assert_eq!(inner.names(), vec!["a", "b", "pi"]);
    }
}
