//! Declared-name bookkeeping for redeclaration errors.

use bitflags::bitflags;
use rustc_hash::FxHashSet;

bitflags! {
    #[derive(Clone, Copy, Debug, PartialEq, Eq)]
    pub(crate) struct ScopeFlags: u8 {
        const TOP = 1 << 0;
        const FUNCTION = 1 << 1;
        /// A catch clause whose parameter is a plain identifier.
        const SIMPLE_CATCH = 1 << 2;
        const STATIC_BLOCK = 1 << 3;
    }
}

impl ScopeFlags {
    /// Scopes that stop `var` hoisting.
    const VAR: ScopeFlags = ScopeFlags::TOP
        .union(ScopeFlags::FUNCTION)
        .union(ScopeFlags::STATIC_BLOCK);
}

/// How a name enters the current scope.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum BindingKind {
    /// `var` declarations and function parameters.
    Var,
    /// `let`, `const`, `class`, imports and strict-mode block functions.
    Lexical,
    /// Sloppy-mode function declarations, which may repeat inside a block.
    Function,
    /// The identifier parameter of a catch clause.
    SimpleCatch,
}

#[derive(Debug)]
struct Scope {
    flags: ScopeFlags,
    var: FxHashSet<String>,
    lexical: FxHashSet<String>,
    functions: FxHashSet<String>,
    catch_param: Option<String>,
}

impl Scope {
    fn new(flags: ScopeFlags) -> Self {
        Self {
            flags,
            var: FxHashSet::default(),
            lexical: FxHashSet::default(),
            functions: FxHashSet::default(),
            catch_param: None,
        }
    }
}

#[derive(Debug)]
pub(crate) struct ScopeStack {
    scopes: Vec<Scope>,
    module: bool,
}

impl ScopeStack {
    pub(crate) fn new(module: bool) -> Self {
        Self {
            scopes: vec![Scope::new(ScopeFlags::TOP)],
            module,
        }
    }

    pub(crate) fn enter(&mut self, flags: ScopeFlags) {
        self.scopes.push(Scope::new(flags));
    }

    pub(crate) fn exit(&mut self) {
        if self.scopes.len() > 1 {
            self.scopes.pop();
        }
    }

    pub(crate) fn at_top_level(&self) -> bool {
        self.scopes.len() == 1
    }

    fn current(&mut self) -> &mut Scope {
        let last = self.scopes.len() - 1;
        &mut self.scopes[last]
    }

    fn functions_are_var(&self, scope: &Scope) -> bool {
        scope.flags.contains(ScopeFlags::FUNCTION)
            || (!self.module && scope.flags.contains(ScopeFlags::TOP))
    }

    /// Whether declarations in the current scope treat function names as `var`.
    pub(crate) fn treats_functions_as_var(&self) -> bool {
        self.scopes
            .last()
            .is_some_and(|scope| self.functions_are_var(scope))
    }

    /// Records `name`. Returns `false` when it clashes with an earlier declaration.
    pub(crate) fn declare(&mut self, name: &str, kind: BindingKind) -> bool {
        match kind {
            BindingKind::Lexical => {
                let scope = self.current();
                let clash = scope.lexical.contains(name)
                    || scope.functions.contains(name)
                    || scope.var.contains(name);
                scope.lexical.insert(name.to_string());
                !clash
            }
            BindingKind::SimpleCatch => {
                let scope = self.current();
                scope.lexical.insert(name.to_string());
                scope.catch_param = Some(name.to_string());
                true
            }
            BindingKind::Function => {
                let as_var = self.treats_functions_as_var();
                let scope = self.current();
                let clash = if as_var {
                    scope.lexical.contains(name)
                } else {
                    scope.lexical.contains(name) || scope.var.contains(name)
                };
                scope.functions.insert(name.to_string());
                !clash
            }
            BindingKind::Var => {
                for i in (0..self.scopes.len()).rev() {
                    let scope = &self.scopes[i];
                    let catch_exempt = scope.flags.contains(ScopeFlags::SIMPLE_CATCH)
                        && scope.catch_param.as_deref() == Some(name);
                    if (scope.lexical.contains(name) && !catch_exempt)
                        || (!self.functions_are_var(scope) && scope.functions.contains(name))
                    {
                        return false;
                    }
                    let scope = &mut self.scopes[i];
                    scope.var.insert(name.to_string());
                    if scope.flags.intersects(ScopeFlags::VAR) {
                        break;
                    }
                }
                true
            }
        }
    }

    /// Whether `name` is declared at the top level of the program.
    pub(crate) fn declared_at_top(&self, name: &str) -> bool {
        let top = &self.scopes[0];
        top.var.contains(name) || top.lexical.contains(name) || top.functions.contains(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lexical_redeclaration() {
        let mut scopes = ScopeStack::new(false);
        assert!(scopes.declare("x", BindingKind::Lexical));
        assert!(!scopes.declare("x", BindingKind::Lexical));
        assert!(!scopes.declare("x", BindingKind::Var));
    }

    #[test]
    fn var_hoists_through_blocks() {
        let mut scopes = ScopeStack::new(false);
        assert!(scopes.declare("x", BindingKind::Lexical));
        scopes.enter(ScopeFlags::empty());
        assert!(!scopes.declare("x", BindingKind::Var));
        scopes.exit();

        scopes.enter(ScopeFlags::empty());
        assert!(scopes.declare("y", BindingKind::Var));
        scopes.exit();
        assert!(!scopes.declare("y", BindingKind::Lexical));
    }

    #[test]
    fn function_scope_stops_hoisting() {
        let mut scopes = ScopeStack::new(false);
        assert!(scopes.declare("x", BindingKind::Lexical));
        scopes.enter(ScopeFlags::FUNCTION);
        assert!(scopes.declare("x", BindingKind::Var));
        scopes.exit();
    }

    #[test]
    fn simple_catch_parameter_allows_var() {
        let mut scopes = ScopeStack::new(false);
        scopes.enter(ScopeFlags::SIMPLE_CATCH);
        assert!(scopes.declare("e", BindingKind::SimpleCatch));
        assert!(scopes.declare("e", BindingKind::Var));
        assert!(!scopes.declare("e", BindingKind::Lexical));
    }

    #[test]
    fn sloppy_block_functions_may_repeat() {
        let mut scopes = ScopeStack::new(false);
        scopes.enter(ScopeFlags::empty());
        assert!(scopes.declare("f", BindingKind::Function));
        assert!(scopes.declare("f", BindingKind::Function));
        assert!(!scopes.declare("f", BindingKind::Lexical));
    }

    #[test]
    fn module_top_level_functions_are_lexical() {
        let mut scopes = ScopeStack::new(true);
        assert!(scopes.declare("f", BindingKind::Function));
        assert!(!scopes.declare("f", BindingKind::Var));
        assert!(scopes.declared_at_top("f"));
    }
}
