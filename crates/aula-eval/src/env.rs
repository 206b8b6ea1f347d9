//! Lexical scope tree for the Aula evaluator.
//!
//! Scopes live in an arena owned by the run and are addressed by
//! [`ScopeId`]. Each scope knows its parent and children; nothing is freed
//! until the run is reset, so the post-run symbol report can read the whole
//! tree.

use crate::error::SemanticError;
use crate::value::Value;
use aula_types::ast::FunctionDecl;
use aula_types::{DataType, Span};
use std::collections::BTreeMap;
use std::rc::Rc;

/// Index of a scope in its [`ScopeTree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ScopeId(usize);

/// A named, typed storage cell owned by one scope.
#[derive(Debug, Clone, PartialEq)]
pub struct Symbol {
    pub id: String,
    pub value: Value,
    pub data_type: DataType,
    pub is_const: bool,
    pub span: Span,
}

impl Symbol {
    pub fn new(id: impl Into<String>, data_type: DataType, value: Value, span: Span) -> Self {
        Self {
            id: id.into(),
            value,
            data_type,
            is_const: false,
            span,
        }
    }

    pub fn with_const(mut self, is_const: bool) -> Self {
        self.is_const = is_const;
        self
    }
}

#[derive(Debug, Clone)]
struct Scope {
    name: String,
    parent: Option<ScopeId>,
    children: Vec<ScopeId>,
    symbols: BTreeMap<String, Symbol>,
    functions: BTreeMap<String, Rc<FunctionDecl>>,
}

impl Scope {
    fn new(name: String, parent: Option<ScopeId>) -> Self {
        Self {
            name,
            parent,
            children: Vec::new(),
            symbols: BTreeMap::new(),
            functions: BTreeMap::new(),
        }
    }
}

/// Arena of scopes rooted at a single global scope.
///
/// Variables and functions live in separate namespaces, so a variable and a
/// function may share a name.
#[derive(Debug, Clone)]
pub struct ScopeTree {
    scopes: Vec<Scope>,
}

impl ScopeTree {
    pub const GLOBAL_NAME: &'static str = "Global";

    /// Create a tree holding only the global scope.
    pub fn new() -> Self {
        Self {
            scopes: vec![Scope::new(Self::GLOBAL_NAME.to_string(), None)],
        }
    }

    pub fn global(&self) -> ScopeId {
        ScopeId(0)
    }

    /// Allocate a new scope whose parent is `parent`.
    pub fn create_child(&mut self, parent: ScopeId, name: impl Into<String>) -> ScopeId {
        let id = ScopeId(self.scopes.len());
        self.scopes.push(Scope::new(name.into(), Some(parent)));
        self.scopes[parent.0].children.push(id);
        id
    }

    pub fn name(&self, scope: ScopeId) -> &str {
        &self.scopes[scope.0].name
    }

    pub fn parent(&self, scope: ScopeId) -> Option<ScopeId> {
        self.scopes[scope.0].parent
    }

    pub fn children(&self, scope: ScopeId) -> &[ScopeId] {
        &self.scopes[scope.0].children
    }

    /// `scope` followed by each of its ancestors up to the root.
    pub fn ancestors(&self, scope: ScopeId) -> impl Iterator<Item = ScopeId> + '_ {
        std::iter::successors(Some(scope), move |s| self.parent(*s))
    }

    pub fn global_of(&self, scope: ScopeId) -> ScopeId {
        self.ancestors(scope).last().unwrap_or(scope)
    }

    pub fn len(&self) -> usize {
        self.scopes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scopes.is_empty()
    }

    // ── Variables ─────────────────────────────────────────────────────────

    /// Insert `symbol` into `scope`. Fails if the name is already bound there.
    pub fn declare(&mut self, scope: ScopeId, symbol: Symbol) -> Result<(), SemanticError> {
        let symbols = &mut self.scopes[scope.0].symbols;
        if symbols.contains_key(&symbol.id) {
            return Err(SemanticError::DuplicateDeclaration { name: symbol.id });
        }
        symbols.insert(symbol.id.clone(), symbol);
        Ok(())
    }

    /// Innermost symbol named `id` visible from `scope`.
    pub fn lookup(&self, scope: ScopeId, id: &str) -> Option<&Symbol> {
        self.ancestors(scope)
            .find_map(|s| self.scopes[s.0].symbols.get(id))
    }

    /// Symbol named `id` in `scope` itself, ignoring ancestors.
    pub fn lookup_local(&self, scope: ScopeId, id: &str) -> Option<&Symbol> {
        self.scopes[scope.0].symbols.get(id)
    }

    /// Store `value` into the innermost symbol named `id`.
    ///
    /// The symbol is left untouched on failure.
    pub fn assign(&mut self, scope: ScopeId, id: &str, value: Value) -> Result<(), SemanticError> {
        let owner = self
            .ancestors(scope)
            .find(|s| self.scopes[s.0].symbols.contains_key(id))
            .ok_or_else(|| SemanticError::UndeclaredIdentifier { name: id.to_string() })?;
        let symbol = self.scopes[owner.0]
            .symbols
            .get_mut(id)
            .ok_or_else(|| SemanticError::UndeclaredIdentifier { name: id.to_string() })?;
        if symbol.is_const {
            return Err(SemanticError::ConstViolation { name: id.to_string() });
        }
        if value.data_type() != symbol.data_type {
            return Err(SemanticError::TypeMismatch(format!(
                "`{id}` is {}, cannot store {}",
                symbol.data_type,
                value.data_type()
            )));
        }
        symbol.value = value;
        Ok(())
    }

    /// Drop the variables and child scopes of `scope`, keeping the scope itself.
    ///
    /// Children are unlinked, not freed: their arena slots stay until the run
    /// ends. Each slot costs at least one step to create, so the step budget
    /// bounds the arena. Arrays declared in the dropped scopes stay in the
    /// [`ArrayStore`](crate::ArrayStore) under the run's element limit.
    pub fn reset(&mut self, scope: ScopeId) {
        let s = &mut self.scopes[scope.0];
        s.symbols.clear();
        s.children.clear();
    }

    pub fn symbols(&self, scope: ScopeId) -> impl Iterator<Item = &Symbol> {
        self.scopes[scope.0].symbols.values()
    }

    // ── Functions ─────────────────────────────────────────────────────────

    pub fn declare_function(
        &mut self,
        scope: ScopeId,
        decl: Rc<FunctionDecl>,
    ) -> Result<(), SemanticError> {
        let functions = &mut self.scopes[scope.0].functions;
        let name = decl.name.name.clone();
        if functions.contains_key(&name) {
            return Err(SemanticError::DuplicateFunction { name });
        }
        functions.insert(name, decl);
        Ok(())
    }

    pub fn lookup_function(&self, scope: ScopeId, name: &str) -> Option<Rc<FunctionDecl>> {
        self.ancestors(scope)
            .find_map(|s| self.scopes[s.0].functions.get(name))
            .cloned()
    }

    pub fn functions(&self, scope: ScopeId) -> impl Iterator<Item = &Rc<FunctionDecl>> {
        self.scopes[scope.0].functions.values()
    }
}

impl Default for ScopeTree {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use aula_types::ast::{Block, Ident};

    fn int(tree: &mut ScopeTree, scope: ScopeId, id: &str, n: i64) {
        tree.declare(
            scope,
            Symbol::new(id, DataType::Integer, Value::Integer(n), Span::point(1, 1)),
        )
        .unwrap();
    }

    fn function(name: &str) -> Rc<FunctionDecl> {
        Rc::new(FunctionDecl {
            name: Ident::new(name, Span::point(1, 1)),
            return_type: None,
            params: vec![],
            body: Block::new(vec![], Span::point(1, 1)),
            span: Span::point(1, 1),
        })
    }

    #[test]
    fn test_shadowing() {
        let mut tree = ScopeTree::new();
        let global = tree.global();
        int(&mut tree, global, "x", 1);
        let inner = tree.create_child(global, "inner");
        int(&mut tree, inner, "x", 2);
        let innermost = tree.create_child(inner, "innermost");

        assert_eq!(tree.lookup(innermost, "x").unwrap().value, Value::Integer(2));
        assert_eq!(tree.lookup(global, "x").unwrap().value, Value::Integer(1));
        assert!(tree.lookup_local(innermost, "x").is_none());
        assert_eq!(tree.lookup_local(inner, "x").unwrap().value, Value::Integer(2));
    }

    #[test]
    fn test_siblings_do_not_see_each_other() {
        let mut tree = ScopeTree::new();
        let global = tree.global();
        let a = tree.create_child(global, "a");
        let b = tree.create_child(global, "b");
        int(&mut tree, a, "only_a", 1);
        assert!(tree.lookup(b, "only_a").is_none());
        assert_eq!(tree.global_of(b), global);
        assert_eq!(tree.children(global), &[a, b]);
    }

    #[test]
    fn test_duplicate_declaration() {
        let mut tree = ScopeTree::new();
        let global = tree.global();
        int(&mut tree, global, "x", 1);
        let err = tree
            .declare(
                global,
                Symbol::new("x", DataType::Integer, Value::Integer(2), Span::point(2, 1)),
            )
            .unwrap_err();
        assert_eq!(err, SemanticError::DuplicateDeclaration { name: "x".into() });
        assert_eq!(tree.lookup(global, "x").unwrap().value, Value::Integer(1));
    }

    #[test]
    fn test_assign_updates_innermost_owner() {
        let mut tree = ScopeTree::new();
        let global = tree.global();
        int(&mut tree, global, "x", 1);
        let inner = tree.create_child(global, "inner");
        tree.assign(inner, "x", Value::Integer(5)).unwrap();
        assert_eq!(tree.lookup(global, "x").unwrap().value, Value::Integer(5));
    }

    #[test]
    fn test_assign_constant_fails_and_keeps_value() {
        let mut tree = ScopeTree::new();
        let global = tree.global();
        tree.declare(
            global,
            Symbol::new("k", DataType::Integer, Value::Integer(7), Span::point(1, 1))
                .with_const(true),
        )
        .unwrap();
        for v in [Value::Integer(8), Value::Integer(7), Value::Decimal(1.0)] {
            assert_eq!(
                tree.assign(global, "k", v),
                Err(SemanticError::ConstViolation { name: "k".into() })
            );
        }
        assert_eq!(tree.lookup(global, "k").unwrap().value, Value::Integer(7));
    }

    #[test]
    fn test_assign_type_mismatch_and_undeclared() {
        let mut tree = ScopeTree::new();
        let global = tree.global();
        int(&mut tree, global, "x", 1);
        assert!(matches!(
            tree.assign(global, "x", Value::Decimal(1.0)),
            Err(SemanticError::TypeMismatch(_))
        ));
        assert_eq!(
            tree.assign(global, "nope", Value::Integer(1)),
            Err(SemanticError::UndeclaredIdentifier { name: "nope".into() })
        );
    }

    #[test]
    fn test_functions_use_separate_namespace() {
        let mut tree = ScopeTree::new();
        let global = tree.global();
        int(&mut tree, global, "area", 1);
        tree.declare_function(global, function("area")).unwrap();
        assert_eq!(
            tree.declare_function(global, function("area")),
            Err(SemanticError::DuplicateFunction { name: "area".into() })
        );
        let inner = tree.create_child(global, "inner");
        assert!(tree.lookup_function(inner, "area").is_some());
        assert!(tree.lookup_function(inner, "perimeter").is_none());
    }

    #[test]
    fn test_reset_clears_bindings() {
        let mut tree = ScopeTree::new();
        let global = tree.global();
        let body = tree.create_child(global, "body");
        int(&mut tree, body, "i", 1);
        tree.create_child(body, "nested");
        tree.reset(body);
        assert!(tree.lookup_local(body, "i").is_none());
        assert!(tree.children(body).is_empty());
        int(&mut tree, body, "i", 2);
    }
}
