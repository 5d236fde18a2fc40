//! Symbol table: a tree of scopes rooted at a distinguished global scope,
//! plus the call-local symbol counter the bytecode compiler uses to hand
//! out register indices. Grounded on the enter/exit-scope stack pattern
//! of a teacher typechecker, generalized from a flat `Vec` of frames to
//! an explicit parent-linked tree so a function call scope can be
//! parented directly at `global`, bypassing whatever scope called it.
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use log::debug;

use crate::diagnostics::EngineError;
use crate::position::Position;
use crate::value::Value;

#[derive(Debug, Clone)]
pub enum Symbol {
    Variable {
        mutable: bool,
        value: Value,
        register_index: Option<usize>,
    },
}

impl Symbol {
    pub fn value(&self) -> &Value {
        let Symbol::Variable { value, .. } = self;
        value
    }

    pub fn register_index(&self) -> Option<usize> {
        let Symbol::Variable { register_index, .. } = self;
        *register_index
    }
}

#[derive(Debug)]
struct ScopeNode {
    parent: Option<Scope>,
    table: HashMap<String, Symbol>,
}

/// A handle to one node in the scope tree. Cheap to clone; scopes are
/// shared, never copied.
#[derive(Debug, Clone)]
pub struct Scope(Rc<RefCell<ScopeNode>>);

impl Scope {
    fn root() -> Self {
        Self(Rc::new(RefCell::new(ScopeNode {
            parent: None,
            table: HashMap::new(),
        })))
    }

    fn child_of(parent: &Scope) -> Self {
        Self(Rc::new(RefCell::new(ScopeNode {
            parent: Some(parent.clone()),
            table: HashMap::new(),
        })))
    }

    fn parent(&self) -> Option<Scope> {
        self.0.borrow().parent.clone()
    }

    fn ptr_eq(&self, other: &Scope) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    /// Walks parents to find the scope that owns `name`, if any.
    fn resolve(&self, name: &str) -> Option<Scope> {
        let mut scope = self.clone();
        loop {
            if scope.0.borrow().table.contains_key(name) {
                return Some(scope);
            }
            scope = scope.parent()?;
        }
    }
}

/// Saved `(current, symbol_count)` pair so a function call can run with
/// an independent register numbering and the caller's state can be
/// restored exactly, per the "explicit saved/restored pair" design note.
pub struct CallFrame {
    scope: Scope,
    symbol_count: usize,
}

pub struct SymbolTable {
    global: Scope,
    current: Scope,
    symbol_count: usize,
}

impl SymbolTable {
    pub fn new() -> Self {
        let global = Scope::root();
        Self {
            current: global.clone(),
            global,
            symbol_count: 0,
        }
    }

    pub fn is_global_scope(&self) -> bool {
        self.current.ptr_eq(&self.global)
    }

    /// The current call's next register index; after compiling a whole
    /// program or function body this is the count to allocate.
    pub fn symbol_count(&self) -> usize {
        self.symbol_count
    }

    pub fn enter_scope(&mut self) {
        self.current = Scope::child_of(&self.current);
    }

    pub fn exit_scope(&mut self) {
        if let Some(parent) = self.current.parent() {
            self.current = parent;
        }
    }

    /// Begins a function call scope parented directly at `global`,
    /// resetting the register counter; `end_call` restores both.
    pub fn begin_call(&mut self) -> CallFrame {
        debug!("entering call scope, parented at global");
        let saved = CallFrame {
            scope: self.current.clone(),
            symbol_count: self.symbol_count,
        };
        self.current = Scope::child_of(&self.global);
        self.symbol_count = 0;
        saved
    }

    pub fn end_call(&mut self, saved: CallFrame) {
        debug!("restoring caller's scope after call");
        self.current = saved.scope;
        self.symbol_count = saved.symbol_count;
    }

    /// Defines a mutable or constant variable in the current scope
    /// without allocating a register index (interpreter path).
    pub fn define(
        &mut self,
        name: &str,
        value: Value,
        mutable: bool,
        position: Position,
    ) -> Result<(), EngineError> {
        self.define_raw(name, value, mutable, None, position)
    }

    /// Defines a variable and allocates the next register index in the
    /// current call's counter (compiler path).
    pub fn define_indexed(
        &mut self,
        name: &str,
        mutable: bool,
        position: Position,
    ) -> Result<usize, EngineError> {
        let index = self.symbol_count;
        self.symbol_count += 1;
        self.define_raw(name, Value::Void, mutable, Some(index), position)?;
        Ok(index)
    }

    fn define_raw(
        &mut self,
        name: &str,
        value: Value,
        mutable: bool,
        register_index: Option<usize>,
        position: Position,
    ) -> Result<(), EngineError> {
        let mut node = self.current.0.borrow_mut();
        if node.table.contains_key(name) {
            return Err(EngineError::Runtime {
                message: format!("duplicate definition of '{name}' in this scope"),
                position,
            });
        }
        node.table.insert(
            name.to_owned(),
            Symbol::Variable {
                mutable,
                value,
                register_index,
            },
        );
        Ok(())
    }

    pub fn lookup(&self, name: &str, position: Position) -> Result<Symbol, EngineError> {
        let scope = self
            .current
            .resolve(name)
            .ok_or_else(|| EngineError::SymbolNotFound {
                name: name.to_owned(),
                position,
            })?;
        Ok(scope.0.borrow().table.get(name).unwrap().clone())
    }

    /// Whether `name` resolves through the global scope specifically, as
    /// opposed to a local call-frame scope — the compiler needs this to
    /// choose `GLoad`/`GStore` vs `Load`/`Store`.
    pub fn is_global(&self, name: &str) -> Result<bool, EngineError> {
        let scope = self
            .current
            .resolve(name)
            .ok_or_else(|| EngineError::SymbolNotFound {
                name: name.to_owned(),
                position: Position::new(0, 0),
            })?;
        Ok(scope.ptr_eq(&self.global))
    }

    pub fn assign(&mut self, name: &str, value: Value, position: Position) -> Result<(), EngineError> {
        let scope = self
            .current
            .resolve(name)
            .ok_or_else(|| EngineError::SymbolNotFound {
                name: name.to_owned(),
                position,
            })?;
        let mut node = scope.0.borrow_mut();
        let Symbol::Variable { mutable, value: slot, .. } = node.table.get_mut(name).unwrap();
        if !*mutable {
            return Err(EngineError::Runtime {
                message: format!("can't assign to constant '{name}'"),
                position,
            });
        }
        *slot = value;
        Ok(())
    }
}

impl Default for SymbolTable {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const HERE: Position = Position {
        line: 0,
        character: 0,
    };

    #[test]
    fn inner_scope_variable_is_invisible_after_exit() {
        let mut table = SymbolTable::new();
        table.enter_scope();
        table.define("x", Value::Integer(1.into()), true, HERE).unwrap();
        assert!(table.lookup("x", HERE).is_ok());
        table.exit_scope();
        assert!(table.lookup("x", HERE).is_err());
    }

    #[test]
    fn duplicate_define_in_same_scope_errors() {
        let mut table = SymbolTable::new();
        table.define("x", Value::Integer(1.into()), true, HERE).unwrap();
        let err = table.define("x", Value::Integer(2.into()), true, HERE);
        assert!(err.is_err());
    }

    #[test]
    fn call_scope_does_not_see_callers_locals() {
        let mut table = SymbolTable::new();
        table.enter_scope();
        table.define("local", Value::Integer(1.into()), true, HERE).unwrap();
        let saved = table.begin_call();
        assert!(table.lookup("local", HERE).is_err());
        table.end_call(saved);
        assert!(table.lookup("local", HERE).is_ok());
    }

    #[test]
    fn assigning_to_constant_is_rejected() {
        let mut table = SymbolTable::new();
        table.define("x", Value::Integer(1.into()), false, HERE).unwrap();
        let err = table.assign("x", Value::Integer(2.into()), HERE).unwrap_err();
        assert!(matches!(err, EngineError::Runtime { .. }));
    }

    #[test]
    fn define_indexed_allocates_sequential_registers_per_call() {
        let mut table = SymbolTable::new();
        let saved = table.begin_call();
        let a = table.define_indexed("a", true, HERE).unwrap();
        let b = table.define_indexed("b", true, HERE).unwrap();
        assert_eq!((a, b), (0, 1));
        table.end_call(saved);
    }
}
