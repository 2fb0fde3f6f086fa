//! Scoped storage tracking.
//!
//! A chain of name -> binding environments, one per open lexical block. The
//! bottom environment holds module level declarations and lives as long as
//! the chain itself.

use std::collections::HashMap;

#[derive(Debug)]
pub struct Environment<V> {
    bindings: HashMap<String, V>,
}

impl<V> Environment<V> {
    fn new() -> Self {
        Environment {
            bindings: HashMap::new(),
        }
    }

    pub fn get(&self, name: &str) -> Option<&V> {
        self.bindings.get(name)
    }
}

#[derive(Debug)]
pub struct Scopes<V> {
    environments: Vec<Environment<V>>,
}

impl<V> Default for Scopes<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V> Scopes<V> {
    /// Creates a chain holding only the global environment.
    pub fn new() -> Self {
        Scopes {
            environments: vec![Environment::new()],
        }
    }

    pub fn enter_scope(&mut self) {
        self.environments.push(Environment::new());
    }

    /// Pops the innermost environment. The global environment is never popped.
    pub fn exit_scope(&mut self) {
        debug_assert!(self.environments.len() > 1, "exit_scope on the global scope");
        if self.environments.len() > 1 {
            self.environments.pop();
        }
    }

    /// Binds `name` in the innermost environment, shadowing outer bindings.
    pub fn declare(&mut self, name: impl Into<String>, value: V) {
        if let Some(environment) = self.environments.last_mut() {
            environment.bindings.insert(name.into(), value);
        }
    }

    pub fn declare_global(&mut self, name: impl Into<String>, value: V) {
        self.environments[0].bindings.insert(name.into(), value);
    }

    pub fn lookup(&self, name: &str) -> Option<&V> {
        self.environments
            .iter()
            .rev()
            .find_map(|environment| environment.get(name))
    }

    /// Number of open environments, the global one included.
    pub fn depth(&self) -> usize {
        self.environments.len()
    }

    /// Drops every environment except the global one.
    pub fn reset_to_global(&mut self) {
        self.environments.truncate(1);
    }

    /// Drops every binding, the global ones included.
    pub fn clear(&mut self) {
        self.environments.clear();
        self.environments.push(Environment::new());
    }
}
