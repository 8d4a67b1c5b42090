//! Arena-backed lexical scopes.
//!
//! Every scope lives in one [`ScopeArena`] and names its parent by index, so
//! child scopes can be created while the arena is borrowed elsewhere only by
//! id. Lookups walk the parent chain up to the module root.

use std::{collections::HashMap, fmt::Display};

use crate::type_checker::types::{Signature, Type};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ScopeId(pub usize);

impl Display for ScopeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "scope#{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct VariableItem {
    pub ty: Type,
    pub mutable: bool,
    /// Index into the owning function's locals.
    pub slot: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ParameterItem {
    pub ty: Type,
    pub is_out: bool,
    pub index: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FieldItem {
    pub ty: Type,
    pub mutable: bool,
    pub is_static: bool,
    pub owner: String,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct FunctionItem {
    pub overloads: Vec<Signature>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ScopeItem {
    Variable(VariableItem),
    Parameter(ParameterItem),
    Field(FieldItem),
    Function(FunctionItem),
}

impl ScopeItem {
    /// Type of the value this name denotes. Functions are not values.
    pub fn value_type(&self) -> Option<&Type> {
        match self {
            ScopeItem::Variable(v) => Some(&v.ty),
            ScopeItem::Parameter(p) => Some(&p.ty),
            ScopeItem::Field(f) => Some(&f.ty),
            ScopeItem::Function(_) => None,
        }
    }
}

/// Item kinds that can be requested from [`ScopeArena::lookup`].
pub trait ScopeItemKind: Sized {
    fn from_item(item: &ScopeItem) -> Option<&Self>;
}

macro_rules! scope_item_kind {
    ($ty:ty, $variant:ident) => {
        impl ScopeItemKind for $ty {
            fn from_item(item: &ScopeItem) -> Option<&Self> {
                match item {
                    ScopeItem::$variant(inner) => Some(inner),
                    _ => None,
                }
            }
        }
    };
}

scope_item_kind!(VariableItem, Variable);
scope_item_kind!(ParameterItem, Parameter);
scope_item_kind!(FieldItem, Field);
scope_item_kind!(FunctionItem, Function);

#[derive(Debug, Clone, Default)]
pub struct Scope {
    pub parent: Option<ScopeId>,
    items: HashMap<String, ScopeItem>,
    type_aliases: HashMap<String, Type>,
}

impl Scope {
    pub fn get(&self, name: &str) -> Option<&ScopeItem> {
        self.items.get(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &String> {
        self.items.keys()
    }

    pub fn items(&self) -> impl Iterator<Item = (&String, &ScopeItem)> {
        self.items.iter()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

#[derive(Debug, Clone)]
pub struct ScopeArena {
    scopes: Vec<Scope>,
}

impl Default for ScopeArena {
    fn default() -> Self {
        ScopeArena::new()
    }
}

impl ScopeArena {
    /// Creates an arena holding only the root scope.
    pub fn new() -> Self {
        ScopeArena {
            scopes: vec![Scope::default()],
        }
    }

    pub fn root(&self) -> ScopeId {
        ScopeId(0)
    }

    pub fn child_scope(&mut self, parent: ScopeId) -> ScopeId {
        self.scopes.push(Scope {
            parent: Some(parent),
            ..Scope::default()
        });
        ScopeId(self.scopes.len() - 1)
    }

    pub fn get(&self, scope: ScopeId) -> Option<&Scope> {
        self.scopes.get(scope.0)
    }

    pub fn parent(&self, scope: ScopeId) -> Option<ScopeId> {
        self.get(scope).and_then(|s| s.parent)
    }

    pub fn len(&self) -> usize {
        self.scopes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scopes.is_empty()
    }

    /// Declares `name` in `scope`.
    ///
    /// Functions merge into the existing overload set of the same scope. Any
    /// other collision leaves the scope untouched.
    ///
    /// # Returns
    ///
    /// `false` when the name is already taken in this scope level.
    pub fn declare(&mut self, scope: ScopeId, name: &str, item: ScopeItem) -> bool {
        let Some(target) = self.scopes.get_mut(scope.0) else {
            return false;
        };

        if let Some(existing) = target.items.get_mut(name) {
            return match (existing, item) {
                (ScopeItem::Function(existing), ScopeItem::Function(added)) => {
                    existing.overloads.extend(added.overloads);
                    true
                }
                _ => false,
            };
        }

        target.items.insert(name.to_string(), item);
        true
    }

    /// Finds the nearest item named `name`, whatever its kind.
    pub fn lookup_item(&self, scope: ScopeId, name: &str) -> Option<&ScopeItem> {
        self.chain(scope).find_map(|s| s.items.get(name))
    }

    /// Finds the nearest item named `name` of kind `T`. Items of another kind
    /// with the same name do not stop the walk.
    pub fn lookup<T: ScopeItemKind>(&self, scope: ScopeId, name: &str) -> Option<&T> {
        self.chain(scope)
            .filter_map(|s| s.items.get(name))
            .find_map(T::from_item)
    }

    /// Like [`ScopeArena::lookup_item`] but also returns the scope that
    /// holds the item.
    pub fn lookup_with_scope(&self, scope: ScopeId, name: &str) -> Option<(ScopeId, &ScopeItem)> {
        let mut current = Some(scope);
        while let Some(id) = current {
            let s = self.get(id)?;
            if let Some(item) = s.items.get(name) {
                return Some((id, item));
            }
            current = s.parent;
        }
        None
    }

    /// Returns false when the alias already exists in this scope level.
    pub fn declare_alias(&mut self, scope: ScopeId, name: &str, target: Type) -> bool {
        let Some(s) = self.scopes.get_mut(scope.0) else {
            return false;
        };

        if s.type_aliases.contains_key(name) {
            return false;
        }

        s.type_aliases.insert(name.to_string(), target);
        true
    }

    /// Inner aliases shadow outer ones.
    pub fn lookup_alias(&self, scope: ScopeId, name: &str) -> Option<&Type> {
        self.chain(scope).find_map(|s| s.type_aliases.get(name))
    }

    /// Every name visible from `scope`, sorted and without duplicates.
    pub fn all_names(&self, scope: ScopeId) -> Vec<String> {
        let mut names = self
            .chain(scope)
            .flat_map(|s| s.items.keys().cloned())
            .collect::<Vec<String>>();
        names.sort();
        names.dedup();
        names
    }

    /// Visible names whose item satisfies `filter`.
    pub fn names_where(&self, scope: ScopeId, filter: impl Fn(&ScopeItem) -> bool) -> Vec<String> {
        let mut names = self
            .chain(scope)
            .flat_map(|s| s.items.iter())
            .filter(|(_, item)| filter(item))
            .map(|(name, _)| name.clone())
            .collect::<Vec<String>>();
        names.sort();
        names.dedup();
        names
    }

    fn chain(&self, scope: ScopeId) -> ScopeChain<'_> {
        ScopeChain {
            arena: self,
            current: Some(scope),
        }
    }
}

/// Iterator from a scope up to the root.
struct ScopeChain<'a> {
    arena: &'a ScopeArena,
    current: Option<ScopeId>,
}

impl<'a> Iterator for ScopeChain<'a> {
    type Item = &'a Scope;

    fn next(&mut self) -> Option<Self::Item> {
        let scope = self.arena.get(self.current?)?;
        self.current = scope.parent;
        Some(scope)
    }
}
