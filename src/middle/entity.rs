//! Named entities produced by declarations
//!
//! An entity is created exactly once, at its declaration site, and is then
//! shared by reference with every use site that resolves to it. Entities
//! are never mutated after creation.

use crate::types::Type;
use serde::Serialize;
use std::rc::Rc;

/// A declared variable or function parameter
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Variable {
    pub name: String,
    pub ty: Type,
    pub mutable: bool,
}

impl Variable {
    pub fn new(name: impl Into<String>, ty: Type, mutable: bool) -> Rc<Self> {
        Rc::new(Self {
            name: name.into(),
            ty,
            mutable,
        })
    }
}

/// A declared function
///
/// The return type is the type of the body expression; Brolga functions
/// have no return-type annotation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Function {
    pub name: String,
    pub parameters: Vec<Rc<Variable>>,
    pub return_type: Type,
}

impl Function {
    pub fn new(name: impl Into<String>, parameters: Vec<Rc<Variable>>, return_type: Type) -> Rc<Self> {
        Rc::new(Self {
            name: name.into(),
            parameters,
            return_type,
        })
    }
}

/// What a name in scope is bound to
#[derive(Debug, Clone, PartialEq)]
pub enum Entity {
    Variable(Rc<Variable>),
    Function(Rc<Function>),
}
