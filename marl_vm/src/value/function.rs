//! Function values: compiled closures, host natives and partial applications.

use std::fmt;
use std::rc::Rc;

use crate::compile::FunctionTemplate;
use crate::convert::{self, HostType, HostValue};
use crate::error::NativeError;
use crate::scope::Scope;

use super::Value;

/// Host callable behind a native function
pub type NativeFn = Rc<dyn Fn(&[Value]) -> Result<Value, NativeError>>;

/// A callable value. Cloning shares the same function; equality is identity.
#[derive(Clone)]
pub struct Function(Rc<FunctionKind>);

pub enum FunctionKind {
    /// Compiled lambda plus the scope it was created in
    User {
        template: Rc<FunctionTemplate>,
        closure: Scope,
    },
    Native {
        name: String,
        arity: usize,
        callable: NativeFn,
    },
    /// Curried application awaiting the rest of its arguments
    Partial { target: Function, bound: Vec<Value> },
}

impl Function {
    pub(crate) fn user(template: Rc<FunctionTemplate>, closure: Scope) -> Self {
        Self(Rc::new(FunctionKind::User { template, closure }))
    }

    pub fn native(
        name: impl Into<String>,
        arity: usize,
        callable: impl Fn(&[Value]) -> Result<Value, NativeError> + 'static,
    ) -> Self {
        Self(Rc::new(FunctionKind::Native {
            name: name.into(),
            arity,
            callable: Rc::new(callable),
        }))
    }

    pub(crate) fn partial(target: Function, bound: Vec<Value>) -> Self {
        Self(Rc::new(FunctionKind::Partial { target, bound }))
    }

    pub fn kind(&self) -> &FunctionKind {
        &self.0
    }

    /// Number of arguments needed before the body runs
    pub fn arity(&self) -> usize {
        match self.kind() {
            FunctionKind::User { template, .. } => template.parameters.len(),
            FunctionKind::Native { arity, .. } => *arity,
            FunctionKind::Partial { target, bound } => target.arity().saturating_sub(bound.len()),
        }
    }

    pub fn name(&self) -> Option<&str> {
        match self.kind() {
            FunctionKind::Native { name, .. } => Some(name),
            FunctionKind::Partial { target, .. } => target.name(),
            FunctionKind::User { .. } => None,
        }
    }

    /// Outer names referenced by a compiled body; empty for natives
    pub fn free_variables(&self) -> &[String] {
        match self.kind() {
            FunctionKind::User { template, .. } => &template.free_variables,
            FunctionKind::Partial { target, .. } => target.free_variables(),
            FunctionKind::Native { .. } => &[],
        }
    }

    pub fn ptr_eq(&self, other: &Function) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    /// Call with engine values, following the call-dispatch rules
    pub fn invoke(&self, args: &[Value]) -> Value {
        crate::vm::call::call_function(self, args)
    }

    /// Call with host values; arguments and result go through the converter layer
    pub fn call_host(&self, args: Vec<HostValue>) -> HostValue {
        let args: Vec<Value> = args.into_iter().map(HostValue::into_value).collect();
        HostValue::from_value(&self.invoke(&args))
    }

    /// Like [`Function::call_host`], converting the result to `to`. A result
    /// that cannot be converted becomes the default value of `to`.
    pub fn call_as(&self, args: Vec<HostValue>, to: HostType) -> HostValue {
        let converted = convert::convert(self.call_host(args), to);
        if to == HostType::Any || converted.host_type() == to {
            converted
        } else {
            HostValue::default_for(to)
        }
    }
}

impl PartialEq for Function {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

impl fmt::Debug for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind() {
            FunctionKind::User { template, .. } => f
                .debug_struct("UserFunction")
                .field("parameters", &template.parameters)
                .finish(),
            FunctionKind::Native { name, arity, .. } => f
                .debug_struct("NativeFunction")
                .field("name", name)
                .field("arity", arity)
                .finish(),
            FunctionKind::Partial { target, bound } => f
                .debug_struct("Partial")
                .field("target", target)
                .field("bound", &bound.len())
                .finish(),
        }
    }
}

impl fmt::Debug for FunctionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FunctionKind::User { template, .. } => write!(f, "User({:?})", template.parameters),
            FunctionKind::Native { name, .. } => write!(f, "Native({})", name),
            FunctionKind::Partial { bound, .. } => write!(f, "Partial({} bound)", bound.len()),
        }
    }
}
