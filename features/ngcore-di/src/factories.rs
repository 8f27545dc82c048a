use std::{any::type_name, sync::Arc};

use crate::{
    errors::ArgError,
    types::{DynError, Injectable, Instance},
};

/// A type the injector can instantiate.
///
/// Which dependencies it receives is declared through the reflector, see
/// [`ClassDecl`](crate::decorators::ClassDecl). They arrive positionally in [`Args`].
pub trait Class: Injectable + Sized {
    /// Constructs a new instance from its resolved dependencies
    fn construct(args: &Args) -> Result<Self, DynError>;
}

/// Type erased constructor or factory function
pub type Construct = Arc<dyn Fn(&Args) -> Result<Instance, DynError> + Send + Sync>;

pub(crate) fn class_constructor<T: Class>() -> Construct {
    Arc::new(|args| T::construct(args).map(Instance::new))
}

/// Resolved constructor dependencies, in parameter order.
///
/// Optional dependencies which were not found are empty slots.
#[derive(Debug, Clone, Default)]
pub struct Args {
    values: Vec<Option<Instance>>,
}

impl Args {
    pub fn new(values: Vec<Option<Instance>>) -> Self {
        Args { values }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Required dependency at `index`
    pub fn get<T: Injectable>(&self, index: usize) -> Result<Arc<T>, ArgError> {
        self.optional(index)?.ok_or(ArgError::Missing { index })
    }

    /// Optional dependency at `index`, `None` if no provider was found
    pub fn optional<T: Injectable>(&self, index: usize) -> Result<Option<Arc<T>>, ArgError> {
        let slot = self.values.get(index).ok_or(ArgError::OutOfRange {
            index,
            len: self.values.len(),
        })?;

        slot.as_ref()
            .map(|instance| {
                instance
                    .downcast::<T>()
                    .map_err(|actual_type| ArgError::WrongType {
                        index,
                        required_type: type_name::<T>(),
                        actual_type,
                    })
            })
            .transpose()
    }

    /// Clones the dependency at `index` out of its `Arc`
    pub fn value<T: Injectable + Clone>(&self, index: usize) -> Result<T, ArgError> {
        self.get::<T>(index).map(|shared| T::clone(&shared))
    }

    /// The untyped instance at `index`
    pub fn instance(&self, index: usize) -> Option<&Instance> {
        self.values.get(index).and_then(Option::as_ref)
    }
}
