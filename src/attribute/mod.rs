//! Named per-element attributes and their reconstruction from `PointData` / `CellData`.
//!
//! An [`AttributeManager`] holds any number of [`VariableAttribute`]s keyed by name. Each
//! attribute stores one value per element (vertex or cell) with a default for elements
//! that were never set. Values are one of three storage scalars ([`StorageKind`]) grouped
//! as a scalar, a `[T; 2]`, a `[T; 3]` or a `Vec<T>` depending on the component count.

mod reconstruct;

pub use reconstruct::{build_attribute, read_attribute_block, select_storage};

use crate::prelude::*;

use std::any::Any;
use std::collections::BTreeMap;
use std::fmt;

/// natural width of element indices
pub type Index = u32;

/// The scalar an attribute stores its components as
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageKind {
    /// every floating point array
    Double,
    /// unsigned integers that fit in `Index`
    Index,
    /// any other integer array (`i64`)
    Long,
}

impl StorageKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Double => "double",
            Self::Index => "index",
            Self::Long => "long",
        }
    }
}

/// A scalar an attribute may be stored as
pub trait StorageScalar: Numeric {
    const KIND: StorageKind;
}

impl StorageScalar for f64 {
    const KIND: StorageKind = StorageKind::Double;
}

impl StorageScalar for Index {
    const KIND: StorageKind = StorageKind::Index;
}

impl StorageScalar for i64 {
    const KIND: StorageKind = StorageKind::Long;
}

/// The value held for one element: a scalar or a group of components
pub trait AttributeValue: Clone + fmt::Debug + 'static {
    type Scalar: StorageScalar;

    fn components(&self) -> usize;

    fn set_component(&mut self, component: usize, value: Self::Scalar);
}

macro_rules! scalar_value {
    ($($t:ty),*) => {
        $(
            impl AttributeValue for $t {
                type Scalar = $t;

                fn components(&self) -> usize {
                    1
                }

                fn set_component(&mut self, _component: usize, value: Self::Scalar) {
                    *self = value;
                }
            }
        )*
    };
}

scalar_value!(f64, Index, i64);

impl<T: StorageScalar, const N: usize> AttributeValue for [T; N] {
    type Scalar = T;

    fn components(&self) -> usize {
        N
    }

    fn set_component(&mut self, component: usize, value: T) {
        self[component] = value;
    }
}

impl<T: StorageScalar> AttributeValue for Vec<T> {
    type Scalar = T;

    fn components(&self) -> usize {
        self.len()
    }

    fn set_component(&mut self, component: usize, value: T) {
        self[component] = value;
    }
}

/// One value per element, `default` for elements that were never set
#[derive(Debug, Clone, PartialEq)]
pub struct VariableAttribute<V> {
    default: V,
    values: Vec<V>,
}

impl<V: AttributeValue> VariableAttribute<V> {
    pub fn new(default: V) -> Self {
        Self {
            default,
            values: Vec::new(),
        }
    }

    pub fn default_value(&self) -> &V {
        &self.default
    }

    pub fn value(&self, element: usize) -> &V {
        self.values.get(element).unwrap_or(&self.default)
    }

    pub fn set_value(&mut self, element: usize, value: V) {
        self.grow_to(element);
        self.values[element] = value;
    }

    /// change the value of `element` in place, starting from the default if it was never set
    pub fn modify_value<F: FnOnce(&mut V)>(&mut self, element: usize, modify: F) {
        self.grow_to(element);
        modify(&mut self.values[element]);
    }

    /// number of elements that hold a value (set or filled with the default)
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn values(&self) -> &[V] {
        &self.values
    }

    fn grow_to(&mut self, element: usize) {
        if element >= self.values.len() {
            self.values.resize(element + 1, self.default.clone());
        }
    }
}

/// Type erased view of a `VariableAttribute`
pub trait GenericAttribute: fmt::Debug {
    fn storage(&self) -> StorageKind;

    fn components(&self) -> usize;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn as_any(&self) -> &dyn Any;

    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl<V: AttributeValue> GenericAttribute for VariableAttribute<V> {
    fn storage(&self) -> StorageKind {
        V::Scalar::KIND
    }

    fn components(&self) -> usize {
        self.default.components()
    }

    fn len(&self) -> usize {
        self.values.len()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// Attributes of one kind of element (vertices or cells), keyed by name
#[derive(Debug, Default)]
pub struct AttributeManager {
    attributes: BTreeMap<String, Box<dyn GenericAttribute>>,
}

impl AttributeManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn find_generic_attribute(&self, name: &str) -> Option<&dyn GenericAttribute> {
        self.attributes.get(name).map(|attribute| &**attribute)
    }

    /// the attribute `name` if it exists and holds values of type `V`
    pub fn find_attribute<V: AttributeValue>(&self, name: &str) -> Option<&VariableAttribute<V>> {
        self.attributes
            .get(name)
            .and_then(|attribute| attribute.as_any().downcast_ref())
    }

    /// Return the attribute `name`, creating it with `default` if it does not exist yet.
    ///
    /// An existing attribute is never replaced: if it stores a different scalar or a
    /// different number of components the call fails.
    pub fn find_or_create_attribute<V: AttributeValue>(
        &mut self,
        name: &str,
        default: V,
    ) -> Result<&mut VariableAttribute<V>, ParseError> {
        let requested_components = default.components();

        let attribute = self
            .attributes
            .entry(name.to_string())
            .or_insert_with(|| {
                log::debug!(
                    "creating {} attribute `{}` with {} components",
                    V::Scalar::KIND.as_str(),
                    name,
                    requested_components
                );
                Box::new(VariableAttribute::new(default))
            });

        let existing_storage = attribute.storage();
        let existing_components = attribute.components();

        if existing_storage != V::Scalar::KIND {
            let conflict = error::AttributeConflict::new(
                name.into(),
                existing_storage.as_str(),
                V::Scalar::KIND.as_str(),
            );
            return Err(error::Structural::from(conflict).into());
        }

        if existing_components != requested_components {
            let mismatch =
                error::ComponentMismatch::new(name.into(), existing_components, requested_components);
            return Err(error::Shape::from(mismatch).into());
        }

        attribute
            .as_any_mut()
            .downcast_mut::<VariableAttribute<V>>()
            .ok_or_else(|| {
                // same scalar and component count, but a different grouping (`[T; 3]` vs `Vec<T>`)
                let mismatch = error::ComponentMismatch::new(
                    name.into(),
                    existing_components,
                    requested_components,
                );
                error::Shape::from(mismatch).into()
            })
    }

    pub fn attribute_names(&self) -> impl Iterator<Item = &str> {
        self.attributes.keys().map(|name| name.as_str())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.attributes.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.attributes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.attributes.is_empty()
    }
}
