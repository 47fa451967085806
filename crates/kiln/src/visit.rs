//! traversal of [Value] trees
//!
//! Visitors are usually closures: any `FnMut(&mut T)` is a [VisitMut<T>].
use crate::value::{Object, Value};

pub trait VisitMut<T> {
    fn visit_mut(&mut self, value: &mut T);
}

impl<T, F> VisitMut<T> for F
where
    F: FnMut(&mut T),
{
    fn visit_mut(&mut self, value: &mut T) {
        self(value)
    }
}

/// Recursively visit all [Object]s mutably
///
/// Traversal is post-order: nested objects are visited before the object containing them.
pub trait VisitObjectsMut {
    fn visit_objects_mut(&mut self, visitor: &mut dyn VisitMut<Object>);
}

impl VisitObjectsMut for Value {
    fn visit_objects_mut(&mut self, visitor: &mut dyn VisitMut<Object>) {
        match self {
            Value::Object(object) => object.visit_objects_mut(visitor),
            Value::Array(array) => {
                for value in array {
                    value.visit_objects_mut(visitor);
                }
            }
            Value::Null
            | Value::Boolean(_)
            | Value::Integer(_)
            | Value::Decimal(_)
            | Value::String(_) => {}
        }
    }
}

impl VisitObjectsMut for Object {
    fn visit_objects_mut(&mut self, visitor: &mut dyn VisitMut<Object>) {
        for value in self.values_mut() {
            value.visit_objects_mut(visitor);
        }

        visitor.visit_mut(self);
    }
}
