//! pruning of structurally empty values
//!
//! Serializing a typed payload yields every field, including the ones never set. Pruning removes object entries
//! that hold a zero value ([Value::is_zero]) so the rendered output only contains what a document declared, and
//! serializing the same document twice yields the same bytes.
//!
//! Removing an entry can leave its parent empty, so passes repeat until nothing changes.
use crate::value::{Object, Value};
use crate::visit::VisitObjectsMut;

/// Remove all zero entries from all objects in `value`
pub fn normalize(mut value: Value) -> Value {
    let mut passes = 0;
    loop {
        passes += 1;
        let removed = prune(&mut value);
        tracing::trace!(passes, removed, "normalization pass");

        if removed == 0 {
            return value;
        }
    }
}

/// One pass. Returns the number of removed entries.
fn prune(value: &mut Value) -> usize {
    let mut removed = 0;
    value.visit_objects_mut(&mut |object: &mut Object| {
        let before = object.len();
        object.retain(|_key, value| !value.is_zero());
        removed += before - object.len();
    });

    removed
}
