//! Structural equality of policy documents

use crate::types::PolicyDocument;

/// Two documents are equal when their parsed JSON trees are equal.
///
/// Object key order and whitespace in the serialized form never matter.
/// Array order does, so `["a","b"]` and `["b","a"]` are different documents.
pub fn policies_equal(a: &PolicyDocument, b: &PolicyDocument) -> bool {
    a.as_value() == b.as_value()
}
