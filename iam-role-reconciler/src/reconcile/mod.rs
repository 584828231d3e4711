//! Pure policy set comparison: no provider access happens here.

pub mod compare;
pub mod diff;

pub use compare::policies_equal;
pub use diff::diff_policy_sets;
