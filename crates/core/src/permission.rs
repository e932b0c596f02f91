//! Permission sets and the gate that checks a caller's grants against an
//! action's declared requirements.

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::types::Permission;

/// An ordered set of permission tokens.
///
/// An empty set on an action descriptor means the action is public.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PermissionSet(BTreeSet<Permission>);

impl PermissionSet {
    /// Create an empty set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a token, returning `true` if it was not already present.
    pub fn insert(&mut self, permission: impl Into<Permission>) -> bool {
        self.0.insert(permission.into())
    }

    /// Whether the set contains the given token.
    #[must_use]
    pub fn contains(&self, permission: &str) -> bool {
        self.0.contains(permission)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Iterate over the tokens in sorted order.
    pub fn iter(&self) -> impl Iterator<Item = &Permission> {
        self.0.iter()
    }

    /// Merge another set into this one.
    pub fn extend_from(&mut self, other: &Self) {
        self.0.extend(other.0.iter().cloned());
    }

    /// Parse a comma-separated list of tokens, ignoring blanks.
    ///
    /// ```
    /// use actroute_core::PermissionSet;
    ///
    /// let set = PermissionSet::parse_list("CREATE, MANAGE,,");
    /// assert_eq!(set.len(), 2);
    /// assert!(set.contains("MANAGE"));
    /// ```
    #[must_use]
    pub fn parse_list(raw: &str) -> Self {
        raw.split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(Permission::from)
            .collect()
    }
}

impl<P: Into<Permission>> FromIterator<P> for PermissionSet {
    fn from_iter<I: IntoIterator<Item = P>>(iter: I) -> Self {
        Self(iter.into_iter().map(Into::into).collect())
    }
}

impl fmt::Display for PermissionSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for p in &self.0 {
            if !first {
                f.write_str(",")?;
            }
            f.write_str(p.as_str())?;
            first = false;
        }
        Ok(())
    }
}

/// Result of running the permission gate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateDecision {
    /// Every required token is granted (or nothing is required).
    Allowed,
    /// Some required tokens are missing. The set is for diagnostics only and
    /// must not be rendered to the caller.
    Denied { missing: PermissionSet },
}

impl GateDecision {
    #[must_use]
    pub fn is_allowed(&self) -> bool {
        matches!(self, Self::Allowed)
    }
}

/// Check `required` against `granted`.
///
/// Passes when `required` is empty or is a subset of `granted`; otherwise
/// reports exactly the tokens that are missing.
///
/// ```
/// use actroute_core::{GateDecision, PermissionSet, check_permissions};
///
/// let required: PermissionSet = ["CREATE", "MANAGE"].into_iter().collect();
/// let granted: PermissionSet = ["CREATE"].into_iter().collect();
/// let GateDecision::Denied { missing } = check_permissions(&required, &granted) else {
///     panic!("expected denial");
/// };
/// assert_eq!(missing.to_string(), "MANAGE");
/// ```
#[must_use]
pub fn check_permissions(required: &PermissionSet, granted: &PermissionSet) -> GateDecision {
    let missing: PermissionSet = required
        .iter()
        .filter(|p| !granted.0.contains(*p))
        .cloned()
        .collect();

    if missing.is_empty() {
        GateDecision::Allowed
    } else {
        GateDecision::Denied { missing }
    }
}
