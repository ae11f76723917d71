//! Identifier checks and dotted-name helpers.

use smallvec::SmallVec;

use crate::error::DefError;

/// Whether `name` is a single identifier: letters, digits and `_`, not
/// starting with a digit.
pub fn is_ident(name: &str) -> bool {
    let mut bytes = name.bytes();
    match bytes.next() {
        Some(b) if b.is_ascii_alphabetic() || b == b'_' => {}
        _ => return false,
    }
    bytes.all(|b| b.is_ascii_alphanumeric() || b == b'_')
}

/// Whether `name` is a dotted sequence of identifiers with no empty
/// component.
pub fn is_full_ident(name: &str) -> bool {
    !name.is_empty() && name.split('.').all(is_ident)
}

pub(crate) fn check_ident(name: &str) -> Result<(), DefError> {
    if is_ident(name) {
        Ok(())
    } else {
        Err(DefError::InvalidName { name: name.to_owned() })
    }
}

pub(crate) fn check_full_ident(name: &str) -> Result<(), DefError> {
    if is_full_ident(name) {
        Ok(())
    } else {
        Err(DefError::InvalidName { name: name.to_owned() })
    }
}

/// `prefix.name`, or just `name` for an empty prefix.
pub fn join(prefix: &str, name: &str) -> String {
    if prefix.is_empty() {
        name.to_owned()
    } else {
        let mut s = String::with_capacity(prefix.len() + 1 + name.len());
        s.push_str(prefix);
        s.push('.');
        s.push_str(name);
        s
    }
}

/// The last component of a dotted name.
pub fn short_name(full: &str) -> &str {
    full.rsplit_once('.').map_or(full, |(_, s)| s)
}

/// Everything before the last component, or `""`.
pub fn parent_scope(full: &str) -> &str {
    full.rsplit_once('.').map_or("", |(p, _)| p)
}

/// The default JSON name: underscores dropped, the letter after each one
/// upper-cased.
pub fn json_name(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut upper = false;
    for c in name.chars() {
        if c == '_' {
            upper = true;
        } else if upper {
            out.push(c.to_ascii_uppercase());
            upper = false;
        } else {
            out.push(c);
        }
    }
    out
}

/// Candidate full names for `sym` referenced from `base`, most specific
/// first.
///
/// A leading `.` makes `sym` absolute. Otherwise `sym` is tried in `base`,
/// then in each enclosing scope of `base`, and finally at the root.
pub fn scope_candidates(base: &str, sym: &str) -> SmallVec<[String; 4]> {
    let mut out = SmallVec::new();
    if let Some(abs) = sym.strip_prefix('.') {
        out.push(abs.to_owned());
        return out;
    }
    let mut scope = base;
    while !scope.is_empty() {
        out.push(join(scope, sym));
        scope = parent_scope(scope);
    }
    out.push(sym.to_owned());
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identifiers() {
        assert!(is_ident("foo_Bar9"));
        assert!(is_ident("_x"));
        assert!(!is_ident(""));
        assert!(!is_ident("9a"));
        assert!(!is_ident("a.b"));
        assert!(is_full_ident("google.protobuf"));
        assert!(!is_full_ident("google..protobuf"));
        assert!(!is_full_ident(".google"));
        assert!(!is_full_ident("google."));
    }

    #[test]
    fn json_names() {
        assert_eq!(json_name("foo_bar_baz"), "fooBarBaz");
        assert_eq!(json_name("already"), "already");
        assert_eq!(json_name("trailing_"), "trailing");
        assert_eq!(json_name("__x"), "X");
    }

    #[test]
    fn candidates_walk_outward() {
        let c = scope_candidates("a.b.C", "D");
        assert_eq!(c.as_slice(), ["a.b.C.D", "a.b.D", "a.D", "D"]);
        let abs = scope_candidates("a.b", ".x.Y");
        assert_eq!(abs.as_slice(), ["x.Y"]);
        let root = scope_candidates("", "Y");
        assert_eq!(root.as_slice(), ["Y"]);
    }

    #[test]
    fn short_and_parent() {
        assert_eq!(short_name("a.b.C"), "C");
        assert_eq!(short_name("C"), "C");
        assert_eq!(parent_scope("a.b.C"), "a.b");
        assert_eq!(parent_scope("C"), "");
    }

    #[cfg(not(miri))]
    mod proptests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn last_candidate_is_bare(
                base in "[a-z]{1,4}(\\.[a-z]{1,4}){0,3}",
                sym in "[A-Z][a-z]{0,4}",
            ) {
                let c = scope_candidates(&base, &sym);
                prop_assert_eq!(c.len(), base.split('.').count() + 1);
                prop_assert_eq!(c.last().map(String::as_str), Some(sym.as_str()));
                prop_assert_eq!(&c[0], &join(&base, &sym));
            }
        }
    }
}
