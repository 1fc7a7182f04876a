//! A globally-interned string library for the Augur ecosystem.
//!
//! This crate provides `Atom`, a canonical string type that guarantees any
//! given string is stored in memory only once. It wraps the `ustr` crate and
//! adds constructors for the string manipulations the analyzer performs in
//! hot paths: lowercasing, concatenation, and number formatting.
//!
//! Because every `Atom` carries a pre-computed hash and compares by pointer,
//! it is the key type for every symbol map in the analyzer: two equal fully
//! qualified names always intern to the same `Atom`.
//!
//! # Usage
//!
//! ```
//! use augur_atom::*;
//!
//! let s1 = atom("Hello");
//! let s2 = ascii_lowercase_atom("Hello");
//!
//! assert_eq!(s2.as_str(), "hello");
//!
//! let mut map = AtomMap::default();
//! map.insert(s1, 123);
//! ```

use std::collections::HashMap;
use std::collections::HashSet;
use std::hash::BuildHasherDefault;

use ustr::IdentityHasher;

pub use ustr::Ustr as Atom;
pub use ustr::ustr as atom;

/// A `HashMap` keyed by `Atom`.
///
/// Lookups use the `Atom`'s pre-computed hash instead of re-hashing the
/// string content, which makes this map significantly faster than a standard
/// `HashMap<String, V>` for symbol tables.
pub type AtomMap<V> = HashMap<Atom, V, BuildHasherDefault<IdentityHasher>>;

/// A `HashSet` of `Atom`s using the pre-computed hash.
pub type AtomSet = HashSet<Atom, BuildHasherDefault<IdentityHasher>>;

/// The maximum size in bytes for a string to be assembled on the stack.
const STACK_BUF_SIZE: usize = 256;

thread_local! {
    static EMPTY_ATOM: Atom = atom("");
}

/// Returns the canonical `Atom` for an empty string.
#[inline]
#[must_use]
pub fn empty_atom() -> Atom {
    EMPTY_ATOM.with(|&atom| atom)
}

/// A macro to concatenate between 2 and 6 string slices into a single `Atom`.
///
/// Dispatches to a specialized, zero-heap-allocation function based on the
/// number of arguments provided.
///
/// # Panics
///
/// Panics at compile time if called with 0, 1, or more than 6 arguments.
#[macro_export]
macro_rules! concat_atom {
    ($s1:expr, $s2:expr $(,)?) => {
        $crate::concat_atom2(&$s1, &$s2)
    };
    ($s1:expr, $s2:expr, $s3:expr $(,)?) => {
        $crate::concat_atom3(&$s1, &$s2, &$s3)
    };
    ($s1:expr, $s2:expr, $s3:expr, $s4:expr $(,)?) => {
        $crate::concat_atom4(&$s1, &$s2, &$s3, &$s4)
    };
    ($s1:expr, $s2:expr, $s3:expr, $s4:expr, $s5:expr $(,)?) => {
        $crate::concat_atom5(&$s1, &$s2, &$s3, &$s4, &$s5)
    };
    ($s1:expr, $s2:expr, $s3:expr, $s4:expr, $s5:expr, $s6:expr $(,)?) => {
        $crate::concat_atom6(&$s1, &$s2, &$s3, &$s4, &$s5, &$s6)
    };
    ($($arg:expr),+ $(,)?) => {
        compile_error!("concat_atom! macro supports between 2 and 6 arguments only")
    };
}

/// Creates an `Atom` from a lowercased version of a string slice.
///
/// Performs a fast scan first; if the string is already lowercase ASCII, it
/// is interned without any new allocation. Otherwise the lowercase form is
/// built on the stack for strings up to `STACK_BUF_SIZE` bytes.
#[inline]
#[must_use]
pub fn ascii_lowercase_atom(s: &str) -> Atom {
    let bytes = s.as_bytes();

    let mut needs_lowercasing = false;
    let mut is_ascii = true;
    for &b in bytes {
        if b > 127 {
            is_ascii = false;
            break;
        }
        if b.is_ascii_uppercase() {
            needs_lowercasing = true;
        }
    }

    if is_ascii && !needs_lowercasing {
        return atom(s);
    }

    if is_ascii && s.len() <= STACK_BUF_SIZE {
        let mut stack_buf = [0u8; STACK_BUF_SIZE];
        for (i, &b) in bytes.iter().enumerate() {
            stack_buf[i] = b.to_ascii_lowercase();
        }
        return atom(
            // SAFETY: ASCII lowercase of ASCII bytes is valid UTF-8.
            unsafe { std::str::from_utf8_unchecked(&stack_buf[..s.len()]) },
        );
    }

    atom(&s.to_lowercase())
}

/// A helper macro to generate the specialized `*_atom` functions for integer types.
macro_rules! integer_to_atom_fns {
    ( $( $func_name:ident($num_type:ty) ),+ $(,)? ) => {
        $(
            #[doc = "Creates an `Atom` from a `"]
            #[doc = stringify!($num_type)]
            #[doc = "` value with zero heap allocations."]
            #[inline]
            #[must_use]
            pub fn $func_name(n: $num_type) -> Atom {
                let mut buffer = itoa::Buffer::new();
                let s = buffer.format(n);

                atom(s)
            }
        )+
    };
}

/// A helper macro to generate the specialized `concat_atomN` functions.
macro_rules! concat_fns {
    ( $( $func_name:ident($n:literal, $($s:ident),+) ),+ $(,)?) => {
        $(
            #[doc = "Creates an `Atom` as a result of concatenating "]
            #[doc = stringify!($n)]
            #[doc = " string slices."]
            #[inline]
            #[must_use]
            #[allow(unused_assignments)]
            pub fn $func_name($($s: &str),+) -> Atom {
                let total_len = 0 $(+ $s.len())+;

                if total_len <= STACK_BUF_SIZE {
                    let mut buffer = [0u8; STACK_BUF_SIZE];
                    let mut index = 0;
                    $(
                        buffer[index..index + $s.len()].copy_from_slice($s.as_bytes());
                        index += $s.len();
                    )+
                    return atom(unsafe { std::str::from_utf8_unchecked(&buffer[..total_len]) });
                }

                // Fallback to heap for very long strings.
                let mut result = String::with_capacity(total_len);
                $( result.push_str($s); )+
                atom(&result)
            }
        )+
    };
}

integer_to_atom_fns!(i64_atom(i64), u32_atom(u32), u64_atom(u64), usize_atom(usize));

concat_fns!(
    concat_atom2(2, s1, s2),
    concat_atom3(3, s1, s2, s3),
    concat_atom4(4, s1, s2, s3, s4),
    concat_atom5(5, s1, s2, s3, s4, s5),
    concat_atom6(6, s1, s2, s3, s4, s5, s6),
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_interning_is_canonical() {
        assert_eq!(atom("Foo"), atom("Foo"));
        assert_eq!(atom("Foo").as_char_ptr(), atom("Foo").as_char_ptr());
    }

    #[test]
    fn test_ascii_lowercase_atom() {
        assert_eq!(ascii_lowercase_atom("Foo\\Bar"), atom("foo\\bar"));
        assert_eq!(ascii_lowercase_atom("already"), atom("already"));
    }

    #[test]
    fn test_concat_atom() {
        assert_eq!(concat_atom!("\\Ns\\Cls", "::", "method"), atom("\\Ns\\Cls::method"));
        assert_eq!(concat_atom!("a", "b", "c", "d"), atom("abcd"));
    }

    #[test]
    fn test_integer_atoms() {
        assert_eq!(u32_atom(42), atom("42"));
        assert_eq!(i64_atom(-7), atom("-7"));
    }
}
