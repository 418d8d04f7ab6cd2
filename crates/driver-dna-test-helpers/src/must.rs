//! Unwrap helpers with good error messages.
//!
//! These replace `unwrap()` and `expect()` in test code. `#[track_caller]`
//! keeps the panic location at the call site.

use std::fmt::Debug;

/// Unwrap a `Result`, panicking with the error value on `Err`.
///
/// # Example
///
/// ```rust
/// use driver_dna_test_helpers::must;
///
/// let result: Result<i32, &str> = Ok(42);
/// assert_eq!(must(result), 42);
/// ```
///
/// # Panics
///
/// Panics if the result is `Err`.
#[track_caller]
pub fn must<T, E: Debug>(result: Result<T, E>) -> T {
    match result {
        Ok(v) => v,
        Err(e) => panic!("must: unexpected Err: {e:?}"),
    }
}

/// Unwrap an `Option`, panicking with `msg` on `None`.
///
/// # Panics
///
/// Panics if the option is `None`.
#[track_caller]
pub fn must_some<T>(option: Option<T>, msg: &str) -> T {
    match option {
        Some(v) => v,
        None => panic!("must_some: {msg}"),
    }
}

/// Unwrap a `Result` with a context message.
///
/// # Panics
///
/// Panics if the result is `Err`, with the context and error value.
#[track_caller]
pub fn must_with<T, E: Debug>(result: Result<T, E>, context: &str) -> T {
    match result {
        Ok(v) => v,
        Err(e) => panic!("must_with: {context}: {e:?}"),
    }
}

/// Unwrap an `Err`, panicking if the result is `Ok`.
///
/// # Panics
///
/// Panics if the result is `Ok`.
#[track_caller]
pub fn must_err<T: Debug, E>(result: Result<T, E>) -> E {
    match result {
        Ok(v) => panic!("must_err: unexpected Ok: {v:?}"),
        Err(e) => e,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_must_ok() {
        let r: Result<u8, String> = Ok(3);
        assert_eq!(must(r), 3);
    }

    #[test]
    #[should_panic(expected = "must: unexpected Err")]
    fn test_must_err_panics() {
        let r: Result<u8, &str> = Err("boom");
        must(r);
    }

    #[test]
    fn test_must_err_returns_error() {
        let r: Result<u8, &str> = Err("boom");
        assert_eq!(must_err(r), "boom");
    }

    #[test]
    #[should_panic(expected = "must_some: missing")]
    fn test_must_some_panics() {
        must_some(None::<u8>, "missing");
    }
}
