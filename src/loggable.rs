use std::fmt::{self, Write as _};

/// A value that can be appended to a log record as a text fragment.
/// This is automatically implemented for all types that implement Display,
/// so integers, floats, booleans, strings and `fmt::Arguments` all qualify.
pub trait Loggable {
    /// Appends the text form of `self` to `out`.
    fn write_text(&self, out: &mut String);

    /// Returns the text form of `self` as a new string.
    fn to_text(&self) -> String {
        let mut out = String::new();
        self.write_text(&mut out);
        out
    }
}

// Generic implementation for Display types
impl<T> Loggable for T
where
    T: fmt::Display + ?Sized,
{
    #[inline]
    fn write_text(&self, out: &mut String) {
        // Writing into a String cannot fail.
        let _ = write!(out, "{}", self);
    }
}

/// Logs a pointer as its address, e.g. `0x7ffd5c3a1b2c`.
///
/// Raw pointers have no `Display` impl, so wrap them to log them.
pub struct Addr<T: ?Sized>(pub *const T);

impl<T: ?Sized> fmt::Display for Addr<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Pointer::fmt(&self.0, f)
    }
}
