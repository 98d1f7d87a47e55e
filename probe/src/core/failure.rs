//! Captured errors of failed probes.

use std::any::{Any, type_name};
use std::{env, fmt, io, num, str, string};

/// Kind reported for probes that panicked instead of returning an error.
pub const PANIC_KIND: &str = "panic";

/// Error captured at the probe boundary: the error's kind and its message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Failure {
    kind: String,
    message: String,
}

impl Failure {
    pub fn new(kind: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            message: message.into(),
        }
    }

    /// Capture an error, naming it after its static type `E`.
    ///
    /// Opaque types (`anyhow::Error`, boxed errors) are named after their root
    /// cause instead when that is a well-known std error, so `?` on an
    /// `io::Error` inside an `anyhow::Result` action still reports `io::Error`.
    pub fn from_error<E: Into<anyhow::Error>>(err: E) -> Self {
        let static_kind = short_type_name::<E>();
        let err: anyhow::Error = err.into();
        let kind = if is_opaque(&static_kind) {
            std_root_kind(&err).unwrap_or(static_kind)
        } else {
            static_kind
        };
        Self::new(kind, format!("{err:#}"))
    }

    /// Capture the payload of a caught panic.
    pub fn from_panic(payload: Box<dyn Any + Send>) -> Self {
        let message = if let Some(message) = payload.downcast_ref::<&str>() {
            (*message).to_string()
        } else if let Some(message) = payload.downcast_ref::<String>() {
            message.clone()
        } else {
            "non-string panic payload".to_string()
        };
        Self::new(PANIC_KIND, message)
    }

    /// Short type name of the error, e.g. `io::Error` or `VarError`.
    pub fn kind(&self) -> &str {
        &self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for Failure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind, self.message)
    }
}

/// Shorten a type path to its last segment.
///
/// Bare `Error` types keep their crate (or std module) as qualifier, so
/// `std::io::error::Error` becomes `io::Error` and `anyhow::Error` stays as is.
pub fn short_type_name<T: ?Sized>() -> String {
    shorten(type_name::<T>())
}

fn is_opaque(kind: &str) -> bool {
    matches!(kind, "anyhow::Error" | "Box")
}

fn std_root_kind(err: &anyhow::Error) -> Option<String> {
    let root = err.root_cause();
    macro_rules! first_known {
        ($($ty:ty),+ $(,)?) => {
            $(
                if root.is::<$ty>() {
                    return Some(short_type_name::<$ty>());
                }
            )+
        };
    }
    first_known!(
        io::Error,
        env::VarError,
        num::ParseIntError,
        num::ParseFloatError,
        num::TryFromIntError,
        str::ParseBoolError,
        str::Utf8Error,
        string::FromUtf8Error,
        fmt::Error,
    );
    None
}

fn shorten(full: &str) -> String {
    let path = full.split('<').next().unwrap_or(full);
    let segments: Vec<&str> = path.split("::").collect();
    let last = segments.last().copied().unwrap_or(path);
    if last != "Error" || segments.len() < 2 {
        return last.to_string();
    }
    let qualifier = match segments[0] {
        "std" | "core" | "alloc" if segments.len() > 2 => segments[1],
        first => first,
    };
    format!("{qualifier}::{last}")
}
