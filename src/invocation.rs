//! Invokable units of a harness.
//!
//! A [`Method`] is a callable with its arguments already bound, e.g. `add(1)`.
//! Binding a method into a harness gives it an [`InvocationId`] and makes it an
//! [`Invocation`]: one node of the happens-before order. Two invocations of the
//! same method with the same arguments are still distinct nodes.

use std::borrow::Borrow;
use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::{InvocationFailure, OracleError, Result};

/// Identifier of an invocation within its harness.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
pub struct InvocationId(pub usize);

impl From<usize> for InvocationId {
    fn from(v: usize) -> Self {
        Self(v)
    }
}

impl fmt::Display for InvocationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Rendering of a return value to its canonical result string.
///
/// Unit and `None` render as `null`, so `add(1) -> ()` and `peek() -> None`
/// read the same way in an outcome table.
pub trait Canonical {
    fn canonical(&self) -> String;
}

impl Canonical for () {
    fn canonical(&self) -> String {
        "null".to_string()
    }
}

impl<T: Canonical> Canonical for Option<T> {
    fn canonical(&self) -> String {
        match self {
            Some(v) => v.canonical(),
            None => "null".to_string(),
        }
    }
}

impl<T: Canonical> Canonical for Vec<T> {
    fn canonical(&self) -> String {
        let items: Vec<String> = self.iter().map(Canonical::canonical).collect();
        format!("[{}]", items.join(", "))
    }
}

impl<T: Canonical + ?Sized> Canonical for &T {
    fn canonical(&self) -> String {
        (**self).canonical()
    }
}

macro_rules! canonical_via_display {
    ($($t:ty),* $(,)?) => {
        $(
            impl Canonical for $t {
                fn canonical(&self) -> String {
                    self.to_string()
                }
            }
        )*
    };
}

canonical_via_display!(
    bool, char, str, String, i8, i16, i32, i64, i128, isize, u8, u16, u32, u64, u128, usize,
);

type CallFn<T> = dyn Fn(&mut T) -> std::result::Result<String, String> + Send + Sync;
type MakeFn<T> = dyn Fn() -> std::result::Result<T, String> + Send + Sync;

/// A method with pre-bound arguments, not yet placed in a harness.
pub struct Method<T> {
    label: Arc<str>,
    call: Arc<CallFn<T>>,
}

impl<T> Clone for Method<T> {
    fn clone(&self) -> Self {
        Self {
            label: Arc::clone(&self.label),
            call: Arc::clone(&self.call),
        }
    }
}

impl<T> fmt::Debug for Method<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Method").field("label", &self.label).finish()
    }
}

impl<T: 'static> Method<T> {
    /// Bind an infallible call. `label` is how the call shows up in outcomes.
    pub fn new<R, F>(label: impl Into<String>, f: F) -> Self
    where
        R: Canonical + 'static,
        F: Fn(&mut T) -> R + Send + Sync + 'static,
    {
        Self {
            label: Arc::from(label.into()),
            call: Arc::new(move |target: &mut T| Ok(f(target).canonical())),
        }
    }

    /// Bind a call that may fail. A failure aborts outcome collection.
    pub fn fallible<R, E, F>(label: impl Into<String>, f: F) -> Self
    where
        R: Canonical + 'static,
        E: fmt::Display + 'static,
        F: Fn(&mut T) -> std::result::Result<R, E> + Send + Sync + 'static,
    {
        Self {
            label: Arc::from(label.into()),
            call: Arc::new(move |target: &mut T| {
                f(target)
                    .map(|r| r.canonical())
                    .map_err(|e| e.to_string())
            }),
        }
    }
}

impl<T> Method<T> {
    #[must_use]
    pub fn label(&self) -> &str {
        &self.label
    }
}

/// A method bound to one position of a harness.
pub struct Invocation<T> {
    id: InvocationId,
    method: Method<T>,
}

impl<T> Clone for Invocation<T> {
    fn clone(&self) -> Self {
        Self {
            id: self.id,
            method: self.method.clone(),
        }
    }
}

impl<T> fmt::Debug for Invocation<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Invocation")
            .field("id", &self.id)
            .field("label", &self.method.label)
            .finish()
    }
}

impl<T> fmt::Display for Invocation<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.method.label)
    }
}

impl<T> PartialEq for Invocation<T> {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl<T> Eq for Invocation<T> {}

impl<T> Hash for Invocation<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl<T> Invocation<T> {
    #[must_use]
    pub fn new(id: InvocationId, method: Method<T>) -> Self {
        Self { id, method }
    }

    #[must_use]
    pub fn id(&self) -> InvocationId {
        self.id
    }

    #[must_use]
    pub fn label(&self) -> &str {
        self.method.label()
    }

    /// The key under which this invocation's result is recorded in an outcome.
    #[must_use]
    pub fn call(&self) -> Call {
        Call {
            id: self.id,
            label: self.label().to_string(),
        }
    }

    /// Invoke against a live object and render the result canonically.
    pub fn invoke(&self, target: &mut T) -> std::result::Result<String, InvocationFailure> {
        (self.method.call)(target).map_err(|reason| InvocationFailure {
            invocation: self.label().to_string(),
            reason,
        })
    }
}

/// Zero-argument factory for the object under test.
pub struct Constructor<T> {
    label: Arc<str>,
    make: Arc<MakeFn<T>>,
}

impl<T> Clone for Constructor<T> {
    fn clone(&self) -> Self {
        Self {
            label: Arc::clone(&self.label),
            make: Arc::clone(&self.make),
        }
    }
}

impl<T> fmt::Debug for Constructor<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Constructor")
            .field("label", &self.label)
            .finish()
    }
}

impl<T: 'static> Constructor<T> {
    pub fn new<F>(label: impl Into<String>, f: F) -> Self
    where
        F: Fn() -> T + Send + Sync + 'static,
    {
        Self {
            label: Arc::from(label.into()),
            make: Arc::new(move || Ok(f())),
        }
    }

    pub fn fallible<E, F>(label: impl Into<String>, f: F) -> Self
    where
        E: fmt::Display + 'static,
        F: Fn() -> std::result::Result<T, E> + Send + Sync + 'static,
    {
        Self {
            label: Arc::from(label.into()),
            make: Arc::new(move || f().map_err(|e| e.to_string())),
        }
    }
}

impl<T> Constructor<T> {
    #[must_use]
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Build a fresh object under test.
    pub fn construct(&self) -> Result<T> {
        (self.make)().map_err(|reason| OracleError::Construction {
            constructor: self.label().to_string(),
            reason,
        })
    }
}

/// Outcome key: an invocation id with its label kept for display.
///
/// Ordering, equality and hashing use the id alone, which lets result maps be
/// queried by [`InvocationId`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Call {
    pub id: InvocationId,
    pub label: String,
}

impl PartialEq for Call {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Call {}

impl PartialOrd for Call {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Call {
    fn cmp(&self, other: &Self) -> Ordering {
        self.id.cmp(&other.id)
    }
}

impl Hash for Call {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl Borrow<InvocationId> for Call {
    fn borrow(&self) -> &InvocationId {
        &self.id
    }
}

impl fmt::Display for Call {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.label)
    }
}
