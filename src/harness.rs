//! Harness representation for outcome collection.
//!
//! A harness is a constructor for the object under test plus a set of
//! invocations partially ordered by happens-before:
//! - invocations issued by the same thread are ordered by program order
//! - explicit edges add synchronization between threads
//! - invocations with no path between them are concurrent

use std::collections::BTreeSet;
use std::fmt;

use crate::error::Result;
use crate::invocation::{Constructor, Invocation, InvocationId, Method};
use crate::order::PartialOrder;

/// Thread identifier within a harness.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct ThreadId(pub usize);

impl From<usize> for ThreadId {
    fn from(v: usize) -> Self {
        Self(v)
    }
}

/// A constructor and its happens-before ordered invocations.
#[derive(Debug, Clone)]
pub struct Harness<T> {
    name: String,
    constructor: Constructor<T>,
    invocations: Vec<Invocation<T>>,
    threads: Vec<Vec<InvocationId>>,
    synchronization: Vec<(InvocationId, InvocationId)>,
    happens_before: PartialOrder,
}

impl<T> Harness<T> {
    #[must_use]
    pub fn builder(name: impl Into<String>, constructor: Constructor<T>) -> HarnessBuilder<T> {
        HarnessBuilder::new(name, constructor)
    }

    /// Every method in its own thread against one shared object: no
    /// happens-before edges at all.
    pub fn all_against_one(
        name: impl Into<String>,
        constructor: Constructor<T>,
        methods: impl IntoIterator<Item = Method<T>>,
    ) -> Result<Self> {
        let mut builder = Self::builder(name, constructor);
        for method in methods {
            let id = builder.invoke(method);
            builder.thread([id]);
        }
        builder.build()
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn constructor(&self) -> &Constructor<T> {
        &self.constructor
    }

    #[must_use]
    pub fn happens_before(&self) -> &PartialOrder {
        &self.happens_before
    }

    #[must_use]
    pub fn invocations(&self) -> &[Invocation<T>] {
        &self.invocations
    }

    /// Look up an invocation by id.
    #[must_use]
    pub fn invocation(&self, id: InvocationId) -> Option<&Invocation<T>> {
        // Ids are assigned densely by the builder.
        self.invocations.get(id.0).filter(|inv| inv.id() == id)
    }

    /// Invocations of `thread`, in program order.
    #[must_use]
    pub fn thread(&self, thread: ThreadId) -> Option<&[InvocationId]> {
        self.threads.get(thread.0).map(Vec::as_slice)
    }

    #[must_use]
    pub fn thread_count(&self) -> usize {
        self.threads.len()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.invocations.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.invocations.is_empty()
    }

    /// Edges added with [`HarnessBuilder::order`], beyond program order.
    #[must_use]
    pub fn synchronization(&self) -> &[(InvocationId, InvocationId)] {
        &self.synchronization
    }

    fn label(&self, id: InvocationId) -> String {
        self.invocation(id)
            .map_or_else(|| id.to_string(), |inv| inv.label().to_string())
    }
}

impl<T> fmt::Display for Harness<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let threaded: BTreeSet<InvocationId> = self.threads.iter().flatten().copied().collect();
        // Invocations outside any thread run alone.
        let unthreaded = self
            .invocations
            .iter()
            .map(Invocation::id)
            .filter(|id| !threaded.contains(id))
            .map(|id| vec![id]);

        let blocks: Vec<String> = self
            .threads
            .iter()
            .cloned()
            .chain(unthreaded)
            .map(|ids| {
                let calls: Vec<String> = ids.iter().map(|&id| self.label(id)).collect();
                format!("{{ {} }}", calls.join("; "))
            })
            .collect();
        write!(f, "{}: {}", self.constructor.label(), blocks.join(" || "))?;

        if !self.synchronization.is_empty() {
            let edges: Vec<String> = self
                .synchronization
                .iter()
                .map(|&(before, after)| format!("{} -> {}", self.label(before), self.label(after)))
                .collect();
            write!(f, " with {}", edges.join(", "))?;
        }
        Ok(())
    }
}

/// Incremental construction of a [`Harness`].
#[derive(Debug)]
pub struct HarnessBuilder<T> {
    name: String,
    constructor: Constructor<T>,
    invocations: Vec<Invocation<T>>,
    threads: Vec<Vec<InvocationId>>,
    synchronization: Vec<(InvocationId, InvocationId)>,
}

impl<T> HarnessBuilder<T> {
    #[must_use]
    pub fn new(name: impl Into<String>, constructor: Constructor<T>) -> Self {
        Self {
            name: name.into(),
            constructor,
            invocations: Vec::new(),
            threads: Vec::new(),
            synchronization: Vec::new(),
        }
    }

    /// Register a method as a new invocation and return its id.
    pub fn invoke(&mut self, method: Method<T>) -> InvocationId {
        let id = InvocationId(self.invocations.len());
        self.invocations.push(Invocation::new(id, method));
        id
    }

    /// Declare a thread running `ids` in program order.
    pub fn thread(&mut self, ids: impl IntoIterator<Item = InvocationId>) -> ThreadId {
        self.threads.push(ids.into_iter().collect());
        ThreadId(self.threads.len() - 1)
    }

    /// Require `before` to happen before `after`.
    pub fn order(&mut self, before: InvocationId, after: InvocationId) -> &mut Self {
        self.synchronization.push((before, after));
        self
    }

    /// Validate the order and close it transitively.
    pub fn build(self) -> Result<Harness<T>> {
        let program_order = self
            .threads
            .iter()
            .flat_map(|ids| ids.windows(2).map(|pair| (pair[0], pair[1])));
        let happens_before = PartialOrder::new(
            self.invocations.iter().map(Invocation::id),
            program_order.chain(self.synchronization.iter().copied()),
        )?;
        Ok(Harness {
            name: self.name,
            constructor: self.constructor,
            invocations: self.invocations,
            threads: self.threads,
            synchronization: self.synchronization,
            happens_before,
        })
    }
}
