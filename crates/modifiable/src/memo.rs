//! Dependency-keyed memoization.
//!
//! A [`Memo`] remembers the last result of a computation together with every
//! context read it made. The result stays valid while each recorded path still
//! resolves to the recorded value.

use modifiable_state::Value;

/// One context read: the path and what it resolved to.
#[derive(Debug, Clone, PartialEq)]
pub struct Dependency {
    pub path: String,
    pub value: Option<Value>,
}

/// Collects the context reads of one computation, first read wins.
#[derive(Debug, Clone, Default)]
pub struct Dependencies(Vec<Dependency>);

impl Dependencies {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a read. Repeated reads of the same path are recorded once.
    pub fn record(&mut self, path: &str, value: Option<&Value>) {
        if self.0.iter().any(|d| d.path == path) {
            return;
        }
        self.0.push(Dependency {
            path: path.to_owned(),
            value: value.cloned(),
        });
    }

    /// Record every read of another computation.
    pub fn extend_from(&mut self, deps: &[Dependency]) {
        for dep in deps {
            self.record(&dep.path, dep.value.as_ref());
        }
    }

    pub fn as_slice(&self) -> &[Dependency] {
        &self.0
    }

    pub fn into_vec(self) -> Vec<Dependency> {
        self.0
    }
}

/// Last result plus the dependency snapshot it was computed from.
#[derive(Debug, Clone)]
pub struct Memo<V> {
    deps: Vec<Dependency>,
    last: Option<V>,
}

impl<V> Default for Memo<V> {
    fn default() -> Self {
        Self {
            deps: Vec::new(),
            last: None,
        }
    }
}

impl<V> Memo<V> {
    pub fn new() -> Self {
        Self::default()
    }

    /// The stored result, if one exists and every recorded dependency still
    /// resolves (through `resolve`) to its recorded value.
    pub fn lookup(&self, mut resolve: impl FnMut(&str) -> Option<Value>) -> Option<&V> {
        let last = self.last.as_ref()?;
        self.deps
            .iter()
            .all(|dep| resolve(&dep.path) == dep.value)
            .then_some(last)
    }

    /// Replace the stored result and its dependency snapshot.
    pub fn store(&mut self, deps: Vec<Dependency>, value: V) -> &V {
        self.deps = deps;
        self.last.insert(value)
    }

    pub fn dependencies(&self) -> &[Dependency] {
        &self.deps
    }

    pub fn is_primed(&self) -> bool {
        self.last.is_some()
    }

    pub fn clear(&mut self) {
        self.deps.clear();
        self.last = None;
    }
}
