use std::fmt::Write;

use crate::key::Key;

/// Where a resolution currently stands: the key being resolved and every key
/// that led to it.
#[derive(Clone)]
pub struct ResolutionContext<'a> {
    trace: ResolutionTrace<'a>,
}

impl<'a> ResolutionContext<'a> {
    pub fn new(key: &'a dyn Key) -> Self {
        Self {
            trace: ResolutionTrace::new(key),
        }
    }

    /// Creates the context for resolving `key` on behalf of the current one.
    pub fn append<'b>(&'b self, key: &'b dyn Key) -> ResolutionContext<'b> {
        ResolutionContext {
            trace: self.trace.append(key),
        }
    }

    pub fn key(&self) -> &dyn Key {
        self.trace.key()
    }

    pub fn trace(&self) -> &ResolutionTrace<'_> {
        &self.trace
    }
}

/// A stack of keys, linked from the innermost resolution to the outermost.
#[derive(Clone)]
pub struct ResolutionTrace<'a> {
    key: &'a dyn Key,
    previous: Option<&'a ResolutionTrace<'a>>,
}

impl<'a> ResolutionTrace<'a> {
    pub fn new(key: &'a dyn Key) -> Self {
        Self {
            key,
            previous: None,
        }
    }

    pub fn append<'b>(&'b self, key: &'b dyn Key) -> ResolutionTrace<'b> {
        ResolutionTrace {
            key,
            previous: Some(self),
        }
    }

    pub fn key(&self) -> &dyn Key {
        self.key
    }

    pub fn previous(&self) -> Option<&ResolutionTrace<'a>> {
        self.previous
    }

    /// Returns true if `key` is already being resolved further up the trace.
    pub fn previous_exist_key(&self, key: &dyn Key) -> bool {
        let mut this = self;
        while let Some(previous) = this.previous() {
            if previous.key() == key {
                return true;
            }
            this = previous;
        }
        false
    }

    /// Number of keys on the trace, the current one included.
    pub fn depth(&self) -> usize {
        let mut depth = 1;
        let mut this = self;
        while let Some(previous) = this.previous() {
            depth += 1;
            this = previous;
        }
        depth
    }

    /// Renders the trace outermost first, e.g. `[App] -> [Service] -> [App]`.
    pub fn render(&self) -> String {
        let mut keys = vec![self.key];
        let mut this = self;
        while let Some(previous) = this.previous() {
            keys.push(previous.key);
            this = previous;
        }

        let mut path = String::new();
        for (i, key) in keys.iter().rev().enumerate() {
            if i > 0 {
                path.push_str(" -> ");
            }
            let _ = write!(path, "{key}");
        }
        path
    }
}
