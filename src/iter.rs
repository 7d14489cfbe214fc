use std::fmt;

use crate::wd::{BoxError, FilterResult, Verdict, Visit};

/// A boxed filter.
pub(crate) type FilterFn = Box<dyn FnMut(&Visit) -> FilterResult + Send>;

/////////////////////////////////////////////////////////////////////////
//// FilterChain

/// Ordered, uniquely named filters.
///
/// Registration order is evaluation order. Re-registering a name replaces
/// the filter without moving it.
#[derive(Default)]
pub(crate) struct FilterChain {
    filters: Vec<(String, FilterFn)>,
}

/// A filter returned an error.
#[derive(Debug)]
pub(crate) struct Abort {
    pub name: String,
    pub source: BoxError,
}

impl FilterChain {
    pub(crate) fn register(&mut self, name: String, filter: FilterFn) {
        match self.filters.iter_mut().find(|(n, _)| *n == name) {
            Some(slot) => slot.1 = filter,
            None => self.filters.push((name, filter)),
        }
    }

    /// Returns true if a filter was registered under `name`.
    pub(crate) fn unregister(&mut self, name: &str) -> bool {
        match self.filters.iter().position(|(n, _)| n == name) {
            Some(idx) => {
                self.filters.remove(idx);
                true
            }
            None => false,
        }
    }

    pub(crate) fn names(&self) -> impl Iterator<Item = &str> {
        self.filters.iter().map(|(n, _)| n.as_str())
    }

    /// Run every filter in order until one returns something other than
    /// [`Verdict::Continue`].
    pub(crate) fn evaluate(&mut self, visit: &Visit) -> Result<Verdict, Abort> {
        for (name, filter) in self.filters.iter_mut() {
            match filter(visit) {
                Ok(Verdict::Continue) => continue,
                Ok(verdict) => return Ok(verdict),
                Err(source) => return Err(Abort { name: name.clone(), source }),
            }
        }
        Ok(Verdict::Continue)
    }
}

impl fmt::Debug for FilterChain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.names()).finish()
    }
}
