//! Parallel fan-out over several resources.
//!
//! Two aggregation policies share one fan-out:
//!
//! * [`batch`] is all-or-nothing: any member failing fails the whole batch,
//!   even when the others succeeded.
//! * [`join`] keeps each member's result separately so a page can render the
//!   sections that arrived and show an error only where one failed.
//!
//! Members run on scoped threads; results always come back in input order,
//! whatever order the network completes them in.

use std::thread;

use serde_json::Value;

use super::{FetchError, Transport};
use crate::resource::Resource;

/// Fetch every resource in parallel.  Fails with the first error in input
/// order if any member fails.
pub fn batch(transport: &dyn Transport, resources: &[Resource]) -> Result<Vec<Value>, FetchError> {
    fan_out(transport, resources.iter()).into_iter().collect()
}

/// Fetch named resources in parallel, keeping per-member results.
pub fn join(transport: &dyn Transport, sections: &[(&str, Resource)]) -> Joined {
    let results = fan_out(transport, sections.iter().map(|(_, r)| r));
    Joined {
        sections: sections
            .iter()
            .map(|(name, _)| name.to_string())
            .zip(results)
            .collect(),
    }
}

fn fan_out<'a>(
    transport: &dyn Transport,
    resources: impl Iterator<Item = &'a Resource>,
) -> Vec<Result<Value, FetchError>> {
    thread::scope(|scope| {
        let handles: Vec<_> = resources
            .map(|resource| scope.spawn(move || transport.send(resource)))
            .collect();
        handles
            .into_iter()
            .map(|handle| handle.join().unwrap_or(Err(FetchError::Aborted)))
            .collect()
    })
}

/// Per-member results of a [`join`], in input order.
#[derive(Debug)]
pub struct Joined {
    sections: Vec<(String, Result<Value, FetchError>)>,
}

impl Joined {
    /// Remove and return the named member's result.
    pub fn take(&mut self, name: &str) -> Option<Result<Value, FetchError>> {
        let index = self.sections.iter().position(|(n, _)| n == name)?;
        Some(self.sections.remove(index).1)
    }

    pub fn failures(&self) -> usize {
        self.sections.iter().filter(|(_, r)| r.is_err()).count()
    }

    pub fn len(&self) -> usize {
        self.sections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }
}
