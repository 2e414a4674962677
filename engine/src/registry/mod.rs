//! Explicit, statically-constructed registry resolving capability requests
//! to input providers.


use crate::param::ParamDescriptor;
use crate::provider::{CapabilityRequest, FileInputProvider, InputProvider};
use crate::value::ValueKind;

/// Priority-ordered collection of [InputProvider]s.
///
/// Lower priority values take precedence; ties are broken by registration
/// order, first registered winning. Providers are registered at startup and
/// the registry is read-only for the duration of a run.
#[derive(Default)]
pub struct ProviderRegistry {
    entries: Vec<Entry>,
}

struct Entry {
    priority: i32,
    provider: Box<dyn InputProvider>,
}

impl ProviderRegistry {
    pub const DEFAULT_PRIORITY: i32 = 0;

    pub fn new() -> Self {
        Self::default()
    }

    /// A registry with the built-in file provider registered at the default
    /// priority.
    pub fn with_default_providers() -> Self {
        let mut registry = Self::new();
        registry.register(Self::DEFAULT_PRIORITY, Box::new(FileInputProvider));
        registry
    }

    pub fn register(&mut self, priority: i32, provider: Box<dyn InputProvider>) {
        // Insert after existing entries of equal priority, keeping
        // registration order stable within a priority.
        let at = self.entries.partition_point(|entry| entry.priority <= priority);
        self.entries.insert(at, Entry { priority, provider });
    }

    /// Resolves the highest-precedence provider able to serve `request`, if
    /// any. Source kinds match by exact equality; destination compatibility
    /// is the provider's own capability test. Absence means the request is
    /// unsupported, not that anything went wrong.
    pub fn resolve(&self, request: &CapabilityRequest<'_>) -> Option<&dyn InputProvider> {
        self.entries
            .iter()
            .filter(|entry| entry.provider.source_kind() == request.source)
            .map(|entry| entry.provider.as_ref())
            .find(|provider| provider.can_provide(request.param))
    }

    /// Returns true if some registered provider can populate `param` from
    /// source values of kind `source`.
    pub fn supports(&self, source: ValueKind, param: &ParamDescriptor) -> bool {
        self.resolve(&CapabilityRequest { source, param }).is_some()
    }

    /// The subset of `params` that a batch over `source` values could vary,
    /// in declaration order.
    pub fn eligible_params<'p>(
        &self,
        source: ValueKind,
        params: &'p [ParamDescriptor],
    ) -> Vec<&'p ParamDescriptor> {
        params
            .iter()
            .filter(|param| self.supports(source, param))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
