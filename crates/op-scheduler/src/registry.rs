// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Name → factory registry for scheduler policies.
//!
//! Policy selection is a startup flag; policy implementation lives behind
//! the [`SchedulerPolicy`](crate::policy::SchedulerPolicy) trait. The
//! registry decouples the two: the engine asks for a name, the registry
//! runs the matching factory. Registrations happen at startup; registering
//! the same name twice is a programming error and aborts with a clear
//! message.

use crate::policy::SchedulerPolicy;
use crate::traits::TaskExecutor;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, OnceLock};
use tracing::error;

/// Constructs a policy bound to the given executor.
pub type SchedulerFactory =
    Box<dyn Fn(Arc<dyn TaskExecutor>) -> Box<dyn SchedulerPolicy> + Send + Sync>;

/// Process-wide mapping from policy name to factory.
#[derive(Default)]
pub struct SchedulerRegistry {
    schedulers: Mutex<HashMap<String, SchedulerFactory>>,
}

impl SchedulerRegistry {
    /// An empty registry. Most callers want [`SchedulerRegistry::global`].
    pub fn new() -> Self {
        Self::default()
    }

    /// The process-wide registry, with the built-in policies registered on
    /// first access.
    pub fn global() -> &'static SchedulerRegistry {
        static REGISTRY: OnceLock<SchedulerRegistry> = OnceLock::new();
        REGISTRY.get_or_init(|| {
            let registry = SchedulerRegistry::new();
            crate::policy::register_builtins(&registry);
            registry
        })
    }

    /// Registers `factory` under `name`.
    ///
    /// # Panics
    /// Panics if `name` is already registered. Registrations happen during
    /// startup, where aborting with a clear message beats limping on with
    /// an ambiguous policy table.
    pub fn register(&self, name: &str, factory: SchedulerFactory) {
        let mut schedulers = self
            .schedulers
            .lock()
            .expect("scheduler registry mutex poisoned");
        if schedulers.contains_key(name) {
            panic!("duplicate registration of scheduler policy under name '{name}'");
        }
        schedulers.insert(name.to_string(), factory);
    }

    /// Instantiates the policy registered under `name`, or `None` for an
    /// unknown name (the caller logs and aborts higher in the stack).
    pub fn create(
        &self,
        name: &str,
        executor: Arc<dyn TaskExecutor>,
    ) -> Option<Box<dyn SchedulerPolicy>> {
        let schedulers = self
            .schedulers
            .lock()
            .expect("scheduler registry mutex poisoned");
        match schedulers.get(name) {
            Some(factory) => Some(factory(executor)),
            None => {
                error!("no scheduler policy registered under name '{name}'");
                None
            }
        }
    }

    /// Registered names, sorted.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .schedulers
            .lock()
            .expect("scheduler registry mutex poisoned")
            .keys()
            .cloned()
            .collect();
        names.sort();
        names
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::policy::FifoPolicy;
    use crate::test_support::TestExecutor;
    use crate::traits::SchedulingParam;
    use resource_ledger::{AllocationStore, DeviceSpec, Resources};

    fn executor() -> Arc<dyn TaskExecutor> {
        Arc::new(TestExecutor::new(
            AllocationStore::new(Resources::memory(DeviceSpec::gpu(0), 1000)),
            SchedulingParam::default(),
        ))
    }

    fn fifo_factory() -> SchedulerFactory {
        Box::new(|executor| Box::new(FifoPolicy::new(executor)))
    }

    #[test]
    fn test_create_known_and_unknown() {
        let registry = SchedulerRegistry::new();
        registry.register("fifo", fifo_factory());

        let policy = registry.create("fifo", executor());
        assert_eq!(policy.unwrap().name(), "fifo");

        assert!(registry.create("unknown", executor()).is_none());
    }

    #[test]
    #[should_panic(expected = "duplicate registration")]
    fn test_duplicate_registration_is_fatal() {
        let registry = SchedulerRegistry::new();
        registry.register("fifo", fifo_factory());
        registry.register("fifo", fifo_factory());
    }

    #[test]
    fn test_global_has_builtins() {
        let names = SchedulerRegistry::global().names();
        assert_eq!(names, vec!["fair", "fifo", "pack"]);
    }

    #[test]
    fn test_names_sorted() {
        let registry = SchedulerRegistry::new();
        registry.register("zeta", fifo_factory());
        registry.register("alpha", fifo_factory());
        assert_eq!(registry.names(), vec!["alpha", "zeta"]);
    }
}
