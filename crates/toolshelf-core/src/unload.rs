//! Best-effort job cleanup when the page is torn down.

use std::cell::Cell;

use tracing::{debug, info};

use crate::jobs::{JobId, JobRegistry};
use crate::store::KeyValueStore;

/// Delivery-on-unload primitive (`navigator.sendBeacon` in a browser).
///
/// `Ok(true)` means the request was queued by the platform, which says
/// nothing about whether the server ever sees it.
pub trait Beacon {
    fn send(&self, path: &str) -> anyhow::Result<bool>;
}

impl<B: Beacon + ?Sized> Beacon for &B {
    fn send(&self, path: &str) -> anyhow::Result<bool> {
        (**self).send(path)
    }
}

pub const DEFAULT_DELETE_ENDPOINT: &str = "/api/jobs/{id}/delete";

/// Path template with a single `{id}` placeholder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeleteEndpoint {
    template: String,
}

impl DeleteEndpoint {
    pub fn new(template: impl Into<String>) -> Self {
        Self {
            template: template.into(),
        }
    }

    pub fn path_for(&self, id: &JobId) -> String {
        self.template.replace("{id}", id.as_str())
    }
}

impl Default for DeleteEndpoint {
    fn default() -> Self {
        Self::new(DEFAULT_DELETE_ENDPOINT)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UnloadSummary {
    pub attempted: usize,
    pub queued: usize,
    pub dropped: usize,
}

/// Fires one delete beacon per tracked job, then empties the registry.
/// Responses are never awaited and nothing is retried.
///
/// One teardown can raise several triggers (`beforeunload` then
/// `pagehide`); only the first one flushes. A document restored from the
/// back/forward cache must call [`UnloadNotifier::rearm`] so its next
/// teardown flushes again.
#[derive(Debug)]
pub struct UnloadNotifier<S, B> {
    registry: JobRegistry<S>,
    beacon: B,
    endpoint: DeleteEndpoint,
    fired: Cell<bool>,
}

impl<S, B> UnloadNotifier<S, B>
where
    S: KeyValueStore,
    B: Beacon,
{
    pub fn new(registry: JobRegistry<S>, beacon: B, endpoint: DeleteEndpoint) -> Self {
        Self {
            registry,
            beacon,
            endpoint,
            fired: Cell::new(false),
        }
    }

    pub fn registry(&self) -> &JobRegistry<S> {
        &self.registry
    }

    pub fn has_fired(&self) -> bool {
        self.fired.get()
    }

    pub fn rearm(&self) {
        if self.fired.replace(false) {
            debug!("unload cleanup re-armed");
        }
    }

    /// Flushes once per teardown; repeat calls before [`Self::rearm`]
    /// return an empty summary without touching the registry or network.
    #[tracing::instrument(skip(self))]
    pub fn notify(&self) -> UnloadSummary {
        if self.fired.replace(true) {
            debug!("unload cleanup already ran for this teardown");
            return UnloadSummary::default();
        }

        let mut summary = UnloadSummary::default();
        for id in self.registry.list() {
            let path = self.endpoint.path_for(&id);
            summary.attempted += 1;
            match self.beacon.send(&path) {
                Ok(true) => summary.queued += 1,
                Ok(false) => {
                    debug!(%path, "beacon not queued");
                    summary.dropped += 1;
                }
                Err(error) => {
                    debug!(%path, error = %error, "beacon failed");
                    summary.dropped += 1;
                }
            }
        }

        self.registry.clear();

        if summary.attempted > 0 {
            info!(
                attempted = summary.attempted,
                queued = summary.queued,
                dropped = summary.dropped,
                "sent job cleanup beacons"
            );
        }
        summary
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;

    use anyhow::anyhow;

    use super::*;
    use crate::store::MemoryStore;

    const KEY: &str = "essential-tools-jobs";

    #[derive(Default)]
    struct RecordingBeacon {
        sent: RefCell<Vec<String>>,
        refuse: bool,
        fail: bool,
    }

    impl Beacon for RecordingBeacon {
        fn send(&self, path: &str) -> anyhow::Result<bool> {
            self.sent.borrow_mut().push(path.to_string());
            if self.fail {
                return Err(anyhow!("network down"));
            }
            Ok(!self.refuse)
        }
    }

    fn seeded(store: &MemoryStore, values: &[&str]) {
        let registry = JobRegistry::new(store, KEY);
        for value in values {
            registry.add(&JobId::from(*value));
        }
    }

    fn notifier<'a>(
        store: &'a MemoryStore,
        beacon: &'a RecordingBeacon,
    ) -> UnloadNotifier<&'a MemoryStore, &'a RecordingBeacon> {
        UnloadNotifier::new(
            JobRegistry::new(store, KEY),
            beacon,
            DeleteEndpoint::default(),
        )
    }

    #[test]
    fn unload_sends_one_beacon_per_job_and_clears() {
        let store = MemoryStore::new();
        seeded(&store, &["a1", "b2"]);
        let beacon = RecordingBeacon::default();
        let notifier = notifier(&store, &beacon);

        let summary = notifier.notify();

        assert_eq!(
            *beacon.sent.borrow(),
            vec![
                "/api/jobs/a1/delete".to_string(),
                "/api/jobs/b2/delete".to_string()
            ]
        );
        assert_eq!(summary.attempted, 2);
        assert_eq!(summary.queued, 2);
        assert!(notifier.registry().list().is_empty());
    }

    #[test]
    fn second_trigger_of_one_teardown_is_ignored() {
        let store = MemoryStore::new();
        seeded(&store, &["a1"]);
        let beacon = RecordingBeacon::default();
        let notifier = notifier(&store, &beacon);

        notifier.notify();
        seeded(&store, &["late"]);
        let second = notifier.notify();

        assert!(notifier.has_fired());
        assert_eq!(second, UnloadSummary::default());
        assert_eq!(beacon.sent.borrow().len(), 1);
    }

    #[test]
    fn rearmed_notifier_flushes_jobs_started_after_restore() {
        let store = MemoryStore::new();
        seeded(&store, &["a"]);
        let beacon = RecordingBeacon::default();
        let notifier = notifier(&store, &beacon);

        notifier.notify();
        notifier.rearm();
        assert!(!notifier.has_fired());
        seeded(&store, &["b"]);
        let second = notifier.notify();

        assert_eq!(second.queued, 1);
        assert_eq!(
            *beacon.sent.borrow(),
            vec![
                "/api/jobs/a/delete".to_string(),
                "/api/jobs/b/delete".to_string()
            ]
        );
        assert!(notifier.registry().is_empty());
    }

    #[test]
    fn failed_and_refused_beacons_still_clear_registry() {
        for beacon in [
            RecordingBeacon {
                refuse: true,
                ..Default::default()
            },
            RecordingBeacon {
                fail: true,
                ..Default::default()
            },
        ] {
            let store = MemoryStore::new();
            seeded(&store, &["a1", "b2"]);
            let notifier = notifier(&store, &beacon);

            let summary = notifier.notify();

            assert_eq!(summary.dropped, 2);
            assert_eq!(summary.queued, 0);
            assert_eq!(store.raw(KEY), None);
        }
    }

    #[test]
    fn empty_registry_sends_nothing() {
        let store = MemoryStore::new();
        let beacon = RecordingBeacon::default();
        let notifier = notifier(&store, &beacon);

        let summary = notifier.notify();

        assert_eq!(summary.attempted, 0);
        assert!(beacon.sent.borrow().is_empty());
    }

    #[test]
    fn custom_endpoint_template() {
        let endpoint = DeleteEndpoint::new("/v2/jobs/{id}");
        assert_eq!(endpoint.path_for(&JobId::from("x9")), "/v2/jobs/x9");
    }
}
