use std::collections::BTreeMap;

use formats::topology::{TopologyDocument, TopologyError};

/// Residency of one asset path in the store.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ResidencyState {
    /// A fetch was started and its payload has not arrived yet.
    Requested,
    Resident,
    Failed,
}

/// What the caller should do about a [`AssetStore::request`].
#[derive(Debug, PartialEq)]
pub enum FetchDecision<'a> {
    /// No fetch has been started for this path; start one and report its
    /// outcome via `fulfill` or `fail`.
    Start,
    /// A fetch is already in flight; do nothing.
    Pending,
    /// The document is cached; no fetch needed.
    Resident(&'a TopologyDocument),
    /// A previous fetch failed. The failure is sticky: no retry is
    /// attempted for the lifetime of the store.
    Failed(&'a str),
}

#[derive(Debug)]
pub enum AssetError {
    Fetch { path: String, message: String },
    Decode { path: String, source: TopologyError },
}

impl std::fmt::Display for AssetError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AssetError::Fetch { path, message } => {
                write!(f, "failed to fetch map asset {path}: {message}")
            }
            AssetError::Decode { path, source } => {
                write!(f, "failed to decode map asset {path}: {source}")
            }
        }
    }
}

impl std::error::Error for AssetError {}

#[derive(Debug)]
struct AssetEntry {
    state: ResidencyState,
    fetch_started: bool,
    document: Option<TopologyDocument>,
    error: Option<String>,
}

/// Load-once store for base-map topology documents.
///
/// The topology fetch is the chart's one asynchronous operation. The store
/// models it as an explicit state machine so the single-threaded chart can
/// poll it from a draw pass:
///
/// - `request` starts at most one fetch per path and short-circuits once a
///   document is resident;
/// - `fulfill` decodes and caches the payload indefinitely;
/// - `fail` records the failure. Failures are sticky (no automatic retry).
#[derive(Debug, Default)]
pub struct AssetStore {
    entries: BTreeMap<String, AssetEntry>,
}

impl AssetStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self, path: &str) -> Option<ResidencyState> {
        self.entries.get(path).map(|e| e.state)
    }

    pub fn document(&self, path: &str) -> Option<&TopologyDocument> {
        self.entries.get(path).and_then(|e| e.document.as_ref())
    }

    pub fn request(&mut self, path: &str) -> FetchDecision<'_> {
        let entry = self.entries.entry(path.to_string()).or_insert(AssetEntry {
            state: ResidencyState::Requested,
            fetch_started: false,
            document: None,
            error: None,
        });

        match entry.state {
            ResidencyState::Resident => match entry.document.as_ref() {
                Some(doc) => FetchDecision::Resident(doc),
                None => FetchDecision::Pending,
            },
            ResidencyState::Failed => {
                FetchDecision::Failed(entry.error.as_deref().unwrap_or("load failed"))
            }
            ResidencyState::Requested => {
                if entry.fetch_started {
                    FetchDecision::Pending
                } else {
                    entry.fetch_started = true;
                    FetchDecision::Start
                }
            }
        }
    }

    /// Stores the fetched payload.
    ///
    /// Once a document is resident the payload is ignored and the cached
    /// document is returned unchanged.
    pub fn fulfill(
        &mut self,
        path: &str,
        payload: &str,
    ) -> Result<&TopologyDocument, AssetError> {
        let resident = self
            .entries
            .get(path)
            .is_some_and(|e| e.state == ResidencyState::Resident);

        if !resident {
            let document =
                TopologyDocument::from_json_str(payload).map_err(|source| {
                    self.record_failure(path, format!("decode error: {source}"));
                    AssetError::Decode {
                        path: path.to_string(),
                        source,
                    }
                })?;

            self.entries.insert(
                path.to_string(),
                AssetEntry {
                    state: ResidencyState::Resident,
                    fetch_started: true,
                    document: Some(document),
                    error: None,
                },
            );
        }

        Ok(self
            .entries
            .get(path)
            .and_then(|e| e.document.as_ref())
            .expect("entry was just made resident"))
    }

    /// Records a fetch failure and returns the error for propagation.
    pub fn fail(&mut self, path: &str, message: impl Into<String>) -> AssetError {
        let message = message.into();
        self.record_failure(path, message.clone());
        AssetError::Fetch {
            path: path.to_string(),
            message,
        }
    }

    fn record_failure(&mut self, path: &str, message: String) {
        self.entries.insert(
            path.to_string(),
            AssetEntry {
                state: ResidencyState::Failed,
                fetch_started: true,
                document: None,
                error: Some(message),
            },
        );
    }
}

#[cfg(test)]
mod tests {
    use super::{AssetError, AssetStore, FetchDecision, ResidencyState};

    const WORLD: &str = r#"{
        "objects": {
            "land": { "type": "FeatureCollection", "features": [] }
        }
    }"#;

    #[test]
    fn first_request_starts_a_fetch_and_later_ones_wait() {
        let mut store = AssetStore::new();
        assert_eq!(store.request("assets/world-50m.json"), FetchDecision::Start);
        assert_eq!(
            store.request("assets/world-50m.json"),
            FetchDecision::Pending
        );
    }

    #[test]
    fn fulfilled_documents_short_circuit() {
        let mut store = AssetStore::new();
        store.request("assets/world-50m.json");
        store
            .fulfill("assets/world-50m.json", WORLD)
            .expect("decode");

        match store.request("assets/world-50m.json") {
            FetchDecision::Resident(doc) => assert!(doc.object("land").is_some()),
            other => panic!("expected resident, got {other:?}"),
        }

        // A second payload for the same path is ignored.
        let doc_id = store.document("assets/world-50m.json").unwrap().content_id.clone();
        store
            .fulfill("assets/world-50m.json", r#"{ "objects": {} }"#)
            .expect("cached");
        assert_eq!(
            store.document("assets/world-50m.json").unwrap().content_id,
            doc_id
        );
    }

    #[test]
    fn failures_are_sticky() {
        let mut store = AssetStore::new();
        store.request("assets/world-50m.json");
        let err = store.fail("assets/world-50m.json", "404 not found");
        assert!(matches!(err, AssetError::Fetch { .. }));

        match store.request("assets/world-50m.json") {
            FetchDecision::Failed(message) => assert!(message.contains("404")),
            other => panic!("expected failed, got {other:?}"),
        }
        assert_eq!(
            store.state("assets/world-50m.json"),
            Some(ResidencyState::Failed)
        );
    }

    #[test]
    fn undecodable_payloads_fail_the_asset() {
        let mut store = AssetStore::new();
        store.request("assets/world-50m.json");
        let err = store
            .fulfill("assets/world-50m.json", "not json")
            .expect_err("must fail");
        assert!(matches!(err, AssetError::Decode { .. }));
        assert_eq!(
            store.state("assets/world-50m.json"),
            Some(ResidencyState::Failed)
        );
    }
}
