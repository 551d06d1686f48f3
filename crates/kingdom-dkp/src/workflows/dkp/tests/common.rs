use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Method, Request};
use axum::response::Response;
use serde_json::Value;

use crate::workflows::dkp::{
    DkpService, DkpSettings, InMemorySettingsStore, Multipliers, PlayerSnapshotRow, PowerRange,
    PowerRanges, SettingsKey, SettingsStore, StoreError,
};

pub(super) fn player(id: &str, power: f64, city_hall: f64) -> PlayerSnapshotRow {
    PlayerSnapshotRow::new(id)
        .with_name(format!("Governor {id}"))
        .with_power(power)
        .with_city_hall(city_hall)
}

pub(super) fn t4_only() -> Multipliers {
    Multipliers {
        t4: 1.0,
        t5: 0.0,
        deads: 0.0,
    }
}

pub(super) fn half_tier() -> PowerRanges {
    PowerRanges::new(vec![PowerRange::new(0, None, 0.5)]).expect("valid tier")
}

/// Settings used by the reference two-scan scenario.
pub(super) fn scenario_settings() -> DkpSettings {
    DkpSettings {
        multipliers: t4_only(),
        power_ranges: half_tier(),
        ..DkpSettings::default()
    }
}

pub(super) fn scenario_start() -> Vec<PlayerSnapshotRow> {
    vec![player("1", 2000.0, 25.0).with_kills(100.0, 0.0)]
}

pub(super) fn scenario_end() -> Vec<PlayerSnapshotRow> {
    vec![player("1", 2100.0, 25.0).with_kills(130.0, 0.0)]
}

pub(super) const START_CSV: &str = "Character ID,Username,Current Power,T4 Kills,T5 Kills,Deaths,Total Kill Points,City Hall\n\
1,Aria,\"2,000\",100,0,10,1000,25\n\
2,Brann,\"4,000\",50,0,5,400,25\n\
3,Cato,900,0,0,0,0,20\n";

pub(super) const END_CSV: &str = "Character ID,Username,Current Power,T4 Kills,T5 Kills,Deaths,Total Kill Points,City Hall\n\
1,Aria,\"2,100\",130,0,10,1300,25\n\
2,Brann,\"4,200\",150,0,5,900,25\n\
3,Cato,950,0,0,0,0,20\n";

pub(super) fn build_service(
    settings: DkpSettings,
) -> (Arc<DkpService<InMemorySettingsStore>>, Arc<InMemorySettingsStore>) {
    let store = Arc::new(InMemorySettingsStore::default());
    let service = Arc::new(DkpService::with_settings(store.clone(), settings));
    (service, store)
}

/// Reads fine but refuses every write.
#[derive(Debug, Default)]
pub(super) struct ReadOnlyStore;

impl SettingsStore for ReadOnlyStore {
    fn load(&self, _key: SettingsKey) -> Result<Option<Value>, StoreError> {
        Ok(None)
    }

    fn save(&self, _key: SettingsKey, _value: Value) -> Result<(), StoreError> {
        Err(StoreError::Unavailable("read-only store".to_string()))
    }

    fn remove(&self, _key: SettingsKey) -> Result<(), StoreError> {
        Err(StoreError::Unavailable("read-only store".to_string()))
    }
}

/// Delegates to an in-memory store but fails its `fail_on`-th save.
#[derive(Debug)]
pub(super) struct FailingSaveStore {
    pub(super) inner: InMemorySettingsStore,
    pub(super) fail_on: usize,
    saves: AtomicUsize,
}

impl FailingSaveStore {
    pub(super) fn new(inner: InMemorySettingsStore, fail_on: usize) -> Self {
        Self {
            inner,
            fail_on,
            saves: AtomicUsize::new(0),
        }
    }
}

impl SettingsStore for FailingSaveStore {
    fn load(&self, key: SettingsKey) -> Result<Option<Value>, StoreError> {
        self.inner.load(key)
    }

    fn save(&self, key: SettingsKey, value: Value) -> Result<(), StoreError> {
        let attempt = self.saves.fetch_add(1, Ordering::SeqCst) + 1;
        if attempt == self.fail_on {
            return Err(StoreError::Unavailable("disk full".to_string()));
        }
        self.inner.save(key, value)
    }

    fn remove(&self, key: SettingsKey) -> Result<(), StoreError> {
        self.inner.remove(key)
    }
}

pub(super) fn json_request(method: Method, uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(serde_json::to_vec(&body).expect("encode body")))
        .expect("build request")
}

pub(super) fn empty_request(method: Method, uri: &str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .body(Body::empty())
        .expect("build request")
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}
