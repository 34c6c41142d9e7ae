//! Test fixtures: a small directory, a schedule far in the future, and
//! helpers to wire them into the service and router.

#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use chrono::{NaiveDate, NaiveDateTime};
use intake_core::config::Config;
use intake_core::data::{DirectorySnapshot, Instructions, SnapshotStore};
use intake_core::domains::intake::IntakeService;
use intake_core::kernel::{BaseCompletion, BaseEmr, BaseRetrieval, MockCompletion, MockRetrieval};
use intake_core::server::routes::Diagnostics;
use intake_core::server::{build_app, AppState};

pub const DIRECTORY: &str = "\
prov_001 Allison Hill (PsyD) — Therapy
Licensed states: AZ, NM
Insurance: Aetna, Cash Pay
Languages: English, Spanish
Styles: CBT, ACT
Email: allison@example.org

prov_002 Marcus Reed, MD - Psychiatry
Licensed states: AZ
Insurance: Cash Pay

prov_003 John Smith (LPC) - Therapy
Licensed states: TX
Insurance: Blue Cross Blue Shield

prov_004 Jane Smith, PMHNP - Psychiatry
Licensed states: CA
Insurance: Aetna
";

pub const SCHEDULE: &str = "\
prov_001|2099-01-01|09:00
prov_001|2099-01-01|13:00
prov_001|2099-01-02|10:00
prov_001|2099-01-05|15:30
prov_002|2099-01-03|08:00
prov_003|2099-01-04|11:00
prov_004|2099-01-02|09:00
";

/// Fixed "now" just before every fixture slot.
pub fn now() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2098, 12, 31)
        .unwrap()
        .and_hms_opt(12, 0, 0)
        .unwrap()
}

pub fn snapshot() -> DirectorySnapshot {
    DirectorySnapshot::from_text(Some(DIRECTORY), Some(SCHEDULE))
}

pub fn store() -> Arc<SnapshotStore> {
    Arc::new(SnapshotStore::fixed(snapshot()))
}

/// Service with no completion configured.
pub fn unconfigured_service() -> IntakeService {
    IntakeService::builder().store(store()).build()
}

pub fn service_with(completion: Arc<MockCompletion>) -> IntakeService {
    IntakeService::builder()
        .store(store())
        .completion(completion as Arc<dyn BaseCompletion>)
        .build()
}

pub fn service_with_retrieval(
    completion: Arc<MockCompletion>,
    retrieval: Arc<MockRetrieval>,
) -> IntakeService {
    IntakeService::builder()
        .store(store())
        .instructions(Arc::new(Instructions {
            system_prompt: Some("You are the intake assistant for Example Clinic.".into()),
            faqs: Some("Q: Do you take Medicaid? A: Not yet.".into()),
            policies: None,
        }))
        .completion(completion as Arc<dyn BaseCompletion>)
        .retrieval(retrieval as Arc<dyn BaseRetrieval>)
        .build()
}

pub fn service_with_timeout(completion: Arc<MockCompletion>, timeout: Duration) -> IntakeService {
    IntakeService::builder()
        .store(store())
        .completion(completion as Arc<dyn BaseCompletion>)
        .completion_timeout(timeout)
        .build()
}

pub fn app_state(intake: IntakeService, emr: Option<Arc<dyn BaseEmr>>) -> AppState {
    let config = Config::from_lookup(|_| None).unwrap();
    AppState {
        intake,
        emr,
        diagnostics: Arc::new(Diagnostics::from_config(&config)),
    }
}

pub fn app(intake: IntakeService, emr: Option<Arc<dyn BaseEmr>>) -> Router {
    build_app(app_state(intake, emr), &[])
}
