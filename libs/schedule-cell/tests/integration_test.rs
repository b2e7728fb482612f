// libs/schedule-cell/tests/integration_test.rs
//
// End-to-end tests of the slot synchronizer against a mocked /schedule API.

use std::sync::Arc;

use assert_matches::assert_matches;
use chrono::NaiveDate;
use serde_json::json;
use wiremock::{
    matchers::{body_json, header, method, path, query_param},
    Mock, MockServer, ResponseTemplate,
};

use schedule_cell::{
    HttpScheduleApi, ScheduleError, SlotModel, SlotSynchronizer, SlotTime,
};
use shared_utils::test_utils::{test_token, MockScheduleResponses, TestConfig, TEST_ACCESS_TOKEN};
use shared_utils::token_store::{MemoryTokenStore, TokenStore};
use tokio_test::{assert_err, assert_ok};

// ==============================================================================
// TEST FIXTURES AND UTILITIES
// ==============================================================================

struct TestSetup {
    mock_server: MockServer,
    tokens: Arc<MemoryTokenStore>,
    api: Arc<HttpScheduleApi>,
    synchronizer: SlotSynchronizer,
}

impl TestSetup {
    async fn new() -> Self {
        let mock_server = MockServer::start().await;
        let config = TestConfig::with_url(&format!("{}/appointments", mock_server.uri())).to_app_config();

        let tokens = Arc::new(MemoryTokenStore::with_token(test_token().unwrap()));
        let api = Arc::new(HttpScheduleApi::new(&config));
        let synchronizer = SlotSynchronizer::new(api.clone(), tokens.clone());

        Self {
            mock_server,
            tokens,
            api,
            synchronizer,
        }
    }

    async fn mock_fetch(&self, date: NaiveDate, start_times: &[&str]) {
        Mock::given(method("GET"))
            .and(path("/appointments/schedule"))
            .and(query_param("date", date.format("%Y-%m-%d").to_string()))
            .and(header("authorization", format!("Bearer {}", TEST_ACCESS_TOKEN).as_str()))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(MockScheduleResponses::day_schedule_response(date, start_times)),
            )
            .mount(&self.mock_server)
            .await;
    }
}

fn march_10() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 3, 10).unwrap()
}

fn t(s: &str) -> SlotTime {
    s.parse().unwrap()
}

// ==============================================================================
// LOAD
// ==============================================================================

#[tokio::test]
async fn test_load_merges_saved_slots() {
    let setup = TestSetup::new().await;
    setup.mock_fetch(march_10(), &["10:00", "07:15"]).await;

    let mut model = SlotModel::default();
    let merged = setup.synchronizer.load_for_date(&mut model, march_10()).await.unwrap();

    assert_eq!(merged, 2);
    assert_eq!(model.selected_times().collect::<Vec<_>>(), vec![t("07:15"), t("10:00")]);
    assert!(model.slot(t("07:15")).unwrap().persisted);
    assert!(!model.slot(t("08:00")).unwrap().chosen);
}

#[tokio::test]
async fn test_load_404_is_empty_day() {
    let setup = TestSetup::new().await;

    Mock::given(method("GET"))
        .and(path("/appointments/schedule"))
        .respond_with(ResponseTemplate::new(404).set_body_json(MockScheduleResponses::error_response("Not found")))
        .mount(&setup.mock_server)
        .await;

    let mut model = SlotModel::default();
    let merged = setup.synchronizer.load_for_date(&mut model, march_10()).await.unwrap();

    assert_eq!(merged, 0);
    assert_eq!(model.date(), Some(march_10()));
    assert_eq!(model.selected_times().count(), 0);
}

#[tokio::test]
async fn test_load_204_is_empty_day() {
    let setup = TestSetup::new().await;

    Mock::given(method("GET"))
        .and(path("/appointments/schedule"))
        .respond_with(ResponseTemplate::new(204))
        .mount(&setup.mock_server)
        .await;

    let mut model = SlotModel::default();
    assert_eq!(setup.synchronizer.load_for_date(&mut model, march_10()).await.unwrap(), 0);
}

#[tokio::test]
async fn test_unauthorized_clears_token() {
    let setup = TestSetup::new().await;

    Mock::given(method("GET"))
        .and(path("/appointments/schedule"))
        .respond_with(ResponseTemplate::new(401).set_body_json(MockScheduleResponses::error_response("Token expired")))
        .mount(&setup.mock_server)
        .await;

    let mut model = SlotModel::default();
    let err = setup.synchronizer.load_for_date(&mut model, march_10()).await.unwrap_err();

    assert_matches!(err, ScheduleError::Auth(ref msg) if msg.contains("Token expired"));
    assert!(setup.tokens.get_token().is_none());
    assert!(!setup.synchronizer.has_credential());
}

#[tokio::test]
async fn test_forbidden_is_auth_error() {
    let setup = TestSetup::new().await;

    Mock::given(method("DELETE"))
        .and(path("/appointments/schedule"))
        .respond_with(ResponseTemplate::new(403).set_body_json(MockScheduleResponses::error_response("Not a doctor")))
        .mount(&setup.mock_server)
        .await;

    let mut model = SlotModel::default();
    model.reset(march_10());
    model.toggle(t("09:00"));

    let err = setup.synchronizer.delete_all(&mut model).await.unwrap_err();
    assert!(err.is_auth());
    assert!(setup.tokens.get_token().is_none());
    assert!(model.slot(t("09:00")).unwrap().chosen);
}

#[tokio::test]
async fn test_missing_token_makes_no_request() {
    let setup = TestSetup::new().await;
    setup.tokens.clear_token().unwrap();

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(0)
        .mount(&setup.mock_server)
        .await;

    let mut model = SlotModel::default();
    let err = setup.synchronizer.load_for_date(&mut model, march_10()).await.unwrap_err();
    assert!(err.is_auth());
}

#[tokio::test]
async fn test_server_detail_is_surfaced() {
    let setup = TestSetup::new().await;

    Mock::given(method("GET"))
        .and(path("/appointments/schedule"))
        .respond_with(
            ResponseTemplate::new(500).set_body_json(MockScheduleResponses::error_response("Database unavailable")),
        )
        .mount(&setup.mock_server)
        .await;

    let mut model = SlotModel::default();
    let err = setup.synchronizer.load_for_date(&mut model, march_10()).await.unwrap_err();

    assert_eq!(
        err,
        ScheduleError::Server {
            status: 500,
            detail: "Database unavailable".to_string()
        }
    );
    assert!(model.slots().all(|slot| !slot.chosen));
}

#[tokio::test]
async fn test_malformed_slot_fails_whole_load() {
    let setup = TestSetup::new().await;

    Mock::given(method("GET"))
        .and(path("/appointments/schedule"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "start_time": "09:00" },
            { "start_time": "half past one" }
        ])))
        .mount(&setup.mock_server)
        .await;

    let mut model = SlotModel::default();
    let err = assert_err!(setup.synchronizer.load_for_date(&mut model, march_10()).await);

    assert_matches!(err, ScheduleError::Serialization(_));
    assert_eq!(model.date(), Some(march_10()));
    assert!(model.slots().all(|slot| !slot.chosen && !slot.persisted));
}

#[tokio::test]
async fn test_fractional_seconds_are_loaded() {
    let setup = TestSetup::new().await;

    Mock::given(method("GET"))
        .and(path("/appointments/schedule"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "start_time": "09:00" },
            { "start_time": "13:00:00.250000" }
        ])))
        .mount(&setup.mock_server)
        .await;

    let mut model = SlotModel::default();
    let merged = assert_ok!(setup.synchronizer.load_for_date(&mut model, march_10()).await);

    assert_eq!(merged, 2);
    assert_eq!(model.selected_times().collect::<Vec<_>>(), vec![t("09:00"), t("13:00")]);
}

#[tokio::test]
async fn test_non_list_body_fails_load() {
    let setup = TestSetup::new().await;

    Mock::given(method("GET"))
        .and(path("/appointments/schedule"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "slots": [] })))
        .mount(&setup.mock_server)
        .await;

    let mut model = SlotModel::default();
    let err = assert_err!(setup.synchronizer.load_for_date(&mut model, march_10()).await);
    assert_matches!(err, ScheduleError::Serialization(_));
}

// ==============================================================================
// SAVE
// ==============================================================================

#[tokio::test]
async fn test_deselecting_saved_slot_sends_empty_replace() {
    let setup = TestSetup::new().await;
    setup.mock_fetch(march_10(), &["10:00"]).await;

    Mock::given(method("PUT"))
        .and(path("/appointments/schedule"))
        .and(body_json(json!({ "date": "2025-03-10", "slots": [] })))
        .respond_with(ResponseTemplate::new(200).set_body_json(MockScheduleResponses::save_response(march_10(), 0)))
        .expect(1)
        .mount(&setup.mock_server)
        .await;

    let mut model = SlotModel::default();
    setup.synchronizer.load_for_date(&mut model, march_10()).await.unwrap();

    let slot = model.slot(t("10:00")).unwrap();
    assert!(slot.persisted && slot.chosen);
    assert!(model.slots().filter(|s| s.time != t("10:00")).all(|s| !s.chosen));

    model.toggle(t("10:00"));
    let response = setup.synchronizer.save(&mut model).await.unwrap();

    assert_eq!(response.slots_added, Some(0));
    assert!(!model.slot(t("10:00")).unwrap().persisted);
}

#[tokio::test]
async fn test_save_sends_full_sorted_set() {
    let setup = TestSetup::new().await;

    Mock::given(method("PUT"))
        .and(path("/appointments/schedule"))
        .and(body_json(json!({
            "date": "2025-03-10",
            "slots": [
                { "start_time": "08:30" },
                { "start_time": "09:15" },
                { "start_time": "21:00" }
            ]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(MockScheduleResponses::save_response(march_10(), 3)))
        .expect(1)
        .mount(&setup.mock_server)
        .await;

    let mut model = SlotModel::default();
    model.reset(march_10());
    model.toggle(t("21:00"));
    model.add_custom(t("09:15")).unwrap();
    model.toggle(t("08:30"));

    setup.synchronizer.save(&mut model).await.unwrap();

    assert!(model.slots().filter(|s| s.chosen).all(|s| s.persisted));
}

#[tokio::test]
async fn test_save_nothing_selected_is_local() {
    let setup = TestSetup::new().await;

    Mock::given(method("PUT"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&setup.mock_server)
        .await;

    let mut model = SlotModel::default();
    model.reset(march_10());

    let err = setup.synchronizer.save(&mut model).await.unwrap_err();
    assert_eq!(err, ScheduleError::NothingSelected(march_10()));
}

// ==============================================================================
// DELETE
// ==============================================================================

#[tokio::test]
async fn test_delete_without_backend_record_clears_model() {
    let setup = TestSetup::new().await;

    Mock::given(method("DELETE"))
        .and(path("/appointments/schedule"))
        .and(query_param("date", "2025-03-10"))
        .respond_with(ResponseTemplate::new(200).set_body_json(MockScheduleResponses::delete_response(march_10(), false)))
        .expect(1)
        .mount(&setup.mock_server)
        .await;

    let mut model = SlotModel::default();
    model.reset(march_10());
    model.add_custom(t("07:45")).unwrap();

    let response = setup.synchronizer.delete_all(&mut model).await.unwrap();

    assert!(response.message.starts_with("No schedule found"));
    assert_eq!(model.date(), Some(march_10()));
    assert!(model.slot(t("07:45")).is_none());
    assert_eq!(model.selected_times().count(), 0);
}

#[tokio::test]
async fn test_delete_404_is_success() {
    let setup = TestSetup::new().await;

    Mock::given(method("DELETE"))
        .and(path("/appointments/schedule"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&setup.mock_server)
        .await;

    let mut model = SlotModel::default();
    model.reset(march_10());

    assert_ok!(setup.synchronizer.delete_all(&mut model).await);
}

// ==============================================================================
// PATIENT VIEW
// ==============================================================================

#[tokio::test]
async fn test_doctor_day_hides_booked_slots() {
    let setup = TestSetup::new().await;

    Mock::given(method("GET"))
        .and(path("/appointments/doctors/7/schedule"))
        .and(query_param("date", "2025-03-10"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "id": 1, "start_time": "09:00:00", "date": "2025-03-10", "is_booked": false },
            { "id": 2, "start_time": "09:30:00", "date": "2025-03-10", "is_booked": true },
            { "id": 3, "start_time": "10:00:00", "date": "2025-03-10", "is_booked": false }
        ])))
        .mount(&setup.mock_server)
        .await;

    let slots = setup.api.doctor_day(7, march_10()).await.unwrap();
    let times: Vec<SlotTime> = slots.iter().map(|slot| slot.start_time).collect();

    assert_eq!(times, vec![t("09:00"), t("10:00")]);
    assert_eq!(slots[0].id, Some(1));
}

#[tokio::test]
async fn test_doctor_day_unknown_doctor() {
    let setup = TestSetup::new().await;

    Mock::given(method("GET"))
        .and(path("/appointments/doctors/99/schedule"))
        .respond_with(ResponseTemplate::new(404).set_body_json(MockScheduleResponses::error_response("Doctor not found")))
        .mount(&setup.mock_server)
        .await;

    let err = setup.api.doctor_day(99, march_10()).await.unwrap_err();
    assert!(err.is_not_found());
}
