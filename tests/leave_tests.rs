use actix_web::http::StatusCode;
use hrdesk::database::models::{LeaveStatus, Role};
use pretty_assertions::assert_eq;
use serde_json::{Value, json};
use uuid::Uuid;

mod common;

use common::{MockData, Seeded, TestApp, TestAssertions};

fn window(from: i64, to: i64) -> Value {
    json!({
        "start_date": MockData::days_from_today(from),
        "end_date": MockData::days_from_today(to),
        "reason": "Family visit",
    })
}

async fn request_leave(app: &TestApp, who: &Seeded, from: i64, to: i64) -> Uuid {
    let (status, body) = app
        .post("/api/leave-request", &who.token, window(from, to))
        .await;
    assert_eq!(status, StatusCode::CREATED, "{}", body);
    TestAssertions::data(&body)["id"]
        .as_str()
        .and_then(|id| Uuid::parse_str(id).ok())
        .unwrap()
}

#[actix_web::test]
async fn test_create_leave_request_starts_pending() {
    let app = TestApp::new();
    let worker = app.seed_employee("worker", Role::Employee, "Engineering", None);

    let (status, body) = app
        .post("/api/leave-request", &worker.token, window(3, 5))
        .await;

    assert_eq!(status, StatusCode::CREATED);
    let data = TestAssertions::data(&body);
    assert_eq!(data["status"], "PENDING");
    assert_eq!(data["user_id"], worker.user.id.to_string());
    assert_eq!(data["approved_by"], Value::Null);
}

#[actix_web::test]
async fn test_leave_window_is_validated() {
    let app = TestApp::new();
    let worker = app.seed_employee("worker", Role::Employee, "Engineering", None);

    let (status, body) = app
        .post("/api/leave-request", &worker.token, window(-1, 2))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    TestAssertions::assert_error(&body, "start_date", "Leave start date cannot be in the past.");

    let (status, body) = app
        .post("/api/leave-request", &worker.token, window(5, 4))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    TestAssertions::assert_error(
        &body,
        "start_date",
        "Leave start date cannot be after leave end date.",
    );

    let (status, _) = app
        .post("/api/leave-request", &worker.token, window(0, 0))
        .await;
    assert_eq!(status, StatusCode::CREATED);
}

#[actix_web::test]
async fn test_overlapping_requests_are_rejected_until_the_first_is_rejected() {
    let app = TestApp::new();
    let worker = app.seed_employee("worker", Role::Employee, "Engineering", None);
    let first = request_leave(&app, &worker, 10, 14).await;

    let (status, body) = app
        .post("/api/leave-request", &worker.token, window(12, 20))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    TestAssertions::assert_error(&body, "non_field_errors", "You have an overlapping leave request.");

    // A window wholly inside the existing one also overlaps
    let (status, _) = app
        .post("/api/leave-request", &worker.token, window(11, 12))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    request_leave(&app, &worker, 15, 16).await;

    app.directory.set_leave_status(first, LeaveStatus::Rejected);
    request_leave(&app, &worker, 12, 13).await;
}

#[actix_web::test]
async fn test_overlap_is_per_user() {
    let app = TestApp::new();
    let one = app.seed_employee("one", Role::Employee, "Engineering", None);
    let two = app.seed_employee("two", Role::Employee, "Engineering", None);

    request_leave(&app, &one, 5, 8).await;
    request_leave(&app, &two, 5, 8).await;
}

#[actix_web::test]
async fn test_direct_manager_approves() {
    let app = TestApp::new();
    let manager = app.seed_employee("lead", Role::Manager, "Engineering", None);
    let worker = app.seed_employee(
        "worker",
        Role::Employee,
        "Engineering",
        Some(manager.employee_id()),
    );
    let id = request_leave(&app, &worker, 2, 3).await;

    let (status, body) = app
        .patch(&format!("/api/leave-request/{}/approve", id), &manager.token, json!({}))
        .await;

    assert_eq!(status, StatusCode::OK);
    let data = TestAssertions::data(&body);
    assert_eq!(data["status"], "APPROVED");
    assert_eq!(data["approved_by"], manager.user.id.to_string());
}

#[actix_web::test]
async fn test_only_admin_or_direct_manager_decides() {
    let app = TestApp::new();
    let admin = app.seed_employee("root", Role::Admin, "Administration", None);
    let manager = app.seed_employee("lead", Role::Manager, "Engineering", None);
    let other_manager = app.seed_employee("other", Role::Manager, "Engineering", None);
    let worker = app.seed_employee(
        "worker",
        Role::Employee,
        "Engineering",
        Some(manager.employee_id()),
    );
    let id = request_leave(&app, &worker, 2, 3).await;
    let uri = format!("/api/leave-request/{}/reject", id);

    for token in [&worker.token, &other_manager.token] {
        let (status, body) = app.patch(&uri, token, json!({})).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body["error_key"], "permission_denied");
    }
    assert_eq!(
        app.directory.leave_request(id).unwrap().status,
        LeaveStatus::Pending
    );

    let (status, body) = app.patch(&uri, &admin.token, json!({})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(TestAssertions::data(&body)["status"], "REJECTED");
}

#[actix_web::test]
async fn test_decided_requests_are_final() {
    let app = TestApp::new();
    let admin = app.seed_employee("root", Role::Admin, "Administration", None);
    let worker = app.seed_employee("worker", Role::Employee, "Engineering", None);
    let id = request_leave(&app, &worker, 2, 3).await;

    let (status, _) = app
        .patch(&format!("/api/leave-request/{}/approve", id), &admin.token, json!({}))
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = app
        .patch(&format!("/api/leave-request/{}/reject", id), &admin.token, json!({}))
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    TestAssertions::assert_error(
        &body,
        "conflict",
        "Only pending requests may be approved or rejected",
    );
    assert_eq!(
        app.directory.leave_request(id).unwrap().status,
        LeaveStatus::Approved
    );
}

#[actix_web::test]
async fn test_approving_twice_is_a_conflict() {
    let app = TestApp::new();
    let admin = app.seed_employee("root", Role::Admin, "Administration", None);
    let other_admin = app.seed_employee("deputy", Role::Admin, "Administration", None);
    let worker = app.seed_employee("worker", Role::Employee, "Engineering", None);
    let id = request_leave(&app, &worker, 2, 3).await;
    let uri = format!("/api/leave-request/{}/approve", id);

    let (status, _) = app.patch(&uri, &admin.token, json!({})).await;
    assert_eq!(status, StatusCode::OK);

    for approver in [&admin, &other_admin] {
        let (status, body) = app.patch(&uri, &approver.token, json!({})).await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["error_key"], "conflict");
    }

    let stored = app.directory.leave_request(id).unwrap();
    assert_eq!(stored.status, LeaveStatus::Approved);
    assert_eq!(stored.approved_by, Some(admin.user.id));
}

#[actix_web::test]
async fn test_decided_requests_conflict_before_permission_checks() {
    let app = TestApp::new();
    let lead = app.seed_employee("lead", Role::Manager, "Engineering", None);
    let other_lead = app.seed_employee("other", Role::Manager, "Sales", None);
    let worker = app.seed_employee(
        "worker",
        Role::Employee,
        "Engineering",
        Some(lead.employee_id()),
    );
    let id = request_leave(&app, &worker, 2, 3).await;

    let (status, _) = app
        .patch(&format!("/api/leave-request/{}/reject", id), &lead.token, json!({}))
        .await;
    assert_eq!(status, StatusCode::OK);

    // Neither the requester nor an unrelated manager may decide, but once the
    // request is final they are told so rather than refused
    for who in [&worker, &other_lead] {
        for action in ["approve", "reject"] {
            let (status, body) = app
                .patch(
                    &format!("/api/leave-request/{}/{}", id, action),
                    &who.token,
                    json!({}),
                )
                .await;
            assert_eq!(status, StatusCode::CONFLICT);
            TestAssertions::assert_error(
                &body,
                "conflict",
                "Only pending requests may be approved or rejected",
            );
        }
    }
    assert_eq!(
        app.directory.leave_request(id).unwrap().status,
        LeaveStatus::Rejected
    );
}

#[actix_web::test]
async fn test_unknown_leave_request_is_not_found() {
    let app = TestApp::new();
    let admin = app.seed_employee("root", Role::Admin, "Administration", None);

    let (status, body) = app
        .patch(
            &format!("/api/leave-request/{}/approve", Uuid::new_v4()),
            &admin.token,
            json!({}),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    TestAssertions::assert_error(&body, "not_found", "Leave request not found");

    let (status, _) = app
        .patch("/api/leave-request/not-a-uuid/approve", &admin.token, json!({}))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn test_my_requests_are_newest_window_first() {
    let app = TestApp::new();
    let worker = app.seed_employee("worker", Role::Employee, "Engineering", None);
    let other = app.seed_employee("other", Role::Employee, "Engineering", None);

    let early = request_leave(&app, &worker, 1, 2).await;
    let late = request_leave(&app, &worker, 20, 22).await;
    let middle = request_leave(&app, &worker, 10, 11).await;
    request_leave(&app, &other, 1, 2).await;

    let (status, body) = app.get("/api/leave-request/me", &worker.token).await;
    assert_eq!(status, StatusCode::OK);

    let ids: Vec<String> = TestAssertions::data(&body)
        .as_array()
        .unwrap()
        .iter()
        .map(|r| r["id"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(
        ids,
        vec![late.to_string(), middle.to_string(), early.to_string()]
    );
}

#[actix_web::test]
async fn test_team_listing_covers_direct_reports_only() {
    let app = TestApp::new();
    let admin = app.seed_employee("root", Role::Admin, "Administration", None);
    let manager = app.seed_employee("lead", Role::Manager, "Engineering", None);
    let sub_manager = app.seed_employee(
        "sublead",
        Role::Manager,
        "Engineering",
        Some(manager.employee_id()),
    );
    let indirect = app.seed_employee(
        "indirect",
        Role::Employee,
        "Engineering",
        Some(sub_manager.employee_id()),
    );
    let outsider = app.seed_employee("outsider", Role::Employee, "Sales", None);

    request_leave(&app, &sub_manager, 1, 1).await;
    request_leave(&app, &indirect, 2, 2).await;
    request_leave(&app, &outsider, 3, 3).await;

    let (status, body) = app.get("/api/leave-request/team", &manager.token).await;
    assert_eq!(status, StatusCode::OK);
    let team = TestAssertions::data(&body).as_array().unwrap().clone();
    assert_eq!(team.len(), 1);
    assert_eq!(team[0]["requester"]["username"], "sublead");
    assert_eq!(team[0]["employee"]["role"], "MANAGER");

    let (status, body) = app.get("/api/leave-request/team", &admin.token).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(TestAssertions::data(&body).as_array().unwrap().len(), 3);

    let (status, body) = app.get("/api/leave-request/team", &indirect.token).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error_key"], "permission_denied");
}
