#![allow(dead_code)]

use std::env;
use std::sync::{Arc, Mutex};

use actix_web::{App, http::StatusCode, test, web};
use anyhow::{Result, anyhow};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use fake::Fake;
use fake::faker::name::en::{FirstName, LastName};
use serde_json::Value;
use sqlx::PgPool;
use uuid::Uuid;

use hrdesk::database::init_database;
use hrdesk::database::models::*;
use hrdesk::database::repositories::{
    EmployeeStore, LeaveRequestStore, Stores, TimesheetStore, UserStore,
};
use hrdesk::error::AppError;
use hrdesk::middleware::RequestIdMiddleware;
use hrdesk::services::{NotificationError, Notifier, OutgoingEmail};
use hrdesk::{AppState, Config, LookupCache, routes};

pub const TEST_PASSWORD: &str = "password123";

//============================================================================
// In-memory directory
//============================================================================

#[derive(Default)]
struct Directory {
    users: Vec<User>,
    employees: Vec<Employee>,
    leave_requests: Vec<LeaveRequest>,
    timesheets: Vec<TimesheetEntry>,
}

impl Directory {
    fn user(&self, id: Uuid) -> Option<&User> {
        self.users.iter().find(|u| u.id == id)
    }

    fn employee_of(&self, user_id: Uuid) -> Option<&Employee> {
        self.employees.iter().find(|e| e.user_id == user_id)
    }

    fn requester(&self, user_id: Uuid) -> UserInfo {
        self.user(user_id)
            .map(UserInfo::from)
            .expect("record owner exists")
    }

    fn in_scope(&self, user_id: Uuid, scope: TeamScope) -> bool {
        scope.includes(self.employee_of(user_id).and_then(|e| e.manager_id))
    }
}

/// Store implementation backed by vectors behind one lock. Enforces the same
/// uniqueness rules as the schema.
#[derive(Clone, Default)]
pub struct MemoryDirectory {
    inner: Arc<Mutex<Directory>>,
}

impl MemoryDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stores(&self) -> Stores {
        Stores {
            users: Arc::new(self.clone()),
            employees: Arc::new(self.clone()),
            leave_requests: Arc::new(self.clone()),
            timesheets: Arc::new(self.clone()),
        }
    }

    pub fn insert_user(&self, user: User) {
        self.inner.lock().unwrap().users.push(user);
    }

    pub fn insert_employee(&self, employee: Employee) {
        self.inner.lock().unwrap().employees.push(employee);
    }

    pub fn user_count(&self) -> usize {
        self.inner.lock().unwrap().users.len()
    }

    pub fn user_by_username(&self, username: &str) -> Option<User> {
        let dir = self.inner.lock().unwrap();
        dir.users.iter().find(|u| u.username == username).cloned()
    }

    pub fn employee_by_user(&self, user_id: Uuid) -> Option<Employee> {
        self.inner.lock().unwrap().employee_of(user_id).cloned()
    }

    pub fn employee(&self, id: Uuid) -> Option<Employee> {
        let dir = self.inner.lock().unwrap();
        dir.employees.iter().find(|e| e.id == id).cloned()
    }

    pub fn leave_request(&self, id: Uuid) -> Option<LeaveRequest> {
        let dir = self.inner.lock().unwrap();
        dir.leave_requests.iter().find(|r| r.id == id).cloned()
    }

    pub fn set_leave_status(&self, id: Uuid, status: LeaveStatus) {
        let mut dir = self.inner.lock().unwrap();
        if let Some(request) = dir.leave_requests.iter_mut().find(|r| r.id == id) {
            request.status = status;
        }
    }
}

#[async_trait]
impl UserStore for MemoryDirectory {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>> {
        Ok(self.inner.lock().unwrap().user(id).cloned())
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<User>> {
        Ok(self.user_by_username(username))
    }

    async fn username_exists(&self, username: &str) -> Result<bool> {
        let dir = self.inner.lock().unwrap();
        Ok(dir
            .users
            .iter()
            .any(|u| u.username.eq_ignore_ascii_case(username)))
    }

    async fn email_exists(&self, email: &str) -> Result<bool> {
        let dir = self.inner.lock().unwrap();
        Ok(dir.users.iter().any(|u| u.email.eq_ignore_ascii_case(email)))
    }

    async fn provision(
        &self,
        account: NewAccount,
        employee: NewEmployee,
    ) -> Result<(User, Employee)> {
        let mut dir = self.inner.lock().unwrap();

        if dir
            .users
            .iter()
            .any(|u| u.username.eq_ignore_ascii_case(&account.username))
        {
            return Err(anyhow!(AppError::validation(
                "username",
                "This username is already taken."
            )));
        }
        if dir
            .users
            .iter()
            .any(|u| u.email.eq_ignore_ascii_case(&account.email))
        {
            return Err(anyhow!(AppError::validation(
                "email",
                "This email is already registered."
            )));
        }

        let user = User::new(account);
        let employee = Employee::new(user.id, employee);
        dir.users.push(user.clone());
        dir.employees.push(employee.clone());

        Ok((user, employee))
    }

    async fn complete_password_reset(&self, user_id: Uuid, password_hash: &str) -> Result<()> {
        let mut dir = self.inner.lock().unwrap();
        if let Some(user) = dir.users.iter_mut().find(|u| u.id == user_id) {
            user.password_hash = password_hash.to_string();
            user.updated_at = Utc::now();
        }
        if let Some(employee) = dir.employees.iter_mut().find(|e| e.user_id == user_id) {
            employee.password_reset_required = false;
            employee.temp_password = None;
        }
        Ok(())
    }

    async fn update_names(
        &self,
        user_id: Uuid,
        first_name: Option<&str>,
        last_name: Option<&str>,
    ) -> Result<User> {
        let mut dir = self.inner.lock().unwrap();
        let user = dir
            .users
            .iter_mut()
            .find(|u| u.id == user_id)
            .ok_or_else(|| anyhow!("no user {}", user_id))?;
        if let Some(first_name) = first_name {
            user.first_name = first_name.to_string();
        }
        if let Some(last_name) = last_name {
            user.last_name = last_name.to_string();
        }
        Ok(user.clone())
    }

    async fn set_active(&self, user_id: Uuid, active: bool) -> Result<()> {
        let mut dir = self.inner.lock().unwrap();
        if let Some(user) = dir.users.iter_mut().find(|u| u.id == user_id) {
            user.is_active = active;
        }
        Ok(())
    }
}

#[async_trait]
impl EmployeeStore for MemoryDirectory {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Employee>> {
        Ok(self.employee(id))
    }

    async fn find_by_user_id(&self, user_id: Uuid) -> Result<Option<Employee>> {
        Ok(self.employee_by_user(user_id))
    }

    async fn find_by_email_or_username(
        &self,
        identifier: &str,
    ) -> Result<Option<(User, Option<Employee>)>> {
        let dir = self.inner.lock().unwrap();
        let mut matches: Vec<&User> = dir
            .users
            .iter()
            .filter(|u| {
                u.email.eq_ignore_ascii_case(identifier)
                    || u.username.eq_ignore_ascii_case(identifier)
            })
            .collect();
        matches.sort_by_key(|u| (!u.email.eq_ignore_ascii_case(identifier), u.created_at));

        Ok(matches
            .first()
            .map(|user| ((*user).clone(), dir.employee_of(user.id).cloned())))
    }

    async fn update(&self, id: Uuid, changes: &EmployeeChanges) -> Result<Option<Employee>> {
        let mut dir = self.inner.lock().unwrap();
        Ok(dir.employees.iter_mut().find(|e| e.id == id).map(|employee| {
            employee.apply(changes);
            employee.clone()
        }))
    }

    async fn delete(&self, id: Uuid) -> Result<Option<Employee>> {
        let mut dir = self.inner.lock().unwrap();
        let Some(index) = dir.employees.iter().position(|e| e.id == id) else {
            return Ok(None);
        };
        let removed = dir.employees.remove(index);
        for employee in dir.employees.iter_mut() {
            if employee.manager_id == Some(id) {
                employee.manager_id = None;
            }
        }
        Ok(Some(removed))
    }
}

#[async_trait]
impl LeaveRequestStore for MemoryDirectory {
    async fn create(&self, user_id: Uuid, input: LeaveRequestInput) -> Result<LeaveRequest> {
        let request = LeaveRequest::new(user_id, input);
        self.inner
            .lock()
            .unwrap()
            .leave_requests
            .push(request.clone());
        Ok(request)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<LeaveRequest>> {
        Ok(self.leave_request(id))
    }

    async fn has_overlap(
        &self,
        user_id: Uuid,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<bool> {
        let dir = self.inner.lock().unwrap();
        Ok(dir.leave_requests.iter().any(|r| {
            r.user_id == user_id
                && r.status != LeaveStatus::Rejected
                && r.start_date <= end
                && r.end_date >= start
        }))
    }

    async fn decide(
        &self,
        id: Uuid,
        status: LeaveStatus,
        approver: Uuid,
    ) -> Result<Option<LeaveRequest>> {
        let mut dir = self.inner.lock().unwrap();
        Ok(dir
            .leave_requests
            .iter_mut()
            .find(|r| r.id == id && r.status == LeaveStatus::Pending)
            .map(|request| {
                request.status = status;
                request.approved_by = Some(approver);
                request.updated_at = Utc::now();
                request.clone()
            }))
    }

    async fn list_for_user(&self, user_id: Uuid) -> Result<Vec<LeaveRequest>> {
        let dir = self.inner.lock().unwrap();
        let mut requests: Vec<LeaveRequest> = dir
            .leave_requests
            .iter()
            .filter(|r| r.user_id == user_id)
            .cloned()
            .collect();
        requests.sort_by(|a, b| {
            b.start_date
                .cmp(&a.start_date)
                .then(b.end_date.cmp(&a.end_date))
        });
        Ok(requests)
    }

    async fn list_for_team(&self, scope: TeamScope) -> Result<Vec<TeamLeaveRequest>> {
        let dir = self.inner.lock().unwrap();
        let mut requests: Vec<TeamLeaveRequest> = dir
            .leave_requests
            .iter()
            .filter(|r| dir.in_scope(r.user_id, scope))
            .map(|r| TeamLeaveRequest {
                request: r.clone(),
                requester: dir.requester(r.user_id),
                employee: dir.employee_of(r.user_id).map(Employee::summary),
            })
            .collect();
        requests.sort_by(|a, b| {
            b.request
                .start_date
                .cmp(&a.request.start_date)
                .then(b.request.end_date.cmp(&a.request.end_date))
        });
        Ok(requests)
    }
}

#[async_trait]
impl TimesheetStore for MemoryDirectory {
    async fn find_open(&self, user_id: Uuid) -> Result<Option<TimesheetEntry>> {
        let dir = self.inner.lock().unwrap();
        Ok(dir
            .timesheets
            .iter()
            .filter(|t| t.user_id == user_id && t.is_open())
            .max_by_key(|t| t.clock_in_time)
            .cloned())
    }

    async fn clock_in(
        &self,
        user_id: Uuid,
        clock_in_time: DateTime<Utc>,
    ) -> Result<TimesheetEntry> {
        let mut dir = self.inner.lock().unwrap();
        if dir
            .timesheets
            .iter()
            .any(|t| t.user_id == user_id && t.is_open())
        {
            return Err(anyhow!(AppError::invalid("You have already clocked in.")));
        }
        let entry = TimesheetEntry::open(user_id, clock_in_time);
        dir.timesheets.push(entry.clone());
        Ok(entry)
    }

    async fn clock_out(
        &self,
        entry_id: Uuid,
        clock_out_time: DateTime<Utc>,
        working_seconds: i64,
    ) -> Result<Option<TimesheetEntry>> {
        let mut dir = self.inner.lock().unwrap();
        Ok(dir
            .timesheets
            .iter_mut()
            .find(|t| t.id == entry_id && t.is_open())
            .map(|entry| {
                entry.clock_out_time = Some(clock_out_time);
                entry.working_seconds = Some(working_seconds);
                entry.updated_at = Utc::now();
                entry.clone()
            }))
    }

    async fn list_for_user(&self, user_id: Uuid) -> Result<Vec<TimesheetEntry>> {
        let dir = self.inner.lock().unwrap();
        let mut entries: Vec<TimesheetEntry> = dir
            .timesheets
            .iter()
            .filter(|t| t.user_id == user_id)
            .cloned()
            .collect();
        entries.sort_by(|a, b| b.clock_in_time.cmp(&a.clock_in_time));
        Ok(entries)
    }

    async fn list_for_team(&self, scope: TeamScope) -> Result<Vec<TeamTimesheetEntry>> {
        let dir = self.inner.lock().unwrap();
        let mut entries: Vec<TeamTimesheetEntry> = dir
            .timesheets
            .iter()
            .filter(|t| dir.in_scope(t.user_id, scope))
            .map(|t| TeamTimesheetEntry {
                entry: t.clone().into(),
                requester: dir.requester(t.user_id),
                employee: dir.employee_of(t.user_id).map(Employee::summary),
            })
            .collect();
        entries.sort_by(|a, b| b.entry.clock_in_time.cmp(&a.entry.clock_in_time));
        Ok(entries)
    }
}

//============================================================================
// Postgres
//============================================================================

/// Migrated Postgres pool for repository tests, taken from `DATABASE_URL`.
pub struct TestDb {
    pub pool: PgPool,
}

impl TestDb {
    /// `None` when no database is configured; callers return early.
    pub async fn connect() -> Option<Self> {
        setup_test_env();

        if env::var("DATABASE_URL").is_err() {
            log::warn!("DATABASE_URL is not set, skipping database test");
            return None;
        }

        let config = Config::from_env_only().expect("test config");
        let pool = init_database(&config)
            .await
            .expect("connect to and migrate the test database");

        Some(Self { pool })
    }

    pub fn stores(&self) -> Stores {
        Stores::postgres(self.pool.clone())
    }
}

//============================================================================
// Notifiers
//============================================================================

#[derive(Default)]
pub struct RecordingNotifier {
    sent: Mutex<Vec<OutgoingEmail>>,
}

impl RecordingNotifier {
    pub fn sent(&self) -> Vec<OutgoingEmail> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn send(&self, email: &OutgoingEmail) -> Result<(), NotificationError> {
        self.sent.lock().unwrap().push(email.clone());
        Ok(())
    }
}

/// Mail server that rejects every recipient.
pub struct FailingNotifier;

#[async_trait]
impl Notifier for FailingNotifier {
    async fn send(&self, _email: &OutgoingEmail) -> Result<(), NotificationError> {
        Err(NotificationError::Smtp {
            code: Some(550),
            message: "mailbox unavailable".to_string(),
        })
    }
}

//============================================================================
// Test application
//============================================================================

pub struct Seeded {
    pub user: User,
    pub employee: Option<Employee>,
    pub token: String,
}

impl Seeded {
    pub fn employee_id(&self) -> Uuid {
        self.employee.as_ref().map(|e| e.id).expect("seeded with a profile")
    }
}

pub struct TestApp {
    pub directory: MemoryDirectory,
    pub config: Config,
    pub notifier: Arc<RecordingNotifier>,
    pub state: web::Data<AppState>,
}

impl TestApp {
    pub fn new() -> Self {
        let notifier = Arc::new(RecordingNotifier::default());
        Self::build(notifier.clone(), notifier)
    }

    pub fn with_notifier(notifier: Arc<dyn Notifier>) -> Self {
        Self::build(Arc::new(RecordingNotifier::default()), notifier)
    }

    fn build(recording: Arc<RecordingNotifier>, notifier: Arc<dyn Notifier>) -> Self {
        setup_test_env();

        let config = Config::test_config();
        let directory = MemoryDirectory::new();
        let cache = LookupCache::from_config(&config);
        let state = web::Data::new(AppState::new(
            directory.stores(),
            cache,
            notifier,
            config.clone(),
        ));

        Self {
            directory,
            config,
            notifier: recording,
            state,
        }
    }

    /// Sends one request through the full route table.
    pub async fn send(&self, req: test::TestRequest) -> (StatusCode, Value) {
        let app = test::init_service(
            App::new()
                .app_data(self.state.clone())
                .app_data(web::Data::new(self.config.clone()))
                .wrap(RequestIdMiddleware)
                .configure(routes::configure),
        )
        .await;

        let res = test::call_service(&app, req.to_request()).await;
        let status = res.status();
        let body = test::read_body(res).await;
        let json = serde_json::from_slice(&body).unwrap_or(Value::Null);

        (status, json)
    }

    pub async fn get(&self, uri: &str, token: &str) -> (StatusCode, Value) {
        self.send(
            test::TestRequest::get()
                .uri(uri)
                .insert_header(AuthHelper::auth_header(token)),
        )
        .await
    }

    pub async fn post(&self, uri: &str, token: &str, body: Value) -> (StatusCode, Value) {
        self.send(
            test::TestRequest::post()
                .uri(uri)
                .insert_header(AuthHelper::auth_header(token))
                .set_json(body),
        )
        .await
    }

    pub async fn patch(&self, uri: &str, token: &str, body: Value) -> (StatusCode, Value) {
        self.send(
            test::TestRequest::patch()
                .uri(uri)
                .insert_header(AuthHelper::auth_header(token))
                .set_json(body),
        )
        .await
    }

    pub async fn put(&self, uri: &str, token: &str, body: Value) -> (StatusCode, Value) {
        self.send(
            test::TestRequest::put()
                .uri(uri)
                .insert_header(AuthHelper::auth_header(token))
                .set_json(body),
        )
        .await
    }

    pub async fn delete(&self, uri: &str, token: &str) -> (StatusCode, Value) {
        self.send(
            test::TestRequest::delete()
                .uri(uri)
                .insert_header(AuthHelper::auth_header(token)),
        )
        .await
    }

    /// Account plus employee profile, already past its first-login reset.
    pub fn seed_employee(
        &self,
        username: &str,
        role: Role,
        department: &str,
        manager_id: Option<Uuid>,
    ) -> Seeded {
        let user = MockData::user(username);
        let employee = Employee::new(
            user.id,
            NewEmployee {
                role,
                department: department.to_string(),
                job_title: None,
                hire_date: Utc::now().date_naive(),
                manager_id,
                password_reset_required: false,
                temp_password: None,
            },
        );

        self.directory.insert_user(user.clone());
        self.directory.insert_employee(employee.clone());

        let token = AuthHelper::token(&self.state, &user, Some(role));
        Seeded {
            user,
            employee: Some(employee),
            token,
        }
    }

    /// Account with no employee profile.
    pub fn seed_account(&self, username: &str) -> Seeded {
        let user = MockData::user(username);
        self.directory.insert_user(user.clone());

        let token = AuthHelper::token(&self.state, &user, None);
        Seeded {
            user,
            employee: None,
            token,
        }
    }
}

//============================================================================
// Helpers
//============================================================================

pub struct MockData;

impl MockData {
    pub fn user(username: &str) -> User {
        User::new(NewAccount {
            username: username.to_string(),
            email: format!("{}@example.com", username),
            password_hash: bcrypt::hash(TEST_PASSWORD, 4).expect("hash test password"),
            first_name: FirstName().fake(),
            last_name: LastName().fake(),
            is_staff: false,
        })
    }

    pub fn days_from_today(days: i64) -> NaiveDate {
        Utc::now().date_naive() + chrono::Duration::days(days)
    }
}

pub struct AuthHelper;

impl AuthHelper {
    pub fn token(state: &web::Data<AppState>, user: &User, role: Option<Role>) -> String {
        state
            .auth
            .generate_token(user, role)
            .expect("Failed to create test token")
    }

    pub fn auth_header(token: &str) -> (&'static str, String) {
        ("Authorization", format!("Bearer {}", token))
    }
}

pub struct TestAssertions;

impl TestAssertions {
    pub fn assert_error(body: &Value, error_key: &str, message: &str) {
        assert_eq!(body["success"], false, "expected an error body: {}", body);
        assert_eq!(body["error_key"], error_key, "unexpected error key: {}", body);
        assert_eq!(body["message"], message, "unexpected message: {}", body);
    }

    pub fn data(body: &Value) -> &Value {
        assert_eq!(body["success"], true, "expected a success body: {}", body);
        &body["data"]
    }
}

pub fn setup_test_env() {
    if env::var("RUST_LOG").is_err() {
        unsafe {
            env::set_var("RUST_LOG", "debug");
        }
    }
    let _ = env_logger::builder().is_test(true).try_init();
}
