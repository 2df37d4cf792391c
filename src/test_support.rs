use std::sync::{Mutex, MutexGuard, OnceLock, PoisonError};

use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request},
    Router,
};
use sqlx::PgPool;
use time::Duration;
use uuid::Uuid;

use crate::api;
use crate::core::{
    config::Settings, redis::RedisHandle, security, state::AppState, time::primitive_now_utc,
};
use crate::db::models::{CourseRule, Exam, Examinee};
use crate::db::types::ExamKind;
use crate::repositories;

const TEST_SECRET_KEY: &str = "test-secret";

pub(crate) struct TestContext {
    pub(crate) state: AppState,
    pub(crate) app: Router,
    _guard: MutexGuard<'static, ()>,
}

/// Serializes tests that mutate process env vars or share the test database.
pub(crate) fn env_lock() -> MutexGuard<'static, ()> {
    static LOCK: OnceLock<Mutex<()>> = OnceLock::new();
    LOCK.get_or_init(|| Mutex::new(())).lock().unwrap_or_else(PoisonError::into_inner)
}

fn test_database_url() -> Option<String> {
    dotenvy::dotenv().ok();

    if let Ok(url) = std::env::var("DATABASE_URL") {
        if !url.trim().is_empty() {
            return Some(url);
        }
    }

    let server = std::env::var("POSTGRES_SERVER").ok()?;
    let port = std::env::var("POSTGRES_PORT").unwrap_or_else(|_| "5432".into());
    let user = std::env::var("POSTGRES_USER").unwrap_or_else(|_| "entrexsuperuser".into());
    let password = std::env::var("POSTGRES_PASSWORD").unwrap_or_default();
    let db = std::env::var("POSTGRES_DB").unwrap_or_else(|_| "entrex_db".into());

    Some(format!("postgresql://{user}:{password}@{server}:{port}/{db}"))
}

fn set_test_env(database_url: &str) {
    std::env::set_var("SECRET_KEY", TEST_SECRET_KEY);
    std::env::set_var("DATABASE_URL", database_url);
    std::env::remove_var("PROMETHEUS_ENABLED");
    std::env::remove_var("ENTREX_STRICT_CONFIG");
    std::env::remove_var("API_V1_STR");
}

/// Full router + database context for flow tests. Returns `None` when no
/// test database is configured so `cargo test` stays green on a bare
/// checkout, the same way the migrations smoke test skips.
pub(crate) async fn setup_test_context() -> Option<TestContext> {
    let guard = env_lock();

    let Some(database_url) = test_database_url() else {
        return None;
    };
    set_test_env(&database_url);

    let settings = Settings::load().expect("settings");
    let db = prepare_db(&settings).await;

    // No live redis in tests: rate limiting and override reads fail open.
    let redis = RedisHandle::new(settings.redis().redis_url());

    let state = AppState::new(settings, db, redis);
    let app = api::router::router(state.clone());

    Some(TestContext { state, app, _guard: guard })
}

async fn prepare_db(settings: &Settings) -> PgPool {
    let db = crate::db::init_pool(settings).await.expect("db pool");
    ensure_schema(&db).await.expect("schema");
    reset_db(&db).await.expect("reset db");
    db
}

async fn ensure_schema(pool: &PgPool) -> Result<(), sqlx::Error> {
    let migrations_dir =
        std::env::var("ENTREX_MIGRATIONS_DIR").unwrap_or_else(|_| "migrations".to_string());
    let mut migrator = sqlx::migrate::Migrator::new(std::path::Path::new(&migrations_dir))
        .await
        .map_err(|error| sqlx::Error::Migrate(Box::new(error)))?;
    migrator.set_ignore_missing(true);
    migrator.run(pool).await.map_err(|error| sqlx::Error::Migrate(Box::new(error)))?;
    Ok(())
}

async fn reset_db(pool: &PgPool) -> Result<(), sqlx::Error> {
    sqlx::query(
        "TRUNCATE examinee_recommendations, course_rules, personality_results, \
         personality_answers, answers, exam_attempts, device_tokens, questions, \
         personality_questions, exams, examinees RESTART IDENTITY CASCADE",
    )
    .execute(pool)
    .await?;
    Ok(())
}

pub(crate) async fn insert_examinee(pool: &PgPool, username: &str, password: &str) -> Examinee {
    let hashed_password = security::hash_password(password).expect("hash password");
    let now = primitive_now_utc();

    repositories::examinees::create(
        pool,
        repositories::examinees::CreateExaminee {
            id: &Uuid::new_v4().to_string(),
            username,
            hashed_password,
            full_name: "Test Examinee",
            is_admin: false,
            is_active: true,
            created_at: now,
            updated_at: now,
        },
    )
    .await
    .expect("insert examinee")
}

pub(crate) struct ExamFixture<'a> {
    pub(crate) code: &'a str,
    pub(crate) kind: ExamKind,
    pub(crate) passing_rate: Option<f64>,
    pub(crate) includes_personality: bool,
}

pub(crate) async fn insert_exam(pool: &PgPool, fixture: ExamFixture<'_>) -> Exam {
    let now = primitive_now_utc();
    sqlx::query_as::<_, Exam>(&format!(
        "INSERT INTO exams (id, code, title, kind, time_limit_minutes, passing_rate, \
         includes_personality, scheduled_on, created_at, updated_at) \
         VALUES ($1,$2,$3,$4,60,$5,$6,NULL,$7,$7) \
         RETURNING {}",
        repositories::exams::COLUMNS
    ))
    .bind(Uuid::new_v4().to_string())
    .bind(fixture.code)
    .bind("Test Exam")
    .bind(fixture.kind)
    .bind(fixture.passing_rate)
    .bind(fixture.includes_personality)
    .bind(now)
    .fetch_one(pool)
    .await
    .expect("insert exam")
}

pub(crate) async fn insert_question(
    pool: &PgPool,
    exam_id: &str,
    id: &str,
    category: Option<&str>,
    correct_answer: &str,
    position: i32,
) {
    sqlx::query(
        "INSERT INTO questions (id, exam_id, category, correct_answer, position) \
         VALUES ($1,$2,$3,$4,$5)",
    )
    .bind(id)
    .bind(exam_id)
    .bind(category)
    .bind(correct_answer)
    .bind(position)
    .execute(pool)
    .await
    .expect("insert question");
}

pub(crate) async fn insert_personality_question(
    pool: &PgPool,
    id: &str,
    positive_side: &str,
    negative_side: &str,
) {
    sqlx::query(
        "INSERT INTO personality_questions (id, positive_side, negative_side) \
         VALUES ($1,$2,$3)",
    )
    .bind(id)
    .bind(positive_side)
    .bind(negative_side)
    .execute(pool)
    .await
    .expect("insert personality question");
}

pub(crate) async fn insert_course_rule(
    pool: &PgPool,
    personality_type: &str,
    min_score: f64,
    max_score: f64,
    course_id: &str,
    passing_rate: Option<f64>,
) -> CourseRule {
    sqlx::query_as::<_, CourseRule>(&format!(
        "INSERT INTO course_rules (id, personality_type, min_score, max_score, course_id, \
         passing_rate) VALUES ($1,$2,$3,$4,$5,$6) \
         RETURNING {}",
        repositories::course_rules::COLUMNS
    ))
    .bind(Uuid::new_v4().to_string())
    .bind(personality_type)
    .bind(min_score)
    .bind(max_score)
    .bind(course_id)
    .bind(passing_rate)
    .fetch_one(pool)
    .await
    .expect("insert course rule")
}

/// Issues a live device token row plus the JWT that references it, the way
/// a successful login would.
pub(crate) async fn bearer_token(pool: &PgPool, settings: &Settings, examinee_id: &str) -> String {
    let now = primitive_now_utc();
    let token_id = Uuid::new_v4().to_string();

    repositories::device_tokens::create(
        pool,
        repositories::device_tokens::CreateToken {
            id: &token_id,
            examinee_id,
            device_id: Some("test-device"),
            created_at: now,
            expires_at: Some(now + Duration::days(30)),
        },
    )
    .await
    .expect("insert device token");

    security::create_access_token(examinee_id, &token_id, settings, None).expect("token")
}

pub(crate) fn json_request(
    method: Method,
    uri: &str,
    token: Option<&str>,
    body: Option<serde_json::Value>,
) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);

    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }

    if let Some(body) = body {
        let bytes = serde_json::to_vec(&body).expect("serialize body");
        builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(bytes))
            .expect("request body")
    } else {
        builder.body(Body::empty()).expect("request body")
    }
}

pub(crate) async fn read_json(response: axum::response::Response<Body>) -> serde_json::Value {
    let body = to_bytes(response.into_body(), usize::MAX).await.expect("response body");
    serde_json::from_slice(&body).unwrap_or_else(|err| {
        let body_text = String::from_utf8_lossy(&body);
        panic!("json parse: {err}; body: {body_text}");
    })
}
