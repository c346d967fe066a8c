//! End-to-end API tests against a temporary database.

use axum::http::{HeaderName, HeaderValue, StatusCode};
use axum_test::TestServer;
use serde_json::{json, Value};
use tempfile::TempDir;

use sat_practice::auth::db::{add_role, create_session, create_user, ADMIN_ROLE};
use sat_practice::config::AppConfig;
use sat_practice::db::{self, DbPool};
use sat_practice::domain::{AnswerLetter, AnswerOptions, Difficulty, Domain, Question, Section};
use sat_practice::state::AppState;

struct Harness {
    _temp: TempDir,
    pool: DbPool,
    server: TestServer,
    cookie: HeaderValue,
}

fn cookie_header() -> HeaderName {
    HeaderName::from_static("cookie")
}

fn question(id: &str, test_id: Option<&str>, section: Section, order: i64) -> Question {
    Question {
        id: id.to_string(),
        section,
        module_number: 1,
        question_text: format!("Question {}", id),
        options: AnswerOptions::new("first", "second", "third", "fourth"),
        correct_answer: AnswerLetter::B,
        explanation: format!("Explanation for {}", id),
        difficulty: Difficulty::Medium,
        domain: Some(match section {
            Section::ReadingWriting => Domain::InformationIdeas,
            Section::Math => Domain::Algebra,
        }),
        topic: None,
        order_index: Some(order),
        test_id: test_id.map(str::to_string),
    }
}

impl Harness {
    fn new() -> Self {
        let temp = TempDir::new().unwrap();
        let db_path = temp.path().join("sat.db");
        let pool = db::init_db(&db_path).unwrap();

        let config = AppConfig {
            database_path: db_path,
            port: 0,
            session_time_limit_secs: 600,
        };
        let server = TestServer::new(sat_practice::app(AppState::new(pool.clone(), config))).unwrap();

        let mut harness = Self {
            _temp: temp,
            pool,
            server,
            cookie: HeaderValue::from_static(""),
        };
        harness.cookie = harness.sign_in("student@example.com");
        harness
    }

    /// Create a user with a live session and return its cookie header
    fn sign_in(&self, email: &str) -> HeaderValue {
        self.sign_in_with_roles(email, &[])
    }

    fn sign_in_with_roles(&self, email: &str, roles: &[&str]) -> HeaderValue {
        let conn = self.pool.lock().unwrap();
        let user = create_user(&conn, email, None).unwrap();
        for role in roles {
            add_role(&conn, &user, role).unwrap();
        }
        let token = create_session(&conn, &user, 24).unwrap();
        HeaderValue::from_str(&format!("sat_session={}", token)).unwrap()
    }

    /// Published test with two R&W questions followed by two Math questions
    fn seed_test(&self, test_id: &str) {
        let conn = self.pool.lock().unwrap();
        db::insert_test(&conn, test_id, "Practice Test 1", Some("Full length"), true).unwrap();
        let layout = [
            ("rw1", Section::ReadingWriting),
            ("rw2", Section::ReadingWriting),
            ("m1", Section::Math),
            ("m2", Section::Math),
        ];
        for (i, (id, section)) in layout.into_iter().enumerate() {
            let id = format!("{}-{}", test_id, id);
            db::insert_question(&conn, &question(&id, Some(test_id), section, i as i64 + 1)).unwrap();
        }
    }

    fn seed_pool(&self) {
        let conn = self.pool.lock().unwrap();
        for i in 0..3 {
            db::insert_question(&conn, &question(&format!("pool-m{}", i), None, Section::Math, i)).unwrap();
        }
        db::insert_question(&conn, &question("pool-rw", None, Section::ReadingWriting, 0)).unwrap();
    }

    fn attempt_count(&self) -> i64 {
        let conn = self.pool.lock().unwrap();
        conn.query_row("SELECT COUNT(*) FROM test_attempts", [], |row| row.get(0)).unwrap()
    }

    async fn get(&self, path: &str) -> axum_test::TestResponse {
        self.server.get(path).add_header(cookie_header(), self.cookie.clone()).await
    }

    async fn post(&self, path: &str, body: Value) -> axum_test::TestResponse {
        self.server
            .post(path)
            .add_header(cookie_header(), self.cookie.clone())
            .json(&body)
            .await
    }

    async fn start(&self, test_id: &str) -> String {
        let response = self.post(&format!("/tests/{}/attempts", test_id), json!({})).await;
        response.assert_status(StatusCode::CREATED);
        response.json::<Value>()["attempt_id"].as_str().unwrap().to_string()
    }
}

#[tokio::test]
async fn test_health_and_auth_required() {
    let h = Harness::new();
    h.server.get("/health").await.assert_status_ok();
    h.server.get("/tests").await.assert_status(StatusCode::UNAUTHORIZED);

    let bogus = HeaderValue::from_static("sat_session=nope");
    h.server
        .get("/tests")
        .add_header(cookie_header(), bogus)
        .await
        .assert_status(StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_listing_hides_unpublished() {
    let h = Harness::new();
    h.seed_test("t1");
    {
        let conn = h.pool.lock().unwrap();
        db::insert_test(&conn, "draft", "Draft", None, false).unwrap();
    }

    let tests = h.get("/tests").await.json::<Value>();
    let tests = tests.as_array().unwrap();
    assert_eq!(tests.len(), 1);
    assert_eq!(tests[0]["id"], "t1");
    assert_eq!(tests[0]["question_count"], 4);

    h.post("/tests/draft/attempts", json!({}))
        .await
        .assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_admin_sees_unpublished_tests() {
    let h = Harness::new();
    h.seed_test("t1");
    {
        let conn = h.pool.lock().unwrap();
        db::insert_test(&conn, "draft", "Draft", None, false).unwrap();
    }
    let admin = h.sign_in_with_roles("admin@example.com", &[ADMIN_ROLE]);

    let tests = h
        .server
        .get("/tests")
        .add_header(cookie_header(), admin.clone())
        .await
        .json::<Value>();
    let mut ids: Vec<&str> = tests.as_array().unwrap().iter().filter_map(|t| t["id"].as_str()).collect();
    ids.sort();
    assert_eq!(ids, vec!["draft", "t1"]);

    // Visible to the admin, but it has no questions yet
    h.server
        .post("/tests/draft/attempts")
        .add_header(cookie_header(), admin)
        .json(&json!({}))
        .await
        .assert_status(StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn test_full_attempt_flow() {
    let h = Harness::new();
    h.seed_test("t1");
    let attempt_id = h.start("t1").await;

    let view = h.get(&format!("/attempts/{}", attempt_id)).await.json::<Value>();
    assert_eq!(view["total_questions"], 4);
    assert_eq!(view["current_index"], 0);
    assert_eq!(view["state"]["status"], "in_progress");
    assert!(view["question"].get("correct_answer").is_none());
    assert!(view["question"].get("explanation").is_none());

    // All correct except the last math question; mark the first question
    let answers = ["B", "B", "B", "A"];
    for (i, answer) in answers.iter().enumerate() {
        if i == 0 {
            let marked = h.post(&format!("/attempts/{}/mark", attempt_id), json!({})).await;
            assert_eq!(marked.json::<Value>()["is_marked"], true);
        }
        let view = h
            .post(&format!("/attempts/{}/answer", attempt_id), json!({ "answer": answer }))
            .await
            .json::<Value>();
        assert_eq!(view["selected"], *answer);
        h.post(&format!("/attempts/{}/next", attempt_id), json!({})).await.assert_status_ok();
    }

    let view = h
        .post(&format!("/attempts/{}/previous", attempt_id), json!({}))
        .await
        .json::<Value>();
    assert_eq!(view["current_index"], 2);
    assert_eq!(view["answered_count"], 4);

    let response = h.post(&format!("/attempts/{}/submit", attempt_id), json!({})).await;
    response.assert_status_ok();
    let receipt = response.json::<Value>();
    assert_eq!(receipt["scores"]["reading_writing"]["score"], 800);
    assert_eq!(receipt["scores"]["math"]["score"], 500);
    assert_eq!(receipt["scores"]["total_score"], 1300);
    assert_eq!(receipt["results_path"], format!("/results/{}", attempt_id));
    let kinds: Vec<&str> = receipt["notifications"]
        .as_array()
        .unwrap()
        .iter()
        .filter_map(|n| n["key"].as_str())
        .collect();
    assert_eq!(kinds, vec!["first_test"]);

    // Second trigger after completion
    h.post(&format!("/attempts/{}/submit", attempt_id), json!({}))
        .await
        .assert_status(StatusCode::CONFLICT);

    let results = h.get(&format!("/results/{}", attempt_id)).await.json::<Value>();
    assert_eq!(results["total_score"], 1300);
    assert_eq!(results["test_title"], "Practice Test 1");
    assert_eq!(results["math"]["percent"], 50);
    assert_eq!(results["reading_writing"]["percent"], 100);

    let all = h.get(&format!("/results/{}/review", attempt_id)).await.json::<Value>();
    assert_eq!(all.as_array().unwrap().len(), 4);
    let wrong = h
        .get(&format!("/results/{}/review?filter=wrong", attempt_id))
        .await
        .json::<Value>();
    assert_eq!(wrong.as_array().unwrap().len(), 1);
    let marked = h
        .get(&format!("/results/{}/review?filter=marked", attempt_id))
        .await
        .json::<Value>();
    assert_eq!(marked.as_array().unwrap().len(), 1);
    h.get(&format!("/results/{}/review?filter=bogus", attempt_id))
        .await
        .assert_status(StatusCode::BAD_REQUEST);

    let dashboard = h.get("/me/stats").await.json::<Value>();
    let history = dashboard["history"].as_array().unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0]["id"], attempt_id);
    assert_eq!(history[0]["total_score"], 1300);
}

#[tokio::test]
async fn test_unanswered_questions_score_as_wrong() {
    let h = Harness::new();
    h.seed_test("t1");
    let attempt_id = h.start("t1").await;

    let receipt = h
        .post(&format!("/attempts/{}/submit", attempt_id), json!({}))
        .await
        .json::<Value>();
    assert_eq!(receipt["scores"]["total_score"], 400);

    let review = h.get(&format!("/results/{}/review", attempt_id)).await.json::<Value>();
    assert_eq!(review.as_array().unwrap().len(), 4);
}

#[tokio::test]
async fn test_empty_test_creates_no_attempt() {
    let h = Harness::new();
    {
        let conn = h.pool.lock().unwrap();
        db::insert_test(&conn, "empty", "Empty", None, true).unwrap();
    }

    let response = h.post("/tests/empty/attempts", json!({})).await;
    response.assert_status(StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(response.json::<Value>()["redirect"], "/tests");
    assert_eq!(h.attempt_count(), 0);
}

#[tokio::test]
async fn test_results_of_in_progress_attempt_rejected() {
    let h = Harness::new();
    h.seed_test("t1");
    let attempt_id = h.start("t1").await;

    h.get(&format!("/results/{}", attempt_id))
        .await
        .assert_status(StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_other_users_cannot_touch_attempt() {
    let h = Harness::new();
    h.seed_test("t1");
    let attempt_id = h.start("t1").await;
    let intruder = h.sign_in("other@example.com");

    for path in [format!("/attempts/{}", attempt_id), format!("/results/{}", attempt_id)] {
        h.server
            .get(&path)
            .add_header(cookie_header(), intruder.clone())
            .await
            .assert_status(StatusCode::NOT_FOUND);
    }
    h.server
        .post(&format!("/attempts/{}/submit", attempt_id))
        .add_header(cookie_header(), intruder)
        .await
        .assert_status(StatusCode::NOT_FOUND);

    // Owner is unaffected
    h.post(&format!("/attempts/{}/submit", attempt_id), json!({}))
        .await
        .assert_status_ok();
}

#[tokio::test]
async fn test_practice_flow_updates_stats() {
    let h = Harness::new();
    h.seed_pool();

    let response = h.post("/practice", json!({ "section": "math", "limit": 2 })).await;
    response.assert_status(StatusCode::CREATED);
    let view = response.json::<Value>();
    assert_eq!(view["total_questions"], 2);
    assert!(view["feedback"].is_null());
    let id = view["id"].as_str().unwrap().to_string();

    let answered = h
        .post(&format!("/practice/{}/answer", id), json!({ "answer": "B" }))
        .await
        .json::<Value>();
    assert_eq!(answered["feedback"]["is_correct"], true);
    assert_eq!(answered["feedback"]["correct_answer"], "B");
    assert_eq!(answered["stats"]["total_questions_answered"], 1);
    assert_eq!(answered["notifications"][0]["key"], "first_question");

    h.post(&format!("/practice/{}/answer", id), json!({ "answer": "C" }))
        .await
        .assert_status(StatusCode::CONFLICT);

    let view = h.post(&format!("/practice/{}/next", id), json!({})).await.json::<Value>();
    assert_eq!(view["current_index"], 1);

    let summary = h.post(&format!("/practice/{}/finish", id), json!({})).await.json::<Value>();
    assert_eq!(summary, json!({ "correct": 1, "total": 2, "percent": 50 }));
    h.get(&format!("/practice/{}", id)).await.assert_status(StatusCode::NOT_FOUND);

    let dashboard = h.get("/me/stats").await.json::<Value>();
    assert_eq!(dashboard["stats"]["xp"], 10);
    assert_eq!(dashboard["stats"]["streak_days"], 1);
    assert_eq!(dashboard["xp_to_next_level"], 90);
    assert_eq!(dashboard["unlocked"], json!(["first_question"]));

    let catalog = h.get("/achievements").await.json::<Value>();
    let catalog = catalog.as_array().unwrap();
    assert_eq!(catalog.len(), 10);
    assert_eq!(catalog.iter().filter(|a| a["unlocked"] == true).count(), 1);
}

#[tokio::test]
async fn test_practice_without_matching_questions() {
    let h = Harness::new();
    h.seed_pool();
    h.post("/practice", json!({ "difficulty": "hard" }))
        .await
        .assert_status(StatusCode::NOT_FOUND);
}
