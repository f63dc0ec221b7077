use std::sync::Arc;

use anyhow::Result;
use axum::Router;
use axum::body::Body;
use axum::http::{Request, Response, StatusCode, header};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use tower::ServiceExt;

use staffmetrics_api::{ApiSettings, ApiState, JwtConfig, JwtService, build_app};
use staffmetrics_store::MemoryStore;

struct TestApp {
    app: Router,
    token: String,
}

fn test_app(rate_limit_per_minute: u32) -> Result<TestApp> {
    let jwt = JwtService::with_config(JwtConfig {
        secret: "route-test-secret".to_string(),
        ..JwtConfig::default()
    })?;
    let token = jwt.issue("analyst", None)?;
    let settings = ApiSettings {
        rate_limit_per_minute,
        export_chunk_size: 2,
        ..ApiSettings::default()
    };
    let state = ApiState::new(Arc::new(MemoryStore::new()), jwt, settings);
    Ok(TestApp {
        app: build_app(state),
        token,
    })
}

impl TestApp {
    async fn send(&self, method: &str, uri: &str, body: Option<Value>) -> Result<Response<Body>> {
        let mut builder = Request::builder()
            .method(method)
            .uri(uri)
            .header(header::AUTHORIZATION, format!("Bearer {}", self.token));
        let body = match body {
            Some(value) => {
                builder = builder.header(header::CONTENT_TYPE, "application/json");
                Body::from(value.to_string())
            }
            None => Body::empty(),
        };
        Ok(self.app.clone().oneshot(builder.body(body)?).await?)
    }

    async fn json(&self, method: &str, uri: &str, body: Option<Value>) -> Result<(StatusCode, Value)> {
        let response = self.send(method, uri, body).await?;
        let status = response.status();
        let bytes = response.into_body().collect().await?.to_bytes();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes)?
        };
        Ok((status, value))
    }

    async fn create_employee(&self, email: &str, department: &str) -> Result<String> {
        let (status, body) = self
            .json("POST", "/api/employees", Some(employee(email, department)))
            .await?;
        assert_eq!(status, StatusCode::CREATED, "{body}");
        Ok(body["id"].as_str().unwrap_or_default().to_string())
    }
}

fn employee(email: &str, department: &str) -> Value {
    json!({
        "first_name": "Grace",
        "last_name": "Hopper",
        "email": email,
        "gender": "Female",
        "age": 45,
        "department": department,
        "position": "Senior",
        "salary": 98000,
        "hire_date": "2018-04-01",
        "performance_score": 4.5
    })
}

#[tokio::test]
async fn health_is_open() -> Result<()> {
    let app = test_app(0)?;
    let response = app
        .app
        .clone()
        .oneshot(Request::builder().uri("/health").body(Body::empty())?)
        .await?;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers().contains_key("x-request-id"));
    let body: Value = serde_json::from_slice(&response.into_body().collect().await?.to_bytes())?;
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["database"], "connected");
    Ok(())
}

#[tokio::test]
async fn api_requires_a_bearer_token() -> Result<()> {
    let app = test_app(0)?;
    let response = app
        .app
        .clone()
        .oneshot(Request::builder().uri("/api/employees").body(Body::empty())?)
        .await?;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = app
        .app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/api/employees")
                .header(header::AUTHORIZATION, "Bearer not-a-token")
                .body(Body::empty())?,
        )
        .await?;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    Ok(())
}

#[tokio::test]
async fn employee_crud_and_conflicts() -> Result<()> {
    let app = test_app(0)?;
    let id = app.create_employee("grace@example.com", "Engineering").await?;

    let (status, body) = app
        .json(
            "POST",
            "/api/employees",
            Some(employee("grace@example.com", "Sales")),
        )
        .await?;
    assert_eq!(status, StatusCode::CONFLICT);
    assert!(body["error"].as_str().is_some());

    let (status, body) = app
        .json(
            "PATCH",
            &format!("/api/employees/{id}"),
            Some(json!({ "salary": 101000 })),
        )
        .await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["salary"], 101000);
    assert_eq!(body["department"], "Engineering");

    let (status, body) = app.json("GET", "/api/employees?search=ENGIN", None).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["count"], 1);

    let (status, _) = app
        .json("DELETE", &format!("/api/employees/{id}"), None)
        .await?;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (status, _) = app.json("GET", &format!("/api/employees/{id}"), None).await?;
    assert_eq!(status, StatusCode::NOT_FOUND);
    Ok(())
}

#[tokio::test]
async fn invalid_employee_lists_field_errors() -> Result<()> {
    let app = test_app(0)?;
    let mut payload = employee("kid@example.com", "Engineering");
    payload["age"] = json!(7);
    payload["performance_score"] = json!(5.5);

    let (status, body) = app.json("POST", "/api/employees", Some(payload)).await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let fields: Vec<&str> = body["fields"]
        .as_array()
        .map(|fields| fields.iter().filter_map(|f| f["field"].as_str()).collect())
        .unwrap_or_default();
    assert!(fields.contains(&"age"));
    assert!(fields.contains(&"performance_score"));

    let (status, _) = app
        .json("POST", "/api/employees", Some(json!({ "first_name": "x" })))
        .await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    Ok(())
}

#[tokio::test]
async fn attendance_rules() -> Result<()> {
    let app = test_app(0)?;
    let id = app.create_employee("ops@example.com", "Operations").await?;
    let day = json!({
        "employee": id,
        "date": "2024-05-06",
        "status": "Absent",
        "hours_worked": 8.0
    });

    let (status, body) = app.json("POST", "/api/attendance", Some(day.clone())).await?;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    assert_eq!(body["hours_worked"].as_f64(), Some(0.0));

    let (status, _) = app.json("POST", "/api/attendance", Some(day)).await?;
    assert_eq!(status, StatusCode::CONFLICT);

    let orphan = json!({
        "employee": uuid::Uuid::new_v4(),
        "date": "2024-05-06",
        "status": "Present",
        "hours_worked": 8.0
    });
    let (status, _) = app.json("POST", "/api/attendance", Some(orphan)).await?;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    let (status, body) = app
        .json("GET", &format!("/api/attendance?employee={id}"), None)
        .await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["count"], 1);
    Ok(())
}

#[tokio::test]
async fn review_overall_is_recomputed() -> Result<()> {
    let app = test_app(0)?;
    let employee_id = app.create_employee("dev@example.com", "Engineering").await?;
    let reviewer_id = app.create_employee("lead@example.com", "Engineering").await?;

    let review = json!({
        "employee": employee_id,
        "reviewer": reviewer_id,
        "review_date": "2024-03-01",
        "communication_score": 4.0,
        "teamwork_score": 3.5,
        "technical_score": 4.5,
        "leadership_score": 3.0,
        "overall_score": 1.0
    });
    let (status, body) = app
        .json("POST", "/api/performance-reviews", Some(review))
        .await?;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    assert_eq!(body["overall_score"].as_f64(), Some(3.8));
    let review_id = body["id"].as_str().unwrap_or_default().to_string();

    let (status, body) = app
        .json(
            "PATCH",
            &format!("/api/performance-reviews/{review_id}"),
            Some(json!({ "leadership_score": 5.0 })),
        )
        .await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["overall_score"].as_f64(), Some(4.3));

    let self_review = json!({
        "employee": employee_id,
        "reviewer": employee_id,
        "review_date": "2024-09-01",
        "communication_score": 4.0,
        "teamwork_score": 4.0,
        "technical_score": 4.0,
        "leadership_score": 4.0
    });
    let (status, _) = app
        .json("POST", "/api/performance-reviews", Some(self_review))
        .await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    Ok(())
}

#[tokio::test]
async fn paging_is_validated() -> Result<()> {
    let app = test_app(0)?;
    for n in 0..3 {
        app.create_employee(&format!("p{n}@example.com"), "Finance")
            .await?;
    }
    let (status, body) = app
        .json("GET", "/api/employees?page=2&page_size=2", None)
        .await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["count"], 3);
    assert_eq!(body["results"].as_array().map(Vec::len), Some(1));

    let (status, _) = app.json("GET", "/api/employees?page_size=0", None).await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    Ok(())
}

#[tokio::test]
async fn analytics_endpoints_answer() -> Result<()> {
    let app = test_app(0)?;
    app.create_employee("a@example.com", "Sales").await?;

    let (status, body) = app.json("GET", "/api/analytics/departments", None).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body[0]["department"], "Sales");
    assert_eq!(body[0]["employeeCount"], 1);

    for path in [
        "/api/analytics/salary-distribution",
        "/api/analytics/age-distribution",
        "/api/analytics/tenure-distribution",
    ] {
        let (status, body) = app.json("GET", path, None).await?;
        assert_eq!(status, StatusCode::OK, "{path}");
        let total: i64 = body
            .as_array()
            .map(|rows| rows.iter().filter_map(|row| row["count"].as_i64()).sum())
            .unwrap_or_default();
        assert_eq!(total, 1, "{path}");
    }

    let (status, body) = app
        .json("GET", "/api/analytics/gender-distribution", None)
        .await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!([{ "gender": "Female", "count": 1 }]));
    Ok(())
}

#[tokio::test]
async fn export_streams_csv() -> Result<()> {
    let app = test_app(0)?;
    for n in 0..3 {
        app.create_employee(&format!("csv{n}@example.com"), "Legal")
            .await?;
    }
    let response = app.send("GET", "/api/export/employees", None).await?;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()[header::CONTENT_TYPE],
        "text/csv; charset=utf-8"
    );
    assert_eq!(
        response.headers()[header::CONTENT_DISPOSITION],
        "attachment; filename=\"employees.csv\""
    );
    let bytes = response.into_body().collect().await?.to_bytes();
    let text = String::from_utf8(bytes.to_vec())?;
    let lines: Vec<&str> = text.split_terminator("\r\n").collect();
    assert_eq!(lines.len(), 4);
    assert!(lines[0].starts_with("ID,First Name,Last Name,Email"));
    Ok(())
}

#[tokio::test]
async fn subjects_are_rate_limited() -> Result<()> {
    let app = test_app(2)?;
    for _ in 0..2 {
        let (status, _) = app.json("GET", "/api/employees", None).await?;
        assert_eq!(status, StatusCode::OK);
    }
    let response = app.send("GET", "/api/employees", None).await?;
    assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
    assert!(response.headers().contains_key(header::RETRY_AFTER));

    let health = app
        .app
        .clone()
        .oneshot(Request::builder().uri("/health").body(Body::empty())?)
        .await?;
    assert_eq!(health.status(), StatusCode::OK);
    Ok(())
}
