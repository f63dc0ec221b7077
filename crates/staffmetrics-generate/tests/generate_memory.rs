use std::collections::HashSet;
use std::sync::Arc;

use anyhow::Result;
use chrono::NaiveDate;
use rust_decimal::Decimal;

use staffmetrics_core::{AttendanceStatus, round_tenths};
use staffmetrics_generate::corpus::email_for;
use staffmetrics_generate::{CollisionPolicy, GenerateOptions, GenerationEngine, GenerationError};
use staffmetrics_store::{
    AttendanceFilter, EmployeeFilter, MemoryStore, PageRequest, RecordStore, ReviewFilter,
};

fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 6, 15).expect("date")
}

fn options(employees: u32, attendance: u32, reviews: u32) -> GenerateOptions {
    GenerateOptions {
        employee_count: employees,
        attendance_per_employee: attendance,
        reviews_per_employee: reviews,
        seed: Some(42),
        batch_size: 7,
        today: Some(today()),
        ..GenerateOptions::default()
    }
}

fn everything() -> PageRequest {
    PageRequest::new(1, 100_000)
}

#[tokio::test]
async fn generates_requested_counts() -> Result<()> {
    let store = Arc::new(MemoryStore::new());
    let engine = GenerationEngine::new(store.clone(), options(20, 5, 2));
    let report = engine.run().await?;

    assert_eq!(report.employees.inserted, 20);
    assert_eq!(report.attendance.inserted, 100);
    assert_eq!(report.reviews.inserted, 40);
    assert_eq!(store.count_employees().await?, 20);
    let attendance = store
        .list_attendance(&AttendanceFilter::default(), everything())
        .await?;
    assert_eq!(attendance.count, 100);
    Ok(())
}

#[tokio::test]
async fn emails_are_unique_and_derived_from_names() -> Result<()> {
    let store = Arc::new(MemoryStore::new());
    GenerationEngine::new(store.clone(), options(300, 0, 0))
        .run()
        .await?;

    let employees = store
        .list_employees(&EmployeeFilter::default(), everything())
        .await?
        .results;
    let mut emails = HashSet::new();
    for employee in &employees {
        assert!(emails.insert(employee.email.clone()), "{}", employee.email);
        assert_eq!(
            employee.email,
            email_for(&employee.first_name, &employee.last_name)
        );
        assert_eq!(employee.email, employee.email.to_lowercase());
        assert!(employee.email.ends_with("@example.com"));
    }
    let plain = employees
        .iter()
        .find(|employee| {
            employee.first_name.chars().all(|ch| ch.is_ascii_alphabetic())
                && employee.last_name.chars().all(|ch| ch.is_ascii_alphabetic())
        })
        .expect("a plain ascii name");
    assert_eq!(
        plain.email,
        format!(
            "{}.{}@example.com",
            plain.first_name.to_lowercase(),
            plain.last_name.to_lowercase()
        )
    );
    Ok(())
}

#[tokio::test]
async fn reviews_respect_reviewer_and_overall_rules() -> Result<()> {
    let store = Arc::new(MemoryStore::new());
    GenerationEngine::new(store.clone(), options(15, 0, 3))
        .run()
        .await?;

    let reviews = store
        .list_reviews(&ReviewFilter::default(), everything())
        .await?
        .results;
    assert_eq!(reviews.len(), 45);
    for review in reviews {
        let reviewer = review.reviewer_id.expect("reviewer");
        assert_ne!(reviewer, review.employee_id);
        let scores = review.scores;
        let mean = (scores.communication()
            + scores.teamwork()
            + scores.technical()
            + scores.leadership())
            / Decimal::from(4);
        assert_eq!(scores.overall(), round_tenths(mean));
    }
    Ok(())
}

#[tokio::test]
async fn single_employee_reviews_have_no_reviewer() -> Result<()> {
    let store = Arc::new(MemoryStore::new());
    GenerationEngine::new(store.clone(), options(1, 0, 2))
        .run()
        .await?;
    let reviews = store
        .list_reviews(&ReviewFilter::default(), everything())
        .await?
        .results;
    assert_eq!(reviews.len(), 2);
    assert!(reviews.iter().all(|review| review.reviewer_id.is_none()));
    Ok(())
}

#[tokio::test]
async fn absent_attendance_has_zero_hours() -> Result<()> {
    let store = Arc::new(MemoryStore::new());
    GenerationEngine::new(store.clone(), options(10, 30, 0))
        .run()
        .await?;
    let absent = store
        .list_attendance(
            &AttendanceFilter {
                status: Some(AttendanceStatus::Absent.as_str().to_string()),
                ..Default::default()
            },
            everything(),
        )
        .await?;
    assert!(absent.count > 0);
    assert!(absent
        .results
        .iter()
        .all(|record| record.hours_worked == Decimal::ZERO));
    Ok(())
}

#[tokio::test]
async fn same_seed_same_records() -> Result<()> {
    let first = Arc::new(MemoryStore::new());
    let second = Arc::new(MemoryStore::new());
    GenerationEngine::new(first.clone(), options(12, 0, 0)).run().await?;
    GenerationEngine::new(second.clone(), options(12, 0, 0)).run().await?;

    let fields = |employees: Vec<staffmetrics_core::Employee>| {
        employees
            .into_iter()
            .map(|employee| employee.fields())
            .collect::<Vec<_>>()
    };
    let a = first.list_employees(&EmployeeFilter::default(), everything()).await?;
    let b = second.list_employees(&EmployeeFilter::default(), everything()).await?;
    assert_eq!(fields(a.results), fields(b.results));
    Ok(())
}

#[tokio::test]
async fn clean_replaces_existing_data() -> Result<()> {
    let store = Arc::new(MemoryStore::new());
    GenerationEngine::new(store.clone(), options(5, 2, 1)).run().await?;

    let mut again = options(3, 2, 1);
    again.clean = true;
    again.seed = Some(7);
    let report = GenerationEngine::new(store.clone(), again).run().await?;
    assert_eq!(report.deleted, 5);
    assert_eq!(store.count_employees().await?, 3);
    let attendance = store
        .list_attendance(&AttendanceFilter::default(), everything())
        .await?;
    assert_eq!(attendance.count, 6);
    Ok(())
}

#[tokio::test]
async fn without_clean_existing_employees_get_records_too() -> Result<()> {
    let store = Arc::new(MemoryStore::new());
    GenerationEngine::new(store.clone(), options(4, 0, 0)).run().await?;

    let mut more = options(2, 3, 0);
    more.seed = Some(9);
    let report = GenerationEngine::new(store.clone(), more).run().await?;
    assert_eq!(report.attendance.inserted, 18);
    Ok(())
}

#[tokio::test]
async fn abort_policy_fails_on_first_collision() -> Result<()> {
    let store = Arc::new(MemoryStore::new());
    // 61 distinct dates exist in the attendance window, so 62 records must
    // collide.
    let mut opts = options(1, 62, 0);
    opts.on_collision = CollisionPolicy::Abort;
    let err = GenerationEngine::new(store, opts)
        .run()
        .await
        .expect_err("collision");
    assert!(matches!(
        err,
        GenerationError::Duplicate {
            entity: "attendance",
            ..
        }
    ));
    Ok(())
}

#[tokio::test]
async fn redraw_policy_gives_up_after_bounded_attempts() -> Result<()> {
    let store = Arc::new(MemoryStore::new());
    let mut opts = options(1, 62, 0);
    opts.max_attempts_per_record = 25;
    let err = GenerationEngine::new(store, opts)
        .run()
        .await
        .expect_err("window exhausted");
    match err {
        GenerationError::Duplicate { entity, key } => {
            assert_eq!(entity, "attendance");
            assert!(key.starts_with("employee "));
        }
        other => panic!("unexpected error: {other}"),
    }
    Ok(())
}

#[tokio::test]
async fn zero_batch_size_is_rejected() {
    let mut opts = options(1, 0, 0);
    opts.batch_size = 0;
    let err = GenerationEngine::new(Arc::new(MemoryStore::new()), opts)
        .run()
        .await
        .expect_err("invalid");
    assert!(matches!(err, GenerationError::InvalidOptions(_)));
}
