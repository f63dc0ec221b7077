//! Round-trips against a live database. Skipped unless `TEST_DATABASE_URL`
//! (or `DATABASE_URL`) points at a disposable Postgres instance.

use std::time::Duration;

use anyhow::Result;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use uuid::Uuid;

use staffmetrics_core::{
    EmployeeChanges, NewAttendance, NewEmployee, NewPerformanceReview, ReviewScores, tenths,
};
use staffmetrics_store::{
    AttendanceFilter, EmployeeFilter, EmployeeRange, PageRequest, PostgresStore, RecordStore,
    StoreError, connect, migrate,
};

async fn store() -> Result<Option<PostgresStore>> {
    let Ok(url) = std::env::var("TEST_DATABASE_URL").or_else(|_| std::env::var("DATABASE_URL"))
    else {
        eprintln!("TEST_DATABASE_URL/DATABASE_URL not set; skipping");
        return Ok(None);
    };
    let pool = connect(&url, 2, Duration::from_secs(5)).await?;
    migrate(&pool).await?;
    let store = PostgresStore::new(pool);
    store.delete_all_employees().await?;
    Ok(Some(store))
}

fn employee(email: &str, salary: i32) -> NewEmployee {
    NewEmployee {
        first_name: "Ada".to_string(),
        last_name: "Lovelace".to_string(),
        email: email.to_string(),
        gender: "Female".to_string(),
        age: 36,
        department: "Engineering".to_string(),
        position: "Senior".to_string(),
        salary,
        hire_date: NaiveDate::from_ymd_opt(2020, 3, 1).expect("date"),
        performance_score: tenths(42),
    }
}

// One test so runs against the shared database do not interleave.
#[tokio::test]
async fn postgres_store_round_trip() -> Result<()> {
    let Some(store) = store().await? else {
        return Ok(());
    };
    store.ping().await?;

    let rows = store
        .insert_employees(&[
            employee("ada@company.com", 80_000),
            employee("grace@company.com", 120_000),
        ])
        .await?;
    assert_eq!(rows.len(), 2);

    let err = store
        .insert_employees(&[employee("ada@company.com", 1)])
        .await
        .expect_err("duplicate email");
    assert!(err.is_unique_violation());
    assert_eq!(store.count_employees().await?, 2);

    let salary = store
        .count_employees_in(EmployeeRange::Salary {
            min: 100_000,
            max: 150_000,
        })
        .await?;
    assert_eq!(salary, 1);

    let updated = store
        .update_employee(
            rows[0].id,
            EmployeeChanges {
                salary: Some(90_000),
                ..Default::default()
            },
        )
        .await?;
    assert_eq!(updated.salary, 90_000);
    assert!(updated.updated_at >= rows[0].updated_at);

    let day = NaiveDate::from_ymd_opt(2024, 5, 6).expect("date");
    store
        .insert_attendance(&[NewAttendance::new(
            rows[0].id,
            day,
            "Absent",
            tenths(80),
            0,
            None,
        )])
        .await?;
    let page = store
        .list_attendance(
            &AttendanceFilter {
                employee_id: Some(rows[0].id),
                ..Default::default()
            },
            PageRequest::default(),
        )
        .await?;
    assert_eq!(page.count, 1);
    assert_eq!(page.results[0].hours_worked, Decimal::ZERO);

    let review = store
        .insert_reviews(&[NewPerformanceReview {
            employee_id: rows[1].id,
            reviewer_id: Some(rows[0].id),
            review_date: day,
            scores: ReviewScores::new(tenths(40), tenths(35), tenths(45), tenths(30)),
            comments: None,
        }])
        .await?;
    assert_eq!(review[0].scores.overall(), tenths(38));

    let stranger = Uuid::new_v4();
    let err = store
        .insert_reviews(&[NewPerformanceReview {
            employee_id: rows[0].id,
            reviewer_id: Some(stranger),
            review_date: day,
            scores: ReviewScores::new(tenths(40), tenths(40), tenths(40), tenths(40)),
            comments: None,
        }])
        .await
        .expect_err("unknown reviewer");
    match err {
        StoreError::ForeignKeyViolation { entity, key } => {
            assert_eq!(entity, "performance review");
            assert_eq!(key, stranger.to_string());
        }
        other => panic!("unexpected error: {other:?}"),
    }

    let err = store
        .insert_attendance(&[NewAttendance::new(
            stranger,
            day,
            "Present",
            tenths(80),
            0,
            None,
        )])
        .await
        .expect_err("unknown employee");
    assert!(
        matches!(&err, StoreError::ForeignKeyViolation { key, .. } if *key == stranger.to_string())
    );

    store.delete_employee(rows[0].id).await?;
    let review = store.get_review(review[0].id).await?;
    assert_eq!(review.reviewer_id, None);
    let remaining = store
        .list_attendance(&AttendanceFilter::default(), PageRequest::default())
        .await?;
    assert_eq!(remaining.count, 0);

    let err = store.get_employee(rows[0].id).await.expect_err("deleted");
    assert!(matches!(err, StoreError::NotFound { .. }));

    store
        .insert_employees(&[NewEmployee {
            department: "analytics".to_string(),
            gender: "female".to_string(),
            ..employee("linus@company.com", 70_000)
        }])
        .await?;
    let departments: Vec<String> = store
        .department_rollup()
        .await?
        .into_iter()
        .map(|row| row.department)
        .collect();
    assert_eq!(departments, ["Engineering", "analytics"]);
    let genders: Vec<String> = store
        .gender_counts()
        .await?
        .into_iter()
        .map(|row| row.gender)
        .collect();
    assert_eq!(genders, ["Female", "female"]);

    let listed = store
        .list_employees(
            &EmployeeFilter {
                search: Some("engin".to_string()),
                ..Default::default()
            },
            PageRequest::new(1, 10),
        )
        .await?;
    assert_eq!(listed.count, 1);

    store.delete_all_employees().await?;
    Ok(())
}
