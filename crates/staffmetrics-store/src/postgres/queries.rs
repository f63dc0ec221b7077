use chrono::NaiveDate;
use sqlx::postgres::PgExecutor;
use sqlx::{Postgres, QueryBuilder};
use uuid::Uuid;

use staffmetrics_core::{Attendance, Employee, NewAttendance, NewEmployee, PerformanceReview};

use super::mapper::{
    AttendanceRow, DepartmentRow, EmployeeRow, GenderRow, ReviewRow, like_pattern,
};
use crate::query::{AttendanceFilter, EmployeeFilter, EmployeeRange, PageRequest, ReviewFilter};

pub const EMPLOYEE_COLUMNS: &str = "id, first_name, last_name, email, gender, age, department, \
     position, salary, hire_date, performance_score, created_at, updated_at";

pub const ATTENDANCE_COLUMNS: &str =
    "id, employee_id, date, status, hours_worked, late_minutes, notes, created_at";

pub const REVIEW_COLUMNS: &str = "id, employee_id, reviewer_id, review_date, \
     communication_score, teamwork_score, technical_score, leadership_score, comments, created_at";

// ---- employees -----------------------------------------------------------

pub async fn insert_employee<'e>(
    exec: impl PgExecutor<'e>,
    new: &NewEmployee,
) -> Result<EmployeeRow, sqlx::Error> {
    let sql = format!(
        r#"
        insert into employees
          (id, first_name, last_name, email, gender, age, department, position,
           salary, hire_date, performance_score)
        values ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
        returning {EMPLOYEE_COLUMNS}
        "#
    );
    sqlx::query_as::<_, EmployeeRow>(&sql)
        .bind(Uuid::new_v4())
        .bind(&new.first_name)
        .bind(&new.last_name)
        .bind(&new.email)
        .bind(&new.gender)
        .bind(new.age)
        .bind(&new.department)
        .bind(&new.position)
        .bind(new.salary)
        .bind(new.hire_date)
        .bind(new.performance_score)
        .fetch_one(exec)
        .await
}

pub async fn find_employee<'e>(
    exec: impl PgExecutor<'e>,
    id: Uuid,
    for_update: bool,
) -> Result<Option<EmployeeRow>, sqlx::Error> {
    let lock = if for_update { " for update" } else { "" };
    let sql = format!("select {EMPLOYEE_COLUMNS} from employees where id = $1{lock}");
    sqlx::query_as::<_, EmployeeRow>(&sql)
        .bind(id)
        .fetch_optional(exec)
        .await
}

pub async fn write_employee<'e>(
    exec: impl PgExecutor<'e>,
    employee: &Employee,
) -> Result<EmployeeRow, sqlx::Error> {
    let sql = format!(
        r#"
        update employees set
          first_name = $2, last_name = $3, email = $4, gender = $5, age = $6,
          department = $7, position = $8, salary = $9, hire_date = $10,
          performance_score = $11, updated_at = clock_timestamp()
        where id = $1
        returning {EMPLOYEE_COLUMNS}
        "#
    );
    sqlx::query_as::<_, EmployeeRow>(&sql)
        .bind(employee.id)
        .bind(&employee.first_name)
        .bind(&employee.last_name)
        .bind(&employee.email)
        .bind(&employee.gender)
        .bind(employee.age)
        .bind(&employee.department)
        .bind(&employee.position)
        .bind(employee.salary)
        .bind(employee.hire_date)
        .bind(employee.performance_score)
        .fetch_one(exec)
        .await
}

fn push_employee_filter(builder: &mut QueryBuilder<'_, Postgres>, filter: &EmployeeFilter) {
    builder.push(" where true");
    if let Some(department) = &filter.department {
        builder.push(" and department = ").push_bind(department.clone());
    }
    if let Some(position) = &filter.position {
        builder.push(" and position = ").push_bind(position.clone());
    }
    if let Some(gender) = &filter.gender {
        builder.push(" and gender = ").push_bind(gender.clone());
    }
    if let Some(term) = filter.search.as_deref().map(str::trim).filter(|t| !t.is_empty()) {
        let pattern = like_pattern(term);
        builder
            .push(" and (first_name ilike ")
            .push_bind(pattern.clone())
            .push(" or last_name ilike ")
            .push_bind(pattern.clone())
            .push(" or department ilike ")
            .push_bind(pattern.clone())
            .push(" or position ilike ")
            .push_bind(pattern)
            .push(")");
    }
}

pub async fn count_employees_matching<'e>(
    exec: impl PgExecutor<'e>,
    filter: &EmployeeFilter,
) -> Result<i64, sqlx::Error> {
    let mut builder = QueryBuilder::new("select count(*) from employees");
    push_employee_filter(&mut builder, filter);
    builder.build_query_scalar::<i64>().fetch_one(exec).await
}

pub async fn list_employees<'e>(
    exec: impl PgExecutor<'e>,
    filter: &EmployeeFilter,
    page: PageRequest,
) -> Result<Vec<EmployeeRow>, sqlx::Error> {
    let mut builder = QueryBuilder::new(format!("select {EMPLOYEE_COLUMNS} from employees"));
    push_employee_filter(&mut builder, filter);
    builder
        .push(" order by created_at desc, id desc limit ")
        .push_bind(i64::from(page.page_size))
        .push(" offset ")
        .push_bind(page.offset() as i64);
    builder.build_query_as::<EmployeeRow>().fetch_all(exec).await
}

pub async fn employees_after<'e>(
    exec: impl PgExecutor<'e>,
    after: Option<Uuid>,
    limit: u32,
) -> Result<Vec<EmployeeRow>, sqlx::Error> {
    let sql = format!(
        "select {EMPLOYEE_COLUMNS} from employees \
         where ($1::uuid is null or id > $1) order by id limit $2"
    );
    sqlx::query_as::<_, EmployeeRow>(&sql)
        .bind(after)
        .bind(i64::from(limit))
        .fetch_all(exec)
        .await
}

pub async fn employee_ids<'e>(exec: impl PgExecutor<'e>) -> Result<Vec<Uuid>, sqlx::Error> {
    sqlx::query_scalar::<_, Uuid>("select id from employees order by created_at, id")
        .fetch_all(exec)
        .await
}

pub async fn taken_emails<'e>(
    exec: impl PgExecutor<'e>,
    candidates: &[String],
) -> Result<Vec<String>, sqlx::Error> {
    sqlx::query_scalar::<_, String>("select email from employees where email = any($1)")
        .bind(candidates)
        .fetch_all(exec)
        .await
}

// ---- attendance ----------------------------------------------------------

pub async fn insert_attendance<'e>(
    exec: impl PgExecutor<'e>,
    new: &NewAttendance,
) -> Result<AttendanceRow, sqlx::Error> {
    let sql = format!(
        r#"
        insert into attendance
          (id, employee_id, date, status, hours_worked, late_minutes, notes)
        values ($1, $2, $3, $4, $5, $6, $7)
        returning {ATTENDANCE_COLUMNS}
        "#
    );
    sqlx::query_as::<_, AttendanceRow>(&sql)
        .bind(Uuid::new_v4())
        .bind(new.employee_id())
        .bind(new.date())
        .bind(new.status())
        .bind(new.hours_worked())
        .bind(new.late_minutes())
        .bind(new.notes())
        .fetch_one(exec)
        .await
}

pub async fn find_attendance<'e>(
    exec: impl PgExecutor<'e>,
    id: Uuid,
    for_update: bool,
) -> Result<Option<AttendanceRow>, sqlx::Error> {
    let lock = if for_update { " for update" } else { "" };
    let sql = format!("select {ATTENDANCE_COLUMNS} from attendance where id = $1{lock}");
    sqlx::query_as::<_, AttendanceRow>(&sql)
        .bind(id)
        .fetch_optional(exec)
        .await
}

pub async fn write_attendance<'e>(
    exec: impl PgExecutor<'e>,
    record: &Attendance,
) -> Result<AttendanceRow, sqlx::Error> {
    let sql = format!(
        r#"
        update attendance set
          employee_id = $2, date = $3, status = $4, hours_worked = $5,
          late_minutes = $6, notes = $7
        where id = $1
        returning {ATTENDANCE_COLUMNS}
        "#
    );
    sqlx::query_as::<_, AttendanceRow>(&sql)
        .bind(record.id)
        .bind(record.employee_id)
        .bind(record.date)
        .bind(&record.status)
        .bind(record.hours_worked)
        .bind(record.late_minutes)
        .bind(&record.notes)
        .fetch_one(exec)
        .await
}

fn push_attendance_filter(builder: &mut QueryBuilder<'_, Postgres>, filter: &AttendanceFilter) {
    builder.push(" where true");
    if let Some(employee_id) = filter.employee_id {
        builder.push(" and employee_id = ").push_bind(employee_id);
    }
    if let Some(date) = filter.date {
        builder.push(" and date = ").push_bind(date);
    }
    if let Some(status) = &filter.status {
        builder.push(" and status = ").push_bind(status.clone());
    }
}

pub async fn count_attendance_matching<'e>(
    exec: impl PgExecutor<'e>,
    filter: &AttendanceFilter,
) -> Result<i64, sqlx::Error> {
    let mut builder = QueryBuilder::new("select count(*) from attendance");
    push_attendance_filter(&mut builder, filter);
    builder.build_query_scalar::<i64>().fetch_one(exec).await
}

pub async fn list_attendance<'e>(
    exec: impl PgExecutor<'e>,
    filter: &AttendanceFilter,
    page: PageRequest,
) -> Result<Vec<AttendanceRow>, sqlx::Error> {
    let mut builder = QueryBuilder::new(format!("select {ATTENDANCE_COLUMNS} from attendance"));
    push_attendance_filter(&mut builder, filter);
    builder
        .push(" order by date, employee_id limit ")
        .push_bind(i64::from(page.page_size))
        .push(" offset ")
        .push_bind(page.offset() as i64);
    builder.build_query_as::<AttendanceRow>().fetch_all(exec).await
}

pub async fn attendance_dates<'e>(
    exec: impl PgExecutor<'e>,
    employee_id: Uuid,
) -> Result<Vec<NaiveDate>, sqlx::Error> {
    sqlx::query_scalar::<_, NaiveDate>("select date from attendance where employee_id = $1")
        .bind(employee_id)
        .fetch_all(exec)
        .await
}

// ---- performance reviews -------------------------------------------------

pub async fn insert_review<'e>(
    exec: impl PgExecutor<'e>,
    review: &PerformanceReview,
) -> Result<ReviewRow, sqlx::Error> {
    let sql = format!(
        r#"
        insert into performance_reviews
          (id, employee_id, reviewer_id, review_date, communication_score,
           teamwork_score, technical_score, leadership_score, overall_score, comments)
        values ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
        returning {REVIEW_COLUMNS}
        "#
    );
    bind_review(sqlx::query_as::<_, ReviewRow>(&sql), review)
        .fetch_one(exec)
        .await
}

pub async fn find_review<'e>(
    exec: impl PgExecutor<'e>,
    id: Uuid,
    for_update: bool,
) -> Result<Option<ReviewRow>, sqlx::Error> {
    let lock = if for_update { " for update" } else { "" };
    let sql = format!("select {REVIEW_COLUMNS} from performance_reviews where id = $1{lock}");
    sqlx::query_as::<_, ReviewRow>(&sql)
        .bind(id)
        .fetch_optional(exec)
        .await
}

pub async fn write_review<'e>(
    exec: impl PgExecutor<'e>,
    review: &PerformanceReview,
) -> Result<ReviewRow, sqlx::Error> {
    let sql = format!(
        r#"
        update performance_reviews set
          employee_id = $2, reviewer_id = $3, review_date = $4,
          communication_score = $5, teamwork_score = $6, technical_score = $7,
          leadership_score = $8, overall_score = $9, comments = $10
        where id = $1
        returning {REVIEW_COLUMNS}
        "#
    );
    bind_review(sqlx::query_as::<_, ReviewRow>(&sql), review)
        .fetch_one(exec)
        .await
}

type ReviewQuery<'q> =
    sqlx::query::QueryAs<'q, Postgres, ReviewRow, sqlx::postgres::PgArguments>;

fn bind_review<'q>(query: ReviewQuery<'q>, review: &'q PerformanceReview) -> ReviewQuery<'q> {
    query
        .bind(review.id)
        .bind(review.employee_id)
        .bind(review.reviewer_id)
        .bind(review.review_date)
        .bind(review.scores.communication())
        .bind(review.scores.teamwork())
        .bind(review.scores.technical())
        .bind(review.scores.leadership())
        .bind(review.scores.overall())
        .bind(&review.comments)
}

fn push_review_filter(builder: &mut QueryBuilder<'_, Postgres>, filter: &ReviewFilter) {
    builder.push(" where true");
    if let Some(employee_id) = filter.employee_id {
        builder.push(" and employee_id = ").push_bind(employee_id);
    }
    if let Some(review_date) = filter.review_date {
        builder.push(" and review_date = ").push_bind(review_date);
    }
}

pub async fn count_reviews_matching<'e>(
    exec: impl PgExecutor<'e>,
    filter: &ReviewFilter,
) -> Result<i64, sqlx::Error> {
    let mut builder = QueryBuilder::new("select count(*) from performance_reviews");
    push_review_filter(&mut builder, filter);
    builder.build_query_scalar::<i64>().fetch_one(exec).await
}

pub async fn list_reviews<'e>(
    exec: impl PgExecutor<'e>,
    filter: &ReviewFilter,
    page: PageRequest,
) -> Result<Vec<ReviewRow>, sqlx::Error> {
    let mut builder =
        QueryBuilder::new(format!("select {REVIEW_COLUMNS} from performance_reviews"));
    push_review_filter(&mut builder, filter);
    builder
        .push(" order by review_date, employee_id limit ")
        .push_bind(i64::from(page.page_size))
        .push(" offset ")
        .push_bind(page.offset() as i64);
    builder.build_query_as::<ReviewRow>().fetch_all(exec).await
}

pub async fn review_dates<'e>(
    exec: impl PgExecutor<'e>,
    employee_id: Uuid,
) -> Result<Vec<NaiveDate>, sqlx::Error> {
    sqlx::query_scalar::<_, NaiveDate>(
        "select review_date from performance_reviews where employee_id = $1",
    )
    .bind(employee_id)
    .fetch_all(exec)
    .await
}

// ---- aggregates ----------------------------------------------------------

pub async fn count_employees<'e>(exec: impl PgExecutor<'e>) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar::<_, i64>("select count(*) from employees")
        .fetch_one(exec)
        .await
}

pub async fn count_employees_in<'e>(
    exec: impl PgExecutor<'e>,
    range: EmployeeRange,
) -> Result<i64, sqlx::Error> {
    match range {
        EmployeeRange::Salary { min, max } => {
            sqlx::query_scalar::<_, i64>(
                "select count(*) from employees where salary >= $1 and salary <= $2",
            )
            .bind(min)
            .bind(max)
            .fetch_one(exec)
            .await
        }
        EmployeeRange::Age { min, max } => {
            sqlx::query_scalar::<_, i64>(
                "select count(*) from employees where age >= $1 and age <= $2",
            )
            .bind(min)
            .bind(max)
            .fetch_one(exec)
            .await
        }
        EmployeeRange::HiredBetween {
            on_or_after,
            before,
        } => {
            sqlx::query_scalar::<_, i64>(
                "select count(*) from employees where hire_date >= $1 and hire_date < $2",
            )
            .bind(on_or_after)
            .bind(before)
            .fetch_one(exec)
            .await
        }
    }
}

pub async fn department_rollup<'e>(
    exec: impl PgExecutor<'e>,
) -> Result<Vec<DepartmentRow>, sqlx::Error> {
    sqlx::query_as::<_, DepartmentRow>(
        r#"
        select
          department,
          count(*) as employee_count,
          avg(salary) as average_salary,
          avg(performance_score) as average_performance
        from employees
        group by department
        order by department collate "C"
        "#,
    )
    .fetch_all(exec)
    .await
}

pub async fn gender_counts<'e>(exec: impl PgExecutor<'e>) -> Result<Vec<GenderRow>, sqlx::Error> {
    sqlx::query_as::<_, GenderRow>(
        r#"select gender, count(*) as count from employees group by gender order by gender collate "C""#,
    )
    .fetch_all(exec)
    .await
}
