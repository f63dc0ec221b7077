//! Single-record draws. Every function takes the RNG explicitly so a seeded
//! run is reproducible.

use chrono::{Days, Months, NaiveDate};
use rand::Rng;
use uuid::Uuid;

use staffmetrics_core::{
    AttendanceStatus, Department, Gender, NewAttendance, NewEmployee, NewPerformanceReview,
    Position, ReviewScores, tenths,
};

use crate::corpus;

pub const AGE_RANGE: std::ops::RangeInclusive<i32> = 22..=65;
pub const SALARY_RANGE: std::ops::RangeInclusive<i32> = 30_000..=250_000;
/// Scores in tenths: 1.0 through 5.0.
pub const SCORE_TENTHS: std::ops::RangeInclusive<i64> = 10..=50;
/// Hours in tenths: 0.0 through 9.0.
pub const HOURS_TENTHS: std::ops::RangeInclusive<i64> = 0..=90;
pub const LATE_MINUTES_RANGE: std::ops::RangeInclusive<i32> = 0..=120;
pub const HIRE_WINDOW_YEARS: u32 = 10;
pub const ATTENDANCE_WINDOW_DAYS: u64 = 60;
pub const REVIEW_WINDOW_YEARS: u32 = 1;
pub const NOTES_PROBABILITY: f64 = 0.3;
pub const COMMENTS_PROBABILITY: f64 = 0.7;

fn pick<T: Copy, R: Rng + ?Sized>(values: &[T], rng: &mut R) -> T {
    values[rng.random_range(0..values.len())]
}

/// Uniform date in `[start, end]`.
fn date_between<R: Rng + ?Sized>(start: NaiveDate, end: NaiveDate, rng: &mut R) -> NaiveDate {
    let span = (end - start).num_days().max(0) as u64;
    start
        .checked_add_days(Days::new(rng.random_range(0..=span)))
        .unwrap_or(end)
}

fn years_before(today: NaiveDate, years: u32) -> NaiveDate {
    today
        .checked_sub_months(Months::new(years * 12))
        .unwrap_or(NaiveDate::MIN)
}

/// A fresh first and last name pair. The email is derived from it.
pub fn draw_name<R: Rng + ?Sized>(rng: &mut R) -> (String, String) {
    (corpus::first_name(rng), corpus::last_name(rng))
}

pub fn draw_employee<R: Rng + ?Sized>(rng: &mut R, today: NaiveDate) -> NewEmployee {
    let (first_name, last_name) = draw_name(rng);
    let email = corpus::email_for(&first_name, &last_name);
    let hire_start = years_before(today, HIRE_WINDOW_YEARS);
    NewEmployee {
        first_name,
        last_name,
        email,
        gender: pick(Gender::ALL, rng).as_str().to_string(),
        age: rng.random_range(AGE_RANGE),
        department: pick(Department::ALL, rng).as_str().to_string(),
        position: pick(Position::ALL, rng).as_str().to_string(),
        salary: rng.random_range(SALARY_RANGE),
        hire_date: date_between(hire_start, today, rng),
        performance_score: tenths(rng.random_range(SCORE_TENTHS)),
    }
}

/// Replace the name (and so the email) of a colliding employee draw.
pub fn redraw_name<R: Rng + ?Sized>(employee: &mut NewEmployee, rng: &mut R) {
    let (first_name, last_name) = draw_name(rng);
    employee.email = corpus::email_for(&first_name, &last_name);
    employee.first_name = first_name;
    employee.last_name = last_name;
}

pub fn draw_attendance_date<R: Rng + ?Sized>(rng: &mut R, today: NaiveDate) -> NaiveDate {
    let start = today
        .checked_sub_days(Days::new(ATTENDANCE_WINDOW_DAYS))
        .unwrap_or(NaiveDate::MIN);
    date_between(start, today, rng)
}

/// Attendance for `employee_id` on `date`. The status is drawn once and the
/// hours follow from that same status.
pub fn draw_attendance<R: Rng + ?Sized>(
    rng: &mut R,
    employee_id: Uuid,
    date: NaiveDate,
) -> NewAttendance {
    let status = pick(AttendanceStatus::ALL, rng);
    let hours = tenths(rng.random_range(HOURS_TENTHS));
    let late_minutes = if rng.random_bool(0.5) {
        rng.random_range(LATE_MINUTES_RANGE)
    } else {
        0
    };
    let notes = rng
        .random_bool(NOTES_PROBABILITY)
        .then(|| corpus::sentence(rng));
    NewAttendance::new(employee_id, date, status.as_str(), hours, late_minutes, notes)
}

pub fn draw_review_date<R: Rng + ?Sized>(rng: &mut R, today: NaiveDate) -> NaiveDate {
    date_between(years_before(today, REVIEW_WINDOW_YEARS), today, rng)
}

/// Reviewer for the employee at `index` in `ids`.
///
/// Drawn uniformly; a draw that lands on the subject falls back to the
/// previous employee, wrapping at the start. A single employee has no valid
/// reviewer.
pub fn pick_reviewer<R: Rng + ?Sized>(rng: &mut R, ids: &[Uuid], index: usize) -> Option<Uuid> {
    if ids.len() < 2 {
        return None;
    }
    let drawn = rng.random_range(0..ids.len());
    if drawn != index {
        return Some(ids[drawn]);
    }
    let previous = if index == 0 { ids.len() - 1 } else { index - 1 };
    Some(ids[previous])
}

pub fn draw_review<R: Rng + ?Sized>(
    rng: &mut R,
    employee_id: Uuid,
    reviewer_id: Option<Uuid>,
    review_date: NaiveDate,
) -> NewPerformanceReview {
    let scores = ReviewScores::new(
        tenths(rng.random_range(SCORE_TENTHS)),
        tenths(rng.random_range(SCORE_TENTHS)),
        tenths(rng.random_range(SCORE_TENTHS)),
        tenths(rng.random_range(SCORE_TENTHS)),
    );
    let comments = rng
        .random_bool(COMMENTS_PROBABILITY)
        .then(|| corpus::paragraph(rng));
    NewPerformanceReview {
        employee_id,
        reviewer_id,
        review_date,
        scores,
        comments,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;
    use rust_decimal::Decimal;
    use staffmetrics_core::{Validate, round_tenths};

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 15).expect("date")
    }

    #[test]
    fn employees_fall_inside_the_drawing_ranges() {
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        for _ in 0..200 {
            let employee = draw_employee(&mut rng, today());
            assert!(AGE_RANGE.contains(&employee.age));
            assert!(SALARY_RANGE.contains(&employee.salary));
            assert!(employee.hire_date <= today());
            assert!(employee.hire_date >= NaiveDate::from_ymd_opt(2014, 6, 15).expect("date"));
            assert!(employee.performance_score >= tenths(10));
            assert!(employee.performance_score <= tenths(50));
            assert!(employee.validate().is_ok(), "{employee:?}");
        }
    }

    #[test]
    fn absent_days_have_zero_hours() {
        let mut rng = ChaCha8Rng::seed_from_u64(2);
        let mut absences = 0;
        for _ in 0..500 {
            let record = draw_attendance(&mut rng, Uuid::new_v4(), today());
            if AttendanceStatus::is_absent(record.status()) {
                absences += 1;
                assert_eq!(record.hours_worked(), Decimal::ZERO);
            }
            assert!(record.hours_worked() <= tenths(90));
        }
        assert!(absences > 0);
    }

    #[test]
    fn attendance_dates_stay_in_window() {
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let earliest = NaiveDate::from_ymd_opt(2024, 4, 16).expect("date");
        for _ in 0..500 {
            let date = draw_attendance_date(&mut rng, today());
            assert!(date >= earliest && date <= today());
        }
    }

    #[test]
    fn reviewer_is_never_the_subject() {
        let mut rng = ChaCha8Rng::seed_from_u64(4);
        let ids: Vec<Uuid> = (0..3).map(|_| Uuid::new_v4()).collect();
        for _ in 0..300 {
            for index in 0..ids.len() {
                let reviewer = pick_reviewer(&mut rng, &ids, index).expect("reviewer");
                assert_ne!(reviewer, ids[index]);
            }
        }
    }

    #[test]
    fn single_employee_has_no_reviewer() {
        let mut rng = ChaCha8Rng::seed_from_u64(5);
        let ids = vec![Uuid::new_v4()];
        assert_eq!(pick_reviewer(&mut rng, &ids, 0), None);
    }

    #[test]
    fn review_overall_is_rounded_mean() {
        let mut rng = ChaCha8Rng::seed_from_u64(6);
        for _ in 0..200 {
            let review = draw_review(&mut rng, Uuid::new_v4(), None, today());
            let scores = review.scores;
            let mean = (scores.communication()
                + scores.teamwork()
                + scores.technical()
                + scores.leadership())
                / Decimal::from(4);
            assert_eq!(scores.overall(), round_tenths(mean));
        }
    }

    #[test]
    fn leap_day_windows_clamp() {
        let leap = NaiveDate::from_ymd_opt(2024, 2, 29).expect("date");
        assert_eq!(
            years_before(leap, 1),
            NaiveDate::from_ymd_opt(2023, 2, 28).expect("date")
        );
    }
}
