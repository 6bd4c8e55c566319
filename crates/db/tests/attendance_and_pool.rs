//! Integration tests for attendance, availability and the candidate pool query.

use chrono::{DateTime, TimeZone, Utc};
use sqlx::PgPool;
use shiftguard_core::geo::GeoPoint;
use shiftguard_core::status::ShiftStatus;
use shiftguard_db::models::attendance::{CheckInResult, CheckOutResult, NewAttendance};
use shiftguard_db::models::guard::CreateGuard;
use shiftguard_db::models::shift::{CreateShift, Shift};
use shiftguard_db::repositories::{AttendanceRepo, AvailabilityRepo, GuardRepo, ShiftRepo};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn at(day: u32, h: u32, m: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, day, h, m, 0).unwrap()
}

async fn guard(pool: &PgPool, name: &str) -> i64 {
    GuardRepo::create(
        pool,
        &CreateGuard {
            full_name: name.to_string(),
            role: None,
        },
    )
    .await
    .unwrap()
    .id
}

async fn shift(pool: &PgPool, guard_id: i64, day: u32, start: u32, end: u32) -> Shift {
    ShiftRepo::create(
        pool,
        &CreateShift {
            guard_id,
            start_time: at(day, start, 0),
            end_time: at(day, end, 0),
            client_site: "North Tower Lobby".to_string(),
            site_latitude: None,
            site_longitude: None,
        },
        at(1, 0, 0),
    )
    .await
    .unwrap()
}

fn arrival(guard_id: i64, shift_id: i64, when: DateTime<Utc>) -> NewAttendance {
    NewAttendance {
        guard_id,
        shift_id,
        check_in_time: when,
        location: Some(GeoPoint::new(14.5547, 121.0244)),
        minutes_late: 0,
    }
}

// ---------------------------------------------------------------------------
// Test: check-in / check-out
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
#[ignore = "requires a PostgreSQL database (DATABASE_URL)"]
async fn test_check_in_and_out_complete_shift(pool: PgPool) {
    let g = guard(&pool, "Alpha").await;
    let s = shift(&pool, g, 2, 8, 16).await;

    let result = AttendanceRepo::check_in(
        &pool,
        &arrival(g, s.id, at(2, 7, 55)),
        ShiftStatus::Scheduled,
        ShiftStatus::InProgress,
    )
    .await
    .unwrap();
    let CheckInResult::Recorded(record) = result else {
        panic!("expected check-in, got {result:?}");
    };
    assert!(record.is_open());
    assert_eq!(record.latitude, Some(14.5547));

    let reloaded = ShiftRepo::find_by_id(&pool, s.id).await.unwrap().unwrap();
    assert!(reloaded.has_status(ShiftStatus::InProgress));

    let out = AttendanceRepo::check_out(&pool, record.id, at(2, 16, 0), true)
        .await
        .unwrap();
    let CheckOutResult::Recorded {
        record,
        shift_completed,
    } = out
    else {
        panic!("expected check-out, got {out:?}");
    };
    assert!(shift_completed);
    assert_eq!(record.check_out_time, Some(at(2, 16, 0)));

    let again = AttendanceRepo::check_out(&pool, record.id, at(2, 16, 5), true)
        .await
        .unwrap();
    assert_eq!(again, CheckOutResult::AlreadyClosed);
}

#[sqlx::test(migrations = "../../db/migrations")]
#[ignore = "requires a PostgreSQL database (DATABASE_URL)"]
async fn test_second_open_record_rejected(pool: PgPool) {
    let g = guard(&pool, "Alpha").await;
    let first = shift(&pool, g, 2, 8, 12).await;
    let second = shift(&pool, g, 2, 12, 16).await;

    AttendanceRepo::check_in(
        &pool,
        &arrival(g, first.id, at(2, 8, 0)),
        ShiftStatus::Scheduled,
        ShiftStatus::InProgress,
    )
    .await
    .unwrap();
    let duplicate = AttendanceRepo::check_in(
        &pool,
        &arrival(g, second.id, at(2, 12, 0)),
        ShiftStatus::Scheduled,
        ShiftStatus::InProgress,
    )
    .await
    .unwrap();
    assert_eq!(duplicate, CheckInResult::DuplicateOpen);

    // The rolled-back transaction left the second shift untouched.
    let second = ShiftRepo::find_by_id(&pool, second.id).await.unwrap().unwrap();
    assert!(second.has_status(ShiftStatus::Scheduled));
}

#[sqlx::test(migrations = "../../db/migrations")]
#[ignore = "requires a PostgreSQL database (DATABASE_URL)"]
async fn test_check_in_on_changed_shift_writes_nothing(pool: PgPool) {
    let g = guard(&pool, "Alpha").await;
    let s = shift(&pool, g, 2, 8, 16).await;

    let result = AttendanceRepo::check_in(
        &pool,
        &arrival(g, s.id, at(2, 8, 0)),
        ShiftStatus::InProgress,
        ShiftStatus::InProgress,
    )
    .await
    .unwrap();
    assert_eq!(result, CheckInResult::ShiftChanged);
    assert!(AttendanceRepo::list_for_shift(&pool, s.id).await.unwrap().is_empty());
}

// ---------------------------------------------------------------------------
// Test: availability
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
#[ignore = "requires a PostgreSQL database (DATABASE_URL)"]
async fn test_availability_last_write_wins(pool: PgPool) {
    let g = guard(&pool, "Alpha").await;
    let day = at(3, 0, 0).date_naive();

    AvailabilityRepo::upsert(&pool, g, day, false, Some("sick"), at(2, 9, 0))
        .await
        .unwrap();
    let entry = AvailabilityRepo::upsert(&pool, g, day, true, None, at(2, 10, 0))
        .await
        .unwrap();
    assert!(entry.available);
    assert_eq!(entry.reason, None);

    let listed = AvailabilityRepo::list_for_guard(&pool, g, day).await.unwrap();
    assert_eq!(listed.len(), 1);
}

// ---------------------------------------------------------------------------
// Test: candidate pool projection
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
#[ignore = "requires a PostgreSQL database (DATABASE_URL)"]
async fn test_candidate_pool_snapshot(pool: PgPool) {
    let absent = guard(&pool, "Absent").await;
    let busy = guard(&pool, "Busy").await;
    let veteran = guard(&pool, "Veteran").await;
    let vacant = shift(&pool, absent, 5, 8, 16).await;

    // Busy holds an overlapping shift.
    shift(&pool, busy, 5, 12, 20).await;

    // Veteran worked one past shift, checked in with a location.
    let past = shift(&pool, veteran, 2, 8, 16).await;
    AttendanceRepo::check_in(
        &pool,
        &arrival(veteran, past.id, at(2, 8, 0)),
        ShiftStatus::Scheduled,
        ShiftStatus::InProgress,
    )
    .await
    .unwrap();
    AvailabilityRepo::upsert(&pool, veteran, at(5, 0, 0).date_naive(), true, None, at(2, 9, 0))
        .await
        .unwrap();

    let rows = GuardRepo::candidate_pool(
        &pool,
        vacant.id,
        vacant.start_time,
        vacant.end_time,
        vacant.start_time.date_naive(),
        at(5, 8, 16),
        &[absent],
    )
    .await
    .unwrap();

    assert_eq!(rows.len(), 2);
    let busy_row = rows.iter().find(|r| r.guard_id == busy).unwrap();
    assert!(busy_row.has_overlapping_shift);
    assert_eq!(busy_row.declared_available, None);

    let vet = rows.iter().find(|r| r.guard_id == veteran).unwrap();
    assert!(!vet.has_overlapping_shift);
    assert_eq!(vet.declared_available, Some(true));
    assert_eq!(vet.total_shifts, 1);
    assert_eq!(vet.attended_shifts, 1);
    assert_eq!(vet.last_latitude, Some(14.5547));
}
