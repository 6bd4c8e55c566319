//! Repository for `replacement_requests` and `replacement_candidates`.
//!
//! Every lifecycle transition is a conditional update on
//! `status_id = pending`, so at most one of accept / decline-all / expire can
//! win for a given request. Acceptance and the shift hand-over commit in the
//! same transaction.

use sqlx::PgPool;
use shiftguard_core::status::{ReplacementStatus, ShiftStatus};
use shiftguard_core::types::{DbId, Timestamp};

use crate::is_unique_violation;
use crate::models::replacement::{
    AcceptResult, DeclineResult, NewReplacementRequest, ReplacementCandidate, ReplacementOffer,
    ReplacementRequest,
};
use crate::repositories::shift_repo::ShiftRepo;

/// Column list for `replacement_requests` queries.
const REQUEST_COLUMNS: &str = "\
    id, original_shift_id, original_guard_id, client_site, shift_time, status_id, \
    offer_round, accepted_guard_id, accepted_at, created_at, expires_at, resolved_at";

/// Column list for `replacement_candidates` queries.
const CANDIDATE_COLUMNS: &str = "\
    id, request_id, rank, guard_id, guard_name, score, notified, responded, declined, responded_at";

/// Partial unique index allowing one pending request per shift.
const PENDING_SHIFT_INDEX: &str = "uq_replacement_requests_pending_shift";

/// Provides the replacement offer lifecycle.
pub struct ReplacementRepo;

impl ReplacementRepo {
    // -----------------------------------------------------------------------
    // Creation
    // -----------------------------------------------------------------------

    /// Claim a `scheduled` shift as a no-show and open its first offer.
    ///
    /// The claim, the request insert and the candidate inserts share one
    /// transaction. Returns `None` (and writes nothing) when the shift was
    /// already claimed or is no longer `scheduled`.
    pub async fn create_for_no_show(
        pool: &PgPool,
        input: &NewReplacementRequest,
    ) -> Result<Option<ReplacementOffer>, sqlx::Error> {
        let mut tx = pool.begin().await?;

        if !ShiftRepo::claim_no_show_in_tx(&mut tx, input.original_shift_id).await? {
            return Ok(None);
        }

        let Some(offer) = Self::insert_offer_in_tx(&mut tx, input).await? else {
            return Ok(None);
        };

        tx.commit().await?;
        Ok(Some(offer))
    }

    /// Open a follow-up offer for a shift that is still `no_show`.
    ///
    /// Returns `None` when the shift has moved on or a pending request
    /// already exists for it.
    pub async fn create_follow_up(
        pool: &PgPool,
        input: &NewReplacementRequest,
    ) -> Result<Option<ReplacementOffer>, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let still_vacant: Option<DbId> =
            sqlx::query_scalar("SELECT id FROM shifts WHERE id = $1 AND status_id = $2 FOR UPDATE")
                .bind(input.original_shift_id)
                .bind(ShiftStatus::NoShow.id())
                .fetch_optional(&mut *tx)
                .await?;
        if still_vacant.is_none() {
            return Ok(None);
        }

        let Some(offer) = Self::insert_offer_in_tx(&mut tx, input).await? else {
            return Ok(None);
        };

        tx.commit().await?;
        Ok(Some(offer))
    }

    /// Insert a pending request and its ranked candidates.
    ///
    /// A unique violation on the pending-per-shift index yields `None`; the
    /// caller must then drop the (aborted) transaction.
    async fn insert_offer_in_tx(
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        input: &NewReplacementRequest,
    ) -> Result<Option<ReplacementOffer>, sqlx::Error> {
        let query = format!(
            "INSERT INTO replacement_requests \
                (original_shift_id, original_guard_id, client_site, shift_time, status_id, \
                 offer_round, created_at, expires_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8) \
             RETURNING {REQUEST_COLUMNS}"
        );
        let inserted = sqlx::query_as::<_, ReplacementRequest>(&query)
            .bind(input.original_shift_id)
            .bind(input.original_guard_id)
            .bind(&input.client_site)
            .bind(input.shift_time)
            .bind(ReplacementStatus::Pending.id())
            .bind(input.offer_round)
            .bind(input.created_at)
            .bind(input.expires_at)
            .fetch_one(&mut **tx)
            .await;

        let request = match inserted {
            Ok(request) => request,
            Err(err) if is_unique_violation(&err, PENDING_SHIFT_INDEX) => return Ok(None),
            Err(err) => return Err(err),
        };

        let insert_candidate = format!(
            "INSERT INTO replacement_candidates (request_id, rank, guard_id, guard_name, score) \
             VALUES ($1, $2, $3, $4, $5) \
             RETURNING {CANDIDATE_COLUMNS}"
        );
        let mut candidates = Vec::with_capacity(input.candidates.len());
        for (index, candidate) in input.candidates.iter().enumerate() {
            let row = sqlx::query_as::<_, ReplacementCandidate>(&insert_candidate)
                .bind(request.id)
                .bind(index as i32 + 1)
                .bind(candidate.guard_id)
                .bind(&candidate.guard_name)
                .bind(candidate.score)
                .fetch_one(&mut **tx)
                .await?;
            candidates.push(row);
        }

        Ok(Some(ReplacementOffer {
            request,
            candidates,
        }))
    }

    // -----------------------------------------------------------------------
    // Reads
    // -----------------------------------------------------------------------

    pub async fn find_by_id(
        pool: &PgPool,
        id: DbId,
    ) -> Result<Option<ReplacementRequest>, sqlx::Error> {
        let query = format!("SELECT {REQUEST_COLUMNS} FROM replacement_requests WHERE id = $1");
        sqlx::query_as::<_, ReplacementRequest>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Candidates of a request in rank order.
    pub async fn candidates_for(
        pool: &PgPool,
        request_id: DbId,
    ) -> Result<Vec<ReplacementCandidate>, sqlx::Error> {
        let query = format!(
            "SELECT {CANDIDATE_COLUMNS} FROM replacement_candidates \
             WHERE request_id = $1 ORDER BY rank"
        );
        sqlx::query_as::<_, ReplacementCandidate>(&query)
            .bind(request_id)
            .fetch_all(pool)
            .await
    }

    /// A request together with its candidate list.
    pub async fn find_offer(
        pool: &PgPool,
        id: DbId,
    ) -> Result<Option<ReplacementOffer>, sqlx::Error> {
        let Some(request) = Self::find_by_id(pool, id).await? else {
            return Ok(None);
        };
        let candidates = Self::candidates_for(pool, id).await?;
        Ok(Some(ReplacementOffer {
            request,
            candidates,
        }))
    }

    /// The most recent offer round for a shift, whatever its status.
    pub async fn find_latest_for_shift(
        pool: &PgPool,
        shift_id: DbId,
    ) -> Result<Option<ReplacementRequest>, sqlx::Error> {
        let query = format!(
            "SELECT {REQUEST_COLUMNS} FROM replacement_requests \
             WHERE original_shift_id = $1 \
             ORDER BY offer_round DESC, id DESC \
             LIMIT 1"
        );
        sqlx::query_as::<_, ReplacementRequest>(&query)
            .bind(shift_id)
            .fetch_optional(pool)
            .await
    }

    /// Requests, newest first, optionally filtered by status.
    pub async fn list(
        pool: &PgPool,
        status: Option<ReplacementStatus>,
        limit: i64,
    ) -> Result<Vec<ReplacementRequest>, sqlx::Error> {
        let query = format!(
            "SELECT {REQUEST_COLUMNS} FROM replacement_requests \
             WHERE ($1::SMALLINT IS NULL OR status_id = $1) \
             ORDER BY created_at DESC, id DESC \
             LIMIT $2"
        );
        sqlx::query_as::<_, ReplacementRequest>(&query)
            .bind(status.map(ReplacementStatus::id))
            .bind(limit)
            .fetch_all(pool)
            .await
    }

    /// Pending requests on which the guard is a candidate who has not declined.
    pub async fn list_open_offers_for_guard(
        pool: &PgPool,
        guard_id: DbId,
    ) -> Result<Vec<ReplacementRequest>, sqlx::Error> {
        let query = format!(
            "SELECT {REQUEST_COLUMNS} FROM replacement_requests r \
             WHERE r.status_id = $2 \
               AND EXISTS ( \
                   SELECT 1 FROM replacement_candidates c \
                   WHERE c.request_id = r.id AND c.guard_id = $1 AND c.declined = false \
               ) \
             ORDER BY r.expires_at, r.id"
        );
        sqlx::query_as::<_, ReplacementRequest>(&query)
            .bind(guard_id)
            .bind(ReplacementStatus::Pending.id())
            .fetch_all(pool)
            .await
    }

    /// Guards who declined any offer for the shift.
    pub async fn declined_guards_for_shift(
        pool: &PgPool,
        shift_id: DbId,
    ) -> Result<Vec<DbId>, sqlx::Error> {
        sqlx::query_scalar(
            "SELECT DISTINCT c.guard_id FROM replacement_candidates c \
             JOIN replacement_requests r ON r.id = c.request_id \
             WHERE r.original_shift_id = $1 AND c.declined = true \
             ORDER BY c.guard_id",
        )
        .bind(shift_id)
        .fetch_all(pool)
        .await
    }

    /// Latest round of every running `no_show` shift whose last request was
    /// fully declined below `max_rounds` and never followed up.
    pub async fn list_follow_up_due(
        pool: &PgPool,
        now: Timestamp,
        max_rounds: i32,
    ) -> Result<Vec<ReplacementRequest>, sqlx::Error> {
        let query = format!(
            "SELECT {REQUEST_COLUMNS} FROM ( \
                 SELECT DISTINCT ON (r.original_shift_id) r.* \
                 FROM replacement_requests r \
                 JOIN shifts s ON s.id = r.original_shift_id \
                 WHERE s.status_id = $1 AND s.end_time > $2 \
                 ORDER BY r.original_shift_id, r.offer_round DESC, r.id DESC \
             ) latest \
             WHERE latest.status_id = $3 AND latest.offer_round < $4 \
             ORDER BY latest.original_shift_id"
        );
        sqlx::query_as::<_, ReplacementRequest>(&query)
            .bind(ShiftStatus::NoShow.id())
            .bind(now)
            .bind(ReplacementStatus::Declined.id())
            .bind(max_rounds)
            .fetch_all(pool)
            .await
    }

    // -----------------------------------------------------------------------
    // Transitions
    // -----------------------------------------------------------------------

    /// Accept a pending request on behalf of `guard_id`.
    ///
    /// In one transaction: `pending -> accepted` guarded on the window and on
    /// the guard being an open candidate, mark the candidate responded, and
    /// hand the shift to the guard. If the shift is no longer `no_show` the
    /// whole transaction rolls back.
    pub async fn accept(
        pool: &PgPool,
        request_id: DbId,
        guard_id: DbId,
        now: Timestamp,
    ) -> Result<AcceptResult, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let query = format!(
            "UPDATE replacement_requests \
             SET status_id = $3, accepted_guard_id = $2, accepted_at = $4, resolved_at = $4 \
             WHERE id = $1 AND status_id = $5 AND expires_at >= $4 \
               AND EXISTS ( \
                   SELECT 1 FROM replacement_candidates c \
                   WHERE c.request_id = $1 AND c.guard_id = $2 AND c.declined = false \
               ) \
             RETURNING {REQUEST_COLUMNS}"
        );
        let accepted = sqlx::query_as::<_, ReplacementRequest>(&query)
            .bind(request_id)
            .bind(guard_id)
            .bind(ReplacementStatus::Accepted.id())
            .bind(now)
            .bind(ReplacementStatus::Pending.id())
            .fetch_optional(&mut *tx)
            .await?;

        let Some(request) = accepted else {
            return Ok(AcceptResult::NotApplied);
        };

        sqlx::query(
            "UPDATE replacement_candidates SET responded = true, responded_at = $3 \
             WHERE request_id = $1 AND guard_id = $2",
        )
        .bind(request_id)
        .bind(guard_id)
        .bind(now)
        .execute(&mut *tx)
        .await?;

        if !ShiftRepo::assign_replacement_in_tx(&mut tx, request.original_shift_id, guard_id).await? {
            return Ok(AcceptResult::ShiftNotReassignable);
        }

        tx.commit().await?;
        Ok(AcceptResult::Accepted(request))
    }

    /// Record `guard_id`'s decline on a pending request.
    ///
    /// The request row is locked first so concurrent declines serialize and
    /// exactly one of them observes "everyone has declined" and moves the
    /// request to `declined`.
    pub async fn decline(
        pool: &PgPool,
        request_id: DbId,
        guard_id: DbId,
        now: Timestamp,
    ) -> Result<DeclineResult, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let locked: Option<DbId> = sqlx::query_scalar(
            "SELECT id FROM replacement_requests \
             WHERE id = $1 AND status_id = $2 AND expires_at >= $3 \
             FOR UPDATE",
        )
        .bind(request_id)
        .bind(ReplacementStatus::Pending.id())
        .bind(now)
        .fetch_optional(&mut *tx)
        .await?;
        if locked.is_none() {
            return Ok(DeclineResult::NotApplied);
        }

        let marked = sqlx::query(
            "UPDATE replacement_candidates \
             SET declined = true, responded = true, responded_at = $3 \
             WHERE request_id = $1 AND guard_id = $2 AND declined = false",
        )
        .bind(request_id)
        .bind(guard_id)
        .bind(now)
        .execute(&mut *tx)
        .await?;
        if marked.rows_affected() == 0 {
            return Ok(DeclineResult::NotApplied);
        }

        let query = format!(
            "UPDATE replacement_requests SET status_id = $2, resolved_at = $3 \
             WHERE id = $1 AND status_id = $4 \
               AND NOT EXISTS ( \
                   SELECT 1 FROM replacement_candidates c \
                   WHERE c.request_id = $1 AND c.declined = false \
               ) \
             RETURNING {REQUEST_COLUMNS}"
        );
        let all_declined = sqlx::query_as::<_, ReplacementRequest>(&query)
            .bind(request_id)
            .bind(ReplacementStatus::Declined.id())
            .bind(now)
            .bind(ReplacementStatus::Pending.id())
            .fetch_optional(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(match all_declined {
            Some(request) => DeclineResult::AllDeclined(request),
            None => DeclineResult::Recorded,
        })
    }

    /// Expire every pending request whose window closed before `now`.
    ///
    /// Returns the requests this call transitioned. A request accepted
    /// concurrently is skipped by the status guard.
    pub async fn expire_stale(
        pool: &PgPool,
        now: Timestamp,
    ) -> Result<Vec<ReplacementRequest>, sqlx::Error> {
        let query = format!(
            "UPDATE replacement_requests SET status_id = $1, resolved_at = $3 \
             WHERE status_id = $2 AND expires_at < $3 \
             RETURNING {REQUEST_COLUMNS}"
        );
        sqlx::query_as::<_, ReplacementRequest>(&query)
            .bind(ReplacementStatus::Expired.id())
            .bind(ReplacementStatus::Pending.id())
            .bind(now)
            .fetch_all(pool)
            .await
    }

    /// Record that a notification dispatch was attempted for the candidate.
    pub async fn mark_notified(
        pool: &PgPool,
        request_id: DbId,
        guard_id: DbId,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            "UPDATE replacement_candidates SET notified = true \
             WHERE request_id = $1 AND guard_id = $2",
        )
        .bind(request_id)
        .bind(guard_id)
        .execute(pool)
        .await?;
        Ok(())
    }
}
