use std::time::SystemTime;

use time::{Date, Month, OffsetDateTime};
use uuid::Uuid;

use crate::{
    dao::models::{UserBestEntity, UserTotalEntity},
    dto::{
        format_system_time,
        leaderboard::{LeaderboardEntry, TotalTimeEntry, TotalTimeQuery},
    },
    duration,
    error::ServiceError,
    state::{CurrentUser, SharedState},
};

const MIN_YEAR: i32 = 1970;
const MAX_YEAR: i32 = 9000;

/// Best-time leaderboard seen by `user`.
pub async fn best_times(
    state: &SharedState,
    user: &CurrentUser,
) -> Result<Vec<LeaderboardEntry>, ServiceError> {
    let store = state.require_store().await?;
    let bests = store.best_attempts().await?;
    Ok(rank_best_times(bests, user.id))
}

/// Cumulative-time leaderboard for the requested (or current) calendar year.
pub async fn total_times(
    state: &SharedState,
    user: &CurrentUser,
    query: TotalTimeQuery,
) -> Result<Vec<TotalTimeEntry>, ServiceError> {
    let year = query.year.unwrap_or_else(current_year);
    let (from, until) = year_bounds(year)?;
    let store = state.require_store().await?;
    let totals = store.total_durations(from, until).await?;
    Ok(rank_totals(totals, user.id))
}

/// Order by best duration, longest first. Ties keep their input order.
pub fn rank_best_times(mut bests: Vec<UserBestEntity>, current_user: Uuid) -> Vec<LeaderboardEntry> {
    bests.sort_by(|a, b| b.duration_seconds.cmp(&a.duration_seconds));
    bests
        .into_iter()
        .zip(1..)
        .map(|(best, rank)| LeaderboardEntry {
            rank,
            id: best.user_id,
            is_current_user: best.user_id == current_user,
            display_name: best.display_name,
            best_time: best.duration_seconds,
            best_time_display: duration::format(best.duration_seconds.into()),
            achieved_at: format_system_time(best.attempted_at),
        })
        .collect()
}

/// Order by total time, longest first, dropping users with nothing logged.
pub fn rank_totals(mut totals: Vec<UserTotalEntity>, current_user: Uuid) -> Vec<TotalTimeEntry> {
    totals.retain(|total| total.total_seconds > 0);
    totals.sort_by(|a, b| b.total_seconds.cmp(&a.total_seconds));
    totals
        .into_iter()
        .zip(1..)
        .map(|(total, rank)| TotalTimeEntry {
            rank,
            id: total.user_id,
            is_current_user: total.user_id == current_user,
            display_name: total.display_name,
            total_time: total.total_seconds,
            total_time_display: duration::format(total.total_seconds),
        })
        .collect()
}

/// Current calendar year in UTC.
pub fn current_year() -> i32 {
    OffsetDateTime::now_utc().year()
}

/// `[Jan 1 of year, Jan 1 of year + 1)` in UTC.
pub fn year_bounds(year: i32) -> Result<(SystemTime, SystemTime), ServiceError> {
    if !(MIN_YEAR..=MAX_YEAR).contains(&year) {
        return Err(ServiceError::InvalidInput("Invalid year".into()));
    }
    let start_of = |year: i32| {
        Date::from_calendar_date(year, Month::January, 1)
            .map(|date| SystemTime::from(date.midnight().assume_utc()))
            .map_err(|_| ServiceError::InvalidInput("Invalid year".into()))
    };
    Ok((start_of(year)?, start_of(year + 1)?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn best(name: &str, duration_seconds: u32) -> UserBestEntity {
        UserBestEntity {
            user_id: Uuid::new_v4(),
            display_name: name.into(),
            duration_seconds,
            attempted_at: SystemTime::UNIX_EPOCH,
        }
    }

    fn total(name: &str, total_seconds: u64) -> UserTotalEntity {
        UserTotalEntity {
            user_id: Uuid::new_v4(),
            display_name: name.into(),
            total_seconds,
        }
    }

    #[test]
    fn best_times_are_ranked_longest_first() {
        let bests = vec![best("Ann", 30), best("Bob", 90), best("Cid", 60)];
        let board = rank_best_times(bests, Uuid::nil());

        let names: Vec<_> = board.iter().map(|e| e.display_name.as_str()).collect();
        assert_eq!(names, ["Bob", "Cid", "Ann"]);
        let ranks: Vec<_> = board.iter().map(|e| e.rank).collect();
        assert_eq!(ranks, [1, 2, 3]);
        assert_eq!(board[0].best_time_display, "01:30");
    }

    #[test]
    fn ties_keep_input_order() {
        let bests = vec![best("Ann", 60), best("Bob", 60), best("Cid", 90), best("Dee", 60)];
        let board = rank_best_times(bests, Uuid::nil());
        let names: Vec<_> = board.iter().map(|e| e.display_name.as_str()).collect();
        assert_eq!(names, ["Cid", "Ann", "Bob", "Dee"]);
    }

    #[test]
    fn current_user_is_flagged() {
        let me = best("Ann", 10);
        let my_id = me.user_id;
        let board = rank_best_times(vec![best("Bob", 20), me], my_id);
        assert!(!board[0].is_current_user);
        assert!(board[1].is_current_user);
    }

    #[test]
    fn totals_skip_zero_and_rank_descending() {
        let totals = vec![total("Ann", 0), total("Bob", 4000), total("Cid", 120)];
        let board = rank_totals(totals, Uuid::nil());
        assert_eq!(board.len(), 2);
        assert_eq!(board[0].display_name, "Bob");
        assert_eq!(board[0].total_time_display, "1:06:40");
        assert_eq!(board[1].rank, 2);
    }

    #[test]
    fn year_bounds_cover_the_calendar_year() {
        let (from, until) = year_bounds(2026).unwrap();
        assert_eq!(
            from,
            SystemTime::UNIX_EPOCH + Duration::from_secs(1_767_225_600)
        );
        assert_eq!(
            until,
            SystemTime::UNIX_EPOCH + Duration::from_secs(1_798_761_600)
        );
    }

    #[test]
    fn absurd_years_are_rejected() {
        assert!(year_bounds(1969).is_err());
        assert!(year_bounds(100_000).is_err());
    }
}
