//! Event Store - SQLite-backed analytics event table
//!
//! Holds the single `analytics_events` table and renders every query
//! operation as SQL over it:
//!
//! ```text
//! EventPredicate ──► WHERE clause + binds ──┬─► aggregate  (SUM/AVG/COUNT DISTINCT)
//!                                           ├─► chart      (GROUP BY bucket)
//!                                           ├─► page       (ORDER BY timestamp DESC)
//!                                           └─► count
//! ```
//!
//! Timestamps are stored as epoch milliseconds (indexed), revenue as integer
//! cents. The connection lives behind a `std::sync::Mutex` because
//! `rusqlite::Connection` is not `Sync`.

use crate::storage::types::{
    millis_to_datetime, Aggregate, AnalyticsEvent, BucketInterval, ChartBucket, EventPredicate,
    NewEvent,
};
use crate::storage::{StorageError, StorageResult};
use rusqlite::{params, params_from_iter, Connection, OpenFlags, Row, ToSql};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

/// Revenue sums use `TOTAL()`, which cannot overflow, and are exact below 2^53 cents.
fn cents_total(total: f64) -> f64 {
    total / 100.0
}

const EVENT_COLUMNS: &str = "id, timestamp, revenue_cents, users, sessions, bounce_rate, \
                             conversion, region, category, source";

/// Rendered WHERE clause with its positional bind values
struct WhereClause {
    sql: String,
    binds: Vec<Box<dyn ToSql>>,
}

impl WhereClause {
    fn from_predicate(predicate: &EventPredicate) -> Self {
        let mut clauses: Vec<&str> = Vec::new();
        let mut binds: Vec<Box<dyn ToSql>> = Vec::new();

        if let Some(start) = predicate.start {
            clauses.push("timestamp >= ?");
            binds.push(Box::new(start));
        }
        if let Some(end) = predicate.end {
            clauses.push("timestamp <= ?");
            binds.push(Box::new(end));
        }
        if let Some(region) = &predicate.region {
            clauses.push("region = ?");
            binds.push(Box::new(region.clone()));
        }
        if let Some(category) = &predicate.category {
            clauses.push("category = ?");
            binds.push(Box::new(category.clone()));
        }
        if let Some(source) = &predicate.source {
            clauses.push("source = ?");
            binds.push(Box::new(source.clone()));
        }

        let sql = if clauses.is_empty() {
            String::new()
        } else {
            format!(" WHERE {}", clauses.join(" AND "))
        };

        Self { sql, binds }
    }

    fn params(&self) -> Vec<&dyn ToSql> {
        self.binds.iter().map(|b| b.as_ref()).collect()
    }
}

/// SQL expression mapping `timestamp` to its bucket key
fn bucket_expr(interval: BucketInterval) -> String {
    match interval.width_millis() {
        // Euclidean remainder so pre-epoch instants truncate downwards
        Some(width) => format!("(timestamp - (((timestamp % {w}) + {w}) % {w}))", w = width),
        None => "timestamp".to_string(),
    }
}

fn row_to_event(row: &Row<'_>) -> rusqlite::Result<AnalyticsEvent> {
    let timestamp: i64 = row.get(1)?;
    Ok(AnalyticsEvent {
        id: row.get(0)?,
        timestamp: millis_to_datetime(timestamp),
        revenue_cents: row.get(2)?,
        users: row.get(3)?,
        sessions: row.get(4)?,
        bounce_rate: row.get(5)?,
        conversion: row.get(6)?,
        region: row.get(7)?,
        category: row.get(8)?,
        source: row.get(9)?,
    })
}

/// SQLite-backed store for analytics events
pub struct EventStore {
    conn: Mutex<Connection>,
    path: Option<PathBuf>,
}

impl EventStore {
    /// Create or open a store at the given database file
    pub fn open(path: impl AsRef<Path>) -> StorageResult<Self> {
        let path = path.as_ref().to_path_buf();

        // Create parent directory if needed
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let conn = Connection::open_with_flags(
            &path,
            OpenFlags::SQLITE_OPEN_READ_WRITE
                | OpenFlags::SQLITE_OPEN_CREATE
                | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )?;

        // Configure for performance
        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA cache_size = 10000;
            PRAGMA temp_store = MEMORY;
            ",
        )?;

        Self::init_schema(&conn)?;
        tracing::debug!(path = ?path, "Opened event store");

        Ok(Self {
            conn: Mutex::new(conn),
            path: Some(path),
        })
    }

    /// Create a private in-memory store (tests, benchmarks)
    pub fn open_in_memory() -> StorageResult<Self> {
        let conn = Connection::open_in_memory()?;
        Self::init_schema(&conn)?;

        Ok(Self {
            conn: Mutex::new(conn),
            path: None,
        })
    }

    fn init_schema(conn: &Connection) -> StorageResult<()> {
        conn.execute(
            "CREATE TABLE IF NOT EXISTS analytics_events (
                id            TEXT PRIMARY KEY,
                timestamp     INTEGER NOT NULL,
                revenue_cents INTEGER NOT NULL,
                users         INTEGER NOT NULL,
                sessions      INTEGER NOT NULL,
                bounce_rate   REAL NOT NULL,
                conversion    REAL NOT NULL,
                region        TEXT NOT NULL,
                category      TEXT NOT NULL,
                source        TEXT NOT NULL
            )",
            [],
        )?;

        // Range filtering and ordering both go through timestamp
        conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_events_timestamp ON analytics_events(timestamp)",
            [],
        )?;

        super::users::init_schema(conn)
    }

    pub(super) fn lock(&self) -> StorageResult<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| StorageError::Lock(e.to_string()))
    }

    /// Database file path, `None` for in-memory stores
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Cheap round trip used by readiness checks
    pub fn ping(&self) -> StorageResult<()> {
        let conn = self.lock()?;
        conn.query_row("SELECT 1", [], |row| row.get::<_, i64>(0))?;
        Ok(())
    }

    /// Total number of stored events
    pub fn len(&self) -> StorageResult<u64> {
        self.count(&EventPredicate::default())
    }

    /// Check if the store holds no events
    pub fn is_empty(&self) -> StorageResult<bool> {
        Ok(self.len()? == 0)
    }

    // ==================== Write Path ====================

    /// Insert a batch of events in one transaction
    ///
    /// Assigns a fresh UUID to each event. Either every event is stored or none.
    pub fn insert_batch(&self, events: Vec<NewEvent>) -> StorageResult<Vec<AnalyticsEvent>> {
        if events.is_empty() {
            return Ok(Vec::new());
        }

        let stored: Vec<AnalyticsEvent> = events
            .into_iter()
            .map(|e| e.into_event(uuid::Uuid::new_v4().to_string()))
            .collect();

        let mut conn = self.lock()?;
        let tx = conn.transaction()?;
        {
            let mut stmt = tx.prepare_cached(&format!(
                "INSERT INTO analytics_events ({}) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
                EVENT_COLUMNS
            ))?;

            for event in &stored {
                stmt.execute(params![
                    event.id,
                    event.timestamp_millis(),
                    event.revenue_cents,
                    event.users,
                    event.sessions,
                    event.bounce_rate,
                    event.conversion,
                    event.region,
                    event.category,
                    event.source,
                ])?;
            }
        }
        tx.commit()?;

        tracing::debug!(inserted = stored.len(), "Inserted event batch");
        Ok(stored)
    }

    // ==================== Query Methods ====================

    /// Sums, averages and distinct counts over matching events
    ///
    /// An empty match set yields an all-zero aggregate.
    pub fn aggregate(&self, predicate: &EventPredicate) -> StorageResult<Aggregate> {
        let clause = WhereClause::from_predicate(predicate);
        let sql = format!(
            "SELECT TOTAL(revenue_cents),
                    COALESCE(SUM(users), 0),
                    COALESCE(SUM(sessions), 0),
                    COALESCE(AVG(bounce_rate), 0.0),
                    COALESCE(AVG(conversion), 0.0),
                    COUNT(DISTINCT region),
                    COUNT(DISTINCT category),
                    COUNT(DISTINCT source)
             FROM analytics_events{}",
            clause.sql
        );

        let conn = self.lock()?;
        let mut stmt = conn.prepare_cached(&sql)?;
        let aggregate = stmt.query_row(params_from_iter(clause.params()), |row| {
            Ok(Aggregate {
                total_revenue: cents_total(row.get(0)?),
                total_users: row.get::<_, i64>(1)? as u64,
                total_sessions: row.get::<_, i64>(2)? as u64,
                avg_bounce_rate: row.get(3)?,
                avg_conversion: row.get(4)?,
                unique_regions: row.get::<_, i64>(5)? as u64,
                unique_categories: row.get::<_, i64>(6)? as u64,
                unique_sources: row.get::<_, i64>(7)? as u64,
            })
        })?;

        Ok(aggregate)
    }

    /// Per-bucket aggregates, ascending by bucket start
    pub fn chart(
        &self,
        predicate: &EventPredicate,
        interval: BucketInterval,
    ) -> StorageResult<Vec<ChartBucket>> {
        let clause = WhereClause::from_predicate(predicate);
        let sql = format!(
            "SELECT {} AS bucket,
                    TOTAL(revenue_cents),
                    SUM(users),
                    SUM(sessions),
                    AVG(bounce_rate),
                    AVG(conversion)
             FROM analytics_events{}
             GROUP BY bucket
             ORDER BY bucket ASC",
            bucket_expr(interval),
            clause.sql
        );

        let conn = self.lock()?;
        let mut stmt = conn.prepare_cached(&sql)?;
        let rows = stmt.query_map(params_from_iter(clause.params()), |row| {
            let bucket_start = millis_to_datetime(row.get(0)?);
            Ok(ChartBucket {
                date: ChartBucket::date_label(bucket_start),
                bucket_start,
                revenue: cents_total(row.get(1)?),
                users: row.get::<_, i64>(2)? as u64,
                sessions: row.get::<_, i64>(3)? as u64,
                bounce_rate: row.get(4)?,
                conversion: row.get(5)?,
            })
        })?;

        rows.collect::<rusqlite::Result<Vec<_>>>()
            .map_err(StorageError::from)
    }

    /// Number of events matching a predicate
    pub fn count(&self, predicate: &EventPredicate) -> StorageResult<u64> {
        let conn = self.lock()?;
        Self::count_locked(&conn, predicate)
    }

    fn count_locked(conn: &Connection, predicate: &EventPredicate) -> StorageResult<u64> {
        let clause = WhereClause::from_predicate(predicate);
        let sql = format!("SELECT COUNT(*) FROM analytics_events{}", clause.sql);

        let mut stmt = conn.prepare_cached(&sql)?;
        let count: i64 = stmt.query_row(params_from_iter(clause.params()), |row| row.get(0))?;
        Ok(count as u64)
    }

    /// One page of matching events, newest first, plus the full match count
    ///
    /// Both reads happen under a single lock acquisition so the page and the
    /// total describe the same snapshot.
    pub fn page(
        &self,
        predicate: &EventPredicate,
        offset: u64,
        limit: u32,
    ) -> StorageResult<(Vec<AnalyticsEvent>, u64)> {
        let conn = self.lock()?;
        let total = Self::count_locked(&conn, predicate)?;

        let clause = WhereClause::from_predicate(predicate);
        let sql = format!(
            "SELECT {} FROM analytics_events{} ORDER BY timestamp DESC, id DESC LIMIT ? OFFSET ?",
            EVENT_COLUMNS, clause.sql
        );

        let limit = i64::from(limit);
        let offset = i64::try_from(offset).unwrap_or(i64::MAX);
        let mut params = clause.params();
        params.push(&limit);
        params.push(&offset);

        let mut stmt = conn.prepare_cached(&sql)?;
        let rows = stmt.query_map(params_from_iter(params), row_to_event)?;
        let records = rows.collect::<rusqlite::Result<Vec<_>>>()?;

        Ok((records, total))
    }

    /// Look up a single event by id
    pub fn get(&self, id: &str) -> StorageResult<Option<AnalyticsEvent>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare_cached(&format!(
            "SELECT {} FROM analytics_events WHERE id = ?",
            EVENT_COLUMNS
        ))?;

        match stmt.query_row(params![id], row_to_event) {
            Ok(event) => Ok(Some(event)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::types::day_start;
    use chrono::{DateTime, Duration, Utc};
    use tempfile::tempdir;

    fn at(day: u32, hour: i64) -> DateTime<Utc> {
        day_start(2024, 3, day).unwrap() + Duration::hours(hour)
    }

    fn fixture() -> EventStore {
        let store = EventStore::open_in_memory().unwrap();
        store
            .insert_batch(vec![
                NewEvent::new(at(1, 9), "Europe", "Books", "Email")
                    .revenue(100.25)
                    .traffic(10, 20)
                    .rates(40.0, 2.0),
                NewEvent::new(at(1, 15), "Asia", "Books", "Direct")
                    .revenue(50.50)
                    .traffic(5, 8)
                    .rates(60.0, 4.0),
                NewEvent::new(at(2, 0), "Europe", "Toys", "Email")
                    .revenue(10.00)
                    .traffic(1, 1)
                    .rates(20.0, 1.0),
                NewEvent::new(at(3, 23), "Africa", "Sports", "Referral")
                    .revenue(0.75)
                    .traffic(2, 3)
                    .rates(80.0, 3.0),
            ])
            .unwrap();
        store
    }

    #[test]
    fn test_insert_assigns_unique_ids() {
        let store = EventStore::open_in_memory().unwrap();
        let stored = store
            .insert_batch(vec![
                NewEvent::new(at(1, 0), "Asia", "Toys", "Direct"),
                NewEvent::new(at(1, 0), "Asia", "Toys", "Direct"),
            ])
            .unwrap();

        assert_eq!(stored.len(), 2);
        assert_ne!(stored[0].id, stored[1].id);
        assert!(uuid::Uuid::parse_str(&stored[0].id).is_ok());
        assert_eq!(store.len().unwrap(), 2);
    }

    #[test]
    fn test_insert_empty_batch() {
        let store = EventStore::open_in_memory().unwrap();
        assert!(store.insert_batch(Vec::new()).unwrap().is_empty());
        assert!(store.is_empty().unwrap());
    }

    #[test]
    fn test_aggregate_all() {
        let store = fixture();
        let agg = store.aggregate(&EventPredicate::default()).unwrap();

        assert_eq!(agg.total_revenue, 161.5);
        assert_eq!(agg.total_users, 18);
        assert_eq!(agg.total_sessions, 32);
        assert_eq!(agg.avg_bounce_rate, 50.0);
        assert_eq!(agg.avg_conversion, 2.5);
        assert_eq!(agg.unique_regions, 3);
        assert_eq!(agg.unique_categories, 3);
        assert_eq!(agg.unique_sources, 3);
    }

    #[test]
    fn test_aggregate_filtered() {
        let store = fixture();
        let predicate = EventPredicate::new().region("Europe").source("Email");
        let agg = store.aggregate(&predicate).unwrap();

        assert_eq!(agg.total_revenue, 110.25);
        assert_eq!(agg.total_users, 11);
        assert_eq!(agg.unique_regions, 1);
        assert_eq!(agg.unique_categories, 2);
    }

    #[test]
    fn test_aggregate_empty_is_zeroed() {
        let store = fixture();
        let agg = store
            .aggregate(&EventPredicate::new().region("Antarctica"))
            .unwrap();
        assert_eq!(agg, Aggregate::default());

        let empty = EventStore::open_in_memory().unwrap();
        assert_eq!(
            empty.aggregate(&EventPredicate::default()).unwrap(),
            Aggregate::default()
        );
    }

    #[test]
    fn test_date_range_is_inclusive() {
        let store = fixture();
        let predicate = EventPredicate::new()
            .start(at(1, 15).timestamp_millis())
            .end(at(2, 0).timestamp_millis());

        let (records, total) = store.page(&predicate, 0, 100).unwrap();
        assert_eq!(total, 2);
        assert!(records.iter().all(|r| predicate.matches(r)));
    }

    #[test]
    fn test_chart_day_buckets() {
        let store = fixture();
        let buckets = store
            .chart(&EventPredicate::default(), BucketInterval::Day)
            .unwrap();

        let dates: Vec<&str> = buckets.iter().map(|b| b.date.as_str()).collect();
        assert_eq!(dates, vec!["2024-03-01", "2024-03-02", "2024-03-03"]);

        let first = &buckets[0];
        assert_eq!(first.bucket_start, at(1, 0));
        assert_eq!(first.revenue, 150.75);
        assert_eq!(first.users, 15);
        assert_eq!(first.sessions, 28);
        assert_eq!(first.bounce_rate, 50.0);
        assert_eq!(first.conversion, 3.0);
    }

    #[test]
    fn test_chart_timestamp_buckets() {
        let store = fixture();
        let buckets = store
            .chart(&EventPredicate::default(), BucketInterval::Timestamp)
            .unwrap();

        assert_eq!(buckets.len(), 4);
        assert_eq!(buckets[0].date, "2024-03-01");
        assert_eq!(buckets[1].date, "2024-03-01");
        assert!(buckets.windows(2).all(|w| w[0].bucket_start < w[1].bucket_start));
    }

    #[test]
    fn test_chart_reconciles_with_aggregate() {
        let store = fixture();
        let predicate = EventPredicate::new().category("Books");

        for interval in [
            BucketInterval::Timestamp,
            BucketInterval::Hour,
            BucketInterval::Day,
        ] {
            let buckets = store.chart(&predicate, interval).unwrap();
            let chart_total: f64 = buckets.iter().map(|b| b.revenue).sum();
            let agg = store.aggregate(&predicate).unwrap();
            assert!((chart_total - agg.total_revenue).abs() < 1e-9);
        }
    }

    #[test]
    fn test_revenue_sums_do_not_overflow() {
        let store = EventStore::open_in_memory().unwrap();
        let mut big = NewEvent::new(at(1, 0), "Asia", "Toys", "Direct");
        big.revenue_cents = i64::MAX / 2 + 1;
        store.insert_batch(vec![big.clone(), big]).unwrap();

        let agg = store.aggregate(&EventPredicate::default()).unwrap();
        assert!(agg.total_revenue > 9.2e16);

        let buckets = store
            .chart(&EventPredicate::default(), BucketInterval::Day)
            .unwrap();
        assert_eq!(buckets.len(), 1);
        assert_eq!(buckets[0].revenue, agg.total_revenue);
    }

    #[test]
    fn test_page_newest_first() {
        let store = fixture();
        let (records, total) = store.page(&EventPredicate::default(), 0, 2).unwrap();

        assert_eq!(total, 4);
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].timestamp, at(3, 23));
        assert_eq!(records[1].timestamp, at(2, 0));

        let (rest, _) = store.page(&EventPredicate::default(), 2, 2).unwrap();
        assert_eq!(rest[0].timestamp, at(1, 15));
        assert_eq!(rest[1].timestamp, at(1, 9));
    }

    #[test]
    fn test_page_past_end() {
        let store = fixture();
        let (records, total) = store.page(&EventPredicate::default(), 40, 20).unwrap();
        assert!(records.is_empty());
        assert_eq!(total, 4);
    }

    #[test]
    fn test_get_by_id() {
        let store = fixture();
        let (records, _) = store.page(&EventPredicate::default(), 0, 1).unwrap();
        let found = store.get(&records[0].id).unwrap();
        assert_eq!(found.as_ref(), Some(&records[0]));

        let missing = store.get(&uuid::Uuid::new_v4().to_string()).unwrap();
        assert!(missing.is_none());
    }

    #[test]
    fn test_reopen_persists() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("events.db");

        {
            let store = EventStore::open(&path).unwrap();
            store
                .insert_batch(vec![NewEvent::new(at(5, 5), "Asia", "Toys", "Email")])
                .unwrap();
            assert_eq!(store.path(), Some(path.as_path()));
        }

        let store = EventStore::open(&path).unwrap();
        assert_eq!(store.len().unwrap(), 1);
        store.ping().unwrap();
    }
}
