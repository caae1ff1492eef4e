//! Versioned schema migrations
//!
//! Applied in order on every open; `schema_migrations` records what has
//! already run, so reopening an existing database is a no-op.

use rusqlite::Connection;
use tracing::{info, instrument};

use crate::error::Result;

struct Migration {
    version: u32,
    description: &'static str,
    sql: &'static str,
}

const MIGRATIONS: &[Migration] = &[
    Migration {
        version: 1,
        description: "Initial booking schema",
        sql: r#"
            -- Availability slots published by mentors
            CREATE TABLE IF NOT EXISTS slots (
                id TEXT PRIMARY KEY,
                mentor_id TEXT NOT NULL,
                slot_date TEXT NOT NULL,
                start_time TEXT NOT NULL,
                end_time TEXT NOT NULL,
                max_participants INTEGER NOT NULL,
                description TEXT,
                status TEXT NOT NULL DEFAULT 'available',
                created_at TEXT NOT NULL
            );

            -- Student reservations against slots
            CREATE TABLE IF NOT EXISTS bookings (
                id TEXT PRIMARY KEY,
                slot_id TEXT NOT NULL,
                student_id TEXT NOT NULL,
                mentor_id TEXT NOT NULL,
                status TEXT NOT NULL DEFAULT 'confirmed',
                booked_at TEXT NOT NULL,
                cancelled_at TEXT,
                FOREIGN KEY (slot_id) REFERENCES slots(id) ON DELETE CASCADE
            );

            -- FIFO queue of students waiting on full slots
            CREATE TABLE IF NOT EXISTS waiting_list (
                id TEXT PRIMARY KEY,
                slot_id TEXT NOT NULL,
                student_id TEXT NOT NULL,
                joined_at TEXT NOT NULL,
                FOREIGN KEY (slot_id) REFERENCES slots(id) ON DELETE CASCADE,
                UNIQUE(slot_id, student_id)
            );
        "#,
    },
    Migration {
        version: 2,
        description: "Add indexes for query performance",
        sql: r#"
            -- Slot lookups by mentor and day (overlap checks, listings)
            CREATE INDEX IF NOT EXISTS idx_slots_mentor_date
                ON slots(mentor_id, slot_date);
            CREATE INDEX IF NOT EXISTS idx_slots_status ON slots(status);

            -- Booking counts and student listings
            CREATE INDEX IF NOT EXISTS idx_bookings_slot_status
                ON bookings(slot_id, status);
            CREATE INDEX IF NOT EXISTS idx_bookings_student
                ON bookings(student_id);

            -- Queue ordering
            CREATE INDEX IF NOT EXISTS idx_waiting_list_slot_joined
                ON waiting_list(slot_id, joined_at);
        "#,
    },
    Migration {
        version: 3,
        description: "Enforce one confirmed booking per slot and student",
        sql: r#"
            -- Partial unique index: cancelled bookings may repeat,
            -- confirmed ones may not
            CREATE UNIQUE INDEX IF NOT EXISTS idx_bookings_confirmed_unique
                ON bookings(slot_id, student_id)
                WHERE status = 'confirmed';
        "#,
    },
];

fn applied_version(conn: &Connection) -> u32 {
    conn.query_row("SELECT MAX(version) FROM schema_migrations", [], |row| {
        row.get::<_, Option<u32>>(0)
    })
    .ok()
    .flatten()
    .unwrap_or(0)
}

/// Apply every migration newer than the recorded schema version
#[instrument(skip(conn))]
pub fn run_migrations(conn: &Connection) -> Result<()> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS schema_migrations (
            version INTEGER PRIMARY KEY,
            description TEXT NOT NULL,
            applied_at TEXT NOT NULL
        )",
        [],
    )?;

    let applied = applied_version(conn);

    for migration in MIGRATIONS.iter().filter(|m| m.version > applied) {
        info!(
            version = migration.version,
            description = migration.description,
            "Applying migration"
        );

        conn.execute_batch(migration.sql)?;
        conn.execute(
            "INSERT INTO schema_migrations (version, description, applied_at)
             VALUES (?1, ?2, ?3)",
            rusqlite::params![
                migration.version,
                migration.description,
                chrono::Utc::now().to_rfc3339()
            ],
        )?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn latest_version() -> u32 {
        MIGRATIONS.last().map(|m| m.version).unwrap_or(0)
    }

    #[test]
    fn test_migrations_run() {
        let conn = Connection::open_in_memory().unwrap();
        run_migrations(&conn).unwrap();
        assert_eq!(applied_version(&conn), latest_version());
    }

    #[test]
    fn test_migrations_idempotent() {
        let conn = Connection::open_in_memory().unwrap();
        run_migrations(&conn).unwrap();
        run_migrations(&conn).unwrap();
        assert_eq!(applied_version(&conn), latest_version());
    }

    #[test]
    fn test_migrations_sequential() {
        for (i, migration) in MIGRATIONS.iter().enumerate() {
            assert_eq!(
                migration.version as usize,
                i + 1,
                "Migration {} should have version {}",
                migration.description,
                i + 1
            );
        }
    }

    #[test]
    fn test_duplicate_confirmed_booking_rejected_by_schema() {
        let conn = Connection::open_in_memory().unwrap();
        run_migrations(&conn).unwrap();

        conn.execute(
            "INSERT INTO slots (id, mentor_id, slot_date, start_time, end_time, max_participants, created_at)
             VALUES ('s1', 'm1', '2026-09-15', '10:00', '10:30', 2, '2026-09-01T00:00:00Z')",
            [],
        )
        .unwrap();

        let insert = "INSERT INTO bookings (id, slot_id, student_id, mentor_id, status, booked_at)
             VALUES (?1, 's1', 'stu1', 'm1', ?2, '2026-09-01T00:00:00Z')";

        conn.execute(insert, ["b1", "confirmed"]).unwrap();
        // Second confirmed booking for the same pair violates the partial index
        assert!(conn.execute(insert, ["b2", "confirmed"]).is_err());
        // A cancelled row for the same pair is fine
        conn.execute(insert, ["b3", "cancelled"]).unwrap();
    }
}
