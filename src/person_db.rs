//! SQLite-backed person store.
//!
//! A single flat `people` table keyed by the rowid alias, WAL mode so the
//! accept loop's reads never block a writer. The retrieval path translates
//! a resolved `QuerySpec` into one parameterized SELECT.

use std::path::Path;

use chrono::Utc;
use rusqlite::{params, Connection, Row};

use crate::{ApiError, FilterValue, NewPerson, Person, QuerySpec};

pub(crate) struct PersonDb {
    conn: Connection,
}

// ── Schema SQL ───────────────────────────────────────────────────────────

const SCHEMA_SQL: &str = "
CREATE TABLE IF NOT EXISTS people (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL,
    surname TEXT NOT NULL,
    patronymic TEXT NOT NULL DEFAULT '',
    gender TEXT NOT NULL DEFAULT '',
    age INTEGER NOT NULL DEFAULT 0,
    nationality TEXT NOT NULL DEFAULT '',
    created_at INTEGER NOT NULL DEFAULT (strftime('%s', 'now'))
);

CREATE INDEX IF NOT EXISTS idx_people_surname ON people(surname);
CREATE INDEX IF NOT EXISTS idx_people_nationality ON people(nationality);
";

const PERSON_COLUMNS: &str = "id, name, surname, patronymic, gender, age, nationality, created_at";

// ── Core implementation ──────────────────────────────────────────────────

impl PersonDb {
    /// Open or create a database file with full schema.
    pub(crate) fn open_or_create(path: &Path) -> Result<Self, Box<dyn std::error::Error>> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let conn = Connection::open(path)?;
        let db = Self { conn };
        db.apply_pragmas()?;
        db.init_schema()?;
        Ok(db)
    }

    fn apply_pragmas(&self) -> Result<(), rusqlite::Error> {
        self.conn.execute_batch(
            "PRAGMA journal_mode = WAL;
             PRAGMA synchronous = NORMAL;
             PRAGMA busy_timeout = 5000;",
        )
    }

    fn init_schema(&self) -> Result<(), rusqlite::Error> {
        self.conn.execute_batch(SCHEMA_SQL)
    }

    fn row_to_person(row: &Row) -> Result<Person, rusqlite::Error> {
        Ok(Person {
            id: row.get(0)?,
            name: row.get(1)?,
            surname: row.get(2)?,
            patronymic: row.get(3)?,
            gender: row.get(4)?,
            age: row.get(5)?,
            nationality: row.get(6)?,
            created_at: row.get(7)?,
        })
    }

    // ── Read operations ──────────────────────────────────────────────

    pub(crate) fn count(&self) -> usize {
        self.conn
            .query_row("SELECT COUNT(*) FROM people", [], |row| {
                row.get::<_, i64>(0)
            })
            .unwrap_or(0) as usize
    }

    pub(crate) fn person_by_id(&self, id: i64) -> Result<Person, ApiError> {
        let person = self.conn.query_row(
            &format!("SELECT {PERSON_COLUMNS} FROM people WHERE id = ?1"),
            params![id],
            |row| Self::row_to_person(row),
        )?;
        Ok(person)
    }

    /// Execute a resolved `QuerySpec`: every predicate ANDs into the WHERE
    /// clause, then LIMIT/OFFSET page the id-ordered result.
    pub(crate) fn find(&self, spec: &QuerySpec) -> Result<Vec<Person>, ApiError> {
        let mut conditions = Vec::new();
        let mut bind_values: Vec<Box<dyn rusqlite::types::ToSql>> = Vec::new();

        for predicate in &spec.predicates {
            match &predicate.value {
                FilterValue::Text(text) => bind_values.push(Box::new(text.clone())),
                FilterValue::Number(number) => bind_values.push(Box::new(*number)),
            }
            conditions.push(format!(
                "{} = ?{}",
                predicate.field.column(),
                bind_values.len()
            ));
        }

        let where_clause = if conditions.is_empty() {
            "1".to_string()
        } else {
            conditions.join(" AND ")
        };

        bind_values.push(Box::new(spec.limit as i64));
        let limit_idx = bind_values.len();
        bind_values.push(Box::new(spec.offset as i64));
        let offset_idx = bind_values.len();

        let sql = format!(
            "SELECT {PERSON_COLUMNS} FROM people
             WHERE {where_clause}
             ORDER BY id
             LIMIT ?{limit_idx} OFFSET ?{offset_idx}"
        );

        let bind_refs: Vec<&dyn rusqlite::types::ToSql> =
            bind_values.iter().map(|b| b.as_ref()).collect();

        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map(bind_refs.as_slice(), |row| Self::row_to_person(row))?;
        let mut results = Vec::new();
        for row in rows {
            results.push(row?);
        }
        Ok(results)
    }

    // ── Write operations ─────────────────────────────────────────────

    /// Insert a new record and return it with the assigned id. Rowids are
    /// never reused, so identifiers stay unique for the store's lifetime.
    pub(crate) fn insert(&self, person: &NewPerson) -> Result<Person, ApiError> {
        let created_at = Utc::now().timestamp();
        self.conn.execute(
            "INSERT INTO people (name, surname, patronymic, gender, age, nationality, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                person.name,
                person.surname,
                person.patronymic,
                person.profile.gender,
                person.profile.age,
                person.profile.nationality,
                created_at,
            ],
        )?;
        self.person_by_id(self.conn.last_insert_rowid())
    }

    /// Full-record update by id. Updating a missing id is a store error.
    pub(crate) fn save(&self, person: &Person) -> Result<(), ApiError> {
        let changed = self.conn.execute(
            "UPDATE people SET name = ?1, surname = ?2, patronymic = ?3, gender = ?4,
             age = ?5, nationality = ?6 WHERE id = ?7",
            params![
                person.name,
                person.surname,
                person.patronymic,
                person.gender,
                person.age,
                person.nationality,
                person.id,
            ],
        )?;
        if changed == 0 {
            return Err(ApiError::Store(rusqlite::Error::QueryReturnedNoRows));
        }
        Ok(())
    }

    /// Deleting a missing id is a store error.
    pub(crate) fn delete_by_id(&self, id: i64) -> Result<(), ApiError> {
        let changed = self
            .conn
            .execute("DELETE FROM people WHERE id = ?1", params![id])?;
        if changed == 0 {
            return Err(ApiError::Store(rusqlite::Error::QueryReturnedNoRows));
        }
        Ok(())
    }
}

// ── Tests ────────────────────────────────────────────────────────────────
