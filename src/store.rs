//! SQLite persistence for present and past stadium records

use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use tracing::{debug, error, info};

use crate::error::StoreError;
use crate::types::{PastStadiumRecord, PresentStadiumRecord};

pub const DEFAULT_DATABASE: &str = "Footy.db";

pub const PRESENT_TABLE: &str = "present_stadiums";
pub const PAST_TABLE: &str = "past_stadiums";

const CREATE_PRESENT_TABLE: &str = "CREATE TABLE IF NOT EXISTS present_stadiums (
    id INTEGER PRIMARY KEY,
    city TEXT,
    club TEXT,
    stadium_name TEXT,
    capacity INTEGER,
    country TEXT
)";

const CREATE_PAST_TABLE: &str = "CREATE TABLE IF NOT EXISTS past_stadiums (
    id INTEGER PRIMARY KEY,
    club TEXT,
    past_stadium_name TEXT,
    year_closed INTEGER
)";

pub struct StadiumStore {
    conn: Connection,
}

impl StadiumStore {
    /// Open (or create) the database file at `path`
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref();
        let conn = Connection::open(path).map_err(|source| StoreError::Connection {
            path: path.display().to_string(),
            source,
        })?;
        debug!(path = %path.display(), "opened stadium store");
        Ok(Self { conn })
    }

    #[cfg(test)]
    pub fn open_in_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory().map_err(|source| StoreError::Connection {
            path: ":memory:".to_string(),
            source,
        })?;
        Ok(Self { conn })
    }

    /// True iff a table named exactly `name` exists
    pub fn table_exists(&self, name: &str) -> Result<bool, StoreError> {
        let count: i64 = self
            .conn
            .query_row(
                "SELECT count(name) FROM sqlite_master WHERE type = 'table' AND name = ?1",
                [name],
                |row| row.get(0),
            )
            .map_err(StoreError::query("table_exists"))?;
        Ok(count == 1)
    }

    pub fn table_names(&self) -> Result<Vec<String>, StoreError> {
        let mut stmt = self
            .conn
            .prepare("SELECT name FROM sqlite_master WHERE type = 'table' ORDER BY name")
            .map_err(StoreError::query("table_names"))?;
        let names = stmt
            .query_map([], |row| row.get::<_, String>(0))
            .map_err(StoreError::query("table_names"))?
            .collect::<Result<Vec<_>, _>>()
            .map_err(StoreError::query("table_names"))?;
        Ok(names)
    }

    pub fn drop_table(&self, name: &str) -> Result<(), StoreError> {
        let sql = format!("DROP TABLE \"{}\"", name.replace('"', "\"\""));
        self.conn
            .execute(&sql, [])
            .map_err(StoreError::ddl("drop table", name))?;
        debug!(table = name, "dropped table");
        Ok(())
    }

    /// Drop and recreate `present_stadiums` empty
    pub fn create_present_table(&self) -> Result<(), StoreError> {
        self.recreate_table(PRESENT_TABLE, CREATE_PRESENT_TABLE)
    }

    /// Drop and recreate `past_stadiums` empty
    pub fn create_past_table(&self) -> Result<(), StoreError> {
        self.recreate_table(PAST_TABLE, CREATE_PAST_TABLE)
    }

    fn recreate_table(&self, table: &str, ddl: &str) -> Result<(), StoreError> {
        let result = (|| -> Result<(), StoreError> {
            if self.table_exists(table)? {
                self.drop_table(table)?;
            }
            self.conn
                .execute(ddl, [])
                .map_err(StoreError::ddl("create table", table))?;
            Ok(())
        })();

        match &result {
            Ok(()) => info!(table, "created table"),
            Err(e) => error!(table, error = %e, "table creation failed"),
        }
        result
    }

    /// Append one present stadium row. No duplicate detection.
    pub fn insert_present(
        &self,
        city: &str,
        club: &str,
        stadium_name: &str,
        capacity: u32,
        country: &str,
    ) -> Result<i64, StoreError> {
        self.conn
            .execute(
                "INSERT INTO present_stadiums (city, club, stadium_name, capacity, country)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![city, club, stadium_name, capacity, country],
            )
            .map_err(StoreError::query("insert present stadium"))?;
        Ok(self.conn.last_insert_rowid())
    }

    /// Append one past stadium row. No duplicate detection.
    pub fn insert_past(
        &self,
        club: &str,
        past_stadium_name: &str,
        year_closed: u16,
    ) -> Result<i64, StoreError> {
        self.conn
            .execute(
                "INSERT INTO past_stadiums (club, past_stadium_name, year_closed)
                 VALUES (?1, ?2, ?3)",
                params![club, past_stadium_name, year_closed],
            )
            .map_err(StoreError::query("insert past stadium"))?;
        Ok(self.conn.last_insert_rowid())
    }

    pub fn all_present(&self) -> Result<Vec<PresentStadiumRecord>, StoreError> {
        let mut stmt = self
            .conn
            .prepare(
                "SELECT id, city, club, stadium_name, capacity, country
                 FROM present_stadiums ORDER BY id",
            )
            .map_err(StoreError::query("all present stadiums"))?;
        let rows = stmt
            .query_map([], |row| {
                Ok(PresentStadiumRecord {
                    id: row.get(0)?,
                    city: row.get(1)?,
                    club: row.get(2)?,
                    stadium_name: row.get(3)?,
                    capacity: row.get(4)?,
                    country: row.get(5)?,
                })
            })
            .map_err(StoreError::query("all present stadiums"))?
            .collect::<Result<Vec<_>, _>>()
            .map_err(StoreError::query("all present stadiums"))?;
        Ok(rows)
    }

    pub fn all_past(&self) -> Result<Vec<PastStadiumRecord>, StoreError> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, club, past_stadium_name, year_closed FROM past_stadiums ORDER BY id")
            .map_err(StoreError::query("all past stadiums"))?;
        let rows = stmt
            .query_map([], |row| {
                Ok(PastStadiumRecord {
                    id: row.get(0)?,
                    club: row.get(1)?,
                    past_stadium_name: row.get(2)?,
                    year_closed: row.get(3)?,
                })
            })
            .map_err(StoreError::query("all past stadiums"))?
            .collect::<Result<Vec<_>, _>>()
            .map_err(StoreError::query("all past stadiums"))?;
        Ok(rows)
    }

    /// Earliest-closing past stadium of `club` still standing in `year`
    pub fn past_stadium_name(&self, club: &str, year: u16) -> Result<Option<String>, StoreError> {
        self.conn
            .query_row(
                "SELECT past_stadium_name FROM past_stadiums
                 WHERE club = ?1 AND year_closed >= ?2
                 ORDER BY year_closed ASC, id ASC
                 LIMIT 1",
                params![club, year],
                |row| row.get(0),
            )
            .optional()
            .map_err(StoreError::query("past stadium name"))
    }

    pub fn present_stadium_name(&self, club: &str) -> Result<Option<String>, StoreError> {
        self.conn
            .query_row(
                "SELECT stadium_name FROM present_stadiums WHERE club = ?1 ORDER BY id LIMIT 1",
                [club],
                |row| row.get(0),
            )
            .optional()
            .map_err(StoreError::query("present stadium name"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> StadiumStore {
        let store = StadiumStore::open_in_memory().unwrap();
        store.create_present_table().unwrap();
        store.create_past_table().unwrap();
        store
    }

    #[test]
    fn test_table_exists_after_creation() {
        let store = StadiumStore::open_in_memory().unwrap();
        assert!(!store.table_exists(PRESENT_TABLE).unwrap());
        assert!(!store.table_exists(PAST_TABLE).unwrap());

        store.create_present_table().unwrap();
        assert!(store.table_exists(PRESENT_TABLE).unwrap());
        assert!(!store.table_exists(PAST_TABLE).unwrap());

        store.create_past_table().unwrap();
        assert!(store.table_exists(PAST_TABLE).unwrap());
        assert!(!store.table_exists("stadiums").unwrap());

        assert_eq!(store.table_names().unwrap(), vec![PAST_TABLE, PRESENT_TABLE]);
    }

    #[test]
    fn test_insert_then_read_back() {
        let store = store();
        let id = store
            .insert_present("London", "Arsenal", "Emirates Stadium", 60704, "England")
            .unwrap();

        let rows = store.all_present().unwrap();
        assert_eq!(
            rows,
            vec![PresentStadiumRecord {
                id,
                city: "London".to_string(),
                club: "Arsenal".to_string(),
                stadium_name: "Emirates Stadium".to_string(),
                capacity: 60704,
                country: "England".to_string(),
            }]
        );

        store.insert_past("Arsenal", "Highbury", 2006).unwrap();
        let past = store.all_past().unwrap();
        assert_eq!(past.len(), 1);
        assert_eq!(past[0].club, "Arsenal");
        assert_eq!(past[0].past_stadium_name, "Highbury");
        assert_eq!(past[0].year_closed, 2006);

        let edges: [(&str, &str, &str, u32, &str); 4] = [
            ("", "", "", 0, ""),
            ("Porto", "FC Porto", "Estádio do Dragão", u32::MAX, "Portugal"),
            ("Mönchengladbach", "Borussia 'Gladbach'", "Borussia-Park \"Fohlen\"", 54057, "Germany"),
            ("İstanbul", "Beşiktaş; DROP TABLE present_stadiums", "Tüpraş Stadyumu", 42590, "Turkey"),
        ];
        for (city, club, stadium_name, capacity, country) in edges {
            let id = store
                .insert_present(city, club, stadium_name, capacity, country)
                .unwrap();
            let row = store.all_present().unwrap().into_iter().find(|r| r.id == id).unwrap();
            assert_eq!(row.city, city);
            assert_eq!(row.club, club);
            assert_eq!(row.stadium_name, stadium_name);
            assert_eq!(row.capacity, capacity);
            assert_eq!(row.country, country);
        }
        assert_eq!(store.all_present().unwrap().len(), 5);
        assert!(store.table_exists(PRESENT_TABLE).unwrap());

        store.insert_past("Sporting CP", "Estádio José Alvalade", 2003).unwrap();
        let past = store.all_past().unwrap();
        assert_eq!(past[1].past_stadium_name, "Estádio José Alvalade");
        assert_eq!(past[1].year_closed, 2003);
    }

    #[test]
    fn test_failed_create_leaves_table_absent() {
        let store = StadiumStore::open_in_memory().unwrap();
        // An index already owns the table name
        store
            .conn
            .execute_batch(
                "CREATE TABLE clubs (name TEXT);
                 CREATE INDEX present_stadiums ON clubs (name);",
            )
            .unwrap();

        let err = store.create_present_table().unwrap_err();
        assert!(matches!(
            err,
            StoreError::Ddl { operation: "create table", ref table, .. } if table == PRESENT_TABLE
        ));
        assert!(!store.table_exists(PRESENT_TABLE).unwrap());

        // The other table is unaffected
        store.create_past_table().unwrap();
        assert!(store.table_exists(PAST_TABLE).unwrap());
    }

    #[test]
    fn test_create_twice_is_full_refresh() {
        let store = store();
        store.insert_present("Leicester", "Leicester City", "King Power Stadium", 32261, "England").unwrap();
        store.insert_past("Leicester City", "Filbert Street", 2002).unwrap();

        store.create_present_table().unwrap();
        store.create_past_table().unwrap();

        assert!(store.table_exists(PRESENT_TABLE).unwrap());
        assert!(store.all_present().unwrap().is_empty());
        assert!(store.all_past().unwrap().is_empty());
    }

    #[test]
    fn test_inserts_are_not_deduplicated() {
        let store = store();
        store.insert_present("Derby", "Derby County", "Pride Park", 33597, "England").unwrap();
        store.insert_present("Derby", "Derby County", "Pride Park", 33597, "England").unwrap();
        assert_eq!(store.all_present().unwrap().len(), 2);
    }

    #[test]
    fn test_past_name_prefers_earliest_qualifying_closure() {
        let store = store();
        // Inserted out of order on purpose
        store.insert_past("Club", "Third Ground", 1995).unwrap();
        store.insert_past("Club", "First Ground", 1920).unwrap();
        store.insert_past("Club", "Second Ground", 1960).unwrap();

        assert_eq!(store.past_stadium_name("Club", 1900).unwrap().as_deref(), Some("First Ground"));
        assert_eq!(store.past_stadium_name("Club", 1920).unwrap().as_deref(), Some("First Ground"));
        assert_eq!(store.past_stadium_name("Club", 1921).unwrap().as_deref(), Some("Second Ground"));
        assert_eq!(store.past_stadium_name("Club", 1980).unwrap().as_deref(), Some("Third Ground"));
        assert_eq!(store.past_stadium_name("Club", 1996).unwrap(), None);
        assert_eq!(store.past_stadium_name("Other", 1900).unwrap(), None);
    }

    #[test]
    fn test_query_without_table_is_error() {
        let store = StadiumStore::open_in_memory().unwrap();
        let err = store.all_present().unwrap_err();
        assert!(matches!(err, StoreError::Query { operation: "all present stadiums", .. }));
    }
}
