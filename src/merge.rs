//! Combine the scraped present/past datasets and load them into the store

use anyhow::{Context, Result};
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use tracing::{error, info};

use crate::scrape::{write_json_array, PAST_FILE, PRESENT_FILE};
use crate::store::StadiumStore;
use crate::types::{MergedStadium, PastStadium, PresentStadium};
use crate::utils::osc8_file_link;

pub const MERGED_JSON_FILE: &str = "european_football_stadiums.json";
pub const MERGED_CSV_FILE: &str = "european_football_stadiums.csv";

/// Left join `past` onto `present` by club.
///
/// Every present club appears at least once. A club with several past
/// stadiums fans out to one row per past stadium; a club with none gets its
/// current ground as past stadium and the still-in-use year.
pub fn merge_stadiums(present: &[PresentStadium], past: &[PastStadium]) -> Vec<MergedStadium> {
    let mut past_by_club: HashMap<&str, Vec<&PastStadium>> = HashMap::new();
    for p in past {
        past_by_club.entry(p.club.as_str()).or_default().push(p);
    }

    let mut merged = Vec::with_capacity(present.len());
    for stadium in present {
        match past_by_club.get(stadium.club.as_str()) {
            Some(matches) => {
                merged.extend(matches.iter().map(|p| MergedStadium::with_past(stadium, p)));
            }
            None => merged.push(MergedStadium::without_past(stadium)),
        }
    }
    merged
}

fn read_json_array<T: serde::de::DeserializeOwned>(path: &Path) -> Result<Vec<T>> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&content).with_context(|| format!("Failed to parse {}", path.display()))
}

pub fn write_csv(path: &Path, records: &[MergedStadium]) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)
        .with_context(|| format!("Failed to create {}", path.display()))?;
    for record in records {
        writer.serialize(record)?;
    }
    writer.flush()?;
    Ok(())
}

/// Full refresh of both tables, then insert every row at its original granularity
pub fn populate_store(
    store: &StadiumStore,
    present: &[PresentStadium],
    past: &[PastStadium],
) -> Result<(usize, usize)> {
    store.create_present_table()?;
    store.create_past_table()?;

    for s in present {
        store
            .insert_present(&s.city, &s.club, &s.stadium_name, s.capacity, &s.country)
            .with_context(|| format!("Failed to insert present stadium of {}", s.club))?;
    }
    for s in past {
        store
            .insert_past(&s.club, &s.past_stadium_name, s.year_closed)
            .with_context(|| format!("Failed to insert past stadium of {}", s.club))?;
    }

    Ok((present.len(), past.len()))
}

pub fn run_load(data_dir: &Path, database: &Path, quiet: bool) -> Result<()> {
    let present: Vec<PresentStadium> = read_json_array(&data_dir.join(PRESENT_FILE))?;
    let past: Vec<PastStadium> = read_json_array(&data_dir.join(PAST_FILE))?;
    info!(present = present.len(), past = past.len(), "loaded scraped datasets");

    let merged = merge_stadiums(&present, &past);

    let json_path = data_dir.join(MERGED_JSON_FILE);
    let csv_path = data_dir.join(MERGED_CSV_FILE);
    write_json_array(&json_path, &merged)?;
    write_csv(&csv_path, &merged)?;

    if !quiet {
        println!(
            "Merged {} rows into {} and {}",
            merged.len(),
            osc8_file_link(&json_path),
            osc8_file_link(&csv_path),
        );
    }

    let store = match StadiumStore::open(database) {
        Ok(store) => store,
        Err(e) => {
            error!(error = %e, "cannot create the database connection, skipping store load");
            return Ok(());
        }
    };

    let (present_count, past_count) = populate_store(&store, &present, &past)?;
    if !quiet {
        println!(
            "Inserted {} present and {} past stadiums into {}",
            present_count,
            past_count,
            osc8_file_link(database),
        );
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scrape::DatasetBuilder;
    use crate::types::STILL_IN_USE_YEAR;

    fn present(club: &str, stadium_name: &str) -> PresentStadium {
        PresentStadium {
            city: format!("{} Town", club),
            club: club.to_string(),
            stadium_name: stadium_name.to_string(),
            capacity: 20000,
            country: "England".to_string(),
        }
    }

    fn past(club: &str, name: &str, year_closed: u16) -> PastStadium {
        PastStadium {
            club: club.to_string(),
            past_stadium_name: name.to_string(),
            year_closed,
        }
    }

    #[test]
    fn test_club_without_past_uses_sentinel() {
        let merged = merge_stadiums(&[present("A", "Stad1")], &[]);
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].club, "A");
        assert_eq!(merged[0].past_stadium_name, "Stad1");
        assert_eq!(merged[0].year_closed, STILL_IN_USE_YEAR);
        assert_eq!(merged[0].year_closed, 3000);
    }

    #[test]
    fn test_club_with_past_joins() {
        let merged = merge_stadiums(&[present("B", "NewGround")], &[past("B", "OldGround", 1990)]);
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].stadium_name, "NewGround");
        assert_eq!(merged[0].past_stadium_name, "OldGround");
        assert_eq!(merged[0].year_closed, 1990);
    }

    #[test]
    fn test_multiple_past_fans_out_and_orphans_drop() {
        let merged = merge_stadiums(
            &[present("C", "Current"), present("D", "Home")],
            &[
                past("C", "Second", 1970),
                past("Z", "Unmatched", 1900),
                past("C", "First", 1920),
            ],
        );
        let rows: Vec<(&str, &str, u16)> = merged
            .iter()
            .map(|m| (m.club.as_str(), m.past_stadium_name.as_str(), m.year_closed))
            .collect();
        assert_eq!(
            rows,
            vec![
                ("C", "Second", 1970),
                ("C", "First", 1920),
                ("D", "Home", STILL_IN_USE_YEAR),
            ]
        );
    }

    #[test]
    fn test_run_load_writes_exports_and_store() {
        let dir = tempfile::tempdir().unwrap();
        let mut builder = DatasetBuilder::new();
        builder.add_present(vec![present("B", "NewGround"), present("A", "Stad1")]);
        builder.add_past(vec![past("B", "OldGround", 1990), past("B", "OlderGround", 1950)]);
        builder.write(dir.path()).unwrap();

        let database = dir.path().join("Footy.db");
        run_load(dir.path(), &database, true).unwrap();

        let json = fs::read_to_string(dir.path().join(MERGED_JSON_FILE)).unwrap();
        let merged: Vec<MergedStadium> = serde_json::from_str(&json).unwrap();
        assert_eq!(merged.len(), 3);

        let mut reader = csv::Reader::from_path(dir.path().join(MERGED_CSV_FILE)).unwrap();
        let headers = reader.headers().unwrap().clone();
        assert_eq!(
            headers.iter().collect::<Vec<_>>(),
            vec!["city", "club", "stadium_name", "capacity", "country", "past_stadium_name", "year_closed"]
        );
        let from_csv: Vec<MergedStadium> = reader.deserialize().map(|r| r.unwrap()).collect();
        assert_eq!(from_csv, merged);

        let store = StadiumStore::open(&database).unwrap();
        assert_eq!(store.all_present().unwrap().len(), 2);
        assert_eq!(store.all_past().unwrap().len(), 2);

        // Rerunning refreshes rather than duplicating
        run_load(dir.path(), &database, true).unwrap();
        assert_eq!(store.all_present().unwrap().len(), 2);
        assert_eq!(store.all_past().unwrap().len(), 2);
    }

    #[test]
    fn test_run_load_without_database_still_exports() {
        let dir = tempfile::tempdir().unwrap();
        let mut builder = DatasetBuilder::new();
        builder.add_present(vec![present("A", "Stad1")]);
        builder.write(dir.path()).unwrap();

        let database = dir.path().join("missing_dir").join("Footy.db");
        run_load(dir.path(), &database, true).unwrap();

        assert!(dir.path().join(MERGED_JSON_FILE).exists());
        assert!(dir.path().join(MERGED_CSV_FILE).exists());
        assert!(!database.exists());
        assert!(!dir.path().join("missing_dir").exists());
    }
}
