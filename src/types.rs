//! Stadium record types shared by the scrape, merge and store phases

use serde::{Deserialize, Serialize};

/// Sentinel `year_closed` for a stadium that is still in use
pub const STILL_IN_USE_YEAR: u16 = 3000;

/// A club's current home ground, as scraped
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PresentStadium {
    pub city: String,
    pub club: String,
    pub stadium_name: String,
    pub capacity: u32,
    pub country: String,
}

/// A retired ground a club used to play at, as scraped
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PastStadium {
    pub club: String,
    pub past_stadium_name: String,
    pub year_closed: u16,
}

/// Row of the `present_stadiums` table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PresentStadiumRecord {
    pub id: i64,
    pub city: String,
    pub club: String,
    pub stadium_name: String,
    pub capacity: u32,
    pub country: String,
}

/// Row of the `past_stadiums` table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PastStadiumRecord {
    pub id: i64,
    pub club: String,
    pub past_stadium_name: String,
    pub year_closed: u16,
}

/// One row of the combined present/past export
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MergedStadium {
    pub city: String,
    pub club: String,
    pub stadium_name: String,
    pub capacity: u32,
    pub country: String,
    pub past_stadium_name: String,
    pub year_closed: u16,
}

impl MergedStadium {
    /// Join a present stadium with one of its past grounds.
    pub fn with_past(present: &PresentStadium, past: &PastStadium) -> Self {
        Self {
            city: present.city.clone(),
            club: present.club.clone(),
            stadium_name: present.stadium_name.clone(),
            capacity: present.capacity,
            country: present.country.clone(),
            past_stadium_name: past.past_stadium_name.clone(),
            year_closed: past.year_closed,
        }
    }

    /// A present stadium with no recorded past ground stands in as its own
    /// past stadium, never closed.
    pub fn without_past(present: &PresentStadium) -> Self {
        Self {
            city: present.city.clone(),
            club: present.club.clone(),
            stadium_name: present.stadium_name.clone(),
            capacity: present.capacity,
            country: present.country.clone(),
            past_stadium_name: present.stadium_name.clone(),
            year_closed: STILL_IN_USE_YEAR,
        }
    }
}
