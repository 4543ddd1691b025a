use anyhow::{Context, Result};
use scraper::{ElementRef, Html, Selector};
use std::fs;
use std::path::Path;
use tracing::{debug, info};

use crate::error::ParseError;
use crate::types::{PastStadium, PresentStadium};
use crate::utils::{osc8_file_link, osc8_link};

pub const PRESENT_BASE_URL: &str = "https://www.stadiumguide.com/present/";
pub const PAST_BASE_URL: &str = "https://www.stadiumguide.com/past/past-stadiums-";

pub const PRESENT_FILE: &str = "present_european_football_stadiums.json";
pub const PAST_FILE: &str = "past_european_football_stadiums.json";

pub const DEFAULT_COUNTRIES: &[&str] = &["England"];

/// Countries with a main league listed on football-data.co.uk
pub const ALL_PRESENT_COUNTRIES: &[&str] = &[
    "England",
    "Scotland",
    "Germany",
    "Italy",
    "Spain",
    "Netherlands",
    "Belgium",
    "Portugal",
    "Turkey",
    "Greece",
    "France",
];

/// Scotland, Belgium, Turkey and France have no past stadium page
pub const ALL_PAST_COUNTRIES: &[&str] = &[
    "England",
    "Germany",
    "Italy",
    "Spain",
    "Netherlands",
    "Portugal",
    "Greece",
];

/// Cell texts of one listing row, picked out by column class
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawRow {
    pub city: Option<String>,
    pub club: Option<String>,
    pub name: Option<String>,
    /// Capacity on present pages, year closed on past pages
    pub figure: Option<String>,
}

struct RowSelectors {
    row: Selector,
    city: Selector,
    club: Selector,
    link: Selector,
    figure: Selector,
}

impl RowSelectors {
    fn new() -> Result<Self, ParseError> {
        Ok(Self {
            row: selector("tr")?,
            city: selector("td.column-1")?,
            club: selector("td.column-2")?,
            link: selector("a")?,
            figure: selector("td.column-4")?,
        })
    }
}

fn selector(css: &str) -> Result<Selector, ParseError> {
    Selector::parse(css).map_err(|_| ParseError::Selector(css.to_string()))
}

fn first_text(row: &ElementRef, selector: &Selector) -> Option<String> {
    row.select(selector)
        .next()
        .map(|el| el.text().collect::<String>().trim().to_string())
}

/// Pull the listing rows out of a country page, skipping the header row
pub fn extract_rows(html: &str) -> Result<Vec<RawRow>, ParseError> {
    let selectors = RowSelectors::new()?;
    let document = Html::parse_document(html);

    let rows = document
        .select(&selectors.row)
        .skip(1)
        .map(|row| RawRow {
            city: first_text(&row, &selectors.city),
            club: first_text(&row, &selectors.club),
            name: first_text(&row, &selectors.link),
            figure: first_text(&row, &selectors.figure),
        })
        .collect();

    Ok(rows)
}

fn required(
    value: &Option<String>,
    country: &str,
    row: usize,
    field: &'static str,
) -> Result<String, ParseError> {
    value.clone().ok_or_else(|| ParseError::MissingField {
        country: country.to_string(),
        row,
        field,
    })
}

/// Parse a capacity like "60,704", "81.365" or "9 000"
pub fn parse_capacity(text: &str) -> Option<u32> {
    let digits: String = text
        .trim()
        .chars()
        .filter(|c| !matches!(c, ',' | '.' | ' ' | '\u{a0}'))
        .collect();
    if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    digits.parse().ok()
}

/// Parse a four digit closing year
pub fn parse_year_closed(text: &str) -> Option<u16> {
    let text = text.trim();
    if text.len() == 4 && text.chars().all(|c| c.is_ascii_digit()) {
        text.parse().ok()
    } else {
        None
    }
}

pub fn transform_present_rows(
    rows: &[RawRow],
    country: &str,
) -> Result<Vec<PresentStadium>, ParseError> {
    rows.iter()
        .enumerate()
        .map(|(i, row)| {
            let index = i + 1;
            let figure = required(&row.figure, country, index, "capacity")?;
            let capacity = parse_capacity(&figure).ok_or_else(|| ParseError::InvalidNumber {
                country: country.to_string(),
                row: index,
                field: "capacity",
                value: figure.clone(),
            })?;
            Ok(PresentStadium {
                city: required(&row.city, country, index, "city")?,
                club: required(&row.club, country, index, "club")?,
                stadium_name: required(&row.name, country, index, "stadium name")?,
                capacity,
                country: country.to_string(),
            })
        })
        .collect()
}

pub fn transform_past_rows(rows: &[RawRow], country: &str) -> Result<Vec<PastStadium>, ParseError> {
    rows.iter()
        .enumerate()
        .map(|(i, row)| {
            let index = i + 1;
            let figure = required(&row.figure, country, index, "year closed")?;
            let year_closed =
                parse_year_closed(&figure).ok_or_else(|| ParseError::InvalidNumber {
                    country: country.to_string(),
                    row: index,
                    field: "year closed",
                    value: figure.clone(),
                })?;
            Ok(PastStadium {
                club: required(&row.club, country, index, "club")?,
                past_stadium_name: required(&row.name, country, index, "past stadium name")?,
                year_closed,
            })
        })
        .collect()
}

/// Fetches country listing pages from stadiumguide.com
pub struct Extractor {
    client: reqwest::blocking::Client,
    quiet: bool,
}

impl Extractor {
    pub fn new(quiet: bool) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .user_agent("Mozilla/5.0 (compatible; FootyStadiumScraper/1.0)")
            .build()?;
        Ok(Self { client, quiet })
    }

    pub fn fetch_page(&self, base_url: &str, country: &str) -> Result<String> {
        let url = format!("{}{}/", base_url, country);
        if !self.quiet {
            println!("  Fetching {}", osc8_link(&url, country));
        }

        let text = self
            .client
            .get(&url)
            .send()
            .and_then(|r| r.error_for_status())
            .with_context(|| format!("Failed to fetch: {}", url))?
            .text()
            .with_context(|| format!("Failed to read response: {}", url))?;
        debug!(%url, bytes = text.len(), "fetched page");
        Ok(text)
    }

    pub fn extract(&self, base_url: &str, country: &str) -> Result<Vec<RawRow>> {
        let html = self.fetch_page(base_url, country)?;
        let rows = extract_rows(&html)?;
        info!(country, rows = rows.len(), "extracted stadium rows");
        Ok(rows)
    }
}

/// Collects per-country records into the two flat datasets
#[derive(Debug, Default)]
pub struct DatasetBuilder {
    pub present: Vec<PresentStadium>,
    pub past: Vec<PastStadium>,
}

impl DatasetBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_present(&mut self, records: Vec<PresentStadium>) {
        self.present.extend(records);
    }

    pub fn add_past(&mut self, records: Vec<PastStadium>) {
        self.past.extend(records);
    }

    /// Write both datasets as JSON arrays into `dir`
    pub fn write(&self, dir: &Path) -> Result<()> {
        write_json_array(&dir.join(PRESENT_FILE), &self.present)?;
        write_json_array(&dir.join(PAST_FILE), &self.past)?;
        Ok(())
    }
}

pub(crate) fn write_json_array<T: serde::Serialize>(path: &Path, records: &[T]) -> Result<()> {
    let mut json = serde_json::to_string_pretty(records)?;
    json.push('\n');
    fs::write(path, json).with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(())
}

pub fn run_scrape(data_dir: &Path, countries: Option<Vec<String>>, all: bool, quiet: bool) -> Result<()> {
    let (present_countries, past_countries): (Vec<String>, Vec<String>) = match countries {
        Some(list) => (list.clone(), list),
        None if all => (
            ALL_PRESENT_COUNTRIES.iter().map(|c| c.to_string()).collect(),
            ALL_PAST_COUNTRIES.iter().map(|c| c.to_string()).collect(),
        ),
        None => {
            let defaults: Vec<String> = DEFAULT_COUNTRIES.iter().map(|c| c.to_string()).collect();
            (defaults.clone(), defaults)
        }
    };

    fs::create_dir_all(data_dir)
        .with_context(|| format!("Failed to create {}", data_dir.display()))?;

    let extractor = Extractor::new(quiet)?;
    let mut builder = DatasetBuilder::new();

    if !quiet {
        println!("Scraping present stadiums...");
    }
    for country in &present_countries {
        let rows = extractor.extract(PRESENT_BASE_URL, country)?;
        builder.add_present(transform_present_rows(&rows, country)?);
    }

    if !quiet {
        println!("Scraping past stadiums...");
    }
    for country in &past_countries {
        let rows = extractor.extract(PAST_BASE_URL, country)?;
        builder.add_past(transform_past_rows(&rows, country)?);
    }

    builder.write(data_dir)?;

    if !quiet {
        println!(
            "Done! Wrote {} present stadiums to {} and {} past stadiums to {}",
            builder.present.len(),
            osc8_file_link(&data_dir.join(PRESENT_FILE)),
            builder.past.len(),
            osc8_file_link(&data_dir.join(PAST_FILE)),
        );
    }
    Ok(())
}
