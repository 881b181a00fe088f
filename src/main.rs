//chromedriver.exe --port=9515

mod _01_session;
mod _02_records;
mod _03_cities;
mod _04_scraping;
mod _05_routes;
mod _06_normalize;
mod _07_export;

use std::io::{self, BufRead, Write};
use std::path::Path;

use chrono::{Local, NaiveDate};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use _01_session::start_chrome_driver;
use _03_cities::CityIndex;
use _04_scraping::run_sweep;
use _05_routes::{format_date, SweepConfig, CITY_PAIRS};
use _06_normalize::normalize_records;
use _07_export::write_records;

const OUTPUT_FILE: &str = "guanabara_trips.csv";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    info!("starting fare sweep");

    let collection_date = Local::now().date_naive();
    let base_date = prompt_base_date(collection_date)?;
    info!("base date: {}", format_date(base_date));

    let index = match std::env::var("CITY_DATASET") {
        Ok(path) => {
            info!("resolving cities through reference dataset {path}");
            CityIndex::from_csv_path(Path::new(&path))?
        }
        Err(_) => CityIndex::from_names(CITY_PAIRS.iter().flat_map(|(o, d)| [*o, *d])),
    };

    let config = SweepConfig::new(base_date, collection_date);

    let driver = match start_chrome_driver().await {
        Ok(driver) => driver,
        Err(e) => {
            error!("could not start a browser session: {e}. Is chromedriver running on port 9515?");
            return Ok(());
        }
    };

    let records = run_sweep(&driver, &index, &config).await;
    driver.quit().await?;

    if records.is_empty() {
        warn!("no records collected; nothing to write");
        return Ok(());
    }

    let rows = normalize_records(records);
    write_records(Path::new(OUTPUT_FILE), &rows)?;
    info!("wrote {} records to {OUTPUT_FILE}", rows.len());

    Ok(())
}

/// Ask whether the horizon starts counting from today or tomorrow,
/// re-prompting on anything else. Non-interactive runs (closed stdin) fall
/// back to today.
fn prompt_base_date(today: NaiveDate) -> anyhow::Result<NaiveDate> {
    let stdin = io::stdin();
    loop {
        print!("Start date (today/tomorrow): ");
        io::stdout().flush()?;

        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            info!("stdin closed, defaulting base date to today");
            return Ok(today);
        }
        match line.trim().to_lowercase().as_str() {
            "today" | "hoje" => return Ok(today),
            "tomorrow" | "amanha" => return Ok(today + chrono::Duration::days(1)),
            other => eprintln!("Invalid option {other:?}: type 'today' or 'tomorrow'."),
        }
    }
}
