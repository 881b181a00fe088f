use chrono::NaiveDate;

/// Route-query endpoint of the booking site.
pub const BASE_URL: &str = "https://www.viajeguanabara.com.br/onibus";

/// Suffix under which the site aggregates a city's terminals. Some cities are
/// only indexed under the aggregated hub, neighboring ones only under the
/// bare slug; which applies is empirical (see the prober).
pub const ALL_SUFFIX: &str = "-todos";

/// Origin/destination pairs swept by default.
pub const CITY_PAIRS: &[(&str, &str)] = &[
    ("Fortaleza - CE", "Recife - PE"),
    ("Joao Pessoa - PB", "Recife - PE"),
    ("Fortaleza - CE", "Natal - RN"),
    ("Fortaleza - CE", "Joao Pessoa - PB"),
    ("Recife - PE", "Salvador - BA"),
    ("Aracaju - SE", "Salvador - BA"),
    ("Sao Paulo - SP", "Brasilia - DF"),
];

/// Day-ahead horizon: snapshots are collected this many days past the base
/// date.
pub const DAYS_AHEAD: &[i64] = &[1, 3, 5, 7, 10, 14];

pub fn format_date(date: NaiveDate) -> String {
    date.format("%d-%m-%Y").to_string()
}

pub fn route_url(origin_slug: &str, destination_slug: &str, date: NaiveDate) -> String {
    format!(
        "{BASE_URL}/{origin_slug}/{destination_slug}?departureDate={}&passengers=1:1",
        format_date(date)
    )
}

/// Externally supplied sweep parameters; the engine itself decides nothing
/// about dates or routes.
#[derive(Debug, Clone)]
pub struct SweepConfig {
    pub base_date: NaiveDate,
    pub collection_date: NaiveDate,
    pub pairs: Vec<(String, String)>,
    pub days_ahead: Vec<i64>,
}

impl SweepConfig {
    pub fn new(base_date: NaiveDate, collection_date: NaiveDate) -> Self {
        Self {
            base_date,
            collection_date,
            pairs: CITY_PAIRS
                .iter()
                .map(|(o, d)| (o.to_string(), d.to_string()))
                .collect(),
            days_ahead: DAYS_AHEAD.to_vec(),
        }
    }
}
