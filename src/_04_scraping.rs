use std::time::Duration;

use chrono::NaiveDate;
use tracing::{debug, info, warn};

use crate::_01_session::{Elem, Session, SessionError};
use crate::_02_records::{OccupancySnapshot, RoutePair, SweepError, TripRecord};
use crate::_03_cities::CityIndex;
use crate::_05_routes::{format_date, route_url, SweepConfig, ALL_SUFFIX};

const TRIP_SELECTOR: &str = "app-trip";
const TRIP_ID_SELECTOR: &str = "[data-testid^='idTrip']";

const PROBE_WAIT: Duration = Duration::from_secs(20);
const PAGE_WAIT: Duration = Duration::from_secs(60);
const SEAT_WAIT: Duration = Duration::from_secs(10);

/// Markers the site serves once it has flagged the session.
const BLOCK_MARKERS: &[&str] = &["captcha", "bloqueado"];

//
// ======================================================
// Combination prober
// ======================================================
//

/// The four slug combinations, in probe precedence order.
pub fn slug_variants(origin: &str, destination: &str) -> [(String, String); 4] {
    [
        (
            format!("{origin}{ALL_SUFFIX}"),
            format!("{destination}{ALL_SUFFIX}"),
        ),
        (format!("{origin}{ALL_SUFFIX}"), destination.to_string()),
        (origin.to_string(), format!("{destination}{ALL_SUFFIX}")),
        (origin.to_string(), destination.to_string()),
    ]
}

/// Try the four variants in order; the first one the site answers with at
/// least one trip offer wins and is reused for every date of the sweep.
/// Per-variant failures (timeout, navigation error) just move the loop on.
pub async fn probe_combinations<S: Session>(
    session: &S,
    origin_base: &str,
    destination_base: &str,
    date: NaiveDate,
) -> Result<(String, String), SweepError> {
    for (origin_slug, destination_slug) in slug_variants(origin_base, destination_base) {
        let url = route_url(&origin_slug, &destination_slug, date);
        debug!("probing combination {origin_slug} -> {destination_slug}: {url}");

        if let Err(e) = session.navigate(&url).await {
            debug!("navigation failed for {origin_slug} -> {destination_slug}: {e}");
            continue;
        }
        if !session.wait_for(TRIP_SELECTOR, PROBE_WAIT).await {
            debug!("no trips appeared for {origin_slug} -> {destination_slug}");
            continue;
        }
        let trips = session.find_all(TRIP_SELECTOR).await.unwrap_or_default();
        if !trips.is_empty() {
            info!(
                "combination {origin_slug} -> {destination_slug} serves {} trips",
                trips.len()
            );
            return Ok((origin_slug, destination_slug));
        }
    }

    Err(SweepError::ProbeExhausted {
        origin: origin_base.to_string(),
        destination: destination_base.to_string(),
    })
}

//
// ======================================================
// Trip extractor
// ======================================================
//

/// Parse every visible trip offer on the results page for one route+date,
/// in document order. A malformed offer is skipped; a block marker aborts
/// the whole date.
pub async fn extract_trips<S: Session>(
    session: &S,
    route: &RoutePair,
    resolved: &(String, String),
    departure_date: NaiveDate,
    collection_date: NaiveDate,
) -> Result<Vec<TripRecord>, SweepError> {
    let url = route_url(&resolved.0, &resolved.1, departure_date);
    debug!("loading results page: {url}");
    session.navigate(&url).await?;

    if !session.wait_for(TRIP_SELECTOR, PAGE_WAIT).await {
        warn!("results page never showed trips: {url}");
        return Ok(Vec::new());
    }

    let source = session.page_source().await?.to_lowercase();
    if BLOCK_MARKERS.iter().any(|marker| source.contains(marker)) {
        return Err(SweepError::PageBlocked);
    }

    let trips = session.find_all(TRIP_SELECTOR).await?;
    info!("found {} trips on the page", trips.len());

    let mut records = Vec::new();
    for trip in &trips {
        match read_offer(session, trip, route, departure_date, collection_date).await {
            Ok(record) => records.push(record),
            Err(e) => warn!("skipping malformed trip offer: {e}"),
        }
    }
    Ok(records)
}

async fn read_offer<S: Session>(
    session: &S,
    trip: &S::Elem,
    route: &RoutePair,
    departure_date: NaiveDate,
    collection_date: NaiveDate,
) -> Result<TripRecord, SweepError> {
    let trip_id = trip
        .find(TRIP_ID_SELECTOR)
        .await?
        .attr("id")
        .await?
        .ok_or_else(|| SessionError::NotFound("trip offer id".to_string()))?;
    debug!("processing trip {trip_id}");

    let route_description = trip
        .find(".trip-route")
        .await?
        .text()
        .await?
        .trim()
        .replace('\n', " -> ");
    let fare_class = text_of(trip, "[data-testid='tripClassNameOutput']").await?;
    let departure_time =
        text_of(trip, "[data-testid='tripDepartureTimeOutput'] .trip-time-number").await?;
    let arrival_time =
        text_of(trip, "[data-testid='triparrivalTimeOutput'] .trip-time-number").await?;
    let next_day = trip
        .find("[data-testid='triparrivalTimeOutput']")
        .await?
        .text()
        .await?
        .contains("+1");
    // .trip-durantion is the site's own typo
    let duration = text_of(trip, "[data-testid='tripDurationOutput'] .trip-durantion").await?;
    let promotional_fare = text_of(trip, "[data-testid='tripPriceOutput']").await?;
    let original_fare = optional_text(trip, ".old-value", "N/A").await;
    let boarding_point = text_of(trip, ".boarding__location").await?;
    let connection_info = optional_text(trip, ".details__connections", "No connection").await;

    let occupancy = read_occupancy(session, &trip_id).await;

    Ok(TripRecord {
        origin: route.origin.display_name.clone(),
        destination: route.destination.display_name.clone(),
        route_description,
        fare_class,
        schedule_window: format!(
            "{departure_time} - {arrival_time}{}",
            if next_day { " (+1)" } else { "" }
        ),
        duration,
        original_fare,
        promotional_fare,
        connection_info,
        boarding_point,
        available_seats: occupancy.available_seats,
        total_seats: occupancy.total_seats,
        load_factor: occupancy.load_factor,
        query_date: format_date(departure_date),
        collection_date: format_date(collection_date),
    })
}

async fn text_of<E: Elem>(scope: &E, css: &str) -> Result<String, SessionError> {
    Ok(scope.find(css).await?.text().await?.trim().to_string())
}

async fn optional_text<E: Elem>(scope: &E, css: &str, fallback: &str) -> String {
    match scope.find(css).await {
        Ok(el) => match el.text().await {
            Ok(text) => text.trim().to_string(),
            Err(_) => fallback.to_string(),
        },
        Err(_) => fallback.to_string(),
    }
}

//
// ======================================================
// Occupancy reader
// ======================================================
//

/// Reveal the seat map of one offer, count seats, and collapse the reveal
/// again. The collapse runs no matter how the count went: the page is shared
/// by every offer of the date and must not leak the expanded state into the
/// next iteration.
pub async fn read_occupancy<S: Session>(session: &S, trip_id: &str) -> OccupancySnapshot {
    let snapshot = reveal_and_count(session, trip_id).await;
    collapse_offer(session, trip_id).await;
    match snapshot {
        Ok(snap) => {
            debug!(
                "occupancy for {trip_id}: {:?} of {:?} seats available",
                snap.available_seats, snap.total_seats
            );
            snap
        }
        Err(e) => {
            warn!("occupancy read failed for {trip_id}: {e}");
            OccupancySnapshot::empty()
        }
    }
}

async fn reveal_and_count<S: Session>(
    session: &S,
    trip_id: &str,
) -> Result<OccupancySnapshot, SessionError> {
    session
        .find(&format!("#{trip_id} [data-testid='selectTripAction']"))
        .await?
        .click()
        .await?;

    let seat_css = format!("#{trip_id} .vehicle-item");
    if !session.wait_for(&seat_css, SEAT_WAIT).await {
        return Err(SessionError::Timeout(seat_css));
    }

    let seats = session.find_all(&seat_css).await?;
    let mut total = 0u32;
    let mut occupied = 0u32;
    for seat in &seats {
        let class = seat.attr("class").await?.unwrap_or_default();
        // item-empty marks aisles and gaps, not seats
        if class.contains("item-empty") {
            continue;
        }
        total += 1;
        if class.contains("item-ecommerce-blocked") {
            occupied += 1;
        }
    }
    Ok(OccupancySnapshot::from_counts(total, occupied))
}

async fn collapse_offer<S: Session>(session: &S, trip_id: &str) {
    if let Ok(button) = session.find(&format!("#{trip_id} .btn-outline")).await {
        let _ = button.click().await;
        tokio::time::sleep(Duration::from_secs(1)).await;
    }
}

//
// ======================================================
// Snapshot scheduler
// ======================================================
//

/// Drive the whole sweep: resolve, probe, then one extraction per horizon
/// date, tagging every record with route and dates. A failed route skips to
/// the next route; a failed date skips to the next date.
pub async fn run_sweep<S: Session>(
    session: &S,
    index: &CityIndex,
    config: &SweepConfig,
) -> Vec<TripRecord> {
    let mut all_records = Vec::new();

    for (origin_name, destination_name) in &config.pairs {
        info!("=== processing route {origin_name} -> {destination_name} ===");

        let route = match resolve_route(index, origin_name, destination_name) {
            Ok(route) => route,
            Err(e) => {
                warn!("skipping route {origin_name} -> {destination_name}: {e}");
                continue;
            }
        };

        let resolved = match probe_combinations(
            session,
            &route.origin.canonical_slug,
            &route.destination.canonical_slug,
            config.base_date,
        )
        .await
        {
            Ok(pair) => pair,
            Err(e) => {
                warn!("skipping route {origin_name} -> {destination_name}: {e}");
                continue;
            }
        };

        for days in &config.days_ahead {
            let target_date = config.base_date + chrono::Duration::days(*days);
            info!(
                "collecting {origin_name} -> {destination_name} for {}",
                format_date(target_date)
            );
            match extract_trips(session, &route, &resolved, target_date, config.collection_date)
                .await
            {
                Ok(records) => all_records.extend(records),
                Err(e) => warn!("skipping date {}: {e}", format_date(target_date)),
            }
        }
    }

    all_records
}

fn resolve_route(
    index: &CityIndex,
    origin_name: &str,
    destination_name: &str,
) -> Result<RoutePair, SweepError> {
    let origin = index
        .resolve(origin_name)
        .ok_or_else(|| SweepError::CityNotFound(origin_name.to_string()))?
        .clone();
    let destination = index
        .resolve(destination_name)
        .ok_or_else(|| SweepError::CityNotFound(destination_name.to_string()))?
        .clone();
    Ok(RoutePair {
        origin,
        destination,
    })
}

//
// ======================================================
// Tests
// ======================================================
//
