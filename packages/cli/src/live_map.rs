//! Interactive live map flow.
//!
//! Location, categories, radius and cap come from flags when given and
//! from `dialoguer` prompts otherwise. Results are printed as a table and
//! optionally written out as a JSON export.

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::{Duration, Instant};

use alertx_category_models::{CategoryGroup, CategoryKey};
use alertx_cli_utils::{IndicatifScan, MultiProgress, TerminalNotifier};
use alertx_geocoder::nominatim::NominatimClient;
use alertx_poi::overpass::OverpassClient;
use alertx_search::{InMemoryMap, LiveMapConfig, LiveMapSession, SessionProviders};
use alertx_search_models::{SearchRadius, SearchResult};
use dialoguer::{Confirm, Input, MultiSelect, Select};

/// How long to wait for place suggestions after the debounce fires.
const SUGGESTION_WAIT: Duration = Duration::from_secs(15);

/// Choices supplied on the command line.
pub struct Options {
    pub place: Option<String>,
    pub coordinate: Option<(f64, f64)>,
    pub categories: Vec<CategoryKey>,
    pub radius_km: Option<u32>,
    pub max_per_category: Option<u32>,
    pub export_dir: Option<PathBuf>,
}

/// Runs one search session.
///
/// User-facing failures (no location, no categories, provider errors) are
/// printed by the session's notifier and end the run with a failure exit
/// code.
///
/// # Errors
///
/// Returns an error if a provider cannot be built from the service
/// registry or a prompt fails.
#[allow(clippy::future_not_send)]
pub async fn run(multi: &MultiProgress, opts: Options) -> Result<ExitCode, Box<dyn std::error::Error>> {
    let config = LiveMapConfig::embedded();
    let geocoder = Arc::new(NominatimClient::from_registry()?);
    let providers = SessionProviders {
        forward: geocoder.clone(),
        reverse: geocoder,
        nearby: Arc::new(OverpassClient::from_registry()?),
        position: None,
    };

    let mut session = LiveMapSession::mount(InMemoryMap::new(), providers, &config)?
        .with_notifier(TerminalNotifier::new(multi))
        .with_scan_indicator(IndicatifScan::new(multi));

    // --- 1. Location ---
    log::info!("[1/5] Choosing location...");
    if !choose_location(&mut session, &opts).await? {
        return Ok(ExitCode::FAILURE);
    }
    println!("Searching around: {}", session.place().label());
    log::debug!("Resolved place: {:?}", session.place());

    // --- 2. Categories ---
    log::info!("[2/5] Selecting categories...");
    let categories = if opts.categories.is_empty() {
        prompt_categories()?
    } else {
        opts.categories.clone()
    };
    for key in categories {
        if !session.categories().contains(key) {
            session.toggle_category(key);
        }
    }

    // --- 3. Radius and cap ---
    log::info!("[3/5] Choosing radius and cap...");
    let radius = match opts.radius_km {
        Some(km) => SearchRadius::try_from(km.saturating_mul(1000))?,
        None => prompt_radius(config.search.default_radius)?,
    };
    session.set_radius(radius);

    let max = match opts.max_per_category {
        Some(max) => max,
        None => Input::new()
            .with_prompt("Max places per category")
            .default(config.search.default_max_per_category)
            .interact_text()?,
    };
    if session.set_max_per_category(max).is_err() {
        return Ok(ExitCode::FAILURE);
    }

    // --- 4. Search ---
    log::info!(
        "[4/5] Searching {} categories within {}...",
        session.categories().len(),
        session.radius()
    );
    let start = Instant::now();
    let Ok(count) = session.search().await else {
        return Ok(ExitCode::FAILURE);
    };
    println!();
    println!(
        "{count} places found in {:.1}s",
        start.elapsed().as_secs_f64()
    );
    print_results(&session.results());

    // --- 5. Export ---
    log::info!("[5/5] Export...");
    if count == 0 {
        return Ok(ExitCode::SUCCESS);
    }
    let dir = match opts.export_dir {
        Some(dir) => Some(dir),
        None => {
            if Confirm::new()
                .with_prompt("Download results as JSON?")
                .default(false)
                .interact()?
            {
                let dir: String = Input::new()
                    .with_prompt("Directory")
                    .default(".".to_string())
                    .interact_text()?;
                Some(PathBuf::from(dir))
            } else {
                None
            }
        }
    };
    if let Some(dir) = dir {
        let Ok(file) = session.export() else {
            return Ok(ExitCode::FAILURE);
        };
        let path = file.write_to(&dir)?;
        log::info!("Wrote {} results to {}", count, path.display());
        println!("Saved {}", path.display());
    }

    Ok(ExitCode::SUCCESS)
}

/// Resolves the session place from flags or prompts. Returns `false` if no
/// location could be chosen.
#[allow(clippy::future_not_send)]
async fn choose_location(
    session: &mut LiveMapSession<InMemoryMap>,
    opts: &Options,
) -> Result<bool, Box<dyn std::error::Error>> {
    if let Some((lat, lon)) = opts.coordinate {
        return Ok(session.set_coordinate(lat, lon).is_ok());
    }

    let (text, interactive) = match &opts.place {
        Some(place) => (place.clone(), false),
        None => (
            Input::<String>::new()
                .with_prompt("Place")
                .interact_text()?,
            true,
        ),
    };

    session.on_place_input(&text);
    let mut rx = session.subscribe_suggestions();
    let found = tokio::time::timeout(SUGGESTION_WAIT, rx.wait_for(|items| !items.is_empty()))
        .await
        .is_ok_and(|r| r.is_ok());
    if !found {
        log::warn!("No suggestions for {text:?} within {SUGGESTION_WAIT:?}");
        println!("No places found for {text:?}");
        return Ok(false);
    }

    let suggestions = session.suggestions();
    let index = if interactive {
        let labels: Vec<&str> = suggestions
            .iter()
            .map(|s| s.display_label.as_str())
            .collect();
        Select::new()
            .with_prompt("Which place?")
            .items(&labels)
            .default(0)
            .interact()?
    } else {
        0
    };

    Ok(session.select_suggestion(index).is_some())
}

fn prompt_categories() -> Result<Vec<CategoryKey>, dialoguer::Error> {
    let keys: Vec<CategoryKey> = CategoryGroup::all()
        .iter()
        .flat_map(|g| g.categories())
        .collect();
    let labels: Vec<String> = keys
        .iter()
        .map(|k| format!("{} {} ({})", k.emoji(), k.display_name(), k.group().title()))
        .collect();

    let picked = MultiSelect::new()
        .with_prompt("Categories (space=toggle, enter=confirm)")
        .items(&labels)
        .interact()?;

    Ok(picked.into_iter().map(|i| keys[i]).collect())
}

fn prompt_radius(default: SearchRadius) -> Result<SearchRadius, dialoguer::Error> {
    let all = SearchRadius::all();
    let labels: Vec<String> = all.iter().map(ToString::to_string).collect();
    let default_idx = all.iter().position(|r| *r == default).unwrap_or(0);

    let idx = Select::new()
        .with_prompt("Radius")
        .items(&labels)
        .default(default_idx)
        .interact()?;

    Ok(all[idx])
}

fn print_results(results: &[SearchResult]) {
    for r in results {
        println!(
            "  {} {:<40} {:<26} {:>7.2} km",
            r.category_emoji, r.name, r.category_display_name, r.distance_km
        );
    }
}
