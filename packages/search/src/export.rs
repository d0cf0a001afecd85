//! Downloadable result files.
//!
//! The payload is a pretty-printed JSON array of [`ExportRow`]s in result
//! order. The filename is a pure function of the place label, the
//! category keys, the radius and the row count.

use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use alertx_category_models::CategoryKey;
use alertx_search_models::{ExportRow, SearchRadius, SearchResult};
use regex::Regex;
use thiserror::Error;

/// Stand-in for a place label with no usable characters.
pub const FALLBACK_PLACE: &str = "place";

static SEPARATOR_RUN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^a-z0-9]+").expect("valid regex"));

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("No results to download")]
    NothingToExport,

    #[error("Failed to serialize results: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("Failed to write export file: {0}")]
    Io(#[from] std::io::Error),
}

/// A rendered export, ready to be saved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportFile {
    pub filename: String,
    pub contents: String,
}

impl ExportFile {
    /// Writes the file into `dir`, returning its path.
    ///
    /// # Errors
    ///
    /// Returns [`ExportError::Io`] if the file cannot be written.
    pub fn write_to(&self, dir: &Path) -> Result<PathBuf, ExportError> {
        let path = dir.join(&self.filename);
        std::fs::write(&path, &self.contents)?;
        log::info!("Wrote {}", path.display());
        Ok(path)
    }

    /// Parses the payload back into rows.
    ///
    /// # Errors
    ///
    /// Returns [`ExportError::Serialize`] if the contents are not an export
    /// payload.
    pub fn rows(&self) -> Result<Vec<ExportRow>, ExportError> {
        Ok(serde_json::from_str(&self.contents)?)
    }
}

/// Renders `results` for download.
///
/// # Errors
///
/// * [`ExportError::NothingToExport`] if `results` is empty
/// * [`ExportError::Serialize`] if serialization fails
pub fn export(
    results: &[SearchResult],
    place_label: &str,
    categories: &[CategoryKey],
    radius: SearchRadius,
) -> Result<ExportFile, ExportError> {
    if results.is_empty() {
        return Err(ExportError::NothingToExport);
    }

    let rows: Vec<ExportRow> = results.iter().map(ExportRow::from).collect();
    let contents = serde_json::to_string_pretty(&rows)?;

    Ok(ExportFile {
        filename: export_filename(place_label, categories, radius, rows.len()),
        contents,
    })
}

/// `{place}_{categories}_{km}km_{count}.json`
#[must_use]
pub fn export_filename(
    place_label: &str,
    categories: &[CategoryKey],
    radius: SearchRadius,
    count: usize,
) -> String {
    let cats = categories
        .iter()
        .map(AsRef::<str>::as_ref)
        .collect::<Vec<_>>()
        .join("_");

    format!(
        "{}_{cats}_{}km_{count}.json",
        place_slug(place_label),
        radius.kilometers()
    )
}

/// Lower-cases `label` and collapses every run of characters outside
/// `[a-z0-9]` to a single `_`, trimming separators at both ends.
#[must_use]
pub fn place_slug(label: &str) -> String {
    let lower = label.to_lowercase();
    let slug = SEPARATOR_RUN.replace_all(&lower, "_");
    let slug = slug.trim_matches('_');

    if slug.is_empty() {
        FALLBACK_PLACE.to_string()
    } else {
        slug.to_string()
    }
}

#[cfg(test)]
mod tests {
    use alertx_geo_models::Coordinate;

    use super::*;

    fn results() -> Vec<SearchResult> {
        let at = Coordinate::new(13.0418, 80.2341).unwrap();
        vec![
            SearchResult::new("T Nagar Police Station", CategoryKey::Police, at, 0.82),
            SearchResult::new("Unnamed", CategoryKey::FireStation, at, 2.5),
        ]
    }

    #[test]
    fn slugs() {
        assert_eq!(place_slug("T. Nagar, Chennai"), "t_nagar_chennai");
        assert_eq!(place_slug("  --Adyar--  "), "adyar");
        assert_eq!(place_slug("???"), "place");
        assert_eq!(place_slug(""), "place");
    }

    #[test]
    fn filename_is_deterministic() {
        let cats = [CategoryKey::Police, CategoryKey::FireStation];
        let a = export(&results(), "T. Nagar, Chennai", &cats, SearchRadius::Km10).unwrap();
        let b = export(&results(), "T. Nagar, Chennai", &cats, SearchRadius::Km10).unwrap();

        assert_eq!(a.filename, "t_nagar_chennai_police_fire_station_10km_2.json");
        assert_eq!(a, b);
    }

    #[test]
    fn empty_results_produce_no_file() {
        let err = export(&[], "Chennai", &[CategoryKey::Police], SearchRadius::Km5).unwrap_err();
        assert!(matches!(err, ExportError::NothingToExport));
        assert_eq!(err.to_string(), "No results to download");
    }

    #[test]
    fn payload_keeps_order_and_projection() {
        let file = export(&results(), "Chennai", &[CategoryKey::Police], SearchRadius::Km5).unwrap();
        let rows = file.rows().unwrap();

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].name, "T Nagar Police Station");
        assert_eq!(rows[0].category, CategoryKey::Police.display_name());
        assert!((rows[0].lat - 13.0418).abs() < f64::EPSILON);
        assert!((rows[1].distance_km - 2.5).abs() < f64::EPSILON);
        assert!(file.contents.starts_with("[\n  {"));
    }

    #[test]
    fn writes_into_directory() {
        let dir = std::env::temp_dir().join(format!("alertx-export-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();

        let file = export(&results(), "Chennai", &[CategoryKey::Police], SearchRadius::Km25).unwrap();
        let path = file.write_to(&dir).unwrap();

        assert_eq!(std::fs::read_to_string(&path).unwrap(), file.contents);
        std::fs::remove_dir_all(&dir).unwrap();
    }
}
