//! Matcher configuration: sphere radius, station region, ranking strategy, spatial index and
//! data directory. Built with [`MatcherConfig::builder`] or read from a JSON file.

use crate::distance::haversine::EARTH_RADIUS_KM;
use crate::error::MatchError;
use crate::ranking::{FrameRanking, InProcessRanking, RankingStrategy};
use crate::types::station::RegionFilter;
use bon::Builder;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Which [`RankingStrategy`] a matcher uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RankingMode {
    /// Ranking expression, sort and `limit(1)` evaluated by polars.
    #[default]
    Frame,
    /// Eligible rows materialized and ranked with the pure distance functions.
    InProcess,
}

impl RankingMode {
    pub fn strategy(self, radius: f64) -> Arc<dyn RankingStrategy> {
        match self {
            RankingMode::Frame => Arc::new(FrameRanking::new(radius)),
            RankingMode::InProcess => Arc::new(InProcessRanking::new(radius)),
        }
    }
}

/// # Examples
///
/// ```
/// use weather_match::{MatcherConfig, RankingMode, RegionFilter};
///
/// let config = MatcherConfig::builder()
///     .region(RegionFilter::country("中国"))
///     .ranking(RankingMode::InProcess)
///     .spatial_index(true)
///     .build();
/// assert_eq!(config.earth_radius, 6371.0);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Builder)]
#[serde(default)]
pub struct MatcherConfig {
    /// Sphere radius used for distances; the result is in the same unit.
    #[builder(default = EARTH_RADIUS_KM)]
    pub earth_radius: f64,
    /// Region stations must lie in. Fields left out of a JSON `region` object take their
    /// [`RegionFilter::default`] values, so `{}` and `{"province": "江苏"}` both keep the
    /// country at [`crate::DEFAULT_COUNTRY`]. Set `"country": null` to search every country.
    #[builder(default)]
    pub region: RegionFilter,
    #[builder(default)]
    pub ranking: RankingMode,
    /// Build the R-tree over station geometry. Only in-process ranking reads it.
    #[builder(default)]
    pub spatial_index: bool,
    /// Directory holding the station and observation files. Defaults to the platform data dir.
    pub data_dir: Option<PathBuf>,
}

impl Default for MatcherConfig {
    fn default() -> Self {
        Self::builder().build()
    }
}

impl MatcherConfig {
    /// Reads a JSON config. Missing fields take their defaults.
    pub fn from_json_file(path: &Path) -> Result<Self, MatchError> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| MatchError::ConfigRead(path.to_path_buf(), e))?;
        let config: MatcherConfig = serde_json::from_str(&text)
            .map_err(|e| MatchError::ConfigParse(path.to_path_buf(), e))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), MatchError> {
        if !self.earth_radius.is_finite() || self.earth_radius <= 0.0 {
            return Err(MatchError::InvalidConfig(format!(
                "earth_radius must be a positive finite number, got {}",
                self.earth_radius
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = MatcherConfig::default();
        assert_eq!(config.earth_radius, EARTH_RADIUS_KM);
        assert_eq!(config.region, RegionFilter::default());
        assert_eq!(config.ranking, RankingMode::Frame);
        assert!(!config.spatial_index);
        assert!(config.data_dir.is_none());
    }

    #[test]
    fn test_invalid_radius_is_rejected() {
        for radius in [0.0, -1.0, f64::NAN, f64::INFINITY] {
            let config = MatcherConfig::builder().earth_radius(radius).build();
            assert!(
                matches!(config.validate(), Err(MatchError::InvalidConfig(_))),
                "radius {radius} should be rejected"
            );
        }
    }

    #[test]
    fn test_from_json_file() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("config.json");
        std::fs::write(
            &path,
            r#"{
                "earth_radius": 3958.8,
                "region": { "country": "中国", "province": "江苏" },
                "ranking": "in_process",
                "spatial_index": true,
                "data_dir": "/var/lib/weather"
            }"#,
        )?;

        let config = MatcherConfig::from_json_file(&path)?;
        assert_eq!(config.earth_radius, 3958.8);
        assert_eq!(config.region.province.as_deref(), Some("江苏"));
        assert_eq!(config.region.city, None);
        assert_eq!(config.ranking, RankingMode::InProcess);
        assert!(config.spatial_index);
        assert_eq!(config.data_dir, Some(PathBuf::from("/var/lib/weather")));
        Ok(())
    }

    #[test]
    fn test_partial_json_uses_defaults() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{ "ranking": "frame" }"#)?;

        let config = MatcherConfig::from_json_file(&path)?;
        assert_eq!(config, MatcherConfig::default());
        Ok(())
    }

    #[test]
    fn test_partial_region_keeps_default_country() -> Result<(), serde_json::Error> {
        let config: MatcherConfig = serde_json::from_str(r#"{ "region": {} }"#)?;
        assert_eq!(config.region, RegionFilter::default());

        let config: MatcherConfig =
            serde_json::from_str(r#"{ "region": { "province": "江苏" } }"#)?;
        assert_eq!(config.region.country.as_deref(), Some(crate::DEFAULT_COUNTRY));
        assert_eq!(config.region.province.as_deref(), Some("江苏"));

        let config: MatcherConfig = serde_json::from_str(r#"{ "region": { "country": null } }"#)?;
        assert_eq!(config.region, RegionFilter::any());
        Ok(())
    }

    #[test]
    fn test_config_errors() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempfile::tempdir()?;
        let missing = dir.path().join("missing.json");
        assert!(matches!(
            MatcherConfig::from_json_file(&missing),
            Err(MatchError::ConfigRead(..))
        ));

        let broken = dir.path().join("broken.json");
        std::fs::write(&broken, "{ not json")?;
        assert!(matches!(
            MatcherConfig::from_json_file(&broken),
            Err(MatchError::ConfigParse(..))
        ));

        let negative = dir.path().join("negative.json");
        std::fs::write(&negative, r#"{ "earth_radius": -5 }"#)?;
        assert!(matches!(
            MatcherConfig::from_json_file(&negative),
            Err(MatchError::InvalidConfig(_))
        ));
        Ok(())
    }
}
