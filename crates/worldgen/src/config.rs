//! Load-time generation parameters.
//!
//! The module-level constants are the compiled-in defaults. [`WorldGenConfig`]
//! bundles them into one serde-friendly resource so a host can override any
//! subset from JSON; every missing field falls back to its default.

use std::collections::BTreeMap;
use std::path::Path;

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::grid::TileType;

pub const MAP_WIDTH: usize = 1024;
pub const MAP_HEIGHT: usize = 1024;
pub const TILE_SIZE: f32 = 2.0;
pub const CHUNK_SIZE: usize = 32;
pub const RENDER_DISTANCE: f32 = 30.0;
pub const DEFAULT_SEED: u64 = 42;

pub const HEIGHT_SCALE: f32 = 6.0;
pub const WATER_LEVEL: f32 = -1.0;
pub const TERRAIN_THRESHOLD: f32 = 2.5;
pub const ROCK_THRESHOLD: f32 = 5.0;

/// The coarse lattice is always this size, independent of the map size.
pub const LATTICE_SIZE: usize = 128;
pub const LATTICE_SCALE: f64 = 0.08;
pub const LATTICE_OCTAVES: u32 = 4;
pub const LATTICE_PERSISTENCE: f64 = 0.5;
pub const LATTICE_LACUNARITY: f64 = 2.0;

pub const TILE_LEVEL_THRESHOLD: f32 = 0.5;
pub const NORMALIZATION_PASSES: u32 = 3;
pub const NORMALIZATION_BLEND: f32 = 0.3;

pub const CITY_MIN_SPACING: f32 = 100.0;
pub const CITY_MAX_ATTEMPTS: u32 = 100;
pub const CITY_WATER_TOLERANCE: u32 = 5;
pub const CITY_ROCK_TOLERANCE: u32 = 5;
pub const CITY_STEEP_HEIGHT: f32 = 8.0;

pub const ASTAR_MAX_ITERATIONS: u32 = 10_000;

// ---------------------------------------------------------------------------
// Shared value types
// ---------------------------------------------------------------------------

/// Inclusive `[min, max]` range used for randomized parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds<T> {
    pub min: T,
    pub max: T,
}

impl<T> Bounds<T> {
    pub const fn new(min: T, max: T) -> Self {
        Self { min, max }
    }
}

impl<T: PartialOrd> Bounds<T> {
    pub fn is_ordered(&self) -> bool {
        self.min <= self.max
    }
}

/// Placement rules and render metadata for one decorative object type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObjectConfig {
    pub allowed_terrain: Vec<TileType>,
    pub spawn_probability: f32,
    pub scale: f32,
    pub height: f32,
    pub texture_ref: String,
    pub pixel_art: bool,
}

impl ObjectConfig {
    pub fn allows(&self, tile_type: TileType) -> bool {
        self.allowed_terrain.contains(&tile_type)
    }

    /// Default tree: grass/terrain only, 5% of valid tiles per selected chunk.
    pub fn tree() -> Self {
        Self {
            allowed_terrain: vec![TileType::Grass, TileType::Terrain],
            spawn_probability: 0.05,
            scale: 3.0,
            height: 4.0,
            texture_ref: "tree".to_string(),
            pixel_art: true,
        }
    }
}

// ---------------------------------------------------------------------------
// Per-concern parameter tables
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TerrainParams {
    pub height_scale: f32,
    pub water_level: f32,
    pub terrain_threshold: f32,
    pub rock_threshold: f32,
    pub lattice_size: usize,
    pub lattice_scale: f64,
    pub lattice_octaves: u32,
    pub persistence: f64,
    pub lacunarity: f64,
    pub mountain_count: Bounds<u32>,
    pub mountain_height: Bounds<f64>,
    pub mountain_radius: Bounds<f64>,
    pub mountain_steepness: f64,
    /// A mountain only overwrites a lattice cell when it beats it by this much.
    pub mountain_raise_margin: f64,
    pub shape_noise_scale: f64,
    pub ridge_noise_scale: f64,
    pub ridge_amplitude: f64,
    pub detail_scale: f64,
    pub detail_amplitude: f64,
}

impl Default for TerrainParams {
    fn default() -> Self {
        Self {
            height_scale: HEIGHT_SCALE,
            water_level: WATER_LEVEL,
            terrain_threshold: TERRAIN_THRESHOLD,
            rock_threshold: ROCK_THRESHOLD,
            lattice_size: LATTICE_SIZE,
            lattice_scale: LATTICE_SCALE,
            lattice_octaves: LATTICE_OCTAVES,
            persistence: LATTICE_PERSISTENCE,
            lacunarity: LATTICE_LACUNARITY,
            mountain_count: Bounds::new(8, 16),
            mountain_height: Bounds::new(3.0, 5.5),
            mountain_radius: Bounds::new(10.0, 20.0),
            mountain_steepness: 3.0,
            mountain_raise_margin: 1.0,
            shape_noise_scale: 0.3,
            ridge_noise_scale: 0.5,
            ridge_amplitude: 0.3,
            detail_scale: 0.2,
            detail_amplitude: 0.8,
        }
    }
}

/// Movement rules for one tile type.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TileRule {
    pub speed_multiplier: f32,
    pub walkable: bool,
}

impl Default for TileRule {
    fn default() -> Self {
        Self {
            speed_multiplier: 1.0,
            walkable: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TileRules {
    pub rules: BTreeMap<TileType, TileRule>,
}

impl TileRules {
    /// Rule for `tile_type`, or the neutral rule when the table omits it.
    pub fn get(&self, tile_type: TileType) -> TileRule {
        self.rules.get(&tile_type).copied().unwrap_or_default()
    }
}

impl Default for TileRules {
    fn default() -> Self {
        let walk = |speed_multiplier| TileRule {
            speed_multiplier,
            walkable: true,
        };
        let rules = BTreeMap::from([
            (TileType::Terrain, walk(1.0)),
            (TileType::Water, walk(0.5)),
            (TileType::Road, walk(1.5)),
            (TileType::Rock, walk(0.7)),
            (TileType::Grass, walk(0.9)),
            (TileType::City, walk(1.2)),
            (TileType::CityRoad, walk(1.5)),
            (
                TileType::House,
                TileRule {
                    speed_multiplier: 0.0,
                    walkable: false,
                },
            ),
        ]);
        Self { rules }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NormalizationParams {
    /// Adjacent tiles whose types share a group get their heights relaxed.
    /// Rock belongs to no group so outcrops keep their cliffs.
    pub level_groups: Vec<Vec<TileType>>,
    pub threshold: f32,
    pub passes: u32,
    pub blend: f32,
}

impl Default for NormalizationParams {
    fn default() -> Self {
        Self {
            level_groups: vec![
                vec![TileType::Water, TileType::Grass],
                vec![TileType::Grass, TileType::Terrain],
                vec![TileType::Road, TileType::Terrain],
                vec![TileType::Road, TileType::Grass],
            ],
            threshold: TILE_LEVEL_THRESHOLD,
            passes: NORMALIZATION_PASSES,
            blend: NORMALIZATION_BLEND,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CitySizeCount {
    pub size: u32,
    pub count: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CityParams {
    pub enabled: bool,
    pub sizes: Vec<CitySizeCount>,
    pub min_spacing: f32,
    pub max_attempts: u32,
    pub water_tolerance: u32,
    pub rock_tolerance: u32,
    /// Tiles with |height| above this count as steep.
    pub steep_height: f32,
}

impl Default for CityParams {
    fn default() -> Self {
        Self {
            enabled: true,
            sizes: vec![
                CitySizeCount { size: 16, count: 3 },
                CitySizeCount { size: 32, count: 2 },
                CitySizeCount { size: 64, count: 2 },
                CitySizeCount { size: 128, count: 1 },
            ],
            min_spacing: CITY_MIN_SPACING,
            max_attempts: CITY_MAX_ATTEMPTS,
            water_tolerance: CITY_WATER_TOLERANCE,
            rock_tolerance: CITY_ROCK_TOLERANCE,
            steep_height: CITY_STEEP_HEIGHT,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CityRoadParams {
    pub min_segment_length: f64,
    /// Collisions past this fraction of a segment become T-junctions.
    pub junction_cutoff: f64,
    pub branch_probability: f64,
    pub extend_probability: f64,
    pub max_branch_generation: u32,
    pub max_extend_generation: u32,
    /// Major segments younger than this get a second, parallel tile.
    pub wide_major_generations: u32,
}

impl Default for CityRoadParams {
    fn default() -> Self {
        Self {
            min_segment_length: 2.0,
            junction_cutoff: 0.8,
            branch_probability: 0.8,
            extend_probability: 0.5,
            max_branch_generation: 3,
            max_extend_generation: 2,
            wide_major_generations: 2,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RoadParams {
    pub enabled: bool,
    pub max_iterations: u32,
    pub destination_count: u32,
    pub attempts_per_destination: u32,
    pub destination_spacing: f32,
    pub extra_link_distance: f32,
    pub extra_link_probability: f64,
    pub wiggle_probability: f64,
    /// Only paths longer than this get wiggle jitter.
    pub wiggle_min_path_len: usize,
    pub trunk_width: Bounds<u32>,
    pub branch_width: Bounds<u32>,
    pub extra_width: Bounds<u32>,
    pub cost_open: f32,
    pub cost_road: f32,
    pub cost_obstacle: f32,
    pub cost_other: f32,
}

impl Default for RoadParams {
    fn default() -> Self {
        Self {
            enabled: true,
            max_iterations: ASTAR_MAX_ITERATIONS,
            destination_count: 35,
            attempts_per_destination: 30,
            destination_spacing: 30.0,
            extra_link_distance: 200.0,
            extra_link_probability: 0.5,
            wiggle_probability: 0.3,
            wiggle_min_path_len: 5,
            trunk_width: Bounds::new(2, 4),
            branch_width: Bounds::new(1, 4),
            extra_width: Bounds::new(1, 3),
            cost_open: 1.0,
            cost_road: 0.3,
            cost_obstacle: 100.0,
            cost_other: 5.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RiverParams {
    pub enabled: bool,
    pub sample_stride: usize,
    pub body_suppress_radius: i32,
    pub min_distance: f32,
    pub max_distance: f32,
    pub link_probability: f64,
    pub arrive_distance: f32,
    pub widen_probability: f64,
    pub bed_height: f32,
    pub max_iterations: u32,
}

impl Default for RiverParams {
    fn default() -> Self {
        Self {
            enabled: true,
            sample_stride: 32,
            body_suppress_radius: 16,
            min_distance: 20.0,
            max_distance: 200.0,
            link_probability: 0.4,
            arrive_distance: 5.0,
            widen_probability: 0.6,
            bed_height: -1.0,
            max_iterations: 20_000,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HouseParams {
    pub enabled: bool,
    pub min_block_tiles: usize,
    pub courtyard_probability: f64,
    pub max_footprint: u32,
    pub min_footprint: u32,
    pub height: Bounds<f32>,
}

impl Default for HouseParams {
    fn default() -> Self {
        Self {
            enabled: true,
            min_block_tiles: 4,
            courtyard_probability: 0.1,
            max_footprint: 8,
            min_footprint: 2,
            height: Bounds::new(1.0, 3.0),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TreeParams {
    pub enabled: bool,
    pub object: ObjectConfig,
    pub chunk_selection_rate: f64,
    /// Sub-tile jitter, applied as +/- this many tiles.
    pub jitter: f32,
    pub road_stride: usize,
    pub road_distance: i32,
    pub road_probability: f64,
    pub city_attempts_per_edge: u32,
    pub city_buffer: f32,
    pub city_max_distance: f32,
    pub min_spacing: f32,
}

impl Default for TreeParams {
    fn default() -> Self {
        Self {
            enabled: true,
            object: ObjectConfig::tree(),
            chunk_selection_rate: 0.3,
            jitter: 0.3,
            road_stride: 4,
            road_distance: 3,
            road_probability: 0.3,
            city_attempts_per_edge: 10,
            city_buffer: 2.0,
            city_max_distance: 8.0,
            min_spacing: 1.5,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StreamingParams {
    /// Shared by render batching and tree scatter sampling.
    pub chunk_size: usize,
    pub render_distance: f32,
}

impl Default for StreamingParams {
    fn default() -> Self {
        Self {
            chunk_size: CHUNK_SIZE,
            render_distance: RENDER_DISTANCE,
        }
    }
}

// ---------------------------------------------------------------------------
// WorldGenConfig resource
// ---------------------------------------------------------------------------

/// Every knob the generator reads. Treated as immutable once generation starts.
#[derive(Resource, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorldGenConfig {
    pub seed: u64,
    pub width: usize,
    pub height: usize,
    pub tile_size: f32,
    pub terrain: TerrainParams,
    pub tile_rules: TileRules,
    pub normalization: NormalizationParams,
    pub cities: CityParams,
    pub city_roads: CityRoadParams,
    pub roads: RoadParams,
    pub rivers: RiverParams,
    pub houses: HouseParams,
    pub trees: TreeParams,
    pub streaming: StreamingParams,
}

impl Default for WorldGenConfig {
    fn default() -> Self {
        Self {
            seed: DEFAULT_SEED,
            width: MAP_WIDTH,
            height: MAP_HEIGHT,
            tile_size: TILE_SIZE,
            terrain: TerrainParams::default(),
            tile_rules: TileRules::default(),
            normalization: NormalizationParams::default(),
            cities: CityParams::default(),
            city_roads: CityRoadParams::default(),
            roads: RoadParams::default(),
            rivers: RiverParams::default(),
            houses: HouseParams::default(),
            trees: TreeParams::default(),
            streaming: StreamingParams::default(),
        }
    }
}

impl WorldGenConfig {
    /// Config for a `width x height` map with everything after terrain
    /// synthesis switched off.
    pub fn terrain_only(width: usize, height: usize, seed: u64) -> Self {
        let mut config = Self {
            seed,
            width,
            height,
            ..Self::default()
        };
        config.rivers.enabled = false;
        config.cities.enabled = false;
        config.roads.enabled = false;
        config.houses.enabled = false;
        config.trees.enabled = false;
        config
    }

    /// Parse a (possibly partial) JSON document and validate the result.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    pub fn to_json_pretty(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.width == 0 || self.height == 0 {
            return Err(ConfigError::invalid("map width and height must be positive"));
        }
        if self.width > i32::MAX as usize || self.height > i32::MAX as usize {
            return Err(ConfigError::invalid("map dimensions exceed i32 range"));
        }
        if !(self.tile_size > 0.0) {
            return Err(ConfigError::invalid("tile_size must be positive"));
        }

        let t = &self.terrain;
        if t.lattice_size < 2 {
            return Err(ConfigError::invalid("terrain.lattice_size must be at least 2"));
        }
        if !(t.water_level < t.terrain_threshold && t.terrain_threshold < t.rock_threshold) {
            return Err(ConfigError::invalid(
                "terrain thresholds must satisfy water_level < terrain_threshold < rock_threshold",
            ));
        }
        check_bounds("terrain.mountain_count", &t.mountain_count)?;
        check_bounds("terrain.mountain_height", &t.mountain_height)?;
        check_bounds("terrain.mountain_radius", &t.mountain_radius)?;

        let n = &self.normalization;
        if !(0.0..=1.0).contains(&n.blend) {
            return Err(ConfigError::invalid("normalization.blend must be within [0, 1]"));
        }

        if self.cities.enabled
            && self
                .cities
                .sizes
                .iter()
                .any(|entry| entry.size == 0 && entry.count > 0)
        {
            return Err(ConfigError::invalid("cities.sizes contains a zero size"));
        }

        let r = &self.roads;
        check_probability("roads.extra_link_probability", r.extra_link_probability)?;
        check_probability("roads.wiggle_probability", r.wiggle_probability)?;
        check_bounds("roads.trunk_width", &r.trunk_width)?;
        check_bounds("roads.branch_width", &r.branch_width)?;
        check_bounds("roads.extra_width", &r.extra_width)?;
        if r.trunk_width.min == 0 || r.branch_width.min == 0 || r.extra_width.min == 0 {
            return Err(ConfigError::invalid("road widths must be at least 1"));
        }

        let c = &self.city_roads;
        check_probability("city_roads.branch_probability", c.branch_probability)?;
        check_probability("city_roads.extend_probability", c.extend_probability)?;

        check_probability("rivers.link_probability", self.rivers.link_probability)?;
        check_probability("rivers.widen_probability", self.rivers.widen_probability)?;
        if self.rivers.sample_stride == 0 {
            return Err(ConfigError::invalid("rivers.sample_stride must be positive"));
        }

        let h = &self.houses;
        check_probability("houses.courtyard_probability", h.courtyard_probability)?;
        check_bounds("houses.height", &h.height)?;
        if h.min_footprint == 0 || h.min_footprint > h.max_footprint {
            return Err(ConfigError::invalid(
                "houses footprint must satisfy 1 <= min_footprint <= max_footprint",
            ));
        }

        let tr = &self.trees;
        check_probability("trees.chunk_selection_rate", tr.chunk_selection_rate)?;
        check_probability("trees.road_probability", tr.road_probability)?;
        check_probability(
            "trees.object.spawn_probability",
            tr.object.spawn_probability as f64,
        )?;
        if tr.road_stride == 0 {
            return Err(ConfigError::invalid("trees.road_stride must be positive"));
        }
        if tr.city_buffer > tr.city_max_distance {
            return Err(ConfigError::invalid(
                "trees.city_buffer must not exceed trees.city_max_distance",
            ));
        }

        if self.streaming.chunk_size == 0 {
            return Err(ConfigError::invalid("streaming.chunk_size must be positive"));
        }
        Ok(())
    }
}

fn check_probability(name: &str, p: f64) -> Result<(), ConfigError> {
    if (0.0..=1.0).contains(&p) {
        Ok(())
    } else {
        Err(ConfigError::Invalid(format!(
            "{name} must be a probability within [0, 1], got {p}"
        )))
    }
}

fn check_bounds<T: PartialOrd + std::fmt::Debug>(
    name: &str,
    bounds: &Bounds<T>,
) -> Result<(), ConfigError> {
    if bounds.is_ordered() {
        Ok(())
    } else {
        Err(ConfigError::Invalid(format!(
            "{name} has min {:?} above max {:?}",
            bounds.min, bounds.max
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(WorldGenConfig::default().validate().is_ok());
    }

    #[test]
    fn test_partial_json_falls_back_to_defaults() {
        let config = WorldGenConfig::from_json_str(r#"{ "seed": 7, "width": 64, "height": 48 }"#)
            .expect("partial config should parse");
        assert_eq!(config.seed, 7);
        assert_eq!(config.width, 64);
        assert_eq!(config.height, 48);
        assert_eq!(config.terrain, TerrainParams::default());
        assert_eq!(config.cities.sizes.len(), 4);
    }

    #[test]
    fn test_nested_partial_json() {
        let config =
            WorldGenConfig::from_json_str(r#"{ "houses": { "height": { "min": 2.0, "max": 5.0 } } }"#)
                .expect("nested partial config should parse");
        assert_eq!(config.houses.height, Bounds::new(2.0, 5.0));
        assert_eq!(config.houses.max_footprint, 8);
    }

    #[test]
    fn test_json_roundtrip_preserves_config() {
        let config = WorldGenConfig::terrain_only(32, 32, 99);
        let json = config.to_json_pretty().expect("serialize");
        let parsed = WorldGenConfig::from_json_str(&json).expect("parse");
        assert_eq!(parsed, config);
    }

    #[test]
    fn test_tile_rule_keys_use_snake_case() {
        let json = serde_json::to_string(&TileRules::default()).expect("serialize");
        assert!(json.contains("\"city_road\""), "got: {json}");
    }

    #[test]
    fn test_malformed_json_is_parse_error() {
        let err = WorldGenConfig::from_json_str("{ not json").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)), "got: {err}");
    }

    #[test]
    fn test_zero_width_rejected() {
        let err = WorldGenConfig::from_json_str(r#"{ "width": 0 }"#).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn test_inverted_bounds_rejected() {
        let mut config = WorldGenConfig::default();
        config.houses.height = Bounds::new(4.0, 1.0);
        let msg = config.validate().unwrap_err().to_string();
        assert!(msg.contains("houses.height"), "got: {msg}");
    }

    #[test]
    fn test_probability_out_of_range_rejected() {
        let mut config = WorldGenConfig::default();
        config.trees.chunk_selection_rate = 1.5;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_unordered_thresholds_rejected() {
        let mut config = WorldGenConfig::default();
        config.terrain.rock_threshold = 1.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_missing_tile_rule_is_neutral() {
        let rules = TileRules {
            rules: BTreeMap::new(),
        };
        assert_eq!(rules.get(TileType::Grass), TileRule::default());
    }

    #[test]
    fn test_house_not_walkable_by_default() {
        let rules = TileRules::default();
        assert!(!rules.get(TileType::House).walkable);
        assert!(rules.get(TileType::Road).walkable);
        assert!((rules.get(TileType::Road).speed_multiplier - 1.5).abs() < f32::EPSILON);
    }

    #[test]
    fn test_terrain_only_disables_stages() {
        let config = WorldGenConfig::terrain_only(32, 32, 1);
        assert!(!config.cities.enabled);
        assert!(!config.roads.enabled);
        assert!(!config.rivers.enabled);
        assert!(!config.houses.enabled);
        assert!(!config.trees.enabled);
    }
}
