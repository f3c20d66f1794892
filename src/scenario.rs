use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// シナリオメタデータ
#[derive(Debug, Deserialize, Serialize)]
pub struct ScenarioMeta {
    pub version: String,
    pub name: String,
    pub description: String,
}

/// シミュレーション設定
#[derive(Debug, Deserialize, Serialize)]
pub struct SimConfig {
    /// ラン開始時刻（RFC3339 文字列、表示用に保持）
    pub start: String,
    /// ステップ長（秒）
    pub dt_s: f64,
    /// ステップ数
    pub nstep: usize,
    /// 粒子数
    pub npart: usize,
    /// 乱数シード
    pub seed: u64,
}

/// 放流点設定
#[derive(Debug, Deserialize, Serialize)]
pub struct ReleaseConfig {
    pub latitude_deg: f64,
    pub longitude_deg: f64,
    #[serde(default)]
    pub depth_m: f64,
}

/// 境界制約の有効・無効
#[derive(Debug, Deserialize, Serialize)]
pub struct ConstraintsConfig {
    #[serde(default = "default_true")]
    pub use_shoreline: bool,
    #[serde(default = "default_true")]
    pub use_bathymetry: bool,
    #[serde(default = "default_true")]
    pub use_seasurface: bool,
}

fn default_true() -> bool {
    true
}

impl Default for ConstraintsConfig {
    fn default() -> Self {
        Self {
            use_shoreline: true,
            use_bathymetry: true,
            use_seasurface: true,
        }
    }
}

/// ステップごとの強制（流速）の与え方
#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ForcingMode {
    /// 乱数プロバイダから u, v を引く（w = 0）
    Random,
    /// 一定流速
    Constant,
    /// 注入された環境場プロバイダから粒子位置の u, v, w を参照する
    Field,
}

/// 強制設定
#[derive(Debug, Deserialize, Serialize)]
pub struct ForcingConfig {
    pub mode: ForcingMode,
    /// 東向き流速（m/s、constant モード）
    #[serde(default)]
    pub u_mps: f64,
    /// 北向き流速（m/s、constant モード）
    #[serde(default)]
    pub v_mps: f64,
    /// 上向き流速（m/s、constant モード）
    #[serde(default)]
    pub w_mps: f64,
    /// 乱数流速のスケール（m/s、random モード）
    #[serde(default = "default_speed_scale")]
    pub max_speed_mps: f64,
}

fn default_speed_scale() -> f64 {
    1.0
}

/// 輸送モデル設定
#[derive(Debug, Deserialize, Serialize)]
pub struct TransportConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self { enabled: true }
    }
}

/// 生活段階 1 つ分の定義
#[derive(Debug, Deserialize, Serialize)]
pub struct LifeStageConfig {
    pub name: String,
    pub duration_hours: f64,
    /// 鉛直遊泳速度（m/s、下向き正）
    #[serde(default)]
    pub swim_speed_mps: f64,
}

/// 行動モデル設定（生活段階の列）
#[derive(Debug, Deserialize, Serialize)]
pub struct BehaviorConfig {
    pub lifestages: Vec<LifeStageConfig>,
}

/// 海岸線地物の反応則
#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PolicyConfig {
    Reflect,
    Stick,
    ExitBounce,
}

/// 海岸線地物 1 本分の定義
#[derive(Debug, Deserialize, Serialize)]
pub struct CoastlineFeatureConfig {
    pub policy: PolicyConfig,
    /// 頂点列 [経度, 緯度]（度）
    pub vertices_deg: Vec<[f64; 2]>,
}

/// 海岸線設定
#[derive(Debug, Deserialize, Serialize)]
pub struct ShorelineConfig {
    pub features: Vec<CoastlineFeatureConfig>,
}

/// 海底地形設定（規則格子）
#[derive(Debug, Deserialize, Serialize)]
pub struct BathymetryConfig {
    pub lats_deg: Vec<f64>,
    pub lons_deg: Vec<f64>,
    /// depths_m[緯度インデックス][経度インデックス]（メートル、下向き正）
    pub depths_m: Vec<Vec<f64>>,
}

/// 出力設定
#[derive(Debug, Default, Deserialize, Serialize)]
pub struct OutputConfig {
    /// 粒子軌跡の CSV 出力先（省略時は出力しない）
    pub tracks_csv: Option<String>,
}

/// 完全なシナリオ設定
#[derive(Debug, Deserialize, Serialize)]
pub struct ScenarioConfig {
    pub meta: ScenarioMeta,
    pub sim: SimConfig,
    pub release: ReleaseConfig,
    #[serde(default)]
    pub constraints: ConstraintsConfig,
    pub forcing: ForcingConfig,
    #[serde(default)]
    pub transport: TransportConfig,
    pub behavior: Option<BehaviorConfig>,
    pub shoreline: Option<ShorelineConfig>,
    pub bathymetry: Option<BathymetryConfig>,
    #[serde(default)]
    pub output: OutputConfig,
}

impl ScenarioConfig {
    /// YAML ファイルからシナリオ設定を読み込む
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ScenarioError> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(ScenarioError::FileNotFound(path.to_path_buf()));
        }

        let contents = fs::read_to_string(path)
            .map_err(|e| ScenarioError::IoError(path.to_path_buf(), e))?;

        let config: ScenarioConfig = serde_yaml::from_str(&contents)
            .map_err(|e| ScenarioError::ParseError(path.to_path_buf(), e))?;

        config.validate()?;

        Ok(config)
    }

    /// 設定の基本的な検証（ラン開始前のフェイルファスト）
    pub fn validate(&self) -> Result<(), ScenarioError> {
        if self.sim.start.trim().is_empty() {
            return Err(ScenarioError::ValidationError(
                "sim.start must be provided".to_string(),
            ));
        }
        if self.sim.dt_s <= 0.0 {
            return Err(ScenarioError::ValidationError("dt_s must be positive".to_string()));
        }
        if self.sim.nstep == 0 {
            return Err(ScenarioError::ValidationError("nstep must be positive".to_string()));
        }
        if self.sim.npart == 0 {
            return Err(ScenarioError::ValidationError("npart must be positive".to_string()));
        }

        if !(-90.0..=90.0).contains(&self.release.latitude_deg) {
            return Err(ScenarioError::ValidationError(format!(
                "release latitude {} outside [-90, 90]",
                self.release.latitude_deg
            )));
        }
        if self.release.depth_m < 0.0 {
            return Err(ScenarioError::ValidationError(
                "release depth must be non-negative".to_string(),
            ));
        }

        if let Some(behavior) = &self.behavior {
            if behavior.lifestages.is_empty() {
                return Err(ScenarioError::ValidationError(
                    "behavior.lifestages must not be empty".to_string(),
                ));
            }
            for stage in &behavior.lifestages {
                if stage.name.trim().is_empty() {
                    return Err(ScenarioError::ValidationError(
                        "lifestage name must not be empty".to_string(),
                    ));
                }
                if stage.duration_hours <= 0.0 {
                    return Err(ScenarioError::ValidationError(format!(
                        "lifestage {} duration must be positive",
                        stage.name
                    )));
                }
            }
        }

        if self.constraints.use_shoreline {
            let has_features = self
                .shoreline
                .as_ref()
                .is_some_and(|s| !s.features.is_empty());
            if !has_features {
                return Err(ScenarioError::ValidationError(
                    "use_shoreline requires a shoreline section with features".to_string(),
                ));
            }
        }

        if self.constraints.use_bathymetry {
            match &self.bathymetry {
                None => {
                    return Err(ScenarioError::ValidationError(
                        "use_bathymetry requires a bathymetry section".to_string(),
                    ));
                }
                Some(b) => {
                    if b.lats_deg.is_empty() || b.lons_deg.is_empty() {
                        return Err(ScenarioError::ValidationError(
                            "bathymetry grid axes must not be empty".to_string(),
                        ));
                    }
                    if b.depths_m.len() != b.lats_deg.len()
                        || b.depths_m.iter().any(|row| row.len() != b.lons_deg.len())
                    {
                        return Err(ScenarioError::ValidationError(
                            "bathymetry depths shape must match grid axes".to_string(),
                        ));
                    }
                }
            }
        }

        Ok(())
    }

    /// シナリオの概要を表示する
    pub fn print_summary(&self) {
        println!("=== シナリオ情報 ===");
        println!("名前: {}", self.meta.name);
        println!("説明: {}", self.meta.description);
        println!("バージョン: {}", self.meta.version);
        println!();

        println!("=== シミュレーション設定 ===");
        println!("開始時刻: {}", self.sim.start);
        println!("時間刻み: {:.1}秒", self.sim.dt_s);
        println!("ステップ数: {}", self.sim.nstep);
        println!("粒子数: {}", self.sim.npart);
        println!("シード値: {}", self.sim.seed);
        println!();

        println!("=== 放流点 ===");
        println!(
            "緯度 {:.4}度 / 経度 {:.4}度 / 深度 {:.1}m",
            self.release.latitude_deg, self.release.longitude_deg, self.release.depth_m
        );
        println!();

        println!("=== 境界制約 ===");
        println!("海岸線: {}", if self.constraints.use_shoreline { "有効" } else { "無効" });
        println!("海底地形: {}", if self.constraints.use_bathymetry { "有効" } else { "無効" });
        println!("海面: {}", if self.constraints.use_seasurface { "有効" } else { "無効" });

        if let Some(behavior) = &self.behavior {
            println!();
            println!("=== 生活段階 ===");
            for stage in &behavior.lifestages {
                println!(
                    "  {}: {:.1}時間 (遊泳速度 {:+.4} m/s)",
                    stage.name, stage.duration_hours, stage.swim_speed_mps
                );
            }
        }
    }
}

/// シナリオ読み込みエラー
#[derive(Debug)]
pub enum ScenarioError {
    FileNotFound(std::path::PathBuf),
    IoError(std::path::PathBuf, std::io::Error),
    ParseError(std::path::PathBuf, serde_yaml::Error),
    ValidationError(String),
}

impl std::fmt::Display for ScenarioError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ScenarioError::FileNotFound(path) => {
                write!(f, "シナリオファイルが見つかりません: {}", path.display())
            }
            ScenarioError::IoError(path, err) => {
                write!(f, "ファイル読み込みエラー {}: {}", path.display(), err)
            }
            ScenarioError::ParseError(path, err) => {
                write!(f, "YAML解析エラー {}: {}", path.display(), err)
            }
            ScenarioError::ValidationError(msg) => {
                write!(f, "設定検証エラー: {}", msg)
            }
        }
    }
}

impl std::error::Error for ScenarioError {}

#[cfg(test)]
mod tests {
    use super::*;

    fn minimal_yaml() -> &'static str {
        r#"
meta:
  version: "1"
  name: test
  description: minimal scenario
sim:
  start: "2012-08-01T00:00:00Z"
  dt_s: 3600.0
  nstep: 5
  npart: 1
  seed: 42
release:
  latitude_deg: 28.0
  longitude_deg: -80.0
  depth_m: 0.0
constraints:
  use_shoreline: false
  use_bathymetry: false
  use_seasurface: false
forcing:
  mode: constant
  u_mps: 0.0
  v_mps: 0.0
"#
    }

    #[test]
    fn test_minimal_scenario_parses_and_validates() {
        let config: ScenarioConfig = serde_yaml::from_str(minimal_yaml()).unwrap();
        assert!(config.validate().is_ok());
        assert_eq!(config.sim.nstep, 5);
        assert_eq!(config.forcing.mode, ForcingMode::Constant);
        assert!(config.transport.enabled);
        assert!(config.behavior.is_none());
    }

    #[test]
    fn test_missing_start_time_fails() {
        let yaml = minimal_yaml().replace("\"2012-08-01T00:00:00Z\"", "\"  \"");
        let config: ScenarioConfig = serde_yaml::from_str(&yaml).unwrap();
        assert!(matches!(config.validate(), Err(ScenarioError::ValidationError(_))));
    }

    #[test]
    fn test_zero_nstep_fails() {
        let yaml = minimal_yaml().replace("nstep: 5", "nstep: 0");
        let config: ScenarioConfig = serde_yaml::from_str(&yaml).unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_latitude_out_of_range_fails() {
        let yaml = minimal_yaml().replace("latitude_deg: 28.0", "latitude_deg: 95.0");
        let config: ScenarioConfig = serde_yaml::from_str(&yaml).unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_shoreline_enabled_without_features_fails() {
        let yaml = minimal_yaml().replace("use_shoreline: false", "use_shoreline: true");
        let config: ScenarioConfig = serde_yaml::from_str(&yaml).unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_bathymetry_shape_mismatch_fails() {
        let yaml = format!(
            "{}{}",
            minimal_yaml().replace("use_bathymetry: false", "use_bathymetry: true"),
            r#"
bathymetry:
  lats_deg: [27.0, 28.0]
  lons_deg: [-81.0, -80.0]
  depths_m:
    - [100.0, 100.0]
"#
        );
        let config: ScenarioConfig = serde_yaml::from_str(&yaml).unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_field_forcing_mode_parses() {
        let yaml = minimal_yaml().replace("mode: constant", "mode: field");
        let config: ScenarioConfig = serde_yaml::from_str(&yaml).unwrap();
        assert_eq!(config.forcing.mode, ForcingMode::Field);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_empty_lifestage_list_fails() {
        let yaml = format!(
            "{}{}",
            minimal_yaml(),
            r#"
behavior:
  lifestages: []
"#
        );
        let config: ScenarioConfig = serde_yaml::from_str(&yaml).unwrap();
        assert!(matches!(config.validate(), Err(ScenarioError::ValidationError(_))));
    }

    #[test]
    fn test_lifestage_validation() {
        let yaml = format!(
            "{}{}",
            minimal_yaml(),
            r#"
behavior:
  lifestages:
    - name: egg
      duration_hours: 0.0
"#
        );
        let config: ScenarioConfig = serde_yaml::from_str(&yaml).unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_file_not_found() {
        assert!(matches!(
            ScenarioConfig::from_file("no/such/scenario.yaml"),
            Err(ScenarioError::FileNotFound(_))
        ));
    }
}
