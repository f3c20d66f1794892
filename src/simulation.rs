//! # Simulation モジュール
//!
//! 幼生輸送シミュレーションの中核となるシミュレーションエンジンを提供します。
//!
//! このモジュールは固定時間刻み（Δt）による時間駆動シミュレーションの
//! メインループを管理し、粒子群を輸送モデル・行動モデルの合成と
//! 境界相互作用（海底地形・海岸線・海面）で前進させます。
//!
//! ## 各ステップの処理順序
//!
//! 1. **強制の決定**: ステップ共通の流速 (u, v, w) を決める。
//!    field モードのみ粒子ごとに現在位置・時刻で環境場を参照する
//! 2. **粒子処理**: 各粒子について、設定順にモデルを適用する
//!    - モデルの `move_particle` で候補位置を計算
//!    - 境界相互作用（海底地形 → 海岸線 → 海面の順）で補正
//!    - 補正後の位置が同一ステップ内の次のモデルの入力になる
//! 3. **履歴追記**: ステップ終了時の確定位置を粒子履歴へ追記する
//! 4. **生活段階遷移**: 粒子の経過年齢に応じて段階を再評価する
//!
//! ステップ i+1 はステップ i で全粒子の更新が完了するまで開始しません。
//! 粒子ごとの更新はステップ内の外部場と読み取り専用の境界のみに依存する
//! ため、将来の粒子方向の並列化を妨げません。死亡した粒子も変位ゼロで
//! ループに留まり、粒子間で履歴の時刻が揃い続けます。

use std::fs;
use std::path::Path;

use tracing::{debug, info, trace};

use crate::boundaries::{Bathymetry, CoastlineFeature, ReactionPolicy, Shoreline};
use crate::fields::{FieldProvider, RandomProvider};
use crate::geo::{Ellipsoid, Location4D};
use crate::models::{
    LarvaBehavior, LifeStage, MovementModel, MovementResult, Particle, Transport,
};
use crate::scenario::{ForcingMode, PolicyConfig, ScenarioConfig};

impl From<PolicyConfig> for ReactionPolicy {
    fn from(policy: PolicyConfig) -> Self {
        match policy {
            PolicyConfig::Reflect => ReactionPolicy::Reflect,
            PolicyConfig::Stick => ReactionPolicy::Stick,
            PolicyConfig::ExitBounce => ReactionPolicy::ExitBounce,
        }
    }
}

pub struct SimulationEngine {
    current_time_s: f64,
    dt: f64,
    nstep: usize,
    step_count: usize,

    particles: Vec<Particle>,
    models: Vec<Box<dyn MovementModel>>,
    shoreline: Option<Shoreline>,
    bathymetry: Option<Bathymetry>,
    use_seasurface: bool,

    random: Box<dyn RandomProvider>,
    field_provider: Option<Box<dyn FieldProvider>>,
    scenario_config: ScenarioConfig,
    verbose_level: u8,
}

impl SimulationEngine {
    pub fn new(
        scenario: ScenarioConfig,
        random: Box<dyn RandomProvider>,
        verbose_level: u8,
    ) -> Self {
        let dt = scenario.sim.dt_s;
        let nstep = scenario.sim.nstep;

        Self {
            current_time_s: 0.0,
            dt,
            nstep,
            step_count: 0,
            particles: Vec::new(),
            models: Vec::new(),
            shoreline: None,
            bathymetry: None,
            use_seasurface: scenario.constraints.use_seasurface,
            random,
            field_provider: None,
            scenario_config: scenario,
            verbose_level,
        }
    }

    /// field 強制モードが参照する環境場プロバイダを注入する
    ///
    /// `initialize()` より前に呼び出します。u / v / w の各変数を
    /// `query` で問い合わせます。
    pub fn set_field_provider(&mut self, provider: Box<dyn FieldProvider>) {
        self.field_provider = Some(provider);
    }

    /// エンジンを初期化する
    ///
    /// 設定を再検証し、移動モデル・境界オブジェクトを構築して
    /// 放流点に粒子を配置します。設定不備はここで即座に失敗します。
    pub fn initialize(&mut self) -> Result<(), Box<dyn std::error::Error>> {
        if self.verbose_level > 0 {
            info!("シミュレーションエンジンを初期化中...");
        }

        // フェイルファスト: 開始時刻・ステップ数などの構成エラーはラン前に検出する
        self.scenario_config.validate()?;

        if self.scenario_config.forcing.mode == ForcingMode::Field && self.field_provider.is_none() {
            return Err("field forcing mode requires a field provider (set_field_provider)".into());
        }

        self.initialize_models();
        self.initialize_boundaries()?;
        self.initialize_particles();

        if self.verbose_level > 0 {
            info!("初期化完了:");
            info!("  粒子: {}個", self.particles.len());
            info!("  移動モデル: {}個", self.models.len());
            info!(
                "  境界: 海岸線={} 海底地形={} 海面={}",
                self.shoreline.is_some(),
                self.bathymetry.is_some(),
                self.use_seasurface
            );
        }

        Ok(())
    }

    fn initialize_models(&mut self) {
        // 輸送 → 行動の順。設定された順序がそのまま実行順になる
        if self.scenario_config.transport.enabled {
            self.models.push(Box::new(Transport::new(Ellipsoid::WGS84)));
        }

        if let Some(behavior_config) = &self.scenario_config.behavior {
            let stages: Vec<LifeStage> = behavior_config
                .lifestages
                .iter()
                .map(|s| LifeStage::new(&s.name, s.duration_hours, s.swim_speed_mps))
                .collect();
            self.models.push(Box::new(LarvaBehavior::new(stages)));
        }

        if self.verbose_level > 1 {
            for model in &self.models {
                debug!("移動モデル登録: {}", model.name());
            }
        }
    }

    fn initialize_boundaries(&mut self) -> Result<(), Box<dyn std::error::Error>> {
        if self.scenario_config.constraints.use_shoreline {
            // validate() 済みなので shoreline セクションは必ず存在する
            let config = self
                .scenario_config
                .shoreline
                .as_ref()
                .ok_or("shoreline section missing")?;
            let features = config
                .features
                .iter()
                .map(|f| CoastlineFeature {
                    vertices_deg: f.vertices_deg.iter().map(|v| (v[0], v[1])).collect(),
                    policy: f.policy.into(),
                })
                .collect();
            self.shoreline = Some(Shoreline::new(features, Ellipsoid::WGS84));

            if self.verbose_level > 1 {
                debug!("海岸線初期化: {}本の地物", config.features.len());
            }
        }

        if self.scenario_config.constraints.use_bathymetry {
            let config = self
                .scenario_config
                .bathymetry
                .as_ref()
                .ok_or("bathymetry section missing")?;
            self.bathymetry = Some(Bathymetry::from_grid(
                config.lats_deg.clone(),
                config.lons_deg.clone(),
                config.depths_m.clone(),
            ));

            if self.verbose_level > 1 {
                debug!(
                    "海底地形初期化: {}x{}格子",
                    config.lats_deg.len(),
                    config.lons_deg.len()
                );
            }
        }

        Ok(())
    }

    fn initialize_particles(&mut self) {
        let release = &self.scenario_config.release;
        let seed_location = Location4D::new(
            release.latitude_deg,
            release.longitude_deg,
            release.depth_m,
            0.0,
        );

        for id in 0..self.scenario_config.sim.npart {
            self.particles.push(Particle::new(id, seed_location));
        }
    }

    /// シミュレーションを最後まで実行する
    pub fn run(&mut self) -> Result<(), Box<dyn std::error::Error>> {
        if self.particles.is_empty() {
            return Err("initialize() must be called before run()".into());
        }

        info!("=== シミュレーション実行開始 ===");

        while self.step_count < self.nstep {
            self.step();

            if self.verbose_level > 2 {
                trace!(
                    "時刻: {:.1}秒 (ステップ: {}/{})",
                    self.current_time_s,
                    self.step_count,
                    self.nstep
                );
            }

            if self.step_count % 100 == 0 && self.verbose_level > 0 {
                let progress = (self.step_count as f64 / self.nstep as f64) * 100.0;
                info!(
                    "進行状況: {:.1}% ({}/{}ステップ)",
                    progress, self.step_count, self.nstep
                );
            }
        }

        info!("=== シミュレーション完了 ===");
        info!("実行時間: {:.1}秒", self.current_time_s);
        info!("総ステップ数: {}", self.step_count);

        if let Some(path) = self.scenario_config.output.tracks_csv.clone() {
            self.write_tracks(&path)?;
            info!("粒子軌跡を出力しました: {}", path);
        }

        Ok(())
    }

    /// 1 ステップ分の処理
    fn step(&mut self) {
        let shared_forcing = self.shared_forcing_for_step();
        let end_time = self.current_time_s + self.dt;

        for i in 0..self.particles.len() {
            // モデル連鎖の入力となる現在位置。境界補正後の位置が
            // 同一ステップ内の次のモデルへ引き継がれる
            let mut current = *self.particles[i].location();

            // field モードのみ粒子のステップ開始位置で場を参照する
            let (u, v, w) = shared_forcing.unwrap_or_else(|| self.sampled_forcing(&current));

            for model in &self.models {
                let result = model.move_particle(&self.particles[i], &current, u, v, w, self.dt);
                let candidate =
                    Location4D::new(result.latitude, result.longitude, result.depth, end_time);
                current = resolve_boundaries(
                    self.bathymetry.as_ref(),
                    self.shoreline.as_ref(),
                    self.use_seasurface,
                    &current,
                    candidate,
                    &result,
                );
            }

            // モデルが 1 つもない場合も時刻だけ進めて履歴を揃える
            self.particles[i].append_location(current.with_time(end_time));

            for model in &self.models {
                model.advance_lifestage(&mut self.particles[i], end_time);
            }
        }

        self.current_time_s = end_time;
        self.step_count += 1;
    }

    /// ステップ共通の強制流速 (u, v, w) を決める
    ///
    /// field モードでは粒子ごとに参照位置が異なるため None を返し、
    /// 粒子ループ側で `sampled_forcing` を呼び出します。
    fn shared_forcing_for_step(&mut self) -> Option<(f64, f64, f64)> {
        let forcing = &self.scenario_config.forcing;
        match forcing.mode {
            ForcingMode::Constant => Some((forcing.u_mps, forcing.v_mps, forcing.w_mps)),
            ForcingMode::Random => {
                let scale = forcing.max_speed_mps;
                let u = self.random.next_nonnegative() * scale;
                let v = self.random.next_nonnegative() * scale;
                Some((u, v, 0.0))
            }
            ForcingMode::Field => None,
        }
    }

    /// 環境場プロバイダから指定位置・現在時刻の流速を参照する
    ///
    /// 変数が未定義の位置（場の範囲外など）は流速 0 として扱います。
    fn sampled_forcing(&self, location: &Location4D) -> (f64, f64, f64) {
        let Some(provider) = &self.field_provider else {
            // initialize() が field モードでのプロバイダ未注入を拒否している
            return (0.0, 0.0, 0.0);
        };
        let time_s = self.current_time_s;
        (
            provider.query("u", location, time_s).unwrap_or(0.0),
            provider.query("v", location, time_s).unwrap_or(0.0),
            provider.query("w", location, time_s).unwrap_or(0.0),
        )
    }

    pub fn particles(&self) -> &[Particle] {
        &self.particles
    }

    pub fn current_time_s(&self) -> f64 {
        self.current_time_s
    }

    pub fn step_count(&self) -> usize {
        self.step_count
    }

    /// 粒子軌跡を CSV へ書き出す
    ///
    /// 1 行が (粒子 ID, ステップ, 緯度, 経度, 深度, 時刻) に対応します。
    /// この列が下流（プロット・エクスポート）との安定した契約です。
    pub fn write_tracks<P: AsRef<Path>>(&self, path: P) -> Result<(), std::io::Error> {
        let mut contents = String::from("particle_id,step,latitude_deg,longitude_deg,depth_m,time_s\n");
        for particle in &self.particles {
            for (step, location) in particle.locations().iter().enumerate() {
                contents.push_str(&format!(
                    "{},{},{:.8},{:.8},{:.3},{:.1}\n",
                    particle.id(),
                    step,
                    location.latitude,
                    location.longitude,
                    location.depth,
                    location.time
                ));
            }
        }
        fs::write(path, contents)
    }
}

/// 境界相互作用を 1 回分解決する
///
/// 適用順序は海底地形クランプ → 海岸線交差・反応 → 海面クランプで、
/// それぞれが前段の結果をさらに補正し得ます。
fn resolve_boundaries(
    bathymetry: Option<&Bathymetry>,
    shoreline: Option<&Shoreline>,
    use_seasurface: bool,
    starting: &Location4D,
    mut ending: Location4D,
    movement: &MovementResult,
) -> Location4D {
    if let Some(bathymetry) = bathymetry {
        if let Some(corrected) = bathymetry.intersect(
            starting,
            &ending,
            movement.vertical_distance_m,
            movement.vertical_angle_deg,
        ) {
            ending = corrected;
        }
    }

    if let Some(shoreline) = shoreline {
        if let Some(hit) = shoreline.intersect(starting, &ending) {
            // 交差と反応は通常の挙動。warn は反応の退化側（shoreline 側）に限る
            debug!(
                feature_index = hit.feature_index,
                latitude = hit.point.latitude,
                longitude = hit.point.longitude,
                "海岸線との交差を検出しました"
            );
            ending = shoreline.react(
                starting,
                &ending,
                &hit,
                movement.distance_m,
                movement.azimuth_deg,
                movement.reverse_azimuth_deg,
            );
        }
    }

    // 海面より上（負の深度）は海面へクランプする
    if use_seasurface && ending.depth < 0.0 {
        ending = ending.with_depth(0.0);
    }

    ending
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::boundaries::{CoastlineFeature, Shoreline};
    use crate::models::MovementResult;

    fn no_movement(latitude: f64, longitude: f64, depth: f64) -> MovementResult {
        MovementResult::stationary(latitude, longitude, depth)
    }

    #[test]
    fn test_open_water_is_untouched() {
        let start = Location4D::new(28.0, -80.0, 10.0, 0.0);
        let end = Location4D::new(28.1, -80.0, 12.0, 3600.0);
        let result = resolve_boundaries(None, None, true, &start, end, &no_movement(28.1, -80.0, 12.0));
        assert_eq!(result, end);
    }

    #[test]
    fn test_seasurface_clamps_negative_depth() {
        let start = Location4D::new(28.0, -80.0, 10.0, 0.0);
        let end = Location4D::new(28.0, -80.0, -50.0, 3600.0);
        let result = resolve_boundaries(None, None, true, &start, end, &no_movement(28.0, -80.0, -50.0));
        assert_eq!(result.depth, 0.0);
    }

    #[test]
    fn test_seasurface_disabled_keeps_negative_depth() {
        let start = Location4D::new(28.0, -80.0, 10.0, 0.0);
        let end = Location4D::new(28.0, -80.0, -50.0, 3600.0);
        let result = resolve_boundaries(None, None, false, &start, end, &no_movement(28.0, -80.0, -50.0));
        assert_eq!(result.depth, -50.0);
    }

    #[test]
    fn test_bathymetry_then_seasurface_order() {
        let bathymetry = Bathymetry::from_grid(
            vec![28.0],
            vec![-80.0],
            vec![vec![100.0]],
        );
        let start = Location4D::new(28.0, -80.0, 50.0, 0.0);
        let end = Location4D::new(28.0, -80.0, 500.0, 3600.0);
        let result = resolve_boundaries(
            Some(&bathymetry),
            None,
            true,
            &start,
            end,
            &no_movement(28.0, -80.0, 500.0),
        );
        assert_eq!(result.depth, 100.0);
    }

    #[test]
    fn test_shoreline_correction_applies() {
        let shoreline = Shoreline::new(
            vec![CoastlineFeature {
                vertices_deg: vec![(-80.0, 27.0), (-80.0, 29.0)],
                policy: ReactionPolicy::Stick,
            }],
            Ellipsoid::WGS84,
        );
        let start = Location4D::new(28.0, -80.5, 0.0, 0.0);
        let end = Location4D::new(28.0, -79.5, 0.0, 3600.0);
        let movement = MovementResult {
            latitude: 28.0,
            longitude: -79.5,
            depth: 0.0,
            distance_m: 98_000.0,
            azimuth_deg: 90.0,
            reverse_azimuth_deg: 270.0,
            vertical_distance_m: 0.0,
            vertical_angle_deg: 0.0,
        };
        let result = resolve_boundaries(None, Some(&shoreline), true, &start, end, &movement);
        assert!((result.longitude - -80.0).abs() < 1e-9);
    }
}
