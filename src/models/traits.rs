use crate::geo::Location4D;
use crate::models::common::MovementResult;
use crate::models::particle::Particle;

/// 全ての移動モデルが実装する基本インターフェース
///
/// エンジンは設定された順序でモデルのリストを保持し、各ステップで順に
/// 呼び出します（リフレクションによるモデルの発見は行いません）。
/// `move_particle` は粒子を直接変更せず、結果をエンジンに返します。
pub trait MovementModel {
    /// モデル名の取得
    fn name(&self) -> &str;

    /// 1 ステップ分の変位を計算する
    ///
    /// `location` は同一ステップ内で先行するモデルの出力（境界処理済み）で、
    /// 粒子の履歴にはまだ追記されていません。
    ///
    /// * `u` - 東向き流速（m/s）
    /// * `v` - 北向き流速（m/s）
    /// * `w` - 上向き流速（m/s）
    /// * `step_s` - ステップ長（秒）
    fn move_particle(
        &self,
        particle: &Particle,
        location: &Location4D,
        u: f64,
        v: f64,
        w: f64,
        step_s: f64,
    ) -> MovementResult;

    /// ステップ終了後の生活段階遷移を再評価する
    ///
    /// 生活段階を持たないモデルでは何もしません。
    fn advance_lifestage(&self, _particle: &mut Particle, _now_s: f64) {}
}
