use tracing::warn;

use crate::geo::{self, Ellipsoid, Location4D};

/// 海岸線地物に付与される反応則
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ReactionPolicy {
    /// 残余移動距離を逆方位角方向へ反射する
    Reflect,
    /// 交点に留まる
    Stick,
    /// 反射と同様だが残余距離を半減する（減衰バウンス）
    ExitBounce,
}

/// 陸境界を表す 1 本のポリライン
///
/// 頂点は (経度, 緯度) の度単位で、開いた折れ線・閉じた輪郭のどちらも
/// 扱えます。ラン開始時に一度読み込まれ、以後読み取り専用です。
#[derive(Debug, Clone)]
pub struct CoastlineFeature {
    /// 頂点列 (経度, 緯度)（度）
    pub vertices_deg: Vec<(f64, f64)>,
    /// この地物の反応則
    pub policy: ReactionPolicy,
}

/// 交差判定の結果
#[derive(Debug, Clone, Copy)]
pub struct CoastlineHit {
    /// 交点（深度は線分に沿った線形補間、時刻は終点の時刻）
    pub point: Location4D,
    /// 交差した地物のインデックス
    pub feature_index: usize,
}

/// 海岸線境界
///
/// 連続する 2 位置を結ぶ線分と海岸線地物の交差を検出し、
/// 地物の反応則に従って補正後の終点を計算します。
/// 1 ステップ内で複数の交差がある場合は始点から測地距離が最も近い
/// 交差を採用します（反復順ではなく距離順。順序依存を避けるため）。
///
/// 交差判定は経度・緯度平面での線分交差で行うため、作業領域が
/// 日付変更線をまたがないことを前提とします。
pub struct Shoreline {
    features: Vec<CoastlineFeature>,
    ellipsoid: Ellipsoid,
}

/// 2 線分の交差を求める（経度・経度平面）
///
/// 交差する場合は線分 a 上のパラメータ t と交点を返します。
/// 平行・共線は交差なしとして扱います。
fn segment_intersection(
    a1: (f64, f64),
    a2: (f64, f64),
    b1: (f64, f64),
    b2: (f64, f64),
) -> Option<(f64, (f64, f64))> {
    let d1 = (a2.0 - a1.0, a2.1 - a1.1);
    let d2 = (b2.0 - b1.0, b2.1 - b1.1);
    let denominator = d1.0 * d2.1 - d1.1 * d2.0;
    if denominator == 0.0 {
        return None;
    }
    let t = ((b1.0 - a1.0) * d2.1 - (b1.1 - a1.1) * d2.0) / denominator;
    let s = ((b1.0 - a1.0) * d1.1 - (b1.1 - a1.1) * d1.0) / denominator;
    if (0.0..=1.0).contains(&t) && (0.0..=1.0).contains(&s) {
        Some((t, (a1.0 + t * d1.0, a1.1 + t * d1.1)))
    } else {
        None
    }
}

impl Shoreline {
    pub fn new(features: Vec<CoastlineFeature>, ellipsoid: Ellipsoid) -> Self {
        Self { features, ellipsoid }
    }

    pub fn features(&self) -> &[CoastlineFeature] {
        &self.features
    }

    /// 線分 start→end と海岸線の交差を判定する
    ///
    /// 交差がある場合、始点から最も近い交点とその地物を返します。
    pub fn intersect(&self, start: &Location4D, end: &Location4D) -> Option<CoastlineHit> {
        self.nearest_crossing(start, end, 0.0)
    }

    /// 線分パラメータ t > min_t の範囲で最近傍交差を探す
    ///
    /// 反応後の再判定では始点が交点そのもの（t = 0 で地物上）になるため、
    /// min_t で始点上の接触を除外します。
    fn nearest_crossing(&self, start: &Location4D, end: &Location4D, min_t: f64) -> Option<CoastlineHit> {
        let a1 = (start.longitude, start.latitude);
        let a2 = (end.longitude, end.latitude);

        let mut nearest: Option<(f64, CoastlineHit)> = None;

        for (feature_index, feature) in self.features.iter().enumerate() {
            for pair in feature.vertices_deg.windows(2) {
                let Some((t, (lon, lat))) = segment_intersection(a1, a2, pair[0], pair[1]) else {
                    continue;
                };
                if t <= min_t && min_t > 0.0 {
                    continue;
                }
                let depth = start.depth + t * (end.depth - start.depth);
                let point = Location4D::new(lat, lon, depth, end.time);
                let distance = geo::solve_inverse(start, &point, &self.ellipsoid).distance_m;
                if nearest.as_ref().is_none_or(|(best, _)| distance < *best) {
                    nearest = Some((distance, CoastlineHit { point, feature_index }));
                }
            }
        }

        nearest.map(|(_, hit)| hit)
    }

    /// 確定した交差に対して反応則を適用し補正後の終点を計算する
    ///
    /// 補正点が依然としていずれかの地物を越える場合は交点へクランプして
    /// 警告を記録します（無限ループしません）。
    pub fn react(
        &self,
        start: &Location4D,
        end: &Location4D,
        hit: &CoastlineHit,
        distance_m: f64,
        _azimuth_deg: f64,
        reverse_azimuth_deg: f64,
    ) -> Location4D {
        let feature = &self.features[hit.feature_index];
        let traveled = geo::solve_inverse(start, &hit.point, &self.ellipsoid).distance_m;
        let remaining = (distance_m - traveled).max(0.0);

        let bounce_distance = match feature.policy {
            ReactionPolicy::Stick => return hit.point,
            ReactionPolicy::Reflect => remaining,
            ReactionPolicy::ExitBounce => remaining / 2.0,
        };

        if bounce_distance == 0.0 {
            return hit.point;
        }

        let solution = geo::solve_direct(&hit.point, reverse_azimuth_deg, bounce_distance, &self.ellipsoid);
        let corrected = Location4D::new(solution.latitude, solution.longitude, hit.point.depth, end.time);

        // 補正点がさらに別の（または同じ）地物を越える場合は交点へ退避する
        if self.nearest_crossing(&hit.point, &corrected, 1e-9).is_some() {
            warn!(
                feature_index = hit.feature_index,
                "境界反応の補正点が再び海岸線と交差するため交点へクランプします"
            );
            return hit.point;
        }

        corrected
    }
}
