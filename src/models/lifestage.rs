use crate::geo::Location4D;
use crate::models::common::MovementResult;

/// 幼生の生活段階
///
/// 名前付きの段階の順序列として使用され、最終要素は常に終端の `Dead` です。
/// 各段階は継続時間と鉛直遊泳速度（行動的な変位）を持ちます。
/// `Dead` は吸収状態で、常に変位ゼロを返します。
#[derive(Debug, Clone, PartialEq)]
pub enum LifeStage {
    /// 発達中の段階
    Stage {
        /// 段階の名前（egg, larva など）
        name: String,
        /// 段階の継続時間（時間）
        duration_hours: f64,
        /// 鉛直遊泳速度（m/s、下向き正: 正で沈降・負で浮上）
        swim_speed_mps: f64,
    },
    /// 終端の死亡段階（変位ゼロ、遷移しない）
    Dead,
}

impl LifeStage {
    pub fn new(name: &str, duration_hours: f64, swim_speed_mps: f64) -> Self {
        Self::Stage {
            name: name.to_string(),
            duration_hours,
            swim_speed_mps,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Self::Stage { name, .. } => name,
            Self::Dead => "dead",
        }
    }

    pub fn is_dead(&self) -> bool {
        matches!(self, Self::Dead)
    }

    /// 段階の継続時間（秒）。Dead は無期限のため None
    pub fn duration_s(&self) -> Option<f64> {
        match self {
            Self::Stage { duration_hours, .. } => Some(duration_hours * 3600.0),
            Self::Dead => None,
        }
    }

    /// この段階の行動的変位（鉛直遊泳バイアス）を計算する
    ///
    /// 水平成分は持たず、深度のみを変更します。Dead は変位ゼロです。
    pub fn move_from(&self, location: &Location4D, step_s: f64) -> MovementResult {
        match self {
            Self::Stage { swim_speed_mps, .. } => {
                let vertical = swim_speed_mps * step_s;
                MovementResult {
                    latitude: location.latitude,
                    longitude: location.longitude,
                    depth: location.depth + vertical,
                    distance_m: 0.0,
                    azimuth_deg: 0.0,
                    reverse_azimuth_deg: 0.0,
                    vertical_distance_m: vertical,
                    vertical_angle_deg: if vertical > 0.0 {
                        90.0
                    } else if vertical < 0.0 {
                        -90.0
                    } else {
                        0.0
                    },
                }
            }
            Self::Dead => MovementResult::stationary(location.latitude, location.longitude, location.depth),
        }
    }
}
