/// 1 粒子・1 ステップに対する移動モデルの出力
///
/// エンジンが境界処理と位置更新に使用する一時的な値で、保存されません。
/// 深度は下向き正（メートル）、方位角は北基準・時計回り（度）です。
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MovementResult {
    /// 移動後の緯度（度）
    pub latitude: f64,
    /// 移動後の経度（度）
    pub longitude: f64,
    /// 移動後の深度（メートル、下向き正）
    pub depth: f64,
    /// 水平移動距離（メートル）
    pub distance_m: f64,
    /// 方位角（度、[0, 360)）
    pub azimuth_deg: f64,
    /// 逆方位角（度、[0, 360)）
    pub reverse_azimuth_deg: f64,
    /// 鉛直移動距離（メートル、下向き正）
    pub vertical_distance_m: f64,
    /// 水平面からの移動角（度、下向き正）
    pub vertical_angle_deg: f64,
}

impl MovementResult {
    /// その場に留まる（変位ゼロ）結果を作る
    pub fn stationary(latitude: f64, longitude: f64, depth: f64) -> Self {
        Self {
            latitude,
            longitude,
            depth,
            distance_m: 0.0,
            azimuth_deg: 0.0,
            reverse_azimuth_deg: 0.0,
            vertical_distance_m: 0.0,
            vertical_angle_deg: 0.0,
        }
    }
}
