use tracing::debug;

use crate::fields::GriddedField;
use crate::geo::Location4D;

/// 海底地形境界
///
/// 緯度・経度から局所の海底深度（許容される最大深度）を参照できる
/// 読み取り専用の深度場を保持します。ラン開始時に一度構築され、
/// 以後変更されません。
pub struct Bathymetry {
    /// 海底深度場（メートル、下向き正）
    field: GriddedField,
}

impl Bathymetry {
    pub fn new(field: GriddedField) -> Self {
        Self { field }
    }

    /// 規則格子から構築する
    pub fn from_grid(lats_deg: Vec<f64>, lons_deg: Vec<f64>, depths_m: Vec<Vec<f64>>) -> Self {
        Self::new(GriddedField::new("seafloor_depth", lats_deg, lons_deg, depths_m))
    }

    /// 局所の海底深度（メートル）。場の範囲外では None
    pub fn seafloor_depth_at(&self, latitude: f64, longitude: f64) -> Option<f64> {
        self.field.value_at(latitude, longitude)
    }

    /// ステップ内の鉛直変位が終点で海底を下回るかを判定する
    ///
    /// 下回る場合は深度を局所の海底深度へクランプした補正点を返します。
    /// 補正が不要な場合と深度場の範囲外では None を返します。
    pub fn intersect(
        &self,
        _start: &Location4D,
        end: &Location4D,
        vertical_distance_m: f64,
        vertical_angle_deg: f64,
    ) -> Option<Location4D> {
        let seafloor = self.seafloor_depth_at(end.latitude, end.longitude)?;
        if end.depth <= seafloor {
            return None;
        }
        debug!(
            requested_depth = end.depth,
            seafloor_depth = seafloor,
            vertical_distance_m,
            vertical_angle_deg,
            "海底深度へクランプします"
        );
        Some(end.with_depth(seafloor))
    }
}
