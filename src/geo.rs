//! # Geo モジュール
//!
//! 楕円体上の測地計算（Vincenty法による直接・逆問題）と、
//! シミュレーション全体で使用する4次元位置型 `Location4D` を提供します。
//!
//! ## 主要機能
//!
//! - **直接問題** (`solve_direct`): 始点・方位角・距離から到達点と逆方位角を計算
//! - **逆問題** (`solve_inverse`): 2点間の測地線距離と方位角・逆方位角を計算
//! - **Location4D**: 緯度・経度・深度・時刻を持つ不変の値型
//!
//! 反復解は許容誤差 1e-12 rad・最大 20 回で打ち切ります。収束しない場合
//! （対蹠点近傍など）は最終反復値を採用し、精度低下として warn ログに記録します。

use tracing::warn;

/// 収束判定の許容誤差（ラジアン）
const CONVERGENCE_TOLERANCE: f64 = 1e-12;

/// 反復回数の上限
const MAX_ITERATIONS: usize = 20;

/// 測地計算に使用する回転楕円体
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ellipsoid {
    /// 長半径（メートル）
    pub semi_major_m: f64,
    /// 短半径（メートル）
    pub semi_minor_m: f64,
}

impl Ellipsoid {
    /// WGS84 楕円体
    pub const WGS84: Ellipsoid = Ellipsoid {
        semi_major_m: 6378137.0,
        semi_minor_m: 6356752.3142,
    };

    pub fn new(semi_major_m: f64, semi_minor_m: f64) -> Self {
        Self { semi_major_m, semi_minor_m }
    }

    /// 扁平率 f = (a - b) / a
    pub fn flattening(&self) -> f64 {
        (self.semi_major_m - self.semi_minor_m) / self.semi_major_m
    }
}

impl Default for Ellipsoid {
    fn default() -> Self {
        Self::WGS84
    }
}

/// 緯度・経度・深度・時刻を表す不変の値型
///
/// 深度は海面を 0 として下向き正（メートル）、時刻はシナリオ開始からの
/// 経過秒です。フィールドの変更は新しい値の構築で行います。
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Location4D {
    /// 緯度（度、[-90, 90]）
    pub latitude: f64,
    /// 経度（度、[-180, 180] に正規化）
    pub longitude: f64,
    /// 深度（メートル、下向き正）
    pub depth: f64,
    /// シナリオ開始からの経過時刻（秒）
    pub time: f64,
}

impl Location4D {
    pub fn new(latitude: f64, longitude: f64, depth: f64, time: f64) -> Self {
        debug_assert!((-90.0..=90.0).contains(&latitude), "latitude out of range: {}", latitude);
        Self {
            latitude,
            longitude: normalize_longitude(longitude),
            depth,
            time,
        }
    }

    /// 深度のみ変更した新しい値を返す
    pub fn with_depth(&self, depth: f64) -> Self {
        Self { depth, ..*self }
    }

    /// 時刻のみ変更した新しい値を返す
    pub fn with_time(&self, time: f64) -> Self {
        Self { time, ..*self }
    }
}

/// 直接問題の解
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DirectSolution {
    /// 到達点の緯度（度）
    pub latitude: f64,
    /// 到達点の経度（度）
    pub longitude: f64,
    /// 到達点から始点方向への逆方位角（度、[0, 360)）
    pub reverse_azimuth: f64,
}

/// 逆問題の解
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InverseSolution {
    /// 測地線距離（メートル）
    pub distance_m: f64,
    /// 始点における方位角（度、[0, 360)）
    pub azimuth: f64,
    /// 終点における逆方位角（度、[0, 360)）
    pub reverse_azimuth: f64,
}

/// 経度を [-180, 180] に正規化
pub fn normalize_longitude(lon_deg: f64) -> f64 {
    let mut normalized = lon_deg % 360.0;
    if normalized > 180.0 {
        normalized -= 360.0;
    } else if normalized < -180.0 {
        normalized += 360.0;
    }
    normalized
}

/// 方位角を [0, 360) に正規化
pub fn normalize_azimuth(azimuth_deg: f64) -> f64 {
    let mut normalized = azimuth_deg % 360.0;
    if normalized < 0.0 {
        normalized += 360.0;
    }
    normalized
}

/// 直接測地問題を解く
///
/// 始点 `start` から方位角 `azimuth_deg`（北基準・時計回り、度）へ
/// 測地線距離 `distance_m` だけ進んだ到達点と逆方位角を返します。
///
/// 収束しない入力（対蹠点近傍など）では最終反復値を返し warn を記録します。
pub fn solve_direct(
    start: &Location4D,
    azimuth_deg: f64,
    distance_m: f64,
    ellipsoid: &Ellipsoid,
) -> DirectSolution {
    let a = ellipsoid.semi_major_m;
    let b = ellipsoid.semi_minor_m;
    let f = ellipsoid.flattening();

    if distance_m == 0.0 {
        return DirectSolution {
            latitude: start.latitude,
            longitude: start.longitude,
            reverse_azimuth: normalize_azimuth(azimuth_deg + 180.0),
        };
    }

    let lat1 = start.latitude.to_radians();
    let lon1 = start.longitude.to_radians();
    let alpha1 = azimuth_deg.to_radians();

    let (sin_alpha1, cos_alpha1) = alpha1.sin_cos();
    let tan_u1 = (1.0 - f) * lat1.tan();
    let u1 = tan_u1.atan();
    let (sin_u1, cos_u1) = u1.sin_cos();

    let sigma1 = tan_u1.atan2(cos_alpha1);
    let sin_alpha = cos_u1 * sin_alpha1;
    let cos_sq_alpha = 1.0 - sin_alpha * sin_alpha;

    let u_sq = cos_sq_alpha * (a * a - b * b) / (b * b);
    let big_a = 1.0 + u_sq / 16384.0 * (4096.0 + u_sq * (-768.0 + u_sq * (320.0 - 175.0 * u_sq)));
    let big_b = u_sq / 1024.0 * (256.0 + u_sq * (-128.0 + u_sq * (74.0 - 47.0 * u_sq)));

    // sigma の反復解
    let mut sigma = distance_m / (b * big_a);
    let mut converged = false;

    for _ in 0..MAX_ITERATIONS {
        let cos_2sigma_m = (2.0 * sigma1 + sigma).cos();
        let sin_sigma = sigma.sin();
        let cos_sigma = sigma.cos();

        let delta_sigma = big_b
            * sin_sigma
            * (cos_2sigma_m
                + big_b / 4.0
                    * (cos_sigma * (-1.0 + 2.0 * cos_2sigma_m * cos_2sigma_m)
                        - big_b / 6.0
                            * cos_2sigma_m
                            * (-3.0 + 4.0 * sin_sigma * sin_sigma)
                            * (-3.0 + 4.0 * cos_2sigma_m * cos_2sigma_m)));
        let sigma_next = distance_m / (b * big_a) + delta_sigma;

        if (sigma_next - sigma).abs() < CONVERGENCE_TOLERANCE {
            sigma = sigma_next;
            converged = true;
            break;
        }
        sigma = sigma_next;
    }

    if !converged {
        warn!(
            azimuth_deg,
            distance_m, "直接測地問題が収束しませんでした。最終反復値を使用します"
        );
    }

    let cos_2sigma_m = (2.0 * sigma1 + sigma).cos();
    let sin_sigma = sigma.sin();
    let cos_sigma = sigma.cos();

    let tmp = sin_u1 * sin_sigma - cos_u1 * cos_sigma * cos_alpha1;
    let lat2 = (sin_u1 * cos_sigma + cos_u1 * sin_sigma * cos_alpha1)
        .atan2((1.0 - f) * (sin_alpha * sin_alpha + tmp * tmp).sqrt());

    let lambda = (sin_sigma * sin_alpha1).atan2(cos_u1 * cos_sigma - sin_u1 * sin_sigma * cos_alpha1);
    let c = f / 16.0 * cos_sq_alpha * (4.0 + f * (4.0 - 3.0 * cos_sq_alpha));
    let big_l = lambda
        - (1.0 - c)
            * f
            * sin_alpha
            * (sigma
                + c * sin_sigma
                    * (cos_2sigma_m + c * cos_sigma * (-1.0 + 2.0 * cos_2sigma_m * cos_2sigma_m)));
    let lon2 = lon1 + big_l;

    // 到達点から始点へ向かう逆方位角
    let alpha2 = sin_alpha.atan2(-tmp);
    let reverse_azimuth = normalize_azimuth(alpha2.to_degrees() + 180.0);

    DirectSolution {
        latitude: lat2.to_degrees(),
        longitude: normalize_longitude(lon2.to_degrees()),
        reverse_azimuth,
    }
}

/// 逆測地問題を解く
///
/// 2点間の測地線距離と、始点の方位角・終点の逆方位角を返します。
/// 一致する2点では距離 0・方位角 0 を返します（安定値）。
pub fn solve_inverse(start: &Location4D, end: &Location4D, ellipsoid: &Ellipsoid) -> InverseSolution {
    let a = ellipsoid.semi_major_m;
    let b = ellipsoid.semi_minor_m;
    let f = ellipsoid.flattening();

    let lat1 = start.latitude.to_radians();
    let lat2 = end.latitude.to_radians();
    let big_l = normalize_longitude(end.longitude - start.longitude).to_radians();

    let u1 = ((1.0 - f) * lat1.tan()).atan();
    let u2 = ((1.0 - f) * lat2.tan()).atan();
    let (sin_u1, cos_u1) = u1.sin_cos();
    let (sin_u2, cos_u2) = u2.sin_cos();

    let mut lambda = big_l;
    let mut iterations = 0;
    let (sin_sigma, cos_sigma, sigma, cos_sq_alpha, cos_2sigma_m, converged) = loop {
        let sin_lambda = lambda.sin();
        let cos_lambda = lambda.cos();

        let sin_sigma = ((cos_u2 * sin_lambda).powi(2)
            + (cos_u1 * sin_u2 - sin_u1 * cos_u2 * cos_lambda).powi(2))
        .sqrt();

        // 一致点
        if sin_sigma == 0.0 {
            return InverseSolution {
                distance_m: 0.0,
                azimuth: 0.0,
                reverse_azimuth: 0.0,
            };
        }

        let cos_sigma = sin_u1 * sin_u2 + cos_u1 * cos_u2 * cos_lambda;
        let sigma = sin_sigma.atan2(cos_sigma);
        let sin_alpha = cos_u1 * cos_u2 * sin_lambda / sin_sigma;
        let cos_sq_alpha = 1.0 - sin_alpha * sin_alpha;

        // 赤道上の測地線では cos_sq_alpha = 0
        let cos_2sigma_m = if cos_sq_alpha != 0.0 {
            cos_sigma - 2.0 * sin_u1 * sin_u2 / cos_sq_alpha
        } else {
            0.0
        };

        let c = f / 16.0 * cos_sq_alpha * (4.0 + f * (4.0 - 3.0 * cos_sq_alpha));
        let lambda_next = big_l
            + (1.0 - c)
                * f
                * sin_alpha
                * (sigma
                    + c * sin_sigma
                        * (cos_2sigma_m
                            + c * cos_sigma * (-1.0 + 2.0 * cos_2sigma_m * cos_2sigma_m)));

        let converged = (lambda_next - lambda).abs() < CONVERGENCE_TOLERANCE;
        iterations += 1;
        lambda = lambda_next;
        if converged || iterations >= MAX_ITERATIONS {
            break (sin_sigma, cos_sigma, sigma, cos_sq_alpha, cos_2sigma_m, converged);
        }
    };

    if !converged {
        warn!(
            start_lat = start.latitude,
            start_lon = start.longitude,
            end_lat = end.latitude,
            end_lon = end.longitude,
            "逆測地問題が収束しませんでした。最終反復値を使用します"
        );
    }

    let u_sq = cos_sq_alpha * (a * a - b * b) / (b * b);
    let big_a = 1.0 + u_sq / 16384.0 * (4096.0 + u_sq * (-768.0 + u_sq * (320.0 - 175.0 * u_sq)));
    let big_b = u_sq / 1024.0 * (256.0 + u_sq * (-128.0 + u_sq * (74.0 - 47.0 * u_sq)));
    let delta_sigma = big_b
        * sin_sigma
        * (cos_2sigma_m
            + big_b / 4.0
                * (cos_sigma * (-1.0 + 2.0 * cos_2sigma_m * cos_2sigma_m)
                    - big_b / 6.0
                        * cos_2sigma_m
                        * (-3.0 + 4.0 * sin_sigma * sin_sigma)
                        * (-3.0 + 4.0 * cos_2sigma_m * cos_2sigma_m)));

    let distance_m = b * big_a * (sigma - delta_sigma);

    let sin_lambda = lambda.sin();
    let cos_lambda = lambda.cos();
    let alpha1 = (cos_u2 * sin_lambda).atan2(cos_u1 * sin_u2 - sin_u1 * cos_u2 * cos_lambda);
    let alpha2 = (cos_u1 * sin_lambda).atan2(-sin_u1 * cos_u2 + cos_u1 * sin_u2 * cos_lambda);

    InverseSolution {
        distance_m,
        azimuth: normalize_azimuth(alpha1.to_degrees()),
        reverse_azimuth: normalize_azimuth(alpha2.to_degrees() + 180.0),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn loc(lat: f64, lon: f64) -> Location4D {
        Location4D::new(lat, lon, 0.0, 0.0)
    }

    #[test]
    fn test_normalize_longitude() {
        assert_eq!(normalize_longitude(190.0), -170.0);
        assert_eq!(normalize_longitude(-190.0), 170.0);
        assert_eq!(normalize_longitude(180.0), 180.0);
        assert_eq!(normalize_longitude(-80.0), -80.0);
    }

    #[test]
    fn test_normalize_azimuth() {
        assert_eq!(normalize_azimuth(-90.0), 270.0);
        assert_eq!(normalize_azimuth(450.0), 90.0);
        assert_eq!(normalize_azimuth(0.0), 0.0);
    }

    #[test]
    fn test_inverse_coincident_points() {
        let p = loc(28.0, -80.0);
        let solution = solve_inverse(&p, &p, &Ellipsoid::WGS84);
        assert_eq!(solution.distance_m, 0.0);
        assert_eq!(solution.azimuth, 0.0);
        assert_eq!(solution.reverse_azimuth, 0.0);
    }

    #[test]
    fn test_direct_zero_distance() {
        let p = loc(28.0, -80.0);
        let solution = solve_direct(&p, 45.0, 0.0, &Ellipsoid::WGS84);
        assert_eq!(solution.latitude, p.latitude);
        assert_eq!(solution.longitude, p.longitude);
        assert_eq!(solution.reverse_azimuth, 225.0);
    }

    #[test]
    fn test_one_degree_of_latitude_on_meridian() {
        // 赤道付近の子午線弧 1 度はおよそ 110.57 km
        let start = loc(0.0, 0.0);
        let end = loc(1.0, 0.0);
        let solution = solve_inverse(&start, &end, &Ellipsoid::WGS84);
        assert!((solution.distance_m - 110_574.0).abs() < 100.0, "distance: {}", solution.distance_m);
        assert!(solution.azimuth.abs() < 1e-6);
        assert!((solution.reverse_azimuth - 180.0).abs() < 1e-6);
    }

    #[test]
    fn test_inverse_then_direct_round_trip() {
        let cases = [
            (loc(28.0, -80.0), loc(28.5, -79.5)),
            (loc(-35.0, 150.0), loc(-34.0, 151.5)),
            (loc(60.0, 5.0), loc(59.0, 4.0)),
            (loc(0.5, 179.5), loc(0.0, -179.5)),
        ];
        for (start, end) in cases {
            let inverse = solve_inverse(&start, &end, &Ellipsoid::WGS84);
            let direct = solve_direct(&start, inverse.azimuth, inverse.distance_m, &Ellipsoid::WGS84);
            assert!(
                (direct.latitude - end.latitude).abs() < 1e-6,
                "latitude mismatch: {} vs {}",
                direct.latitude,
                end.latitude
            );
            assert!(
                (direct.longitude - end.longitude).abs() < 1e-6,
                "longitude mismatch: {} vs {}",
                direct.longitude,
                end.longitude
            );
        }
    }

    #[test]
    fn test_direct_matches_reverse_inverse() {
        // 直接問題の逆方位角で戻ると始点に一致する
        let start = loc(28.0, -80.0);
        let direct = solve_direct(&start, 63.0, 50_000.0, &Ellipsoid::WGS84);
        let end = loc(direct.latitude, direct.longitude);
        let back = solve_direct(&end, direct.reverse_azimuth, 50_000.0, &Ellipsoid::WGS84);
        assert!((back.latitude - start.latitude).abs() < 1e-6);
        assert!((back.longitude - start.longitude).abs() < 1e-6);
    }

    #[test]
    fn test_custom_ellipsoid() {
        // 球でも妥当な距離になる（半径 6371km の大円 1 度 ≈ 111.19 km）
        let sphere = Ellipsoid::new(6_371_000.0, 6_371_000.0);
        let solution = solve_inverse(&loc(0.0, 0.0), &loc(0.0, 1.0), &sphere);
        assert!((solution.distance_m - 111_195.0).abs() < 10.0);
    }

    #[test]
    fn test_location_normalizes_longitude() {
        let p = Location4D::new(10.0, 185.0, 5.0, 0.0);
        assert_eq!(p.longitude, -175.0);
        assert_eq!(p.with_depth(3.0).depth, 3.0);
        assert_eq!(p.with_time(60.0).time, 60.0);
    }
}
