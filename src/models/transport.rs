use crate::geo::{self, Ellipsoid, Location4D};
use crate::models::common::MovementResult;
use crate::models::particle::Particle;
use crate::models::traits::MovementModel;

/// 受動輸送（移流）モデル
///
/// 周囲の流速 (u, v, w) によるステップ内の変位を計算します。
/// 水平変位は測地線の直接問題で求め、鉛直変位は w・Δt を深度へ反映します
/// （w は上向き正、深度は下向き正なので正の w で深度が減少します）。
pub struct Transport {
    ellipsoid: Ellipsoid,
}

impl Transport {
    pub fn new(ellipsoid: Ellipsoid) -> Self {
        Self { ellipsoid }
    }
}

impl Default for Transport {
    fn default() -> Self {
        Self::new(Ellipsoid::WGS84)
    }
}

impl MovementModel for Transport {
    fn name(&self) -> &str {
        "transport"
    }

    fn move_particle(
        &self,
        _particle: &Particle,
        location: &Location4D,
        u: f64,
        v: f64,
        w: f64,
        step_s: f64,
    ) -> MovementResult {
        let east_m = u * step_s;
        let north_m = v * step_s;
        let vertical_m = -w * step_s; // 下向き正に変換

        let distance_m = (east_m * east_m + north_m * north_m).sqrt();
        let depth = location.depth + vertical_m;

        if distance_m == 0.0 {
            let mut result = MovementResult::stationary(location.latitude, location.longitude, depth);
            result.vertical_distance_m = vertical_m;
            result.vertical_angle_deg = if vertical_m > 0.0 {
                90.0
            } else if vertical_m < 0.0 {
                -90.0
            } else {
                0.0
            };
            return result;
        }

        let azimuth_deg = geo::normalize_azimuth(east_m.atan2(north_m).to_degrees());
        let solution = geo::solve_direct(location, azimuth_deg, distance_m, &self.ellipsoid);

        MovementResult {
            latitude: solution.latitude,
            longitude: solution.longitude,
            depth,
            distance_m,
            azimuth_deg,
            reverse_azimuth_deg: solution.reverse_azimuth,
            vertical_distance_m: vertical_m,
            vertical_angle_deg: vertical_m.atan2(distance_m).to_degrees(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geo::Location4D;

    fn particle_at(lat: f64, lon: f64, depth: f64) -> Particle {
        Particle::new(0, Location4D::new(lat, lon, depth, 0.0))
    }

    #[test]
    fn test_zero_velocity_is_stationary() {
        let transport = Transport::default();
        let particle = particle_at(28.0, -80.0, 5.0);
        let result = transport.move_particle(&particle, particle.location(), 0.0, 0.0, 0.0, 3600.0);
        assert_eq!(result.latitude, 28.0);
        assert_eq!(result.longitude, -80.0);
        assert_eq!(result.depth, 5.0);
        assert_eq!(result.distance_m, 0.0);
    }

    #[test]
    fn test_northward_current_moves_north() {
        let transport = Transport::default();
        let particle = particle_at(28.0, -80.0, 0.0);
        // v = 1 m/s で 1 時間 → 北へ 3600 m
        let result = transport.move_particle(&particle, particle.location(), 0.0, 1.0, 0.0, 3600.0);
        assert!(result.latitude > 28.0);
        assert!((result.longitude - -80.0).abs() < 1e-9);
        assert_eq!(result.distance_m, 3600.0);
        assert_eq!(result.azimuth_deg, 0.0);
        // 逆方位角はほぼ真南
        assert!((result.reverse_azimuth_deg - 180.0).abs() < 0.1);
    }

    #[test]
    fn test_eastward_current_azimuth_is_90() {
        let transport = Transport::default();
        let particle = particle_at(0.0, 0.0, 0.0);
        let result = transport.move_particle(&particle, particle.location(), 0.5, 0.0, 0.0, 3600.0);
        assert!((result.azimuth_deg - 90.0).abs() < 1e-9);
        assert!(result.longitude > 0.0);
        assert!(result.latitude.abs() < 1e-9);
    }

    #[test]
    fn test_upward_velocity_decreases_depth() {
        let transport = Transport::default();
        let particle = particle_at(28.0, -80.0, 100.0);
        // w = 0.01 m/s 上向きで 1 時間 → 深度 36 m 減
        let result = transport.move_particle(&particle, particle.location(), 0.0, 0.0, 0.01, 3600.0);
        assert_eq!(result.depth, 64.0);
        assert_eq!(result.vertical_distance_m, -36.0);
        assert_eq!(result.vertical_angle_deg, -90.0);
    }

    #[test]
    fn test_combined_displacement_magnitude() {
        let transport = Transport::default();
        let particle = particle_at(28.0, -80.0, 0.0);
        let result = transport.move_particle(&particle, particle.location(), 0.3, 0.4, 0.0, 1000.0);
        // 3-4-5 の直角三角形
        assert!((result.distance_m - 500.0).abs() < 1e-9);
        let expected_azimuth = (300.0_f64).atan2(400.0).to_degrees();
        assert!((result.azimuth_deg - expected_azimuth).abs() < 1e-9);
    }
}
