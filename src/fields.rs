//! # Fields モジュール
//!
//! 外部協調コンポーネントの抽象インターフェースを提供します。
//!
//! - `FieldProvider`: 任意の位置・時刻における環境場（流速・水温など）の問い合わせ
//! - `RandomProvider`: 非負の乱数スカラーの供給（確率的な変位成分に使用）
//!
//! いずれもエンジンへ明示的に注入します。プロセス全体で共有する
//! シングルトンやハードコードされたリソースパスは使用しません。

use std::collections::HashMap;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::geo::{normalize_longitude, Location4D};

/// 環境場プロバイダのインターフェース
///
/// 格子データの裏付けがある場合は最近傍または補間参照で実装されます。
/// 変数が未定義の位置・時刻では None を返します。
pub trait FieldProvider {
    fn query(&self, variable: &str, location: &Location4D, time_s: f64) -> Option<f64>;
}

/// 一様な値を返す環境場（テストおよび定常強制用）
#[derive(Debug, Clone, Default)]
pub struct ConstantField {
    values: HashMap<String, f64>,
}

impl ConstantField {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, variable: &str, value: f64) -> Self {
        self.values.insert(variable.to_string(), value);
        self
    }
}

impl FieldProvider for ConstantField {
    fn query(&self, variable: &str, _location: &Location4D, _time_s: f64) -> Option<f64> {
        self.values.get(variable).copied()
    }
}

/// 規則格子上の単一変数を最近傍参照する環境場
///
/// 経度軸が [0, 360] 系で与えられた場合は [-180, 180] に正規化して保持します。
#[derive(Debug, Clone)]
pub struct GriddedField {
    variable: String,
    lats: Vec<f64>,
    lons: Vec<f64>,
    /// values[lat_index][lon_index]
    values: Vec<Vec<f64>>,
}

impl GriddedField {
    pub fn new(variable: &str, lats: Vec<f64>, lons: Vec<f64>, values: Vec<Vec<f64>>) -> Self {
        let lons = lons.into_iter().map(normalize_longitude).collect();
        Self {
            variable: variable.to_string(),
            lats,
            lons,
            values,
        }
    }

    /// 最近傍の格子インデックスを返す（格子が空なら None）
    fn nearest_index(axis: &[f64], value: f64) -> Option<usize> {
        if axis.is_empty() {
            return None;
        }
        let mut best = 0;
        let mut best_distance = f64::INFINITY;
        for (i, v) in axis.iter().enumerate() {
            let d = (v - value).abs();
            if d < best_distance {
                best_distance = d;
                best = i;
            }
        }
        Some(best)
    }

    pub fn value_at(&self, latitude: f64, longitude: f64) -> Option<f64> {
        let i = Self::nearest_index(&self.lats, latitude)?;
        let j = Self::nearest_index(&self.lons, normalize_longitude(longitude))?;
        self.values.get(i).and_then(|row| row.get(j)).copied()
    }
}

impl FieldProvider for GriddedField {
    fn query(&self, variable: &str, location: &Location4D, _time_s: f64) -> Option<f64> {
        if variable != self.variable {
            return None;
        }
        self.value_at(location.latitude, location.longitude)
    }
}

/// 非負の乱数スカラーを供給するインターフェース
pub trait RandomProvider {
    /// [0, 1) の一様乱数を返す
    fn next_nonnegative(&mut self) -> f64;
}

/// シード指定で再現可能な乱数プロバイダ
pub struct SeededRandom {
    rng: StdRng,
}

impl SeededRandom {
    pub fn from_seed(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl RandomProvider for SeededRandom {
    fn next_nonnegative(&mut self) -> f64 {
        self.rng.gen_range(0.0..1.0)
    }
}
