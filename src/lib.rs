//! # larvasim
//!
//! 幼生粒子（魚類・無脊椎動物の幼生など）の漂流と発達を追跡する
//! ラグランジュ輸送シミュレーション。放流点から離散時間ステップで
//! 粒子群を前進させ、輸送（海流による移流）と行動（生活段階依存の
//! 鉛直遊泳）を合成し、海岸線・海底地形・海面の境界制約を適用します。

pub mod boundaries;
pub mod fields;
pub mod geo;
pub mod logging;
pub mod models;
pub mod scenario;
pub mod simulation;
