// 海岸線（ポリライン）との交差判定と反応則
pub mod shoreline;

// 海底地形（深度場）による深度クランプ
pub mod bathymetry;

// 便利な re-export
pub use bathymetry::Bathymetry;
pub use shoreline::{CoastlineFeature, CoastlineHit, ReactionPolicy, Shoreline};
