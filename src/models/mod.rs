// 移動モデルの共通データ型
pub mod common;

// 移動モデルの基本インターフェース（trait）定義
pub mod traits;

// 各モデルの実装
pub mod behavior;
pub mod lifestage;
pub mod particle;
pub mod transport;

// 便利な re-export
pub use behavior::LarvaBehavior;
pub use common::MovementResult;
pub use lifestage::LifeStage;
pub use particle::Particle;
pub use traits::MovementModel;
pub use transport::Transport;
