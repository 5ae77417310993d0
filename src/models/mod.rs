// 基本的なデータ型と数学ユーティリティ（円錐判定を含む）
pub mod common;

// 発射通知・効果適用のインターフェース（trait）定義
pub mod traits;

// 各モデルの実装
pub mod effect_area;
pub mod weapon;
pub mod soldier;
pub mod effects;
pub mod sink;

// 便利な re-export
pub use common::*;
pub use traits::*;
pub use effect_area::{EffectArea, AreaType, AreaPriority, AreaRange, DEFAULT_CONE_ANGLE_DEG};
pub use weapon::{Weapon, WeaponError};
pub use soldier::{Soldier, SoldierRoster};
pub use effects::{EffectsOnNearbyUnits, SoldierResolution};
pub use sink::{ConsoleSink, RecordingSink, FanOutSink, AppliedEffect};
