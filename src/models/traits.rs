use crate::models::{
    common::EffectChannel,
    soldier::Soldier,
    weapon::Weapon,
};

/// 火器発射の通知を受け取るインターフェース
///
/// `Weapon::fire` に明示的に渡す。大口径火器の場合のみ呼び出される。
pub trait WeaponFiredHandler {
    /// 発射時の処理
    fn on_weapon_fired(&mut self, soldiers: &[Soldier], weapon: &Weapon);
}

/// 効果の適用先（ゲーム状態の書き込み、コンソール出力など）
///
/// 影響を受けた兵士ごと、チャネルごとに1回、兵士の並び順で呼び出される。
pub trait EffectSink {
    fn apply(&mut self, soldier_id: u32, channel: EffectChannel, duration: f64);
}
