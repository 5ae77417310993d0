//! # 周辺ユニットへの発射効果
//!
//! 大口径火器の発射時に、周辺の兵士へ失明・難聴効果を適用します。
//!
//! ## 解決手順
//!
//! 1. 効果エリアを優先度順（VeryHigh が先頭）に並べる。同じ優先度では取り付け順を保つ
//! 2. 兵士ごとにその順でエリアを調べ、最初に内部判定されたエリアのみを採用する
//! 3. 採用エリアについて、銃口からの直線距離に応じて効果時間を線形補間する
//!
//! 重なったエリアのうち、1人の兵士が効果を受けるのは1つのエリアだけです。

use tracing::{debug, trace};
use crate::models::{
    common::{EffectChannel, EnvironmentConstants, Vector3D, math_utils},
    effect_area::{AreaPriority, AreaType, EffectArea},
    soldier::Soldier,
    traits::{EffectSink, WeaponFiredHandler},
    weapon::{MuzzlePose, Weapon},
};

/// 採用されたエリアと各チャネルの効果時間
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EffectOutcome {
    /// 火器に取り付けた順でのエリアのインデックス
    pub area_index: usize,
    pub area_type: AreaType,
    pub priority: AreaPriority,
    /// 失明時間（秒）
    pub blindness_duration: f64,
    /// 難聴時間（秒）
    pub deafness_duration: f64,
}

impl EffectOutcome {
    pub fn duration(&self, channel: EffectChannel) -> f64 {
        match channel {
            EffectChannel::Blindness => self.blindness_duration,
            EffectChannel::Deafness => self.deafness_duration,
        }
    }
}

/// 兵士1人分の解決結果（`None` は効果なし）
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SoldierResolution {
    pub soldier_id: u32,
    pub position: Vector3D,
    pub outcome: Option<EffectOutcome>,
}

/// 効果エリアのインデックスを優先度順に並べる
///
/// 安定ソートなので、同じ優先度のエリアは取り付け順のまま。
pub fn priority_order(areas: &[EffectArea]) -> Vec<usize> {
    let mut order: Vec<usize> = (0..areas.len()).collect();
    order.sort_by_key(|&index| areas[index].priority());
    order
}

/// 効果時間の計算
///
/// 銃口からの直線距離をエリア長で割った比率で、先端の係数から底面の係数へ
/// 線形に補間する。係数は上限1でのみ丸め、下限は丸めない。
///
/// # 引数
///
/// * `position` - 兵士の位置
/// * `area` - 兵士が内部にいる効果エリア
/// * `pose` - 発射時の銃口状態
/// * `max_duration` - そのチャネルの最大効果時間（秒）
///
/// # 戻り値
///
/// 小数点以下2桁に丸めた効果時間（秒）
pub fn get_duration(position: Vector3D, area: &EffectArea, pose: &MuzzlePose, max_duration: f64) -> f64 {
    let impact_factor = impact_factor_at(position, area, pose);
    math_utils::round_2(impact_factor * max_duration)
}

/// 兵士位置での効果係数（上限1で丸め済み）
pub fn impact_factor_at(position: Vector3D, area: &EffectArea, pose: &MuzzlePose) -> f64 {
    let distance = position.distance_3d(&pose.position);

    // 銃口で0、底面で1。底面の縁付近では1を超えることがある
    let proportional_distance = distance / area.get_length(pose);

    let tip = area.impact_factor_at_tip();
    let base = area.impact_factor_at_base();
    let impact_factor = (tip - base) * (1.0 - proportional_distance) + base;

    impact_factor.min(1.0)
}

/// 周辺ユニットへの発射効果の適用
///
/// 発射ハンドラとして `Weapon::fire` に渡して使う。
#[derive(Debug)]
pub struct EffectsOnNearbyUnits<S: EffectSink> {
    pub environment: EnvironmentConstants,
    pub sink: S,
    /// 直近の発射で得られた解決結果
    pub last_resolution: Vec<SoldierResolution>,
}

impl<S: EffectSink> EffectsOnNearbyUnits<S> {
    pub fn new(environment: EnvironmentConstants, sink: S) -> Self {
        Self {
            environment,
            sink,
            last_resolution: Vec::new(),
        }
    }

    /// 全兵士について採用エリアと効果時間を求める（副作用なし）
    ///
    /// 結果は兵士の並び順で1人1件。兵士がいない、またはエリアが無い場合は
    /// 全員「効果なし」になる。
    pub fn resolve(&self, soldiers: &[Soldier], weapon: &Weapon) -> Vec<SoldierResolution> {
        let pose = weapon.pose();
        let areas = weapon.effect_areas();
        let order = priority_order(areas);

        soldiers
            .iter()
            .map(|soldier| {
                let outcome = order
                    .iter()
                    .map(|&index| (index, &areas[index]))
                    .find(|(_, area)| area.contains(&pose, soldier.position))
                    .map(|(index, area)| self.outcome_for(soldier, index, area, &pose));

                SoldierResolution {
                    soldier_id: soldier.id,
                    position: soldier.position,
                    outcome,
                }
            })
            .collect()
    }

    fn outcome_for(&self, soldier: &Soldier, area_index: usize, area: &EffectArea, pose: &MuzzlePose) -> EffectOutcome {
        let blindness_duration = get_duration(
            soldier.position,
            area,
            pose,
            self.environment.max_duration(EffectChannel::Blindness),
        );
        let deafness_duration = get_duration(
            soldier.position,
            area,
            pose,
            self.environment.max_duration(EffectChannel::Deafness),
        );

        trace!(
            soldier_id = soldier.id,
            area_index,
            area_type = %area.area_type(),
            blindness_duration,
            deafness_duration,
            "SOLDIER_RESOLVED: 採用エリアが決まりました"
        );

        EffectOutcome {
            area_index,
            area_type: area.area_type(),
            priority: area.priority(),
            blindness_duration,
            deafness_duration,
        }
    }

    /// 解決処理を行い、影響を受けた兵士ごとに失明・難聴を適用する
    ///
    /// シンクは兵士の並び順に、失明、難聴の順で呼び出される。
    pub fn apply_blindness_and_deafness(&mut self, soldiers: &[Soldier], weapon: &Weapon) -> &[SoldierResolution] {
        let resolution = self.resolve(soldiers, weapon);

        for entry in &resolution {
            let Some(outcome) = entry.outcome else {
                continue;
            };

            for channel in [EffectChannel::Blindness, EffectChannel::Deafness] {
                self.sink.apply(entry.soldier_id, channel, outcome.duration(channel));
            }

            debug!(
                soldier_id = entry.soldier_id,
                position = %entry.position,
                area_index = outcome.area_index,
                area_type = %outcome.area_type,
                priority = ?outcome.priority,
                "SOLDIER_IN_EFFECT_AREA: 兵士が効果エリア内にいます"
            );
        }

        self.last_resolution = resolution;
        &self.last_resolution
    }
}

impl<S: EffectSink> WeaponFiredHandler for EffectsOnNearbyUnits<S> {
    fn on_weapon_fired(&mut self, soldiers: &[Soldier], weapon: &Weapon) {
        self.apply_blindness_and_deafness(soldiers, weapon);
    }
}
