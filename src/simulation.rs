//! # Simulation モジュール
//!
//! 大口径火器の発射による周辺兵士への効果を評価するエンジンを提供します。
//!
//! シナリオ設定から火器・効果エリア・兵士配置を構築し、1回の発射で
//! 全兵士に対する解決処理を実行します。結果はコンソールに出力され、
//! 効果エリアの種類ごとの集計として [`FireReport`] にまとめられます。
//!
//! ## 処理順序
//!
//! 1. **火器の構築**: 口径・姿勢の検証と効果エリアの取り付け
//! 2. **兵士の配置**: ランダム生成または明示リスト
//! 3. **発射**: 口径が閾値を超える場合のみ効果を解決・適用
//! 4. **集計**: 影響を受けた兵士数、最大効果時間
//!
//! ## 使用例
//!
//! ```rust,ignore
//! let config = ScenarioConfig::from_file("scenarios/demo.yaml")?;
//! let mut engine = SimulationEngine::new(config, 1);
//! engine.initialize()?;
//! engine.run()?;
//! ```

use crate::models::*;
use crate::scenario::*;
use tracing::{info, debug, warn};

/// 1回の発射の集計結果
#[derive(Debug, Clone, PartialEq)]
pub struct FireReport {
    /// 大口径として発射処理が行われたか
    pub fired: bool,
    pub soldiers_total: usize,
    /// 効果エリアの種類ごとの影響兵士数
    pub affected_by_type: Vec<(AreaType, usize)>,
    /// シンクへ適用された効果（呼び出し順）
    pub applied_effects: Vec<AppliedEffect>,
    pub resolution: Vec<SoldierResolution>,
}

impl FireReport {
    fn new(fired: bool, soldiers_total: usize, resolution: Vec<SoldierResolution>, applied_effects: Vec<AppliedEffect>) -> Self {
        let mut affected_by_type: Vec<(AreaType, usize)> = [AreaType::Flash, AreaType::HighEffect, AreaType::LowEffect]
            .into_iter()
            .map(|area_type| (area_type, 0))
            .collect();

        for outcome in resolution.iter().filter_map(|entry| entry.outcome) {
            if let Some(entry) = affected_by_type.iter_mut().find(|(t, _)| *t == outcome.area_type) {
                entry.1 += 1;
            }
        }

        Self {
            fired,
            soldiers_total,
            affected_by_type,
            applied_effects,
            resolution,
        }
    }

    /// 影響を受けた兵士数
    pub fn affected_total(&self) -> usize {
        self.affected_by_type.iter().map(|(_, count)| count).sum()
    }

    /// チャネルごとに効果時間が最大の適用記録
    ///
    /// 誰も影響を受けていなければ `None`。係数が負のエリアでは負の値になりうるが、
    /// 0で切り上げずにそのまま返す。同値の場合は先に適用された兵士。
    pub fn max_effect(&self, channel: EffectChannel) -> Option<&AppliedEffect> {
        self.applied_effects
            .iter()
            .filter(|effect| effect.channel == channel)
            .fold(None, |best: Option<&AppliedEffect>, effect| match best {
                Some(best) if best.duration >= effect.duration => Some(best),
                _ => Some(effect),
            })
    }

    pub fn print_summary(&self) {
        println!("=== 発射結果 ===");
        if !self.fired {
            println!("小口径のため周辺への効果はありません");
            return;
        }
        let unaffected = self.resolution.iter().filter(|entry| entry.outcome.is_none()).count();
        println!("兵士数: {}名", self.soldiers_total);
        println!("影響を受けた兵士: {}名 (効果なし: {}名)", self.affected_total(), unaffected);
        for (area_type, count) in &self.affected_by_type {
            println!("  {}: {}名", area_type, count);
        }
        for (label, channel) in [("最大失明時間", EffectChannel::Blindness), ("最大難聴時間", EffectChannel::Deafness)] {
            match self.max_effect(channel) {
                Some(effect) => println!("{}: {:.2}秒 (兵士 {})", label, effect.duration, effect.soldier_id),
                None => println!("{}: なし", label),
            }
        }
    }
}

pub struct SimulationEngine {
    pub scenario_config: ScenarioConfig,
    pub verbose_level: u8,

    pub weapon: Option<Weapon>,
    pub roster: SoldierRoster,
    pub report: Option<FireReport>,
}

impl SimulationEngine {
    pub fn new(scenario: ScenarioConfig, verbose_level: u8) -> Self {
        Self {
            scenario_config: scenario,
            verbose_level,
            weapon: None,
            roster: SoldierRoster::from_soldiers(Vec::new()),
            report: None,
        }
    }

    pub fn initialize(&mut self) -> Result<(), Box<dyn std::error::Error>> {
        if self.verbose_level > 0 {
            info!("シミュレーションエンジンを初期化中...");
        }

        let weapon = self.scenario_config.build_weapon()?;
        self.roster = self.scenario_config.build_roster();

        if self.verbose_level > 1 {
            for (index, soldier) in self.roster.as_slice().iter().enumerate() {
                debug!(index, soldier_id = soldier.id, position = %soldier.position, "兵士配置");
            }
        }

        if self.verbose_level > 0 {
            info!("初期化完了:");
            info!("  火器: 口径 {:.1}mm", weapon.caliber_mm());
            info!("  銃口: 位置 {} 向き {}", weapon.position(), weapon.direction());
            info!("  効果エリア: {}", weapon.effect_areas().len());
            info!("  兵士: {}名", self.roster.len());
        }

        self.weapon = Some(weapon);

        Ok(())
    }

    /// 初期化後に火器の口径・向きを変更する
    ///
    /// `traverse_deg` は現在の向きを鉛直軸周りに回す角度（度、左回りが正）。
    pub fn adjust_weapon(&mut self, caliber_mm: Option<f64>, traverse_deg: Option<f64>) -> Result<(), Box<dyn std::error::Error>> {
        let weapon = self
            .weapon
            .as_mut()
            .ok_or("シミュレーションエンジンが初期化されていません")?;

        if let Some(caliber_mm) = caliber_mm {
            weapon.set_caliber(caliber_mm)?;
        }
        if let Some(traverse_deg) = traverse_deg {
            let direction = math_utils::rotate_about_vertical(weapon.direction(), traverse_deg);
            weapon.set_direction(direction)?;
        }

        info!(
            caliber_mm = weapon.caliber_mm(),
            direction = %weapon.direction(),
            "WEAPON_ADJUSTED: 火器の設定を変更しました"
        );
        Ok(())
    }

    /// 発射して効果を解決・適用する
    pub fn run(&mut self) -> Result<&FireReport, Box<dyn std::error::Error>> {
        let weapon = self
            .weapon
            .as_ref()
            .ok_or("シミュレーションエンジンが初期化されていません")?;
        let environment = self.scenario_config.environment;

        info!("=== 発射 ===");
        if self.roster.is_empty() {
            warn!("兵士が配置されていません");
        }

        let mut console = ConsoleSink::default();
        let mut recording = RecordingSink::default();
        let fired;
        let resolution;
        {
            let sink = FanOutSink {
                sinks: vec![&mut console as &mut dyn EffectSink, &mut recording],
            };
            let mut handler = EffectsOnNearbyUnits::new(environment, sink);
            fired = weapon.fire(self.roster.as_slice(), &environment, &mut handler);
            resolution = handler.last_resolution;
        }

        let report = FireReport::new(fired, self.roster.len(), resolution, recording.effects);

        info!(
            fired = report.fired,
            affected = report.affected_total(),
            reported = console.reported,
            "=== 発射処理完了 ==="
        );

        Ok(self.report.insert(report))
    }
}
