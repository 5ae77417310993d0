use tracing::{debug, info};
use crate::models::{
    common::{Vector3D, EnvironmentConstants},
    effect_area::EffectArea,
    soldier::Soldier,
    traits::WeaponFiredHandler,
};

/// 発射時点の銃口状態のスナップショット
///
/// 効果エリアの形状計算にはこの値を渡す。1回の解決処理の間は同じ値を使う。
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MuzzlePose {
    /// 銃口位置（Zは高さ）
    pub position: Vector3D,
    /// 銃口の向き
    pub direction: Vector3D,
    /// 口径（mm）
    pub caliber_mm: f64,
}

/// 火器・効果エリアの構築エラー
#[derive(Debug, Clone, PartialEq)]
pub enum WeaponError {
    NonPositiveCaliber(f64),
    ZeroDirection,
    NonFiniteDirection,
    InvalidConeAngle(f64),
}

impl std::fmt::Display for WeaponError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            WeaponError::NonPositiveCaliber(caliber) => {
                write!(f, "口径は正の値である必要があります: {}mm", caliber)
            }
            WeaponError::ZeroDirection => {
                write!(f, "銃口の向きがゼロベクトルです")
            }
            WeaponError::NonFiniteDirection => {
                write!(f, "銃口の向きに有限でない成分が含まれています")
            }
            WeaponError::InvalidConeAngle(angle) => {
                write!(f, "半頂角は0度より大きく90度未満である必要があります: {}度", angle)
            }
        }
    }
}

impl std::error::Error for WeaponError {}

/// 銃口を持つ単純な火器
///
/// 効果エリアは構築後に取り付ける。取り付け順は保持するが、
/// 解決処理では優先度順に並べ替えて評価する（火器自体のリストは変更しない）。
#[derive(Debug, Clone)]
pub struct Weapon {
    /// 口径（mm）
    caliber_mm: f64,
    direction: Vector3D,
    position: Vector3D,
    effect_areas: Vec<EffectArea>,
}

impl Weapon {
    /// 新しい火器を作成します
    ///
    /// # 引数
    ///
    /// * `caliber_mm` - 口径（mm、正の値）
    /// * `direction` - 銃口の向き（ゼロ以外）
    /// * `position` - 銃口位置
    pub fn new(caliber_mm: f64, direction: Vector3D, position: Vector3D) -> Result<Self, WeaponError> {
        Self::check_caliber(caliber_mm)?;
        Self::check_direction(direction)?;

        Ok(Self {
            caliber_mm,
            direction,
            position,
            effect_areas: Vec::new(),
        })
    }

    fn check_caliber(caliber_mm: f64) -> Result<(), WeaponError> {
        // NaNもここで弾く
        if !(caliber_mm > 0.0) {
            return Err(WeaponError::NonPositiveCaliber(caliber_mm));
        }
        Ok(())
    }

    /// 向きの検証
    ///
    /// 大きさは問わない（使用時に正規化する）。
    pub fn check_direction(direction: Vector3D) -> Result<(), WeaponError> {
        if !direction.is_finite() {
            return Err(WeaponError::NonFiniteDirection);
        }
        if direction.is_zero() {
            return Err(WeaponError::ZeroDirection);
        }
        Ok(())
    }

    pub fn caliber_mm(&self) -> f64 {
        self.caliber_mm
    }

    pub fn direction(&self) -> Vector3D {
        self.direction
    }

    pub fn position(&self) -> Vector3D {
        self.position
    }

    pub fn set_caliber(&mut self, caliber_mm: f64) -> Result<(), WeaponError> {
        Self::check_caliber(caliber_mm)?;
        self.caliber_mm = caliber_mm;
        Ok(())
    }

    pub fn set_direction(&mut self, direction: Vector3D) -> Result<(), WeaponError> {
        Self::check_direction(direction)?;
        self.direction = direction;
        Ok(())
    }

    /// 現在の銃口状態のスナップショット
    pub fn pose(&self) -> MuzzlePose {
        MuzzlePose {
            position: self.position,
            direction: self.direction,
            caliber_mm: self.caliber_mm,
        }
    }

    /// 効果エリアを取り付ける
    pub fn attach_effect_area(&mut self, area: EffectArea) {
        debug!(
            area_type = %area.area_type(),
            priority = ?area.priority(),
            rotation_deg = area.rotation_deg(),
            cone_angle_deg = area.cone_angle_deg(),
            length_factor = ?area.length_factor(),
            length_m = area.get_length(&self.pose()),
            "EFFECT_AREA_ATTACHED: 効果エリアを取り付けました"
        );
        self.effect_areas.push(area);
    }

    /// 取り付け順の効果エリア
    pub fn effect_areas(&self) -> &[EffectArea] {
        &self.effect_areas
    }

    /// 大口径火器かどうか（閾値より大きい口径）
    pub fn is_large_weapon(&self, min_caliber_for_large_weapon_mm: f64) -> bool {
        self.caliber_mm > min_caliber_for_large_weapon_mm
    }

    /// 発射
    ///
    /// 大口径火器の場合のみ `handler` に発射を通知する。
    ///
    /// # 戻り値
    ///
    /// ハンドラが呼び出された場合はtrue
    pub fn fire(
        &self,
        soldiers: &[Soldier],
        environment: &EnvironmentConstants,
        handler: &mut dyn WeaponFiredHandler,
    ) -> bool {
        if !self.is_large_weapon(environment.min_caliber_for_large_weapon_mm) {
            debug!(
                caliber_mm = self.caliber_mm,
                threshold_mm = environment.min_caliber_for_large_weapon_mm,
                "WEAPON_FIRED_SMALL: 小口径のため周辺への効果はありません"
            );
            return false;
        }

        handler.on_weapon_fired(soldiers, self);

        info!(
            direction = %self.direction,
            position = %self.position,
            caliber_mm = self.caliber_mm,
            soldiers = soldiers.len(),
            "WEAPON_FIRED: 大口径火器が発射されました"
        );

        true
    }
}
