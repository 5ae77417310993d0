use serde::{Deserialize, Serialize};
use crate::models::{
    common::{Vector3D, math_utils},
    weapon::{MuzzlePose, WeaponError},
};

/// 効果エリアの種類（記述用で、解決ロジックでは使用しない）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AreaType {
    Flash,
    HighEffect,
    LowEffect,
}

impl std::fmt::Display for AreaType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AreaType::Flash => write!(f, "Flash"),
            AreaType::HighEffect => write!(f, "HighEffect"),
            AreaType::LowEffect => write!(f, "LowEffect"),
        }
    }
}

/// 効果エリアの優先度
///
/// 数値が小さいほど優先度が高い。重なったエリアでは優先度の高い方のみ有効。
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AreaPriority {
    VeryHigh = 0,
    High = 1,
    Medium = 2,
    Low = 3,
    VeryLow = 4,
}

/// 効果エリアの長さ係数（口径[m]に掛ける倍率）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AreaRange {
    Short = 100,
    Medium = 150,
    Long = 250,
}

impl AreaRange {
    pub fn factor(&self) -> f64 {
        *self as i32 as f64
    }
}

/// 円錐の半頂角のデフォルト値（度）
pub const DEFAULT_CONE_ANGLE_DEG: f64 = 50.0;

/// 効果エリア
///
/// 銃口を頂点とする円錐形の領域で、大口径火器の発射時に内部の兵士へ
/// 一時的な失明・難聴効果を与える。構築後は不変。
///
/// 火器への参照は持たず、形状の問い合わせには発射時点の [`MuzzlePose`] を渡す。
/// そのため火器の口径や姿勢が変わると、長さと方向は自動的に追従する。
#[derive(Debug, Clone, PartialEq)]
pub struct EffectArea {
    area_type: AreaType,
    priority: AreaPriority,
    /// 銃口方向に対する相対回転（度、Z軸周り）
    rotation_deg: f64,
    length_factor: AreaRange,
    /// 円錐先端での効果係数（最大効果時間の割合）
    impact_factor_at_tip: f64,
    /// 円錐底面での効果係数
    impact_factor_at_base: f64,
    /// 半頂角（度）
    cone_angle_deg: f64,
}

impl EffectArea {
    /// 新しい効果エリアを作成します（半頂角はデフォルトの50度）
    ///
    /// 効果係数は[0, 1]であることを想定しているが、ここでは検証しない。
    /// 先端側の係数が1を超えても、効果時間の計算で上限1に丸められる。
    ///
    /// # 引数
    ///
    /// * `area_type` - エリアの種類
    /// * `priority` - 重なり時の優先度
    /// * `rotation_deg` - 銃口方向に対する相対回転（度）
    /// * `length_factor` - 口径に掛けてエリア長を求める係数
    /// * `impact_factor_at_tip` - 先端（銃口）での効果係数
    /// * `impact_factor_at_base` - 底面での効果係数
    pub fn new(
        area_type: AreaType,
        priority: AreaPriority,
        rotation_deg: f64,
        length_factor: AreaRange,
        impact_factor_at_tip: f64,
        impact_factor_at_base: f64,
    ) -> Self {
        Self {
            area_type,
            priority,
            rotation_deg,
            length_factor,
            impact_factor_at_tip,
            impact_factor_at_base,
            cone_angle_deg: DEFAULT_CONE_ANGLE_DEG,
        }
    }

    /// 半頂角を指定する
    ///
    /// 半頂角は (0, 90) 度の範囲でなければならない。
    pub fn with_cone_angle(mut self, cone_angle_deg: f64) -> Result<Self, WeaponError> {
        if !(cone_angle_deg > 0.0 && cone_angle_deg < 90.0) {
            return Err(WeaponError::InvalidConeAngle(cone_angle_deg));
        }
        self.cone_angle_deg = cone_angle_deg;
        Ok(self)
    }

    pub fn area_type(&self) -> AreaType {
        self.area_type
    }

    pub fn priority(&self) -> AreaPriority {
        self.priority
    }

    pub fn rotation_deg(&self) -> f64 {
        self.rotation_deg
    }

    pub fn length_factor(&self) -> AreaRange {
        self.length_factor
    }

    pub fn impact_factor_at_tip(&self) -> f64 {
        self.impact_factor_at_tip
    }

    pub fn impact_factor_at_base(&self) -> f64 {
        self.impact_factor_at_base
    }

    pub fn cone_angle_deg(&self) -> f64 {
        self.cone_angle_deg
    }

    /// エリアの長さ（円錐の高さ、m）
    ///
    /// 口径をmmからmに変換して長さ係数を掛ける。キャッシュせず毎回計算する。
    pub fn get_length(&self, pose: &MuzzlePose) -> f64 {
        pose.caliber_mm / 1000.0 * self.length_factor.factor()
    }

    /// 円錐軸の向き（単位ベクトル）
    pub fn get_direction(&self, pose: &MuzzlePose) -> Vector3D {
        math_utils::rotate_about_vertical(pose.direction.normalize(), self.rotation_deg)
    }

    /// 点がこのエリアの内部にあるか
    pub fn contains(&self, pose: &MuzzlePose, point: Vector3D) -> bool {
        math_utils::point_in_cone(
            pose.position,
            self.get_direction(pose),
            self.cone_angle_deg,
            self.get_length(pose),
            point,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pose(caliber_mm: f64) -> MuzzlePose {
        MuzzlePose {
            position: Vector3D::new(0.0, 0.0, 0.0),
            direction: Vector3D::new(1.0, 0.0, 0.0),
            caliber_mm,
        }
    }

    fn flash() -> EffectArea {
        EffectArea::new(AreaType::Flash, AreaPriority::VeryHigh, 0.0, AreaRange::Short, 1.0, 0.8)
    }

    #[test]
    fn test_length_follows_caliber() {
        let area = flash();
        assert!((area.get_length(&pose(40.0)) - 4.0).abs() < 1e-12);
        assert!((area.get_length(&pose(100.0)) - 10.0).abs() < 1e-12);

        let long = EffectArea::new(AreaType::HighEffect, AreaPriority::High, 0.0, AreaRange::Long, 0.8, 0.4);
        assert!((long.get_length(&pose(40.0)) - 10.0).abs() < 1e-12);
    }

    #[test]
    fn test_zero_rotation_keeps_muzzle_direction() {
        let p = pose(40.0);
        let dir = flash().get_direction(&p);
        assert!(dir.distance_3d(&p.direction) < 1e-12);
    }

    #[test]
    fn test_direction_is_normalized() {
        let mut p = pose(40.0);
        p.direction = Vector3D::new(3.0, 0.0, 0.0);
        let dir = flash().get_direction(&p);
        assert!((dir.magnitude() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_rotated_area_contains_side_point() {
        let p = pose(40.0);
        let left = EffectArea::new(AreaType::LowEffect, AreaPriority::Low, 90.0, AreaRange::Medium, 0.6, 0.2);
        let right = EffectArea::new(AreaType::LowEffect, AreaPriority::Low, -90.0, AreaRange::Medium, 0.6, 0.2);

        let point = Vector3D::new(0.0, 3.0, 0.0);
        assert!(left.contains(&p, point));
        assert!(!right.contains(&p, point));
        assert!(!flash().contains(&p, point));
    }

    #[test]
    fn test_contains_reference_case() {
        // 口径40mm、Short → 長さ4m
        let p = pose(40.0);
        assert!(flash().contains(&p, Vector3D::new(2.0, 0.0, 0.0)));
        assert!(!flash().contains(&p, Vector3D::new(5.0, 0.0, 0.0)));
    }

    #[test]
    fn test_cone_angle_validation() {
        assert!(flash().with_cone_angle(30.0).is_ok());
        assert_eq!(flash().cone_angle_deg(), DEFAULT_CONE_ANGLE_DEG);
        assert!(matches!(flash().with_cone_angle(0.0), Err(WeaponError::InvalidConeAngle(_))));
        assert!(matches!(flash().with_cone_angle(90.0), Err(WeaponError::InvalidConeAngle(_))));
        assert!(flash().with_cone_angle(f64::NAN).is_err());
    }

    #[test]
    fn test_priority_ordering() {
        assert!(AreaPriority::VeryHigh < AreaPriority::High);
        assert!(AreaPriority::Low < AreaPriority::VeryLow);
        assert_eq!(AreaRange::Medium.factor(), 150.0);
    }
}
