use std::ops::{Add, Sub, Mul};
use serde::{Deserialize, Serialize};

/// 3次元ベクトル（位置・方向の両方に使用）
#[derive(Debug, Clone, Copy, PartialEq, Default, Deserialize, Serialize)]
pub struct Vector3D {
    pub x: f64, // m
    pub y: f64, // m
    pub z: f64, // m (高さ)
}

impl Vector3D {
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// 内積
    pub fn dot(&self, other: &Vector3D) -> f64 {
        self.x * other.x + self.y * other.y + self.z * other.z
    }

    /// 成分の絶対値の最大値
    fn max_abs_component(&self) -> f64 {
        self.x.abs().max(self.y.abs()).max(self.z.abs())
    }

    /// ベクトルの長さ
    ///
    /// 最大成分で割ってから二乗和を取るため、極端に大きい・小さい成分でも
    /// オーバーフロー・アンダーフローしない。
    pub fn magnitude(&self) -> f64 {
        // 非有限値はNaN・無限大をそのまま伝播させる
        if !self.is_finite() {
            return (self.x * self.x + self.y * self.y + self.z * self.z).sqrt();
        }
        let scale = self.max_abs_component();
        if scale == 0.0 {
            return 0.0;
        }
        let (x, y, z) = (self.x / scale, self.y / scale, self.z / scale);
        scale * (x * x + y * y + z * z).sqrt()
    }

    /// 3次元距離を計算
    pub fn distance_3d(&self, other: &Vector3D) -> f64 {
        (*self - *other).magnitude()
    }

    /// 全成分が厳密にゼロかどうか
    pub fn is_zero(&self) -> bool {
        self.x == 0.0 && self.y == 0.0 && self.z == 0.0
    }

    /// 全成分が有限値かどうか
    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_finite()
    }

    /// ベクトルを正規化（ゼロベクトル・非有限値はそのまま返す）
    pub fn normalize(&self) -> Self {
        if self.is_zero() || !self.is_finite() {
            return *self;
        }
        let scale = self.max_abs_component();
        // 最大成分で割った時点で長さは [1, √3] に収まる
        let scaled = Self::new(self.x / scale, self.y / scale, self.z / scale);
        let mag = (scaled.x * scaled.x + scaled.y * scaled.y + scaled.z * scaled.z).sqrt();
        Self::new(scaled.x / mag, scaled.y / mag, scaled.z / mag)
    }
}

impl std::fmt::Display for Vector3D {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({:.2}, {:.2}, {:.2})", self.x, self.y, self.z)
    }
}

impl Add for Vector3D {
    type Output = Self;

    fn add(self, other: Self) -> Self::Output {
        Self::new(self.x + other.x, self.y + other.y, self.z + other.z)
    }
}

impl Sub for Vector3D {
    type Output = Self;

    fn sub(self, other: Self) -> Self::Output {
        Self::new(self.x - other.x, self.y - other.y, self.z - other.z)
    }
}

impl Mul<f64> for Vector3D {
    type Output = Self;

    fn mul(self, scalar: f64) -> Self::Output {
        Self::new(self.x * scalar, self.y * scalar, self.z * scalar)
    }
}

impl Mul<Vector3D> for f64 {
    type Output = Vector3D;

    fn mul(self, vector: Vector3D) -> Self::Output {
        vector * self
    }
}

/// 効果チャネル（失明・難聴）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EffectChannel {
    Blindness,
    Deafness,
}

impl std::fmt::Display for EffectChannel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EffectChannel::Blindness => write!(f, "失明"),
            EffectChannel::Deafness => write!(f, "難聴"),
        }
    }
}

/// ホスト環境から与えられる定数
///
/// 各チャネルの最大効果時間、大口径判定の閾値、兵士の身長をまとめたもの。
/// 解決処理や発射判定には明示的に引数として渡す。
#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct EnvironmentConstants {
    /// 最大失明時間（秒）
    pub max_blindness_duration_s: f64,
    /// 最大難聴時間（秒）
    pub max_deafness_duration_s: f64,
    /// この口径（mm）を超える火器を大口径とみなす
    pub min_caliber_for_large_weapon_mm: f64,
    /// 兵士は全員起立しているものとし、その高さ（m）
    pub soldier_height_m: f64,
}

impl EnvironmentConstants {
    /// チャネルごとの最大効果時間
    pub fn max_duration(&self, channel: EffectChannel) -> f64 {
        match channel {
            EffectChannel::Blindness => self.max_blindness_duration_s,
            EffectChannel::Deafness => self.max_deafness_duration_s,
        }
    }
}

impl Default for EnvironmentConstants {
    fn default() -> Self {
        Self {
            max_blindness_duration_s: 2.0,
            max_deafness_duration_s: 60.0,
            min_caliber_for_large_weapon_mm: 15.0,
            soldier_height_m: 1.8,
        }
    }
}

/// 数学ユーティリティ関数
pub mod math_utils {
    use super::Vector3D;

    /// 度をラジアンに変換
    pub fn deg_to_rad(degrees: f64) -> f64 {
        degrees * std::f64::consts::PI / 180.0
    }

    /// 小数点以下2桁に丸める（偶数丸め）
    pub fn round_2(value: f64) -> f64 {
        (value * 100.0).round_ties_even() / 100.0
    }

    /// 鉛直軸（Z軸）周りにベクトルを回転（右手系、度）
    ///
    /// +90度で+X方向は+Y方向に移る。
    pub fn rotate_about_vertical(direction: Vector3D, degrees: f64) -> Vector3D {
        let (sin, cos) = deg_to_rad(degrees).sin_cos();
        Vector3D::new(
            direction.x * cos - direction.y * sin,
            direction.x * sin + direction.y * cos,
            direction.z,
        )
    }

    /// 点が円錐の内部にあるかを判定
    ///
    /// 円錐は頂点 `apex` から `axis` 方向に高さ `altitude` だけ伸び、
    /// 半頂角 `half_angle_deg` を持つ。境界（頂点・底面・側面）上の点は外部扱い。
    ///
    /// # 引数
    ///
    /// * `apex` - 円錐の頂点（銃口位置）
    /// * `axis` - 円錐軸の方向（内部で正規化する）
    /// * `half_angle_deg` - 半頂角（度）
    /// * `altitude` - 円錐の高さ（m）
    /// * `point` - 判定する点
    ///
    /// # 戻り値
    ///
    /// 内部にある場合はtrue
    pub fn point_in_cone(
        apex: Vector3D,
        axis: Vector3D,
        half_angle_deg: f64,
        altitude: f64,
        point: Vector3D,
    ) -> bool {
        // 縮退した円錐は何も含まない
        if axis.is_zero() || !axis.is_finite() || !(altitude > 0.0) {
            return false;
        }
        let axis = axis.normalize();

        let offset = point - apex;
        let along_axis = offset.dot(&axis);

        if along_axis <= 0.0 || along_axis >= altitude {
            return false;
        }

        let base_radius = altitude * deg_to_rad(half_angle_deg).tan();
        let cone_radius = (along_axis / altitude) * base_radius;

        let orthogonal_distance = (offset - along_axis * axis).magnitude();

        orthogonal_distance < cone_radius
    }
}

#[cfg(test)]
mod tests {
    use super::math_utils::*;
    use super::*;

    const EPS: f64 = 1e-9;

    fn assert_vec_eq(a: Vector3D, b: Vector3D) {
        assert!(a.distance_3d(&b) < EPS, "{} != {}", a, b);
    }

    #[test]
    fn test_rotate_about_vertical() {
        let x_axis = Vector3D::new(1.0, 0.0, 0.0);
        assert_vec_eq(rotate_about_vertical(x_axis, 0.0), x_axis);
        assert_vec_eq(rotate_about_vertical(x_axis, 90.0), Vector3D::new(0.0, 1.0, 0.0));
        assert_vec_eq(rotate_about_vertical(x_axis, -90.0), Vector3D::new(0.0, -1.0, 0.0));
        assert_vec_eq(rotate_about_vertical(x_axis, 180.0), Vector3D::new(-1.0, 0.0, 0.0));
    }

    #[test]
    fn test_rotate_keeps_vertical_component() {
        let v = Vector3D::new(1.0, 2.0, 3.0);
        let rotated = rotate_about_vertical(v, 37.0);
        assert!((rotated.z - 3.0).abs() < EPS);
        assert!((rotated.magnitude() - v.magnitude()).abs() < EPS);
    }

    #[test]
    fn test_point_in_cone_reference_case() {
        let apex = Vector3D::new(0.0, 0.0, 0.0);
        let axis = Vector3D::new(1.0, 0.0, 0.0);

        // 高さ4、半頂角50度: t=2での半径は約2.3835
        assert!(point_in_cone(apex, axis, 50.0, 4.0, Vector3D::new(2.0, 0.0, 0.0)));
        assert!(point_in_cone(apex, axis, 50.0, 4.0, Vector3D::new(2.0, 2.38, 0.0)));
        assert!(!point_in_cone(apex, axis, 50.0, 4.0, Vector3D::new(2.0, 2.39, 0.0)));
        assert!(!point_in_cone(apex, axis, 50.0, 4.0, Vector3D::new(5.0, 0.0, 0.0)));
    }

    #[test]
    fn test_point_in_cone_open_boundaries() {
        let apex = Vector3D::new(0.0, 0.0, 0.0);
        let axis = Vector3D::new(1.0, 0.0, 0.0);

        // 頂点、底面上、背後はいずれも外部
        assert!(!point_in_cone(apex, axis, 50.0, 4.0, apex));
        assert!(!point_in_cone(apex, axis, 50.0, 4.0, Vector3D::new(4.0, 0.0, 0.0)));
        assert!(!point_in_cone(apex, axis, 50.0, 4.0, Vector3D::new(-1.0, 0.0, 0.0)));

        // 半頂角45度なら側面は y = x
        assert!(!point_in_cone(apex, axis, 45.0, 4.0, Vector3D::new(2.0, 2.0, 0.0)));
        assert!(point_in_cone(apex, axis, 45.0, 4.0, Vector3D::new(2.0, 1.99, 0.0)));
    }

    #[test]
    fn test_point_in_cone_normalizes_axis() {
        let apex = Vector3D::new(0.0, 0.0, 2.0);
        let unit = Vector3D::new(1.0, 0.0, 0.0);
        let long = Vector3D::new(10.0, 0.0, 0.0);
        let point = Vector3D::new(3.0, 1.0, 2.5);

        assert_eq!(
            point_in_cone(apex, unit, 50.0, 4.0, point),
            point_in_cone(apex, long, 50.0, 4.0, point),
        );
    }

    #[test]
    fn test_point_in_cone_degenerate_inputs() {
        let apex = Vector3D::new(0.0, 0.0, 0.0);
        let point = Vector3D::new(1.0, 0.0, 0.0);
        assert!(!point_in_cone(apex, Vector3D::default(), 50.0, 4.0, point));
        assert!(!point_in_cone(apex, Vector3D::new(1.0, 0.0, 0.0), 50.0, 0.0, point));
        assert!(!point_in_cone(apex, Vector3D::new(f64::NAN, 0.0, 0.0), 50.0, 4.0, point));
    }

    #[test]
    fn test_magnitude_extreme_components() {
        let huge = Vector3D::new(1e200, 1e200, 0.0);
        assert!((huge.magnitude() / 1e200 - std::f64::consts::SQRT_2).abs() < EPS);

        let tiny = Vector3D::new(3e-200, 4e-200, 0.0);
        assert!((tiny.magnitude() / 1e-200 - 5.0).abs() < EPS);

        assert_eq!(Vector3D::default().magnitude(), 0.0);
        assert!(Vector3D::new(f64::NAN, 0.0, 0.0).magnitude().is_nan());
    }

    #[test]
    fn test_normalize_extreme_components() {
        let x_axis = Vector3D::new(1.0, 0.0, 0.0);
        assert_vec_eq(Vector3D::new(1e200, 0.0, 0.0).normalize(), x_axis);
        assert_vec_eq(Vector3D::new(1e-20, 0.0, 0.0).normalize(), x_axis);
        assert_vec_eq(Vector3D::new(f64::MAX, f64::MAX, 0.0).normalize(), Vector3D::new(0.5_f64.sqrt(), 0.5_f64.sqrt(), 0.0));
        assert_eq!(Vector3D::default().normalize(), Vector3D::default());
    }

    #[test]
    fn test_is_zero_is_exact() {
        assert!(Vector3D::default().is_zero());
        assert!(!Vector3D::new(1e-20, 0.0, 0.0).is_zero());
        assert!(!Vector3D::new(0.0, 0.0, f64::MIN_POSITIVE).is_zero());
        assert!(!Vector3D::new(f64::NAN, 0.0, 0.0).is_finite());
        assert!(!Vector3D::new(0.0, f64::INFINITY, 0.0).is_finite());
    }

    #[test]
    fn test_point_in_cone_scaled_axis() {
        let apex = Vector3D::new(0.0, 0.0, 0.0);
        let point = Vector3D::new(2.0, 0.0, 0.0);
        for axis in [Vector3D::new(1e200, 0.0, 0.0), Vector3D::new(1e-20, 0.0, 0.0)] {
            assert!(point_in_cone(apex, axis, 50.0, 4.0, point));
        }
    }

    #[test]
    fn test_round_2() {
        assert_eq!(round_2(1.234), 1.23);
        assert_eq!(round_2(59.999), 60.0);
        assert_eq!(round_2(-0.456), -0.46);
    }

    #[test]
    fn test_environment_defaults() {
        let env = EnvironmentConstants::default();
        assert_eq!(env.max_duration(EffectChannel::Blindness), 2.0);
        assert_eq!(env.max_duration(EffectChannel::Deafness), 60.0);
        assert_eq!(env.min_caliber_for_large_weapon_mm, 15.0);
        assert_eq!(env.soldier_height_m, 1.8);
    }
}
