use rand::{Rng, SeedableRng, rngs::StdRng};
use serde::{Deserialize, Serialize};
use crate::models::common::Vector3D;

/// 兵士（1点で表す歩兵ユニット）
#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
pub struct Soldier {
    pub id: u32,
    /// 位置（Zは高さ）
    pub position: Vector3D,
}

impl Soldier {
    pub fn new(id: u32, position: Vector3D) -> Self {
        Self { id, position }
    }
}

/// 兵士の配置生成
#[derive(Debug, Clone)]
pub struct SoldierRoster {
    pub soldiers: Vec<Soldier>,
}

impl SoldierRoster {
    /// ランダムに配置された兵士を生成
    ///
    /// X, Y は `[-max_distance_to_muzzle, max_distance_to_muzzle)` の整数値、
    /// Z は兵士の身長（全員起立）。同じシード値なら同じ配置になる。
    ///
    /// # 引数
    ///
    /// * `count` - 生成する兵士数
    /// * `max_distance_to_muzzle` - X, Y 座標の範囲（m）
    /// * `height` - 兵士の身長（m）
    /// * `seed` - 乱数シード
    pub fn randomly_placed(count: u32, max_distance_to_muzzle: i32, height: f64, seed: u64) -> Self {
        let mut rng = StdRng::seed_from_u64(seed);

        let soldiers = (0..count)
            .map(|id| {
                let (x, y) = if max_distance_to_muzzle > 0 {
                    (
                        rng.gen_range(-max_distance_to_muzzle..max_distance_to_muzzle),
                        rng.gen_range(-max_distance_to_muzzle..max_distance_to_muzzle),
                    )
                } else {
                    (0, 0)
                };
                Soldier::new(id, Vector3D::new(x as f64, y as f64, height))
            })
            .collect();

        Self { soldiers }
    }

    pub fn from_soldiers(soldiers: Vec<Soldier>) -> Self {
        Self { soldiers }
    }

    pub fn len(&self) -> usize {
        self.soldiers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.soldiers.is_empty()
    }

    pub fn as_slice(&self) -> &[Soldier] {
        &self.soldiers
    }
}
