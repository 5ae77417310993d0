use serde::{Deserialize, Serialize};
use std::path::Path;
use std::fs;
use std::io::Read;
use tracing::warn;
use crate::models::{
    AreaPriority, AreaRange, AreaType, EffectArea, EnvironmentConstants, Soldier, SoldierRoster,
    Vector3D, Weapon, WeaponError, DEFAULT_CONE_ANGLE_DEG,
};

/// シナリオメタデータ
#[derive(Debug, Deserialize, Serialize)]
pub struct ScenarioMeta {
    pub version: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
}

/// 火器設定
#[derive(Debug, Deserialize, Serialize)]
pub struct WeaponConfig {
    pub caliber_mm: f64,
    pub direction: Vector3D,
    pub position: Vector3D,
}

/// 効果エリア設定
#[derive(Debug, Deserialize, Serialize)]
pub struct EffectAreaConfig {
    pub r#type: AreaType, // "type"はRustのキーワードなのでr#でエスケープ
    pub priority: AreaPriority,
    #[serde(default)]
    pub rotation_deg: f64,
    pub length_factor: AreaRange,
    pub impact_factor_at_tip: f64,
    pub impact_factor_at_base: f64,
    #[serde(default = "default_cone_angle")]
    pub cone_angle_deg: f64,
}

fn default_cone_angle() -> f64 {
    DEFAULT_CONE_ANGLE_DEG
}

/// ランダム配置の設定
#[derive(Debug, Deserialize, Serialize)]
pub struct RandomRosterConfig {
    pub count: u32,
    pub max_distance_to_muzzle_m: i32,
    #[serde(default)]
    pub seed: u64,
}

/// 兵士配置設定（ランダム生成か明示リストのどちらか）
#[derive(Debug, Default, Deserialize, Serialize)]
pub struct SoldiersConfig {
    pub random: Option<RandomRosterConfig>,
    #[serde(default)]
    pub list: Vec<Soldier>,
}

/// 完全なシナリオ設定
#[derive(Debug, Deserialize, Serialize)]
pub struct ScenarioConfig {
    pub meta: ScenarioMeta,
    pub weapon: WeaponConfig,
    #[serde(default)]
    pub effect_areas: Vec<EffectAreaConfig>,
    #[serde(default)]
    pub soldiers: SoldiersConfig,
    #[serde(default)]
    pub environment: EnvironmentConstants,
}

impl ScenarioConfig {
    /// YAMLファイルからシナリオ設定を読み込み
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ScenarioError> {
        let path = path.as_ref();

        // ファイル存在チェック
        if !path.exists() {
            return Err(ScenarioError::FileNotFound(path.to_path_buf()));
        }

        // ファイル読み込み
        let contents = fs::read_to_string(path)
            .map_err(|e| ScenarioError::IoError(path.to_path_buf(), e))?;

        Self::from_yaml_str(&contents, path)
    }

    /// 標準入力からシナリオ設定を読み込み
    pub fn from_stdin() -> Result<Self, ScenarioError> {
        let source = Path::new("<stdin>");
        let mut contents = String::new();
        std::io::stdin()
            .read_to_string(&mut contents)
            .map_err(|e| ScenarioError::IoError(source.to_path_buf(), e))?;

        Self::from_yaml_str(&contents, source)
    }

    /// YAML文字列からシナリオ設定を読み込み
    ///
    /// `source` はエラーメッセージに表示する読み込み元。
    pub fn from_yaml_str(contents: &str, source: &Path) -> Result<Self, ScenarioError> {
        // YAML解析
        let config: ScenarioConfig = serde_yaml::from_str(contents)
            .map_err(|e| ScenarioError::ParseError(source.to_path_buf(), e))?;

        // 基本的な検証
        config.validate()?;

        Ok(config)
    }

    /// 組み込みのデモシナリオ
    ///
    /// 口径40mmの火器を+X方向に向け、Flash・HighEffect・左右のLowEffectの
    /// 4つのエリアを取り付ける。兵士50名を銃口から±12mにランダム配置する。
    pub fn demo(seed: u64) -> Self {
        let area = |area_type, priority, rotation_deg, length_factor, tip, base| EffectAreaConfig {
            r#type: area_type,
            priority,
            rotation_deg,
            length_factor,
            impact_factor_at_tip: tip,
            impact_factor_at_base: base,
            cone_angle_deg: DEFAULT_CONE_ANGLE_DEG,
        };

        Self {
            meta: ScenarioMeta {
                version: "1.0".to_string(),
                name: "demo".to_string(),
                description: "大口径火器の発射による失明・難聴効果のデモ".to_string(),
            },
            weapon: WeaponConfig {
                caliber_mm: 40.0,
                direction: Vector3D::new(1.0, 0.0, 0.0),
                position: Vector3D::new(0.0, 0.0, 2.0),
            },
            effect_areas: vec![
                area(AreaType::Flash, AreaPriority::VeryHigh, 0.0, AreaRange::Short, 1.0, 0.8),
                area(AreaType::HighEffect, AreaPriority::High, 0.0, AreaRange::Long, 0.8, 0.4),
                area(AreaType::LowEffect, AreaPriority::Low, 90.0, AreaRange::Medium, 0.6, 0.2),
                area(AreaType::LowEffect, AreaPriority::Low, -90.0, AreaRange::Medium, 0.6, 0.2),
            ],
            soldiers: SoldiersConfig {
                random: Some(RandomRosterConfig {
                    count: 50,
                    max_distance_to_muzzle_m: 12,
                    seed,
                }),
                list: Vec::new(),
            },
            environment: EnvironmentConstants::default(),
        }
    }

    /// 設定の基本的な検証
    ///
    /// 効果係数の範囲外は拒否せず警告のみ出す（上限は計算時に1で丸められる）。
    pub fn validate(&self) -> Result<(), ScenarioError> {
        // 火器の検証
        if !(self.weapon.caliber_mm > 0.0) {
            return Err(WeaponError::NonPositiveCaliber(self.weapon.caliber_mm).into());
        }
        Weapon::check_direction(self.weapon.direction)?;

        // 効果エリアの検証
        for (index, area) in self.effect_areas.iter().enumerate() {
            if !(area.cone_angle_deg > 0.0 && area.cone_angle_deg < 90.0) {
                return Err(WeaponError::InvalidConeAngle(area.cone_angle_deg).into());
            }
            for (name, value) in [
                ("impact_factor_at_tip", area.impact_factor_at_tip),
                ("impact_factor_at_base", area.impact_factor_at_base),
            ] {
                if !(0.0..=1.0).contains(&value) {
                    warn!(
                        area_index = index,
                        area_type = %area.r#type,
                        field = name,
                        value,
                        "SCENARIO_IMPACT_FACTOR_OUT_OF_RANGE: 効果係数が[0, 1]の範囲外です"
                    );
                }
            }
        }

        // 兵士配置の検証
        if self.soldiers.random.is_some() && !self.soldiers.list.is_empty() {
            return Err(ScenarioError::ValidationError(
                "soldiers: specify either random or list, not both".to_string(),
            ));
        }
        if let Some(random) = &self.soldiers.random {
            if random.max_distance_to_muzzle_m < 0 {
                return Err(ScenarioError::ValidationError(
                    "max_distance_to_muzzle_m must not be negative".to_string(),
                ));
            }
        }

        // 環境定数の検証
        let env = &self.environment;
        if env.max_blindness_duration_s < 0.0 || env.max_deafness_duration_s < 0.0 {
            return Err(ScenarioError::ValidationError(
                "max durations must not be negative".to_string(),
            ));
        }

        Ok(())
    }

    /// 効果エリアを取り付けた火器を構築
    pub fn build_weapon(&self) -> Result<Weapon, ScenarioError> {
        let mut weapon = Weapon::new(
            self.weapon.caliber_mm,
            self.weapon.direction,
            self.weapon.position,
        )?;

        for area_config in &self.effect_areas {
            let area = EffectArea::new(
                area_config.r#type,
                area_config.priority,
                area_config.rotation_deg,
                area_config.length_factor,
                area_config.impact_factor_at_tip,
                area_config.impact_factor_at_base,
            )
            .with_cone_angle(area_config.cone_angle_deg)?;
            weapon.attach_effect_area(area);
        }

        Ok(weapon)
    }

    /// 兵士配置を構築
    pub fn build_roster(&self) -> SoldierRoster {
        match &self.soldiers.random {
            Some(random) => SoldierRoster::randomly_placed(
                random.count,
                random.max_distance_to_muzzle_m,
                self.environment.soldier_height_m,
                random.seed,
            ),
            None => SoldierRoster::from_soldiers(self.soldiers.list.clone()),
        }
    }

    /// シナリオの概要を表示
    pub fn print_summary(&self) {
        println!("=== シナリオ情報 ===");
        println!("名前: {}", self.meta.name);
        println!("説明: {}", self.meta.description);
        println!("バージョン: {}", self.meta.version);
        println!();

        println!("=== 火器 ===");
        println!("口径: {:.1}mm", self.weapon.caliber_mm);
        println!("銃口位置: {}", self.weapon.position);
        println!("銃口の向き: {}", self.weapon.direction);
        println!();

        println!("=== 効果エリア ===");
        println!("エリア数: {}", self.effect_areas.len());
        for area in &self.effect_areas {
            let length = self.weapon.caliber_mm / 1000.0 * area.length_factor.factor();
            println!(
                "  {}: 優先度 {:?}, 回転 {:.0}度, 長さ {:.1}m, 係数 {:.2} → {:.2}",
                area.r#type, area.priority, area.rotation_deg, length,
                area.impact_factor_at_tip, area.impact_factor_at_base
            );
        }
        println!();

        println!("=== 兵士 ===");
        match &self.soldiers.random {
            Some(random) => println!(
                "ランダム配置: {}名 (銃口から±{}m, シード値: {})",
                random.count, random.max_distance_to_muzzle_m, random.seed
            ),
            None => println!("明示配置: {}名", self.soldiers.list.len()),
        }
    }
}

/// シナリオ読み込みエラー
#[derive(Debug)]
pub enum ScenarioError {
    FileNotFound(std::path::PathBuf),
    IoError(std::path::PathBuf, std::io::Error),
    ParseError(std::path::PathBuf, serde_yaml::Error),
    ValidationError(String),
    Weapon(WeaponError),
}

impl From<WeaponError> for ScenarioError {
    fn from(err: WeaponError) -> Self {
        ScenarioError::Weapon(err)
    }
}

impl std::fmt::Display for ScenarioError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ScenarioError::FileNotFound(path) => {
                write!(f, "シナリオファイルが見つかりません: {}", path.display())
            }
            ScenarioError::IoError(path, err) => {
                write!(f, "ファイル読み込みエラー {}: {}", path.display(), err)
            }
            ScenarioError::ParseError(path, err) => {
                write!(f, "YAML解析エラー {}: {}", path.display(), err)
            }
            ScenarioError::ValidationError(msg) => {
                write!(f, "設定検証エラー: {}", msg)
            }
            ScenarioError::Weapon(err) => {
                write!(f, "火器設定エラー: {}", err)
            }
        }
    }
}

impl std::error::Error for ScenarioError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ScenarioError::IoError(_, err) => Some(err),
            ScenarioError::ParseError(_, err) => Some(err),
            ScenarioError::Weapon(err) => Some(err),
            _ => None,
        }
    }
}
