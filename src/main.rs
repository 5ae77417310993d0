mod logging;
mod models;
mod scenario;
mod simulation;

use clap::{Arg, Command};
use logging::{LogConfig, LogOutput};
use scenario::*;
use simulation::SimulationEngine;

fn main() {
    // コマンドライン引数の解析
    let matches = Command::new("fireimpact")
        .version("0.1.0")
        .about("大口径火器の発射効果シミュレーション (Fire Impact)")
        .long_about("銃口を頂点とする円錐形の効果エリアで、周辺兵士への\n\
                     一時的な失明・難聴効果を優先度と距離に応じて計算します。")
        .arg(
            Arg::new("scenario")
                .short('s')
                .long("scenario")
                .value_name("FILE")
                .help("シナリオファイル(.yaml)のパスを指定（- で標準入力）")
                .conflicts_with("demo")
        )
        .arg(
            Arg::new("info")
                .short('i')
                .long("info")
                .action(clap::ArgAction::SetTrue)
                .help("シナリオの情報のみ表示して終了")
        )
        .arg(
            Arg::new("demo")
                .short('d')
                .long("demo")
                .action(clap::ArgAction::SetTrue)
                .help("組み込みのデモシナリオを実行")
        )
        .arg(
            Arg::new("seed")
                .long("seed")
                .value_name("SEED")
                .value_parser(clap::value_parser!(u64))
                .default_value("0")
                .help("デモシナリオの兵士配置に使う乱数シード")
        )
        .arg(
            Arg::new("caliber")
                .long("caliber")
                .value_name("MM")
                .value_parser(clap::value_parser!(f64))
                .help("シナリオの口径を上書き（mm）")
        )
        .arg(
            Arg::new("traverse")
                .long("traverse")
                .value_name("DEG")
                .value_parser(clap::value_parser!(f64))
                .allow_hyphen_values(true)
                .help("銃口の向きを鉛直軸周りに旋回（度、左回りが正）")
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .action(clap::ArgAction::Count)
                .help("詳細出力レベル (-v: 基本, -vv: 詳細, -vvv: デバッグ)")
        )
        .arg(
            Arg::new("log-level")
                .long("log-level")
                .value_name("LEVEL")
                .help("ログレベル (trace, debug, info, warn, error)。-v より優先")
        )
        .arg(
            Arg::new("log-output")
                .long("log-output")
                .value_name("TARGET")
                .value_parser(|s: &str| s.parse::<LogOutput>())
                .default_value("console")
                .help("ログ出力先 (console, file, both)")
        )
        .arg(
            Arg::new("log-dir")
                .long("log-dir")
                .value_name("DIR")
                .default_value("logs")
                .help("ログファイルの出力ディレクトリ")
        )
        .get_matches();

    println!("発射効果シミュレーション (Fire Impact) - fireimpact v0.1.0");
    println!();

    let verbose_level = matches.get_count("verbose");

    let log_config = LogConfig {
        level: matches
            .get_one::<String>("log-level")
            .map(|level| logging::parse_log_level(level))
            .unwrap_or_else(|| logging::level_for_verbosity(verbose_level)),
        output: matches.get_one::<LogOutput>("log-output").copied().unwrap_or(LogOutput::Console),
        log_dir: matches.get_one::<String>("log-dir").cloned().unwrap_or_else(|| "logs".to_string()),
        ..LogConfig::default()
    };
    // ファイル出力のガードはプロセス終了まで保持する
    let _log_guard = match logging::init_logging(log_config) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("エラー: ログ初期化に失敗しました: {}", e);
            std::process::exit(1);
        }
    };

    let scenario = if matches.get_flag("demo") {
        let seed = matches.get_one::<u64>("seed").copied().unwrap_or(0);
        ScenarioConfig::demo(seed)
    } else if let Some(scenario_path) = matches.get_one::<String>("scenario") {
        let loaded = if scenario_path == "-" {
            ScenarioConfig::from_stdin()
        } else {
            ScenarioConfig::from_file(scenario_path)
        };
        match loaded {
            Ok(scenario) => {
                if verbose_level > 0 {
                    println!("シナリオファイル読み込み完了: {}", scenario_path);
                }
                scenario
            }
            Err(e) => {
                eprintln!("エラー: {}", e);
                std::process::exit(1);
            }
        }
    } else {
        // デフォルト動作: 使用方法を表示
        show_default_help();
        return;
    };

    let adjustment = WeaponAdjustment {
        caliber_mm: matches.get_one::<f64>("caliber").copied(),
        traverse_deg: matches.get_one::<f64>("traverse").copied(),
    };

    if let Err(e) = execute_scenario(scenario, adjustment, matches.get_flag("info"), verbose_level) {
        eprintln!("エラー: {}", e);
        std::process::exit(1);
    }
}

/// コマンドラインからの火器設定の上書き
struct WeaponAdjustment {
    caliber_mm: Option<f64>,
    traverse_deg: Option<f64>,
}

/// シナリオの実行
fn execute_scenario(
    scenario: ScenarioConfig,
    adjustment: WeaponAdjustment,
    info_only: bool,
    verbose_level: u8,
) -> Result<(), Box<dyn std::error::Error>> {
    scenario.print_summary();
    println!();

    // 情報表示のみの場合
    if info_only {
        return Ok(());
    }

    let mut simulation = SimulationEngine::new(scenario, verbose_level);
    simulation.initialize()?;
    if adjustment.caliber_mm.is_some() || adjustment.traverse_deg.is_some() {
        simulation.adjust_weapon(adjustment.caliber_mm, adjustment.traverse_deg)?;
    }

    let report = simulation.run()?;
    println!();
    report.print_summary();

    Ok(())
}

/// デフォルトヘルプを表示
fn show_default_help() {
    println!("使用方法:");
    println!("  fireimpact [オプション]");
    println!();
    println!("オプション:");
    println!("  -s, --scenario <FILE>  シナリオファイルを指定して実行（- で標準入力）");
    println!("  -i, --info             シナリオ情報のみ表示");
    println!("  -d, --demo             組み込みのデモシナリオを実行");
    println!("      --seed <SEED>      デモの乱数シード");
    println!("      --caliber <MM>     口径を上書き");
    println!("      --traverse <DEG>   銃口を鉛直軸周りに旋回");
    println!("  -v, --verbose          詳細出力 (複数指定で詳細レベル上昇)");
    println!("      --log-level <LV>   ログレベル");
    println!("      --log-output <T>   ログ出力先 (console, file, both)");
    println!("  -h, --help             このヘルプを表示");
    println!();
    println!("例:");
    println!("  fireimpact -s scenarios/demo.yaml");
    println!("  fireimpact -s scenarios/demo.yaml -vv --log-output both");
    println!("  fireimpact --demo --seed 42");
    println!("  fireimpact --demo --caliber 120 --traverse -30");
    println!("  cat scenarios/demo.yaml | fireimpact -s -");
}
