use clap::{Arg, Command};

use larvasim::logging::{self, LogConfig, LogOutput};
use larvasim::fields::SeededRandom;
use larvasim::scenario::ScenarioConfig;
use larvasim::simulation::SimulationEngine;

fn main() {
    // コマンドライン引数の解析
    let matches = Command::new("larvasim")
        .version("0.1.0")
        .about("幼生輸送シミュレーション (Larval Transport Simulation)")
        .long_about(
            "ラグランジュ粒子追跡による幼生輸送シミュレーション\n\
             時間駆動型シミュレーションで海流輸送と生活段階依存の行動を合成します。",
        )
        .arg(
            Arg::new("scenario")
                .short('s')
                .long("scenario")
                .value_name("FILE")
                .help("シナリオファイル(.yaml)のパスを指定"),
        )
        .arg(
            Arg::new("info")
                .short('i')
                .long("info")
                .action(clap::ArgAction::SetTrue)
                .help("シナリオの情報のみ表示して終了"),
        )
        .arg(
            Arg::new("log")
                .short('l')
                .long("log")
                .value_name("OUTPUT")
                .default_value("console")
                .help("ログ出力先 (console, file, both)"),
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .action(clap::ArgAction::Count)
                .help("詳細出力レベル (-v: 詳細, -vv: デバッグ, -vvv: トレース)"),
        )
        .get_matches();

    println!("幼生輸送シミュレーション (Larval Transport Simulation) - larvasim v0.1.0");
    println!();

    let verbose_level = matches.get_count("verbose");

    // ログの初期化
    let output = matches
        .get_one::<String>("log")
        .map(|s| s.parse::<LogOutput>())
        .transpose()
        .unwrap_or_else(|e| {
            eprintln!("エラー: {}", e);
            std::process::exit(1);
        })
        .unwrap_or(LogOutput::Console);
    let log_config = LogConfig {
        level: logging::level_for_verbosity(verbose_level),
        output,
        ..LogConfig::default()
    };
    if let Err(e) = logging::init_logging(log_config) {
        eprintln!("ログ初期化エラー: {}", e);
        std::process::exit(1);
    }

    // シナリオファイルの処理
    if let Some(scenario_path) = matches.get_one::<String>("scenario") {
        match run_scenario(scenario_path, matches.get_flag("info"), verbose_level) {
            Ok(_) => {
                if verbose_level > 0 {
                    println!("シナリオ実行が正常に完了しました。");
                }
            }
            Err(e) => {
                eprintln!("エラー: {}", e);
                std::process::exit(1);
            }
        }
    } else {
        show_default_help();
    }
}

/// シナリオファイルを読み込んで実行する
fn run_scenario(
    scenario_path: &str,
    info_only: bool,
    verbose_level: u8,
) -> Result<(), Box<dyn std::error::Error>> {
    let scenario = ScenarioConfig::from_file(scenario_path)?;

    if verbose_level > 0 {
        println!("シナリオファイル読み込み完了: {}", scenario_path);
    }

    scenario.print_summary();
    println!();

    if info_only {
        return Ok(());
    }

    // シード指定の乱数プロバイダを明示的に注入する
    let random = Box::new(SeededRandom::from_seed(scenario.sim.seed));

    let mut simulation = SimulationEngine::new(scenario, random, verbose_level);
    simulation.initialize()?;
    simulation.run()?;

    Ok(())
}

/// デフォルトヘルプとシナリオ一覧を表示する
fn show_default_help() {
    println!("使用方法:");
    println!("  larvasim [オプション]");
    println!();
    println!("オプション:");
    println!("  -s, --scenario <FILE>  シナリオファイルを指定して実行");
    println!("  -i, --info             シナリオ情報のみ表示");
    println!("  -l, --log <OUTPUT>     ログ出力先 (console, file, both)");
    println!("  -v, --verbose          詳細出力 (複数指定で詳細レベル上昇)");
    println!("  -h, --help             このヘルプを表示");
    println!();
    println!("利用可能なシナリオファイル:");
    println!("  scenarios/scenario_open_water.yaml  - 境界なしの漂流テスト用");
    println!("  scenarios/scenario_coastal.yaml     - 海岸線・海底地形つき標準シナリオ");
    println!();
    println!("例:");
    println!("  larvasim -s scenarios/scenario_coastal.yaml");
    println!("  larvasim -s scenarios/scenario_open_water.yaml -v");
    println!("  larvasim -s scenarios/scenario_coastal.yaml -i");
}
