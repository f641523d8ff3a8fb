//! hand_playground: interactive entry point.

use hand_playground::app::{run, AppConfig, SourceKind};

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    println!();
    println!("╔══════════════════════════════════════════════════════════════╗");
    println!("║          Hand Playground: pinch to grab, open to drop        ║");
    println!("╚══════════════════════════════════════════════════════════════╝");
    println!();

    let cfg = match AppConfig::from_args(std::env::args().skip(1)) {
        Ok(cfg) => cfg,
        Err(e)  => {
            log::error!("{}", e);
            eprintln!("usage: hand_playground [--stdin] [--blocks] [--size WxH] [--threshold N] [--radius N] [--seed N]");
            std::process::exit(2);
        }
    };

    match cfg.source {
        SourceKind::Simulated => println!("  Mode: mouse simulation (hold left button to pinch)"),
        SourceKind::JsonLines => println!("  Mode: external detector on stdin"),
    }
    println!(
        "  Canvas {}x{}  threshold {} px  reach {} px",
        cfg.width, cfg.height, cfg.session.pinch_threshold, cfg.session.capture_radius
    );
    println!();

    if let Err(e) = run(cfg) {
        log::error!("{}", e);
        std::process::exit(1);
    }
}
