use clap::Parser;
use drumtrainer::audio::export::{ExportDuration, ExportSettings, render_to_wav};
use drumtrainer::{Engine, PracticeSession, SessionConfig};
use log::{error, info};
use std::cell::RefCell;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use std::time::{Duration, Instant};

/// Drum trainer - play or export a practice session
#[derive(Parser, Debug, Clone, PartialEq)]
#[command(name = "drumtrainer")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Plays a drum pattern session through the default output device", long_about = None)]
struct CliArgs {
    /// Session file (JSON); a basic rock groove is used when omitted
    #[arg(value_name = "SESSION")]
    session: Option<PathBuf>,

    /// How long to play or export, in seconds
    #[arg(long, default_value_t = DEFAULT_SECONDS, value_parser = parse_seconds)]
    seconds: f64,

    /// Render to this WAV file instead of playing
    #[arg(long, value_name = "OUT.wav")]
    export: Option<PathBuf>,
}

/// Default playing time when no duration is given
const DEFAULT_SECONDS: f64 = 8.0;

/// Lets the last hits ring out before the stream is closed
const RELEASE_TIME: Duration = Duration::from_millis(500);

fn parse_seconds(value: &str) -> Result<f64, String> {
    value
        .parse::<f64>()
        .ok()
        .filter(|s| s.is_finite() && *s > 0.0)
        .ok_or_else(|| format!("invalid duration: {}", value))
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = CliArgs::parse();

    let config = match &args.session {
        Some(path) => match SessionConfig::from_path(path) {
            Ok(config) => config,
            Err(e) => {
                error!("Cannot load {}: {}", path.display(), e);
                std::process::exit(1);
            }
        },
        None => {
            info!("No session given, playing a basic rock groove");
            SessionConfig::basic_rock()
        }
    };

    let result = match &args.export {
        Some(out) => export(&config, out, args.seconds),
        None => play(&config, args.seconds),
    };
    if let Err(message) = result {
        error!("{}", message);
        std::process::exit(1);
    }
}

fn export(config: &SessionConfig, out: &Path, seconds: f64) -> Result<(), String> {
    let settings = ExportSettings {
        duration: ExportDuration::Seconds(seconds),
        ..ExportSettings::default()
    };
    let sample_rate = settings.sample_rate;
    let summary = render_to_wav(config, out, settings).map_err(|e| e.to_string())?;
    info!(
        "Wrote {} ({:.2}s, peak {:.3})",
        out.display(),
        summary.duration_seconds(sample_rate),
        summary.peak
    );
    Ok(())
}

fn play(config: &SessionConfig, seconds: f64) -> Result<(), String> {
    let mut engine = Engine::with_default_output();
    engine.apply_config(config);
    engine.init().map_err(|e| format!("Audio initialisation failed: {}", e))?;

    let steps_per_beat = config.time_signature.steps_per_beat();
    engine.on_step(move |step, measure| {
        if step % steps_per_beat == 0 {
            info!("{}.{}", measure + 1, step / steps_per_beat + 1);
        }
    });

    let measures = Rc::new(RefCell::new(Vec::new()));
    let measure_sink = Rc::clone(&measures);
    engine.on_measure(move |measure, _| measure_sink.borrow_mut().push(measure));

    let mut practice = PracticeSession::new(config.practice);
    engine.apply_practice_update(practice.on_start());
    engine.start();

    let deadline = Instant::now() + Duration::from_secs_f64(seconds);
    loop {
        let now = Instant::now();
        if now >= deadline {
            break;
        }
        engine.pump_at(now);
        for _ in measures.borrow_mut().drain(..) {
            let update = practice.on_measure(engine.tempo());
            engine.apply_practice_update(update);
        }
        std::thread::sleep(engine.time_until_next_tick(Instant::now()));
    }

    engine.stop();
    std::thread::sleep(RELEASE_TIME);
    engine.dispose();
    Ok(())
}
