//! Headless driver: plays one run with a scripted input and logs the outcome.
//!
//! Usage: `stagerun-headless [--stage=PATH | --seed=N] [--frame-ms=F] [--max-ticks=N]`

use stagerun_core::clock::ManualClock;
use stagerun_core::sim_trait::Simulation;
use tracing_subscriber::EnvFilter;

use stagerun_platformer::PlatformerRun;
use stagerun_platformer::config::PlatformerConfig;
use stagerun_platformer::physics::PlatformerInput;
use stagerun_platformer::stage::StageData;
use stagerun_platformer::stage_gen::{clearability, generate_stage};
use stagerun_platformer::state::RunPhase;

fn arg_value(prefix: &str) -> Option<String> {
    std::env::args()
        .skip(1)
        .find_map(|a| a.strip_prefix(prefix).map(String::from))
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let frame_ms = arg_value("--frame-ms=")
        .and_then(|v| v.parse::<f32>().ok())
        .filter(|v| v.is_finite() && *v > 0.0)
        .unwrap_or(stagerun_core::NOMINAL_FRAME_MS);
    let max_ticks = arg_value("--max-ticks=")
        .and_then(|v| v.parse::<usize>().ok())
        .unwrap_or(10_000);

    let stage = match arg_value("--stage=") {
        Some(path) => match StageData::from_path(std::path::Path::new(&path)) {
            Ok(stage) => stage,
            Err(e) => {
                tracing::warn!("{e}, using fallback stage");
                StageData::fallback()
            },
        },
        None => {
            let seed = arg_value("--seed=")
                .and_then(|v| v.parse::<u64>().ok())
                .unwrap_or(42);
            generate_stage(seed)
        },
    };

    let report = clearability(&stage);
    tracing::info!(
        stage = stage.id,
        name = %stage.name,
        safe = report.safe,
        difficult = report.difficult,
        impossible = report.impossible,
        "stage ready"
    );

    let clock = ManualClock::new(0.0);
    let mut run = PlatformerRun::new(stage, PlatformerConfig::load(), clock.clone());
    run.set_input(PlatformerInput {
        start: true,
        ..Default::default()
    });

    for tick in 0..max_ticks {
        clock.advance(f64::from(frame_ms));
        let grounded = run.state().player.grounded;
        run.set_input(PlatformerInput {
            right: true,
            jump: grounded,
            ..Default::default()
        });
        for event in run.update(frame_ms) {
            if event.is_terminal() {
                tracing::info!(tick, ?event, "run ended");
            } else {
                tracing::debug!(tick, ?event);
            }
        }
        if run.is_over() {
            break;
        }
    }

    let state = run.state();
    match run.phase() {
        RunPhase::Over(outcome) => tracing::info!(
            ?outcome,
            score = state.final_score,
            time_remaining = state.time_remaining,
            x = state.player.x,
            "run finished"
        ),
        phase => tracing::warn!(?phase, x = state.player.x, "tick budget exhausted"),
    }
}
