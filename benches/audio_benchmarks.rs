use criterion::{BatchSize, BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use drumtrainer::audio::parameters::{Bus, MixerParams};
use drumtrainer::audio::renderer::Renderer;
use drumtrainer::audio::timing::AudioTiming;
use drumtrainer::engine::step::{StepContext, plan_step};
use drumtrainer::messaging::channels::create_command_channel;
use drumtrainer::messaging::command::AudioCommand;
use drumtrainer::synth::drums::DrumSynth;
use drumtrainer::synth::voice::{LayerSpec, Voice};
use drumtrainer::{InstrumentId, Scheduler, SchedulerEvent, SessionConfig, TimeSignature};
use ringbuf::traits::Producer;

const SAMPLE_RATE: u32 = 48000;
const BUFFER_SIZE: usize = 512;

/// Layers of a few long-ringing hits, enough to fill `count` voices
fn crash_layers(count: usize) -> Vec<(Bus, LayerSpec)> {
    let synth = DrumSynth::new(SAMPLE_RATE);
    let mut layers = Vec::new();
    while layers.len() < count {
        synth.trigger(InstrumentId::Crash, 0.0, 0.8, &mut layers);
    }
    layers.truncate(count);
    layers
}

/// Benchmark one render block with a growing number of voices
fn bench_renderer_block(c: &mut Criterion) {
    let mut group = c.benchmark_group("renderer");

    for num_voices in [1, 8, 32, 128] {
        let layers = crash_layers(num_voices);

        group.bench_with_input(
            BenchmarkId::from_parameter(format!("{}_voices", num_voices)),
            &layers,
            |b, layers| {
                b.iter_batched(
                    || {
                        let (mut tx, rx) = create_command_channel(num_voices + 1);
                        let renderer = Renderer::new(
                            AudioTiming::new(SAMPLE_RATE as f32),
                            rx,
                            MixerParams::new(),
                        );
                        for (bus, layer) in layers.iter().cloned() {
                            let voice = Voice::new(bus, layer, SAMPLE_RATE as f32);
                            let _ = tx.try_push(AudioCommand::Play(voice));
                        }
                        (renderer, vec![0.0f32; BUFFER_SIZE])
                    },
                    |(mut renderer, mut buffer)| {
                        renderer.render_mono(&mut buffer);
                        black_box(buffer);
                    },
                    BatchSize::SmallInput,
                );
            },
        );
    }
    group.finish();
}

/// Benchmark layer building for every instrument (runs on the engine thread)
fn bench_drum_trigger(c: &mut Criterion) {
    let mut group = c.benchmark_group("drum_trigger");
    let synth = DrumSynth::new(SAMPLE_RATE);
    let mut layers = Vec::with_capacity(16);

    for instrument in InstrumentId::ALL {
        group.bench_function(instrument.as_str(), |b| {
            b.iter(|| {
                layers.clear();
                synth.trigger(black_box(instrument), 0.5, 0.8, &mut layers);
                black_box(layers.len());
            });
        });
    }
    group.finish();
}

/// Benchmark one lookahead poll at steady state
fn bench_scheduler_poll(c: &mut Criterion) {
    c.bench_function("scheduler_poll", |b| {
        let mut scheduler = Scheduler::new();
        scheduler.set_tempo(180.0);
        scheduler.start(0.0);
        let mut events: Vec<SchedulerEvent> = Vec::with_capacity(8);
        let mut now = 0.0;

        b.iter(|| {
            events.clear();
            scheduler.schedule(black_box(now), &mut events);
            now += 0.025;
            black_box(events.len());
        });
    });
}

/// Benchmark step planning for a full groove
fn bench_plan_step(c: &mut Criterion) {
    let config = SessionConfig::basic_rock();
    let patterns = config.patterns();
    let ctx = StepContext {
        patterns: &patterns,
        time_signature: TimeSignature::FourFour,
        metronome_enabled: true,
        muted: false,
    };

    c.bench_function("plan_step_measure", |b| {
        b.iter(|| {
            for step in 0..16 {
                black_box(plan_step(&ctx, black_box(step), 0));
            }
        });
    });
}

criterion_group!(
    benches,
    bench_renderer_block,
    bench_drum_trigger,
    bench_scheduler_poll,
    bench_plan_step
);
criterion_main!(benches);
