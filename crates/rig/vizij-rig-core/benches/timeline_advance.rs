use criterion::{black_box, criterion_group, criterion_main, Criterion};
use serde_json::Value;
use vizij_rig_core::{
    ClipData, ClipEngine, Config, Controller, EventTimeline, ManualTimeSource, UserEvent,
};

fn timeline(count: usize) -> EventTimeline {
    let mut tl = EventTimeline::with_capacity(count);
    for i in 0..count {
        let anim = if i % 2 == 0 { "walk" } else { "run" };
        tl.add(anim, &format!("e{i}"), i as f32 / count as f32, Value::Null);
    }
    tl
}

fn bench_timeline_sweep(c: &mut Criterion) {
    c.bench_function("timeline_sweep_256", |b| {
        b.iter(|| {
            let mut tl = timeline(256);
            let mut fired = 0usize;
            let mut sink = |_: &UserEvent| fired += 1;
            let mut t = 0.0f32;
            while t <= 1.0 {
                tl.advance(black_box(t), "walk", &mut sink);
                t += 1.0 / 60.0;
            }
            fired
        });
    });
}

fn bench_controller_ticks(c: &mut Criterion) {
    c.bench_function("controller_600_ticks", |b| {
        b.iter(|| {
            let host = ManualTimeSource::new(0.0);
            let engine = ClipEngine::with_clips([ClipData::new("walk", 1.0)]);
            let mut ctl = Controller::new(engine, Config::default(), host.clone());
            for i in 0..32 {
                ctl.add_event("walk", &format!("step{i}"), i as f32 / 32.0, Value::Null);
            }
            ctl.on_attached();
            ctl.play("walk", -1, 0, None);
            ctl.update();
            for _ in 0..600 {
                host.advance(1.0 / 60.0);
                ctl.update();
            }
            black_box(ctl.current_time())
        });
    });
}

criterion_group!(benches, bench_timeline_sweep, bench_controller_ticks);
criterion_main!(benches);
