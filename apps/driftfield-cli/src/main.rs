use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use driftfield_field::{
    FieldAnimator, FrameOutcome, FrameReport, RecordingSurface, SceneConfig, Viewport,
};
use driftfield_frame::{ManualFrameSource, create_throttle};
use driftfield_motion::{
    AnimationOrchestrator, Effect, EffectOptions, MotionEvent, MotionGate, Position, Property,
    PropertyStore, SequenceStep,
};
use driftfield_profile::{
    DeviceSignals, Environment, Headless, HostEnvironment, PerformanceProfiler, PerformanceTier,
    QualitySettings, StaticEnvironment, get_settings,
};
use driftfield_tools::{FieldInspector, FieldSummary, MotionSummary};
use driftfield_visibility::{
    ElementId, ObserveOptions, Rect, ViewportIntersector, VisibilityCallbacks,
    VisibilityController,
};
use glam::Vec2;
use serde::{Deserialize, Serialize};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "driftfield-cli", about = "CLI tool for driftfield scenes")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Print reports as JSON
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print version and crate info
    Info,
    /// Classify the device and print its quality settings
    Profile(ProfileArgs),
    /// Count how often a throttle fires over a run of frames
    Throttle {
        /// Target frames per second
        #[arg(short, long, default_value = "30")]
        fps: u32,
        /// Milliseconds between host frames
        #[arg(long, default_value = "10")]
        step_ms: f64,
        /// Length of the run in milliseconds
        #[arg(short, long, default_value = "1000")]
        duration_ms: f64,
    },
    /// Run an instanced field headlessly against a recording surface
    Simulate(SimulateArgs),
    /// Run a motion choreography against an in-memory element store
    Choreograph(ChoreographArgs),
}

#[derive(Args)]
struct ProfileArgs {
    /// Ignore the host and profile a device with no signals
    #[arg(long)]
    headless: bool,
    /// Override the logical core count
    #[arg(long)]
    cores: Option<u32>,
    /// Override device memory in gigabytes
    #[arg(long)]
    memory_gb: Option<f32>,
    /// Override the display pixel ratio
    #[arg(long)]
    pixel_ratio: Option<f32>,
    /// Report the reduced-motion preference as set
    #[arg(long)]
    reduced_motion: bool,
}

#[derive(Args)]
struct SimulateArgs {
    /// Scene file (YAML); defaults to the built-in field
    scene: Option<PathBuf>,
    /// Host frames to deliver
    #[arg(short, long, default_value = "120")]
    frames: u32,
    /// Milliseconds between host frames
    #[arg(long, default_value = "16.667")]
    step_ms: f64,
    #[arg(long, default_value = "1280")]
    width: f32,
    #[arg(long, default_value = "720")]
    height: f32,
    /// Force a tier instead of the scene's or the host's
    #[arg(long)]
    tier: Option<PerformanceTier>,
    /// Pointer position in normalized device coordinates, e.g. 0.2,-0.1
    #[arg(long, value_delimiter = ',', num_args = 2)]
    pointer: Option<Vec<f32>>,
    /// Scroll the field out of view at this frame
    #[arg(long)]
    hide_at: Option<u32>,
    /// Scroll the field back into view at this frame
    #[arg(long)]
    show_at: Option<u32>,
}

#[derive(Args)]
struct ChoreographArgs {
    /// Choreography file (YAML); defaults to a built-in landing sequence
    file: Option<PathBuf>,
    /// Seconds to simulate
    #[arg(short, long, default_value = "3")]
    duration: f32,
    /// Ticks per second
    #[arg(long, default_value = "60")]
    rate: u32,
    /// Force reduced motion on
    #[arg(long)]
    reduced_motion: bool,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Info => {
            println!("driftfield-cli v{}", env!("CARGO_PKG_VERSION"));
            println!("common: {}", driftfield_common::crate_info());
            println!("profile: {}", driftfield_profile::crate_info());
            println!("frame: {}", driftfield_frame::crate_info());
            println!("visibility: {}", driftfield_visibility::crate_info());
            println!("field: {}", driftfield_field::crate_info());
            println!("motion: {}", driftfield_motion::crate_info());
            println!("tools: {}", driftfield_tools::crate_info());
        }
        Commands::Profile(args) => {
            let report = if args.headless {
                profile(PerformanceProfiler::new(Headless), args.reduced_motion)
            } else if args.cores.is_some() || args.memory_gb.is_some() || args.pixel_ratio.is_some()
            {
                let signals = DeviceSignals {
                    logical_cores: args.cores,
                    device_memory_gb: args.memory_gb,
                    pixel_ratio: args.pixel_ratio,
                };
                let env = StaticEnvironment::new(signals).with_reduced_motion(args.reduced_motion);
                profile(PerformanceProfiler::new(env), false)
            } else {
                profile(PerformanceProfiler::new(HostEnvironment::new()), args.reduced_motion)
            };
            emit(cli.json, &report)?;
        }
        Commands::Throttle {
            fps,
            step_ms,
            duration_ms,
        } => {
            anyhow::ensure!(
                step_ms.is_finite() && step_ms > 0.0,
                "step_ms must be positive, got {step_ms}"
            );
            let mut should_run = create_throttle(fps)?;
            let mut report = ThrottleReport {
                target_fps: fps,
                step_ms,
                duration_ms,
                frames: 0,
                executed: 0,
            };
            let mut now = 0.0;
            while now < duration_ms {
                report.frames += 1;
                if should_run(now) {
                    report.executed += 1;
                }
                now += step_ms;
            }
            emit(cli.json, &report)?;
        }
        Commands::Simulate(args) => {
            let report = simulate(args)?;
            emit(cli.json, &report)?;
        }
        Commands::Choreograph(args) => {
            let report = choreograph(args)?;
            emit(cli.json, &report)?;
        }
    }

    Ok(())
}

fn emit<T: Serialize + fmt::Display>(json: bool, report: &T) -> anyhow::Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(report)?);
    } else {
        println!("{report}");
    }
    Ok(())
}

#[derive(Debug, Serialize)]
struct ProfileReport {
    tier: PerformanceTier,
    signals: Option<DeviceSignals>,
    reduced_motion: bool,
    settings: QualitySettings,
}

impl fmt::Display for ProfileReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "tier: {}", self.tier)?;
        match &self.signals {
            Some(s) => writeln!(
                f,
                "signals: cores={:?} memory_gb={:?} pixel_ratio={:?}",
                s.logical_cores, s.device_memory_gb, s.pixel_ratio
            )?,
            None => writeln!(f, "signals: none")?,
        }
        writeln!(f, "reduced motion: {}", self.reduced_motion)?;
        let s = &self.settings;
        writeln!(
            f,
            "settings: max_fps={} grid={} density={} antialias={} shadows={} pixel_ratio={}..={}",
            s.max_fps,
            s.grid_resolution,
            s.particle_density,
            s.antialias,
            s.shadows,
            s.pixel_ratio_range.min,
            s.pixel_ratio_range.max
        )
    }
}

fn profile<E: Environment>(profiler: PerformanceProfiler<E>, force_reduced: bool) -> ProfileReport {
    let tier = profiler.tier();
    ProfileReport {
        tier,
        signals: profiler.environment().device_signals(),
        reduced_motion: force_reduced || profiler.prefers_reduced_motion(),
        settings: get_settings(tier),
    }
}

#[derive(Debug, Serialize)]
struct ThrottleReport {
    target_fps: u32,
    step_ms: f64,
    duration_ms: f64,
    frames: u32,
    executed: u32,
}

impl fmt::Display for ThrottleReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "throttle {} fps: executed {} of {} frames ({} ms steps over {} ms)",
            self.target_fps, self.executed, self.frames, self.step_ms, self.duration_ms
        )
    }
}

const FIELD_ELEMENT: ElementId = ElementId(1);

#[derive(Debug, Default, Serialize)]
struct SimulationReport {
    field: Option<FieldSummary>,
    frames: u32,
    rendered: u32,
    throttled: u32,
    hidden: u32,
    idle: u32,
    totals: FrameReport,
    last_frame: Option<FrameReport>,
    requests: u64,
    cancelled: u64,
}

impl fmt::Display for SimulationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(field) = &self.field {
            writeln!(f, "{field}")?;
        }
        writeln!(
            f,
            "frames: {} rendered={} throttled={} hidden={} idle={}",
            self.frames, self.rendered, self.throttled, self.hidden, self.idle
        )?;
        writeln!(
            f,
            "writes: instances={} skipped={}",
            self.totals.written, self.totals.skipped
        )?;
        write!(
            f,
            "frame requests: issued={} cancelled={}",
            self.requests, self.cancelled
        )
    }
}

fn simulate(args: SimulateArgs) -> anyhow::Result<SimulationReport> {
    let scene = match &args.scene {
        Some(path) => SceneConfig::load(path)
            .with_context(|| format!("loading scene {}", path.display()))?,
        None => SceneConfig::default(),
    };
    let tier = args
        .tier
        .or(scene.tier)
        .unwrap_or_else(|| PerformanceProfiler::new(HostEnvironment::new()).tier());
    let settings = get_settings(tier);
    tracing::info!(%tier, "simulating field");

    // the field fills the viewport; scrolling by a full height hides it
    let viewport = Rect::new(0.0, 0.0, args.width, args.height);
    let mut visibility = VisibilityController::new(ViewportIntersector::new(viewport));
    visibility
        .backend_mut()
        .set_element_rect(FIELD_ELEMENT, viewport);
    let callbacks = VisibilityCallbacks::new()
        .on_visible(|id| tracing::info!(?id, "field scrolled into view"))
        .on_hidden(|id| tracing::info!(?id, "field scrolled out of view"));
    let signal = visibility.observe(FIELD_ELEMENT, ObserveOptions::default(), callbacks)?;
    let entries = visibility.backend_mut().take_entries();
    visibility.process(&entries);

    let mut source = ManualFrameSource::new();
    let mut animator = FieldAnimator::new(
        scene.field,
        &settings,
        Viewport::new(args.width, args.height),
        scene.max_fps,
    )?
    .with_visibility(signal);
    let mut surface = RecordingSurface::new(animator.renderer().instance_count());

    if let Some(&[x, y]) = args.pointer.as_deref() {
        animator.set_pointer(Some(Vec2::new(x, y)));
    }
    animator.start(&mut source)?;

    let mut report = SimulationReport::default();
    for frame in 0..args.frames {
        let scroll = if args.hide_at == Some(frame) {
            Some(args.height * 2.0)
        } else if args.show_at == Some(frame) {
            Some(0.0)
        } else {
            None
        };
        if let Some(y) = scroll {
            visibility.backend_mut().scroll_to(y);
            let entries = visibility.backend_mut().take_entries();
            visibility.process(&entries);
            animator.sync_visibility(&mut source)?;
        }

        report.frames += 1;
        let Some(id) = source.fire() else {
            report.idle += 1;
            continue;
        };
        let now_ms = f64::from(frame) * args.step_ms;
        match animator.on_animation_frame(id, now_ms, &mut source, &mut surface) {
            FrameOutcome::Rendered(frame_report) => {
                report.rendered += 1;
                report.totals.written += frame_report.written;
                report.totals.skipped += frame_report.skipped;
                report.last_frame = Some(frame_report);
            }
            FrameOutcome::Throttled => report.throttled += 1,
            FrameOutcome::Hidden => report.hidden += 1,
            FrameOutcome::Inactive => report.idle += 1,
        }
    }

    report.field = Some(FieldInspector::summary(tier, &settings, &animator));
    animator.dispose(&mut source);
    visibility.disconnect();
    report.requests = source.requested();
    report.cancelled = source.cancelled();
    Ok(report)
}

/// A choreography file: selectors for the in-memory store plus the steps.
#[derive(Debug, Clone, Default, Deserialize)]
struct ChoreographyFile {
    #[serde(default)]
    selectors: BTreeMap<String, Vec<ElementId>>,
    steps: Vec<SequenceStep>,
}

impl ChoreographyFile {
    fn from_yaml_str(s: &str) -> anyhow::Result<Self> {
        Ok(serde_yaml::from_str(s)?)
    }

    fn landing_page() -> Self {
        let selectors = BTreeMap::from([
            (".hero".to_string(), vec![ElementId(1)]),
            (".card".to_string(), (2..=5).map(ElementId).collect()),
            (".badge".to_string(), vec![ElementId(6)]),
        ]);
        let steps = vec![
            SequenceStep::new(Effect::FadeIn, ".hero"),
            SequenceStep::new(Effect::StaggerFadeIn, ".card").at(Position::Offset(-0.3)),
            SequenceStep::new(Effect::Glow, ".badge")
                .at(Position::WithPrevious)
                .options(EffectOptions::default().with_delay(0.2)),
        ];
        Self { selectors, steps }
    }
}

#[derive(Debug, Serialize)]
struct ChoreographyReport {
    motion_allowed: bool,
    ticks: u32,
    events: Vec<MotionEvent>,
    motion: MotionSummary,
    values: BTreeMap<u64, BTreeMap<Property, f32>>,
    writes: u64,
}

impl fmt::Display for ChoreographyReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "motion allowed: {}  ticks: {}  writes: {}",
            self.motion_allowed, self.ticks, self.writes
        )?;
        for event in &self.events {
            writeln!(f, "event: {event:?}")?;
        }
        for (element, values) in &self.values {
            let props: Vec<String> = values
                .iter()
                .map(|(p, v)| format!("{p:?}={v:.3}"))
                .collect();
            writeln!(f, "element {element}: {}", props.join(" "))?;
        }
        write!(f, "{}", self.motion)
    }
}

fn choreograph(args: ChoreographArgs) -> anyhow::Result<ChoreographyReport> {
    let file = match &args.file {
        Some(path) => {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("reading {}", path.display()))?;
            ChoreographyFile::from_yaml_str(&text)
                .with_context(|| format!("parsing {}", path.display()))?
        }
        None => ChoreographyFile::landing_page(),
    };
    let gate = if args.reduced_motion {
        MotionGate::reduced()
    } else {
        MotionGate::from_environment(&HostEnvironment::new())
    };
    play(file, gate, args.duration, args.rate)
}

/// Run a choreography against an in-memory store for `duration` seconds.
fn play(
    file: ChoreographyFile,
    gate: MotionGate,
    duration: f32,
    rate: u32,
) -> anyhow::Result<ChoreographyReport> {
    anyhow::ensure!(rate > 0, "rate must be positive");
    let mut store = PropertyStore::new();
    let elements: Vec<ElementId> = file.selectors.values().flatten().copied().collect();
    for (selector, ids) in file.selectors {
        store.register(selector, ids);
    }

    let mut orchestrator = AnimationOrchestrator::new(store, gate);
    let handle = orchestrator.sequence(&file.steps)?;
    if handle.is_none() {
        tracing::info!("reduced motion requested, choreography skipped");
    }

    let dt = 1.0 / rate as f32;
    let ticks = (duration.max(0.0) * rate as f32).round() as u32;
    for _ in 0..ticks {
        orchestrator.advance(dt);
    }

    let motion = FieldInspector::motion(orchestrator.engine());
    let events = orchestrator.engine_mut().drain_events();
    let store = orchestrator.resolver();
    let mut values = BTreeMap::new();
    for element in elements {
        let v = store.element_values(element);
        if !v.is_empty() {
            values.insert(element.0, v);
        }
    }
    Ok(ChoreographyReport {
        motion_allowed: gate.allows_motion(),
        ticks,
        events,
        motion,
        values,
        writes: store.writes(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use driftfield_motion::AnimatableTarget;

    const LANDING: &str = include_str!("../../../demos/landing.yaml");
    const RINGS: &str = include_str!("../../../demos/rings.yaml");

    #[test]
    fn landing_demo_parses() {
        let file = ChoreographyFile::from_yaml_str(LANDING).unwrap();
        assert_eq!(file.selectors.len(), 3);
        assert_eq!(file.selectors[".card"].len(), 4);
        assert_eq!(file.steps.len(), 3);
        assert_eq!(
            file.steps[0].target,
            AnimatableTarget::Selector(".hero".into())
        );
        assert_eq!(file.steps[1].position, Position::Offset(-0.3));
        assert_eq!(file.steps[2].target, AnimatableTarget::Element(ElementId(6)));
        assert_eq!(file.steps[2].position, Position::WithPrevious);
        assert_eq!(file.steps[2].options.delay, Some(0.2));
    }

    #[test]
    fn landing_demo_plays_to_completion() {
        let file = ChoreographyFile::from_yaml_str(LANDING).unwrap();
        let report = play(file, MotionGate::allow(), 5.0, 60).unwrap();
        assert!(report.motion_allowed);
        assert!(report.writes > 0);
        assert!(
            report
                .events
                .iter()
                .any(|e| matches!(e, MotionEvent::Started { .. }))
        );
        // every card ends fully visible
        for id in 2..=5 {
            let opacity = report.values[&id][&Property::Opacity];
            assert!((opacity - 1.0).abs() < 1e-4, "card {id} at {opacity}");
        }
    }

    #[test]
    fn reduced_motion_skips_the_demo() {
        let file = ChoreographyFile::from_yaml_str(LANDING).unwrap();
        let report = play(file, MotionGate::reduced(), 1.0, 60).unwrap();
        assert!(!report.motion_allowed);
        assert_eq!(report.writes, 0);
        assert!(report.events.is_empty());
    }

    #[test]
    fn built_in_sequence_matches_demo_shape() {
        let built_in = ChoreographyFile::landing_page();
        let demo = ChoreographyFile::from_yaml_str(LANDING).unwrap();
        assert_eq!(built_in.selectors, demo.selectors);
        assert_eq!(built_in.steps.len(), demo.steps.len());
    }

    #[test]
    fn rings_demo_loads() {
        let scene = SceneConfig::from_yaml_str(RINGS).unwrap();
        assert_eq!(scene.max_fps, Some(30));
        assert_eq!(scene.field.seed, 7);
    }

    #[test]
    fn zero_rate_rejected() {
        assert!(play(ChoreographyFile::landing_page(), MotionGate::allow(), 1.0, 0).is_err());
    }
}
