//! The control loop: periodic fetch+render, immediate refresh on button
//! press, animation ticks, and the error-frame fallback.
//!
//! Single cooperative loop, one bounded wait per iteration. The wait is
//! the smaller of the remaining refresh time and the mode's tick budget,
//! so button input stays responsive while a failing endpoint is still
//! retried no more often than once per interval.

use std::sync::atomic::AtomicBool;
use std::time::Duration;

use tokio::time::Instant;

use crate::Palette;
use crate::bubbles::BubbleField;
use crate::fetch::StatusSource;
use crate::grid;
use crate::is_running;
use crate::map::MetricMap;
use crate::store::StatusStore;
use crate::surface::Surface;

/// Loop tick budget in grid mode: input polling cadence between fetches.
const GRID_TICK: Duration = Duration::from_millis(100);
/// Loop tick budget in bubble mode (~20 fps).
const BUBBLE_TICK: Duration = Duration::from_millis(50);

const BRIGHTNESS_STEP: f32 = 0.1;

// ── Input ───────────────────────────────────────────────────────────

/// Discrete input events from the panel's buttons.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InputEvent {
    BrightnessUp,
    BrightnessDown,
    /// Force an immediate fetch+render and reset the refresh timer.
    Refresh,
}

/// Button collaborator, polled once per loop iteration.
pub trait InputSource {
    fn poll(&mut self) -> Vec<InputEvent>;
}

/// Input source for panels without buttons.
#[derive(Default)]
pub struct NoInput;

impl InputSource for NoInput {
    fn poll(&mut self) -> Vec<InputEvent> {
        Vec::new()
    }
}

// ── Refresh timing ──────────────────────────────────────────────────

/// Tracks when the next periodic fetch is due. Any fetch, periodic or
/// forced, resets it.
#[derive(Clone, Copy, Debug)]
pub struct RefreshTimer {
    last: Instant,
    interval: Duration,
}

impl RefreshTimer {
    pub fn new(interval: Duration) -> Self {
        Self {
            last: Instant::now(),
            interval,
        }
    }

    pub fn due(&self, now: Instant) -> bool {
        now.duration_since(self.last) >= self.interval
    }

    pub fn reset(&mut self, now: Instant) {
        self.last = now;
    }

    /// Time left until the next fetch; zero when already due.
    pub fn remaining(&self, now: Instant) -> Duration {
        self.interval
            .saturating_sub(now.duration_since(self.last))
    }
}

// ── Grid mode ───────────────────────────────────────────────────────

/// Run the grid-mode loop until `running` clears.
///
/// Every fetch cycle ends in exactly one presented frame: the full grid
/// on success, the diagonal error pattern when the cycle failed outright.
/// Brightness changes re-render immediately from the stored values.
pub async fn run_grid<S: StatusSource>(
    source: &mut S,
    map: &MetricMap,
    store: &mut StatusStore,
    palette: &Palette,
    surface: &mut dyn Surface,
    input: &mut dyn InputSource,
    refresh_interval: Duration,
    running: &AtomicBool,
) {
    let mut timer = RefreshTimer::new(refresh_interval);
    fetch_and_render(source, map, store, palette, surface).await;
    timer.reset(Instant::now());

    while is_running(running) {
        let mut refresh_now = false;
        let mut redraw = false;

        for event in input.poll() {
            match event {
                InputEvent::BrightnessUp => {
                    surface.adjust_brightness(BRIGHTNESS_STEP);
                    redraw = true;
                }
                InputEvent::BrightnessDown => {
                    surface.adjust_brightness(-BRIGHTNESS_STEP);
                    redraw = true;
                }
                InputEvent::Refresh => refresh_now = true,
            }
        }

        if refresh_now || timer.due(Instant::now()) {
            fetch_and_render(source, map, store, palette, surface).await;
            timer.reset(Instant::now());
        } else if redraw {
            grid::render(map, store, palette, surface);
        }

        let wait = timer.remaining(Instant::now()).min(GRID_TICK);
        tokio::time::sleep(wait).await;
    }
}

async fn fetch_and_render<S: StatusSource>(
    source: &mut S,
    map: &MetricMap,
    store: &mut StatusStore,
    palette: &Palette,
    surface: &mut dyn Surface,
) {
    let outcome = source.refresh_cycle(store).await;
    if outcome.is_failure() {
        tracing::warn!("refresh cycle failed, showing error pattern");
        grid::error_pattern(surface, palette);
    } else {
        grid::render(map, store, palette, surface);
    }
}

// ── Bubble mode ─────────────────────────────────────────────────────

/// Run the bubble-mode loop until `running` clears.
///
/// Animation advances every tick; fetching is a side activity at the
/// refresh interval. A failed fetch is non-fatal here: bound statuses
/// simply stay stale (or unknown) and the field keeps moving.
pub async fn run_bubbles<S: StatusSource>(
    source: &mut S,
    field: &mut BubbleField,
    store: &mut StatusStore,
    surface: &mut dyn Surface,
    input: &mut dyn InputSource,
    refresh_interval: Duration,
    running: &AtomicBool,
) {
    let mut timer = RefreshTimer::new(refresh_interval);
    source.refresh_cycle(store).await;
    timer.reset(Instant::now());

    while is_running(running) {
        let tick_started = Instant::now();
        let mut refresh_now = false;

        for event in input.poll() {
            match event {
                InputEvent::BrightnessUp => surface.adjust_brightness(BRIGHTNESS_STEP),
                InputEvent::BrightnessDown => surface.adjust_brightness(-BRIGHTNESS_STEP),
                InputEvent::Refresh => refresh_now = true,
            }
        }

        if refresh_now || timer.due(Instant::now()) {
            source.refresh_cycle(store).await;
            timer.reset(Instant::now());
        }

        field.update();
        field.draw(store, surface);

        let elapsed = tick_started.elapsed();
        if elapsed < BUBBLE_TICK {
            tokio::time::sleep(BUBBLE_TICK - elapsed).await;
        }
    }
}

// ── Tests ───────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::GridConfig;
    use crate::fetch::FetchOutcome;
    use crate::surface::FrameSurface;
    use pretty_assertions::assert_eq;
    use std::collections::VecDeque;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicBool, Ordering};

    /// Scripted fetch cycle: counts calls, writes one value, returns a
    /// fixed outcome.
    struct ScriptedSource {
        calls: usize,
        outcome: FetchOutcome,
    }

    impl ScriptedSource {
        fn new(outcome: FetchOutcome) -> Self {
            Self { calls: 0, outcome }
        }
    }

    impl StatusSource for ScriptedSource {
        async fn refresh_cycle(&mut self, store: &mut StatusStore) -> FetchOutcome {
            self.calls += 1;
            store.set("billing_us_health", true);
            self.outcome
        }
    }

    /// Replays one batch of events per poll, then stops the loop.
    struct ScriptedInput {
        batches: VecDeque<Vec<InputEvent>>,
        running: Arc<AtomicBool>,
    }

    impl ScriptedInput {
        fn new(batches: Vec<Vec<InputEvent>>, running: Arc<AtomicBool>) -> Self {
            Self {
                batches: batches.into(),
                running,
            }
        }
    }

    impl InputSource for ScriptedInput {
        fn poll(&mut self) -> Vec<InputEvent> {
            match self.batches.pop_front() {
                Some(batch) => batch,
                None => {
                    self.running.store(false, Ordering::SeqCst);
                    Vec::new()
                }
            }
        }
    }

    fn fixtures() -> (MetricMap, StatusStore, Palette, FrameSurface) {
        (
            MetricMap::build(),
            StatusStore::new(),
            Palette::default(),
            FrameSurface::new(GridConfig::default()),
        )
    }

    #[test]
    fn refresh_timer_tracks_the_interval() {
        let interval = Duration::from_millis(300);
        let start = Instant::now();
        let mut timer = RefreshTimer::new(interval);
        timer.reset(start);

        assert!(!timer.due(start + Duration::from_millis(299)));
        assert!(timer.due(start + Duration::from_millis(300)));
        assert!(timer.due(start + Duration::from_millis(900)));

        timer.reset(start + Duration::from_millis(900));
        assert!(!timer.due(start + Duration::from_millis(1100)));
        assert_eq!(
            timer.remaining(start + Duration::from_millis(1100)),
            Duration::from_millis(100)
        );
        assert_eq!(timer.remaining(start + Duration::from_millis(1300)), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn manual_refresh_fetches_immediately_and_resets_the_timer() {
        let (map, mut store, palette, mut surface) = fixtures();
        let mut source = ScriptedSource::new(FetchOutcome::Success);
        let running = Arc::new(AtomicBool::new(true));

        // Interval 300 ms, tick 100 ms: the forced refresh fires in the
        // third iteration at t=200. Without a timer reset the periodic
        // path would add a third call at t=300 before the script ends.
        let mut input = ScriptedInput::new(
            vec![vec![], vec![], vec![InputEvent::Refresh], vec![]],
            running.clone(),
        );

        run_grid(
            &mut source,
            &map,
            &mut store,
            &palette,
            &mut surface,
            &mut input,
            Duration::from_millis(300),
            &running,
        )
        .await;

        assert_eq!(source.calls, 2, "initial fetch + forced refresh only");
        assert_eq!(surface.presented_frames(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn periodic_refresh_fires_once_per_interval() {
        let (map, mut store, palette, mut surface) = fixtures();
        let mut source = ScriptedSource::new(FetchOutcome::Success);
        let running = Arc::new(AtomicBool::new(true));

        // Five idle iterations at 100 ms tick with a 250 ms interval:
        // exactly one periodic refresh lands (at t=250), then the timer
        // restarts and the script ends before the next one is due.
        let mut input = ScriptedInput::new(vec![vec![]; 5], running.clone());

        run_grid(
            &mut source,
            &map,
            &mut store,
            &palette,
            &mut surface,
            &mut input,
            Duration::from_millis(250),
            &running,
        )
        .await;

        assert_eq!(source.calls, 2, "initial fetch + one periodic refresh");
    }

    #[tokio::test(start_paused = true)]
    async fn failed_cycle_substitutes_the_error_pattern() {
        let (map, mut store, palette, mut surface) = fixtures();
        let mut source = ScriptedSource::new(FetchOutcome::Failed);
        let running = Arc::new(AtomicBool::new(true));
        let mut input = ScriptedInput::new(vec![vec![]], running.clone());

        run_grid(
            &mut source,
            &map,
            &mut store,
            &palette,
            &mut surface,
            &mut input,
            Duration::from_secs(30),
            &running,
        )
        .await;

        // The diagonal is lit and the rest of row 0 is dark: this is the
        // error frame, not a rendered grid (which would show unknown blue).
        assert_eq!(surface.pixel(0, 0), palette.critical);
        assert_eq!(surface.pixel(1, 0), crate::Color::BLACK);
    }

    #[tokio::test(start_paused = true)]
    async fn brightness_buttons_adjust_and_redraw() {
        let (map, mut store, palette, mut surface) = fixtures();
        let mut source = ScriptedSource::new(FetchOutcome::Success);
        let running = Arc::new(AtomicBool::new(true));
        let mut input = ScriptedInput::new(
            vec![vec![InputEvent::BrightnessUp, InputEvent::BrightnessUp]],
            running.clone(),
        );

        run_grid(
            &mut source,
            &map,
            &mut store,
            &palette,
            &mut surface,
            &mut input,
            Duration::from_secs(30),
            &running,
        )
        .await;

        assert!((surface.brightness() - 0.7).abs() < 1e-6);
        // Initial render plus the brightness redraw.
        assert_eq!(surface.presented_frames(), 2);
        assert_eq!(source.calls, 1, "brightness must not trigger a fetch");
    }

    #[tokio::test(start_paused = true)]
    async fn bubble_loop_animates_every_tick_despite_fetch_failures() {
        let mut field = BubbleField::with_seed(GridConfig::default(), 5);
        let mut store = StatusStore::new();
        let mut surface = FrameSurface::new(GridConfig::default());
        let mut source = ScriptedSource::new(FetchOutcome::Failed);
        let running = Arc::new(AtomicBool::new(true));
        let mut input = ScriptedInput::new(vec![vec![]; 4], running.clone());

        run_bubbles(
            &mut source,
            &mut field,
            &mut store,
            &mut surface,
            &mut input,
            Duration::from_secs(30),
            &running,
        )
        .await;

        // One frame per animation tick, including the iteration in which
        // the script runs out; the failed fetch never stops the field.
        assert_eq!(surface.presented_frames(), 5);
        assert_eq!(source.calls, 1);
    }
}
