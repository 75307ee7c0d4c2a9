//! Automatic ticking.
//!
//! Time is passed in as a [`Duration`] since some fixed origin, so the same
//! scheduler works with a monotonic clock natively and with
//! `performance.now()` in a browser.

use std::time::Duration;

use super::{Simulation, SimulationConfig};
use crate::error::Result;
use crate::save::{deserialize_save, serialize_save, SaveOptions};

/// Timer for periodic ticks. Holds at most one pending tick.
#[derive(Debug, Clone, Default)]
pub struct TickScheduler {
    interval: Option<Duration>,
    next_due: Option<Duration>,
}

impl TickScheduler {
    /// Create a scheduler; the first tick is due one interval after `now`.
    pub fn new(interval: Option<Duration>, now: Duration) -> Self {
        let mut scheduler = Self::default();
        scheduler.set_interval(interval, now);
        scheduler
    }

    pub fn interval(&self) -> Option<Duration> {
        self.interval
    }

    /// Time the pending tick is due, if any.
    pub fn next_due(&self) -> Option<Duration> {
        self.next_due
    }

    /// Change the interval. Any pending tick is cancelled and, unless the new
    /// interval is `None` or zero, the next one is scheduled from `now`.
    pub fn set_interval(&mut self, interval: Option<Duration>, now: Duration) {
        self.interval = interval.filter(|i| !i.is_zero());
        self.next_due = self.interval.map(|i| now + i);
    }

    /// Drop the pending tick without changing the interval.
    pub fn cancel(&mut self) {
        self.next_due = None;
    }

    /// Check whether a tick is due at `now`; if so the next one is scheduled
    /// one interval later.
    pub fn poll(&mut self, now: Duration) -> bool {
        match (self.interval, self.next_due) {
            (Some(interval), Some(due)) if now >= due => {
                self.next_due = Some(now + interval);
                true
            }
            _ => false,
        }
    }
}

/// Top level driver: owns the simulation and its tick timer.
#[derive(Debug)]
pub struct Controller {
    simulation: Simulation,
    scheduler: TickScheduler,
    ticks_run: u64,
}

impl Default for Controller {
    fn default() -> Self {
        Self::new(&SimulationConfig::default())
    }
}

impl Controller {
    /// Create a controller around an empty simulation.
    pub fn new(config: &SimulationConfig) -> Self {
        Self {
            simulation: Simulation::with_config(config),
            scheduler: TickScheduler::new(config.tick_interval, Duration::ZERO),
            ticks_run: 0,
        }
    }

    pub fn simulation(&self) -> &Simulation {
        &self.simulation
    }

    pub fn simulation_mut(&mut self) -> &mut Simulation {
        &mut self.simulation
    }

    pub fn scheduler(&self) -> &TickScheduler {
        &self.scheduler
    }

    /// Ticks run by this controller, manual and scheduled.
    pub fn ticks_run(&self) -> u64 {
        self.ticks_run
    }

    /// Run a single tick now.
    pub fn step(&mut self) {
        self.simulation.tick();
        self.ticks_run += 1;
    }

    /// Run `count` ticks now.
    pub fn run_ticks(&mut self, count: u64) {
        for _ in 0..count {
            self.step();
        }
    }

    /// Run a tick if one is due at `now`. Returns whether a tick ran.
    pub fn poll(&mut self, now: Duration) -> bool {
        if self.scheduler.poll(now) {
            self.step();
            true
        } else {
            false
        }
    }

    /// Change the automatic tick interval, `None` to stop ticking.
    pub fn set_tick_interval(&mut self, interval: Option<Duration>, now: Duration) {
        self.scheduler.set_interval(interval, now);
        match self.scheduler.interval() {
            Some(interval) => log::info!("Auto tick every {interval:?}"),
            None => log::info!("Auto tick disabled"),
        }
    }

    /// Tick on schedule for `duration` of wall clock time, sleeping between
    /// ticks. Returns the number of ticks run.
    ///
    /// Returns immediately when no interval is set.
    #[cfg(not(target_arch = "wasm32"))]
    pub fn run_for(&mut self, duration: Duration) -> u64 {
        let Some(interval) = self.scheduler.interval() else {
            return 0;
        };
        let start = std::time::Instant::now();
        self.scheduler.set_interval(Some(interval), Duration::ZERO);
        let mut ran = 0;
        loop {
            let now = start.elapsed();
            if now >= duration {
                break;
            }
            if self.poll(now) {
                ran += 1;
                continue;
            }
            let wake = self.scheduler.next_due().unwrap_or(duration).min(duration);
            std::thread::sleep(wake.saturating_sub(now));
        }
        log::debug!("Ran {ran} scheduled ticks in {duration:?}");
        ran
    }

    /// Export the simulation as save text.
    pub fn save_string(&mut self, options: &SaveOptions) -> Result<String> {
        let save = self.simulation.save(options.include_state)?;
        serialize_save(&save, options)
    }

    /// Replace the simulation with a save given as text.
    pub fn load_str(&mut self, text: &str) -> Result<()> {
        let save = deserialize_save(text)?;
        self.simulation.load(&save)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    #[test]
    fn test_disabled_scheduler_never_fires() {
        let mut scheduler = TickScheduler::new(None, ms(0));
        assert!(!scheduler.poll(ms(1_000_000)));
        scheduler.set_interval(Some(Duration::ZERO), ms(0));
        assert_eq!(scheduler.interval(), None);
        assert!(!scheduler.poll(ms(1_000_000)));
    }

    #[test]
    fn test_scheduler_fires_once_per_interval() {
        let mut scheduler = TickScheduler::new(Some(ms(100)), ms(0));
        assert!(!scheduler.poll(ms(99)));
        assert!(scheduler.poll(ms(100)));
        assert!(!scheduler.poll(ms(150)));
        assert!(scheduler.poll(ms(230)));
        assert_eq!(scheduler.next_due(), Some(ms(330)));
    }

    #[test]
    fn test_set_interval_reschedules() {
        let mut scheduler = TickScheduler::new(Some(ms(100)), ms(0));
        scheduler.set_interval(Some(ms(500)), ms(90));
        assert!(!scheduler.poll(ms(100)));
        assert!(scheduler.poll(ms(590)));

        scheduler.cancel();
        assert!(!scheduler.poll(ms(10_000)));
    }

    #[test]
    fn test_controller_poll_runs_ticks() {
        let config = SimulationConfig::new().with_tick_interval(Some(ms(50)));
        let mut controller = Controller::new(&config);
        assert!(!controller.poll(ms(10)));
        assert!(controller.poll(ms(50)));
        controller.step();
        assert_eq!(controller.ticks_run(), 2);
        assert_eq!(controller.simulation().current_tick(), 2);

        controller.set_tick_interval(None, ms(60));
        assert!(!controller.poll(ms(500)));
    }

    #[test]
    fn test_controller_save_and_load() {
        let mut controller = Controller::default();
        let sim = controller.simulation_mut();
        let switch = sim.add_new("switch").unwrap();
        let led = sim.add_new("led").unwrap();
        sim.connect(
            &crate::circuit::PinRef::new(switch, "Q"),
            &crate::circuit::PinRef::new(led, "I"),
            None,
        )
        .unwrap();
        controller.run_ticks(3);

        let text = controller
            .save_string(&SaveOptions::new().with_state(true))
            .unwrap();
        let mut restored = Controller::default();
        restored.load_str(&text).unwrap();
        assert_eq!(restored.simulation().circuit_count(), 2);
        assert_eq!(restored.simulation().current_tick(), 3);
        assert_eq!(restored.ticks_run(), 0);
    }

    #[test]
    fn test_run_for_without_interval() {
        let mut controller = Controller::default();
        assert_eq!(controller.run_for(ms(20)), 0);
    }

    #[test]
    fn test_run_for_ticks_on_schedule() {
        let config = SimulationConfig::new().with_tick_interval(Some(ms(5)));
        let mut controller = Controller::new(&config);
        let ran = controller.run_for(ms(60));
        assert!(ran >= 1);
        assert!(ran <= 12);
        assert_eq!(controller.simulation().current_tick(), ran);
    }
}
