use crossbeam_channel::{bounded, never, select, Receiver};
use std::io::{BufRead, Write};
use std::time::Instant;

use crate::config::RunConfig;
use crate::error::{InputError, PipelineError};
use crate::report::write_snapshot;
use crate::scheduler::ReportScheduler;
use crate::source;
use crate::stats::{Aggregator, ExtraFields};

pub const INTAKE_CAPACITY: usize = 100;

/// What a single [`Driver::step`] handled.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Step {
    Intake(f64),
    Reported { count: usize },
    InputClosed,
    SourceFinished,
    TicksClosed,
}

enum Event {
    Failure(Option<InputError>),
    Tick(bool),
    Value(Option<f64>),
}

/// Arbitrates between arriving values and report ticks, owning the
/// working set for the lifetime of the run.
pub struct Driver<W> {
    aggregator: Aggregator,
    targets: Vec<f64>,
    extra: ExtraFields,
    values: Receiver<f64>,
    failures: Receiver<InputError>,
    ticks: Receiver<Instant>,
    out: W,
}

impl<W: Write> Driver<W> {
    pub fn new(
        config: &RunConfig,
        values: Receiver<f64>,
        failures: Receiver<InputError>,
        ticks: Receiver<Instant>,
        out: W,
    ) -> Self {
        Self {
            aggregator: Aggregator::new(),
            targets: config.percentiles.targets().to_vec(),
            extra: ExtraFields {
                mean: config.show_mean,
                max: config.show_max,
            },
            values,
            failures,
            ticks,
            out,
        }
    }

    /// Waits for the next event and handles it. A closed channel is swapped
    /// for one that never fires, so the loop keeps reporting after end of
    /// input.
    pub fn step(&mut self) -> Result<Step, PipelineError> {
        let event = select! {
            recv(self.failures) -> msg => Event::Failure(msg.ok()),
            recv(self.ticks) -> msg => Event::Tick(msg.is_ok()),
            recv(self.values) -> msg => Event::Value(msg.ok()),
        };

        match event {
            Event::Failure(Some(e)) => Err(e.into()),
            Event::Failure(None) => {
                self.failures = never();
                Ok(Step::SourceFinished)
            }
            Event::Tick(true) => self.report(),
            Event::Tick(false) => {
                self.ticks = never();
                Ok(Step::TicksClosed)
            }
            Event::Value(Some(value)) => {
                self.aggregator.intake(value);
                Ok(Step::Intake(value))
            }
            Event::Value(None) => {
                log::debug!("intake queue closed with {} values", self.aggregator.len());
                self.values = never();
                Ok(Step::InputClosed)
            }
        }
    }

    /// Runs until a fatal error; there is no other way out.
    pub fn run(mut self) -> Result<(), PipelineError> {
        log::debug!("driver loop started");
        loop {
            match self.step()? {
                Step::Intake(value) => log::trace!("intake {}", value),
                Step::Reported { count } => log::trace!("reported over {} values", count),
                Step::InputClosed => log::debug!("input closed, reporting continues"),
                Step::SourceFinished | Step::TicksClosed => {}
            }
        }
    }

    fn report(&mut self) -> Result<Step, PipelineError> {
        // a failed source wins over any tick that raced with it
        if let Ok(e) = self.failures.try_recv() {
            return Err(e.into());
        }
        let snapshot = self.aggregator.snapshot(&self.targets, self.extra);
        write_snapshot(&mut self.out, &snapshot).map_err(PipelineError::Output)?;
        Ok(Step::Reported {
            count: snapshot.count,
        })
    }
}

pub struct Pipeline;

impl Pipeline {
    /// Starts the value source and the report scheduler together and returns
    /// the driver that consumes both.
    pub fn start<R, W>(config: &RunConfig, input: R, out: W) -> Result<Driver<W>, PipelineError>
    where
        R: BufRead + Send + 'static,
        W: Write,
    {
        let (value_tx, value_rx) = bounded(INTAKE_CAPACITY);
        let (failure_tx, failure_rx) = bounded(1);
        source::spawn(input, value_tx, failure_tx).map_err(PipelineError::Spawn)?;
        let scheduler = ReportScheduler::start(config.refresh_rate);
        log::debug!("report scheduler started, period {:?}", scheduler.period());
        Ok(Driver::new(config, value_rx, failure_rx, scheduler.ticks(), out))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PercentileSpec;
    use crossbeam_channel::Sender;
    use std::io::Cursor;
    use std::time::Duration;

    struct Harness {
        driver: Driver<Vec<u8>>,
        values: Sender<f64>,
        failures: Sender<InputError>,
        ticks: Sender<Instant>,
    }

    fn config(targets: &[&str], mean: bool, max: bool) -> RunConfig {
        let mut percentiles = PercentileSpec::default();
        for t in targets {
            percentiles.add_target(t).unwrap();
        }
        RunConfig {
            percentiles,
            show_mean: mean,
            show_max: max,
            refresh_rate: Duration::from_secs(1),
        }
    }

    fn harness(config: &RunConfig) -> Harness {
        let (values, value_rx) = bounded(INTAKE_CAPACITY);
        let (failures, failure_rx) = bounded(1);
        let (ticks, tick_rx) = bounded(1);
        Harness {
            driver: Driver::new(config, value_rx, failure_rx, tick_rx, Vec::new()),
            values,
            failures,
            ticks,
        }
    }

    impl Harness {
        fn feed(&mut self, values: &[f64]) {
            for &v in values {
                self.values.send(v).unwrap();
                assert_eq!(self.driver.step().unwrap(), Step::Intake(v));
            }
        }

        fn tick(&mut self) -> Step {
            self.ticks.send(Instant::now()).unwrap();
            self.driver.step().unwrap()
        }

        fn output(&self) -> String {
            String::from_utf8(self.driver.out.clone()).unwrap()
        }
    }

    #[test]
    fn test_one_to_ten_with_mean_and_max() {
        let mut h = harness(&config(&["50"], true, true));
        let values: Vec<f64> = (1..=10).map(f64::from).collect();
        h.feed(&values);
        assert_eq!(h.tick(), Step::Reported { count: 10 });
        assert_eq!(h.output(), "| p50 = 6.00   | Mean = 5.50   | Max = 10.00   |\n");
    }

    #[test]
    fn test_empty_working_set_prints_bare_frame() {
        let mut h = harness(&config(&[], true, true));
        assert_eq!(h.tick(), Step::Reported { count: 0 });
        assert_eq!(h.output(), "|\n");
    }

    #[test]
    fn test_ticks_without_intake_repeat_the_same_line() {
        let mut h = harness(&config(&[], false, true));
        h.feed(&[4.0, 8.0, 15.0, 16.0, 23.0, 42.0]);
        h.tick();
        h.tick();
        let out = h.output();
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0], lines[1]);
        assert_eq!(lines[0], "| p50 = 16.00   | p90 = 42.00   | p99 = 42.00   | Max = 42.00   |");
    }

    #[test]
    fn test_working_set_is_cumulative_across_ticks() {
        let mut h = harness(&config(&["0"], false, true));
        h.feed(&[5.0]);
        h.tick();
        h.feed(&[1.0, 9.0]);
        h.tick();
        assert_eq!(
            h.output(),
            "| p0 = 5.00   | Max = 5.00   |\n| p0 = 1.00   | Max = 9.00   |\n"
        );
    }

    #[test]
    fn test_reporting_continues_after_end_of_input() {
        let Harness {
            mut driver,
            values,
            failures: _failures,
            ticks,
        } = harness(&config(&["50"], false, false));
        values.send(3.0).unwrap();
        drop(values);
        assert_eq!(driver.step().unwrap(), Step::Intake(3.0));
        assert_eq!(driver.step().unwrap(), Step::InputClosed);
        for _ in 0..3 {
            ticks.send(Instant::now()).unwrap();
            assert_eq!(driver.step().unwrap(), Step::Reported { count: 1 });
        }
        assert_eq!(
            String::from_utf8(driver.out).unwrap(),
            "| p50 = 3.00   |\n".repeat(3)
        );
    }

    /// Values racing with a tick may or may not make it into that snapshot.
    #[test]
    fn test_tick_racing_with_intake_sees_a_prefix() {
        let mut h = harness(&config(&["0"], false, false));
        for v in 0..50 {
            h.values.send(f64::from(v)).unwrap();
        }
        h.ticks.send(Instant::now()).unwrap();

        let mut intakes = 0;
        let reported = loop {
            match h.driver.step().unwrap() {
                Step::Intake(_) => intakes += 1,
                Step::Reported { count } => break count,
                other => panic!("unexpected step {:?}", other),
            }
        };
        assert_eq!(reported, intakes);
        assert!(reported <= 50);
    }

    #[test]
    fn test_failure_stops_the_loop_before_reporting() {
        let mut h = harness(&config(&[], false, false));
        h.feed(&[1.0]);
        h.failures
            .send(source::parse_line(2, "abc").unwrap_err())
            .unwrap();
        h.ticks.send(Instant::now()).unwrap();
        let err = h.driver.step().unwrap_err();
        assert!(matches!(err, PipelineError::Input(InputError::Parse { line: 2, .. })));
        assert_eq!(h.output(), "");
    }

    /// More lines than the intake queue holds drain without deadlock.
    #[test]
    fn test_large_input_drains_through_bounded_queue() {
        let cfg = config(&["50"], false, true);
        let (value_tx, value_rx) = bounded(INTAKE_CAPACITY);
        let (failure_tx, failure_rx) = bounded(1);
        let (tick_tx, tick_rx) = bounded(1);
        let input: String = (1..=1000).map(|i| format!("{}\n", i)).collect();
        let handle = source::spawn(Cursor::new(input), value_tx, failure_tx).unwrap();
        let mut driver = Driver::new(&cfg, value_rx, failure_rx, tick_rx, Vec::new());

        while driver.step().unwrap() != Step::InputClosed {}
        handle.join().unwrap();
        tick_tx.send(Instant::now()).unwrap();
        loop {
            if let Step::Reported { count } = driver.step().unwrap() {
                assert_eq!(count, 1000);
                break;
            }
        }
        assert_eq!(
            String::from_utf8(driver.out).unwrap(),
            "| p50 = 501.00   | Max = 1000.00   |\n"
        );
    }

    #[test]
    fn test_pipeline_start_reports_on_schedule() {
        let cfg = config(&["50"], true, false);
        let mut driver = Pipeline::start(&cfg, Cursor::new("2\n4\n"), Vec::new()).unwrap();
        loop {
            if let Step::Reported { .. } = driver.step().unwrap() {
                break;
            }
        }
        let out = String::from_utf8(driver.out).unwrap();
        assert!(out.starts_with('|'));
        assert!(out.ends_with("|\n"));
    }
}
