use crate::dynamics::LangevinIntegrator;
use crate::error::{Error, Result};
use crate::initialization::{CoordinateSet, SystemSummary};
use crate::interface::{Context, Engine, PlatformSpec, State};
use crate::output::Reporter;
use log::{debug, error, info};

/// Lifecycle of a run. Transitions only move forward, one at a time;
/// `Failed` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Unbound,
    Bound,
    PositionsSet,
    Minimized,
    Reporting,
    Stepping,
    Complete,
    Failed,
}

/// Sequences a single run on an engine: bind, seed positions, minimize,
/// attach reporters, step.
pub struct Simulation<'a, E: Engine> {
    engine: &'a E,
    state: RunState,
    context: Option<E::Context>,
    integrator: Option<LangevinIntegrator>,
    summary: SystemSummary,
    reporters: Vec<Box<dyn Reporter>>,
    current_step: u64,
}

// first multiple of `interval` after `step`
fn next_report_step(step: u64, interval: u64) -> u64 {
    (step / interval + 1) * interval
}

impl<'a, E: Engine> Simulation<'a, E> {
    pub fn new(engine: &'a E) -> Self {
        Simulation {
            engine,
            state: RunState::Unbound,
            context: None,
            integrator: None,
            summary: SystemSummary::default(),
            reporters: Vec::new(),
            current_step: 0,
        }
    }

    pub fn state(&self) -> RunState {
        self.state
    }

    pub fn summary(&self) -> &SystemSummary {
        &self.summary
    }

    pub fn current_step(&self) -> u64 {
        self.current_step
    }

    /// Simulated time in ps.
    pub fn time(&self) -> f64 {
        self.integrator
            .map_or(0.0, |integrator| integrator.elapsed(self.current_step))
    }

    pub fn context(&self) -> Option<&E::Context> {
        self.context.as_ref()
    }

    fn require(&self, operation: &'static str, expected: RunState) -> Result<()> {
        if self.state != expected {
            return Err(Error::ContractViolation {
                operation,
                state: self.state,
            });
        }
        Ok(())
    }

    fn context_mut(&mut self, operation: &'static str) -> Result<&mut E::Context> {
        let state: RunState = self.state;
        self.context
            .as_mut()
            .ok_or(Error::ContractViolation { operation, state })
    }

    // any error ends the run and releases the context and the reporters
    fn transition(&mut self, result: Result<()>, next: RunState) -> Result<()> {
        match result {
            Ok(()) => {
                debug!("run state {:?} -> {:?}", self.state, next);
                self.state = next;
                Ok(())
            }
            Err(e) => {
                error!("run failed in state {:?}: {}", self.state, e);
                self.state = RunState::Failed;
                self.context = None;
                self.reporters.clear();
                Err(e)
            }
        }
    }

    /// Create the executable context from a built system and an integrator.
    pub fn bind(
        &mut self,
        system: E::System,
        integrator: &LangevinIntegrator,
        platform: &PlatformSpec,
    ) -> Result<()> {
        let result = self
            .require("bind", RunState::Unbound)
            .and_then(|()| self.create_context(system, integrator, platform));
        self.transition(result, RunState::Bound)
    }

    fn create_context(
        &mut self,
        system: E::System,
        integrator: &LangevinIntegrator,
        platform: &PlatformSpec,
    ) -> Result<()> {
        let summary: SystemSummary = SystemSummary::of(&system);
        info!(
            "binding {} particles to the {} platform {:?}",
            summary.particle_count,
            platform.platform,
            platform.properties()
        );
        let context: E::Context = self.engine.create_context(system, integrator, platform)?;
        if context.particle_count() != summary.particle_count {
            return Err(Error::ConfigurationMismatch(format!(
                "context holds {} particles but the system has {}",
                context.particle_count(),
                summary.particle_count
            )));
        }
        self.summary = summary;
        self.integrator = Some(*integrator);
        self.context = Some(context);
        Ok(())
    }

    /// Assign positions to the particles, one to one by index.
    pub fn set_positions(&mut self, positions: &CoordinateSet) -> Result<()> {
        let result = self
            .require("set_positions", RunState::Bound)
            .and_then(|()| {
                let context: &mut E::Context = self.context_mut("set_positions")?;
                if positions.len() != context.particle_count() {
                    return Err(Error::ConfigurationMismatch(format!(
                        "{} coordinates given for {} particles",
                        positions.len(),
                        context.particle_count()
                    )));
                }
                context.set_positions(positions)?;
                Ok(())
            });
        self.transition(result, RunState::PositionsSet)
    }

    /// Local energy minimization; stopping at the iteration cap counts as success.
    pub fn minimize(&mut self, tolerance: f64, max_iterations: usize) -> Result<()> {
        info!("Minimizing energy");
        let result = self
            .require("minimize", RunState::PositionsSet)
            .and_then(|()| {
                self.context_mut("minimize")?
                    .minimize(tolerance, max_iterations)?;
                Ok(())
            });
        self.transition(result, RunState::Minimized)
    }

    /// Register the reporters for the dynamics; an empty list is allowed.
    pub fn attach_reporters(&mut self, reporters: Vec<Box<dyn Reporter>>) -> Result<()> {
        let result = self
            .require("attach_reporters", RunState::Minimized)
            .and_then(|()| {
                if let Some(reporter) = reporters.iter().find(|r| r.interval() == 0) {
                    return Err(Error::ConfigurationMismatch(format!(
                        "reporter '{}' needs a positive interval",
                        reporter.destination()
                    )));
                }
                for reporter in reporters.iter() {
                    info!(
                        "reporting to {} every {} steps",
                        reporter.destination(),
                        reporter.interval()
                    );
                }
                self.reporters = reporters;
                Ok(())
            });
        self.transition(result, RunState::Reporting)
    }

    /// Advance the dynamics by `steps` steps. Blocks until all steps are done.
    pub fn step(&mut self, steps: u64) -> Result<()> {
        info!("Running dynamics");
        if let Err(e) = self.require("step", RunState::Reporting) {
            return self.transition(Err(e), RunState::Failed);
        }
        self.state = RunState::Stepping;
        let result = self.run_steps(steps);
        self.transition(result, RunState::Complete)
    }

    fn run_steps(&mut self, steps: u64) -> Result<()> {
        let end: u64 = self.current_step + steps;
        let context: &mut E::Context = self
            .context
            .as_mut()
            .ok_or(Error::ContractViolation {
                operation: "step",
                state: RunState::Stepping,
            })?;

        while self.current_step < end {
            // advance to the next step some reporter is due at
            let current: u64 = self.current_step;
            let next: u64 = self
                .reporters
                .iter()
                .map(|reporter| next_report_step(current, reporter.interval()))
                .min()
                .map_or(end, |step| step.min(end));
            context.step(next - self.current_step)?;
            self.current_step = next;

            let mut snapshot: Option<State> = None;
            for reporter in self.reporters.iter_mut() {
                if self.current_step % reporter.interval() != 0 {
                    continue;
                }
                if snapshot.is_none() {
                    snapshot = Some(context.state()?);
                }
                if let Some(state) = snapshot.as_ref() {
                    reporter.report(state, &self.summary)?;
                }
            }
        }

        for reporter in self.reporters.iter_mut() {
            reporter.finalize()?;
        }
        Ok(())
    }

    /// Current state of the context, available once bound.
    pub fn current_state(&self) -> Result<State> {
        let context: &E::Context = self.context.as_ref().ok_or(Error::ContractViolation {
            operation: "current_state",
            state: self.state,
        })?;
        Ok(context.state()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::EngineError;
    use crate::initialization::{
        CellDimensions, ParameterSet, SimulatedSystem, SystemOptions, Topology,
    };
    use crate::interface::{Platform, Precision};
    use std::cell::RefCell;
    use std::rc::Rc;

    struct CountSystem(usize);

    impl SimulatedSystem for CountSystem {
        fn particle_count(&self) -> usize {
            self.0
        }
        fn degrees_of_freedom(&self) -> usize {
            3 * self.0 - 3
        }
        fn total_mass(&self) -> f64 {
            self.0 as f64
        }
    }

    struct CountContext {
        n_particles: usize,
        positions: Option<CoordinateSet>,
        step: u64,
        fail_at: Option<u64>,
    }

    impl Context for CountContext {
        fn particle_count(&self) -> usize {
            self.n_particles
        }
        fn set_positions(&mut self, positions: &CoordinateSet) -> std::result::Result<(), EngineError> {
            self.positions = Some(positions.clone());
            Ok(())
        }
        fn minimize(&mut self, _tolerance: f64, _max_iterations: usize) -> std::result::Result<(), EngineError> {
            Ok(())
        }
        fn step(&mut self, steps: u64) -> std::result::Result<(), EngineError> {
            if let Some(limit) = self.fail_at {
                if self.step + steps >= limit {
                    return Err(EngineError::Runtime("particle coordinate is nan".to_string()));
                }
            }
            self.step += steps;
            Ok(())
        }
        fn state(&self) -> std::result::Result<State, EngineError> {
            Ok(State {
                step: self.step,
                time: self.step as f64 * 0.002,
                positions: self.positions.clone().unwrap_or_else(|| CoordinateSet::from(vec![])),
                potential_energy: -1.0,
                kinetic_energy: 1.0,
                cell: CellDimensions([1.0, 1.0, 1.0]),
            })
        }
    }

    #[derive(Default)]
    struct CountEngine {
        // particle count of created contexts, if it should differ from the system
        context_particles: Option<usize>,
        fail_at: Option<u64>,
    }

    impl Engine for CountEngine {
        type System = CountSystem;
        type Context = CountContext;

        fn build_system(
            &self,
            topology: &Topology,
            _parameters: &ParameterSet,
            _options: &SystemOptions,
        ) -> std::result::Result<CountSystem, EngineError> {
            Ok(CountSystem(topology.n_atoms()))
        }

        fn create_context(
            &self,
            system: CountSystem,
            _integrator: &LangevinIntegrator,
            _platform: &PlatformSpec,
        ) -> std::result::Result<CountContext, EngineError> {
            Ok(CountContext {
                n_particles: self.context_particles.unwrap_or(system.0),
                positions: None,
                step: 0,
                fail_at: self.fail_at,
            })
        }
    }

    struct StepRecorder {
        interval: u64,
        steps: Rc<RefCell<Vec<u64>>>,
    }

    impl Reporter for StepRecorder {
        fn interval(&self) -> u64 {
            self.interval
        }
        fn destination(&self) -> String {
            format!("recorder/{}", self.interval)
        }
        fn report(&mut self, state: &State, _system: &SystemSummary) -> Result<()> {
            self.steps.borrow_mut().push(state.step);
            Ok(())
        }
    }

    fn recorder(interval: u64) -> (Box<dyn Reporter>, Rc<RefCell<Vec<u64>>>) {
        let steps: Rc<RefCell<Vec<u64>>> = Rc::new(RefCell::new(Vec::new()));
        let reporter = StepRecorder {
            interval,
            steps: Rc::clone(&steps),
        };
        (Box::new(reporter), steps)
    }

    fn platform() -> PlatformSpec {
        PlatformSpec {
            platform: Platform::Reference,
            precision: Precision::Double,
            device_index: None,
        }
    }

    fn integrator() -> LangevinIntegrator {
        LangevinIntegrator::new(300.0, 1.0, 0.002)
    }

    fn three_points() -> CoordinateSet {
        CoordinateSet::from(vec![[0.0, 0.0, 0.0], [0.5, 0.1, 0.2], [-0.1, 0.8, 0.2]])
    }

    fn ready_to_report(engine: &CountEngine) -> Simulation<'_, CountEngine> {
        let mut simulation = Simulation::new(engine);
        simulation.bind(CountSystem(3), &integrator(), &platform()).unwrap();
        simulation.set_positions(&three_points()).unwrap();
        simulation.minimize(10.0, 500).unwrap();
        simulation
    }

    #[test]
    fn full_lifecycle() {
        let engine: CountEngine = CountEngine::default();
        let mut simulation = ready_to_report(&engine);
        assert_eq!(simulation.state(), RunState::Minimized);
        simulation.attach_reporters(Vec::new()).unwrap();
        assert_eq!(simulation.state(), RunState::Reporting);
        simulation.step(1000).unwrap();
        assert_eq!(simulation.state(), RunState::Complete);
        assert_eq!(simulation.current_step(), 1000);
        assert!((simulation.time() - 2.0).abs() < 1e-9);
        assert_eq!(simulation.current_state().unwrap().step, 1000);
        assert_eq!(simulation.summary().particle_count, 3);
    }

    #[test]
    fn reporters_receive_every_qualifying_step() {
        let engine: CountEngine = CountEngine::default();
        let mut simulation = ready_to_report(&engine);
        let (every_100, steps_100) = recorder(100);
        let (every_7, steps_7) = recorder(7);
        let (every_5000, steps_5000) = recorder(5000);
        simulation
            .attach_reporters(vec![every_100, every_7, every_5000])
            .unwrap();
        simulation.step(1050).unwrap();

        let steps_100 = steps_100.borrow();
        assert_eq!(steps_100.len(), 10);
        assert_eq!(steps_100.first(), Some(&100));
        assert_eq!(steps_100.last(), Some(&1000));
        let steps_7 = steps_7.borrow();
        assert_eq!(steps_7.len(), 1050 / 7);
        assert!(steps_7.windows(2).all(|pair| pair[0] <= pair[1]));
        assert!(steps_7.iter().all(|step| step % 7 == 0));
        assert!(steps_5000.borrow().is_empty());
    }

    #[test]
    fn stepping_before_seeding_is_rejected() {
        let engine: CountEngine = CountEngine::default();
        let mut simulation = Simulation::new(&engine);
        simulation.bind(CountSystem(3), &integrator(), &platform()).unwrap();
        match simulation.step(10) {
            Err(Error::ContractViolation { operation, state }) => {
                assert_eq!(operation, "step");
                assert_eq!(state, RunState::Bound);
            }
            other => panic!("expected a contract violation, got {:?}", other),
        }
        assert_eq!(simulation.state(), RunState::Failed);
        assert!(simulation.context().is_none());
    }

    #[test]
    fn attaching_reporters_cannot_be_skipped() {
        let engine: CountEngine = CountEngine::default();
        let mut simulation = ready_to_report(&engine);
        assert!(matches!(
            simulation.step(10),
            Err(Error::ContractViolation { .. })
        ));
    }

    #[test]
    fn wrong_coordinate_count_is_a_mismatch() {
        let engine: CountEngine = CountEngine::default();
        let mut simulation = Simulation::new(&engine);
        simulation.bind(CountSystem(4), &integrator(), &platform()).unwrap();
        match simulation.set_positions(&three_points()) {
            Err(Error::ConfigurationMismatch(message)) => assert!(message.contains("4 particles")),
            other => panic!("expected a configuration mismatch, got {:?}", other),
        }
        assert_eq!(simulation.state(), RunState::Failed);
        // a failed run cannot be resumed
        assert!(simulation.minimize(10.0, 10).is_err());
    }

    #[test]
    fn context_with_other_particle_count_fails_bind() {
        let engine: CountEngine = CountEngine {
            context_particles: Some(2),
            fail_at: None,
        };
        let mut simulation = Simulation::new(&engine);
        assert!(matches!(
            simulation.bind(CountSystem(3), &integrator(), &platform()),
            Err(Error::ConfigurationMismatch(_))
        ));
        assert_eq!(simulation.state(), RunState::Failed);
    }

    #[test]
    fn binding_twice_is_rejected() {
        let engine: CountEngine = CountEngine::default();
        let mut simulation = Simulation::new(&engine);
        simulation.bind(CountSystem(3), &integrator(), &platform()).unwrap();
        assert!(matches!(
            simulation.bind(CountSystem(3), &integrator(), &platform()),
            Err(Error::ContractViolation { .. })
        ));
    }

    #[test]
    fn zero_interval_reporter_is_rejected() {
        let engine: CountEngine = CountEngine::default();
        let mut simulation = ready_to_report(&engine);
        let (broken, _) = recorder(0);
        assert!(matches!(
            simulation.attach_reporters(vec![broken]),
            Err(Error::ConfigurationMismatch(_))
        ));
    }

    #[test]
    fn engine_failure_while_stepping_is_propagated() {
        let engine: CountEngine = CountEngine {
            context_particles: None,
            fail_at: Some(250),
        };
        let mut simulation = ready_to_report(&engine);
        let (every_100, steps) = recorder(100);
        simulation.attach_reporters(vec![every_100]).unwrap();
        match simulation.step(1000) {
            Err(Error::EngineRuntime(message)) => assert!(message.contains("nan")),
            other => panic!("expected an engine failure, got {:?}", other),
        }
        assert_eq!(*steps.borrow(), vec![100, 200]);
        assert_eq!(simulation.state(), RunState::Failed);
    }

    #[test]
    fn report_step_arithmetic() {
        assert_eq!(next_report_step(0, 100), 100);
        assert_eq!(next_report_step(99, 100), 100);
        assert_eq!(next_report_step(100, 100), 200);
        assert_eq!(next_report_step(5, 1), 6);
    }
}
