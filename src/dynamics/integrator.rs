/// Settings of the stochastic (Langevin) integrator handed to the engine.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LangevinIntegrator {
    // temperature of the heat bath in K
    pub temperature: f64,
    // friction coefficient in 1/ps
    pub friction: f64,
    // time step in ps
    pub step_size: f64,
    pub constraint_tolerance: f64,
}

impl LangevinIntegrator {
    pub fn new(temperature: f64, friction: f64, step_size: f64) -> Self {
        LangevinIntegrator {
            temperature,
            friction,
            step_size,
            constraint_tolerance: 1.0e-5,
        }
    }

    pub fn with_constraint_tolerance(mut self, tolerance: f64) -> Self {
        self.constraint_tolerance = tolerance;
        self
    }

    /// Simulated time in ps after `steps` integration steps.
    pub fn elapsed(&self, steps: u64) -> f64 {
        steps as f64 * self.step_size
    }
}
