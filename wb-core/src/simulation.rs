//! Fixed-step driver for the live body set.
//!
//! Each tick runs, per body: ground contact and integration, then wall
//! detection, then wall response if a probe touched. Bodies never interact
//! with each other, so the order they are visited in does not matter.
//!
//! The wall pose is passed in on every call. Hosts that animate the wall
//! simply pass the new pose on the next tick.

use log::{info, trace, warn};

use crate::collision::{CollisionConfig, CollisionDetector, CollisionResolver, WallContact};
use crate::config::SimulationConfig;
use crate::integrator::MotionIntegrator;
use crate::types::{BodyId, LaunchParams, ProjectileBody, ValidationError, WallPose};

/// What happened to one body during one tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TickOutcome {
    /// The body started the tick below ground and was bounced
    pub grounded: bool,
    pub contact: Option<WallContact>,
}

/// Run one tick on a single body.
///
/// The new state is computed in full and committed once.
pub fn tick(
    body: &mut ProjectileBody,
    wall: &WallPose,
    integrator: &MotionIntegrator,
    detector: &CollisionDetector,
) -> TickOutcome {
    let props = *body.props();
    let grounded = !body.state().is_airborne();

    let mut next = integrator.update(body.state(), &props);
    let contact = detector.detect(&next, &props, wall);
    if contact.is_some() {
        next = CollisionResolver::resolve(&next, &props, wall, integrator);
    }

    body.commit(next);
    trace!(
        "{} at ({:.3}, {:.3}, {:.3}) speed {:.3}",
        body.id(),
        next.position.x,
        next.position.y,
        next.position.z,
        next.speed
    );

    TickOutcome { grounded, contact }
}

/// Summary of one or more clock ticks.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TickReport {
    pub ticks: u32,
    pub contacts: Vec<(BodyId, WallContact)>,
    /// Bodies removed at the end of the tick
    pub expired: Vec<BodyId>,
}

impl TickReport {
    fn merge(&mut self, other: TickReport) {
        self.ticks += other.ticks;
        self.contacts.extend(other.contacts);
        self.expired.extend(other.expired);
    }
}

/// Owns the live bodies and steps them at a fixed rate.
pub struct SimulationClock {
    integrator: MotionIntegrator,
    detector: CollisionDetector,
    bodies: Vec<ProjectileBody>,
    next_id: u64,
    time: f64,
    ticks: u64,
    accumulator: f64,
    max_substeps: u32,
}

impl Default for SimulationClock {
    fn default() -> Self {
        Self::build(&SimulationConfig::default())
    }
}

impl SimulationClock {
    /// Create a clock from validated settings.
    pub fn new(config: &SimulationConfig) -> Result<Self, ValidationError> {
        config.validate().inspect_err(|e| {
            warn!("rejected simulation config: {}", e);
        })?;
        Ok(Self::build(config))
    }

    fn build(config: &SimulationConfig) -> Self {
        Self {
            integrator: MotionIntegrator::new(config.dt, config.gravity),
            detector: CollisionDetector::with_config(CollisionConfig {
                contact_band: config.contact_band,
            }),
            bodies: Vec::new(),
            next_id: 1,
            time: 0.0,
            ticks: 0,
            accumulator: 0.0,
            max_substeps: config.max_substeps,
        }
    }

    /// Current simulation time.
    pub fn time(&self) -> f64 {
        self.time
    }

    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    pub fn integrator(&self) -> &MotionIntegrator {
        &self.integrator
    }

    pub fn detector(&self) -> &CollisionDetector {
        &self.detector
    }

    pub fn bodies(&self) -> &[ProjectileBody] {
        &self.bodies
    }

    pub fn body(&self, id: BodyId) -> Option<&ProjectileBody> {
        self.bodies.iter().find(|b| b.id() == id)
    }

    pub fn len(&self) -> usize {
        self.bodies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bodies.is_empty()
    }

    /// Create a body. With a `lifetime`, it is removed once that much
    /// simulation time has passed.
    pub fn spawn(
        &mut self,
        params: LaunchParams,
        lifetime: Option<f64>,
    ) -> Result<BodyId, ValidationError> {
        let id = BodyId(self.next_id);
        let mut body = ProjectileBody::new(id, params).inspect_err(|e| {
            warn!("rejected body: {}", e);
        })?;
        if let Some(lifetime) = lifetime {
            body = body.with_expiry(self.time + lifetime);
        }

        self.next_id += 1;
        info!(
            "spawned {} speed {:.2} launch {:.1}° heading {:.1}°",
            id,
            body.speed(),
            body.launch_angle(),
            body.heading_angle()
        );
        self.bodies.push(body);
        Ok(id)
    }

    /// Remove a body right away.
    pub fn despawn(&mut self, id: BodyId) -> Option<ProjectileBody> {
        let index = self.bodies.iter().position(|b| b.id() == id)?;
        Some(self.bodies.remove(index))
    }

    /// Drop all bodies and rewind time. Ids keep counting up.
    pub fn reset(&mut self) {
        self.bodies.clear();
        self.time = 0.0;
        self.ticks = 0;
        self.accumulator = 0.0;
    }

    /// Step every live body once, then remove the ones that expired.
    pub fn tick(&mut self, wall: &WallPose) -> TickReport {
        let mut report = TickReport {
            ticks: 1,
            ..TickReport::default()
        };

        for body in &mut self.bodies {
            let outcome = tick(body, wall, &self.integrator, &self.detector);
            if let Some(contact) = outcome.contact {
                report.contacts.push((body.id(), contact));
            }
        }

        self.time += self.integrator.dt;
        self.ticks += 1;

        // Removal waits until every body has been stepped.
        let now = self.time;
        report.expired = self
            .bodies
            .iter()
            .filter(|b| b.is_expired(now))
            .map(|b| b.id())
            .collect();
        if !report.expired.is_empty() {
            self.bodies.retain(|b| !b.is_expired(now));
            info!("expired {} bodies at t={:.2}", report.expired.len(), now);
        }

        report
    }

    /// Feed host frame time and run as many fixed ticks as it covers.
    ///
    /// At most `max_substeps` ticks run per call; frame time beyond that is
    /// discarded rather than carried into later frames.
    pub fn advance(&mut self, frame_dt: f64, wall: &WallPose) -> TickReport {
        let dt = self.integrator.dt;
        let budget = dt * f64::from(self.max_substeps);
        let frame_dt = if frame_dt.is_finite() { frame_dt.max(0.0) } else { 0.0 };
        if frame_dt > budget {
            warn!(
                "frame time {:.3} exceeds {} substeps, clamping",
                frame_dt, self.max_substeps
            );
        }
        self.accumulator += frame_dt.min(budget);

        let mut report = TickReport::default();
        while self.accumulator >= dt && report.ticks < self.max_substeps {
            report.merge(self.tick(wall));
            self.accumulator -= dt;
        }
        report
    }
}

// =============================================================================
// Tests
// =============================================================================
