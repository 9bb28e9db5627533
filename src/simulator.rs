use std::time::Duration;

use rand::seq::SliceRandom;
use rand::Rng;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};
use tracing::{debug, info};

use crate::models::{ApplicationStatus, JobApplication, Platform};
use crate::session::SessionHandle;

pub const TICK_INTERVAL: Duration = Duration::from_secs(5);

const COMPANIES: [&str; 8] = ["Google", "Meta", "Amazon", "Stripe", "Vercel", "Uber", "Airbnb", "Netflix"];
const ROLES: [&str; 5] = [
    "Software Engineer",
    "Data Scientist",
    "Frontend Developer",
    "Backend Dev",
    "Fullstack",
];
const ID_ALPHABET: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";
const ID_LEN: usize = 9;

pub fn synthesize_application<R: Rng + ?Sized>(rng: &mut R, target_role: Option<&str>) -> JobApplication {
    let role = match target_role {
        Some(role) => role.to_string(),
        None => ROLES.choose(rng).copied().unwrap_or(ROLES[0]).to_string(),
    };

    JobApplication {
        id: generate_id(rng),
        company_name: COMPANIES.choose(rng).copied().unwrap_or(COMPANIES[0]).to_string(),
        role,
        platform: *Platform::ALL.choose(rng).unwrap_or(&Platform::LinkedIn),
        status: ApplicationStatus::Applied,
        applied_date: "Just now".to_string(),
        match_score: rng.gen_range(70..=99),
    }
}

fn generate_id<R: Rng + ?Sized>(rng: &mut R) -> String {
    (0..ID_LEN)
        .map(|_| ID_ALPHABET[rng.gen_range(0..ID_ALPHABET.len())] as char)
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SimulatorState {
    Idle,
    Running,
}

pub struct AutoApplyHandle {
    task: JoinHandle<()>,
}

impl AutoApplyHandle {
    // First record arrives one full period after start.
    pub fn start(runtime: &Handle, session: SessionHandle, period: Duration) -> Self {
        let task = runtime.spawn(async move {
            let mut ticker = time::interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                // Read the role under the same lock as the insert so a profile
                // change is picked up on the very next tick.
                session.update(|s| {
                    let app = synthesize_application(&mut rand::thread_rng(), s.target_role());
                    s.add_application(app);
                });
            }
        });
        Self { task }
    }

    pub fn stop(self) {
        // Drop does the work.
    }
}

impl Drop for AutoApplyHandle {
    fn drop(&mut self) {
        self.task.abort();
    }
}

pub struct AutoApplySimulator {
    runtime: Handle,
    session: SessionHandle,
    period: Duration,
    running: Option<AutoApplyHandle>,
}

impl AutoApplySimulator {
    pub fn new(runtime: Handle, session: SessionHandle, period: Duration) -> Self {
        Self {
            runtime,
            session,
            period,
            running: None,
        }
    }

    pub fn state(&self) -> SimulatorState {
        if self.running.is_some() {
            SimulatorState::Running
        } else {
            SimulatorState::Idle
        }
    }

    pub fn sync(&mut self) -> SimulatorState {
        let wanted = self.session.read(|s| s.is_auto_applying());
        match (wanted, self.running.take()) {
            (true, Some(handle)) => self.running = Some(handle),
            (true, None) => {
                info!(period_secs = self.period.as_secs_f64(), "auto-apply started");
                self.running = Some(AutoApplyHandle::start(&self.runtime, self.session.clone(), self.period));
            }
            (false, Some(handle)) => {
                info!("auto-apply stopped");
                handle.stop();
            }
            (false, None) => {}
        }
        self.state()
    }

    pub fn set_enabled(&mut self, active: bool) -> SimulatorState {
        self.session.update(|s| s.set_auto_applying(active));
        self.sync()
    }

    pub fn toggle(&mut self) -> SimulatorState {
        let active = self.session.read(|s| s.is_auto_applying());
        self.set_enabled(!active)
    }

    pub fn shutdown(&mut self) {
        if let Some(handle) = self.running.take() {
            debug!("auto-apply torn down");
            handle.stop();
        }
    }
}

impl Drop for AutoApplySimulator {
    fn drop(&mut self) {
        self.shutdown();
    }
}
