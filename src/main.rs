//! Binary entrypoint: load config, wire the controller/perception backends,
//! register the start/stop hotkey, and drive the agent loop's tick until
//! the hotkey stops it or it stalls.

use std::thread;
use std::time::Duration;

use career_pilot::agent::{scan, AgentLoop};
use career_pilot::config::{self, defaults};
use career_pilot::controller::mock::MockController;
use career_pilot::controller::{Controller, ControllerKind};
use career_pilot::hotkeys::HotkeyMonitor;
use career_pilot::logging;
use career_pilot::perception::mock::MockPerception;
use career_pilot::perception::remote::RemotePerception;
use career_pilot::perception::Perception;
use career_pilot::scenario::ura::UraPolicy;
use career_pilot::scenario::unity_cup::UnityCupPolicy;
use career_pilot::scenario::ScenarioRegistry;
use career_pilot::waiter::{StopFlag, Waiter};
use career_pilot::{catalog::Catalog, memory::SkillMemory};

#[cfg(all(feature = "desktop-capture", target_os = "macos"))]
use career_pilot::controller::desktop::DesktopController;

fn build_controller(kind: ControllerKind) -> Box<dyn Controller> {
    match kind {
        #[cfg(all(feature = "desktop-capture", target_os = "macos"))]
        ControllerKind::Desktop => Box::new(DesktopController::new(0)),
        #[cfg(not(all(feature = "desktop-capture", target_os = "macos")))]
        ControllerKind::Desktop => {
            tracing::warn!("desktop controller unavailable on this build, falling back to mock");
            Box::new(MockController::new())
        }
        ControllerKind::DeviceMirror | ControllerKind::RemoteDevice => {
            tracing::warn!(?kind, "controller backend not yet implemented, falling back to mock");
            Box::new(MockController::new())
        }
        ControllerKind::Mock => Box::new(MockController::new()),
    }
}

fn build_perception(backend_url: Option<&str>, waiter_interval: Duration) -> Box<dyn Perception> {
    match backend_url {
        Some(url) => Box::new(RemotePerception::new(url, waiter_interval)),
        None => {
            tracing::warn!("no perception_backend_url configured, running against a mock perception backend");
            Box::new(MockPerception::new())
        }
    }
}

fn build_registry(config: &career_pilot::config::Config) -> ScenarioRegistry {
    let mut registry = ScenarioRegistry::new();
    registry.register(Box::new(UraPolicy::new()));
    let burst_allowed = config.general.top_stats_focus.clone();
    registry.register(Box::new(UnityCupPolicy::new(burst_allowed)));
    registry
}

fn main() {
    logging::init();

    let config_path = config::default_config_path();
    let config = match config::load_config(&config_path) {
        Ok(config) => config,
        Err(error) => {
            eprintln!("{}", error.user_message());
            std::process::exit(1);
        }
    };

    let catalog = match Catalog::load_from_dir(&config::config_dir()) {
        Ok(catalog) => catalog,
        Err(error) => {
            eprintln!("{}", error.user_message());
            std::process::exit(1);
        }
    };

    let skill_memory_path = config::config_dir().join("skill_memory.json");
    let skill_memory = SkillMemory::load(skill_memory_path);

    let registry = build_registry(&config);
    let waiter_interval = config.waiter_interval();

    let mut controller = build_controller(config.general.controller_mode);
    let perception = build_perception(config.general.perception_backend_url.as_deref(), waiter_interval);

    let stop_flag = StopFlag::new();
    let _hotkey_monitor = match HotkeyMonitor::spawn(&config.general.hotkey, stop_flag.clone()) {
        Ok(monitor) => Some(monitor),
        Err(error) => {
            tracing::error!(error = %error, "failed to register start/stop hotkey, continuing without it");
            None
        }
    };

    let scenario = config.general.scenario;
    let mut agent = AgentLoop::new(
        config,
        registry,
        catalog,
        skill_memory,
        defaults::DEFAULT_CLASSIFIER_PATIENCE,
        defaults::DEFAULT_STALL_PATIENCE_TICKS,
    );

    tracing::info!(?scenario, "agent loop starting");

    let scale = controller.controller_kind().interval_scale();
    let tick_interval = Duration::from_secs_f32(waiter_interval.as_secs_f32() * scale);
    let mut last_date = career_pilot::model::Date::new(0, 1, 1);

    loop {
        if stop_flag.is_stopped() {
            thread::sleep(Duration::from_millis(200));
            continue;
        }

        let _correlation = logging::new_tick_correlation();
        let mut waiter = Waiter::new(
            controller.as_mut(),
            perception.as_ref(),
            stop_flag.clone(),
            "career-pilot",
        );
        let snapshot = scan::scan_turn_snapshot(&mut waiter, last_date);
        last_date = snapshot.date;

        match agent.tick(&mut waiter, snapshot) {
            career_pilot::agent::TickOutcome::Continue => {}
            career_pilot::agent::TickOutcome::Stopped => {
                tracing::info!("agent loop stopped by hotkey");
            }
            career_pilot::agent::TickOutcome::Stalled => {
                tracing::error!("agent loop stalled, exiting");
                break;
            }
        }

        thread::sleep(tick_interval);
    }
}
