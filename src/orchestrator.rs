//! Scenario orchestrator.
//!
//! This module drives one scenario through all of its phases, from the
//! validated configuration to the completed run and its diagnostics:
//!
//! 1. plan the grid layout
//! 2. build the topology (create, associate, place, power)
//! 3. assign and resolve addresses
//! 4. schedule probes
//! 5. forward trace requests and run until the stop time
//! 6. collect the participant registry and tear the substrate down

use crate::config::ScenarioConfig;
use crate::layout::{plan_grid, GridPlan};
use crate::probe::schedule_probes;
use crate::radio::ReachabilityProfile;
use crate::registry::NodeRegistry;
use crate::scenario::{Scenario, ScenarioError};
use crate::substrate::{PlanBackend, RunReport, Substrate};
use crate::topology::TopologyBuilder;
use color_eyre::eyre::WrapErr;
use log::{info, warn};
use std::fs;
use std::path::Path;

/// File name of the simulation plan inside the output directory
pub const PLAN_FILE: &str = "scenario_plan.yaml";

/// File name of the participant registry inside the output directory
pub const REGISTRY_FILE: &str = "participants.json";

/// Everything a completed scenario produced
#[derive(Debug)]
pub struct ScenarioOutcome {
    pub scenario: Scenario,
    pub report: RunReport,
    pub registry: NodeRegistry,
}

/// Run one scenario on `substrate`.
///
/// Configuration errors found before any participant exists leave the
/// substrate untouched. Once participant creation has been attempted the
/// substrate is torn down exactly once, whether the run succeeds or not.
/// The builder never retries.
pub fn run_scenario<S: Substrate + ?Sized>(
    config: &ScenarioConfig,
    substrate: &mut S,
) -> Result<ScenarioOutcome, ScenarioError> {
    config.validate()?;
    let reachability = config.reachability()?;

    let layout = plan_grid(
        config.network.node_count,
        config.layout.area_m2,
        config.layout.grid_side_m,
        &config.layout.spacing,
    )?;

    let outcome = drive_scenario(config, &layout, &reachability, substrate);
    if let Err(e) = &outcome {
        warn!("Tearing down after failed scenario: {}", e);
    }
    substrate.teardown();
    outcome
}

fn drive_scenario<S: Substrate + ?Sized>(
    config: &ScenarioConfig,
    layout: &GridPlan,
    reachability: &ReachabilityProfile,
    substrate: &mut S,
) -> Result<ScenarioOutcome, ScenarioError> {
    let access_point_position = config.layout.access_point_position.unwrap_or_else(|| layout.center());

    let mut scenario = TopologyBuilder::new(config.network.node_count)
        .with_access_point(config.network.access_point)
        .pan_id(config.network.pan_id)
        .build(
            substrate,
            layout,
            access_point_position,
            reachability,
            config.general.stop_time,
        )?;

    scenario.assign_addresses(substrate, &config.prefix())?;
    schedule_probes(&mut scenario, &config.probes, substrate)?;

    if !config.tracing.is_empty() {
        info!("Requesting trace artifacts: {:?}", config.tracing);
        substrate
            .request_artifacts(&config.tracing)
            .map_err(ScenarioError::substrate("request artifacts"))?;
    }

    let report = scenario.run(substrate)?;
    let registry = NodeRegistry::collect(&scenario, &*substrate)?;

    Ok(ScenarioOutcome {
        scenario,
        report,
        registry,
    })
}

/// Generate the simulation plan and participant registry for `config`
/// under `output_dir`
pub fn generate_scenario(config: &ScenarioConfig, output_dir: &Path) -> color_eyre::eyre::Result<ScenarioOutcome> {
    fs::create_dir_all(output_dir)
        .wrap_err_with(|| format!("Failed to create output directory {:?}", output_dir))?;

    let plan_path = output_dir.join(PLAN_FILE);
    let mut backend = PlanBackend::with_output(&plan_path);
    if let Some(level) = &config.general.log_level {
        backend = backend.with_engine_log_level(level.clone());
    }

    let outcome = run_scenario(config, &mut backend).wrap_err("Scenario generation failed")?;

    let registry_path = output_dir.join(REGISTRY_FILE);
    outcome
        .registry
        .write_json(&registry_path)
        .wrap_err_with(|| format!("Failed to write participant registry {:?}", registry_path))?;

    let layout = outcome.scenario.layout();
    let topology = outcome.scenario.topology();
    println!("Generated scenario plan at {:?}", plan_path);
    println!("  - Simulation time: {:?}", outcome.report.stop_time);
    println!(
        "  - Participants: {} nodes{}",
        topology.nodes().len(),
        if topology.access_point().is_some() { " + access point" } else { "" }
    );
    println!(
        "  - Grid: spacing {} m, {} per row, {} m side",
        layout.spacing, layout.row_width, layout.grid_side
    );
    println!("  - Probe tasks: {} ({})", outcome.report.probes, config.probes.name());
    println!("  - Participant registry created at {:?}", registry_path);

    if config.general.diagnostics {
        println!();
        for line in outcome.registry.summary_lines() {
            println!("{}", line);
        }
    }

    Ok(outcome)
}
