//! Tower Defense headless runner
//!
//! Plays a seeded game without rendering: places towers along the route with
//! a simple build order, starts each wave and ticks at 60 Hz until the wave
//! is cleared or the player loses. Useful for balance checks.

use std::process::ExitCode;

use clap::Parser;
use glam::Vec2;

use tower_defense::consts::FRAME_MS;
use tower_defense::sim::{Simulation, TowerId, TowerKind};
use tower_defense::{ActionError, GameConfig, Settings, direction_from_angle, maps};

/// Distance between candidate tower spots along the route
const SPOT_SPACING: f32 = 90.0;
/// Distance from the route centre line to a candidate spot
const SPOT_OFFSET: f32 = 60.0;
/// Give up on a wave after this much simulated time
const WAVE_TIMEOUT_MS: f32 = 10.0 * 60.0 * 1000.0;

/// Headless tower-defense simulation
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Map id
    #[arg(short, long, default_value = "classic")]
    map: String,

    /// RNG seed
    #[arg(short, long, default_value_t = 1)]
    seed: u64,

    /// Number of waves to play
    #[arg(short, long, default_value_t = 10)]
    waves: u32,

    /// Game speed multiplier (1-9)
    #[arg(long, default_value_t = 1)]
    speed: u32,

    /// Balance overrides as JSON
    #[arg(long)]
    config: Option<std::path::PathBuf>,

    /// Print the final snapshot as JSON
    #[arg(long)]
    json: bool,

    /// List the built-in maps and exit
    #[arg(long)]
    list_maps: bool,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

fn init_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };
    let env = env_logger::Env::default().default_filter_or(level);
    let _ = env_logger::Builder::from_env(env).try_init();
}

fn load_config(args: &Args) -> Result<GameConfig, String> {
    let Some(path) = &args.config else {
        return Ok(GameConfig::default());
    };
    let json = std::fs::read_to_string(path)
        .map_err(|e| format!("cannot read {}: {e}", path.display()))?;
    GameConfig::from_json(&json).map_err(|e| format!("{}: {e}", path.display()))
}

/// Points beside the route, alternating sides
fn tower_spots(sim: &Simulation) -> Vec<Vec2> {
    let path = sim.path();
    let mut spots = Vec::new();
    let mut d = SPOT_SPACING / 2.0;
    let mut side = 1.0;
    while d < path.total_length() {
        let point = path.point_at_distance(d);
        let normal = direction_from_angle(point.angle).perp();
        spots.push(point.position + normal * SPOT_OFFSET * side);
        side = -side;
        d += SPOT_SPACING;
    }
    spots
}

/// Spend money: fill free spots first, then upgrade the oldest towers
fn build(sim: &mut Simulation, spots: &[Vec2]) {
    const ORDER: [TowerKind; 4] = [
        TowerKind::Cannon,
        TowerKind::Rapid,
        TowerKind::Multishot,
        TowerKind::Basic,
    ];
    let mut next_kind = sim.registry().towers.len();
    for &spot in spots {
        if !sim.can_place_tower(spot) {
            continue;
        }
        let kind = ORDER[next_kind % ORDER.len()];
        match sim.place_tower(kind, spot) {
            Ok(_) => next_kind += 1,
            Err(ActionError::InsufficientFunds { .. }) => break,
            Err(e) => log::debug!("Skipping spot {spot}: {e}"),
        }
    }

    let ids: Vec<TowerId> = sim.registry().towers.iter().map(|t| t.id).collect();
    for id in ids {
        if sim.upgrade_tower(id).is_err() {
            break;
        }
    }
}

fn run(args: &Args) -> Result<(), String> {
    let config = load_config(args)?;
    let mut sim = Simulation::with_map(config, &args.map, args.seed).map_err(|e| e.to_string())?;
    sim.apply_settings(&Settings {
        sound_enabled: false,
        auto_start_waves: false,
        game_speed: args.speed,
    });

    let spots = tower_spots(&sim);
    log::info!(
        "Map '{}' ({} tower spots), seed {}, speed {}x",
        args.map,
        spots.len(),
        args.seed,
        sim.speed()
    );

    for _ in 0..args.waves {
        build(&mut sim, &spots);
        let wave = sim.start_wave().map_err(|e| e.to_string())?;

        let mut elapsed = 0.0;
        while sim.waves().is_active() && !sim.is_game_over() && elapsed < WAVE_TIMEOUT_MS {
            sim.tick(FRAME_MS);
            elapsed += FRAME_MS;
        }
        // Presentation events are not needed here
        sim.drain_events();

        if sim.is_game_over() {
            log::info!("Defeated on wave {wave}");
            break;
        }
        if sim.waves().is_active() {
            return Err(format!("wave {wave} did not finish"));
        }
        let economy = sim.economy();
        log::info!(
            "Wave {wave} cleared: health {}, money {}, towers {}",
            economy.health(),
            economy.money(),
            sim.registry().towers.len()
        );
    }

    let snapshot = sim.snapshot();
    if args.json {
        let json = serde_json::to_string_pretty(&snapshot).map_err(|e| e.to_string())?;
        println!("{json}");
    } else {
        let stats = snapshot.economy;
        println!("wave reached:     {}", snapshot.wave.wave);
        println!("health:           {}", stats.health);
        println!("money:            {}", stats.money);
        println!("towers built:     {}", stats.towers_built);
        println!("enemies defeated: {}", stats.enemies_defeated);
        println!("game over:        {}", stats.game_over);
        for tower in &snapshot.towers {
            let accuracy = tower
                .accuracy()
                .map_or_else(|| "-".to_string(), |a| format!("{:.0}%", a * 100.0));
            println!(
                "  {:?} L{} at ({:.0}, {:.0}): {} shots, {} kills, accuracy {accuracy}",
                tower.kind, tower.level, tower.pos.x, tower.pos.y, tower.shots_fired, tower.kills
            );
        }
    }
    Ok(())
}

fn main() -> ExitCode {
    let args = Args::parse();
    init_logging(args.verbose);

    if args.list_maps {
        for map in maps::all() {
            println!("{:<12} {:<20} {:?}  {}", map.id, map.name, map.difficulty, map.description);
        }
        return ExitCode::SUCCESS;
    }

    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{e}");
            ExitCode::FAILURE
        }
    }
}
