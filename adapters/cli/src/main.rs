#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Command-line adapter that boots the Snake Duel experience.

mod session;

use anyhow::Result;
use clap::{Parser, ValueEnum};
use rand::Rng;
use session::{Session, SessionConfig};
use snake_duel_core::{Event, GameMode, SnakeId};
use snake_duel_rendering::{
    outcome_headline, BoardPresentation, Color, FrameInput, OutcomePresentation, Presentation,
    RenderingBackend, Scene, Scoreboard, SessionCue, SnakePresentation,
};
use snake_duel_rendering_macroquad::MacroquadBackend;
use snake_duel_world::query;
use std::time::Duration;

const CELL_SIZE: f32 = 24.0;
const CLEAR_COLOR: Color = Color::from_rgb_u8(18, 18, 24);
const GRID_COLOR: Color = Color::from_rgb_u8(48, 48, 60);
const PLAYER_COLOR: Color = Color::from_rgb_u8(76, 175, 80);
const AGENT_COLOR: Color = Color::from_rgb_u8(33, 150, 243);

/// Surface shown when the program starts.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum StartMode {
    /// Open the mode-selection menu.
    Menu,
    /// Start an agent-only game immediately.
    AgentOnly,
    /// Start a player-versus-agent game immediately.
    PlayerVsAgent,
}

/// Command-line options for the Snake Duel binary.
#[derive(Debug, Parser)]
#[command(name = "snake-duel", about = "Snake versus a pathfinding agent")]
struct Cli {
    /// Surface to open on startup instead of the menu.
    #[arg(long, value_enum)]
    mode: Option<StartMode>,

    /// Number of cell columns laid out on the board.
    #[arg(long, default_value_t = 20)]
    columns: u32,

    /// Number of cell rows laid out on the board.
    #[arg(long, default_value_t = 20)]
    rows: u32,

    /// Number of obstacle cells generated when a game starts.
    #[arg(long, default_value_t = 10)]
    obstacles: u32,

    /// Seed for the session stream; random when omitted.
    #[arg(long)]
    seed: Option<u64>,

    /// Milliseconds between steps while an agent-only game runs.
    #[arg(long, default_value_t = 50)]
    agent_interval_ms: u64,

    /// Milliseconds between steps while a player game runs.
    #[arg(long, default_value_t = 200)]
    player_interval_ms: u64,

    /// Print frame timing metrics once per second.
    #[arg(long)]
    show_fps: bool,

    /// Render as fast as possible instead of waiting for vsync.
    #[arg(long)]
    no_vsync: bool,

    /// Run an agent-only game without a window for this many steps.
    #[arg(long)]
    headless_steps: Option<u64>,
}

impl Cli {
    fn session_config(&self) -> SessionConfig {
        SessionConfig {
            columns: self.columns,
            rows: self.rows,
            obstacles: self.obstacles,
            agent_interval: Duration::from_millis(self.agent_interval_ms),
            player_interval: Duration::from_millis(self.player_interval_ms),
        }
    }
}

/// Entry point for the Snake Duel command-line interface.
fn main() -> Result<()> {
    let cli = Cli::parse();
    let seed = cli.seed.unwrap_or_else(|| rand::thread_rng().gen());
    let mut session = Session::new(cli.session_config(), seed);
    println!("{}", query::welcome_banner(session.world()));

    if let Some(steps) = cli.headless_steps {
        return run_headless(session, steps);
    }

    match cli.mode {
        Some(StartMode::AgentOnly) => {
            let _ = session.start(GameMode::AgentOnly);
        }
        Some(StartMode::PlayerVsAgent) => {
            let _ = session.start(GameMode::PlayerVsAgent);
        }
        Some(StartMode::Menu) | None => {}
    }

    let board = BoardPresentation::new(cli.columns, cli.rows, CELL_SIZE, GRID_COLOR)?;
    let presentation = Presentation::new("Snake Duel", CLEAR_COLOR, Scene::menu(board));
    let backend = MacroquadBackend::new()
        .with_vsync(!cli.no_vsync)
        .with_show_fps(cli.show_fps);

    backend.run(presentation, move |dt, input, scene| {
        let events = session.frame(dt, input);
        populate_scene(&session, &events, scene);
    })
}

/// Drives an agent-only game to completion or the step budget, printing the
/// outcome instead of opening a window.
fn run_headless(mut session: Session, steps: u64) -> Result<()> {
    let mut batch = session.start(GameMode::AgentOnly);
    let interval = query::step_interval(session.world(), GameMode::AgentOnly);
    let mut resolved = 0_u64;

    loop {
        for event in &batch {
            match event {
                Event::SnakeAdvanced {
                    snake: SnakeId::Agent,
                    ..
                } => resolved += 1,
                Event::FoodEaten {
                    snake: SnakeId::Agent,
                    score,
                    ..
                } => println!("step {resolved}: the agent ate food (score {score})"),
                Event::GameEnded {
                    player_score,
                    agent_score,
                    ..
                } => {
                    let scores = Scoreboard {
                        player: *player_score,
                        agent: *agent_score,
                    };
                    println!("{}", outcome_headline(GameMode::AgentOnly, scores));
                    println!("The agent survived {resolved} steps.");
                    return Ok(());
                }
                _ => {}
            }
        }

        if resolved >= steps {
            break;
        }
        batch = session.frame(interval, FrameInput::default());
    }

    println!(
        "The agent survived {resolved} steps with {} food eaten.",
        query::score(session.world(), SnakeId::Agent)
    );
    Ok(())
}

/// Rebuilds the scene from world queries and the frame's events.
fn populate_scene(session: &Session, events: &[Event], scene: &mut Scene) {
    let world = session.world();
    scene.phase = query::phase(world);
    scene.mode = query::mode(world);

    let board = query::board(world);
    if scene.board.columns != board.columns() || scene.board.rows != board.rows() {
        if let Ok(presentation) = BoardPresentation::new(
            board.columns(),
            board.rows(),
            CELL_SIZE,
            scene.board.line_color,
        ) {
            scene.board = presentation;
        }
    }

    scene.snakes = query::snake_view(world)
        .iter()
        .map(|snapshot| {
            let color = match snapshot.id {
                SnakeId::Player => PLAYER_COLOR,
                SnakeId::Agent => AGENT_COLOR,
            };
            SnakePresentation::new(snapshot.id, snapshot.body.clone(), color)
        })
        .collect();
    scene.obstacles = query::obstacles(world).to_vec();
    scene.food = query::food(world);
    scene.scoreboard = Scoreboard {
        player: query::score(world, SnakeId::Player),
        agent: query::score(world, SnakeId::Agent),
    };

    // Cues are one-shot: frames without a transition carry none.
    scene.cue = None;
    for event in events {
        match event {
            Event::GameStarted { .. } => {
                scene.cue = Some(SessionCue::GameStarted);
                scene.outcome = None;
            }
            Event::ReturnedToMenu => {
                scene.cue = Some(SessionCue::MenuEntered);
                scene.outcome = None;
            }
            Event::GameEnded {
                cause,
                player_score,
                agent_score,
            } => {
                let scores = Scoreboard {
                    player: *player_score,
                    agent: *agent_score,
                };
                scene.cue = Some(SessionCue::GameOver);
                scene.outcome = Some(OutcomePresentation {
                    cause: *cause,
                    headline: outcome_headline(scene.mode, scores),
                });
            }
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_defaults_match_the_classic_setup() {
        let cli = Cli::try_parse_from(["snake-duel"]).expect("defaults must parse");

        assert_eq!(cli.columns, 20);
        assert_eq!(cli.rows, 20);
        assert_eq!(cli.obstacles, 10);
        assert_eq!(cli.agent_interval_ms, 50);
        assert_eq!(cli.player_interval_ms, 200);
        assert_eq!(cli.mode, None);
        assert_eq!(cli.seed, None);
    }

    #[test]
    fn headless_flag_parses_a_step_budget() {
        let cli = Cli::try_parse_from(["snake-duel", "--headless-steps", "500", "--seed", "9"])
            .expect("flags must parse");

        assert_eq!(cli.headless_steps, Some(500));
        assert_eq!(cli.seed, Some(9));
    }

    #[test]
    fn populate_scene_mirrors_a_started_session() {
        let config = Cli::try_parse_from(["snake-duel", "--obstacles", "4"])
            .expect("flags must parse")
            .session_config();
        let mut session = Session::new(config, 13);
        let events = session.start(GameMode::PlayerVsAgent);

        let board = BoardPresentation::new(20, 20, CELL_SIZE, GRID_COLOR).expect("valid board");
        let mut scene = Scene::menu(board);
        populate_scene(&session, &events, &mut scene);

        assert_eq!(scene.phase, snake_duel_core::Phase::Running);
        assert_eq!(scene.mode, GameMode::PlayerVsAgent);
        assert_eq!(scene.cue, Some(SessionCue::GameStarted));
        assert_eq!(scene.snakes.len(), 2);
        assert_eq!(scene.obstacles.len(), 4);
        assert!(scene.food.is_some());
        assert!(scene.outcome.is_none());
    }

    #[test]
    fn cues_fire_only_on_the_transition_frame() {
        let config = Cli::try_parse_from(["snake-duel"])
            .expect("defaults must parse")
            .session_config();
        let mut session = Session::new(config, 17);
        let events = session.start(GameMode::AgentOnly);

        let board = BoardPresentation::new(20, 20, CELL_SIZE, GRID_COLOR).expect("valid board");
        let mut scene = Scene::menu(board);
        populate_scene(&session, &events, &mut scene);
        assert_eq!(scene.cue, Some(SessionCue::GameStarted));

        // The next frame has no transition, so the cue must not repeat.
        populate_scene(&session, &[], &mut scene);
        assert_eq!(scene.cue, None);
    }
}
