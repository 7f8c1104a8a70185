//! Composition root that wires the world, the agent policy and frame input.

use rand::RngCore;
use rand_chacha::{rand_core::SeedableRng, ChaCha8Rng};
use snake_duel_core::{Command, Event, GameMode, Phase, SnakeId};
use snake_duel_rendering::FrameInput;
use snake_duel_system_agent::AgentPolicy;
use snake_duel_world::{apply, query, World};
use std::time::Duration;

/// Upper bound applied to a single frame delta before it reaches the world.
///
/// A dropped or debug-paused frame would otherwise resolve a long burst of
/// catch-up steps in one frame.
const MAX_FRAME_DT: Duration = Duration::from_millis(250);

/// Board and cadence settings applied before the first session starts.
#[derive(Clone, Copy, Debug)]
pub(crate) struct SessionConfig {
    /// Number of cell columns laid out on the board.
    pub(crate) columns: u32,
    /// Number of cell rows laid out on the board.
    pub(crate) rows: u32,
    /// Number of obstacle cells generated when a game starts.
    pub(crate) obstacles: u32,
    /// Step cadence used while an agent-only game runs.
    pub(crate) agent_interval: Duration,
    /// Step cadence used while a player game runs.
    pub(crate) player_interval: Duration,
}

/// Owns the world and pumps commands through it once per frame.
///
/// Every session consumes the next value of a seeded stream, so a fixed
/// `--seed` replays the same sequence of games across restarts while each
/// individual restart still gets fresh obstacle and food placement.
#[derive(Debug)]
pub(crate) struct Session {
    world: World,
    policy: AgentPolicy,
    seed_stream: ChaCha8Rng,
}

impl Session {
    /// Creates a session, configuring the world from the CLI settings.
    pub(crate) fn new(config: SessionConfig, seed: u64) -> Self {
        let mut world = World::new();
        let mut events = Vec::new();
        apply(
            &mut world,
            Command::ConfigureBoard {
                columns: config.columns,
                rows: config.rows,
                obstacle_count: config.obstacles,
            },
            &mut events,
        );
        apply(
            &mut world,
            Command::ConfigureStepInterval {
                mode: GameMode::AgentOnly,
                step_interval: config.agent_interval,
            },
            &mut events,
        );
        apply(
            &mut world,
            Command::ConfigureStepInterval {
                mode: GameMode::PlayerVsAgent,
                step_interval: config.player_interval,
            },
            &mut events,
        );

        Self {
            world,
            policy: AgentPolicy::default(),
            seed_stream: ChaCha8Rng::seed_from_u64(seed),
        }
    }

    /// Read access to the world for scene population and queries.
    pub(crate) fn world(&self) -> &World {
        &self.world
    }

    /// Starts a new game in the given mode with the next stream seed.
    pub(crate) fn start(&mut self, mode: GameMode) -> Vec<Event> {
        let seed = self.seed_stream.next_u64();
        let mut events = Vec::new();
        apply(&mut self.world, Command::StartGame { mode, seed }, &mut events);
        events
    }

    /// Advances the session by one frame delta, applying the frame's input.
    ///
    /// Returns every event the world emitted during the frame, including
    /// those produced by steps the elapsed time made due.
    pub(crate) fn frame(&mut self, dt: Duration, input: FrameInput) -> Vec<Event> {
        let mut log = Vec::new();

        match query::phase(&self.world) {
            Phase::Idle => {
                if input.start_agent_only {
                    log.extend(self.start(GameMode::AgentOnly));
                } else if input.start_player_vs_agent {
                    log.extend(self.start(GameMode::PlayerVsAgent));
                }
            }
            Phase::Over => {
                if input.return_to_menu {
                    apply(&mut self.world, Command::ReturnToMenu, &mut log);
                } else if input.restart {
                    let mode = query::mode(&self.world);
                    log.extend(self.start(mode));
                }
            }
            Phase::Running => {
                if input.return_to_menu {
                    apply(&mut self.world, Command::ReturnToMenu, &mut log);
                } else if let Some(direction) = input.steer {
                    if query::mode(&self.world) == GameMode::PlayerVsAgent {
                        apply(
                            &mut self.world,
                            Command::SteerSnake {
                                snake: SnakeId::Player,
                                direction,
                            },
                            &mut log,
                        );
                    }
                }
            }
        }

        if query::phase(&self.world) != Phase::Running {
            return log;
        }

        let mut batch = Vec::new();
        apply(
            &mut self.world,
            Command::Tick {
                dt: dt.min(MAX_FRAME_DT),
            },
            &mut batch,
        );
        log.extend(batch.iter().copied());

        while batch
            .iter()
            .any(|event| matches!(event, Event::StepReady { .. }))
        {
            let snake_view = query::snake_view(&self.world);
            let food = query::food(&self.world);
            let mut commands = Vec::new();
            self.policy.handle(
                &batch,
                &snake_view,
                query::occupancy_view(&self.world),
                food,
                &mut commands,
            );

            batch = Vec::new();
            for command in commands {
                apply(&mut self.world, command, &mut batch);
            }
            apply(&mut self.world, Command::StepSnakes, &mut batch);
            log.extend(batch.iter().copied());
        }

        log
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> SessionConfig {
        SessionConfig {
            columns: 20,
            rows: 20,
            obstacles: 0,
            agent_interval: Duration::from_millis(50),
            player_interval: Duration::from_millis(200),
        }
    }

    fn start_input(agent_only: bool) -> FrameInput {
        FrameInput {
            start_agent_only: agent_only,
            start_player_vs_agent: !agent_only,
            ..FrameInput::default()
        }
    }

    #[test]
    fn menu_phase_starts_a_game_from_frame_input() {
        let mut session = Session::new(config(), 11);

        let events = session.frame(Duration::from_millis(16), start_input(true));

        assert!(events
            .iter()
            .any(|event| matches!(event, Event::GameStarted { .. })));
        assert_eq!(query::phase(session.world()), Phase::Running);
        assert_eq!(query::mode(session.world()), GameMode::AgentOnly);
    }

    #[test]
    fn sessions_with_the_same_seed_replay_identically() {
        let run = |seed: u64| {
            let mut session = Session::new(config(), seed);
            let mut log = session.frame(Duration::from_millis(16), start_input(true));
            for _ in 0..40 {
                log.extend(session.frame(Duration::from_millis(50), FrameInput::default()));
            }
            log
        };

        assert_eq!(run(99), run(99));
    }

    #[test]
    fn player_steering_is_ignored_in_agent_only_mode() {
        let mut session = Session::new(config(), 5);
        let _ = session.frame(Duration::from_millis(16), start_input(true));

        let events = session.frame(
            Duration::from_millis(50),
            FrameInput {
                steer: Some(snake_duel_core::Direction::North),
                ..FrameInput::default()
            },
        );

        assert!(!events.iter().any(|event| matches!(
            event,
            Event::SnakeTurned {
                snake: SnakeId::Player,
                ..
            }
        )));
    }

    #[test]
    fn restart_after_game_over_starts_a_new_session() {
        let mut session = Session::new(config(), 21);
        let _ = session.frame(Duration::from_millis(16), start_input(false));

        // The unsteered player marches east into the wall within 15 steps.
        let mut ended = false;
        for _ in 0..32 {
            let events = session.frame(Duration::from_millis(200), FrameInput::default());
            if events
                .iter()
                .any(|event| matches!(event, Event::GameEnded { .. }))
            {
                ended = true;
                break;
            }
        }
        assert!(ended);
        assert_eq!(query::phase(session.world()), Phase::Over);

        let events = session.frame(
            Duration::ZERO,
            FrameInput {
                restart: true,
                ..FrameInput::default()
            },
        );

        assert!(events.iter().any(|event| matches!(
            event,
            Event::GameStarted {
                mode: GameMode::PlayerVsAgent,
            }
        )));
        assert_eq!(query::phase(session.world()), Phase::Running);
    }

    #[test]
    fn return_to_menu_from_a_running_game() {
        let mut session = Session::new(config(), 8);
        let _ = session.frame(Duration::from_millis(16), start_input(false));

        let events = session.frame(
            Duration::ZERO,
            FrameInput {
                return_to_menu: true,
                ..FrameInput::default()
            },
        );

        assert!(events
            .iter()
            .any(|event| matches!(event, Event::ReturnedToMenu)));
        assert_eq!(query::phase(session.world()), Phase::Idle);
    }
}
