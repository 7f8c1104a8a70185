#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative world state management for Snake Duel.
//!
//! The world owns every piece of session state: both snakes, the obstacle
//! set, the food cell, scores, the dense occupancy snapshot, and the phase
//! machine. Adapters and systems mutate it exclusively through [`apply`] and
//! observe it exclusively through [`query`], so a tick is always resolved
//! against fully committed state and no partial-step positions ever leak out.

use std::{collections::VecDeque, time::Duration};

use snake_duel_core::{
    BoardDimensions, CellCoord, Command, Direction, Event, GameMode, GameOverCause, Phase, SnakeId,
    WELCOME_BANNER,
};

const PLACEMENT_SEED_MIX: u64 = 0x42f0_e1eb_d4a5_3c21;

const DEFAULT_COLUMNS: u32 = 20;
const DEFAULT_ROWS: u32 = 20;
const DEFAULT_OBSTACLE_COUNT: u32 = 10;

/// Smallest board that keeps both fixed spawn rows inside the bounds.
const MIN_COLUMNS: u32 = 12;
const MIN_ROWS: u32 = 6;

const INITIAL_SNAKE_LENGTH: u32 = 3;
const PLAYER_SPAWN_HEAD_COLUMN: u32 = 5;

const DEFAULT_AGENT_ONLY_INTERVAL: Duration = Duration::from_millis(50);
const DEFAULT_PLAYER_VS_AGENT_INTERVAL: Duration = Duration::from_millis(200);

/// Represents the authoritative Snake Duel world state.
#[derive(Debug)]
pub struct World {
    banner: &'static str,
    phase: Phase,
    mode: GameMode,
    board: BoardDimensions,
    next_board: BoardDimensions,
    obstacle_count: u32,
    intervals: StepIntervals,
    snakes: Vec<Snake>,
    obstacles: Vec<CellCoord>,
    food: Option<CellCoord>,
    occupancy: OccupancyGrid,
    accumulator: Duration,
    step_due: bool,
    rng_state: u64,
    tick_index: u64,
}

impl World {
    /// Creates a new world idling in the menu with default configuration.
    #[must_use]
    pub fn new() -> Self {
        let board = BoardDimensions::new(DEFAULT_COLUMNS, DEFAULT_ROWS);
        Self {
            banner: WELCOME_BANNER,
            phase: Phase::Idle,
            mode: GameMode::AgentOnly,
            board,
            next_board: board,
            obstacle_count: DEFAULT_OBSTACLE_COUNT,
            intervals: StepIntervals::default(),
            snakes: Vec::new(),
            obstacles: Vec::new(),
            food: None,
            occupancy: OccupancyGrid::new(board),
            accumulator: Duration::ZERO,
            step_due: false,
            rng_state: PLACEMENT_SEED_MIX,
            tick_index: 0,
        }
    }

    fn start_game(&mut self, mode: GameMode, seed: u64, out_events: &mut Vec<Event>) {
        self.board = self.next_board;
        self.phase = Phase::Running;
        self.mode = mode;
        self.rng_state = seed ^ PLACEMENT_SEED_MIX;
        self.accumulator = Duration::ZERO;
        self.step_due = false;
        self.tick_index = 0;

        self.snakes.clear();
        if mode == GameMode::PlayerVsAgent {
            self.snakes.push(Snake::spawned(
                SnakeId::Player,
                CellCoord::new(PLAYER_SPAWN_HEAD_COLUMN, 0),
            ));
        }
        self.snakes.push(Snake::spawned(
            SnakeId::Agent,
            CellCoord::new(self.board.columns() / 2, self.board.rows() / 2),
        ));

        self.obstacles = self.generate_obstacles();
        self.rebuild_occupancy();
        self.food = None;
        out_events.push(Event::GameStarted { mode });
        self.place_food(out_events);
    }

    fn generate_obstacles(&mut self) -> Vec<CellCoord> {
        let snake_cells: u64 = self.snakes.len() as u64 * u64::from(INITIAL_SNAKE_LENGTH);
        // Leave room for the snakes plus at least one free cell for food.
        let capacity = self
            .board
            .cell_count()
            .saturating_sub(snake_cells)
            .saturating_sub(1);
        let target = u64::from(self.obstacle_count).min(capacity);

        let mut obstacles: Vec<CellCoord> = Vec::with_capacity(self.obstacle_count as usize);
        while (obstacles.len() as u64) < target {
            let cell = self.random_cell();
            let overlaps_snake = self
                .snakes
                .iter()
                .any(|snake| snake.body.contains(&cell));
            if overlaps_snake || obstacles.contains(&cell) {
                continue;
            }
            obstacles.push(cell);
        }
        obstacles
    }

    fn place_food(&mut self, out_events: &mut Vec<Event>) {
        // Rejection sampling; board capacity exceeding combined snake and
        // obstacle length is an accepted design boundary.
        loop {
            let cell = self.random_cell();
            if self.occupancy.is_blocked(cell) {
                continue;
            }
            self.food = Some(cell);
            out_events.push(Event::FoodPlaced { cell });
            return;
        }
    }

    fn random_cell(&mut self) -> CellCoord {
        let column = self.random_below(u64::from(self.board.columns().max(1)));
        let row = self.random_below(u64::from(self.board.rows().max(1)));
        CellCoord::new(column as u32, row as u32)
    }

    // The LCG's low bits cycle with a short period, so small ranges must be
    // drawn from the high half of the state.
    fn random_below(&mut self, bound: u64) -> u64 {
        (self.advance_rng() >> 32) % bound
    }

    fn advance_rng(&mut self) -> u64 {
        self.rng_state = next_random(self.rng_state);
        self.rng_state
    }

    fn rebuild_occupancy(&mut self) {
        self.occupancy.rebuild(self.board, &self.snakes, &self.obstacles);
    }

    fn commit_turns(&mut self, out_events: &mut Vec<Event>) {
        for snake in &mut self.snakes {
            let Some(requested) = snake.pending.take() else {
                continue;
            };
            // Turning is only accepted on the axis currently at rest, which
            // also rules out instantaneous reversals.
            if requested.axis() == snake.heading.axis() {
                continue;
            }
            snake.heading = requested;
            out_events.push(Event::SnakeTurned {
                snake: snake.id,
                direction: requested,
            });
        }
    }

    fn resolve_step(&mut self, out_events: &mut Vec<Event>) {
        let interval = self.intervals.for_mode(self.mode);
        self.step_due = false;
        self.accumulator = self.accumulator.saturating_sub(interval);

        self.commit_turns(out_events);

        // Every snake plans against the same pre-step snapshot.
        let mut planned: Vec<PlannedMove> = Vec::with_capacity(self.snakes.len());
        for snake in &self.snakes {
            let from = snake.head();
            planned.push(PlannedMove {
                snake: snake.id,
                from,
                to: self.board.neighbor(from, snake.heading),
            });
        }

        for movement in &planned {
            let Some(to) = movement.to else {
                self.end_game(
                    GameOverCause::LeftBounds {
                        snake: movement.snake,
                    },
                    out_events,
                );
                return;
            };
            if self.occupancy.is_blocked(to) {
                let cause = self.classify_collision(movement.snake, to);
                self.end_game(cause, out_events);
                return;
            }
        }

        if let [first, second] = planned.as_slice() {
            if first.to == second.to {
                self.end_game(GameOverCause::HeadOnCollision, out_events);
                return;
            }
        }

        let mut food = self.food;
        for movement in &planned {
            let to = movement.to.unwrap_or(movement.from);
            let Some(snake) = self.snakes.iter_mut().find(|snake| snake.id == movement.snake)
            else {
                continue;
            };
            snake.body.push_front(to);
            out_events.push(Event::SnakeAdvanced {
                snake: snake.id,
                from: movement.from,
                to,
            });

            if food == Some(to) {
                // Growth step: the tail stays put this step.
                food = None;
                snake.score = snake.score.saturating_add(1);
                out_events.push(Event::FoodEaten {
                    snake: snake.id,
                    cell: to,
                    score: snake.score,
                });
            } else {
                let _ = snake.body.pop_back();
            }
        }

        self.rebuild_occupancy();
        self.food = food;
        if self.food.is_none() {
            self.place_food(out_events);
        }

        if self.accumulator >= interval {
            self.step_due = true;
            out_events.push(Event::StepReady {
                tick: self.tick_index,
            });
        }
    }

    fn classify_collision(&self, snake: SnakeId, cell: CellCoord) -> GameOverCause {
        let own_body = self
            .snakes
            .iter()
            .find(|candidate| candidate.id == snake)
            .map_or(false, |candidate| candidate.body.contains(&cell));
        if own_body {
            return GameOverCause::HitSelf { snake };
        }
        if self.obstacles.contains(&cell) {
            return GameOverCause::HitObstacle { snake };
        }
        GameOverCause::HitOpponent { snake }
    }

    fn end_game(&mut self, cause: GameOverCause, out_events: &mut Vec<Event>) {
        self.phase = Phase::Over;
        self.step_due = false;
        out_events.push(Event::GameEnded {
            cause,
            player_score: self.score_of(SnakeId::Player),
            agent_score: self.score_of(SnakeId::Agent),
        });
    }

    fn score_of(&self, id: SnakeId) -> u32 {
        self.snakes
            .iter()
            .find(|snake| snake.id == id)
            .map_or(0, |snake| snake.score)
    }
}

impl Default for World {
    fn default() -> Self {
        Self::new()
    }
}

/// Applies the provided command to the world, mutating state deterministically.
pub fn apply(world: &mut World, command: Command, out_events: &mut Vec<Event>) {
    match command {
        Command::ConfigureBoard {
            columns,
            rows,
            obstacle_count,
        } => {
            // Staged until the next game starts, so a running session keeps
            // its board paired with a consistent occupancy snapshot.
            world.next_board =
                BoardDimensions::new(columns.max(MIN_COLUMNS), rows.max(MIN_ROWS));
            world.obstacle_count = obstacle_count;
        }
        Command::ConfigureStepInterval {
            mode,
            step_interval,
        } => {
            if !step_interval.is_zero() {
                world.intervals.set_for_mode(mode, step_interval);
            }
        }
        Command::StartGame { mode, seed } => {
            if world.phase != Phase::Running {
                world.start_game(mode, seed, out_events);
            }
        }
        Command::Tick { dt } => {
            if world.phase != Phase::Running {
                return;
            }
            world.tick_index = world.tick_index.saturating_add(1);
            world.accumulator = world.accumulator.saturating_add(dt);
            out_events.push(Event::TimeAdvanced { dt });

            let interval = world.intervals.for_mode(world.mode);
            if !world.step_due && world.accumulator >= interval {
                world.step_due = true;
                out_events.push(Event::StepReady {
                    tick: world.tick_index,
                });
            }
        }
        Command::SteerSnake { snake, direction } => {
            if world.phase != Phase::Running {
                return;
            }
            if let Some(snake) = world.snakes.iter_mut().find(|entry| entry.id == snake) {
                // Latest-wins pending slot, sampled once per step.
                snake.pending = Some(direction);
            }
        }
        Command::StepSnakes => {
            if world.phase == Phase::Running && world.step_due {
                world.resolve_step(out_events);
            }
        }
        Command::ReturnToMenu => {
            if world.phase == Phase::Idle {
                return;
            }
            world.phase = Phase::Idle;
            world.snakes.clear();
            world.obstacles.clear();
            world.food = None;
            world.accumulator = Duration::ZERO;
            world.step_due = false;
            world.rebuild_occupancy();
            out_events.push(Event::ReturnedToMenu);
        }
    }
}

/// Query functions that provide read-only access to the world state.
pub mod query {
    use std::time::Duration;

    use super::World;
    use snake_duel_core::{
        BoardDimensions, CellCoord, GameMode, OccupancyView, Phase, SnakeId, SnakeSnapshot,
        SnakeView,
    };

    /// Retrieves the welcome banner that adapters may display to players.
    #[must_use]
    pub fn welcome_banner(world: &World) -> &'static str {
        world.banner
    }

    /// Current lifecycle phase of the session.
    #[must_use]
    pub fn phase(world: &World) -> Phase {
        world.phase
    }

    /// Mode of the current (or most recent) session.
    #[must_use]
    pub fn mode(world: &World) -> GameMode {
        world.mode
    }

    /// Board geometry used by the current session.
    #[must_use]
    pub fn board(world: &World) -> BoardDimensions {
        world.board
    }

    /// Step cadence applied while the given mode is active.
    #[must_use]
    pub fn step_interval(world: &World, mode: GameMode) -> Duration {
        world.intervals.for_mode(mode)
    }

    /// Captures a read-only view of the snakes active in the session.
    #[must_use]
    pub fn snake_view(world: &World) -> SnakeView {
        let snapshots: Vec<SnakeSnapshot> = world
            .snakes
            .iter()
            .map(|snake| SnakeSnapshot {
                id: snake.id,
                body: snake.body.iter().copied().collect(),
                heading: snake.heading,
                score: snake.score,
            })
            .collect();
        SnakeView::from_snapshots(snapshots)
    }

    /// Obstacle cells fixed for the duration of the session.
    #[must_use]
    pub fn obstacles(world: &World) -> &[CellCoord] {
        &world.obstacles
    }

    /// Cell currently holding the food, if a session is active.
    #[must_use]
    pub fn food(world: &World) -> Option<CellCoord> {
        world.food
    }

    /// Exposes the dense occupancy snapshot committed at the last step.
    #[must_use]
    pub fn occupancy_view(world: &World) -> OccupancyView<'_> {
        OccupancyView::new(world.occupancy.cells(), world.board)
    }

    /// Score accumulated by the given snake this session.
    #[must_use]
    pub fn score(world: &World, snake: SnakeId) -> u32 {
        world.score_of(snake)
    }
}

#[derive(Clone, Copy, Debug)]
struct StepIntervals {
    agent_only: Duration,
    player_vs_agent: Duration,
}

impl StepIntervals {
    fn for_mode(&self, mode: GameMode) -> Duration {
        match mode {
            GameMode::AgentOnly => self.agent_only,
            GameMode::PlayerVsAgent => self.player_vs_agent,
        }
    }

    fn set_for_mode(&mut self, mode: GameMode, interval: Duration) {
        match mode {
            GameMode::AgentOnly => self.agent_only = interval,
            GameMode::PlayerVsAgent => self.player_vs_agent = interval,
        }
    }
}

impl Default for StepIntervals {
    fn default() -> Self {
        Self {
            agent_only: DEFAULT_AGENT_ONLY_INTERVAL,
            player_vs_agent: DEFAULT_PLAYER_VS_AGENT_INTERVAL,
        }
    }
}

#[derive(Clone, Debug)]
struct Snake {
    id: SnakeId,
    body: VecDeque<CellCoord>,
    heading: Direction,
    pending: Option<Direction>,
    score: u32,
}

impl Snake {
    /// Spawns a snake heading east with its body trailing west of the head.
    fn spawned(id: SnakeId, head: CellCoord) -> Self {
        let mut body = VecDeque::with_capacity(INITIAL_SNAKE_LENGTH as usize);
        for offset in 0..INITIAL_SNAKE_LENGTH {
            body.push_back(CellCoord::new(
                head.column().saturating_sub(offset),
                head.row(),
            ));
        }
        Self {
            id,
            body,
            heading: Direction::East,
            pending: None,
            score: 0,
        }
    }

    fn head(&self) -> CellCoord {
        self.body.front().copied().unwrap_or(CellCoord::new(0, 0))
    }
}

#[derive(Clone, Copy, Debug)]
struct PlannedMove {
    snake: SnakeId,
    from: CellCoord,
    to: Option<CellCoord>,
}

#[derive(Clone, Debug)]
struct OccupancyGrid {
    board: BoardDimensions,
    cells: Vec<bool>,
}

impl OccupancyGrid {
    fn new(board: BoardDimensions) -> Self {
        let capacity = usize::try_from(board.cell_count()).unwrap_or(0);
        Self {
            board,
            cells: vec![false; capacity],
        }
    }

    fn rebuild(&mut self, board: BoardDimensions, snakes: &[Snake], obstacles: &[CellCoord]) {
        let capacity = usize::try_from(board.cell_count()).unwrap_or(0);
        self.board = board;
        if self.cells.len() != capacity {
            self.cells = vec![false; capacity];
        } else {
            self.cells.fill(false);
        }

        for snake in snakes {
            for cell in &snake.body {
                self.mark(*cell);
            }
        }
        for cell in obstacles {
            self.mark(*cell);
        }
    }

    fn mark(&mut self, cell: CellCoord) {
        if let Some(index) = self.index(cell) {
            if let Some(slot) = self.cells.get_mut(index) {
                *slot = true;
            }
        }
    }

    fn is_blocked(&self, cell: CellCoord) -> bool {
        match self.index(cell) {
            Some(index) => self.cells.get(index).copied().unwrap_or(true),
            None => true,
        }
    }

    fn index(&self, cell: CellCoord) -> Option<usize> {
        if !self.board.contains(cell) {
            return None;
        }
        let row = usize::try_from(cell.row()).ok()?;
        let column = usize::try_from(cell.column()).ok()?;
        let width = usize::try_from(self.board.columns()).ok()?;
        Some(row * width + column)
    }

    fn cells(&self) -> &[bool] {
        &self.cells
    }
}

fn next_random(state: u64) -> u64 {
    state.wrapping_mul(636_413_622_384_679_3005).wrapping_add(1)
}
