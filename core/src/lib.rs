#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the Snake Duel engine.
//!
//! This crate defines the message surface that connects adapters, the
//! authoritative world, and pure systems. Adapters submit [`Command`] values
//! describing desired mutations, the world executes those commands via its
//! `apply` entry point, and then broadcasts [`Event`] values for systems to
//! react to deterministically. Systems consume event streams, query immutable
//! snapshots, and respond exclusively with new command batches.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Canonical banner emitted when the experience boots.
pub const WELCOME_BANNER: &str = "Welcome to Snake Duel.";

/// Gameplay modes selectable from the menu.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GameMode {
    /// The autonomous snake plays alone against obstacles and itself.
    AgentOnly,
    /// A human-controlled snake competes against the autonomous snake.
    PlayerVsAgent,
}

/// Lifecycle phases of a game session.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Phase {
    /// Menu state before any game has started.
    Idle,
    /// A game is in progress and ticks advance the simulation.
    Running,
    /// The game ended; results are displayed until a restart or menu return.
    Over,
}

/// Identifies one of the two snakes that may inhabit the board.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum SnakeId {
    /// The human-controlled snake, present only in player-vs-agent games.
    Player,
    /// The autonomous snake driven by the movement policy.
    Agent,
}

/// Axes a snake can travel along.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Axis {
    /// East-west travel.
    Horizontal,
    /// North-south travel.
    Vertical,
}

/// Cardinal movement directions available to snakes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    /// Movement toward decreasing row indices.
    North,
    /// Movement toward increasing column indices.
    East,
    /// Movement toward increasing row indices.
    South,
    /// Movement toward decreasing column indices.
    West,
}

impl Direction {
    /// Direction pointing the opposite way.
    #[must_use]
    pub const fn opposite(self) -> Self {
        match self {
            Self::North => Self::South,
            Self::East => Self::West,
            Self::South => Self::North,
            Self::West => Self::East,
        }
    }

    /// Axis the direction travels along.
    #[must_use]
    pub const fn axis(self) -> Axis {
        match self {
            Self::East | Self::West => Axis::Horizontal,
            Self::North | Self::South => Axis::Vertical,
        }
    }

    /// Column and row deltas applied when stepping one cell this way.
    #[must_use]
    pub const fn offset(self) -> (i64, i64) {
        match self {
            Self::North => (0, -1),
            Self::East => (1, 0),
            Self::South => (0, 1),
            Self::West => (-1, 0),
        }
    }
}

/// Fixed evaluation order shared by the pathfinder and the survival fallback.
///
/// East first, then West, North, South. Ties between equally good candidates
/// always resolve to the earliest entry.
pub const SEARCH_ORDER: [Direction; 4] = [
    Direction::East,
    Direction::West,
    Direction::North,
    Direction::South,
];

/// Location of a single grid cell expressed as column and row coordinates.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CellCoord {
    column: u32,
    row: u32,
}

impl CellCoord {
    /// Creates a new grid cell coordinate.
    #[must_use]
    pub const fn new(column: u32, row: u32) -> Self {
        Self { column, row }
    }

    /// Zero-based column index of the cell.
    #[must_use]
    pub const fn column(&self) -> u32 {
        self.column
    }

    /// Zero-based row index of the cell.
    #[must_use]
    pub const fn row(&self) -> u32 {
        self.row
    }

    /// Computes the Manhattan distance between two cell coordinates.
    #[must_use]
    pub fn manhattan_distance(self, other: CellCoord) -> u32 {
        self.column().abs_diff(other.column()) + self.row().abs_diff(other.row())
    }
}

/// Discrete board geometry: bounds and cardinal neighbor enumeration.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct BoardDimensions {
    columns: u32,
    rows: u32,
}

impl BoardDimensions {
    /// Creates a new board description.
    #[must_use]
    pub const fn new(columns: u32, rows: u32) -> Self {
        Self { columns, rows }
    }

    /// Number of columns laid out on the board.
    #[must_use]
    pub const fn columns(&self) -> u32 {
        self.columns
    }

    /// Number of rows laid out on the board.
    #[must_use]
    pub const fn rows(&self) -> u32 {
        self.rows
    }

    /// Total number of cells on the board.
    #[must_use]
    pub const fn cell_count(&self) -> u64 {
        self.columns as u64 * self.rows as u64
    }

    /// Reports whether the cell lies within the board bounds.
    #[must_use]
    pub const fn contains(&self, cell: CellCoord) -> bool {
        cell.column() < self.columns && cell.row() < self.rows
    }

    /// Cell reached by stepping one cell in the given direction.
    ///
    /// Returns `None` when the step would leave the board.
    #[must_use]
    pub fn neighbor(&self, cell: CellCoord, direction: Direction) -> Option<CellCoord> {
        let (column_delta, row_delta) = direction.offset();
        let column = i64::from(cell.column()).checked_add(column_delta)?;
        let row = i64::from(cell.row()).checked_add(row_delta)?;
        if column < 0 || row < 0 {
            return None;
        }

        let candidate = CellCoord::new(u32::try_from(column).ok()?, u32::try_from(row).ok()?);
        self.contains(candidate).then_some(candidate)
    }
}

/// Commands that express all permissible world mutations.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Command {
    /// Configures the board geometry and obstacle density used by new games.
    ConfigureBoard {
        /// Number of cell columns laid out on the board.
        columns: u32,
        /// Number of cell rows laid out on the board.
        rows: u32,
        /// Number of obstacle cells generated when a game starts.
        obstacle_count: u32,
    },
    /// Updates the step cadence applied while the given mode is active.
    ConfigureStepInterval {
        /// Mode whose cadence is being configured.
        mode: GameMode,
        /// Simulated time that must accumulate between successive steps.
        step_interval: Duration,
    },
    /// Starts a new game, replacing any previous session state.
    StartGame {
        /// Mode that stays fixed for the duration of the session.
        mode: GameMode,
        /// Seed feeding obstacle generation and food placement.
        seed: u64,
    },
    /// Advances the simulation clock by the provided delta time.
    Tick {
        /// Duration of simulated time that elapsed since the previous tick.
        dt: Duration,
    },
    /// Requests a heading change for a snake, sampled at the next step.
    SteerSnake {
        /// Snake whose pending direction slot is being written.
        snake: SnakeId,
        /// Requested direction of travel.
        direction: Direction,
    },
    /// Resolves one due simulation step for every active snake.
    StepSnakes,
    /// Abandons the current session and returns to the menu.
    ReturnToMenu,
}

/// Events broadcast by the world after processing commands.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Event {
    /// Announces that a new game session began.
    GameStarted {
        /// Mode active for the session.
        mode: GameMode,
    },
    /// Indicates that the simulation clock advanced.
    TimeAdvanced {
        /// Duration of simulated time that elapsed in the tick.
        dt: Duration,
    },
    /// Signals that a full step interval accumulated and a step is due.
    ///
    /// This is the decision point: the agent policy reads the committed
    /// pre-step snapshot and steers before the step resolves.
    StepReady {
        /// Index of the tick that made the step due.
        tick: u64,
    },
    /// Confirms that a snake committed a heading change.
    SnakeTurned {
        /// Snake whose heading changed.
        snake: SnakeId,
        /// Heading committed for the upcoming step.
        direction: Direction,
    },
    /// Confirms that a snake's head advanced one cell.
    SnakeAdvanced {
        /// Snake that advanced.
        snake: SnakeId,
        /// Cell the head occupied before the step.
        from: CellCoord,
        /// Cell the head occupies after the step.
        to: CellCoord,
    },
    /// Confirms that a snake consumed the food and grew.
    FoodEaten {
        /// Snake that reached the food cell.
        snake: SnakeId,
        /// Cell the food occupied.
        cell: CellCoord,
        /// Score of the eating snake after the increment.
        score: u32,
    },
    /// Announces the location of newly placed food.
    FoodPlaced {
        /// Cell the food now occupies.
        cell: CellCoord,
    },
    /// Announces that the session ended and why.
    GameEnded {
        /// Collision or bounds violation that ended the session.
        cause: GameOverCause,
        /// Final score of the player snake.
        player_score: u32,
        /// Final score of the agent snake.
        agent_score: u32,
    },
    /// Announces that the session was abandoned in favor of the menu.
    ReturnedToMenu,
}

/// Terminal conditions that transition a running game to [`Phase::Over`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum GameOverCause {
    /// The snake's head stepped outside the board bounds.
    LeftBounds {
        /// Snake whose head left the board.
        snake: SnakeId,
    },
    /// The snake's head entered one of its own body cells.
    HitSelf {
        /// Snake that collided with itself.
        snake: SnakeId,
    },
    /// The snake's head entered an obstacle cell.
    HitObstacle {
        /// Snake that collided with an obstacle.
        snake: SnakeId,
    },
    /// The snake's head entered the opposing snake's body.
    HitOpponent {
        /// Snake that collided with its opponent.
        snake: SnakeId,
    },
    /// Both heads advanced onto the same cell in the same step.
    HeadOnCollision,
}

/// Immutable representation of a single snake's state used for queries.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SnakeSnapshot {
    /// Identifier of the captured snake.
    pub id: SnakeId,
    /// Body cells ordered head-first.
    pub body: Vec<CellCoord>,
    /// Heading committed at the last resolved step.
    pub heading: Direction,
    /// Food cells consumed so far this session.
    pub score: u32,
}

impl SnakeSnapshot {
    /// Cell currently occupied by the snake's head.
    ///
    /// Snapshots captured from a live world always carry a non-empty body;
    /// an empty snapshot yields `None`.
    #[must_use]
    pub fn head(&self) -> Option<CellCoord> {
        self.body.first().copied()
    }
}

/// Read-only snapshot describing all snakes active in the session.
#[derive(Clone, Debug, Default)]
pub struct SnakeView {
    snapshots: Vec<SnakeSnapshot>,
}

impl SnakeView {
    /// Creates a new snake view from the provided snapshots.
    #[must_use]
    pub fn from_snapshots(mut snapshots: Vec<SnakeSnapshot>) -> Self {
        snapshots.sort_by_key(|snapshot| snapshot.id);
        Self { snapshots }
    }

    /// Iterator over the captured snapshots in deterministic order.
    pub fn iter(&self) -> impl Iterator<Item = &SnakeSnapshot> {
        self.snapshots.iter()
    }

    /// Snapshot of the requested snake, if it is part of the session.
    #[must_use]
    pub fn get(&self, id: SnakeId) -> Option<&SnakeSnapshot> {
        self.snapshots.iter().find(|snapshot| snapshot.id == id)
    }

    /// Consumes the view, yielding the underlying snapshots.
    #[must_use]
    pub fn into_vec(self) -> Vec<SnakeSnapshot> {
        self.snapshots
    }
}

/// Read-only view into the dense per-step occupancy snapshot.
///
/// The backing slice is the union of every cell occupied by snake bodies and
/// obstacles as of the last committed step, stored in row-major order.
#[derive(Clone, Copy, Debug)]
pub struct OccupancyView<'a> {
    cells: &'a [bool],
    board: BoardDimensions,
}

impl<'a> OccupancyView<'a> {
    /// Captures a new occupancy view backed by the provided cell slice.
    #[must_use]
    pub fn new(cells: &'a [bool], board: BoardDimensions) -> Self {
        Self { cells, board }
    }

    /// Reports whether the cell is occupied by a snake body or obstacle.
    ///
    /// Out-of-bounds cells report as blocked so searches never leave the
    /// board.
    #[must_use]
    pub fn is_blocked(&self, cell: CellCoord) -> bool {
        match self.index(cell) {
            Some(index) => self.cells.get(index).copied().unwrap_or(true),
            None => true,
        }
    }

    /// Board geometry backing the snapshot.
    #[must_use]
    pub const fn board(&self) -> BoardDimensions {
        self.board
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
}

#[cfg(test)]
mod tests {
    use super::{
        BoardDimensions, CellCoord, Direction, GameMode, OccupancyView, SnakeId, SEARCH_ORDER,
    };
    use serde::{de::DeserializeOwned, Serialize};

    #[test]
    fn manhattan_distance_matches_expectation() {
        let origin = CellCoord::new(1, 1);
        let destination = CellCoord::new(4, 3);
        assert_eq!(origin.manhattan_distance(destination), 5);
        assert_eq!(destination.manhattan_distance(origin), 5);
    }

    #[test]
    fn opposites_pair_up() {
        assert_eq!(Direction::North.opposite(), Direction::South);
        assert_eq!(Direction::East.opposite(), Direction::West);
        assert_eq!(Direction::South.opposite(), Direction::North);
        assert_eq!(Direction::West.opposite(), Direction::East);
    }

    #[test]
    fn axis_splits_directions() {
        use super::Axis;
        assert_eq!(Direction::East.axis(), Axis::Horizontal);
        assert_eq!(Direction::West.axis(), Axis::Horizontal);
        assert_eq!(Direction::North.axis(), Axis::Vertical);
        assert_eq!(Direction::South.axis(), Axis::Vertical);
    }

    #[test]
    fn search_order_starts_east() {
        assert_eq!(SEARCH_ORDER[0], Direction::East);
        assert_eq!(SEARCH_ORDER[1], Direction::West);
        assert_eq!(SEARCH_ORDER[2], Direction::North);
        assert_eq!(SEARCH_ORDER[3], Direction::South);
    }

    #[test]
    fn neighbor_respects_bounds() {
        let board = BoardDimensions::new(3, 2);
        let corner = CellCoord::new(0, 0);

        assert_eq!(board.neighbor(corner, Direction::North), None);
        assert_eq!(board.neighbor(corner, Direction::West), None);
        assert_eq!(
            board.neighbor(corner, Direction::East),
            Some(CellCoord::new(1, 0))
        );
        assert_eq!(
            board.neighbor(corner, Direction::South),
            Some(CellCoord::new(0, 1))
        );

        let far_corner = CellCoord::new(2, 1);
        assert_eq!(board.neighbor(far_corner, Direction::East), None);
        assert_eq!(board.neighbor(far_corner, Direction::South), None);
    }

    #[test]
    fn occupancy_view_blocks_outside_the_board() {
        let board = BoardDimensions::new(2, 2);
        let cells = [false, true, false, false];
        let view = OccupancyView::new(&cells, board);

        assert!(!view.is_blocked(CellCoord::new(0, 0)));
        assert!(view.is_blocked(CellCoord::new(1, 0)));
        assert!(view.is_blocked(CellCoord::new(2, 0)));
        assert!(view.is_blocked(CellCoord::new(0, 5)));
    }

    fn assert_round_trip<T>(value: &T)
    where
        T: Serialize + DeserializeOwned + PartialEq + std::fmt::Debug,
    {
        let bytes = bincode::serialize(value).expect("serialize");
        let restored: T = bincode::deserialize(&bytes).expect("deserialize");
        assert_eq!(&restored, value);
    }

    #[test]
    fn cell_coord_round_trips_through_bincode() {
        assert_round_trip(&CellCoord::new(7, 13));
    }

    #[test]
    fn direction_round_trips_through_bincode() {
        assert_round_trip(&Direction::West);
    }

    #[test]
    fn game_mode_round_trips_through_bincode() {
        assert_round_trip(&GameMode::PlayerVsAgent);
    }

    #[test]
    fn snake_id_round_trips_through_bincode() {
        assert_round_trip(&SnakeId::Agent);
    }
}
