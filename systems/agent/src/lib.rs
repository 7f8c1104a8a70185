#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Deterministic steering policy for the computer-controlled snake.
//!
//! The policy chases the food along a shortest path when one exists and
//! otherwise falls back to the move that keeps the most open space
//! reachable, so the snake survives until a path opens up again.

use snake_duel_core::{
    CellCoord, Command, Direction, Event, OccupancyView, SnakeId, SnakeView, SEARCH_ORDER,
};
use std::collections::VecDeque;

/// Pure system that steers the agent snake whenever a step is due.
///
/// The world emits [`Event::StepReady`] after a full step interval has
/// accumulated but before the step resolves, so every decision made here
/// reads the committed pre-step snapshot.
#[derive(Debug, Default)]
pub struct AgentPolicy;

impl AgentPolicy {
    /// Consumes world events and immutable views to emit steering commands.
    pub fn handle(
        &mut self,
        events: &[Event],
        snake_view: &SnakeView,
        occupancy_view: OccupancyView<'_>,
        food: Option<CellCoord>,
        out: &mut Vec<Command>,
    ) {
        if !events
            .iter()
            .any(|event| matches!(event, Event::StepReady { .. }))
        {
            return;
        }

        let Some(agent) = snake_view.get(SnakeId::Agent) else {
            return;
        };
        let Some(head) = agent.head() else {
            return;
        };

        let direction = chase_or_survive(head, food, occupancy_view);
        out.push(Command::SteerSnake {
            snake: SnakeId::Agent,
            direction,
        });
    }
}

/// Picks the next heading for a snake whose head sits at `head`.
///
/// Prefers the first move of a shortest path to the food; when the food is
/// absent or unreachable, falls back to [`survival_move`].
#[must_use]
pub fn chase_or_survive(
    head: CellCoord,
    food: Option<CellCoord>,
    occupancy: OccupancyView<'_>,
) -> Direction {
    if let Some(target) = food {
        let path = find_path(head, target, occupancy);
        if let Some(first) = path.first() {
            return *first;
        }
    }
    survival_move(head, occupancy)
}

/// Finds a shortest path from `head` to `target` over unblocked cells.
///
/// Breadth-first search expands neighbors in the fixed order East, West,
/// North, South, so among equally short paths the same one is always
/// returned. The starting cell is exempt from the blocked check; every
/// other cell on the path is in bounds and unoccupied. Returns an empty
/// vector when `head == target` or when no path exists.
#[must_use]
pub fn find_path(
    head: CellCoord,
    target: CellCoord,
    occupancy: OccupancyView<'_>,
) -> Vec<Direction> {
    let board = occupancy.board();
    if head == target || !board.contains(head) || !board.contains(target) {
        return Vec::new();
    }

    let Some(node_count) = usize::try_from(board.cell_count()).ok() else {
        return Vec::new();
    };
    let mut visited = vec![false; node_count];
    let mut came_from: Vec<Option<(CellCoord, Direction)>> = vec![None; node_count];
    let mut frontier = VecDeque::new();

    if let Some(start) = cell_index(board.columns(), head) {
        visited[start] = true;
    } else {
        return Vec::new();
    }
    frontier.push_back(head);

    while let Some(cell) = frontier.pop_front() {
        for direction in SEARCH_ORDER {
            let Some(next) = board.neighbor(cell, direction) else {
                continue;
            };
            let Some(index) = cell_index(board.columns(), next) else {
                continue;
            };
            if visited[index] || occupancy.is_blocked(next) {
                continue;
            }
            visited[index] = true;
            came_from[index] = Some((cell, direction));
            if next == target {
                return reconstruct(head, target, board.columns(), &came_from);
            }
            frontier.push_back(next);
        }
    }

    Vec::new()
}

/// Picks the neighboring move that leaves the most open space reachable.
///
/// Each candidate direction is scored with an independent flood fill from
/// the cell it would enter; a candidate replaces the current best only
/// when its region is strictly larger, so ties keep the earliest candidate
/// in the East, West, North, South order. When every neighbor is blocked
/// the snake is boxed in and East is returned so the step still resolves.
#[must_use]
pub fn survival_move(head: CellCoord, occupancy: OccupancyView<'_>) -> Direction {
    let board = occupancy.board();
    let mut best_direction = Direction::East;
    let mut best_size = 0_usize;

    for direction in SEARCH_ORDER {
        let Some(next) = board.neighbor(head, direction) else {
            continue;
        };
        if occupancy.is_blocked(next) {
            continue;
        }
        let size = open_region_size(next, occupancy);
        if size > best_size {
            best_size = size;
            best_direction = direction;
        }
    }

    best_direction
}

/// Counts the unblocked cells reachable from `start`, `start` included.
fn open_region_size(start: CellCoord, occupancy: OccupancyView<'_>) -> usize {
    let board = occupancy.board();
    let Some(node_count) = usize::try_from(board.cell_count()).ok() else {
        return 0;
    };
    let mut visited = vec![false; node_count];
    let mut frontier = VecDeque::new();

    let Some(start_index) = cell_index(board.columns(), start) else {
        return 0;
    };
    visited[start_index] = true;
    frontier.push_back(start);

    let mut size = 0_usize;
    while let Some(cell) = frontier.pop_front() {
        size += 1;
        for direction in SEARCH_ORDER {
            let Some(next) = board.neighbor(cell, direction) else {
                continue;
            };
            let Some(index) = cell_index(board.columns(), next) else {
                continue;
            };
            if visited[index] || occupancy.is_blocked(next) {
                continue;
            }
            visited[index] = true;
            frontier.push_back(next);
        }
    }

    size
}

fn reconstruct(
    head: CellCoord,
    target: CellCoord,
    columns: u32,
    came_from: &[Option<(CellCoord, Direction)>],
) -> Vec<Direction> {
    let mut path = Vec::new();
    let mut cursor = target;
    while cursor != head {
        let Some(index) = cell_index(columns, cursor) else {
            return Vec::new();
        };
        let Some((previous, direction)) = came_from[index] else {
            return Vec::new();
        };
        path.push(direction);
        cursor = previous;
    }
    path.reverse();
    path
}

fn cell_index(columns: u32, cell: CellCoord) -> Option<usize> {
    let index = u64::from(cell.row()) * u64::from(columns) + u64::from(cell.column());
    usize::try_from(index).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use snake_duel_core::{BoardDimensions, SnakeSnapshot};

    fn open_cells(board: BoardDimensions) -> Vec<bool> {
        vec![false; board.cell_count() as usize]
    }

    fn block(board: BoardDimensions, cells: &mut [bool], blocked: &[CellCoord]) {
        for cell in blocked {
            cells[(cell.row() * board.columns() + cell.column()) as usize] = true;
        }
    }

    fn walk(board: BoardDimensions, start: CellCoord, path: &[Direction]) -> Option<CellCoord> {
        let mut cursor = start;
        for direction in path {
            cursor = board.neighbor(cursor, *direction)?;
        }
        Some(cursor)
    }

    #[test]
    fn straight_line_path_is_two_east_moves() {
        let board = BoardDimensions::new(20, 20);
        let cells = open_cells(board);
        let occupancy = OccupancyView::new(&cells, board);

        let path = find_path(CellCoord::new(0, 0), CellCoord::new(2, 0), occupancy);

        assert_eq!(path, vec![Direction::East, Direction::East]);
    }

    #[test]
    fn open_board_path_length_matches_manhattan_distance() {
        let board = BoardDimensions::new(20, 20);
        let cells = open_cells(board);
        let occupancy = OccupancyView::new(&cells, board);
        let head = CellCoord::new(3, 4);
        let target = CellCoord::new(7, 9);

        let path = find_path(head, target, occupancy);

        assert_eq!(path.len() as u32, head.manhattan_distance(target));
        assert_eq!(walk(board, head, &path), Some(target));
    }

    #[test]
    fn path_detours_around_a_wall() {
        let board = BoardDimensions::new(20, 20);
        let mut cells = open_cells(board);
        // Vertical wall on column 2 with a gap at row 6.
        let wall: Vec<CellCoord> = (0..6).map(|row| CellCoord::new(2, row)).collect();
        block(board, &mut cells, &wall);
        let occupancy = OccupancyView::new(&cells, board);
        let head = CellCoord::new(0, 0);
        let target = CellCoord::new(4, 0);

        let path = find_path(head, target, occupancy);

        assert!(path.len() as u32 > head.manhattan_distance(target));
        assert_eq!(walk(board, head, &path), Some(target));
        let mut cursor = head;
        for direction in &path {
            cursor = board.neighbor(cursor, *direction).unwrap();
            assert!(!occupancy.is_blocked(cursor));
        }
    }

    #[test]
    fn unreachable_target_yields_no_path() {
        let board = BoardDimensions::new(20, 20);
        let mut cells = open_cells(board);
        // Seal off the target cell on all four sides.
        block(
            board,
            &mut cells,
            &[
                CellCoord::new(9, 10),
                CellCoord::new(11, 10),
                CellCoord::new(10, 9),
                CellCoord::new(10, 11),
            ],
        );
        let occupancy = OccupancyView::new(&cells, board);

        let path = find_path(CellCoord::new(0, 0), CellCoord::new(10, 10), occupancy);

        assert!(path.is_empty());
    }

    #[test]
    fn path_to_own_cell_is_empty() {
        let board = BoardDimensions::new(20, 20);
        let cells = open_cells(board);
        let occupancy = OccupancyView::new(&cells, board);

        let path = find_path(CellCoord::new(5, 5), CellCoord::new(5, 5), occupancy);

        assert!(path.is_empty());
    }

    #[test]
    fn survival_move_avoids_the_dead_end_pocket() {
        let board = BoardDimensions::new(20, 20);
        let mut cells = open_cells(board);
        // East of the head lies a one-cell pocket; south stays open. The
        // head cell is occupied the way a live snake body occupies it.
        let head = CellCoord::new(5, 5);
        block(
            board,
            &mut cells,
            &[
                head,
                CellCoord::new(5, 4),
                CellCoord::new(4, 5),
                CellCoord::new(6, 4),
                CellCoord::new(7, 5),
                CellCoord::new(6, 6),
            ],
        );
        let occupancy = OccupancyView::new(&cells, board);

        assert_eq!(survival_move(head, occupancy), Direction::South);
    }

    #[test]
    fn equal_regions_keep_the_east_candidate() {
        let board = BoardDimensions::new(20, 20);
        let cells = open_cells(board);
        let occupancy = OccupancyView::new(&cells, board);

        // Every neighbor reaches the same open region.
        assert_eq!(survival_move(CellCoord::new(10, 10), occupancy), Direction::East);
    }

    #[test]
    fn boxed_in_snake_defaults_to_east() {
        let board = BoardDimensions::new(20, 20);
        let mut cells = open_cells(board);
        let head = CellCoord::new(10, 10);
        block(
            board,
            &mut cells,
            &[
                CellCoord::new(11, 10),
                CellCoord::new(9, 10),
                CellCoord::new(10, 9),
                CellCoord::new(10, 11),
            ],
        );
        let occupancy = OccupancyView::new(&cells, board);

        assert_eq!(survival_move(head, occupancy), Direction::East);
    }

    #[test]
    fn repeated_decisions_on_the_same_snapshot_agree() {
        let board = BoardDimensions::new(20, 20);
        let mut cells = open_cells(board);
        block(board, &mut cells, &[CellCoord::new(6, 5), CellCoord::new(5, 6)]);
        let occupancy = OccupancyView::new(&cells, board);
        let head = CellCoord::new(5, 5);
        let food = Some(CellCoord::new(12, 3));

        let first = chase_or_survive(head, food, occupancy);
        let second = chase_or_survive(head, food, occupancy);

        assert_eq!(first, second);
    }

    #[test]
    fn policy_steers_only_when_a_step_is_ready() {
        let board = BoardDimensions::new(20, 20);
        let cells = open_cells(board);
        let occupancy = OccupancyView::new(&cells, board);
        let view = SnakeView::from_snapshots(vec![SnakeSnapshot {
            id: SnakeId::Agent,
            body: vec![
                CellCoord::new(10, 10),
                CellCoord::new(9, 10),
                CellCoord::new(8, 10),
            ],
            heading: Direction::East,
            score: 0,
        }]);
        let food = Some(CellCoord::new(15, 10));
        let mut policy = AgentPolicy::default();

        let mut out = Vec::new();
        policy.handle(
            &[Event::GameStarted {
                mode: snake_duel_core::GameMode::AgentOnly,
            }],
            &view,
            OccupancyView::new(&cells, board),
            food,
            &mut out,
        );
        assert!(out.is_empty());

        policy.handle(&[Event::StepReady { tick: 1 }], &view, occupancy, food, &mut out);
        assert_eq!(
            out,
            vec![Command::SteerSnake {
                snake: SnakeId::Agent,
                direction: Direction::East,
            }]
        );
    }
}
