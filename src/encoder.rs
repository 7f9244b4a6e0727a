// State encoders: turn a running Game into the network's input vector
//
// Local vision looks at perimeter rings around the head in the snake's own
// frame, full board feeds every cell's occupancy, and neighbours only checks
// the three cells the snake can move into next.

use crate::board::{perimeter, to_egocentric, Board};
use crate::game::Game;
use crate::index::{to_1d, MajorOrder};
use crate::types::{Direction, Position};

#[inline]
fn flag(b: bool) -> f32 {
    if b {
        1.0
    } else {
        0.0
    }
}

/// Input layout selected by configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StateEncoder {
    /// Collision flags on rings 1..=radius around the head, then
    /// egocentric food flags [ahead, right, behind, left]
    LocalVision { radius: u32 },
    /// Heading one-hot, body grid, head grid, absolute food flags
    /// [up, right, down, left]
    FullBoard,
    /// Heading one-hot, collision flags [ahead, right, left] for the next
    /// cells, absolute food flags [up, right, down, left]
    Neighbours,
}

impl StateEncoder {
    /// Length of the encoded vector, i.e. the network's input layer width
    pub fn input_len(&self, board: &Board) -> usize {
        match *self {
            StateEncoder::LocalVision { radius } => {
                let r = radius as usize;
                4 * r * (r + 1) + 4
            }
            StateEncoder::FullBoard => 2 * board.area() + 8,
            StateEncoder::Neighbours => 11,
        }
    }

    pub fn encode(&self, game: &Game) -> Vec<f32> {
        let mut state = Vec::with_capacity(self.input_len(game.board()));
        match *self {
            StateEncoder::LocalVision { radius } => encode_local_vision(game, radius, &mut state),
            StateEncoder::FullBoard => encode_full_board(game, &mut state),
            StateEncoder::Neighbours => encode_neighbours(game, &mut state),
        }
        state
    }
}

fn encode_local_vision(game: &Game, radius: u32, state: &mut Vec<f32>) {
    let snake = game.snake();
    for r in 1..=radius as i32 {
        for pos in perimeter(snake.head(), snake.direction(), r) {
            state.push(flag(game.collision_at(pos)));
        }
    }

    match game.food() {
        Some(food) => {
            let rel = to_egocentric(food, snake);
            state.push(flag(rel.y > 0));
            state.push(flag(rel.x > 0));
            state.push(flag(rel.y < 0));
            state.push(flag(rel.x < 0));
        }
        None => state.extend_from_slice(&[0.0; 4]),
    }
}

fn push_heading(heading: Direction, state: &mut Vec<f32>) {
    for dir in Direction::all().iter() {
        state.push(flag(*dir == heading));
    }
}

fn push_food_direction(game: &Game, head: Position, state: &mut Vec<f32>) {
    match game.food() {
        Some(food) => {
            let (dx, dy) = food.delta(head);
            state.push(flag(dy > 0));
            state.push(flag(dx > 0));
            state.push(flag(dy < 0));
            state.push(flag(dx < 0));
        }
        None => state.extend_from_slice(&[0.0; 4]),
    }
}

fn encode_neighbours(game: &Game, state: &mut Vec<f32>) {
    let snake = game.snake();
    push_heading(snake.direction(), state);
    for pos in [snake.next_ahead(), snake.next_right(), snake.next_left()].iter() {
        state.push(flag(game.collision_at(*pos)));
    }
    push_food_direction(game, snake.head(), state);
}

fn encode_full_board(game: &Game, state: &mut Vec<f32>) {
    let board = game.board();
    let snake = game.snake();
    let (w, h) = (board.width.max(0) as usize, board.height.max(0) as usize);

    push_heading(snake.direction(), state);

    // Grid cell (x, y) lives at x * height + y
    let cell_index = |x: i32, y: i32| -> Option<usize> {
        if board.is_out_of_bounds(Position::new(x, y)) {
            None
        } else {
            to_1d(x as usize, y as usize, w, h, MajorOrder::Row).ok()
        }
    };

    let mut body = vec![0.0; w * h];
    for p in snake.tail_segments() {
        if let Some(i) = cell_index(p.x, p.y) {
            body[i] = 1.0;
        }
    }
    state.extend_from_slice(&body);

    let mut head = vec![0.0; w * h];
    let head_pos = snake.head();
    if let Some(i) = cell_index(head_pos.x, head_pos.y) {
        head[i] = 1.0;
    }
    state.extend_from_slice(&head);

    push_food_direction(game, head_pos, state);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::GameRules;
    use crate::types::Turn;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn game(width: i32, height: i32) -> (Game, StdRng) {
        let mut rng = StdRng::seed_from_u64(21);
        let game = Game::new(GameRules::new(Board::new(width, height), 30), &mut rng).unwrap();
        (game, rng)
    }

    #[test]
    fn test_local_vision_length() {
        let board = Board::new(20, 20);
        assert_eq!(StateEncoder::LocalVision { radius: 1 }.input_len(&board), 12);
        assert_eq!(StateEncoder::LocalVision { radius: 2 }.input_len(&board), 28);
        let (g, _) = game(20, 20);
        assert_eq!(StateEncoder::LocalVision { radius: 2 }.encode(&g).len(), 28);
    }

    #[test]
    fn test_local_vision_sees_walls() {
        // 3x3 board: snake at (1,1), every ring-2 cell is off the board
        let (mut g, _) = game(3, 3);
        g.set_food(Position::new(1, 2));
        let state = StateEncoder::LocalVision { radius: 2 }.encode(&g);
        assert!(state[..8].iter().all(|&v| v == 0.0), "ring 1 is all free");
        assert!(state[8..24].iter().all(|&v| v == 1.0), "ring 2 is all wall");
        assert_eq!(&state[24..], &[1.0, 0.0, 0.0, 0.0], "food straight ahead");
    }

    #[test]
    fn test_local_vision_food_is_egocentric() {
        let (mut g, mut rng) = game(20, 20);
        g.set_food(Position::new(0, 10)); // far to the left of (10, 10)
        let enc = StateEncoder::LocalVision { radius: 1 };
        assert_eq!(&enc.encode(&g)[8..], &[0.0, 0.0, 0.0, 1.0]);

        g.step(Turn::Left, &mut rng).unwrap(); // now heading left, food ahead
        assert_eq!(&enc.encode(&g)[8..], &[1.0, 0.0, 0.0, 0.0]);
    }

    #[test]
    fn test_full_board_layout() {
        let (mut g, mut rng) = game(4, 5);
        let enc = StateEncoder::FullBoard;
        assert_eq!(enc.input_len(g.board()), 2 * 20 + 8);

        g.set_food(g.snake().next_ahead());
        g.step(Turn::None, &mut rng).unwrap();
        g.set_food(Position::new(0, 0));
        let state = enc.encode(&g);
        assert_eq!(state.len(), 48);
        assert_eq!(&state[..4], &[1.0, 0.0, 0.0, 0.0], "heading up");

        // Snake body (2,2), head (2,3) on a 4x5 board
        let body = &state[4..24];
        let head = &state[24..44];
        assert_eq!(body.iter().filter(|&&v| v == 1.0).count(), 1);
        assert_eq!(body[2 * 5 + 2], 1.0);
        assert_eq!(head.iter().filter(|&&v| v == 1.0).count(), 1);
        assert_eq!(head[2 * 5 + 3], 1.0);
        assert_eq!(&state[44..], &[0.0, 0.0, 1.0, 1.0], "food down and left");
    }

    #[test]
    fn test_neighbours_layout() {
        // 3x1 board: snake at (1,0) heading up, so the cell ahead is wall
        let (mut g, _) = game(3, 1);
        g.set_food(Position::new(0, 0));
        let enc = StateEncoder::Neighbours;
        assert_eq!(enc.input_len(g.board()), 11);
        assert_eq!(
            enc.encode(&g),
            vec![1.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 0.0, 0.0, 1.0]
        );
    }

    #[test]
    fn test_neighbours_follow_heading() {
        let (mut g, mut rng) = game(20, 20);
        g.set_food(Position::new(15, 12));
        let enc = StateEncoder::Neighbours;
        assert_eq!(&enc.encode(&g)[4..], &[0.0, 0.0, 0.0, 1.0, 1.0, 0.0, 0.0]);

        g.step(Turn::Right, &mut rng).unwrap();
        let state = enc.encode(&g);
        assert_eq!(&state[..4], &[0.0, 1.0, 0.0, 0.0], "heading right");
        assert_eq!(&state[7..], &[1.0, 1.0, 0.0, 0.0], "food up and right");
    }
}
