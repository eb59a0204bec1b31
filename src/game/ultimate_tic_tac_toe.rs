//! Ultimate tic-tac-toe: nine local 3×3 boards arranged in a 3×3 macro board.
//!
//! Action ids are board-major: `action = board * 9 + cell`. The cell index of a
//! move selects the local board the opponent must play in next; when that board
//! is already closed (won or full) the opponent may play anywhere open.

use std::fmt;

use crate::game::tic_tac_toe::Outcome;
use crate::game::{has_line, Game, Player, BOARD_MASK};

#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct UltimateTicTacToe {
    x_cells: [u16; 9],
    o_cells: [u16; 9],
    /// Macro boards won by X / O.
    x_macro: u16,
    o_macro: u16,
    /// Local boards that are full without a winner.
    drawn_macro: u16,
    /// Local board the next move is forced into, if it is still open.
    forced_board: Option<usize>,
    to_move: Player,
    outcome: Outcome,
}

impl UltimateTicTacToe {
    pub fn outcome(&self) -> Outcome {
        self.outcome
    }

    pub fn forced_board(&self) -> Option<usize> {
        self.forced_board
    }

    /// Winner of a local board, `None` while it is open or drawn.
    pub fn local_winner(&self, board: usize) -> Option<Player> {
        let bit = 1u16 << board;
        if self.x_macro & bit != 0 {
            Some(Player::X)
        } else if self.o_macro & bit != 0 {
            Some(Player::O)
        } else {
            None
        }
    }

    fn closed_boards(&self) -> u16 {
        self.x_macro | self.o_macro | self.drawn_macro
    }

    fn is_open(&self, board: usize) -> bool {
        self.closed_boards() & (1 << board) == 0
    }

    fn empty_cells(&self, board: usize) -> u16 {
        !(self.x_cells[board] | self.o_cells[board]) & BOARD_MASK
    }

    /// Boards a move may target right now, as a 9-bit mask.
    fn target_boards(&self) -> u16 {
        if self.outcome != Outcome::Running {
            return 0;
        }
        match self.forced_board {
            Some(board) => 1 << board,
            None => !self.closed_boards() & BOARD_MASK,
        }
    }

    /// Row-major index on the 9×9 grid for a board-major action id.
    fn grid_index(action: usize) -> usize {
        let (board, cell) = (action / 9, action % 9);
        let row = (board / 3) * 3 + cell / 3;
        let col = (board % 3) * 3 + cell % 3;
        row * 9 + col
    }

    fn refresh_outcome(&mut self) {
        self.outcome = if has_line(self.x_macro) {
            Outcome::Won(Player::X)
        } else if has_line(self.o_macro) {
            Outcome::Won(Player::O)
        } else if self.closed_boards() == BOARD_MASK {
            Outcome::Draw
        } else {
            Outcome::Running
        };
    }
}

impl Game for UltimateTicTacToe {
    const NAME: &'static str = "ultimate";
    const ACTION_SIZE: usize = 81;
    const ENCODED_SHAPE: (i64, i64, i64) = (5, 9, 9);

    fn new_game() -> Self {
        Self {
            x_cells: [0; 9],
            o_cells: [0; 9],
            x_macro: 0,
            o_macro: 0,
            drawn_macro: 0,
            forced_board: None,
            to_move: Player::X,
            outcome: Outcome::Running,
        }
    }

    fn legal_moves(&self) -> Vec<usize> {
        let targets = self.target_boards();
        let mut moves = Vec::new();
        for board in (0..9).filter(|b| targets & (1 << b) != 0) {
            let mut empty = self.empty_cells(board);
            while empty != 0 {
                moves.push(board * 9 + empty.trailing_zeros() as usize);
                empty &= empty - 1;
            }
        }
        moves
    }

    fn apply_move(&self, action: usize) -> Self {
        let (board, cell) = (action / 9, action % 9);
        assert!(
            action < Self::ACTION_SIZE
                && self.target_boards() & (1 << board) != 0
                && self.empty_cells(board) & (1 << cell) != 0,
            "illegal ultimate tic-tac-toe move {action} (board {board}, cell {cell})"
        );

        let mut next = *self;
        let stones = match self.to_move {
            Player::X => &mut next.x_cells[board],
            Player::O => &mut next.o_cells[board],
        };
        *stones |= 1 << cell;

        if has_line(*stones) {
            match self.to_move {
                Player::X => next.x_macro |= 1 << board,
                Player::O => next.o_macro |= 1 << board,
            }
        } else if next.empty_cells(board) == 0 {
            next.drawn_macro |= 1 << board;
        }

        next.forced_board = next.is_open(cell).then_some(cell);
        next.to_move = self.to_move.opponent();
        next.refresh_outcome();
        next
    }

    fn value_and_terminated(&self) -> (f32, bool) {
        match self.outcome {
            Outcome::Running => (0.0, false),
            Outcome::Draw => (0.0, true),
            Outcome::Won(winner) if winner == self.to_move => (1.0, true),
            Outcome::Won(_) => (-1.0, true),
        }
    }

    fn encode(&self) -> Vec<f32> {
        const PLANE: usize = 81;
        let (own, opp) = match self.to_move {
            Player::X => (&self.x_cells, &self.o_cells),
            Player::O => (&self.o_cells, &self.x_cells),
        };
        let targets = self.target_boards();

        let mut planes = vec![0.0f32; 5 * PLANE];
        for action in 0..Self::ACTION_SIZE {
            let (board, cell) = (action / 9, action % 9);
            let bit = 1u16 << cell;
            let idx = Self::grid_index(action);
            if own[board] & bit != 0 {
                planes[idx] = 1.0;
            } else if opp[board] & bit != 0 {
                planes[PLANE + idx] = 1.0;
            } else {
                planes[2 * PLANE + idx] = 1.0;
                if targets & (1 << board) != 0 {
                    planes[3 * PLANE + idx] = 1.0;
                }
            }
        }
        if self.to_move == Player::X {
            planes[4 * PLANE..].fill(1.0);
        }
        planes
    }

    fn current_player(&self) -> Player {
        self.to_move
    }
}

impl fmt::Display for UltimateTicTacToe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for row in 0..9 {
            if row > 0 && row % 3 == 0 {
                writeln!(f, "------+-------+------")?;
            }
            for col in 0..9 {
                if col > 0 && col % 3 == 0 {
                    write!(f, "| ")?;
                }
                let board = (row / 3) * 3 + col / 3;
                let bit = 1u16 << ((row % 3) * 3 + col % 3);
                let symbol = if self.x_cells[board] & bit != 0 {
                    'X'
                } else if self.o_cells[board] & bit != 0 {
                    'O'
                } else {
                    '.'
                };
                write!(f, "{symbol} ")?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

impl fmt::Debug for UltimateTicTacToe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UltimateTicTacToe")
            .field("to_move", &self.to_move)
            .field("forced_board", &self.forced_board)
            .field("outcome", &self.outcome)
            .field("x_macro", &format_args!("{:09b}", self.x_macro))
            .field("o_macro", &format_args!("{:09b}", self.o_macro))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn play(moves: &[usize]) -> UltimateTicTacToe {
        moves
            .iter()
            .fold(UltimateTicTacToe::new_game(), |game, &a| game.apply_move(a))
    }

    #[test]
    fn test_first_move_is_free() {
        let game = UltimateTicTacToe::new_game();
        assert_eq!(game.legal_moves().len(), 81);
        assert_eq!(game.forced_board(), None);
    }

    #[test]
    fn test_cell_selects_next_board() {
        // X plays board 0, cell 4 -> O is sent to board 4
        let game = play(&[4]);
        assert_eq!(game.forced_board(), Some(4));
        assert_eq!(game.legal_moves(), (36..45).collect::<Vec<_>>());
    }

    #[test]
    fn test_local_win_closes_board() {
        // X: b0c1, b0c2, b0c0 ; O keeps sending X back with cell 0
        let game = play(&[1, 9, 2, 18, 0]);
        assert_eq!(game.local_winner(0), Some(Player::X));
        // O would be sent to board 0, which is closed
        assert_eq!(game.forced_board(), None);
        let legal = game.legal_moves();
        assert_eq!(legal.len(), 81 - 9 - 2);
        assert!(legal.iter().all(|&a| a / 9 != 0));
    }

    #[test]
    fn test_closed_target_frees_next_move() {
        // O plays board 3 cell 0, pointing X at the closed board 0
        let game = play(&[1, 9, 2, 18, 0, 27]);
        assert_eq!(game.current_player(), Player::X);
        assert_eq!(game.forced_board(), None);
    }

    #[test]
    fn test_macro_line_wins_game() {
        let mut game = UltimateTicTacToe::new_game();
        game.x_macro = 0b100_010_001;
        game.o_macro = 0b000_001_010;
        game.to_move = Player::O;
        game.refresh_outcome();

        assert_eq!(game.outcome(), Outcome::Won(Player::X));
        assert_eq!(game.value_and_terminated(), (-1.0, true));
        assert!(game.legal_moves().is_empty());
    }

    #[test]
    fn test_all_boards_closed_is_draw() {
        let mut game = UltimateTicTacToe::new_game();
        game.x_macro = 0b110_001_101;
        game.o_macro = 0b001_110_010;
        game.refresh_outcome();

        assert_eq!(game.outcome(), Outcome::Draw);
        assert_eq!(game.value_and_terminated(), (0.0, true));
        assert!(game.legal_moves().is_empty());
    }

    #[test]
    fn test_encode_planes() {
        let game = play(&[4]);
        let planes = game.encode();
        assert_eq!(planes.len(), UltimateTicTacToe::encoded_len());
        // O to move: X stone on the opponent plane at grid (1, 1)
        assert_eq!(planes[81 + 10], 1.0);
        // legal-target plane covers only board 4
        assert_eq!(planes[3 * 81..4 * 81].iter().sum::<f32>(), 9.0);
        // side-to-move plane is empty for O
        assert_eq!(planes[4 * 81..].iter().sum::<f32>(), 0.0);
    }

    #[test]
    #[should_panic(expected = "illegal ultimate tic-tac-toe move")]
    fn test_move_outside_forced_board_panics() {
        play(&[4, 0]);
    }
}
