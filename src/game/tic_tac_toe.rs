//! 3×3 tic-tac-toe on two 9-bit boards.

use std::fmt;

use crate::game::{has_line, Game, Player, BOARD_MASK};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Outcome {
    #[default]
    Running,
    Won(Player),
    Draw,
}

#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct TicTacToe {
    x_board: u16,
    o_board: u16,
    to_move: Player,
    outcome: Outcome,
}

impl TicTacToe {
    /// Builds a position from a 9-character string (`X`, `O`, `.`), row major.
    /// The side to move is inferred from the stone counts.
    pub fn from_cells(cells: &str) -> Option<Self> {
        let cells: Vec<char> = cells.chars().filter(|c| !c.is_whitespace()).collect();
        if cells.len() != 9 {
            return None;
        }

        let mut x_board = 0u16;
        let mut o_board = 0u16;
        for (idx, cell) in cells.iter().enumerate() {
            match cell {
                'X' | 'x' => x_board |= 1 << idx,
                'O' | 'o' => o_board |= 1 << idx,
                '.' | '-' | '_' => {}
                _ => return None,
            }
        }

        let x_count = x_board.count_ones();
        let o_count = o_board.count_ones();
        let to_move = match x_count.checked_sub(o_count) {
            Some(0) => Player::X,
            Some(1) => Player::O,
            _ => return None,
        };

        let outcome = Self::outcome_of(x_board, o_board);
        Some(Self {
            x_board,
            o_board,
            to_move,
            outcome,
        })
    }

    pub fn outcome(&self) -> Outcome {
        self.outcome
    }

    fn outcome_of(x_board: u16, o_board: u16) -> Outcome {
        if has_line(x_board) {
            Outcome::Won(Player::X)
        } else if has_line(o_board) {
            Outcome::Won(Player::O)
        } else if (x_board | o_board) & BOARD_MASK == BOARD_MASK {
            Outcome::Draw
        } else {
            Outcome::Running
        }
    }

    fn empty_cells(&self) -> u16 {
        !(self.x_board | self.o_board) & BOARD_MASK
    }
}

impl Game for TicTacToe {
    const NAME: &'static str = "tictactoe";
    const ACTION_SIZE: usize = 9;
    const ENCODED_SHAPE: (i64, i64, i64) = (3, 3, 3);

    fn new_game() -> Self {
        Self {
            x_board: 0,
            o_board: 0,
            to_move: Player::X,
            outcome: Outcome::Running,
        }
    }

    fn legal_moves(&self) -> Vec<usize> {
        if self.outcome != Outcome::Running {
            return Vec::new();
        }
        let mut board = self.empty_cells();
        let mut moves = Vec::with_capacity(board.count_ones() as usize);
        while board != 0 {
            moves.push(board.trailing_zeros() as usize);
            board &= board - 1;
        }
        moves
    }

    fn apply_move(&self, action: usize) -> Self {
        assert!(
            self.outcome == Outcome::Running && action < 9 && self.empty_cells() & (1 << action) != 0,
            "illegal tic-tac-toe move {action} in position\n{self}"
        );

        let mut next = *self;
        match self.to_move {
            Player::X => next.x_board |= 1 << action,
            Player::O => next.o_board |= 1 << action,
        }
        next.to_move = self.to_move.opponent();
        next.outcome = Self::outcome_of(next.x_board, next.o_board);
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
        let (own, opp) = match self.to_move {
            Player::X => (self.x_board, self.o_board),
            Player::O => (self.o_board, self.x_board),
        };
        let mut planes = vec![0.0f32; 27];
        for cell in 0..9 {
            let bit = 1u16 << cell;
            let plane = if own & bit != 0 {
                0
            } else if opp & bit != 0 {
                1
            } else {
                2
            };
            planes[plane * 9 + cell] = 1.0;
        }
        planes
    }

    fn current_player(&self) -> Player {
        self.to_move
    }
}

impl fmt::Display for TicTacToe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for row in 0..3 {
            for col in 0..3 {
                let bit = 1u16 << (row * 3 + col);
                let symbol = if self.x_board & bit != 0 {
                    'X'
                } else if self.o_board & bit != 0 {
                    'O'
                } else {
                    '.'
                };
                write!(f, "{symbol}")?;
                if col < 2 {
                    write!(f, " ")?;
                }
            }
            if row < 2 {
                writeln!(f)?;
            }
        }
        Ok(())
    }
}

impl fmt::Debug for TicTacToe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TicTacToe")
            .field("to_move", &self.to_move)
            .field("outcome", &self.outcome)
            .field("board", &self.to_string().replace('\n', "/"))
            .finish()
    }
}
