use crate::Move;
use crate::Position;
use crate::Tier;
use crate::game::*;

/// Cells in a board.
const CELLS: usize = 9;
/// Base-3 board encodings, legal or not.
const BOARDS: u64 = 19683;
/// Winning lines.
const LINES: [[usize; 3]; 8] = [
    [0, 1, 2],
    [3, 4, 5],
    [6, 7, 8],
    [0, 3, 6],
    [1, 4, 7],
    [2, 5, 8],
    [0, 4, 8],
    [2, 4, 6],
];
/// The eight board symmetries, as `image[i] = board[perm[i]]`.
const SYMMETRIES: [[usize; CELLS]; 8] = [
    [0, 1, 2, 3, 4, 5, 6, 7, 8],
    [6, 3, 0, 7, 4, 1, 8, 5, 2],
    [8, 7, 6, 5, 4, 3, 2, 1, 0],
    [2, 5, 8, 1, 4, 7, 0, 3, 6],
    [2, 1, 0, 5, 4, 3, 8, 7, 6],
    [6, 7, 8, 3, 4, 5, 0, 1, 2],
    [0, 3, 6, 1, 4, 7, 2, 5, 8],
    [8, 5, 2, 7, 4, 1, 6, 3, 0],
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Cell {
    Empty = 0,
    X = 1,
    O = 2,
}

impl Cell {
    fn from_digit(digit: u64) -> Self {
        match digit {
            1 => Self::X,
            2 => Self::O,
            _ => Self::Empty,
        }
    }
    fn opponent(self) -> Self {
        match self {
            Self::X => Self::O,
            Self::O => Self::X,
            Self::Empty => Self::Empty,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Board([Cell; CELLS]);

impl From<Position> for Board {
    fn from(mut position: Position) -> Self {
        let mut cells = [Cell::Empty; CELLS];
        for cell in cells.iter_mut() {
            *cell = Cell::from_digit(position % 3);
            position /= 3;
        }
        Self(cells)
    }
}

impl From<Board> for Position {
    fn from(board: Board) -> Self {
        board
            .0
            .iter()
            .rev()
            .fold(0, |acc, &cell| acc * 3 + cell as Position)
    }
}

impl Board {
    fn count(&self, piece: Cell) -> usize {
        self.0.iter().filter(|&&c| c == piece).count()
    }
    fn pieces(&self) -> usize {
        CELLS - self.count(Cell::Empty)
    }
    fn turn(&self) -> Cell {
        match self.count(Cell::X) == self.count(Cell::O) {
            true => Cell::X,
            false => Cell::O,
        }
    }
    fn wins(&self, piece: Cell) -> bool {
        LINES
            .iter()
            .any(|line| line.iter().all(|&i| self.0[i] == piece))
    }
    fn permuted(&self, perm: &[usize; CELLS]) -> Self {
        Self(std::array::from_fn(|i| self.0[perm[i]]))
    }
    fn canonical(&self) -> Position {
        SYMMETRIES
            .iter()
            .map(|perm| Position::from(self.permuted(perm)))
            .min()
            .unwrap_or_else(|| Position::from(*self))
    }
}

/// Tic-tac-toe, tiered by the number of pieces on the board.
/// Positions are base-3 board encodings; boards equal up to rotation
/// and reflection share a canonical position.
#[derive(Debug, Clone, Copy)]
pub struct TicTacToe {
    tier_type: TierType,
    retrograde: bool,
}

impl Default for TicTacToe {
    fn default() -> Self {
        Self {
            tier_type: TierType::ImmediateTransition,
            retrograde: false,
        }
    }
}

impl TicTacToe {
    pub fn new() -> Self {
        Self::default()
    }
    /// Report every tier as loopy so tiers are solved by backward induction.
    pub fn loopy(mut self) -> Self {
        self.tier_type = TierType::Loopy;
        self
    }
    /// Enumerate parents directly instead of relying on a reverse graph.
    pub fn with_retrograde(mut self) -> Self {
        self.retrograde = true;
        self
    }
}

impl TierGame for TicTacToe {
    fn initial_tier(&self) -> Tier {
        0
    }
    fn initial_position(&self) -> Position {
        0
    }
    fn tier_size(&self, _: Tier) -> u64 {
        BOARDS
    }
    fn moves(&self, at: TierPosition) -> Vec<Move> {
        if self.primitive(at) != Value::Undecided {
            return Vec::new();
        }
        let board = Board::from(at.position);
        (0..CELLS)
            .filter(|&i| board.0[i] == Cell::Empty)
            .map(|i| i as Move)
            .collect()
    }
    fn primitive(&self, at: TierPosition) -> Value {
        let board = Board::from(at.position);
        if board.wins(board.turn().opponent()) {
            Value::Lose
        } else if board.pieces() == CELLS {
            Value::Tie
        } else {
            Value::Undecided
        }
    }
    fn do_move(&self, at: TierPosition, mv: Move) -> TierPosition {
        let mut board = Board::from(at.position);
        board.0[mv as usize] = board.turn();
        TierPosition::new(at.tier + 1, Position::from(board))
    }
    fn is_legal(&self, at: TierPosition) -> bool {
        if at.position >= BOARDS {
            return false;
        }
        let board = Board::from(at.position);
        let x = board.count(Cell::X);
        let o = board.count(Cell::O);
        let xwins = board.wins(Cell::X);
        let owins = board.wins(Cell::O);
        (x + o) as Tier == at.tier
            && (x == o || x == o + 1)
            && !(xwins && owins)
            && (!xwins || x == o + 1)
            && (!owins || x == o)
    }
    fn child_tiers(&self, tier: Tier) -> Vec<Tier> {
        match tier < CELLS as Tier {
            true => vec![tier + 1],
            false => Vec::new(),
        }
    }
    fn canonical_position(&self, at: TierPosition) -> Position {
        Board::from(at.position).canonical()
    }
    fn tier_type(&self, _: Tier) -> TierType {
        self.tier_type
    }
    fn tier_name(&self, tier: Tier) -> String {
        format!("{}-pieces", tier)
    }
    fn retrograde(&self) -> Option<&dyn Retrograde> {
        match self.retrograde {
            true => Some(self),
            false => None,
        }
    }
}

impl Retrograde for TicTacToe {
    fn canonical_parent_positions(&self, child: TierPosition, parent_tier: Tier) -> Vec<Position> {
        if parent_tier + 1 != child.tier {
            return Vec::new();
        }
        let board = Board::from(child.position);
        let mover = board.turn().opponent();
        let mut parents = (0..CELLS)
            .filter(|&i| board.0[i] == mover)
            .map(|i| {
                let mut parent = board;
                parent.0[i] = Cell::Empty;
                TierPosition::new(parent_tier, Position::from(parent))
            })
            .filter(|&parent| self.is_legal(parent))
            .filter(|&parent| self.primitive(parent) == Value::Undecided)
            .map(|parent| self.canonical_position(parent))
            .collect::<Vec<_>>();
        parents.sort_unstable();
        parents.dedup();
        parents
    }
}
