pub const ROWS: usize = 6;
pub const COLS: usize = 7;

const WIN_LENGTH: usize = 4;

/// Axis pairs walked in both senses from the last placed disc
const DIRECTIONS: [(isize, isize); 4] = [(0, 1), (1, 0), (1, 1), (1, -1)];

/// One of the two players seated at a board
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    A,
    B,
}

impl Side {
    pub fn other(self) -> Self {
        match self {
            Side::A => Side::B,
            Side::B => Side::A,
        }
    }

    /// Wire code: 1 for side A, 2 for side B
    pub fn code(self) -> u8 {
        match self {
            Side::A => 1,
            Side::B => 2,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Ongoing,
    Win(Side),
    Draw,
}

impl Outcome {
    /// Wire code: 0 ongoing, 1/2 winning side, 3 draw
    pub fn code(self) -> u8 {
        match self {
            Outcome::Ongoing => 0,
            Outcome::Win(side) => side.code(),
            Outcome::Draw => 3,
        }
    }

    pub fn is_over(self) -> bool {
        self != Outcome::Ongoing
    }
}

/// Fixed 6x7 grid; row 0 is the top, discs fall towards row ROWS - 1
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Board {
    cells: [[Option<Side>; COLS]; ROWS],
}

impl Board {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cell(&self, row: usize, col: usize) -> Option<Side> {
        self.cells[row][col]
    }

    /// Drop a disc into `col`. Returns the row it landed on, or None if
    /// the column is out of range or already full.
    pub fn drop_disc(&mut self, col: usize, side: Side) -> Option<usize> {
        if col >= COLS {
            return None;
        }
        let row = (0..ROWS).rev().find(|&row| self.cells[row][col].is_none())?;
        self.cells[row][col] = Some(side);
        Some(row)
    }

    /// Whether the disc at (row, col) completes a line of four for `side`.
    /// Only lines through that cell are examined.
    pub fn check_win(&self, row: usize, col: usize, side: Side) -> bool {
        DIRECTIONS.iter().any(|&(dr, dc)| {
            let count = 1
                + self.count_direction(row, col, dr, dc, side)
                + self.count_direction(row, col, -dr, -dc, side);
            count >= WIN_LENGTH
        })
    }

    fn count_direction(&self, row: usize, col: usize, dr: isize, dc: isize, side: Side) -> usize {
        let mut count = 0;
        let (mut r, mut c) = (row as isize, col as isize);
        loop {
            r += dr;
            c += dc;
            if r < 0 || r >= ROWS as isize || c < 0 || c >= COLS as isize {
                break;
            }
            if self.cells[r as usize][c as usize] != Some(side) {
                break;
            }
            count += 1;
        }
        count
    }

    pub fn is_full(&self) -> bool {
        self.cells.iter().flatten().all(Option::is_some)
    }

    pub fn filled_cells(&self) -> usize {
        self.cells.iter().flatten().filter(|cell| cell.is_some()).count()
    }

    /// Integer matrix as sent to clients: 0 empty, 1 side A, 2 side B
    pub fn to_codes(&self) -> [[u8; COLS]; ROWS] {
        let mut codes = [[0; COLS]; ROWS];
        for (row, cells) in self.cells.iter().enumerate() {
            for (col, cell) in cells.iter().enumerate() {
                codes[row][col] = cell.map_or(0, Side::code);
            }
        }
        codes
    }
}

/// A board together with whose turn it is and how the game stands
#[derive(Debug, Clone)]
pub struct GameState {
    pub board: Board,
    pub turn: Side,
    pub outcome: Outcome,
}

impl Default for GameState {
    fn default() -> Self {
        Self {
            board: Board::new(),
            turn: Side::A,
            outcome: Outcome::Ongoing,
        }
    }
}

impl GameState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply a move for `side` in `column`. Returns false without touching
    /// the state if the game is over, it is not `side`'s turn, or the column
    /// is out of range or full.
    pub fn play(&mut self, side: Side, column: i64) -> bool {
        if self.outcome.is_over() || side != self.turn {
            return false;
        }
        let Ok(col) = usize::try_from(column) else {
            return false;
        };
        let Some(row) = self.board.drop_disc(col, side) else {
            return false;
        };

        if self.board.check_win(row, col, side) {
            self.outcome = Outcome::Win(side);
        } else if self.board.is_full() {
            self.outcome = Outcome::Draw;
        } else {
            self.turn = side.other();
        }
        true
    }
}
