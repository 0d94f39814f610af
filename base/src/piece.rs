/*
  Harrier, a UCI-compatible chess engine.
  Copyright (C) 2022 The Harrier Authors (see AUTHORS.md file)

  Harrier is free software: you can redistribute it and/or modify
  it under the terms of the GNU General Public License as published by
  the Free Software Foundation, either version 3 of the License, or
  (at your option) any later version.

  Harrier is distributed in the hope that it will be useful,
  but WITHOUT ANY WARRANTY; without even the implied warranty of
  MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
  GNU General Public License for more details.

  You should have received a copy of the GNU General Public License
  along with this program.  If not, see <http://www.gnu.org/licenses/>.
*/

//! Chess piece types, independent of the color or square of any particular
//! piece on a board.

use std::fmt::{Display, Formatter, Result};

/// The FEN letter for each variant, indexed by its discriminant. Kept as a
/// single table so `code` and `from_code` can't drift out of sync with each
/// other.
const FEN_LETTERS: [u8; Piece::NUM_TYPES] = [b'N', b'B', b'R', b'Q', b'P', b'K'];

#[derive(Copy, Clone, PartialEq, Eq, Debug, Hash)]
#[repr(u8)]
/// A kind of chess piece, with no attached color or square.
///
/// The first four variants (knight, bishop, rook, queen) are the promotion
/// targets and otherwise play by the same movement rules as each other; pawns
/// and kings are each special-cased throughout the move generator. Putting
/// the promotable types first lets a promotion target be packed in as few
/// bits as the four of them need, rather than however many `Piece` itself
/// takes.
pub enum Piece {
    Knight = 0,
    Bishop,
    Rook,
    Queen,
    Pawn,
    King,
}

impl Piece {
    /// How many piece types exist.
    pub const NUM_TYPES: usize = 6;

    /// Every piece type, in discriminant order.
    pub const ALL_TYPES: [Piece; Piece::NUM_TYPES] = [
        Piece::Knight,
        Piece::Bishop,
        Piece::Rook,
        Piece::Queen,
        Piece::Pawn,
        Piece::King,
    ];

    /// The piece types a pawn may promote to.
    pub const PROMOTING: [Piece; 4] = [Piece::Knight, Piece::Bishop, Piece::Rook, Piece::Queen];

    /// Every piece type except pawns.
    pub const NON_PAWN_TYPES: [Piece; Piece::NUM_TYPES - 1] = [
        Piece::Knight,
        Piece::Bishop,
        Piece::Rook,
        Piece::Queen,
        Piece::King,
    ];

    /// Every piece type except kings.
    pub const NON_KING_TYPES: [Piece; Piece::NUM_TYPES - 1] = [
        Piece::Knight,
        Piece::Bishop,
        Piece::Rook,
        Piece::Queen,
        Piece::Pawn,
    ];

    #[must_use]
    /// This piece's FEN letter, uppercase, as used for White's pieces (Black
    /// writes the same letter lowercased).
    pub const fn code(self) -> &'static str {
        match self {
            Piece::Knight => "N",
            Piece::Bishop => "B",
            Piece::Rook => "R",
            Piece::Queen => "Q",
            Piece::Pawn => "P",
            Piece::King => "K",
        }
    }

    #[must_use]
    /// Parse an uppercase FEN piece letter. Returns `None` for anything else,
    /// including a valid letter given in lowercase.
    pub fn from_code(c: char) -> Option<Piece> {
        let byte = u8::try_from(c).ok()?;
        FEN_LETTERS
            .iter()
            .position(|&letter| letter == byte)
            .map(|idx| Piece::ALL_TYPES[idx])
    }
}

impl Display for Piece {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        write!(f, "{}", self.code())
    }
}
