mod kings;
mod knights;
mod pawns;
mod sliders;

use self::sliders::SliderType;
use super::attack_tables::{ray_between, slider_attacks, KNIGHT_ATTACKS};
use super::{Board, Color, Move, MoveList, Piece, Square};

/// Check/pin context for the side to move, computed once per call to
/// [`Board::generate_moves`] and threaded through every piece's filter.
struct CheckInfo {
    /// Squares a non-king piece may move to while in single check: the
    /// attacker's square plus, for sliding attackers, the squares between
    /// it and the king. Meaningless when `num_attackers != 1`.
    attacking_rays: u64,
    /// 0, 1, or 2+ (2+ collapses any count above one: only king moves are
    /// legal either way).
    num_attackers: u32,
    /// Own pieces pinned to the king by an enemy slider.
    pinned: u64,
    /// For a pinned square, the full line through the king and the pinner
    /// (both directions), including the pinner's square. Undefined/unused
    /// for squares not in `pinned`.
    pin_ray: [u64; 64],
}

impl Board {
    /// Xray-pin detection: for each direction a slider could pin along,
    /// remove the nearest own blocker and see if an enemy slider of the
    /// matching type is revealed directly behind it.
    fn compute_pins(&self, color: Color, king_idx: usize) -> (u64, [u64; 64]) {
        let enemy = color.opponent();
        let e_idx = enemy.index();
        let occ = self.all_occupied.0;
        let own_occ = self.occupied[color.index()].0;

        let enemy_rook_like =
            self.pieces[e_idx][Piece::Rook.index()].0 | self.pieces[e_idx][Piece::Queen.index()].0;
        let enemy_bishop_like = self.pieces[e_idx][Piece::Bishop.index()].0
            | self.pieces[e_idx][Piece::Queen.index()].0;

        let mut pinned = 0u64;
        let mut pin_ray = [0u64; 64];

        for (attacks, enemy_slider, bishop) in [
            (slider_attacks(king_idx, occ, false), enemy_rook_like, false),
            (slider_attacks(king_idx, occ, true), enemy_bishop_like, true),
        ] {
            let blockers = attacks & own_occ;
            let xray = slider_attacks(king_idx, occ ^ blockers, bishop);
            let mut pinners = xray & enemy_slider & !attacks;

            while pinners != 0 {
                let pinner_idx = pinners.trailing_zeros() as usize;
                pinners &= pinners - 1;
                let between = ray_between(king_idx, pinner_idx);
                let pinned_sq = between & own_occ;
                if pinned_sq != 0 {
                    let pinned_idx = pinned_sq.trailing_zeros() as usize;
                    pinned |= pinned_sq;
                    pin_ray[pinned_idx] = between | (1u64 << pinner_idx);
                }
            }
        }

        (pinned, pin_ray)
    }

    /// Returns `(attacking_rays, num_attackers)`; see [`CheckInfo`].
    fn compute_check_info(&self, color: Color, king_idx: usize) -> (u64, u32) {
        let enemy = color.opponent();
        let e_idx = enemy.index();
        let occ = self.all_occupied.0;

        let enemy_rook_like =
            self.pieces[e_idx][Piece::Rook.index()].0 | self.pieces[e_idx][Piece::Queen.index()].0;
        let enemy_bishop_like = self.pieces[e_idx][Piece::Bishop.index()].0
            | self.pieces[e_idx][Piece::Queen.index()].0;

        let mut attacking_rays = 0u64;
        let mut num_attackers = 0u32;

        let mut rook_attackers = slider_attacks(king_idx, occ, false) & enemy_rook_like;
        while rook_attackers != 0 {
            let idx = rook_attackers.trailing_zeros() as usize;
            rook_attackers &= rook_attackers - 1;
            attacking_rays |= ray_between(king_idx, idx) | (1u64 << idx);
            num_attackers += 1;
        }

        let mut bishop_attackers = slider_attacks(king_idx, occ, true) & enemy_bishop_like;
        while bishop_attackers != 0 {
            let idx = bishop_attackers.trailing_zeros() as usize;
            bishop_attackers &= bishop_attackers - 1;
            attacking_rays |= ray_between(king_idx, idx) | (1u64 << idx);
            num_attackers += 1;
        }

        let mut knight_attackers =
            KNIGHT_ATTACKS[king_idx] & self.pieces[e_idx][Piece::Knight.index()].0;
        while knight_attackers != 0 {
            let idx = knight_attackers.trailing_zeros() as usize;
            knight_attackers &= knight_attackers - 1;
            attacking_rays |= 1u64 << idx;
            num_attackers += 1;
        }

        // Pawn attackers of a square are found by casting attacks from that
        // square using the opposite color's attack pattern.
        let pawn_sources = super::attack_tables::PAWN_ATTACKS[enemy.opponent().index()][king_idx];
        let mut pawn_attackers = pawn_sources & self.pieces[e_idx][Piece::Pawn.index()].0;
        while pawn_attackers != 0 {
            let idx = pawn_attackers.trailing_zeros() as usize;
            pawn_attackers &= pawn_attackers - 1;
            attacking_rays |= 1u64 << idx;
            num_attackers += 1;
        }

        (attacking_rays, num_attackers)
    }

    /// Can a pseudo-legal non-king move from `from` be played given the
    /// current check/pin context?
    fn is_move_allowed(info: &CheckInfo, from: Square, to: Square) -> bool {
        let from_bit = 1u64 << from.index();
        let to_bit = 1u64 << to.index();

        if info.num_attackers >= 2 {
            return false;
        }
        if info.num_attackers == 1 {
            if info.pinned & from_bit != 0 {
                return false;
            }
            return info.attacking_rays & to_bit != 0;
        }
        if info.pinned & from_bit != 0 {
            return info.pin_ray[from.index()] & to_bit != 0;
        }
        true
    }

    /// Legal destination test for a king move/capture: the square must not
    /// be attacked once the king is removed from occupancy (a slider
    /// attacking through the king's own square must still see past it).
    fn king_dest_is_safe(&self, to: Square, opponent: Color, occ_without_king: u64) -> bool {
        !self.is_square_attacked_with_occ(to, opponent, occ_without_king)
    }

    /// En-passant is handled outside the pin-ray/check-ray scheme: the
    /// captured pawn does not sit on the destination square, so neither
    /// `attacking_rays` nor a simple pin-ray test sees the rare case where
    /// removing both the capturing and captured pawns exposes the king
    /// along their shared rank. Verified by actually making the move.
    fn en_passant_is_legal(&mut self, m: Move, color: Color) -> bool {
        let info = self.make_move(m);
        let legal = !self.is_in_check(color);
        self.unmake_move(m, info);
        legal
    }

    fn generate_piece_moves(&self, from: Square, piece: Piece) -> MoveList {
        match piece {
            Piece::Pawn => self.generate_pawn_moves(from),
            Piece::Knight => self.generate_knight_moves(from),
            Piece::Bishop => self.generate_slider_moves(from, SliderType::Bishop),
            Piece::Rook => self.generate_slider_moves(from, SliderType::Rook),
            Piece::Queen => self.generate_slider_moves(from, SliderType::Queen),
            Piece::King => self.generate_king_moves(from),
        }
    }

    /// Generate all legal moves via pin-ray and attacker-ray filtering.
    ///
    /// Three cases, per square:
    /// - Double check: only king moves are legal.
    /// - Single check: non-king pieces may only move to a square on
    ///   `attacking_rays` (capture the checker or block the check); pinned
    ///   pieces have no legal moves.
    /// - No check: pinned pieces are restricted to their pin axis; all
    ///   other pieces move freely.
    ///
    /// King moves are always filtered against attacks computed with the
    /// king removed from occupancy, so a slider checking through the
    /// king's own square is not missed. En passant is re-verified by
    /// make/unmake regardless of case (see [`Board::en_passant_is_legal`]).
    #[must_use]
    pub fn generate_moves(&mut self) -> MoveList {
        let color = self.current_color();
        let opponent = color.opponent();
        let c_idx = color.index();

        let Some(king_sq) = self.find_king(color) else {
            return MoveList::new();
        };
        let king_idx = king_sq.index();
        let king_bit = 1u64 << king_idx;
        let occ_without_king = self.all_occupied.0 & !king_bit;

        let (attacking_rays, num_attackers) = self.compute_check_info(color, king_idx);
        let (pinned, pin_ray) = if num_attackers == 0 {
            self.compute_pins(color, king_idx)
        } else {
            (0, [0u64; 64])
        };
        let info = CheckInfo {
            attacking_rays,
            num_attackers,
            pinned,
            pin_ray,
        };
        let in_check = info.num_attackers > 0;

        let mut legal_moves = MoveList::new();

        // King moves: always generated, filtered by attacked-with-king-removed.
        for m in &self.generate_king_moves(king_sq) {
            if m.is_castling() {
                if in_check {
                    continue;
                }
                let king_start_sq = m.from();
                let king_mid_sq = Square::new(
                    m.from().rank(),
                    usize::midpoint(m.from().file(), m.to().file()),
                );
                let king_end_sq = m.to();
                if self.is_square_attacked(king_start_sq, opponent)
                    || self.is_square_attacked(king_mid_sq, opponent)
                    || self.is_square_attacked(king_end_sq, opponent)
                {
                    continue;
                }
            } else if !self.king_dest_is_safe(m.to(), opponent, occ_without_king) {
                continue;
            }
            legal_moves.push(*m);
        }

        if info.num_attackers >= 2 {
            return legal_moves;
        }

        for piece in [
            Piece::Pawn,
            Piece::Knight,
            Piece::Bishop,
            Piece::Rook,
            Piece::Queen,
        ] {
            for from in self.pieces[c_idx][piece.index()].iter() {
                for m in &self.generate_piece_moves(from, piece) {
                    if m.is_en_passant() {
                        let from_bit = 1u64 << from.index();
                        if info.pinned & from_bit != 0
                            && info.pin_ray[from.index()] & (1u64 << m.to().index()) == 0
                        {
                            continue;
                        }
                        if self.en_passant_is_legal(*m, color) {
                            legal_moves.push(*m);
                        }
                        continue;
                    }
                    if Self::is_move_allowed(&info, from, m.to()) {
                        legal_moves.push(*m);
                    }
                }
            }
        }

        legal_moves
    }

    #[must_use]
    pub fn is_checkmate(&mut self) -> bool {
        let color = self.current_color();
        self.is_in_check(color) && self.generate_moves().is_empty()
    }

    #[must_use]
    pub fn is_stalemate(&mut self) -> bool {
        let color = self.current_color();
        !self.is_in_check(color) && self.generate_moves().is_empty()
    }

    /// Cheap single-move legality check: is `mv` one of the current legal
    /// moves? Used to validate a transposition-table move before playing
    /// it (e.g. PV extraction), where a hash collision could otherwise
    /// hand back a move that doesn't belong to this position at all.
    pub(crate) fn is_legal_move(&mut self, mv: Move) -> bool {
        self.generate_moves().iter().any(|m| *m == mv)
    }

    /// Legal capture/promotion moves only, for quiescence search.
    pub(crate) fn generate_tactical_moves(&mut self) -> MoveList {
        let color = self.current_color();
        let opponent = color.opponent();
        let c_idx = color.index();

        let Some(king_sq) = self.find_king(color) else {
            return MoveList::new();
        };
        let king_idx = king_sq.index();
        let king_bit = 1u64 << king_idx;
        let occ_without_king = self.all_occupied.0 & !king_bit;

        let (attacking_rays, num_attackers) = self.compute_check_info(color, king_idx);
        let (pinned, pin_ray) = if num_attackers == 0 {
            self.compute_pins(color, king_idx)
        } else {
            (0, [0u64; 64])
        };
        let info = CheckInfo {
            attacking_rays,
            num_attackers,
            pinned,
            pin_ray,
        };

        let mut legal_tactical_moves = MoveList::new();

        for m in &self.generate_king_moves(king_sq) {
            if m.is_tactical() && self.king_dest_is_safe(m.to(), opponent, occ_without_king) {
                legal_tactical_moves.push(*m);
            }
        }

        if info.num_attackers >= 2 {
            return legal_tactical_moves;
        }

        let mut pawn_tactical = MoveList::new();
        for from in self.pieces[c_idx][Piece::Pawn.index()].iter() {
            self.generate_pawn_tactical_moves(from, &mut pawn_tactical);
        }
        for m in &pawn_tactical {
            if m.is_en_passant() {
                let from_bit = 1u64 << m.from().index();
                if info.pinned & from_bit != 0
                    && info.pin_ray[m.from().index()] & (1u64 << m.to().index()) == 0
                {
                    continue;
                }
                if self.en_passant_is_legal(*m, color) {
                    legal_tactical_moves.push(*m);
                }
                continue;
            }
            if Self::is_move_allowed(&info, m.from(), m.to()) {
                legal_tactical_moves.push(*m);
            }
        }

        for piece in [Piece::Knight, Piece::Bishop, Piece::Rook, Piece::Queen] {
            for from in self.pieces[c_idx][piece.index()].iter() {
                for m in &self.generate_piece_moves(from, piece) {
                    if m.is_tactical() && Self::is_move_allowed(&info, from, m.to()) {
                        legal_tactical_moves.push(*m);
                    }
                }
            }
        }

        legal_tactical_moves
    }

    #[must_use]
    pub fn perft(&mut self, depth: usize) -> u64 {
        if depth == 0 {
            return 1;
        }

        let moves = self.generate_moves();
        if depth == 1 {
            return moves.len() as u64;
        }

        let mut nodes = 0;
        for m in &moves {
            let info = self.make_move(*m);
            nodes += self.perft(depth - 1);
            self.unmake_move(*m, info);
        }

        nodes
    }
}
