/// Dice rolling: `NdM` notation against any random source.

use rand::Rng;
use tracing::{trace, warn};

use crate::schema::dice::DiceSpec;

/// Most dice a single notation may roll; larger counts roll the default die.
pub const MAX_DICE: u32 = 100;

/// A source of die faces.
///
/// Implemented for every [`rand::Rng`]; [`ScriptedRoller`] replays fixed
/// faces so tests can force particular table entries.
pub trait Roller {
    /// One uniform face in `1..=sides`. `sides` is never zero.
    fn roll_die(&mut self, sides: u32) -> u32;
}

impl<R: Rng> Roller for R {
    fn roll_die(&mut self, sides: u32) -> u32 {
        self.gen_range(1..=sides)
    }
}

/// The outcome of rolling a notation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiceRoll {
    /// The dice actually rolled (the default die if the notation was malformed).
    pub spec: DiceSpec,
    pub total: u32,
    pub rolls: Vec<u32>,
}

/// Roll `notation`. Malformed or missing notation rolls a single d12
/// instead of failing, so generation never stops on a typo.
pub fn roll<R: Roller + ?Sized>(notation: &str, roller: &mut R) -> DiceRoll {
    let spec = match notation.parse::<DiceSpec>() {
        Ok(spec) => spec,
        Err(e) => {
            trace!(%e, "falling back to default die");
            DiceSpec::DEFAULT
        }
    };
    roll_spec(spec, roller)
}

/// Roll an already parsed notation. A count above [`MAX_DICE`] rolls the
/// default die instead.
pub fn roll_spec<R: Roller + ?Sized>(spec: DiceSpec, roller: &mut R) -> DiceRoll {
    let spec = if spec.count > MAX_DICE {
        warn!(dice = %spec, max = MAX_DICE, "too many dice, rolling the default die");
        DiceSpec::DEFAULT
    } else {
        spec
    };
    let rolls: Vec<u32> = (0..spec.count).map(|_| roller.roll_die(spec.sides)).collect();
    let total = rolls.iter().fold(0u32, |acc, r| acc.saturating_add(*r));
    DiceRoll { spec, total, rolls }
}

/// Replays a fixed script of faces, cycling when it runs out.
///
/// A scripted face larger than the die wraps around (`face 14` on a d12
/// is `2`). Counts every die it produces.
#[derive(Debug, Clone)]
pub struct ScriptedRoller {
    faces: Vec<u32>,
    next: usize,
    dice_rolled: usize,
}

impl ScriptedRoller {
    pub fn new(faces: Vec<u32>) -> Self {
        Self {
            faces,
            next: 0,
            dice_rolled: 0,
        }
    }

    /// Always rolls `face`.
    pub fn fixed(face: u32) -> Self {
        Self::new(vec![face])
    }

    pub fn dice_rolled(&self) -> usize {
        self.dice_rolled
    }
}

impl Roller for ScriptedRoller {
    fn roll_die(&mut self, sides: u32) -> u32 {
        let face = if self.faces.is_empty() {
            1
        } else {
            let f = self.faces[self.next % self.faces.len()];
            self.next += 1;
            f
        };
        self.dice_rolled += 1;
        face.saturating_sub(1) % sides + 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn valid_notation_stays_in_bounds() {
        let mut rng = StdRng::seed_from_u64(7);
        for notation in ["1D6", "2D12", "3d4", "10D20"] {
            let spec: DiceSpec = notation.parse().unwrap();
            for _ in 0..200 {
                let result = roll(notation, &mut rng);
                assert_eq!(result.rolls.len(), spec.count as usize);
                assert!(result.rolls.iter().all(|r| (1..=spec.sides).contains(r)));
                assert!((spec.min_total()..=spec.max_total()).contains(&result.total));
                assert_eq!(result.total, result.rolls.iter().sum::<u32>());
            }
        }
    }

    #[test]
    fn invalid_notation_rolls_one_d12() {
        let mut rng = StdRng::seed_from_u64(11);
        for notation in ["", "banana", "D6", "2D"] {
            for _ in 0..100 {
                let result = roll(notation, &mut rng);
                assert_eq!(result.rolls.len(), 1);
                assert!((1..=12).contains(&result.total));
                assert_eq!(result.rolls[0], result.total);
                assert_eq!(result.spec, DiceSpec::DEFAULT);
            }
        }
    }

    #[test]
    fn oversized_count_rolls_the_default_die() {
        let mut roller = ScriptedRoller::fixed(7);
        let result = roll_spec(DiceSpec::new(999_999_999, 6), &mut roller);
        assert_eq!(result.spec, DiceSpec::DEFAULT);
        assert_eq!(result.rolls, vec![7]);
        assert_eq!(roller.dice_rolled(), 1);

        let result = roll("100D2", &mut roller);
        assert_eq!(result.rolls.len(), 100);
    }

    #[test]
    fn scripted_roller_replays_and_wraps() {
        let mut roller = ScriptedRoller::new(vec![3, 14]);
        assert_eq!(roller.roll_die(12), 3);
        assert_eq!(roller.roll_die(12), 2);
        assert_eq!(roller.roll_die(6), 3);
        assert_eq!(roller.dice_rolled(), 3);
    }

    #[test]
    fn scripted_totals_sum_faces() {
        let mut roller = ScriptedRoller::new(vec![5, 6]);
        let result = roll("2D12", &mut roller);
        assert_eq!(result.total, 11);
        assert_eq!(result.rolls, vec![5, 6]);
    }

    #[test]
    fn all_faces_reachable() {
        let mut rng = StdRng::seed_from_u64(3);
        let mut seen = [false; 6];
        for _ in 0..500 {
            let r = roll("1D6", &mut rng).total;
            seen[(r - 1) as usize] = true;
        }
        assert!(seen.iter().all(|s| *s));
    }
}
