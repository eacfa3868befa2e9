//! Arithmetic questions that have to be answered before a ringing alarm goes quiet.

use std::{fmt, str::FromStr};

use rand::{seq::SliceRandom, Rng};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// answers closer than this count as equal in decimal mode
pub const DECIMAL_TOLERANCE: f64 = 0.001;
/// a multiple choice question always has this many options
pub const OPTION_COUNT: usize = 4;

const MAX_DISTRACTOR_OFFSET: i64 = 10;

#[derive(Debug, Serialize, Deserialize, Default, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    /// addition and subtraction with 1 to 10
    #[default]
    Easy,
    /// all four operations with wider operands
    Medium,
}

#[derive(Debug, Error)]
#[error("unknown difficulty {0:?}, expected easy or medium")]
pub struct ParseDifficultyError(String);

impl FromStr for Difficulty {
    type Err = ParseDifficultyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "easy" => Ok(Self::Easy),
            "medium" => Ok(Self::Medium),
            _ => Err(ParseDifficultyError(s.to_string())),
        }
    }
}

impl Difficulty {
    const fn operations(self) -> &'static [Operation] {
        match self {
            Self::Easy => &[Operation::Add, Operation::Subtract],
            Self::Medium => &[
                Operation::Add,
                Operation::Subtract,
                Operation::Multiply,
                Operation::Divide,
            ],
        }
    }

    /// (left operand, right operand) ranges, inclusive
    const fn operands(self) -> ((i64, i64), (i64, i64)) {
        match self {
            Self::Easy => ((1, 10), (1, 10)),
            Self::Medium => ((5, 20), (1, 12)),
        }
    }
}

/// whether answers are exact integers or rounded decimals
#[derive(Debug, Serialize, Deserialize, Default, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum AnswerMode {
    #[default]
    Integer,
    /// division is real division, everything is rounded to 2 places
    Decimal,
}

#[derive(Debug, Error)]
#[error("unknown answer mode {0:?}, expected integer or decimal")]
pub struct ParseAnswerModeError(String);

impl FromStr for AnswerMode {
    type Err = ParseAnswerModeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "integer" => Ok(Self::Integer),
            "decimal" => Ok(Self::Decimal),
            _ => Err(ParseAnswerModeError(s.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Add,
    Subtract,
    Multiply,
    Divide,
}

impl Operation {
    #[must_use]
    pub const fn symbol(self) -> char {
        match self {
            Self::Add => '+',
            Self::Subtract => '-',
            Self::Multiply => '*',
            Self::Divide => '/',
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Answer {
    Integer(i64),
    Decimal(f64),
}

impl Answer {
    #[must_use]
    pub fn matches(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Integer(a), Self::Integer(b)) => a == b,
            _ => (self.as_f64() - other.as_f64()).abs() < DECIMAL_TOLERANCE,
        }
    }

    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn as_f64(&self) -> f64 {
        match *self {
            Self::Integer(n) => n as f64,
            Self::Decimal(x) => x,
        }
    }

    fn offset<R: Rng + ?Sized>(&self, rng: &mut R) -> Self {
        match *self {
            Self::Integer(n) => {
                let magnitude = rng.gen_range(1..=MAX_DISTRACTOR_OFFSET);
                Self::Integer(if rng.gen() { n + magnitude } else { n - magnitude })
            }
            Self::Decimal(x) => {
                // hundredths, so the offset survives rounding and is never zero
                let magnitude = rng.gen_range(1..=MAX_DISTRACTOR_OFFSET * 100);
                let offset = cents(magnitude);
                Self::Decimal(round2(if rng.gen() { x + offset } else { x - offset }))
            }
        }
    }
}

impl fmt::Display for Answer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Integer(n) => write!(f, "{n}"),
            Self::Decimal(x) => write!(f, "{x:.2}"),
        }
    }
}

#[allow(clippy::cast_precision_loss)]
fn cents(hundredths: i64) -> f64 {
    hundredths as f64 / 100.0
}

fn round2(x: f64) -> f64 {
    (x * 100.0).round() / 100.0
}

#[derive(Debug, Clone, PartialEq)]
pub struct Question {
    pub prompt: String,
    pub answer: Answer,
    /// only present for multiple choice, exactly one of them is correct
    pub options: Option<[Answer; OPTION_COUNT]>,
}

impl Question {
    /// anything that doesn't parse as a number is just a wrong answer
    #[must_use]
    pub fn check(&self, input: &str) -> bool {
        let input = input.trim();
        let given = match self.answer {
            Answer::Integer(_) => input.parse().map(Answer::Integer),
            Answer::Decimal(_) => match input.parse::<f64>() {
                Ok(x) if x.is_finite() => Ok(Answer::Decimal(x)),
                _ => return false,
            },
        };
        given.is_ok_and(|given| given.matches(&self.answer))
    }

    /// `index` is zero based
    #[must_use]
    pub fn check_option(&self, index: usize) -> bool {
        self.options
            .as_ref()
            .and_then(|options| options.get(index))
            .is_some_and(|option| option.matches(&self.answer))
    }
}

/// Makes a new [`Question`] every time it is asked, forever.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct QuestionGenerator {
    pub difficulty: Difficulty,
    pub answer_mode: AnswerMode,
    pub multiple_choice: bool,
}

impl QuestionGenerator {
    #[must_use]
    pub const fn new(difficulty: Difficulty, answer_mode: AnswerMode, multiple_choice: bool) -> Self {
        Self {
            difficulty,
            answer_mode,
            multiple_choice,
        }
    }

    #[must_use]
    pub fn generate(&self) -> Question {
        self.generate_with(&mut rand::thread_rng())
    }

    pub fn generate_with<R: Rng + ?Sized>(&self, rng: &mut R) -> Question {
        let operation = *self
            .difficulty
            .operations()
            .choose(rng)
            .unwrap_or(&Operation::Add);
        let ((left_min, left_max), (right_min, right_max)) = self.difficulty.operands();

        let (a, b, answer) = match (operation, self.answer_mode) {
            (Operation::Divide, AnswerMode::Integer) => {
                // divisor first so the dividend is always a multiple of it
                let divisor = rng.gen_range(right_min..=right_max);
                let quotient = rng.gen_range(left_min..=left_max);
                (quotient * divisor, divisor, Answer::Integer(quotient))
            }
            (Operation::Divide, AnswerMode::Decimal) => {
                let a = rng.gen_range(left_min..=left_max);
                let b = rng.gen_range(right_min..=right_max);
                #[allow(clippy::cast_precision_loss)]
                let quotient = a as f64 / b as f64;
                (a, b, Answer::Decimal(round2(quotient)))
            }
            (operation, mode) => {
                let a = rng.gen_range(left_min..=left_max);
                let b = rng.gen_range(right_min..=right_max);
                let result = match operation {
                    Operation::Add => a + b,
                    Operation::Subtract => a - b,
                    _ => a * b,
                };
                let answer = match mode {
                    AnswerMode::Integer => Answer::Integer(result),
                    #[allow(clippy::cast_precision_loss)]
                    AnswerMode::Decimal => Answer::Decimal(result as f64),
                };
                (a, b, answer)
            }
        };

        Question {
            prompt: format!("{a} {} {b}", operation.symbol()),
            answer,
            options: self.multiple_choice.then(|| options_for(answer, rng)),
        }
    }
}

fn options_for<R: Rng + ?Sized>(answer: Answer, rng: &mut R) -> [Answer; OPTION_COUNT] {
    let mut options = [answer; OPTION_COUNT];
    let mut filled = 1;
    while filled < OPTION_COUNT {
        let candidate = answer.offset(rng);
        if !options[..filled].iter().any(|o| o.matches(&candidate)) {
            options[filled] = candidate;
            filled += 1;
        }
    }
    options.shuffle(rng);
    options
}

#[cfg(test)]
mod tests {
    use rand::{rngs::StdRng, SeedableRng};

    use super::*;

    fn all_generators(multiple_choice: bool) -> Vec<QuestionGenerator> {
        let mut generators = vec![];
        for difficulty in [Difficulty::Easy, Difficulty::Medium] {
            for mode in [AnswerMode::Integer, AnswerMode::Decimal] {
                generators.push(QuestionGenerator::new(difficulty, mode, multiple_choice));
            }
        }
        generators
    }

    #[test]
    fn multiple_choice_has_four_distinct_options_one_correct() {
        let mut rng = StdRng::seed_from_u64(7);
        for generator in all_generators(true) {
            for _ in 0..1000 {
                let question = generator.generate_with(&mut rng);
                let options = question.options.expect("multiple choice was asked for");
                let correct = options.iter().filter(|o| o.matches(&question.answer)).count();
                assert_eq!(correct, 1, "{question:?}");
                for (i, a) in options.iter().enumerate() {
                    for b in &options[i + 1..] {
                        assert!(!a.matches(b), "duplicate options in {question:?}");
                    }
                }
            }
        }
    }

    #[test]
    fn integer_division_is_exact() {
        let mut rng = StdRng::seed_from_u64(11);
        let generator = QuestionGenerator::new(Difficulty::Medium, AnswerMode::Integer, false);
        let mut divisions = 0;
        for _ in 0..1000 {
            let question = generator.generate_with(&mut rng);
            let Some((a, b)) = question.prompt.split_once(" / ") else {
                continue;
            };
            divisions += 1;
            let (a, b): (i64, i64) = (a.parse().unwrap(), b.parse().unwrap());
            assert_eq!(a % b, 0, "{}", question.prompt);
            assert_eq!(question.answer, Answer::Integer(a / b));
        }
        assert!(divisions > 0);
    }

    #[test]
    fn easy_only_adds_and_subtracts_small_numbers() {
        let mut rng = StdRng::seed_from_u64(3);
        let generator = QuestionGenerator::default();
        for _ in 0..500 {
            let question = generator.generate_with(&mut rng);
            assert!(question.options.is_none());
            let parts: Vec<_> = question.prompt.split(' ').collect();
            assert!(matches!(parts[1], "+" | "-"), "{}", question.prompt);
            for operand in [parts[0], parts[2]] {
                let n: i64 = operand.parse().unwrap();
                assert!((1..=10).contains(&n));
            }
        }
    }

    #[test]
    fn decimal_answers_are_rounded_to_two_places() {
        let mut rng = StdRng::seed_from_u64(5);
        let generator = QuestionGenerator::new(Difficulty::Medium, AnswerMode::Decimal, true);
        for _ in 0..500 {
            let question = generator.generate_with(&mut rng);
            for option in question.options.unwrap() {
                let Answer::Decimal(x) = option else {
                    panic!("integer option in decimal mode: {question:?}");
                };
                assert!((x * 100.0 - (x * 100.0).round()).abs() < 1e-6);
            }
        }
    }

    #[test]
    fn check_parses_input_and_treats_garbage_as_wrong() {
        let question = Question {
            prompt: "2 + 2".to_string(),
            answer: Answer::Integer(4),
            options: None,
        };
        assert!(question.check("4"));
        assert!(question.check(" 4\n"));
        assert!(!question.check("5"));
        assert!(!question.check("four"));
        assert!(!question.check(""));
        assert!(!question.check("4.0"));
        assert!(!question.check_option(0));

        let question = Question {
            prompt: "7 / 3".to_string(),
            answer: Answer::Decimal(2.33),
            options: Some([
                Answer::Decimal(1.0),
                Answer::Decimal(2.33),
                Answer::Decimal(3.5),
                Answer::Decimal(-4.25),
            ]),
        };
        assert!(question.check("2.33"));
        assert!(question.check("2.3304"));
        assert!(!question.check("2.34"));
        assert!(!question.check("NaN"));
        assert!(question.check_option(1));
        assert!(!question.check_option(0));
        assert!(!question.check_option(4));
    }

    #[test]
    fn difficulty_parses_case_insensitively() {
        assert_eq!("Easy".parse::<Difficulty>().unwrap(), Difficulty::Easy);
        assert_eq!(" MEDIUM ".parse::<Difficulty>().unwrap(), Difficulty::Medium);
        assert!("hard".parse::<Difficulty>().is_err());
        assert_eq!("decimal".parse::<AnswerMode>().unwrap(), AnswerMode::Decimal);
    }
}
