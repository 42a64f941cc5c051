//! `PBUSH` stiffness cards that tag a run with its joint configuration.
//!
//! A card carries one component id and six stiffness fields: three
//! translational and three rotational. Fields are either whitespace separated
//! or packed into fixed 8-column slots.

use crate::domain::{PsdError, PsdResult, PsdWarning};
use crate::numerics::{format_solver_literal, parse_solver_literal};
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::debug;

pub const CARD_KEYWORD: &str = "PBUSH";
pub const STIFFNESS_KEYWORD: &str = "K";
pub const FIELD_WIDTH: usize = 8;
pub const MIN_STIFFNESS_LEVEL: u8 = 1;
pub const MAX_STIFFNESS_LEVEL: u8 = 11;
const LEVEL_EXPONENT_OFFSET: i32 = 3;
const CARD_FIELDS: usize = 9;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BushStiffness {
    pub id: u64,
    pub translational: [f64; 3],
    pub rotational: [f64; 3],
}

impl BushStiffness {
    pub fn rotational_levels(&self) -> [Option<u8>; 3] {
        self.rotational.map(stiffness_level)
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct StiffnessDeck {
    pub cards: BTreeMap<u64, BushStiffness>,
    pub warnings: Vec<PsdWarning>,
}

/// Ordinal looseness of a rotational stiffness: `1e4` is level 1 and each
/// decade up to `1e14` adds one. Anything else has no level.
pub fn stiffness_level(value: f64) -> Option<u8> {
    (MIN_STIFFNESS_LEVEL..=MAX_STIFFNESS_LEVEL).find(|level| {
        stiffness_for_level(*level)
            .is_some_and(|expected| (value - expected).abs() <= expected * 1.0e-9)
    })
}

pub fn stiffness_for_level(level: u8) -> Option<f64> {
    (MIN_STIFFNESS_LEVEL..=MAX_STIFFNESS_LEVEL)
        .contains(&level)
        .then(|| 10f64.powi(i32::from(level) + LEVEL_EXPONENT_OFFSET))
}

fn fixed_width_fields(line: &str) -> Vec<String> {
    let chars: Vec<char> = line.trim_end().chars().collect();
    chars
        .chunks(FIELD_WIDTH)
        .map(|chunk| chunk.iter().collect::<String>().trim().to_string())
        .collect()
}

fn card_from_fields(fields: &[&str]) -> Result<BushStiffness, String> {
    if fields.len() < CARD_FIELDS {
        return Err(format!(
            "expected {CARD_FIELDS} fields, found {}",
            fields.len()
        ));
    }
    if !fields[2].eq_ignore_ascii_case(STIFFNESS_KEYWORD) {
        return Err(format!("expected stiffness keyword 'K', found '{}'", fields[2]));
    }

    let id = fields[1]
        .parse::<u64>()
        .map_err(|_| format!("component id '{}' is not an integer", fields[1]))?;
    let mut values = [0.0; 6];
    for (slot, token) in values.iter_mut().zip(&fields[3..CARD_FIELDS]) {
        *slot = parse_solver_literal(token).map_err(|error| error.to_string())?;
    }

    Ok(BushStiffness {
        id,
        translational: [values[0], values[1], values[2]],
        rotational: [values[3], values[4], values[5]],
    })
}

fn parse_card(line: &str) -> Result<BushStiffness, String> {
    let tokens: Vec<&str> = line.split_whitespace().collect();
    card_from_fields(&tokens).or_else(|whitespace_error| {
        let fields = fixed_width_fields(line);
        let fields: Vec<&str> = fields.iter().map(String::as_str).collect();
        card_from_fields(&fields).map_err(|_| whitespace_error)
    })
}

pub fn parse_bush_source(source: &str) -> StiffnessDeck {
    let mut deck = StiffnessDeck::default();
    for (index, line) in source.lines().enumerate() {
        let trimmed = line.trim_start();
        if trimmed.starts_with('$') {
            continue;
        }
        let is_card = trimmed
            .get(..CARD_KEYWORD.len())
            .is_some_and(|prefix| prefix.eq_ignore_ascii_case(CARD_KEYWORD));
        if !is_card {
            continue;
        }

        match parse_card(trimmed) {
            Ok(card) => {
                if deck.cards.insert(card.id, card).is_some() {
                    debug!(id = card.id, "later PBUSH card replaces an earlier one");
                }
            }
            Err(reason) => deck.warnings.push(PsdWarning::MalformedCard {
                line: index + 1,
                reason,
            }),
        }
    }
    deck
}

fn fixed_field(text: &str) -> PsdResult<String> {
    if text.len() > FIELD_WIDTH {
        return Err(PsdError::input_validation(
            "INPUT.STIFFNESS_FIELD_WIDTH",
            format!("'{text}' does not fit an {FIELD_WIDTH}-column field"),
        ));
    }
    Ok(format!("{text:<width$}", width = FIELD_WIDTH))
}

/// Renders cards in ascending id order, one per line.
pub fn render_bush_cards<'a>(
    cards: impl IntoIterator<Item = &'a BushStiffness>,
) -> PsdResult<String> {
    let mut ordered: Vec<&BushStiffness> = cards.into_iter().collect();
    ordered.sort_by_key(|card| card.id);

    let mut output = String::new();
    for card in ordered {
        let mut line = fixed_field(CARD_KEYWORD)?;
        line.push_str(&fixed_field(&card.id.to_string())?);
        line.push_str(&fixed_field(STIFFNESS_KEYWORD)?);
        for value in card.translational.iter().chain(&card.rotational) {
            line.push_str(&fixed_field(&format_solver_literal(*value))?);
        }
        output.push_str(line.trim_end());
        output.push('\n');
    }
    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::{
        BushStiffness, parse_bush_source, render_bush_cards, stiffness_for_level,
        stiffness_level,
    };
    use crate::domain::PsdWarning;

    #[test]
    fn decades_map_to_levels() {
        assert_eq!(stiffness_level(1.0e4), Some(1));
        assert_eq!(stiffness_level(1.0e8), Some(5));
        assert_eq!(stiffness_level(1.0e12), Some(9));
        assert_eq!(stiffness_level(1.0e14), Some(11));
        assert_eq!(stiffness_level(1.0e3), None);
        assert_eq!(stiffness_level(5.0e8), None);
        assert_eq!(stiffness_for_level(1), Some(1.0e4));
        assert_eq!(stiffness_for_level(12), None);
    }

    #[test]
    fn parses_whitespace_and_packed_cards() {
        let source = "\
$ bolt stiffness
PBUSH   1       K       1.+6    1.+6    1.+6    1.+8    1.+12   1.+12
pbush 2 k 1.+6 1.+6 1.+6 1.+4 1.+5 1.+6
PBUSH   3       K       1.+6    1.+6    1.+6    1.2345+81.+12   1.+12
";
        let deck = parse_bush_source(source);

        assert!(deck.warnings.is_empty(), "{:?}", deck.warnings);
        assert_eq!(deck.cards.len(), 3);
        let first = deck.cards[&1];
        assert_eq!(first.translational, [1.0e6; 3]);
        assert_eq!(first.rotational_levels(), [Some(5), Some(9), Some(9)]);
        assert_eq!(deck.cards[&2].rotational_levels(), [Some(1), Some(2), Some(3)]);
        assert_eq!(deck.cards[&3].rotational[0], 1.2345e8);
        assert_eq!(deck.cards[&3].rotational_levels(), [None, Some(9), Some(9)]);
    }

    #[test]
    fn malformed_cards_are_skipped_with_warnings() {
        let source = "\
PBUSH 1 K 1.+6 1.+6
PBUSH X K 1.+6 1.+6 1.+6 1.+8 1.+8 1.+8
PBUSH 4 K 1.+6 1.+6 1.+6 1.+8 1.+8 1.+8
";
        let deck = parse_bush_source(source);

        assert_eq!(deck.cards.keys().copied().collect::<Vec<_>>(), [4]);
        assert!(matches!(
            deck.warnings.as_slice(),
            [
                PsdWarning::MalformedCard { line: 1, .. },
                PsdWarning::MalformedCard { line: 2, .. }
            ]
        ));
    }

    #[test]
    fn rendered_cards_use_eight_column_fields_and_parse_back() {
        let cards = [
            BushStiffness {
                id: 2,
                translational: [1.0e6; 3],
                rotational: [1.0e4, 1.5e-3, 0.0],
            },
            BushStiffness {
                id: 1,
                translational: [1.0e6; 3],
                rotational: [1.0e8, 1.0e12, 1.0e12],
            },
        ];
        let rendered = render_bush_cards(&cards).expect("cards should render");
        let first_line = rendered.lines().next().expect("line");

        assert_eq!(
            first_line,
            "PBUSH   1       K       1.+6    1.+6    1.+6    1.+8    1.+12   1.+12"
        );
        let deck = parse_bush_source(&rendered);
        assert_eq!(deck.cards[&2], cards[0]);
        assert_eq!(deck.cards[&1], cards[1]);
    }

    #[test]
    fn oversized_fields_are_rejected() {
        let card = BushStiffness {
            id: 1,
            translational: [1.0e6; 3],
            rotational: [1.234567e12, 1.0e12, 1.0e12],
        };
        let error = render_bush_cards([&card]).expect_err("wide literal should fail");
        assert_eq!(error.placeholder(), "INPUT.STIFFNESS_FIELD_WIDTH");
    }
}
