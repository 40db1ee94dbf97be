//! The boundary move representation (spec.md 6): a JSON shape consumed by
//! an external game server, plus a terse textual notation used by the CLI
//! and log lines. Neither is the core's internal `Move` type; both convert
//! to and from it.

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::core::position::Size;
use crate::core::Move;
use crate::utils::prelude::*;

/// `{type:"place", size:"S"|"M"|"L", to:[row,col]}` or
/// `{type:"slide", from:[row,col], to:[row,col]}`, matching spec.md 6
/// exactly.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum MoveJson {
    Place { size: Size, to: [usize; 2] },
    Slide { from: [usize; 2], to: [usize; 2] },
}

impl From<Move> for MoveJson {
    fn from(mv: Move) -> Self {
        match mv {
            Move::Place { size, to } => MoveJson::Place { size, to: [to.0, to.1] },
            Move::Slide { from, to } => MoveJson::Slide { from: [from.0, from.1], to: [to.0, to.1] },
        }
    }
}

impl From<MoveJson> for Move {
    fn from(json: MoveJson) -> Self {
        match json {
            MoveJson::Place { size, to } => Move::Place { size, to: (to[0], to[1]) },
            MoveJson::Slide { from, to } => Move::Slide { from: (from[0], from[1]), to: (to[0], to[1]) },
        }
    }
}

impl Serialize for Size {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(self.notate())
    }
}

impl<'de> Deserialize<'de> for Size {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Size, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        raw.parse::<Size>().map_err(serde::de::Error::custom)
    }
}

/// Parses the CLI's one-line move notation: `S[row,col]`/`M[row,col]`/
/// `L[row,col]` for a placement, `(row,col)->(row,col)` for a slide.
pub fn parse(s: &str) -> Result<Move> {
    let place = Regex::new(r"^(?<size>[SML])\[(?<row>\d),(?<col>\d)\]$")?;
    if let Some(caps) = place.captures(s) {
        let size = caps.name("size").unwrap().as_str().parse::<Size>()?;
        let row = caps.name("row").unwrap().as_str().parse::<usize>()?;
        let col = caps.name("col").unwrap().as_str().parse::<usize>()?;
        return Ok(Move::Place { size, to: (row, col) });
    }

    let slide = Regex::new(r"^\((?<fr>\d),(?<fc>\d)\)->\((?<tr>\d),(?<tc>\d)\)$")?;
    if let Some(caps) = slide.captures(s) {
        let fr = caps.name("fr").unwrap().as_str().parse::<usize>()?;
        let fc = caps.name("fc").unwrap().as_str().parse::<usize>()?;
        let tr = caps.name("tr").unwrap().as_str().parse::<usize>()?;
        let tc = caps.name("tc").unwrap().as_str().parse::<usize>()?;
        return Ok(Move::Slide { from: (fr, fc), to: (tr, tc) });
    }

    Err(anyhow!("could not parse move notation {s}"))
}

/// Renders a move in the same notation `parse` accepts. `Move` already
/// implements `Display` with this format; this is the named entry point
/// the CLI reaches for.
pub fn render(mv: Move) -> String {
    mv.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::position::Size;

    #[test]
    fn place_notation_roundtrips() {
        let mv = Move::Place { size: Size::Large, to: (1, 2) };
        assert_eq!(parse(&render(mv)).unwrap(), mv);
    }

    #[test]
    fn slide_notation_roundtrips() {
        let mv = Move::Slide { from: (0, 0), to: (2, 2) };
        assert_eq!(parse(&render(mv)).unwrap(), mv);
    }

    #[test]
    fn json_shape_matches_boundary_contract() {
        let mv = Move::Place { size: Size::Small, to: (0, 1) };
        let json = serde_json::to_value(MoveJson::from(mv)).unwrap();
        assert_eq!(json["type"], "place");
        assert_eq!(json["size"], "S");
        assert_eq!(json["to"], serde_json::json!([0, 1]));
    }

    #[test]
    fn slide_json_shape_matches_boundary_contract() {
        let mv = Move::Slide { from: (0, 0), to: (1, 1) };
        let json = serde_json::to_value(MoveJson::from(mv)).unwrap();
        assert_eq!(json["type"], "slide");
        assert_eq!(json["from"], serde_json::json!([0, 0]));
    }
}
