//! Control point text format
//!
//! ```text
//! <stageCount>;<stage0.pointCount>;x,y,z;...;<stage1.pointCount>;x,y,z;...
//! ```
//!
//! A trailing empty stage is not written. Decoding validates every count
//! against the schema before anything is returned.

use glam::Vec3;
use thiserror::Error;

use crate::stage::StageSchema;

/// Control point parsing errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PersistError {
    #[error("Unexpected end of control point data")]
    UnexpectedEnd,

    #[error("Invalid count: {0:?}")]
    InvalidCount(String),

    #[error("Invalid point: {0:?}")]
    InvalidPoint(String),

    #[error("Too many stages: {count} (schema has {max})")]
    TooManyStages { count: usize, max: usize },

    #[error("Stage {stage} cannot hold {count} points")]
    StageSize { stage: usize, count: usize },

    #[error("Unexpected trailing data: {0:?}")]
    TrailingData(String),
}

/// Encode stages into the text format
pub fn encode(stages: &[Vec<Vec3>]) -> String {
    let stored = match stages.split_last() {
        Some((last, rest)) if last.is_empty() => rest,
        _ => stages,
    };

    let mut tokens = vec![stored.len().to_string()];
    for stage in stored {
        tokens.push(stage.len().to_string());
        tokens.extend(stage.iter().map(|p| format!("{},{},{}", p.x, p.y, p.z)));
    }
    tokens.join(";")
}

/// Decode stages from the text format
///
/// The empty string decodes to no stages.
pub fn decode(text: &str, schema: &StageSchema) -> Result<Vec<Vec<Vec3>>, PersistError> {
    let text = text.trim();
    if text.is_empty() {
        return Ok(Vec::new());
    }

    let mut tokens = text.split(';').map(str::trim);
    let stage_count = parse_count(next_token(&mut tokens)?)?;
    if stage_count > schema.len() {
        return Err(PersistError::TooManyStages {
            count: stage_count,
            max: schema.len(),
        });
    }

    let mut stages = Vec::new();
    for stage in 0..stage_count {
        let count = parse_count(next_token(&mut tokens)?)?;
        let descriptor = &schema[stage];
        // Only the last stored stage may still be in progress
        let valid = if stage + 1 == stage_count {
            descriptor.max_points.is_none_or(|max| count <= max)
        } else {
            descriptor.accepts_len(count)
        };
        if !valid {
            return Err(PersistError::StageSize { stage, count });
        }

        let mut points = Vec::new();
        for _ in 0..count {
            points.push(parse_point(next_token(&mut tokens)?)?);
        }
        stages.push(points);
    }

    if let Some(extra) = tokens.find(|t| !t.is_empty()) {
        return Err(PersistError::TrailingData(extra.to_string()));
    }

    Ok(stages)
}

fn next_token<'a>(tokens: &mut impl Iterator<Item = &'a str>) -> Result<&'a str, PersistError> {
    tokens.next().ok_or(PersistError::UnexpectedEnd)
}

fn parse_count(token: &str) -> Result<usize, PersistError> {
    token
        .parse()
        .map_err(|_| PersistError::InvalidCount(token.to_string()))
}

fn parse_point(token: &str) -> Result<Vec3, PersistError> {
    let invalid = || PersistError::InvalidPoint(token.to_string());

    let coords = token
        .split(',')
        .map(|c| c.trim().parse::<f32>())
        .collect::<Result<Vec<_>, _>>()
        .map_err(|_| invalid())?;

    match coords.as_slice() {
        [x, y, z] if x.is_finite() && y.is_finite() && z.is_finite() => Ok(Vec3::new(*x, *y, *z)),
        _ => Err(invalid()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stage::StageDescriptor;

    fn schema() -> StageSchema {
        StageSchema::new(vec![
            StageDescriptor::exact("edge", 2),
            StageDescriptor::unbounded("outline", 1),
        ])
    }

    #[test]
    fn test_encode() {
        let stages = vec![
            vec![Vec3::new(0.0, 0.0, 0.0), Vec3::new(2.5, -1.0, 0.125)],
            vec![Vec3::new(1.0, 2.0, 3.0)],
        ];
        assert_eq!(encode(&stages), "2;2;0,0,0;2.5,-1,0.125;1;1,2,3");
    }

    #[test]
    fn test_encode_omits_trailing_empty_stage() {
        let stages = vec![vec![Vec3::ZERO, Vec3::X], Vec::new()];
        assert_eq!(encode(&stages), "1;2;0,0,0;1,0,0");
        assert_eq!(encode(&[Vec::new()]), "0");
    }

    #[test]
    fn test_decode() {
        let stages = decode("2;2;0,0,0;2.5,-1,0.125;1;1,2,3", &schema()).unwrap();
        assert_eq!(stages.len(), 2);
        assert_eq!(stages[0][1], Vec3::new(2.5, -1.0, 0.125));
        assert_eq!(stages[1], vec![Vec3::new(1.0, 2.0, 3.0)]);
    }

    #[test]
    fn test_decode_empty() {
        assert!(decode("", &schema()).unwrap().is_empty());
        assert!(decode("  ", &schema()).unwrap().is_empty());
        assert!(decode("0", &schema()).unwrap().is_empty());
    }

    #[test]
    fn test_decode_tolerates_trailing_separator() {
        let stages = decode("1;2;0,0,0;1,0,0;", &schema()).unwrap();
        assert_eq!(stages, vec![vec![Vec3::ZERO, Vec3::X]]);
    }

    #[test]
    fn test_decode_errors() {
        let schema = schema();
        assert_eq!(decode("1;2;0,0,0", &schema), Err(PersistError::UnexpectedEnd));
        assert!(matches!(decode("x", &schema), Err(PersistError::InvalidCount(_))));
        assert!(matches!(
            decode("1;1;0,0", &schema),
            Err(PersistError::InvalidPoint(_))
        ));
        assert!(matches!(
            decode("1;1;0,nan,0", &schema),
            Err(PersistError::InvalidPoint(_))
        ));
        assert_eq!(
            decode("3;0;0;0", &schema),
            Err(PersistError::TooManyStages { count: 3, max: 2 })
        );
        assert_eq!(
            decode("1;3;0,0,0;0,0,0;0,0,0", &schema),
            Err(PersistError::StageSize { stage: 0, count: 3 })
        );
        // A stage before the last must have been left legally
        assert_eq!(
            decode("2;1;0,0,0;1;1,1,1", &schema),
            Err(PersistError::StageSize { stage: 0, count: 1 })
        );
        assert!(matches!(
            decode("1;1;0,0,0;5", &schema),
            Err(PersistError::TrailingData(_))
        ));
    }
}
