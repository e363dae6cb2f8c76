// ABOUTME: Custom serde deserializers for config types.
// ABOUTME: Validates inline commands, targets and sizes while the file is parsed.

use serde::Deserialize;

use super::Target;
use crate::types::CommandList;

pub fn deserialize_commands<'de, D>(deserializer: D) -> Result<Option<CommandList>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let opt: Option<Vec<String>> = Option::deserialize(deserializer)?;
    match opt {
        None => Ok(None),
        Some(values) => CommandList::from_strings(values)
            .map(Some)
            .map_err(serde::de::Error::custom),
    }
}

/// `host` accepts the same `[user@]host[:port]` form as the command line.
pub fn deserialize_target<'de, D>(deserializer: D) -> Result<Option<Target>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let opt: Option<String> = Option::deserialize(deserializer)?;
    opt.map(|s| Target::parse(&s).map_err(serde::de::Error::custom))
        .transpose()
}

pub fn deserialize_capacity<'de, D>(deserializer: D) -> Result<Option<usize>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let opt: Option<usize> = Option::deserialize(deserializer)?;
    match opt {
        Some(0) => Err(serde::de::Error::custom(
            "output_capacity must be at least 1 byte",
        )),
        other => Ok(other),
    }
}
