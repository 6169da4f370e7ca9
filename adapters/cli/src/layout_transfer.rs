//! Single-line grid snapshots used to share starting layouts.

use base64::{engine::general_purpose::STANDARD_NO_PAD, Engine as _};
use serde::{Deserialize, Serialize};
use stackrise_core::{BlockKind, CellCoord, Command};
use stackrise_world::{self as world, query, World};
use thiserror::Error;

const SNAPSHOT_DOMAIN: &str = "stack";
const SNAPSHOT_VERSION: &str = "v1";

/// Identifier prefix emitted before the encoded snapshot payload.
pub(crate) const SNAPSHOT_HEADER: &str = "stack:v1";
/// Delimiter used to separate the prefix, grid dimensions and payload.
const FIELD_DELIMITER: char = ':';

/// Snapshot of every settled block in the grid and the grid dimensions.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub(crate) struct GridLayoutSnapshot {
    /// Number of columns in the grid.
    pub(crate) columns: u32,
    /// Number of rows in the grid.
    pub(crate) rows: u32,
    /// Blocks composing the layout, ordered by cell.
    pub(crate) blocks: Vec<LayoutBlock>,
}

/// Block captured within a layout snapshot.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub(crate) struct LayoutBlock {
    /// Cell the block occupies.
    pub(crate) cell: CellCoord,
    /// Colour family of the block.
    pub(crate) kind: BlockKind,
    /// Whether the block may already take part in matches.
    pub(crate) usable: bool,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
struct SerializableSnapshot {
    blocks: Vec<LayoutBlock>,
}

impl GridLayoutSnapshot {
    /// Captures the blocks currently occupying cells of the world.
    #[must_use]
    pub(crate) fn from_world(world: &World) -> Self {
        let view = query::grid_view(world);
        let (columns, rows) = view.dimensions();
        let mut blocks: Vec<LayoutBlock> = view
            .occupied()
            .map(|block| LayoutBlock {
                cell: block.cell,
                kind: block.kind,
                usable: block.usable,
            })
            .collect();
        blocks.sort_by_key(|block| block.cell);
        Self {
            columns,
            rows,
            blocks,
        }
    }

    /// Builds a fresh world holding the captured blocks.
    #[must_use]
    pub(crate) fn to_world(&self) -> World {
        let mut world = World::new();
        let mut events = Vec::new();
        world::apply(
            &mut world,
            Command::ConfigureGrid {
                columns: self.columns,
                rows: self.rows,
            },
            &mut events,
        );
        for block in &self.blocks {
            world::apply(
                &mut world,
                Command::PlaceBlock {
                    cell: block.cell,
                    kind: block.kind,
                    usable: block.usable,
                },
                &mut events,
            );
        }
        world
    }

    /// Encodes the snapshot into a single-line string suitable for the command line.
    pub(crate) fn encode(&self) -> Result<String, LayoutTransferError> {
        let payload = SerializableSnapshot {
            blocks: self.blocks.clone(),
        };
        let json = serde_json::to_vec(&payload).map_err(LayoutTransferError::Serialize)?;
        let encoded = STANDARD_NO_PAD.encode(json);
        Ok(format!(
            "{SNAPSHOT_HEADER}:{}x{}:{encoded}",
            self.columns, self.rows
        ))
    }

    /// Decodes a snapshot from the provided string representation.
    pub(crate) fn decode(value: &str) -> Result<Self, LayoutTransferError> {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return Err(LayoutTransferError::EmptyPayload);
        }

        let mut parts = trimmed.split(FIELD_DELIMITER);
        let domain = parts.next().ok_or(LayoutTransferError::MissingPrefix)?;
        let version = parts.next().ok_or(LayoutTransferError::MissingVersion)?;
        let dimensions = parts.next().ok_or(LayoutTransferError::MissingDimensions)?;
        let payload = parts.next().ok_or(LayoutTransferError::MissingPayload)?;

        if domain != SNAPSHOT_DOMAIN {
            return Err(LayoutTransferError::InvalidPrefix(domain.to_owned()));
        }
        if version != SNAPSHOT_VERSION {
            return Err(LayoutTransferError::UnsupportedVersion(version.to_owned()));
        }

        let (columns, rows) = parse_dimensions(dimensions)?;
        let bytes = STANDARD_NO_PAD
            .decode(payload.as_bytes())
            .map_err(LayoutTransferError::InvalidEncoding)?;
        let decoded: SerializableSnapshot =
            serde_json::from_slice(&bytes).map_err(LayoutTransferError::InvalidPayload)?;

        if let Some(block) = decoded
            .blocks
            .iter()
            .find(|block| block.cell.column() >= columns || block.cell.row() >= rows)
        {
            return Err(LayoutTransferError::BlockOutOfBounds(block.cell));
        }

        Ok(Self {
            columns,
            rows,
            blocks: decoded.blocks,
        })
    }
}

/// Errors that can occur while encoding or decoding layout strings.
#[derive(Debug, Error)]
pub(crate) enum LayoutTransferError {
    /// The provided string was empty or contained only whitespace.
    #[error("layout string was empty")]
    EmptyPayload,
    /// The prefix segment was missing from the encoded snapshot.
    #[error("layout string is missing the prefix")]
    MissingPrefix,
    /// The encoded snapshot did not contain a version segment.
    #[error("layout string is missing the version")]
    MissingVersion,
    /// The encoded snapshot did not include grid dimensions.
    #[error("layout string is missing the grid dimensions")]
    MissingDimensions,
    /// The encoded snapshot did not include the payload segment.
    #[error("layout string is missing the payload")]
    MissingPayload,
    /// The encoded snapshot used an unexpected prefix segment.
    #[error("layout prefix '{0}' is not supported")]
    InvalidPrefix(String),
    /// The encoded snapshot used an unsupported version identifier.
    #[error("layout version '{0}' is not supported")]
    UnsupportedVersion(String),
    /// The grid dimensions could not be parsed from the encoded snapshot.
    #[error("could not parse grid dimensions '{0}'")]
    InvalidDimensions(String),
    /// The base64 payload could not be decoded.
    #[error("could not decode layout payload: {0}")]
    InvalidEncoding(#[source] base64::DecodeError),
    /// The decoded payload could not be deserialised.
    #[error("could not parse layout payload: {0}")]
    InvalidPayload(#[source] serde_json::Error),
    /// The snapshot could not be serialised.
    #[error("could not serialise layout payload: {0}")]
    Serialize(#[source] serde_json::Error),
    /// A block lies outside the declared grid.
    #[error("block at {0:?} lies outside the grid")]
    BlockOutOfBounds(CellCoord),
}

fn parse_dimensions(dimensions: &str) -> Result<(u32, u32), LayoutTransferError> {
    let invalid = || LayoutTransferError::InvalidDimensions(dimensions.to_owned());
    let (columns, rows) = dimensions.split_once(['x', 'X']).ok_or_else(invalid)?;

    let columns = columns.trim().parse::<u32>().map_err(|_| invalid())?;
    let rows = rows.trim().parse::<u32>().map_err(|_| invalid())?;

    if columns == 0 || rows == 0 {
        return Err(invalid());
    }

    Ok((columns, rows))
}
