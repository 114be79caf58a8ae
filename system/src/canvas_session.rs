use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::error::{CodecError, DrawError, RenderError};
use crate::grid::PixelGrid;
use crate::render::{render_png, BLOCK_SIZE};
use crate::types::{ConnectionId, Pixel, SessionCode};

const FORMAT_VERSION: u8 = 1;

/// One shared canvas: a grid plus the connections that joined it.
#[derive(Debug, Clone)]
pub struct CanvasSession {
    code: SessionCode,
    grid: PixelGrid,
    participants: BTreeSet<ConnectionId>,
}

impl CanvasSession {
    pub fn new(code: SessionCode, creator: ConnectionId) -> Self {
        let mut participants = BTreeSet::new();
        participants.insert(creator);
        Self {
            code,
            grid: PixelGrid::new(),
            participants,
        }
    }

    pub fn code(&self) -> &SessionCode {
        &self.code
    }

    pub fn participants(&self) -> &BTreeSet<ConnectionId> {
        &self.participants
    }

    pub fn has_participant(&self, connection_id: &ConnectionId) -> bool {
        self.participants.contains(connection_id)
    }

    pub fn add_participant(&mut self, connection_id: ConnectionId) {
        self.participants.insert(connection_id);
    }

    /// Returns whether the connection was a participant.
    pub fn remove_participant(&mut self, connection_id: &ConnectionId) -> bool {
        self.participants.remove(connection_id)
    }

    /// Paints one cell. Last writer wins.
    pub fn draw(
        &mut self,
        x: i64,
        y: i64,
        color: Option<&str>,
        author: ConnectionId,
    ) -> Result<Pixel, DrawError> {
        let (x, y) = self.grid.index(x, y)?;
        let color = match color {
            Some(color) if !color.is_empty() => color,
            _ => return Err(DrawError::MissingColor),
        };
        let pixel = Pixel {
            owner: author,
            x,
            y,
            color: color.to_owned(),
        };
        self.grid.set(pixel.clone())?;
        Ok(pixel)
    }

    /// Every painted cell, row by row.
    pub fn snapshot(&self) -> Vec<Pixel> {
        self.grid.iter().cloned().collect()
    }

    pub fn render_image(&self) -> Result<Vec<u8>, RenderError> {
        render_png(self.grid.iter(), self.grid.size(), BLOCK_SIZE)
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>, CodecError> {
        let record = SessionRecord {
            code: self.code.as_str().to_owned(),
            participants: self.participants.iter().cloned().collect(),
            pixels: self.snapshot(),
        };
        let mut bytes = vec![FORMAT_VERSION];
        bincode::serialize_into(&mut bytes, &record)?;
        Ok(bytes)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, CodecError> {
        let (version, body) = bytes.split_first().ok_or(CodecError::Empty)?;
        if *version != FORMAT_VERSION {
            return Err(CodecError::UnsupportedVersion(*version));
        }
        let record: SessionRecord = bincode::deserialize(body)?;
        let code = SessionCode::parse(&record.code).ok_or(CodecError::InvalidCode(record.code))?;

        let mut grid = PixelGrid::new();
        for pixel in record.pixels {
            let (x, y) = (pixel.x, pixel.y);
            grid.set(pixel)
                .map_err(|_| CodecError::PixelOutOfBounds { x, y })?;
        }

        Ok(Self {
            code,
            grid,
            participants: record.participants.into_iter().collect(),
        })
    }
}

/// Persisted form of a session. Only painted cells are written.
#[derive(Serialize, Deserialize)]
struct SessionRecord {
    code: String,
    participants: Vec<ConnectionId>,
    pixels: Vec<Pixel>,
}
