use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;

pub type ConnectionId = uuid::Uuid;

/// Side length of every canvas.
pub const GRID_SIZE: u16 = 1000;

pub const SESSION_CODE_LEN: usize = 8;

/// Short code that identifies a canvas session, eg. `QWERTYUI`.
#[derive(Debug, Clone, Hash, Eq, PartialEq, Ord, PartialOrd, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct SessionCode(String);

impl SessionCode {
    pub fn random<R: Rng + ?Sized>(rng: &mut R) -> Self {
        let code = (0..SESSION_CODE_LEN)
            .map(|_| rng.gen_range(b'A'..=b'Z') as char)
            .collect();
        Self(code)
    }

    pub fn parse(s: &str) -> Option<Self> {
        if s.len() == SESSION_CODE_LEN && s.bytes().all(|b| b.is_ascii_uppercase()) {
            Some(Self(s.to_owned()))
        } else {
            None
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for SessionCode {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value).ok_or(value)
    }
}

impl From<SessionCode> for String {
    fn from(code: SessionCode) -> Self {
        code.0
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pixel {
    pub owner: ConnectionId,
    pub x: u16,
    pub y: u16,
    pub color: String,
}
