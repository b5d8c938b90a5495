use std::fmt;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// Where in the file a fatal problem was found
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub struct Location {
    pub frame: Option<usize>,
    pub chunk: Option<usize>,
}

impl Location {
    pub const fn header() -> Self {
        Self {
            frame: None,
            chunk: None,
        }
    }

    pub const fn frame(frame: usize) -> Self {
        Self {
            frame: Some(frame),
            chunk: None,
        }
    }

    pub const fn chunk(frame: usize, chunk: usize) -> Self {
        Self {
            frame: Some(frame),
            chunk: Some(chunk),
        }
    }

    fn or(self, other: Location) -> Self {
        Self {
            frame: self.frame.or(other.frame),
            chunk: self.chunk.or(other.chunk),
        }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.frame, self.chunk) {
            (Some(frame), Some(chunk)) => write!(f, " (frame {frame}, chunk {chunk})"),
            (Some(frame), None) => write!(f, " (frame {frame})"),
            _ => write!(f, " (file header)"),
        }
    }
}

#[derive(Debug, Error)]
pub enum Error {
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
    #[error("unexpected end of data: wanted {wanted} bytes, {remaining} remaining{location}")]
    UnexpectedEndOfData {
        wanted: usize,
        remaining: usize,
        location: Location,
    },
    #[error("{kind}{location}")]
    Format { kind: FormatError, location: Location },
}

impl Error {
    /// Fills in the parts of the location that are not yet known
    pub fn at(self, at: Location) -> Self {
        match self {
            Error::UnexpectedEndOfData {
                wanted,
                remaining,
                location,
            } => Error::UnexpectedEndOfData {
                wanted,
                remaining,
                location: location.or(at),
            },
            Error::Format { kind, location } => Error::Format {
                kind,
                location: location.or(at),
            },
            other => other,
        }
    }

    pub fn format_kind(&self) -> Option<&FormatError> {
        match self {
            Error::Format { kind, .. } => Some(kind),
            _ => None,
        }
    }

    pub fn location(&self) -> Option<Location> {
        match self {
            Error::Format { location, .. } | Error::UnexpectedEndOfData { location, .. } => {
                Some(*location)
            }
            Error::Io(_) => None,
        }
    }
}

impl From<FormatError> for Error {
    fn from(kind: FormatError) -> Self {
        Error::Format {
            kind,
            location: Location::default(),
        }
    }
}

impl From<parsing::Error> for Error {
    fn from(err: parsing::Error) -> Self {
        let kind = match err {
            parsing::Error::UnexpectedEndOfData { wanted, remaining } => {
                return Error::UnexpectedEndOfData {
                    wanted,
                    remaining,
                    location: Location::default(),
                }
            }
            parsing::Error::MagicCheckFailed { expected, found } => {
                FormatError::BadMagic { expected, found }
            }
            parsing::Error::InterpretStrFailed(_) => FormatError::InvalidString,
            parsing::Error::EnumTypeValueMatchFailed(value) => FormatError::UnknownChunkType(value),
            parsing::Error::UnconsumedBytes { remaining } => {
                FormatError::ChunkSizeMismatch { remaining }
            }
            parsing::Error::SeekOutOfBounds { position, len } => {
                FormatError::OutOfBounds { position, len }
            }
        };
        kind.into()
    }
}

/// A violation of the file format. Always fatal.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FormatError {
    #[error("bad magic number: expected {expected:#06x}, found {found:#06x}")]
    BadMagic { expected: u64, found: u64 },
    #[error("invalid canvas size {width}x{height}")]
    InvalidCanvasSize { width: u16, height: u16 },
    #[error("unknown color depth {0}")]
    UnknownColorDepth(u16),
    #[error("unknown blend mode {0}")]
    UnknownBlendMode(u16),
    #[error("unknown loop direction {0}")]
    UnknownLoopDirection(u8),
    #[error("unknown layer type {0}")]
    UnknownLayerType(u16),
    #[error("unknown cel type {0}")]
    UnknownCelType(u16),
    #[error("unknown chunk type {0:#06x}")]
    UnknownChunkType(u64),
    #[error("cel refers to layer {0}, which does not exist")]
    UnresolvedLayer(usize),
    #[error("tilemap layer refers to tileset {0}, which does not exist")]
    UnresolvedTileset(usize),
    #[error("linked cel refers to frame {frame}, cel {cel}, which has not been read")]
    UnresolvedLinkedCel { frame: usize, cel: usize },
    #[error("tilemap cel on layer {0}, which is not a tilemap layer")]
    TilemapCelOnNonTilemapLayer(usize),
    #[error("tilesets stored in external files are not supported")]
    ExternalTilesetUnsupported,
    #[error("chunk has {remaining} bytes left after its contents")]
    ChunkSizeMismatch { remaining: usize },
    #[error("frame ends at {expected_end}, but its chunks end at {actual}")]
    FrameSizeMismatch { expected_end: usize, actual: usize },
    #[error("position {position} is outside the {len} byte file")]
    OutOfBounds { position: usize, len: usize },
    #[error("palette index {index} is out of range for a palette of {len} colors")]
    PaletteIndexOutOfRange { index: usize, len: usize },
    #[error("pixel data is {found} bytes, expected {expected}")]
    PixelDataSize { expected: usize, found: usize },
    #[error("tileset of {tiles} tiles of {tile_width}x{tile_height} is too large")]
    TilesetTooLarge {
        tiles: u32,
        tile_width: u16,
        tile_height: u16,
    },
    #[error("tiles of {0} bits are not supported")]
    UnsupportedTileBits(u16),
    #[error("tag range {from}..={to} is outside the {frames} frames of the sprite")]
    InvalidTagRange { from: u16, to: u16, frames: usize },
    #[error("string is not valid utf-8")]
    InvalidString,
    #[error("layer uuid is {0} bytes, expected 16")]
    InvalidUuid(usize),
    #[error("decompression failed: {0}")]
    Decompression(String),
}

/// Something odd in the file that does not stop parsing
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Warning {
    #[error("ignored chunk {chunk_type:#06x} in frame {frame}")]
    IgnoredChunk { frame: usize, chunk_type: u16 },
    #[error("skipped unknown chunk {chunk_type:#06x} in frame {frame}")]
    UnknownChunk { frame: usize, chunk_type: u16 },
    /// Raised once for a file with layers but without the layer opacity flag
    #[error("layer opacity is not flagged as valid, all layers are opaque")]
    LayerOpacityIgnored,
    #[error("header declares {declared} palette colors, palette has {actual}")]
    PaletteSizeMismatch { declared: usize, actual: usize },
    #[error("header declares a file size of {declared} bytes, file has {actual}")]
    FileSizeMismatch { declared: u32, actual: usize },
    #[error("user data in frame {frame}, chunk {chunk} has nothing to attach to")]
    UnattachedUserData { frame: usize, chunk: usize },
    #[error("user data properties in frame {frame}, chunk {chunk} were skipped")]
    UserDataPropertiesSkipped { frame: usize, chunk: usize },
    #[error("tileset {id} has no pixel data")]
    TilesetWithoutPixels { id: u32 },
    #[error("frame {frame} has {bytes} unread bytes after its chunks")]
    ExtraFrameBytes { frame: usize, bytes: usize },
}
