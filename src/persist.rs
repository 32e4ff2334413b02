//! Position persistence.
//!
//! Keeps the last known axis positions, the selected channel and the tool
//! count in byte-addressable non-volatile storage so a power cycle resumes
//! without re-homing.
//!
//! Record layout (little endian):
//!
//! | bytes  | content                          |
//! |--------|----------------------------------|
//! | 0..4   | selector position (`i32`)        |
//! | 4..8   | revolver position (`i32`)        |
//! | 8..12  | feeder position (`i32`)          |
//! | 12     | selected channel (`0xFF` = none) |
//! | 13     | tool count                       |

use embedded_storage::{ReadStorage, Storage};

use crate::axis::AxisId;
use crate::config::units::Steps;
use crate::config::{DEFAULT_TOOL_COUNT, MAX_TOOLS, MIN_TOOLS};
use crate::error::{Result, StorageError};

/// Encoded size of a [`PersistedRecord`].
pub const RECORD_LEN: usize = 14;

const NO_CHANNEL: u8 = 0xFF;

/// State that survives a power cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PersistedRecord {
    /// Position of each axis, indexed by [`AxisId::index`].
    pub positions: [Steps; 3],
    /// Selected channel.
    pub selected: Option<u8>,
    /// Tool count at the time of writing.
    pub tool_count: u8,
}

impl PersistedRecord {
    /// Fresh record: everything at zero, nothing selected.
    pub const fn new(tool_count: u8) -> Self {
        Self {
            positions: [Steps(0); 3],
            selected: None,
            tool_count,
        }
    }

    /// Position of one axis.
    #[inline]
    pub fn position(&self, axis: AxisId) -> Steps {
        self.positions[axis.index()]
    }

    /// Encode to the storage layout.
    pub fn encode(&self) -> [u8; RECORD_LEN] {
        let mut bytes = [0u8; RECORD_LEN];
        for (chunk, position) in bytes[..12].chunks_exact_mut(4).zip(self.positions.iter()) {
            chunk.copy_from_slice(&position.0.to_le_bytes());
        }
        bytes[12] = self.selected.unwrap_or(NO_CHANNEL);
        bytes[13] = self.tool_count;
        bytes
    }

    /// Decode from the storage layout, without range checks.
    pub fn decode(bytes: &[u8; RECORD_LEN]) -> Self {
        let mut positions = [Steps(0); 3];
        for (position, chunk) in positions.iter_mut().zip(bytes[..12].chunks_exact(4)) {
            *position = Steps(i32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]));
        }
        let selected = match bytes[12] {
            NO_CHANNEL => None,
            channel => Some(channel),
        };
        Self {
            positions,
            selected,
            tool_count: bytes[13],
        }
    }

    /// Apply the startup range checks.
    ///
    /// A tool count outside 2..=12 means the record was never written
    /// (erased storage reads 0xFF): it is replaced by a fresh default record.
    /// A selection beyond the tool count is dropped. Returns `true` if
    /// anything changed.
    pub fn sanitize(&mut self) -> bool {
        let mut changed = false;
        if self.tool_count < MIN_TOOLS || self.tool_count > MAX_TOOLS {
            *self = Self::new(DEFAULT_TOOL_COUNT);
            changed = true;
        }
        if matches!(self.selected, Some(channel) if channel >= self.tool_count) {
            self.selected = None;
            changed = true;
        }
        changed
    }
}

/// Position record stored at a fixed offset of a storage device.
pub struct PositionStore<S> {
    storage: S,
    offset: u32,
}

impl<S: Storage> PositionStore<S> {
    /// Store the record at the start of `storage`.
    pub fn new(storage: S) -> Self {
        Self::at_offset(storage, 0)
    }

    /// Store the record at `offset`.
    pub fn at_offset(storage: S, offset: u32) -> Self {
        Self { storage, offset }
    }

    /// The underlying device.
    pub fn storage(&self) -> &S {
        &self.storage
    }

    /// Give the device back.
    pub fn into_inner(self) -> S {
        self.storage
    }

    fn check_bounds(&self) -> core::result::Result<(), StorageError> {
        let end = self.offset as usize + RECORD_LEN;
        if end > self.storage.capacity() {
            return Err(StorageError::OutOfBounds);
        }
        Ok(())
    }

    /// Read the raw record.
    pub fn load(&mut self) -> Result<PersistedRecord> {
        self.check_bounds()?;
        let mut bytes = [0u8; RECORD_LEN];
        self.storage
            .read(self.offset, &mut bytes)
            .map_err(|_| StorageError::Io)?;
        Ok(PersistedRecord::decode(&bytes))
    }

    /// Write a record.
    pub fn save(&mut self, record: &PersistedRecord) -> Result<()> {
        self.check_bounds()?;
        self.storage
            .write(self.offset, &record.encode())
            .map_err(|_| StorageError::Io)?;
        Ok(())
    }

    /// Read the record and apply the startup range checks, rewriting it if
    /// they changed anything.
    pub fn restore(&mut self) -> Result<PersistedRecord> {
        let mut record = self.load()?;
        if record.sanitize() {
            warn!(
                "stored state out of range, tool count {} selection reset",
                record.tool_count
            );
            self.save(&record)?;
        }
        Ok(record)
    }
}

/// RAM-backed storage, erased to `0xFF`.
#[derive(Debug, Clone)]
pub struct MemoryStorage<const N: usize> {
    bytes: [u8; N],
}

impl<const N: usize> MemoryStorage<N> {
    /// Create erased storage.
    pub const fn new() -> Self {
        Self { bytes: [0xFF; N] }
    }

    /// Raw contents.
    pub fn as_bytes(&self) -> &[u8; N] {
        &self.bytes
    }
}

impl<const N: usize> Default for MemoryStorage<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize> ReadStorage for MemoryStorage<N> {
    type Error = StorageError;

    fn read(&mut self, offset: u32, bytes: &mut [u8]) -> core::result::Result<(), Self::Error> {
        let start = offset as usize;
        let source = self
            .bytes
            .get(start..start + bytes.len())
            .ok_or(StorageError::OutOfBounds)?;
        bytes.copy_from_slice(source);
        Ok(())
    }

    fn capacity(&self) -> usize {
        N
    }
}

impl<const N: usize> Storage for MemoryStorage<N> {
    fn write(&mut self, offset: u32, bytes: &[u8]) -> core::result::Result<(), Self::Error> {
        let start = offset as usize;
        let target = self
            .bytes
            .get_mut(start..start + bytes.len())
            .ok_or(StorageError::OutOfBounds)?;
        target.copy_from_slice(bytes);
        Ok(())
    }
}
