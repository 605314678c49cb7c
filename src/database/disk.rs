use super::*;
use crate::Tier;
use crate::error::StoreError;
use crate::game::Outcome;
use crate::game::TierPosition;
use byteorder::BE;
use byteorder::ReadBytesExt;
use byteorder::WriteBytesExt;
use std::fs::File;
use std::io::BufReader;
use std::io::BufWriter;
use std::io::Read;
use std::io::Seek;
use std::io::SeekFrom;
use std::io::Write;
use std::path::PathBuf;

/// One file per solved tier: header, record count, big-endian records, footer.
///
/// Tiers are written to a temporary file and renamed into place, so a tier
/// file either holds a complete solve or does not exist.
#[derive(Debug, Clone)]
pub struct DiskStore {
    root: PathBuf,
}

impl DiskStore {
    pub fn new(root: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let root = root.into();
        std::fs::create_dir_all(&root)?;
        Ok(Self { root })
    }
    pub fn path(&self, tier: Tier) -> PathBuf {
        self.root.join(format!("{}.tier", tier))
    }
    fn temp(&self, tier: Tier) -> PathBuf {
        self.root.join(format!("{}.tier.tmp", tier))
    }
    /// File signature, versioned by the trailing byte.
    fn header() -> &'static [u8] {
        b"TIERDB\n\xFF\r\n\x01"
    }
    /// Signals end of records. Never a valid packed record.
    fn footer() -> u16 {
        0xFFFF
    }
    /// Byte offset of the first record.
    fn offset() -> u64 {
        (Self::header().len() + std::mem::size_of::<u64>()) as u64
    }
    fn corrupt(tier: Tier, reason: impl Into<String>) -> StoreError {
        StoreError::Corrupt {
            tier,
            reason: reason.into(),
        }
    }
    /// Open a tier file and validate its header, returning the record count.
    fn open(&self, tier: Tier) -> Result<(BufReader<File>, u64), StoreError> {
        let file = File::open(self.path(tier)).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => StoreError::Missing(tier),
            _ => StoreError::Io(e),
        })?;
        let mut reader = BufReader::new(file);
        let ref mut header = vec![0u8; Self::header().len()];
        reader
            .read_exact(header)
            .map_err(|_| Self::corrupt(tier, "truncated header"))?;
        if header.as_slice() != Self::header() {
            return Err(Self::corrupt(tier, "bad signature"));
        }
        let size = reader
            .read_u64::<BE>()
            .map_err(|_| Self::corrupt(tier, "truncated size"))?;
        Ok((reader, size))
    }
}

impl Store for DiskStore {
    fn status(&self, tier: Tier) -> Status {
        match self.open(tier) {
            Ok(_) => Status::Solved,
            Err(StoreError::Missing(_)) => Status::Missing,
            Err(_) => Status::Corrupted,
        }
    }
    fn save(&self, tier: Tier, records: &Records) -> Result<(), StoreError> {
        let ref temp = self.temp(tier);
        let ref path = self.path(tier);
        log::debug!("{:<32}{:<32}", "saving      tier", path.display());
        let mut file = BufWriter::new(File::create(temp)?);
        file.write_all(Self::header())?;
        file.write_u64::<BE>(records.len())?;
        for record in records.raw() {
            file.write_u16::<BE>(record)?;
        }
        file.write_u16::<BE>(Self::footer())?;
        file.into_inner().map_err(|e| e.into_error())?.sync_all()?;
        std::fs::rename(temp, path)?;
        Ok(())
    }
    fn load(&self, tier: Tier, size: u64) -> Result<Records, StoreError> {
        let (mut reader, stored) = self.open(tier)?;
        if stored != size {
            return Err(Self::corrupt(
                tier,
                format!("expected {} records, found {}", size, stored),
            ));
        }
        log::debug!("{:<32}{:<32}", "loading     tier", self.path(tier).display());
        let mut raw = Vec::new();
        raw.try_reserve_exact(size as usize)
            .map_err(|_| Self::corrupt(tier, "tier does not fit in memory"))?;
        for _ in 0..size {
            let record = reader
                .read_u16::<BE>()
                .map_err(|_| Self::corrupt(tier, "truncated records"))?;
            if !Records::is_valid(record) {
                return Err(Self::corrupt(tier, format!("invalid record {:#06x}", record)));
            }
            raw.push(record);
        }
        match reader.read_u16::<BE>() {
            Ok(footer) if footer == Self::footer() => Ok(Records::from(raw)),
            _ => Err(Self::corrupt(tier, "missing footer")),
        }
    }
    fn probe(&self, at: TierPosition) -> Result<Outcome, StoreError> {
        let (mut reader, size) = self.open(at.tier)?;
        if at.position >= size {
            return Err(StoreError::OutOfRange { at, size });
        }
        let offset = Self::offset() + at.position * std::mem::size_of::<u16>() as u64;
        reader.seek(SeekFrom::Start(offset))?;
        let record = reader
            .read_u16::<BE>()
            .map_err(|_| Self::corrupt(at.tier, "truncated records"))?;
        Ok(Records::unpack(record))
    }
}
