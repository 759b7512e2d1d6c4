use crc::{Crc, CRC_16_XMODEM, CRC_32_ISCSI};

/// CRC16-CCITT (XMODEM) used by user-friendly addresses
pub const CRC16: Crc<u16> = Crc::<u16>::new(&CRC_16_XMODEM);

/// CRC32C (Castagnoli) used by the BoC trailer
pub const CRC32C: Crc<u32> = Crc::<u32>::new(&CRC_32_ISCSI);
